use std::ffi::CStr;

use ash::vk;

use crate::errors::*;
use crate::params::DeviceParams;
use crate::rhi::capabilities::Capabilities;
use crate::rhi::pipeline::MAX_RENDER_TARGETS;
use crate::rhi::texture::TextureFormat;

use super::api::VkApi;
use super::types;

pub const KHR_SWAPCHAIN: &str = "VK_KHR_swapchain";

/// What the physical device behind a `VkApi` reports.
#[derive(Debug, Clone)]
pub struct VkCapabilities {
    /// `(major, minor, patch)` of the supported API version.
    pub api_version: (u32, u32, u32),
    pub device_name: String,
    pub properties: vk::PhysicalDeviceProperties,
    pub features: vk::PhysicalDeviceFeatures,
    pub extensions: Vec<String>,
    /// Debug labels could be recorded into command buffers.
    pub debug_utils: bool,
}

impl VkCapabilities {
    pub unsafe fn parse<V: VkApi>(vk: &V) -> VkCapabilities {
        let properties = vk.physical_device_properties();
        let device_name = CStr::from_ptr(properties.device_name.as_ptr())
            .to_string_lossy()
            .into_owned();

        let v = properties.api_version;
        VkCapabilities {
            api_version: (
                vk::api_version_major(v),
                vk::api_version_minor(v),
                vk::api_version_patch(v),
            ),
            device_name,
            properties,
            features: vk.physical_device_features(),
            extensions: vk.device_extensions(),
            debug_utils: vk.debug_utils(),
        }
    }

    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.iter().any(|v| v == name)
    }

    #[inline]
    fn feature(v: vk::Bool32) -> bool {
        v == vk::TRUE
    }

    /// Depth values could be clamped instead of clipped.
    pub fn depth_clamp(&self) -> bool {
        Self::feature(self.features.depth_clamp)
    }

    pub fn sampler_anisotropy(&self) -> bool {
        Self::feature(self.features.sampler_anisotropy)
    }

    pub fn independent_blend(&self) -> bool {
        Self::feature(self.features.independent_blend)
    }

    pub fn precise_occlusion_query(&self) -> bool {
        Self::feature(self.features.occlusion_query_precise)
    }

    pub fn to_capabilities(&self, params: &DeviceParams) -> Capabilities {
        let limits = &self.properties.limits;
        let features = &self.features;

        let samples = limits.framebuffer_color_sample_counts
            & limits.framebuffer_depth_sample_counts;

        Capabilities {
            device_name: self.device_name.clone(),
            preferred_swap_chain_color_format: TextureFormat::B8G8R8A8,
            preferred_swap_chain_depth_stencil_format: TextureFormat::D32Float,
            max_viewports: if Self::feature(features.multi_viewport) {
                limits.max_viewports.max(1)
            } else {
                1
            },
            max_simultaneous_render_targets: limits
                .max_color_attachments
                .min(MAX_RENDER_TARGETS as u32)
                .max(1),
            max_texture_dimension: limits.max_image_dimension2_d,
            max_texture_array_slices: limits.max_image_array_layers,
            max_texture_units: limits.max_per_stage_descriptor_sampled_images,
            max_uniform_buffer_bindings: limits.max_descriptor_set_uniform_buffers,
            max_uniform_buffer_size: limits.max_uniform_buffer_range,
            max_texture_buffer_size: limits.max_texel_buffer_elements,
            max_structured_buffer_size: limits.max_storage_buffer_range,
            max_indirect_buffer_size: limits.max_storage_buffer_range,
            max_multisamples: Capabilities::clamp_multisamples(
                types::max_sample_count(samples),
                params.max_multisamples,
            ),
            max_anisotropy: if self.sampler_anisotropy() {
                limits.max_sampler_anisotropy.max(1.0)
            } else {
                1.0
            },
            max_patch_vertices: if Self::feature(features.tessellation_shader) {
                limits.max_tessellation_patch_size
            } else {
                0
            },
            upper_left_origin: true,
            zero_to_one_clip_z: true,
            instanced_arrays: true,
            draw_instanced: true,
            base_vertex: true,
            base_instance: true,
            draw_indirect: true,
            multi_draw_indirect: Self::feature(features.multi_draw_indirect),
            geometry_shader: Self::feature(features.geometry_shader),
            tessellation_shader: Self::feature(features.tessellation_shader),
            compute_shader: true,
            occlusion_query: true,
            pipeline_statistics_query: Self::feature(features.pipeline_statistics_query),
            timestamp_query: limits.timestamp_compute_and_graphics == vk::TRUE,
            debug_markers: self.debug_utils,
        }
    }
}

/// Fails if the device could not run anything we create.
pub fn check_capabilities(caps: &VkCapabilities) -> Result<()> {
    if caps.api_version.0 == 0 {
        return Err(Error::Requirement(format!("Vulkan 1.0, got {:?}", caps.api_version)).into());
    }

    let limits = &caps.properties.limits;
    if limits.max_bound_descriptor_sets < 4 {
        return Err(Error::Requirement("4 bound descriptor sets".into()).into());
    }

    if limits.max_color_attachments == 0 {
        return Err(Error::Requirement("color attachments".into()).into());
    }

    if !caps.has_extension(KHR_SWAPCHAIN) {
        warn!("[VK] {} is not supported, swap chains are unavailable.", KHR_SWAPCHAIN);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::vulkan::headless::HeadlessVk;

    #[test]
    fn parse() {
        let vk = HeadlessVk::new();
        let caps = unsafe { VkCapabilities::parse(&vk) };
        assert_eq!(caps.device_name, "Headless Vulkan");
        assert_eq!(caps.api_version.0, 1);
        assert!(caps.has_extension(KHR_SWAPCHAIN));
        assert!(check_capabilities(&caps).is_ok());

        let params = DeviceParams::default();
        let v = caps.to_capabilities(&params);
        assert_eq!(v.max_multisamples, 8);
        assert!(v.upper_left_origin);
        assert!(v.multi_draw_indirect);
    }

    #[test]
    fn optional_features() {
        let mut features = HeadlessVk::all_features();
        features.multi_draw_indirect = vk::FALSE;
        features.pipeline_statistics_query = vk::FALSE;
        features.tessellation_shader = vk::FALSE;

        let vk = HeadlessVk::with_features(features);
        let caps = unsafe { VkCapabilities::parse(&vk) };

        let v = caps.to_capabilities(&DeviceParams::default());
        assert!(!v.multi_draw_indirect);
        assert!(!v.pipeline_statistics_query);
        assert_eq!(v.max_patch_vertices, 0);
        assert!(v.draw_indirect);
    }
}
