//! The capability value object produced once at device creation.

use super::texture::TextureFormat;

/// The highest multisample count we are willing to rely on, regardless of what the
/// driver reports.
pub const MAX_TESTED_MULTISAMPLES: u8 = 8;

/// Represents the capabilities of a device.
///
/// Contrary to the bound state, these values never change after the device has been
/// created. Every code path that has more than one strategy branches on them instead
/// of asking the driver again.
#[derive(Debug, Clone, PartialEq)]
pub struct Capabilities {
    /// The name of the device, typically the renderer string of the driver.
    pub device_name: String,

    pub preferred_swap_chain_color_format: TextureFormat,
    pub preferred_swap_chain_depth_stencil_format: TextureFormat,

    /// Maximum number of viewports, always at least 1.
    pub max_viewports: u32,
    /// Maximum number of simultaneous render targets, always at least 1.
    pub max_simultaneous_render_targets: u32,
    /// Maximum width and height of a texture.
    pub max_texture_dimension: u32,
    pub max_texture_array_slices: u32,
    /// Maximum number of texture units a single program could sample from.
    pub max_texture_units: u32,
    /// Number of available binding points for uniform buffers.
    pub max_uniform_buffer_bindings: u32,
    pub max_uniform_buffer_size: u32,
    pub max_texture_buffer_size: u32,
    pub max_structured_buffer_size: u32,
    pub max_indirect_buffer_size: u32,
    /// Maximum number of multisamples, never above `MAX_TESTED_MULTISAMPLES`.
    pub max_multisamples: u8,
    /// Maximum anisotropy, 1 if anisotropic filtering is not available.
    pub max_anisotropy: f32,
    /// Maximum number of vertices per patch, 0 without tessellation.
    pub max_patch_vertices: u32,

    /// The window origin is in the upper left corner (Vulkan) instead of the lower left (OpenGL).
    pub upper_left_origin: bool,
    /// Clip space depth ranges from 0 to 1 (Vulkan) instead of -1 to 1 (OpenGL).
    pub zero_to_one_clip_z: bool,

    pub instanced_arrays: bool,
    pub draw_instanced: bool,
    pub base_vertex: bool,
    /// Draws accept a start instance natively. Without it the start instance is
    /// emulated through a uniform.
    pub base_instance: bool,
    /// Draw arguments could be sourced from a GPU buffer.
    pub draw_indirect: bool,
    /// A single native call could issue several indirect draws.
    pub multi_draw_indirect: bool,

    pub geometry_shader: bool,
    pub tessellation_shader: bool,
    pub compute_shader: bool,

    pub occlusion_query: bool,
    pub pipeline_statistics_query: bool,
    pub timestamp_query: bool,

    /// Debug markers and events reach the native debugging tools.
    pub debug_markers: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities {
            device_name: String::new(),
            preferred_swap_chain_color_format: TextureFormat::R8G8B8A8,
            preferred_swap_chain_depth_stencil_format: TextureFormat::D32Float,
            max_viewports: 1,
            max_simultaneous_render_targets: 1,
            max_texture_dimension: 0,
            max_texture_array_slices: 0,
            max_texture_units: 0,
            max_uniform_buffer_bindings: 0,
            max_uniform_buffer_size: 0,
            max_texture_buffer_size: 0,
            max_structured_buffer_size: 0,
            max_indirect_buffer_size: 0,
            max_multisamples: 1,
            max_anisotropy: 1.0,
            max_patch_vertices: 0,
            upper_left_origin: false,
            zero_to_one_clip_z: false,
            instanced_arrays: false,
            draw_instanced: false,
            base_vertex: false,
            base_instance: false,
            draw_indirect: false,
            multi_draw_indirect: false,
            geometry_shader: false,
            tessellation_shader: false,
            compute_shader: false,
            occlusion_query: false,
            pipeline_statistics_query: false,
            timestamp_query: false,
            debug_markers: false,
        }
    }
}

impl Capabilities {
    /// Clamps the multisample count reported by a driver into `[1, ceiling]`, where the
    /// ceiling itself never exceeds `MAX_TESTED_MULTISAMPLES`.
    pub fn clamp_multisamples(reported: i64, ceiling: u8) -> u8 {
        let ceiling = ceiling.min(MAX_TESTED_MULTISAMPLES).max(1);
        if reported < 1 {
            1
        } else if reported > i64::from(ceiling) {
            ceiling
        } else {
            reported as u8
        }
    }

    /// Gets the sample count which is actually used for a requested one.
    pub fn multisamples(&self, requested: u8) -> u8 {
        let mut samples = requested.max(1).min(self.max_multisamples);
        // Sample counts are powers of two on every backend.
        while !samples.is_power_of_two() {
            samples -= 1;
        }

        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multisamples() {
        assert_eq!(Capabilities::clamp_multisamples(32, 8), 8);
        assert_eq!(Capabilities::clamp_multisamples(32, 16), 8);
        assert_eq!(Capabilities::clamp_multisamples(4, 8), 4);
        assert_eq!(Capabilities::clamp_multisamples(0, 8), 1);
        assert_eq!(Capabilities::clamp_multisamples(-1, 8), 1);

        let mut caps = Capabilities::default();
        caps.max_multisamples = 8;
        assert_eq!(caps.multisamples(0), 1);
        assert_eq!(caps.multisamples(6), 4);
        assert_eq!(caps.multisamples(16), 8);
    }
}
