use std::collections::HashMap;
use std::rc::Rc;

use ash::vk;

use crate::errors::*;
use crate::rhi::resource::RootSignatureObject;
use crate::rhi::root_signature::RootSignatureDesc;

use super::api::VkApi;
use super::types;
use super::vk_error;

/// A pipeline layout with one descriptor set layout per root parameter. The descriptor
/// range at `base_shader_register` maps to the binding of the same number.
///
/// The descriptor sets of every resource group created against this root signature are
/// allocated from its own pool.
pub struct VkRootSignature<V: VkApi> {
    pub(crate) vk: Rc<V>,
    pub(crate) desc: RootSignatureDesc,
    pub(crate) set_layouts: Vec<vk::DescriptorSetLayout>,
    pub(crate) pipeline_layout: vk::PipelineLayout,
    /// Null if none of the parameters declares a range.
    pub(crate) pool: vk::DescriptorPool,
    pub(crate) descriptor_types: Vec<Vec<vk::DescriptorType>>,
}

impl<V: VkApi> VkRootSignature<V> {
    pub(crate) unsafe fn new(
        vk: &Rc<V>,
        limits: &vk::PhysicalDeviceLimits,
        max_resource_groups: u32,
        desc: &RootSignatureDesc,
    ) -> Result<Self> {
        if desc.len() as u32 > limits.max_bound_descriptor_sets {
            return Err(Error::Unsupported(format!(
                "Root signature with {} parameters (max {})",
                desc.len(),
                limits.max_bound_descriptor_sets
            ))
            .into());
        }

        let descriptor_types: Vec<Vec<_>> = desc
            .parameters
            .iter()
            .map(|v| v.descriptor_table.iter().map(types::descriptor_type).collect())
            .collect();

        let mut rs = VkRootSignature {
            vk: vk.clone(),
            desc: desc.clone(),
            set_layouts: Vec::with_capacity(desc.len()),
            pipeline_layout: vk::PipelineLayout::null(),
            pool: vk::DescriptorPool::null(),
            descriptor_types,
        };

        let mut counts = HashMap::new();
        for (i, parameter) in desc.parameters.iter().enumerate() {
            let mut bindings: Vec<vk::DescriptorSetLayoutBinding> =
                Vec::with_capacity(parameter.len());

            for (range, &ty) in parameter.descriptor_table.iter().zip(&rs.descriptor_types[i]) {
                if bindings.iter().any(|v| v.binding == range.base_shader_register) {
                    return Err(Error::InvalidDescriptor(format!(
                        "root parameter {} binds register {} twice",
                        i, range.base_shader_register
                    ))
                    .into());
                }

                bindings.push(
                    vk::DescriptorSetLayoutBinding::default()
                        .binding(range.base_shader_register)
                        .descriptor_type(ty)
                        .descriptor_count(1)
                        .stage_flags(range.visibility.into()),
                );

                *counts.entry(ty).or_insert(0) += 1;
            }

            let layout = vk
                .create_descriptor_set_layout(&bindings)
                .map_err(|err| vk_error("create descriptor set layout", err))?;
            rs.set_layouts.push(layout);
        }

        rs.pipeline_layout = vk
            .create_pipeline_layout(&rs.set_layouts)
            .map_err(|err| vk_error("create pipeline layout", err))?;

        if !counts.is_empty() {
            let sizes: Vec<_> = counts
                .into_iter()
                .map(|(ty, n)| vk::DescriptorPoolSize {
                    ty,
                    descriptor_count: n * max_resource_groups,
                })
                .collect();

            rs.pool = vk
                .create_descriptor_pool(max_resource_groups, &sizes)
                .map_err(|err| vk_error("create descriptor pool", err))?;
        }

        Ok(rs)
    }

    #[inline]
    pub fn pipeline_layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout
    }

    #[inline]
    pub fn set_layout(&self, root_parameter_index: u32) -> vk::DescriptorSetLayout {
        self.set_layouts[root_parameter_index as usize]
    }

    /// Gets the descriptor type of range `range` of a root parameter.
    pub fn descriptor_type(&self, root_parameter_index: u32, range: usize) -> vk::DescriptorType {
        self.descriptor_types[root_parameter_index as usize][range]
    }
}

impl<V: VkApi> RootSignatureObject for VkRootSignature<V> {
    fn desc(&self) -> &RootSignatureDesc {
        &self.desc
    }
}

impl<V: VkApi> Drop for VkRootSignature<V> {
    fn drop(&mut self) {
        unsafe {
            self.vk.destroy_descriptor_pool(self.pool);
            self.vk.destroy_pipeline_layout(self.pipeline_layout);
            for &v in &self.set_layouts {
                self.vk.destroy_descriptor_set_layout(v);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::vulkan::headless::HeadlessVk;
    use crate::rhi::resource::ResourceType;
    use crate::rhi::root_signature::*;

    #[test]
    fn layouts() {
        let vk = Rc::new(HeadlessVk::new());
        let limits = unsafe { vk.physical_device_properties() }.limits;

        let desc = RootSignatureDesc::new(vec![
            RootParameter::new(vec![
                DescriptorRange::new(
                    DescriptorRangeType::Ubv,
                    0,
                    "Globals",
                    ResourceType::UniformBuffer,
                    ShaderVisibility::All,
                ),
                DescriptorRange::new(
                    DescriptorRangeType::Srv,
                    1,
                    "Albedo",
                    ResourceType::Texture2D,
                    ShaderVisibility::Fragment,
                ),
            ]),
            RootParameter::default(),
        ]);

        let rs = unsafe { VkRootSignature::new(&vk, &limits, 16, &desc).unwrap() };
        assert_eq!(rs.set_layouts.len(), 2);
        assert_ne!(rs.pool, vk::DescriptorPool::null());
        assert_eq!(
            rs.descriptor_type(0, 1),
            vk::DescriptorType::COMBINED_IMAGE_SAMPLER
        );

        drop(rs);
        assert_eq!(vk.live_objects(), 0);

        // Without ranges there is nothing to allocate from.
        let desc = RootSignatureDesc::new(vec![RootParameter::default()]);
        let rs = unsafe { VkRootSignature::new(&vk, &limits, 16, &desc).unwrap() };
        assert_eq!(rs.pool, vk::DescriptorPool::null());
        assert!(vk.validation_errors().is_empty());
    }

    #[test]
    fn too_many_parameters() {
        let vk = Rc::new(HeadlessVk::new());
        let limits = unsafe { vk.physical_device_properties() }.limits;

        let desc = RootSignatureDesc::new(vec![RootParameter::default(); 9]);
        assert!(unsafe { VkRootSignature::new(&vk, &limits, 16, &desc) }.is_err());
    }
}
