use std::rc::Rc;

use ash::vk;

use crate::errors::*;
use crate::rhi::buffer::BufferKind;
use crate::rhi::resource::{Resource, RootSignatureObject};

use super::api::{DescriptorInfo, DescriptorWrite, VkApi};
use super::device::VulkanDevice;
use super::resources::VkSamplerState;
use super::root_signature::VkRootSignature;
use super::vk_error;

/// The resources of one descriptor table, written into a descriptor set once at
/// creation. Binding the group is a single descriptor set bind.
pub struct VkResourceGroup<V: VkApi> {
    pub(crate) root_signature: Rc<VkRootSignature<V>>,
    pub(crate) root_parameter_index: u32,
    pub(crate) set: vk::DescriptorSet,
    pub(crate) resources: Vec<Resource<VulkanDevice<V>>>,
    pub(crate) sampler_states: Vec<Option<Rc<VkSamplerState<V>>>>,
}

impl<V: VkApi> VkResourceGroup<V> {
    /// # Panics
    ///
    /// Panics if the resources do not match the descriptor table 1:1, or if the sampler
    /// states are given but not one per resource.
    pub(crate) unsafe fn new(
        root_signature: &Rc<VkRootSignature<V>>,
        root_parameter_index: u32,
        resources: &[Resource<VulkanDevice<V>>],
        sampler_states: Option<&[Option<Rc<VkSamplerState<V>>>]>,
        default_sampler: &VkSamplerState<V>,
    ) -> Result<Self> {
        let parameter = &root_signature.desc().parameters[root_parameter_index as usize];
        assert_eq!(
            parameter.len(),
            resources.len(),
            "The number of resources does not match the descriptor table."
        );

        for (range, resource) in parameter.descriptor_table.iter().zip(resources) {
            let ty = resource.resource_type();
            assert!(
                ty.is_compatible(range.range_type),
                "{:?} could not be bound to range {:?}.",
                ty,
                range.range_type
            );
        }

        let samplers = match sampler_states {
            Some(v) => {
                assert_eq!(
                    v.len(),
                    resources.len(),
                    "The number of sampler states does not match the resources."
                );
                v.to_vec()
            }
            None => vec![None; resources.len()],
        };

        let vk = &root_signature.vk;
        let set = if parameter.is_empty() {
            vk::DescriptorSet::null()
        } else {
            vk.allocate_descriptor_set(
                root_signature.pool,
                root_signature.set_layout(root_parameter_index),
            )
            .map_err(|err| vk_error("allocate descriptor set", err))?
        };

        let group = VkResourceGroup {
            root_signature: root_signature.clone(),
            root_parameter_index,
            set,
            resources: resources.to_vec(),
            sampler_states: samplers,
        };

        let writes = group.descriptor_writes(default_sampler);
        if !writes.is_empty() {
            vk.update_descriptor_set(set, &writes);
        }

        Ok(group)
    }

    #[inline]
    pub fn root_parameter_index(&self) -> u32 {
        self.root_parameter_index
    }

    #[inline]
    pub fn resources(&self) -> &[Resource<VulkanDevice<V>>] {
        &self.resources
    }

    #[inline]
    pub fn descriptor_set(&self) -> vk::DescriptorSet {
        self.set
    }

    fn descriptor_writes(&self, default_sampler: &VkSamplerState<V>) -> Vec<DescriptorWrite> {
        let rp = self.root_parameter_index;
        let parameter = &self.root_signature.desc().parameters[rp as usize];

        let mut writes = Vec::with_capacity(self.resources.len());
        for (i, (range, resource)) in parameter
            .descriptor_table
            .iter()
            .zip(&self.resources)
            .enumerate()
        {
            let descriptor_type = self.root_signature.descriptor_type(rp, i);
            let info = match (descriptor_type, resource) {
                (
                    vk::DescriptorType::UNIFORM_TEXEL_BUFFER
                    | vk::DescriptorType::STORAGE_TEXEL_BUFFER,
                    Resource::Buffer(ref buffer),
                ) => match buffer.desc.kind {
                    BufferKind::Texture(_) => DescriptorInfo::TexelBuffer(buffer.view),
                    kind => {
                        error!("[VK] {:?} buffer could not be bound as texel buffer.", kind);
                        continue;
                    }
                },

                (_, Resource::Buffer(ref buffer)) => DescriptorInfo::Buffer {
                    buffer: buffer.buffer,
                    range: u64::from(buffer.desc.size),
                },

                (vk::DescriptorType::STORAGE_IMAGE, Resource::Texture(ref texture)) => {
                    if !texture.desc.flags.unordered_access {
                        warn!(
                            "[VK] Texture bound to register {} was not created for unordered access.",
                            range.base_shader_register
                        );
                    }

                    DescriptorInfo::Image {
                        view: texture.view,
                        layout: vk::ImageLayout::GENERAL,
                        sampler: vk::Sampler::null(),
                    }
                }

                (_, Resource::Texture(ref texture)) => {
                    let sampler = match self.sampler_states[i] {
                        Some(ref v) => v.sampler,
                        None => default_sampler.sampler,
                    };

                    DescriptorInfo::Image {
                        view: texture.view,
                        layout: texture.layout,
                        sampler,
                    }
                }

                (_, Resource::SamplerState(ref sampler)) => DescriptorInfo::Sampler(sampler.sampler),
            };

            writes.push(DescriptorWrite {
                binding: range.base_shader_register,
                descriptor_type,
                info,
            });
        }

        writes
    }
}

impl<V: VkApi> Drop for VkResourceGroup<V> {
    fn drop(&mut self) {
        if self.set != vk::DescriptorSet::null() {
            unsafe {
                self.root_signature
                    .vk
                    .free_descriptor_set(self.root_signature.pool, self.set);
            }
        }
    }
}
