use std::rc::Rc;

use gl;
use gl::types::*;

use crate::rhi::buffer::BufferKind;
use crate::rhi::resource::{Resource, RootSignatureObject};
use crate::rhi::root_signature::DescriptorRangeType;
use crate::rhi::texture::TextureDimension;

use super::api::GlApi;
use super::capabilities::GlCapabilities;
use super::device::OpenGLDevice;
use super::resources::{GlSamplerState, GlTexture};
use super::root_signature::GlRootSignature;
use super::types::{self, SamplerParameter};

/// The resources of one descriptor table.
///
/// OpenGL has nothing like descriptor sets, binding a group issues one native bind call
/// per range.
pub struct GlResourceGroup<G: GlApi> {
    pub(crate) root_signature: Rc<GlRootSignature>,
    pub(crate) root_parameter_index: u32,
    pub(crate) resources: Vec<Resource<OpenGLDevice<G>>>,
    pub(crate) sampler_states: Vec<Option<Rc<GlSamplerState<G>>>>,
}

impl<G: GlApi> GlResourceGroup<G> {
    /// # Panics
    ///
    /// Panics if the resources do not match the descriptor table 1:1, or if the sampler
    /// states are given but not one per resource.
    pub(crate) fn new(
        root_signature: &Rc<GlRootSignature>,
        root_parameter_index: u32,
        resources: &[Resource<OpenGLDevice<G>>],
        sampler_states: Option<&[Option<Rc<GlSamplerState<G>>>]>,
    ) -> Self {
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

        GlResourceGroup {
            root_signature: root_signature.clone(),
            root_parameter_index,
            resources: resources.to_vec(),
            sampler_states: samplers,
        }
    }

    #[inline]
    pub fn root_parameter_index(&self) -> u32 {
        self.root_parameter_index
    }

    #[inline]
    pub fn resources(&self) -> &[Resource<OpenGLDevice<G>>] {
        &self.resources
    }

    /// Binds every resource to the binding point its range maps to.
    pub(crate) unsafe fn bind(&self, gl: &G, caps: &GlCapabilities) {
        let rp = self.root_parameter_index as usize;
        let parameter = &self.root_signature.desc().parameters[rp];

        for (i, (range, resource)) in parameter
            .descriptor_table
            .iter()
            .zip(&self.resources)
            .enumerate()
        {
            let register = range.base_shader_register;
            match (range.range_type, resource) {
                (DescriptorRangeType::Ubv, Resource::Buffer(ref buffer)) => {
                    let binding = self
                        .root_signature
                        .uniform_block_binding(rp, i)
                        .unwrap_or(register);
                    gl.bind_buffer_base(gl::UNIFORM_BUFFER, binding, buffer.id);
                }

                (range_type, Resource::Buffer(ref buffer)) => match buffer.desc.kind {
                    BufferKind::Texture(_) if range_type == DescriptorRangeType::Srv => {
                        bind_texture_unit(gl, caps, register, gl::TEXTURE_BUFFER, buffer.texture_id);
                    }
                    BufferKind::Texture(format) => {
                        let (internal_format, _, _) = types::texture_format(format);
                        gl.bind_image_texture(
                            register,
                            buffer.texture_id,
                            0,
                            false,
                            gl::READ_WRITE,
                            internal_format,
                        );
                    }
                    _ => {
                        if buffer.id == 0 {
                            warn!(
                                "[GL] {:?} buffer only has a CPU copy and could not be bound.",
                                buffer.desc.kind
                            );
                        } else {
                            gl.bind_buffer_base(gl::SHADER_STORAGE_BUFFER, register, buffer.id);
                        }
                    }
                },

                (DescriptorRangeType::Uav, Resource::Texture(ref texture)) => {
                    let layered = texture.desc.dimension.is_array()
                        || texture.desc.dimension == TextureDimension::D3
                        || texture.desc.dimension == TextureDimension::Cube;

                    gl.bind_image_texture(
                        register,
                        texture.id,
                        0,
                        layered,
                        gl::READ_WRITE,
                        texture.internal_format,
                    );
                }

                (_, Resource::Texture(ref texture)) => {
                    bind_texture_unit(gl, caps, register, texture.target, texture.id);

                    match self.sampler_states[i] {
                        Some(ref sampler) => bind_sampler(gl, caps, register, sampler, texture),
                        None if caps.sampler_objects() => gl.bind_sampler(register, 0),
                        None => {}
                    }
                }

                (_, Resource::SamplerState(ref sampler)) => {
                    if sampler.id != 0 {
                        gl.bind_sampler(register, sampler.id);
                    }
                }
            }
        }
    }
}

unsafe fn bind_texture_unit<G: GlApi>(
    gl: &G,
    caps: &GlCapabilities,
    unit: GLuint,
    target: GLenum,
    id: GLuint,
) {
    if caps.dsa() {
        gl.bind_texture_unit(unit, id);
    } else {
        gl.active_texture(gl::TEXTURE0 + unit);
        gl.bind_texture(target, id);
    }
}

/// Binds a sampler state to a texture unit. Without sampler objects, the parameters are
/// written into the texture itself, which must be bound to `unit` already.
unsafe fn bind_sampler<G: GlApi>(
    gl: &G,
    caps: &GlCapabilities,
    unit: GLuint,
    sampler: &GlSamplerState<G>,
    texture: &GlTexture<G>,
) {
    if sampler.id != 0 {
        gl.bind_sampler(unit, sampler.id);
        return;
    }

    for &v in &sampler.parameters {
        match v {
            SamplerParameter::Int(name, value) => {
                if caps.dsa() {
                    gl.texture_parameter_i(texture.id, name, value);
                } else {
                    gl.tex_parameter_i(texture.target, name, value);
                }
            }
            SamplerParameter::Float(name, value) => {
                if caps.dsa() {
                    gl.texture_parameter_f(texture.id, name, value);
                } else {
                    gl.tex_parameter_f(texture.target, name, value);
                }
            }
            // Border colors are only supported through sampler objects.
            SamplerParameter::Color(..) => {}
        }
    }
}
