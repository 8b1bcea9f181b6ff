use std::rc::Rc;

use gl;
use gl::types::*;

use crate::rhi::pipeline::{BlendState, DepthStencilState, RasterizerState};
use crate::rhi::resource::{ResourceType, RootSignatureObject};
use crate::rhi::root_signature::DescriptorRangeType;

use super::api::GlApi;
use super::capabilities::GlCapabilities;
use super::program::{GlComputeProgram, GlGraphicsProgram};
use super::root_signature::GlRootSignature;

pub struct GlGraphicsPipelineState<G: GlApi> {
    pub(crate) root_signature: Rc<GlRootSignature>,
    pub(crate) program: Rc<GlGraphicsProgram<G>>,
    pub(crate) topology: GLenum,
    pub(crate) patch_vertices: u32,
    pub(crate) rasterizer: RasterizerState,
    pub(crate) depth_stencil: DepthStencilState,
    pub(crate) blend: BlendState,
}

impl<G: GlApi> GlGraphicsPipelineState<G> {
    #[inline]
    pub fn program(&self) -> &Rc<GlGraphicsProgram<G>> {
        &self.program
    }

    #[inline]
    pub fn root_signature(&self) -> &Rc<GlRootSignature> {
        &self.root_signature
    }
}

pub struct GlComputePipelineState<G: GlApi> {
    pub(crate) root_signature: Rc<GlRootSignature>,
    pub(crate) program: Rc<GlComputeProgram<G>>,
}

impl<G: GlApi> GlComputePipelineState<G> {
    #[inline]
    pub fn program(&self) -> &Rc<GlComputeProgram<G>> {
        &self.program
    }
}

/// Resolves the abstract binding slots of a root signature to the binding points of a
/// program.
///
/// Uniform blocks are bound to the points assigned by the root signature, samplers and
/// images get their register as unit. Ranges the program does not declare are skipped,
/// several programs may share one root signature.
pub(crate) unsafe fn resolve_bindings<G: GlApi>(
    gl: &G,
    caps: &GlCapabilities,
    program: GLuint,
    root_signature: &GlRootSignature,
) {
    let mut units = Vec::new();

    for (rp, i, range) in root_signature.desc().ranges() {
        let name = range.base_shader_register_name.as_str();
        match range.range_type {
            DescriptorRangeType::Ubv => {
                let index = gl.get_uniform_block_index(program, name);
                if index == gl::INVALID_INDEX {
                    debug!("[GL] Uniform block {} is not used by program {}.", name, program);
                    continue;
                }

                let binding = root_signature
                    .uniform_block_binding(rp, i)
                    .unwrap_or(range.base_shader_register);
                gl.uniform_block_binding(program, index, binding);
            }

            DescriptorRangeType::Sampler => {}

            DescriptorRangeType::Srv | DescriptorRangeType::Uav => {
                // Storage blocks are bound by their layout qualifiers.
                if range.resource_type.is_buffer()
                    && range.resource_type != ResourceType::TextureBuffer
                {
                    continue;
                }

                let location = gl.get_uniform_location(program, name);
                if location == -1 {
                    debug!("[GL] Uniform {} is not used by program {}.", name, program);
                    continue;
                }

                units.push((location, range.base_shader_register as GLint));
            }
        }
    }

    if units.is_empty() {
        return;
    }

    if caps.program_uniforms() {
        for (location, unit) in units {
            gl.program_uniform_1i(program, location, unit);
        }
    } else {
        let last = gl.get_integer(gl::CURRENT_PROGRAM) as GLuint;
        gl.use_program(program);

        for (location, unit) in units {
            gl.uniform_1i(location, unit);
        }

        gl.use_program(last);
    }
}
