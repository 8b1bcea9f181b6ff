use std::rc::Rc;

use gl;
use gl::types::*;

use crate::errors::*;
use crate::rhi::buffer::VertexAttributes;
use crate::rhi::capabilities::Capabilities;
use crate::rhi::pipeline::{GraphicsShaderSources, ShaderSource};

use super::api::GlApi;
use super::root_signature::GlRootSignature;

/// The uniform which receives the index of the current draw of an emulated multi-draw.
pub const DRAW_ID_UNIFORM: &str = "drawIdUniform";

pub struct GlGraphicsProgram<G: GlApi> {
    pub(crate) gl: Rc<G>,
    pub(crate) id: GLuint,
    pub(crate) root_signature: Rc<GlRootSignature>,
    /// -1 if the program does not declare the draw id uniform.
    pub(crate) draw_id_location: GLint,
}

impl<G: GlApi> GlGraphicsProgram<G> {
    #[inline]
    pub fn id(&self) -> GLuint {
        self.id
    }
}

impl<G: GlApi> Drop for GlGraphicsProgram<G> {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_program(self.id);
        }
    }
}

pub struct GlComputeProgram<G: GlApi> {
    pub(crate) gl: Rc<G>,
    pub(crate) id: GLuint,
    pub(crate) root_signature: Rc<GlRootSignature>,
}

impl<G: GlApi> GlComputeProgram<G> {
    #[inline]
    pub fn id(&self) -> GLuint {
        self.id
    }
}

impl<G: GlApi> Drop for GlComputeProgram<G> {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_program(self.id);
        }
    }
}

pub(crate) unsafe fn create_graphics_program<G: GlApi>(
    gl: &Rc<G>,
    caps: &Capabilities,
    root_signature: &Rc<GlRootSignature>,
    attributes: &VertexAttributes,
    sources: &GraphicsShaderSources,
) -> Result<GlGraphicsProgram<G>> {
    if (sources.tessellation_control.is_some() || sources.tessellation_evaluation.is_some())
        && !caps.tessellation_shader
    {
        return Err(Error::Unsupported("Tessellation shader".into()).into());
    }

    if sources.geometry.is_some() && !caps.geometry_shader {
        return Err(Error::Unsupported("Geometry shader".into()).into());
    }

    let stages = [
        (gl::VERTEX_SHADER, Some(&sources.vertex)),
        (
            gl::TESS_CONTROL_SHADER,
            sources.tessellation_control.as_ref(),
        ),
        (
            gl::TESS_EVALUATION_SHADER,
            sources.tessellation_evaluation.as_ref(),
        ),
        (gl::GEOMETRY_SHADER, sources.geometry.as_ref()),
        (gl::FRAGMENT_SHADER, sources.fragment.as_ref()),
    ];

    let mut shaders = Vec::with_capacity(stages.len());
    for &(kind, source) in &stages {
        if let Some(source) = source {
            match compile(&**gl, kind, source) {
                Ok(shader) => shaders.push(shader),
                Err(err) => {
                    for shader in shaders {
                        gl.delete_shader(shader);
                    }

                    return Err(err);
                }
            }
        }
    }

    let id = link(&**gl, &shaders, Some(attributes))?;
    let draw_id_location = gl.get_uniform_location(id, DRAW_ID_UNIFORM);

    Ok(GlGraphicsProgram {
        gl: gl.clone(),
        id,
        root_signature: root_signature.clone(),
        draw_id_location,
    })
}

pub(crate) unsafe fn create_compute_program<G: GlApi>(
    gl: &Rc<G>,
    caps: &Capabilities,
    root_signature: &Rc<GlRootSignature>,
    source: &ShaderSource,
) -> Result<GlComputeProgram<G>> {
    if !caps.compute_shader {
        return Err(Error::Unsupported("Compute shader".into()).into());
    }

    let shader = compile(&**gl, gl::COMPUTE_SHADER, source)?;
    let id = link(&**gl, &[shader], None)?;

    Ok(GlComputeProgram {
        gl: gl.clone(),
        id,
        root_signature: root_signature.clone(),
    })
}

unsafe fn compile<G: GlApi>(gl: &G, kind: GLenum, source: &ShaderSource) -> Result<GLuint> {
    let src = match *source {
        ShaderSource::Glsl(ref v) => v,
        ShaderSource::SpirV(_) => {
            return Err(Error::Unsupported("SPIR-V shader on OpenGL".into()).into());
        }
    };

    let shader = gl.create_shader(kind);
    gl.shader_source(shader, src);
    gl.compile_shader(shader);

    if gl.get_shader_iv(shader, gl::COMPILE_STATUS) != GLint::from(gl::TRUE) {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);

        error!("[GL] Failed to compile shader.\n{}\n{}", log, src);
        return Err(Error::ShaderCreationFailure(log).into());
    }

    Ok(shader)
}

unsafe fn link<G: GlApi>(
    gl: &G,
    shaders: &[GLuint],
    attributes: Option<&VertexAttributes>,
) -> Result<GLuint> {
    let program = gl.create_program();
    for &shader in shaders {
        gl.attach_shader(program, shader);
    }

    if let Some(attributes) = attributes {
        for (i, v) in attributes.attributes.iter().enumerate() {
            gl.bind_attrib_location(program, i as GLuint, &v.name);
        }
    }

    gl.link_program(program);

    for &shader in shaders {
        gl.detach_shader(program, shader);
        gl.delete_shader(shader);
    }

    if gl.get_program_iv(program, gl::LINK_STATUS) != GLint::from(gl::TRUE) {
        let log = gl.get_program_info_log(program);
        gl.delete_program(program);

        error!("[GL] Failed to link program.\n{}", log);
        return Err(Error::ShaderCreationFailure(log).into());
    }

    Ok(program)
}
