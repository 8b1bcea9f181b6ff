use std::rc::Rc;

use ash::vk;

use crate::errors::*;
use crate::rhi::capabilities::Capabilities;
use crate::rhi::pipeline::{GraphicsShaderSources, ShaderSource};

use super::api::VkApi;
use super::root_signature::VkRootSignature;

/// The shader modules of the stages of a graphics program. They are linked into a
/// pipeline when a graphics pipeline state is created.
pub struct VkGraphicsProgram<V: VkApi> {
    pub(crate) vk: Rc<V>,
    pub(crate) root_signature: Rc<VkRootSignature<V>>,
    pub(crate) stages: Vec<(vk::ShaderStageFlags, vk::ShaderModule)>,
}

impl<V: VkApi> VkGraphicsProgram<V> {
    #[inline]
    pub fn stages(&self) -> &[(vk::ShaderStageFlags, vk::ShaderModule)] {
        &self.stages
    }
}

impl<V: VkApi> Drop for VkGraphicsProgram<V> {
    fn drop(&mut self) {
        unsafe {
            for &(_, module) in &self.stages {
                self.vk.destroy_shader_module(module);
            }
        }
    }
}

pub struct VkComputeProgram<V: VkApi> {
    pub(crate) vk: Rc<V>,
    pub(crate) root_signature: Rc<VkRootSignature<V>>,
    pub(crate) module: vk::ShaderModule,
}

impl<V: VkApi> VkComputeProgram<V> {
    #[inline]
    pub fn module(&self) -> vk::ShaderModule {
        self.module
    }
}

impl<V: VkApi> Drop for VkComputeProgram<V> {
    fn drop(&mut self) {
        unsafe {
            self.vk.destroy_shader_module(self.module);
        }
    }
}

pub(crate) unsafe fn create_graphics_program<V: VkApi>(
    vk: &Rc<V>,
    caps: &Capabilities,
    root_signature: &Rc<VkRootSignature<V>>,
    sources: &GraphicsShaderSources,
) -> Result<VkGraphicsProgram<V>> {
    if (sources.tessellation_control.is_some() || sources.tessellation_evaluation.is_some())
        && !caps.tessellation_shader
    {
        return Err(Error::Unsupported("Tessellation shader".into()).into());
    }

    if sources.geometry.is_some() && !caps.geometry_shader {
        return Err(Error::Unsupported("Geometry shader".into()).into());
    }

    let stages = [
        (vk::ShaderStageFlags::VERTEX, Some(&sources.vertex)),
        (
            vk::ShaderStageFlags::TESSELLATION_CONTROL,
            sources.tessellation_control.as_ref(),
        ),
        (
            vk::ShaderStageFlags::TESSELLATION_EVALUATION,
            sources.tessellation_evaluation.as_ref(),
        ),
        (vk::ShaderStageFlags::GEOMETRY, sources.geometry.as_ref()),
        (vk::ShaderStageFlags::FRAGMENT, sources.fragment.as_ref()),
    ];

    // The modules created so far are destroyed with the program if a later stage fails.
    let mut program = VkGraphicsProgram {
        vk: vk.clone(),
        root_signature: root_signature.clone(),
        stages: Vec::with_capacity(stages.len()),
    };

    for &(stage, source) in &stages {
        if let Some(source) = source {
            let module = create_shader_module(&**vk, stage, source)?;
            program.stages.push((stage, module));
        }
    }

    Ok(program)
}

pub(crate) unsafe fn create_compute_program<V: VkApi>(
    vk: &Rc<V>,
    root_signature: &Rc<VkRootSignature<V>>,
    source: &ShaderSource,
) -> Result<VkComputeProgram<V>> {
    let module = create_shader_module(&**vk, vk::ShaderStageFlags::COMPUTE, source)?;

    Ok(VkComputeProgram {
        vk: vk.clone(),
        root_signature: root_signature.clone(),
        module,
    })
}

unsafe fn create_shader_module<V: VkApi>(
    vk: &V,
    stage: vk::ShaderStageFlags,
    source: &ShaderSource,
) -> Result<vk::ShaderModule> {
    let code = match *source {
        ShaderSource::SpirV(ref v) => v,
        ShaderSource::Glsl(_) => {
            return Err(Error::Unsupported("GLSL shader on Vulkan".into()).into());
        }
    };

    vk.create_shader_module(code).map_err(|err| {
        let log = format!("{:?} module of {} words, {}", stage, code.len(), err);
        error!("[VK] Failed to create shader module.\n{}", log);
        Error::ShaderCreationFailure(log).into()
    })
}
