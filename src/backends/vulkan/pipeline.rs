use std::ffi::CStr;
use std::rc::Rc;

use ash::vk;

use crate::errors::*;
use crate::rhi::buffer::VertexAttributes;
use crate::rhi::pipeline::{
    BlendState, DepthStencilState, GraphicsPipelineStateDesc, RasterizerState, RenderPassDesc,
    RenderTargetBlendDesc,
};

use super::api::VkApi;
use super::capabilities::VkCapabilities;
use super::device::VulkanDevice;
use super::program::{VkComputeProgram, VkGraphicsProgram};
use super::resources::{self, AttachmentDesc};
use super::root_signature::VkRootSignature;
use super::types;
use super::vk_error;

pub struct VkGraphicsPipelineState<V: VkApi> {
    pub(crate) vk: Rc<V>,
    pub(crate) root_signature: Rc<VkRootSignature<V>>,
    pub(crate) program: Rc<VkGraphicsProgram<V>>,
    /// The render pass the pipeline has been created against. Any compatible pass could
    /// be used when drawing.
    pub(crate) render_pass: vk::RenderPass,
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) scissor_enable: bool,
}

impl<V: VkApi> VkGraphicsPipelineState<V> {
    #[inline]
    pub fn pipeline(&self) -> vk::Pipeline {
        self.pipeline
    }

    #[inline]
    pub fn program(&self) -> &Rc<VkGraphicsProgram<V>> {
        &self.program
    }

    #[inline]
    pub fn root_signature(&self) -> &Rc<VkRootSignature<V>> {
        &self.root_signature
    }
}

impl<V: VkApi> Drop for VkGraphicsPipelineState<V> {
    fn drop(&mut self) {
        unsafe {
            self.vk.destroy_pipeline(self.pipeline);
            self.vk.destroy_render_pass(self.render_pass);
        }
    }
}

pub struct VkComputePipelineState<V: VkApi> {
    pub(crate) vk: Rc<V>,
    pub(crate) root_signature: Rc<VkRootSignature<V>>,
    pub(crate) program: Rc<VkComputeProgram<V>>,
    pub(crate) pipeline: vk::Pipeline,
}

impl<V: VkApi> VkComputePipelineState<V> {
    #[inline]
    pub fn pipeline(&self) -> vk::Pipeline {
        self.pipeline
    }

    #[inline]
    pub fn program(&self) -> &Rc<VkComputeProgram<V>> {
        &self.program
    }
}

impl<V: VkApi> Drop for VkComputePipelineState<V> {
    fn drop(&mut self) {
        unsafe {
            self.vk.destroy_pipeline(self.pipeline);
        }
    }
}

#[inline]
unsafe fn entry_point() -> &'static CStr {
    CStr::from_bytes_with_nul_unchecked(b"main\0")
}

/// Creates a render pass whose attachments have the formats a pipeline state renders into.
pub(crate) unsafe fn create_compatible_render_pass<V: VkApi>(
    vk: &V,
    desc: &RenderPassDesc,
) -> Result<vk::RenderPass> {
    let samples = types::sample_count(desc.samples);
    let colors: Vec<_> = desc
        .color_formats
        .iter()
        .map(|&v| AttachmentDesc {
            format: v.into(),
            samples,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        })
        .collect();

    let depth_stencil = desc.depth_stencil_format.map(|v| AttachmentDesc {
        format: v.into(),
        samples,
        layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
    });

    resources::create_render_pass(vk, &colors, depth_stencil)
        .map_err(|err| vk_error("create render pass", err))
}

fn vertex_input(
    attributes: &VertexAttributes,
) -> (
    Vec<vk::VertexInputBindingDescription>,
    Vec<vk::VertexInputAttributeDescription>,
) {
    let mut bindings: Vec<vk::VertexInputBindingDescription> = Vec::new();
    for v in &attributes.attributes {
        if bindings.iter().any(|b| b.binding == v.input_slot) {
            continue;
        }

        let input_rate = if v.instances_per_element > 0 {
            vk::VertexInputRate::INSTANCE
        } else {
            vk::VertexInputRate::VERTEX
        };

        bindings.push(vk::VertexInputBindingDescription {
            binding: v.input_slot,
            stride: v.stride_in_bytes,
            input_rate,
        });
    }

    let locations = attributes
        .attributes
        .iter()
        .enumerate()
        .map(|(i, v)| vk::VertexInputAttributeDescription {
            location: i as u32,
            binding: v.input_slot,
            format: v.format.into(),
            offset: v.aligned_byte_offset,
        })
        .collect();

    (bindings, locations)
}

fn rasterization_state(
    caps: &VkCapabilities,
    rasterizer: &RasterizerState,
) -> vk::PipelineRasterizationStateCreateInfo<'static> {
    let front_face = if rasterizer.front_counter_clockwise {
        vk::FrontFace::COUNTER_CLOCKWISE
    } else {
        vk::FrontFace::CLOCKWISE
    };

    let depth_bias = rasterizer.depth_bias != 0 || rasterizer.slope_scaled_depth_bias != 0.0;

    vk::PipelineRasterizationStateCreateInfo::default()
        .depth_clamp_enable(!rasterizer.depth_clip_enable && caps.depth_clamp())
        .rasterizer_discard_enable(false)
        .polygon_mode(rasterizer.fill_mode.into())
        .cull_mode(rasterizer.cull_mode.into())
        .front_face(front_face)
        .depth_bias_enable(depth_bias)
        .depth_bias_constant_factor(rasterizer.depth_bias as f32)
        .depth_bias_clamp(rasterizer.depth_bias_clamp)
        .depth_bias_slope_factor(rasterizer.slope_scaled_depth_bias)
        .line_width(1.0)
}

fn depth_stencil_state(v: &DepthStencilState) -> vk::PipelineDepthStencilStateCreateInfo<'static> {
    let stencil = vk::StencilOpState {
        fail_op: vk::StencilOp::KEEP,
        pass_op: vk::StencilOp::KEEP,
        depth_fail_op: vk::StencilOp::KEEP,
        compare_op: vk::CompareOp::ALWAYS,
        compare_mask: u32::from(v.stencil_read_mask),
        write_mask: u32::from(v.stencil_write_mask),
        reference: 0,
    };

    vk::PipelineDepthStencilStateCreateInfo::default()
        .depth_test_enable(v.depth_enable)
        .depth_write_enable(v.depth_write_mask)
        .depth_compare_op(v.depth_func.into())
        .depth_bounds_test_enable(false)
        .stencil_test_enable(v.stencil_enable)
        .front(stencil)
        .back(stencil)
}

fn blend_attachment(v: &RenderTargetBlendDesc) -> vk::PipelineColorBlendAttachmentState {
    vk::PipelineColorBlendAttachmentState {
        blend_enable: if v.blend_enable { vk::TRUE } else { vk::FALSE },
        src_color_blend_factor: v.src_blend.into(),
        dst_color_blend_factor: v.dest_blend.into(),
        color_blend_op: v.blend_op.into(),
        src_alpha_blend_factor: v.src_blend_alpha.into(),
        dst_alpha_blend_factor: v.dest_blend_alpha.into(),
        alpha_blend_op: v.blend_op_alpha.into(),
        color_write_mask: vk::ColorComponentFlags::from_raw(u32::from(
            v.render_target_write_mask & 0xf,
        )),
    }
}

fn blend_attachments(
    caps: &VkCapabilities,
    blend: &BlendState,
    render_targets: usize,
) -> Vec<vk::PipelineColorBlendAttachmentState> {
    let independent = blend.independent_blend_enable && caps.independent_blend();
    if blend.independent_blend_enable && !independent {
        warn!("[VK] Independent blend is not supported, all render targets use the first blend state.");
    }

    (0..render_targets)
        .map(|i| {
            if independent {
                blend_attachment(&blend.render_target[i])
            } else {
                blend_attachment(&blend.render_target[0])
            }
        })
        .collect()
}

pub(crate) unsafe fn create_graphics_pipeline_state<V: VkApi>(
    vk: &Rc<V>,
    caps: &VkCapabilities,
    desc: &GraphicsPipelineStateDesc<VulkanDevice<V>>,
) -> Result<VkGraphicsPipelineState<V>> {
    let mut pso = VkGraphicsPipelineState {
        vk: vk.clone(),
        root_signature: desc.root_signature.clone(),
        program: desc.program.clone(),
        render_pass: vk::RenderPass::null(),
        pipeline: vk::Pipeline::null(),
        scissor_enable: desc.rasterizer.scissor_enable,
    };

    pso.render_pass = create_compatible_render_pass(&**vk, &desc.render_pass)?;

    let entry = entry_point();
    let stages: Vec<_> = desc
        .program
        .stages
        .iter()
        .map(|&(stage, module)| {
            vk::PipelineShaderStageCreateInfo::default()
                .stage(stage)
                .module(module)
                .name(entry)
        })
        .collect();

    let (bindings, attributes) = vertex_input(&desc.vertex_attributes);
    let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
        .vertex_binding_descriptions(&bindings)
        .vertex_attribute_descriptions(&attributes);

    let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
        .topology(desc.primitive_topology.into())
        .primitive_restart_enable(false);

    let patch_vertices = desc.primitive_topology.patch_vertices();
    let tessellation =
        vk::PipelineTessellationStateCreateInfo::default().patch_control_points(patch_vertices);

    // The viewport and scissor are always dynamic.
    let viewport = vk::PipelineViewportStateCreateInfo::default()
        .viewport_count(1)
        .scissor_count(1);

    let rasterization = rasterization_state(caps, &desc.rasterizer);

    let multisample = vk::PipelineMultisampleStateCreateInfo::default()
        .rasterization_samples(types::sample_count(desc.render_pass.samples))
        .sample_shading_enable(false)
        .alpha_to_coverage_enable(desc.blend.alpha_to_coverage_enable)
        .alpha_to_one_enable(false);

    let depth_stencil = depth_stencil_state(&desc.depth_stencil);

    let attachments = blend_attachments(caps, &desc.blend, desc.render_pass.color_formats.len());
    let color_blend = vk::PipelineColorBlendStateCreateInfo::default()
        .logic_op_enable(false)
        .attachments(&attachments);

    let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
    let dynamic = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

    let mut info = vk::GraphicsPipelineCreateInfo::default()
        .stages(&stages)
        .vertex_input_state(&vertex_input)
        .input_assembly_state(&input_assembly)
        .viewport_state(&viewport)
        .rasterization_state(&rasterization)
        .multisample_state(&multisample)
        .depth_stencil_state(&depth_stencil)
        .color_blend_state(&color_blend)
        .dynamic_state(&dynamic)
        .layout(desc.root_signature.pipeline_layout)
        .render_pass(pso.render_pass)
        .subpass(0);

    if patch_vertices > 0 {
        info = info.tessellation_state(&tessellation);
    }

    pso.pipeline = vk
        .create_graphics_pipeline(&info)
        .map_err(|err| vk_error("create graphics pipeline", err))?;

    Ok(pso)
}

pub(crate) unsafe fn create_compute_pipeline_state<V: VkApi>(
    vk: &Rc<V>,
    root_signature: &Rc<VkRootSignature<V>>,
    program: &Rc<VkComputeProgram<V>>,
) -> Result<VkComputePipelineState<V>> {
    let stage = vk::PipelineShaderStageCreateInfo::default()
        .stage(vk::ShaderStageFlags::COMPUTE)
        .module(program.module)
        .name(entry_point());

    let info = vk::ComputePipelineCreateInfo::default()
        .stage(stage)
        .layout(root_signature.pipeline_layout);

    let pipeline = vk
        .create_compute_pipeline(&info)
        .map_err(|err| vk_error("create compute pipeline", err))?;

    Ok(VkComputePipelineState {
        vk: vk.clone(),
        root_signature: root_signature.clone(),
        program: program.clone(),
        pipeline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::vulkan::headless::HeadlessVk;
    use crate::rhi::buffer::{VertexAttribute, VertexAttributeFormat};

    #[test]
    fn vertex_bindings() {
        let attr = |name: &str, slot, instances| VertexAttribute {
            name: name.into(),
            format: VertexAttributeFormat::Float4,
            input_slot: slot,
            aligned_byte_offset: 0,
            stride_in_bytes: 16,
            instances_per_element: instances,
        };

        let attributes =
            VertexAttributes::new(vec![attr("Position", 0, 0), attr("Color", 0, 0), attr("Offset", 1, 1)]);
        let (bindings, locations) = vertex_input(&attributes);

        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[1].input_rate, vk::VertexInputRate::INSTANCE);
        assert_eq!(locations.len(), 3);
        assert_eq!(locations[2].location, 2);
        assert_eq!(locations[2].binding, 1);
    }

    #[test]
    fn blend_fallback() {
        let mut features = HeadlessVk::all_features();
        features.independent_blend = vk::FALSE;
        let vk = HeadlessVk::with_features(features);
        let caps = unsafe { VkCapabilities::parse(&vk) };

        let mut blend = BlendState::default();
        blend.independent_blend_enable = true;
        blend.render_target[1].blend_enable = true;

        let attachments = blend_attachments(&caps, &blend, 2);
        assert_eq!(attachments[1].blend_enable, vk::FALSE);

        let caps = unsafe { VkCapabilities::parse(&HeadlessVk::new()) };
        let attachments = blend_attachments(&caps, &blend, 2);
        assert_eq!(attachments[1].blend_enable, vk::TRUE);
    }
}
