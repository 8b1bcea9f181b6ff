use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use ash::vk;
use byteorder::{ByteOrder, LittleEndian};

use crate::errors::*;
use crate::params::DeviceParams;
use crate::rhi::buffer::{
    BufferDesc, BufferKind, IndexFormat, MapType, MappedSubresource, VertexArrayVertexBuffer,
    VertexAttributes,
};
use crate::rhi::capabilities::Capabilities;
use crate::rhi::command::{self, CommandBuffer, DrawArguments, DrawIndexedArguments};
use crate::rhi::device::{Device, ShaderLanguage};
use crate::rhi::framebuffer::{
    ClearFlags, FramebufferAttachment, RenderTarget, RenderTargetObject, ScissorRectangle,
    SwapChainDesc, Viewport,
};
use crate::rhi::pipeline::{GraphicsPipelineStateDesc, GraphicsShaderSources, ShaderSource};
use crate::rhi::query::{
    PipelineStatisticsQueryResult, QueryControlFlags, QueryResultFlags, QueryType,
};
use crate::rhi::resource::{QueryPoolObject, Resource, RootSignatureObject};
use crate::rhi::root_signature::RootSignatureDesc;
use crate::rhi::sampler::SamplerStateDesc;
use crate::rhi::texture::{self, TextureDesc, TextureDimension, TextureFlags, TextureUsage};
use crate::window::{self, WindowSource};

use super::api::VkApi;
use super::capabilities::{self, VkCapabilities, KHR_SWAPCHAIN};
use super::pipeline::{self, VkComputePipelineState, VkGraphicsPipelineState};
use super::program::{self, VkComputeProgram, VkGraphicsProgram};
use super::resource_group::VkResourceGroup;
use super::resources::{
    self, AttachmentDesc, VkAttachment, VkBuffer, VkFramebuffer, VkQueryPool, VkSamplerState,
    VkSwapChain, VkTexture, VkVertexArray,
};
use super::root_signature::VkRootSignature;
use super::types;
use super::vk_error;

/// What has been recorded into the current command buffer. Bindings are only emitted
/// when they differ from it.
#[derive(Default)]
struct Emitted {
    graphics_pipeline: vk::Pipeline,
    compute_pipeline: vk::Pipeline,
    graphics_sets: Vec<vk::DescriptorSet>,
    compute_sets: Vec<vk::DescriptorSet>,
    vertex_buffers: Vec<vk::Buffer>,
    index_buffer: vk::Buffer,
    viewport: Option<[f32; 6]>,
    scissor: Option<[i32; 4]>,
}

/// The Vulkan implementation of `Device`.
///
/// Commands are recorded into a single primary command buffer, which is submitted when
/// a command buffer has been dispatched, and before anything the host reads back.
/// Submission waits for the queue to drain, so every object referenced by the recorded
/// commands is kept alive until then.
pub struct VulkanDevice<V: VkApi> {
    vk: Rc<V>,
    params: DeviceParams,
    vk_capabilities: VkCapabilities,
    capabilities: Capabilities,
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    debug_markers: bool,
    /// Samples textures which are bound without a sampler state.
    default_sampler: Rc<VkSamplerState<V>>,

    cb: vk::CommandBuffer,
    recording: bool,
    in_render_pass: bool,
    in_flight: Vec<Rc<dyn Any>>,
    emitted: Emitted,

    graphics_root_signature: Option<Rc<VkRootSignature<V>>>,
    graphics_pipeline_state: Option<Rc<VkGraphicsPipelineState<V>>>,
    graphics_resource_groups: Vec<Option<Rc<VkResourceGroup<V>>>>,
    compute_root_signature: Option<Rc<VkRootSignature<V>>>,
    compute_pipeline_state: Option<Rc<VkComputePipelineState<V>>>,
    compute_resource_groups: Vec<Option<Rc<VkResourceGroup<V>>>>,
    vertex_array: Option<Rc<VkVertexArray<V>>>,
    render_target: Option<RenderTarget<VulkanDevice<V>>>,
    viewport: Option<Viewport>,
    scissor: Option<ScissorRectangle>,
}

impl<V: VkApi> VulkanDevice<V> {
    /// Creates a device on top of a logical device. Fails if the physical device lacks
    /// one of the mandatory features.
    pub fn new(vk: V, params: DeviceParams) -> Result<Self> {
        params.validate()?;

        if let Some(ref name) = params.shader_language {
            if ShaderLanguage::from_name(name) != Some(ShaderLanguage::SpirV) {
                return Err(Error::Requirement(format!("shader language {}", name)).into());
            }
        }

        let vk = Rc::new(vk);
        unsafe {
            let vk_capabilities = VkCapabilities::parse(&*vk);
            capabilities::check_capabilities(&vk_capabilities)?;

            let capabilities = vk_capabilities.to_capabilities(&params);
            let memory_properties = vk.memory_properties();
            let debug_markers = params.debug && capabilities.debug_markers;

            let default_sampler = resources::create_sampler_state(
                &vk,
                &vk_capabilities,
                capabilities.max_anisotropy,
                &SamplerStateDesc::default(),
            )?;

            let cb = vk
                .allocate_command_buffer()
                .map_err(|err| vk_error("allocate command buffer", err))?;

            info!(
                "[VK] Device created. {} Vulkan {:?}.",
                vk_capabilities.device_name, vk_capabilities.api_version
            );
            info!("{:#?}", capabilities);

            Ok(VulkanDevice {
                vk,
                params,
                vk_capabilities,
                capabilities,
                memory_properties,
                debug_markers,
                default_sampler: Rc::new(default_sampler),
                cb,
                recording: false,
                in_render_pass: false,
                in_flight: Vec::new(),
                emitted: Emitted::default(),
                graphics_root_signature: None,
                graphics_pipeline_state: None,
                graphics_resource_groups: Vec::new(),
                compute_root_signature: None,
                compute_pipeline_state: None,
                compute_resource_groups: Vec::new(),
                vertex_array: None,
                render_target: None,
                viewport: None,
                scissor: None,
            })
        }
    }

    /// Gets the native API.
    #[inline]
    pub fn vk(&self) -> &V {
        &self.vk
    }

    #[inline]
    pub fn vk_capabilities(&self) -> &VkCapabilities {
        &self.vk_capabilities
    }

    /// The sampler of shader resource slots which come without a sampler state.
    #[inline]
    pub fn default_sampler(&self) -> &Rc<VkSamplerState<V>> {
        &self.default_sampler
    }

    /// Starts recording if nothing has been recorded since the last submission.
    unsafe fn begin(&mut self) -> vk::CommandBuffer {
        if !self.recording {
            if let Err(err) = self.vk.begin_command_buffer(self.cb) {
                error!("[VK] Failed to begin command buffer, {}.", err);
            }

            self.recording = true;
            self.emitted = Emitted::default();
        }

        self.cb
    }

    /// Submits the recorded commands and waits for them.
    fn flush(&mut self) {
        if !self.recording {
            return;
        }

        unsafe {
            self.end_render_pass();

            if let Err(err) = self.vk.end_command_buffer(self.cb) {
                error!("[VK] Failed to end command buffer, {}.", err);
            }

            if let Err(err) = self.vk.submit_and_wait(self.cb) {
                error!("[VK] Failed to submit command buffer, {}.", err);
            }
        }

        self.recording = false;
        self.in_flight.clear();
    }

    unsafe fn end_render_pass(&mut self) {
        if self.in_render_pass {
            self.vk.cmd_end_render_pass(self.cb);
            self.in_render_pass = false;
        }
    }

    /// Begins a render pass instance on the bound render target. Returns `false` if there
    /// is nothing to render into.
    unsafe fn begin_render_pass(&mut self) -> bool {
        if self.in_render_pass {
            return true;
        }

        let (render_pass, framebuffer, extent) = match self.render_target {
            Some(RenderTarget::Framebuffer(ref v)) => {
                self.in_flight.push(v.clone());
                let extent = vk::Extent2D {
                    width: v.width,
                    height: v.height,
                };

                (v.render_pass, v.framebuffer, extent)
            }
            Some(RenderTarget::SwapChain(ref v)) => {
                self.in_flight.push(v.clone());
                (v.render_pass, v.current_framebuffer(), v.extent)
            }
            None => {
                warn!("[VK] Draw without render target.");
                return false;
            }
        };

        let cb = self.begin();
        self.vk
            .cmd_begin_render_pass(cb, render_pass, framebuffer, extent);
        self.in_render_pass = true;
        true
    }

    fn render_target_size(&self) -> (u32, u32) {
        self.render_target
            .as_ref()
            .map(|v| v.width_and_height())
            .unwrap_or((1, 1))
    }

    /// Records everything a draw depends on.
    unsafe fn prepare_graphics(&mut self) -> Option<Rc<VkGraphicsPipelineState<V>>> {
        let pso = match self.graphics_pipeline_state {
            Some(ref v) => v.clone(),
            None => {
                warn!("[VK] Draw without graphics pipeline state.");
                return None;
            }
        };

        if !self.begin_render_pass() {
            return None;
        }

        let cb = self.cb;
        if self.emitted.graphics_pipeline != pso.pipeline {
            self.vk
                .cmd_bind_pipeline(cb, vk::PipelineBindPoint::GRAPHICS, pso.pipeline);
            self.emitted.graphics_pipeline = pso.pipeline;
            self.emitted.graphics_sets.clear();
            self.in_flight.push(pso.clone());
        }

        bind_resource_groups(
            &*self.vk,
            cb,
            vk::PipelineBindPoint::GRAPHICS,
            pso.root_signature.pipeline_layout,
            &self.graphics_resource_groups,
            &mut self.emitted.graphics_sets,
            &mut self.in_flight,
        );

        if let Some(ref va) = self.vertex_array {
            let buffers: Vec<_> = va.vertex_buffers.iter().map(|v| v.buffer).collect();
            if !buffers.is_empty() && self.emitted.vertex_buffers != buffers {
                self.vk.cmd_bind_vertex_buffers(cb, &buffers);
                self.emitted.vertex_buffers = buffers;
                self.in_flight.push(va.clone());
            }

            if let (Some(ib), Some(format)) = (va.index_buffer.as_ref(), va.index_format()) {
                if self.emitted.index_buffer != ib.buffer {
                    let ty = match format {
                        IndexFormat::U16 => vk::IndexType::UINT16,
                        IndexFormat::U32 => vk::IndexType::UINT32,
                    };

                    self.vk.cmd_bind_index_buffer(cb, ib.buffer, ty);
                    self.emitted.index_buffer = ib.buffer;
                    self.in_flight.push(va.clone());
                }
            }
        }

        let (w, h) = self.render_target_size();
        let vp = self
            .viewport
            .unwrap_or_else(|| Viewport::new(w as f32, h as f32));
        let raw = [
            vp.top_left_x,
            vp.top_left_y,
            vp.width,
            vp.height,
            vp.min_depth,
            vp.max_depth,
        ];

        if self.emitted.viewport != Some(raw) {
            let viewport = vk::Viewport {
                x: raw[0],
                y: raw[1],
                width: raw[2],
                height: raw[3],
                min_depth: raw[4],
                max_depth: raw[5],
            };

            self.vk.cmd_set_viewport(cb, &viewport);
            self.emitted.viewport = Some(raw);
        }

        // The scissor test is always on, it spans the whole target when disabled.
        let rect = match self.scissor {
            Some(ref v) if pso.scissor_enable => [
                v.top_left_x.max(0),
                v.top_left_y.max(0),
                v.width().max(0),
                v.height().max(0),
            ],
            _ => [0, 0, w as i32, h as i32],
        };

        if self.emitted.scissor != Some(rect) {
            let scissor = vk::Rect2D {
                offset: vk::Offset2D {
                    x: rect[0],
                    y: rect[1],
                },
                extent: vk::Extent2D {
                    width: rect[2] as u32,
                    height: rect[3] as u32,
                },
            };

            self.vk.cmd_set_scissor(cb, &scissor);
            self.emitted.scissor = Some(rect);
        }

        Some(pso)
    }

    fn has_index_buffer(&self) -> bool {
        match self.vertex_array {
            Some(ref va) if va.index_buffer.is_some() => true,
            Some(_) => {
                error!("[VK] Indexed draw without index buffer.");
                false
            }
            None => {
                error!("[VK] Indexed draw without vertex array.");
                false
            }
        }
    }

    /// Uploads the initial mipmaps of a new texture and moves it into its resting layout.
    unsafe fn initialize_texture(
        &mut self,
        texture: &Rc<VkTexture<V>>,
        mipmaps: &[&[u8]],
        generate_mipmaps: bool,
    ) -> Result<()> {
        self.end_render_pass();
        let cb = self.begin();
        self.in_flight.push(texture.clone());

        let range = full_range(texture);
        image_barrier(
            &*self.vk,
            cb,
            texture.image,
            range,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        );

        if !mipmaps.is_empty() {
            let (staging, offsets) =
                resources::create_staging_buffer(&self.vk, &self.memory_properties, mipmaps)?;

            let desc = &texture.desc;
            let regions: Vec<_> = offsets
                .iter()
                .enumerate()
                .map(|(level, &offset)| {
                    let (w, h, d) = desc.mipmap_dimensions(level as u32);
                    let depth = if desc.dimension == TextureDimension::D3 {
                        d
                    } else {
                        1
                    };

                    vk::BufferImageCopy {
                        buffer_offset: offset,
                        buffer_row_length: 0,
                        buffer_image_height: 0,
                        image_subresource: vk::ImageSubresourceLayers {
                            aspect_mask: types::view_aspect_mask(desc.format),
                            mip_level: level as u32,
                            base_array_layer: 0,
                            layer_count: texture.layers(),
                        },
                        image_offset: vk::Offset3D::default(),
                        image_extent: vk::Extent3D {
                            width: w,
                            height: h,
                            depth,
                        },
                    }
                })
                .collect();

            self.vk
                .cmd_copy_buffer_to_image(cb, staging.buffer, texture.image, &regions);
            self.in_flight.push(Rc::new(staging));
        }

        if generate_mipmaps {
            self.blit_mipmaps(texture);
        } else {
            image_barrier(
                &*self.vk,
                cb,
                texture.image,
                range,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                texture.layout,
            );
        }

        Ok(())
    }

    /// Fills every mipmap from the one above it. Every level is expected in
    /// `TRANSFER_DST_OPTIMAL` layout, and ends up in the resting layout.
    unsafe fn blit_mipmaps(&mut self, texture: &VkTexture<V>) {
        let cb = self.cb;
        let desc = &texture.desc;
        let levels = desc.mipmaps();
        let layers = texture.layers();

        let subresource = |level| vk::ImageSubresourceLayers {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            mip_level: level,
            base_array_layer: 0,
            layer_count: layers,
        };

        let corner = |level| {
            let (w, h, d) = desc.mipmap_dimensions(level);
            let d = if desc.dimension == TextureDimension::D3 {
                d
            } else {
                1
            };

            vk::Offset3D {
                x: w as i32,
                y: h as i32,
                z: d as i32,
            }
        };

        for level in 1..levels {
            image_barrier(
                &*self.vk,
                cb,
                texture.image,
                level_range(vk::ImageAspectFlags::COLOR, level - 1, 1, layers),
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            );

            let blit = vk::ImageBlit {
                src_subresource: subresource(level - 1),
                src_offsets: [vk::Offset3D::default(), corner(level - 1)],
                dst_subresource: subresource(level),
                dst_offsets: [vk::Offset3D::default(), corner(level)],
            };

            self.vk
                .cmd_blit_image(cb, texture.image, texture.image, &blit);
        }

        if levels > 1 {
            image_barrier(
                &*self.vk,
                cb,
                texture.image,
                level_range(vk::ImageAspectFlags::COLOR, 0, levels - 1, layers),
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                texture.layout,
            );
        }

        image_barrier(
            &*self.vk,
            cb,
            texture.image,
            level_range(vk::ImageAspectFlags::COLOR, levels - 1, 1, layers),
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            texture.layout,
        );
    }

    unsafe fn create_swap_chain_images(
        &mut self,
        swap_chain: &mut VkSwapChain<V>,
        format: vk::Format,
    ) -> Result<()> {
        let vk = &*self.vk;
        let range = level_range(vk::ImageAspectFlags::COLOR, 0, 1, 1);

        for &image in &swap_chain.images {
            let info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(format)
                .subresource_range(range);

            let view = vk
                .create_image_view(&info)
                .map_err(|err| vk_error("create swap chain image view", err))?;
            swap_chain.views.push(view);
        }

        let color = AttachmentDesc {
            format,
            samples: vk::SampleCountFlags::TYPE_1,
            layout: vk::ImageLayout::PRESENT_SRC_KHR,
        };

        let depth_stencil = swap_chain.depth_stencil.as_ref().map(|v| AttachmentDesc {
            format: v.format,
            samples: vk::SampleCountFlags::TYPE_1,
            layout: v.layout,
        });

        swap_chain.render_pass = resources::create_render_pass(vk, &[color], depth_stencil)
            .map_err(|err| vk_error("create swap chain render pass", err))?;

        for &view in &swap_chain.views {
            let mut attachments = vec![view];
            if swap_chain.depth_stencil.is_some() {
                attachments.push(swap_chain.depth_stencil_view);
            }

            let info = vk::FramebufferCreateInfo::default()
                .render_pass(swap_chain.render_pass)
                .attachments(&attachments)
                .width(swap_chain.extent.width)
                .height(swap_chain.extent.height)
                .layers(1);

            let framebuffer = vk
                .create_framebuffer(&info)
                .map_err(|err| vk_error("create swap chain framebuffer", err))?;
            swap_chain.framebuffers.push(framebuffer);
        }

        self.end_render_pass();
        let cb = self.begin();
        for &image in &swap_chain.images {
            image_barrier(
                &*self.vk,
                cb,
                image,
                range,
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::PRESENT_SRC_KHR,
            );
        }

        self.flush();
        Ok(())
    }

    /// Reads a query result which is ready, scaling timestamps into nanoseconds.
    fn write_query_result(&self, query_type: QueryType, values: &[u64], dst: &mut [u8]) {
        match query_type {
            QueryType::PipelineStatistics => {
                let mut counters = [0; PipelineStatisticsQueryResult::COUNTERS];
                counters.copy_from_slice(&values[..PipelineStatisticsQueryResult::COUNTERS]);
                PipelineStatisticsQueryResult::from_counters(&counters).write(dst);
            }
            QueryType::Timestamp => {
                let period = f64::from(self.vk_capabilities.properties.limits.timestamp_period);
                LittleEndian::write_u64(dst, (values[0] as f64 * period) as u64);
            }
            QueryType::Occlusion => {
                LittleEndian::write_u64(dst, values[0]);
            }
        }
    }
}

impl<V: VkApi> Drop for VulkanDevice<V> {
    fn drop(&mut self) {
        self.flush();

        unsafe {
            self.vk.free_command_buffer(self.cb);
        }
    }
}

/// Binds the descriptor sets of `groups` which differ from the ones in `emitted`.
unsafe fn bind_resource_groups<V: VkApi>(
    vk: &V,
    cb: vk::CommandBuffer,
    bind_point: vk::PipelineBindPoint,
    layout: vk::PipelineLayout,
    groups: &[Option<Rc<VkResourceGroup<V>>>],
    emitted: &mut Vec<vk::DescriptorSet>,
    in_flight: &mut Vec<Rc<dyn Any>>,
) {
    if emitted.len() < groups.len() {
        emitted.resize(groups.len(), vk::DescriptorSet::null());
    }

    for (i, group) in groups.iter().enumerate() {
        if let Some(ref v) = *group {
            if v.set == vk::DescriptorSet::null() || emitted[i] == v.set {
                continue;
            }

            vk.cmd_bind_descriptor_set(cb, bind_point, layout, i as u32, v.set);
            emitted[i] = v.set;
            in_flight.push(v.clone());
        }
    }
}

fn level_range(
    aspect_mask: vk::ImageAspectFlags,
    base_mip_level: u32,
    level_count: u32,
    layer_count: u32,
) -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask,
        base_mip_level,
        level_count,
        base_array_layer: 0,
        layer_count,
    }
}

fn full_range<V: VkApi>(texture: &VkTexture<V>) -> vk::ImageSubresourceRange {
    level_range(
        types::aspect_mask(texture.desc.format),
        0,
        texture.desc.mipmaps(),
        texture.layers(),
    )
}

fn subresource_range(v: vk::ImageSubresourceLayers) -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask: v.aspect_mask,
        base_mip_level: v.mip_level,
        level_count: 1,
        base_array_layer: v.base_array_layer,
        layer_count: v.layer_count,
    }
}

/// Moves a range of an image from one layout into another, making all previous writes
/// visible.
unsafe fn image_barrier<V: VkApi>(
    vk: &V,
    cb: vk::CommandBuffer,
    image: vk::Image,
    range: vk::ImageSubresourceRange,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
) {
    let barrier = vk::ImageMemoryBarrier::default()
        .src_access_mask(vk::AccessFlags::MEMORY_WRITE)
        .dst_access_mask(vk::AccessFlags::MEMORY_READ | vk::AccessFlags::MEMORY_WRITE)
        .old_layout(old_layout)
        .new_layout(new_layout)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(range);

    vk.cmd_pipeline_barrier(
        cb,
        vk::PipelineStageFlags::ALL_COMMANDS,
        vk::PipelineStageFlags::ALL_COMMANDS,
        &[],
        &[barrier],
    );
}

unsafe fn memory_barrier<V: VkApi>(vk: &V, cb: vk::CommandBuffer, src: vk::PipelineStageFlags) {
    let barrier = vk::MemoryBarrier::default()
        .src_access_mask(vk::AccessFlags::MEMORY_WRITE)
        .dst_access_mask(vk::AccessFlags::MEMORY_READ | vk::AccessFlags::MEMORY_WRITE);

    vk.cmd_pipeline_barrier(
        cb,
        src,
        vk::PipelineStageFlags::ALL_COMMANDS,
        &[barrier],
        &[],
    );
}

impl<V: VkApi> Device for VulkanDevice<V> {
    type Buffer = VkBuffer<V>;
    type Texture = VkTexture<V>;
    type SamplerState = VkSamplerState<V>;
    type RootSignature = VkRootSignature<V>;
    type ResourceGroup = VkResourceGroup<V>;
    type GraphicsProgram = VkGraphicsProgram<V>;
    type ComputeProgram = VkComputeProgram<V>;
    type GraphicsPipelineState = VkGraphicsPipelineState<V>;
    type ComputePipelineState = VkComputePipelineState<V>;
    type VertexArray = VkVertexArray<V>;
    type Framebuffer = VkFramebuffer<V>;
    type SwapChain = VkSwapChain<V>;
    type QueryPool = VkQueryPool<V>;

    fn name(&self) -> &'static str {
        "Vulkan"
    }

    fn params(&self) -> &DeviceParams {
        &self.params
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn shader_language(&self, name: Option<&str>) -> Result<ShaderLanguage> {
        match name {
            None => Ok(ShaderLanguage::SpirV),
            Some(name) => match ShaderLanguage::from_name(name) {
                Some(ShaderLanguage::SpirV) => Ok(ShaderLanguage::SpirV),
                _ => Err(Error::Unsupported(format!("Shader language {}", name)).into()),
            },
        }
    }

    fn create_buffer(&mut self, desc: BufferDesc, data: Option<&[u8]>) -> Result<Rc<VkBuffer<V>>> {
        desc.validate(data)?;

        unsafe {
            let buffer = resources::create_buffer(&self.vk, &self.memory_properties, desc, data)?;
            Ok(Rc::new(buffer))
        }
    }

    fn create_texture(&mut self, desc: TextureDesc, data: Option<&[u8]>) -> Result<Rc<VkTexture<V>>> {
        desc.validate(data)?;

        let mut desc = desc;
        desc.samples = self.capabilities.multisamples(desc.samples);

        let mut mipmaps = texture::split_mipmaps(&desc, data);
        if desc.samples > 1 && !mipmaps.is_empty() {
            warn!("[VK] The initial data of multisample textures is ignored.");
            mipmaps.clear();
        }

        let mut generate = desc.flags.generate_mipmaps
            && !desc.flags.data_contains_mipmaps
            && desc.mipmaps() > 1;

        if generate && (desc.format.is_depth() || desc.format.is_compressed()) {
            warn!("[VK] Could not generate mipmaps of {:?} textures.", desc.format);
            generate = false;
        }

        unsafe {
            let texture = Rc::new(resources::create_texture(
                &self.vk,
                &self.memory_properties,
                desc,
            )?);

            let result = self.initialize_texture(&texture, &mipmaps, generate);
            self.flush();
            result?;

            Ok(texture)
        }
    }

    fn create_sampler_state(&mut self, desc: &SamplerStateDesc) -> Result<Rc<VkSamplerState<V>>> {
        unsafe {
            let sampler = resources::create_sampler_state(
                &self.vk,
                &self.vk_capabilities,
                self.capabilities.max_anisotropy,
                desc,
            )?;

            Ok(Rc::new(sampler))
        }
    }

    fn create_root_signature(
        &mut self,
        desc: &RootSignatureDesc,
    ) -> Result<Rc<VkRootSignature<V>>> {
        desc.validate()?;

        unsafe {
            let rs = VkRootSignature::new(
                &self.vk,
                &self.vk_capabilities.properties.limits,
                self.params.max_resource_groups,
                desc,
            )?;

            Ok(Rc::new(rs))
        }
    }

    fn create_resource_group(
        &mut self,
        root_signature: &Rc<VkRootSignature<V>>,
        root_parameter_index: u32,
        resources: &[Resource<Self>],
        sampler_states: Option<&[Option<Rc<VkSamplerState<V>>>]>,
    ) -> Result<Rc<VkResourceGroup<V>>> {
        assert!(
            (root_parameter_index as usize) < root_signature.desc().len(),
            "Root parameter index {} out of bounds.",
            root_parameter_index
        );

        unsafe {
            let group = VkResourceGroup::new(
                root_signature,
                root_parameter_index,
                resources,
                sampler_states,
                &self.default_sampler,
            )?;

            Ok(Rc::new(group))
        }
    }

    fn create_graphics_program(
        &mut self,
        root_signature: &Rc<VkRootSignature<V>>,
        _: &VertexAttributes,
        sources: &GraphicsShaderSources,
    ) -> Result<Rc<VkGraphicsProgram<V>>> {
        // Attribute locations are assigned by the pipeline state.
        unsafe {
            let program = program::create_graphics_program(
                &self.vk,
                &self.capabilities,
                root_signature,
                sources,
            )?;

            Ok(Rc::new(program))
        }
    }

    fn create_compute_program(
        &mut self,
        root_signature: &Rc<VkRootSignature<V>>,
        source: &ShaderSource,
    ) -> Result<Rc<VkComputeProgram<V>>> {
        unsafe {
            let program = program::create_compute_program(&self.vk, root_signature, source)?;
            Ok(Rc::new(program))
        }
    }

    fn create_graphics_pipeline_state(
        &mut self,
        desc: &GraphicsPipelineStateDesc<Self>,
    ) -> Result<Rc<VkGraphicsPipelineState<V>>> {
        desc.validate(
            self.capabilities.max_patch_vertices,
            self.capabilities.max_simultaneous_render_targets,
        )?;

        unsafe {
            let pso =
                pipeline::create_graphics_pipeline_state(&self.vk, &self.vk_capabilities, desc)?;
            Ok(Rc::new(pso))
        }
    }

    fn create_compute_pipeline_state(
        &mut self,
        root_signature: &Rc<VkRootSignature<V>>,
        program: &Rc<VkComputeProgram<V>>,
    ) -> Result<Rc<VkComputePipelineState<V>>> {
        unsafe {
            let pso = pipeline::create_compute_pipeline_state(&self.vk, root_signature, program)?;
            Ok(Rc::new(pso))
        }
    }

    fn create_vertex_array(
        &mut self,
        attributes: &VertexAttributes,
        vertex_buffers: &[VertexArrayVertexBuffer<Self>],
        index_buffer: Option<&Rc<VkBuffer<V>>>,
    ) -> Result<Rc<VkVertexArray<V>>> {
        if (vertex_buffers.len() as u32) < attributes.number_of_slots() {
            return Err(Error::InvalidDescriptor(format!(
                "the attributes read from {} vertex buffers, got {}",
                attributes.number_of_slots(),
                vertex_buffers.len()
            ))
            .into());
        }

        if let Some(ib) = index_buffer {
            if let BufferKind::Index(_) = ib.desc.kind {
            } else {
                return Err(
                    Error::InvalidDescriptor(format!("{:?} as index buffer", ib.desc.kind)).into(),
                );
            }
        }

        Ok(Rc::new(VkVertexArray {
            vertex_buffers: vertex_buffers.iter().map(|v| v.buffer.clone()).collect(),
            index_buffer: index_buffer.cloned(),
        }))
    }

    fn create_framebuffer(
        &mut self,
        colors: &[FramebufferAttachment<Self>],
        depth_stencil: Option<&FramebufferAttachment<Self>>,
    ) -> Result<Rc<VkFramebuffer<V>>> {
        assert!(
            !colors.is_empty() || depth_stencil.is_some(),
            "Framebuffer without attachments."
        );

        if colors.len() > self.capabilities.max_simultaneous_render_targets as usize {
            return Err(Error::InvalidDescriptor(format!(
                "{} color attachments exceed the maximum {}",
                colors.len(),
                self.capabilities.max_simultaneous_render_targets
            ))
            .into());
        }

        let first = colors.first().or(depth_stencil).map(|v| {
            let (w, h, _) = v.texture.desc.mipmap_dimensions(v.mipmap_index);
            (w, h, v.texture.desc.samples)
        });

        let (width, height, samples) = first.unwrap_or((1, 1, 1));

        let attachments = colors
            .iter()
            .map(|v| (v, false))
            .chain(depth_stencil.map(|v| (v, true)));

        for (v, depth) in attachments {
            let desc = &v.texture.desc;
            let (w, h, _) = desc.mipmap_dimensions(v.mipmap_index);

            let reason = if !desc.flags.render_target {
                Some("attachment was not created as render target")
            } else if desc.format.is_depth() != depth {
                Some("attachment format does not fit its attachment point")
            } else if (w, h) != (width, height) {
                Some("attachments have different sizes")
            } else if desc.samples != samples {
                Some("attachments have different sample counts")
            } else if v.mipmap_index >= desc.mipmaps() {
                Some("attached mipmap does not exist")
            } else {
                None
            };

            if let Some(reason) = reason {
                error!("[VK] Framebuffer is incomplete. {}", reason);
                return Err(Error::FramebufferIncomplete(reason.into()).into());
            }
        }

        let attachment = |v: &FramebufferAttachment<Self>| VkAttachment {
            texture: v.texture.clone(),
            mipmap_index: v.mipmap_index,
            layer_index: v.layer_index,
        };

        let mut fbo = VkFramebuffer {
            vk: self.vk.clone(),
            render_pass: vk::RenderPass::null(),
            framebuffer: vk::Framebuffer::null(),
            views: Vec::with_capacity(colors.len() + 1),
            colors: colors.iter().map(attachment).collect(),
            depth_stencil: depth_stencil.map(attachment),
            width,
            height,
            samples,
        };

        unsafe {
            let vk = &*self.vk;
            let mut descs = Vec::with_capacity(colors.len());

            for v in fbo.colors.iter().chain(fbo.depth_stencil.iter()) {
                let view = resources::create_attachment_view(
                    vk,
                    &v.texture,
                    v.mipmap_index,
                    v.layer_index,
                )
                .map_err(|err| vk_error("create attachment view", err))?;

                fbo.views.push(view);
                descs.push(AttachmentDesc {
                    format: v.texture.format,
                    samples: types::sample_count(samples),
                    layout: v.texture.layout,
                });
            }

            let depth_desc = if fbo.depth_stencil.is_some() {
                descs.pop()
            } else {
                None
            };

            fbo.render_pass = resources::create_render_pass(vk, &descs, depth_desc)
                .map_err(|err| vk_error("create render pass", err))?;

            let info = vk::FramebufferCreateInfo::default()
                .render_pass(fbo.render_pass)
                .attachments(&fbo.views)
                .width(width)
                .height(height)
                .layers(1);

            fbo.framebuffer = vk
                .create_framebuffer(&info)
                .map_err(|err| vk_error("create framebuffer", err))?;
        }

        Ok(Rc::new(fbo))
    }

    fn create_swap_chain(
        &mut self,
        window: Rc<dyn WindowSource>,
        desc: &SwapChainDesc,
    ) -> Result<Rc<VkSwapChain<V>>> {
        if !self.vk_capabilities.has_extension(KHR_SWAPCHAIN) {
            warn!("[VK] {} is not supported.", KHR_SWAPCHAIN);
            return Err(Error::Unsupported("Swap chain".into()).into());
        }

        let (w, h) = window::get_width_and_height(&*window);
        let format: vk::Format = desc.color_format.into();

        unsafe {
            let images = self
                .vk
                .create_swap_chain(
                    window.platform_data(),
                    desc,
                    format,
                    vk::Extent2D {
                        width: w,
                        height: h,
                    },
                )
                .map_err(|err| vk_error("create swap chain", err))?;

            let mut swap_chain = VkSwapChain {
                vk: self.vk.clone(),
                swap_chain: images.swap_chain,
                images: images.images,
                views: Vec::new(),
                render_pass: vk::RenderPass::null(),
                framebuffers: Vec::new(),
                depth_stencil: None,
                depth_stencil_view: vk::ImageView::null(),
                current: Cell::new(0),
                window,
                desc: *desc,
                extent: images.extent,
            };

            if let Some(format) = desc.depth_stencil_format {
                let depth_desc = TextureDesc {
                    dimension: TextureDimension::D2,
                    format,
                    width: swap_chain.extent.width.max(1),
                    height: swap_chain.extent.height.max(1),
                    depth: 1,
                    flags: TextureFlags {
                        render_target: true,
                        ..TextureFlags::default()
                    },
                    usage: TextureUsage::Default,
                    samples: 1,
                };

                let texture = self.create_texture(depth_desc, None)?;
                swap_chain.depth_stencil_view =
                    resources::create_attachment_view(&*self.vk, &texture, 0, 0)
                        .map_err(|err| vk_error("create depth stencil view", err))?;
                swap_chain.depth_stencil = Some(texture);
            }

            self.create_swap_chain_images(&mut swap_chain, format)?;

            let index = self
                .vk
                .acquire_next_image(swap_chain.swap_chain)
                .map_err(|err| vk_error("acquire swap chain image", err))?;
            swap_chain.current.set(index);

            info!(
                "[VK] Swap chain created with {}x{} pixels and {} images.",
                swap_chain.extent.width,
                swap_chain.extent.height,
                swap_chain.images.len()
            );

            Ok(Rc::new(swap_chain))
        }
    }

    fn create_query_pool(
        &mut self,
        query_type: QueryType,
        number_of_queries: u32,
    ) -> Result<Rc<VkQueryPool<V>>> {
        assert!(number_of_queries > 0, "Query pool without queries.");

        let supported = match query_type {
            QueryType::Occlusion => self.capabilities.occlusion_query,
            QueryType::PipelineStatistics => self.capabilities.pipeline_statistics_query,
            QueryType::Timestamp => self.capabilities.timestamp_query,
        };

        if !supported {
            warn!("[VK] {:?} query is not supported.", query_type);
            return Err(Error::Unsupported(format!("{:?} query", query_type)).into());
        }

        let mut info = vk::QueryPoolCreateInfo::default()
            .query_type(query_type.into())
            .query_count(number_of_queries);

        if query_type == QueryType::PipelineStatistics {
            info = info.pipeline_statistics(types::PIPELINE_STATISTICS);
        }

        unsafe {
            let pool = self
                .vk
                .create_query_pool(&info)
                .map_err(|err| vk_error("create query pool", err))?;

            let pool = Rc::new(VkQueryPool {
                vk: self.vk.clone(),
                pool,
                query_type,
                number_of_queries,
            });

            // Queries must be reset before their first use.
            self.end_render_pass();
            let cb = self.begin();
            self.vk
                .cmd_reset_query_pool(cb, pool.pool, 0, number_of_queries);
            self.in_flight.push(pool.clone());

            Ok(pool)
        }
    }

    /// Buffers live in host coherent memory, every map type maps it directly.
    fn map(&mut self, buffer: &Rc<VkBuffer<V>>, _: MapType) -> Result<MappedSubresource> {
        // Pending commands might still access the buffer.
        self.flush();

        let size = buffer.desc.size as usize;
        unsafe {
            let data = self
                .vk
                .map_memory(buffer.memory, size as u64)
                .map_err(|err| vk_error("map buffer memory", err))?;

            Ok(MappedSubresource {
                data,
                size,
                row_pitch: size as u32,
                depth_pitch: size as u32,
            })
        }
    }

    fn unmap(&mut self, buffer: &Rc<VkBuffer<V>>) {
        unsafe {
            self.vk.unmap_memory(buffer.memory);
        }
    }

    fn get_query_pool_results(
        &mut self,
        pool: &Rc<VkQueryPool<V>>,
        data: &mut [u8],
        first: u32,
        count: u32,
        stride: u32,
        flags: QueryResultFlags,
    ) -> bool {
        assert!(first + count <= pool.number_of_queries, "Query out of bounds.");
        if count == 0 {
            return true;
        }

        let size = pool.query_type.result_size();
        assert!(
            data.len() >= (count - 1) as usize * stride as usize + size,
            "Query results do not fit into {} bytes.",
            data.len()
        );

        self.flush();

        let values = pool.values();
        let mut results = vec![0u64; count as usize * values];

        loop {
            let result = unsafe {
                self.vk.get_query_pool_results(
                    pool.pool,
                    first,
                    count,
                    &mut results,
                    (values * 8) as u64,
                )
            };

            match result {
                vk::Result::SUCCESS => break,
                vk::Result::NOT_READY if flags.wait => ::std::hint::spin_loop(),
                vk::Result::NOT_READY => return false,
                err => {
                    error!("[VK] Failed to get query pool results, {}.", err);
                    return false;
                }
            }
        }

        for i in 0..count as usize {
            let offset = i * stride as usize;
            self.write_query_result(
                pool.query_type,
                &results[i * values..(i + 1) * values],
                &mut data[offset..offset + size],
            );
        }

        true
    }

    fn present(&mut self, swap_chain: &Rc<VkSwapChain<V>>) {
        self.flush();

        unsafe {
            let index = swap_chain.current.get();
            if let Err(err) = self.vk.queue_present(swap_chain.swap_chain, index) {
                error!("[VK] Failed to present swap chain image {}, {}.", index, err);
            }

            match self.vk.acquire_next_image(swap_chain.swap_chain) {
                Ok(v) => swap_chain.current.set(v),
                Err(err) => error!("[VK] Failed to acquire swap chain image, {}.", err),
            }
        }
    }

    fn set_graphics_root_signature(&mut self, root_signature: Option<Rc<VkRootSignature<V>>>) {
        self.graphics_resource_groups.clear();
        self.graphics_root_signature = root_signature;
    }

    fn set_graphics_pipeline_state(&mut self, pipeline: Option<Rc<VkGraphicsPipelineState<V>>>) {
        self.graphics_pipeline_state = pipeline;
    }

    fn set_graphics_resource_group(
        &mut self,
        root_parameter_index: u32,
        group: Option<Rc<VkResourceGroup<V>>>,
    ) {
        let index = root_parameter_index as usize;
        if self.graphics_resource_groups.len() <= index {
            self.graphics_resource_groups.resize(index + 1, None);
        }

        if let Some(ref v) = group {
            debug_assert_eq!(v.root_parameter_index, root_parameter_index);
            if let Some(ref rs) = self.graphics_root_signature {
                debug_assert!(
                    Rc::ptr_eq(rs, &v.root_signature),
                    "Resource group was created against another root signature."
                );
            }
        }

        self.graphics_resource_groups[index] = group;
    }

    fn set_graphics_vertex_array(&mut self, vertex_array: Option<Rc<VkVertexArray<V>>>) {
        self.vertex_array = vertex_array;
    }

    fn set_graphics_viewports(&mut self, viewports: &[Viewport]) {
        let vp = match viewports.first() {
            Some(v) => *v,
            None => return,
        };

        if viewports.len() > 1 {
            debug!("[VK] Only the first of {} viewports is used.", viewports.len());
        }

        self.viewport = Some(vp);
    }

    fn set_graphics_scissor_rectangles(&mut self, rectangles: &[ScissorRectangle]) {
        if let Some(v) = rectangles.first() {
            self.scissor = Some(*v);
        }
    }

    fn set_graphics_render_target(&mut self, render_target: Option<RenderTarget<Self>>) {
        if self.render_target != render_target {
            unsafe {
                self.end_render_pass();
            }
        }

        if render_target.is_none() {
            self.scissor = None;
        }

        self.render_target = render_target;
    }

    fn clear_graphics(&mut self, flags: ClearFlags, color: [f32; 4], z: f32, stencil: u32) {
        if flags.is_empty() {
            return;
        }

        let (colors, depth_format) = match self.render_target {
            Some(RenderTarget::Framebuffer(ref v)) => (
                v.colors.len(),
                v.depth_stencil.as_ref().map(|a| a.texture.desc.format),
            ),
            Some(RenderTarget::SwapChain(ref v)) => (
                1,
                v.depth_stencil.as_ref().map(|t| t.desc.format),
            ),
            None => {
                warn!("[VK] Clear without render target.");
                return;
            }
        };

        let mut attachments = Vec::with_capacity(colors + 1);
        if flags.color {
            for i in 0..colors {
                attachments.push(vk::ClearAttachment {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    color_attachment: i as u32,
                    clear_value: vk::ClearValue {
                        color: vk::ClearColorValue { float32: color },
                    },
                });
            }
        }

        if let Some(format) = depth_format {
            let mut aspect_mask = vk::ImageAspectFlags::empty();
            if flags.depth {
                aspect_mask |= vk::ImageAspectFlags::DEPTH;
            }

            if flags.stencil && format.has_stencil() {
                aspect_mask |= vk::ImageAspectFlags::STENCIL;
            }

            if !aspect_mask.is_empty() {
                attachments.push(vk::ClearAttachment {
                    aspect_mask,
                    color_attachment: 0,
                    clear_value: vk::ClearValue {
                        depth_stencil: vk::ClearDepthStencilValue {
                            depth: z,
                            stencil,
                        },
                    },
                });
            }
        }

        if attachments.is_empty() {
            return;
        }

        let (w, h) = self.render_target_size();
        let rect = vk::ClearRect {
            rect: vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D {
                    width: w,
                    height: h,
                },
            },
            base_array_layer: 0,
            layer_count: 1,
        };

        unsafe {
            if self.begin_render_pass() {
                self.vk.cmd_clear_attachments(self.cb, &attachments, &rect);
            }
        }
    }

    fn draw_graphics(&mut self, buffer: &Rc<VkBuffer<V>>, offset: u32, number_of_draws: u32) {
        if number_of_draws == 0 {
            return;
        }

        unsafe {
            if self.prepare_graphics().is_none() {
                return;
            }

            self.in_flight.push(buffer.clone());

            let stride = DrawArguments::SIZE as u32;
            if number_of_draws == 1 || self.capabilities.multi_draw_indirect {
                self.vk.cmd_draw_indirect(
                    self.cb,
                    buffer.buffer,
                    u64::from(offset),
                    number_of_draws,
                    stride,
                );
            } else {
                for i in 0..number_of_draws {
                    self.vk.cmd_draw_indirect(
                        self.cb,
                        buffer.buffer,
                        u64::from(offset + i * stride),
                        1,
                        stride,
                    );
                }
            }
        }
    }

    fn draw_graphics_emulated(&mut self, arguments: &[u8], number_of_draws: u32) {
        if number_of_draws == 0 {
            return;
        }

        assert!(arguments.len() >= number_of_draws as usize * DrawArguments::SIZE);

        unsafe {
            if self.prepare_graphics().is_none() {
                return;
            }

            for i in 0..number_of_draws as usize {
                let v = DrawArguments::read(arguments, i);
                self.vk.cmd_draw(
                    self.cb,
                    v.vertex_count_per_instance,
                    v.instance_count,
                    v.start_vertex_location,
                    v.start_instance_location,
                );
            }
        }
    }

    fn draw_indexed_graphics(
        &mut self,
        buffer: &Rc<VkBuffer<V>>,
        offset: u32,
        number_of_draws: u32,
    ) {
        if number_of_draws == 0 || !self.has_index_buffer() {
            return;
        }

        unsafe {
            if self.prepare_graphics().is_none() {
                return;
            }

            self.in_flight.push(buffer.clone());

            let stride = DrawIndexedArguments::SIZE as u32;
            if number_of_draws == 1 || self.capabilities.multi_draw_indirect {
                self.vk.cmd_draw_indexed_indirect(
                    self.cb,
                    buffer.buffer,
                    u64::from(offset),
                    number_of_draws,
                    stride,
                );
            } else {
                for i in 0..number_of_draws {
                    self.vk.cmd_draw_indexed_indirect(
                        self.cb,
                        buffer.buffer,
                        u64::from(offset + i * stride),
                        1,
                        stride,
                    );
                }
            }
        }
    }

    fn draw_indexed_graphics_emulated(&mut self, arguments: &[u8], number_of_draws: u32) {
        if number_of_draws == 0 || !self.has_index_buffer() {
            return;
        }

        assert!(arguments.len() >= number_of_draws as usize * DrawIndexedArguments::SIZE);

        unsafe {
            if self.prepare_graphics().is_none() {
                return;
            }

            for i in 0..number_of_draws as usize {
                let v = DrawIndexedArguments::read(arguments, i);
                self.vk.cmd_draw_indexed(
                    self.cb,
                    v.index_count_per_instance,
                    v.instance_count,
                    v.start_index_location,
                    v.base_vertex_location,
                    v.start_instance_location,
                );
            }
        }
    }

    fn set_compute_root_signature(&mut self, root_signature: Option<Rc<VkRootSignature<V>>>) {
        self.compute_resource_groups.clear();
        self.compute_root_signature = root_signature;
    }

    fn set_compute_pipeline_state(&mut self, pipeline: Option<Rc<VkComputePipelineState<V>>>) {
        self.compute_pipeline_state = pipeline;
    }

    fn set_compute_resource_group(
        &mut self,
        root_parameter_index: u32,
        group: Option<Rc<VkResourceGroup<V>>>,
    ) {
        let index = root_parameter_index as usize;
        if self.compute_resource_groups.len() <= index {
            self.compute_resource_groups.resize(index + 1, None);
        }

        if let Some(ref v) = group {
            debug_assert_eq!(v.root_parameter_index, root_parameter_index);
            if let Some(ref rs) = self.compute_root_signature {
                debug_assert!(
                    Rc::ptr_eq(rs, &v.root_signature),
                    "Resource group was created against another root signature."
                );
            }
        }

        self.compute_resource_groups[index] = group;
    }

    fn dispatch_compute(&mut self, x: u32, y: u32, z: u32) {
        let pso = match self.compute_pipeline_state {
            Some(ref v) => v.clone(),
            None => {
                warn!("[VK] Dispatch without compute pipeline state.");
                return;
            }
        };

        unsafe {
            self.end_render_pass();
            let cb = self.begin();

            if self.emitted.compute_pipeline != pso.pipeline {
                self.vk
                    .cmd_bind_pipeline(cb, vk::PipelineBindPoint::COMPUTE, pso.pipeline);
                self.emitted.compute_pipeline = pso.pipeline;
                self.emitted.compute_sets.clear();
                self.in_flight.push(pso.clone());
            }

            bind_resource_groups(
                &*self.vk,
                cb,
                vk::PipelineBindPoint::COMPUTE,
                pso.root_signature.pipeline_layout,
                &self.compute_resource_groups,
                &mut self.emitted.compute_sets,
                &mut self.in_flight,
            );

            self.vk.cmd_dispatch(cb, x, y, z);
            memory_barrier(&*self.vk, cb, vk::PipelineStageFlags::COMPUTE_SHADER);
        }
    }

    fn set_texture_minimum_maximum_mipmap_index(
        &mut self,
        texture: &Rc<VkTexture<V>>,
        minimum: u32,
        maximum: u32,
    ) {
        debug_assert!(minimum <= maximum);
        warn!(
            "[VK] The mipmaps of texture {:?} are fixed at creation, ignoring {}..{}.",
            texture.image, minimum, maximum
        );
    }

    fn resolve_multisample_framebuffer(
        &mut self,
        destination: &RenderTarget<Self>,
        source: &Rc<VkFramebuffer<V>>,
    ) {
        let src = match source.colors.first() {
            Some(v) => v,
            None => {
                warn!("[VK] Could not resolve framebuffer without color attachment.");
                return;
            }
        };

        if source.depth_stencil.is_some() {
            debug!("[VK] Depth stencil attachments are not resolved.");
        }

        let (image, subresource, layout) = match *destination {
            RenderTarget::Framebuffer(ref v) => match v.colors.first() {
                Some(a) => (a.texture.image, a.subresource(), a.texture.layout),
                None => {
                    warn!("[VK] Could not resolve into framebuffer without color attachment.");
                    return;
                }
            },
            RenderTarget::SwapChain(ref v) => (
                v.current_image(),
                vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: 1,
                },
                vk::ImageLayout::PRESENT_SRC_KHR,
            ),
        };

        let (sw, sh) = source.width_and_height();
        let (dw, dh) = destination.width_and_height();
        let extent = vk::Extent3D {
            width: sw.min(dw),
            height: sh.min(dh),
            depth: 1,
        };

        let vk = self.vk.clone();
        let vk = &*vk;
        unsafe {
            self.end_render_pass();
            let cb = self.begin();

            let src_range = subresource_range(src.subresource());
            let dst_range = subresource_range(subresource);

            image_barrier(
                vk,
                cb,
                src.texture.image,
                src_range,
                src.texture.layout,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            );
            image_barrier(
                vk,
                cb,
                image,
                dst_range,
                layout,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            );

            if source.samples > 1 {
                let region = vk::ImageResolve {
                    src_subresource: src.subresource(),
                    src_offset: vk::Offset3D::default(),
                    dst_subresource: subresource,
                    dst_offset: vk::Offset3D::default(),
                    extent,
                };

                vk.cmd_resolve_image(cb, src.texture.image, image, &region);
            } else {
                let region = vk::ImageCopy {
                    src_subresource: src.subresource(),
                    src_offset: vk::Offset3D::default(),
                    dst_subresource: subresource,
                    dst_offset: vk::Offset3D::default(),
                    extent,
                };

                vk.cmd_copy_image(cb, src.texture.image, image, &[region]);
            }

            image_barrier(
                vk,
                cb,
                src.texture.image,
                src_range,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                src.texture.layout,
            );
            image_barrier(
                vk,
                cb,
                image,
                dst_range,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                layout,
            );
        }

        self.in_flight.push(source.clone());
        match *destination {
            RenderTarget::Framebuffer(ref v) => self.in_flight.push(v.clone()),
            RenderTarget::SwapChain(ref v) => self.in_flight.push(v.clone()),
        }
    }

    fn copy_resource(&mut self, destination: &Resource<Self>, source: &Resource<Self>) {
        match (destination, source) {
            (Resource::Buffer(ref dst), Resource::Buffer(ref src)) => {
                let size = dst.desc.size.min(src.desc.size);

                unsafe {
                    self.end_render_pass();
                    let cb = self.begin();
                    self.vk
                        .cmd_copy_buffer(cb, src.buffer, dst.buffer, u64::from(size));
                    memory_barrier(&*self.vk, cb, vk::PipelineStageFlags::TRANSFER);
                }

                self.in_flight.push(dst.clone());
                self.in_flight.push(src.clone());
            }

            (Resource::Texture(ref dst), Resource::Texture(ref src)) => {
                let (w, h, d) = src.desc.mipmap_dimensions(0);
                let depth = if src.desc.dimension == TextureDimension::D3 {
                    d
                } else {
                    1
                };

                let layers = src.layers().min(dst.layers());
                let aspect_mask = types::aspect_mask(src.desc.format);
                let subresource = vk::ImageSubresourceLayers {
                    aspect_mask,
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: layers,
                };

                let region = vk::ImageCopy {
                    src_subresource: subresource,
                    src_offset: vk::Offset3D::default(),
                    dst_subresource: subresource,
                    dst_offset: vk::Offset3D::default(),
                    extent: vk::Extent3D {
                        width: w,
                        height: h,
                        depth,
                    },
                };

                let range = level_range(aspect_mask, 0, 1, layers);
                let vk = self.vk.clone();
                let vk = &*vk;

                unsafe {
                    self.end_render_pass();
                    let cb = self.begin();

                    image_barrier(
                        vk,
                        cb,
                        src.image,
                        range,
                        src.layout,
                        vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                    );
                    image_barrier(
                        vk,
                        cb,
                        dst.image,
                        range,
                        dst.layout,
                        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    );

                    vk.cmd_copy_image(cb, src.image, dst.image, &[region]);

                    image_barrier(
                        vk,
                        cb,
                        src.image,
                        range,
                        vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                        src.layout,
                    );
                    image_barrier(
                        vk,
                        cb,
                        dst.image,
                        range,
                        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                        dst.layout,
                    );
                }

                self.in_flight.push(dst.clone());
                self.in_flight.push(src.clone());
            }

            _ => {
                error!(
                    "[VK] Could not copy {:?} into {:?}.",
                    source.resource_type(),
                    destination.resource_type()
                );
            }
        }
    }

    fn generate_mipmaps(&mut self, texture: &Rc<VkTexture<V>>) {
        let desc = &texture.desc;
        if desc.mipmaps() <= 1 {
            return;
        }

        if desc.format.is_depth() || desc.format.is_compressed() || desc.samples > 1 {
            warn!("[VK] Could not generate mipmaps of {:?} textures.", desc.format);
            return;
        }

        unsafe {
            self.end_render_pass();
            let cb = self.begin();

            image_barrier(
                &*self.vk,
                cb,
                texture.image,
                full_range(texture),
                texture.layout,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            );

            self.blit_mipmaps(texture);
        }

        self.in_flight.push(texture.clone());
    }

    fn reset_query_pool(&mut self, pool: &Rc<VkQueryPool<V>>, first: u32, count: u32) {
        debug_assert!(first + count <= pool.number_of_queries());
        if count == 0 {
            return;
        }

        unsafe {
            self.end_render_pass();
            let cb = self.begin();
            self.vk.cmd_reset_query_pool(cb, pool.pool, first, count);
        }

        self.in_flight.push(pool.clone());
    }

    fn begin_query(&mut self, pool: &Rc<VkQueryPool<V>>, index: u32, flags: QueryControlFlags) {
        debug_assert!(index < pool.number_of_queries);

        if pool.query_type == QueryType::Timestamp {
            warn!("[VK] Timestamp queries are written, not begun.");
            return;
        }

        let precise = pool.query_type == QueryType::Occlusion
            && flags.precise
            && self.vk_capabilities.precise_occlusion_query();

        unsafe {
            // Queries end in the same render pass instance they began in.
            if self.render_target.is_some() {
                self.begin_render_pass();
            }

            let cb = self.begin();
            self.vk.cmd_begin_query(cb, pool.pool, index, precise);
        }

        self.in_flight.push(pool.clone());
    }

    fn end_query(&mut self, pool: &Rc<VkQueryPool<V>>, index: u32) {
        debug_assert!(index < pool.number_of_queries);

        if pool.query_type == QueryType::Timestamp {
            return;
        }

        unsafe {
            let cb = self.begin();
            self.vk.cmd_end_query(cb, pool.pool, index);
        }
    }

    fn write_timestamp_query(&mut self, pool: &Rc<VkQueryPool<V>>, index: u32) {
        debug_assert_eq!(pool.query_type, QueryType::Timestamp);
        debug_assert!(index < pool.number_of_queries);

        unsafe {
            let cb = self.begin();
            self.vk.cmd_write_timestamp(cb, pool.pool, index);
        }

        self.in_flight.push(pool.clone());
    }

    fn set_debug_marker(&mut self, name: &str) {
        if self.debug_markers {
            unsafe {
                let cb = self.begin();
                self.vk.cmd_insert_debug_label(cb, name);
            }
        }
    }

    fn begin_debug_event(&mut self, name: &str) {
        if self.debug_markers {
            unsafe {
                let cb = self.begin();
                self.vk.cmd_begin_debug_label(cb, name);
            }
        }
    }

    fn end_debug_event(&mut self) {
        if self.debug_markers {
            unsafe {
                let cb = self.begin();
                self.vk.cmd_end_debug_label(cb);
            }
        }
    }

    /// Records a command buffer and submits it.
    fn dispatch_command_buffer(&mut self, buffer: &CommandBuffer<Self>) {
        command::dispatch(self, buffer);
        self.flush();
    }
}
