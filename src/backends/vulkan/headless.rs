//! A Vulkan implementation without a GPU.
//!
//! `HeadlessVk` hands out handles, backs device memory with plain vectors, keeps the
//! contents of descriptor sets and records the commands which change what the GPU would
//! do. Misuse a validation layer would complain about is collected as validation errors
//! instead of crashing.

use std::cell::RefCell;
use std::collections::HashMap;
use std::os::raw::c_char;

use ash::prelude::VkResult;
use ash::vk::{self, Handle};

use crate::rhi::framebuffer::SwapChainDesc;
use crate::window::PlatformData;

use super::api::{DescriptorInfo, DescriptorWrite, SwapChainImages, VkApi};
use super::capabilities::KHR_SWAPCHAIN;

/// The first word of every SPIR-V module.
pub const SPIRV_MAGIC: u32 = 0x0723_0203;

/// A recorded command.
#[derive(Debug, Clone, PartialEq)]
pub enum VkCall {
    Submit,
    BeginRenderPass {
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
    },
    EndRenderPass,
    BindPipeline {
        bind_point: vk::PipelineBindPoint,
        pipeline: vk::Pipeline,
    },
    BindDescriptorSet {
        bind_point: vk::PipelineBindPoint,
        index: u32,
        set: vk::DescriptorSet,
    },
    BindVertexBuffers(Vec<vk::Buffer>),
    BindIndexBuffer {
        buffer: vk::Buffer,
        ty: vk::IndexType,
    },
    SetViewport {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    SetScissor {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    ClearAttachments(usize),
    Draw {
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },
    DrawIndexed {
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    },
    DrawIndirect {
        buffer: vk::Buffer,
        offset: u64,
        draw_count: u32,
        stride: u32,
    },
    DrawIndexedIndirect {
        buffer: vk::Buffer,
        offset: u64,
        draw_count: u32,
        stride: u32,
    },
    Dispatch(u32, u32, u32),
    PipelineBarrier {
        memory: usize,
        images: usize,
    },
    CopyBuffer {
        src: vk::Buffer,
        dst: vk::Buffer,
        size: u64,
    },
    CopyBufferToImage {
        src: vk::Buffer,
        dst: vk::Image,
        regions: usize,
    },
    CopyImage {
        src: vk::Image,
        dst: vk::Image,
    },
    BlitImage {
        src: vk::Image,
        dst: vk::Image,
    },
    ResolveImage {
        src: vk::Image,
        dst: vk::Image,
    },
    ResetQueryPool {
        pool: vk::QueryPool,
        first: u32,
        count: u32,
    },
    BeginQuery {
        pool: vk::QueryPool,
        index: u32,
        precise: bool,
    },
    EndQuery {
        pool: vk::QueryPool,
        index: u32,
    },
    WriteTimestamp {
        pool: vk::QueryPool,
        index: u32,
    },
    InsertDebugLabel(String),
    BeginDebugLabel(String),
    EndDebugLabel,
    Present {
        swap_chain: vk::SwapchainKHR,
        index: u32,
    },
}

#[derive(Debug)]
enum Object {
    Buffer { size: u64, memory: u64 },
    BufferView,
    Image { size: u64 },
    ImageView,
    Memory(Vec<u8>),
    Sampler,
    DescriptorSetLayout(HashMap<u32, vk::DescriptorType>),
    DescriptorPool,
    DescriptorSet {
        pool: u64,
        types: HashMap<u32, vk::DescriptorType>,
        descriptors: HashMap<u32, DescriptorInfo>,
    },
    PipelineLayout,
    ShaderModule,
    RenderPass,
    Pipeline,
    Framebuffer,
    QueryPool { values: usize, polls_left: Vec<u32> },
    SwapChain { images: Vec<u64>, next: u32 },
    CommandBuffer,
}

#[derive(Debug, Default)]
struct Recording {
    active: bool,
    in_render_pass: bool,
    graphics_pipeline: u64,
    compute_pipeline: u64,
    sets: HashMap<(i32, u32), u64>,
}

#[derive(Debug)]
struct State {
    next_handle: u64,
    objects: HashMap<u64, Object>,
    recording: Recording,
    failure: Option<vk::Result>,
    validation_errors: Vec<String>,
    query_latency: u32,
    query_result: u64,
    calls: Vec<VkCall>,
}

impl State {
    fn alloc(&mut self, object: Object) -> VkResult<u64> {
        if let Some(err) = self.failure.take() {
            return Err(err);
        }

        let id = self.next_handle;
        self.next_handle += 1;
        self.objects.insert(id, object);
        Ok(id)
    }

    fn invalid<T: Into<String>>(&mut self, message: T) {
        self.validation_errors.push(message.into());
    }

    fn destroy(&mut self, id: u64, what: &str) -> Option<Object> {
        if id == 0 {
            return None;
        }

        let object = self.objects.remove(&id);
        if object.is_none() {
            self.invalid(format!("destroying unknown {} {:#x}", what, id));
        }

        object
    }

    fn exists(&self, id: u64) -> bool {
        self.objects.contains_key(&id)
    }

    fn command(&mut self, call: VkCall) {
        if !self.recording.active {
            self.invalid(format!("{:?} outside of a command buffer", call));
        }

        self.calls.push(call);
    }

    fn inside_render_pass(&mut self, call: VkCall) {
        if !self.recording.in_render_pass {
            self.invalid(format!("{:?} outside of a render pass", call));
        }

        self.command(call);
    }

    fn outside_render_pass(&mut self, call: VkCall) {
        if self.recording.in_render_pass {
            self.invalid(format!("{:?} inside of a render pass", call));
        }

        self.command(call);
    }

    fn draw(&mut self, call: VkCall) {
        if self.recording.graphics_pipeline == 0 {
            self.invalid(format!("{:?} without graphics pipeline", call));
        }

        self.inside_render_pass(call);
    }

    fn restart_queries(&mut self, pool: u64, first: u32, count: u32) {
        let latency = self.query_latency;
        match self.objects.get_mut(&pool) {
            Some(Object::QueryPool {
                ref mut polls_left, ..
            }) if (first + count) as usize <= polls_left.len() => {
                for v in &mut polls_left[first as usize..(first + count) as usize] {
                    *v = latency;
                }
            }
            _ => self.invalid(format!("query {} of invalid pool {:#x}", first, pool)),
        }
    }
}

/// An emulated Vulkan device, see the module documentation.
pub struct HeadlessVk {
    properties: vk::PhysicalDeviceProperties,
    features: vk::PhysicalDeviceFeatures,
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    state: RefCell<State>,
}

impl Default for HeadlessVk {
    fn default() -> Self {
        HeadlessVk::new()
    }
}

impl HeadlessVk {
    /// Creates a Vulkan 1.3 device which supports every feature we know about.
    pub fn new() -> Self {
        HeadlessVk::with_features(HeadlessVk::all_features())
    }

    pub fn all_features() -> vk::PhysicalDeviceFeatures {
        vk::PhysicalDeviceFeatures {
            full_draw_index_uint32: vk::TRUE,
            independent_blend: vk::TRUE,
            geometry_shader: vk::TRUE,
            tessellation_shader: vk::TRUE,
            multi_draw_indirect: vk::TRUE,
            draw_indirect_first_instance: vk::TRUE,
            depth_clamp: vk::TRUE,
            multi_viewport: vk::TRUE,
            sampler_anisotropy: vk::TRUE,
            occlusion_query_precise: vk::TRUE,
            pipeline_statistics_query: vk::TRUE,
            ..vk::PhysicalDeviceFeatures::default()
        }
    }

    pub fn with_features(features: vk::PhysicalDeviceFeatures) -> Self {
        let mut properties = vk::PhysicalDeviceProperties::default();
        properties.api_version = vk::make_api_version(0, 1, 3, 0);
        properties.device_type = vk::PhysicalDeviceType::CPU;
        for (dst, src) in properties.device_name.iter_mut().zip(b"Headless Vulkan") {
            *dst = *src as c_char;
        }

        let samples = vk::SampleCountFlags::TYPE_1
            | vk::SampleCountFlags::TYPE_2
            | vk::SampleCountFlags::TYPE_4
            | vk::SampleCountFlags::TYPE_8
            | vk::SampleCountFlags::TYPE_16
            | vk::SampleCountFlags::TYPE_32;

        let limits = &mut properties.limits;
        limits.max_image_dimension2_d = 16384;
        limits.max_image_array_layers = 2048;
        limits.max_per_stage_descriptor_sampled_images = 64;
        limits.max_descriptor_set_uniform_buffers = 72;
        limits.max_uniform_buffer_range = 65536;
        limits.max_texel_buffer_elements = 128 * 1024 * 1024;
        limits.max_storage_buffer_range = 128 * 1024 * 1024;
        limits.framebuffer_color_sample_counts = samples;
        limits.framebuffer_depth_sample_counts = samples;
        limits.max_sampler_anisotropy = 16.0;
        limits.max_tessellation_patch_size = 32;
        limits.max_viewports = 16;
        limits.max_color_attachments = 8;
        limits.max_bound_descriptor_sets = 8;
        limits.timestamp_compute_and_graphics = vk::TRUE;
        limits.timestamp_period = 1.0;

        let mut memory_properties = vk::PhysicalDeviceMemoryProperties::default();
        memory_properties.memory_type_count = 2;
        memory_properties.memory_types[0] = vk::MemoryType {
            property_flags: vk::MemoryPropertyFlags::DEVICE_LOCAL,
            heap_index: 0,
        };
        memory_properties.memory_types[1] = vk::MemoryType {
            property_flags: vk::MemoryPropertyFlags::HOST_VISIBLE
                | vk::MemoryPropertyFlags::HOST_COHERENT,
            heap_index: 1,
        };
        memory_properties.memory_heap_count = 2;

        let state = State {
            next_handle: 1,
            objects: HashMap::new(),
            recording: Recording::default(),
            failure: None,
            validation_errors: Vec::new(),
            query_latency: 2,
            query_result: 0,
            calls: Vec::new(),
        };

        HeadlessVk {
            properties,
            features,
            memory_properties,
            state: RefCell::new(state),
        }
    }

    /// Makes the next object creation fail with `err`.
    pub fn fail_next(&self, err: vk::Result) {
        self.state.borrow_mut().failure = Some(err);
    }

    /// Sets the number of polls before the result of a query becomes available.
    pub fn set_query_latency(&self, polls: u32) {
        self.state.borrow_mut().query_latency = polls;
    }

    /// Sets the value every query reports from now on.
    pub fn set_query_result(&self, result: u64) {
        self.state.borrow_mut().query_result = result;
    }

    pub fn calls(&self) -> Vec<VkCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Gets everything a validation layer would have complained about so far.
    pub fn validation_errors(&self) -> Vec<String> {
        self.state.borrow().validation_errors.clone()
    }

    /// The number of objects which have been created but not destroyed yet.
    pub fn live_objects(&self) -> usize {
        self.state.borrow().objects.len()
    }

    /// Checks if a handle refers to a live object.
    pub fn is_alive<H: Handle>(&self, handle: H) -> bool {
        self.state.borrow().exists(handle.as_raw())
    }

    /// Gets the contents of a descriptor set binding.
    pub fn descriptor(&self, set: vk::DescriptorSet, binding: u32) -> Option<DescriptorInfo> {
        match self.state.borrow().objects.get(&set.as_raw()) {
            Some(Object::DescriptorSet {
                ref descriptors, ..
            }) => descriptors.get(&binding).cloned(),
            _ => None,
        }
    }

    /// Gets the descriptor set bound to `index` of a bind point in the current command
    /// buffer.
    pub fn bound_descriptor_set(
        &self,
        bind_point: vk::PipelineBindPoint,
        index: u32,
    ) -> Option<vk::DescriptorSet> {
        self.state
            .borrow()
            .recording
            .sets
            .get(&(bind_point.as_raw(), index))
            .map(|&v| vk::DescriptorSet::from_raw(v))
    }

    pub fn bound_pipeline(&self, bind_point: vk::PipelineBindPoint) -> Option<vk::Pipeline> {
        let state = self.state.borrow();
        let id = if bind_point == vk::PipelineBindPoint::COMPUTE {
            state.recording.compute_pipeline
        } else {
            state.recording.graphics_pipeline
        };

        if id == 0 {
            None
        } else {
            Some(vk::Pipeline::from_raw(id))
        }
    }

    /// Gets the contents of the memory bound to a buffer.
    pub fn buffer_data(&self, buffer: vk::Buffer) -> Option<Vec<u8>> {
        let state = self.state.borrow();
        let (size, memory) = match state.objects.get(&buffer.as_raw()) {
            Some(Object::Buffer { size, memory }) => (*size as usize, *memory),
            _ => return None,
        };

        match state.objects.get(&memory) {
            Some(Object::Memory(ref v)) => Some(v[..size.min(v.len())].to_vec()),
            _ => None,
        }
    }
}

impl VkApi for HeadlessVk {
    unsafe fn physical_device_properties(&self) -> vk::PhysicalDeviceProperties {
        self.properties
    }

    unsafe fn physical_device_features(&self) -> vk::PhysicalDeviceFeatures {
        self.features
    }

    unsafe fn memory_properties(&self) -> vk::PhysicalDeviceMemoryProperties {
        self.memory_properties
    }

    unsafe fn device_extensions(&self) -> Vec<String> {
        vec![KHR_SWAPCHAIN.to_owned()]
    }

    unsafe fn debug_utils(&self) -> bool {
        true
    }

    unsafe fn create_buffer(&self, info: &vk::BufferCreateInfo) -> VkResult<vk::Buffer> {
        let size = info.size;
        self.state
            .borrow_mut()
            .alloc(Object::Buffer { size, memory: 0 })
            .map(vk::Buffer::from_raw)
    }

    unsafe fn destroy_buffer(&self, buffer: vk::Buffer) {
        self.state.borrow_mut().destroy(buffer.as_raw(), "buffer");
    }

    unsafe fn buffer_memory_requirements(&self, buffer: vk::Buffer) -> vk::MemoryRequirements {
        let size = match self.state.borrow().objects.get(&buffer.as_raw()) {
            Some(Object::Buffer { size, .. }) => *size,
            _ => 0,
        };

        vk::MemoryRequirements {
            size,
            alignment: 256,
            memory_type_bits: 0b11,
        }
    }

    unsafe fn create_buffer_view(&self, info: &vk::BufferViewCreateInfo) -> VkResult<vk::BufferView> {
        let mut state = self.state.borrow_mut();
        if !state.exists(info.buffer.as_raw()) {
            state.invalid("buffer view of unknown buffer");
        }

        state.alloc(Object::BufferView).map(vk::BufferView::from_raw)
    }

    unsafe fn destroy_buffer_view(&self, view: vk::BufferView) {
        self.state.borrow_mut().destroy(view.as_raw(), "buffer view");
    }

    unsafe fn create_image(&self, info: &vk::ImageCreateInfo) -> VkResult<vk::Image> {
        let e = info.extent;
        let size = u64::from(e.width)
            * u64::from(e.height)
            * u64::from(e.depth)
            * u64::from(info.array_layers)
            * u64::from(info.mip_levels)
            * 16;

        self.state
            .borrow_mut()
            .alloc(Object::Image { size })
            .map(vk::Image::from_raw)
    }

    unsafe fn destroy_image(&self, image: vk::Image) {
        self.state.borrow_mut().destroy(image.as_raw(), "image");
    }

    unsafe fn image_memory_requirements(&self, image: vk::Image) -> vk::MemoryRequirements {
        let size = match self.state.borrow().objects.get(&image.as_raw()) {
            Some(Object::Image { size }) => *size,
            _ => 0,
        };

        vk::MemoryRequirements {
            size,
            alignment: 256,
            memory_type_bits: 0b11,
        }
    }

    unsafe fn create_image_view(&self, info: &vk::ImageViewCreateInfo) -> VkResult<vk::ImageView> {
        let mut state = self.state.borrow_mut();
        if !state.exists(info.image.as_raw()) {
            state.invalid("image view of unknown image");
        }

        state.alloc(Object::ImageView).map(vk::ImageView::from_raw)
    }

    unsafe fn destroy_image_view(&self, view: vk::ImageView) {
        self.state.borrow_mut().destroy(view.as_raw(), "image view");
    }

    unsafe fn allocate_memory(&self, size: u64, memory_type_index: u32) -> VkResult<vk::DeviceMemory> {
        let mut state = self.state.borrow_mut();
        if memory_type_index >= self.memory_properties.memory_type_count {
            state.invalid(format!("invalid memory type {}", memory_type_index));
        }

        state
            .alloc(Object::Memory(vec![0; size as usize]))
            .map(vk::DeviceMemory::from_raw)
    }

    unsafe fn free_memory(&self, memory: vk::DeviceMemory) {
        self.state.borrow_mut().destroy(memory.as_raw(), "memory");
    }

    unsafe fn bind_buffer_memory(&self, buffer: vk::Buffer, memory: vk::DeviceMemory) -> VkResult<()> {
        let mut state = self.state.borrow_mut();
        match state.objects.get_mut(&buffer.as_raw()) {
            Some(Object::Buffer { memory: ref mut v, .. }) => {
                *v = memory.as_raw();
                Ok(())
            }
            _ => {
                state.invalid("binding memory to unknown buffer");
                Err(vk::Result::ERROR_UNKNOWN)
            }
        }
    }

    unsafe fn bind_image_memory(&self, image: vk::Image, memory: vk::DeviceMemory) -> VkResult<()> {
        let mut state = self.state.borrow_mut();
        if !state.exists(image.as_raw()) || !state.exists(memory.as_raw()) {
            state.invalid("binding memory to unknown image");
            return Err(vk::Result::ERROR_UNKNOWN);
        }

        Ok(())
    }

    unsafe fn map_memory(&self, memory: vk::DeviceMemory, _: u64) -> VkResult<*mut u8> {
        match self.state.borrow_mut().objects.get_mut(&memory.as_raw()) {
            Some(Object::Memory(ref mut v)) => Ok(v.as_mut_ptr()),
            _ => Err(vk::Result::ERROR_MEMORY_MAP_FAILED),
        }
    }

    unsafe fn unmap_memory(&self, _: vk::DeviceMemory) {}

    unsafe fn create_sampler(&self, _: &vk::SamplerCreateInfo) -> VkResult<vk::Sampler> {
        self.state
            .borrow_mut()
            .alloc(Object::Sampler)
            .map(vk::Sampler::from_raw)
    }

    unsafe fn destroy_sampler(&self, sampler: vk::Sampler) {
        self.state.borrow_mut().destroy(sampler.as_raw(), "sampler");
    }

    unsafe fn create_descriptor_set_layout(
        &self,
        bindings: &[vk::DescriptorSetLayoutBinding],
    ) -> VkResult<vk::DescriptorSetLayout> {
        let types = bindings
            .iter()
            .map(|v| (v.binding, v.descriptor_type))
            .collect();

        self.state
            .borrow_mut()
            .alloc(Object::DescriptorSetLayout(types))
            .map(vk::DescriptorSetLayout::from_raw)
    }

    unsafe fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout) {
        self.state
            .borrow_mut()
            .destroy(layout.as_raw(), "descriptor set layout");
    }

    unsafe fn create_descriptor_pool(
        &self,
        _: u32,
        sizes: &[vk::DescriptorPoolSize],
    ) -> VkResult<vk::DescriptorPool> {
        let mut state = self.state.borrow_mut();
        if sizes.is_empty() {
            state.invalid("descriptor pool without pool sizes");
        }

        state
            .alloc(Object::DescriptorPool)
            .map(vk::DescriptorPool::from_raw)
    }

    unsafe fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
        let mut state = self.state.borrow_mut();
        let id = pool.as_raw();
        state.destroy(id, "descriptor pool");

        // Destroying a pool implicitly frees its sets.
        state.objects.retain(|_, v| match *v {
            Object::DescriptorSet { pool, .. } => pool != id,
            _ => true,
        });
    }

    unsafe fn allocate_descriptor_set(
        &self,
        pool: vk::DescriptorPool,
        layout: vk::DescriptorSetLayout,
    ) -> VkResult<vk::DescriptorSet> {
        let mut state = self.state.borrow_mut();
        let types = match state.objects.get(&layout.as_raw()) {
            Some(Object::DescriptorSetLayout(ref v)) => v.clone(),
            _ => {
                state.invalid("allocating from unknown descriptor set layout");
                return Err(vk::Result::ERROR_UNKNOWN);
            }
        };

        if !state.exists(pool.as_raw()) {
            state.invalid("allocating from unknown descriptor pool");
            return Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY);
        }

        state
            .alloc(Object::DescriptorSet {
                pool: pool.as_raw(),
                types,
                descriptors: HashMap::new(),
            })
            .map(vk::DescriptorSet::from_raw)
    }

    unsafe fn free_descriptor_set(&self, pool: vk::DescriptorPool, set: vk::DescriptorSet) {
        let mut state = self.state.borrow_mut();
        if !state.exists(pool.as_raw()) {
            state.invalid(format!(
                "freeing descriptor set {:#x} into destroyed pool",
                set.as_raw()
            ));
        }

        state.destroy(set.as_raw(), "descriptor set");
    }

    unsafe fn update_descriptor_set(&self, set: vk::DescriptorSet, writes: &[DescriptorWrite]) {
        let mut state = self.state.borrow_mut();
        let mut errors = Vec::new();

        match state.objects.get_mut(&set.as_raw()) {
            Some(Object::DescriptorSet {
                ref types,
                ref mut descriptors,
                ..
            }) => {
                for w in writes {
                    if types.get(&w.binding) != Some(&w.descriptor_type) {
                        errors.push(format!(
                            "binding {} is not declared as {:?}",
                            w.binding, w.descriptor_type
                        ));
                    }

                    descriptors.insert(w.binding, w.info);
                }
            }
            _ => errors.push("updating unknown descriptor set".to_owned()),
        }

        for v in errors {
            state.invalid(v);
        }
    }

    unsafe fn create_pipeline_layout(
        &self,
        layouts: &[vk::DescriptorSetLayout],
    ) -> VkResult<vk::PipelineLayout> {
        let mut state = self.state.borrow_mut();
        if layouts.iter().any(|v| !state.exists(v.as_raw())) {
            state.invalid("pipeline layout with unknown descriptor set layout");
        }

        state
            .alloc(Object::PipelineLayout)
            .map(vk::PipelineLayout::from_raw)
    }

    unsafe fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout) {
        self.state
            .borrow_mut()
            .destroy(layout.as_raw(), "pipeline layout");
    }

    unsafe fn create_shader_module(&self, code: &[u32]) -> VkResult<vk::ShaderModule> {
        if code.first() != Some(&SPIRV_MAGIC) {
            return Err(vk::Result::ERROR_INVALID_SHADER_NV);
        }

        self.state
            .borrow_mut()
            .alloc(Object::ShaderModule)
            .map(vk::ShaderModule::from_raw)
    }

    unsafe fn destroy_shader_module(&self, module: vk::ShaderModule) {
        self.state
            .borrow_mut()
            .destroy(module.as_raw(), "shader module");
    }

    unsafe fn create_render_pass(&self, _: &vk::RenderPassCreateInfo) -> VkResult<vk::RenderPass> {
        self.state
            .borrow_mut()
            .alloc(Object::RenderPass)
            .map(vk::RenderPass::from_raw)
    }

    unsafe fn destroy_render_pass(&self, render_pass: vk::RenderPass) {
        self.state
            .borrow_mut()
            .destroy(render_pass.as_raw(), "render pass");
    }

    unsafe fn create_graphics_pipeline(
        &self,
        info: &vk::GraphicsPipelineCreateInfo,
    ) -> VkResult<vk::Pipeline> {
        let mut state = self.state.borrow_mut();
        if !state.exists(info.layout.as_raw()) || !state.exists(info.render_pass.as_raw()) {
            state.invalid("graphics pipeline with unknown layout or render pass");
        }

        let stages = ::std::slice::from_raw_parts(info.p_stages, info.stage_count as usize);
        if stages.iter().any(|v| !state.exists(v.module.as_raw())) {
            state.invalid("graphics pipeline with unknown shader module");
        }

        state.alloc(Object::Pipeline).map(vk::Pipeline::from_raw)
    }

    unsafe fn create_compute_pipeline(
        &self,
        info: &vk::ComputePipelineCreateInfo,
    ) -> VkResult<vk::Pipeline> {
        let mut state = self.state.borrow_mut();
        if !state.exists(info.layout.as_raw()) || !state.exists(info.stage.module.as_raw()) {
            state.invalid("compute pipeline with unknown layout or shader module");
        }

        state.alloc(Object::Pipeline).map(vk::Pipeline::from_raw)
    }

    unsafe fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
        self.state.borrow_mut().destroy(pipeline.as_raw(), "pipeline");
    }

    unsafe fn create_framebuffer(&self, info: &vk::FramebufferCreateInfo) -> VkResult<vk::Framebuffer> {
        let mut state = self.state.borrow_mut();
        let views = ::std::slice::from_raw_parts(info.p_attachments, info.attachment_count as usize);
        if views.iter().any(|v| !state.exists(v.as_raw())) {
            state.invalid("framebuffer with unknown attachment");
        }

        state.alloc(Object::Framebuffer).map(vk::Framebuffer::from_raw)
    }

    unsafe fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        self.state
            .borrow_mut()
            .destroy(framebuffer.as_raw(), "framebuffer");
    }

    unsafe fn create_query_pool(&self, info: &vk::QueryPoolCreateInfo) -> VkResult<vk::QueryPool> {
        let values = if info.query_type == vk::QueryType::PIPELINE_STATISTICS {
            info.pipeline_statistics.as_raw().count_ones() as usize
        } else {
            1
        };

        let mut state = self.state.borrow_mut();
        let polls_left = vec![0; info.query_count as usize];
        state
            .alloc(Object::QueryPool { values, polls_left })
            .map(vk::QueryPool::from_raw)
    }

    unsafe fn destroy_query_pool(&self, pool: vk::QueryPool) {
        self.state.borrow_mut().destroy(pool.as_raw(), "query pool");
    }

    unsafe fn get_query_pool_results(
        &self,
        pool: vk::QueryPool,
        first: u32,
        count: u32,
        data: &mut [u64],
        stride: u64,
    ) -> vk::Result {
        let mut state = self.state.borrow_mut();
        let result = state.query_result;

        let (values, polls_left) = match state.objects.get_mut(&pool.as_raw()) {
            Some(Object::QueryPool {
                values,
                ref mut polls_left,
            }) => (*values, polls_left),
            _ => return vk::Result::ERROR_UNKNOWN,
        };

        let range = first as usize..(first + count) as usize;
        let mut ready = true;
        for v in &mut polls_left[range] {
            if *v > 0 {
                *v -= 1;
            }

            ready &= *v == 0;
        }

        if !ready {
            return vk::Result::NOT_READY;
        }

        let words = (stride / 8) as usize;
        for i in 0..count as usize {
            for v in &mut data[i * words..i * words + values] {
                *v = result;
            }
        }

        vk::Result::SUCCESS
    }

    unsafe fn create_swap_chain(
        &self,
        _: PlatformData,
        desc: &SwapChainDesc,
        _: vk::Format,
        extent: vk::Extent2D,
    ) -> VkResult<SwapChainImages> {
        let mut state = self.state.borrow_mut();

        let mut images = Vec::new();
        for _ in 0..desc.buffer_count.max(2) {
            images.push(state.alloc(Object::Image { size: 0 })?);
        }

        let handles = images.iter().map(|&v| vk::Image::from_raw(v)).collect();
        let swap_chain = state.alloc(Object::SwapChain { images, next: 0 })?;

        Ok(SwapChainImages {
            swap_chain: vk::SwapchainKHR::from_raw(swap_chain),
            images: handles,
            extent,
        })
    }

    unsafe fn destroy_swap_chain(&self, swap_chain: vk::SwapchainKHR) {
        let mut state = self.state.borrow_mut();
        if let Some(Object::SwapChain { images, .. }) =
            state.destroy(swap_chain.as_raw(), "swap chain")
        {
            for v in images {
                state.destroy(v, "swap chain image");
            }
        }
    }

    unsafe fn acquire_next_image(&self, swap_chain: vk::SwapchainKHR) -> VkResult<u32> {
        match self.state.borrow_mut().objects.get_mut(&swap_chain.as_raw()) {
            Some(Object::SwapChain {
                ref images,
                ref mut next,
            }) => {
                let index = *next;
                *next = (*next + 1) % images.len() as u32;
                Ok(index)
            }
            _ => Err(vk::Result::ERROR_SURFACE_LOST_KHR),
        }
    }

    unsafe fn queue_present(&self, swap_chain: vk::SwapchainKHR, index: u32) -> VkResult<()> {
        let mut state = self.state.borrow_mut();
        if !state.exists(swap_chain.as_raw()) {
            return Err(vk::Result::ERROR_SURFACE_LOST_KHR);
        }

        state.calls.push(VkCall::Present { swap_chain, index });
        Ok(())
    }

    unsafe fn allocate_command_buffer(&self) -> VkResult<vk::CommandBuffer> {
        self.state
            .borrow_mut()
            .alloc(Object::CommandBuffer)
            .map(vk::CommandBuffer::from_raw)
    }

    unsafe fn free_command_buffer(&self, cb: vk::CommandBuffer) {
        self.state.borrow_mut().destroy(cb.as_raw(), "command buffer");
    }

    unsafe fn begin_command_buffer(&self, _: vk::CommandBuffer) -> VkResult<()> {
        let mut state = self.state.borrow_mut();
        if state.recording.active {
            state.invalid("command buffer is already recording");
        }

        state.recording = Recording {
            active: true,
            ..Recording::default()
        };

        Ok(())
    }

    unsafe fn end_command_buffer(&self, _: vk::CommandBuffer) -> VkResult<()> {
        let mut state = self.state.borrow_mut();
        if state.recording.in_render_pass {
            state.invalid("command buffer ended inside of a render pass");
        }

        state.recording.active = false;
        Ok(())
    }

    unsafe fn submit_and_wait(&self, _: vk::CommandBuffer) -> VkResult<()> {
        let mut state = self.state.borrow_mut();
        if state.recording.active {
            state.invalid("submitting a command buffer which is still recording");
        }

        state.calls.push(VkCall::Submit);
        Ok(())
    }

    unsafe fn cmd_begin_render_pass(
        &self,
        _: vk::CommandBuffer,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        _: vk::Extent2D,
    ) {
        let mut state = self.state.borrow_mut();
        state.outside_render_pass(VkCall::BeginRenderPass {
            render_pass,
            framebuffer,
        });
        state.recording.in_render_pass = true;
    }

    unsafe fn cmd_end_render_pass(&self, _: vk::CommandBuffer) {
        let mut state = self.state.borrow_mut();
        state.inside_render_pass(VkCall::EndRenderPass);
        state.recording.in_render_pass = false;
    }

    unsafe fn cmd_bind_pipeline(
        &self,
        _: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        pipeline: vk::Pipeline,
    ) {
        let mut state = self.state.borrow_mut();
        if !state.exists(pipeline.as_raw()) {
            state.invalid("binding unknown pipeline");
        }

        if bind_point == vk::PipelineBindPoint::COMPUTE {
            state.recording.compute_pipeline = pipeline.as_raw();
        } else {
            state.recording.graphics_pipeline = pipeline.as_raw();
        }

        state.command(VkCall::BindPipeline {
            bind_point,
            pipeline,
        });
    }

    unsafe fn cmd_bind_descriptor_set(
        &self,
        _: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        _: vk::PipelineLayout,
        index: u32,
        set: vk::DescriptorSet,
    ) {
        let mut state = self.state.borrow_mut();
        if !state.exists(set.as_raw()) {
            state.invalid("binding unknown descriptor set");
        }

        state
            .recording
            .sets
            .insert((bind_point.as_raw(), index), set.as_raw());
        state.command(VkCall::BindDescriptorSet {
            bind_point,
            index,
            set,
        });
    }

    unsafe fn cmd_bind_vertex_buffers(&self, _: vk::CommandBuffer, buffers: &[vk::Buffer]) {
        self.state
            .borrow_mut()
            .command(VkCall::BindVertexBuffers(buffers.to_vec()));
    }

    unsafe fn cmd_bind_index_buffer(&self, _: vk::CommandBuffer, buffer: vk::Buffer, ty: vk::IndexType) {
        self.state
            .borrow_mut()
            .command(VkCall::BindIndexBuffer { buffer, ty });
    }

    unsafe fn cmd_set_viewport(&self, _: vk::CommandBuffer, v: &vk::Viewport) {
        self.state.borrow_mut().command(VkCall::SetViewport {
            x: v.x,
            y: v.y,
            width: v.width,
            height: v.height,
        });
    }

    unsafe fn cmd_set_scissor(&self, _: vk::CommandBuffer, rect: &vk::Rect2D) {
        self.state.borrow_mut().command(VkCall::SetScissor {
            x: rect.offset.x,
            y: rect.offset.y,
            width: rect.extent.width,
            height: rect.extent.height,
        });
    }

    unsafe fn cmd_clear_attachments(
        &self,
        _: vk::CommandBuffer,
        attachments: &[vk::ClearAttachment],
        _: &vk::ClearRect,
    ) {
        self.state
            .borrow_mut()
            .inside_render_pass(VkCall::ClearAttachments(attachments.len()));
    }

    unsafe fn cmd_draw(
        &self,
        _: vk::CommandBuffer,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        self.state.borrow_mut().draw(VkCall::Draw {
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        });
    }

    unsafe fn cmd_draw_indexed(
        &self,
        _: vk::CommandBuffer,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        self.state.borrow_mut().draw(VkCall::DrawIndexed {
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        });
    }

    unsafe fn cmd_draw_indirect(
        &self,
        _: vk::CommandBuffer,
        buffer: vk::Buffer,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) {
        self.state.borrow_mut().draw(VkCall::DrawIndirect {
            buffer,
            offset,
            draw_count,
            stride,
        });
    }

    unsafe fn cmd_draw_indexed_indirect(
        &self,
        _: vk::CommandBuffer,
        buffer: vk::Buffer,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) {
        self.state.borrow_mut().draw(VkCall::DrawIndexedIndirect {
            buffer,
            offset,
            draw_count,
            stride,
        });
    }

    unsafe fn cmd_dispatch(&self, _: vk::CommandBuffer, x: u32, y: u32, z: u32) {
        let mut state = self.state.borrow_mut();
        if state.recording.compute_pipeline == 0 {
            state.invalid("dispatch without compute pipeline");
        }

        state.outside_render_pass(VkCall::Dispatch(x, y, z));
    }

    unsafe fn cmd_pipeline_barrier(
        &self,
        _: vk::CommandBuffer,
        _: vk::PipelineStageFlags,
        _: vk::PipelineStageFlags,
        memory: &[vk::MemoryBarrier],
        images: &[vk::ImageMemoryBarrier],
    ) {
        self.state.borrow_mut().outside_render_pass(VkCall::PipelineBarrier {
            memory: memory.len(),
            images: images.len(),
        });
    }

    unsafe fn cmd_copy_buffer(&self, _: vk::CommandBuffer, src: vk::Buffer, dst: vk::Buffer, size: u64) {
        let mut state = self.state.borrow_mut();
        state.outside_render_pass(VkCall::CopyBuffer { src, dst, size });

        let memory = |state: &State, buffer: vk::Buffer| match state.objects.get(&buffer.as_raw()) {
            Some(Object::Buffer { memory, .. }) => *memory,
            _ => 0,
        };

        let (src, dst) = (memory(&state, src), memory(&state, dst));
        let bytes = match state.objects.get(&src) {
            Some(Object::Memory(ref v)) if size as usize <= v.len() => v[..size as usize].to_vec(),
            _ => return state.invalid("copying from invalid buffer"),
        };

        match state.objects.get_mut(&dst) {
            Some(Object::Memory(ref mut v)) if bytes.len() <= v.len() => {
                v[..bytes.len()].copy_from_slice(&bytes)
            }
            _ => state.invalid("copying into invalid buffer"),
        }
    }

    unsafe fn cmd_copy_buffer_to_image(
        &self,
        _: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Image,
        regions: &[vk::BufferImageCopy],
    ) {
        self.state
            .borrow_mut()
            .outside_render_pass(VkCall::CopyBufferToImage {
                src,
                dst,
                regions: regions.len(),
            });
    }

    unsafe fn cmd_copy_image(&self, _: vk::CommandBuffer, src: vk::Image, dst: vk::Image, _: &[vk::ImageCopy]) {
        self.state
            .borrow_mut()
            .outside_render_pass(VkCall::CopyImage { src, dst });
    }

    unsafe fn cmd_blit_image(&self, _: vk::CommandBuffer, src: vk::Image, dst: vk::Image, _: &vk::ImageBlit) {
        self.state
            .borrow_mut()
            .outside_render_pass(VkCall::BlitImage { src, dst });
    }

    unsafe fn cmd_resolve_image(
        &self,
        _: vk::CommandBuffer,
        src: vk::Image,
        dst: vk::Image,
        _: &vk::ImageResolve,
    ) {
        self.state
            .borrow_mut()
            .outside_render_pass(VkCall::ResolveImage { src, dst });
    }

    unsafe fn cmd_reset_query_pool(&self, _: vk::CommandBuffer, pool: vk::QueryPool, first: u32, count: u32) {
        let mut state = self.state.borrow_mut();
        state.restart_queries(pool.as_raw(), first, count);
        state.outside_render_pass(VkCall::ResetQueryPool { pool, first, count });
    }

    unsafe fn cmd_begin_query(&self, _: vk::CommandBuffer, pool: vk::QueryPool, index: u32, precise: bool) {
        let mut state = self.state.borrow_mut();
        state.restart_queries(pool.as_raw(), index, 1);
        state.command(VkCall::BeginQuery {
            pool,
            index,
            precise,
        });
    }

    unsafe fn cmd_end_query(&self, _: vk::CommandBuffer, pool: vk::QueryPool, index: u32) {
        self.state
            .borrow_mut()
            .command(VkCall::EndQuery { pool, index });
    }

    unsafe fn cmd_write_timestamp(&self, _: vk::CommandBuffer, pool: vk::QueryPool, index: u32) {
        let mut state = self.state.borrow_mut();
        state.restart_queries(pool.as_raw(), index, 1);
        state.command(VkCall::WriteTimestamp { pool, index });
    }

    unsafe fn cmd_insert_debug_label(&self, _: vk::CommandBuffer, name: &str) {
        self.state
            .borrow_mut()
            .command(VkCall::InsertDebugLabel(name.to_owned()));
    }

    unsafe fn cmd_begin_debug_label(&self, _: vk::CommandBuffer, name: &str) {
        self.state
            .borrow_mut()
            .command(VkCall::BeginDebugLabel(name.to_owned()));
    }

    unsafe fn cmd_end_debug_label(&self, _: vk::CommandBuffer) {
        self.state.borrow_mut().command(VkCall::EndDebugLabel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_sets() {
        let vk = HeadlessVk::new();
        unsafe {
            let binding = vk::DescriptorSetLayoutBinding::default()
                .binding(3)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::ALL);

            let layout = vk.create_descriptor_set_layout(&[binding]).unwrap();
            let size = vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                descriptor_count: 4,
            };
            let pool = vk.create_descriptor_pool(4, &[size]).unwrap();
            let set = vk.allocate_descriptor_set(pool, layout).unwrap();

            let info = DescriptorInfo::Buffer {
                buffer: vk::Buffer::from_raw(42),
                range: 16,
            };

            vk.update_descriptor_set(
                set,
                &[DescriptorWrite {
                    binding: 3,
                    descriptor_type: vk::DescriptorType::UNIFORM_BUFFER,
                    info,
                }],
            );

            assert_eq!(vk.descriptor(set, 3), Some(info));
            assert!(vk.validation_errors().is_empty());

            vk.update_descriptor_set(
                set,
                &[DescriptorWrite {
                    binding: 3,
                    descriptor_type: vk::DescriptorType::STORAGE_BUFFER,
                    info,
                }],
            );
            assert_eq!(vk.validation_errors().len(), 1);

            // The pool takes its sets with it.
            vk.destroy_descriptor_pool(pool);
            assert!(!vk.is_alive(set));
            vk.free_descriptor_set(pool, set);
            assert_eq!(vk.validation_errors().len(), 3);
        }
    }

    #[test]
    fn queries() {
        let vk = HeadlessVk::new();
        vk.set_query_latency(2);
        vk.set_query_result(42);

        unsafe {
            let info = vk::QueryPoolCreateInfo::default()
                .query_type(vk::QueryType::OCCLUSION)
                .query_count(2);
            let pool = vk.create_query_pool(&info).unwrap();
            let cb = vk.allocate_command_buffer().unwrap();

            vk.begin_command_buffer(cb).unwrap();
            vk.cmd_begin_query(cb, pool, 1, false);
            vk.cmd_end_query(cb, pool, 1);
            vk.end_command_buffer(cb).unwrap();
            vk.submit_and_wait(cb).unwrap();

            let mut data = [0; 1];
            assert_eq!(
                vk.get_query_pool_results(pool, 1, 1, &mut data, 8),
                vk::Result::NOT_READY
            );
            assert_eq!(
                vk.get_query_pool_results(pool, 1, 1, &mut data, 8),
                vk::Result::SUCCESS
            );
            assert_eq!(data[0], 42);
        }

        assert!(vk.validation_errors().is_empty());
    }

    #[test]
    fn render_passes() {
        let vk = HeadlessVk::new();
        unsafe {
            let cb = vk.allocate_command_buffer().unwrap();
            vk.begin_command_buffer(cb).unwrap();
            vk.cmd_draw(cb, 3, 1, 0, 0);
            assert_eq!(vk.validation_errors().len(), 2);

            vk.fail_next(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY);
            assert_eq!(
                vk.allocate_command_buffer(),
                Err(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY)
            );
            assert!(vk.create_shader_module(&[0xdead_beef]).is_err());
        }
    }
}
