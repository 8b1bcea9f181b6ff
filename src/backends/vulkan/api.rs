//! The thin seam between the Vulkan device and the driver.
//!
//! Most methods mirror one Vulkan entry point on the logical device. `NativeVk` forwards
//! them through `ash`, `HeadlessVk` emulates them. Descriptor writes go through
//! `DescriptorWrite`, which owns its payload instead of pointing into caller memory.

use ash::prelude::VkResult;
use ash::vk;

use crate::rhi::framebuffer::SwapChainDesc;
use crate::window::PlatformData;

/// The payload of one descriptor write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DescriptorInfo {
    Buffer {
        buffer: vk::Buffer,
        range: u64,
    },
    TexelBuffer(vk::BufferView),
    Image {
        view: vk::ImageView,
        layout: vk::ImageLayout,
        sampler: vk::Sampler,
    },
    Sampler(vk::Sampler),
}

/// Writes `info` into binding `binding` of a descriptor set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DescriptorWrite {
    pub binding: u32,
    pub descriptor_type: vk::DescriptorType,
    pub info: DescriptorInfo,
}

/// A swap chain together with its presentable images.
#[derive(Debug, Clone)]
pub struct SwapChainImages {
    pub swap_chain: vk::SwapchainKHR,
    pub images: Vec<vk::Image>,
    pub extent: vk::Extent2D,
}

pub trait VkApi: 'static {
    unsafe fn physical_device_properties(&self) -> vk::PhysicalDeviceProperties;
    unsafe fn physical_device_features(&self) -> vk::PhysicalDeviceFeatures;
    unsafe fn memory_properties(&self) -> vk::PhysicalDeviceMemoryProperties;
    unsafe fn device_extensions(&self) -> Vec<String>;
    /// Checks if `VK_EXT_debug_utils` was enabled on the instance.
    unsafe fn debug_utils(&self) -> bool;

    unsafe fn create_buffer(&self, info: &vk::BufferCreateInfo) -> VkResult<vk::Buffer>;
    unsafe fn destroy_buffer(&self, buffer: vk::Buffer);
    unsafe fn buffer_memory_requirements(&self, buffer: vk::Buffer) -> vk::MemoryRequirements;
    unsafe fn create_buffer_view(&self, info: &vk::BufferViewCreateInfo)
        -> VkResult<vk::BufferView>;
    unsafe fn destroy_buffer_view(&self, view: vk::BufferView);

    unsafe fn create_image(&self, info: &vk::ImageCreateInfo) -> VkResult<vk::Image>;
    unsafe fn destroy_image(&self, image: vk::Image);
    unsafe fn image_memory_requirements(&self, image: vk::Image) -> vk::MemoryRequirements;
    unsafe fn create_image_view(&self, info: &vk::ImageViewCreateInfo) -> VkResult<vk::ImageView>;
    unsafe fn destroy_image_view(&self, view: vk::ImageView);

    unsafe fn allocate_memory(&self, size: u64, memory_type_index: u32)
        -> VkResult<vk::DeviceMemory>;
    unsafe fn free_memory(&self, memory: vk::DeviceMemory);
    unsafe fn bind_buffer_memory(&self, buffer: vk::Buffer, memory: vk::DeviceMemory)
        -> VkResult<()>;
    unsafe fn bind_image_memory(&self, image: vk::Image, memory: vk::DeviceMemory) -> VkResult<()>;
    unsafe fn map_memory(&self, memory: vk::DeviceMemory, size: u64) -> VkResult<*mut u8>;
    unsafe fn unmap_memory(&self, memory: vk::DeviceMemory);

    unsafe fn create_sampler(&self, info: &vk::SamplerCreateInfo) -> VkResult<vk::Sampler>;
    unsafe fn destroy_sampler(&self, sampler: vk::Sampler);

    unsafe fn create_descriptor_set_layout(
        &self,
        bindings: &[vk::DescriptorSetLayoutBinding],
    ) -> VkResult<vk::DescriptorSetLayout>;
    unsafe fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout);
    /// Creates a pool whose sets could be freed individually.
    unsafe fn create_descriptor_pool(
        &self,
        max_sets: u32,
        sizes: &[vk::DescriptorPoolSize],
    ) -> VkResult<vk::DescriptorPool>;
    unsafe fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool);
    unsafe fn allocate_descriptor_set(
        &self,
        pool: vk::DescriptorPool,
        layout: vk::DescriptorSetLayout,
    ) -> VkResult<vk::DescriptorSet>;
    unsafe fn free_descriptor_set(&self, pool: vk::DescriptorPool, set: vk::DescriptorSet);
    unsafe fn update_descriptor_set(&self, set: vk::DescriptorSet, writes: &[DescriptorWrite]);
    unsafe fn create_pipeline_layout(
        &self,
        layouts: &[vk::DescriptorSetLayout],
    ) -> VkResult<vk::PipelineLayout>;
    unsafe fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout);

    unsafe fn create_shader_module(&self, code: &[u32]) -> VkResult<vk::ShaderModule>;
    unsafe fn destroy_shader_module(&self, module: vk::ShaderModule);
    unsafe fn create_render_pass(&self, info: &vk::RenderPassCreateInfo) -> VkResult<vk::RenderPass>;
    unsafe fn destroy_render_pass(&self, render_pass: vk::RenderPass);
    unsafe fn create_graphics_pipeline(
        &self,
        info: &vk::GraphicsPipelineCreateInfo,
    ) -> VkResult<vk::Pipeline>;
    unsafe fn create_compute_pipeline(
        &self,
        info: &vk::ComputePipelineCreateInfo,
    ) -> VkResult<vk::Pipeline>;
    unsafe fn destroy_pipeline(&self, pipeline: vk::Pipeline);
    unsafe fn create_framebuffer(&self, info: &vk::FramebufferCreateInfo)
        -> VkResult<vk::Framebuffer>;
    unsafe fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer);

    unsafe fn create_query_pool(&self, info: &vk::QueryPoolCreateInfo) -> VkResult<vk::QueryPool>;
    unsafe fn destroy_query_pool(&self, pool: vk::QueryPool);
    /// Reads 64 bit results without waiting. Returns `NOT_READY` if any of them is not
    /// available yet.
    unsafe fn get_query_pool_results(
        &self,
        pool: vk::QueryPool,
        first: u32,
        count: u32,
        data: &mut [u64],
        stride: u64,
    ) -> vk::Result;

    /// Creates a surface for the window and a swap chain on top of it.
    unsafe fn create_swap_chain(
        &self,
        platform: PlatformData,
        desc: &SwapChainDesc,
        format: vk::Format,
        extent: vk::Extent2D,
    ) -> VkResult<SwapChainImages>;
    /// Destroys a swap chain and the surface it was created on.
    unsafe fn destroy_swap_chain(&self, swap_chain: vk::SwapchainKHR);
    /// Acquires the next presentable image, blocking until it is available.
    unsafe fn acquire_next_image(&self, swap_chain: vk::SwapchainKHR) -> VkResult<u32>;
    unsafe fn queue_present(&self, swap_chain: vk::SwapchainKHR, index: u32) -> VkResult<()>;

    unsafe fn allocate_command_buffer(&self) -> VkResult<vk::CommandBuffer>;
    unsafe fn free_command_buffer(&self, cb: vk::CommandBuffer);
    unsafe fn begin_command_buffer(&self, cb: vk::CommandBuffer) -> VkResult<()>;
    unsafe fn end_command_buffer(&self, cb: vk::CommandBuffer) -> VkResult<()>;
    /// Submits a command buffer to the queue and blocks until it has been executed.
    unsafe fn submit_and_wait(&self, cb: vk::CommandBuffer) -> VkResult<()>;

    unsafe fn cmd_begin_render_pass(
        &self,
        cb: vk::CommandBuffer,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
    );
    unsafe fn cmd_end_render_pass(&self, cb: vk::CommandBuffer);
    unsafe fn cmd_bind_pipeline(
        &self,
        cb: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        pipeline: vk::Pipeline,
    );
    unsafe fn cmd_bind_descriptor_set(
        &self,
        cb: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        layout: vk::PipelineLayout,
        index: u32,
        set: vk::DescriptorSet,
    );
    unsafe fn cmd_bind_vertex_buffers(&self, cb: vk::CommandBuffer, buffers: &[vk::Buffer]);
    unsafe fn cmd_bind_index_buffer(
        &self,
        cb: vk::CommandBuffer,
        buffer: vk::Buffer,
        ty: vk::IndexType,
    );
    unsafe fn cmd_set_viewport(&self, cb: vk::CommandBuffer, viewport: &vk::Viewport);
    unsafe fn cmd_set_scissor(&self, cb: vk::CommandBuffer, rect: &vk::Rect2D);
    unsafe fn cmd_clear_attachments(
        &self,
        cb: vk::CommandBuffer,
        attachments: &[vk::ClearAttachment],
        rect: &vk::ClearRect,
    );
    unsafe fn cmd_draw(
        &self,
        cb: vk::CommandBuffer,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    );
    unsafe fn cmd_draw_indexed(
        &self,
        cb: vk::CommandBuffer,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    );
    unsafe fn cmd_draw_indirect(
        &self,
        cb: vk::CommandBuffer,
        buffer: vk::Buffer,
        offset: u64,
        draw_count: u32,
        stride: u32,
    );
    unsafe fn cmd_draw_indexed_indirect(
        &self,
        cb: vk::CommandBuffer,
        buffer: vk::Buffer,
        offset: u64,
        draw_count: u32,
        stride: u32,
    );
    unsafe fn cmd_dispatch(&self, cb: vk::CommandBuffer, x: u32, y: u32, z: u32);
    unsafe fn cmd_pipeline_barrier(
        &self,
        cb: vk::CommandBuffer,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        memory: &[vk::MemoryBarrier],
        images: &[vk::ImageMemoryBarrier],
    );
    unsafe fn cmd_copy_buffer(
        &self,
        cb: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Buffer,
        size: u64,
    );
    /// Copies into an image in `TRANSFER_DST_OPTIMAL` layout.
    unsafe fn cmd_copy_buffer_to_image(
        &self,
        cb: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Image,
        regions: &[vk::BufferImageCopy],
    );
    /// The source is in `TRANSFER_SRC_OPTIMAL`, the destination in `TRANSFER_DST_OPTIMAL`
    /// layout. The same holds for blits and resolves.
    unsafe fn cmd_copy_image(
        &self,
        cb: vk::CommandBuffer,
        src: vk::Image,
        dst: vk::Image,
        regions: &[vk::ImageCopy],
    );
    unsafe fn cmd_blit_image(
        &self,
        cb: vk::CommandBuffer,
        src: vk::Image,
        dst: vk::Image,
        region: &vk::ImageBlit,
    );
    unsafe fn cmd_resolve_image(
        &self,
        cb: vk::CommandBuffer,
        src: vk::Image,
        dst: vk::Image,
        region: &vk::ImageResolve,
    );
    unsafe fn cmd_reset_query_pool(
        &self,
        cb: vk::CommandBuffer,
        pool: vk::QueryPool,
        first: u32,
        count: u32,
    );
    unsafe fn cmd_begin_query(
        &self,
        cb: vk::CommandBuffer,
        pool: vk::QueryPool,
        index: u32,
        precise: bool,
    );
    unsafe fn cmd_end_query(&self, cb: vk::CommandBuffer, pool: vk::QueryPool, index: u32);
    unsafe fn cmd_write_timestamp(&self, cb: vk::CommandBuffer, pool: vk::QueryPool, index: u32);
    unsafe fn cmd_insert_debug_label(&self, cb: vk::CommandBuffer, name: &str);
    unsafe fn cmd_begin_debug_label(&self, cb: vk::CommandBuffer, name: &str);
    unsafe fn cmd_end_debug_label(&self, cb: vk::CommandBuffer);
}
