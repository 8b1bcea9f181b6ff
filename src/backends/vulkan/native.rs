//! Forwards `VkApi` to the driver through `ash`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};
use std::slice;

use ash::prelude::VkResult;
use ash::{ext, khr, vk};

use crate::errors::*;
use crate::params::DeviceParams;
use crate::rhi::framebuffer::SwapChainDesc;
use crate::window::PlatformData;

use super::api::{DescriptorInfo, DescriptorWrite, SwapChainImages, VkApi};
use super::vk_error;

const VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";

/// A logical device with one graphics and compute queue.
pub struct NativeVk {
    _entry: ash::Entry,
    instance: ash::Instance,
    physical_device: vk::PhysicalDevice,
    device: ash::Device,
    queue: vk::Queue,
    queue_family_index: u32,
    command_pool: vk::CommandPool,
    submit_fence: vk::Fence,
    acquire_fence: vk::Fence,

    surface_loader: khr::surface::Instance,
    xcb_surface_loader: Option<khr::xcb_surface::Instance>,
    swapchain_loader: khr::swapchain::Device,
    debug_utils: Option<ext::debug_utils::Device>,
    surfaces: RefCell<HashMap<vk::SwapchainKHR, vk::SurfaceKHR>>,

    properties: vk::PhysicalDeviceProperties,
    features: vk::PhysicalDeviceFeatures,
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    extensions: Vec<String>,
}

fn label(name: &str) -> CString {
    CString::new(name).unwrap_or_default()
}

unsafe fn names(v: &[[c_char; vk::MAX_EXTENSION_NAME_SIZE]]) -> Vec<String> {
    v.iter()
        .map(|v| CStr::from_ptr(v.as_ptr()).to_string_lossy().into_owned())
        .collect()
}

impl NativeVk {
    /// Loads the Vulkan library and creates a device on the most capable GPU.
    pub fn new(params: &DeviceParams) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load()
                .map_err(|err| Error::Requirement(format!("Vulkan runtime, {}", err)))?;

            let available: Vec<_> = entry
                .enumerate_instance_extension_properties(None)
                .map_err(|err| vk_error("enumerate instance extensions", err))?
                .iter()
                .map(|v| v.extension_name)
                .collect();
            let available = names(&available);
            let has = |name: &CStr| available.iter().any(|v| v.as_bytes() == name.to_bytes());

            let mut extensions: Vec<*const c_char> = vec![khr::surface::NAME.as_ptr()];
            let xcb = has(khr::xcb_surface::NAME);
            if xcb {
                extensions.push(khr::xcb_surface::NAME.as_ptr());
            } else {
                warn!("[VK] {:?} is not available.", khr::xcb_surface::NAME);
            }

            let debug_utils = params.debug && has(ext::debug_utils::NAME);
            if debug_utils {
                extensions.push(ext::debug_utils::NAME.as_ptr());
            }

            let mut layers = Vec::new();
            if params.validation {
                let available = entry
                    .enumerate_instance_layer_properties()
                    .map_err(|err| vk_error("enumerate instance layers", err))?;

                if available.iter().any(|v| {
                    CStr::from_ptr(v.layer_name.as_ptr()).to_bytes() == VALIDATION_LAYER.as_bytes()
                }) {
                    layers.push(CString::new(VALIDATION_LAYER)?);
                } else {
                    warn!("[VK] {} is not available.", VALIDATION_LAYER);
                }
            }

            let layer_ptrs: Vec<_> = layers.iter().map(|v| v.as_ptr()).collect();
            let name = CStr::from_bytes_with_nul_unchecked(b"crayon\0");
            let app_info = vk::ApplicationInfo::default()
                .application_name(name)
                .engine_name(name)
                .api_version(vk::make_api_version(0, 1, 1, 0));

            let info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_ptrs)
                .enabled_extension_names(&extensions);

            let instance = entry
                .create_instance(&info, None)
                .map_err(|err| vk_error("create instance", err))?;

            let physical_devices = instance
                .enumerate_physical_devices()
                .map_err(|err| vk_error("enumerate physical devices", err))?;

            let (physical_device, queue_family_index) = {
                let mut candidates = Vec::new();
                for &pd in &physical_devices {
                    let families = instance.get_physical_device_queue_family_properties(pd);
                    let flags = vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE;
                    if let Some(i) = families.iter().position(|v| v.queue_flags.contains(flags)) {
                        candidates.push((pd, i as u32));
                    }
                }

                let discrete = candidates.iter().find(|&&(pd, _)| {
                    let props = instance.get_physical_device_properties(pd);
                    props.device_type == vk::PhysicalDeviceType::DISCRETE_GPU
                });

                match discrete.or_else(|| candidates.first()) {
                    Some(&v) => v,
                    None => {
                        instance.destroy_instance(None);
                        return Err(Error::Requirement("a graphics queue".into()).into());
                    }
                }
            };

            let properties = instance.get_physical_device_properties(physical_device);
            let memory_properties = instance.get_physical_device_memory_properties(physical_device);
            let mut features = instance.get_physical_device_features(physical_device);
            features.robust_buffer_access = vk::FALSE;

            let available: Vec<_> = instance
                .enumerate_device_extension_properties(physical_device)
                .map_err(|err| vk_error("enumerate device extensions", err))?
                .iter()
                .map(|v| v.extension_name)
                .collect();
            let available = names(&available);

            let mut device_extensions = Vec::new();
            let mut extensions = Vec::new();
            let swapchain = khr::swapchain::NAME;
            if available
                .iter()
                .any(|v| v.as_bytes() == swapchain.to_bytes())
            {
                device_extensions.push(swapchain.as_ptr());
                extensions.push(swapchain.to_string_lossy().into_owned());
            }

            let priorities = [1.0f32];
            let queue_info = vk::DeviceQueueCreateInfo::default()
                .queue_family_index(queue_family_index)
                .queue_priorities(&priorities);

            let info = vk::DeviceCreateInfo::default()
                .queue_create_infos(slice::from_ref(&queue_info))
                .enabled_extension_names(&device_extensions)
                .enabled_features(&features);

            let device = match instance.create_device(physical_device, &info, None) {
                Ok(v) => v,
                Err(err) => {
                    instance.destroy_instance(None);
                    return Err(vk_error("create device", err));
                }
            };

            let queue = device.get_device_queue(queue_family_index, 0);

            let info = vk::CommandPoolCreateInfo::default()
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
                .queue_family_index(queue_family_index);
            let command_pool = device
                .create_command_pool(&info, None)
                .map_err(|err| vk_error("create command pool", err))?;

            let info = vk::FenceCreateInfo::default();
            let submit_fence = device
                .create_fence(&info, None)
                .map_err(|err| vk_error("create fence", err))?;
            let acquire_fence = device
                .create_fence(&info, None)
                .map_err(|err| vk_error("create fence", err))?;

            let surface_loader = khr::surface::Instance::new(&entry, &instance);
            let xcb_surface_loader = if xcb {
                Some(khr::xcb_surface::Instance::new(&entry, &instance))
            } else {
                None
            };

            let swapchain_loader = khr::swapchain::Device::new(&instance, &device);
            let debug_utils = if debug_utils {
                Some(ext::debug_utils::Device::new(&instance, &device))
            } else {
                None
            };

            info!(
                "[VK] Created device on {:?} (queue family {}).",
                CStr::from_ptr(properties.device_name.as_ptr()),
                queue_family_index
            );

            Ok(NativeVk {
                _entry: entry,
                instance,
                physical_device,
                device,
                queue,
                queue_family_index,
                command_pool,
                submit_fence,
                acquire_fence,
                surface_loader,
                xcb_surface_loader,
                swapchain_loader,
                debug_utils,
                surfaces: RefCell::new(HashMap::new()),
                properties,
                features,
                memory_properties,
                extensions,
            })
        }
    }

    unsafe fn wait_and_reset(&self, fence: vk::Fence) -> VkResult<()> {
        self.device.wait_for_fences(&[fence], true, u64::MAX)?;
        self.device.reset_fences(&[fence])
    }

    unsafe fn create_surface(&self, platform: PlatformData) -> VkResult<vk::SurfaceKHR> {
        let loader = self
            .xcb_surface_loader
            .as_ref()
            .ok_or(vk::Result::ERROR_EXTENSION_NOT_PRESENT)?;

        let info = vk::XcbSurfaceCreateInfoKHR::default()
            .connection(platform.connection as _)
            .window(platform.window as _);

        loader.create_xcb_surface(&info, None)
    }

}

impl Drop for NativeVk {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();

            for (swap_chain, surface) in self.surfaces.borrow_mut().drain() {
                self.swapchain_loader.destroy_swapchain(swap_chain, None);
                self.surface_loader.destroy_surface(surface, None);
            }

            self.device.destroy_fence(self.submit_fence, None);
            self.device.destroy_fence(self.acquire_fence, None);
            self.device.destroy_command_pool(self.command_pool, None);
            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}

impl VkApi for NativeVk {
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
        self.extensions.clone()
    }

    unsafe fn debug_utils(&self) -> bool {
        self.debug_utils.is_some()
    }

    unsafe fn create_buffer(&self, info: &vk::BufferCreateInfo) -> VkResult<vk::Buffer> {
        self.device.create_buffer(info, None)
    }

    unsafe fn destroy_buffer(&self, buffer: vk::Buffer) {
        self.device.destroy_buffer(buffer, None);
    }

    unsafe fn buffer_memory_requirements(&self, buffer: vk::Buffer) -> vk::MemoryRequirements {
        self.device.get_buffer_memory_requirements(buffer)
    }

    unsafe fn create_buffer_view(&self, info: &vk::BufferViewCreateInfo) -> VkResult<vk::BufferView> {
        self.device.create_buffer_view(info, None)
    }

    unsafe fn destroy_buffer_view(&self, view: vk::BufferView) {
        self.device.destroy_buffer_view(view, None);
    }

    unsafe fn create_image(&self, info: &vk::ImageCreateInfo) -> VkResult<vk::Image> {
        self.device.create_image(info, None)
    }

    unsafe fn destroy_image(&self, image: vk::Image) {
        self.device.destroy_image(image, None);
    }

    unsafe fn image_memory_requirements(&self, image: vk::Image) -> vk::MemoryRequirements {
        self.device.get_image_memory_requirements(image)
    }

    unsafe fn create_image_view(&self, info: &vk::ImageViewCreateInfo) -> VkResult<vk::ImageView> {
        self.device.create_image_view(info, None)
    }

    unsafe fn destroy_image_view(&self, view: vk::ImageView) {
        self.device.destroy_image_view(view, None);
    }

    unsafe fn allocate_memory(&self, size: u64, memory_type_index: u32) -> VkResult<vk::DeviceMemory> {
        let info = vk::MemoryAllocateInfo::default()
            .allocation_size(size)
            .memory_type_index(memory_type_index);
        self.device.allocate_memory(&info, None)
    }

    unsafe fn free_memory(&self, memory: vk::DeviceMemory) {
        self.device.free_memory(memory, None);
    }

    unsafe fn bind_buffer_memory(&self, buffer: vk::Buffer, memory: vk::DeviceMemory) -> VkResult<()> {
        self.device.bind_buffer_memory(buffer, memory, 0)
    }

    unsafe fn bind_image_memory(&self, image: vk::Image, memory: vk::DeviceMemory) -> VkResult<()> {
        self.device.bind_image_memory(image, memory, 0)
    }

    unsafe fn map_memory(&self, memory: vk::DeviceMemory, size: u64) -> VkResult<*mut u8> {
        self.device
            .map_memory(memory, 0, size, vk::MemoryMapFlags::empty())
            .map(|v| v as *mut u8)
    }

    unsafe fn unmap_memory(&self, memory: vk::DeviceMemory) {
        self.device.unmap_memory(memory);
    }

    unsafe fn create_sampler(&self, info: &vk::SamplerCreateInfo) -> VkResult<vk::Sampler> {
        self.device.create_sampler(info, None)
    }

    unsafe fn destroy_sampler(&self, sampler: vk::Sampler) {
        self.device.destroy_sampler(sampler, None);
    }

    unsafe fn create_descriptor_set_layout(
        &self,
        bindings: &[vk::DescriptorSetLayoutBinding],
    ) -> VkResult<vk::DescriptorSetLayout> {
        let info = vk::DescriptorSetLayoutCreateInfo::default().bindings(bindings);
        self.device.create_descriptor_set_layout(&info, None)
    }

    unsafe fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout) {
        self.device.destroy_descriptor_set_layout(layout, None);
    }

    unsafe fn create_descriptor_pool(
        &self,
        max_sets: u32,
        sizes: &[vk::DescriptorPoolSize],
    ) -> VkResult<vk::DescriptorPool> {
        let info = vk::DescriptorPoolCreateInfo::default()
            .flags(vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET)
            .max_sets(max_sets)
            .pool_sizes(sizes);
        self.device.create_descriptor_pool(&info, None)
    }

    unsafe fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
        self.device.destroy_descriptor_pool(pool, None);
    }

    unsafe fn allocate_descriptor_set(
        &self,
        pool: vk::DescriptorPool,
        layout: vk::DescriptorSetLayout,
    ) -> VkResult<vk::DescriptorSet> {
        let info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(pool)
            .set_layouts(slice::from_ref(&layout));

        let sets = self.device.allocate_descriptor_sets(&info)?;
        sets.first().cloned().ok_or(vk::Result::ERROR_OUT_OF_POOL_MEMORY)
    }

    unsafe fn free_descriptor_set(&self, pool: vk::DescriptorPool, set: vk::DescriptorSet) {
        if let Err(err) = self.device.free_descriptor_sets(pool, &[set]) {
            warn!("[VK] Failed to free descriptor set, {}.", err);
        }
    }

    unsafe fn update_descriptor_set(&self, set: vk::DescriptorSet, writes: &[DescriptorWrite]) {
        let buffers: Vec<_> = writes
            .iter()
            .map(|w| match w.info {
                DescriptorInfo::Buffer { buffer, range } => vk::DescriptorBufferInfo {
                    buffer,
                    offset: 0,
                    range,
                },
                _ => vk::DescriptorBufferInfo::default(),
            })
            .collect();

        let images: Vec<_> = writes
            .iter()
            .map(|w| match w.info {
                DescriptorInfo::Image {
                    view,
                    layout,
                    sampler,
                } => vk::DescriptorImageInfo {
                    sampler,
                    image_view: view,
                    image_layout: layout,
                },
                DescriptorInfo::Sampler(sampler) => vk::DescriptorImageInfo {
                    sampler,
                    ..vk::DescriptorImageInfo::default()
                },
                _ => vk::DescriptorImageInfo::default(),
            })
            .collect();

        let views: Vec<_> = writes
            .iter()
            .map(|w| match w.info {
                DescriptorInfo::TexelBuffer(v) => v,
                _ => vk::BufferView::null(),
            })
            .collect();

        let writes: Vec<_> = writes
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let write = vk::WriteDescriptorSet::default()
                    .dst_set(set)
                    .dst_binding(w.binding)
                    .descriptor_type(w.descriptor_type);

                match w.info {
                    DescriptorInfo::Buffer { .. } => write.buffer_info(slice::from_ref(&buffers[i])),
                    DescriptorInfo::TexelBuffer(_) => {
                        write.texel_buffer_view(slice::from_ref(&views[i]))
                    }
                    _ => write.image_info(slice::from_ref(&images[i])),
                }
            })
            .collect();

        self.device.update_descriptor_sets(&writes, &[]);
    }

    unsafe fn create_pipeline_layout(
        &self,
        layouts: &[vk::DescriptorSetLayout],
    ) -> VkResult<vk::PipelineLayout> {
        let info = vk::PipelineLayoutCreateInfo::default().set_layouts(layouts);
        self.device.create_pipeline_layout(&info, None)
    }

    unsafe fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout) {
        self.device.destroy_pipeline_layout(layout, None);
    }

    unsafe fn create_shader_module(&self, code: &[u32]) -> VkResult<vk::ShaderModule> {
        let info = vk::ShaderModuleCreateInfo::default().code(code);
        self.device.create_shader_module(&info, None)
    }

    unsafe fn destroy_shader_module(&self, module: vk::ShaderModule) {
        self.device.destroy_shader_module(module, None);
    }

    unsafe fn create_render_pass(&self, info: &vk::RenderPassCreateInfo) -> VkResult<vk::RenderPass> {
        self.device.create_render_pass(info, None)
    }

    unsafe fn destroy_render_pass(&self, render_pass: vk::RenderPass) {
        self.device.destroy_render_pass(render_pass, None);
    }

    unsafe fn create_graphics_pipeline(
        &self,
        info: &vk::GraphicsPipelineCreateInfo,
    ) -> VkResult<vk::Pipeline> {
        let pipelines = self
            .device
            .create_graphics_pipelines(vk::PipelineCache::null(), slice::from_ref(info), None)
            .map_err(|(_, err)| err)?;

        pipelines.first().cloned().ok_or(vk::Result::ERROR_UNKNOWN)
    }

    unsafe fn create_compute_pipeline(
        &self,
        info: &vk::ComputePipelineCreateInfo,
    ) -> VkResult<vk::Pipeline> {
        let pipelines = self
            .device
            .create_compute_pipelines(vk::PipelineCache::null(), slice::from_ref(info), None)
            .map_err(|(_, err)| err)?;

        pipelines.first().cloned().ok_or(vk::Result::ERROR_UNKNOWN)
    }

    unsafe fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
        self.device.destroy_pipeline(pipeline, None);
    }

    unsafe fn create_framebuffer(&self, info: &vk::FramebufferCreateInfo) -> VkResult<vk::Framebuffer> {
        self.device.create_framebuffer(info, None)
    }

    unsafe fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        self.device.destroy_framebuffer(framebuffer, None);
    }

    unsafe fn create_query_pool(&self, info: &vk::QueryPoolCreateInfo) -> VkResult<vk::QueryPool> {
        self.device.create_query_pool(info, None)
    }

    unsafe fn destroy_query_pool(&self, pool: vk::QueryPool) {
        self.device.destroy_query_pool(pool, None);
    }

    unsafe fn get_query_pool_results(
        &self,
        pool: vk::QueryPool,
        first: u32,
        count: u32,
        data: &mut [u64],
        stride: u64,
    ) -> vk::Result {
        // Statistics results are packed with `stride`, which the typed wrapper can't express.
        (self.device.fp_v1_0().get_query_pool_results)(
            self.device.handle(),
            pool,
            first,
            count,
            data.len() * 8,
            data.as_mut_ptr() as *mut c_void,
            stride,
            vk::QueryResultFlags::TYPE_64,
        )
    }

    unsafe fn create_swap_chain(
        &self,
        platform: PlatformData,
        desc: &SwapChainDesc,
        format: vk::Format,
        extent: vk::Extent2D,
    ) -> VkResult<SwapChainImages> {
        let surface = self.create_surface(platform)?;
        let pd = self.physical_device;

        let result = (|| {
            if !self.surface_loader.get_physical_device_surface_support(
                pd,
                self.queue_family_index,
                surface,
            )? {
                return Err(vk::Result::ERROR_INCOMPATIBLE_DISPLAY_KHR);
            }

            let caps = self
                .surface_loader
                .get_physical_device_surface_capabilities(pd, surface)?;

            let mut count = desc.buffer_count.max(caps.min_image_count);
            if caps.max_image_count > 0 {
                count = count.min(caps.max_image_count);
            }

            let extent = if caps.current_extent.width == u32::max_value() {
                vk::Extent2D {
                    width: extent
                        .width
                        .max(caps.min_image_extent.width)
                        .min(caps.max_image_extent.width),
                    height: extent
                        .height
                        .max(caps.min_image_extent.height)
                        .min(caps.max_image_extent.height),
                }
            } else {
                caps.current_extent
            };

            let modes = self
                .surface_loader
                .get_physical_device_surface_present_modes(pd, surface)?;
            let present_mode = if !desc.vsync && modes.contains(&vk::PresentModeKHR::IMMEDIATE) {
                vk::PresentModeKHR::IMMEDIATE
            } else {
                vk::PresentModeKHR::FIFO
            };

            let info = vk::SwapchainCreateInfoKHR::default()
                .surface(surface)
                .min_image_count(count)
                .image_format(format)
                .image_color_space(vk::ColorSpaceKHR::SRGB_NONLINEAR)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(
                    vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST,
                )
                .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                .pre_transform(caps.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(present_mode)
                .clipped(true);

            let swap_chain = self.swapchain_loader.create_swapchain(&info, None)?;
            match self.swapchain_loader.get_swapchain_images(swap_chain) {
                Ok(images) => Ok(SwapChainImages {
                    swap_chain,
                    images,
                    extent,
                }),
                Err(err) => {
                    self.swapchain_loader.destroy_swapchain(swap_chain, None);
                    Err(err)
                }
            }
        })();

        match result {
            Ok(v) => {
                self.surfaces.borrow_mut().insert(v.swap_chain, surface);
                Ok(v)
            }
            Err(err) => {
                self.surface_loader.destroy_surface(surface, None);
                Err(err)
            }
        }
    }

    unsafe fn destroy_swap_chain(&self, swap_chain: vk::SwapchainKHR) {
        self.swapchain_loader.destroy_swapchain(swap_chain, None);
        if let Some(surface) = self.surfaces.borrow_mut().remove(&swap_chain) {
            self.surface_loader.destroy_surface(surface, None);
        }
    }

    unsafe fn acquire_next_image(&self, swap_chain: vk::SwapchainKHR) -> VkResult<u32> {
        let (index, suboptimal) = self.swapchain_loader.acquire_next_image(
            swap_chain,
            u64::max_value(),
            vk::Semaphore::null(),
            self.acquire_fence,
        )?;

        if suboptimal {
            debug!("[VK] Swap chain {:?} is suboptimal.", swap_chain);
        }

        self.wait_and_reset(self.acquire_fence)?;
        Ok(index)
    }

    unsafe fn queue_present(&self, swap_chain: vk::SwapchainKHR, index: u32) -> VkResult<()> {
        let info = vk::PresentInfoKHR::default()
            .swapchains(slice::from_ref(&swap_chain))
            .image_indices(slice::from_ref(&index));

        self.swapchain_loader
            .queue_present(self.queue, &info)
            .map(|_| ())
    }

    unsafe fn allocate_command_buffer(&self) -> VkResult<vk::CommandBuffer> {
        let info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let cbs = self.device.allocate_command_buffers(&info)?;
        cbs.first().cloned().ok_or(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY)
    }

    unsafe fn free_command_buffer(&self, cb: vk::CommandBuffer) {
        self.device.free_command_buffers(self.command_pool, &[cb]);
    }

    unsafe fn begin_command_buffer(&self, cb: vk::CommandBuffer) -> VkResult<()> {
        let info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        self.device.begin_command_buffer(cb, &info)
    }

    unsafe fn end_command_buffer(&self, cb: vk::CommandBuffer) -> VkResult<()> {
        self.device.end_command_buffer(cb)
    }

    unsafe fn submit_and_wait(&self, cb: vk::CommandBuffer) -> VkResult<()> {
        let info = vk::SubmitInfo::default().command_buffers(slice::from_ref(&cb));
        self.device
            .queue_submit(self.queue, slice::from_ref(&info), self.submit_fence)?;
        self.wait_and_reset(self.submit_fence)
    }

    unsafe fn cmd_begin_render_pass(
        &self,
        cb: vk::CommandBuffer,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
    ) {
        let info = vk::RenderPassBeginInfo::default()
            .render_pass(render_pass)
            .framebuffer(framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D::default(),
                extent,
            });

        self.device
            .cmd_begin_render_pass(cb, &info, vk::SubpassContents::INLINE);
    }

    unsafe fn cmd_end_render_pass(&self, cb: vk::CommandBuffer) {
        self.device.cmd_end_render_pass(cb);
    }

    unsafe fn cmd_bind_pipeline(
        &self,
        cb: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        pipeline: vk::Pipeline,
    ) {
        self.device.cmd_bind_pipeline(cb, bind_point, pipeline);
    }

    unsafe fn cmd_bind_descriptor_set(
        &self,
        cb: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        layout: vk::PipelineLayout,
        index: u32,
        set: vk::DescriptorSet,
    ) {
        self.device
            .cmd_bind_descriptor_sets(cb, bind_point, layout, index, &[set], &[]);
    }

    unsafe fn cmd_bind_vertex_buffers(&self, cb: vk::CommandBuffer, buffers: &[vk::Buffer]) {
        let offsets = vec![0; buffers.len()];
        self.device.cmd_bind_vertex_buffers(cb, 0, buffers, &offsets);
    }

    unsafe fn cmd_bind_index_buffer(&self, cb: vk::CommandBuffer, buffer: vk::Buffer, ty: vk::IndexType) {
        self.device.cmd_bind_index_buffer(cb, buffer, 0, ty);
    }

    unsafe fn cmd_set_viewport(&self, cb: vk::CommandBuffer, viewport: &vk::Viewport) {
        self.device
            .cmd_set_viewport(cb, 0, slice::from_ref(viewport));
    }

    unsafe fn cmd_set_scissor(&self, cb: vk::CommandBuffer, rect: &vk::Rect2D) {
        self.device.cmd_set_scissor(cb, 0, slice::from_ref(rect));
    }

    unsafe fn cmd_clear_attachments(
        &self,
        cb: vk::CommandBuffer,
        attachments: &[vk::ClearAttachment],
        rect: &vk::ClearRect,
    ) {
        self.device
            .cmd_clear_attachments(cb, attachments, slice::from_ref(rect));
    }

    unsafe fn cmd_draw(
        &self,
        cb: vk::CommandBuffer,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        self.device
            .cmd_draw(cb, vertex_count, instance_count, first_vertex, first_instance);
    }

    unsafe fn cmd_draw_indexed(
        &self,
        cb: vk::CommandBuffer,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        self.device.cmd_draw_indexed(
            cb,
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        );
    }

    unsafe fn cmd_draw_indirect(
        &self,
        cb: vk::CommandBuffer,
        buffer: vk::Buffer,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) {
        self.device
            .cmd_draw_indirect(cb, buffer, offset, draw_count, stride);
    }

    unsafe fn cmd_draw_indexed_indirect(
        &self,
        cb: vk::CommandBuffer,
        buffer: vk::Buffer,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) {
        self.device
            .cmd_draw_indexed_indirect(cb, buffer, offset, draw_count, stride);
    }

    unsafe fn cmd_dispatch(&self, cb: vk::CommandBuffer, x: u32, y: u32, z: u32) {
        self.device.cmd_dispatch(cb, x, y, z);
    }

    unsafe fn cmd_pipeline_barrier(
        &self,
        cb: vk::CommandBuffer,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        memory: &[vk::MemoryBarrier],
        images: &[vk::ImageMemoryBarrier],
    ) {
        self.device.cmd_pipeline_barrier(
            cb,
            src_stage,
            dst_stage,
            vk::DependencyFlags::empty(),
            memory,
            &[],
            images,
        );
    }

    unsafe fn cmd_copy_buffer(&self, cb: vk::CommandBuffer, src: vk::Buffer, dst: vk::Buffer, size: u64) {
        let region = vk::BufferCopy {
            src_offset: 0,
            dst_offset: 0,
            size,
        };

        self.device.cmd_copy_buffer(cb, src, dst, &[region]);
    }

    unsafe fn cmd_copy_buffer_to_image(
        &self,
        cb: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Image,
        regions: &[vk::BufferImageCopy],
    ) {
        self.device.cmd_copy_buffer_to_image(
            cb,
            src,
            dst,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            regions,
        );
    }

    unsafe fn cmd_copy_image(
        &self,
        cb: vk::CommandBuffer,
        src: vk::Image,
        dst: vk::Image,
        regions: &[vk::ImageCopy],
    ) {
        self.device.cmd_copy_image(
            cb,
            src,
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            dst,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            regions,
        );
    }

    unsafe fn cmd_blit_image(
        &self,
        cb: vk::CommandBuffer,
        src: vk::Image,
        dst: vk::Image,
        region: &vk::ImageBlit,
    ) {
        self.device.cmd_blit_image(
            cb,
            src,
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            dst,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            slice::from_ref(region),
            vk::Filter::LINEAR,
        );
    }

    unsafe fn cmd_resolve_image(
        &self,
        cb: vk::CommandBuffer,
        src: vk::Image,
        dst: vk::Image,
        region: &vk::ImageResolve,
    ) {
        self.device.cmd_resolve_image(
            cb,
            src,
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            dst,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            slice::from_ref(region),
        );
    }

    unsafe fn cmd_reset_query_pool(
        &self,
        cb: vk::CommandBuffer,
        pool: vk::QueryPool,
        first: u32,
        count: u32,
    ) {
        self.device.cmd_reset_query_pool(cb, pool, first, count);
    }

    unsafe fn cmd_begin_query(&self, cb: vk::CommandBuffer, pool: vk::QueryPool, index: u32, precise: bool) {
        let flags = if precise {
            vk::QueryControlFlags::PRECISE
        } else {
            vk::QueryControlFlags::empty()
        };

        self.device.cmd_begin_query(cb, pool, index, flags);
    }

    unsafe fn cmd_end_query(&self, cb: vk::CommandBuffer, pool: vk::QueryPool, index: u32) {
        self.device.cmd_end_query(cb, pool, index);
    }

    unsafe fn cmd_write_timestamp(&self, cb: vk::CommandBuffer, pool: vk::QueryPool, index: u32) {
        self.device.cmd_write_timestamp(
            cb,
            vk::PipelineStageFlags::BOTTOM_OF_PIPE,
            pool,
            index,
        );
    }

    unsafe fn cmd_insert_debug_label(&self, cb: vk::CommandBuffer, name: &str) {
        if let Some(ref utils) = self.debug_utils {
            let name = label(name);
            let label = vk::DebugUtilsLabelEXT::default().label_name(&name);
            utils.cmd_insert_debug_utils_label(cb, &label);
        }
    }

    unsafe fn cmd_begin_debug_label(&self, cb: vk::CommandBuffer, name: &str) {
        if let Some(ref utils) = self.debug_utils {
            let name = label(name);
            let label = vk::DebugUtilsLabelEXT::default().label_name(&name);
            utils.cmd_begin_debug_utils_label(cb, &label);
        }
    }

    unsafe fn cmd_end_debug_label(&self, cb: vk::CommandBuffer) {
        if let Some(ref utils) = self.debug_utils {
            utils.cmd_end_debug_utils_label(cb);
        }
    }
}
