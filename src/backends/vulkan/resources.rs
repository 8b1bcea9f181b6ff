use std::cell::Cell;
use std::rc::Rc;

use ash::prelude::VkResult;
use ash::vk;

use crate::errors::*;
use crate::rhi::buffer::{BufferDesc, BufferKind, IndexFormat};
use crate::rhi::framebuffer::{RenderTargetObject, SwapChainDesc};
use crate::rhi::query::QueryType;
use crate::rhi::resource::{BufferObject, QueryPoolObject, TextureObject};
use crate::rhi::sampler::SamplerStateDesc;
use crate::rhi::texture::{TextureDesc, TextureDimension};
use crate::window::WindowSource;

use super::api::VkApi;
use super::capabilities::VkCapabilities;
use super::types;
use super::vk_error;

/// Finds a memory type which is allowed by `bits` and has all the `flags`.
pub fn find_memory_type(
    properties: &vk::PhysicalDeviceMemoryProperties,
    bits: u32,
    flags: vk::MemoryPropertyFlags,
) -> Option<u32> {
    (0..properties.memory_type_count).find(|&i| {
        bits & (1 << i) != 0
            && properties.memory_types[i as usize]
                .property_flags
                .contains(flags)
    })
}

/// Allocates memory for `requirements`, preferring `flags` and falling back to any
/// memory type the resource accepts.
unsafe fn allocate<V: VkApi>(
    vk: &V,
    properties: &vk::PhysicalDeviceMemoryProperties,
    requirements: vk::MemoryRequirements,
    flags: vk::MemoryPropertyFlags,
    required: vk::MemoryPropertyFlags,
) -> Result<vk::DeviceMemory> {
    let index = find_memory_type(properties, requirements.memory_type_bits, flags)
        .or_else(|| find_memory_type(properties, requirements.memory_type_bits, required));

    let index = match index {
        Some(v) => v,
        None => {
            return Err(Error::Backend(format!(
                "[VK] No memory type with {:?} in {:#b}",
                required, requirements.memory_type_bits
            ))
            .into());
        }
    };

    vk.allocate_memory(requirements.size, index)
        .map_err(|err| vk_error("allocate memory", err))
}

pub struct VkBuffer<V: VkApi> {
    pub(crate) vk: Rc<V>,
    pub(crate) buffer: vk::Buffer,
    pub(crate) memory: vk::DeviceMemory,
    /// The texel view of texture buffers.
    pub(crate) view: vk::BufferView,
    pub(crate) desc: BufferDesc,
}

impl<V: VkApi> VkBuffer<V> {
    #[inline]
    pub fn buffer(&self) -> vk::Buffer {
        self.buffer
    }

    #[inline]
    pub fn view(&self) -> vk::BufferView {
        self.view
    }
}

impl<V: VkApi> BufferObject for VkBuffer<V> {
    fn desc(&self) -> &BufferDesc {
        &self.desc
    }
}

impl<V: VkApi> Drop for VkBuffer<V> {
    fn drop(&mut self) {
        unsafe {
            self.vk.destroy_buffer_view(self.view);
            self.vk.destroy_buffer(self.buffer);
            self.vk.free_memory(self.memory);
        }
    }
}

/// Buffers always live in host visible memory. They could be mapped at any time
/// without a staging copy.
pub(crate) unsafe fn create_buffer<V: VkApi>(
    vk: &Rc<V>,
    properties: &vk::PhysicalDeviceMemoryProperties,
    desc: BufferDesc,
    data: Option<&[u8]>,
) -> Result<VkBuffer<V>> {
    let mut buffer = VkBuffer {
        vk: vk.clone(),
        buffer: vk::Buffer::null(),
        memory: vk::DeviceMemory::null(),
        view: vk::BufferView::null(),
        desc,
    };

    let info = vk::BufferCreateInfo::default()
        .size(u64::from(desc.size))
        .usage(types::buffer_usage(desc.kind))
        .sharing_mode(vk::SharingMode::EXCLUSIVE);

    buffer.buffer = vk
        .create_buffer(&info)
        .map_err(|err| vk_error("create buffer", err))?;

    let host = vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
    let requirements = vk.buffer_memory_requirements(buffer.buffer);
    buffer.memory = allocate(&**vk, properties, requirements, host, host)?;

    vk.bind_buffer_memory(buffer.buffer, buffer.memory)
        .map_err(|err| vk_error("bind buffer memory", err))?;

    if let Some(bytes) = data {
        let ptr = vk
            .map_memory(buffer.memory, u64::from(desc.size))
            .map_err(|err| vk_error("map buffer memory", err))?;
        ::std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr, bytes.len());
        vk.unmap_memory(buffer.memory);
    }

    if let BufferKind::Texture(format) = desc.kind {
        let info = vk::BufferViewCreateInfo::default()
            .buffer(buffer.buffer)
            .format(format.into())
            .offset(0)
            .range(vk::WHOLE_SIZE);

        buffer.view = vk
            .create_buffer_view(&info)
            .map_err(|err| vk_error("create buffer view", err))?;
    }

    Ok(buffer)
}

/// A transfer source which lives until the command buffer reading it has been executed.
pub struct VkStagingBuffer<V: VkApi> {
    vk: Rc<V>,
    pub(crate) buffer: vk::Buffer,
    memory: vk::DeviceMemory,
}

impl<V: VkApi> Drop for VkStagingBuffer<V> {
    fn drop(&mut self) {
        unsafe {
            self.vk.destroy_buffer(self.buffer);
            self.vk.free_memory(self.memory);
        }
    }
}

/// Packs `chunks` into one staging buffer, returning it with the offset of every chunk.
pub(crate) unsafe fn create_staging_buffer<V: VkApi>(
    vk: &Rc<V>,
    properties: &vk::PhysicalDeviceMemoryProperties,
    chunks: &[&[u8]],
) -> Result<(VkStagingBuffer<V>, Vec<u64>)> {
    let mut offsets = Vec::with_capacity(chunks.len());
    let mut size = 0;
    for v in chunks {
        offsets.push(size);
        // Copies from buffers into images must start at a multiple of 4.
        size += (v.len() as u64 + 3) & !3;
    }

    let mut staging = VkStagingBuffer {
        vk: vk.clone(),
        buffer: vk::Buffer::null(),
        memory: vk::DeviceMemory::null(),
    };

    let info = vk::BufferCreateInfo::default()
        .size(size.max(4))
        .usage(vk::BufferUsageFlags::TRANSFER_SRC)
        .sharing_mode(vk::SharingMode::EXCLUSIVE);

    staging.buffer = vk
        .create_buffer(&info)
        .map_err(|err| vk_error("create staging buffer", err))?;

    let host = vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
    let requirements = vk.buffer_memory_requirements(staging.buffer);
    staging.memory = allocate(&**vk, properties, requirements, host, host)?;

    vk.bind_buffer_memory(staging.buffer, staging.memory)
        .map_err(|err| vk_error("bind buffer memory", err))?;

    let ptr = vk
        .map_memory(staging.memory, size)
        .map_err(|err| vk_error("map staging memory", err))?;
    for (v, &offset) in chunks.iter().zip(&offsets) {
        ::std::ptr::copy_nonoverlapping(v.as_ptr(), ptr.add(offset as usize), v.len());
    }

    vk.unmap_memory(staging.memory);
    Ok((staging, offsets))
}

pub struct VkTexture<V: VkApi> {
    pub(crate) vk: Rc<V>,
    pub(crate) image: vk::Image,
    pub(crate) memory: vk::DeviceMemory,
    /// The view of every mipmap and layer, used for sampling and storage.
    pub(crate) view: vk::ImageView,
    pub(crate) format: vk::Format,
    /// The layout the image rests in between commands.
    pub(crate) layout: vk::ImageLayout,
    pub(crate) desc: TextureDesc,
}

impl<V: VkApi> VkTexture<V> {
    #[inline]
    pub fn image(&self) -> vk::Image {
        self.image
    }

    #[inline]
    pub fn view(&self) -> vk::ImageView {
        self.view
    }

    #[inline]
    pub fn layout(&self) -> vk::ImageLayout {
        self.layout
    }

    /// The number of image layers, every face of a cube counts as one.
    pub fn layers(&self) -> u32 {
        self.desc.array_slices() * self.desc.dimension.faces()
    }
}

impl<V: VkApi> TextureObject for VkTexture<V> {
    fn desc(&self) -> &TextureDesc {
        &self.desc
    }
}

impl<V: VkApi> Drop for VkTexture<V> {
    fn drop(&mut self) {
        unsafe {
            self.vk.destroy_image_view(self.view);
            self.vk.destroy_image(self.image);
            self.vk.free_memory(self.memory);
        }
    }
}

/// Creates the image of a texture. Its contents are undefined, and so is its layout
/// until the device transitions it into `layout`.
pub(crate) unsafe fn create_texture<V: VkApi>(
    vk: &Rc<V>,
    properties: &vk::PhysicalDeviceMemoryProperties,
    desc: TextureDesc,
) -> Result<VkTexture<V>> {
    let format: vk::Format = desc.format.into();
    let mut texture = VkTexture {
        vk: vk.clone(),
        image: vk::Image::null(),
        memory: vk::DeviceMemory::null(),
        view: vk::ImageView::null(),
        format,
        layout: types::steady_layout(&desc.flags),
        desc,
    };

    let depth = if desc.dimension == TextureDimension::D3 {
        desc.depth
    } else {
        1
    };

    let mut flags = vk::ImageCreateFlags::empty();
    match desc.dimension {
        TextureDimension::Cube | TextureDimension::CubeArray => {
            flags |= vk::ImageCreateFlags::CUBE_COMPATIBLE;
        }
        // Slices of volumes are attached as 2D images.
        TextureDimension::D3 if desc.flags.render_target => {
            flags |= vk::ImageCreateFlags::TYPE_2D_ARRAY_COMPATIBLE;
        }
        _ => {}
    }

    let info = vk::ImageCreateInfo::default()
        .flags(flags)
        .image_type(types::image_type(desc.dimension))
        .format(format)
        .extent(vk::Extent3D {
            width: desc.width,
            height: desc.height,
            depth,
        })
        .mip_levels(desc.mipmaps())
        .array_layers(texture.layers())
        .samples(types::sample_count(desc.samples))
        .tiling(vk::ImageTiling::OPTIMAL)
        .usage(types::image_usage(desc.format, &desc.flags))
        .sharing_mode(vk::SharingMode::EXCLUSIVE)
        .initial_layout(vk::ImageLayout::UNDEFINED);

    texture.image = vk
        .create_image(&info)
        .map_err(|err| vk_error("create image", err))?;

    let requirements = vk.image_memory_requirements(texture.image);
    texture.memory = allocate(
        &**vk,
        properties,
        requirements,
        vk::MemoryPropertyFlags::DEVICE_LOCAL,
        vk::MemoryPropertyFlags::empty(),
    )?;

    vk.bind_image_memory(texture.image, texture.memory)
        .map_err(|err| vk_error("bind image memory", err))?;

    let range = vk::ImageSubresourceRange::default()
        .aspect_mask(types::view_aspect_mask(desc.format))
        .base_mip_level(0)
        .level_count(desc.mipmaps())
        .base_array_layer(0)
        .layer_count(texture.layers());

    let info = vk::ImageViewCreateInfo::default()
        .image(texture.image)
        .view_type(types::image_view_type(desc.dimension))
        .format(format)
        .subresource_range(range);

    texture.view = vk
        .create_image_view(&info)
        .map_err(|err| vk_error("create image view", err))?;

    Ok(texture)
}

/// Creates a view of one mipmap of one layer, which could be attached to a framebuffer.
pub(crate) unsafe fn create_attachment_view<V: VkApi>(
    vk: &V,
    texture: &VkTexture<V>,
    mipmap_index: u32,
    layer_index: u32,
) -> VkResult<vk::ImageView> {
    let view_type = match texture.desc.dimension {
        TextureDimension::D1 | TextureDimension::D1Array => vk::ImageViewType::TYPE_1D,
        _ => vk::ImageViewType::TYPE_2D,
    };

    let range = vk::ImageSubresourceRange::default()
        .aspect_mask(types::aspect_mask(texture.desc.format))
        .base_mip_level(mipmap_index)
        .level_count(1)
        .base_array_layer(layer_index)
        .layer_count(1);

    let info = vk::ImageViewCreateInfo::default()
        .image(texture.image)
        .view_type(view_type)
        .format(texture.format)
        .subresource_range(range);

    vk.create_image_view(&info)
}

pub struct VkSamplerState<V: VkApi> {
    pub(crate) vk: Rc<V>,
    pub(crate) sampler: vk::Sampler,
    pub(crate) desc: SamplerStateDesc,
}

impl<V: VkApi> VkSamplerState<V> {
    #[inline]
    pub fn sampler(&self) -> vk::Sampler {
        self.sampler
    }

    #[inline]
    pub fn desc(&self) -> &SamplerStateDesc {
        &self.desc
    }
}

impl<V: VkApi> Drop for VkSamplerState<V> {
    fn drop(&mut self) {
        unsafe {
            self.vk.destroy_sampler(self.sampler);
        }
    }
}

pub(crate) unsafe fn create_sampler_state<V: VkApi>(
    vk: &Rc<V>,
    caps: &VkCapabilities,
    max_anisotropy: f32,
    desc: &SamplerStateDesc,
) -> Result<VkSamplerState<V>> {
    let (min, mag, mip) = desc.filter.modes();
    let anisotropy = desc.filter.is_anisotropic() && caps.sampler_anisotropy();

    let info = vk::SamplerCreateInfo::default()
        .min_filter(min.into())
        .mag_filter(mag.into())
        .mipmap_mode(mip.into())
        .address_mode_u(desc.address_u.into())
        .address_mode_v(desc.address_v.into())
        .address_mode_w(desc.address_w.into())
        .mip_lod_bias(desc.mip_lod_bias)
        .anisotropy_enable(anisotropy)
        .max_anisotropy((desc.max_anisotropy as f32).min(max_anisotropy).max(1.0))
        .compare_enable(desc.filter.is_comparison())
        .compare_op(desc.comparison_func.into())
        .min_lod(desc.min_lod)
        .max_lod(desc.max_lod)
        .border_color(types::border_color(desc.border_color));

    let sampler = vk
        .create_sampler(&info)
        .map_err(|err| vk_error("create sampler", err))?;

    Ok(VkSamplerState {
        vk: vk.clone(),
        sampler,
        desc: *desc,
    })
}

/// Vulkan has no vertex array objects, the buffers are bound when drawing.
pub struct VkVertexArray<V: VkApi> {
    pub(crate) vertex_buffers: Vec<Rc<VkBuffer<V>>>,
    pub(crate) index_buffer: Option<Rc<VkBuffer<V>>>,
}

impl<V: VkApi> VkVertexArray<V> {
    /// The index format of the index buffer, if any.
    pub fn index_format(&self) -> Option<IndexFormat> {
        self.index_buffer.as_ref().and_then(|v| match v.desc.kind {
            BufferKind::Index(format) => Some(format),
            _ => None,
        })
    }
}

/// The format, sample count and resting layout of one render pass attachment.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AttachmentDesc {
    pub format: vk::Format,
    pub samples: vk::SampleCountFlags,
    pub layout: vk::ImageLayout,
}

/// Creates a render pass with a single subpass. The attachments are loaded and stored,
/// and they are back in their resting layout when the pass ends.
pub(crate) unsafe fn create_render_pass<V: VkApi>(
    vk: &V,
    colors: &[AttachmentDesc],
    depth_stencil: Option<AttachmentDesc>,
) -> VkResult<vk::RenderPass> {
    let attachments: Vec<_> = colors
        .iter()
        .chain(depth_stencil.iter())
        .map(|v| {
            vk::AttachmentDescription::default()
                .format(v.format)
                .samples(v.samples)
                .load_op(vk::AttachmentLoadOp::LOAD)
                .store_op(vk::AttachmentStoreOp::STORE)
                .stencil_load_op(vk::AttachmentLoadOp::LOAD)
                .stencil_store_op(vk::AttachmentStoreOp::STORE)
                .initial_layout(v.layout)
                .final_layout(v.layout)
        })
        .collect();

    let color_refs: Vec<_> = (0..colors.len())
        .map(|i| {
            vk::AttachmentReference::default()
                .attachment(i as u32)
                .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
        })
        .collect();

    let depth_ref = vk::AttachmentReference::default()
        .attachment(colors.len() as u32)
        .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

    let mut subpass = vk::SubpassDescription::default()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(&color_refs);

    if depth_stencil.is_some() {
        subpass = subpass.depth_stencil_attachment(&depth_ref);
    }

    let dependency = |src, dst| {
        vk::SubpassDependency::default()
            .src_subpass(src)
            .dst_subpass(dst)
            .src_stage_mask(vk::PipelineStageFlags::ALL_COMMANDS)
            .dst_stage_mask(vk::PipelineStageFlags::ALL_COMMANDS)
            .src_access_mask(vk::AccessFlags::MEMORY_WRITE)
            .dst_access_mask(vk::AccessFlags::MEMORY_READ | vk::AccessFlags::MEMORY_WRITE)
    };

    let subpasses = [subpass];
    let dependencies = [
        dependency(vk::SUBPASS_EXTERNAL, 0),
        dependency(0, vk::SUBPASS_EXTERNAL),
    ];

    let info = vk::RenderPassCreateInfo::default()
        .attachments(&attachments)
        .subpasses(&subpasses)
        .dependencies(&dependencies);

    vk.create_render_pass(&info)
}

/// One attachment of a framebuffer.
pub struct VkAttachment<V: VkApi> {
    pub(crate) texture: Rc<VkTexture<V>>,
    pub(crate) mipmap_index: u32,
    pub(crate) layer_index: u32,
}

impl<V: VkApi> VkAttachment<V> {
    pub(crate) fn subresource(&self) -> vk::ImageSubresourceLayers {
        vk::ImageSubresourceLayers::default()
            .aspect_mask(types::aspect_mask(self.texture.desc.format))
            .mip_level(self.mipmap_index)
            .base_array_layer(self.layer_index)
            .layer_count(1)
    }
}

pub struct VkFramebuffer<V: VkApi> {
    pub(crate) vk: Rc<V>,
    pub(crate) render_pass: vk::RenderPass,
    pub(crate) framebuffer: vk::Framebuffer,
    pub(crate) views: Vec<vk::ImageView>,
    pub(crate) colors: Vec<VkAttachment<V>>,
    pub(crate) depth_stencil: Option<VkAttachment<V>>,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) samples: u8,
}

impl<V: VkApi> VkFramebuffer<V> {
    #[inline]
    pub fn framebuffer(&self) -> vk::Framebuffer {
        self.framebuffer
    }

    #[inline]
    pub fn samples(&self) -> u8 {
        self.samples
    }
}

impl<V: VkApi> RenderTargetObject for VkFramebuffer<V> {
    fn width_and_height(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl<V: VkApi> Drop for VkFramebuffer<V> {
    fn drop(&mut self) {
        unsafe {
            self.vk.destroy_framebuffer(self.framebuffer);
            for &v in &self.views {
                self.vk.destroy_image_view(v);
            }

            self.vk.destroy_render_pass(self.render_pass);
        }
    }
}

/// The presentable images of a window.
pub struct VkSwapChain<V: VkApi> {
    pub(crate) vk: Rc<V>,
    pub(crate) swap_chain: vk::SwapchainKHR,
    pub(crate) images: Vec<vk::Image>,
    pub(crate) views: Vec<vk::ImageView>,
    pub(crate) render_pass: vk::RenderPass,
    pub(crate) framebuffers: Vec<vk::Framebuffer>,
    pub(crate) depth_stencil: Option<Rc<VkTexture<V>>>,
    pub(crate) depth_stencil_view: vk::ImageView,
    /// The index of the image which has been acquired and is rendered into.
    pub(crate) current: Cell<u32>,
    pub(crate) window: Rc<dyn WindowSource>,
    pub(crate) desc: SwapChainDesc,
    pub(crate) extent: vk::Extent2D,
}

impl<V: VkApi> VkSwapChain<V> {
    #[inline]
    pub fn desc(&self) -> &SwapChainDesc {
        &self.desc
    }

    #[inline]
    pub fn window(&self) -> &Rc<dyn WindowSource> {
        &self.window
    }

    #[inline]
    pub fn current_image(&self) -> vk::Image {
        self.images[self.current.get() as usize]
    }

    #[inline]
    pub fn current_framebuffer(&self) -> vk::Framebuffer {
        self.framebuffers[self.current.get() as usize]
    }
}

impl<V: VkApi> RenderTargetObject for VkSwapChain<V> {
    fn width_and_height(&self) -> (u32, u32) {
        (self.extent.width.max(1), self.extent.height.max(1))
    }
}

impl<V: VkApi> Drop for VkSwapChain<V> {
    fn drop(&mut self) {
        unsafe {
            for &v in &self.framebuffers {
                self.vk.destroy_framebuffer(v);
            }

            for &v in &self.views {
                self.vk.destroy_image_view(v);
            }

            self.vk.destroy_image_view(self.depth_stencil_view);
            self.vk.destroy_render_pass(self.render_pass);
            self.vk.destroy_swap_chain(self.swap_chain);
        }
    }
}

pub struct VkQueryPool<V: VkApi> {
    pub(crate) vk: Rc<V>,
    pub(crate) pool: vk::QueryPool,
    pub(crate) query_type: QueryType,
    pub(crate) number_of_queries: u32,
}

impl<V: VkApi> VkQueryPool<V> {
    #[inline]
    pub fn pool(&self) -> vk::QueryPool {
        self.pool
    }

    /// The number of 64 bit values one query writes.
    pub fn values(&self) -> usize {
        self.query_type.result_size() / 8
    }
}

impl<V: VkApi> QueryPoolObject for VkQueryPool<V> {
    fn query_type(&self) -> QueryType {
        self.query_type
    }

    fn number_of_queries(&self) -> u32 {
        self.number_of_queries
    }
}

impl<V: VkApi> Drop for VkQueryPool<V> {
    fn drop(&mut self) {
        unsafe {
            self.vk.destroy_query_pool(self.pool);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::vulkan::headless::HeadlessVk;

    #[test]
    fn memory_types() {
        let vk = HeadlessVk::new();
        let properties = unsafe { vk.memory_properties() };

        let host = vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
        assert_eq!(find_memory_type(&properties, 0b11, host), Some(1));
        assert_eq!(
            find_memory_type(&properties, 0b11, vk::MemoryPropertyFlags::DEVICE_LOCAL),
            Some(0)
        );
        assert_eq!(find_memory_type(&properties, 0b01, host), None);
    }

    #[test]
    fn buffers() {
        let vk = Rc::new(HeadlessVk::new());
        let properties = unsafe { vk.memory_properties() };

        let desc = BufferDesc::new(BufferKind::Uniform, 8);
        let buffer = unsafe { create_buffer(&vk, &properties, desc, Some(&[1, 2, 3])).unwrap() };
        assert_eq!(vk.buffer_data(buffer.buffer), Some(vec![1, 2, 3, 0, 0, 0, 0, 0]));
        assert!(vk.live_objects() > 0);

        drop(buffer);
        assert_eq!(vk.live_objects(), 0);

        // A failed allocation takes the buffer created so far with it.
        vk.fail_next(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY);
        let desc = BufferDesc::new(BufferKind::Vertex, 16);
        assert!(unsafe { create_buffer(&vk, &properties, desc, None) }.is_err());
        assert_eq!(vk.live_objects(), 0);
        assert!(vk.validation_errors().is_empty());
    }
}
