//! Render targets: framebuffers, swap chains and the rectangles drawn into them.

use std::rc::Rc;

use super::device::Device;
use super::texture::TextureFormat;

/// Anything that could be rendered into.
pub trait RenderTargetObject {
    /// Gets the current width and height in pixels, at least `1x1`.
    fn width_and_height(&self) -> (u32, u32);
}

/// The viewport relative to the top-left corner of the render target, in pixels.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Viewport {
    pub top_left_x: f32,
    pub top_left_y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Viewport {
            top_left_x: 0.0,
            top_left_y: 0.0,
            width,
            height,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// The scissor box relative to the top-left corner of the render target, in pixels.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct ScissorRectangle {
    pub top_left_x: i32,
    pub top_left_y: i32,
    pub bottom_right_x: i32,
    pub bottom_right_y: i32,
}

impl ScissorRectangle {
    #[inline]
    pub fn width(&self) -> i32 {
        self.bottom_right_x - self.top_left_x
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.bottom_right_y - self.top_left_y
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
pub struct ClearFlags {
    pub color: bool,
    pub depth: bool,
    pub stencil: bool,
}

impl ClearFlags {
    pub fn all() -> Self {
        ClearFlags {
            color: true,
            depth: true,
            stencil: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.color && !self.depth && !self.stencil
    }
}

/// One attachment of a framebuffer, a mipmap of a texture layer.
pub struct FramebufferAttachment<D: Device> {
    pub texture: Rc<D::Texture>,
    pub mipmap_index: u32,
    pub layer_index: u32,
}

impl<D: Device> FramebufferAttachment<D> {
    pub fn new(texture: Rc<D::Texture>) -> Self {
        FramebufferAttachment {
            texture,
            mipmap_index: 0,
            layer_index: 0,
        }
    }
}

impl<D: Device> Clone for FramebufferAttachment<D> {
    fn clone(&self) -> Self {
        FramebufferAttachment {
            texture: self.texture.clone(),
            mipmap_index: self.mipmap_index,
            layer_index: self.layer_index,
        }
    }
}

/// The destination of graphics commands.
pub enum RenderTarget<D: Device> {
    Framebuffer(Rc<D::Framebuffer>),
    SwapChain(Rc<D::SwapChain>),
}

impl<D: Device> Clone for RenderTarget<D> {
    fn clone(&self) -> Self {
        match *self {
            RenderTarget::Framebuffer(ref v) => RenderTarget::Framebuffer(v.clone()),
            RenderTarget::SwapChain(ref v) => RenderTarget::SwapChain(v.clone()),
        }
    }
}

impl<D: Device> PartialEq for RenderTarget<D> {
    fn eq(&self, rhs: &Self) -> bool {
        match (self, rhs) {
            (RenderTarget::Framebuffer(a), RenderTarget::Framebuffer(b)) => Rc::ptr_eq(a, b),
            (RenderTarget::SwapChain(a), RenderTarget::SwapChain(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<D: Device> RenderTarget<D> {
    pub fn width_and_height(&self) -> (u32, u32) {
        match *self {
            RenderTarget::Framebuffer(ref v) => v.width_and_height(),
            RenderTarget::SwapChain(ref v) => v.width_and_height(),
        }
    }
}

/// The parameters of a swap chain.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub struct SwapChainDesc {
    pub color_format: TextureFormat,
    pub depth_stencil_format: Option<TextureFormat>,
    pub vsync: bool,
    pub buffer_count: u32,
}

impl Default for SwapChainDesc {
    fn default() -> Self {
        SwapChainDesc {
            color_format: TextureFormat::B8G8R8A8,
            depth_stencil_format: Some(TextureFormat::D32Float),
            vsync: true,
            buffer_count: 2,
        }
    }
}
