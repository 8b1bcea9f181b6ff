//! The concrete backends, and the switch between them.

pub mod gl;
pub mod vulkan;

use std::os::raw::c_void;

use crate::errors::*;
use crate::params::{BackendKind, DeviceParams};
use crate::rhi::device::Device;

use self::gl::{GlApi, NativeGl, OpenGLDevice};
use self::vulkan::{NativeVk, VkApi, VulkanDevice};

/// Generic code which runs against whatever device has been picked.
pub trait DeviceVisitor {
    type Output;

    fn visit<D: Device>(self, device: &mut D) -> Self::Output;
}

/// The backend picked at startup. Matching on it once and handing the concrete device
/// to a `DeviceVisitor` keeps every call below monomorphic.
pub enum Rhi<G: GlApi = NativeGl, V: VkApi = NativeVk> {
    OpenGL(OpenGLDevice<G>),
    Vulkan(VulkanDevice<V>),
}

impl Rhi<NativeGl, NativeVk> {
    /// Creates the backend named by `params.backend`. OpenGL functions are loaded with
    /// `loader`, which is never called for Vulkan.
    ///
    /// # Safety
    ///
    /// For OpenGL, the context `loader` reads from must be current on this thread for the
    /// whole lifetime of the device.
    pub unsafe fn new<F>(params: DeviceParams, loader: F) -> Result<Self>
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        match params.backend {
            BackendKind::OpenGL => {
                let gl = NativeGl::load_with(loader);
                Ok(Rhi::OpenGL(OpenGLDevice::new(gl, params)?))
            }
            BackendKind::Vulkan => {
                let vk = NativeVk::new(&params)?;
                Ok(Rhi::Vulkan(VulkanDevice::new(vk, params)?))
            }
        }
    }
}

impl<G: GlApi, V: VkApi> Rhi<G, V> {
    #[inline]
    pub fn backend(&self) -> BackendKind {
        match *self {
            Rhi::OpenGL(_) => BackendKind::OpenGL,
            Rhi::Vulkan(_) => BackendKind::Vulkan,
        }
    }

    pub fn visit<T: DeviceVisitor>(&mut self, visitor: T) -> T::Output {
        match *self {
            Rhi::OpenGL(ref mut device) => visitor.visit(device),
            Rhi::Vulkan(ref mut device) => visitor.visit(device),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::gl::HeadlessGl;
    use crate::backends::vulkan::HeadlessVk;

    struct Name;

    impl DeviceVisitor for Name {
        type Output = &'static str;

        fn visit<D: Device>(self, device: &mut D) -> &'static str {
            device.name()
        }
    }

    #[test]
    fn visit() {
        let params = DeviceParams::default();
        let gl = OpenGLDevice::new(HeadlessGl::new(), params.clone()).unwrap();
        let mut rhi: Rhi<HeadlessGl, HeadlessVk> = Rhi::OpenGL(gl);
        assert_eq!(rhi.backend(), BackendKind::OpenGL);
        assert_eq!(rhi.visit(Name), "OpenGL");

        let vk = VulkanDevice::new(HeadlessVk::new(), params).unwrap();
        let mut rhi: Rhi<HeadlessGl, HeadlessVk> = Rhi::Vulkan(vk);
        assert_eq!(rhi.backend(), BackendKind::Vulkan);
        assert_eq!(rhi.visit(Name), "Vulkan");
    }
}
