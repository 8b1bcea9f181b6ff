//! The Vulkan backend.
//!
//! Everything goes through a `VkApi`. `NativeVk` owns an instance and a logical device
//! created through `ash`, `HeadlessVk` emulates them. Shaders are consumed as SPIR-V.

pub mod api;
pub mod capabilities;
pub mod headless;
pub mod native;
pub mod types;

mod device;
mod pipeline;
mod program;
mod resource_group;
mod resources;
mod root_signature;

pub use self::api::{DescriptorInfo, DescriptorWrite, SwapChainImages, VkApi};
pub use self::capabilities::VkCapabilities;
pub use self::device::VulkanDevice;
pub use self::headless::{HeadlessVk, VkCall};
pub use self::native::NativeVk;
pub use self::pipeline::{VkComputePipelineState, VkGraphicsPipelineState};
pub use self::program::{VkComputeProgram, VkGraphicsProgram};
pub use self::resource_group::VkResourceGroup;
pub use self::resources::{
    VkAttachment, VkBuffer, VkFramebuffer, VkQueryPool, VkSamplerState, VkSwapChain, VkTexture,
    VkVertexArray,
};
pub use self::root_signature::VkRootSignature;

use ash::vk;

use crate::errors::*;

/// Logs a failed native call and turns it into an error.
pub(crate) fn vk_error(what: &str, err: vk::Result) -> failure::Error {
    error!("[VK] Failed to {}, {}.", what, err);
    Error::Backend(format!("[VK] Failed to {}, {}", what, err)).into()
}
