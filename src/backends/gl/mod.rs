//! The OpenGL backend.
//!
//! Everything goes through a `GlApi`. With `NativeGl` the calls reach the function table
//! of the context current on this thread, with `HeadlessGl` they are emulated.

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
mod state;

pub use self::api::GlApi;
pub use self::capabilities::{Extensions, GlCapabilities, Version};
pub use self::device::OpenGLDevice;
pub use self::headless::{GlCall, HeadlessGl};
pub use self::native::NativeGl;
pub use self::pipeline::{GlComputePipelineState, GlGraphicsPipelineState};
pub use self::program::{GlComputeProgram, GlGraphicsProgram};
pub use self::resource_group::GlResourceGroup;
pub use self::resources::{
    GlBuffer, GlFramebuffer, GlQueryPool, GlSamplerState, GlSwapChain, GlTexture, GlVertexArray,
};
pub use self::root_signature::GlRootSignature;

use crate::errors::*;

/// Polls the error flag of the context.
pub(crate) unsafe fn check<G: GlApi>(gl: &G) -> Result<()> {
    match gl.get_error() {
        gl::NO_ERROR => Ok(()),
        err => Err(Error::Backend(format!("[GL] {}", types::error_string(err))).into()),
    }
}
