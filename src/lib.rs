//! # What is This?
//!
//! A rendering hardware interface (RHI). It exposes one resource and command model
//! (textures, buffers, root signatures, resource groups, pipeline states, query pools,
//! swap chains) and maps it onto two concrete graphics backends, OpenGL and Vulkan.
//!
//! The backend-agnostic half lives in [`rhi`]. Every backend implements the
//! [`rhi::Device`] trait, whose associated types are the backend's own resource objects.
//! Engine code is written generically against `D: Device`, and the concrete backend is
//! picked exactly once at startup through [`Rhi`].
//!
//! ```rust,ignore
//! use crayon_rhi::prelude::*;
//!
//! struct Frame;
//!
//! impl DeviceVisitor for Frame {
//!     type Output = ();
//!
//!     fn visit<D: Device>(self, device: &mut D) {
//!         let mut cmds = CommandBuffer::<D>::new();
//!         cmds.set_debug_marker("frame");
//!         device.dispatch_command_buffer(&cmds);
//!     }
//! }
//! ```
//!
//! Both backends talk to the driver through a thin native API seam (`GlApi` and `VkApi`).
//! Besides the native implementations, each backend ships a headless implementation which
//! emulates object allocation and records native calls. It is used by the tests and by
//! servers that have no GPU at all.

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

pub mod errors;
pub mod params;
pub mod window;

pub mod rhi;

pub mod backends;

pub mod prelude {
    pub use crate::backends::{DeviceVisitor, Rhi};
    pub use crate::errors::{Error, Result};
    pub use crate::params::{BackendKind, DeviceParams};
    pub use crate::rhi::prelude::*;
    pub use crate::window::{PlatformData, WindowSource};
}

pub use self::backends::{DeviceVisitor, Rhi};
