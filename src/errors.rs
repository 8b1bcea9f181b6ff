//! Errors of the rendering hardware interface.
//!
//! Only factories and device construction report errors through `Result`. The
//! command path (bind, draw, dispatch) logs native failures and keeps going.

pub use failure::Error as Failure;

pub type Result<T> = ::std::result::Result<T, Failure>;

/// The kinds of failures a device reports. They travel inside a `failure::Error`, use
/// `downcast_ref::<Error>()` to inspect them.
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "The graphics implementation doesn't support {}.", _0)]
    Requirement(String),
    #[fail(display = "{} is not supported by this device.", _0)]
    Unsupported(String),
    #[fail(display = "Failed to create shader, errors: \n{}.", _0)]
    ShaderCreationFailure(String),
    #[fail(display = "Framebuffer is incomplete. {}", _0)]
    FramebufferIncomplete(String),
    #[fail(display = "Invalid descriptor: {}.", _0)]
    InvalidDescriptor(String),
    #[fail(display = "Backend: {}", _0)]
    Backend(String),
    #[fail(display = "Window: {}", _0)]
    Window(String),
}

impl Error {
    /// Tries to recover the kind of a failure.
    pub fn kind(err: &Failure) -> Option<&Error> {
        err.downcast_ref::<Error>()
    }
}
