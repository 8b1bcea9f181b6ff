//! The windowing collaborator. The device never owns a window, it only consumes the
//! native handles and asks for the current drawable size when it needs one.

use std::os::raw::c_void;

use cgmath::Vector2;

use crate::errors::*;

/// The platform specific handle bundle of a window (Linux/XCB).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PlatformData {
    pub connection: *mut c_void,
    pub window: u32,
}

/// Something that owns a native window we could render into.
pub trait WindowSource {
    /// Gets the native handles of this window.
    fn platform_data(&self) -> PlatformData;

    /// Queries the current drawable size from the native windowing system.
    fn dimensions(&self) -> Result<Vector2<u32>>;

    /// Swaps the front and back buffers of the GL context attached to this window.
    fn swap_buffers(&self) -> Result<()> {
        Ok(())
    }
}

/// Gets the current width and height of the window. The size is never cached, and falls
/// back to `1x1` if the query fails or reports an empty area.
pub fn get_width_and_height(window: &dyn WindowSource) -> (u32, u32) {
    match window.dimensions() {
        Ok(v) => (v.x.max(1), v.y.max(1)),
        Err(err) => {
            warn!("Failed to query window dimensions, {}.", err);
            (1, 1)
        }
    }
}

/// A window that does not exist. Reports a fixed size and ignores swaps.
#[derive(Debug, Copy, Clone)]
pub struct HeadlessWindow {
    pub dimensions: Vector2<u32>,
}

impl HeadlessWindow {
    pub fn new(width: u32, height: u32) -> Self {
        HeadlessWindow {
            dimensions: Vector2::new(width, height),
        }
    }
}

impl WindowSource for HeadlessWindow {
    fn platform_data(&self) -> PlatformData {
        PlatformData {
            connection: ::std::ptr::null_mut(),
            window: 0,
        }
    }

    fn dimensions(&self) -> Result<Vector2<u32>> {
        Ok(self.dimensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenWindow;

    impl WindowSource for BrokenWindow {
        fn platform_data(&self) -> PlatformData {
            HeadlessWindow::new(0, 0).platform_data()
        }

        fn dimensions(&self) -> Result<Vector2<u32>> {
            Err(Error::Window("connection lost".into()).into())
        }
    }

    #[test]
    fn floor() {
        assert_eq!(get_width_and_height(&HeadlessWindow::new(0, 0)), (1, 1));
        assert_eq!(get_width_and_height(&HeadlessWindow::new(640, 0)), (640, 1));
        assert_eq!(get_width_and_height(&BrokenWindow), (1, 1));
        assert_eq!(get_width_and_height(&HeadlessWindow::new(640, 480)), (640, 480));
    }
}
