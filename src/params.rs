//! Functions for loading device settings.

use crate::errors::*;

/// The graphics backend a device is created with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    OpenGL,
    Vulkan,
}

/// A structure containing configuration data for the rendering device, which are used
/// to specify optional behaviours and the limits we are willing to rely on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceParams {
    /// Sets the backend that should be created.
    pub backend: BackendKind,
    /// Enables debug output and debug markers (KHR_debug or VK_EXT_debug_utils). Debug
    /// marker packets are no-ops when this is off.
    pub debug: bool,
    /// Enables extra validation of the native objects (framebuffer completeness checks,
    /// `glGetError` polling after every create call).
    pub validation: bool,
    /// The ceiling of multisamples. Drivers might report more, but we never go above
    /// what has been tested.
    pub max_multisamples: u8,
    /// The maximum number of resource groups that could be alive per root signature.
    pub max_resource_groups: u32,
    /// Sets the name of the shader language to use, `None` selects the default one.
    pub shader_language: Option<String>,
}

impl Default for DeviceParams {
    fn default() -> Self {
        DeviceParams {
            backend: BackendKind::OpenGL,
            debug: false,
            validation: false,
            max_multisamples: 8,
            max_resource_groups: 1024,
            shader_language: None,
        }
    }
}

impl DeviceParams {
    /// Parses `DeviceParams` from a json string. Missing fields fall back to defaults.
    pub fn from_json(src: &str) -> Result<Self> {
        let params: DeviceParams = serde_json::from_str(src)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_multisamples == 0 || !self.max_multisamples.is_power_of_two() {
            return Err(Error::InvalidDescriptor(format!(
                "max_multisamples must be a power of two, got {}",
                self.max_multisamples
            ))
            .into());
        }

        if self.max_resource_groups == 0 {
            return Err(
                Error::InvalidDescriptor("max_resource_groups must not be zero".into()).into(),
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let params = DeviceParams::from_json("{}").unwrap();
        assert_eq!(params.backend, BackendKind::OpenGL);
        assert_eq!(params.max_multisamples, 8);
        assert!(params.shader_language.is_none());
    }

    #[test]
    fn overrides() {
        let src = r#"{ "backend": "Vulkan", "debug": true, "max_multisamples": 4 }"#;
        let params = DeviceParams::from_json(src).unwrap();
        assert_eq!(params.backend, BackendKind::Vulkan);
        assert!(params.debug);
        assert_eq!(params.max_multisamples, 4);
    }

    #[test]
    fn rejects_odd_multisamples() {
        assert!(DeviceParams::from_json(r#"{ "max_multisamples": 3 }"#).is_err());
    }
}
