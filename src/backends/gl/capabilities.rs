use std::cmp;

use gl;
use gl::types::*;

use crate::errors::*;
use crate::params::DeviceParams;
use crate::rhi::capabilities::Capabilities;
use crate::rhi::texture::TextureFormat;

use super::api::GlApi;
use super::types;

/// Describes a version.
///
/// A version can only be compared to another version if they belong to the same API.
/// For example, both `Version::GL(3, 0) >= Version::ES(3, 0)` and `Version::ES(3, 0) >=
/// Version::GL(3, 0)` return `false`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Version {
    /// Regular OpenGL.
    GL(u8, u8),
    /// OpenGL embedded system.
    ES(u8, u8),
}

impl PartialOrd for Version {
    #[inline]
    fn partial_cmp(&self, other: &Version) -> Option<cmp::Ordering> {
        let (es1, major1, minor1) = match *self {
            Version::GL(major, minor) => (false, major, minor),
            Version::ES(major, minor) => (true, major, minor),
        };

        let (es2, major2, minor2) = match *other {
            Version::GL(major, minor) => (false, major, minor),
            Version::ES(major, minor) => (true, major, minor),
        };

        if es1 != es2 {
            None
        } else {
            match major1.cmp(&major2) {
                cmp::Ordering::Equal => Some(minor1.cmp(&minor2)),
                v => Some(v),
            }
        }
    }
}

impl Version {
    /// Parses the version string reported by `glGetString(GL_VERSION)`.
    pub fn parse(desc: &str) -> Result<Version> {
        let (es, desc) = if desc.starts_with("OpenGL ES-") {
            // Skips the profile, e.g. "OpenGL ES-CM 1.1".
            let profile = &desc[10..];
            let desc = profile.find(' ').map_or(profile, |i| &profile[i + 1..]);
            (true, desc)
        } else if desc.starts_with("OpenGL ES ") {
            (true, &desc[10..])
        } else {
            (false, desc)
        };

        let desc = desc
            .split(' ')
            .next()
            .ok_or_else(|| format_err!("[GL] Version string {} is unformaled.", desc))?;

        let mut iter = desc.split('.');
        let major = iter
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| format_err!("[GL] Failed to parse major version of {}.", desc))?;
        let minor = iter
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| format_err!("[GL] Failed to parse minor version of {}.", desc))?;

        if es {
            Ok(Version::ES(major, minor))
        } else {
            Ok(Version::GL(major, minor))
        }
    }

    /// Obtains the OpenGL version of the current context.
    pub unsafe fn query<G: GlApi>(gl: &G) -> Result<Version> {
        let desc = gl
            .get_string(gl::VERSION)
            .ok_or_else(|| format_err!("[GL] Version string is null."))?;

        Version::parse(&desc)
    }
}

macro_rules! extensions {
    ($($string:expr => $field:ident,)+) => {
        /// Contains data about the list of extensions.
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct Extensions {
            $(
                pub $field: bool,
            )+
        }

        impl Extensions {
            /// The names of all the extensions we are interested in.
            pub const NAMES: &'static [&'static str] = &[$($string,)+];

            /// Builds the list from extension names, unknown names are ignored.
            pub fn from_names<I, S>(names: I) -> Extensions
            where
                I: IntoIterator<Item = S>,
                S: AsRef<str>,
            {
                let mut extensions = Extensions::default();
                for name in names {
                    match name.as_ref() {
                        $(
                            $string => extensions.$field = true,
                        )+
                        _ => (),
                    }
                }

                extensions
            }

            /// Returns the list of extensions supported by the context.
            ///
            /// The version must match the one of the context.
            pub unsafe fn parse<G: GlApi>(gl: &G, version: Version) -> Extensions {
                if version >= Version::GL(3, 0) || version >= Version::ES(3, 0) {
                    let len = gl.get_integer(gl::NUM_EXTENSIONS).max(0) as GLuint;
                    Extensions::from_names((0..len).filter_map(|i| gl.get_string_i(gl::EXTENSIONS, i)))
                } else {
                    let list = gl.get_string(gl::EXTENSIONS).unwrap_or_default();
                    Extensions::from_names(list.split(' '))
                }
            }
        }
    }
}

extensions! {
    "GL_ARB_shader_objects" => gl_arb_shader_objects,
    "GL_ARB_vertex_shader" => gl_arb_vertex_shader,
    "GL_ARB_fragment_shader" => gl_arb_fragment_shader,
    "GL_ARB_vertex_buffer_object" => gl_arb_vertex_buffer_object,
    "GL_ARB_map_buffer_range" => gl_arb_map_buffer_range,
    "GL_ARB_uniform_buffer_object" => gl_arb_uniform_buffer_object,
    "GL_ARB_framebuffer_object" => gl_arb_framebuffer_object,
    "GL_ARB_vertex_array_object" => gl_arb_vertex_array_object,
    "GL_ARB_direct_state_access" => gl_arb_direct_state_access,
    "GL_ARB_texture_storage" => gl_arb_texture_storage,
    "GL_ARB_texture_multisample" => gl_arb_texture_multisample,
    "GL_ARB_texture_buffer_object" => gl_arb_texture_buffer_object,
    "GL_ARB_sampler_objects" => gl_arb_sampler_objects,
    "GL_ARB_separate_shader_objects" => gl_arb_separate_shader_objects,
    "GL_ARB_explicit_uniform_location" => gl_arb_explicit_uniform_location,
    "GL_ARB_shader_storage_buffer_object" => gl_arb_shader_storage_buffer_object,
    "GL_ARB_shader_image_load_store" => gl_arb_shader_image_load_store,
    "GL_ARB_draw_instanced" => gl_arb_draw_instanced,
    "GL_ARB_instanced_arrays" => gl_arb_instanced_arrays,
    "GL_ARB_draw_elements_base_vertex" => gl_arb_draw_elements_base_vertex,
    "GL_ARB_base_instance" => gl_arb_base_instance,
    "GL_ARB_draw_indirect" => gl_arb_draw_indirect,
    "GL_ARB_multi_draw_indirect" => gl_arb_multi_draw_indirect,
    "GL_ARB_geometry_shader4" => gl_arb_geometry_shader4,
    "GL_ARB_tessellation_shader" => gl_arb_tessellation_shader,
    "GL_ARB_compute_shader" => gl_arb_compute_shader,
    "GL_ARB_occlusion_query" => gl_arb_occlusion_query,
    "GL_ARB_pipeline_statistics_query" => gl_arb_pipeline_statistics_query,
    "GL_ARB_timer_query" => gl_arb_timer_query,
    "GL_ARB_copy_buffer" => gl_arb_copy_buffer,
    "GL_ARB_copy_image" => gl_arb_copy_image,
    "GL_ARB_viewport_array" => gl_arb_viewport_array,
    "GL_ARB_clip_control" => gl_arb_clip_control,
    "GL_ARB_texture_filter_anisotropic" => gl_arb_texture_filter_anisotropic,
    "GL_EXT_texture_filter_anisotropic" => gl_ext_texture_filter_anisotropic,
    "GL_EXT_texture_compression_s3tc" => gl_ext_texture_compression_s3tc,
    "GL_ARB_ES3_compatibility" => gl_arb_es3_compatibility,
    "GL_KHR_debug" => gl_khr_debug,
}

/// Represents the capabilities of the context.
///
/// Optional functionality is detected by extension strings only, the version is used for
/// the mandatory baseline.
#[derive(Debug, Clone)]
pub struct GlCapabilities {
    /// Returns a version or release number.
    pub version: Version,
    /// The company responsible for this GL implementation.
    pub vendor: String,
    /// The name of the renderer. This name is typically specific to a particular
    /// configuration of a hardware platform.
    pub renderer: String,
    /// The list of OpenGL extensions support by this implementation.
    pub extensions: Extensions,
    /// The context is in debug mode.
    pub debug: bool,

    pub max_viewports: u32,
    pub max_draw_buffers: u32,
    pub max_texture_size: u32,
    pub max_array_texture_layers: u32,
    /// Maximum number of textures that can be bound to a program.
    pub max_combined_texture_image_units: u32,
    /// Number of available buffer bind points for `GL_UNIFORM_BUFFER`.
    pub max_uniform_buffer_bindings: u32,
    pub max_uniform_block_size: u32,
    pub max_texture_buffer_size: u32,
    pub max_shader_storage_block_size: u32,
    /// The number of samples as reported by the driver.
    pub max_samples: i64,
    pub max_anisotropy: f32,
    pub max_patch_vertices: u32,
}

impl GlCapabilities {
    pub unsafe fn parse<G: GlApi>(gl: &G) -> Result<GlCapabilities> {
        let version = Version::query(gl)?;
        let extensions = Extensions::parse(gl, version);

        let debug = if version >= Version::GL(3, 0) {
            let flags = gl.get_integer(gl::CONTEXT_FLAGS) as GLenum;
            (flags & gl::CONTEXT_FLAG_DEBUG_BIT) != 0
        } else {
            false
        };

        let integer = |name| gl.get_integer(name).max(0) as u32;

        let max_viewports = if extensions.gl_arb_viewport_array {
            integer(gl::MAX_VIEWPORTS)
        } else {
            1
        };

        let max_uniform_buffer_bindings =
            if version >= Version::GL(3, 1) || extensions.gl_arb_uniform_buffer_object {
                integer(gl::MAX_UNIFORM_BUFFER_BINDINGS)
            } else {
                0
            };

        let max_texture_buffer_size = if extensions.gl_arb_texture_buffer_object {
            integer(gl::MAX_TEXTURE_BUFFER_SIZE)
        } else {
            0
        };

        let max_shader_storage_block_size = if extensions.gl_arb_shader_storage_buffer_object {
            integer(gl::MAX_SHADER_STORAGE_BLOCK_SIZE)
        } else {
            0
        };

        let max_anisotropy = if extensions.gl_arb_texture_filter_anisotropic
            || extensions.gl_ext_texture_filter_anisotropic
        {
            gl.get_float(types::MAX_TEXTURE_MAX_ANISOTROPY).max(1.0)
        } else {
            1.0
        };

        let max_patch_vertices = if extensions.gl_arb_tessellation_shader {
            integer(gl::MAX_PATCH_VERTICES)
        } else {
            0
        };

        let max_samples = if version >= Version::GL(3, 0) || extensions.gl_arb_framebuffer_object {
            i64::from(gl.get_integer(gl::MAX_SAMPLES))
        } else {
            1
        };

        Ok(GlCapabilities {
            version,
            vendor: gl.get_string(gl::VENDOR).unwrap_or_default(),
            renderer: gl.get_string(gl::RENDERER).unwrap_or_default(),
            extensions,
            debug,
            max_viewports: max_viewports.max(1),
            max_draw_buffers: integer(gl::MAX_DRAW_BUFFERS).max(1),
            max_texture_size: integer(gl::MAX_TEXTURE_SIZE),
            max_array_texture_layers: integer(gl::MAX_ARRAY_TEXTURE_LAYERS),
            max_combined_texture_image_units: integer(gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS),
            max_uniform_buffer_bindings,
            max_uniform_block_size: integer(gl::MAX_UNIFORM_BLOCK_SIZE),
            max_texture_buffer_size,
            max_shader_storage_block_size,
            max_samples,
            max_anisotropy,
            max_patch_vertices,
        })
    }

    /// Objects could be modified without binding them first.
    #[inline]
    pub fn dsa(&self) -> bool {
        self.extensions.gl_arb_direct_state_access
    }

    #[inline]
    pub fn sampler_objects(&self) -> bool {
        self.extensions.gl_arb_sampler_objects
    }

    /// Uniforms of a program could be written without making it current.
    #[inline]
    pub fn program_uniforms(&self) -> bool {
        self.extensions.gl_arb_separate_shader_objects || self.dsa()
    }

    #[inline]
    pub fn texture_storage(&self) -> bool {
        self.extensions.gl_arb_texture_storage && self.dsa()
    }

    /// Converts into the backend-agnostic capabilities, `params` caps the limits we are
    /// willing to rely on.
    pub fn to_capabilities(&self, params: &DeviceParams) -> Capabilities {
        let exts = &self.extensions;
        let draw_indirect = exts.gl_arb_draw_indirect;

        Capabilities {
            device_name: self.renderer.clone(),
            preferred_swap_chain_color_format: TextureFormat::R8G8B8A8,
            preferred_swap_chain_depth_stencil_format: TextureFormat::D32Float,
            max_viewports: self.max_viewports,
            max_simultaneous_render_targets: self.max_draw_buffers,
            max_texture_dimension: self.max_texture_size,
            max_texture_array_slices: self.max_array_texture_layers,
            max_texture_units: self.max_combined_texture_image_units,
            max_uniform_buffer_bindings: self.max_uniform_buffer_bindings,
            max_uniform_buffer_size: self.max_uniform_block_size,
            max_texture_buffer_size: self.max_texture_buffer_size,
            max_structured_buffer_size: self.max_shader_storage_block_size,
            // Without draw indirect, the arguments live in a CPU shadow copy.
            max_indirect_buffer_size: if draw_indirect {
                ::std::u32::MAX
            } else {
                64 * 1024
            },
            max_multisamples: Capabilities::clamp_multisamples(
                self.max_samples,
                params.max_multisamples,
            ),
            max_anisotropy: self.max_anisotropy,
            max_patch_vertices: self.max_patch_vertices,
            upper_left_origin: false,
            zero_to_one_clip_z: false,
            instanced_arrays: exts.gl_arb_instanced_arrays,
            draw_instanced: exts.gl_arb_draw_instanced,
            base_vertex: exts.gl_arb_draw_elements_base_vertex,
            base_instance: exts.gl_arb_base_instance,
            draw_indirect,
            multi_draw_indirect: draw_indirect && exts.gl_arb_multi_draw_indirect,
            geometry_shader: exts.gl_arb_geometry_shader4,
            tessellation_shader: exts.gl_arb_tessellation_shader,
            compute_shader: exts.gl_arb_compute_shader,
            occlusion_query: exts.gl_arb_occlusion_query,
            pipeline_statistics_query: exts.gl_arb_pipeline_statistics_query,
            timestamp_query: exts.gl_arb_timer_query,
            debug_markers: exts.gl_khr_debug,
        }
    }
}

/// Checks the mandatory baseline, the device can't be created without it.
pub fn check_capabilities(caps: &GlCapabilities) -> Result<()> {
    let exts = &caps.extensions;
    let version = caps.version;

    if version < Version::GL(1, 5)
        && version < Version::ES(2, 0)
        && (!exts.gl_arb_vertex_buffer_object || !exts.gl_arb_map_buffer_range)
    {
        return Err(Error::Requirement("vertex buffer objects".into()).into());
    }

    if version < Version::GL(2, 0)
        && version < Version::ES(2, 0)
        && (!exts.gl_arb_shader_objects
            || !exts.gl_arb_vertex_shader
            || !exts.gl_arb_fragment_shader)
    {
        return Err(Error::Requirement("shader objects".into()).into());
    }

    if version < Version::GL(3, 0) && version < Version::ES(2, 0) && !exts.gl_arb_framebuffer_object
    {
        return Err(Error::Requirement("framebuffer objects".into()).into());
    }

    if version < Version::GL(3, 1)
        && version < Version::ES(3, 0)
        && !exts.gl_arb_uniform_buffer_object
    {
        return Err(Error::Requirement("uniform buffer objects".into()).into());
    }

    if version < Version::GL(3, 0) && version < Version::ES(3, 0) && !exts.gl_arb_vertex_array_object
    {
        return Err(Error::Requirement("vertex array objects".into()).into());
    }

    if caps.max_combined_texture_image_units == 0 {
        return Err(Error::Requirement("texture image units".into()).into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version() {
        assert_eq!(Version::parse("4.6.0 NVIDIA 390.77").unwrap(), Version::GL(4, 6));
        assert_eq!(Version::parse("OpenGL ES 3.2 Mesa").unwrap(), Version::ES(3, 2));
        assert!(Version::parse("garbage").is_err());
        assert_eq!(Version::parse("OpenGL ES-CM 1.1").unwrap(), Version::ES(1, 1));
        assert!(Version::parse("OpenGL ES-1").is_err());
        assert!(Version::parse("OpenGL ES-").is_err());

        assert!(Version::GL(4, 5) > Version::GL(3, 3));
        assert!(!(Version::GL(3, 0) >= Version::ES(3, 0)));
    }

    #[test]
    fn extensions() {
        let exts = Extensions::from_names(&["GL_ARB_draw_indirect", "GL_Unknown"]);
        assert!(exts.gl_arb_draw_indirect);
        assert!(!exts.gl_arb_multi_draw_indirect);
        assert!(Extensions::NAMES.contains(&"GL_KHR_debug"));
    }
}
