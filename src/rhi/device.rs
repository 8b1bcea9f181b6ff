//! The contract every backend fulfills.

use std::rc::Rc;

use crate::errors::*;
use crate::params::DeviceParams;
use crate::window::WindowSource;

use super::buffer::{
    BufferDesc, BufferKind, MapType, MappedSubresource, VertexArrayVertexBuffer, VertexAttributes,
};
use super::capabilities::Capabilities;
use super::command::{self, CommandBuffer};
use super::framebuffer::{
    ClearFlags, FramebufferAttachment, RenderTarget, RenderTargetObject, ScissorRectangle,
    SwapChainDesc, Viewport,
};
use super::pipeline::{GraphicsPipelineStateDesc, GraphicsShaderSources, ShaderSource};
use super::query::{QueryControlFlags, QueryResultFlags, QueryType};
use super::resource::{
    BufferObject, QueryPoolObject, Resource, RootSignatureObject, TextureObject,
};
use super::root_signature::RootSignatureDesc;
use super::sampler::SamplerStateDesc;
use super::texture::{TextureDesc, TextureDimension, TextureFlags, TextureFormat, TextureUsage};

/// The shader languages a device could consume.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ShaderLanguage {
    Glsl,
    SpirV,
}

impl ShaderLanguage {
    pub fn name(self) -> &'static str {
        match self {
            ShaderLanguage::Glsl => "GLSL",
            ShaderLanguage::SpirV => "SPIRV",
        }
    }

    pub fn from_name(name: &str) -> Option<ShaderLanguage> {
        if name.eq_ignore_ascii_case("GLSL") {
            Some(ShaderLanguage::Glsl)
        } else if name.eq_ignore_ascii_case("SPIRV") || name.eq_ignore_ascii_case("SPIR-V") {
            Some(ShaderLanguage::SpirV)
        } else {
            None
        }
    }

    pub fn accepts(self, source: &ShaderSource) -> bool {
        match (self, source) {
            (ShaderLanguage::Glsl, ShaderSource::Glsl(_)) => true,
            (ShaderLanguage::SpirV, ShaderSource::SpirV(_)) => true,
            _ => false,
        }
    }
}

/// A rendering device.
///
/// Factories return new reference counted objects, or an error which has already been
/// logged. Everything else runs on the command path: it never fails loudly, native
/// errors are logged and the device keeps going. Precondition violations (zero sized
/// objects, mismatched resource groups, empty command buffers) are assertions.
///
/// The bound state (root signatures, pipeline states, vertex array, render target) is
/// owned by the device and only mutated through the `set_*` methods. Setting a slot
/// releases the previously held reference.
pub trait Device: Sized {
    type Buffer: BufferObject;
    type Texture: TextureObject;
    type SamplerState;
    type RootSignature: RootSignatureObject;
    type ResourceGroup;
    type GraphicsProgram;
    type ComputeProgram;
    type GraphicsPipelineState;
    type ComputePipelineState;
    type VertexArray;
    type Framebuffer: RenderTargetObject;
    type SwapChain: RenderTargetObject;
    type QueryPool: QueryPoolObject;

    /// The name of the backend.
    fn name(&self) -> &'static str;
    fn params(&self) -> &DeviceParams;
    fn capabilities(&self) -> &Capabilities;

    /// Gets a shader language by name, `None` selects the default one of this device.
    fn shader_language(&self, name: Option<&str>) -> Result<ShaderLanguage>;

    fn create_buffer(&mut self, desc: BufferDesc, data: Option<&[u8]>) -> Result<Rc<Self::Buffer>>;

    fn create_texture(&mut self, desc: TextureDesc, data: Option<&[u8]>)
        -> Result<Rc<Self::Texture>>;

    fn create_texture_1d(
        &mut self,
        width: u32,
        format: TextureFormat,
        flags: TextureFlags,
        usage: TextureUsage,
        data: Option<&[u8]>,
    ) -> Result<Rc<Self::Texture>> {
        let desc = TextureDesc {
            dimension: TextureDimension::D1,
            format,
            width,
            height: 1,
            depth: 1,
            flags,
            usage,
            samples: 1,
        };

        self.create_texture(desc, data)
    }

    fn create_texture_1d_array(
        &mut self,
        width: u32,
        slices: u32,
        format: TextureFormat,
        flags: TextureFlags,
        usage: TextureUsage,
        data: Option<&[u8]>,
    ) -> Result<Rc<Self::Texture>> {
        let desc = TextureDesc {
            dimension: TextureDimension::D1Array,
            format,
            width,
            height: 1,
            depth: slices,
            flags,
            usage,
            samples: 1,
        };

        self.create_texture(desc, data)
    }

    fn create_texture_2d(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
        flags: TextureFlags,
        usage: TextureUsage,
        samples: u8,
        data: Option<&[u8]>,
    ) -> Result<Rc<Self::Texture>> {
        let desc = TextureDesc {
            dimension: TextureDimension::D2,
            format,
            width,
            height,
            depth: 1,
            flags,
            usage,
            samples,
        };

        self.create_texture(desc, data)
    }

    fn create_texture_2d_array(
        &mut self,
        width: u32,
        height: u32,
        slices: u32,
        format: TextureFormat,
        flags: TextureFlags,
        usage: TextureUsage,
        data: Option<&[u8]>,
    ) -> Result<Rc<Self::Texture>> {
        let desc = TextureDesc {
            dimension: TextureDimension::D2Array,
            format,
            width,
            height,
            depth: slices,
            flags,
            usage,
            samples: 1,
        };

        self.create_texture(desc, data)
    }

    fn create_texture_3d(
        &mut self,
        width: u32,
        height: u32,
        depth: u32,
        format: TextureFormat,
        flags: TextureFlags,
        usage: TextureUsage,
        data: Option<&[u8]>,
    ) -> Result<Rc<Self::Texture>> {
        let desc = TextureDesc {
            dimension: TextureDimension::D3,
            format,
            width,
            height,
            depth,
            flags,
            usage,
            samples: 1,
        };

        self.create_texture(desc, data)
    }

    fn create_texture_cube(
        &mut self,
        width: u32,
        format: TextureFormat,
        flags: TextureFlags,
        usage: TextureUsage,
        data: Option<&[u8]>,
    ) -> Result<Rc<Self::Texture>> {
        let desc = TextureDesc {
            dimension: TextureDimension::Cube,
            format,
            width,
            height: width,
            depth: 1,
            flags,
            usage,
            samples: 1,
        };

        self.create_texture(desc, data)
    }

    fn create_texture_cube_array(
        &mut self,
        width: u32,
        slices: u32,
        format: TextureFormat,
        flags: TextureFlags,
        usage: TextureUsage,
        data: Option<&[u8]>,
    ) -> Result<Rc<Self::Texture>> {
        let desc = TextureDesc {
            dimension: TextureDimension::CubeArray,
            format,
            width,
            height: width,
            depth: slices,
            flags,
            usage,
            samples: 1,
        };

        self.create_texture(desc, data)
    }

    fn create_sampler_state(&mut self, desc: &SamplerStateDesc) -> Result<Rc<Self::SamplerState>>;

    fn create_root_signature(&mut self, desc: &RootSignatureDesc) -> Result<Rc<Self::RootSignature>>;

    /// Creates a resource group satisfying the descriptor table of root parameter
    /// `root_parameter_index`. `resources` align 1:1 with the ranges of the table,
    /// `sampler_states` optionally pairs a sampler state with every slot.
    ///
    /// # Panics
    ///
    /// Panics if the number of resources does not match the number of ranges, or if a
    /// resource does not fit the range it is bound to. `sampler_states` must hold one
    /// entry per resource when given.
    fn create_resource_group(
        &mut self,
        root_signature: &Rc<Self::RootSignature>,
        root_parameter_index: u32,
        resources: &[Resource<Self>],
        sampler_states: Option<&[Option<Rc<Self::SamplerState>>]>,
    ) -> Result<Rc<Self::ResourceGroup>>;

    /// Creates a graphics program. The vertex attributes are bound to the locations of
    /// their position in `vertex_attributes`.
    fn create_graphics_program(
        &mut self,
        root_signature: &Rc<Self::RootSignature>,
        vertex_attributes: &VertexAttributes,
        sources: &GraphicsShaderSources,
    ) -> Result<Rc<Self::GraphicsProgram>>;

    fn create_compute_program(
        &mut self,
        root_signature: &Rc<Self::RootSignature>,
        source: &ShaderSource,
    ) -> Result<Rc<Self::ComputeProgram>>;

    fn create_graphics_pipeline_state(
        &mut self,
        desc: &GraphicsPipelineStateDesc<Self>,
    ) -> Result<Rc<Self::GraphicsPipelineState>>;

    fn create_compute_pipeline_state(
        &mut self,
        root_signature: &Rc<Self::RootSignature>,
        program: &Rc<Self::ComputeProgram>,
    ) -> Result<Rc<Self::ComputePipelineState>>;

    fn create_vertex_array(
        &mut self,
        attributes: &VertexAttributes,
        vertex_buffers: &[VertexArrayVertexBuffer<Self>],
        index_buffer: Option<&Rc<Self::Buffer>>,
    ) -> Result<Rc<Self::VertexArray>>;

    fn create_framebuffer(
        &mut self,
        colors: &[FramebufferAttachment<Self>],
        depth_stencil: Option<&FramebufferAttachment<Self>>,
    ) -> Result<Rc<Self::Framebuffer>>;

    fn create_swap_chain(
        &mut self,
        window: Rc<dyn WindowSource>,
        desc: &SwapChainDesc,
    ) -> Result<Rc<Self::SwapChain>>;

    /// Creates a pool of `number_of_queries` queries.
    ///
    /// # Panics
    ///
    /// Panics if `number_of_queries` is zero.
    fn create_query_pool(
        &mut self,
        query_type: QueryType,
        number_of_queries: u32,
    ) -> Result<Rc<Self::QueryPool>>;

    /// Maps a buffer into CPU visible memory.
    fn map(&mut self, buffer: &Rc<Self::Buffer>, map_type: MapType) -> Result<MappedSubresource>;

    fn unmap(&mut self, buffer: &Rc<Self::Buffer>);

    /// Reads the results of `count` queries, starting at `first`, into `data` at `stride`
    /// separated offsets. Returns `false` if any of the results is not available yet,
    /// unless `flags.wait` is set, which busy-waits until all of them are.
    fn get_query_pool_results(
        &mut self,
        pool: &Rc<Self::QueryPool>,
        data: &mut [u8],
        first: u32,
        count: u32,
        stride: u32,
        flags: QueryResultFlags,
    ) -> bool;

    /// Presents the current back buffer of the swap chain.
    fn present(&mut self, swap_chain: &Rc<Self::SwapChain>);

    fn set_graphics_root_signature(&mut self, root_signature: Option<Rc<Self::RootSignature>>);
    fn set_graphics_pipeline_state(&mut self, pipeline: Option<Rc<Self::GraphicsPipelineState>>);
    fn set_graphics_resource_group(
        &mut self,
        root_parameter_index: u32,
        group: Option<Rc<Self::ResourceGroup>>,
    );
    fn set_graphics_vertex_array(&mut self, vertex_array: Option<Rc<Self::VertexArray>>);
    fn set_graphics_viewports(&mut self, viewports: &[Viewport]);
    fn set_graphics_scissor_rectangles(&mut self, rectangles: &[ScissorRectangle]);
    fn set_graphics_render_target(&mut self, render_target: Option<RenderTarget<Self>>);
    fn clear_graphics(&mut self, flags: ClearFlags, color: [f32; 4], z: f32, stencil: u32);

    /// Draws with `DrawArguments` sourced from an indirect buffer.
    fn draw_graphics(&mut self, buffer: &Rc<Self::Buffer>, offset: u32, number_of_draws: u32);
    /// Draws with tightly packed little endian `DrawArguments`, one native draw per entry.
    fn draw_graphics_emulated(&mut self, arguments: &[u8], number_of_draws: u32);
    fn draw_indexed_graphics(
        &mut self,
        buffer: &Rc<Self::Buffer>,
        offset: u32,
        number_of_draws: u32,
    );
    fn draw_indexed_graphics_emulated(&mut self, arguments: &[u8], number_of_draws: u32);

    fn set_compute_root_signature(&mut self, root_signature: Option<Rc<Self::RootSignature>>);
    fn set_compute_pipeline_state(&mut self, pipeline: Option<Rc<Self::ComputePipelineState>>);
    fn set_compute_resource_group(
        &mut self,
        root_parameter_index: u32,
        group: Option<Rc<Self::ResourceGroup>>,
    );
    fn dispatch_compute(&mut self, x: u32, y: u32, z: u32);

    fn set_texture_minimum_maximum_mipmap_index(
        &mut self,
        texture: &Rc<Self::Texture>,
        minimum: u32,
        maximum: u32,
    );
    fn resolve_multisample_framebuffer(
        &mut self,
        destination: &RenderTarget<Self>,
        source: &Rc<Self::Framebuffer>,
    );
    fn copy_resource(&mut self, destination: &Resource<Self>, source: &Resource<Self>);
    fn generate_mipmaps(&mut self, texture: &Rc<Self::Texture>);

    /// Copies `data` into a uniform buffer through `map` and `unmap`.
    fn copy_uniform_buffer_data(&mut self, buffer: &Rc<Self::Buffer>, data: &[u8]) {
        debug_assert_eq!(buffer.desc().kind, BufferKind::Uniform);
        debug_assert!(data.len() <= buffer.desc().size as usize);

        match self.map(buffer, MapType::WriteDiscard) {
            Ok(mapped) => {
                let len = data.len().min(mapped.size);
                unsafe {
                    mapped.as_slice_mut()[..len].copy_from_slice(&data[..len]);
                }

                self.unmap(buffer);
            }
            Err(err) => {
                error!("Failed to map uniform buffer, {}.", err);
            }
        }
    }

    fn reset_query_pool(&mut self, pool: &Rc<Self::QueryPool>, first: u32, count: u32);
    fn begin_query(&mut self, pool: &Rc<Self::QueryPool>, index: u32, flags: QueryControlFlags);
    fn end_query(&mut self, pool: &Rc<Self::QueryPool>, index: u32);
    fn write_timestamp_query(&mut self, pool: &Rc<Self::QueryPool>, index: u32);

    fn set_debug_marker(&mut self, name: &str);
    fn begin_debug_event(&mut self, name: &str);
    fn end_debug_event(&mut self);

    /// Executes a command buffer.
    ///
    /// # Panics
    ///
    /// Panics if the command buffer is empty.
    fn dispatch_command_buffer(&mut self, buffer: &CommandBuffer<Self>) {
        command::dispatch(self, buffer);
    }
}
