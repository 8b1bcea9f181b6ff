//! Pipeline state descriptors. A pipeline state combines a root signature, a program
//! and the fixed-function state into one bindable unit.

use std::rc::Rc;

use smallvec::SmallVec;

use crate::errors::*;

use super::buffer::VertexAttributes;
use super::device::Device;
use super::texture::TextureFormat;

/// The maximum number of simultaneous render targets a pipeline state describes.
pub const MAX_RENDER_TARGETS: usize = 8;

/// Defines how the input vertex data is used to assemble primitives.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
    /// Patches with the given number of control points, requires tessellation.
    PatchList(u8),
}

impl PrimitiveTopology {
    /// The number of vertices per patch, 0 if this is not a patch list.
    pub fn patch_vertices(self) -> u32 {
        match self {
            PrimitiveTopology::PatchList(n) => u32::from(n),
            _ => 0,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum FillMode {
    Wireframe,
    Solid,
}

/// Specify whether front- or back-facing polygons can be culled.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// A pixel-wise comparison function.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum ComparisonFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Blend factors.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum Blend {
    Zero,
    One,
    SrcColor,
    InvSrcColor,
    SrcAlpha,
    InvSrcAlpha,
    DestAlpha,
    InvDestAlpha,
    DestColor,
    InvDestColor,
    SrcAlphaSat,
    BlendFactor,
    InvBlendFactor,
}

/// Specifies how incoming RGBA values (source) and the RGBA in framebuffer (destination)
/// are combined.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum BlendOp {
    Add,
    Subtract,
    RevSubtract,
    Min,
    Max,
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct RasterizerState {
    pub fill_mode: FillMode,
    pub cull_mode: CullMode,
    pub front_counter_clockwise: bool,
    pub depth_bias: i32,
    pub depth_bias_clamp: f32,
    pub slope_scaled_depth_bias: f32,
    pub depth_clip_enable: bool,
    pub multisample_enable: bool,
    pub antialiased_line_enable: bool,
    pub scissor_enable: bool,
}

impl Default for RasterizerState {
    fn default() -> Self {
        RasterizerState {
            fill_mode: FillMode::Solid,
            cull_mode: CullMode::Back,
            front_counter_clockwise: false,
            depth_bias: 0,
            depth_bias_clamp: 0.0,
            slope_scaled_depth_bias: 0.0,
            depth_clip_enable: true,
            multisample_enable: false,
            antialiased_line_enable: false,
            scissor_enable: false,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub struct DepthStencilState {
    pub depth_enable: bool,
    pub depth_write_mask: bool,
    pub depth_func: ComparisonFunc,
    pub stencil_enable: bool,
    pub stencil_read_mask: u8,
    pub stencil_write_mask: u8,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        DepthStencilState {
            depth_enable: true,
            depth_write_mask: true,
            depth_func: ComparisonFunc::Greater,
            stencil_enable: false,
            stencil_read_mask: 0xff,
            stencil_write_mask: 0xff,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub struct RenderTargetBlendDesc {
    pub blend_enable: bool,
    pub src_blend: Blend,
    pub dest_blend: Blend,
    pub blend_op: BlendOp,
    pub src_blend_alpha: Blend,
    pub dest_blend_alpha: Blend,
    pub blend_op_alpha: BlendOp,
    /// Bit 0 to 3 enable writing red, green, blue and alpha.
    pub render_target_write_mask: u8,
}

impl Default for RenderTargetBlendDesc {
    fn default() -> Self {
        RenderTargetBlendDesc {
            blend_enable: false,
            src_blend: Blend::One,
            dest_blend: Blend::Zero,
            blend_op: BlendOp::Add,
            src_blend_alpha: Blend::One,
            dest_blend_alpha: Blend::Zero,
            blend_op_alpha: BlendOp::Add,
            render_target_write_mask: 0xf,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub struct BlendState {
    pub alpha_to_coverage_enable: bool,
    /// Uses `render_target[i]` for render target `i` instead of `render_target[0]` for all.
    pub independent_blend_enable: bool,
    pub render_target: [RenderTargetBlendDesc; MAX_RENDER_TARGETS],
}

/// The formats of the attachments a pipeline state renders into.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct RenderPassDesc {
    pub color_formats: SmallVec<[TextureFormat; MAX_RENDER_TARGETS]>,
    pub depth_stencil_format: Option<TextureFormat>,
    pub samples: u8,
}

impl Default for RenderPassDesc {
    fn default() -> Self {
        let mut color_formats = SmallVec::new();
        color_formats.push(TextureFormat::R8G8B8A8);

        RenderPassDesc {
            color_formats,
            depth_stencil_format: Some(TextureFormat::D32Float),
            samples: 1,
        }
    }
}

/// The source of one shader stage.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub enum ShaderSource {
    Glsl(String),
    /// SPIR-V words.
    SpirV(Vec<u32>),
}

impl ShaderSource {
    pub fn is_empty(&self) -> bool {
        match *self {
            ShaderSource::Glsl(ref v) => v.trim().is_empty(),
            ShaderSource::SpirV(ref v) => v.is_empty(),
        }
    }
}

/// The stages of a graphics program.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct GraphicsShaderSources {
    pub vertex: ShaderSource,
    pub tessellation_control: Option<ShaderSource>,
    pub tessellation_evaluation: Option<ShaderSource>,
    pub geometry: Option<ShaderSource>,
    pub fragment: Option<ShaderSource>,
}

impl GraphicsShaderSources {
    pub fn new(vertex: ShaderSource, fragment: ShaderSource) -> Self {
        GraphicsShaderSources {
            vertex,
            tessellation_control: None,
            tessellation_evaluation: None,
            geometry: None,
            fragment: Some(fragment),
        }
    }

    /// Iterates over the present stages.
    pub fn stages(&self) -> impl Iterator<Item = &ShaderSource> {
        ::std::iter::once(&self.vertex)
            .chain(self.tessellation_control.iter())
            .chain(self.tessellation_evaluation.iter())
            .chain(self.geometry.iter())
            .chain(self.fragment.iter())
    }
}

/// The parameters of a graphics pipeline state object.
pub struct GraphicsPipelineStateDesc<D: Device> {
    pub root_signature: Rc<D::RootSignature>,
    pub program: Rc<D::GraphicsProgram>,
    pub vertex_attributes: VertexAttributes,
    pub primitive_topology: PrimitiveTopology,
    pub rasterizer: RasterizerState,
    pub depth_stencil: DepthStencilState,
    pub blend: BlendState,
    pub render_pass: RenderPassDesc,
}

impl<D: Device> GraphicsPipelineStateDesc<D> {
    pub fn new(root_signature: Rc<D::RootSignature>, program: Rc<D::GraphicsProgram>) -> Self {
        GraphicsPipelineStateDesc {
            root_signature,
            program,
            vertex_attributes: VertexAttributes::default(),
            primitive_topology: PrimitiveTopology::TriangleList,
            rasterizer: RasterizerState::default(),
            depth_stencil: DepthStencilState::default(),
            blend: BlendState::default(),
            render_pass: RenderPassDesc::default(),
        }
    }

    pub fn validate(&self, max_patch_vertices: u32, max_render_targets: u32) -> Result<()> {
        if let PrimitiveTopology::PatchList(n) = self.primitive_topology {
            if n == 0 || u32::from(n) > max_patch_vertices {
                return Err(Error::Unsupported(format!(
                    "Patch list with {} control points (max {})",
                    n, max_patch_vertices
                ))
                .into());
            }
        }

        if self.render_pass.color_formats.len() > max_render_targets as usize {
            return Err(Error::InvalidDescriptor(format!(
                "{} render targets exceed the maximum {}",
                self.render_pass.color_formats.len(),
                max_render_targets
            ))
            .into());
        }

        if self.render_pass.samples == 0 {
            return Err(Error::InvalidDescriptor("zero multisamples".into()).into());
        }

        Ok(())
    }
}
