use gl;
use gl::types::*;

use crate::rhi::buffer::{BufferKind, BufferUsage, IndexFormat, MapType, VertexAttributeFormat};
use crate::rhi::pipeline::{Blend, BlendOp, ComparisonFunc, CullMode, FillMode, PrimitiveTopology};
use crate::rhi::query::PipelineStatisticsQueryResult;
use crate::rhi::sampler::{Filter, FilterMode, SamplerStateDesc, TextureAddressMode};
use crate::rhi::texture::{TextureDimension, TextureFormat};

// Enums introduced after the 4.5 core profile which the `gl` crate is generated for.
pub const TEXTURE_MAX_ANISOTROPY: GLenum = 0x84FE;
pub const MAX_TEXTURE_MAX_ANISOTROPY: GLenum = 0x84FF;

pub const VERTICES_SUBMITTED: GLenum = 0x82EE;
pub const PRIMITIVES_SUBMITTED: GLenum = 0x82EF;
pub const VERTEX_SHADER_INVOCATIONS: GLenum = 0x82F0;
pub const TESS_CONTROL_SHADER_PATCHES: GLenum = 0x82F1;
pub const TESS_EVALUATION_SHADER_INVOCATIONS: GLenum = 0x82F2;
pub const GEOMETRY_SHADER_PRIMITIVES_EMITTED: GLenum = 0x82F3;
pub const FRAGMENT_SHADER_INVOCATIONS: GLenum = 0x82F4;
pub const COMPUTE_SHADER_INVOCATIONS: GLenum = 0x82F5;
pub const CLIPPING_INPUT_PRIMITIVES: GLenum = 0x82F6;
pub const CLIPPING_OUTPUT_PRIMITIVES: GLenum = 0x82F7;
pub const GEOMETRY_SHADER_INVOCATIONS: GLenum = 0x887F;

pub const COMPRESSED_RGBA_S3TC_DXT1: GLenum = 0x83F1;
pub const COMPRESSED_RGBA_S3TC_DXT3: GLenum = 0x83F2;
pub const COMPRESSED_RGBA_S3TC_DXT5: GLenum = 0x83F3;

/// The query targets of one pipeline statistics query, in the order of the counters of
/// `PipelineStatisticsQueryResult`.
pub const PIPELINE_STATISTICS_TARGETS: [GLenum; PipelineStatisticsQueryResult::COUNTERS] = [
    VERTICES_SUBMITTED,
    PRIMITIVES_SUBMITTED,
    VERTEX_SHADER_INVOCATIONS,
    GEOMETRY_SHADER_INVOCATIONS,
    GEOMETRY_SHADER_PRIMITIVES_EMITTED,
    CLIPPING_INPUT_PRIMITIVES,
    CLIPPING_OUTPUT_PRIMITIVES,
    FRAGMENT_SHADER_INVOCATIONS,
    TESS_CONTROL_SHADER_PATCHES,
    TESS_EVALUATION_SHADER_INVOCATIONS,
    COMPUTE_SHADER_INVOCATIONS,
];

impl From<BufferUsage> for GLenum {
    fn from(usage: BufferUsage) -> Self {
        match usage {
            BufferUsage::StaticDraw => gl::STATIC_DRAW,
            BufferUsage::StaticRead => gl::STATIC_READ,
            BufferUsage::StaticCopy => gl::STATIC_COPY,
            BufferUsage::StreamDraw => gl::STREAM_DRAW,
            BufferUsage::StreamRead => gl::STREAM_READ,
            BufferUsage::StreamCopy => gl::STREAM_COPY,
            BufferUsage::DynamicDraw => gl::DYNAMIC_DRAW,
            BufferUsage::DynamicRead => gl::DYNAMIC_READ,
            BufferUsage::DynamicCopy => gl::DYNAMIC_COPY,
        }
    }
}

impl From<IndexFormat> for GLenum {
    fn from(format: IndexFormat) -> Self {
        match format {
            IndexFormat::U16 => gl::UNSIGNED_SHORT,
            IndexFormat::U32 => gl::UNSIGNED_INT,
        }
    }
}

impl From<ComparisonFunc> for GLenum {
    fn from(cmp: ComparisonFunc) -> Self {
        match cmp {
            ComparisonFunc::Never => gl::NEVER,
            ComparisonFunc::Less => gl::LESS,
            ComparisonFunc::Equal => gl::EQUAL,
            ComparisonFunc::LessEqual => gl::LEQUAL,
            ComparisonFunc::Greater => gl::GREATER,
            ComparisonFunc::NotEqual => gl::NOTEQUAL,
            ComparisonFunc::GreaterEqual => gl::GEQUAL,
            ComparisonFunc::Always => gl::ALWAYS,
        }
    }
}

impl From<Blend> for GLenum {
    fn from(factor: Blend) -> Self {
        match factor {
            Blend::Zero => gl::ZERO,
            Blend::One => gl::ONE,
            Blend::SrcColor => gl::SRC_COLOR,
            Blend::InvSrcColor => gl::ONE_MINUS_SRC_COLOR,
            Blend::SrcAlpha => gl::SRC_ALPHA,
            Blend::InvSrcAlpha => gl::ONE_MINUS_SRC_ALPHA,
            Blend::DestAlpha => gl::DST_ALPHA,
            Blend::InvDestAlpha => gl::ONE_MINUS_DST_ALPHA,
            Blend::DestColor => gl::DST_COLOR,
            Blend::InvDestColor => gl::ONE_MINUS_DST_COLOR,
            Blend::SrcAlphaSat => gl::SRC_ALPHA_SATURATE,
            Blend::BlendFactor => gl::CONSTANT_COLOR,
            Blend::InvBlendFactor => gl::ONE_MINUS_CONSTANT_COLOR,
        }
    }
}

impl From<BlendOp> for GLenum {
    fn from(op: BlendOp) -> Self {
        match op {
            BlendOp::Add => gl::FUNC_ADD,
            BlendOp::Subtract => gl::FUNC_SUBTRACT,
            BlendOp::RevSubtract => gl::FUNC_REVERSE_SUBTRACT,
            BlendOp::Min => gl::MIN,
            BlendOp::Max => gl::MAX,
        }
    }
}

impl From<PrimitiveTopology> for GLenum {
    fn from(topology: PrimitiveTopology) -> Self {
        match topology {
            PrimitiveTopology::PointList => gl::POINTS,
            PrimitiveTopology::LineList => gl::LINES,
            PrimitiveTopology::LineStrip => gl::LINE_STRIP,
            PrimitiveTopology::TriangleList => gl::TRIANGLES,
            PrimitiveTopology::TriangleStrip => gl::TRIANGLE_STRIP,
            PrimitiveTopology::PatchList(_) => gl::PATCHES,
        }
    }
}

impl From<FillMode> for GLenum {
    fn from(mode: FillMode) -> Self {
        match mode {
            FillMode::Wireframe => gl::LINE,
            FillMode::Solid => gl::FILL,
        }
    }
}

impl From<CullMode> for GLenum {
    fn from(mode: CullMode) -> Self {
        match mode {
            CullMode::Front => gl::FRONT,
            CullMode::Back | CullMode::None => gl::BACK,
        }
    }
}

impl From<TextureAddressMode> for GLenum {
    fn from(mode: TextureAddressMode) -> Self {
        match mode {
            TextureAddressMode::Wrap => gl::REPEAT,
            TextureAddressMode::Mirror => gl::MIRRORED_REPEAT,
            TextureAddressMode::Clamp => gl::CLAMP_TO_EDGE,
            TextureAddressMode::Border => gl::CLAMP_TO_BORDER,
            TextureAddressMode::MirrorOnce => gl::MIRROR_CLAMP_TO_EDGE,
        }
    }
}

/// Gets the (internal format, format, type) triple of a texel format.
pub fn texture_format(format: TextureFormat) -> (GLenum, GLenum, GLenum) {
    match format {
        TextureFormat::R8 => (gl::R8, gl::RED, gl::UNSIGNED_BYTE),
        TextureFormat::R8G8B8A8 => (gl::RGBA8, gl::RGBA, gl::UNSIGNED_BYTE),
        TextureFormat::R8G8B8A8Srgb => (gl::SRGB8_ALPHA8, gl::RGBA, gl::UNSIGNED_BYTE),
        TextureFormat::B8G8R8A8 => (gl::RGBA8, gl::BGRA, gl::UNSIGNED_BYTE),
        TextureFormat::R11G11B10F => (
            gl::R11F_G11F_B10F,
            gl::RGB,
            gl::UNSIGNED_INT_10F_11F_11F_REV,
        ),
        TextureFormat::R16G16B16A16F => (gl::RGBA16F, gl::RGBA, gl::HALF_FLOAT),
        TextureFormat::R32G32B32A32F => (gl::RGBA32F, gl::RGBA, gl::FLOAT),
        TextureFormat::R16F => (gl::R16F, gl::RED, gl::HALF_FLOAT),
        TextureFormat::R32F => (gl::R32F, gl::RED, gl::FLOAT),
        TextureFormat::R32Uint => (gl::R32UI, gl::RED_INTEGER, gl::UNSIGNED_INT),
        TextureFormat::R16Uint => (gl::R16UI, gl::RED_INTEGER, gl::UNSIGNED_SHORT),
        TextureFormat::R16Unorm => (gl::R16, gl::RED, gl::UNSIGNED_SHORT),
        TextureFormat::D32Float => (gl::DEPTH_COMPONENT32F, gl::DEPTH_COMPONENT, gl::FLOAT),
        TextureFormat::D24S8 => (
            gl::DEPTH24_STENCIL8,
            gl::DEPTH_STENCIL,
            gl::UNSIGNED_INT_24_8,
        ),
        TextureFormat::Bc1 => (COMPRESSED_RGBA_S3TC_DXT1, gl::RGBA, gl::UNSIGNED_BYTE),
        TextureFormat::Bc2 => (COMPRESSED_RGBA_S3TC_DXT3, gl::RGBA, gl::UNSIGNED_BYTE),
        TextureFormat::Bc3 => (COMPRESSED_RGBA_S3TC_DXT5, gl::RGBA, gl::UNSIGNED_BYTE),
        // ETC2 decoders are backward compatible with ETC1 data.
        TextureFormat::Etc1 => (gl::COMPRESSED_RGB8_ETC2, gl::RGB, gl::UNSIGNED_BYTE),
    }
}

/// Gets the texture target of a dimension.
pub fn texture_target(dimension: TextureDimension, samples: u8) -> GLenum {
    match dimension {
        TextureDimension::D1 => gl::TEXTURE_1D,
        TextureDimension::D1Array => gl::TEXTURE_1D_ARRAY,
        TextureDimension::D2 if samples > 1 => gl::TEXTURE_2D_MULTISAMPLE,
        TextureDimension::D2 => gl::TEXTURE_2D,
        TextureDimension::D2Array => gl::TEXTURE_2D_ARRAY,
        TextureDimension::D3 => gl::TEXTURE_3D,
        TextureDimension::Cube => gl::TEXTURE_CUBE_MAP,
        TextureDimension::CubeArray => gl::TEXTURE_CUBE_MAP_ARRAY,
    }
}

/// Gets the parameter name to query the texture bound to `target` of the active unit.
pub fn texture_binding(target: GLenum) -> GLenum {
    match target {
        gl::TEXTURE_1D => gl::TEXTURE_BINDING_1D,
        gl::TEXTURE_1D_ARRAY => gl::TEXTURE_BINDING_1D_ARRAY,
        gl::TEXTURE_2D_MULTISAMPLE => gl::TEXTURE_BINDING_2D_MULTISAMPLE,
        gl::TEXTURE_2D_ARRAY => gl::TEXTURE_BINDING_2D_ARRAY,
        gl::TEXTURE_3D => gl::TEXTURE_BINDING_3D,
        gl::TEXTURE_CUBE_MAP => gl::TEXTURE_BINDING_CUBE_MAP,
        gl::TEXTURE_CUBE_MAP_ARRAY => gl::TEXTURE_BINDING_CUBE_MAP_ARRAY,
        gl::TEXTURE_BUFFER => gl::TEXTURE_BINDING_BUFFER,
        _ => gl::TEXTURE_BINDING_2D,
    }
}

/// Gets the target a buffer is naturally bound to.
pub fn buffer_target(kind: BufferKind) -> GLenum {
    match kind {
        BufferKind::Vertex => gl::ARRAY_BUFFER,
        BufferKind::Index(_) => gl::ELEMENT_ARRAY_BUFFER,
        BufferKind::Uniform => gl::UNIFORM_BUFFER,
        BufferKind::Texture(_) => gl::TEXTURE_BUFFER,
        BufferKind::Structured { .. } => gl::SHADER_STORAGE_BUFFER,
        BufferKind::Indirect { .. } => gl::DRAW_INDIRECT_BUFFER,
    }
}

pub fn map_access(map_type: MapType) -> GLenum {
    match map_type {
        MapType::Read => gl::READ_ONLY,
        MapType::ReadWrite => gl::READ_WRITE,
        MapType::Write | MapType::WriteDiscard | MapType::WriteNoOverwrite => gl::WRITE_ONLY,
    }
}

/// Gets the (components, type) pair of a vertex attribute.
pub fn vertex_attribute_format(format: VertexAttributeFormat) -> (GLint, GLenum) {
    let ty = match format {
        VertexAttributeFormat::Float1
        | VertexAttributeFormat::Float2
        | VertexAttributeFormat::Float3
        | VertexAttributeFormat::Float4 => gl::FLOAT,
        VertexAttributeFormat::R8G8B8A8Unorm | VertexAttributeFormat::R8G8B8A8Uint => {
            gl::UNSIGNED_BYTE
        }
        VertexAttributeFormat::Short2 | VertexAttributeFormat::Short4 => gl::SHORT,
        VertexAttributeFormat::Uint1 => gl::UNSIGNED_INT,
    };

    (format.components() as GLint, ty)
}

/// Gets the (minification, magnification) filters.
pub fn filter(filter: Filter) -> (GLenum, GLenum) {
    let (min, mag, mip) = filter.modes();
    let min = match (min, mip) {
        (FilterMode::Nearest, FilterMode::Nearest) => gl::NEAREST_MIPMAP_NEAREST,
        (FilterMode::Nearest, FilterMode::Linear) => gl::NEAREST_MIPMAP_LINEAR,
        (FilterMode::Linear, FilterMode::Nearest) => gl::LINEAR_MIPMAP_NEAREST,
        (FilterMode::Linear, FilterMode::Linear) => gl::LINEAR_MIPMAP_LINEAR,
    };

    let mag = match mag {
        FilterMode::Nearest => gl::NEAREST,
        FilterMode::Linear => gl::LINEAR,
    };

    (min, mag)
}

/// A value of a sampler parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplerParameter {
    Int(GLenum, GLint),
    Float(GLenum, GLfloat),
    Color(GLenum, [GLfloat; 4]),
}

/// Lists the parameters of a sampler state, which are applied either to a sampler object
/// or directly to a texture.
pub fn sampler_parameters(desc: &SamplerStateDesc, max_anisotropy: f32) -> Vec<SamplerParameter> {
    let (min, mag) = filter(desc.filter);
    let mut params = vec![
        SamplerParameter::Int(gl::TEXTURE_MIN_FILTER, min as GLint),
        SamplerParameter::Int(gl::TEXTURE_MAG_FILTER, mag as GLint),
        SamplerParameter::Int(gl::TEXTURE_WRAP_S, GLenum::from(desc.address_u) as GLint),
        SamplerParameter::Int(gl::TEXTURE_WRAP_T, GLenum::from(desc.address_v) as GLint),
        SamplerParameter::Int(gl::TEXTURE_WRAP_R, GLenum::from(desc.address_w) as GLint),
        SamplerParameter::Float(gl::TEXTURE_LOD_BIAS, desc.mip_lod_bias),
        SamplerParameter::Float(gl::TEXTURE_MIN_LOD, desc.min_lod),
        SamplerParameter::Float(gl::TEXTURE_MAX_LOD, desc.max_lod),
        SamplerParameter::Color(gl::TEXTURE_BORDER_COLOR, desc.border_color),
    ];

    if desc.filter.is_comparison() {
        params.push(SamplerParameter::Int(
            gl::TEXTURE_COMPARE_MODE,
            gl::COMPARE_REF_TO_TEXTURE as GLint,
        ));
        params.push(SamplerParameter::Int(
            gl::TEXTURE_COMPARE_FUNC,
            GLenum::from(desc.comparison_func) as GLint,
        ));
    } else {
        params.push(SamplerParameter::Int(gl::TEXTURE_COMPARE_MODE, gl::NONE as GLint));
    }

    if desc.filter.is_anisotropic() && max_anisotropy > 1.0 {
        let v = (desc.max_anisotropy.max(1) as f32).min(max_anisotropy);
        params.push(SamplerParameter::Float(TEXTURE_MAX_ANISOTROPY, v));
    }

    params
}

pub fn error_string(err: GLenum) -> &'static str {
    match err {
        gl::INVALID_ENUM => "An unacceptable value is specified for an enumerated argument.",
        gl::INVALID_VALUE => "A numeric argument is out of range.",
        gl::INVALID_OPERATION => "The specified operation is not allowed in the current state.",
        gl::INVALID_FRAMEBUFFER_OPERATION => {
            "The command is trying to render to or read from the framebuffer while the \
             currently bound framebuffer is not framebuffer complete."
        }
        gl::OUT_OF_MEMORY => "There is not enough memory left to execute the command.",
        _ => "Oops, Unknown OpenGL error.",
    }
}

pub fn framebuffer_status_string(status: GLenum) -> &'static str {
    match status {
        gl::FRAMEBUFFER_UNDEFINED => "The default framebuffer does not exist.",
        gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => "Some attachment points are incomplete.",
        gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => "No images are attached.",
        gl::FRAMEBUFFER_UNSUPPORTED => "The combination of internal formats is unsupported.",
        gl::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => "The attachments disagree on multisamples.",
        gl::FRAMEBUFFER_INCOMPLETE_LAYER_TARGETS => "The attachments disagree on layering.",
        _ => "Unknown framebuffer status.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters() {
        assert_eq!(filter(Filter::Point), (gl::NEAREST_MIPMAP_NEAREST, gl::NEAREST));
        assert_eq!(filter(Filter::Bilinear), (gl::LINEAR_MIPMAP_NEAREST, gl::LINEAR));
        assert_eq!(filter(Filter::Anisotropic), (gl::LINEAR_MIPMAP_LINEAR, gl::LINEAR));
    }

    #[test]
    fn anisotropy() {
        let mut desc = SamplerStateDesc::default();
        desc.filter = Filter::Anisotropic;
        desc.max_anisotropy = 32;

        let params = sampler_parameters(&desc, 16.0);
        assert!(params.contains(&SamplerParameter::Float(TEXTURE_MAX_ANISOTROPY, 16.0)));

        let params = sampler_parameters(&desc, 1.0);
        assert!(params.iter().all(|v| match *v {
            SamplerParameter::Float(name, _) => name != TEXTURE_MAX_ANISOTROPY,
            _ => true,
        }));
    }
}
