use ash::vk;

use crate::rhi::buffer::{BufferKind, IndexFormat, VertexAttributeFormat};
use crate::rhi::pipeline::{Blend, BlendOp, ComparisonFunc, CullMode, FillMode, PrimitiveTopology};
use crate::rhi::query::QueryType;
use crate::rhi::resource::ResourceType;
use crate::rhi::root_signature::{DescriptorRange, DescriptorRangeType, ShaderVisibility};
use crate::rhi::sampler::{FilterMode, TextureAddressMode};
use crate::rhi::texture::{TextureDimension, TextureFlags, TextureFormat};

/// Every statistic a pipeline statistics query counts. The results are written in bit
/// order, which is the counter order of `PipelineStatisticsQueryResult`.
pub const PIPELINE_STATISTICS: vk::QueryPipelineStatisticFlags =
    vk::QueryPipelineStatisticFlags::from_raw(0x7FF);

impl From<TextureFormat> for vk::Format {
    fn from(format: TextureFormat) -> Self {
        match format {
            TextureFormat::R8 => vk::Format::R8_UNORM,
            TextureFormat::R8G8B8A8 => vk::Format::R8G8B8A8_UNORM,
            TextureFormat::R8G8B8A8Srgb => vk::Format::R8G8B8A8_SRGB,
            TextureFormat::B8G8R8A8 => vk::Format::B8G8R8A8_UNORM,
            TextureFormat::R11G11B10F => vk::Format::B10G11R11_UFLOAT_PACK32,
            TextureFormat::R16G16B16A16F => vk::Format::R16G16B16A16_SFLOAT,
            TextureFormat::R32G32B32A32F => vk::Format::R32G32B32A32_SFLOAT,
            TextureFormat::R16F => vk::Format::R16_SFLOAT,
            TextureFormat::R32F => vk::Format::R32_SFLOAT,
            TextureFormat::R32Uint => vk::Format::R32_UINT,
            TextureFormat::R16Uint => vk::Format::R16_UINT,
            TextureFormat::R16Unorm => vk::Format::R16_UNORM,
            TextureFormat::D32Float => vk::Format::D32_SFLOAT,
            TextureFormat::D24S8 => vk::Format::D24_UNORM_S8_UINT,
            TextureFormat::Bc1 => vk::Format::BC1_RGBA_UNORM_BLOCK,
            TextureFormat::Bc2 => vk::Format::BC2_UNORM_BLOCK,
            TextureFormat::Bc3 => vk::Format::BC3_UNORM_BLOCK,
            // ETC1 is a subset of ETC2.
            TextureFormat::Etc1 => vk::Format::ETC2_R8G8B8_UNORM_BLOCK,
        }
    }
}

pub fn aspect_mask(format: TextureFormat) -> vk::ImageAspectFlags {
    if format.has_stencil() {
        vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
    } else if format.is_depth() {
        vk::ImageAspectFlags::DEPTH
    } else {
        vk::ImageAspectFlags::COLOR
    }
}

/// Views which are sampled could only read the depth of depth stencil formats.
pub fn view_aspect_mask(format: TextureFormat) -> vk::ImageAspectFlags {
    if format.is_depth() {
        vk::ImageAspectFlags::DEPTH
    } else {
        vk::ImageAspectFlags::COLOR
    }
}

/// Textures could always be sampled and copied. The layout they rest in between
/// commands is `steady_layout`.
pub fn image_usage(format: TextureFormat, flags: &TextureFlags) -> vk::ImageUsageFlags {
    let mut usage = vk::ImageUsageFlags::SAMPLED
        | vk::ImageUsageFlags::TRANSFER_SRC
        | vk::ImageUsageFlags::TRANSFER_DST;

    if flags.unordered_access {
        usage |= vk::ImageUsageFlags::STORAGE;
    }

    if flags.render_target {
        usage |= if format.is_depth() {
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT
        } else {
            vk::ImageUsageFlags::COLOR_ATTACHMENT
        };
    }

    usage
}

pub fn steady_layout(flags: &TextureFlags) -> vk::ImageLayout {
    if flags.unordered_access {
        vk::ImageLayout::GENERAL
    } else {
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
    }
}

/// Vulkan only knows three border colors, picks the closest one.
pub fn border_color(color: [f32; 4]) -> vk::BorderColor {
    if color[3] < 0.5 {
        vk::BorderColor::FLOAT_TRANSPARENT_BLACK
    } else if color[0] + color[1] + color[2] < 1.5 {
        vk::BorderColor::FLOAT_OPAQUE_BLACK
    } else {
        vk::BorderColor::FLOAT_OPAQUE_WHITE
    }
}

impl From<QueryType> for vk::QueryType {
    fn from(query_type: QueryType) -> Self {
        match query_type {
            QueryType::Occlusion => vk::QueryType::OCCLUSION,
            QueryType::PipelineStatistics => vk::QueryType::PIPELINE_STATISTICS,
            QueryType::Timestamp => vk::QueryType::TIMESTAMP,
        }
    }
}

impl From<VertexAttributeFormat> for vk::Format {
    fn from(format: VertexAttributeFormat) -> Self {
        match format {
            VertexAttributeFormat::Float1 => vk::Format::R32_SFLOAT,
            VertexAttributeFormat::Float2 => vk::Format::R32G32_SFLOAT,
            VertexAttributeFormat::Float3 => vk::Format::R32G32B32_SFLOAT,
            VertexAttributeFormat::Float4 => vk::Format::R32G32B32A32_SFLOAT,
            VertexAttributeFormat::R8G8B8A8Unorm => vk::Format::R8G8B8A8_UNORM,
            VertexAttributeFormat::R8G8B8A8Uint => vk::Format::R8G8B8A8_UINT,
            VertexAttributeFormat::Short2 => vk::Format::R16G16_SINT,
            VertexAttributeFormat::Short4 => vk::Format::R16G16B16A16_SINT,
            VertexAttributeFormat::Uint1 => vk::Format::R32_UINT,
        }
    }
}

impl From<IndexFormat> for vk::IndexType {
    fn from(format: IndexFormat) -> Self {
        match format {
            IndexFormat::U16 => vk::IndexType::UINT16,
            IndexFormat::U32 => vk::IndexType::UINT32,
        }
    }
}

impl From<PrimitiveTopology> for vk::PrimitiveTopology {
    fn from(topology: PrimitiveTopology) -> Self {
        match topology {
            PrimitiveTopology::PointList => vk::PrimitiveTopology::POINT_LIST,
            PrimitiveTopology::LineList => vk::PrimitiveTopology::LINE_LIST,
            PrimitiveTopology::LineStrip => vk::PrimitiveTopology::LINE_STRIP,
            PrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
            PrimitiveTopology::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
            PrimitiveTopology::PatchList(_) => vk::PrimitiveTopology::PATCH_LIST,
        }
    }
}

impl From<FillMode> for vk::PolygonMode {
    fn from(mode: FillMode) -> Self {
        match mode {
            FillMode::Wireframe => vk::PolygonMode::LINE,
            FillMode::Solid => vk::PolygonMode::FILL,
        }
    }
}

impl From<CullMode> for vk::CullModeFlags {
    fn from(mode: CullMode) -> Self {
        match mode {
            CullMode::None => vk::CullModeFlags::NONE,
            CullMode::Front => vk::CullModeFlags::FRONT,
            CullMode::Back => vk::CullModeFlags::BACK,
        }
    }
}

impl From<ComparisonFunc> for vk::CompareOp {
    fn from(func: ComparisonFunc) -> Self {
        match func {
            ComparisonFunc::Never => vk::CompareOp::NEVER,
            ComparisonFunc::Less => vk::CompareOp::LESS,
            ComparisonFunc::Equal => vk::CompareOp::EQUAL,
            ComparisonFunc::LessEqual => vk::CompareOp::LESS_OR_EQUAL,
            ComparisonFunc::Greater => vk::CompareOp::GREATER,
            ComparisonFunc::NotEqual => vk::CompareOp::NOT_EQUAL,
            ComparisonFunc::GreaterEqual => vk::CompareOp::GREATER_OR_EQUAL,
            ComparisonFunc::Always => vk::CompareOp::ALWAYS,
        }
    }
}

impl From<Blend> for vk::BlendFactor {
    fn from(blend: Blend) -> Self {
        match blend {
            Blend::Zero => vk::BlendFactor::ZERO,
            Blend::One => vk::BlendFactor::ONE,
            Blend::SrcColor => vk::BlendFactor::SRC_COLOR,
            Blend::InvSrcColor => vk::BlendFactor::ONE_MINUS_SRC_COLOR,
            Blend::SrcAlpha => vk::BlendFactor::SRC_ALPHA,
            Blend::InvSrcAlpha => vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
            Blend::DestAlpha => vk::BlendFactor::DST_ALPHA,
            Blend::InvDestAlpha => vk::BlendFactor::ONE_MINUS_DST_ALPHA,
            Blend::DestColor => vk::BlendFactor::DST_COLOR,
            Blend::InvDestColor => vk::BlendFactor::ONE_MINUS_DST_COLOR,
            Blend::SrcAlphaSat => vk::BlendFactor::SRC_ALPHA_SATURATE,
            Blend::BlendFactor => vk::BlendFactor::CONSTANT_COLOR,
            Blend::InvBlendFactor => vk::BlendFactor::ONE_MINUS_CONSTANT_COLOR,
        }
    }
}

impl From<BlendOp> for vk::BlendOp {
    fn from(op: BlendOp) -> Self {
        match op {
            BlendOp::Add => vk::BlendOp::ADD,
            BlendOp::Subtract => vk::BlendOp::SUBTRACT,
            BlendOp::RevSubtract => vk::BlendOp::REVERSE_SUBTRACT,
            BlendOp::Min => vk::BlendOp::MIN,
            BlendOp::Max => vk::BlendOp::MAX,
        }
    }
}

impl From<FilterMode> for vk::Filter {
    fn from(mode: FilterMode) -> Self {
        match mode {
            FilterMode::Nearest => vk::Filter::NEAREST,
            FilterMode::Linear => vk::Filter::LINEAR,
        }
    }
}

impl From<FilterMode> for vk::SamplerMipmapMode {
    fn from(mode: FilterMode) -> Self {
        match mode {
            FilterMode::Nearest => vk::SamplerMipmapMode::NEAREST,
            FilterMode::Linear => vk::SamplerMipmapMode::LINEAR,
        }
    }
}

impl From<TextureAddressMode> for vk::SamplerAddressMode {
    fn from(mode: TextureAddressMode) -> Self {
        match mode {
            TextureAddressMode::Wrap => vk::SamplerAddressMode::REPEAT,
            TextureAddressMode::Mirror => vk::SamplerAddressMode::MIRRORED_REPEAT,
            TextureAddressMode::Clamp => vk::SamplerAddressMode::CLAMP_TO_EDGE,
            TextureAddressMode::Border => vk::SamplerAddressMode::CLAMP_TO_BORDER,
            TextureAddressMode::MirrorOnce => vk::SamplerAddressMode::MIRROR_CLAMP_TO_EDGE,
        }
    }
}

impl From<ShaderVisibility> for vk::ShaderStageFlags {
    fn from(visibility: ShaderVisibility) -> Self {
        match visibility {
            ShaderVisibility::All => vk::ShaderStageFlags::ALL,
            ShaderVisibility::AllGraphics => vk::ShaderStageFlags::ALL_GRAPHICS,
            ShaderVisibility::Vertex => vk::ShaderStageFlags::VERTEX,
            ShaderVisibility::TessellationControl => vk::ShaderStageFlags::TESSELLATION_CONTROL,
            ShaderVisibility::TessellationEvaluation => {
                vk::ShaderStageFlags::TESSELLATION_EVALUATION
            }
            ShaderVisibility::Geometry => vk::ShaderStageFlags::GEOMETRY,
            ShaderVisibility::Fragment => vk::ShaderStageFlags::FRAGMENT,
            ShaderVisibility::Compute => vk::ShaderStageFlags::COMPUTE,
        }
    }
}

/// Gets the descriptor type a range is declared with. Every buffer which is not a
/// uniform or texture buffer is read raw as a storage buffer.
pub fn descriptor_type(range: &DescriptorRange) -> vk::DescriptorType {
    match (range.range_type, range.resource_type) {
        (DescriptorRangeType::Ubv, _) => vk::DescriptorType::UNIFORM_BUFFER,
        (DescriptorRangeType::Sampler, _) => vk::DescriptorType::SAMPLER,
        (DescriptorRangeType::Srv, ResourceType::TextureBuffer) => {
            vk::DescriptorType::UNIFORM_TEXEL_BUFFER
        }
        (DescriptorRangeType::Uav, ResourceType::TextureBuffer) => {
            vk::DescriptorType::STORAGE_TEXEL_BUFFER
        }
        (_, ty) if ty.is_buffer() => vk::DescriptorType::STORAGE_BUFFER,
        (DescriptorRangeType::Uav, _) => vk::DescriptorType::STORAGE_IMAGE,
        _ => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
    }
}

pub fn sample_count(samples: u8) -> vk::SampleCountFlags {
    match samples {
        0 | 1 => vk::SampleCountFlags::TYPE_1,
        2 => vk::SampleCountFlags::TYPE_2,
        3..=4 => vk::SampleCountFlags::TYPE_4,
        5..=8 => vk::SampleCountFlags::TYPE_8,
        9..=16 => vk::SampleCountFlags::TYPE_16,
        17..=32 => vk::SampleCountFlags::TYPE_32,
        _ => vk::SampleCountFlags::TYPE_64,
    }
}

/// The largest sample count in a set of supported counts.
pub fn max_sample_count(counts: vk::SampleCountFlags) -> i64 {
    let raw = counts.as_raw();
    if raw == 0 {
        1
    } else {
        1 << (31 - raw.leading_zeros())
    }
}

/// Every buffer could be copied and read raw by shaders, next to the usage its kind needs.
pub fn buffer_usage(kind: BufferKind) -> vk::BufferUsageFlags {
    let usage = match kind {
        BufferKind::Vertex => {
            vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::STORAGE_BUFFER
        }
        BufferKind::Index(_) => {
            vk::BufferUsageFlags::INDEX_BUFFER | vk::BufferUsageFlags::STORAGE_BUFFER
        }
        BufferKind::Uniform => vk::BufferUsageFlags::UNIFORM_BUFFER,
        BufferKind::Texture(_) => {
            vk::BufferUsageFlags::UNIFORM_TEXEL_BUFFER | vk::BufferUsageFlags::STORAGE_TEXEL_BUFFER
        }
        BufferKind::Structured { .. } => vk::BufferUsageFlags::STORAGE_BUFFER,
        BufferKind::Indirect { .. } => {
            vk::BufferUsageFlags::INDIRECT_BUFFER | vk::BufferUsageFlags::STORAGE_BUFFER
        }
    };

    usage | vk::BufferUsageFlags::TRANSFER_SRC | vk::BufferUsageFlags::TRANSFER_DST
}

pub fn image_type(dimension: TextureDimension) -> vk::ImageType {
    match dimension {
        TextureDimension::D1 | TextureDimension::D1Array => vk::ImageType::TYPE_1D,
        TextureDimension::D3 => vk::ImageType::TYPE_3D,
        _ => vk::ImageType::TYPE_2D,
    }
}

pub fn image_view_type(dimension: TextureDimension) -> vk::ImageViewType {
    match dimension {
        TextureDimension::D1 => vk::ImageViewType::TYPE_1D,
        TextureDimension::D1Array => vk::ImageViewType::TYPE_1D_ARRAY,
        TextureDimension::D2 => vk::ImageViewType::TYPE_2D,
        TextureDimension::D2Array => vk::ImageViewType::TYPE_2D_ARRAY,
        TextureDimension::D3 => vk::ImageViewType::TYPE_3D,
        TextureDimension::Cube => vk::ImageViewType::CUBE,
        TextureDimension::CubeArray => vk::ImageViewType::CUBE_ARRAY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_types() {
        let range = |range_type, resource_type| {
            let range = DescriptorRange::new(
                range_type,
                0,
                "v",
                resource_type,
                ShaderVisibility::All,
            );
            descriptor_type(&range)
        };

        assert_eq!(
            range(DescriptorRangeType::Ubv, ResourceType::UniformBuffer),
            vk::DescriptorType::UNIFORM_BUFFER
        );
        assert_eq!(
            range(DescriptorRangeType::Srv, ResourceType::VertexBuffer),
            vk::DescriptorType::STORAGE_BUFFER
        );
        assert_eq!(
            range(DescriptorRangeType::Srv, ResourceType::IndirectBuffer),
            vk::DescriptorType::STORAGE_BUFFER
        );
        assert_eq!(
            range(DescriptorRangeType::Srv, ResourceType::TextureBuffer),
            vk::DescriptorType::UNIFORM_TEXEL_BUFFER
        );
        assert_eq!(
            range(DescriptorRangeType::Uav, ResourceType::TextureBuffer),
            vk::DescriptorType::STORAGE_TEXEL_BUFFER
        );
        assert_eq!(
            range(DescriptorRangeType::Srv, ResourceType::Texture2D),
            vk::DescriptorType::COMBINED_IMAGE_SAMPLER
        );
        assert_eq!(
            range(DescriptorRangeType::Uav, ResourceType::Texture3D),
            vk::DescriptorType::STORAGE_IMAGE
        );
        assert_eq!(
            range(DescriptorRangeType::Sampler, ResourceType::SamplerState),
            vk::DescriptorType::SAMPLER
        );
    }

    #[test]
    fn samples() {
        assert_eq!(sample_count(1), vk::SampleCountFlags::TYPE_1);
        assert_eq!(sample_count(4), vk::SampleCountFlags::TYPE_4);
        assert_eq!(
            max_sample_count(vk::SampleCountFlags::TYPE_1 | vk::SampleCountFlags::TYPE_8),
            8
        );
        assert_eq!(max_sample_count(vk::SampleCountFlags::empty()), 1);
    }

    #[test]
    fn border_colors() {
        assert_eq!(border_color([0.0; 4]), vk::BorderColor::FLOAT_TRANSPARENT_BLACK);
        assert_eq!(
            border_color([0.1, 0.0, 0.0, 1.0]),
            vk::BorderColor::FLOAT_OPAQUE_BLACK
        );
        assert_eq!(border_color([1.0; 4]), vk::BorderColor::FLOAT_OPAQUE_WHITE);
    }
}
