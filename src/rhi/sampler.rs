//! Sampler states, the way textures are filtered and addressed when sampled.

use super::pipeline::ComparisonFunc;

/// Specify how the texture is used whenever the pixel being sampled.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum Filter {
    /// Nearest texel of the nearest mipmap.
    Point,
    /// Weighted average of the four nearest texels of the nearest mipmap.
    Bilinear,
    /// Weighted average of the two nearest mipmaps.
    Trilinear,
    Anisotropic,
    ComparisonPoint,
    ComparisonBilinear,
    ComparisonTrilinear,
    ComparisonAnisotropic,
}

/// The filter of one sampling stage.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FilterMode {
    Nearest,
    Linear,
}

impl Filter {
    pub fn is_comparison(self) -> bool {
        match self {
            Filter::ComparisonPoint
            | Filter::ComparisonBilinear
            | Filter::ComparisonTrilinear
            | Filter::ComparisonAnisotropic => true,
            _ => false,
        }
    }

    pub fn is_anisotropic(self) -> bool {
        self == Filter::Anisotropic || self == Filter::ComparisonAnisotropic
    }

    /// Returns the (minification, magnification, mipmap) filters.
    pub fn modes(self) -> (FilterMode, FilterMode, FilterMode) {
        match self {
            Filter::Point | Filter::ComparisonPoint => {
                (FilterMode::Nearest, FilterMode::Nearest, FilterMode::Nearest)
            }
            Filter::Bilinear | Filter::ComparisonBilinear => {
                (FilterMode::Linear, FilterMode::Linear, FilterMode::Nearest)
            }
            _ => (FilterMode::Linear, FilterMode::Linear, FilterMode::Linear),
        }
    }
}

/// Sets the wrap parameter for texture.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum TextureAddressMode {
    /// Samples at coord x + 1 map to coord x.
    Wrap,
    /// Samples at coord x + 1 map to coord 1 - x.
    Mirror,
    /// Samples at coord x + 1 map to coord 1.
    Clamp,
    /// Samples outside of [0, 1] return the border color.
    Border,
    /// Same as Mirror, but only for one repetition.
    MirrorOnce,
}

/// The parameters of a sampler state object.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct SamplerStateDesc {
    pub filter: Filter,
    pub address_u: TextureAddressMode,
    pub address_v: TextureAddressMode,
    pub address_w: TextureAddressMode,
    pub mip_lod_bias: f32,
    /// Clamped to the maximum anisotropy of the device.
    pub max_anisotropy: u32,
    /// Only used by comparison filters.
    pub comparison_func: ComparisonFunc,
    pub border_color: [f32; 4],
    pub min_lod: f32,
    pub max_lod: f32,
}

impl Default for SamplerStateDesc {
    fn default() -> Self {
        SamplerStateDesc {
            filter: Filter::Trilinear,
            address_u: TextureAddressMode::Wrap,
            address_v: TextureAddressMode::Wrap,
            address_w: TextureAddressMode::Wrap,
            mip_lod_bias: 0.0,
            max_anisotropy: 1,
            comparison_func: ComparisonFunc::Never,
            border_color: [0.0, 0.0, 0.0, 0.0],
            min_lod: -1000.0,
            max_lod: 1000.0,
        }
    }
}
