//! Texture descriptors. A texture is a container of one or more images, which could be
//! sampled by a shader, written as an unordered access view or rendered into.

use crate::errors::*;

/// List of all the possible texel formats.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum TextureFormat {
    R8,
    R8G8B8A8,
    R8G8B8A8Srgb,
    B8G8R8A8,
    R11G11B10F,
    R16G16B16A16F,
    R32G32B32A32F,
    R16F,
    R32F,
    R32Uint,
    R16Uint,
    R16Unorm,
    /// Depth values in floating point.
    D32Float,
    /// 24 bits of depth and 8 bits of stencil.
    D24S8,
    Bc1,
    Bc2,
    Bc3,
    Etc1,
}

impl TextureFormat {
    /// Returns the size in bytes of a texel, or a 4x4 block for compressed formats.
    pub fn size(self) -> u32 {
        match self {
            TextureFormat::R8 => 1,
            TextureFormat::R16F | TextureFormat::R16Uint | TextureFormat::R16Unorm => 2,
            TextureFormat::R8G8B8A8
            | TextureFormat::R8G8B8A8Srgb
            | TextureFormat::B8G8R8A8
            | TextureFormat::R11G11B10F
            | TextureFormat::R32F
            | TextureFormat::R32Uint
            | TextureFormat::D32Float
            | TextureFormat::D24S8 => 4,
            TextureFormat::R16G16B16A16F => 8,
            TextureFormat::R32G32B32A32F => 16,
            TextureFormat::Bc1 | TextureFormat::Etc1 => 8,
            TextureFormat::Bc2 | TextureFormat::Bc3 => 16,
        }
    }

    pub fn is_compressed(self) -> bool {
        match self {
            TextureFormat::Bc1 | TextureFormat::Bc2 | TextureFormat::Bc3 | TextureFormat::Etc1 => {
                true
            }
            _ => false,
        }
    }

    pub fn is_depth(self) -> bool {
        self == TextureFormat::D32Float || self == TextureFormat::D24S8
    }

    pub fn has_stencil(self) -> bool {
        self == TextureFormat::D24S8
    }

    /// Returns the number of bytes of one row of `width` texels.
    pub fn row_pitch(self, width: u32) -> u32 {
        if self.is_compressed() {
            ((width + 3) / 4) * self.size()
        } else {
            width * self.size()
        }
    }

    /// Returns the number of bytes of a `width`x`height` image.
    pub fn image_size(self, width: u32, height: u32) -> u32 {
        if self.is_compressed() {
            self.row_pitch(width) * ((height + 3) / 4)
        } else {
            self.row_pitch(width) * height
        }
    }
}

/// The dimensionality of a texture.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum TextureDimension {
    D1,
    D1Array,
    D2,
    D2Array,
    D3,
    Cube,
    CubeArray,
}

impl TextureDimension {
    pub fn is_array(self) -> bool {
        match self {
            TextureDimension::D1Array | TextureDimension::D2Array | TextureDimension::CubeArray => {
                true
            }
            _ => false,
        }
    }

    /// Number of faces of one array slice.
    pub fn faces(self) -> u32 {
        match self {
            TextureDimension::Cube | TextureDimension::CubeArray => 6,
            _ => 1,
        }
    }
}

/// Hint abouts the intended update strategy of the data.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum TextureUsage {
    /// The resource is initialized with data and cannot be changed later, this
    /// is the most common and most efficient usage.
    Immutable,
    /// The resource is GPU readable and writable.
    Default,
    /// The resource is initialized without data, but will be be updated by the
    /// CPU in each frame.
    Dynamic,
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub struct TextureFlags {
    /// The texture could be written by compute shaders (unordered access).
    pub unordered_access: bool,
    /// The texture is sampled by shaders.
    pub shader_resource: bool,
    /// The texture could be used as attachment of framebuffer.
    pub render_target: bool,
    /// Allocates a complete chain of mipmaps.
    pub mipmaps: bool,
    /// Generates the mipmaps from the uploaded base level.
    pub generate_mipmaps: bool,
    /// The data passed at creation contains all mipmaps, tightly packed.
    pub data_contains_mipmaps: bool,
}

/// The parameters of a texture object.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct TextureDesc {
    pub dimension: TextureDimension,
    pub format: TextureFormat,
    pub width: u32,
    /// 1 for 1D textures.
    pub height: u32,
    /// The depth of 3D textures, or the number of slices of array textures.
    pub depth: u32,
    pub flags: TextureFlags,
    pub usage: TextureUsage,
    /// Number of multisamples, 1 for regular textures.
    pub samples: u8,
}

impl Default for TextureDesc {
    fn default() -> Self {
        TextureDesc {
            dimension: TextureDimension::D2,
            format: TextureFormat::R8G8B8A8,
            width: 1,
            height: 1,
            depth: 1,
            flags: TextureFlags {
                shader_resource: true,
                ..TextureFlags::default()
            },
            usage: TextureUsage::Default,
            samples: 1,
        }
    }
}

impl TextureDesc {
    pub fn validate(&self, data: Option<&[u8]>) -> Result<()> {
        if self.width == 0 || self.height == 0 || self.depth == 0 {
            return Err(Error::InvalidDescriptor(format!(
                "zero sized texture {}x{}x{}",
                self.width, self.height, self.depth
            ))
            .into());
        }

        match self.dimension {
            TextureDimension::D1 | TextureDimension::D1Array if self.height != 1 => {
                return Err(Error::InvalidDescriptor(
                    "the height of 1D textures must be 1".into(),
                )
                .into());
            }
            TextureDimension::Cube | TextureDimension::CubeArray if self.width != self.height => {
                return Err(Error::InvalidDescriptor(
                    "the faces of cube textures must be square".into(),
                )
                .into());
            }
            _ => {}
        }

        if self.samples > 1 && (self.flags.mipmaps || self.dimension != TextureDimension::D2) {
            return Err(Error::InvalidDescriptor(
                "only 2D textures without mipmaps could be multisampled".into(),
            )
            .into());
        }

        if self.usage == TextureUsage::Immutable && data.is_none() {
            return Err(Error::InvalidDescriptor(
                "immutable textures must be initialized with data".into(),
            )
            .into());
        }

        if let Some(buf) = data {
            let len = self.data_size();
            if buf.len() < len {
                return Err(Error::InvalidDescriptor(format!(
                    "expects {} bytes of initial data, got {}",
                    len,
                    buf.len()
                ))
                .into());
            }
        }

        Ok(())
    }

    /// The number of mipmaps of this texture.
    pub fn mipmaps(&self) -> u32 {
        if self.flags.mipmaps || self.flags.generate_mipmaps {
            let depth = if self.dimension == TextureDimension::D3 {
                self.depth
            } else {
                1
            };

            number_of_mipmaps(self.width, self.height, depth)
        } else {
            1
        }
    }

    /// The number of array slices, 1 for non-array textures.
    pub fn array_slices(&self) -> u32 {
        if self.dimension.is_array() {
            self.depth
        } else {
            1
        }
    }

    /// Gets the dimensions of the mipmap at `level`.
    pub fn mipmap_dimensions(&self, level: u32) -> (u32, u32, u32) {
        let depth = if self.dimension == TextureDimension::D3 {
            (self.depth >> level).max(1)
        } else {
            self.depth
        };

        ((self.width >> level).max(1), (self.height >> level).max(1), depth)
    }

    /// The number of bytes the initial data is expected to have.
    pub fn data_size(&self) -> usize {
        let levels = if self.flags.data_contains_mipmaps {
            self.mipmaps()
        } else {
            1
        };

        (0..levels)
            .map(|level| {
                let (w, h, d) = self.mipmap_dimensions(level);
                (self.format.image_size(w, h) * d * self.dimension.faces()) as usize
            })
            .sum()
    }
}

/// Returns the number of mipmaps of a complete chain, including the base level.
pub fn number_of_mipmaps(width: u32, height: u32, depth: u32) -> u32 {
    let max = width.max(height).max(depth).max(1);
    32 - max.leading_zeros()
}

/// Splits tightly packed texture data into its mipmaps.
pub fn split_mipmaps<'a>(desc: &TextureDesc, data: Option<&'a [u8]>) -> Vec<&'a [u8]> {
    let data = match data {
        Some(v) => v,
        None => return Vec::new(),
    };

    let levels = if desc.flags.data_contains_mipmaps {
        desc.mipmaps()
    } else {
        1
    };

    let mut offset = 0;
    (0..levels)
        .map(|level| {
            let (w, h, d) = desc.mipmap_dimensions(level);
            let len = (desc.format.image_size(w, h) * d * desc.dimension.faces()) as usize;
            let v = &data[offset..offset + len];
            offset += len;
            v
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mipmaps() {
        assert_eq!(number_of_mipmaps(1, 1, 1), 1);
        assert_eq!(number_of_mipmaps(256, 256, 1), 9);
        assert_eq!(number_of_mipmaps(256, 17, 1), 9);
        assert_eq!(number_of_mipmaps(3, 5, 1), 3);
    }

    #[test]
    fn validate() {
        let mut desc = TextureDesc::default();
        desc.width = 4;
        desc.height = 4;
        assert!(desc.validate(None).is_ok());
        assert!(desc.validate(Some(&[0; 15])).is_err());
        assert!(desc.validate(Some(&[0; 64])).is_ok());

        desc.width = 0;
        assert!(desc.validate(None).is_err());

        desc.width = 4;
        desc.dimension = TextureDimension::Cube;
        desc.height = 8;
        assert!(desc.validate(None).is_err());

        desc.height = 4;
        assert_eq!(desc.data_size(), 4 * 4 * 4 * 6);
    }

    #[test]
    fn compressed() {
        assert_eq!(TextureFormat::Bc1.image_size(4, 4), 8);
        assert_eq!(TextureFormat::Bc1.image_size(5, 5), 32);
        assert_eq!(TextureFormat::Bc3.row_pitch(8), 32);
    }

    #[test]
    fn split() {
        let mut desc = TextureDesc::default();
        desc.width = 4;
        desc.height = 2;
        desc.flags.mipmaps = true;
        desc.flags.data_contains_mipmaps = true;

        let data = vec![0; desc.data_size()];
        let levels = split_mipmaps(&desc, Some(&data));
        let sizes: Vec<_> = levels.iter().map(|v| v.len()).collect();
        assert_eq!(sizes, vec![32, 8, 4]);

        desc.flags.data_contains_mipmaps = false;
        assert_eq!(split_mipmaps(&desc, Some(&data)).len(), 1);
        assert!(split_mipmaps(&desc, None).is_empty());
    }
}
