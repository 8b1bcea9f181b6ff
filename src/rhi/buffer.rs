//! Immutable or dynamic buffers, and the vertex layout that reads them.

use std::rc::Rc;

use crate::errors::*;

use super::device::Device;
use super::texture::TextureFormat;

/// Vertex indices can be either 16- or 32-bit.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum IndexFormat {
    U16,
    U32,
}

impl IndexFormat {
    #[inline]
    pub fn stride(self) -> u32 {
        match self {
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        }
    }
}

/// What a buffer object holds, and therefore how it could be bound.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum BufferKind {
    Vertex,
    Index(IndexFormat),
    Uniform,
    /// A buffer which is sampled as a one dimensional texture of `TextureFormat` texels.
    Texture(TextureFormat),
    /// An array of `stride` sized structures, accessed raw by shaders.
    Structured { stride: u32 },
    /// Arguments of indirect draws, `indexed` selects `DrawIndexedArguments` over `DrawArguments`.
    Indirect { indexed: bool },
}

/// Hint abouts the intended update strategy of the data.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum BufferUsage {
    /// Uploaded once, drawn many times.
    StaticDraw,
    StaticRead,
    StaticCopy,
    /// Updated by the CPU in each frame.
    StreamDraw,
    StreamRead,
    StreamCopy,
    /// Updated by the CPU infrequently.
    DynamicDraw,
    DynamicRead,
    DynamicCopy,
}

impl BufferUsage {
    pub fn is_static(self) -> bool {
        match self {
            BufferUsage::StaticDraw | BufferUsage::StaticRead | BufferUsage::StaticCopy => true,
            _ => false,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub struct BufferFlags {
    /// The buffer could be written by compute shaders.
    pub unordered_access: bool,
    /// The buffer is read by shaders.
    pub shader_resource: bool,
}

/// The parameters of a buffer object.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub struct BufferDesc {
    pub kind: BufferKind,
    /// The size in bytes.
    pub size: u32,
    pub usage: BufferUsage,
    pub flags: BufferFlags,
}

impl BufferDesc {
    pub fn new(kind: BufferKind, size: u32) -> Self {
        BufferDesc {
            kind,
            size,
            usage: BufferUsage::StaticDraw,
            flags: BufferFlags::default(),
        }
    }

    pub fn validate(&self, data: Option<&[u8]>) -> Result<()> {
        if self.size == 0 {
            return Err(Error::InvalidDescriptor("zero sized buffer".into()).into());
        }

        match self.kind {
            BufferKind::Structured { stride } if stride == 0 || self.size % stride != 0 => {
                return Err(Error::InvalidDescriptor(format!(
                    "the size {} of structured buffer is not a multiple of its stride {}",
                    self.size, stride
                ))
                .into());
            }
            BufferKind::Indirect { indexed } => {
                let stride = if indexed {
                    super::command::DrawIndexedArguments::SIZE
                } else {
                    super::command::DrawArguments::SIZE
                };

                if self.size as usize % stride != 0 {
                    return Err(Error::InvalidDescriptor(format!(
                        "the size {} of indirect buffer is not a multiple of {}",
                        self.size, stride
                    ))
                    .into());
                }
            }
            _ => {}
        }

        if let Some(buf) = data {
            if buf.len() > self.size as usize {
                return Err(Error::InvalidDescriptor(format!(
                    "{} bytes of initial data exceeds the buffer size {}",
                    buf.len(),
                    self.size
                ))
                .into());
            }
        }

        Ok(())
    }
}

/// The CPU access granted while a buffer is mapped.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum MapType {
    Read,
    Write,
    ReadWrite,
    /// Write access, the previous contents are undefined after mapping.
    WriteDiscard,
    /// Write access to regions the GPU is not reading, no synchronization at all.
    WriteNoOverwrite,
}

impl MapType {
    pub fn is_readable(self) -> bool {
        self == MapType::Read || self == MapType::ReadWrite
    }
}

/// A mapped region of CPU visible memory. The pointer is only valid until the resource
/// is unmapped.
#[derive(Debug, Copy, Clone)]
pub struct MappedSubresource {
    pub data: *mut u8,
    pub size: usize,
    pub row_pitch: u32,
    pub depth_pitch: u32,
}

impl MappedSubresource {
    /// Gets the mapped memory as a mutable slice.
    ///
    /// # Safety
    ///
    /// The resource must still be mapped and nobody else may access the same memory.
    pub unsafe fn as_slice_mut<'a>(&self) -> &'a mut [u8] {
        ::std::slice::from_raw_parts_mut(self.data, self.size)
    }
}

/// The data type in the vertex component.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum VertexAttributeFormat {
    Float1,
    Float2,
    Float3,
    Float4,
    R8G8B8A8Unorm,
    R8G8B8A8Uint,
    Short2,
    Short4,
    Uint1,
}

impl VertexAttributeFormat {
    /// The number of components.
    pub fn components(self) -> u32 {
        match self {
            VertexAttributeFormat::Float1 | VertexAttributeFormat::Uint1 => 1,
            VertexAttributeFormat::Float2 | VertexAttributeFormat::Short2 => 2,
            VertexAttributeFormat::Float3 => 3,
            VertexAttributeFormat::Float4
            | VertexAttributeFormat::R8G8B8A8Unorm
            | VertexAttributeFormat::R8G8B8A8Uint
            | VertexAttributeFormat::Short4 => 4,
        }
    }

    /// The size in bytes of one element.
    pub fn size(self) -> u32 {
        match self {
            VertexAttributeFormat::Float1 | VertexAttributeFormat::Uint1 => 4,
            VertexAttributeFormat::Float2 => 8,
            VertexAttributeFormat::Float3 => 12,
            VertexAttributeFormat::Float4 => 16,
            VertexAttributeFormat::R8G8B8A8Unorm | VertexAttributeFormat::R8G8B8A8Uint => 4,
            VertexAttributeFormat::Short2 => 4,
            VertexAttributeFormat::Short4 => 8,
        }
    }

    pub fn is_normalized(self) -> bool {
        self == VertexAttributeFormat::R8G8B8A8Unorm
    }

    /// The attribute is read as integers by shaders.
    pub fn is_integer(self) -> bool {
        self == VertexAttributeFormat::R8G8B8A8Uint || self == VertexAttributeFormat::Uint1
    }
}

/// The details of a vertex attribute.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct VertexAttribute {
    /// The name of the attribute inside shaders.
    pub name: String,
    pub format: VertexAttributeFormat,
    /// The index of the vertex buffer this attribute is read from.
    pub input_slot: u32,
    pub aligned_byte_offset: u32,
    pub stride_in_bytes: u32,
    /// 0 for per-vertex data, otherwise the number of instances each element is used for.
    pub instances_per_element: u32,
}

/// `VertexAttributes` defines how a vertex structure looks like.
#[derive(Debug, Default, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct VertexAttributes {
    pub attributes: Vec<VertexAttribute>,
}

impl VertexAttributes {
    pub fn new(attributes: Vec<VertexAttribute>) -> Self {
        VertexAttributes { attributes }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// The number of vertex buffers the attributes read from.
    pub fn number_of_slots(&self) -> u32 {
        self.attributes
            .iter()
            .map(|v| v.input_slot + 1)
            .max()
            .unwrap_or(0)
    }
}

/// One vertex buffer of a vertex array.
pub struct VertexArrayVertexBuffer<D: Device> {
    pub buffer: Rc<D::Buffer>,
}

impl<D: Device> Clone for VertexArrayVertexBuffer<D> {
    fn clone(&self) -> Self {
        VertexArrayVertexBuffer {
            buffer: self.buffer.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate() {
        let desc = BufferDesc::new(BufferKind::Structured { stride: 12 }, 48);
        assert!(desc.validate(None).is_ok());
        assert!(desc.validate(Some(&[0; 49])).is_err());

        let desc = BufferDesc::new(BufferKind::Structured { stride: 12 }, 50);
        assert!(desc.validate(None).is_err());

        let desc = BufferDesc::new(BufferKind::Indirect { indexed: false }, 48);
        assert!(desc.validate(None).is_ok());
        let desc = BufferDesc::new(BufferKind::Indirect { indexed: true }, 48);
        assert!(desc.validate(None).is_err());
    }

    #[test]
    fn slots() {
        let attr = |slot| VertexAttribute {
            name: "Position".into(),
            format: VertexAttributeFormat::Float3,
            input_slot: slot,
            aligned_byte_offset: 0,
            stride_in_bytes: 12,
            instances_per_element: 0,
        };

        assert_eq!(VertexAttributes::default().number_of_slots(), 0);
        assert_eq!(VertexAttributes::new(vec![attr(0), attr(2)]).number_of_slots(), 3);
    }
}
