//! Shared ownership of the resources a resource group could bind.

use std::rc::Rc;

use super::buffer::{BufferDesc, BufferKind};
use super::device::Device;
use super::query::QueryType;
use super::root_signature::{DescriptorRangeType, RootSignatureDesc};
use super::texture::{TextureDesc, TextureDimension};

/// The type of a bindable resource.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    VertexBuffer,
    IndexBuffer,
    UniformBuffer,
    TextureBuffer,
    StructuredBuffer,
    IndirectBuffer,
    Texture1D,
    Texture1DArray,
    Texture2D,
    Texture2DArray,
    Texture3D,
    TextureCube,
    TextureCubeArray,
    SamplerState,
}

impl ResourceType {
    pub fn is_buffer(self) -> bool {
        match self {
            ResourceType::VertexBuffer
            | ResourceType::IndexBuffer
            | ResourceType::UniformBuffer
            | ResourceType::TextureBuffer
            | ResourceType::StructuredBuffer
            | ResourceType::IndirectBuffer => true,
            _ => false,
        }
    }

    pub fn is_texture(self) -> bool {
        !self.is_buffer() && self != ResourceType::SamplerState
    }

    /// Checks if a resource of this type could be bound into a descriptor range of
    /// `range_type`.
    pub fn is_compatible(self, range_type: DescriptorRangeType) -> bool {
        match range_type {
            DescriptorRangeType::Ubv => self == ResourceType::UniformBuffer,
            DescriptorRangeType::Sampler => self == ResourceType::SamplerState,
            DescriptorRangeType::Srv | DescriptorRangeType::Uav => {
                self != ResourceType::SamplerState && self != ResourceType::UniformBuffer
            }
        }
    }
}

impl From<BufferKind> for ResourceType {
    fn from(kind: BufferKind) -> Self {
        match kind {
            BufferKind::Vertex => ResourceType::VertexBuffer,
            BufferKind::Index(_) => ResourceType::IndexBuffer,
            BufferKind::Uniform => ResourceType::UniformBuffer,
            BufferKind::Texture(_) => ResourceType::TextureBuffer,
            BufferKind::Structured { .. } => ResourceType::StructuredBuffer,
            BufferKind::Indirect { .. } => ResourceType::IndirectBuffer,
        }
    }
}

impl From<TextureDimension> for ResourceType {
    fn from(dimension: TextureDimension) -> Self {
        match dimension {
            TextureDimension::D1 => ResourceType::Texture1D,
            TextureDimension::D1Array => ResourceType::Texture1DArray,
            TextureDimension::D2 => ResourceType::Texture2D,
            TextureDimension::D2Array => ResourceType::Texture2DArray,
            TextureDimension::D3 => ResourceType::Texture3D,
            TextureDimension::Cube => ResourceType::TextureCube,
            TextureDimension::CubeArray => ResourceType::TextureCubeArray,
        }
    }
}

pub trait BufferObject {
    fn desc(&self) -> &BufferDesc;
}

pub trait TextureObject {
    fn desc(&self) -> &TextureDesc;
}

pub trait RootSignatureObject {
    fn desc(&self) -> &RootSignatureDesc;
}

pub trait QueryPoolObject {
    fn query_type(&self) -> QueryType;
    fn number_of_queries(&self) -> u32;
}

/// A shared reference to any resource a resource group could hold.
pub enum Resource<D: Device> {
    Buffer(Rc<D::Buffer>),
    Texture(Rc<D::Texture>),
    SamplerState(Rc<D::SamplerState>),
}

impl<D: Device> Clone for Resource<D> {
    fn clone(&self) -> Self {
        match *self {
            Resource::Buffer(ref v) => Resource::Buffer(v.clone()),
            Resource::Texture(ref v) => Resource::Texture(v.clone()),
            Resource::SamplerState(ref v) => Resource::SamplerState(v.clone()),
        }
    }
}

impl<D: Device> Resource<D> {
    pub fn resource_type(&self) -> ResourceType {
        match *self {
            Resource::Buffer(ref v) => v.desc().kind.into(),
            Resource::Texture(ref v) => v.desc().dimension.into(),
            Resource::SamplerState(_) => ResourceType::SamplerState,
        }
    }

    /// Gets the number of strong references to the underlying resource.
    pub fn strong_count(&self) -> usize {
        match *self {
            Resource::Buffer(ref v) => Rc::strong_count(v),
            Resource::Texture(ref v) => Rc::strong_count(v),
            Resource::SamplerState(ref v) => Rc::strong_count(v),
        }
    }

    pub fn as_buffer(&self) -> Option<&Rc<D::Buffer>> {
        match *self {
            Resource::Buffer(ref v) => Some(v),
            _ => None,
        }
    }

    pub fn as_texture(&self) -> Option<&Rc<D::Texture>> {
        match *self {
            Resource::Texture(ref v) => Some(v),
            _ => None,
        }
    }

    pub fn as_sampler_state(&self) -> Option<&Rc<D::SamplerState>> {
        match *self {
            Resource::SamplerState(ref v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compatibility() {
        use self::DescriptorRangeType::*;

        assert!(ResourceType::UniformBuffer.is_compatible(Ubv));
        assert!(!ResourceType::UniformBuffer.is_compatible(Srv));
        assert!(!ResourceType::SamplerState.is_compatible(Ubv));
        assert!(ResourceType::SamplerState.is_compatible(Sampler));
        assert!(ResourceType::Texture2D.is_compatible(Srv));
        assert!(ResourceType::Texture2D.is_compatible(Uav));
        assert!(!ResourceType::Texture2D.is_compatible(Sampler));
        assert!(ResourceType::IndirectBuffer.is_compatible(Uav));
        assert!(ResourceType::StructuredBuffer.is_buffer());
        assert!(ResourceType::TextureCube.is_texture());
    }
}
