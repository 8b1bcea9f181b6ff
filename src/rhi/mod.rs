//! The backend-agnostic half of the rendering hardware interface.
//!
//! Nothing in here talks to a driver. It describes the resources, the binding layout
//! and the commands, and it defines the [`Device`] contract every backend fulfills.

pub mod buffer;
pub mod capabilities;
pub mod command;
pub mod device;
pub mod framebuffer;
pub mod pipeline;
pub mod query;
pub mod resource;
pub mod root_signature;
pub mod sampler;
pub mod texture;

pub mod prelude {
    pub use super::buffer::{
        BufferDesc, BufferFlags, BufferKind, BufferUsage, IndexFormat, MapType,
        MappedSubresource, VertexArrayVertexBuffer, VertexAttribute, VertexAttributeFormat,
        VertexAttributes,
    };
    pub use super::capabilities::Capabilities;
    pub use super::command::{
        dispatch, Command, CommandBuffer, CommandFunction, DrawArguments, DrawIndexedArguments,
        DrawSource,
    };
    pub use super::device::{Device, ShaderLanguage};
    pub use super::framebuffer::{
        ClearFlags, FramebufferAttachment, RenderTarget, RenderTargetObject, ScissorRectangle,
        SwapChainDesc, Viewport,
    };
    pub use super::pipeline::{
        Blend, BlendOp, BlendState, ComparisonFunc, CullMode, DepthStencilState, FillMode,
        GraphicsPipelineStateDesc, GraphicsShaderSources, PrimitiveTopology, RasterizerState,
        RenderPassDesc, RenderTargetBlendDesc, ShaderSource,
    };
    pub use super::query::{
        PipelineStatisticsQueryResult, QueryControlFlags, QueryResultFlags, QueryType,
    };
    pub use super::resource::{
        BufferObject, QueryPoolObject, Resource, ResourceType, RootSignatureObject,
        TextureObject,
    };
    pub use super::root_signature::{
        DescriptorRange, DescriptorRangeType, RootParameter, RootSignatureDesc, ShaderVisibility,
    };
    pub use super::sampler::{Filter, SamplerStateDesc, TextureAddressMode};
    pub use super::texture::{TextureDesc, TextureDimension, TextureFlags, TextureFormat, TextureUsage};
}

pub use self::capabilities::Capabilities;
pub use self::device::Device;
