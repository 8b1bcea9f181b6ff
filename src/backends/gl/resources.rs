use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gl::types::*;

use crate::rhi::buffer::{BufferDesc, IndexFormat};
use crate::rhi::framebuffer::{RenderTargetObject, SwapChainDesc};
use crate::rhi::query::{PipelineStatisticsQueryResult, QueryType};
use crate::rhi::resource::{BufferObject, QueryPoolObject, TextureObject};
use crate::rhi::sampler::SamplerStateDesc;
use crate::rhi::texture::TextureDesc;
use crate::window::{self, WindowSource};

use super::api::GlApi;
use super::types::SamplerParameter;

pub struct GlBuffer<G: GlApi> {
    pub(crate) gl: Rc<G>,
    /// 0 if the buffer only lives in the shadow copy.
    pub(crate) id: GLuint,
    /// The `GL_TEXTURE_BUFFER` view of texture buffers.
    pub(crate) texture_id: GLuint,
    pub(crate) desc: BufferDesc,
    /// CPU copy of indirect buffers on contexts without draw indirect.
    pub(crate) shadow: Option<RefCell<Vec<u8>>>,
}

impl<G: GlApi> GlBuffer<G> {
    #[inline]
    pub fn id(&self) -> GLuint {
        self.id
    }

    #[inline]
    pub fn texture_id(&self) -> GLuint {
        self.texture_id
    }

    #[inline]
    pub fn is_shadowed(&self) -> bool {
        self.shadow.is_some()
    }
}

impl<G: GlApi> BufferObject for GlBuffer<G> {
    fn desc(&self) -> &BufferDesc {
        &self.desc
    }
}

impl<G: GlApi> Drop for GlBuffer<G> {
    fn drop(&mut self) {
        unsafe {
            if self.texture_id != 0 {
                self.gl.delete_texture(self.texture_id);
            }

            if self.id != 0 {
                self.gl.delete_buffer(self.id);
            }
        }
    }
}

pub struct GlTexture<G: GlApi> {
    pub(crate) gl: Rc<G>,
    pub(crate) id: GLuint,
    pub(crate) target: GLenum,
    pub(crate) desc: TextureDesc,
    pub(crate) internal_format: GLenum,
}

impl<G: GlApi> GlTexture<G> {
    #[inline]
    pub fn id(&self) -> GLuint {
        self.id
    }

    #[inline]
    pub fn target(&self) -> GLenum {
        self.target
    }
}

impl<G: GlApi> TextureObject for GlTexture<G> {
    fn desc(&self) -> &TextureDesc {
        &self.desc
    }
}

impl<G: GlApi> Drop for GlTexture<G> {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_texture(self.id);
        }
    }
}

pub struct GlSamplerState<G: GlApi> {
    pub(crate) gl: Rc<G>,
    /// 0 without sampler objects, the parameters are then applied to textures directly.
    pub(crate) id: GLuint,
    pub(crate) desc: SamplerStateDesc,
    pub(crate) parameters: Vec<SamplerParameter>,
}

impl<G: GlApi> GlSamplerState<G> {
    #[inline]
    pub fn id(&self) -> GLuint {
        self.id
    }

    #[inline]
    pub fn desc(&self) -> &SamplerStateDesc {
        &self.desc
    }
}

impl<G: GlApi> Drop for GlSamplerState<G> {
    fn drop(&mut self) {
        if self.id != 0 {
            unsafe {
                self.gl.delete_sampler(self.id);
            }
        }
    }
}

pub struct GlVertexArray<G: GlApi> {
    pub(crate) gl: Rc<G>,
    pub(crate) id: GLuint,
    pub(crate) vertex_buffers: Vec<Rc<GlBuffer<G>>>,
    pub(crate) index_buffer: Option<Rc<GlBuffer<G>>>,
}

impl<G: GlApi> GlVertexArray<G> {
    #[inline]
    pub fn id(&self) -> GLuint {
        self.id
    }

    /// The index format of the index buffer, if any.
    pub fn index_format(&self) -> Option<IndexFormat> {
        use crate::rhi::buffer::BufferKind;

        self.index_buffer.as_ref().and_then(|v| match v.desc.kind {
            BufferKind::Index(format) => Some(format),
            _ => None,
        })
    }
}

impl<G: GlApi> Drop for GlVertexArray<G> {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_vertex_array(self.id);
        }
    }
}

pub struct GlFramebuffer<G: GlApi> {
    pub(crate) gl: Rc<G>,
    pub(crate) id: GLuint,
    pub(crate) colors: Vec<Rc<GlTexture<G>>>,
    pub(crate) depth_stencil: Option<Rc<GlTexture<G>>>,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) samples: u8,
}

impl<G: GlApi> GlFramebuffer<G> {
    #[inline]
    pub fn id(&self) -> GLuint {
        self.id
    }

    #[inline]
    pub fn samples(&self) -> u8 {
        self.samples
    }
}

impl<G: GlApi> RenderTargetObject for GlFramebuffer<G> {
    fn width_and_height(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl<G: GlApi> Drop for GlFramebuffer<G> {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_framebuffer(self.id);
        }
    }
}

/// The default framebuffer of the context attached to a window.
pub struct GlSwapChain {
    pub(crate) window: Rc<dyn WindowSource>,
    pub(crate) desc: SwapChainDesc,
}

impl GlSwapChain {
    #[inline]
    pub fn desc(&self) -> &SwapChainDesc {
        &self.desc
    }
}

impl RenderTargetObject for GlSwapChain {
    fn width_and_height(&self) -> (u32, u32) {
        window::get_width_and_height(&*self.window)
    }
}

pub struct GlQueryPool<G: GlApi> {
    pub(crate) gl: Rc<G>,
    pub(crate) query_type: QueryType,
    pub(crate) number_of_queries: u32,
    /// One native query per counter and query.
    pub(crate) ids: Vec<GLuint>,
    /// The target of the query which is currently active.
    pub(crate) active_target: Cell<GLenum>,
}

impl<G: GlApi> GlQueryPool<G> {
    /// The number of native queries backing one query of this pool.
    pub fn counters(query_type: QueryType) -> usize {
        match query_type {
            QueryType::PipelineStatistics => PipelineStatisticsQueryResult::COUNTERS,
            _ => 1,
        }
    }

    /// Gets the native queries of the query at `index`.
    pub fn ids(&self, index: u32) -> &[GLuint] {
        let n = Self::counters(self.query_type);
        let start = index as usize * n;
        &self.ids[start..start + n]
    }
}

impl<G: GlApi> QueryPoolObject for GlQueryPool<G> {
    fn query_type(&self) -> QueryType {
        self.query_type
    }

    fn number_of_queries(&self) -> u32 {
        self.number_of_queries
    }
}

impl<G: GlApi> Drop for GlQueryPool<G> {
    fn drop(&mut self) {
        for &id in &self.ids {
            unsafe {
                self.gl.delete_query(id);
            }
        }
    }
}
