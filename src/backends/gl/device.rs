use std::cell::{Cell, RefCell};
use std::rc::Rc;

use byteorder::{ByteOrder, LittleEndian};
use gl;
use gl::types::*;

use crate::errors::*;
use crate::params::DeviceParams;
use crate::rhi::buffer::{
    BufferDesc, BufferKind, MapType, MappedSubresource, VertexArrayVertexBuffer,
    VertexAttributes,
};
use crate::rhi::capabilities::Capabilities;
use crate::rhi::command::{DrawArguments, DrawIndexedArguments};
use crate::rhi::device::{Device, ShaderLanguage};
use crate::rhi::framebuffer::{
    ClearFlags, FramebufferAttachment, RenderTarget, RenderTargetObject, ScissorRectangle,
    SwapChainDesc, Viewport,
};
use crate::rhi::pipeline::{GraphicsPipelineStateDesc, GraphicsShaderSources, ShaderSource};
use crate::rhi::query::{
    PipelineStatisticsQueryResult, QueryControlFlags, QueryResultFlags, QueryType,
};
use crate::rhi::resource::{QueryPoolObject, Resource, RootSignatureObject};
use crate::rhi::root_signature::RootSignatureDesc;
use crate::rhi::sampler::SamplerStateDesc;
use crate::rhi::texture::{self, TextureDesc, TextureDimension};
use crate::window::WindowSource;

use super::api::GlApi;
use super::capabilities::{self, GlCapabilities};
use super::check;
use super::pipeline::{self, GlComputePipelineState, GlGraphicsPipelineState};
use super::program::{self, GlComputeProgram, GlGraphicsProgram};
use super::resource_group::GlResourceGroup;
use super::resources::*;
use super::root_signature::GlRootSignature;
use super::state::GlMutableState;
use super::types::{self, SamplerParameter};

/// The OpenGL implementation of `Device`.
///
/// The context behind `G` must be current on this thread for the whole lifetime of the
/// device and of every object it creates.
pub struct OpenGLDevice<G: GlApi> {
    gl: Rc<G>,
    params: DeviceParams,
    gl_capabilities: GlCapabilities,
    capabilities: Capabilities,
    debug_markers: bool,

    state: GlMutableState,
    default_vertex_array: GLuint,
    /// The program in the single native program slot.
    bound_program: GLuint,
    /// The last value written to the start instance uniform of `bound_program`.
    start_instance: Option<u32>,

    graphics_root_signature: Option<Rc<GlRootSignature>>,
    graphics_pipeline_state: Option<Rc<GlGraphicsPipelineState<G>>>,
    graphics_resource_groups: Vec<Option<Rc<GlResourceGroup<G>>>>,
    compute_root_signature: Option<Rc<GlRootSignature>>,
    compute_pipeline_state: Option<Rc<GlComputePipelineState<G>>>,
    compute_resource_groups: Vec<Option<Rc<GlResourceGroup<G>>>>,
    vertex_array: Option<Rc<GlVertexArray<G>>>,
    render_target: Option<RenderTarget<OpenGLDevice<G>>>,
}

impl<G: GlApi> OpenGLDevice<G> {
    /// Creates a device on top of a context. Fails if the context lacks one of the
    /// mandatory features.
    pub fn new(gl: G, params: DeviceParams) -> Result<Self> {
        params.validate()?;

        let gl = Rc::new(gl);
        unsafe {
            let gl_capabilities = GlCapabilities::parse(&*gl)?;
            capabilities::check_capabilities(&gl_capabilities)?;

            let capabilities = gl_capabilities.to_capabilities(&params);
            if let Some(ref name) = params.shader_language {
                if ShaderLanguage::from_name(name) != Some(ShaderLanguage::Glsl) {
                    return Err(Error::Requirement(format!("shader language {}", name)).into());
                }
            }

            let debug_markers = params.debug && capabilities.debug_markers;
            if debug_markers {
                gl.enable(gl::DEBUG_OUTPUT);
            }

            let default_vertex_array = gl.gen_vertex_array();
            gl.bind_vertex_array(default_vertex_array);
            check(&*gl)?;

            info!(
                "[GL] Device created. {} {} {:?}.",
                gl_capabilities.vendor, gl_capabilities.renderer, gl_capabilities.version
            );
            info!("{:#?}", capabilities);

            Ok(OpenGLDevice {
                gl,
                params,
                gl_capabilities,
                capabilities,
                debug_markers,
                state: GlMutableState::default(),
                default_vertex_array,
                bound_program: 0,
                start_instance: None,
                graphics_root_signature: None,
                graphics_pipeline_state: None,
                graphics_resource_groups: Vec::new(),
                compute_root_signature: None,
                compute_pipeline_state: None,
                compute_resource_groups: Vec::new(),
                vertex_array: None,
                render_target: None,
            })
        }
    }

    /// Gets the native API.
    #[inline]
    pub fn gl(&self) -> &G {
        &self.gl
    }

    #[inline]
    pub fn gl_capabilities(&self) -> &GlCapabilities {
        &self.gl_capabilities
    }

    fn validate(&self) -> Result<()> {
        if self.params.validation {
            unsafe { check(&*self.gl) }
        } else {
            Ok(())
        }
    }

    /// Puts a program into the native program slot. The call always reaches the driver,
    /// compute and graphics programs share the slot.
    unsafe fn use_program(&mut self, id: GLuint) {
        self.gl.use_program(id);

        if self.bound_program != id {
            self.bound_program = id;
            self.start_instance = None;
        }
    }

    /// Writes the start instance of an emulated draw into the program.
    unsafe fn update_start_instance(&mut self, location: GLint, value: u32) {
        if location != -1 && self.start_instance != Some(value) {
            self.gl.uniform_1ui(location, value);
            self.start_instance = Some(value);
        }
    }

    fn current_framebuffer(&self) -> GLuint {
        match self.render_target {
            Some(RenderTarget::Framebuffer(ref v)) => v.id,
            _ => 0,
        }
    }

    fn render_target_height(&self) -> i32 {
        self.render_target
            .as_ref()
            .map(|v| v.width_and_height().1 as i32)
            .unwrap_or(1)
    }

    /// Binds a texture to its target of the active unit, returning the previous binding.
    unsafe fn bind_texture_for_update(&self, texture: &GlTexture<G>) -> GLuint {
        let last = self.gl.get_integer(types::texture_binding(texture.target)) as GLuint;
        self.gl.bind_texture(texture.target, texture.id);
        last
    }

    /// Makes sure the program of the graphics pipeline state is in the native slot.
    unsafe fn prepare_graphics(&mut self) -> Option<Rc<GlGraphicsPipelineState<G>>> {
        let pso = match self.graphics_pipeline_state {
            Some(ref v) => v.clone(),
            None => {
                warn!("[GL] Draw without graphics pipeline state.");
                return None;
            }
        };

        if self.bound_program != pso.program.id {
            self.use_program(pso.program.id);
        }

        Some(pso)
    }

    unsafe fn draw_emulated(
        &mut self,
        pso: &GlGraphicsPipelineState<G>,
        arguments: &[u8],
        number_of_draws: u32,
    ) {
        assert!(arguments.len() >= number_of_draws as usize * DrawArguments::SIZE);

        for i in 0..number_of_draws as usize {
            let v = DrawArguments::read(arguments, i);
            self.update_start_instance(pso.program.draw_id_location, v.start_instance_location);

            if self.capabilities.base_instance {
                self.gl.draw_arrays_instanced_base_instance(
                    pso.topology,
                    v.start_vertex_location as GLint,
                    v.vertex_count_per_instance as GLsizei,
                    v.instance_count as GLsizei,
                    v.start_instance_location,
                );
            } else {
                self.gl.draw_arrays_instanced(
                    pso.topology,
                    v.start_vertex_location as GLint,
                    v.vertex_count_per_instance as GLsizei,
                    v.instance_count as GLsizei,
                );
            }
        }
    }

    unsafe fn draw_indexed_emulated(
        &mut self,
        pso: &GlGraphicsPipelineState<G>,
        ty: GLenum,
        stride: u32,
        arguments: &[u8],
        number_of_draws: u32,
    ) {
        assert!(arguments.len() >= number_of_draws as usize * DrawIndexedArguments::SIZE);

        for i in 0..number_of_draws as usize {
            let v = DrawIndexedArguments::read(arguments, i);
            self.update_start_instance(pso.program.draw_id_location, v.start_instance_location);

            if v.base_vertex_location != 0 && !self.capabilities.base_vertex {
                warn!("[GL] Base vertex is not supported, the draw might be wrong.");
            }

            let offset = (v.start_index_location * stride) as usize;
            if self.capabilities.base_instance {
                self.gl.draw_elements_instanced_base_vertex_base_instance(
                    pso.topology,
                    v.index_count_per_instance as GLsizei,
                    ty,
                    offset,
                    v.instance_count as GLsizei,
                    v.base_vertex_location,
                    v.start_instance_location,
                );
            } else {
                self.gl.draw_elements_instanced_base_vertex(
                    pso.topology,
                    v.index_count_per_instance as GLsizei,
                    ty,
                    offset,
                    v.instance_count as GLsizei,
                    v.base_vertex_location,
                );
            }
        }
    }

    fn index_buffer(&self) -> Option<(GLenum, u32)> {
        let va = match self.vertex_array {
            Some(ref v) => v,
            None => {
                error!("[GL] Indexed draw without vertex array.");
                return None;
            }
        };

        match va.index_format() {
            Some(format) => Some((format.into(), format.stride())),
            None => {
                error!("[GL] Indexed draw with a vertex array which has no index buffer.");
                None
            }
        }
    }

    unsafe fn upload_texture_storage(
        &self,
        id: GLuint,
        desc: &TextureDesc,
        mipmaps: &[&[u8]],
    ) {
        let gl = &*self.gl;
        let (internal, format, ty) = types::texture_format(desc.format);
        let levels = desc.mipmaps() as GLsizei;
        let faces = desc.dimension.faces() as GLsizei;
        let (w, h, d) = (
            desc.width as GLsizei,
            desc.height as GLsizei,
            desc.depth as GLsizei,
        );

        match desc.dimension {
            TextureDimension::D1 => gl.texture_storage_1d(id, levels, internal, w),
            TextureDimension::D1Array => gl.texture_storage_2d(id, levels, internal, w, d),
            TextureDimension::D2 if desc.samples > 1 => {
                gl.texture_storage_2d_multisample(id, GLsizei::from(desc.samples), internal, w, h)
            }
            TextureDimension::D2 | TextureDimension::Cube => {
                gl.texture_storage_2d(id, levels, internal, w, h)
            }
            TextureDimension::D2Array | TextureDimension::CubeArray => {
                gl.texture_storage_3d(id, levels, internal, w, h, d * faces)
            }
            TextureDimension::D3 => gl.texture_storage_3d(id, levels, internal, w, h, d),
        }

        for (level, bytes) in mipmaps.iter().enumerate() {
            let (w, h, d) = desc.mipmap_dimensions(level as u32);
            let (w, h, d) = (w as GLsizei, h as GLsizei, d as GLsizei);
            let level = level as GLint;

            match desc.dimension {
                TextureDimension::D1 => gl.texture_sub_image_1d(id, level, w, format, ty, bytes),
                TextureDimension::D1Array => {
                    gl.texture_sub_image_2d(id, level, w, d, format, ty, bytes)
                }
                TextureDimension::D2 if desc.format.is_compressed() => {
                    gl.compressed_texture_sub_image_2d(id, level, w, h, internal, bytes)
                }
                TextureDimension::D2 => gl.texture_sub_image_2d(id, level, w, h, format, ty, bytes),
                _ => gl.texture_sub_image_3d(id, level, 0, w, h, d * faces, format, ty, bytes),
            }
        }

        if desc.samples <= 1 {
            gl.texture_parameter_i(id, gl::TEXTURE_MAX_LEVEL, levels - 1);
        }
    }

    unsafe fn upload_texture_legacy(
        &self,
        target: GLenum,
        desc: &TextureDesc,
        mipmaps: &[&[u8]],
    ) {
        let gl = &*self.gl;
        let (internal, format, ty) = types::texture_format(desc.format);
        let faces = desc.dimension.faces();

        for level in 0..desc.mipmaps() {
            let (w, h, d) = desc.mipmap_dimensions(level);
            let bytes = mipmaps.get(level as usize).cloned();
            let (gw, gh, gd) = (w as GLsizei, h as GLsizei, d as GLsizei);
            let lv = level as GLint;

            match desc.dimension {
                TextureDimension::D1 => gl.tex_image_1d(target, lv, internal, gw, format, ty, bytes),
                TextureDimension::D1Array => {
                    gl.tex_image_2d(target, lv, internal, gw, gd, format, ty, bytes)
                }
                TextureDimension::D2 if desc.samples > 1 => gl.tex_image_2d_multisample(
                    target,
                    GLsizei::from(desc.samples),
                    internal,
                    gw,
                    gh,
                ),
                TextureDimension::D2 if desc.format.is_compressed() => {
                    let zeros;
                    let bytes = match bytes {
                        Some(v) => v,
                        None => {
                            zeros = vec![0; desc.format.image_size(w, h) as usize];
                            &zeros
                        }
                    };

                    gl.compressed_tex_image_2d(target, lv, internal, gw, gh, bytes);
                }
                TextureDimension::D2 => {
                    gl.tex_image_2d(target, lv, internal, gw, gh, format, ty, bytes)
                }
                TextureDimension::Cube => {
                    let len = desc.format.image_size(w, h) as usize;
                    for face in 0..faces as usize {
                        let bytes = bytes.map(|v| &v[face * len..(face + 1) * len]);
                        gl.tex_image_2d(
                            gl::TEXTURE_CUBE_MAP_POSITIVE_X + face as GLenum,
                            lv,
                            internal,
                            gw,
                            gh,
                            format,
                            ty,
                            bytes,
                        );
                    }
                }
                _ => gl.tex_image_3d(
                    target,
                    lv,
                    internal,
                    gw,
                    gh,
                    gd * faces as GLsizei,
                    format,
                    ty,
                    bytes,
                ),
            }
        }

        if desc.samples <= 1 {
            gl.tex_parameter_i(target, gl::TEXTURE_MAX_LEVEL, desc.mipmaps() as GLint - 1);
        }
    }

    unsafe fn attach(&self, point: GLenum, attachment: &FramebufferAttachment<Self>) {
        let texture = &attachment.texture;
        let level = attachment.mipmap_index as GLint;

        match texture.desc.dimension {
            TextureDimension::Cube => self.gl.framebuffer_texture_2d(
                gl::FRAMEBUFFER,
                point,
                gl::TEXTURE_CUBE_MAP_POSITIVE_X + attachment.layer_index,
                texture.id,
                level,
            ),
            TextureDimension::D1Array
            | TextureDimension::D2Array
            | TextureDimension::D3
            | TextureDimension::CubeArray => self.gl.framebuffer_texture_layer(
                gl::FRAMEBUFFER,
                point,
                texture.id,
                level,
                attachment.layer_index as GLint,
            ),
            _ => self
                .gl
                .framebuffer_texture_2d(gl::FRAMEBUFFER, point, texture.target, texture.id, level),
        }
    }

    unsafe fn is_query_available(&self, id: GLuint, wait: bool) -> bool {
        loop {
            if self.gl.get_query_object_u32(id, gl::QUERY_RESULT_AVAILABLE) != 0 {
                return true;
            }

            if !wait {
                return false;
            }

            ::std::hint::spin_loop();
        }
    }
}

impl<G: GlApi> Drop for OpenGLDevice<G> {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_vertex_array(self.default_vertex_array);
        }
    }
}

impl<G: GlApi> Device for OpenGLDevice<G> {
    type Buffer = GlBuffer<G>;
    type Texture = GlTexture<G>;
    type SamplerState = GlSamplerState<G>;
    type RootSignature = GlRootSignature;
    type ResourceGroup = GlResourceGroup<G>;
    type GraphicsProgram = GlGraphicsProgram<G>;
    type ComputeProgram = GlComputeProgram<G>;
    type GraphicsPipelineState = GlGraphicsPipelineState<G>;
    type ComputePipelineState = GlComputePipelineState<G>;
    type VertexArray = GlVertexArray<G>;
    type Framebuffer = GlFramebuffer<G>;
    type SwapChain = GlSwapChain;
    type QueryPool = GlQueryPool<G>;

    fn name(&self) -> &'static str {
        "OpenGL"
    }

    fn params(&self) -> &DeviceParams {
        &self.params
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn shader_language(&self, name: Option<&str>) -> Result<ShaderLanguage> {
        match name {
            None => Ok(ShaderLanguage::Glsl),
            Some(name) => match ShaderLanguage::from_name(name) {
                Some(ShaderLanguage::Glsl) => Ok(ShaderLanguage::Glsl),
                _ => Err(Error::Unsupported(format!("Shader language {}", name)).into()),
            },
        }
    }

    fn create_buffer(&mut self, desc: BufferDesc, data: Option<&[u8]>) -> Result<Rc<GlBuffer<G>>> {
        desc.validate(data)?;

        let size = desc.size as usize;
        let padded;
        let data = match data {
            Some(v) if v.len() < size => {
                let mut buf = v.to_vec();
                buf.resize(size, 0);
                padded = buf;
                Some(&padded[..])
            }
            v => v,
        };

        if let BufferKind::Indirect { .. } = desc.kind {
            if !self.capabilities.draw_indirect {
                let shadow = data.map(|v| v.to_vec()).unwrap_or_else(|| vec![0; size]);
                return Ok(Rc::new(GlBuffer {
                    gl: self.gl.clone(),
                    id: 0,
                    texture_id: 0,
                    desc,
                    shadow: Some(RefCell::new(shadow)),
                }));
            }
        }

        if let BufferKind::Texture(_) = desc.kind {
            if !self.gl_capabilities.extensions.gl_arb_texture_buffer_object {
                warn!("[GL] Texture buffers are not supported.");
                return Err(Error::Unsupported("Texture buffer".into()).into());
            }
        }

        let gl = &*self.gl;
        let usage = desc.usage.into();

        unsafe {
            let id = if self.gl_capabilities.dsa() {
                let id = gl.create_buffer();
                gl.named_buffer_data(id, size, data, usage);
                id
            } else {
                let id = gl.gen_buffer();
                gl.bind_buffer(gl::COPY_WRITE_BUFFER, id);
                gl.buffer_data(gl::COPY_WRITE_BUFFER, size, data, usage);
                gl.bind_buffer(gl::COPY_WRITE_BUFFER, 0);
                id
            };

            let texture_id = match desc.kind {
                BufferKind::Texture(format) => {
                    let (internal, _, _) = types::texture_format(format);
                    if self.gl_capabilities.dsa() {
                        let tid = gl.create_texture(gl::TEXTURE_BUFFER);
                        gl.texture_buffer(tid, internal, id);
                        tid
                    } else {
                        let tid = gl.gen_texture();
                        let last = gl.get_integer(gl::TEXTURE_BINDING_BUFFER) as GLuint;
                        gl.bind_texture(gl::TEXTURE_BUFFER, tid);
                        gl.tex_buffer(gl::TEXTURE_BUFFER, internal, id);
                        gl.bind_texture(gl::TEXTURE_BUFFER, last);
                        tid
                    }
                }
                _ => 0,
            };

            let buffer = Rc::new(GlBuffer {
                gl: self.gl.clone(),
                id,
                texture_id,
                desc,
                shadow: None,
            });

            self.validate()?;
            Ok(buffer)
        }
    }

    fn create_texture(&mut self, desc: TextureDesc, data: Option<&[u8]>) -> Result<Rc<GlTexture<G>>> {
        desc.validate(data)?;

        if desc.format.is_compressed() && desc.dimension != TextureDimension::D2 {
            return Err(Error::Unsupported(format!(
                "Compressed {:?} texture",
                desc.dimension
            ))
            .into());
        }

        let mut desc = desc;
        desc.samples = self.capabilities.multisamples(desc.samples);
        if desc.samples > 1 && !self.gl_capabilities.extensions.gl_arb_texture_multisample {
            return Err(Error::Unsupported("Multisample texture".into()).into());
        }

        let target = types::texture_target(desc.dimension, desc.samples);
        let (internal_format, _, _) = types::texture_format(desc.format);
        let mipmaps = texture::split_mipmaps(&desc, data);
        let generate = desc.flags.generate_mipmaps
            && !mipmaps.is_empty()
            && !desc.flags.data_contains_mipmaps
            && desc.mipmaps() > 1;

        unsafe {
            let id = if self.gl_capabilities.texture_storage() {
                let id = self.gl.create_texture(target);
                self.upload_texture_storage(id, &desc, &mipmaps);
                if generate {
                    self.gl.generate_texture_mipmap(id);
                }

                id
            } else {
                let id = self.gl.gen_texture();
                let last = self.gl.get_integer(types::texture_binding(target)) as GLuint;
                self.gl.bind_texture(target, id);
                self.upload_texture_legacy(target, &desc, &mipmaps);
                if generate {
                    self.gl.generate_mipmap(target);
                }

                self.gl.bind_texture(target, last);
                id
            };

            let texture = Rc::new(GlTexture {
                gl: self.gl.clone(),
                id,
                target,
                desc,
                internal_format,
            });

            self.validate()?;
            Ok(texture)
        }
    }

    fn create_sampler_state(&mut self, desc: &SamplerStateDesc) -> Result<Rc<GlSamplerState<G>>> {
        let parameters = types::sampler_parameters(desc, self.capabilities.max_anisotropy);

        unsafe {
            let id = if self.gl_capabilities.sampler_objects() {
                let id = self.gl.gen_sampler();
                for &v in &parameters {
                    match v {
                        SamplerParameter::Int(name, value) => {
                            self.gl.sampler_parameter_i(id, name, value)
                        }
                        SamplerParameter::Float(name, value) => {
                            self.gl.sampler_parameter_f(id, name, value)
                        }
                        SamplerParameter::Color(name, ref value) => {
                            self.gl.sampler_parameter_fv(id, name, value)
                        }
                    }
                }

                id
            } else {
                0
            };

            let sampler = Rc::new(GlSamplerState {
                gl: self.gl.clone(),
                id,
                desc: *desc,
                parameters,
            });

            self.validate()?;
            Ok(sampler)
        }
    }

    fn create_root_signature(&mut self, desc: &RootSignatureDesc) -> Result<Rc<GlRootSignature>> {
        desc.validate()?;
        Ok(Rc::new(GlRootSignature::new(desc)))
    }

    fn create_resource_group(
        &mut self,
        root_signature: &Rc<GlRootSignature>,
        root_parameter_index: u32,
        resources: &[Resource<Self>],
        sampler_states: Option<&[Option<Rc<GlSamplerState<G>>>]>,
    ) -> Result<Rc<GlResourceGroup<G>>> {
        assert!(
            (root_parameter_index as usize) < root_signature.desc().len(),
            "Root parameter index {} out of bounds.",
            root_parameter_index
        );

        Ok(Rc::new(GlResourceGroup::new(
            root_signature,
            root_parameter_index,
            resources,
            sampler_states,
        )))
    }

    fn create_graphics_program(
        &mut self,
        root_signature: &Rc<GlRootSignature>,
        vertex_attributes: &VertexAttributes,
        sources: &GraphicsShaderSources,
    ) -> Result<Rc<GlGraphicsProgram<G>>> {
        unsafe {
            let program = program::create_graphics_program(
                &self.gl,
                &self.capabilities,
                root_signature,
                vertex_attributes,
                sources,
            )?;

            Ok(Rc::new(program))
        }
    }

    fn create_compute_program(
        &mut self,
        root_signature: &Rc<GlRootSignature>,
        source: &ShaderSource,
    ) -> Result<Rc<GlComputeProgram<G>>> {
        unsafe {
            let program = program::create_compute_program(
                &self.gl,
                &self.capabilities,
                root_signature,
                source,
            )?;

            Ok(Rc::new(program))
        }
    }

    fn create_graphics_pipeline_state(
        &mut self,
        desc: &GraphicsPipelineStateDesc<Self>,
    ) -> Result<Rc<GlGraphicsPipelineState<G>>> {
        desc.validate(
            self.capabilities.max_patch_vertices,
            self.capabilities.max_simultaneous_render_targets,
        )?;

        unsafe {
            pipeline::resolve_bindings(
                &*self.gl,
                &self.gl_capabilities,
                desc.program.id,
                &desc.root_signature,
            );
        }

        let pso = GlGraphicsPipelineState {
            root_signature: desc.root_signature.clone(),
            program: desc.program.clone(),
            topology: desc.primitive_topology.into(),
            patch_vertices: desc.primitive_topology.patch_vertices(),
            rasterizer: desc.rasterizer,
            depth_stencil: desc.depth_stencil,
            blend: desc.blend,
        };

        self.validate()?;
        Ok(Rc::new(pso))
    }

    fn create_compute_pipeline_state(
        &mut self,
        root_signature: &Rc<GlRootSignature>,
        program: &Rc<GlComputeProgram<G>>,
    ) -> Result<Rc<GlComputePipelineState<G>>> {
        unsafe {
            pipeline::resolve_bindings(
                &*self.gl,
                &self.gl_capabilities,
                program.id,
                root_signature,
            );
        }

        self.validate()?;
        Ok(Rc::new(GlComputePipelineState {
            root_signature: root_signature.clone(),
            program: program.clone(),
        }))
    }

    fn create_vertex_array(
        &mut self,
        attributes: &VertexAttributes,
        vertex_buffers: &[VertexArrayVertexBuffer<Self>],
        index_buffer: Option<&Rc<GlBuffer<G>>>,
    ) -> Result<Rc<GlVertexArray<G>>> {
        if (vertex_buffers.len() as u32) < attributes.number_of_slots() {
            return Err(Error::InvalidDescriptor(format!(
                "the attributes read from {} vertex buffers, got {}",
                attributes.number_of_slots(),
                vertex_buffers.len()
            ))
            .into());
        }

        if let Some(ib) = index_buffer {
            if let BufferKind::Index(_) = ib.desc.kind {
            } else {
                return Err(
                    Error::InvalidDescriptor(format!("{:?} as index buffer", ib.desc.kind)).into(),
                );
            }
        }

        let gl = &*self.gl;
        unsafe {
            let id = gl.gen_vertex_array();
            gl.bind_vertex_array(id);

            for (i, v) in attributes.attributes.iter().enumerate() {
                let i = i as GLuint;
                let buffer = &vertex_buffers[v.input_slot as usize].buffer;
                let (size, ty) = types::vertex_attribute_format(v.format);

                gl.bind_buffer(gl::ARRAY_BUFFER, buffer.id);
                gl.enable_vertex_attrib_array(i);

                if v.format.is_integer() {
                    gl.vertex_attrib_i_pointer(
                        i,
                        size,
                        ty,
                        v.stride_in_bytes as GLsizei,
                        v.aligned_byte_offset as usize,
                    );
                } else {
                    gl.vertex_attrib_pointer(
                        i,
                        size,
                        ty,
                        v.format.is_normalized(),
                        v.stride_in_bytes as GLsizei,
                        v.aligned_byte_offset as usize,
                    );
                }

                if v.instances_per_element > 0 {
                    if self.capabilities.instanced_arrays {
                        gl.vertex_attrib_divisor(i, v.instances_per_element);
                    } else {
                        warn!("[GL] Instanced arrays are not supported, {} is per-vertex.", v.name);
                    }
                }
            }

            if let Some(ib) = index_buffer {
                gl.bind_buffer(gl::ELEMENT_ARRAY_BUFFER, ib.id);
            }

            let current = self
                .vertex_array
                .as_ref()
                .map(|v| v.id)
                .unwrap_or(self.default_vertex_array);
            gl.bind_vertex_array(current);
            gl.bind_buffer(gl::ARRAY_BUFFER, 0);

            let va = Rc::new(GlVertexArray {
                gl: self.gl.clone(),
                id,
                vertex_buffers: vertex_buffers.iter().map(|v| v.buffer.clone()).collect(),
                index_buffer: index_buffer.cloned(),
            });

            self.validate()?;
            Ok(va)
        }
    }

    fn create_framebuffer(
        &mut self,
        colors: &[FramebufferAttachment<Self>],
        depth_stencil: Option<&FramebufferAttachment<Self>>,
    ) -> Result<Rc<GlFramebuffer<G>>> {
        assert!(
            !colors.is_empty() || depth_stencil.is_some(),
            "Framebuffer without attachments."
        );

        if colors.len() > self.capabilities.max_simultaneous_render_targets as usize {
            return Err(Error::InvalidDescriptor(format!(
                "{} color attachments exceed the maximum {}",
                colors.len(),
                self.capabilities.max_simultaneous_render_targets
            ))
            .into());
        }

        let first = colors.first().or(depth_stencil).map(|v| {
            let (w, h, _) = v.texture.desc.mipmap_dimensions(v.mipmap_index);
            (w, h, v.texture.desc.samples)
        });

        let (width, height, samples) = first.unwrap_or((1, 1, 1));

        unsafe {
            let id = self.gl.gen_framebuffer();
            self.gl.bind_framebuffer(gl::FRAMEBUFFER, id);

            for (i, v) in colors.iter().enumerate() {
                self.attach(gl::COLOR_ATTACHMENT0 + i as GLenum, v);
            }

            if let Some(v) = depth_stencil {
                let point = if v.texture.desc.format.has_stencil() {
                    gl::DEPTH_STENCIL_ATTACHMENT
                } else {
                    gl::DEPTH_ATTACHMENT
                };

                self.attach(point, v);
            }

            if colors.is_empty() {
                self.gl.draw_buffers(&[gl::NONE]);
            } else {
                let buffers: Vec<_> = (0..colors.len())
                    .map(|i| gl::COLOR_ATTACHMENT0 + i as GLenum)
                    .collect();
                self.gl.draw_buffers(&buffers);
            }

            let status = self.gl.check_framebuffer_status(gl::FRAMEBUFFER);
            self.gl
                .bind_framebuffer(gl::FRAMEBUFFER, self.current_framebuffer());

            let fbo = Rc::new(GlFramebuffer {
                gl: self.gl.clone(),
                id,
                colors: colors.iter().map(|v| v.texture.clone()).collect(),
                depth_stencil: depth_stencil.map(|v| v.texture.clone()),
                width,
                height,
                samples,
            });

            if status != gl::FRAMEBUFFER_COMPLETE {
                let reason = types::framebuffer_status_string(status);
                error!("[GL] Framebuffer is incomplete. {}", reason);
                return Err(Error::FramebufferIncomplete(reason.into()).into());
            }

            self.validate()?;
            Ok(fbo)
        }
    }

    fn create_swap_chain(
        &mut self,
        window: Rc<dyn WindowSource>,
        desc: &SwapChainDesc,
    ) -> Result<Rc<GlSwapChain>> {
        let swap_chain = GlSwapChain {
            window,
            desc: *desc,
        };

        let (w, h) = swap_chain.width_and_height();
        info!("[GL] Swap chain created with {}x{} pixels.", w, h);
        Ok(Rc::new(swap_chain))
    }

    fn create_query_pool(
        &mut self,
        query_type: QueryType,
        number_of_queries: u32,
    ) -> Result<Rc<GlQueryPool<G>>> {
        assert!(number_of_queries > 0, "Query pool without queries.");

        let supported = match query_type {
            QueryType::Occlusion => self.capabilities.occlusion_query,
            QueryType::PipelineStatistics => self.capabilities.pipeline_statistics_query,
            QueryType::Timestamp => self.capabilities.timestamp_query,
        };

        if !supported {
            warn!("[GL] {:?} query is not supported.", query_type);
            return Err(Error::Unsupported(format!("{:?} query", query_type)).into());
        }

        let n = number_of_queries as usize * GlQueryPool::<G>::counters(query_type);
        let ids = (0..n).map(|_| unsafe { self.gl.gen_query() }).collect();

        Ok(Rc::new(GlQueryPool {
            gl: self.gl.clone(),
            query_type,
            number_of_queries,
            ids,
            active_target: Cell::new(0),
        }))
    }

    fn map(&mut self, buffer: &Rc<GlBuffer<G>>, map_type: MapType) -> Result<MappedSubresource> {
        let size = buffer.desc.size as usize;

        if let Some(ref shadow) = buffer.shadow {
            let data = shadow.borrow_mut().as_mut_ptr();
            return Ok(MappedSubresource {
                data,
                size,
                row_pitch: size as u32,
                depth_pitch: size as u32,
            });
        }

        let access = types::map_access(map_type);
        let usage = buffer.desc.usage.into();

        let data = unsafe {
            if self.gl_capabilities.dsa() {
                if map_type == MapType::WriteDiscard {
                    self.gl.named_buffer_data(buffer.id, size, None, usage);
                }

                self.gl.map_named_buffer(buffer.id, access)
            } else {
                self.gl.bind_buffer(gl::COPY_WRITE_BUFFER, buffer.id);
                if map_type == MapType::WriteDiscard {
                    self.gl.buffer_data(gl::COPY_WRITE_BUFFER, size, None, usage);
                }

                self.gl.map_buffer(gl::COPY_WRITE_BUFFER, access)
            }
        };

        if data.is_null() {
            error!("[GL] Failed to map buffer {}.", buffer.id);
            return Err(Error::Backend(format!("failed to map buffer {}", buffer.id)).into());
        }

        Ok(MappedSubresource {
            data,
            size,
            row_pitch: size as u32,
            depth_pitch: size as u32,
        })
    }

    fn unmap(&mut self, buffer: &Rc<GlBuffer<G>>) {
        if buffer.shadow.is_some() {
            return;
        }

        let intact = unsafe {
            if self.gl_capabilities.dsa() {
                self.gl.unmap_named_buffer(buffer.id)
            } else {
                self.gl.bind_buffer(gl::COPY_WRITE_BUFFER, buffer.id);
                let v = self.gl.unmap_buffer(gl::COPY_WRITE_BUFFER);
                self.gl.bind_buffer(gl::COPY_WRITE_BUFFER, 0);
                v
            }
        };

        if !intact {
            warn!("[GL] The data store of buffer {} became corrupt while mapped.", buffer.id);
        }
    }

    fn get_query_pool_results(
        &mut self,
        pool: &Rc<GlQueryPool<G>>,
        data: &mut [u8],
        first: u32,
        count: u32,
        stride: u32,
        flags: QueryResultFlags,
    ) -> bool {
        assert!(first + count <= pool.number_of_queries, "Query out of bounds.");
        if count == 0 {
            return true;
        }

        let size = pool.query_type.result_size();
        assert!(
            data.len() >= (count - 1) as usize * stride as usize + size,
            "Query results do not fit into {} bytes.",
            data.len()
        );

        unsafe {
            for index in first..first + count {
                for &id in pool.ids(index) {
                    if !self.is_query_available(id, flags.wait) {
                        return false;
                    }
                }
            }

            for (i, index) in (first..first + count).enumerate() {
                let offset = i * stride as usize;
                let dst = &mut data[offset..offset + size];
                let ids = pool.ids(index);

                match pool.query_type {
                    QueryType::PipelineStatistics => {
                        let mut counters = [0; PipelineStatisticsQueryResult::COUNTERS];
                        for (v, &id) in counters.iter_mut().zip(ids) {
                            *v = self.gl.get_query_object_u64(id, gl::QUERY_RESULT);
                        }

                        PipelineStatisticsQueryResult::from_counters(&counters).write(dst);
                    }
                    _ => {
                        let v = self.gl.get_query_object_u64(ids[0], gl::QUERY_RESULT);
                        LittleEndian::write_u64(dst, v);
                    }
                }
            }
        }

        true
    }

    fn present(&mut self, swap_chain: &Rc<GlSwapChain>) {
        if let Err(err) = swap_chain.window.swap_buffers() {
            error!("[GL] Failed to swap buffers, {}.", err);
        }
    }

    fn set_graphics_root_signature(&mut self, root_signature: Option<Rc<GlRootSignature>>) {
        self.graphics_resource_groups.clear();
        self.graphics_root_signature = root_signature;
    }

    fn set_graphics_pipeline_state(&mut self, pipeline: Option<Rc<GlGraphicsPipelineState<G>>>) {
        let pso = match pipeline {
            Some(v) => v,
            None => {
                self.graphics_pipeline_state = None;
                return;
            }
        };

        let same = self
            .graphics_pipeline_state
            .as_ref()
            .map_or(false, |v| Rc::ptr_eq(v, &pso));

        unsafe {
            if !same {
                if pso.patch_vertices > 0 {
                    self.gl
                        .patch_parameter_i(gl::PATCH_VERTICES, pso.patch_vertices as GLint);
                }

                self.state.set_rasterizer(&*self.gl, &pso.rasterizer);
                self.state.set_depth_stencil(&*self.gl, &pso.depth_stencil);
                self.state.set_blend(&*self.gl, &pso.blend);
            } else {
                // Unbinding the render target resets the scissor test behind the state.
                self.state
                    .set_scissor_test(&*self.gl, pso.rasterizer.scissor_enable);
            }

            // A compute dispatch might have taken the program slot in between.
            self.use_program(pso.program.id);
        }

        if !same {
            self.graphics_pipeline_state = Some(pso);
        }
    }

    fn set_graphics_resource_group(
        &mut self,
        root_parameter_index: u32,
        group: Option<Rc<GlResourceGroup<G>>>,
    ) {
        let index = root_parameter_index as usize;
        if self.graphics_resource_groups.len() <= index {
            self.graphics_resource_groups.resize(index + 1, None);
        }

        if let Some(ref v) = group {
            debug_assert_eq!(v.root_parameter_index, root_parameter_index);
            if let Some(ref rs) = self.graphics_root_signature {
                debug_assert!(
                    Rc::ptr_eq(rs, &v.root_signature),
                    "Resource group was created against another root signature."
                );
            }

            unsafe {
                v.bind(&*self.gl, &self.gl_capabilities);
            }
        }

        self.graphics_resource_groups[index] = group;
    }

    fn set_graphics_vertex_array(&mut self, vertex_array: Option<Rc<GlVertexArray<G>>>) {
        let id = vertex_array
            .as_ref()
            .map(|v| v.id)
            .unwrap_or(self.default_vertex_array);

        unsafe {
            self.gl.bind_vertex_array(id);
        }

        self.vertex_array = vertex_array;
    }

    fn set_graphics_viewports(&mut self, viewports: &[Viewport]) {
        let vp = match viewports.first() {
            Some(v) => *v,
            None => return,
        };

        if viewports.len() > 1 {
            debug!("[GL] Only the first of {} viewports is used.", viewports.len());
        }

        // Lower-left origin.
        let height = self.render_target_height();
        let rect = [
            vp.top_left_x as GLint,
            height - (vp.top_left_y + vp.height) as GLint,
            vp.width as GLsizei,
            vp.height as GLsizei,
        ];

        unsafe {
            self.state
                .set_viewport(&*self.gl, rect, (vp.min_depth, vp.max_depth));
        }
    }

    fn set_graphics_scissor_rectangles(&mut self, rectangles: &[ScissorRectangle]) {
        let v = match rectangles.first() {
            Some(v) => *v,
            None => return,
        };

        let height = self.render_target_height();
        let rect = [
            v.top_left_x,
            height - v.bottom_right_y,
            v.width(),
            v.height(),
        ];

        unsafe {
            self.state.set_scissor(&*self.gl, rect);
        }
    }

    fn set_graphics_render_target(&mut self, render_target: Option<RenderTarget<Self>>) {
        unsafe {
            match render_target {
                Some(RenderTarget::Framebuffer(ref v)) => {
                    self.gl.bind_framebuffer(gl::FRAMEBUFFER, v.id);
                }
                Some(RenderTarget::SwapChain(_)) => {
                    self.gl.bind_framebuffer(gl::FRAMEBUFFER, 0);
                }
                None => {
                    self.gl.bind_framebuffer(gl::FRAMEBUFFER, 0);
                    self.state.set_scissor_test(&*self.gl, false);
                }
            }

            if render_target.is_some() {
                if let Some(ref pso) = self.graphics_pipeline_state {
                    self.state
                        .set_scissor_test(&*self.gl, pso.rasterizer.scissor_enable);
                }
            }
        }

        self.render_target = render_target;
    }

    fn clear_graphics(&mut self, flags: ClearFlags, color: [f32; 4], z: f32, stencil: u32) {
        if flags.is_empty() {
            return;
        }

        let gl = &*self.gl;
        let mut mask = 0;

        unsafe {
            let color_mask = self.state.color_write_mask();
            if flags.color {
                gl.clear_color(color[0], color[1], color[2], color[3]);
                if color_mask != Some(0xf) {
                    gl.color_mask(true, true, true, true);
                }

                mask |= gl::COLOR_BUFFER_BIT;
            }

            // Clears respect the write masks.
            let depth_mask = self.state.depth_write_mask();
            if flags.depth {
                gl.clear_depth(f64::from(z));
                if depth_mask != Some(true) {
                    gl.depth_mask(true);
                }

                mask |= gl::DEPTH_BUFFER_BIT;
            }

            if flags.stencil {
                gl.clear_stencil(stencil as GLint);
                mask |= gl::STENCIL_BUFFER_BIT;
            }

            gl.clear(mask);

            if flags.color {
                if let Some(v) = color_mask {
                    if v != 0xf {
                        gl.color_mask(v & 1 != 0, v & 2 != 0, v & 4 != 0, v & 8 != 0);
                    }
                }
            }

            if flags.depth && depth_mask == Some(false) {
                gl.depth_mask(false);
            }
        }
    }

    fn draw_graphics(&mut self, buffer: &Rc<GlBuffer<G>>, offset: u32, number_of_draws: u32) {
        if number_of_draws == 0 {
            return;
        }

        unsafe {
            let pso = match self.prepare_graphics() {
                Some(v) => v,
                None => return,
            };

            if let Some(ref shadow) = buffer.shadow {
                let bytes = shadow.borrow();
                self.draw_emulated(&pso, &bytes[offset as usize..], number_of_draws);
                return;
            }

            self.gl.bind_buffer(gl::DRAW_INDIRECT_BUFFER, buffer.id);

            let offset = offset as usize;
            if number_of_draws == 1 {
                self.gl.draw_arrays_indirect(pso.topology, offset);
            } else if self.capabilities.multi_draw_indirect {
                self.gl.multi_draw_arrays_indirect(
                    pso.topology,
                    offset,
                    number_of_draws as GLsizei,
                    0,
                );
            } else {
                for i in 0..number_of_draws as usize {
                    self.gl
                        .draw_arrays_indirect(pso.topology, offset + i * DrawArguments::SIZE);
                }
            }
        }
    }

    fn draw_graphics_emulated(&mut self, arguments: &[u8], number_of_draws: u32) {
        if number_of_draws == 0 {
            return;
        }

        unsafe {
            if let Some(pso) = self.prepare_graphics() {
                self.draw_emulated(&pso, arguments, number_of_draws);
            }
        }
    }

    fn draw_indexed_graphics(
        &mut self,
        buffer: &Rc<GlBuffer<G>>,
        offset: u32,
        number_of_draws: u32,
    ) {
        if number_of_draws == 0 {
            return;
        }

        let (ty, stride) = match self.index_buffer() {
            Some(v) => v,
            None => return,
        };

        unsafe {
            let pso = match self.prepare_graphics() {
                Some(v) => v,
                None => return,
            };

            if let Some(ref shadow) = buffer.shadow {
                let bytes = shadow.borrow();
                self.draw_indexed_emulated(
                    &pso,
                    ty,
                    stride,
                    &bytes[offset as usize..],
                    number_of_draws,
                );
                return;
            }

            self.gl.bind_buffer(gl::DRAW_INDIRECT_BUFFER, buffer.id);

            let offset = offset as usize;
            if number_of_draws == 1 {
                self.gl.draw_elements_indirect(pso.topology, ty, offset);
            } else if self.capabilities.multi_draw_indirect {
                self.gl.multi_draw_elements_indirect(
                    pso.topology,
                    ty,
                    offset,
                    number_of_draws as GLsizei,
                    0,
                );
            } else {
                for i in 0..number_of_draws as usize {
                    self.gl.draw_elements_indirect(
                        pso.topology,
                        ty,
                        offset + i * DrawIndexedArguments::SIZE,
                    );
                }
            }
        }
    }

    fn draw_indexed_graphics_emulated(&mut self, arguments: &[u8], number_of_draws: u32) {
        if number_of_draws == 0 {
            return;
        }

        let (ty, stride) = match self.index_buffer() {
            Some(v) => v,
            None => return,
        };

        unsafe {
            if let Some(pso) = self.prepare_graphics() {
                self.draw_indexed_emulated(&pso, ty, stride, arguments, number_of_draws);
            }
        }
    }

    fn set_compute_root_signature(&mut self, root_signature: Option<Rc<GlRootSignature>>) {
        self.compute_resource_groups.clear();
        self.compute_root_signature = root_signature;
    }

    fn set_compute_pipeline_state(&mut self, pipeline: Option<Rc<GlComputePipelineState<G>>>) {
        let pso = match pipeline {
            Some(v) => v,
            None => {
                self.compute_pipeline_state = None;
                return;
            }
        };

        unsafe {
            self.use_program(pso.program.id);
        }

        // The start instance uniform belongs to a graphics program.
        self.start_instance = None;
        self.compute_pipeline_state = Some(pso);
    }

    fn set_compute_resource_group(
        &mut self,
        root_parameter_index: u32,
        group: Option<Rc<GlResourceGroup<G>>>,
    ) {
        let index = root_parameter_index as usize;
        if self.compute_resource_groups.len() <= index {
            self.compute_resource_groups.resize(index + 1, None);
        }

        if let Some(ref v) = group {
            debug_assert_eq!(v.root_parameter_index, root_parameter_index);
            if let Some(ref rs) = self.compute_root_signature {
                debug_assert!(
                    Rc::ptr_eq(rs, &v.root_signature),
                    "Resource group was created against another root signature."
                );
            }

            unsafe {
                v.bind(&*self.gl, &self.gl_capabilities);
            }
        }

        self.compute_resource_groups[index] = group;
    }

    fn dispatch_compute(&mut self, x: u32, y: u32, z: u32) {
        let pso = match self.compute_pipeline_state {
            Some(ref v) => v.clone(),
            None => {
                warn!("[GL] Dispatch without compute pipeline state.");
                return;
            }
        };

        unsafe {
            if self.bound_program != pso.program.id {
                self.use_program(pso.program.id);
            }

            self.gl.dispatch_compute(x, y, z);
            self.gl.memory_barrier(gl::ALL_BARRIER_BITS);
        }
    }

    fn set_texture_minimum_maximum_mipmap_index(
        &mut self,
        texture: &Rc<GlTexture<G>>,
        minimum: u32,
        maximum: u32,
    ) {
        debug_assert!(minimum <= maximum);

        unsafe {
            if self.gl_capabilities.dsa() {
                self.gl
                    .texture_parameter_i(texture.id, gl::TEXTURE_BASE_LEVEL, minimum as GLint);
                self.gl
                    .texture_parameter_i(texture.id, gl::TEXTURE_MAX_LEVEL, maximum as GLint);
            } else {
                let last = self.bind_texture_for_update(texture);
                self.gl
                    .tex_parameter_i(texture.target, gl::TEXTURE_BASE_LEVEL, minimum as GLint);
                self.gl
                    .tex_parameter_i(texture.target, gl::TEXTURE_MAX_LEVEL, maximum as GLint);
                self.gl.bind_texture(texture.target, last);
            }
        }
    }

    fn resolve_multisample_framebuffer(
        &mut self,
        destination: &RenderTarget<Self>,
        source: &Rc<GlFramebuffer<G>>,
    ) {
        let (sw, sh) = source.width_and_height();
        let (dw, dh) = destination.width_and_height();
        let dst = match *destination {
            RenderTarget::Framebuffer(ref v) => v.id,
            RenderTarget::SwapChain(_) => 0,
        };

        let mut mask = 0;
        if !source.colors.is_empty() {
            mask |= gl::COLOR_BUFFER_BIT;
        }

        if source.depth_stencil.is_some() {
            mask |= gl::DEPTH_BUFFER_BIT;
        }

        unsafe {
            self.gl.bind_framebuffer(gl::READ_FRAMEBUFFER, source.id);
            self.gl.bind_framebuffer(gl::DRAW_FRAMEBUFFER, dst);
            self.gl.blit_framebuffer(
                [0, 0, sw as GLint, sh as GLint],
                [0, 0, dw as GLint, dh as GLint],
                mask,
                gl::NEAREST,
            );

            self.gl
                .bind_framebuffer(gl::FRAMEBUFFER, self.current_framebuffer());
        }
    }

    fn copy_resource(&mut self, destination: &Resource<Self>, source: &Resource<Self>) {
        match (destination, source) {
            (Resource::Buffer(ref dst), Resource::Buffer(ref src)) => {
                let size = dst.desc.size.min(src.desc.size) as usize;

                if let (Some(ref a), Some(ref b)) = (&dst.shadow, &src.shadow) {
                    let bytes = b.borrow()[..size].to_vec();
                    a.borrow_mut()[..size].copy_from_slice(&bytes);
                    return;
                }

                if dst.id == 0 || src.id == 0 {
                    warn!("[GL] Could not copy between CPU and GPU indirect buffers.");
                    return;
                }

                unsafe {
                    if self.gl_capabilities.dsa() {
                        self.gl.copy_named_buffer_sub_data(src.id, dst.id, 0, 0, size);
                    } else {
                        self.gl.bind_buffer(gl::COPY_READ_BUFFER, src.id);
                        self.gl.bind_buffer(gl::COPY_WRITE_BUFFER, dst.id);
                        self.gl.copy_buffer_sub_data(
                            gl::COPY_READ_BUFFER,
                            gl::COPY_WRITE_BUFFER,
                            0,
                            0,
                            size,
                        );
                        self.gl.bind_buffer(gl::COPY_READ_BUFFER, 0);
                        self.gl.bind_buffer(gl::COPY_WRITE_BUFFER, 0);
                    }
                }
            }

            (Resource::Texture(ref dst), Resource::Texture(ref src)) => {
                if !self.gl_capabilities.extensions.gl_arb_copy_image {
                    warn!("[GL] Copying textures is not supported.");
                    return;
                }

                let (w, h, d) = src.desc.mipmap_dimensions(0);
                let depth = d * src.desc.dimension.faces();

                unsafe {
                    self.gl.copy_image_sub_data(
                        src.id,
                        src.target,
                        dst.id,
                        dst.target,
                        w as GLsizei,
                        h as GLsizei,
                        depth as GLsizei,
                    );
                }
            }

            _ => {
                error!(
                    "[GL] Could not copy {:?} into {:?}.",
                    source.resource_type(),
                    destination.resource_type()
                );
            }
        }
    }

    fn generate_mipmaps(&mut self, texture: &Rc<GlTexture<G>>) {
        unsafe {
            if self.gl_capabilities.dsa() {
                self.gl.generate_texture_mipmap(texture.id);
            } else {
                let last = self.bind_texture_for_update(texture);
                self.gl.generate_mipmap(texture.target);
                self.gl.bind_texture(texture.target, last);
            }
        }
    }

    fn reset_query_pool(&mut self, pool: &Rc<GlQueryPool<G>>, first: u32, count: u32) {
        // Queries are implicitly reset when they begin.
        debug_assert!(first + count <= pool.number_of_queries());
    }

    fn begin_query(&mut self, pool: &Rc<GlQueryPool<G>>, index: u32, flags: QueryControlFlags) {
        debug_assert!(index < pool.number_of_queries);
        let ids = pool.ids(index);

        unsafe {
            match pool.query_type {
                QueryType::Occlusion => {
                    let target = if flags.precise {
                        gl::SAMPLES_PASSED
                    } else {
                        gl::ANY_SAMPLES_PASSED
                    };

                    self.gl.begin_query(target, ids[0]);
                    pool.active_target.set(target);
                }
                QueryType::PipelineStatistics => {
                    for (&id, &target) in ids.iter().zip(types::PIPELINE_STATISTICS_TARGETS.iter()) {
                        self.gl.begin_query(target, id);
                    }
                }
                QueryType::Timestamp => {
                    warn!("[GL] Timestamp queries are written, not begun.");
                }
            }
        }
    }

    fn end_query(&mut self, pool: &Rc<GlQueryPool<G>>, index: u32) {
        debug_assert!(index < pool.number_of_queries);

        unsafe {
            match pool.query_type {
                QueryType::Occlusion => self.gl.end_query(pool.active_target.get()),
                QueryType::PipelineStatistics => {
                    for &target in types::PIPELINE_STATISTICS_TARGETS.iter() {
                        self.gl.end_query(target);
                    }
                }
                QueryType::Timestamp => {}
            }
        }
    }

    fn write_timestamp_query(&mut self, pool: &Rc<GlQueryPool<G>>, index: u32) {
        debug_assert_eq!(pool.query_type, QueryType::Timestamp);
        debug_assert!(index < pool.number_of_queries);

        unsafe {
            self.gl.query_counter(pool.ids(index)[0], gl::TIMESTAMP);
        }
    }

    fn set_debug_marker(&mut self, name: &str) {
        if self.debug_markers {
            unsafe {
                self.gl.debug_message_insert(name);
            }
        }
    }

    fn begin_debug_event(&mut self, name: &str) {
        if self.debug_markers {
            unsafe {
                self.gl.push_debug_group(name);
            }
        }
    }

    fn end_debug_event(&mut self) {
        if self.debug_markers {
            unsafe {
                self.gl.pop_debug_group();
            }
        }
    }
}
