//! An OpenGL implementation without a GPU.
//!
//! `HeadlessGl` allocates object names, keeps the binding points, compiles "shaders" by
//! looking at their sources and records the calls which change what the GPU would do.
//! It never draws anything.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use gl;
use gl::types::*;

use super::api::GlApi;
use super::capabilities::Extensions;

/// A recorded native call.
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    UseProgram(GLuint),
    BindBufferBase {
        target: GLenum,
        index: GLuint,
        buffer: GLuint,
    },
    BindTexture {
        unit: GLuint,
        target: GLenum,
        texture: GLuint,
    },
    BindSampler {
        unit: GLuint,
        sampler: GLuint,
    },
    BindImageTexture {
        unit: GLuint,
        texture: GLuint,
    },
    BindVertexArray(GLuint),
    BindFramebuffer {
        target: GLenum,
        framebuffer: GLuint,
    },
    Uniform1i {
        program: GLuint,
        location: GLint,
        value: GLint,
    },
    Uniform1ui {
        program: GLuint,
        location: GLint,
        value: GLuint,
    },
    UniformBlockBinding {
        program: GLuint,
        index: GLuint,
        binding: GLuint,
    },
    DrawArraysInstanced {
        mode: GLenum,
        first: GLint,
        count: GLsizei,
        instances: GLsizei,
        base_instance: Option<GLuint>,
    },
    DrawElementsInstanced {
        mode: GLenum,
        count: GLsizei,
        ty: GLenum,
        offset: usize,
        instances: GLsizei,
        base_vertex: GLint,
        base_instance: Option<GLuint>,
    },
    DrawArraysIndirect {
        mode: GLenum,
        offset: usize,
    },
    DrawElementsIndirect {
        mode: GLenum,
        ty: GLenum,
        offset: usize,
    },
    MultiDrawArraysIndirect {
        mode: GLenum,
        offset: usize,
        draw_count: GLsizei,
        stride: GLsizei,
    },
    MultiDrawElementsIndirect {
        mode: GLenum,
        ty: GLenum,
        offset: usize,
        draw_count: GLsizei,
        stride: GLsizei,
    },
    DispatchCompute(GLuint, GLuint, GLuint),
    Viewport(GLint, GLint, GLsizei, GLsizei),
    Scissor(GLint, GLint, GLsizei, GLsizei),
    Enable(GLenum),
    Disable(GLenum),
    PatchParameter(GLint),
    Clear(GLbitfield),
    BeginQuery {
        target: GLenum,
        query: GLuint,
    },
    EndQuery(GLenum),
    QueryCounter(GLuint),
    DebugMessage(String),
    PushDebugGroup(String),
    PopDebugGroup,
    /// Calls nobody inspects in detail, by entry point name.
    Other(&'static str),
}

#[derive(Debug, Default)]
struct Program {
    shaders: Vec<GLuint>,
    sources: Vec<String>,
    linked: bool,
    locations: HashMap<String, GLint>,
    values: HashMap<GLint, i64>,
    block_indices: HashMap<String, GLuint>,
    block_bindings: HashMap<GLuint, GLuint>,
}

impl Program {
    fn declares(&self, name: &str) -> bool {
        !name.is_empty() && self.sources.iter().any(|v| v.contains(name))
    }
}

#[derive(Debug)]
enum Object {
    Buffer(Vec<u8>),
    Texture { target: GLenum },
    Sampler,
    Shader { source: String, compiled: bool },
    Program(Program),
    VertexArray,
    Framebuffer { attachments: usize },
    Query { polls_left: u32, result: u64 },
}

#[derive(Debug)]
struct State {
    version: String,
    extensions: Vec<String>,
    integers: HashMap<GLenum, GLint>,
    floats: HashMap<GLenum, GLfloat>,

    next_name: GLuint,
    objects: HashMap<GLuint, Object>,

    errors: Vec<GLenum>,
    program: GLuint,
    active_texture: GLuint,
    textures: HashMap<GLuint, (GLenum, GLuint)>,
    buffers: HashMap<GLenum, GLuint>,
    indexed_buffers: HashMap<(GLenum, GLuint), GLuint>,
    samplers: HashMap<GLuint, GLuint>,
    images: HashMap<GLuint, GLuint>,
    vertex_array: GLuint,
    draw_framebuffer: GLuint,
    read_framebuffer: GLuint,
    enabled: HashSet<GLenum>,

    query_latency: u32,
    query_result: u64,

    calls: Vec<GlCall>,
}

impl State {
    fn alloc(&mut self, object: Object) -> GLuint {
        let id = self.next_name;
        self.next_name += 1;
        self.objects.insert(id, object);
        id
    }

    fn error(&mut self, err: GLenum) {
        self.errors.push(err);
    }

    fn program_mut(&mut self, id: GLuint) -> Option<&mut Program> {
        match self.objects.get_mut(&id) {
            Some(Object::Program(ref mut v)) => Some(v),
            _ => None,
        }
    }

    fn buffer_mut(&mut self, id: GLuint) -> Option<&mut Vec<u8>> {
        match self.objects.get_mut(&id) {
            Some(Object::Buffer(ref mut v)) => Some(v),
            _ => None,
        }
    }

    fn bound_buffer(&self, target: GLenum) -> GLuint {
        self.buffers.get(&target).cloned().unwrap_or(0)
    }

    fn texture_target(&self, id: GLuint) -> GLenum {
        match self.objects.get(&id) {
            Some(Object::Texture { target }) => *target,
            _ => 0,
        }
    }

    fn set_buffer_data(&mut self, id: GLuint, size: usize, data: Option<&[u8]>) {
        match self.buffer_mut(id) {
            Some(buf) => {
                buf.clear();
                buf.resize(size, 0);
                if let Some(data) = data {
                    let len = data.len().min(size);
                    buf[..len].copy_from_slice(&data[..len]);
                }
            }
            None => self.error(gl::INVALID_OPERATION),
        }
    }

    fn map(&mut self, id: GLuint) -> *mut u8 {
        match self.buffer_mut(id) {
            Some(buf) => buf.as_mut_ptr(),
            None => {
                self.error(gl::INVALID_OPERATION);
                ::std::ptr::null_mut()
            }
        }
    }

    fn copy_buffer(&mut self, src: GLuint, dst: GLuint, read: usize, write: usize, size: usize) {
        let bytes = match self.objects.get(&src) {
            Some(Object::Buffer(ref v)) if read + size <= v.len() => v[read..read + size].to_vec(),
            _ => return self.error(gl::INVALID_VALUE),
        };

        match self.buffer_mut(dst) {
            Some(ref mut v) if write + size <= v.len() => {
                v[write..write + size].copy_from_slice(&bytes)
            }
            _ => self.error(gl::INVALID_VALUE),
        }
    }

    fn set_uniform(&mut self, program: GLuint, location: GLint, value: i64) {
        if location < 0 {
            return;
        }

        match self.program_mut(program) {
            Some(v) if v.linked => {
                v.values.insert(location, value);
            }
            _ => self.error(gl::INVALID_OPERATION),
        }
    }

    fn attach(&mut self, target: GLenum) {
        let fbo = if target == gl::READ_FRAMEBUFFER {
            self.read_framebuffer
        } else {
            self.draw_framebuffer
        };

        match self.objects.get_mut(&fbo) {
            Some(Object::Framebuffer { ref mut attachments }) => *attachments += 1,
            _ => self.error(gl::INVALID_OPERATION),
        }
    }

    fn reset_query(&mut self, id: GLuint) {
        let (latency, result) = (self.query_latency, self.query_result);
        match self.objects.get_mut(&id) {
            Some(Object::Query {
                ref mut polls_left,
                result: ref mut v,
            }) => {
                *polls_left = latency;
                *v = result;
            }
            _ => self.error(gl::INVALID_OPERATION),
        }
    }

    fn draw(&mut self, call: GlCall) {
        if self.program == 0 {
            self.error(gl::INVALID_OPERATION);
        }

        self.calls.push(call);
    }
}

/// An emulated OpenGL context, see the module documentation.
pub struct HeadlessGl {
    state: RefCell<State>,
}

impl Default for HeadlessGl {
    fn default() -> Self {
        HeadlessGl::new()
    }
}

impl HeadlessGl {
    /// Creates a 4.6 context which supports every extension we know about.
    pub fn new() -> Self {
        HeadlessGl::with_extensions("4.6.0 Headless", Extensions::NAMES)
    }

    /// Creates a context with the version string and the list of extensions.
    pub fn with_extensions(version: &str, extensions: &[&str]) -> Self {
        let mut integers = HashMap::new();
        integers.insert(gl::MAX_SAMPLES, 32);
        integers.insert(gl::MAX_TEXTURE_SIZE, 16384);
        integers.insert(gl::MAX_ARRAY_TEXTURE_LAYERS, 2048);
        integers.insert(gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS, 32);
        integers.insert(gl::MAX_UNIFORM_BUFFER_BINDINGS, 36);
        integers.insert(gl::MAX_UNIFORM_BLOCK_SIZE, 65536);
        integers.insert(gl::MAX_TEXTURE_BUFFER_SIZE, 128 * 1024 * 1024);
        integers.insert(gl::MAX_SHADER_STORAGE_BLOCK_SIZE, 128 * 1024 * 1024);
        integers.insert(gl::MAX_VIEWPORTS, 16);
        integers.insert(gl::MAX_DRAW_BUFFERS, 8);
        integers.insert(gl::MAX_PATCH_VERTICES, 32);
        integers.insert(gl::MAX_COLOR_ATTACHMENTS, 8);
        integers.insert(gl::CONTEXT_FLAGS, 0);

        let mut floats = HashMap::new();
        floats.insert(super::types::MAX_TEXTURE_MAX_ANISOTROPY, 16.0);

        let state = State {
            version: version.to_owned(),
            extensions: extensions.iter().map(|v| (*v).to_owned()).collect(),
            integers,
            floats,
            next_name: 1,
            objects: HashMap::new(),
            errors: Vec::new(),
            program: 0,
            active_texture: 0,
            textures: HashMap::new(),
            buffers: HashMap::new(),
            indexed_buffers: HashMap::new(),
            samplers: HashMap::new(),
            images: HashMap::new(),
            vertex_array: 0,
            draw_framebuffer: 0,
            read_framebuffer: 0,
            enabled: HashSet::new(),
            query_latency: 2,
            query_result: 0,
            calls: Vec::new(),
        };

        HeadlessGl {
            state: RefCell::new(state),
        }
    }

    /// Overrides the value reported by `glGetIntegerv`.
    pub fn set_integer(&self, pname: GLenum, value: GLint) {
        self.state.borrow_mut().integers.insert(pname, value);
    }

    pub fn set_float(&self, pname: GLenum, value: GLfloat) {
        self.state.borrow_mut().floats.insert(pname, value);
    }

    /// Sets the number of polls before the result of a query becomes available.
    pub fn set_query_latency(&self, polls: u32) {
        self.state.borrow_mut().query_latency = polls;
    }

    /// Sets the value every query reports from now on.
    pub fn set_query_result(&self, result: u64) {
        self.state.borrow_mut().query_result = result;
    }

    /// Raises an error, as if the driver had failed a call.
    pub fn push_error(&self, err: GLenum) {
        self.state.borrow_mut().errors.push(err);
    }

    pub fn calls(&self) -> Vec<GlCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn current_program(&self) -> GLuint {
        self.state.borrow().program
    }

    /// Gets the texture bound to a texture unit, if any.
    pub fn bound_texture(&self, unit: GLuint) -> Option<GLuint> {
        match self.state.borrow().textures.get(&unit) {
            Some(&(_, id)) if id != 0 => Some(id),
            _ => None,
        }
    }

    pub fn bound_sampler(&self, unit: GLuint) -> Option<GLuint> {
        match self.state.borrow().samplers.get(&unit) {
            Some(&id) if id != 0 => Some(id),
            _ => None,
        }
    }

    pub fn bound_image(&self, unit: GLuint) -> Option<GLuint> {
        match self.state.borrow().images.get(&unit) {
            Some(&id) if id != 0 => Some(id),
            _ => None,
        }
    }

    pub fn bound_buffer_base(&self, target: GLenum, index: GLuint) -> Option<GLuint> {
        match self.state.borrow().indexed_buffers.get(&(target, index)) {
            Some(&id) if id != 0 => Some(id),
            _ => None,
        }
    }

    pub fn framebuffer(&self) -> GLuint {
        self.state.borrow().draw_framebuffer
    }

    pub fn vertex_array(&self) -> GLuint {
        self.state.borrow().vertex_array
    }

    pub fn is_enabled(&self, cap: GLenum) -> bool {
        self.state.borrow().enabled.contains(&cap)
    }

    /// Gets the value of an integer uniform of a program.
    pub fn uniform(&self, program: GLuint, name: &str) -> Option<i64> {
        match self.state.borrow().objects.get(&program) {
            Some(Object::Program(ref v)) => v
                .locations
                .get(name)
                .and_then(|location| v.values.get(location))
                .cloned(),
            _ => None,
        }
    }

    /// Gets the binding point of a uniform block of a program.
    pub fn uniform_block_binding(&self, program: GLuint, name: &str) -> Option<GLuint> {
        match self.state.borrow().objects.get(&program) {
            Some(Object::Program(ref v)) => v
                .block_indices
                .get(name)
                .and_then(|index| v.block_bindings.get(index))
                .cloned(),
            _ => None,
        }
    }

    /// The number of alive native objects.
    pub fn number_of_objects(&self) -> usize {
        self.state.borrow().objects.len()
    }

    pub fn is_object(&self, id: GLuint) -> bool {
        self.state.borrow().objects.contains_key(&id)
    }

    pub fn buffer_data(&self, id: GLuint) -> Option<Vec<u8>> {
        match self.state.borrow().objects.get(&id) {
            Some(Object::Buffer(ref v)) => Some(v.clone()),
            _ => None,
        }
    }

    fn record(&self, call: GlCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl GlApi for HeadlessGl {
    unsafe fn get_error(&self) -> GLenum {
        let mut state = self.state.borrow_mut();
        if state.errors.is_empty() {
            gl::NO_ERROR
        } else {
            state.errors.remove(0)
        }
    }

    unsafe fn get_string(&self, name: GLenum) -> Option<String> {
        let state = self.state.borrow();
        match name {
            gl::VERSION => Some(state.version.clone()),
            gl::VENDOR => Some("crayon".into()),
            gl::RENDERER => Some("Headless".into()),
            gl::SHADING_LANGUAGE_VERSION => Some("4.60".into()),
            gl::EXTENSIONS => Some(state.extensions.join(" ")),
            _ => None,
        }
    }

    unsafe fn get_string_i(&self, name: GLenum, index: GLuint) -> Option<String> {
        if name != gl::EXTENSIONS {
            return None;
        }

        self.state.borrow().extensions.get(index as usize).cloned()
    }

    unsafe fn get_integer(&self, pname: GLenum) -> GLint {
        let state = self.state.borrow();
        match pname {
            gl::NUM_EXTENSIONS => state.extensions.len() as GLint,
            gl::CURRENT_PROGRAM => state.program as GLint,
            gl::FRAMEBUFFER_BINDING => state.draw_framebuffer as GLint,
            gl::READ_FRAMEBUFFER_BINDING => state.read_framebuffer as GLint,
            gl::VERTEX_ARRAY_BINDING => state.vertex_array as GLint,
            gl::ACTIVE_TEXTURE => (gl::TEXTURE0 + state.active_texture) as GLint,
            gl::TEXTURE_BINDING_1D
            | gl::TEXTURE_BINDING_1D_ARRAY
            | gl::TEXTURE_BINDING_2D
            | gl::TEXTURE_BINDING_2D_ARRAY
            | gl::TEXTURE_BINDING_2D_MULTISAMPLE
            | gl::TEXTURE_BINDING_3D
            | gl::TEXTURE_BINDING_CUBE_MAP
            | gl::TEXTURE_BINDING_CUBE_MAP_ARRAY
            | gl::TEXTURE_BINDING_BUFFER => match state.textures.get(&state.active_texture) {
                Some(&(target, id)) if super::types::texture_binding(target) == pname => {
                    id as GLint
                }
                _ => 0,
            },
            _ => state.integers.get(&pname).cloned().unwrap_or(0),
        }
    }

    unsafe fn get_float(&self, pname: GLenum) -> GLfloat {
        self.state.borrow().floats.get(&pname).cloned().unwrap_or(0.0)
    }

    unsafe fn enable(&self, cap: GLenum) {
        let mut state = self.state.borrow_mut();
        state.enabled.insert(cap);
        state.calls.push(GlCall::Enable(cap));
    }

    unsafe fn disable(&self, cap: GLenum) {
        let mut state = self.state.borrow_mut();
        state.enabled.remove(&cap);
        state.calls.push(GlCall::Disable(cap));
    }

    unsafe fn gen_buffer(&self) -> GLuint {
        self.state.borrow_mut().alloc(Object::Buffer(Vec::new()))
    }

    unsafe fn create_buffer(&self) -> GLuint {
        self.gen_buffer()
    }

    unsafe fn delete_buffer(&self, id: GLuint) {
        let mut state = self.state.borrow_mut();
        state.objects.remove(&id);
        state.buffers.retain(|_, v| *v != id);
        state.indexed_buffers.retain(|_, v| *v != id);
    }

    unsafe fn bind_buffer(&self, target: GLenum, id: GLuint) {
        self.state.borrow_mut().buffers.insert(target, id);
    }

    unsafe fn bind_buffer_base(&self, target: GLenum, index: GLuint, id: GLuint) {
        let mut state = self.state.borrow_mut();
        state.buffers.insert(target, id);
        state.indexed_buffers.insert((target, index), id);
        state.calls.push(GlCall::BindBufferBase {
            target,
            index,
            buffer: id,
        });
    }

    unsafe fn buffer_data(&self, target: GLenum, size: usize, data: Option<&[u8]>, _: GLenum) {
        let mut state = self.state.borrow_mut();
        let id = state.bound_buffer(target);
        state.set_buffer_data(id, size, data);
    }

    unsafe fn named_buffer_data(&self, id: GLuint, size: usize, data: Option<&[u8]>, _: GLenum) {
        self.state.borrow_mut().set_buffer_data(id, size, data);
    }

    unsafe fn map_buffer(&self, target: GLenum, _: GLenum) -> *mut u8 {
        let mut state = self.state.borrow_mut();
        let id = state.bound_buffer(target);
        state.map(id)
    }

    unsafe fn map_named_buffer(&self, id: GLuint, _: GLenum) -> *mut u8 {
        self.state.borrow_mut().map(id)
    }

    unsafe fn unmap_buffer(&self, _: GLenum) -> bool {
        true
    }

    unsafe fn unmap_named_buffer(&self, _: GLuint) -> bool {
        true
    }

    unsafe fn copy_buffer_sub_data(
        &self,
        read_target: GLenum,
        write_target: GLenum,
        read_offset: usize,
        write_offset: usize,
        size: usize,
    ) {
        let mut state = self.state.borrow_mut();
        let src = state.bound_buffer(read_target);
        let dst = state.bound_buffer(write_target);
        state.copy_buffer(src, dst, read_offset, write_offset, size);
    }

    unsafe fn copy_named_buffer_sub_data(
        &self,
        src: GLuint,
        dst: GLuint,
        read_offset: usize,
        write_offset: usize,
        size: usize,
    ) {
        self.state
            .borrow_mut()
            .copy_buffer(src, dst, read_offset, write_offset, size);
    }

    unsafe fn gen_texture(&self) -> GLuint {
        self.state.borrow_mut().alloc(Object::Texture { target: 0 })
    }

    unsafe fn create_texture(&self, target: GLenum) -> GLuint {
        self.state.borrow_mut().alloc(Object::Texture { target })
    }

    unsafe fn delete_texture(&self, id: GLuint) {
        let mut state = self.state.borrow_mut();
        state.objects.remove(&id);
        for v in state.textures.values_mut() {
            if v.1 == id {
                v.1 = 0;
            }
        }
        state.images.retain(|_, v| *v != id);
    }

    unsafe fn active_texture(&self, unit: GLenum) {
        self.state.borrow_mut().active_texture = unit - gl::TEXTURE0;
    }

    unsafe fn bind_texture(&self, target: GLenum, id: GLuint) {
        let mut state = self.state.borrow_mut();
        if let Some(Object::Texture { target: ref mut v }) = state.objects.get_mut(&id) {
            if *v == 0 {
                *v = target;
            }
        }

        let unit = state.active_texture;
        state.textures.insert(unit, (target, id));
        state.calls.push(GlCall::BindTexture {
            unit,
            target,
            texture: id,
        });
    }

    unsafe fn bind_texture_unit(&self, unit: GLuint, id: GLuint) {
        let mut state = self.state.borrow_mut();
        let target = state.texture_target(id);
        state.textures.insert(unit, (target, id));
        state.calls.push(GlCall::BindTexture {
            unit,
            target,
            texture: id,
        });
    }

    unsafe fn tex_image_1d(&self, _: GLenum, _: GLint, _: GLenum, _: GLsizei, _: GLenum, _: GLenum, _: Option<&[u8]>) {
        self.record(GlCall::Other("glTexImage1D"));
    }

    unsafe fn tex_image_2d(
        &self,
        _: GLenum,
        _: GLint,
        _: GLenum,
        _: GLsizei,
        _: GLsizei,
        _: GLenum,
        _: GLenum,
        _: Option<&[u8]>,
    ) {
        self.record(GlCall::Other("glTexImage2D"));
    }

    unsafe fn tex_image_3d(
        &self,
        _: GLenum,
        _: GLint,
        _: GLenum,
        _: GLsizei,
        _: GLsizei,
        _: GLsizei,
        _: GLenum,
        _: GLenum,
        _: Option<&[u8]>,
    ) {
        self.record(GlCall::Other("glTexImage3D"));
    }

    unsafe fn compressed_tex_image_2d(&self, _: GLenum, _: GLint, _: GLenum, _: GLsizei, _: GLsizei, _: &[u8]) {
        self.record(GlCall::Other("glCompressedTexImage2D"));
    }

    unsafe fn tex_image_2d_multisample(&self, _: GLenum, _: GLsizei, _: GLenum, _: GLsizei, _: GLsizei) {
        self.record(GlCall::Other("glTexImage2DMultisample"));
    }

    unsafe fn texture_storage_1d(&self, _: GLuint, _: GLsizei, _: GLenum, _: GLsizei) {
        self.record(GlCall::Other("glTextureStorage1D"));
    }

    unsafe fn texture_storage_2d(&self, _: GLuint, _: GLsizei, _: GLenum, _: GLsizei, _: GLsizei) {
        self.record(GlCall::Other("glTextureStorage2D"));
    }

    unsafe fn texture_storage_3d(&self, _: GLuint, _: GLsizei, _: GLenum, _: GLsizei, _: GLsizei, _: GLsizei) {
        self.record(GlCall::Other("glTextureStorage3D"));
    }

    unsafe fn texture_storage_2d_multisample(&self, _: GLuint, _: GLsizei, _: GLenum, _: GLsizei, _: GLsizei) {
        self.record(GlCall::Other("glTextureStorage2DMultisample"));
    }

    unsafe fn texture_sub_image_1d(&self, _: GLuint, _: GLint, _: GLsizei, _: GLenum, _: GLenum, _: &[u8]) {
        self.record(GlCall::Other("glTextureSubImage1D"));
    }

    unsafe fn texture_sub_image_2d(
        &self,
        _: GLuint,
        _: GLint,
        _: GLsizei,
        _: GLsizei,
        _: GLenum,
        _: GLenum,
        _: &[u8],
    ) {
        self.record(GlCall::Other("glTextureSubImage2D"));
    }

    unsafe fn texture_sub_image_3d(
        &self,
        _: GLuint,
        _: GLint,
        _: GLint,
        _: GLsizei,
        _: GLsizei,
        _: GLsizei,
        _: GLenum,
        _: GLenum,
        _: &[u8],
    ) {
        self.record(GlCall::Other("glTextureSubImage3D"));
    }

    unsafe fn compressed_texture_sub_image_2d(
        &self,
        _: GLuint,
        _: GLint,
        _: GLsizei,
        _: GLsizei,
        _: GLenum,
        _: &[u8],
    ) {
        self.record(GlCall::Other("glCompressedTextureSubImage2D"));
    }

    unsafe fn tex_buffer(&self, _: GLenum, _: GLenum, _: GLuint) {
        self.record(GlCall::Other("glTexBuffer"));
    }

    unsafe fn texture_buffer(&self, _: GLuint, _: GLenum, _: GLuint) {
        self.record(GlCall::Other("glTextureBuffer"));
    }

    unsafe fn tex_parameter_i(&self, _: GLenum, _: GLenum, _: GLint) {
        self.record(GlCall::Other("glTexParameteri"));
    }

    unsafe fn texture_parameter_i(&self, _: GLuint, _: GLenum, _: GLint) {
        self.record(GlCall::Other("glTextureParameteri"));
    }

    unsafe fn tex_parameter_f(&self, _: GLenum, _: GLenum, _: GLfloat) {
        self.record(GlCall::Other("glTexParameterf"));
    }

    unsafe fn texture_parameter_f(&self, _: GLuint, _: GLenum, _: GLfloat) {
        self.record(GlCall::Other("glTextureParameterf"));
    }

    unsafe fn generate_mipmap(&self, _: GLenum) {
        self.record(GlCall::Other("glGenerateMipmap"));
    }

    unsafe fn generate_texture_mipmap(&self, _: GLuint) {
        self.record(GlCall::Other("glGenerateTextureMipmap"));
    }

    unsafe fn bind_image_texture(&self, unit: GLuint, id: GLuint, _: GLint, _: bool, _: GLenum, _: GLenum) {
        let mut state = self.state.borrow_mut();
        state.images.insert(unit, id);
        state.calls.push(GlCall::BindImageTexture { unit, texture: id });
    }

    unsafe fn copy_image_sub_data(
        &self,
        _: GLuint,
        _: GLenum,
        _: GLuint,
        _: GLenum,
        _: GLsizei,
        _: GLsizei,
        _: GLsizei,
    ) {
        self.record(GlCall::Other("glCopyImageSubData"));
    }

    unsafe fn gen_sampler(&self) -> GLuint {
        self.state.borrow_mut().alloc(Object::Sampler)
    }

    unsafe fn delete_sampler(&self, id: GLuint) {
        let mut state = self.state.borrow_mut();
        state.objects.remove(&id);
        state.samplers.retain(|_, v| *v != id);
    }

    unsafe fn sampler_parameter_i(&self, _: GLuint, _: GLenum, _: GLint) {
        self.record(GlCall::Other("glSamplerParameteri"));
    }

    unsafe fn sampler_parameter_f(&self, _: GLuint, _: GLenum, _: GLfloat) {
        self.record(GlCall::Other("glSamplerParameterf"));
    }

    unsafe fn sampler_parameter_fv(&self, _: GLuint, _: GLenum, _: &[GLfloat; 4]) {
        self.record(GlCall::Other("glSamplerParameterfv"));
    }

    unsafe fn bind_sampler(&self, unit: GLuint, id: GLuint) {
        let mut state = self.state.borrow_mut();
        state.samplers.insert(unit, id);
        state.calls.push(GlCall::BindSampler { unit, sampler: id });
    }

    unsafe fn create_shader(&self, _: GLenum) -> GLuint {
        self.state.borrow_mut().alloc(Object::Shader {
            source: String::new(),
            compiled: false,
        })
    }

    unsafe fn shader_source(&self, id: GLuint, src: &str) {
        let mut state = self.state.borrow_mut();
        match state.objects.get_mut(&id) {
            Some(Object::Shader { ref mut source, .. }) => *source = src.to_owned(),
            _ => state.error(gl::INVALID_VALUE),
        }
    }

    unsafe fn compile_shader(&self, id: GLuint) {
        let mut state = self.state.borrow_mut();
        match state.objects.get_mut(&id) {
            Some(Object::Shader {
                ref source,
                ref mut compiled,
            }) => *compiled = !source.trim().is_empty() && !source.contains("#error"),
            _ => state.error(gl::INVALID_VALUE),
        }
    }

    unsafe fn get_shader_iv(&self, id: GLuint, pname: GLenum) -> GLint {
        let compiled = match self.state.borrow().objects.get(&id) {
            Some(Object::Shader { compiled, .. }) => *compiled,
            _ => false,
        };

        match pname {
            gl::COMPILE_STATUS => compiled as GLint,
            gl::INFO_LOG_LENGTH => self.get_shader_info_log(id).len() as GLint,
            _ => 0,
        }
    }

    unsafe fn get_shader_info_log(&self, id: GLuint) -> String {
        match self.state.borrow().objects.get(&id) {
            Some(Object::Shader { compiled: false, .. }) => {
                "0(1) : error C0000: syntax error, unexpected end of file".into()
            }
            _ => String::new(),
        }
    }

    unsafe fn delete_shader(&self, id: GLuint) {
        self.state.borrow_mut().objects.remove(&id);
    }

    unsafe fn create_program(&self) -> GLuint {
        self.state
            .borrow_mut()
            .alloc(Object::Program(Program::default()))
    }

    unsafe fn attach_shader(&self, program: GLuint, shader: GLuint) {
        let mut state = self.state.borrow_mut();
        match state.program_mut(program) {
            Some(v) => v.shaders.push(shader),
            None => state.error(gl::INVALID_VALUE),
        }
    }

    unsafe fn detach_shader(&self, program: GLuint, shader: GLuint) {
        if let Some(v) = self.state.borrow_mut().program_mut(program) {
            v.shaders.retain(|v| *v != shader);
        }
    }

    unsafe fn bind_attrib_location(&self, _: GLuint, _: GLuint, _: &str) {
        self.record(GlCall::Other("glBindAttribLocation"));
    }

    unsafe fn link_program(&self, program: GLuint) {
        let mut state = self.state.borrow_mut();

        let shaders = match state.objects.get(&program) {
            Some(Object::Program(ref v)) => v.shaders.clone(),
            _ => return state.error(gl::INVALID_VALUE),
        };

        let mut sources = Vec::new();
        let mut linked = !shaders.is_empty();
        for id in shaders {
            match state.objects.get(&id) {
                Some(Object::Shader {
                    ref source,
                    compiled: true,
                }) => sources.push(source.clone()),
                _ => linked = false,
            }
        }

        if let Some(v) = state.program_mut(program) {
            v.linked = linked;
            v.sources = sources;
        }
    }

    unsafe fn get_program_iv(&self, program: GLuint, pname: GLenum) -> GLint {
        let linked = match self.state.borrow().objects.get(&program) {
            Some(Object::Program(ref v)) => v.linked,
            _ => false,
        };

        match pname {
            gl::LINK_STATUS => linked as GLint,
            gl::INFO_LOG_LENGTH => self.get_program_info_log(program).len() as GLint,
            _ => 0,
        }
    }

    unsafe fn get_program_info_log(&self, program: GLuint) -> String {
        match self.state.borrow().objects.get(&program) {
            Some(Object::Program(ref v)) if !v.linked => {
                "error: linking with uncompiled shader".into()
            }
            _ => String::new(),
        }
    }

    unsafe fn delete_program(&self, program: GLuint) {
        self.state.borrow_mut().objects.remove(&program);
    }

    unsafe fn use_program(&self, program: GLuint) {
        let mut state = self.state.borrow_mut();
        let valid = program == 0 || state.program_mut(program).map_or(false, |v| v.linked);
        if valid {
            state.program = program;
        } else {
            state.error(gl::INVALID_OPERATION);
        }

        state.calls.push(GlCall::UseProgram(program));
    }

    unsafe fn get_uniform_location(&self, program: GLuint, name: &str) -> GLint {
        let mut state = self.state.borrow_mut();
        match state.program_mut(program) {
            Some(v) if v.linked && v.declares(name) => {
                let next = v.locations.len() as GLint;
                *v.locations.entry(name.to_owned()).or_insert(next)
            }
            _ => -1,
        }
    }

    unsafe fn get_uniform_block_index(&self, program: GLuint, name: &str) -> GLuint {
        let mut state = self.state.borrow_mut();
        match state.program_mut(program) {
            Some(v) if v.linked && v.declares(name) => {
                let next = v.block_indices.len() as GLuint;
                *v.block_indices.entry(name.to_owned()).or_insert(next)
            }
            _ => gl::INVALID_INDEX,
        }
    }

    unsafe fn uniform_block_binding(&self, program: GLuint, index: GLuint, binding: GLuint) {
        let mut state = self.state.borrow_mut();
        match state.program_mut(program) {
            Some(v) => {
                v.block_bindings.insert(index, binding);
            }
            None => state.error(gl::INVALID_VALUE),
        }

        state.calls.push(GlCall::UniformBlockBinding {
            program,
            index,
            binding,
        });
    }

    unsafe fn uniform_1i(&self, location: GLint, value: GLint) {
        let mut state = self.state.borrow_mut();
        let program = state.program;
        state.set_uniform(program, location, i64::from(value));
        state.calls.push(GlCall::Uniform1i {
            program,
            location,
            value,
        });
    }

    unsafe fn uniform_1ui(&self, location: GLint, value: GLuint) {
        let mut state = self.state.borrow_mut();
        let program = state.program;
        state.set_uniform(program, location, i64::from(value));
        state.calls.push(GlCall::Uniform1ui {
            program,
            location,
            value,
        });
    }

    unsafe fn program_uniform_1i(&self, program: GLuint, location: GLint, value: GLint) {
        let mut state = self.state.borrow_mut();
        state.set_uniform(program, location, i64::from(value));
        state.calls.push(GlCall::Uniform1i {
            program,
            location,
            value,
        });
    }

    unsafe fn program_uniform_1ui(&self, program: GLuint, location: GLint, value: GLuint) {
        let mut state = self.state.borrow_mut();
        state.set_uniform(program, location, i64::from(value));
        state.calls.push(GlCall::Uniform1ui {
            program,
            location,
            value,
        });
    }

    unsafe fn gen_vertex_array(&self) -> GLuint {
        self.state.borrow_mut().alloc(Object::VertexArray)
    }

    unsafe fn delete_vertex_array(&self, id: GLuint) {
        let mut state = self.state.borrow_mut();
        state.objects.remove(&id);
        if state.vertex_array == id {
            state.vertex_array = 0;
        }
    }

    unsafe fn bind_vertex_array(&self, id: GLuint) {
        let mut state = self.state.borrow_mut();
        state.vertex_array = id;
        state.calls.push(GlCall::BindVertexArray(id));
    }

    unsafe fn enable_vertex_attrib_array(&self, _: GLuint) {
        self.record(GlCall::Other("glEnableVertexAttribArray"));
    }

    unsafe fn vertex_attrib_pointer(&self, _: GLuint, _: GLint, _: GLenum, _: bool, _: GLsizei, _: usize) {
        self.record(GlCall::Other("glVertexAttribPointer"));
    }

    unsafe fn vertex_attrib_i_pointer(&self, _: GLuint, _: GLint, _: GLenum, _: GLsizei, _: usize) {
        self.record(GlCall::Other("glVertexAttribIPointer"));
    }

    unsafe fn vertex_attrib_divisor(&self, _: GLuint, _: GLuint) {
        self.record(GlCall::Other("glVertexAttribDivisor"));
    }

    unsafe fn gen_framebuffer(&self) -> GLuint {
        self.state
            .borrow_mut()
            .alloc(Object::Framebuffer { attachments: 0 })
    }

    unsafe fn delete_framebuffer(&self, id: GLuint) {
        let mut state = self.state.borrow_mut();
        state.objects.remove(&id);
        if state.draw_framebuffer == id {
            state.draw_framebuffer = 0;
        }
        if state.read_framebuffer == id {
            state.read_framebuffer = 0;
        }
    }

    unsafe fn bind_framebuffer(&self, target: GLenum, id: GLuint) {
        let mut state = self.state.borrow_mut();
        match target {
            gl::READ_FRAMEBUFFER => state.read_framebuffer = id,
            gl::DRAW_FRAMEBUFFER => state.draw_framebuffer = id,
            _ => {
                state.read_framebuffer = id;
                state.draw_framebuffer = id;
            }
        }

        state.calls.push(GlCall::BindFramebuffer {
            target,
            framebuffer: id,
        });
    }

    unsafe fn framebuffer_texture_2d(&self, target: GLenum, _: GLenum, _: GLenum, _: GLuint, _: GLint) {
        self.state.borrow_mut().attach(target);
    }

    unsafe fn framebuffer_texture_layer(&self, target: GLenum, _: GLenum, _: GLuint, _: GLint, _: GLint) {
        self.state.borrow_mut().attach(target);
    }

    unsafe fn check_framebuffer_status(&self, target: GLenum) -> GLenum {
        let state = self.state.borrow();
        let fbo = if target == gl::READ_FRAMEBUFFER {
            state.read_framebuffer
        } else {
            state.draw_framebuffer
        };

        match state.objects.get(&fbo) {
            Some(Object::Framebuffer { attachments: 0 }) => {
                gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT
            }
            _ => gl::FRAMEBUFFER_COMPLETE,
        }
    }

    unsafe fn draw_buffers(&self, _: &[GLenum]) {
        self.record(GlCall::Other("glDrawBuffers"));
    }

    unsafe fn blit_framebuffer(&self, _: [GLint; 4], _: [GLint; 4], _: GLbitfield, _: GLenum) {
        self.record(GlCall::Other("glBlitFramebuffer"));
    }

    unsafe fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        self.record(GlCall::Viewport(x, y, width, height));
    }

    unsafe fn depth_range(&self, _: f64, _: f64) {
        self.record(GlCall::Other("glDepthRange"));
    }

    unsafe fn scissor(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        self.record(GlCall::Scissor(x, y, width, height));
    }

    unsafe fn cull_face(&self, _: GLenum) {
        self.record(GlCall::Other("glCullFace"));
    }

    unsafe fn front_face(&self, _: GLenum) {
        self.record(GlCall::Other("glFrontFace"));
    }

    unsafe fn polygon_mode(&self, _: GLenum, _: GLenum) {
        self.record(GlCall::Other("glPolygonMode"));
    }

    unsafe fn polygon_offset(&self, _: GLfloat, _: GLfloat) {
        self.record(GlCall::Other("glPolygonOffset"));
    }

    unsafe fn depth_mask(&self, _: bool) {
        self.record(GlCall::Other("glDepthMask"));
    }

    unsafe fn depth_func(&self, _: GLenum) {
        self.record(GlCall::Other("glDepthFunc"));
    }

    unsafe fn stencil_mask(&self, _: GLuint) {
        self.record(GlCall::Other("glStencilMask"));
    }

    unsafe fn blend_func_separate(&self, _: GLenum, _: GLenum, _: GLenum, _: GLenum) {
        self.record(GlCall::Other("glBlendFuncSeparate"));
    }

    unsafe fn blend_equation_separate(&self, _: GLenum, _: GLenum) {
        self.record(GlCall::Other("glBlendEquationSeparate"));
    }

    unsafe fn color_mask(&self, _: bool, _: bool, _: bool, _: bool) {
        self.record(GlCall::Other("glColorMask"));
    }

    unsafe fn patch_parameter_i(&self, _: GLenum, value: GLint) {
        self.record(GlCall::PatchParameter(value));
    }

    unsafe fn clear_color(&self, _: GLfloat, _: GLfloat, _: GLfloat, _: GLfloat) {
        self.record(GlCall::Other("glClearColor"));
    }

    unsafe fn clear_depth(&self, _: f64) {
        self.record(GlCall::Other("glClearDepth"));
    }

    unsafe fn clear_stencil(&self, _: GLint) {
        self.record(GlCall::Other("glClearStencil"));
    }

    unsafe fn clear(&self, mask: GLbitfield) {
        self.record(GlCall::Clear(mask));
    }

    unsafe fn draw_arrays_instanced(&self, mode: GLenum, first: GLint, count: GLsizei, instances: GLsizei) {
        self.state.borrow_mut().draw(GlCall::DrawArraysInstanced {
            mode,
            first,
            count,
            instances,
            base_instance: None,
        });
    }

    unsafe fn draw_arrays_instanced_base_instance(
        &self,
        mode: GLenum,
        first: GLint,
        count: GLsizei,
        instances: GLsizei,
        base_instance: GLuint,
    ) {
        self.state.borrow_mut().draw(GlCall::DrawArraysInstanced {
            mode,
            first,
            count,
            instances,
            base_instance: Some(base_instance),
        });
    }

    unsafe fn draw_elements_instanced_base_vertex(
        &self,
        mode: GLenum,
        count: GLsizei,
        ty: GLenum,
        offset: usize,
        instances: GLsizei,
        base_vertex: GLint,
    ) {
        self.state.borrow_mut().draw(GlCall::DrawElementsInstanced {
            mode,
            count,
            ty,
            offset,
            instances,
            base_vertex,
            base_instance: None,
        });
    }

    unsafe fn draw_elements_instanced_base_vertex_base_instance(
        &self,
        mode: GLenum,
        count: GLsizei,
        ty: GLenum,
        offset: usize,
        instances: GLsizei,
        base_vertex: GLint,
        base_instance: GLuint,
    ) {
        self.state.borrow_mut().draw(GlCall::DrawElementsInstanced {
            mode,
            count,
            ty,
            offset,
            instances,
            base_vertex,
            base_instance: Some(base_instance),
        });
    }

    unsafe fn draw_arrays_indirect(&self, mode: GLenum, offset: usize) {
        self.state
            .borrow_mut()
            .draw(GlCall::DrawArraysIndirect { mode, offset });
    }

    unsafe fn draw_elements_indirect(&self, mode: GLenum, ty: GLenum, offset: usize) {
        self.state
            .borrow_mut()
            .draw(GlCall::DrawElementsIndirect { mode, ty, offset });
    }

    unsafe fn multi_draw_arrays_indirect(&self, mode: GLenum, offset: usize, draw_count: GLsizei, stride: GLsizei) {
        self.state.borrow_mut().draw(GlCall::MultiDrawArraysIndirect {
            mode,
            offset,
            draw_count,
            stride,
        });
    }

    unsafe fn multi_draw_elements_indirect(
        &self,
        mode: GLenum,
        ty: GLenum,
        offset: usize,
        draw_count: GLsizei,
        stride: GLsizei,
    ) {
        self.state.borrow_mut().draw(GlCall::MultiDrawElementsIndirect {
            mode,
            ty,
            offset,
            draw_count,
            stride,
        });
    }

    unsafe fn dispatch_compute(&self, x: GLuint, y: GLuint, z: GLuint) {
        self.state.borrow_mut().draw(GlCall::DispatchCompute(x, y, z));
    }

    unsafe fn memory_barrier(&self, _: GLbitfield) {
        self.record(GlCall::Other("glMemoryBarrier"));
    }

    unsafe fn gen_query(&self) -> GLuint {
        let mut state = self.state.borrow_mut();
        let (polls_left, result) = (state.query_latency, state.query_result);
        state.alloc(Object::Query { polls_left, result })
    }

    unsafe fn delete_query(&self, id: GLuint) {
        self.state.borrow_mut().objects.remove(&id);
    }

    unsafe fn begin_query(&self, target: GLenum, id: GLuint) {
        let mut state = self.state.borrow_mut();
        state.reset_query(id);
        state.calls.push(GlCall::BeginQuery { target, query: id });
    }

    unsafe fn end_query(&self, target: GLenum) {
        self.record(GlCall::EndQuery(target));
    }

    unsafe fn query_counter(&self, id: GLuint, _: GLenum) {
        let mut state = self.state.borrow_mut();
        state.reset_query(id);
        state.calls.push(GlCall::QueryCounter(id));
    }

    unsafe fn get_query_object_u32(&self, id: GLuint, pname: GLenum) -> GLuint {
        let mut state = self.state.borrow_mut();
        match state.objects.get_mut(&id) {
            Some(Object::Query {
                ref mut polls_left,
                result,
            }) => {
                if pname == gl::QUERY_RESULT_AVAILABLE {
                    if *polls_left > 0 {
                        *polls_left -= 1;
                    }

                    (*polls_left == 0) as GLuint
                } else {
                    *result as GLuint
                }
            }
            _ => {
                state.error(gl::INVALID_OPERATION);
                0
            }
        }
    }

    unsafe fn get_query_object_u64(&self, id: GLuint, _: GLenum) -> u64 {
        let mut state = self.state.borrow_mut();
        match state.objects.get(&id) {
            Some(Object::Query { result, .. }) => *result,
            _ => {
                state.error(gl::INVALID_OPERATION);
                0
            }
        }
    }

    unsafe fn debug_message_insert(&self, message: &str) {
        self.record(GlCall::DebugMessage(message.to_owned()));
    }

    unsafe fn push_debug_group(&self, message: &str) {
        self.record(GlCall::PushDebugGroup(message.to_owned()));
    }

    unsafe fn pop_debug_group(&self) {
        self.record(GlCall::PopDebugGroup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link() {
        let gl = HeadlessGl::new();
        unsafe {
            let vs = gl.create_shader(gl::VERTEX_SHADER);
            gl.shader_source(vs, "uniform sampler2D Albedo;");
            gl.compile_shader(vs);
            assert_eq!(gl.get_shader_iv(vs, gl::COMPILE_STATUS), 1);

            let broken = gl.create_shader(gl::FRAGMENT_SHADER);
            gl.shader_source(broken, "#error");
            gl.compile_shader(broken);
            assert_eq!(gl.get_shader_iv(broken, gl::COMPILE_STATUS), 0);
            assert!(!gl.get_shader_info_log(broken).is_empty());

            let program = gl.create_program();
            gl.attach_shader(program, vs);
            gl.link_program(program);
            assert_eq!(gl.get_program_iv(program, gl::LINK_STATUS), 1);
            assert_eq!(gl.get_uniform_location(program, "Albedo"), 0);
            assert_eq!(gl.get_uniform_location(program, "Missing"), -1);

            gl.program_uniform_1i(program, 0, 3);
            assert_eq!(gl.uniform(program, "Albedo"), Some(3));
        }
    }

    #[test]
    fn queries() {
        let gl = HeadlessGl::new();
        gl.set_query_latency(2);
        gl.set_query_result(42);

        unsafe {
            let id = gl.gen_query();
            gl.begin_query(gl::SAMPLES_PASSED, id);
            gl.end_query(gl::SAMPLES_PASSED);
            assert_eq!(gl.get_query_object_u32(id, gl::QUERY_RESULT_AVAILABLE), 0);
            assert_eq!(gl.get_query_object_u32(id, gl::QUERY_RESULT_AVAILABLE), 1);
            assert_eq!(gl.get_query_object_u64(id, gl::QUERY_RESULT), 42);
        }
    }

    #[test]
    fn errors() {
        let gl = HeadlessGl::new();
        unsafe {
            assert_eq!(gl.get_error(), gl::NO_ERROR);
            gl.use_program(42);
            assert_eq!(gl.get_error(), gl::INVALID_OPERATION);
            assert_eq!(gl.get_error(), gl::NO_ERROR);
        }
    }
}
