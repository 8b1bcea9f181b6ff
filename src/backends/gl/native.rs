//! Forwards `GlApi` to the driver through the function table of the `gl` crate.

use std::ffi::{CStr, CString};
use std::os::raw::c_void;
use std::ptr;

use gl;
use gl::types::*;

use super::api::GlApi;

/// The OpenGL functions of the context which is current on this thread.
///
/// The function table itself is process-wide (that is how the `gl` crate loads it), but
/// it is only ever reached through a `NativeGl` value owned by a device.
#[derive(Debug)]
pub struct NativeGl {
    _private: (),
}

impl NativeGl {
    /// Loads the OpenGL functions with `loader`.
    ///
    /// # Safety
    ///
    /// The context the functions are loaded from must be current on this thread for as long
    /// as the returned value is used.
    pub unsafe fn load_with<F>(loader: F) -> Self
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);
        NativeGl { _private: () }
    }
}

#[inline]
fn c_string(v: &str) -> CString {
    CString::new(v.as_bytes()).unwrap_or_default()
}

#[inline]
fn data_ptr(data: Option<&[u8]>) -> *const c_void {
    match data {
        Some(v) if !v.is_empty() => v.as_ptr() as *const c_void,
        _ => ptr::null(),
    }
}

#[inline]
fn gl_bool(v: bool) -> GLboolean {
    if v {
        gl::TRUE
    } else {
        gl::FALSE
    }
}

unsafe fn from_gl_string(s: *const GLubyte) -> Option<String> {
    if s.is_null() {
        None
    } else {
        Some(
            CStr::from_ptr(s as *const _)
                .to_string_lossy()
                .into_owned(),
        )
    }
}

impl GlApi for NativeGl {
    unsafe fn get_error(&self) -> GLenum {
        gl::GetError()
    }

    unsafe fn get_string(&self, name: GLenum) -> Option<String> {
        from_gl_string(gl::GetString(name))
    }

    unsafe fn get_string_i(&self, name: GLenum, index: GLuint) -> Option<String> {
        from_gl_string(gl::GetStringi(name, index))
    }

    unsafe fn get_integer(&self, pname: GLenum) -> GLint {
        let mut v = 0;
        gl::GetIntegerv(pname, &mut v);
        v
    }

    unsafe fn get_float(&self, pname: GLenum) -> GLfloat {
        let mut v = 0.0;
        gl::GetFloatv(pname, &mut v);
        v
    }

    unsafe fn enable(&self, cap: GLenum) {
        gl::Enable(cap);
    }

    unsafe fn disable(&self, cap: GLenum) {
        gl::Disable(cap);
    }

    unsafe fn gen_buffer(&self) -> GLuint {
        let mut id = 0;
        gl::GenBuffers(1, &mut id);
        id
    }

    unsafe fn create_buffer(&self) -> GLuint {
        let mut id = 0;
        gl::CreateBuffers(1, &mut id);
        id
    }

    unsafe fn delete_buffer(&self, id: GLuint) {
        gl::DeleteBuffers(1, &id);
    }

    unsafe fn bind_buffer(&self, target: GLenum, id: GLuint) {
        gl::BindBuffer(target, id);
    }

    unsafe fn bind_buffer_base(&self, target: GLenum, index: GLuint, id: GLuint) {
        gl::BindBufferBase(target, index, id);
    }

    unsafe fn buffer_data(&self, target: GLenum, size: usize, data: Option<&[u8]>, usage: GLenum) {
        gl::BufferData(target, size as GLsizeiptr, data_ptr(data), usage);
    }

    unsafe fn named_buffer_data(&self, id: GLuint, size: usize, data: Option<&[u8]>, usage: GLenum) {
        gl::NamedBufferData(id, size as GLsizeiptr, data_ptr(data), usage);
    }

    unsafe fn map_buffer(&self, target: GLenum, access: GLenum) -> *mut u8 {
        gl::MapBuffer(target, access) as *mut u8
    }

    unsafe fn map_named_buffer(&self, id: GLuint, access: GLenum) -> *mut u8 {
        gl::MapNamedBuffer(id, access) as *mut u8
    }

    unsafe fn unmap_buffer(&self, target: GLenum) -> bool {
        gl::UnmapBuffer(target) == gl::TRUE
    }

    unsafe fn unmap_named_buffer(&self, id: GLuint) -> bool {
        gl::UnmapNamedBuffer(id) == gl::TRUE
    }

    unsafe fn copy_buffer_sub_data(
        &self,
        read_target: GLenum,
        write_target: GLenum,
        read_offset: usize,
        write_offset: usize,
        size: usize,
    ) {
        gl::CopyBufferSubData(
            read_target,
            write_target,
            read_offset as GLintptr,
            write_offset as GLintptr,
            size as GLsizeiptr,
        );
    }

    unsafe fn copy_named_buffer_sub_data(
        &self,
        src: GLuint,
        dst: GLuint,
        read_offset: usize,
        write_offset: usize,
        size: usize,
    ) {
        gl::CopyNamedBufferSubData(
            src,
            dst,
            read_offset as GLintptr,
            write_offset as GLintptr,
            size as GLsizeiptr,
        );
    }

    unsafe fn gen_texture(&self) -> GLuint {
        let mut id = 0;
        gl::GenTextures(1, &mut id);
        id
    }

    unsafe fn create_texture(&self, target: GLenum) -> GLuint {
        let mut id = 0;
        gl::CreateTextures(target, 1, &mut id);
        id
    }

    unsafe fn delete_texture(&self, id: GLuint) {
        gl::DeleteTextures(1, &id);
    }

    unsafe fn active_texture(&self, unit: GLenum) {
        gl::ActiveTexture(unit);
    }

    unsafe fn bind_texture(&self, target: GLenum, id: GLuint) {
        gl::BindTexture(target, id);
    }

    unsafe fn bind_texture_unit(&self, unit: GLuint, id: GLuint) {
        gl::BindTextureUnit(unit, id);
    }

    unsafe fn tex_image_1d(
        &self,
        target: GLenum,
        level: GLint,
        internal_format: GLenum,
        width: GLsizei,
        format: GLenum,
        ty: GLenum,
        data: Option<&[u8]>,
    ) {
        gl::TexImage1D(
            target,
            level,
            internal_format as GLint,
            width,
            0,
            format,
            ty,
            data_ptr(data),
        );
    }

    unsafe fn tex_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        ty: GLenum,
        data: Option<&[u8]>,
    ) {
        gl::TexImage2D(
            target,
            level,
            internal_format as GLint,
            width,
            height,
            0,
            format,
            ty,
            data_ptr(data),
        );
    }

    unsafe fn tex_image_3d(
        &self,
        target: GLenum,
        level: GLint,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
        depth: GLsizei,
        format: GLenum,
        ty: GLenum,
        data: Option<&[u8]>,
    ) {
        gl::TexImage3D(
            target,
            level,
            internal_format as GLint,
            width,
            height,
            depth,
            0,
            format,
            ty,
            data_ptr(data),
        );
    }

    unsafe fn compressed_tex_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
        data: &[u8],
    ) {
        gl::CompressedTexImage2D(
            target,
            level,
            internal_format,
            width,
            height,
            0,
            data.len() as GLsizei,
            data_ptr(Some(data)),
        );
    }

    unsafe fn tex_image_2d_multisample(
        &self,
        target: GLenum,
        samples: GLsizei,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    ) {
        gl::TexImage2DMultisample(target, samples, internal_format, width, height, gl::TRUE);
    }

    unsafe fn texture_storage_1d(
        &self,
        id: GLuint,
        levels: GLsizei,
        internal_format: GLenum,
        width: GLsizei,
    ) {
        gl::TextureStorage1D(id, levels, internal_format, width);
    }

    unsafe fn texture_storage_2d(
        &self,
        id: GLuint,
        levels: GLsizei,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    ) {
        gl::TextureStorage2D(id, levels, internal_format, width, height);
    }

    unsafe fn texture_storage_3d(
        &self,
        id: GLuint,
        levels: GLsizei,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
        depth: GLsizei,
    ) {
        gl::TextureStorage3D(id, levels, internal_format, width, height, depth);
    }

    unsafe fn texture_storage_2d_multisample(
        &self,
        id: GLuint,
        samples: GLsizei,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    ) {
        gl::TextureStorage2DMultisample(id, samples, internal_format, width, height, gl::TRUE);
    }

    unsafe fn texture_sub_image_1d(
        &self,
        id: GLuint,
        level: GLint,
        width: GLsizei,
        format: GLenum,
        ty: GLenum,
        data: &[u8],
    ) {
        gl::TextureSubImage1D(id, level, 0, width, format, ty, data_ptr(Some(data)));
    }

    unsafe fn texture_sub_image_2d(
        &self,
        id: GLuint,
        level: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        ty: GLenum,
        data: &[u8],
    ) {
        gl::TextureSubImage2D(
            id,
            level,
            0,
            0,
            width,
            height,
            format,
            ty,
            data_ptr(Some(data)),
        );
    }

    unsafe fn texture_sub_image_3d(
        &self,
        id: GLuint,
        level: GLint,
        zoffset: GLint,
        width: GLsizei,
        height: GLsizei,
        depth: GLsizei,
        format: GLenum,
        ty: GLenum,
        data: &[u8],
    ) {
        gl::TextureSubImage3D(
            id,
            level,
            0,
            0,
            zoffset,
            width,
            height,
            depth,
            format,
            ty,
            data_ptr(Some(data)),
        );
    }

    unsafe fn compressed_texture_sub_image_2d(
        &self,
        id: GLuint,
        level: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        data: &[u8],
    ) {
        gl::CompressedTextureSubImage2D(
            id,
            level,
            0,
            0,
            width,
            height,
            format,
            data.len() as GLsizei,
            data_ptr(Some(data)),
        );
    }

    unsafe fn tex_buffer(&self, target: GLenum, internal_format: GLenum, buffer: GLuint) {
        gl::TexBuffer(target, internal_format, buffer);
    }

    unsafe fn texture_buffer(&self, id: GLuint, internal_format: GLenum, buffer: GLuint) {
        gl::TextureBuffer(id, internal_format, buffer);
    }

    unsafe fn tex_parameter_i(&self, target: GLenum, pname: GLenum, param: GLint) {
        gl::TexParameteri(target, pname, param);
    }

    unsafe fn texture_parameter_i(&self, id: GLuint, pname: GLenum, param: GLint) {
        gl::TextureParameteri(id, pname, param);
    }

    unsafe fn tex_parameter_f(&self, target: GLenum, pname: GLenum, param: GLfloat) {
        gl::TexParameterf(target, pname, param);
    }

    unsafe fn texture_parameter_f(&self, id: GLuint, pname: GLenum, param: GLfloat) {
        gl::TextureParameterf(id, pname, param);
    }

    unsafe fn generate_mipmap(&self, target: GLenum) {
        gl::GenerateMipmap(target);
    }

    unsafe fn generate_texture_mipmap(&self, id: GLuint) {
        gl::GenerateTextureMipmap(id);
    }

    unsafe fn bind_image_texture(
        &self,
        unit: GLuint,
        id: GLuint,
        level: GLint,
        layered: bool,
        access: GLenum,
        format: GLenum,
    ) {
        gl::BindImageTexture(unit, id, level, gl_bool(layered), 0, access, format);
    }

    unsafe fn copy_image_sub_data(
        &self,
        src: GLuint,
        src_target: GLenum,
        dst: GLuint,
        dst_target: GLenum,
        width: GLsizei,
        height: GLsizei,
        depth: GLsizei,
    ) {
        gl::CopyImageSubData(
            src, src_target, 0, 0, 0, 0, dst, dst_target, 0, 0, 0, 0, width, height, depth,
        );
    }

    unsafe fn gen_sampler(&self) -> GLuint {
        let mut id = 0;
        gl::GenSamplers(1, &mut id);
        id
    }

    unsafe fn delete_sampler(&self, id: GLuint) {
        gl::DeleteSamplers(1, &id);
    }

    unsafe fn sampler_parameter_i(&self, id: GLuint, pname: GLenum, param: GLint) {
        gl::SamplerParameteri(id, pname, param);
    }

    unsafe fn sampler_parameter_f(&self, id: GLuint, pname: GLenum, param: GLfloat) {
        gl::SamplerParameterf(id, pname, param);
    }

    unsafe fn sampler_parameter_fv(&self, id: GLuint, pname: GLenum, params: &[GLfloat; 4]) {
        gl::SamplerParameterfv(id, pname, params.as_ptr());
    }

    unsafe fn bind_sampler(&self, unit: GLuint, id: GLuint) {
        gl::BindSampler(unit, id);
    }

    unsafe fn create_shader(&self, kind: GLenum) -> GLuint {
        gl::CreateShader(kind)
    }

    unsafe fn shader_source(&self, id: GLuint, source: &str) {
        let c_str = c_string(source);
        gl::ShaderSource(id, 1, &c_str.as_ptr(), ptr::null());
    }

    unsafe fn compile_shader(&self, id: GLuint) {
        gl::CompileShader(id);
    }

    unsafe fn get_shader_iv(&self, id: GLuint, pname: GLenum) -> GLint {
        let mut v = 0;
        gl::GetShaderiv(id, pname, &mut v);
        v
    }

    unsafe fn get_shader_info_log(&self, id: GLuint) -> String {
        let len = self.get_shader_iv(id, gl::INFO_LOG_LENGTH);
        if len <= 1 {
            return String::new();
        }

        let mut buf = vec![0u8; len as usize];
        gl::GetShaderInfoLog(id, len, ptr::null_mut(), buf.as_mut_ptr() as *mut GLchar);
        // Skips the trailing null character.
        buf.truncate(len as usize - 1);
        String::from_utf8_lossy(&buf).into_owned()
    }

    unsafe fn delete_shader(&self, id: GLuint) {
        gl::DeleteShader(id);
    }

    unsafe fn create_program(&self) -> GLuint {
        gl::CreateProgram()
    }

    unsafe fn attach_shader(&self, program: GLuint, shader: GLuint) {
        gl::AttachShader(program, shader);
    }

    unsafe fn detach_shader(&self, program: GLuint, shader: GLuint) {
        gl::DetachShader(program, shader);
    }

    unsafe fn bind_attrib_location(&self, program: GLuint, index: GLuint, name: &str) {
        let c_name = c_string(name);
        gl::BindAttribLocation(program, index, c_name.as_ptr());
    }

    unsafe fn link_program(&self, program: GLuint) {
        gl::LinkProgram(program);
    }

    unsafe fn get_program_iv(&self, program: GLuint, pname: GLenum) -> GLint {
        let mut v = 0;
        gl::GetProgramiv(program, pname, &mut v);
        v
    }

    unsafe fn get_program_info_log(&self, program: GLuint) -> String {
        let len = self.get_program_iv(program, gl::INFO_LOG_LENGTH);
        if len <= 1 {
            return String::new();
        }

        let mut buf = vec![0u8; len as usize];
        gl::GetProgramInfoLog(program, len, ptr::null_mut(), buf.as_mut_ptr() as *mut GLchar);
        buf.truncate(len as usize - 1);
        String::from_utf8_lossy(&buf).into_owned()
    }

    unsafe fn delete_program(&self, program: GLuint) {
        gl::DeleteProgram(program);
    }

    unsafe fn use_program(&self, program: GLuint) {
        gl::UseProgram(program);
    }

    unsafe fn get_uniform_location(&self, program: GLuint, name: &str) -> GLint {
        let c_name = c_string(name);
        gl::GetUniformLocation(program, c_name.as_ptr())
    }

    unsafe fn get_uniform_block_index(&self, program: GLuint, name: &str) -> GLuint {
        let c_name = c_string(name);
        gl::GetUniformBlockIndex(program, c_name.as_ptr())
    }

    unsafe fn uniform_block_binding(&self, program: GLuint, index: GLuint, binding: GLuint) {
        gl::UniformBlockBinding(program, index, binding);
    }

    unsafe fn uniform_1i(&self, location: GLint, value: GLint) {
        gl::Uniform1i(location, value);
    }

    unsafe fn uniform_1ui(&self, location: GLint, value: GLuint) {
        gl::Uniform1ui(location, value);
    }

    unsafe fn program_uniform_1i(&self, program: GLuint, location: GLint, value: GLint) {
        gl::ProgramUniform1i(program, location, value);
    }

    unsafe fn program_uniform_1ui(&self, program: GLuint, location: GLint, value: GLuint) {
        gl::ProgramUniform1ui(program, location, value);
    }

    unsafe fn gen_vertex_array(&self) -> GLuint {
        let mut id = 0;
        gl::GenVertexArrays(1, &mut id);
        id
    }

    unsafe fn delete_vertex_array(&self, id: GLuint) {
        gl::DeleteVertexArrays(1, &id);
    }

    unsafe fn bind_vertex_array(&self, id: GLuint) {
        gl::BindVertexArray(id);
    }

    unsafe fn enable_vertex_attrib_array(&self, index: GLuint) {
        gl::EnableVertexAttribArray(index);
    }

    unsafe fn vertex_attrib_pointer(
        &self,
        index: GLuint,
        size: GLint,
        ty: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: usize,
    ) {
        gl::VertexAttribPointer(
            index,
            size,
            ty,
            gl_bool(normalized),
            stride,
            offset as *const c_void,
        );
    }

    unsafe fn vertex_attrib_i_pointer(
        &self,
        index: GLuint,
        size: GLint,
        ty: GLenum,
        stride: GLsizei,
        offset: usize,
    ) {
        gl::VertexAttribIPointer(index, size, ty, stride, offset as *const c_void);
    }

    unsafe fn vertex_attrib_divisor(&self, index: GLuint, divisor: GLuint) {
        gl::VertexAttribDivisor(index, divisor);
    }

    unsafe fn gen_framebuffer(&self) -> GLuint {
        let mut id = 0;
        gl::GenFramebuffers(1, &mut id);
        id
    }

    unsafe fn delete_framebuffer(&self, id: GLuint) {
        gl::DeleteFramebuffers(1, &id);
    }

    unsafe fn bind_framebuffer(&self, target: GLenum, id: GLuint) {
        gl::BindFramebuffer(target, id);
    }

    unsafe fn framebuffer_texture_2d(
        &self,
        target: GLenum,
        attachment: GLenum,
        textarget: GLenum,
        texture: GLuint,
        level: GLint,
    ) {
        gl::FramebufferTexture2D(target, attachment, textarget, texture, level);
    }

    unsafe fn framebuffer_texture_layer(
        &self,
        target: GLenum,
        attachment: GLenum,
        texture: GLuint,
        level: GLint,
        layer: GLint,
    ) {
        gl::FramebufferTextureLayer(target, attachment, texture, level, layer);
    }

    unsafe fn check_framebuffer_status(&self, target: GLenum) -> GLenum {
        gl::CheckFramebufferStatus(target)
    }

    unsafe fn draw_buffers(&self, buffers: &[GLenum]) {
        gl::DrawBuffers(buffers.len() as GLsizei, buffers.as_ptr());
    }

    unsafe fn blit_framebuffer(
        &self,
        src: [GLint; 4],
        dst: [GLint; 4],
        mask: GLbitfield,
        filter: GLenum,
    ) {
        gl::BlitFramebuffer(
            src[0], src[1], src[2], src[3], dst[0], dst[1], dst[2], dst[3], mask, filter,
        );
    }

    unsafe fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        gl::Viewport(x, y, width, height);
    }

    unsafe fn depth_range(&self, near: f64, far: f64) {
        gl::DepthRange(near, far);
    }

    unsafe fn scissor(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        gl::Scissor(x, y, width, height);
    }

    unsafe fn cull_face(&self, mode: GLenum) {
        gl::CullFace(mode);
    }

    unsafe fn front_face(&self, mode: GLenum) {
        gl::FrontFace(mode);
    }

    unsafe fn polygon_mode(&self, face: GLenum, mode: GLenum) {
        gl::PolygonMode(face, mode);
    }

    unsafe fn polygon_offset(&self, factor: GLfloat, units: GLfloat) {
        gl::PolygonOffset(factor, units);
    }

    unsafe fn depth_mask(&self, flag: bool) {
        gl::DepthMask(gl_bool(flag));
    }

    unsafe fn depth_func(&self, func: GLenum) {
        gl::DepthFunc(func);
    }

    unsafe fn stencil_mask(&self, mask: GLuint) {
        gl::StencilMask(mask);
    }

    unsafe fn blend_func_separate(
        &self,
        src_rgb: GLenum,
        dst_rgb: GLenum,
        src_alpha: GLenum,
        dst_alpha: GLenum,
    ) {
        gl::BlendFuncSeparate(src_rgb, dst_rgb, src_alpha, dst_alpha);
    }

    unsafe fn blend_equation_separate(&self, rgb: GLenum, alpha: GLenum) {
        gl::BlendEquationSeparate(rgb, alpha);
    }

    unsafe fn color_mask(&self, red: bool, green: bool, blue: bool, alpha: bool) {
        gl::ColorMask(gl_bool(red), gl_bool(green), gl_bool(blue), gl_bool(alpha));
    }

    unsafe fn patch_parameter_i(&self, pname: GLenum, value: GLint) {
        gl::PatchParameteri(pname, value);
    }

    unsafe fn clear_color(&self, red: GLfloat, green: GLfloat, blue: GLfloat, alpha: GLfloat) {
        gl::ClearColor(red, green, blue, alpha);
    }

    unsafe fn clear_depth(&self, depth: f64) {
        gl::ClearDepth(depth);
    }

    unsafe fn clear_stencil(&self, stencil: GLint) {
        gl::ClearStencil(stencil);
    }

    unsafe fn clear(&self, mask: GLbitfield) {
        gl::Clear(mask);
    }

    unsafe fn draw_arrays_instanced(
        &self,
        mode: GLenum,
        first: GLint,
        count: GLsizei,
        instances: GLsizei,
    ) {
        gl::DrawArraysInstanced(mode, first, count, instances);
    }

    unsafe fn draw_arrays_instanced_base_instance(
        &self,
        mode: GLenum,
        first: GLint,
        count: GLsizei,
        instances: GLsizei,
        base_instance: GLuint,
    ) {
        gl::DrawArraysInstancedBaseInstance(mode, first, count, instances, base_instance);
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
        gl::DrawElementsInstancedBaseVertex(
            mode,
            count,
            ty,
            offset as *const c_void,
            instances,
            base_vertex,
        );
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
        gl::DrawElementsInstancedBaseVertexBaseInstance(
            mode,
            count,
            ty,
            offset as *const c_void,
            instances,
            base_vertex,
            base_instance,
        );
    }

    unsafe fn draw_arrays_indirect(&self, mode: GLenum, offset: usize) {
        gl::DrawArraysIndirect(mode, offset as *const c_void);
    }

    unsafe fn draw_elements_indirect(&self, mode: GLenum, ty: GLenum, offset: usize) {
        gl::DrawElementsIndirect(mode, ty, offset as *const c_void);
    }

    unsafe fn multi_draw_arrays_indirect(
        &self,
        mode: GLenum,
        offset: usize,
        draw_count: GLsizei,
        stride: GLsizei,
    ) {
        gl::MultiDrawArraysIndirect(mode, offset as *const c_void, draw_count, stride);
    }

    unsafe fn multi_draw_elements_indirect(
        &self,
        mode: GLenum,
        ty: GLenum,
        offset: usize,
        draw_count: GLsizei,
        stride: GLsizei,
    ) {
        gl::MultiDrawElementsIndirect(mode, ty, offset as *const c_void, draw_count, stride);
    }

    unsafe fn dispatch_compute(&self, x: GLuint, y: GLuint, z: GLuint) {
        gl::DispatchCompute(x, y, z);
    }

    unsafe fn memory_barrier(&self, barriers: GLbitfield) {
        gl::MemoryBarrier(barriers);
    }

    unsafe fn gen_query(&self) -> GLuint {
        let mut id = 0;
        gl::GenQueries(1, &mut id);
        id
    }

    unsafe fn delete_query(&self, id: GLuint) {
        gl::DeleteQueries(1, &id);
    }

    unsafe fn begin_query(&self, target: GLenum, id: GLuint) {
        gl::BeginQuery(target, id);
    }

    unsafe fn end_query(&self, target: GLenum) {
        gl::EndQuery(target);
    }

    unsafe fn query_counter(&self, id: GLuint, target: GLenum) {
        gl::QueryCounter(id, target);
    }

    unsafe fn get_query_object_u32(&self, id: GLuint, pname: GLenum) -> GLuint {
        let mut v = 0;
        gl::GetQueryObjectuiv(id, pname, &mut v);
        v
    }

    unsafe fn get_query_object_u64(&self, id: GLuint, pname: GLenum) -> u64 {
        let mut v = 0;
        gl::GetQueryObjectui64v(id, pname, &mut v);
        v
    }

    unsafe fn debug_message_insert(&self, message: &str) {
        gl::DebugMessageInsert(
            gl::DEBUG_SOURCE_APPLICATION,
            gl::DEBUG_TYPE_MARKER,
            0,
            gl::DEBUG_SEVERITY_NOTIFICATION,
            message.len() as GLsizei,
            message.as_ptr() as *const GLchar,
        );
    }

    unsafe fn push_debug_group(&self, message: &str) {
        gl::PushDebugGroup(
            gl::DEBUG_SOURCE_APPLICATION,
            0,
            message.len() as GLsizei,
            message.as_ptr() as *const GLchar,
        );
    }

    unsafe fn pop_debug_group(&self) {
        gl::PopDebugGroup();
    }
}
