//! The thin seam between the OpenGL device and the driver.
//!
//! Every method mirrors one OpenGL entry point. `NativeGl` forwards them to the loaded
//! function table of the current context, `HeadlessGl` emulates them.

use gl::types::*;

pub trait GlApi {
    unsafe fn get_error(&self) -> GLenum;
    unsafe fn get_string(&self, name: GLenum) -> Option<String>;
    unsafe fn get_string_i(&self, name: GLenum, index: GLuint) -> Option<String>;
    unsafe fn get_integer(&self, pname: GLenum) -> GLint;
    unsafe fn get_float(&self, pname: GLenum) -> GLfloat;
    unsafe fn enable(&self, cap: GLenum);
    unsafe fn disable(&self, cap: GLenum);

    unsafe fn gen_buffer(&self) -> GLuint;
    unsafe fn create_buffer(&self) -> GLuint;
    unsafe fn delete_buffer(&self, id: GLuint);
    unsafe fn bind_buffer(&self, target: GLenum, id: GLuint);
    unsafe fn bind_buffer_base(&self, target: GLenum, index: GLuint, id: GLuint);
    unsafe fn buffer_data(&self, target: GLenum, size: usize, data: Option<&[u8]>, usage: GLenum);
    unsafe fn named_buffer_data(&self, id: GLuint, size: usize, data: Option<&[u8]>, usage: GLenum);
    unsafe fn map_buffer(&self, target: GLenum, access: GLenum) -> *mut u8;
    unsafe fn map_named_buffer(&self, id: GLuint, access: GLenum) -> *mut u8;
    unsafe fn unmap_buffer(&self, target: GLenum) -> bool;
    unsafe fn unmap_named_buffer(&self, id: GLuint) -> bool;
    unsafe fn copy_buffer_sub_data(
        &self,
        read_target: GLenum,
        write_target: GLenum,
        read_offset: usize,
        write_offset: usize,
        size: usize,
    );
    unsafe fn copy_named_buffer_sub_data(
        &self,
        src: GLuint,
        dst: GLuint,
        read_offset: usize,
        write_offset: usize,
        size: usize,
    );

    unsafe fn gen_texture(&self) -> GLuint;
    unsafe fn create_texture(&self, target: GLenum) -> GLuint;
    unsafe fn delete_texture(&self, id: GLuint);
    unsafe fn active_texture(&self, unit: GLenum);
    unsafe fn bind_texture(&self, target: GLenum, id: GLuint);
    unsafe fn bind_texture_unit(&self, unit: GLuint, id: GLuint);
    unsafe fn tex_image_1d(
        &self,
        target: GLenum,
        level: GLint,
        internal_format: GLenum,
        width: GLsizei,
        format: GLenum,
        ty: GLenum,
        data: Option<&[u8]>,
    );
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
    );
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
    );
    unsafe fn compressed_tex_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
        data: &[u8],
    );
    unsafe fn tex_image_2d_multisample(
        &self,
        target: GLenum,
        samples: GLsizei,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    );
    unsafe fn texture_storage_1d(&self, id: GLuint, levels: GLsizei, internal_format: GLenum, width: GLsizei);
    unsafe fn texture_storage_2d(
        &self,
        id: GLuint,
        levels: GLsizei,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    );
    unsafe fn texture_storage_3d(
        &self,
        id: GLuint,
        levels: GLsizei,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
        depth: GLsizei,
    );
    unsafe fn texture_storage_2d_multisample(
        &self,
        id: GLuint,
        samples: GLsizei,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    );
    unsafe fn texture_sub_image_1d(
        &self,
        id: GLuint,
        level: GLint,
        width: GLsizei,
        format: GLenum,
        ty: GLenum,
        data: &[u8],
    );
    unsafe fn texture_sub_image_2d(
        &self,
        id: GLuint,
        level: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        ty: GLenum,
        data: &[u8],
    );
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
    );
    unsafe fn compressed_texture_sub_image_2d(
        &self,
        id: GLuint,
        level: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        data: &[u8],
    );
    unsafe fn tex_buffer(&self, target: GLenum, internal_format: GLenum, buffer: GLuint);
    unsafe fn texture_buffer(&self, id: GLuint, internal_format: GLenum, buffer: GLuint);
    unsafe fn tex_parameter_i(&self, target: GLenum, pname: GLenum, param: GLint);
    unsafe fn texture_parameter_i(&self, id: GLuint, pname: GLenum, param: GLint);
    unsafe fn tex_parameter_f(&self, target: GLenum, pname: GLenum, param: GLfloat);
    unsafe fn texture_parameter_f(&self, id: GLuint, pname: GLenum, param: GLfloat);
    unsafe fn generate_mipmap(&self, target: GLenum);
    unsafe fn generate_texture_mipmap(&self, id: GLuint);
    unsafe fn bind_image_texture(
        &self,
        unit: GLuint,
        id: GLuint,
        level: GLint,
        layered: bool,
        access: GLenum,
        format: GLenum,
    );
    unsafe fn copy_image_sub_data(
        &self,
        src: GLuint,
        src_target: GLenum,
        dst: GLuint,
        dst_target: GLenum,
        width: GLsizei,
        height: GLsizei,
        depth: GLsizei,
    );

    unsafe fn gen_sampler(&self) -> GLuint;
    unsafe fn delete_sampler(&self, id: GLuint);
    unsafe fn sampler_parameter_i(&self, id: GLuint, pname: GLenum, param: GLint);
    unsafe fn sampler_parameter_f(&self, id: GLuint, pname: GLenum, param: GLfloat);
    unsafe fn sampler_parameter_fv(&self, id: GLuint, pname: GLenum, params: &[GLfloat; 4]);
    unsafe fn bind_sampler(&self, unit: GLuint, id: GLuint);

    unsafe fn create_shader(&self, kind: GLenum) -> GLuint;
    unsafe fn shader_source(&self, id: GLuint, source: &str);
    unsafe fn compile_shader(&self, id: GLuint);
    unsafe fn get_shader_iv(&self, id: GLuint, pname: GLenum) -> GLint;
    unsafe fn get_shader_info_log(&self, id: GLuint) -> String;
    unsafe fn delete_shader(&self, id: GLuint);
    unsafe fn create_program(&self) -> GLuint;
    unsafe fn attach_shader(&self, program: GLuint, shader: GLuint);
    unsafe fn detach_shader(&self, program: GLuint, shader: GLuint);
    unsafe fn bind_attrib_location(&self, program: GLuint, index: GLuint, name: &str);
    unsafe fn link_program(&self, program: GLuint);
    unsafe fn get_program_iv(&self, program: GLuint, pname: GLenum) -> GLint;
    unsafe fn get_program_info_log(&self, program: GLuint) -> String;
    unsafe fn delete_program(&self, program: GLuint);
    unsafe fn use_program(&self, program: GLuint);
    unsafe fn get_uniform_location(&self, program: GLuint, name: &str) -> GLint;
    unsafe fn get_uniform_block_index(&self, program: GLuint, name: &str) -> GLuint;
    unsafe fn uniform_block_binding(&self, program: GLuint, index: GLuint, binding: GLuint);
    unsafe fn uniform_1i(&self, location: GLint, value: GLint);
    unsafe fn uniform_1ui(&self, location: GLint, value: GLuint);
    unsafe fn program_uniform_1i(&self, program: GLuint, location: GLint, value: GLint);
    unsafe fn program_uniform_1ui(&self, program: GLuint, location: GLint, value: GLuint);

    unsafe fn gen_vertex_array(&self) -> GLuint;
    unsafe fn delete_vertex_array(&self, id: GLuint);
    unsafe fn bind_vertex_array(&self, id: GLuint);
    unsafe fn enable_vertex_attrib_array(&self, index: GLuint);
    unsafe fn vertex_attrib_pointer(
        &self,
        index: GLuint,
        size: GLint,
        ty: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: usize,
    );
    unsafe fn vertex_attrib_i_pointer(
        &self,
        index: GLuint,
        size: GLint,
        ty: GLenum,
        stride: GLsizei,
        offset: usize,
    );
    unsafe fn vertex_attrib_divisor(&self, index: GLuint, divisor: GLuint);

    unsafe fn gen_framebuffer(&self) -> GLuint;
    unsafe fn delete_framebuffer(&self, id: GLuint);
    unsafe fn bind_framebuffer(&self, target: GLenum, id: GLuint);
    unsafe fn framebuffer_texture_2d(
        &self,
        target: GLenum,
        attachment: GLenum,
        textarget: GLenum,
        texture: GLuint,
        level: GLint,
    );
    unsafe fn framebuffer_texture_layer(
        &self,
        target: GLenum,
        attachment: GLenum,
        texture: GLuint,
        level: GLint,
        layer: GLint,
    );
    unsafe fn check_framebuffer_status(&self, target: GLenum) -> GLenum;
    unsafe fn draw_buffers(&self, buffers: &[GLenum]);
    unsafe fn blit_framebuffer(&self, src: [GLint; 4], dst: [GLint; 4], mask: GLbitfield, filter: GLenum);

    unsafe fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
    unsafe fn depth_range(&self, near: f64, far: f64);
    unsafe fn scissor(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
    unsafe fn cull_face(&self, mode: GLenum);
    unsafe fn front_face(&self, mode: GLenum);
    unsafe fn polygon_mode(&self, face: GLenum, mode: GLenum);
    unsafe fn polygon_offset(&self, factor: GLfloat, units: GLfloat);
    unsafe fn depth_mask(&self, flag: bool);
    unsafe fn depth_func(&self, func: GLenum);
    unsafe fn stencil_mask(&self, mask: GLuint);
    unsafe fn blend_func_separate(&self, src_rgb: GLenum, dst_rgb: GLenum, src_alpha: GLenum, dst_alpha: GLenum);
    unsafe fn blend_equation_separate(&self, rgb: GLenum, alpha: GLenum);
    unsafe fn color_mask(&self, red: bool, green: bool, blue: bool, alpha: bool);
    unsafe fn patch_parameter_i(&self, pname: GLenum, value: GLint);
    unsafe fn clear_color(&self, red: GLfloat, green: GLfloat, blue: GLfloat, alpha: GLfloat);
    unsafe fn clear_depth(&self, depth: f64);
    unsafe fn clear_stencil(&self, stencil: GLint);
    unsafe fn clear(&self, mask: GLbitfield);

    unsafe fn draw_arrays_instanced(&self, mode: GLenum, first: GLint, count: GLsizei, instances: GLsizei);
    unsafe fn draw_arrays_instanced_base_instance(
        &self,
        mode: GLenum,
        first: GLint,
        count: GLsizei,
        instances: GLsizei,
        base_instance: GLuint,
    );
    unsafe fn draw_elements_instanced_base_vertex(
        &self,
        mode: GLenum,
        count: GLsizei,
        ty: GLenum,
        offset: usize,
        instances: GLsizei,
        base_vertex: GLint,
    );
    unsafe fn draw_elements_instanced_base_vertex_base_instance(
        &self,
        mode: GLenum,
        count: GLsizei,
        ty: GLenum,
        offset: usize,
        instances: GLsizei,
        base_vertex: GLint,
        base_instance: GLuint,
    );
    unsafe fn draw_arrays_indirect(&self, mode: GLenum, offset: usize);
    unsafe fn draw_elements_indirect(&self, mode: GLenum, ty: GLenum, offset: usize);
    unsafe fn multi_draw_arrays_indirect(&self, mode: GLenum, offset: usize, draw_count: GLsizei, stride: GLsizei);
    unsafe fn multi_draw_elements_indirect(
        &self,
        mode: GLenum,
        ty: GLenum,
        offset: usize,
        draw_count: GLsizei,
        stride: GLsizei,
    );
    unsafe fn dispatch_compute(&self, x: GLuint, y: GLuint, z: GLuint);
    unsafe fn memory_barrier(&self, barriers: GLbitfield);

    unsafe fn gen_query(&self) -> GLuint;
    unsafe fn delete_query(&self, id: GLuint);
    unsafe fn begin_query(&self, target: GLenum, id: GLuint);
    unsafe fn end_query(&self, target: GLenum);
    unsafe fn query_counter(&self, id: GLuint, target: GLenum);
    unsafe fn get_query_object_u32(&self, id: GLuint, pname: GLenum) -> GLuint;
    unsafe fn get_query_object_u64(&self, id: GLuint, pname: GLenum) -> u64;

    unsafe fn debug_message_insert(&self, message: &str);
    unsafe fn push_debug_group(&self, message: &str);
    unsafe fn pop_debug_group(&self);
}
