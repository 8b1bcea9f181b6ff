//! The command model. Commands are recorded into an append-only `CommandBuffer`, and
//! replayed in recording order against exactly one device by `dispatch`.

use std::rc::Rc;

use byteorder::{ByteOrder, LittleEndian};
use smallvec::SmallVec;

use super::device::Device;
use super::framebuffer::{ClearFlags, RenderTarget, ScissorRectangle, Viewport};
use super::query::QueryControlFlags;
use super::resource::Resource;

/// The arguments of one non-indexed draw, in the layout of GPU indirect buffers.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
pub struct DrawArguments {
    pub vertex_count_per_instance: u32,
    pub instance_count: u32,
    pub start_vertex_location: u32,
    pub start_instance_location: u32,
}

impl DrawArguments {
    pub const SIZE: usize = 16;

    pub fn new(vertex_count_per_instance: u32) -> Self {
        DrawArguments {
            vertex_count_per_instance,
            instance_count: 1,
            start_vertex_location: 0,
            start_instance_location: 0,
        }
    }

    /// Reads the `index`th arguments from a tightly packed little endian array.
    pub fn read(buf: &[u8], index: usize) -> Self {
        let buf = &buf[index * Self::SIZE..(index + 1) * Self::SIZE];
        DrawArguments {
            vertex_count_per_instance: LittleEndian::read_u32(&buf[0..]),
            instance_count: LittleEndian::read_u32(&buf[4..]),
            start_vertex_location: LittleEndian::read_u32(&buf[8..]),
            start_instance_location: LittleEndian::read_u32(&buf[12..]),
        }
    }

    pub fn write(&self, buf: &mut Vec<u8>) {
        let mut v = [0; Self::SIZE];
        LittleEndian::write_u32(&mut v[0..], self.vertex_count_per_instance);
        LittleEndian::write_u32(&mut v[4..], self.instance_count);
        LittleEndian::write_u32(&mut v[8..], self.start_vertex_location);
        LittleEndian::write_u32(&mut v[12..], self.start_instance_location);
        buf.extend_from_slice(&v);
    }

    pub fn as_bytes(args: &[DrawArguments]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(args.len() * Self::SIZE);
        for v in args {
            v.write(&mut buf);
        }
        buf
    }
}

/// The arguments of one indexed draw, in the layout of GPU indirect buffers.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
pub struct DrawIndexedArguments {
    pub index_count_per_instance: u32,
    pub instance_count: u32,
    pub start_index_location: u32,
    pub base_vertex_location: i32,
    pub start_instance_location: u32,
}

impl DrawIndexedArguments {
    pub const SIZE: usize = 20;

    pub fn new(index_count_per_instance: u32) -> Self {
        DrawIndexedArguments {
            index_count_per_instance,
            instance_count: 1,
            start_index_location: 0,
            base_vertex_location: 0,
            start_instance_location: 0,
        }
    }

    /// Reads the `index`th arguments from a tightly packed little endian array.
    pub fn read(buf: &[u8], index: usize) -> Self {
        let buf = &buf[index * Self::SIZE..(index + 1) * Self::SIZE];
        DrawIndexedArguments {
            index_count_per_instance: LittleEndian::read_u32(&buf[0..]),
            instance_count: LittleEndian::read_u32(&buf[4..]),
            start_index_location: LittleEndian::read_u32(&buf[8..]),
            base_vertex_location: LittleEndian::read_i32(&buf[12..]),
            start_instance_location: LittleEndian::read_u32(&buf[16..]),
        }
    }

    pub fn write(&self, buf: &mut Vec<u8>) {
        let mut v = [0; Self::SIZE];
        LittleEndian::write_u32(&mut v[0..], self.index_count_per_instance);
        LittleEndian::write_u32(&mut v[4..], self.instance_count);
        LittleEndian::write_u32(&mut v[8..], self.start_index_location);
        LittleEndian::write_i32(&mut v[12..], self.base_vertex_location);
        LittleEndian::write_u32(&mut v[16..], self.start_instance_location);
        buf.extend_from_slice(&v);
    }

    pub fn as_bytes(args: &[DrawIndexedArguments]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(args.len() * Self::SIZE);
        for v in args {
            v.write(&mut buf);
        }
        buf
    }
}

/// A slice of the auxiliary data of a command buffer.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
pub struct BytesPtr {
    offset: u32,
    len: u32,
}

/// Where the arguments of draw commands come from.
pub enum DrawSource<D: Device> {
    /// Arguments stored in a GPU indirect buffer, starting at `offset` bytes.
    Indirect {
        buffer: Rc<D::Buffer>,
        offset: u32,
        number_of_draws: u32,
    },
    /// Arguments supplied by the CPU, stored in the auxiliary data of the command buffer.
    Emulated {
        arguments: BytesPtr,
        number_of_draws: u32,
    },
}

/// The index of a command in the dispatch table.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum CommandFunction {
    SetGraphicsRootSignature,
    SetGraphicsPipelineState,
    SetGraphicsResourceGroup,
    SetGraphicsVertexArray,
    SetGraphicsViewports,
    SetGraphicsScissorRectangles,
    SetGraphicsRenderTarget,
    ClearGraphics,
    DrawGraphics,
    DrawIndexedGraphics,
    SetComputeRootSignature,
    SetComputePipelineState,
    SetComputeResourceGroup,
    DispatchCompute,
    SetTextureMinimumMaximumMipmapIndex,
    ResolveMultisampleFramebuffer,
    CopyResource,
    GenerateMipmaps,
    CopyUniformBufferData,
    ResetQueryPool,
    BeginQuery,
    EndQuery,
    WriteTimestampQuery,
    SetDebugMarker,
    BeginDebugEvent,
    EndDebugEvent,
}

impl CommandFunction {
    pub const COUNT: usize = 26;
}

pub enum Command<D: Device> {
    SetGraphicsRootSignature(Option<Rc<D::RootSignature>>),
    SetGraphicsPipelineState(Option<Rc<D::GraphicsPipelineState>>),
    SetGraphicsResourceGroup(u32, Option<Rc<D::ResourceGroup>>),
    SetGraphicsVertexArray(Option<Rc<D::VertexArray>>),
    SetGraphicsViewports(SmallVec<[Viewport; 1]>),
    SetGraphicsScissorRectangles(SmallVec<[ScissorRectangle; 1]>),
    SetGraphicsRenderTarget(Option<RenderTarget<D>>),
    ClearGraphics(ClearFlags, [f32; 4], f32, u32),
    DrawGraphics(DrawSource<D>),
    DrawIndexedGraphics(DrawSource<D>),

    SetComputeRootSignature(Option<Rc<D::RootSignature>>),
    SetComputePipelineState(Option<Rc<D::ComputePipelineState>>),
    SetComputeResourceGroup(u32, Option<Rc<D::ResourceGroup>>),
    DispatchCompute(u32, u32, u32),

    SetTextureMinimumMaximumMipmapIndex(Rc<D::Texture>, u32, u32),
    ResolveMultisampleFramebuffer(RenderTarget<D>, Rc<D::Framebuffer>),
    CopyResource(Resource<D>, Resource<D>),
    GenerateMipmaps(Rc<D::Texture>),
    CopyUniformBufferData(Rc<D::Buffer>, BytesPtr),

    ResetQueryPool(Rc<D::QueryPool>, u32, u32),
    BeginQuery(Rc<D::QueryPool>, u32, QueryControlFlags),
    EndQuery(Rc<D::QueryPool>, u32),
    WriteTimestampQuery(Rc<D::QueryPool>, u32),

    SetDebugMarker(BytesPtr),
    BeginDebugEvent(BytesPtr),
    EndDebugEvent,
}

impl<D: Device> Command<D> {
    pub fn function(&self) -> CommandFunction {
        match *self {
            Command::SetGraphicsRootSignature(_) => CommandFunction::SetGraphicsRootSignature,
            Command::SetGraphicsPipelineState(_) => CommandFunction::SetGraphicsPipelineState,
            Command::SetGraphicsResourceGroup(..) => CommandFunction::SetGraphicsResourceGroup,
            Command::SetGraphicsVertexArray(_) => CommandFunction::SetGraphicsVertexArray,
            Command::SetGraphicsViewports(_) => CommandFunction::SetGraphicsViewports,
            Command::SetGraphicsScissorRectangles(_) => {
                CommandFunction::SetGraphicsScissorRectangles
            }
            Command::SetGraphicsRenderTarget(_) => CommandFunction::SetGraphicsRenderTarget,
            Command::ClearGraphics(..) => CommandFunction::ClearGraphics,
            Command::DrawGraphics(_) => CommandFunction::DrawGraphics,
            Command::DrawIndexedGraphics(_) => CommandFunction::DrawIndexedGraphics,
            Command::SetComputeRootSignature(_) => CommandFunction::SetComputeRootSignature,
            Command::SetComputePipelineState(_) => CommandFunction::SetComputePipelineState,
            Command::SetComputeResourceGroup(..) => CommandFunction::SetComputeResourceGroup,
            Command::DispatchCompute(..) => CommandFunction::DispatchCompute,
            Command::SetTextureMinimumMaximumMipmapIndex(..) => {
                CommandFunction::SetTextureMinimumMaximumMipmapIndex
            }
            Command::ResolveMultisampleFramebuffer(..) => {
                CommandFunction::ResolveMultisampleFramebuffer
            }
            Command::CopyResource(..) => CommandFunction::CopyResource,
            Command::GenerateMipmaps(_) => CommandFunction::GenerateMipmaps,
            Command::CopyUniformBufferData(..) => CommandFunction::CopyUniformBufferData,
            Command::ResetQueryPool(..) => CommandFunction::ResetQueryPool,
            Command::BeginQuery(..) => CommandFunction::BeginQuery,
            Command::EndQuery(..) => CommandFunction::EndQuery,
            Command::WriteTimestampQuery(..) => CommandFunction::WriteTimestampQuery,
            Command::SetDebugMarker(_) => CommandFunction::SetDebugMarker,
            Command::BeginDebugEvent(_) => CommandFunction::BeginDebugEvent,
            Command::EndDebugEvent => CommandFunction::EndDebugEvent,
        }
    }
}

/// The append-only command buffer. Commands are executed one by one in recording order
/// when the buffer is dispatched to a device.
pub struct CommandBuffer<D: Device> {
    cmds: Vec<Command<D>>,
    bufs: Vec<u8>,
}

impl<D: Device> Default for CommandBuffer<D> {
    fn default() -> Self {
        CommandBuffer::new()
    }
}

impl<D: Device> CommandBuffer<D> {
    /// Creates a new and empty `CommandBuffer`.
    #[inline]
    pub fn new() -> Self {
        CommandBuffer {
            cmds: Vec::with_capacity(32),
            bufs: Vec::with_capacity(512),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.cmds.clear();
        self.bufs.clear();
    }

    /// Iterates over the recorded commands in order.
    #[inline]
    pub fn iter(&self) -> ::std::slice::Iter<Command<D>> {
        self.cmds.iter()
    }

    /// Gets the auxiliary data of a command.
    #[inline]
    pub fn bytes(&self, ptr: BytesPtr) -> &[u8] {
        &self.bufs[ptr.offset as usize..(ptr.offset + ptr.len) as usize]
    }

    /// Gets the auxiliary data of a command as utf8 string.
    pub fn str(&self, ptr: BytesPtr) -> &str {
        ::std::str::from_utf8(self.bytes(ptr)).unwrap_or("")
    }

    fn extend_from_slice(&mut self, bytes: &[u8]) -> BytesPtr {
        let ptr = BytesPtr {
            offset: self.bufs.len() as u32,
            len: bytes.len() as u32,
        };

        self.bufs.extend_from_slice(bytes);
        ptr
    }

    #[inline]
    pub fn set_graphics_root_signature(&mut self, v: Option<&Rc<D::RootSignature>>) {
        self.cmds
            .push(Command::SetGraphicsRootSignature(v.cloned()));
    }

    #[inline]
    pub fn set_graphics_pipeline_state(&mut self, v: Option<&Rc<D::GraphicsPipelineState>>) {
        self.cmds
            .push(Command::SetGraphicsPipelineState(v.cloned()));
    }

    #[inline]
    pub fn set_graphics_resource_group(
        &mut self,
        root_parameter_index: u32,
        v: Option<&Rc<D::ResourceGroup>>,
    ) {
        self.cmds.push(Command::SetGraphicsResourceGroup(
            root_parameter_index,
            v.cloned(),
        ));
    }

    #[inline]
    pub fn set_graphics_vertex_array(&mut self, v: Option<&Rc<D::VertexArray>>) {
        self.cmds.push(Command::SetGraphicsVertexArray(v.cloned()));
    }

    /// Updates the viewports. The first one is the main viewport.
    #[inline]
    pub fn set_graphics_viewports(&mut self, viewports: &[Viewport]) {
        self.cmds
            .push(Command::SetGraphicsViewports(viewports.iter().cloned().collect()));
    }

    /// Updates the scissor rectangles. Only pixels that lie within the scissor box can be
    /// modified by drawing commands, if the scissor test is enabled by the rasterizer state.
    #[inline]
    pub fn set_graphics_scissor_rectangles(&mut self, rectangles: &[ScissorRectangle]) {
        self.cmds.push(Command::SetGraphicsScissorRectangles(
            rectangles.iter().cloned().collect(),
        ));
    }

    #[inline]
    pub fn set_graphics_render_target(&mut self, v: Option<&RenderTarget<D>>) {
        self.cmds.push(Command::SetGraphicsRenderTarget(v.cloned()));
    }

    #[inline]
    pub fn clear_graphics(&mut self, flags: ClearFlags, color: [f32; 4], z: f32, stencil: u32) {
        self.cmds
            .push(Command::ClearGraphics(flags, color, z, stencil));
    }

    /// Draws with arguments sourced from an indirect buffer.
    #[inline]
    pub fn draw_graphics(&mut self, buffer: &Rc<D::Buffer>, offset: u32, number_of_draws: u32) {
        self.cmds.push(Command::DrawGraphics(DrawSource::Indirect {
            buffer: buffer.clone(),
            offset,
            number_of_draws,
        }));
    }

    /// Draws with arguments supplied by the CPU, one native draw per entry.
    #[inline]
    pub fn draw_graphics_emulated(&mut self, arguments: &[DrawArguments]) {
        let bytes = DrawArguments::as_bytes(arguments);
        let ptr = self.extend_from_slice(&bytes);
        self.cmds.push(Command::DrawGraphics(DrawSource::Emulated {
            arguments: ptr,
            number_of_draws: arguments.len() as u32,
        }));
    }

    #[inline]
    pub fn draw_indexed_graphics(
        &mut self,
        buffer: &Rc<D::Buffer>,
        offset: u32,
        number_of_draws: u32,
    ) {
        self.cmds
            .push(Command::DrawIndexedGraphics(DrawSource::Indirect {
                buffer: buffer.clone(),
                offset,
                number_of_draws,
            }));
    }

    #[inline]
    pub fn draw_indexed_graphics_emulated(&mut self, arguments: &[DrawIndexedArguments]) {
        let bytes = DrawIndexedArguments::as_bytes(arguments);
        let ptr = self.extend_from_slice(&bytes);
        self.cmds
            .push(Command::DrawIndexedGraphics(DrawSource::Emulated {
                arguments: ptr,
                number_of_draws: arguments.len() as u32,
            }));
    }

    #[inline]
    pub fn set_compute_root_signature(&mut self, v: Option<&Rc<D::RootSignature>>) {
        self.cmds.push(Command::SetComputeRootSignature(v.cloned()));
    }

    #[inline]
    pub fn set_compute_pipeline_state(&mut self, v: Option<&Rc<D::ComputePipelineState>>) {
        self.cmds.push(Command::SetComputePipelineState(v.cloned()));
    }

    #[inline]
    pub fn set_compute_resource_group(
        &mut self,
        root_parameter_index: u32,
        v: Option<&Rc<D::ResourceGroup>>,
    ) {
        self.cmds.push(Command::SetComputeResourceGroup(
            root_parameter_index,
            v.cloned(),
        ));
    }

    #[inline]
    pub fn dispatch_compute(&mut self, x: u32, y: u32, z: u32) {
        self.cmds.push(Command::DispatchCompute(x, y, z));
    }

    #[inline]
    pub fn set_texture_minimum_maximum_mipmap_index(
        &mut self,
        texture: &Rc<D::Texture>,
        minimum: u32,
        maximum: u32,
    ) {
        self.cmds.push(Command::SetTextureMinimumMaximumMipmapIndex(
            texture.clone(),
            minimum,
            maximum,
        ));
    }

    #[inline]
    pub fn resolve_multisample_framebuffer(
        &mut self,
        destination: &RenderTarget<D>,
        source: &Rc<D::Framebuffer>,
    ) {
        self.cmds.push(Command::ResolveMultisampleFramebuffer(
            destination.clone(),
            source.clone(),
        ));
    }

    #[inline]
    pub fn copy_resource(&mut self, destination: &Resource<D>, source: &Resource<D>) {
        self.cmds
            .push(Command::CopyResource(destination.clone(), source.clone()));
    }

    #[inline]
    pub fn generate_mipmaps(&mut self, texture: &Rc<D::Texture>) {
        self.cmds.push(Command::GenerateMipmaps(texture.clone()));
    }

    /// Copies `data` into the start of a uniform buffer.
    #[inline]
    pub fn copy_uniform_buffer_data(&mut self, buffer: &Rc<D::Buffer>, data: &[u8]) {
        let ptr = self.extend_from_slice(data);
        self.cmds
            .push(Command::CopyUniformBufferData(buffer.clone(), ptr));
    }

    #[inline]
    pub fn reset_query_pool(&mut self, pool: &Rc<D::QueryPool>, first: u32, count: u32) {
        self.cmds
            .push(Command::ResetQueryPool(pool.clone(), first, count));
    }

    #[inline]
    pub fn begin_query(&mut self, pool: &Rc<D::QueryPool>, index: u32, flags: QueryControlFlags) {
        self.cmds
            .push(Command::BeginQuery(pool.clone(), index, flags));
    }

    #[inline]
    pub fn end_query(&mut self, pool: &Rc<D::QueryPool>, index: u32) {
        self.cmds.push(Command::EndQuery(pool.clone(), index));
    }

    #[inline]
    pub fn write_timestamp_query(&mut self, pool: &Rc<D::QueryPool>, index: u32) {
        self.cmds
            .push(Command::WriteTimestampQuery(pool.clone(), index));
    }

    #[inline]
    pub fn set_debug_marker(&mut self, name: &str) {
        let ptr = self.extend_from_slice(name.as_bytes());
        self.cmds.push(Command::SetDebugMarker(ptr));
    }

    #[inline]
    pub fn begin_debug_event(&mut self, name: &str) {
        let ptr = self.extend_from_slice(name.as_bytes());
        self.cmds.push(Command::BeginDebugEvent(ptr));
    }

    #[inline]
    pub fn end_debug_event(&mut self) {
        self.cmds.push(Command::EndDebugEvent);
    }
}

/// Dispatches the commands to the device. It's guaranteed that the commands are executed
/// one by one in recording order.
///
/// # Panics
///
/// Panics if the command buffer is empty.
pub fn dispatch<D: Device>(device: &mut D, buffer: &CommandBuffer<D>) {
    assert!(
        !buffer.is_empty(),
        "Dispatching an empty command buffer is not allowed."
    );

    for cmd in buffer.iter() {
        match *cmd {
            Command::SetGraphicsRootSignature(ref v) => {
                device.set_graphics_root_signature(v.clone());
            }

            Command::SetGraphicsPipelineState(ref v) => {
                device.set_graphics_pipeline_state(v.clone());
            }

            Command::SetGraphicsResourceGroup(index, ref v) => {
                device.set_graphics_resource_group(index, v.clone());
            }

            Command::SetGraphicsVertexArray(ref v) => {
                device.set_graphics_vertex_array(v.clone());
            }

            Command::SetGraphicsViewports(ref v) => {
                device.set_graphics_viewports(v);
            }

            Command::SetGraphicsScissorRectangles(ref v) => {
                device.set_graphics_scissor_rectangles(v);
            }

            Command::SetGraphicsRenderTarget(ref v) => {
                device.set_graphics_render_target(v.clone());
            }

            Command::ClearGraphics(flags, color, z, stencil) => {
                device.clear_graphics(flags, color, z, stencil);
            }

            Command::DrawGraphics(ref source) => match *source {
                DrawSource::Indirect {
                    ref buffer,
                    offset,
                    number_of_draws,
                } => {
                    device.draw_graphics(buffer, offset, number_of_draws);
                }
                DrawSource::Emulated {
                    arguments,
                    number_of_draws,
                } => {
                    device.draw_graphics_emulated(buffer.bytes(arguments), number_of_draws);
                }
            },

            Command::DrawIndexedGraphics(ref source) => match *source {
                DrawSource::Indirect {
                    ref buffer,
                    offset,
                    number_of_draws,
                } => {
                    device.draw_indexed_graphics(buffer, offset, number_of_draws);
                }
                DrawSource::Emulated {
                    arguments,
                    number_of_draws,
                } => {
                    device.draw_indexed_graphics_emulated(
                        buffer.bytes(arguments),
                        number_of_draws,
                    );
                }
            },

            Command::SetComputeRootSignature(ref v) => {
                device.set_compute_root_signature(v.clone());
            }

            Command::SetComputePipelineState(ref v) => {
                device.set_compute_pipeline_state(v.clone());
            }

            Command::SetComputeResourceGroup(index, ref v) => {
                device.set_compute_resource_group(index, v.clone());
            }

            Command::DispatchCompute(x, y, z) => {
                device.dispatch_compute(x, y, z);
            }

            Command::SetTextureMinimumMaximumMipmapIndex(ref texture, min, max) => {
                device.set_texture_minimum_maximum_mipmap_index(texture, min, max);
            }

            Command::ResolveMultisampleFramebuffer(ref dst, ref src) => {
                device.resolve_multisample_framebuffer(dst, src);
            }

            Command::CopyResource(ref dst, ref src) => {
                device.copy_resource(dst, src);
            }

            Command::GenerateMipmaps(ref texture) => {
                device.generate_mipmaps(texture);
            }

            Command::CopyUniformBufferData(ref v, ptr) => {
                device.copy_uniform_buffer_data(v, buffer.bytes(ptr));
            }

            Command::ResetQueryPool(ref pool, first, count) => {
                device.reset_query_pool(pool, first, count);
            }

            Command::BeginQuery(ref pool, index, flags) => {
                device.begin_query(pool, index, flags);
            }

            Command::EndQuery(ref pool, index) => {
                device.end_query(pool, index);
            }

            Command::WriteTimestampQuery(ref pool, index) => {
                device.write_timestamp_query(pool, index);
            }

            Command::SetDebugMarker(ptr) => {
                device.set_debug_marker(buffer.str(ptr));
            }

            Command::BeginDebugEvent(ptr) => {
                device.begin_debug_event(buffer.str(ptr));
            }

            Command::EndDebugEvent => {
                device.end_debug_event();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments() {
        let args = [
            DrawArguments {
                vertex_count_per_instance: 3,
                instance_count: 2,
                start_vertex_location: 1,
                start_instance_location: 7,
            },
            DrawArguments::new(6),
        ];

        let bytes = DrawArguments::as_bytes(&args);
        assert_eq!(bytes.len(), 32);
        assert_eq!(bytes[12], 7);
        assert_eq!(DrawArguments::read(&bytes, 1), args[1]);

        let mut v = DrawIndexedArguments::new(36);
        v.base_vertex_location = -4;
        let bytes = DrawIndexedArguments::as_bytes(&[v]);
        assert_eq!(bytes.len(), DrawIndexedArguments::SIZE);
        assert_eq!(DrawIndexedArguments::read(&bytes, 0), v);
    }
}
