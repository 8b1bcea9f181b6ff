extern crate crayon_rhi;
extern crate env_logger;
extern crate gl;
extern crate rand;

use std::rc::Rc;

use crayon_rhi::backends::gl::{Extensions, GlCall, HeadlessGl, OpenGLDevice};
use crayon_rhi::prelude::*;
use crayon_rhi::window::HeadlessWindow;

use rand::Rng;

type Gl = OpenGLDevice<HeadlessGl>;

const VS: &str = "#version 430\nvoid main() { gl_Position = vec4(0.0); }";
const FS: &str = "#version 430\nout vec4 color;\nvoid main() { color = vec4(1.0); }";
const VS_DRAW_ID: &str =
    "#version 430\nuniform uint drawIdUniform;\nvoid main() { gl_Position = vec4(float(drawIdUniform)); }";
const CS: &str = "#version 430\nlayout(local_size_x = 1) in;\nvoid main() {}";

fn device() -> Gl {
    let _ = env_logger::try_init();
    OpenGLDevice::new(HeadlessGl::new(), DeviceParams::default()).unwrap()
}

fn device_without(extension: &str) -> Gl {
    let names: Vec<_> = Extensions::NAMES
        .iter()
        .cloned()
        .filter(|v| *v != extension)
        .collect();

    let gl = HeadlessGl::with_extensions("4.6.0 Headless", &names);
    OpenGLDevice::new(gl, DeviceParams::default()).unwrap()
}

fn globals() -> RootSignatureDesc {
    RootSignatureDesc::new(vec![RootParameter::new(vec![
        DescriptorRange::new(
            DescriptorRangeType::Ubv,
            0,
            "Globals",
            ResourceType::UniformBuffer,
            ShaderVisibility::All,
        ),
        DescriptorRange::new(
            DescriptorRangeType::Srv,
            2,
            "Albedo",
            ResourceType::Texture2D,
            ShaderVisibility::Fragment,
        ),
    ])])
}

type RootSignature = <Gl as Device>::RootSignature;
type PipelineState = <Gl as Device>::GraphicsPipelineState;

fn pipeline(device: &mut Gl) -> (Rc<RootSignature>, Rc<PipelineState>) {
    pipeline_with(device, VS, RasterizerState::default())
}

fn pipeline_with(
    device: &mut Gl,
    vs: &str,
    rasterizer: RasterizerState,
) -> (Rc<RootSignature>, Rc<PipelineState>) {
    let rs = device.create_root_signature(&globals()).unwrap();
    let sources = GraphicsShaderSources::new(
        ShaderSource::Glsl(vs.into()),
        ShaderSource::Glsl(FS.into()),
    );

    let program = device
        .create_graphics_program(&rs, &VertexAttributes::default(), &sources)
        .unwrap();

    let mut desc = GraphicsPipelineStateDesc::<Gl>::new(rs.clone(), program);
    desc.rasterizer = rasterizer;
    let pso = device.create_graphics_pipeline_state(&desc).unwrap();
    (rs, pso)
}

fn draws(calls: &[GlCall]) -> Vec<(i32, i32)> {
    calls
        .iter()
        .filter_map(|v| match *v {
            GlCall::DrawArraysInstanced {
                count, instances, ..
            } => Some((count, instances)),
            _ => None,
        })
        .collect()
}

#[test]
fn create() {
    let device = device();
    assert_eq!(device.name(), "OpenGL");
    assert_eq!(
        device.shader_language(None).unwrap(),
        ShaderLanguage::Glsl
    );

    // The context reports 32 samples, but we never go beyond what has been tested.
    assert_eq!(device.capabilities().max_multisamples, 8);
    assert!(device.capabilities().multi_draw_indirect);
}

#[test]
fn create_without_mandatory_features() {
    let gl = HeadlessGl::with_extensions("2.1.0 Headless", &[]);
    assert!(OpenGLDevice::new(gl, DeviceParams::default()).is_err());
}

#[test]
fn shader_compilation_failure() {
    let mut device = device();
    let rs = device.create_root_signature(&globals()).unwrap();

    let sources = GraphicsShaderSources::new(
        ShaderSource::Glsl("#version 430\n#error broken".into()),
        ShaderSource::Glsl(FS.into()),
    );

    let err = device
        .create_graphics_program(&rs, &VertexAttributes::default(), &sources)
        .err()
        .unwrap();

    match err.downcast_ref::<Error>() {
        Some(Error::ShaderCreationFailure(_)) => {}
        v => panic!("unexpected error {:?}", v),
    }

    // A failed program never becomes current.
    assert!(device.gl().calls().iter().all(|v| match *v {
        GlCall::UseProgram(_) => false,
        _ => true,
    }));
}

#[test]
fn root_signature_refcount() {
    let mut device = device();
    let rs = device.create_root_signature(&globals()).unwrap();
    assert_eq!(Rc::strong_count(&rs), 1);

    device.set_graphics_root_signature(Some(rs.clone()));
    assert_eq!(Rc::strong_count(&rs), 2);

    device.set_graphics_root_signature(None);
    assert_eq!(Rc::strong_count(&rs), 1);
}

#[test]
fn bind_resource_group() {
    let mut device = device();
    let (rs, pso) = pipeline(&mut device);

    let ubo = device
        .create_buffer(BufferDesc::new(BufferKind::Uniform, 256), None)
        .unwrap();

    let texture = device
        .create_texture_2d(
            4,
            4,
            TextureFormat::R8G8B8A8,
            TextureFlags {
                shader_resource: true,
                ..TextureFlags::default()
            },
            TextureUsage::Default,
            1,
            None,
        )
        .unwrap();

    let resources = [
        Resource::Buffer(ubo.clone()),
        Resource::Texture(texture.clone()),
    ];

    let group = device
        .create_resource_group(&rs, 0, &resources, None)
        .unwrap();

    let mut cmds = CommandBuffer::<Gl>::new();
    cmds.set_graphics_root_signature(Some(&rs));
    cmds.set_graphics_pipeline_state(Some(&pso));
    cmds.set_graphics_resource_group(0, Some(&group));
    device.dispatch_command_buffer(&cmds);

    let native = device.gl();
    assert_eq!(native.current_program(), pso_program(&pso));
    assert_eq!(native.bound_texture(2), Some(texture.id()));
    assert!((0..36).any(|i| native.bound_buffer_base(gl::UNIFORM_BUFFER, i) == Some(ubo.id())));

    // The device holds the group until it is replaced.
    drop(cmds);
    assert_eq!(Rc::strong_count(&group), 2);
    device.set_graphics_resource_group(0, None);
    assert_eq!(Rc::strong_count(&group), 1);
}

fn pso_program(pso: &Rc<PipelineState>) -> u32 {
    pso.program().id()
}

#[test]
fn resource_group_refcount() {
    let mut device = device();
    let rs = device.create_root_signature(&globals()).unwrap();

    let ubo = device
        .create_buffer(BufferDesc::new(BufferKind::Uniform, 64), None)
        .unwrap();
    let texture = device
        .create_texture(TextureDesc::default(), None)
        .unwrap();

    let group = device
        .create_resource_group(
            &rs,
            0,
            &[
                Resource::Buffer(ubo.clone()),
                Resource::Texture(texture.clone()),
            ],
            None,
        )
        .unwrap();

    assert_eq!(group.resources().len(), 2);
    assert_eq!(Rc::strong_count(&ubo), 2);
    assert_eq!(Rc::strong_count(&texture), 2);
    assert_eq!(Rc::strong_count(&rs), 2);

    drop(group);
    assert_eq!(Rc::strong_count(&ubo), 1);
    assert_eq!(Rc::strong_count(&texture), 1);
    assert_eq!(Rc::strong_count(&rs), 1);
}

#[test]
fn graphics_after_compute() {
    let mut device = device();
    let (rs, pso) = pipeline(&mut device);

    let program = device
        .create_compute_program(&rs, &ShaderSource::Glsl(CS.into()))
        .unwrap();
    let compute = device.create_compute_pipeline_state(&rs, &program).unwrap();

    let mut cmds = CommandBuffer::<Gl>::new();
    cmds.set_graphics_pipeline_state(Some(&pso));
    cmds.set_compute_root_signature(Some(&rs));
    cmds.set_compute_pipeline_state(Some(&compute));
    cmds.dispatch_compute(4, 2, 1);
    cmds.set_graphics_pipeline_state(Some(&pso));

    device.gl().clear_calls();
    device.dispatch_command_buffer(&cmds);

    // The compute program took the slot in between, the graphics program is restored.
    let calls = device.gl().calls();
    assert!(calls.contains(&GlCall::DispatchCompute(4, 2, 1)));
    assert_eq!(calls.last(), Some(&GlCall::UseProgram(pso_program(&pso))));
    assert_eq!(device.gl().current_program(), pso_program(&pso));
}

#[test]
fn rebind_pipeline_state() {
    let mut device = device();
    let (_, pso) = pipeline(&mut device);

    device.set_graphics_pipeline_state(Some(pso.clone()));
    device.gl().clear_calls();

    // Rebinding the same state only restores the program slot.
    device.set_graphics_pipeline_state(Some(pso.clone()));
    let calls = device.gl().calls();
    assert_eq!(calls, vec![GlCall::UseProgram(pso_program(&pso))]);
}

#[test]
fn draw_in_recording_order() {
    let mut device = device();
    let (rs, pso) = pipeline(&mut device);

    let mut rng = rand::thread_rng();
    let arguments: Vec<_> = (0..32)
        .map(|_| DrawArguments {
            vertex_count_per_instance: rng.gen_range(1, 1024),
            instance_count: rng.gen_range(1, 8),
            ..DrawArguments::default()
        })
        .collect();

    let mut cmds = CommandBuffer::<Gl>::new();
    cmds.set_graphics_root_signature(Some(&rs));
    cmds.set_graphics_pipeline_state(Some(&pso));
    for v in &arguments {
        cmds.draw_graphics_emulated(&[*v]);
    }

    device.gl().clear_calls();
    device.dispatch_command_buffer(&cmds);

    let expected: Vec<_> = arguments
        .iter()
        .map(|v| (v.vertex_count_per_instance as i32, v.instance_count as i32))
        .collect();

    assert_eq!(draws(&device.gl().calls()), expected);
}

#[test]
fn draw_without_pipeline_state() {
    let mut device = device();
    device.gl().clear_calls();

    device.draw_graphics_emulated(&DrawArguments::as_bytes(&[DrawArguments::new(3)]), 1);
    assert!(draws(&device.gl().calls()).is_empty());
}

#[test]
fn draw_indirect() {
    let mut device = device();
    let (_, pso) = pipeline(&mut device);

    let args = DrawArguments::as_bytes(&[DrawArguments::new(3), DrawArguments::new(6)]);
    let buffer = device
        .create_buffer(
            BufferDesc::new(BufferKind::Indirect { indexed: false }, args.len() as u32),
            Some(&args),
        )
        .unwrap();

    device.set_graphics_pipeline_state(Some(pso));
    device.gl().clear_calls();

    device.draw_graphics(&buffer, 0, 1);
    device.draw_graphics(&buffer, 0, 2);

    let calls = device.gl().calls();
    assert!(calls.contains(&GlCall::DrawArraysIndirect {
        mode: gl::TRIANGLES,
        offset: 0,
    }));

    assert!(calls.iter().any(|v| match *v {
        GlCall::MultiDrawArraysIndirect { draw_count, .. } => draw_count == 2,
        _ => false,
    }));
}

#[test]
fn draw_indirect_without_multi_draw() {
    let mut device = device_without("GL_ARB_multi_draw_indirect");
    assert!(device.capabilities().draw_indirect);
    assert!(!device.capabilities().multi_draw_indirect);

    let (_, pso) = pipeline(&mut device);
    let args = DrawArguments::as_bytes(&[DrawArguments::new(3); 3]);
    let buffer = device
        .create_buffer(
            BufferDesc::new(BufferKind::Indirect { indexed: false }, args.len() as u32),
            Some(&args),
        )
        .unwrap();

    device.set_graphics_pipeline_state(Some(pso));
    device.gl().clear_calls();
    device.draw_graphics(&buffer, 0, 3);

    let offsets: Vec<_> = device
        .gl()
        .calls()
        .iter()
        .filter_map(|v| match *v {
            GlCall::DrawArraysIndirect { offset, .. } => Some(offset),
            _ => None,
        })
        .collect();

    assert_eq!(
        offsets,
        vec![0, DrawArguments::SIZE, 2 * DrawArguments::SIZE]
    );
}

#[test]
fn clear() {
    let mut device = device();
    let window = Rc::new(HeadlessWindow::new(640, 480));
    let swap_chain = device
        .create_swap_chain(window, &SwapChainDesc::default())
        .unwrap();

    let mut cmds = CommandBuffer::<Gl>::new();
    cmds.set_graphics_render_target(Some(&RenderTarget::SwapChain(swap_chain.clone())));
    cmds.clear_graphics(
        ClearFlags {
            color: true,
            depth: true,
            stencil: false,
        },
        [0.0, 0.0, 0.0, 1.0],
        0.0,
        0,
    );

    device.gl().clear_calls();
    device.dispatch_command_buffer(&cmds);

    let calls = device.gl().calls();
    assert!(calls.contains(&GlCall::BindFramebuffer {
        target: gl::FRAMEBUFFER,
        framebuffer: 0,
    }));
    assert!(calls.contains(&GlCall::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT)));

    // Empty clears never reach the driver.
    device.gl().clear_calls();
    device.clear_graphics(ClearFlags::default(), [0.0; 4], 0.0, 0);
    assert!(device.gl().calls().is_empty());

    device.present(&swap_chain);
}

#[test]
fn framebuffer() {
    let mut device = device();
    let texture = device
        .create_texture_2d(
            128,
            128,
            TextureFormat::R8G8B8A8,
            TextureFlags {
                render_target: true,
                ..TextureFlags::default()
            },
            TextureUsage::Default,
            1,
            None,
        )
        .unwrap();

    let fbo = device
        .create_framebuffer(&[FramebufferAttachment::new(texture)], None)
        .unwrap();
    assert_eq!(RenderTarget::<Gl>::Framebuffer(fbo.clone()).width_and_height(), (128, 128));

    device.set_graphics_render_target(Some(RenderTarget::Framebuffer(fbo.clone())));
    assert_eq!(device.gl().framebuffer(), fbo.id());

    device.set_graphics_render_target(None);
    assert_eq!(device.gl().framebuffer(), 0);
}

#[test]
#[should_panic]
fn framebuffer_without_attachments() {
    let mut device = device();
    let _ = device.create_framebuffer(&[], None);
}

#[test]
fn occlusion_query() {
    let gl = HeadlessGl::new();
    gl.set_query_result(42);

    let mut device = OpenGLDevice::new(gl, DeviceParams::default()).unwrap();
    let pool = device.create_query_pool(QueryType::Occlusion, 4).unwrap();

    let mut cmds = CommandBuffer::<Gl>::new();
    cmds.begin_query(&pool, 1, QueryControlFlags { precise: true });
    cmds.end_query(&pool, 1);
    device.dispatch_command_buffer(&cmds);

    let mut data = [0u8; 8];
    let flags = QueryResultFlags::default();
    assert!(!device.get_query_pool_results(&pool, &mut data, 1, 1, 8, flags));

    let flags = QueryResultFlags { wait: true };
    assert!(device.get_query_pool_results(&pool, &mut data, 1, 1, 8, flags));
    assert_eq!(u64::from_le_bytes(data), 42);
}

#[test]
fn occlusion_query_unsupported() {
    let mut device = device_without("GL_ARB_occlusion_query");
    assert!(!device.capabilities().occlusion_query);

    let err = device
        .create_query_pool(QueryType::Occlusion, 1)
        .err()
        .unwrap();

    match err.downcast_ref::<Error>() {
        Some(Error::Unsupported(_)) => {}
        v => panic!("unexpected error {:?}", v),
    }
}

#[test]
#[should_panic]
fn query_pool_without_queries() {
    let mut device = device();
    let _ = device.create_query_pool(QueryType::Timestamp, 0);
}

#[test]
fn debug_markers() {
    let params = DeviceParams {
        debug: true,
        ..DeviceParams::default()
    };

    let mut device = OpenGLDevice::new(HeadlessGl::new(), params).unwrap();
    let (_, pso) = pipeline(&mut device);
    device.set_graphics_pipeline_state(Some(pso));

    let mut cmds = CommandBuffer::<Gl>::new();
    cmds.begin_debug_event("frame");
    cmds.set_debug_marker("shadows");
    cmds.end_debug_event();

    device.gl().clear_calls();
    device.dispatch_command_buffer(&cmds);

    let calls = device.gl().calls();
    assert!(calls.contains(&GlCall::PushDebugGroup("frame".into())));
    assert!(calls.contains(&GlCall::DebugMessage("shadows".into())));
    assert!(calls.contains(&GlCall::PopDebugGroup));
}

#[test]
fn debug_markers_disabled() {
    let mut device = device();
    let (_, pso) = pipeline(&mut device);
    device.set_graphics_pipeline_state(Some(pso.clone()));

    let mut cmds = CommandBuffer::<Gl>::new();
    cmds.begin_debug_event("frame");
    cmds.set_debug_marker("shadows");
    cmds.end_debug_event();

    device.gl().clear_calls();
    device.dispatch_command_buffer(&cmds);

    // Marker-only buffers neither talk to the driver nor touch the bound state.
    assert!(device.gl().calls().is_empty());
    assert_eq!(device.gl().current_program(), pso_program(&pso));
}

#[test]
fn map_uniform_buffer() {
    let mut device = device();
    let buffer = device
        .create_buffer(BufferDesc::new(BufferKind::Uniform, 16), None)
        .unwrap();

    let data = [1u8, 2, 3, 4];
    device.copy_uniform_buffer_data(&buffer, &data);

    let bytes = device.gl().buffer_data(buffer.id()).unwrap();
    assert_eq!(&bytes[0..4], &data);
}

#[test]
fn scissor_after_unbinding_render_target() {
    let mut device = device();
    let rasterizer = RasterizerState {
        scissor_enable: true,
        ..RasterizerState::default()
    };
    let (_, pso) = pipeline_with(&mut device, VS, rasterizer);

    device.set_graphics_pipeline_state(Some(pso.clone()));
    assert!(device.gl().is_enabled(gl::SCISSOR_TEST));

    device.set_graphics_render_target(None);
    assert!(!device.gl().is_enabled(gl::SCISSOR_TEST));

    // Setting the same state again brings its scissor test back.
    device.set_graphics_pipeline_state(Some(pso.clone()));
    device.draw_graphics_emulated(&DrawArguments::as_bytes(&[DrawArguments::new(3)]), 1);
    assert!(device.gl().is_enabled(gl::SCISSOR_TEST));

    // So does binding a render target while the state is bound.
    device.set_graphics_render_target(None);
    let window = Rc::new(HeadlessWindow::new(64, 64));
    let swap_chain = device
        .create_swap_chain(window, &SwapChainDesc::default())
        .unwrap();
    device.set_graphics_render_target(Some(RenderTarget::SwapChain(swap_chain)));
    assert!(device.gl().is_enabled(gl::SCISSOR_TEST));
}

fn start_instances(calls: &[GlCall]) -> Vec<Option<u32>> {
    calls
        .iter()
        .filter_map(|v| match *v {
            GlCall::Uniform1ui { value, .. } => Some(Some(value)),
            GlCall::DrawArraysInstanced { .. } => Some(None),
            _ => None,
        })
        .collect()
}

#[test]
fn start_instance_without_base_instance() {
    let mut device = device_without("GL_ARB_base_instance");
    assert!(!device.capabilities().base_instance);

    let (_, pso) = pipeline_with(&mut device, VS_DRAW_ID, RasterizerState::default());
    device.set_graphics_pipeline_state(Some(pso));

    let arguments: Vec<_> = [0, 5, 5, 7]
        .iter()
        .map(|&v| DrawArguments {
            start_instance_location: v,
            ..DrawArguments::new(3)
        })
        .collect();

    device.gl().clear_calls();
    device.draw_graphics_emulated(&DrawArguments::as_bytes(&arguments), 4);

    // The uniform is only written when the start instance changes.
    assert_eq!(
        start_instances(&device.gl().calls()),
        vec![Some(0), None, Some(5), None, None, Some(7), None]
    );
}

#[test]
fn start_instance_after_compute() {
    let mut device = device_without("GL_ARB_base_instance");
    let (rs, pso) = pipeline_with(&mut device, VS_DRAW_ID, RasterizerState::default());

    let program = device
        .create_compute_program(&rs, &ShaderSource::Glsl(CS.into()))
        .unwrap();
    let compute = device.create_compute_pipeline_state(&rs, &program).unwrap();

    let args = DrawArguments::as_bytes(&[DrawArguments {
        start_instance_location: 7,
        ..DrawArguments::new(3)
    }]);

    device.set_graphics_pipeline_state(Some(pso.clone()));
    device.draw_graphics_emulated(&args, 1);

    device.gl().clear_calls();
    device.draw_graphics_emulated(&args, 1);
    assert_eq!(start_instances(&device.gl().calls()), vec![None]);

    // The compute program takes the slot, so the uniform must be written again.
    device.set_compute_pipeline_state(Some(compute));
    device.set_graphics_pipeline_state(Some(pso));

    device.gl().clear_calls();
    device.draw_graphics_emulated(&args, 1);
    assert_eq!(start_instances(&device.gl().calls()), vec![Some(7), None]);
}

#[test]
#[should_panic]
fn resource_group_sampler_states_mismatch() {
    let mut device = device();
    let rs = device.create_root_signature(&globals()).unwrap();

    let ubo = device
        .create_buffer(BufferDesc::new(BufferKind::Uniform, 64), None)
        .unwrap();
    let texture = device
        .create_texture(TextureDesc::default(), None)
        .unwrap();
    let sampler = device
        .create_sampler_state(&SamplerStateDesc::default())
        .unwrap();

    let resources = [Resource::Buffer(ubo), Resource::Texture(texture)];
    let _ = device.create_resource_group(&rs, 0, &resources, Some(&[Some(sampler)]));
}
