extern crate ash;
extern crate crayon_rhi;
extern crate env_logger;

use std::rc::Rc;

use ash::vk;

use crayon_rhi::backends::vulkan::headless::SPIRV_MAGIC;
use crayon_rhi::backends::vulkan::{DescriptorInfo, HeadlessVk, VkCall, VulkanDevice};
use crayon_rhi::prelude::*;
use crayon_rhi::window::HeadlessWindow;

type Vk = VulkanDevice<HeadlessVk>;

fn params() -> DeviceParams {
    DeviceParams {
        backend: BackendKind::Vulkan,
        ..DeviceParams::default()
    }
}

fn device() -> Vk {
    let _ = env_logger::try_init();
    VulkanDevice::new(HeadlessVk::new(), params()).unwrap()
}

fn spirv() -> ShaderSource {
    ShaderSource::SpirV(vec![SPIRV_MAGIC, 0x0001_0000, 0, 1, 0])
}

fn globals() -> RootSignatureDesc {
    RootSignatureDesc::new(vec![RootParameter::new(vec![DescriptorRange::new(
        DescriptorRangeType::Ubv,
        0,
        "Globals",
        ResourceType::UniformBuffer,
        ShaderVisibility::All,
    )])])
}

fn render_target(device: &mut Vk, format: TextureFormat) -> Rc<<Vk as Device>::Texture> {
    device
        .create_texture_2d(
            256,
            128,
            format,
            TextureFlags {
                render_target: true,
                ..TextureFlags::default()
            },
            TextureUsage::Default,
            1,
            None,
        )
        .unwrap()
}

#[test]
fn create() {
    let device = device();
    assert_eq!(device.name(), "Vulkan");
    assert_eq!(
        device.shader_language(None).unwrap(),
        ShaderLanguage::SpirV
    );
    assert_eq!(device.capabilities().max_multisamples, 8);
    assert!(device.vk().validation_errors().is_empty());
}

#[test]
fn create_with_glsl() {
    let params = DeviceParams {
        shader_language: Some("glsl".into()),
        ..params()
    };

    assert!(VulkanDevice::new(HeadlessVk::new(), params).is_err());
}

#[test]
fn shader_module_failure() {
    let mut device = device();
    let rs = device.create_root_signature(&globals()).unwrap();

    let sources = GraphicsShaderSources::new(
        ShaderSource::SpirV(vec![0xdead_beef, 0, 0, 0, 0]),
        spirv(),
    );

    let err = device
        .create_graphics_program(&rs, &VertexAttributes::default(), &sources)
        .err()
        .unwrap();

    match err.downcast_ref::<Error>() {
        Some(Error::ShaderCreationFailure(_)) => {}
        v => panic!("unexpected error {:?}", v),
    }

    let sources = GraphicsShaderSources::new(
        ShaderSource::Glsl("void main() {}".into()),
        ShaderSource::Glsl("void main() {}".into()),
    );

    assert!(device
        .create_graphics_program(&rs, &VertexAttributes::default(), &sources)
        .is_err());
}

#[test]
fn draw() {
    let mut device = device();
    let rs = device.create_root_signature(&globals()).unwrap();

    let sources = GraphicsShaderSources::new(spirv(), spirv());
    let program = device
        .create_graphics_program(&rs, &VertexAttributes::default(), &sources)
        .unwrap();

    let pso = device
        .create_graphics_pipeline_state(&GraphicsPipelineStateDesc::<Vk>::new(
            rs.clone(),
            program,
        ))
        .unwrap();

    let color = render_target(&mut device, TextureFormat::R8G8B8A8);
    let depth = render_target(&mut device, TextureFormat::D32Float);
    let fbo = device
        .create_framebuffer(
            &[FramebufferAttachment::new(color)],
            Some(&FramebufferAttachment::new(depth)),
        )
        .unwrap();

    let ubo = device
        .create_buffer(BufferDesc::new(BufferKind::Uniform, 64), None)
        .unwrap();
    let group = device
        .create_resource_group(&rs, 0, &[Resource::Buffer(ubo)], None)
        .unwrap();

    let mut cmds = CommandBuffer::<Vk>::new();
    cmds.set_graphics_render_target(Some(&RenderTarget::Framebuffer(fbo.clone())));
    cmds.set_graphics_root_signature(Some(&rs));
    cmds.set_graphics_pipeline_state(Some(&pso));
    cmds.set_graphics_resource_group(0, Some(&group));
    cmds.clear_graphics(ClearFlags::all(), [0.0; 4], 0.0, 0);
    cmds.draw_graphics_emulated(&[DrawArguments::new(3), DrawArguments::new(6)]);

    device.vk().clear_calls();
    device.dispatch_command_buffer(&cmds);

    let calls = device.vk().calls();
    match calls[0] {
        VkCall::BeginRenderPass { framebuffer, .. } => assert_eq!(framebuffer, fbo.framebuffer()),
        ref v => panic!("unexpected call {:?}", v),
    }

    assert!(calls.contains(&VkCall::ClearAttachments(2)));
    assert!(calls.contains(&VkCall::BindDescriptorSet {
        bind_point: vk::PipelineBindPoint::GRAPHICS,
        index: 0,
        set: group.descriptor_set(),
    }));

    // The pipeline and the set are bound once for both draws.
    let binds = calls
        .iter()
        .filter(|v| match **v {
            VkCall::BindPipeline { .. } | VkCall::BindDescriptorSet { .. } => true,
            _ => false,
        })
        .count();
    assert_eq!(binds, 2);

    let draws: Vec<_> = calls
        .iter()
        .filter_map(|v| match *v {
            VkCall::Draw { vertex_count, .. } => Some(vertex_count),
            _ => None,
        })
        .collect();
    assert_eq!(draws, vec![3, 6]);

    let n = calls.len();
    assert_eq!(&calls[n - 2..], &[VkCall::EndRenderPass, VkCall::Submit]);
    assert!(device.vk().validation_errors().is_empty());
}

#[test]
fn draw_without_render_target() {
    let mut device = device();
    let rs = device.create_root_signature(&globals()).unwrap();

    let sources = GraphicsShaderSources::new(spirv(), spirv());
    let program = device
        .create_graphics_program(&rs, &VertexAttributes::default(), &sources)
        .unwrap();
    let pso = device
        .create_graphics_pipeline_state(&GraphicsPipelineStateDesc::<Vk>::new(rs, program))
        .unwrap();

    device.vk().clear_calls();
    device.set_graphics_pipeline_state(Some(pso));
    device.draw_graphics_emulated(&DrawArguments::as_bytes(&[DrawArguments::new(3)]), 1);

    assert!(device.vk().calls().is_empty());
}

#[test]
fn dispatch_compute() {
    let mut device = device();
    let rs = device.create_root_signature(&globals()).unwrap();
    let program = device.create_compute_program(&rs, &spirv()).unwrap();
    let pso = device.create_compute_pipeline_state(&rs, &program).unwrap();

    let mut cmds = CommandBuffer::<Vk>::new();
    cmds.set_compute_root_signature(Some(&rs));
    cmds.set_compute_pipeline_state(Some(&pso));
    cmds.dispatch_compute(8, 4, 1);

    device.vk().clear_calls();
    device.dispatch_command_buffer(&cmds);

    let calls = device.vk().calls();
    assert!(calls.contains(&VkCall::Dispatch(8, 4, 1)));
    assert_eq!(calls.last(), Some(&VkCall::Submit));
    assert!(device.vk().validation_errors().is_empty());
}

#[test]
fn copy_buffer() {
    let mut device = device();
    let data = [7u8; 32];

    let src = device
        .create_buffer(BufferDesc::new(BufferKind::Uniform, 32), Some(&data))
        .unwrap();
    let dst = device
        .create_buffer(BufferDesc::new(BufferKind::Uniform, 32), None)
        .unwrap();

    device.vk().clear_calls();
    device.copy_resource(&Resource::Buffer(dst.clone()), &Resource::Buffer(src.clone()));

    let calls = device.vk().calls();
    assert_eq!(
        calls[0],
        VkCall::CopyBuffer {
            src: src.buffer(),
            dst: dst.buffer(),
            size: 32,
        }
    );
}

#[test]
fn occlusion_query() {
    let mut device = device();
    device.vk().set_query_result(42);

    let pool = device.create_query_pool(QueryType::Occlusion, 2).unwrap();

    let mut cmds = CommandBuffer::<Vk>::new();
    cmds.begin_query(&pool, 0, QueryControlFlags { precise: true });
    cmds.end_query(&pool, 0);
    device.dispatch_command_buffer(&cmds);

    let mut data = [0u8; 8];
    let flags = QueryResultFlags::default();
    assert!(!device.get_query_pool_results(&pool, &mut data, 0, 1, 8, flags));

    let flags = QueryResultFlags { wait: true };
    assert!(device.get_query_pool_results(&pool, &mut data, 0, 1, 8, flags));
    assert_eq!(u64::from_le_bytes(data), 42);
}

#[test]
fn pipeline_statistics_query() {
    let mut device = device();
    device.vk().set_query_latency(0);
    device.vk().set_query_result(5);

    let pool = device
        .create_query_pool(QueryType::PipelineStatistics, 1)
        .unwrap();

    let mut cmds = CommandBuffer::<Vk>::new();
    cmds.begin_query(&pool, 0, QueryControlFlags::default());
    cmds.end_query(&pool, 0);
    device.dispatch_command_buffer(&cmds);

    let mut data = vec![0u8; PipelineStatisticsQueryResult::SIZE];
    let flags = QueryResultFlags { wait: true };
    let size = PipelineStatisticsQueryResult::SIZE as u32;
    assert!(device.get_query_pool_results(&pool, &mut data, 0, 1, size, flags));

    let v = PipelineStatisticsQueryResult::read(&data);
    assert!(v.counters().iter().all(|&v| v == 5));
}

#[test]
#[should_panic]
fn query_out_of_bounds() {
    let mut device = device();
    let pool = device.create_query_pool(QueryType::Occlusion, 2).unwrap();

    let mut data = [0u8; 16];
    device.get_query_pool_results(&pool, &mut data, 1, 2, 8, QueryResultFlags::default());
}

#[test]
fn present() {
    let mut device = device();
    let window = Rc::new(HeadlessWindow::new(640, 480));
    let swap_chain = device
        .create_swap_chain(window, &SwapChainDesc::default())
        .unwrap();
    assert_eq!(
        RenderTarget::<Vk>::SwapChain(swap_chain.clone()).width_and_height(),
        (640, 480)
    );

    device.vk().clear_calls();
    for _ in 0..3 {
        device.present(&swap_chain);
    }

    let indices: Vec<_> = device
        .vk()
        .calls()
        .iter()
        .filter_map(|v| match *v {
            VkCall::Present { index, .. } => Some(index),
            _ => None,
        })
        .collect();

    // Two buffers, presented in turn.
    assert_eq!(indices, vec![0, 1, 0]);
}

#[test]
fn release_objects() {
    let mut device = device();
    let live = device.vk().live_objects();

    {
        let rs = device.create_root_signature(&globals()).unwrap();
        let ubo = device
            .create_buffer(BufferDesc::new(BufferKind::Uniform, 64), None)
            .unwrap();
        let group = device
            .create_resource_group(&rs, 0, &[Resource::Buffer(ubo)], None)
            .unwrap();

        let window = Rc::new(HeadlessWindow::new(64, 64));
        let swap_chain = device
            .create_swap_chain(window, &SwapChainDesc::default())
            .unwrap();

        let mut cmds = CommandBuffer::<Vk>::new();
        cmds.set_graphics_root_signature(Some(&rs));
        cmds.set_graphics_resource_group(0, Some(&group));
        cmds.set_graphics_render_target(Some(&RenderTarget::SwapChain(swap_chain)));
        device.dispatch_command_buffer(&cmds);

        device.set_graphics_render_target(None);
        device.set_graphics_root_signature(None);
    }

    assert_eq!(device.vk().live_objects(), live);
    assert!(device.vk().validation_errors().is_empty());
}

#[test]
fn debug_labels() {
    let params = DeviceParams {
        debug: true,
        ..params()
    };

    let mut device = VulkanDevice::new(HeadlessVk::new(), params).unwrap();

    let mut cmds = CommandBuffer::<Vk>::new();
    cmds.begin_debug_event("frame");
    cmds.set_debug_marker("shadows");
    cmds.end_debug_event();

    device.vk().clear_calls();
    device.dispatch_command_buffer(&cmds);

    assert_eq!(
        device.vk().calls(),
        vec![
            VkCall::BeginDebugLabel("frame".into()),
            VkCall::InsertDebugLabel("shadows".into()),
            VkCall::EndDebugLabel,
            VkCall::Submit,
        ]
    );
}

fn material() -> RootSignatureDesc {
    RootSignatureDesc::new(vec![RootParameter::new(vec![
        DescriptorRange::new(
            DescriptorRangeType::Srv,
            0,
            "Albedo",
            ResourceType::Texture2D,
            ShaderVisibility::Fragment,
        ),
        DescriptorRange::new(
            DescriptorRangeType::Ubv,
            1,
            "Globals",
            ResourceType::UniformBuffer,
            ShaderVisibility::All,
        ),
        DescriptorRange::new(
            DescriptorRangeType::Srv,
            2,
            "Vertices",
            ResourceType::VertexBuffer,
            ShaderVisibility::Vertex,
        ),
        DescriptorRange::new(
            DescriptorRangeType::Uav,
            3,
            "Particles",
            ResourceType::StructuredBuffer,
            ShaderVisibility::All,
        ),
    ])])
}

fn shader_resource(device: &mut Vk) -> Rc<<Vk as Device>::Texture> {
    device
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
        .unwrap()
}

#[test]
fn resource_group_descriptors() {
    let mut device = device();
    let rs = device.create_root_signature(&material()).unwrap();

    let texture = shader_resource(&mut device);
    let ubo = device
        .create_buffer(BufferDesc::new(BufferKind::Uniform, 64), None)
        .unwrap();
    let vertices = device
        .create_buffer(BufferDesc::new(BufferKind::Vertex, 96), None)
        .unwrap();
    let particles = device
        .create_buffer(BufferDesc::new(BufferKind::Structured { stride: 16 }, 256), None)
        .unwrap();

    let resources = [
        Resource::Texture(texture.clone()),
        Resource::Buffer(ubo.clone()),
        Resource::Buffer(vertices.clone()),
        Resource::Buffer(particles.clone()),
    ];

    let group = device
        .create_resource_group(&rs, 0, &resources, None)
        .unwrap();
    let set = group.descriptor_set();
    let vk = device.vk();

    // Slots without a sampler state fall back to the default sampler.
    assert_eq!(
        vk.descriptor(set, 0),
        Some(DescriptorInfo::Image {
            view: texture.view(),
            layout: texture.layout(),
            sampler: device.default_sampler().sampler(),
        })
    );

    assert_eq!(
        vk.descriptor(set, 1),
        Some(DescriptorInfo::Buffer {
            buffer: ubo.buffer(),
            range: 64,
        })
    );

    // Vertex and structured buffers are read raw through storage buffers.
    assert_eq!(rs.descriptor_type(0, 1), vk::DescriptorType::UNIFORM_BUFFER);
    assert_eq!(rs.descriptor_type(0, 2), vk::DescriptorType::STORAGE_BUFFER);
    assert_eq!(rs.descriptor_type(0, 3), vk::DescriptorType::STORAGE_BUFFER);
    assert_eq!(
        vk.descriptor(set, 2),
        Some(DescriptorInfo::Buffer {
            buffer: vertices.buffer(),
            range: 96,
        })
    );
    assert_eq!(
        vk.descriptor(set, 3),
        Some(DescriptorInfo::Buffer {
            buffer: particles.buffer(),
            range: 256,
        })
    );

    assert!(vk.validation_errors().is_empty());
}

#[test]
fn resource_group_sampler_state() {
    let mut device = device();
    let rs = device.create_root_signature(&material()).unwrap();

    let texture = shader_resource(&mut device);
    let sampler = device
        .create_sampler_state(&SamplerStateDesc::default())
        .unwrap();
    let ubo = device
        .create_buffer(BufferDesc::new(BufferKind::Uniform, 64), None)
        .unwrap();
    let vertices = device
        .create_buffer(BufferDesc::new(BufferKind::Vertex, 96), None)
        .unwrap();

    let resources = [
        Resource::Texture(texture.clone()),
        Resource::Buffer(ubo),
        Resource::Buffer(vertices.clone()),
        Resource::Buffer(vertices),
    ];

    let samplers = [Some(sampler.clone()), None, None, None];
    let group = device
        .create_resource_group(&rs, 0, &resources, Some(&samplers))
        .unwrap();

    match device.vk().descriptor(group.descriptor_set(), 0) {
        Some(DescriptorInfo::Image { sampler: v, .. }) => assert_eq!(v, sampler.sampler()),
        v => panic!("unexpected descriptor {:?}", v),
    }
}

#[test]
fn resource_group_refcount() {
    let mut device = device();
    let rs = device.create_root_signature(&globals()).unwrap();
    let ubo = device
        .create_buffer(BufferDesc::new(BufferKind::Uniform, 64), None)
        .unwrap();

    let group = device
        .create_resource_group(&rs, 0, &[Resource::Buffer(ubo.clone())], None)
        .unwrap();
    let set = group.descriptor_set();
    let layout = rs.pipeline_layout();

    assert_eq!(Rc::strong_count(&ubo), 2);
    assert_eq!(Rc::strong_count(&rs), 2);
    assert!(device.vk().is_alive(set));

    // The set goes back into the pool while the root signature is still alive.
    drop(group);
    assert_eq!(Rc::strong_count(&ubo), 1);
    assert_eq!(Rc::strong_count(&rs), 1);
    assert!(!device.vk().is_alive(set));
    assert!(device.vk().is_alive(layout));

    drop(rs);
    assert!(!device.vk().is_alive(layout));
    assert!(device.vk().validation_errors().is_empty());
}

#[test]
#[should_panic]
fn resource_group_sampler_states_mismatch() {
    let mut device = device();
    let rs = device.create_root_signature(&globals()).unwrap();
    let ubo = device
        .create_buffer(BufferDesc::new(BufferKind::Uniform, 64), None)
        .unwrap();

    let _ = device.create_resource_group(&rs, 0, &[Resource::Buffer(ubo)], Some(&[None, None]));
}
