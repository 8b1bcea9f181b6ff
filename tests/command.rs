extern crate crayon_rhi;

use std::rc::Rc;

use crayon_rhi::backends::gl::{HeadlessGl, OpenGLDevice};
use crayon_rhi::backends::vulkan::{HeadlessVk, VulkanDevice};
use crayon_rhi::prelude::*;

type Headless = Rhi<HeadlessGl, HeadlessVk>;

fn backends() -> Vec<Headless> {
    let params = DeviceParams {
        debug: true,
        ..DeviceParams::default()
    };

    let gl = OpenGLDevice::new(HeadlessGl::new(), params.clone()).unwrap();

    let params = DeviceParams {
        backend: BackendKind::Vulkan,
        ..params
    };

    let vk = VulkanDevice::new(HeadlessVk::new(), params).unwrap();
    vec![Rhi::OpenGL(gl), Rhi::Vulkan(vk)]
}

/// Records the same frame against whatever device it visits.
struct Frame;

impl DeviceVisitor for Frame {
    type Output = usize;

    fn visit<D: Device>(self, device: &mut D) -> usize {
        let desc = RootSignatureDesc::new(vec![RootParameter::new(vec![DescriptorRange::new(
            DescriptorRangeType::Ubv,
            0,
            "Globals",
            ResourceType::UniformBuffer,
            ShaderVisibility::All,
        )])]);

        let rs = device.create_root_signature(&desc).unwrap();
        let ubo = device
            .create_buffer(BufferDesc::new(BufferKind::Uniform, 64), None)
            .unwrap();
        let group = device
            .create_resource_group(&rs, 0, &[Resource::Buffer(ubo.clone())], None)
            .unwrap();

        let mut cmds = CommandBuffer::<D>::new();
        cmds.begin_debug_event("frame");
        cmds.set_graphics_root_signature(Some(&rs));
        cmds.set_graphics_resource_group(0, Some(&group));
        cmds.copy_uniform_buffer_data(&ubo, &[0; 64]);
        cmds.set_graphics_viewports(&[Viewport::new(64.0, 64.0)]);
        cmds.end_debug_event();

        device.dispatch_command_buffer(&cmds);
        let n = cmds.len();

        // Once dispatched and dropped, only the device and the group reference them.
        drop(cmds);
        assert_eq!(Rc::strong_count(&rs), 3);
        assert_eq!(Rc::strong_count(&group), 2);

        device.set_graphics_root_signature(None);
        assert_eq!(Rc::strong_count(&rs), 2);
        assert_eq!(Rc::strong_count(&group), 1);
        n
    }
}

#[test]
fn visit() {
    for mut rhi in backends() {
        assert_eq!(rhi.visit(Frame), 6);
    }
}

#[test]
fn backend() {
    let kinds: Vec<_> = backends().iter().map(|v| v.backend()).collect();
    assert_eq!(kinds, vec![BackendKind::OpenGL, BackendKind::Vulkan]);
}

#[test]
fn record() {
    let mut cmds = CommandBuffer::<OpenGLDevice<HeadlessGl>>::new();
    assert!(cmds.is_empty());

    cmds.set_debug_marker("a");
    cmds.draw_graphics_emulated(&[DrawArguments::new(3), DrawArguments::new(4)]);
    cmds.clear_graphics(ClearFlags::all(), [1.0; 4], 1.0, 0);
    assert_eq!(cmds.len(), 3);

    let functions: Vec<_> = cmds.iter().map(|v| v.function()).collect();
    assert_eq!(
        functions,
        vec![
            CommandFunction::SetDebugMarker,
            CommandFunction::DrawGraphics,
            CommandFunction::ClearGraphics,
        ]
    );

    cmds.clear();
    assert!(cmds.is_empty());
}

#[test]
fn draw_arguments_layout() {
    let args = [
        DrawArguments {
            vertex_count_per_instance: 3,
            instance_count: 2,
            start_vertex_location: 1,
            start_instance_location: 4,
        },
        DrawArguments::new(6),
    ];

    let bytes = DrawArguments::as_bytes(&args);
    assert_eq!(bytes.len(), 2 * DrawArguments::SIZE);
    assert_eq!(&bytes[0..4], &[3, 0, 0, 0]);
    assert_eq!(&bytes[12..16], &[4, 0, 0, 0]);
    assert_eq!(DrawArguments::read(&bytes, 1), args[1]);

    let args = [DrawIndexedArguments::new(36)];
    let bytes = DrawIndexedArguments::as_bytes(&args);
    assert_eq!(bytes.len(), DrawIndexedArguments::SIZE);
    assert_eq!(DrawIndexedArguments::read(&bytes, 0), args[0]);
}

#[test]
#[should_panic]
fn dispatch_empty() {
    let mut device = OpenGLDevice::new(HeadlessGl::new(), DeviceParams::default()).unwrap();
    let cmds = CommandBuffer::new();
    device.dispatch_command_buffer(&cmds);
}

#[test]
#[should_panic]
fn resource_group_mismatch() {
    let mut device = OpenGLDevice::new(HeadlessGl::new(), DeviceParams::default()).unwrap();
    let desc = RootSignatureDesc::new(vec![RootParameter::default()]);
    let rs = device.create_root_signature(&desc).unwrap();

    let ubo = device
        .create_buffer(BufferDesc::new(BufferKind::Uniform, 16), None)
        .unwrap();
    let _ = device.create_resource_group(&rs, 0, &[Resource::Buffer(ubo)], None);
}
