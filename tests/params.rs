extern crate crayon_rhi;
extern crate gl;

use crayon_rhi::backends::gl::{HeadlessGl, OpenGLDevice};
use crayon_rhi::prelude::*;

#[test]
fn from_json() {
    let src = r#"
    {
        "backend": "OpenGL",
        "validation": true,
        "max_multisamples": 2,
        "max_resource_groups": 64,
        "shader_language": "GLSL"
    }"#;

    let params = DeviceParams::from_json(src).unwrap();
    assert!(params.validation);
    assert!(!params.debug);
    assert_eq!(params.max_resource_groups, 64);

    let device = OpenGLDevice::new(HeadlessGl::new(), params).unwrap();
    assert_eq!(device.capabilities().max_multisamples, 2);
    assert!(device.shader_language(Some("SPIR-V")).is_err());
}

#[test]
fn invalid() {
    assert!(DeviceParams::from_json(r#"{ "backend": "Metal" }"#).is_err());
    assert!(DeviceParams::from_json(r#"{ "max_resource_groups": 0 }"#).is_err());
    assert!(DeviceParams::from_json("[]").is_err());
}

#[test]
fn unknown_shader_language() {
    let params = DeviceParams {
        shader_language: Some("HLSL".into()),
        ..DeviceParams::default()
    };

    let err = OpenGLDevice::new(HeadlessGl::new(), params).err().unwrap();
    match err.downcast_ref::<Error>() {
        Some(Error::Requirement(_)) => {}
        v => panic!("unexpected error {:?}", v),
    }
}

#[test]
fn multisample_ceiling() {
    let context = HeadlessGl::new();
    context.set_integer(gl::MAX_SAMPLES, 4);

    let device = OpenGLDevice::new(context, DeviceParams::default()).unwrap();
    assert_eq!(device.capabilities().max_multisamples, 4);
    assert_eq!(device.capabilities().multisamples(16), 4);
    assert_eq!(device.capabilities().multisamples(3), 2);
}
