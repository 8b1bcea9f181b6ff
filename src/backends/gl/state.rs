use gl;
use gl::types::*;

use crate::rhi::pipeline::{
    BlendState, CullMode, DepthStencilState, RasterizerState, RenderTargetBlendDesc,
};

use super::api::GlApi;

/// The fixed-function state of the context as far as we know it. `None` means unknown,
/// the next apply always reaches the driver.
#[derive(Debug, Default)]
pub(crate) struct GlMutableState {
    rasterizer: Option<RasterizerState>,
    depth_stencil: Option<DepthStencilState>,
    blend: Option<RenderTargetBlendDesc>,
    alpha_to_coverage: Option<bool>,
    viewport: Option<[GLint; 4]>,
    depth_range: Option<(f32, f32)>,
    scissor: Option<[GLint; 4]>,
    scissor_test: Option<bool>,
}

#[inline]
fn changed<T: PartialEq>(last: Option<T>, v: T) -> bool {
    match last {
        Some(last) => last != v,
        None => true,
    }
}

unsafe fn toggle<G: GlApi>(gl: &G, cap: GLenum, enable: bool) {
    if enable {
        gl.enable(cap);
    } else {
        gl.disable(cap);
    }
}

impl GlMutableState {
    /// Forgets everything, some code outside has touched the context.
    pub fn invalidate(&mut self) {
        *self = GlMutableState::default();
    }

    pub unsafe fn set_rasterizer<G: GlApi>(&mut self, gl: &G, rs: &RasterizerState) {
        let last = self.rasterizer;

        if changed(last.map(|v| v.cull_mode), rs.cull_mode) {
            if rs.cull_mode != CullMode::None {
                gl.enable(gl::CULL_FACE);
                gl.cull_face(rs.cull_mode.into());
            } else {
                gl.disable(gl::CULL_FACE);
            }
        }

        if changed(last.map(|v| v.front_counter_clockwise), rs.front_counter_clockwise) {
            gl.front_face(if rs.front_counter_clockwise {
                gl::CCW
            } else {
                gl::CW
            });
        }

        if changed(last.map(|v| v.fill_mode), rs.fill_mode) {
            gl.polygon_mode(gl::FRONT_AND_BACK, rs.fill_mode.into());
        }

        let offset = (rs.depth_bias, rs.slope_scaled_depth_bias);
        if changed(last.map(|v| (v.depth_bias, v.slope_scaled_depth_bias)), offset) {
            if offset.0 != 0 || offset.1 != 0.0 {
                gl.enable(gl::POLYGON_OFFSET_FILL);
                gl.polygon_offset(offset.1, offset.0 as GLfloat);
            } else {
                gl.disable(gl::POLYGON_OFFSET_FILL);
            }
        }

        if changed(last.map(|v| v.depth_clip_enable), rs.depth_clip_enable) {
            toggle(gl, gl::DEPTH_CLAMP, !rs.depth_clip_enable);
        }

        if changed(last.map(|v| v.multisample_enable), rs.multisample_enable) {
            toggle(gl, gl::MULTISAMPLE, rs.multisample_enable);
        }

        if changed(last.map(|v| v.antialiased_line_enable), rs.antialiased_line_enable) {
            toggle(gl, gl::LINE_SMOOTH, rs.antialiased_line_enable);
        }

        self.set_scissor_test(gl, rs.scissor_enable);
        self.rasterizer = Some(*rs);
    }

    pub unsafe fn set_depth_stencil<G: GlApi>(&mut self, gl: &G, ds: &DepthStencilState) {
        let last = self.depth_stencil;

        if changed(last.map(|v| v.depth_enable), ds.depth_enable) {
            toggle(gl, gl::DEPTH_TEST, ds.depth_enable);
        }

        if changed(last.map(|v| v.depth_write_mask), ds.depth_write_mask) {
            gl.depth_mask(ds.depth_write_mask);
        }

        if changed(last.map(|v| v.depth_func), ds.depth_func) {
            gl.depth_func(ds.depth_func.into());
        }

        if changed(last.map(|v| v.stencil_enable), ds.stencil_enable) {
            toggle(gl, gl::STENCIL_TEST, ds.stencil_enable);
        }

        if changed(last.map(|v| v.stencil_write_mask), ds.stencil_write_mask) {
            gl.stencil_mask(GLuint::from(ds.stencil_write_mask));
        }

        self.depth_stencil = Some(*ds);
    }

    /// Only the first render target description is used, we never enable independent
    /// blending on OpenGL.
    pub unsafe fn set_blend<G: GlApi>(&mut self, gl: &G, blend: &BlendState) {
        if changed(self.alpha_to_coverage, blend.alpha_to_coverage_enable) {
            toggle(gl, gl::SAMPLE_ALPHA_TO_COVERAGE, blend.alpha_to_coverage_enable);
            self.alpha_to_coverage = Some(blend.alpha_to_coverage_enable);
        }

        let rt = blend.render_target[0];
        let last = self.blend;

        if changed(last.map(|v| v.blend_enable), rt.blend_enable) {
            toggle(gl, gl::BLEND, rt.blend_enable);
        }

        let factors = (
            rt.src_blend,
            rt.dest_blend,
            rt.src_blend_alpha,
            rt.dest_blend_alpha,
        );

        let last_factors = last.map(|v| {
            (
                v.src_blend,
                v.dest_blend,
                v.src_blend_alpha,
                v.dest_blend_alpha,
            )
        });

        if changed(last_factors, factors) {
            gl.blend_func_separate(
                factors.0.into(),
                factors.1.into(),
                factors.2.into(),
                factors.3.into(),
            );
        }

        let equations = (rt.blend_op, rt.blend_op_alpha);
        if changed(last.map(|v| (v.blend_op, v.blend_op_alpha)), equations) {
            gl.blend_equation_separate(equations.0.into(), equations.1.into());
        }

        let mask = rt.render_target_write_mask;
        if changed(last.map(|v| v.render_target_write_mask), mask) {
            gl.color_mask(mask & 1 != 0, mask & 2 != 0, mask & 4 != 0, mask & 8 != 0);
        }

        self.blend = Some(rt);
    }

    /// Sets the viewport in lower-left origin window coordinates.
    pub unsafe fn set_viewport<G: GlApi>(&mut self, gl: &G, vp: [GLint; 4], depth: (f32, f32)) {
        if changed(self.viewport, vp) {
            gl.viewport(vp[0], vp[1], vp[2], vp[3]);
            self.viewport = Some(vp);
        }

        if changed(self.depth_range, depth) {
            gl.depth_range(f64::from(depth.0), f64::from(depth.1));
            self.depth_range = Some(depth);
        }
    }

    /// Sets the scissor box in lower-left origin window coordinates.
    pub unsafe fn set_scissor<G: GlApi>(&mut self, gl: &G, rect: [GLint; 4]) {
        if changed(self.scissor, rect) {
            gl.scissor(rect[0], rect[1], rect[2], rect[3]);
            self.scissor = Some(rect);
        }
    }

    pub unsafe fn set_scissor_test<G: GlApi>(&mut self, gl: &G, enable: bool) {
        if changed(self.scissor_test, enable) {
            toggle(gl, gl::SCISSOR_TEST, enable);
            self.scissor_test = Some(enable);
        }
    }

    /// The depth write mask which is currently set, clears must restore it.
    pub fn depth_write_mask(&self) -> Option<bool> {
        self.depth_stencil.map(|v| v.depth_write_mask)
    }

    /// The color write mask which is currently set.
    pub fn color_write_mask(&self) -> Option<u8> {
        self.blend.map(|v| v.render_target_write_mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::gl::headless::{GlCall, HeadlessGl};

    #[test]
    fn redundant() {
        let gl = HeadlessGl::new();
        let mut state = GlMutableState::default();

        unsafe {
            state.set_viewport(&gl, [0, 0, 64, 64], (0.0, 1.0));
            state.set_viewport(&gl, [0, 0, 64, 64], (0.0, 1.0));

            let rs = RasterizerState::default();
            state.set_rasterizer(&gl, &rs);
            gl.clear_calls();
            state.set_rasterizer(&gl, &rs);
            assert!(gl.calls().is_empty());

            state.invalidate();
            state.set_viewport(&gl, [0, 0, 64, 64], (0.0, 1.0));
        }

        let viewports = gl
            .calls()
            .iter()
            .filter(|v| match **v {
                GlCall::Viewport(..) => true,
                _ => false,
            })
            .count();

        assert_eq!(viewports, 1);
    }
}
