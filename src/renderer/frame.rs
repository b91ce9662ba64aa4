use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::renderer::camera::{Eye, StereoCamera, Trackball};
use crate::ui::state::RenderState;

pub const WORLD_OFFSET: Vec3 = Vec3::new(0.0, 0.0, -10.0);
pub const LIGHT_DIRECTION: Vec3 = Vec3::new(0.0, -1.0, 0.0);
pub const SURFACE_COLOR: [f32; 4] = [0.5, 0.5, 0.5, 1.0];

const BACKGROUND_DEPTH: f32 = -100.0;
const BACKGROUND_NEAR: f32 = 1.0;
const BACKGROUND_FAR: f32 = 20000.0;

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SurfaceUniforms {
    pub model_view_projection: [[f32; 4]; 4],
    pub world_view: [[f32; 4]; 4],
    pub world_inverse_transpose: [[f32; 4]; 4],
    pub light_world_position: [f32; 3],
    pub _pad0: f32,
    pub light_direction: [f32; 3],
    pub _pad1: f32,
    pub view_world_position: [f32; 3],
    pub _pad2: f32,
    pub color: [f32; 4],
    pub scale_point: [f32; 2],
    pub scale_value: f32,
    pub _pad3: f32,
}

impl SurfaceUniforms {
    pub fn for_eye(
        eye: Eye,
        camera: &StereoCamera,
        trackball: &Trackball,
        state: &RenderState,
    ) -> Self {
        let frustum = camera.frustum(eye);

        let world_view =
            frustum.view * Mat4::from_translation(WORLD_OFFSET) * trackball.view_matrix();
        let model_view_projection = frustum.projection * world_view;
        let world_inverse_transpose = world_view.inverse().transpose();

        Self {
            model_view_projection: model_view_projection.to_cols_array_2d(),
            world_view: world_view.to_cols_array_2d(),
            world_inverse_transpose: world_inverse_transpose.to_cols_array_2d(),
            light_world_position: state.light.position().to_array(),
            _pad0: 0.0,
            light_direction: LIGHT_DIRECTION.to_array(),
            _pad1: 0.0,
            view_world_position: Vec3::ZERO.to_array(),
            _pad2: 0.0,
            color: SURFACE_COLOR,
            scale_point: state.scale_point_uv(),
            scale_value: state.controller_scale,
            _pad3: 0.0,
        }
    }
}

pub struct FrameUniforms {
    pub eyes: [SurfaceUniforms; 2],
}

impl FrameUniforms {
    pub fn compute(base: StereoCamera, trackball: &Trackball, state: &RenderState) -> Self {
        let camera = state.camera(base);
        Self {
            eyes: Eye::BOTH.map(|eye| SurfaceUniforms::for_eye(eye, &camera, trackball, state)),
        }
    }

    pub fn eye(&self, eye: Eye) -> &SurfaceUniforms {
        &self.eyes[eye.index()]
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct BackgroundUniforms {
    pub model_view_projection: [[f32; 4]; 4],
}

impl BackgroundUniforms {
    pub fn for_viewport(width: f32, height: f32) -> Self {
        let projection = Mat4::orthographic_rh(
            -width / 2.0,
            width / 2.0,
            -height / 2.0,
            height / 2.0,
            BACKGROUND_NEAR,
            BACKGROUND_FAR,
        );
        let world_view = Mat4::from_translation(Vec3::new(0.0, 0.0, BACKGROUND_DEPTH));

        Self {
            model_view_projection: (projection * world_view).to_cols_array_2d(),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BackgroundVertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
}

// uvs mirrored horizontally
pub fn background_quad(width: f32, height: f32) -> [BackgroundVertex; 6] {
    let (w, h) = (width / 2.0, height / 2.0);
    let vertex = |x: f32, y: f32, u: f32, v: f32| BackgroundVertex {
        position: [x, y, 0.0],
        tex_coord: [u, v],
    };

    [
        vertex(-w, -h, 1.0, 1.0),
        vertex(-w, h, 1.0, 0.0),
        vertex(w, h, 0.0, 0.0),
        vertex(-w, -h, 1.0, 1.0),
        vertex(w, h, 0.0, 0.0),
        vertex(w, -h, 0.0, 1.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use approx::assert_abs_diff_eq;
    use glam::Vec4;

    fn base_camera() -> StereoCamera {
        StereoCamera::new(10.0, 7.0, 1.33, 45.0, 1.0, 20000.0)
    }

    #[test]
    fn uniform_layout_matches_shader() {
        assert_eq!(std::mem::size_of::<SurfaceUniforms>(), 272);
        assert_eq!(std::mem::size_of::<BackgroundUniforms>(), 64);
        assert_eq!(std::mem::size_of::<BackgroundVertex>(), 20);
    }

    #[test]
    fn eye_passes_differ_only_by_frustum() {
        let state = RenderState::from_config(&AppConfig::default());
        let frame = FrameUniforms::compute(base_camera(), &Trackball::default(), &state);

        let left = frame.eye(Eye::Left);
        let right = frame.eye(Eye::Right);
        assert_ne!(left.model_view_projection, right.model_view_projection);
        assert_eq!(left.light_world_position, right.light_world_position);
        assert_eq!(left.scale_point, right.scale_point);

        // world_view column 3 holds the eye shift plus the world offset
        assert_abs_diff_eq!(left.world_view[3][0], 3.5, epsilon = 1e-6);
        assert_abs_diff_eq!(right.world_view[3][0], -3.5, epsilon = 1e-6);
        assert_abs_diff_eq!(left.world_view[3][2], -10.0, epsilon = 1e-6);
    }

    #[test]
    fn frame_reads_live_state() {
        let mut state = RenderState::from_config(&AppConfig::default());
        state.light.counter = 1.0;
        state.scale_point_u = 180.0;
        state.scale_point_v = 45.0;
        state.controller_scale = 1.5;

        let frame = FrameUniforms::compute(base_camera(), &Trackball::default(), &state);
        let left = frame.eye(Eye::Left);

        assert_eq!(left.light_world_position, state.light.position().to_array());
        assert_eq!(left.scale_point, [0.5, 0.5]);
        assert_eq!(left.scale_value, 1.5);
        assert_eq!(left.color, SURFACE_COLOR);
        assert_eq!(left.light_direction, [0.0, -1.0, 0.0]);
    }

    #[test]
    fn surface_origin_lands_in_front_of_both_eyes() {
        let state = RenderState::from_config(&AppConfig::default());
        let frame = FrameUniforms::compute(base_camera(), &Trackball::default(), &state);

        for eye in Eye::BOTH {
            let mvp = Mat4::from_cols_array_2d(&frame.eye(eye).model_view_projection);
            let clip = mvp * Vec4::new(0.0, 0.0, 0.0, 1.0);
            let ndc = clip.truncate() / clip.w;
            assert!(clip.w > 0.0);
            assert!(ndc.x.abs() < 1.0 && ndc.y.abs() < 1.0);
            assert!(ndc.z > 0.0 && ndc.z < 1.0);
        }
    }

    #[test]
    fn background_quad_fills_viewport() {
        let uniforms = BackgroundUniforms::for_viewport(800.0, 600.0);
        let mvp = Mat4::from_cols_array_2d(&uniforms.model_view_projection);

        for vertex in background_quad(800.0, 600.0) {
            let p = Vec3::from_array(vertex.position).extend(1.0);
            let clip = mvp * p;
            assert_abs_diff_eq!(clip.x.abs(), 1.0, epsilon = 1e-6);
            assert_abs_diff_eq!(clip.y.abs(), 1.0, epsilon = 1e-6);
            assert!(clip.z > 0.0 && clip.z < 1.0);
        }
    }

    #[test]
    fn background_is_mirrored_horizontally() {
        let quad = background_quad(2.0, 2.0);
        let bottom_left = quad[0];
        let top_right = quad[2];

        assert_eq!(bottom_left.position, [-1.0, -1.0, 0.0]);
        assert_eq!(bottom_left.tex_coord, [1.0, 1.0]);
        assert_eq!(top_right.tex_coord, [0.0, 0.0]);
    }
}
