use crate::config::AppConfig;
use crate::math::LightAnimation;
use crate::renderer::StereoCamera;

pub const SCALE_POINT_U_MAX: f32 = 360.0;
pub const SCALE_POINT_V_MAX: f32 = 90.0;

pub struct RenderState {
    pub convergence: f32,
    pub eye_separation: f32,
    pub fov_deg: f32,
    pub near: f32,

    pub convergence_range: (f32, f32),
    pub eye_separation_range: (f32, f32),
    pub fov_range: (f32, f32),
    pub near_range: (f32, f32),

    pub light: LightAnimation,

    pub scale_point_u: f32,
    pub scale_point_v: f32,
    pub scale_point_step: f32,

    pub controller_scale: f32,
    pub scale_step: f32,
    pub scale_range: (f32, f32),

    pub vsync_enabled: bool,
    pub show_stats: bool,
}

impl RenderState {
    pub fn from_config(config: &AppConfig) -> Self {
        let camera = &config.camera;
        let controls = &config.controls;

        Self {
            convergence: camera.convergence,
            eye_separation: camera.eye_separation,
            fov_deg: camera.fov_deg,
            near: camera.near,

            convergence_range: camera.convergence_range,
            eye_separation_range: camera.eye_separation_range,
            fov_range: camera.fov_range,
            near_range: camera.near_range,

            light: LightAnimation::new(controls.light_step),

            scale_point_u: 0.0,
            scale_point_v: 0.0,
            scale_point_step: controls.scale_point_step,

            controller_scale: 1.0_f32.clamp(controls.scale_range.0, controls.scale_range.1),
            scale_step: controls.scale_step,
            scale_range: controls.scale_range,

            vsync_enabled: config.window.vsync,
            show_stats: true,
        }
    }

    pub fn camera(&self, base: StereoCamera) -> StereoCamera {
        base.with(self.convergence, self.eye_separation, self.fov_deg, self.near)
    }

    pub fn step_scale_point_u(&mut self, direction: f32) {
        self.scale_point_u = (self.scale_point_u + direction * self.scale_point_step)
            .clamp(0.0, SCALE_POINT_U_MAX);
    }

    pub fn step_scale_point_v(&mut self, direction: f32) {
        self.scale_point_v = (self.scale_point_v + direction * self.scale_point_step)
            .clamp(0.0, SCALE_POINT_V_MAX);
    }

    pub fn step_controller_scale(&mut self, direction: f32) {
        self.controller_scale = (self.controller_scale + direction * self.scale_step)
            .clamp(self.scale_range.0, self.scale_range.1);
    }

    pub fn scale_point_uv(&self) -> [f32; 2] {
        [
            self.scale_point_u / SCALE_POINT_U_MAX,
            self.scale_point_v / SCALE_POINT_V_MAX,
        ]
    }

    pub fn reset_controls(&mut self, config: &AppConfig) {
        let vsync_enabled = self.vsync_enabled;
        let show_stats = self.show_stats;
        *self = Self::from_config(config);
        self.vsync_enabled = vsync_enabled;
        self.show_stats = show_stats;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn starts_from_config_defaults() {
        let state = RenderState::from_config(&AppConfig::default());

        assert_eq!(state.convergence, 10.0);
        assert_eq!(state.eye_separation, 7.0);
        assert_eq!(state.fov_deg, 45.0);
        assert_eq!(state.near, 1.0);
        assert_eq!(state.controller_scale, 1.0);
        assert_eq!(state.light.counter, 0.0);
    }

    #[test]
    fn scale_point_is_clamped_to_surface_domain() {
        let mut state = RenderState::from_config(&AppConfig::default());

        state.step_scale_point_u(-1.0);
        assert_eq!(state.scale_point_u, 0.0);

        for _ in 0..100 {
            state.step_scale_point_u(1.0);
            state.step_scale_point_v(1.0);
        }
        assert_eq!(state.scale_point_u, 360.0);
        assert_eq!(state.scale_point_v, 90.0);
        assert_eq!(state.scale_point_uv(), [1.0, 1.0]);

        state.step_scale_point_v(-1.0);
        assert_eq!(state.scale_point_v, 85.0);
    }

    #[test]
    fn controller_scale_is_clamped() {
        let mut state = RenderState::from_config(&AppConfig::default());

        for _ in 0..40 {
            state.step_controller_scale(1.0);
        }
        assert_eq!(state.controller_scale, 2.0);

        for _ in 0..40 {
            state.step_controller_scale(-1.0);
        }
        assert_eq!(state.controller_scale, 0.5);

        state.step_controller_scale(1.0);
        assert_abs_diff_eq!(state.controller_scale, 0.55, epsilon = 1e-6);
    }

    #[test]
    fn camera_takes_live_inputs_and_keeps_lens() {
        let config = AppConfig::default();
        let base = StereoCamera::new(10.0, 7.0, 1.33, 45.0, 1.0, 20000.0);
        let mut state = RenderState::from_config(&config);
        state.convergence = 30.0;
        state.near = 2.0;

        let camera = state.camera(base);
        assert_eq!(camera.convergence, 30.0);
        assert_eq!(camera.near, 2.0);
        assert_eq!(camera.aspect_ratio(), 1.33);
        assert_eq!(camera.far(), 20000.0);
    }

    #[test]
    fn reset_keeps_display_toggles() {
        let config = AppConfig::default();
        let mut state = RenderState::from_config(&config);
        state.vsync_enabled = false;
        state.show_stats = false;
        state.eye_separation = 1.0;
        state.light.step_forward();

        state.reset_controls(&config);
        assert_eq!(state.eye_separation, 7.0);
        assert_eq!(state.light.counter, 0.0);
        assert!(!state.vsync_enabled);
        assert!(!state.show_stats);
    }
}
