use glam::{Mat4, Quat, Vec2, Vec3};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];

    pub fn index(self) -> usize {
        match self {
            Eye::Left => 0,
            Eye::Right => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrustumBounds {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl FrustumBounds {
    pub fn projection(&self) -> Mat4 {
        frustum_rh(
            self.left,
            self.right,
            self.bottom,
            self.top,
            self.near,
            self.far,
        )
    }
}

pub struct FrustumPair {
    pub view: Mat4,
    pub projection: Mat4,
    pub bounds: FrustumBounds,
}

/// Right-handed off-axis perspective projection with depth mapped to `[0, 1]`.
/// Symmetric bounds reproduce `Mat4::perspective_rh`.
pub fn frustum_rh(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let width = right - left;
    let height = top - bottom;
    let depth = near - far;

    Mat4::from_cols_array(&[
        2.0 * near / width,
        0.0,
        0.0,
        0.0,
        //
        0.0,
        2.0 * near / height,
        0.0,
        0.0,
        //
        (right + left) / width,
        (top + bottom) / height,
        far / depth,
        -1.0,
        //
        0.0,
        0.0,
        near * far / depth,
        0.0,
    ])
}

/// Requires `convergence > 0`, `0 < near < far` and `fov < π`. Nothing here
/// checks that: out-of-range state produces non-finite matrices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StereoCamera {
    pub convergence: f32,
    pub eye_separation: f32,
    aspect_ratio: f32,
    pub fov: f32,
    pub near: f32,
    far: f32,
}

impl StereoCamera {
    pub fn new(
        convergence: f32,
        eye_separation: f32,
        aspect_ratio: f32,
        fov_deg: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            convergence,
            eye_separation,
            aspect_ratio,
            fov: fov_deg.to_radians(),
            near,
            far,
        }
    }

    pub fn with(self, convergence: f32, eye_separation: f32, fov_deg: f32, near: f32) -> Self {
        Self {
            convergence,
            eye_separation,
            fov: fov_deg.to_radians(),
            near,
            ..self
        }
    }

    pub fn update(&mut self, convergence: f32, eye_separation: f32, fov_deg: f32, near: f32) {
        *self = self.with(convergence, eye_separation, fov_deg, near);
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn bounds(&self, eye: Eye) -> FrustumBounds {
        let half_fov_tan = (self.fov / 2.0).tan();
        let top = self.near * half_fov_tan;

        let a = self.aspect_ratio * half_fov_tan * self.convergence;
        let b = a - self.eye_separation / 2.0;
        let c = a + self.eye_separation / 2.0;
        let scale = self.near / self.convergence;

        let (left, right) = match eye {
            Eye::Left => (-b * scale, c * scale),
            Eye::Right => (-c * scale, b * scale),
        };

        FrustumBounds {
            left,
            right,
            bottom: -top,
            top,
            near: self.near,
            far: self.far,
        }
    }

    pub fn view_matrix(&self, eye: Eye) -> Mat4 {
        let offset = self.eye_separation / 2.0;
        match eye {
            Eye::Left => Mat4::from_translation(Vec3::new(offset, 0.0, 0.0)),
            Eye::Right => Mat4::from_translation(Vec3::new(-offset, 0.0, 0.0)),
        }
    }

    pub fn frustum(&self, eye: Eye) -> FrustumPair {
        let bounds = self.bounds(eye);
        FrustumPair {
            view: self.view_matrix(eye),
            projection: bounds.projection(),
            bounds,
        }
    }

    pub fn left_frustum(&self) -> FrustumPair {
        self.frustum(Eye::Left)
    }

    pub fn right_frustum(&self) -> FrustumPair {
        self.frustum(Eye::Right)
    }
}

pub struct Trackball {
    pub rotation: Quat,
    pub sensitivity: f32,
}

impl Default for Trackball {
    fn default() -> Self {
        Self {
            rotation: Quat::IDENTITY,
            sensitivity: 0.005,
        }
    }
}

impl Trackball {
    pub fn process_mouse_movement(&mut self, delta: Vec2) {
        if delta == Vec2::ZERO {
            return;
        }

        let yaw = Quat::from_rotation_y(delta.x * self.sensitivity);
        let pitch = Quat::from_rotation_x(delta.y * self.sensitivity);
        self.rotation = (yaw * pitch * self.rotation).normalize();
    }

    pub fn reset(&mut self) {
        self.rotation = Quat::IDENTITY;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn default_camera() -> StereoCamera {
        StereoCamera::new(10.0, 7.0, 1.33, 45.0, 1.0, 20000.0)
    }

    #[test]
    fn fov_is_stored_in_radians() {
        let camera = default_camera();
        assert_relative_eq!(camera.fov, std::f32::consts::FRAC_PI_4, epsilon = 1e-6);
    }

    #[test]
    fn left_frustum_matches_off_axis_formula() {
        let camera = default_camera();
        let bounds = camera.left_frustum().bounds;

        let half = (22.5_f32).to_radians().tan();
        let a = 1.33 * half * 10.0;
        let b = a - 3.5;
        let c = a + 3.5;

        assert_relative_eq!(bounds.top, half, epsilon = 1e-6);
        assert_relative_eq!(bounds.bottom, -half, epsilon = 1e-6);
        assert_relative_eq!(bounds.left, -b / 10.0, epsilon = 1e-6);
        assert_relative_eq!(bounds.right, c / 10.0, epsilon = 1e-6);
        assert_eq!(bounds.near, 1.0);
        assert_eq!(bounds.far, 20000.0);
    }

    #[test]
    fn eye_frustums_mirror_each_other() {
        let cameras = [
            default_camera(),
            StereoCamera::new(3.0, 0.5, 1.77, 70.0, 0.1, 500.0),
            StereoCamera::new(50.0, 20.0, 1.0, 20.0, 5.0, 20000.0),
        ];

        for camera in cameras {
            let left = camera.left_frustum();
            let right = camera.right_frustum();

            assert_relative_eq!(left.bounds.left, -right.bounds.right, epsilon = 1e-6);
            assert_relative_eq!(left.bounds.right, -right.bounds.left, epsilon = 1e-6);
            assert_eq!(left.bounds.top, right.bounds.top);

            let lt = left.view.w_axis;
            let rt = right.view.w_axis;
            assert_relative_eq!(lt.x, -rt.x, epsilon = 1e-6);
            assert_eq!(lt.y, 0.0);
            assert_eq!(lt.z, 0.0);
            assert_relative_eq!(lt.x, camera.eye_separation / 2.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn zero_convergence_is_not_finite() {
        let camera = default_camera().with(0.0, 7.0, 45.0, 1.0);
        let bounds = camera.left_frustum().bounds;

        assert!(!bounds.left.is_finite());
        assert!(!bounds.right.is_finite());
    }

    #[test]
    fn update_keeps_aspect_and_far() {
        let mut camera = default_camera();
        camera.update(25.0, 2.0, 60.0, 0.5);

        assert_eq!(camera.convergence, 25.0);
        assert_eq!(camera.eye_separation, 2.0);
        assert_relative_eq!(camera.fov, 60.0_f32.to_radians(), epsilon = 1e-6);
        assert_eq!(camera.near, 0.5);
        assert_eq!(camera.aspect_ratio(), 1.33);
        assert_eq!(camera.far(), 20000.0);
    }

    #[test]
    fn zero_separation_collapses_to_symmetric_perspective() {
        let camera = StereoCamera::new(10.0, 0.0, 1.5, 60.0, 0.5, 100.0);
        let projection = camera.left_frustum().projection;
        let expected = Mat4::perspective_rh(60.0_f32.to_radians(), 1.5, 0.5, 100.0);

        for (got, want) in projection
            .to_cols_array()
            .iter()
            .zip(expected.to_cols_array().iter())
        {
            assert_abs_diff_eq!(got, want, epsilon = 1e-5);
        }
    }

    #[test]
    fn convergence_plane_projects_to_same_point_for_both_eyes() {
        let camera = default_camera();
        let on_plane = glam::Vec4::new(1.0, 0.5, -camera.convergence, 1.0);

        let ndc = |eye: Eye| {
            let pair = camera.frustum(eye);
            let clip = pair.projection * pair.view * on_plane;
            clip.truncate() / clip.w
        };

        let l = ndc(Eye::Left);
        let r = ndc(Eye::Right);
        assert_abs_diff_eq!(l.x, r.x, epsilon = 1e-4);
        assert_abs_diff_eq!(l.y, r.y, epsilon = 1e-4);
    }

    #[test]
    fn depth_maps_near_to_zero_and_far_to_one() {
        let projection = frustum_rh(-1.0, 2.0, -1.0, 1.0, 1.0, 100.0);

        let near = projection * glam::Vec4::new(0.0, 0.0, -1.0, 1.0);
        let far = projection * glam::Vec4::new(0.0, 0.0, -100.0, 1.0);
        assert_abs_diff_eq!(near.z / near.w, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(far.z / far.w, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn trackball_ignores_zero_delta_and_resets() {
        let mut trackball = Trackball::default();
        trackball.process_mouse_movement(Vec2::ZERO);
        assert_eq!(trackball.rotation, Quat::IDENTITY);

        trackball.process_mouse_movement(Vec2::new(40.0, -10.0));
        assert_ne!(trackball.rotation, Quat::IDENTITY);
        assert_relative_eq!(trackball.rotation.length(), 1.0, epsilon = 1e-6);

        trackball.reset();
        assert_eq!(trackball.view_matrix(), Mat4::IDENTITY);
    }
}
