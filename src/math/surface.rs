use glam::DVec3;

use crate::math::mesh::Tessellation;

const SHAPE_A: f64 = 1.0;
const SHAPE_B: f64 = 1.0;
const SHAPE_C: f64 = 1.0;

pub const NORMAL_DELTA_DEG: f64 = 0.0001;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceParameters {
    pub u_max_deg: f64,
    pub v_max_deg: f64,
    pub step_deg: f64,
}

impl Default for SurfaceParameters {
    fn default() -> Self {
        Self {
            u_max_deg: 360.0,
            v_max_deg: 90.0,
            step_deg: 1.0,
        }
    }
}

impl SurfaceParameters {
    pub fn u_end(&self) -> f64 {
        self.u_max_deg + self.step_deg
    }

    pub fn v_end(&self) -> f64 {
        self.v_max_deg + self.step_deg
    }

    pub fn u_samples(&self) -> usize {
        (self.u_end() / self.step_deg).ceil() as usize
    }

    pub fn v_samples(&self) -> usize {
        (self.v_end() / self.step_deg).ceil() as usize
    }

    pub fn vertex_count(&self) -> usize {
        self.u_samples() * self.v_samples() * 2
    }

    /// Texture coordinate of a sample. Normalized by the extended loop bounds,
    /// so the last nominal sample stays below 1.
    pub fn tex_coord(&self, u: f64, v: f64) -> [f32; 2] {
        [(u / self.u_end()) as f32, (v / self.v_end()) as f32]
    }
}

pub fn calc_x(u: f64, v: f64) -> f64 {
    v.to_radians() * u.to_radians().cos()
}

pub fn calc_y(u: f64, v: f64) -> f64 {
    v.to_radians() * u.to_radians().sin()
}

// no v term: the height depends on u alone
pub fn calc_z(u: f64, _v: f64) -> f64 {
    let cos_u = u.to_radians().cos();
    SHAPE_C * (SHAPE_A * SHAPE_A - SHAPE_B * SHAPE_B * cos_u * cos_u).sqrt()
}

pub fn point(u: f64, v: f64) -> DVec3 {
    DVec3::new(calc_x(u, v), calc_y(u, v), calc_z(u, v))
}

pub fn derivative_u(u: f64, v: f64, delta_deg: f64) -> DVec3 {
    (point(u + delta_deg, v) - point(u, v)) / delta_deg.to_radians()
}

pub fn derivative_v(u: f64, v: f64, delta_deg: f64) -> DVec3 {
    (point(u, v + delta_deg) - point(u, v)) / delta_deg.to_radians()
}

pub fn normal(u: f64, v: f64) -> DVec3 {
    let du = derivative_u(u, v, NORMAL_DELTA_DEG);
    let dv = derivative_v(u, v, NORMAL_DELTA_DEG);
    dv.cross(du).normalize_or_zero()
}

pub fn generate(params: &SurfaceParameters) -> Tessellation {
    let step = params.step_deg;
    let mut mesh = Tessellation::with_capacity(params.vertex_count());

    for i in 0..params.u_samples() {
        let u = i as f64 * step;
        let u_next = u + step;

        for j in 0..params.v_samples() {
            let v = j as f64 * step;

            mesh.push(
                point(u, v).as_vec3().to_array(),
                normal(u, v).as_vec3().to_array(),
                params.tex_coord(u, v),
            );
            mesh.push(
                point(u_next, v).as_vec3().to_array(),
                normal(u_next, v).as_vec3().to_array(),
                params.tex_coord(u_next, v),
            );
        }
    }

    log::debug!(
        "tessellated surface: {} strip vertices ({}x{} samples)",
        mesh.vertex_count(),
        params.u_samples(),
        params.v_samples()
    );

    mesh
}
