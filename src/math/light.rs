use glam::Vec3;

pub fn position(counter: f32) -> Vec3 {
    let t = counter.sin() * 1.2;
    Vec3::new(t, 6.0, -10.0 + t * t)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightAnimation {
    pub counter: f32,
    pub step: f32,
}

impl Default for LightAnimation {
    fn default() -> Self {
        Self {
            counter: 0.0,
            step: 0.05,
        }
    }
}

impl LightAnimation {
    pub fn new(step: f32) -> Self {
        Self { counter: 0.0, step }
    }

    pub fn step_back(&mut self) {
        self.counter -= self.step;
    }

    pub fn step_forward(&mut self) {
        self.counter += self.step;
    }

    pub fn position(&self) -> Vec3 {
        position(self.counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::TAU;

    #[test]
    fn rest_position() {
        assert_eq!(position(0.0), Vec3::new(0.0, 6.0, -10.0));
    }

    #[test]
    fn periodic_over_full_turn() {
        for counter in [-3.0, -0.05, 0.0, 0.7, 1.5, 12.25] {
            let a = position(counter);
            let b = position(counter + TAU);
            assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-4);
            assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-4);
            assert_abs_diff_eq!(a.z, b.z, epsilon = 1e-4);
        }
    }

    #[test]
    fn path_is_a_parabola() {
        for counter in [0.3, 1.0, 2.0, 4.0] {
            let p = position(counter);
            assert_abs_diff_eq!(p.z, -10.0 + p.x * p.x, epsilon = 1e-5);
            assert!(p.x.abs() <= 1.2);
        }
    }

    #[test]
    fn counter_is_not_wrapped() {
        let mut light = LightAnimation::default();
        for _ in 0..1000 {
            light.step_forward();
        }
        assert_abs_diff_eq!(light.counter, 50.0, epsilon = 1e-2);
        assert!(light.position().is_finite());

        light.step_back();
        assert_abs_diff_eq!(light.counter, 49.95, epsilon = 1e-2);
    }
}
