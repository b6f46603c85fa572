use glam::{Mat4, Vec3};

/// Right-handed perspective camera looking from `eye` at `target`.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn perspective(fov_y_degrees: f32, near: f32, far: f32) -> Self {
        Self {
            eye: Vec3::Z,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_radians: fov_y_degrees.to_radians(),
            near,
            far,
        }
    }

    pub fn at(mut self, eye: Vec3) -> Self {
        self.eye = eye;
        self
    }

    pub fn looking_at(mut self, target: Vec3) -> Self {
        self.target = target;
        self
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn proj(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_radians, aspect, self.near, self.far)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.proj(aspect) * self.view()
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize_or_zero()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(75.0, 0.1, 1000.0).at(Vec3::new(0.0, 0.0, 5.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_looks_down_negative_z() {
        let cam = Camera::default();
        assert_eq!(cam.eye, Vec3::new(0.0, 0.0, 5.0));
        assert!(cam.forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert!((cam.fov_y_radians - 75f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn origin_projects_to_screen_center() {
        let cam = Camera::default();
        let clip = cam.view_proj(16.0 / 9.0) * Vec3::ZERO.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!((0.0..=1.0).contains(&ndc.z));
    }
}
