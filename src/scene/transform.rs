use glam::{Mat4, Quat, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn from_trs(t: Vec3, r: Quat, s: Vec3) -> Self {
        Self {
            translation: t,
            rotation: r,
            scale: s,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Rotation about the vertical axis, in radians.
    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.rotation = Quat::from_rotation_y(yaw);
        self
    }

    /// Composes `self` (parent) with a child-local transform.
    pub fn mul_transform(&self, child: &Transform) -> Transform {
        Transform {
            translation: self.translation + self.rotation * (self.scale * child.translation),
            rotation: self.rotation * child.rotation,
            scale: self.scale * child.scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn default_is_identity() {
        let m = Transform::default().matrix();
        assert!(m.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn translate_then_scale_ok() {
        let tr = Transform::from_trs(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY, Vec3::splat(2.0));
        let m = tr.matrix();
        let p = m.transform_point3(Vec3::new(1.0, 0.0, 0.0));
        // (1,0,0) -> (2,0,0) -> (3,2,3)
        assert!(p.abs_diff_eq(Vec3::new(3.0, 2.0, 3.0), 1e-6));
    }

    #[test]
    fn composition_matches_matrix_product() {
        let parent = Transform::from_translation(Vec3::new(0.0, -1.0, 0.0)).with_uniform_scale(0.5);
        let child = Transform::from_translation(Vec3::new(10.0, -5.0, 0.0))
            .with_yaw(std::f32::consts::FRAC_PI_2)
            .with_uniform_scale(1.5);

        let composed = parent.mul_transform(&child).matrix();
        let expected = parent.matrix() * child.matrix();
        assert!(composed.abs_diff_eq(expected, 1e-5));
    }
}
