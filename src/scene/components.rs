// scene/components.rs
// Plain hecs components

use crate::renderer::Material;
use crate::scene::Transform;
use glam::Vec3;

// ============================================================================
// Core Rendering Components
// ============================================================================

/// Local transform (position, rotation, scale) relative to the parent
#[derive(Debug, Clone, Copy)]
pub struct TransformComponent(pub Transform);

/// World-space transform (computed from hierarchy)
#[derive(Debug, Clone, Copy)]
pub struct WorldTransform(pub Transform);

/// Geometry an entity draws with. Entities carrying this together with a
/// [`MaterialComponent`] are renderable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeshSource {
    /// Mesh `mesh_index` of the glTF document the entity was instantiated from.
    Gltf { mesh_index: usize, primitive: usize },
    Sphere {
        radius: f32,
        segments: u32,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct MeshComponent(pub MeshSource);

#[derive(Debug, Clone, Copy)]
pub struct MaterialComponent(pub Material);

#[derive(Debug, Clone, Copy)]
pub struct Visible(pub bool);

impl Default for Visible {
    fn default() -> Self {
        Self(true)
    }
}

// ============================================================================
// Lighting Components
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

/// Cone light aimed from the entity's position towards `target`.
#[derive(Debug, Clone, Copy)]
pub struct SpotLight {
    pub color: Vec3,
    pub intensity: f32,
    /// Half-angle of the cone, radians.
    pub angle: f32,
    pub penumbra: f32,
    pub decay: f32,
    pub distance: f32,
    pub target: Vec3,
}

// ============================================================================
// Utility Components
// ============================================================================

/// Name component for debugging
#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Root entity of an instantiated model; holds the asset path.
#[derive(Debug, Clone)]
pub struct ModelRoot(pub String);

// ============================================================================
// Animation Components
// ============================================================================

/// One-shot linear rise of the entity's local y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiseAnimation {
    pub start_y: f32,
    pub target_y: f32,
    /// Seconds.
    pub duration: f32,
    pub elapsed: f32,
}

impl RiseAnimation {
    pub fn new(start_y: f32, target_y: f32, duration: f32) -> Self {
        Self {
            start_y,
            target_y,
            duration,
            elapsed: 0.0,
        }
    }

    /// Interpolation parameter; may exceed 1.
    pub fn t(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        self.elapsed / self.duration
    }

    pub fn is_complete(&self) -> bool {
        self.t() >= 1.0
    }

    /// Height at the current elapsed time; exactly `target_y` once complete.
    pub fn height(&self) -> f32 {
        if self.is_complete() {
            self.target_y
        } else {
            self.start_y + self.t() * (self.target_y - self.start_y)
        }
    }
}

// ============================================================================
// Hierarchy Components
// ============================================================================

/// Parent entity reference
#[derive(Debug, Clone, Copy)]
pub struct Parent(pub hecs::Entity);

/// List of children entities
#[derive(Debug, Clone)]
pub struct Children(pub Vec<hecs::Entity>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rise_is_linear_then_pinned_to_target() {
        let mut rise = RiseAnimation::new(-5.0, 10.0, 5.0);
        assert_eq!(rise.height(), -5.0);

        rise.elapsed = 2.5;
        assert!((rise.height() - 2.5).abs() < 1e-6);
        assert!(!rise.is_complete());

        rise.elapsed = 7.0;
        assert!(rise.is_complete());
        assert_eq!(rise.height(), 10.0);
    }

    #[test]
    fn zero_duration_rise_completes_immediately() {
        let rise = RiseAnimation::new(0.0, 1.0, 0.0);
        assert!(rise.is_complete());
        assert_eq!(rise.height(), 1.0);
    }
}
