// scene/mod.rs

pub mod builder;
pub mod camera;
pub mod components;
pub(crate) mod internal;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod transform;

// Re-export commonly used types
pub use builder::EntityBuilder;
pub use camera::Camera;
pub use scene::Scene;
pub use transform::Transform;

pub use components::{
    AmbientLight, Children, MaterialComponent, MeshComponent, MeshSource, ModelRoot, Name,
    Parent, RiseAnimation, SpotLight, TransformComponent, Visible, WorldTransform,
};
