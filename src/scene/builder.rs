// scene/builder.rs
// Fluent helper for spawning single entities into a scene

use super::components::*;
use crate::renderer::Material;
use crate::scene::{Scene, Transform};

/// Builds one entity and optionally links it under a parent.
/// Models go through [`Scene::attach`] instead.
pub struct EntityBuilder<'s> {
    scene: &'s mut Scene,
    builder: hecs::EntityBuilder,
    parent: Option<hecs::Entity>,
}

impl<'s> EntityBuilder<'s> {
    pub fn new(scene: &'s mut Scene) -> Self {
        Self {
            scene,
            builder: hecs::EntityBuilder::new(),
            parent: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.builder.add(Name::new(name));
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.builder.add(TransformComponent(transform));
        self
    }

    pub fn with_mesh(mut self, mesh: MeshSource) -> Self {
        self.builder.add(MeshComponent(mesh));
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.builder.add(MaterialComponent(material));
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.builder.add(Visible(visible));
        self
    }

    pub fn with_component(mut self, component: impl hecs::Component) -> Self {
        self.builder.add(component);
        self
    }

    pub fn child_of(mut self, parent: hecs::Entity) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn spawn(mut self) -> hecs::Entity {
        let entity = self.scene.world.spawn(self.builder.build());
        if let Some(parent) = self.parent {
            self.scene.set_parent(entity, parent);
        }
        entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn child_of_links_both_directions() {
        let mut scene = Scene::new();
        let stage = scene.set_stage(Transform::IDENTITY);

        let lamp = EntityBuilder::new(&mut scene)
            .with_name("Lamp")
            .with_transform(Transform::from_translation(Vec3::new(0.0, 5.0, 5.0)))
            .with_mesh(MeshSource::Sphere {
                radius: 0.3,
                segments: 16,
            })
            .with_material(Material::yellow())
            .visible(true)
            .child_of(stage)
            .spawn();

        assert_eq!(scene.world.get::<&Parent>(lamp).unwrap().0, stage);
        assert_eq!(scene.world.get::<&Children>(stage).unwrap().0, vec![lamp]);
        assert_eq!(scene.world.get::<&Name>(lamp).unwrap().0, "Lamp");
    }
}
