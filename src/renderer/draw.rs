// renderer/draw.rs - per-frame draw list extracted from the scene

use glam::{Mat4, Vec3};
use hecs::World;
use rayon::prelude::*;

use crate::renderer::Material;
use crate::scene::components::{
    AmbientLight, MaterialComponent, MeshComponent, MeshSource, SpotLight, TransformComponent,
    Visible, WorldTransform,
};
use crate::scene::{Camera, Scene};

#[derive(Debug, Clone, Copy)]
pub struct DrawItem {
    pub entity: hecs::Entity,
    pub mesh: MeshSource,
    pub material: Material,
    pub model: Mat4,
    /// Squared distance to the camera eye.
    pub depth: f32,
}

/// Opaque items in arbitrary order, transparent items back to front.
#[derive(Debug, Default)]
pub struct DrawList {
    pub opaque: Vec<DrawItem>,
    pub transparent: Vec<DrawItem>,
    pub ambient_lights: usize,
    pub spot_lights: usize,
}

impl DrawList {
    pub fn len(&self) -> usize {
        self.opaque.len() + self.transparent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct RenderEntity {
    entity: hecs::Entity,
    mesh: MeshSource,
    material: Material,
    visible: bool,
    model: Mat4,
}

fn collect_render_entities(world: &World) -> Vec<RenderEntity> {
    world
        .query::<(
            &MeshComponent,
            &MaterialComponent,
            Option<&Visible>,
            Option<&WorldTransform>,
            Option<&TransformComponent>,
        )>()
        .iter()
        .map(|(entity, (mesh, material, visible, world_transform, local))| {
            // Entities spawned this frame have no world transform yet.
            let model = world_transform
                .map(|t| t.0.matrix())
                .or_else(|| local.map(|t| t.0.matrix()))
                .unwrap_or(Mat4::IDENTITY);
            RenderEntity {
                entity,
                mesh: mesh.0,
                material: material.0,
                visible: visible.map_or(true, |v| v.0),
                model,
            }
        })
        .collect()
}

pub fn collect_draw_items(scene: &Scene, camera: &Camera) -> DrawList {
    let eye: Vec3 = camera.eye;

    let items: Vec<DrawItem> = collect_render_entities(&scene.world)
        .into_par_iter()
        .filter(|entity| entity.visible)
        .map(|entity| {
            let position = entity.model.w_axis.truncate();
            DrawItem {
                entity: entity.entity,
                mesh: entity.mesh,
                material: entity.material,
                model: entity.model,
                depth: position.distance_squared(eye),
            }
        })
        .collect();

    let (mut transparent, opaque): (Vec<_>, Vec<_>) = items
        .into_iter()
        .partition(|item| item.material.is_transparent());
    transparent.sort_by(|a, b| b.depth.total_cmp(&a.depth));

    DrawList {
        opaque,
        transparent,
        ambient_lights: scene.world.query::<&AmbientLight>().iter().count(),
        spot_lights: scene.world.query::<&SpotLight>().iter().count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{EntityBuilder, Transform};

    fn sphere() -> MeshSource {
        MeshSource::Sphere {
            radius: 1.0,
            segments: 8,
        }
    }

    #[test]
    fn transparent_items_sort_back_to_front() {
        let mut scene = Scene::new();
        for z in [-1.0, -20.0, -5.0] {
            EntityBuilder::new(&mut scene)
                .with_transform(Transform::from_translation(Vec3::new(0.0, 0.0, z)))
                .with_mesh(sphere())
                .with_material(Material::white().with_opacity(0.5))
                .spawn();
        }
        EntityBuilder::new(&mut scene)
            .with_transform(Transform::IDENTITY)
            .with_mesh(sphere())
            .with_material(Material::white())
            .spawn();
        scene.update(0.0);

        let list = collect_draw_items(&scene, &Camera::default());
        assert_eq!(list.opaque.len(), 1);
        assert_eq!(list.transparent.len(), 3);
        let depths: Vec<f32> = list.transparent.iter().map(|item| item.depth).collect();
        assert!(depths.windows(2).all(|pair| pair[0] >= pair[1]), "{depths:?}");
    }

    #[test]
    fn hidden_entities_are_skipped() {
        let mut scene = Scene::new();
        EntityBuilder::new(&mut scene)
            .with_mesh(sphere())
            .with_material(Material::white())
            .visible(false)
            .spawn();

        let list = collect_draw_items(&scene, &Camera::default());
        assert!(list.is_empty());
    }
}
