// grove/backdrop.rs - stage root, terrain model, lights and camera

use std::f32::consts::PI;

use glam::Vec3;
use hecs::Entity;

use crate::asset::{AssetServer, LoadStatus, LoadTicket, Model};
use crate::renderer::Material;
use crate::scene::{AmbientLight, EntityBuilder, MeshSource, Scene, SpotLight, Transform};
use crate::settings::{BackdropSettings, StageSettings};

const LAMP_POSITION: Vec3 = Vec3::new(0.0, 5.0, 5.0);
const LAMP_MARKER_RADIUS: f32 = 0.3;
const LAMP_MARKER_SEGMENTS: u32 = 16;

/// Creates the root that every later attachment inherits scale and offset from.
pub fn setup_stage(scene: &mut Scene, settings: &StageSettings) -> Entity {
    scene.set_stage(
        Transform::from_translation(Vec3::from(settings.offset))
            .with_uniform_scale(settings.scale),
    )
}

/// White ambient fill plus a spot lamp behind the clearing, marked by a
/// small unlit yellow sphere.
pub fn spawn_lighting(scene: &mut Scene) -> [Entity; 3] {
    let stage = scene.stage();

    let mut ambient = EntityBuilder::new(scene)
        .with_name("Ambient Light")
        .with_transform(Transform::IDENTITY)
        .with_component(AmbientLight {
            color: Vec3::ONE,
            intensity: 2.0,
        });
    if let Some(stage) = stage {
        ambient = ambient.child_of(stage);
    }
    let ambient = ambient.spawn();

    let mut lamp = EntityBuilder::new(scene)
        .with_name("Lamp")
        .with_transform(Transform::from_translation(LAMP_POSITION))
        .with_component(SpotLight {
            color: Vec3::ONE,
            intensity: 500.0,
            angle: PI / 6.0,
            penumbra: 0.3,
            decay: 2.0,
            distance: 1000.0,
            target: Vec3::ZERO,
        });
    if let Some(stage) = stage {
        lamp = lamp.child_of(stage);
    }
    let lamp = lamp.spawn();

    let mut marker = EntityBuilder::new(scene)
        .with_name("Lamp Marker")
        .with_transform(Transform::from_translation(LAMP_POSITION))
        .with_mesh(MeshSource::Sphere {
            radius: LAMP_MARKER_RADIUS,
            segments: LAMP_MARKER_SEGMENTS,
        })
        .with_material(Material::yellow().unlit())
        .visible(true);
    if let Some(stage) = stage {
        marker = marker.child_of(stage);
    }
    let marker = marker.spawn();

    [ambient, lamp, marker]
}

/// The terrain model the rest of the grove stands on.
pub struct Backdrop {
    transform: Transform,
    ticket: Option<LoadTicket<Model>>,
    entity: Option<Entity>,
}

impl Backdrop {
    pub fn spawn(assets: &mut AssetServer, settings: &BackdropSettings) -> Self {
        Self {
            transform: Transform::from_translation(Vec3::from(settings.position))
                .with_uniform_scale(settings.scale),
            ticket: Some(assets.load::<Model>(settings.model.clone())),
            entity: None,
        }
    }

    pub fn update(&mut self, scene: &mut Scene, assets: &mut AssetServer) {
        let Some(ticket) = &self.ticket else {
            return;
        };

        match assets.poll(ticket) {
            LoadStatus::Pending { .. } => return,
            LoadStatus::Ready(handle) => match assets.get(handle) {
                Some(model) => {
                    let entity = scene.attach(model, self.transform);
                    log::info!("Backdrop {} placed as {:?}", model.path, entity);
                    self.entity = Some(entity);
                }
                None => log::warn!("Backdrop handle {} has no model", handle.index()),
            },
            LoadStatus::Failed(err) => log::warn!("Backdrop missing: {}", err),
        }
        self.ticket = None;
    }

    pub fn entity(&self) -> Option<Entity> {
        self.entity
    }

    pub fn is_pending(&self) -> bool {
        self.ticket.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::MaterialFlags;
    use crate::scene::{MaterialComponent, Parent};

    #[test]
    fn lighting_hangs_under_the_stage() {
        let mut scene = Scene::new();
        let stage = setup_stage(&mut scene, &StageSettings::default());
        let [ambient, lamp, marker] = spawn_lighting(&mut scene);

        for entity in [ambient, lamp, marker] {
            assert_eq!(scene.world.get::<&Parent>(entity).unwrap().0, stage);
        }

        let spot = *scene.world.get::<&SpotLight>(lamp).unwrap();
        assert_eq!(spot.intensity, 500.0);
        assert!((spot.angle - PI / 6.0).abs() < 1e-6);

        let material = scene.world.get::<&MaterialComponent>(marker).unwrap().0;
        assert_eq!(material.base_color, [255, 255, 0, 255]);
        assert!(material.flags.contains(MaterialFlags::UNLIT));
    }

    #[test]
    fn stage_scales_world_positions() {
        let mut scene = Scene::new();
        setup_stage(&mut scene, &StageSettings::default());
        let [_, lamp, _] = spawn_lighting(&mut scene);
        scene.update(0.0);

        let world = scene.world_transform(lamp).unwrap();
        assert!(world
            .translation
            .abs_diff_eq(Vec3::new(0.0, 1.5, 2.5), 1e-5));
    }
}
