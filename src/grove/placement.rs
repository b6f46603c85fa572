use std::f32::consts::TAU;

use glam::{Vec2, Vec3};
use hecs::Entity;

use crate::asset::{AssetServer, LoadStatus, LoadTicket, Model};
use crate::scene::{Scene, Transform};
use crate::settings::TreeSettings;

/// `count` points evenly spaced on a circle of `radius` around the origin,
/// starting on the +x axis.
pub fn circular_positions(count: usize, radius: f32) -> Vec<Vec2> {
    (0..count)
        .map(|i| {
            let angle = i as f32 / count as f32 * TAU;
            Vec2::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

struct TreeSlot {
    position: Vec2,
    ticket: Option<LoadTicket<Model>>,
    entity: Option<Entity>,
}

/// Decorative ring of trees. Each slot gets its own load and is filled
/// once; a failed load leaves the slot empty.
pub struct TreeRing {
    height: f32,
    scale: f32,
    slots: Vec<TreeSlot>,
}

impl TreeRing {
    pub fn spawn(assets: &mut AssetServer, settings: &TreeSettings) -> Self {
        let slots = circular_positions(settings.count, settings.radius)
            .into_iter()
            .map(|position| TreeSlot {
                position,
                ticket: Some(assets.load::<Model>(settings.model.clone())),
                entity: None,
            })
            .collect::<Vec<_>>();

        log::info!(
            "Planting {} x {} on a ring of radius {}",
            slots.len(),
            settings.model,
            settings.radius
        );

        Self {
            height: settings.height,
            scale: settings.scale,
            slots,
        }
    }

    pub fn update(&mut self, scene: &mut Scene, assets: &mut AssetServer) {
        for slot in &mut self.slots {
            let Some(ticket) = &slot.ticket else {
                continue;
            };

            match assets.poll(ticket) {
                LoadStatus::Pending { .. } => continue,
                LoadStatus::Ready(handle) => match assets.get(handle) {
                    Some(model) => {
                        let transform = Transform::from_translation(Vec3::new(
                            slot.position.x,
                            self.height,
                            slot.position.y,
                        ))
                        .with_uniform_scale(self.scale);
                        slot.entity = Some(scene.attach(model, transform));
                    }
                    None => log::warn!("Tree handle {} has no model", handle.index()),
                },
                LoadStatus::Failed(err) => log::warn!("Tree slot stays empty: {}", err),
            }
            slot.ticket = None;
        }
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.slots.iter().map(|slot| slot.position)
    }

    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.slots.iter().filter_map(|slot| slot.entity)
    }

    pub fn pending(&self) -> usize {
        self.slots.iter().filter(|slot| slot.ticket.is_some()).count()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn points_sit_on_the_circle_at_equal_angles() {
        let points = circular_positions(20, 15.0);
        assert_eq!(points.len(), 20);

        let step = TAU / 20.0;
        for (i, point) in points.iter().enumerate() {
            assert!((point.length() - 15.0).abs() < 1e-4);
            let expected = Vec2::from_angle(i as f32 * step) * 15.0;
            assert!(point.abs_diff_eq(expected, 1e-4));
        }
    }

    #[test]
    fn four_points_hit_the_axes() {
        let points = circular_positions(4, 10.0);
        let expected = [
            Vec2::new(10.0, 0.0),
            Vec2::new(0.0, 10.0),
            Vec2::new(-10.0, 0.0),
            Vec2::new(0.0, -10.0),
        ];
        for (point, expected) in points.iter().zip(expected) {
            assert!(point.abs_diff_eq(expected, 1e-4), "{point} != {expected}");
        }
    }

    #[test]
    fn degenerate_rings() {
        assert!(circular_positions(0, 15.0).is_empty());

        let single = circular_positions(1, 3.0);
        assert_eq!(single, vec![Vec2::new(3.0, 0.0)]);

        let pair = circular_positions(2, 1.0);
        assert!(pair[1].abs_diff_eq(Vec2::from_angle(PI), 1e-6));
    }
}
