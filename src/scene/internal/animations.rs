use crate::scene::components::{RiseAnimation, TransformComponent};
use hecs::World;

/// Samples every rise animation once. Completed animations leave the entity
/// at its target height; removing the entity is up to its owner.
pub(crate) fn advance_rise_animations(world: &mut World, dt: f64) {
    let dt = dt as f32;

    for (_entity, (transform, rise)) in
        world.query_mut::<(&mut TransformComponent, &mut RiseAnimation)>()
    {
        if rise.is_complete() {
            transform.0.translation.y = rise.target_y;
            continue;
        }

        rise.elapsed += dt;
        transform.0.translation.y = rise.height();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::transform::Transform;
    use glam::Vec3;

    #[test]
    fn rise_moves_entity_up_linearly() {
        let mut world = World::new();
        let entity = world.spawn((
            TransformComponent(Transform::from_translation(Vec3::new(0.0, -5.0, -3.0))),
            RiseAnimation::new(-5.0, 10.0, 5.0),
        ));

        let mut heights = Vec::new();
        for _ in 0..5 {
            advance_rise_animations(&mut world, 0.5);
            heights.push(world.get::<&TransformComponent>(entity).unwrap().0.translation.y);
        }

        for (frame, height) in heights.iter().enumerate() {
            let expected = -5.0 + 3.0 * (frame as f32 + 1.0) * 0.5;
            assert!((height - expected).abs() < 1e-5, "frame {frame}: {height}");
        }
    }

    #[test]
    fn completed_rise_lands_exactly_on_target() {
        let mut world = World::new();
        let entity = world.spawn((
            TransformComponent(Transform::IDENTITY),
            RiseAnimation::new(0.0, 10.0, 1.0),
        ));

        advance_rise_animations(&mut world, 0.7);
        advance_rise_animations(&mut world, 0.7);

        let transform = world.get::<&TransformComponent>(entity).unwrap();
        assert_eq!(transform.0.translation.y, 10.0);
        assert!(world.get::<&RiseAnimation>(entity).unwrap().is_complete());
    }
}
