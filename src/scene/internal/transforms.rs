use crate::scene::components::{Children, Parent, TransformComponent, WorldTransform};
use crate::scene::transform::Transform;
use hecs::World;

/// Recomputes `WorldTransform` for every entity reachable from a root
/// (an entity with a transform and no parent).
pub(crate) fn propagate_transforms(world: &mut World) {
    let roots: Vec<hecs::Entity> = world
        .query::<&TransformComponent>()
        .without::<&Parent>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();

    let mut stack: Vec<(hecs::Entity, Transform)> = roots
        .into_iter()
        .map(|root| (root, Transform::IDENTITY))
        .collect();
    let mut computed = Vec::new();

    while let Some((entity, parent_world)) = stack.pop() {
        let Ok(local) = world.get::<&TransformComponent>(entity).map(|t| t.0) else {
            log::trace!("Entity {:?} has no TransformComponent, skipping", entity);
            continue;
        };

        let world_transform = parent_world.mul_transform(&local);
        computed.push((entity, world_transform));

        if let Ok(children) = world.get::<&Children>(entity) {
            stack.extend(children.0.iter().map(|&child| (child, world_transform)));
        }
    }

    for (entity, world_transform) in computed {
        let updated = match world.get::<&mut WorldTransform>(entity) {
            Ok(mut existing) => {
                existing.0 = world_transform;
                true
            }
            Err(_) => false,
        };

        if !updated {
            if let Err(err) = world.insert_one(entity, WorldTransform(world_transform)) {
                log::error!("Failed to insert WorldTransform for {:?}: {:?}", entity, err);
            }
        }
    }
}
