use glam::Vec3;
use hecs::{Entity, World};

use super::components::{
    Children, MaterialComponent, MeshComponent, MeshSource, ModelRoot, Name, Parent,
    TransformComponent, Visible, WorldTransform,
};
use super::internal::{animations, transforms};
use crate::asset::{Model, ModelNode};
use crate::renderer::Material;
use crate::scene::{Camera, Transform};

/// The scene container every behaviour mutates.
///
/// Models are instantiated as entity hierarchies. When a stage root is set,
/// attached models become its children and inherit its transform.
pub struct Scene {
    pub world: World,
    time: f64,
    stage: Option<Entity>,
    camera: Camera,
    attached: u64,
    detached: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            time: 0.0,
            stage: None,
            camera: Camera::default(),
            attached: 0,
            detached: 0,
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn stage(&self) -> Option<Entity> {
        self.stage
    }

    /// Creates the root every later attachment hangs from.
    pub fn set_stage(&mut self, transform: Transform) -> Entity {
        if let Some(previous) = self.stage.take() {
            log::warn!("Replacing existing stage root {:?}", previous);
        }
        let stage = self.world.spawn((
            Name::new("Stage"),
            TransformComponent(transform),
            Visible(true),
        ));
        self.stage = Some(stage);
        stage
    }

    /// Instantiates `model` under the stage root and returns its root entity.
    pub fn attach(&mut self, model: &Model, transform: Transform) -> Entity {
        let root = self.instantiate(model, transform, self.stage);
        self.attached += 1;
        log::trace!("Attached {} as {:?}", model.path, root);
        root
    }

    /// Removes `entity` and its whole subtree. Returns false when the entity
    /// is not alive.
    pub fn detach(&mut self, entity: Entity) -> bool {
        if !self.world.contains(entity) {
            return false;
        }

        if let Ok(parent) = self.world.get::<&Parent>(entity).map(|p| p.0) {
            if let Ok(mut children) = self.world.get::<&mut Children>(parent) {
                children.0.retain(|&child| child != entity);
            }
        }

        let subtree = self.subtree(entity);
        for node in &subtree {
            self.world.despawn(*node).ok();
        }

        if self.stage == Some(entity) {
            self.stage = None;
        }

        self.detached += 1;
        log::trace!("Detached {:?} ({} entities)", entity, subtree.len());
        true
    }

    pub fn is_attached(&self, entity: Entity) -> bool {
        self.world.contains(entity)
    }

    /// Number of successful [`attach`](Self::attach) calls.
    pub fn attach_count(&self) -> u64 {
        self.attached
    }

    /// Number of successful [`detach`](Self::detach) calls.
    pub fn detach_count(&self) -> u64 {
        self.detached
    }

    pub fn instantiate(
        &mut self,
        model: &Model,
        transform: Transform,
        parent: Option<Entity>,
    ) -> Entity {
        let root = self.world.spawn((
            Name::new(model.path.clone()),
            ModelRoot(model.path.clone()),
            TransformComponent(transform),
            Visible(true),
        ));
        if let Some(parent) = parent {
            self.set_parent(root, parent);
        }

        for node in &model.roots {
            self.spawn_node(node, root);
        }

        root
    }

    fn spawn_node(&mut self, node: &ModelNode, parent: Entity) {
        let mut builder = hecs::EntityBuilder::new();
        builder
            .add(TransformComponent(node.transform))
            .add(Visible(true));
        if let Some(name) = &node.name {
            builder.add(Name::new(name.clone()));
        }
        // First primitive on the node itself, the rest as children.
        let primitives: &[Material] = node
            .mesh
            .as_ref()
            .map(|mesh| mesh.materials.as_slice())
            .unwrap_or_default();
        if let (Some(mesh), Some(material)) = (&node.mesh, primitives.first()) {
            builder
                .add(MeshComponent(MeshSource::Gltf {
                    mesh_index: mesh.mesh_index,
                    primitive: 0,
                }))
                .add(MaterialComponent(*material));
        }

        let entity = self.world.spawn(builder.build());
        self.set_parent(entity, parent);

        if let Some(mesh) = &node.mesh {
            for (primitive, material) in primitives.iter().enumerate().skip(1) {
                let mut extra = hecs::EntityBuilder::new();
                extra
                    .add(TransformComponent(Transform::IDENTITY))
                    .add(Visible(true))
                    .add(MeshComponent(MeshSource::Gltf {
                        mesh_index: mesh.mesh_index,
                        primitive,
                    }))
                    .add(MaterialComponent(*material));
                if let Some(name) = &node.name {
                    extra.add(Name::new(format!("{name}_primitive_{primitive}")));
                }
                let extra = self.world.spawn(extra.build());
                self.set_parent(extra, entity);
            }
        }

        for child in &node.children {
            self.spawn_node(child, entity);
        }
    }

    /// Links `child` under `parent`, keeping both sides of the relation in sync.
    pub fn set_parent(&mut self, child: Entity, parent: Entity) {
        if let Ok(old_parent) = self.world.get::<&Parent>(child).map(|p| p.0) {
            if let Ok(mut children) = self.world.get::<&mut Children>(old_parent) {
                children.0.retain(|&c| c != child);
            }
        }

        self.world.insert_one(child, Parent(parent)).ok();

        let has_children = match self.world.get::<&mut Children>(parent) {
            Ok(mut children) => {
                children.0.push(child);
                true
            }
            Err(_) => false,
        };
        if !has_children {
            self.world.insert_one(parent, Children(vec![child])).ok();
        }
    }

    /// `entity` followed by all its descendants, depth first.
    pub fn subtree(&self, entity: Entity) -> Vec<Entity> {
        let mut result = Vec::new();
        let mut stack = vec![entity];
        while let Some(current) = stack.pop() {
            result.push(current);
            if let Ok(children) = self.world.get::<&Children>(current) {
                stack.extend(children.0.iter().rev().copied());
            }
        }
        result
    }

    /// Calls `f` for every renderable entity in the subtree rooted at
    /// `root`. Returns how many were visited.
    pub fn visit_renderables(
        &mut self,
        root: Entity,
        mut f: impl FnMut(Entity, &mut Material),
    ) -> usize {
        let mut visited = 0;
        for entity in self.subtree(root) {
            if self.world.get::<&MeshComponent>(entity).is_err() {
                continue;
            }
            if let Ok(mut material) = self.world.get::<&mut MaterialComponent>(entity) {
                f(entity, &mut material.0);
                visited += 1;
            }
        }
        visited
    }

    /// Puts every renderable under `root` into alpha blending at `opacity`.
    pub fn override_opacity(&mut self, root: Entity, opacity: f32) -> usize {
        self.visit_renderables(root, |_, material| material.set_opacity(opacity))
    }

    pub fn transform(&self, entity: Entity) -> Option<Transform> {
        self.world
            .get::<&TransformComponent>(entity)
            .ok()
            .map(|t| t.0)
    }

    pub fn set_transform(&mut self, entity: Entity, transform: Transform) -> bool {
        match self.world.get::<&mut TransformComponent>(entity) {
            Ok(mut current) => {
                current.0 = transform;
                true
            }
            Err(_) => false,
        }
    }

    pub fn translation(&self, entity: Entity) -> Option<Vec3> {
        self.transform(entity).map(|t| t.translation)
    }

    /// Last propagated world transform; updated by [`update`](Self::update).
    pub fn world_transform(&self, entity: Entity) -> Option<Transform> {
        self.world.get::<&WorldTransform>(entity).ok().map(|t| t.0)
    }

    /// Advances scene time and every rise animation by `dt`.
    pub fn animate(&mut self, dt: f64) {
        self.time += dt;
        animations::advance_rise_animations(&mut self.world, dt);
    }

    /// Recomputes `WorldTransform` for every hierarchy.
    pub fn propagate(&mut self) {
        transforms::propagate_transforms(&mut self.world);
    }

    pub fn update(&mut self, dt: f64) {
        self.animate(dt);
        self.propagate();
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::ModelMesh;

    fn mesh(material: Material) -> ModelMesh {
        ModelMesh::single(0, material)
    }

    fn ghost_model() -> Model {
        Model::new(
            "duch.glb",
            vec![ModelNode::new("Armature")
                .with_child(ModelNode::new("Body").with_mesh(mesh(Material::white())))
                .with_child(
                    ModelNode::new("Face")
                        .with_child(ModelNode::new("Eyes").with_mesh(mesh(Material::rgb(0, 0, 0)))),
                )],
        )
    }

    #[test]
    fn attach_spawns_the_whole_hierarchy() {
        let mut scene = Scene::new();
        let before = scene.world.len();
        let root = scene.attach(&ghost_model(), Transform::IDENTITY);

        // root + Armature + Body + Face + Eyes
        assert_eq!(scene.world.len(), before + 5);
        assert_eq!(scene.subtree(root).len(), 5);
        assert_eq!(scene.attach_count(), 1);
    }

    #[test]
    fn detach_removes_subtree_and_unlinks_parent() {
        let mut scene = Scene::new();
        let stage = scene.set_stage(Transform::IDENTITY);
        let root = scene.attach(&ghost_model(), Transform::IDENTITY);
        assert_eq!(scene.world.get::<&Children>(stage).unwrap().0, vec![root]);

        assert!(scene.detach(root));
        assert_eq!(scene.world.len(), 1);
        assert!(scene.world.get::<&Children>(stage).unwrap().0.is_empty());
        assert!(!scene.detach(root));
        assert_eq!(scene.detach_count(), 1);
    }

    #[test]
    fn opacity_override_reaches_nested_meshes_only() {
        let mut scene = Scene::new();
        let root = scene.attach(&ghost_model(), Transform::IDENTITY);

        let patched = scene.override_opacity(root, 0.5);
        assert_eq!(patched, 2);

        let mut opacities = Vec::new();
        scene.visit_renderables(root, |_, material| {
            opacities.push((material.opacity(), material.is_transparent()));
        });
        assert_eq!(opacities.len(), 2);
        for (opacity, transparent) in opacities {
            assert!((opacity - 0.5).abs() < 1.0 / 255.0);
            assert!(transparent);
        }
    }

    #[test]
    fn every_primitive_gets_its_own_material() {
        let mut scene = Scene::new();
        let robe = ModelMesh {
            mesh_index: 3,
            materials: vec![Material::white(), Material::rgb(0, 0, 0), Material::rgb(40, 40, 40)],
        };
        let model = Model::new("duch.glb", vec![ModelNode::new("Robe").with_mesh(robe)]);
        let root = scene.attach(&model, Transform::IDENTITY);

        assert_eq!(scene.override_opacity(root, 0.5), 3);

        let mut primitives = Vec::new();
        scene.visit_renderables(root, |entity, material| {
            assert!(material.is_transparent());
            primitives.push(entity);
        });
        let mut indices: Vec<usize> = primitives
            .iter()
            .map(|&entity| match scene.world.get::<&MeshComponent>(entity).unwrap().0 {
                MeshSource::Gltf { mesh_index, primitive } => {
                    assert_eq!(mesh_index, 3);
                    primitive
                }
                other => panic!("unexpected mesh {other:?}"),
            })
            .collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn stage_transform_propagates_to_attached_models() {
        let mut scene = Scene::new();
        scene.set_stage(
            Transform::from_translation(Vec3::new(0.0, -1.0, 0.0)).with_uniform_scale(0.5),
        );
        let root = scene.attach(
            &ghost_model(),
            Transform::from_translation(Vec3::new(10.0, -5.0, 0.0)),
        );

        scene.update(0.016);

        let world = scene.world_transform(root).unwrap();
        assert!(world.translation.abs_diff_eq(Vec3::new(5.0, -3.5, 0.0), 1e-5));
        assert!(world.scale.abs_diff_eq(Vec3::splat(0.5), 1e-6));
    }
}
