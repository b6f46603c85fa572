// asset/model.rs - glTF node hierarchy, decoded once and instantiated many times

use std::collections::HashSet;

use glam::{Quat, Vec3};

use super::{AssetError, AssetKind, Assets, AssetCache};
use crate::renderer::Material;
use crate::scene::Transform;

/// A decoded glTF scene: the node tree plus enough mesh/material data to
/// render and recolour it.
#[derive(Debug, Clone)]
pub struct Model {
    pub path: String,
    pub roots: Vec<ModelNode>,
}

#[derive(Debug, Clone)]
pub struct ModelNode {
    pub name: Option<String>,
    pub transform: Transform,
    pub mesh: Option<ModelMesh>,
    pub children: Vec<ModelNode>,
}

/// One glTF mesh and the material of each of its primitives, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMesh {
    pub mesh_index: usize,
    pub materials: Vec<Material>,
}

impl ModelMesh {
    pub fn single(mesh_index: usize, material: Material) -> Self {
        Self {
            mesh_index,
            materials: vec![material],
        }
    }

    pub fn primitive_count(&self) -> usize {
        self.materials.len()
    }
}

impl ModelNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            transform: Transform::IDENTITY,
            mesh: None,
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_mesh(mut self, mesh: ModelMesh) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_child(mut self, child: ModelNode) -> Self {
        self.children.push(child);
        self
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(ModelNode::count).sum::<usize>()
    }

    fn count_meshes(&self) -> usize {
        usize::from(self.mesh.is_some())
            + self.children.iter().map(ModelNode::count_meshes).sum::<usize>()
    }
}

impl Model {
    pub fn new(path: impl Into<String>, roots: Vec<ModelNode>) -> Self {
        Self {
            path: path.into(),
            roots,
        }
    }

    pub fn node_count(&self) -> usize {
        self.roots.iter().map(ModelNode::count).sum()
    }

    pub fn mesh_count(&self) -> usize {
        self.roots.iter().map(ModelNode::count_meshes).sum()
    }

    /// Parses a `.gltf` or `.glb` document. Buffers are not resolved; only
    /// the default scene's hierarchy and material parameters are kept.
    pub fn from_gltf_slice(path: &str, bytes: &[u8]) -> Result<Self, AssetError> {
        let gltf = gltf::Gltf::from_slice(bytes).map_err(|err| AssetError::GltfParse {
            path: path.to_string(),
            message: err.to_string(),
        })?;

        let scene = gltf
            .default_scene()
            .or_else(|| gltf.scenes().next())
            .ok_or_else(|| AssetError::EmptyScene {
                path: path.to_string(),
            })?;

        let mut visited = HashSet::new();
        let roots = scene
            .nodes()
            .filter_map(|node| load_node(&node, &mut visited))
            .collect();

        let model = Self::new(path, roots);
        log::debug!(
            "Decoded {}: {} nodes, {} meshes",
            path,
            model.node_count(),
            model.mesh_count()
        );
        Ok(model)
    }
}

fn load_node(node: &gltf::Node<'_>, visited: &mut HashSet<usize>) -> Option<ModelNode> {
    if !visited.insert(node.index()) {
        log::warn!("Skipping node {} reached twice in hierarchy", node.index());
        return None;
    }

    let (translation, rotation, scale) = node.transform().decomposed();
    let transform = Transform::from_trs(
        Vec3::from(translation),
        Quat::from_array(rotation),
        Vec3::from(scale),
    );

    let mesh = node.mesh().map(|mesh| ModelMesh {
        mesh_index: mesh.index(),
        materials: mesh
            .primitives()
            .map(|primitive| load_material(&primitive.material()))
            .collect(),
    });

    let children = node
        .children()
        .filter_map(|child| load_node(&child, visited))
        .collect();

    Some(ModelNode {
        name: node.name().map(str::to_string),
        transform,
        mesh,
        children,
    })
}

fn load_material(material: &gltf::Material<'_>) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let mut result = Material::from_color_f32(pbr.base_color_factor())
        .with_metallic(pbr.metallic_factor())
        .with_roughness(pbr.roughness_factor());

    if matches!(material.alpha_mode(), gltf::material::AlphaMode::Blend) {
        result = result.with_alpha();
    }
    if material.double_sided() {
        result = result.with_double_sided();
    }
    result
}

impl AssetKind for Model {
    fn decode(path: &str, bytes: Vec<u8>) -> Result<Self, AssetError> {
        Self::from_gltf_slice(path, &bytes)
    }

    fn cache(assets: &Assets) -> &AssetCache<Self> {
        &assets.models
    }

    fn cache_mut(assets: &mut Assets) -> &mut AssetCache<Self> {
        &mut assets.models
    }
}
