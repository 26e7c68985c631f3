//! Scene node and its renderable components

use std::sync::Arc;

use crate::foundation::math::Transform;
use crate::render::{MaterialId, Mesh};
use super::scene_graph::NodeId;

/// Geometry attached to a node
///
/// The mesh is shared: several nodes may reference the same asset.
#[derive(Debug, Clone)]
pub struct MeshFilter {
    /// Shared mesh asset
    pub mesh: Arc<Mesh>,
}

impl MeshFilter {
    /// Wrap an owned mesh
    pub fn new(mesh: Mesh) -> Self {
        Self { mesh: Arc::new(mesh) }
    }

    /// Reference an already shared mesh
    pub fn shared(mesh: Arc<Mesh>) -> Self {
        Self { mesh }
    }
}

/// Material slots of a node, one per sub-mesh of its mesh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshRenderer {
    /// Materials in sub-mesh order
    pub materials: Vec<MaterialId>,
}

impl MeshRenderer {
    /// Renderer with a single material
    pub fn new(material: MaterialId) -> Self {
        Self { materials: vec![material] }
    }

    /// Renderer with several material slots
    pub fn with_materials(materials: Vec<MaterialId>) -> Self {
        Self { materials }
    }

    /// The material of the first slot
    pub fn shared_material(&self) -> Option<MaterialId> {
        self.materials.first().copied()
    }
}

/// Node of the scene hierarchy
///
/// Hierarchy links are owned by the [`SceneGraph`](super::SceneGraph) and
/// only readable here; use the graph to attach or destroy nodes.
#[derive(Debug, Clone, Default)]
pub struct SceneNode {
    /// Node name for debugging
    pub name: String,
    /// Transform relative to the parent
    pub transform: Transform,
    /// Attached geometry
    pub mesh_filter: Option<MeshFilter>,
    /// Attached material slots
    pub mesh_renderer: Option<MeshRenderer>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl SceneNode {
    /// Create an empty node with an identity transform
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder pattern: Set the local transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Builder pattern: Attach a mesh
    pub fn with_mesh(mut self, mesh: Arc<Mesh>) -> Self {
        self.mesh_filter = Some(MeshFilter::shared(mesh));
        self
    }

    /// Builder pattern: Attach a single material
    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.mesh_renderer = Some(MeshRenderer::new(material));
        self
    }

    /// Parent node, `None` for roots
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The mesh, if a filter is attached
    pub fn mesh(&self) -> Option<&Arc<Mesh>> {
        self.mesh_filter.as_ref().map(|filter| &filter.mesh)
    }

    /// The shared material, if a renderer with at least one slot is attached
    pub fn material(&self) -> Option<MaterialId> {
        self.mesh_renderer.as_ref().and_then(MeshRenderer::shared_material)
    }

    /// Whether this node carries both geometry and a material
    pub fn is_renderable(&self) -> bool {
        self.mesh().is_some() && self.material().is_some()
    }
}
