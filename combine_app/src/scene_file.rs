//! RON scene description
//!
//! ```ron
//! (
//!     materials: [(name: "stone", base_color: (0.6, 0.6, 0.6))],
//!     root: (
//!         name: "wall",
//!         children: [
//!             (name: "brick", position: (2.0, 0.0, 0.0), mesh: Some(Cube), material: Some("stone")),
//!         ],
//!     ),
//! )
//! ```
//!
//! The same format stores a combined result: an `Inline` mesh with explicit
//! `submeshes` and one entry in `materials` per sub-mesh.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use mesh_combiner::foundation::math::{Quat, Transform, Vec2, Vec3};
use mesh_combiner::render::{IndexBuffer, Material, MaterialId, MaterialLibrary, Mesh, SubMesh};
use mesh_combiner::scene::{MeshFilter, MeshRenderer, NodeId, SceneError, SceneGraph, SceneNode};
use nalgebra::Quaternion;
use serde::{Deserialize, Serialize};

/// Scene file errors
#[derive(thiserror::Error, Debug)]
pub enum SceneFileError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// RON syntax or shape error
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Writing RON failed
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// A node names a material the file does not declare
    #[error("Node '{node}' uses undeclared material '{material}'")]
    UnknownMaterial { node: String, material: String },

    /// Two materials share a name
    #[error("Material '{0}' is declared twice")]
    DuplicateMaterial(String),

    /// An inline mesh is inconsistent
    #[error("Invalid mesh on node '{node}': {reason}")]
    InvalidMesh { node: String, reason: String },

    /// Hierarchy construction failed
    #[error(transparent)]
    Scene(#[from] SceneError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialDesc {
    pub name: String,
    pub base_color: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
    pub alpha: f32,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            name: String::new(),
            base_color: [1.0, 1.0, 1.0],
            metallic: 0.0,
            roughness: 0.5,
            alpha: 1.0,
        }
    }
}

impl MaterialDesc {
    fn from_material(name: String, material: &Material) -> Self {
        Self {
            name,
            base_color: material.base_color,
            metallic: material.metallic,
            roughness: material.roughness,
            alpha: material.alpha,
        }
    }

    fn to_material(&self) -> Material {
        let [r, g, b] = self.base_color;
        Material::new()
            .with_name(self.name.clone())
            .with_color(r, g, b)
            .with_metallic(self.metallic)
            .with_roughness(self.roughness)
            .with_alpha(self.alpha)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubMeshDesc {
    pub index_start: usize,
    pub index_count: usize,
    pub first_vertex: usize,
    pub vertex_count: usize,
}

impl From<&SubMesh> for SubMeshDesc {
    fn from(submesh: &SubMesh) -> Self {
        Self {
            index_start: submesh.index_start,
            index_count: submesh.index_count,
            first_vertex: submesh.first_vertex,
            vertex_count: submesh.vertex_count,
        }
    }
}

impl From<SubMeshDesc> for SubMesh {
    fn from(desc: SubMeshDesc) -> Self {
        Self {
            index_start: desc.index_start,
            index_count: desc.index_count,
            first_vertex: desc.first_vertex,
            vertex_count: desc.vertex_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MeshDesc {
    Cube,
    Quad,
    Triangle,
    Inline {
        positions: Vec<[f32; 3]>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        uvs: Vec<[f32; 2]>,
        indices: Vec<u32>,
        /// Empty means one sub-mesh spanning everything
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        submeshes: Vec<SubMeshDesc>,
    },
}

impl MeshDesc {
    fn from_mesh(mesh: &Mesh) -> Self {
        Self::Inline {
            positions: mesh.positions.iter().map(|&p| p.into()).collect(),
            uvs: mesh.uvs.iter().map(|&uv| uv.into()).collect(),
            indices: mesh.indices().range_u32(0, mesh.indices().len()),
            submeshes: mesh.submeshes().iter().map(SubMeshDesc::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeDesc {
    pub name: String,
    pub position: [f32; 3],
    /// Quaternion as x, y, z, w
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh: Option<MeshDesc>,
    /// Single material slot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    /// Further material slots, one per sub-mesh after `material`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDesc>,
}

impl Default for NodeDesc {
    fn default() -> Self {
        Self {
            name: String::new(),
            position: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
            mesh: None,
            material: None,
            materials: Vec::new(),
            children: Vec::new(),
        }
    }
}

impl NodeDesc {
    fn transform(&self) -> Transform {
        let [x, y, z, w] = self.rotation;
        Transform::from_trs(
            Vec3::from(self.position),
            Quat::new_normalize(Quaternion::new(w, x, y, z)),
            Vec3::from(self.scale),
        )
    }

    fn material_slots(&self) -> impl Iterator<Item = &String> {
        self.material.iter().chain(&self.materials)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneFile {
    #[serde(default)]
    pub materials: Vec<MaterialDesc>,
    pub root: NodeDesc,
}

/// A scene ready to be combined
pub struct LoadedScene {
    pub graph: SceneGraph,
    pub materials: MaterialLibrary,
    pub root: NodeId,
}

impl SceneFile {
    /// Read and parse a scene file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneFileError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse scene RON text
    pub fn parse(contents: &str) -> Result<Self, SceneFileError> {
        Ok(ron::from_str(contents)?)
    }

    /// Pretty-printed RON text
    pub fn to_ron(&self) -> Result<String, SceneFileError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Write the scene as RON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SceneFileError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    /// Describe the subtree under `root`, meshes inlined
    ///
    /// Only materials referenced by the subtree are written. Unnamed or
    /// clashing material names are made unique.
    pub fn capture(
        graph: &SceneGraph,
        library: &MaterialLibrary,
        root: NodeId,
    ) -> Result<Self, SceneFileError> {
        let mut order = vec![root];
        order.extend(graph.descendants(root)?);

        let mut materials = Vec::new();
        let mut names: HashMap<MaterialId, String> = HashMap::new();
        let mut built: HashMap<NodeId, NodeDesc> = HashMap::new();

        for &id in &order {
            let node = graph.get(id)?;
            for &material in node.mesh_renderer.iter().flat_map(|r| &r.materials) {
                if names.contains_key(&material) {
                    continue;
                }
                let fallback = Material::new();
                let source = library.get(material).unwrap_or(&fallback);
                let mut name = source
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("material {}", materials.len()));
                if materials.iter().any(|m: &MaterialDesc| m.name == name) {
                    name = format!("{} {}", name, materials.len());
                }
                materials.push(MaterialDesc::from_material(name.clone(), source));
                names.insert(material, name);
            }
        }

        // Children before parents, so every subtree is complete when its parent is built
        for &id in order.iter().rev() {
            let node = graph.get(id)?;
            let children = node
                .children()
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();
            let slots = node
                .mesh_renderer
                .iter()
                .flat_map(|r| &r.materials)
                .filter_map(|material| names.get(material).cloned())
                .collect();

            let desc = NodeDesc {
                name: node.name.clone(),
                position: node.transform.position.into(),
                rotation: node.transform.rotation.coords.into(),
                scale: node.transform.scale.into(),
                mesh: node.mesh().map(|mesh| MeshDesc::from_mesh(mesh)),
                material: None,
                materials: slots,
                children,
            };
            built.insert(id, desc);
        }

        let root = built.remove(&root).ok_or(SceneError::NodeNotFound(root))?;
        Ok(Self { materials, root })
    }

    /// Build the scene graph and material library
    ///
    /// Primitive meshes are shared between every node that uses them.
    pub fn instantiate(&self) -> Result<LoadedScene, SceneFileError> {
        let mut materials = MaterialLibrary::new();
        let mut by_name: HashMap<&str, MaterialId> = HashMap::new();
        for desc in &self.materials {
            if by_name.insert(&desc.name, materials.register(desc.to_material())).is_some() {
                return Err(SceneFileError::DuplicateMaterial(desc.name.clone()));
            }
        }

        let primitives = Primitives::default();
        let mut graph = SceneGraph::new();
        let root = graph.add_node(build_node(&self.root, &by_name, &primitives)?);

        let mut pending: Vec<(NodeId, &NodeDesc)> =
            self.root.children.iter().rev().map(|child| (root, child)).collect();
        while let Some((parent, desc)) = pending.pop() {
            let id = graph.add_child(parent, build_node(desc, &by_name, &primitives)?)?;
            pending.extend(desc.children.iter().rev().map(|child| (id, child)));
        }

        log::info!(
            "Loaded scene '{}': {} nodes, {} materials",
            self.root.name,
            graph.len(),
            materials.len()
        );
        Ok(LoadedScene { graph, materials, root })
    }
}

struct Primitives {
    cube: Arc<Mesh>,
    quad: Arc<Mesh>,
    triangle: Arc<Mesh>,
}

impl Default for Primitives {
    fn default() -> Self {
        Self {
            cube: Arc::new(Mesh::cube()),
            quad: Arc::new(Mesh::quad()),
            triangle: Arc::new(Mesh::triangle()),
        }
    }
}

impl Primitives {
    fn mesh(&self, node: &str, desc: &MeshDesc) -> Result<Arc<Mesh>, SceneFileError> {
        let (positions, uvs, indices, submeshes) = match desc {
            MeshDesc::Cube => return Ok(Arc::clone(&self.cube)),
            MeshDesc::Quad => return Ok(Arc::clone(&self.quad)),
            MeshDesc::Triangle => return Ok(Arc::clone(&self.triangle)),
            MeshDesc::Inline {
                positions,
                uvs,
                indices,
                submeshes,
            } => (positions, uvs, indices, submeshes),
        };
        let invalid = |reason: String| SceneFileError::InvalidMesh {
            node: node.to_string(),
            reason,
        };

        if !uvs.is_empty() && uvs.len() != positions.len() {
            return Err(invalid(format!("{} uvs for {} positions", uvs.len(), positions.len())));
        }

        let vertices: Vec<Vec3> = positions.iter().copied().map(Vec3::from).collect();
        let uvs: Vec<Vec2> = uvs.iter().copied().map(Vec2::from).collect();
        if submeshes.is_empty() {
            return Ok(Arc::new(Mesh::new(vertices, uvs, indices.clone())));
        }

        for (slot, submesh) in submeshes.iter().enumerate() {
            let window = submesh.first_vertex..submesh.first_vertex + submesh.vertex_count;
            if window.end > positions.len() {
                return Err(invalid(format!("sub-mesh {} vertex window runs past the vertices", slot)));
            }
            let range = indices
                .get(submesh.index_start..submesh.index_start + submesh.index_count)
                .ok_or_else(|| invalid(format!("sub-mesh {} indices run past the index buffer", slot)))?;
            if range.iter().any(|&index| !window.contains(&(index as usize))) {
                return Err(invalid(format!("sub-mesh {} indexes outside its vertex window", slot)));
            }
        }

        Ok(Arc::new(Mesh::from_parts(
            vertices,
            uvs,
            IndexBuffer::U32(indices.clone()),
            submeshes.iter().copied().map(SubMesh::from).collect(),
        )))
    }
}

fn build_node(
    desc: &NodeDesc,
    materials: &HashMap<&str, MaterialId>,
    primitives: &Primitives,
) -> Result<SceneNode, SceneFileError> {
    let mut node = SceneNode::new(desc.name.clone()).with_transform(desc.transform());

    if let Some(mesh) = &desc.mesh {
        node.mesh_filter = Some(MeshFilter::shared(primitives.mesh(&desc.name, mesh)?));
    }

    let slots = desc
        .material_slots()
        .map(|name| {
            materials.get(name.as_str()).copied().ok_or_else(|| SceneFileError::UnknownMaterial {
                node: desc.name.clone(),
                material: name.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if !slots.is_empty() {
        node.mesh_renderer = Some(MeshRenderer::with_materials(slots));
    }
    Ok(node)
}
