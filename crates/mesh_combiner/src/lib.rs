//! # Mesh Combiner
//!
//! Merges the meshes under a scene node into one mesh with a sub-mesh per
//! material, so a static group of objects renders with one draw call per
//! material instead of one per object.
//!
//! ## Features
//!
//! - **Scene Graph**: Slot-map backed hierarchy with TRS transforms
//! - **Material Grouping**: Geometry is bucketed by material identity
//! - **Index Formats**: 16-bit or 32-bit indices with overflow detection
//! - **Post-Processing**: Bounds, normals, tangents and vertex layout
//! - **Configuration**: TOML and RON config files
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use mesh_combiner::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut materials = MaterialLibrary::new();
//!     let stone = materials.register(Material::new().with_name("stone"));
//!
//!     let mut graph = SceneGraph::new();
//!     let root = graph.add_node(SceneNode::new("wall"));
//!     for i in 0..4 {
//!         let brick = SceneNode::new(format!("brick {}", i))
//!             .with_transform(Transform::from_position(Vec3::new(i as f32 * 2.0, 0.0, 0.0)))
//!             .with_mesh(Arc::new(Mesh::cube()))
//!             .with_material(stone);
//!         graph.add_child(root, brick)?;
//!     }
//!
//!     let report = MeshCombiner::new(CombineConfig::default()).combine(&mut graph, root)?;
//!     assert_eq!(report.material_count, 1);
//!     assert_eq!(report.vertex_count, 4 * 24);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod combine;
pub mod config;
pub mod foundation;
pub mod render;
pub mod scene;

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        combine::{CombineError, CombineReport, MeshCombiner, DATA_LOSS_WARNING, INDEX_FORMAT_HINT},
        config::{CombineConfig, Config, ConfigError},
        foundation::math::{Mat4, Quat, Transform, Vec2, Vec3},
        render::{
            IndexFormat, Material, MaterialId, MaterialLibrary, Mesh, MeshProcessor, PostProcess,
            StandardMeshProcessor, SubMesh,
        },
        scene::{MeshFilter, MeshRenderer, NodeId, SceneError, SceneGraph, SceneNode},
    };
}
