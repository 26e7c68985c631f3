//! Mesh combining
//!
//! Merges the renderable descendants of a node into a single mesh with one
//! sub-mesh per distinct material, so the subtree draws with one call per
//! material instead of one per node.
//!
//! The pipeline runs in one direction:
//!
//! 1. [`collect`] walks the subtree and groups nodes by [`MaterialId`](crate::render::MaterialId)
//! 2. [`merge_group`] concatenates each group into root space
//! 3. [`assemble`] stacks the groups into sub-mesh windows
//! 4. [`MeshCombiner`] runs the steps, post-processes the mesh and commits
//!    it to the root, destroying the consumed children
//!
//! ```no_run
//! use mesh_combiner::prelude::*;
//! # fn run(graph: &mut SceneGraph, root: NodeId) -> mesh_combiner::combine::Result<()> {
//! let combiner = MeshCombiner::new(CombineConfig::default());
//! let report = combiner.combine(graph, root)?;
//! println!("{} sub-meshes", report.material_count);
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod collector;
pub mod combiner;
pub mod error;
pub mod merger;

pub use assembler::{assemble, MergedMesh};
pub use collector::{collect, GroupEntry, MaterialGroup, MaterialGroups};
pub use combiner::{CombineReport, MeshCombiner, DATA_LOSS_WARNING, INDEX_FORMAT_HINT};
pub use error::{CombineError, Result};
pub use merger::{merge_group, MergedGeometry};

#[cfg(test)]
mod tests;
