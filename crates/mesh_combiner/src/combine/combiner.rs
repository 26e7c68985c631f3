//! Combine orchestration
//!
//! [`MeshCombiner::combine`] runs the whole pipeline on one root node:
//! normalize the root transform, collect, merge, assemble, post-process,
//! attach the result to the root, destroy the consumed children and
//! restore the root transform. Every check runs before the first
//! destructive step; once children are being destroyed nothing can fail.

use std::mem;

use super::assembler::{assemble, MergedMesh};
use super::collector::{collect, MaterialGroups};
use super::error::{CombineError, Result};
use super::merger::merge_group;
use crate::config::CombineConfig;
use crate::foundation::math::{Transform, Vec2};
use crate::render::{MeshProcessor, StandardMeshProcessor};
use crate::scene::{MeshFilter, MeshRenderer, NodeId, SceneGraph};

/// Shown to users before a combine is triggered
pub const DATA_LOSS_WARNING: &str =
    "Combining will delete all children and this is not undoable. Copy the object first if you want to keep them.";

/// Shown to users when a combine overflows the index format
pub const INDEX_FORMAT_HINT: &str =
    "Only switch the index format to 32-bit if combining fails because the mesh exceeds the maximum vertex count.";

/// Summary of a committed combine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CombineReport {
    /// Sub-meshes (and materials) of the combined mesh
    pub material_count: usize,
    /// Vertices of the combined mesh
    pub vertex_count: usize,
    /// Indices of the combined mesh
    pub index_count: usize,
    /// Nodes whose geometry was merged
    pub nodes_merged: usize,
    /// Nodes with only a mesh or only a material
    pub nodes_skipped: usize,
    /// Descendants removed from the graph
    pub nodes_destroyed: usize,
    /// Nothing renderable was found under the root
    pub degenerate: bool,
}

/// Merges the renderable descendants of a node into one multi-material mesh
pub struct MeshCombiner<P: MeshProcessor = StandardMeshProcessor> {
    config: CombineConfig,
    processor: P,
}

impl MeshCombiner {
    /// Create a combiner using the standard mesh processor
    pub fn new(config: CombineConfig) -> Self {
        Self::with_processor(config, StandardMeshProcessor::new())
    }
}

impl Default for MeshCombiner {
    fn default() -> Self {
        Self::new(CombineConfig::default())
    }
}

impl<P: MeshProcessor> MeshCombiner<P> {
    /// Create a combiner with a custom mesh processor
    pub fn with_processor(config: CombineConfig, processor: P) -> Self {
        Self { config, processor }
    }

    /// Active configuration
    pub fn config(&self) -> &CombineConfig {
        &self.config
    }

    /// Processor run on every combined mesh
    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// Merge every renderable descendant of `root` into `root`'s mesh
    ///
    /// On success the root carries the combined mesh and one material per
    /// sub-mesh, and all of its descendants are destroyed. On error the
    /// graph is left as it was.
    pub fn combine(&self, graph: &mut SceneGraph, root: NodeId) -> Result<CombineReport> {
        self.config.validate().map_err(CombineError::InvalidConfig)?;

        let saved = mem::replace(&mut graph.get_mut(root)?.transform, Transform::identity());
        if !saved.is_identity() {
            log::debug!("Normalized root transform {:?} for the duration of the combine", saved);
        }
        let outcome = self.combine_normalized(graph, root);
        if let Ok(node) = graph.get_mut(root) {
            node.transform = saved;
        }
        outcome
    }

    /// Build the combined mesh without touching the graph
    pub fn build(&self, graph: &SceneGraph, root: NodeId) -> Result<(MergedMesh, MaterialGroups)> {
        let groups = collect(graph, root)?;
        let default_uv = Vec2::from(self.config.default_uv);

        let mut merged = Vec::with_capacity(groups.len());
        for group in &groups {
            merged.push((group.material, merge_group(&group.entries, default_uv)?));
        }

        let mut output = assemble(merged, self.config.index_format)?;
        self.processor.process(&mut output.mesh, self.config.post_process());
        Ok((output, groups))
    }

    fn combine_normalized(&self, graph: &mut SceneGraph, root: NodeId) -> Result<CombineReport> {
        let (MergedMesh { mut mesh, materials }, groups) = self.build(graph, root)?;

        let root_node = graph.get_mut(root)?;
        if groups.is_empty() {
            log::warn!(
                "Nothing to combine under '{}': no child carries both a mesh and a material",
                root_node.name
            );
        }
        mesh.name = Some(format!("{} (combined)", root_node.name));

        let report = CombineReport {
            material_count: materials.len(),
            vertex_count: mesh.vertex_count(),
            index_count: mesh.indices().len(),
            nodes_merged: groups.entry_count(),
            nodes_skipped: groups.skipped(),
            nodes_destroyed: 0,
            degenerate: groups.is_empty(),
        };

        // Commit: from here on the hierarchy is modified
        root_node.mesh_filter = Some(MeshFilter::new(mesh));
        root_node.mesh_renderer = Some(MeshRenderer::with_materials(materials));
        let nodes_destroyed = graph.destroy_descendants(root)?;

        let report = CombineReport { nodes_destroyed, ..report };
        log::info!(
            "Combined {} nodes into {} sub-meshes ({} vertices, {} indices), destroyed {} nodes",
            report.nodes_merged,
            report.material_count,
            report.vertex_count,
            report.index_count,
            report.nodes_destroyed
        );
        Ok(report)
    }
}
