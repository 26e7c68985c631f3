//! Hierarchy collector
//!
//! Walks the subtree under a root node and buckets every renderable
//! descendant by material identity.

use std::collections::HashMap;
use std::sync::Arc;

use super::error::Result;
use crate::foundation::math::Mat4;
use crate::render::{MaterialId, Mesh};
use crate::scene::{NodeId, SceneGraph};

/// One renderable node found under the root
#[derive(Debug, Clone)]
pub struct GroupEntry {
    /// Node the geometry came from
    pub node: NodeId,
    /// Node name, kept for diagnostics
    pub name: String,
    /// Source geometry
    pub mesh: Arc<Mesh>,
    /// Node space to root space
    pub transform: Mat4,
}

/// All entries sharing one material
#[derive(Debug, Clone)]
pub struct MaterialGroup {
    /// Shared material of every entry
    pub material: MaterialId,
    /// Entries in traversal order
    pub entries: Vec<GroupEntry>,
}

impl MaterialGroup {
    /// Sum of the entries' vertex counts
    pub fn vertex_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.mesh.vertex_count()).sum()
    }
}

/// Material groups in the order each material was first encountered
#[derive(Debug, Clone, Default)]
pub struct MaterialGroups {
    groups: Vec<MaterialGroup>,
    lookup: HashMap<MaterialId, usize>,
    skipped: usize,
}

impl MaterialGroups {
    /// Create an empty grouping
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entry` to the group of `material`, opening the group if new
    pub fn push(&mut self, material: MaterialId, entry: GroupEntry) {
        let slot = match self.lookup.get(&material) {
            Some(&slot) => slot,
            None => {
                self.groups.push(MaterialGroup { material, entries: Vec::new() });
                let slot = self.groups.len() - 1;
                self.lookup.insert(material, slot);
                slot
            }
        };
        self.groups[slot].entries.push(entry);
    }

    /// Group for `material`
    pub fn get(&self, material: MaterialId) -> Option<&MaterialGroup> {
        self.lookup.get(&material).map(|&slot| &self.groups[slot])
    }

    /// Groups in first-encounter order
    pub fn iter(&self) -> std::slice::Iter<'_, MaterialGroup> {
        self.groups.iter()
    }

    /// Distinct materials in first-encounter order
    pub fn materials(&self) -> Vec<MaterialId> {
        self.groups.iter().map(|group| group.material).collect()
    }

    /// Number of distinct materials
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether nothing renderable was found
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of contributing nodes
    pub fn entry_count(&self) -> usize {
        self.groups.iter().map(|group| group.entries.len()).sum()
    }

    /// Sum of all contributing vertex counts
    pub fn vertex_count(&self) -> usize {
        self.groups.iter().map(MaterialGroup::vertex_count).sum()
    }

    /// Nodes that carried only one of mesh and material
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<'a> IntoIterator for &'a MaterialGroups {
    type Item = &'a MaterialGroup;
    type IntoIter = std::slice::Iter<'a, MaterialGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Group every renderable descendant of `root` by its shared material
///
/// Descendants are visited depth-first in pre-order, children in index
/// order. A node contributes when it has a mesh and at least one material;
/// nodes with neither are plain transform nodes and are walked through
/// silently. The graph is not modified.
pub fn collect(graph: &SceneGraph, root: NodeId) -> Result<MaterialGroups> {
    let mut groups = MaterialGroups::new();

    for id in graph.descendants(root)? {
        let node = graph.get(id)?;
        match (node.mesh(), node.material()) {
            (Some(mesh), Some(material)) => {
                let entry = GroupEntry {
                    node: id,
                    name: node.name.clone(),
                    mesh: Arc::clone(mesh),
                    transform: graph.local_to_ancestor(id, root)?,
                };
                groups.push(material, entry);
            }
            (None, None) => {}
            (Some(_), None) => {
                log::warn!("Skipping node '{}': mesh without material", node.name);
                groups.skipped += 1;
            }
            (None, Some(_)) => {
                log::warn!("Skipping node '{}': material without mesh", node.name);
                groups.skipped += 1;
            }
        }
    }

    log::debug!(
        "Collected {} nodes into {} material groups ({} vertices)",
        groups.entry_count(),
        groups.len(),
        groups.vertex_count()
    );
    Ok(groups)
}
