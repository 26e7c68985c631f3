//! Scene graph storage and hierarchy primitives
//!
//! Nodes live in a slot-map arena and refer to each other by [`NodeId`].
//! Every walk uses an explicit work stack, so hierarchy depth is bounded by
//! heap memory rather than the call stack.

use slotmap::{new_key_type, SlotMap};

use crate::foundation::math::Mat4;
use super::node::SceneNode;

new_key_type! {
    /// Handle of a node inside a [`SceneGraph`]
    pub struct NodeId;
}

/// Scene graph errors
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// The node handle is stale or from another graph
    #[error("Scene node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Attaching would make a node its own ancestor
    #[error("Attaching {child:?} under {parent:?} would create a cycle")]
    CycleDetected {
        /// Requested parent
        parent: NodeId,
        /// Requested child
        child: NodeId,
    },

    /// A relative transform was requested against a node that is not an ancestor
    #[error("{ancestor:?} is not an ancestor of {node:?}")]
    NotAnAncestor {
        /// Node whose transform was requested
        node: NodeId,
        /// Node the transform was requested relative to
        ancestor: NodeId,
    },
}

/// Node hierarchy with parent-owns-children semantics
///
/// Destroying a node destroys its whole subtree.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, SceneNode>,
}

impl SceneGraph {
    /// Create an empty scene graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node without a parent
    pub fn add_node(&mut self, mut node: SceneNode) -> NodeId {
        node.parent = None;
        node.children.clear();
        self.nodes.insert(node)
    }

    /// Insert a node as the last child of `parent`
    pub fn add_child(&mut self, parent: NodeId, node: SceneNode) -> Result<NodeId, SceneError> {
        self.get(parent)?;
        let child = self.add_node(node);
        self.attach(parent, child)?;
        Ok(child)
    }

    /// Move `child` under `parent`, appending it to the children list
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.get(parent)?;
        self.get(child)?;

        // parent must not be child itself or one of its descendants
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                return Err(SceneError::CycleDetected { parent, child });
            }
            cursor = self.nodes.get(current).and_then(SceneNode::parent);
        }

        self.detach(child)?;
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
        Ok(())
    }

    /// Unlink `node` from its parent, making it a root
    pub fn detach(&mut self, node: NodeId) -> Result<(), SceneError> {
        let parent = self.get(node)?.parent;
        if let Some(parent) = parent {
            if let Some(parent_node) = self.nodes.get_mut(parent) {
                parent_node.children.retain(|&c| c != node);
            }
        }
        if let Some(node) = self.nodes.get_mut(node) {
            node.parent = None;
        }
        Ok(())
    }

    /// Get a node, failing on stale handles
    pub fn get(&self, id: NodeId) -> Result<&SceneNode, SceneError> {
        self.nodes.get(id).ok_or(SceneError::NodeNotFound(id))
    }

    /// Get a node mutably, failing on stale handles
    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut SceneNode, SceneError> {
        self.nodes.get_mut(id).ok_or(SceneError::NodeNotFound(id))
    }

    /// Whether `id` refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes without a parent
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(id, _)| id)
    }

    /// Children of `id` in order
    pub fn children(&self, id: NodeId) -> Result<&[NodeId], SceneError> {
        Ok(self.get(id)?.children())
    }

    /// All descendants of `id`, depth-first pre-order, children in index order
    pub fn descendants(&self, id: NodeId) -> Result<Vec<NodeId>, SceneError> {
        let mut stack: Vec<NodeId> = self.get(id)?.children.iter().rev().copied().collect();
        let mut visited = Vec::new();

        while let Some(current) = stack.pop() {
            let node = self.get(current)?;
            visited.push(current);
            stack.extend(node.children.iter().rev().copied());
        }
        Ok(visited)
    }

    /// Transform from `id`'s local space to world space
    pub fn local_to_world(&self, id: NodeId) -> Result<Mat4, SceneError> {
        let mut matrix = Mat4::identity();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.get(current)?;
            matrix = node.transform.to_matrix() * matrix;
            cursor = node.parent;
        }
        Ok(matrix)
    }

    /// Transform from `id`'s local space to the local space of `ancestor`
    ///
    /// Composes the chain from just below `ancestor` down to `id`; the
    /// ancestor's own transform is not included.
    pub fn local_to_ancestor(&self, id: NodeId, ancestor: NodeId) -> Result<Mat4, SceneError> {
        self.get(ancestor)?;
        let mut matrix = Mat4::identity();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return Ok(matrix);
            }
            let node = self.get(current)?;
            matrix = node.transform.to_matrix() * matrix;
            cursor = node.parent;
        }
        Err(SceneError::NotAnAncestor { node: id, ancestor })
    }

    /// Destroy every direct and indirect child of `id`
    ///
    /// Returns the number of nodes removed. Irreversible.
    pub fn destroy_descendants(&mut self, id: NodeId) -> Result<usize, SceneError> {
        let doomed = self.descendants(id)?;
        for &node in &doomed {
            self.nodes.remove(node);
        }
        self.get_mut(id)?.children.clear();
        Ok(doomed.len())
    }

    /// Destroy `id` and its subtree, unlinking it from its parent
    pub fn destroy(&mut self, id: NodeId) -> Result<usize, SceneError> {
        self.detach(id)?;
        let removed = self.destroy_descendants(id)?;
        self.nodes.remove(id);
        Ok(removed + 1)
    }
}
