//! Scene hierarchy
//!
//! The [`SceneGraph`] owns every [`SceneNode`]; nodes reference their parent
//! and children by [`NodeId`].

pub mod node;
pub mod scene_graph;

pub use node::{MeshFilter, MeshRenderer, SceneNode};
pub use scene_graph::{NodeId, SceneError, SceneGraph};
