//! Combine errors

use crate::render::IndexFormat;
use crate::scene::SceneError;

/// Errors raised by a combine
///
/// Every variant is raised before the hierarchy is modified.
#[derive(thiserror::Error, Debug)]
pub enum CombineError {
    /// Stale node handle or broken hierarchy
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// The merged vertex count cannot be addressed by the chosen index format
    #[error(
        "Combined mesh needs {vertex_count} vertices but {index_format} indices address at most {max_vertices}"
    )]
    IndexFormatOverflow {
        /// Vertices the merged mesh would contain
        vertex_count: usize,
        /// Requested index format
        index_format: IndexFormat,
        /// Limit of the requested format
        max_vertices: u64,
    },

    /// A source mesh is internally inconsistent
    #[error("Invalid geometry on node '{node}': {reason}")]
    InvalidGeometry {
        /// Name of the node carrying the mesh
        node: String,
        /// What is wrong with it
        reason: String,
    },

    /// A merged group does not stay inside its own vertex window
    #[error("Malformed geometry for sub-mesh {submesh}: {reason}")]
    MalformedGroup {
        /// Sub-mesh slot of the group
        submesh: usize,
        /// What is wrong with it
        reason: String,
    },

    /// The combine configuration was rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CombineError {
    pub(crate) fn overflow(vertex_count: usize, index_format: IndexFormat) -> Self {
        Self::IndexFormatOverflow {
            vertex_count,
            index_format,
            max_vertices: index_format.max_vertices(),
        }
    }
}

/// Result type for combine operations
pub type Result<T> = std::result::Result<T, CombineError>;
