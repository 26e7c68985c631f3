//! Geometry merger
//!
//! Concatenates the meshes of one material group into a single vertex
//! stream in root space.

use super::collector::GroupEntry;
use super::error::{CombineError, Result};
use crate::foundation::math::{Point3, Vec2, Vec3};
use crate::render::IndexFormat;

/// Geometry of one material group, indices local to this group
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedGeometry {
    /// Root-space positions
    pub positions: Vec<Vec3>,
    /// Texture coordinates, one per position
    pub uvs: Vec<Vec2>,
    /// Triangle indices into `positions`
    pub indices: Vec<u32>,
}

impl MergedGeometry {
    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Merge the entries of one group in order
///
/// Each entry's positions go through its transform and its indices are
/// shifted by the vertices merged before it. Sub-mesh 0 of each mesh is
/// used. Meshes without uvs are padded with `default_uv`.
pub fn merge_group(entries: &[GroupEntry], default_uv: Vec2) -> Result<MergedGeometry> {
    let vertex_total: usize = entries.iter().map(|entry| entry.mesh.vertex_count()).sum();
    let index_total: usize = entries
        .iter()
        .map(|entry| entry.mesh.submeshes().first().map_or(0, |submesh| submesh.index_count))
        .sum();

    let mut merged = MergedGeometry {
        positions: Vec::with_capacity(vertex_total),
        uvs: Vec::with_capacity(vertex_total),
        indices: Vec::with_capacity(index_total),
    };

    for entry in entries {
        let mesh = &entry.mesh;
        let vertex_count = mesh.vertex_count();
        let invalid = |reason: String| CombineError::InvalidGeometry {
            node: entry.name.clone(),
            reason,
        };

        if mesh.has_uvs() && mesh.uvs.len() != vertex_count {
            return Err(invalid(format!(
                "{} uvs for {} positions",
                mesh.uvs.len(),
                vertex_count
            )));
        }

        let indices = mesh.submesh_indices(0).unwrap_or_default();
        if indices.len() % 3 != 0 {
            return Err(invalid(format!("{} indices is not a whole number of triangles", indices.len())));
        }
        if let Some(&bad) = indices.iter().find(|&&index| index as usize >= vertex_count) {
            return Err(invalid(format!("index {} out of range for {} vertices", bad, vertex_count)));
        }

        let offset = merged.positions.len();
        if !IndexFormat::Wide.can_address(offset + vertex_count) {
            return Err(CombineError::overflow(offset + vertex_count, IndexFormat::Wide));
        }
        // Checked above: every shifted index fits in 32 bits
        let offset = offset as u32;

        merged.positions.extend(
            mesh.positions
                .iter()
                .map(|p| entry.transform.transform_point(&Point3::from(*p)).coords),
        );
        if mesh.has_uvs() {
            merged.uvs.extend_from_slice(&mesh.uvs);
        } else {
            merged.uvs.resize(merged.positions.len(), default_uv);
        }
        merged.indices.extend(indices.into_iter().map(|index| index + offset));
    }

    Ok(merged)
}
