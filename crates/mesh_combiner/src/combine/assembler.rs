//! Sub-mesh assembler
//!
//! Stacks the per-material geometries into one mesh, one sub-mesh each.

use super::error::{CombineError, Result};
use super::merger::MergedGeometry;
use crate::render::{IndexBuffer, IndexFormat, MaterialId, Mesh, SubMesh};

/// Output of a combine before it is attached to the root
#[derive(Debug, Clone)]
pub struct MergedMesh {
    /// Combined mesh, one sub-mesh per material
    pub mesh: Mesh,
    /// `materials[i]` is drawn with `mesh.submeshes()[i]`
    pub materials: Vec<MaterialId>,
}

/// Build the final mesh from per-material geometries, in order
///
/// Fails with [`CombineError::IndexFormatOverflow`] when the total vertex
/// count exceeds what `index_format` can address; no index is ever
/// truncated. Fails with [`CombineError::MalformedGroup`] when a group's
/// uvs do not match its positions or an index points outside the group.
pub fn assemble(
    groups: Vec<(MaterialId, MergedGeometry)>,
    index_format: IndexFormat,
) -> Result<MergedMesh> {
    let vertex_total: usize = groups.iter().map(|(_, geometry)| geometry.vertex_count()).sum();
    if !index_format.can_address(vertex_total) {
        return Err(CombineError::overflow(vertex_total, index_format));
    }
    for (slot, (_, geometry)) in groups.iter().enumerate() {
        check_group(slot, geometry)?;
    }
    let index_total: usize = groups.iter().map(|(_, geometry)| geometry.indices.len()).sum();

    let mut positions = Vec::with_capacity(vertex_total);
    let mut uvs = Vec::with_capacity(vertex_total);
    let mut indices = Vec::with_capacity(index_total);
    let mut submeshes = Vec::with_capacity(groups.len());
    let mut materials = Vec::with_capacity(groups.len());

    for (material, geometry) in groups {
        let submesh = SubMesh {
            index_start: indices.len(),
            index_count: geometry.indices.len(),
            first_vertex: positions.len(),
            vertex_count: geometry.vertex_count(),
        };
        log::debug!(
            "Sub-mesh {} ({:?}): {} vertices at {}, {} indices",
            submeshes.len(),
            material,
            submesh.vertex_count,
            submesh.first_vertex,
            submesh.index_count
        );

        // vertex_total fits the format, so every shifted index fits in 32 bits
        let offset = submesh.first_vertex as u32;
        indices.extend(geometry.indices.iter().map(|&index| index + offset));
        positions.extend(geometry.positions);
        uvs.extend(geometry.uvs);

        submeshes.push(submesh);
        materials.push(material);
    }

    let indices = IndexBuffer::pack(indices, index_format)
        .map_err(|_| CombineError::overflow(vertex_total, index_format))?;

    Ok(MergedMesh {
        mesh: Mesh::from_parts(positions, uvs, indices, submeshes),
        materials,
    })
}

/// Indices of a group may only address that group's own vertices
fn check_group(slot: usize, geometry: &MergedGeometry) -> Result<()> {
    let malformed = |reason: String| CombineError::MalformedGroup { submesh: slot, reason };

    if geometry.uvs.len() != geometry.vertex_count() {
        return Err(malformed(format!(
            "{} uvs for {} positions",
            geometry.uvs.len(),
            geometry.vertex_count()
        )));
    }
    if geometry.indices.len() % 3 != 0 {
        return Err(malformed(format!(
            "{} indices is not a whole number of triangles",
            geometry.indices.len()
        )));
    }
    if let Some(&bad) = geometry
        .indices
        .iter()
        .find(|&&index| index as usize >= geometry.vertex_count())
    {
        return Err(malformed(format!(
            "index {} outside its window of {} vertices",
            bad,
            geometry.vertex_count()
        )));
    }
    Ok(())
}
