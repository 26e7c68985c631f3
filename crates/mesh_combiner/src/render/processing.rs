//! Mesh post-processing
//!
//! Derived mesh attributes (bounds, normals, tangents) are not carried
//! through a combine; they are rebuilt on the merged result by a
//! [`MeshProcessor`]. [`StandardMeshProcessor`] is the CPU implementation
//! used by default.

use bitflags::bitflags;

use crate::foundation::math::{Vec2, Vec3};
use super::mesh::{Mesh, AABB};

bitflags! {
    /// Post-processing steps to run on a mesh
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PostProcess: u32 {
        /// Recompute the bounding box
        const BOUNDS = 1 << 0;
        /// Recompute smooth vertex normals
        const NORMALS = 1 << 1;
        /// Recompute tangents from uvs
        const TANGENTS = 1 << 2;
        /// Reorder vertices for locality
        const OPTIMIZE = 1 << 3;
    }
}

/// Service computing derived mesh data
///
/// Implementations must not change the vertex count, the sub-mesh list or
/// move a vertex out of the window of the sub-mesh that references it.
pub trait MeshProcessor {
    /// Recompute `mesh.bounds` from the positions
    fn recompute_bounds(&self, mesh: &mut Mesh);

    /// Recompute `mesh.normals` from the triangles
    fn recompute_normals(&self, mesh: &mut Mesh);

    /// Recompute `mesh.tangents` from positions, uvs and normals
    fn recompute_tangents(&self, mesh: &mut Mesh);

    /// Reorder vertices for better locality
    fn optimize_layout(&self, mesh: &mut Mesh);

    /// Run `steps`, layout first so derived data follows the final order
    fn process(&self, mesh: &mut Mesh, steps: PostProcess) {
        if steps.contains(PostProcess::OPTIMIZE) {
            self.optimize_layout(mesh);
        }
        if steps.contains(PostProcess::BOUNDS) {
            self.recompute_bounds(mesh);
        }
        if steps.contains(PostProcess::NORMALS) {
            self.recompute_normals(mesh);
        }
        if steps.contains(PostProcess::TANGENTS) {
            self.recompute_tangents(mesh);
        }
    }
}

/// Default CPU mesh processor
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardMeshProcessor;

impl StandardMeshProcessor {
    /// Create a new processor
    pub fn new() -> Self {
        Self
    }
}

fn all_indices(mesh: &Mesh) -> Vec<u32> {
    mesh.indices().range_u32(0, mesh.indices().len())
}

impl MeshProcessor for StandardMeshProcessor {
    fn recompute_bounds(&self, mesh: &mut Mesh) {
        mesh.bounds = AABB::from_points(&mesh.positions);
    }

    fn recompute_normals(&self, mesh: &mut Mesh) {
        let mut normals = vec![Vec3::zeros(); mesh.positions.len()];

        // Unnormalized cross products weight each face by its area
        for triangle in all_indices(mesh).chunks_exact(3) {
            let [a, b, c] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
            let p0 = mesh.positions[a];
            let face_normal = (mesh.positions[b] - p0).cross(&(mesh.positions[c] - p0));
            normals[a] += face_normal;
            normals[b] += face_normal;
            normals[c] += face_normal;
        }

        // Unreferenced vertices keep a zero normal
        mesh.normals = normals
            .into_iter()
            .map(|n| n.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros))
            .collect();
    }

    fn recompute_tangents(&self, mesh: &mut Mesh) {
        let vertex_count = mesh.positions.len();
        if !mesh.has_uvs() {
            mesh.tangents = vec![[1.0, 0.0, 0.0, 1.0]; vertex_count];
            return;
        }

        let mut tangents = vec![Vec3::zeros(); vertex_count];
        let mut bitangents = vec![Vec3::zeros(); vertex_count];

        for triangle in all_indices(mesh).chunks_exact(3) {
            let [a, b, c] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];

            let e1 = mesh.positions[b] - mesh.positions[a];
            let e2 = mesh.positions[c] - mesh.positions[a];
            let duv1: Vec2 = mesh.uvs[b] - mesh.uvs[a];
            let duv2: Vec2 = mesh.uvs[c] - mesh.uvs[a];

            let det = duv1.x * duv2.y - duv2.x * duv1.y;
            if det.abs() < 1e-8 {
                continue;
            }
            let r = 1.0 / det;

            let tangent = (e1 * duv2.y - e2 * duv1.y) * r;
            let bitangent = (e2 * duv1.x - e1 * duv2.x) * r;

            for index in [a, b, c] {
                tangents[index] += tangent;
                bitangents[index] += bitangent;
            }
        }

        mesh.tangents = (0..vertex_count)
            .map(|i| {
                let normal = mesh.normals.get(i).copied().unwrap_or_else(Vec3::y);

                // Gram-Schmidt orthonormalize
                let t = tangents[i] - normal * normal.dot(&tangents[i]);
                let t = t.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::x);

                let handedness = if normal.cross(&t).dot(&bitangents[i]) < 0.0 { -1.0 } else { 1.0 };
                [t.x, t.y, t.z, handedness]
            })
            .collect();
    }

    fn optimize_layout(&self, mesh: &mut Mesh) {
        let vertex_count = mesh.positions.len();
        // old vertex index -> new vertex index
        let mut remap: Vec<usize> = (0..vertex_count).collect();

        for submesh in mesh.submeshes().to_vec() {
            let window = submesh.vertex_range();
            let mut placed = vec![false; window.len()];
            let mut order = Vec::with_capacity(window.len());

            for index in mesh.indices().range_u32(submesh.index_start, submesh.index_count) {
                let Some(local) = (index as usize)
                    .checked_sub(window.start)
                    .filter(|&local| local < window.len())
                else {
                    continue;
                };
                if !placed[local] {
                    placed[local] = true;
                    order.push(local);
                }
            }
            // Unreferenced vertices keep their relative order at the window tail
            order.extend((0..window.len()).filter(|&local| !placed[local]));

            for (new_local, old_local) in order.into_iter().enumerate() {
                remap[window.start + old_local] = window.start + new_local;
            }

            for position in submesh.index_range() {
                if let Some(old) = mesh.indices().get(position) {
                    let new = remap[old as usize] as u32;
                    mesh.indices_mut().set(position, new);
                }
            }
        }

        permute(&mut mesh.positions, &remap);
        permute(&mut mesh.uvs, &remap);
        permute(&mut mesh.normals, &remap);
        permute(&mut mesh.tangents, &remap);
    }
}

/// Move `values[old]` to `values[remap[old]]`; skipped for absent attributes
fn permute<T: Copy>(values: &mut Vec<T>, remap: &[usize]) {
    if values.len() != remap.len() {
        return;
    }
    let mut reordered = values.clone();
    for (old, &new) in remap.iter().enumerate() {
        reordered[new] = values[old];
    }
    *values = reordered;
}
