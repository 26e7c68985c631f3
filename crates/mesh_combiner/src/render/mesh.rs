//! Mesh representation for 3D models
//!
//! A [`Mesh`] owns one shared vertex stream (positions, texture coordinates
//! and the derived normals/tangents) and one index buffer split into
//! [`SubMesh`] ranges. Each sub-mesh is drawn with its own material while
//! sharing the vertex stream of the mesh.
//!
//! Meshes attached to scene nodes are the geometry sources of a combine;
//! the combined result is again a [`Mesh`], with one sub-mesh per material.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Vec2, Vec3};

/// Bit-width of the indices stored in a mesh's index buffer
///
/// The width caps how many distinct vertices one mesh can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IndexFormat {
    /// 16-bit indices, up to 65 536 vertices
    #[default]
    Narrow,
    /// 32-bit indices
    Wide,
}

impl IndexFormat {
    /// Number of distinct vertices addressable with this format
    pub fn max_vertices(self) -> u64 {
        match self {
            Self::Narrow => u64::from(u16::MAX) + 1,
            Self::Wide => u64::from(u32::MAX) + 1,
        }
    }

    /// Whether `vertex_count` vertices can be addressed with this format
    pub fn can_address(self, vertex_count: usize) -> bool {
        u64::try_from(vertex_count).map_or(false, |count| count <= self.max_vertices())
    }

    /// Size of one index in bytes
    pub fn size_bytes(self) -> usize {
        match self {
            Self::Narrow => 2,
            Self::Wide => 4,
        }
    }
}

impl std::fmt::Display for IndexFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Narrow => write!(f, "16-bit"),
            Self::Wide => write!(f, "32-bit"),
        }
    }
}

/// Index storage, typed by [`IndexFormat`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexBuffer {
    /// 16-bit indices
    U16(Vec<u16>),
    /// 32-bit indices
    U32(Vec<u32>),
}

impl IndexBuffer {
    /// Pack `indices` into the narrowest storage `format` allows
    ///
    /// Returns the first index that does not fit when `format` is too narrow.
    pub fn pack(indices: Vec<u32>, format: IndexFormat) -> Result<Self, u32> {
        match format {
            IndexFormat::Wide => Ok(Self::U32(indices)),
            IndexFormat::Narrow => indices
                .into_iter()
                .map(|index| u16::try_from(index).map_err(|_| index))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::U16),
        }
    }

    /// Storage format of this buffer
    pub fn format(&self) -> IndexFormat {
        match self {
            Self::U16(_) => IndexFormat::Narrow,
            Self::U32(_) => IndexFormat::Wide,
        }
    }

    /// Number of indices
    pub fn len(&self) -> usize {
        match self {
            Self::U16(indices) => indices.len(),
            Self::U32(indices) => indices.len(),
        }
    }

    /// Whether the buffer holds no indices
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index at `position`, widened to `u32`
    pub fn get(&self, position: usize) -> Option<u32> {
        match self {
            Self::U16(indices) => indices.get(position).map(|&i| u32::from(i)),
            Self::U32(indices) => indices.get(position).copied(),
        }
    }

    /// Copy a range of indices out as `u32`
    pub fn range_u32(&self, start: usize, count: usize) -> Vec<u32> {
        match self {
            Self::U16(indices) => indices[start..start + count].iter().map(|&i| u32::from(i)).collect(),
            Self::U32(indices) => indices[start..start + count].to_vec(),
        }
    }

    /// Overwrite the index at `position`
    ///
    /// The caller guarantees `value` fits the buffer's format.
    pub(crate) fn set(&mut self, position: usize, value: u32) {
        match self {
            Self::U16(indices) => indices[position] = u16::try_from(value).unwrap_or(u16::MAX),
            Self::U32(indices) => indices[position] = value,
        }
    }
}

impl Default for IndexBuffer {
    fn default() -> Self {
        Self::U32(Vec::new())
    }
}

/// Range of the index buffer drawn with one material
///
/// `first_vertex .. first_vertex + vertex_count` is the vertex window the
/// sub-mesh's indices refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubMesh {
    /// First index of this sub-mesh in the index buffer
    pub index_start: usize,
    /// Number of indices (a multiple of three)
    pub index_count: usize,
    /// First vertex of the window this sub-mesh addresses
    pub first_vertex: usize,
    /// Number of vertices in the window
    pub vertex_count: usize,
}

impl SubMesh {
    /// Vertex window as a range
    pub fn vertex_range(&self) -> std::ops::Range<usize> {
        self.first_vertex..self.first_vertex + self.vertex_count
    }

    /// Index range into the mesh index buffer
    pub fn index_range(&self) -> std::ops::Range<usize> {
        self.index_start..self.index_start + self.index_count
    }
}

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing every point, `None` for an empty slice
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let first = *points.first()?;
        Some(points.iter().skip(1).fold(Self::new(first, first), |bounds, p| Self {
            min: bounds.min.inf(p),
            max: bounds.max.sup(p),
        }))
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }
}

/// Triangle mesh with one shared vertex stream and material sub-meshes
///
/// `uvs` is either empty (no texture coordinates) or index-aligned with
/// `positions`. `normals` and `tangents` are derived data filled by a
/// [`MeshProcessor`](crate::render::MeshProcessor); they are empty until
/// computed. Tangents carry handedness in `w`.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Optional name for debugging
    pub name: Option<String>,
    /// Vertex positions
    pub positions: Vec<Vec3>,
    /// Texture coordinates
    pub uvs: Vec<Vec2>,
    /// Vertex normals
    pub normals: Vec<Vec3>,
    /// Vertex tangents (xyz + handedness)
    pub tangents: Vec<[f32; 4]>,
    /// Cached bounds
    pub bounds: Option<AABB>,
    indices: IndexBuffer,
    submeshes: Vec<SubMesh>,
}

impl Mesh {
    /// Create a single sub-mesh mesh with 32-bit indices
    pub fn new(positions: Vec<Vec3>, uvs: Vec<Vec2>, indices: Vec<u32>) -> Self {
        let submesh = SubMesh {
            index_start: 0,
            index_count: indices.len(),
            first_vertex: 0,
            vertex_count: positions.len(),
        };
        Self {
            name: None,
            positions,
            uvs,
            normals: Vec::new(),
            tangents: Vec::new(),
            bounds: None,
            indices: IndexBuffer::U32(indices),
            submeshes: vec![submesh],
        }
    }

    /// Create a mesh from an already split index buffer
    ///
    /// The caller guarantees every sub-mesh's indices lie inside its vertex
    /// window; the combine assembler checks this before building a mesh.
    pub fn from_parts(
        positions: Vec<Vec3>,
        uvs: Vec<Vec2>,
        indices: IndexBuffer,
        submeshes: Vec<SubMesh>,
    ) -> Self {
        Self {
            name: None,
            positions,
            uvs,
            normals: Vec::new(),
            tangents: Vec::new(),
            bounds: None,
            indices,
            submeshes,
        }
    }

    /// Set the mesh name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Whether the mesh carries texture coordinates
    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }

    /// Index format of the index buffer
    pub fn index_format(&self) -> IndexFormat {
        self.indices.format()
    }

    /// The whole index buffer
    pub fn indices(&self) -> &IndexBuffer {
        &self.indices
    }

    /// Mutable access for in-place remapping by the mesh processor
    pub(crate) fn indices_mut(&mut self) -> &mut IndexBuffer {
        &mut self.indices
    }

    /// Sub-mesh descriptors, in material slot order
    pub fn submeshes(&self) -> &[SubMesh] {
        &self.submeshes
    }

    /// Number of sub-meshes
    pub fn submesh_count(&self) -> usize {
        self.submeshes.len()
    }

    /// Indices of one sub-mesh as `u32`, `None` when out of range
    pub fn submesh_indices(&self, submesh: usize) -> Option<Vec<u32>> {
        let descriptor = self.submeshes.get(submesh)?;
        Some(self.indices.range_u32(descriptor.index_start, descriptor.index_count))
    }

    /// Total number of triangles across all sub-meshes
    pub fn triangle_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.index_count / 3).sum()
    }

    /// Single triangle in the XY plane, facing +Z
    pub fn triangle() -> Self {
        Self::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)],
            vec![0, 1, 2],
        )
        .with_name("Triangle")
    }

    /// Unit quad in the XY plane centered on the origin, facing +Z
    pub fn quad() -> Self {
        Self::new(
            vec![
                Vec3::new(-0.5, -0.5, 0.0),
                Vec3::new(0.5, -0.5, 0.0),
                Vec3::new(0.5, 0.5, 0.0),
                Vec3::new(-0.5, 0.5, 0.0),
            ],
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 1.0),
            ],
            vec![0, 1, 2, 2, 3, 0],
        )
        .with_name("Quad")
    }

    /// Cube centered at the origin with vertices at ±1.0 on each axis
    ///
    /// Each face has its own four vertices so uvs stay unshared: 24
    /// vertices, 36 indices.
    pub fn cube() -> Self {
        // (normal, tangent-u axis, tangent-v axis) per face
        let faces = [
            (Vec3::z(), Vec3::x(), Vec3::y()),
            (-Vec3::z(), -Vec3::x(), Vec3::y()),
            (Vec3::x(), -Vec3::z(), Vec3::y()),
            (-Vec3::x(), Vec3::z(), Vec3::y()),
            (Vec3::y(), Vec3::x(), -Vec3::z()),
            (-Vec3::y(), Vec3::x(), Vec3::z()),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut uvs = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (normal, u, v) in faces {
            let base = positions.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                positions.push(normal + u * su + v * sv);
                uvs.push(Vec2::new((su + 1.0) * 0.5, (sv + 1.0) * 0.5));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }

        Self::new(positions, uvs, indices).with_name("Cube")
    }
}
