//! Rendering data: meshes, materials and mesh post-processing
//!
//! Nothing in here talks to a GPU; these are the CPU-side assets a renderer
//! would upload.

pub mod material;
pub mod mesh;
pub mod processing;

pub use material::{Material, MaterialId, MaterialLibrary};
pub use mesh::{IndexBuffer, IndexFormat, Mesh, SubMesh, AABB};
pub use processing::{MeshProcessor, PostProcess, StandardMeshProcessor};
