//! Material system
//!
//! Materials live in a [`MaterialLibrary`] and are referenced by
//! [`MaterialId`]. The combiner groups geometry by id, never by material
//! contents: two visually identical materials registered separately stay
//! two draw calls.

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Identity handle of a registered material
    pub struct MaterialId;
}

/// Material properties for 3D rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Material name for debugging
    pub name: Option<String>,

    /// Base color (RGB)
    pub base_color: [f32; 3],

    /// Metallic factor (0.0 = dielectric, 1.0 = metallic)
    pub metallic: f32,

    /// Roughness factor (0.0 = mirror, 1.0 = completely rough)
    pub roughness: f32,

    /// Alpha/transparency (0.0 = transparent, 1.0 = opaque)
    pub alpha: f32,
}

impl Material {
    /// Create a new material with default properties
    pub fn new() -> Self {
        Self {
            name: None,
            base_color: [1.0, 1.0, 1.0], // White
            metallic: 0.0,
            roughness: 0.5,
            alpha: 1.0,
        }
    }

    /// Set the material name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the base color
    pub fn with_color(mut self, r: f32, g: f32, b: f32) -> Self {
        self.base_color = [r, g, b];
        self
    }

    /// Set the metallic factor
    pub fn with_metallic(mut self, metallic: f32) -> Self {
        self.metallic = metallic.clamp(0.0, 1.0);
        self
    }

    /// Set the roughness factor
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness.clamp(0.0, 1.0);
        self
    }

    /// Set the alpha/transparency
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry owning every material of a scene
#[derive(Debug, Default)]
pub struct MaterialLibrary {
    materials: SlotMap<MaterialId, Material>,
}

impl MaterialLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a material and return its identity handle
    pub fn register(&mut self, material: Material) -> MaterialId {
        let id = self.materials.insert(material);
        log::debug!("Registered material {:?}", id);
        id
    }

    /// Get a material by ID
    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    /// Get a material mutably by ID
    pub fn get_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id)
    }

    /// Find the first material registered under `name`
    pub fn find_by_name(&self, name: &str) -> Option<MaterialId> {
        self.materials
            .iter()
            .find(|(_, material)| material.name.as_deref() == Some(name))
            .map(|(id, _)| id)
    }

    /// Number of registered materials
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether the library is empty
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
