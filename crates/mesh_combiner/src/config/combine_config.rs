//! Settings of a combine run

use serde::{Deserialize, Serialize};

use super::Config;
use crate::render::{IndexFormat, PostProcess};

/// # Combine Configuration
///
/// Chooses the index width of the merged mesh and which derived data is
/// rebuilt afterwards. Every field has a default, so a config file only
/// needs the keys it changes.
///
/// ```toml
/// index_format = "Wide"
/// optimize_layout = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombineConfig {
    /// Index width of the merged mesh
    pub index_format: IndexFormat,
    /// Recompute the bounding box after merging
    pub recalculate_bounds: bool,
    /// Recompute vertex normals after merging
    pub recalculate_normals: bool,
    /// Recompute tangents after merging
    pub recalculate_tangents: bool,
    /// Reorder vertices inside each sub-mesh window for locality
    pub optimize_layout: bool,
    /// Texture coordinate assigned to vertices of meshes without uvs
    pub default_uv: [f32; 2],
}

impl CombineConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the index format
    pub fn with_index_format(mut self, index_format: IndexFormat) -> Self {
        self.index_format = index_format;
        self
    }

    /// Enable or disable bounds recalculation
    pub fn with_bounds(mut self, enabled: bool) -> Self {
        self.recalculate_bounds = enabled;
        self
    }

    /// Enable or disable normal recalculation
    pub fn with_normals(mut self, enabled: bool) -> Self {
        self.recalculate_normals = enabled;
        self
    }

    /// Enable or disable tangent recalculation
    pub fn with_tangents(mut self, enabled: bool) -> Self {
        self.recalculate_tangents = enabled;
        self
    }

    /// Enable or disable vertex layout optimization
    pub fn with_optimize_layout(mut self, enabled: bool) -> Self {
        self.optimize_layout = enabled;
        self
    }

    /// Set the padding uv for meshes without texture coordinates
    pub fn with_default_uv(mut self, u: f32, v: f32) -> Self {
        self.default_uv = [u, v];
        self
    }

    /// Disable every post-processing step
    pub fn without_post_processing(self) -> Self {
        self.with_bounds(false)
            .with_normals(false)
            .with_tangents(false)
            .with_optimize_layout(false)
    }

    /// Post-processing steps selected by this configuration
    pub fn post_process(&self) -> PostProcess {
        let mut steps = PostProcess::empty();
        steps.set(PostProcess::BOUNDS, self.recalculate_bounds);
        steps.set(PostProcess::NORMALS, self.recalculate_normals);
        steps.set(PostProcess::TANGENTS, self.recalculate_tangents);
        steps.set(PostProcess::OPTIMIZE, self.optimize_layout);
        steps
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.default_uv.iter().all(|c| c.is_finite()) {
            return Err(format!("Default uv must be finite, got {:?}", self.default_uv));
        }

        // Tangents are orthogonalized against the recomputed normals
        if self.recalculate_tangents && !self.recalculate_normals {
            return Err("Tangent recalculation requires normal recalculation".to_string());
        }

        Ok(())
    }
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            index_format: IndexFormat::Narrow,
            recalculate_bounds: true,
            recalculate_normals: true,
            recalculate_tangents: true,
            optimize_layout: false,
            default_uv: [0.0, 0.0],
        }
    }
}

impl Config for CombineConfig {
    fn validate(&self) -> Result<(), String> {
        CombineConfig::validate(self)
    }
}
