use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::BrushError;

/// Operational limits shared by every brush. Loaded from TOML; every field is optional.
///
/// A negative radius means "unlimited".
#[derive(Clone, Debug, Deserialize)]
pub struct BrushLimits {
    #[serde(default = "default_max_brush_radius")]
    pub max_brush_radius: f64,
    #[serde(default = "default_butcher_max_radius")]
    pub butcher_max_radius: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Most blocks a single stroke may change.
    #[serde(default = "default_max_changes")]
    pub max_changes: usize,
    #[serde(default = "default_scatter_attempts_per_point")]
    pub scatter_attempts_per_point: usize,
    #[serde(default = "default_heightmap_dir")]
    pub heightmap_dir: PathBuf,
}

fn default_max_brush_radius() -> f64 {
    100.0
}
fn default_butcher_max_radius() -> f64 {
    -1.0
}
fn default_max_iterations() -> u32 {
    5
}
fn default_max_changes() -> usize {
    10_000_000
}
fn default_scatter_attempts_per_point() -> usize {
    100
}
fn default_heightmap_dir() -> PathBuf {
    PathBuf::from("heightmaps")
}

impl Default for BrushLimits {
    fn default() -> Self {
        Self {
            max_brush_radius: default_max_brush_radius(),
            butcher_max_radius: default_butcher_max_radius(),
            max_iterations: default_max_iterations(),
            max_changes: default_max_changes(),
            scatter_attempts_per_point: default_scatter_attempts_per_point(),
            heightmap_dir: default_heightmap_dir(),
        }
    }
}

impl BrushLimits {
    pub fn from_toml_str(s: &str) -> Result<Self, BrushError> {
        toml::from_str(s).map_err(|e| BrushError::config(format!("brush limits: {e}")))
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, BrushError> {
        let path = path.as_ref();
        let s = fs::read_to_string(path)
            .map_err(|e| BrushError::config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&s)
    }

    /// Largest radius for ordinary brushes; `None` when unlimited.
    pub fn radius_cap(&self) -> Option<f64> {
        (self.max_brush_radius >= 0.0).then_some(self.max_brush_radius)
    }

    /// Radius cap for entity removal. Players allowed to butcher get the larger of the two
    /// caps; a resulting cap of -1 lifts the limit.
    pub fn butcher_radius_cap(&self, extended: bool) -> Option<f64> {
        let cap = if extended {
            self.max_brush_radius.max(self.butcher_max_radius)
        } else {
            self.max_brush_radius
        };
        (cap >= 0.0).then_some(cap)
    }

    /// Candidate budget for a sampler asked for `points` accepted points.
    pub fn scatter_attempts(&self, points: usize) -> usize {
        points.saturating_mul(self.scatter_attempts_per_point.max(1))
    }
}
