use serde::{Serialize, Deserialize};
use crate::geometry::Circle;

/// State and summary metrics of one simulation at a recorded step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Simulated time, `step * dt`.
    pub time: f64,
    /// Number of completed steps when the snapshot was taken.
    pub step: u64,
    pub particle_count: usize,
    /// Births since construction.
    pub total_births: u64,
    /// Deaths since construction.
    pub total_deaths: u64,
    /// Mean distance of particles from the cell center; 0 for an empty population.
    pub mean_radial_distance: f64,
    /// Particle counts in equal-width annuli from the nucleus radius out to the cell radius.
    /// Bin `i` covers `[r_n + i * w, r_n + (i + 1) * w)`; out-of-range distances are clamped
    /// into the first or last bin.
    pub radial_histogram: Vec<u32>,
    /// Particle coordinates, present only when requested. Always serialized (bincode
    /// cannot skip fields).
    pub positions: Option<Vec<(f64, f64)>>,
}

/// The static scene of one simulation, for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneGeometry {
    pub cell: Circle,
    pub nucleus: Circle,
    /// Crowders in generation order.
    pub crowders: Vec<Circle>,
}
