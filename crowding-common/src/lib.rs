pub mod config;
pub mod geometry;
pub mod sim_params;
pub mod snapshot;

// Re-export key types for easier use by dependent crates
pub use config::{SimulationConfig, GeometryConfig, KineticsConfig, TimingConfig, InitialConditions, OutputConfig, OutputFormat};
pub use geometry::{Vec2, Point, Circle, angle_to_vec, distance};
pub use sim_params::{SimParams, ParamError, DEFAULT_MAX_BIRTH_ATTEMPTS};
pub use snapshot::{Snapshot, SceneGeometry};
