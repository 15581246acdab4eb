//! Stochastic simulation of Brownian particles produced at a nucleus, degraded in the
//! cytoplasm, and reflected by the cell membrane, the nucleus and static crowders.

pub mod error;
pub mod obstacles;
pub mod particle_state;
pub mod simulation;

pub use error::{Result, SimulationError};
pub use obstacles::ObstacleField;
pub use particle_state::ParticleState;
pub use simulation::{resolve_collision, sample_birth_position, DiffusionSimulation, StepReport};

// Shared types, re-exported so drivers need only this crate.
pub use crowding_common::{Circle, Point, SceneGeometry, SimParams, Snapshot, Vec2};
