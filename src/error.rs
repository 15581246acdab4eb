use crowding_common::ParamError;
use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, SimulationError>;

/// Failures surfaced by construction and stepping.
///
/// A step that fails leaves the run invalid; there is no partial state to roll back.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// A construction parameter outside its valid domain.
    #[error("invalid configuration: {0}")]
    Config(#[from] ParamError),

    /// Every candidate on the nucleus boundary landed inside a crowder.
    #[error("obstacle field too dense to place a new particle: {attempts} candidates on the nucleus boundary were all inside crowders")]
    BirthPlacementFailed { attempts: u32 },

    /// A sampling distribution could not be built from validated parameters.
    #[error("distribution error: {0}")]
    Distribution(String),
}
