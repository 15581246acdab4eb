use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default cap on nucleus-boundary resampling per birth.
pub const DEFAULT_MAX_BIRTH_ATTEMPTS: u32 = 10_000;

/// A construction parameter outside its valid domain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("{name} must be positive (got {value})")]
    NotPositive { name: &'static str, value: f64 },

    #[error("{name} must be non-negative (got {value})")]
    Negative { name: &'static str, value: f64 },

    #[error("{name} must be finite (got {value})")]
    NotFinite { name: &'static str, value: f64 },

    #[error("degradation_rate * dt = {0} is not a per-step probability (must be <= 1)")]
    DeathProbabilityAboveOne(f64),

    #[error("max_birth_attempts must be at least 1")]
    ZeroBirthAttempts,
}

/// Immutable physical parameters of one simulation, plus values derived from them
/// that the stepper uses every step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    // Geometry
    pub cell_radius: f64,
    pub nucleus_radius: f64,
    pub crowder_radius: f64,
    pub crowder_density: f64, // crowders per unit area of the cell's bounding box

    // Kinetics (per unit time)
    pub production_rate: f64,
    pub degradation_rate: f64,
    pub diffusion_coefficient: f64,

    // Time
    pub dt: f64,

    // Derived
    pub step_sigma: f64,        // sqrt(2 * D * dt)
    pub births_per_step: f64,   // production_rate * dt
    pub death_probability: f64, // degradation_rate * dt
    pub max_birth_attempts: u32,
}

impl SimParams {
    /// Validates the eight physical parameters and derives the per-step quantities.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cell_radius: f64,
        nucleus_radius: f64,
        crowder_radius: f64,
        crowder_density: f64,
        production_rate: f64,
        degradation_rate: f64,
        diffusion_coefficient: f64,
        dt: f64,
    ) -> Result<Self, ParamError> {
        positive("cell_radius", cell_radius)?;
        positive("nucleus_radius", nucleus_radius)?;
        non_negative("crowder_radius", crowder_radius)?;
        non_negative("crowder_density", crowder_density)?;
        non_negative("production_rate", production_rate)?;
        non_negative("degradation_rate", degradation_rate)?;
        non_negative("diffusion_coefficient", diffusion_coefficient)?;
        positive("dt", dt)?;

        let death_probability = degradation_rate * dt;
        if death_probability > 1.0 {
            return Err(ParamError::DeathProbabilityAboveOne(death_probability));
        }

        Ok(SimParams {
            cell_radius,
            nucleus_radius,
            crowder_radius,
            crowder_density,
            production_rate,
            degradation_rate,
            diffusion_coefficient,
            dt,
            step_sigma: (2.0 * diffusion_coefficient * dt).sqrt(),
            births_per_step: production_rate * dt,
            death_probability,
            max_birth_attempts: DEFAULT_MAX_BIRTH_ATTEMPTS,
        })
    }

    /// Overrides the rejection-sampling cap used when placing new particles.
    pub fn with_max_birth_attempts(mut self, attempts: u32) -> Result<Self, ParamError> {
        if attempts == 0 {
            return Err(ParamError::ZeroBirthAttempts);
        }
        self.max_birth_attempts = attempts;
        Ok(self)
    }
}

fn finite(name: &'static str, value: f64) -> Result<(), ParamError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ParamError::NotFinite { name, value })
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ParamError> {
    finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ParamError::NotPositive { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ParamError> {
    finite(name, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ParamError::Negative { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> Result<SimParams, ParamError> {
        SimParams::new(10.0, 2.0, 0.5, 0.1, 100.0, 0.5, 0.1, 0.01)
    }

    #[test]
    fn derives_per_step_quantities() {
        let p = baseline().unwrap();
        assert!((p.step_sigma - (2.0f64 * 0.1 * 0.01).sqrt()).abs() < 1e-15);
        assert!((p.births_per_step - 1.0).abs() < 1e-12);
        assert!((p.death_probability - 0.005).abs() < 1e-15);
        assert_eq!(p.max_birth_attempts, DEFAULT_MAX_BIRTH_ATTEMPTS);
    }

    #[test]
    fn point_crowders_and_zero_rates_are_valid() {
        let p = SimParams::new(10.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.01).unwrap();
        assert_eq!(p.step_sigma, 0.0);
        assert_eq!(p.births_per_step, 0.0);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert_eq!(
            SimParams::new(0.0, 2.0, 0.5, 0.1, 1.0, 1.0, 0.1, 0.01),
            Err(ParamError::NotPositive { name: "cell_radius", value: 0.0 })
        );
        assert!(matches!(
            SimParams::new(10.0, -2.0, 0.5, 0.1, 1.0, 1.0, 0.1, 0.01),
            Err(ParamError::NotPositive { name: "nucleus_radius", .. })
        ));
        assert!(matches!(
            SimParams::new(10.0, 2.0, -0.5, 0.1, 1.0, 1.0, 0.1, 0.01),
            Err(ParamError::Negative { name: "crowder_radius", .. })
        ));
        assert!(matches!(
            SimParams::new(10.0, 2.0, 0.5, 0.1, -1.0, 1.0, 0.1, 0.01),
            Err(ParamError::Negative { name: "production_rate", .. })
        ));
        assert!(matches!(
            SimParams::new(10.0, 2.0, 0.5, 0.1, 1.0, 1.0, -0.1, 0.01),
            Err(ParamError::Negative { name: "diffusion_coefficient", .. })
        ));
        assert!(matches!(
            SimParams::new(10.0, 2.0, 0.5, 0.1, 1.0, 1.0, 0.1, 0.0),
            Err(ParamError::NotPositive { name: "dt", .. })
        ));
        assert!(matches!(
            SimParams::new(10.0, 2.0, 0.5, f64::NAN, 1.0, 1.0, 0.1, 0.01),
            Err(ParamError::NotFinite { name: "crowder_density", .. })
        ));
    }

    #[test]
    fn death_probability_must_fit_in_one_step() {
        assert!(matches!(
            SimParams::new(10.0, 2.0, 0.5, 0.1, 1.0, 200.0, 0.1, 0.01),
            Err(ParamError::DeathProbabilityAboveOne(_))
        ));
    }

    #[test]
    fn birth_attempt_cap_must_be_positive() {
        let p = baseline().unwrap();
        assert_eq!(p.clone().with_max_birth_attempts(0), Err(ParamError::ZeroBirthAttempts));
        assert_eq!(p.with_max_birth_attempts(7).unwrap().max_birth_attempts, 7);
    }

    #[test]
    fn error_display_names_the_parameter() {
        let e = ParamError::Negative { name: "degradation_rate", value: -1.0 };
        let msg = e.to_string();
        assert!(msg.contains("degradation_rate"));
        assert!(msg.contains("non-negative"));
    }
}
