use serde::{Deserialize, Serialize};
use anyhow::{Context, Result};
use crate::sim_params::{SimParams, DEFAULT_MAX_BIRTH_ATTEMPTS};
use std::path::Path;

// Cell, nucleus and crowder geometry
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GeometryConfig {
    pub cell_radius: f64,
    pub nucleus_radius: f64,
    pub crowder_radius: f64,
    /// Mean number of crowders per unit area of the cell's bounding box.
    pub crowder_density: f64,
}

// Production, degradation and diffusion, all per unit time
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct KineticsConfig {
    pub production_rate: f64,
    pub degradation_rate: f64,
    pub diffusion_coefficient: f64,
}

// Configuration for timing
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    pub dt: f64,
    pub total_time: f64,
    pub record_interval: f64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct InitialConditions {
    pub seed: u64,
    #[serde(default = "default_max_birth_attempts")]
    pub max_birth_attempts: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Bincode,
    MessagePack,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    pub save_stats: bool,
    pub save_positions: bool,
    #[serde(default)]
    pub save_positions_in_snapshot: bool,
    #[serde(default)]
    pub save_geometry: bool,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default = "default_radial_bins")]
    pub radial_bins: usize,
}

fn default_max_birth_attempts() -> u32 {
    DEFAULT_MAX_BIRTH_ATTEMPTS
}

fn default_radial_bins() -> usize {
    20
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    pub geometry: GeometryConfig,
    pub kinetics: KineticsConfig,
    pub timing: TimingConfig,
    pub initial_conditions: InitialConditions,
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read config file '{}'", path_ref.display()))?;
        let config = Self::from_toml_str(&config_str)
            .with_context(|| format!("Invalid config file '{}'", path_ref.display()))?;
        Ok(config)
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(config_str).context("Failed to parse TOML")?;

        // Physical ranges are checked by get_sim_params; only driver settings here.
        if !config.timing.total_time.is_finite() || config.timing.total_time < 0.0 {
            anyhow::bail!("total_time must be non-negative.");
        }
        if !config.timing.record_interval.is_finite() || config.timing.record_interval < 0.0 {
            anyhow::bail!("record_interval must be non-negative.");
        }
        if config.output.radial_bins == 0 {
            anyhow::bail!("radial_bins must be greater than 0.");
        }
        config.get_sim_params()?;

        Ok(config)
    }

    /// Converts the configuration into validated runtime parameters.
    pub fn get_sim_params(&self) -> Result<SimParams> {
        let g = &self.geometry;
        let k = &self.kinetics;
        let params = SimParams::new(
            g.cell_radius,
            g.nucleus_radius,
            g.crowder_radius,
            g.crowder_density,
            k.production_rate,
            k.degradation_rate,
            k.diffusion_coefficient,
            self.timing.dt,
        )?
        .with_max_birth_attempts(self.initial_conditions.max_birth_attempts)?;
        Ok(params)
    }

    /// Number of physics steps covering `total_time`.
    pub fn total_steps(&self) -> u64 {
        (self.timing.total_time / self.timing.dt).ceil() as u64
    }

    /// Steps between snapshots; never less than one.
    pub fn record_interval_steps(&self) -> u64 {
        ((self.timing.record_interval / self.timing.dt).round() as u64).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[geometry]
cell_radius = 10.0
nucleus_radius = 2.0
crowder_radius = 0.3
crowder_density = 0.5

[kinetics]
production_rate = 100.0
degradation_rate = 1.0
diffusion_coefficient = 0.1

[timing]
dt = 0.01
total_time = 10.0
record_interval = 0.5

[initial_conditions]
seed = 42

[output]
base_filename = "run"
save_stats = true
save_positions = false
format = "messagepack"
"#;

    #[test]
    fn parses_sample_with_defaults() {
        let config = SimulationConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.initial_conditions.max_birth_attempts, DEFAULT_MAX_BIRTH_ATTEMPTS);
        assert_eq!(config.output.format, OutputFormat::MessagePack);
        assert_eq!(config.output.radial_bins, 20);
        assert!(!config.output.save_geometry);
        assert_eq!(config.total_steps(), 1000);
        assert_eq!(config.record_interval_steps(), 50);

        let params = config.get_sim_params().unwrap();
        assert_eq!(params.cell_radius, 10.0);
        assert!((params.births_per_step - 1.0).abs() < 1e-12);
    }

    #[test]
    fn record_interval_shorter_than_dt_records_every_step() {
        let text = SAMPLE.replace("record_interval = 0.5", "record_interval = 0.001");
        let config = SimulationConfig::from_toml_str(&text).unwrap();
        assert_eq!(config.record_interval_steps(), 1);
    }

    #[test]
    fn invalid_physics_is_rejected_at_load() {
        let text = SAMPLE.replace("nucleus_radius = 2.0", "nucleus_radius = -2.0");
        let err = SimulationConfig::from_toml_str(&text).unwrap_err();
        assert!(format!("{err:#}").contains("nucleus_radius"));
    }

    #[test]
    fn unknown_format_fails_to_parse() {
        let text = SAMPLE.replace("\"messagepack\"", "\"yaml\"");
        assert!(SimulationConfig::from_toml_str(&text).is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = SimulationConfig::load("definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("definitely/not/here.toml"));
    }
}
