use anyhow::{Context, Result};
use std::time::Instant;
use std::fs::File;
use std::io::{BufWriter, Write};
use log::{info, warn, debug, trace};

use crowding_common::{OutputFormat, SimulationConfig};
use crowding_engine::{DiffusionSimulation, SceneGeometry, Snapshot};

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    info!("Starting crowded-cell diffusion engine...");

    // --- Load Configuration ---
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = SimulationConfig::load(&config_path)?;
    info!("Loaded configuration from {}.", config_path);

    // --- Initialize Simulation ---
    let params = config.get_sim_params()?;
    let mut sim = DiffusionSimulation::new(params, config.initial_conditions.seed)
        .context("Failed to initialize simulation")?;
    info!("Obstacle field initialized with {} crowders.", sim.crowders().len());
    debug!("Simulation Parameters: {:#?}", sim.params());

    // --- Simulation Loop ---
    let total_steps = config.total_steps();
    let record_interval_steps = config.record_interval_steps();
    if config.timing.record_interval < config.timing.dt {
        warn!("Record interval ({:.4}) is smaller than the time step ({:.4}). Recording every step.",
            config.timing.record_interval, config.timing.dt);
    }
    info!("Recording snapshot every {} steps ({:.4} time units).",
        record_interval_steps, record_interval_steps as f64 * config.timing.dt);

    let radial_bins = config.output.radial_bins;
    let positions_in_snapshot = config.output.save_positions_in_snapshot;

    info!("Starting simulation loop for {} steps...", total_steps);
    let start_time = Instant::now();
    let mut previous_print_time = start_time;

    // --- Initial Snapshot (time = 0) ---
    sim.record_snapshot(radial_bins, positions_in_snapshot);

    for step in 0..total_steps {
        let step_start_time = Instant::now();
        sim.step().with_context(|| format!("Simulation step {} failed", step + 1))?;
        let step_duration = step_start_time.elapsed();

        // Print status periodically
        let current_time = Instant::now();
        let print_interval_secs = 5.0;
        let should_print_status = current_time.duration_since(previous_print_time).as_secs_f64() >= print_interval_secs;
        let is_record_step = (step + 1) % record_interval_steps == 0;
        let is_last_step = step + 1 == total_steps;

        if should_print_status || is_record_step || is_last_step {
            info!(
                "Step [{}/{}] (t={:.3}) | Particles: {} | Step Time: {:6.3} ms | Elapsed: {:.2} s",
                step + 1,
                total_steps,
                sim.time(),
                sim.particle_count(),
                step_duration.as_secs_f64() * 1000.0,
                start_time.elapsed().as_secs_f64()
            );
            previous_print_time = current_time;

            if is_record_step || is_last_step {
                sim.record_snapshot(radial_bins, positions_in_snapshot);
            }
        } else {
            trace!(
                "Step [{}/{}] completed in {:.3} ms",
                step + 1,
                total_steps,
                step_duration.as_secs_f64() * 1000.0
            );
        }
    }

    let total_duration = start_time.elapsed();
    info!(
        "Simulation finished in {:.3} seconds: {} particles, {} births, {} deaths.",
        total_duration.as_secs_f64(),
        sim.particle_count(),
        sim.total_births(),
        sim.total_deaths()
    );

    // --- Save Recorded Data ---
    let base = &config.output.base_filename;
    if config.output.save_stats {
        save_snapshots(base, config.output.format, sim.get_recorded_snapshots())?;
    } else {
        info!("Skipping saving snapshots as per config (save_stats is false).");
    }

    if config.output.save_positions {
        save_final_positions(base, &sim.particle_positions())?;
    } else {
        info!("Skipping saving final positions as per config.");
    }

    if config.output.save_geometry {
        save_geometry(base, &sim.scene_geometry())?;
    }

    info!("Simulation Complete.");
    Ok(())
}

/// Writes all recorded snapshots in the configured format.
fn save_snapshots(base: &str, format: OutputFormat, snapshots: &[Snapshot]) -> Result<()> {
    let extension = match format {
        OutputFormat::Json => "json",
        OutputFormat::Bincode => "bin",
        OutputFormat::MessagePack => "msgpack",
    };
    let filename = format!("{}_snapshots.{}", base, extension);
    let file = File::create(&filename)
        .with_context(|| format!("Error creating snapshot file '{}'", filename))?;
    let mut writer = BufWriter::new(file);

    match format {
        OutputFormat::Json => serde_json::to_writer(&mut writer, snapshots)
            .context("Error serializing snapshots to JSON")?,
        OutputFormat::Bincode => bincode::serialize_into(&mut writer, snapshots)
            .context("Error serializing snapshots to bincode")?,
        OutputFormat::MessagePack => rmp_serde::encode::write(&mut writer, snapshots)
            .context("Error serializing snapshots to MessagePack")?,
    }
    writer.flush()?;

    info!("{} snapshots saved to {} ({:?} format)", snapshots.len(), filename, format);
    Ok(())
}

/// Writes the final particle positions as CSV.
fn save_final_positions(base: &str, positions: &[(f64, f64)]) -> Result<()> {
    let filename = format!("{}_final_positions.csv", base);
    let mut writer = csv::Writer::from_path(&filename)
        .with_context(|| format!("Error creating CSV file '{}'", filename))?;
    writer.write_record(["x", "y"])?;
    for (x, y) in positions {
        writer.write_record(&[format!("{:.6}", x), format!("{:.6}", y)])?;
    }
    writer.flush()?;
    info!("Final positions saved to {}", filename);
    Ok(())
}

/// Writes the cell, nucleus and crowders as JSON for external rendering.
fn save_geometry(base: &str, geometry: &SceneGeometry) -> Result<()> {
    let filename = format!("{}_geometry.json", base);
    let file = File::create(&filename)
        .with_context(|| format!("Error creating geometry file '{}'", filename))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, geometry)
        .context("Error serializing scene geometry")?;
    writer.flush()?;
    info!("Scene geometry ({} crowders) saved to {}", geometry.crowders.len(), filename);
    Ok(())
}
