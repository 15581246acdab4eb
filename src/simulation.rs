use crate::error::{Result, SimulationError};
use crate::obstacles::ObstacleField;
use crate::particle_state::ParticleState;
use crowding_common::{Circle, Point, SceneGeometry, SimParams, Snapshot};
use log::{debug, info, trace, warn};
use rand::distr::Uniform;
use rand::prelude::*;
use rand_distr::{Binomial, Normal, Poisson};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Population change produced by one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepReport {
    pub removed: u64,
    pub added: u64,
}

/// Brownian particles born on the nucleus boundary, diffusing inside the cell among
/// static crowders and degrading at a constant rate.
///
/// Every random draw comes from the simulation's own `StdRng`, so a seed fixes the
/// whole run, obstacle field included.
pub struct DiffusionSimulation {
    params: SimParams,
    /// Read-only after construction; may be shared with other runs.
    field: Arc<ObstacleField>,
    state: ParticleState,
    rng: StdRng,
    current_time_step: u64,
    total_births: u64,
    total_deaths: u64,
    /// Per-axis displacement, N(0, sqrt(2 D dt)).
    step_noise: Normal<f64>,
    /// Births per step; `None` when the production rate is zero.
    births: Option<Poisson<f64>>,
    angle_dist: Uniform<f64>,
    recorded_snapshots: Vec<Snapshot>,
}

impl DiffusionSimulation {
    /// Creates a simulation whose obstacle field and dynamics are driven by `seed`.
    pub fn new(params: SimParams, seed: u64) -> Result<Self> {
        Self::with_rng(params, StdRng::seed_from_u64(seed))
    }

    /// Generates the obstacle field from `rng`, then keeps using it for the dynamics.
    pub fn with_rng(params: SimParams, mut rng: StdRng) -> Result<Self> {
        let field = ObstacleField::generate(&params, &mut rng)?;
        Self::with_field(params, Arc::new(field), rng)
    }

    /// Runs on an existing obstacle field. Collisions use the field's cell and nucleus.
    pub fn with_field(params: SimParams, field: Arc<ObstacleField>, rng: StdRng) -> Result<Self> {
        if field.cell().radius() != params.cell_radius || field.nucleus().radius() != params.nucleus_radius {
            warn!(
                "Obstacle field radii (cell {}, nucleus {}) differ from parameters (cell {}, nucleus {}); the field's geometry is used.",
                field.cell().radius(),
                field.nucleus().radius(),
                params.cell_radius,
                params.nucleus_radius
            );
        }

        let step_noise = Normal::new(0.0, params.step_sigma)
            .map_err(|e| SimulationError::Distribution(e.to_string()))?;
        let births = if params.births_per_step > 0.0 {
            Some(
                Poisson::new(params.births_per_step)
                    .map_err(|e| SimulationError::Distribution(e.to_string()))?,
            )
        } else {
            None
        };
        let angle_dist = Uniform::new(0.0, std::f64::consts::TAU)
            .map_err(|e| SimulationError::Distribution(e.to_string()))?;

        info!(
            "Simulation ready: cell r={}, nucleus r={}, {} crowders, step sigma {:.4}, {:.3} births/step, death p={:.4}.",
            field.cell().radius(),
            field.nucleus().radius(),
            field.crowder_count(),
            params.step_sigma,
            params.births_per_step,
            params.death_probability
        );

        Ok(Self {
            params,
            field,
            state: ParticleState::new(),
            rng,
            current_time_step: 0,
            total_births: 0,
            total_deaths: 0,
            step_noise,
            births,
            angle_dist,
            recorded_snapshots: Vec::new(),
        })
    }

    /// Advances the simulation by `n_steps` steps.
    pub fn simulate(&mut self, n_steps: u64) -> Result<()> {
        for _ in 0..n_steps {
            self.step()?;
        }
        Ok(())
    }

    /// Advances the simulation by one time step: degradation, production, then
    /// diffusion with collision resolution.
    ///
    /// An error leaves the run invalid; the population may be partially updated.
    pub fn step(&mut self) -> Result<StepReport> {
        let before = self.state.len();

        // --- 1. Degradation ---
        let removed = self.degrade()?;

        // --- 2. Production on the nucleus boundary ---
        let added = self.produce()?;

        // --- 3. Diffusion and collision resolution (includes newborns) ---
        self.diffuse();

        self.current_time_step += 1;
        self.total_deaths += removed;
        self.total_births += added;

        debug!(
            "Step {}: {} -> {} particles (-{} +{}).",
            self.current_time_step,
            before,
            self.state.len(),
            removed,
            added
        );
        Ok(StepReport { removed, added })
    }

    /// Removes `Binomial(n, degradation_rate * dt)` particles, each picked uniformly among
    /// the particles still present.
    fn degrade(&mut self) -> Result<u64> {
        let n = self.state.len() as u64;
        if n == 0 || self.params.death_probability == 0.0 {
            return Ok(0);
        }
        let binomial = Binomial::new(n, self.params.death_probability)
            .map_err(|e| SimulationError::Distribution(e.to_string()))?;
        let deaths: u64 = binomial.sample(&mut self.rng);
        for _ in 0..deaths {
            let idx = self.rng.random_range(0..self.state.len());
            self.state.remove_particle(idx);
        }
        Ok(deaths)
    }

    /// Appends `Poisson(production_rate * dt)` particles on the nucleus boundary.
    fn produce(&mut self) -> Result<u64> {
        let Some(births) = self.births.as_ref() else {
            return Ok(0);
        };
        let draw: f64 = births.sample(&mut self.rng);
        let count = draw as u64;
        if count == 0 {
            return Ok(0);
        }

        self.state.ensure_capacity(count as usize);
        for _ in 0..count {
            let position = sample_birth_position(
                &self.field,
                self.angle_dist,
                self.params.max_birth_attempts,
                &mut self.rng,
            )?;
            self.state.add_particle(position);
        }
        Ok(count)
    }

    /// Gaussian displacement of every particle followed by a single reflection.
    fn diffuse(&mut self) {
        let field = &*self.field;
        let noise = self.step_noise;
        for idx in 0..self.state.len() {
            let mut position = self.state.position(idx);
            position.x += self.rng.sample(noise);
            position.y += self.rng.sample(noise);
            self.state.set_position(idx, resolve_collision(field, position));
        }
    }

    /// Current particle coordinates as two parallel vectors (x's, y's).
    /// The vectors are copies and stay valid across later steps.
    pub fn particle_coordinates(&self) -> (Vec<f64>, Vec<f64>) {
        self.state.coordinates()
    }

    /// Current particle positions as (x, y) pairs.
    pub fn particle_positions(&self) -> Vec<(f64, f64)> {
        self.state.positions()
    }

    pub fn particle_count(&self) -> usize {
        self.state.len()
    }

    pub fn cell(&self) -> &Circle {
        self.field.cell()
    }

    pub fn nucleus(&self) -> &Circle {
        self.field.nucleus()
    }

    pub fn crowders(&self) -> &[Circle] {
        self.field.crowders()
    }

    pub fn obstacle_field(&self) -> &ObstacleField {
        &self.field
    }

    /// Handle to the obstacle field for starting further runs on the same geometry.
    pub fn shared_field(&self) -> Arc<ObstacleField> {
        Arc::clone(&self.field)
    }

    /// Owned copy of the static geometry, for rendering.
    pub fn scene_geometry(&self) -> SceneGeometry {
        SceneGeometry {
            cell: *self.field.cell(),
            nucleus: *self.field.nucleus(),
            crowders: self.field.crowders().to_vec(),
        }
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// Number of completed steps.
    pub fn current_time_step(&self) -> u64 {
        self.current_time_step
    }

    /// Simulated time, `steps * dt`.
    pub fn time(&self) -> f64 {
        self.current_time_step as f64 * self.params.dt
    }

    pub fn total_births(&self) -> u64 {
        self.total_births
    }

    pub fn total_deaths(&self) -> u64 {
        self.total_deaths
    }

    /// Summarizes the current state, binning radial distances into `radial_bins` annuli
    /// between the nucleus and the cell boundary.
    pub fn snapshot(&self, radial_bins: usize, include_positions: bool) -> Snapshot {
        let bins = radial_bins.max(1);
        let center = self.field.cell().center();
        let r_min = self.field.nucleus().radius();
        let width = (self.field.cell().radius() - r_min) / bins as f64;
        let (xs, ys) = self.state.coordinate_slices();

        let (radial_histogram, distance_sum) = xs
            .par_iter()
            .zip(ys.par_iter())
            .fold(
                || (vec![0u32; bins], 0.0f64),
                |(mut hist, sum), (&x, &y)| {
                    let r = ((x - center.x).powi(2) + (y - center.y).powi(2)).sqrt();
                    hist[radial_bin(r, r_min, width, bins)] += 1;
                    (hist, sum + r)
                },
            )
            .reduce(
                || (vec![0u32; bins], 0.0f64),
                |(mut a, sum_a), (b, sum_b)| {
                    a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                    (a, sum_a + sum_b)
                },
            );

        let particle_count = self.state.len();
        let mean_radial_distance = if particle_count > 0 {
            distance_sum / particle_count as f64
        } else {
            0.0
        };

        Snapshot {
            time: self.time(),
            step: self.current_time_step,
            particle_count,
            total_births: self.total_births,
            total_deaths: self.total_deaths,
            mean_radial_distance,
            radial_histogram,
            positions: include_positions.then(|| self.state.positions()),
        }
    }

    /// Takes a snapshot and stores it with the recorded series.
    pub fn record_snapshot(&mut self, radial_bins: usize, include_positions: bool) {
        let snapshot = self.snapshot(radial_bins, include_positions);
        info!(
            "Snapshot t={:.3} (step {}): {} particles, mean r={:.3}, births {}, deaths {}.",
            snapshot.time,
            snapshot.step,
            snapshot.particle_count,
            snapshot.mean_radial_distance,
            snapshot.total_births,
            snapshot.total_deaths
        );
        self.recorded_snapshots.push(snapshot);
    }

    /// Provides access to the recorded snapshots.
    pub fn get_recorded_snapshots(&self) -> &[Snapshot] {
        &self.recorded_snapshots
    }
}

/// Applies at most one reflection to a freshly displaced particle, checking in order:
/// outside the cell, inside the nucleus, inside the nearest crowder. The reflected
/// position is not re-checked.
pub fn resolve_collision(field: &ObstacleField, position: Point) -> Point {
    if !field.cell().contains(position) {
        field.cell().reflect(position)
    } else if field.nucleus().contains(position) {
        field.nucleus().reflect(position)
    } else if let Some(crowder) = field.blocking_crowder(position) {
        crowder.reflect(position)
    } else {
        position
    }
}

/// Rejection-samples a birth position uniformly on the nucleus boundary, discarding
/// candidates that lie inside their nearest crowder.
pub fn sample_birth_position<R: Rng>(
    field: &ObstacleField,
    angle_dist: Uniform<f64>,
    max_attempts: u32,
    rng: &mut R,
) -> Result<Point> {
    for attempt in 1..=max_attempts {
        let candidate = field.nucleus().boundary_point_at(rng.sample(angle_dist));
        if field.blocking_crowder(candidate).is_none() {
            if attempt > 1 {
                trace!("Birth placed after {} attempts.", attempt);
            }
            return Ok(candidate);
        }
    }
    warn!(
        "No free position on the nucleus boundary after {} attempts.",
        max_attempts
    );
    Err(SimulationError::BirthPlacementFailed { attempts: max_attempts })
}

// Index of the annulus containing radius `r`, clamped to the valid bins.
fn radial_bin(r: f64, r_min: f64, width: f64, bins: usize) -> usize {
    if width.is_nan() || width <= 0.0 {
        return 0;
    }
    let raw = ((r - r_min) / width).floor();
    if raw <= 0.0 || raw.is_nan() {
        0
    } else {
        (raw as usize).min(bins - 1)
    }
}
