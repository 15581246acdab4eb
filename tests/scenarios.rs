use crowding_engine::{DiffusionSimulation, SimParams};
use rand::prelude::*;
use rayon::prelude::*;

/// Free diffusion from the nucleus with production only: the population is a Poisson
/// process with mean production_rate * dt * steps.
#[test]
fn production_only_scenario_matches_expected_population() {
    let params = SimParams::new(10.0, 2.0, 0.0, 0.0, 100.0, 0.0, 0.1, 0.01).unwrap();
    let mut sim = DiffusionSimulation::new(params, 2024).unwrap();
    assert!(sim.crowders().is_empty());

    sim.simulate(1000).unwrap();

    // mean 1000, standard deviation ~32
    let n = sim.particle_count();
    assert!((850..=1150).contains(&n), "population {n} too far from 1000");
    assert_eq!(sim.total_deaths(), 0);
    assert_eq!(sim.total_births(), n as u64);

    for (x, y) in sim.particle_positions() {
        let r = (x * x + y * y).sqrt();
        assert!(r > 2.0 && r < 10.0, "particle at distance {r}");
    }
}

#[test]
fn degradation_balances_production_at_steady_state() {
    // steady state = production / degradation = 200
    let params = SimParams::new(10.0, 2.0, 0.0, 0.0, 200.0, 1.0, 0.5, 0.01).unwrap();
    let mut sim = DiffusionSimulation::new(params, 31).unwrap();
    sim.simulate(1500).unwrap();
    let mut total = 0usize;
    let samples = 50;
    for _ in 0..samples {
        sim.simulate(20).unwrap();
        total += sim.particle_count();
    }
    let mean = total as f64 / samples as f64;
    assert!(mean > 160.0 && mean < 240.0, "steady-state mean {mean}");
}

#[test]
fn snapshots_follow_the_run() {
    let params = SimParams::new(10.0, 2.0, 0.3, 0.2, 100.0, 0.5, 0.1, 0.01).unwrap();
    let mut sim = DiffusionSimulation::new(params, 4).unwrap();
    sim.record_snapshot(10, false);
    for _ in 0..5 {
        sim.simulate(40).unwrap();
        sim.record_snapshot(10, true);
    }

    let snapshots = sim.get_recorded_snapshots();
    assert_eq!(snapshots.len(), 6);
    assert_eq!(snapshots[0].particle_count, 0);
    assert_eq!(snapshots[0].mean_radial_distance, 0.0);
    assert!(snapshots[0].positions.is_none());
    for pair in snapshots.windows(2) {
        assert_eq!(pair[1].step, pair[0].step + 40);
        assert!(pair[1].total_births >= pair[0].total_births);
    }
    for snap in &snapshots[1..] {
        assert_eq!(snap.radial_histogram.len(), 10);
        let binned: u32 = snap.radial_histogram.iter().sum();
        assert_eq!(binned as usize, snap.particle_count);
        assert_eq!(snap.positions.as_ref().map(Vec::len), Some(snap.particle_count));
    }
    let last = snapshots.last().unwrap();
    assert!((last.time - 2.0).abs() < 1e-9);
    assert_eq!(last.particle_count as u64, last.total_births - last.total_deaths);
}

#[test]
fn independent_runs_share_one_obstacle_field() {
    let params = SimParams::new(10.0, 2.0, 0.4, 0.3, 100.0, 0.5, 0.1, 0.01).unwrap();
    let template = DiffusionSimulation::new(params.clone(), 1).unwrap();
    let field = template.shared_field();

    let results: Vec<(usize, Vec<(f64, f64)>)> = (0..4u64)
        .into_par_iter()
        .map(|seed| {
            let rng = StdRng::seed_from_u64(100 + seed);
            let mut sim = DiffusionSimulation::with_field(params.clone(), field.clone(), rng).unwrap();
            sim.simulate(150).unwrap();
            assert_eq!(sim.crowders(), template.crowders());
            (sim.particle_count(), sim.particle_positions())
        })
        .collect();

    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|(n, _)| *n > 0));
    // different seeds give different trajectories
    assert_ne!(results[0].1, results[1].1);
}
