use crowding_common::{Point, Vec2};

/// The particle population, stored as parallel coordinate vectors.
///
/// Particles have no identity beyond their slot; removal swaps the last particle into
/// the freed slot, so indices are not stable across steps.
#[derive(Debug, Clone, Default)]
pub struct ParticleState {
    positions_x: Vec<f64>,
    positions_y: Vec<f64>,
}

impl ParticleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.positions_x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions_x.is_empty()
    }

    /// Reserves room for `additional` particles, logging when the buffers grow.
    pub fn ensure_capacity(&mut self, additional: usize) {
        let required = self.len() + additional;
        let capacity = self.positions_x.capacity();
        if required > capacity {
            log::debug!("Growing particle buffers from {} to at least {} slots.", capacity, required);
            self.positions_x.reserve(additional);
            self.positions_y.reserve(additional);
        }
    }

    /// Appends a particle at `position`.
    pub fn add_particle(&mut self, position: Point) {
        self.positions_x.push(position.x);
        self.positions_y.push(position.y);
    }

    /// Removes the particle in slot `idx`, filling the slot with the last particle.
    pub fn remove_particle(&mut self, idx: usize) -> Point {
        let x = self.positions_x.swap_remove(idx);
        let y = self.positions_y.swap_remove(idx);
        Vec2::new(x, y)
    }

    pub fn position(&self, idx: usize) -> Point {
        Vec2::new(self.positions_x[idx], self.positions_y[idx])
    }

    pub fn set_position(&mut self, idx: usize, position: Point) {
        self.positions_x[idx] = position.x;
        self.positions_y[idx] = position.y;
    }

    pub fn iter(&self) -> impl Iterator<Item = Point> + '_ {
        self.positions_x
            .iter()
            .zip(self.positions_y.iter())
            .map(|(&x, &y)| Vec2::new(x, y))
    }

    /// Borrowed coordinate slices, x's and y's in slot order.
    pub fn coordinate_slices(&self) -> (&[f64], &[f64]) {
        (&self.positions_x, &self.positions_y)
    }

    /// Owned copy of the coordinates as two parallel vectors.
    pub fn coordinates(&self) -> (Vec<f64>, Vec<f64>) {
        (self.positions_x.clone(), self.positions_y.clone())
    }

    /// Owned copy of the coordinates as (x, y) pairs.
    pub fn positions(&self) -> Vec<(f64, f64)> {
        self.iter().map(|p| (p.x, p.y)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_remove_keep_vectors_in_step() {
        let mut state = ParticleState::new();
        state.ensure_capacity(3);
        for i in 0..3 {
            state.add_particle(Vec2::new(i as f64, -(i as f64)));
        }
        assert_eq!(state.len(), 3);

        let removed = state.remove_particle(0);
        assert_eq!(removed, Vec2::new(0.0, 0.0));
        assert_eq!(state.len(), 2);
        // last particle moved into the freed slot
        assert_eq!(state.position(0), Vec2::new(2.0, -2.0));

        let (xs, ys) = state.coordinates();
        assert_eq!(xs, vec![2.0, 1.0]);
        assert_eq!(ys, vec![-2.0, -1.0]);
        assert_eq!(state.positions(), vec![(2.0, -2.0), (1.0, -1.0)]);
    }

    #[test]
    fn coordinates_are_detached_copies() {
        let mut state = ParticleState::new();
        state.add_particle(Vec2::new(1.0, 1.0));
        let (xs, _) = state.coordinates();
        state.set_position(0, Vec2::new(5.0, 5.0));
        assert_eq!(xs, vec![1.0]);
        assert_eq!(state.position(0), Vec2::new(5.0, 5.0));
    }
}
