//! Static geometry of the scene: the cell, the nucleus, and the crowder field with its
//! nearest-neighbor index.

use crate::error::{Result, SimulationError};
use crowding_common::{Circle, Point, SimParams, Vec2};
use log::{debug, info, warn};
use rand::distr::Uniform;
use rand::prelude::*;
use rand_distr::Poisson;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// Position-only entry stored in the R*-tree; `index` addresses `ObstacleField::crowders`.
#[derive(Clone, Debug)]
struct CrowderLocation {
    index: usize,
    position: [f64; 2],
}

impl RTreeObject for CrowderLocation {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for CrowderLocation {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// The immutable obstacle set of one simulation.
///
/// The crowder list and the index over their centers are built together and never
/// exposed for mutation, so index entry `i` always refers to `crowders[i]`.
pub struct ObstacleField {
    cell: Circle,
    nucleus: Circle,
    crowders: Vec<Circle>,
    index: RTree<CrowderLocation>,
}

impl std::fmt::Debug for ObstacleField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObstacleField")
            .field("cell", &self.cell)
            .field("nucleus", &self.nucleus)
            .field("crowders", &self.crowders.len())
            .finish_non_exhaustive()
    }
}

impl ObstacleField {
    /// Generates the crowder field for `params`.
    ///
    /// The crowder count is Poisson with mean `crowder_density * bbox_area(cell)`; centers
    /// are uniform over the cell's bounding box, and a crowder is kept when its center is
    /// inside the cell or its boundary crosses the cell boundary.
    pub fn generate<R: Rng>(params: &SimParams, rng: &mut R) -> Result<Self> {
        let cell = Circle::centered(params.cell_radius);
        let nucleus = Circle::centered(params.nucleus_radius);
        if nucleus.radius() >= cell.radius() {
            warn!(
                "Nucleus radius ({}) is not smaller than cell radius ({}); no particle can stay inside the cell.",
                nucleus.radius(),
                cell.radius()
            );
        }

        let mean_count = params.crowder_density * cell.bounding_box_area();
        let candidate_count = if mean_count > 0.0 {
            let poisson = Poisson::new(mean_count)
                .map_err(|e| SimulationError::Distribution(e.to_string()))?;
            let draw: f64 = poisson.sample(rng);
            draw as u64
        } else {
            0
        };

        let dist_x = Uniform::new(cell.min_x(), cell.max_x())
            .map_err(|e| SimulationError::Distribution(e.to_string()))?;
        let dist_y = Uniform::new(cell.min_y(), cell.max_y())
            .map_err(|e| SimulationError::Distribution(e.to_string()))?;

        let mut crowders = Vec::with_capacity(candidate_count as usize);
        for _ in 0..candidate_count {
            let center = Vec2::new(rng.sample(dist_x), rng.sample(dist_y));
            let crowder = Circle::new(center, params.crowder_radius);
            if cell.contains(center) || cell.intersects(&crowder) {
                crowders.push(crowder);
            }
        }

        info!(
            "Generated {} crowders ({} candidates, mean {:.1}, radius {}).",
            crowders.len(),
            candidate_count,
            mean_count,
            params.crowder_radius
        );

        Ok(Self::from_parts(cell, nucleus, crowders))
    }

    /// Builds a field from an explicit crowder list, kept in the given order.
    pub fn with_crowders(cell_radius: f64, nucleus_radius: f64, crowders: Vec<Circle>) -> Self {
        Self::from_parts(Circle::centered(cell_radius), Circle::centered(nucleus_radius), crowders)
    }

    fn from_parts(cell: Circle, nucleus: Circle, crowders: Vec<Circle>) -> Self {
        let locations: Vec<CrowderLocation> = crowders
            .iter()
            .enumerate()
            .map(|(index, c)| CrowderLocation { index, position: c.center().as_array() })
            .collect();
        let index = RTree::bulk_load(locations);
        debug!("Indexed {} crowder centers.", index.size());
        ObstacleField { cell, nucleus, crowders, index }
    }

    pub fn cell(&self) -> &Circle {
        &self.cell
    }

    pub fn nucleus(&self) -> &Circle {
        &self.nucleus
    }

    /// Crowders in generation order.
    pub fn crowders(&self) -> &[Circle] {
        &self.crowders
    }

    pub fn crowder_count(&self) -> usize {
        self.crowders.len()
    }

    /// The crowder whose center is closest to `point`, with its position in `crowders()`.
    /// `None` only for an empty field.
    pub fn nearest_crowder(&self, point: Point) -> Option<(usize, &Circle)> {
        self.index
            .nearest_neighbor(&point.as_array())
            .map(|loc| (loc.index, &self.crowders[loc.index]))
    }

    /// The nearest crowder if it strictly contains `point`.
    pub fn blocking_crowder(&self, point: Point) -> Option<&Circle> {
        self.nearest_crowder(point)
            .map(|(_, crowder)| crowder)
            .filter(|crowder| crowder.contains(point))
    }
}
