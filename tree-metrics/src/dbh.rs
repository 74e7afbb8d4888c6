//! Diameter at breast height.
//!
//! The trunk points of a tree are sliced at breast height and the diameter is taken as
//! the largest horizontal distance between two points of the slice. No shape is fitted,
//! so a single stray point widens the result.

use itertools::Itertools as _;
use pcd_core::pointcloud::{
    point::{Classification, TreePointSet},
    slice::points_at_height,
};

use crate::config::DbhConfig;
use crate::error::MetricsError;
use crate::measurement::{Measurement, Unavailable};
use crate::pipeline::TreeMetric;

/// Measures the DBH of a tree. Never fails: every problem ends up as
/// [`Measurement::Unavailable`].
pub fn tree_dbh(tree: &TreePointSet, config: &DbhConfig) -> Measurement {
    match compute_dbh(tree, config) {
        Ok(measurement) => measurement,
        Err(e) => {
            log::error!("Error calculating DBH: {}", e);
            Unavailable::Failed(e.to_string()).into()
        }
    }
}

fn compute_dbh(tree: &TreePointSet, config: &DbhConfig) -> Result<Measurement, MetricsError> {
    if tree.xyz.len() != tree.classification.len() {
        return Err(MetricsError::MismatchedTreeArrays {
            xyz: tree.xyz.len(),
            classification: tree.classification.len(),
        });
    }

    let trunk_points = tree.points_of_class(Classification::Trunk);
    if trunk_points.is_empty() {
        log::warn!("No trunk points found for DBH calculation");
        return Ok(Unavailable::NoTrunkPoints.into());
    }

    let dbh_slice = points_at_height(&trunk_points, config.height, config.tolerance);
    if dbh_slice.len() < config.min_points {
        log::warn!(
            "Not enough points at breast height: {} < {}",
            dbh_slice.len(),
            config.min_points
        );
        return Ok(Unavailable::InsufficientSlicePoints {
            found: dbh_slice.len(),
            required: config.min_points,
        }
        .into());
    }

    if let Some(p) = dbh_slice
        .iter()
        .find(|p| !p[0].is_finite() || !p[1].is_finite())
    {
        return Err(MetricsError::NonFiniteCoordinate(*p));
    }

    let diameter = max_planar_distance(&dbh_slice);
    if diameter > 0.0 {
        log::debug!("Calculated DBH: {:.3}m", diameter);
        Ok(Measurement::Value(diameter))
    } else {
        log::warn!("Could not determine DBH - no valid distances found");
        Ok(Unavailable::DegenerateDiameter.into())
    }
}

#[inline]
fn planar_distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    (dx * dx + dy * dy).sqrt()
}

/// Largest distance in the xy plane over all unordered pairs of `points`.
///
/// Exhaustive O(k²) scan; meant for breast-height slices of a few dozen points.
/// Returns 0 for fewer than two points.
pub fn max_planar_distance(points: &[[f64; 3]]) -> f64 {
    points
        .iter()
        .tuple_combinations()
        .map(|(a, b)| planar_distance(a, b))
        .fold(0.0, f64::max)
}

pub struct DbhEstimator {
    pub config: DbhConfig,
}

impl DbhEstimator {
    pub fn new(config: DbhConfig) -> Self {
        Self { config }
    }
}

impl TreeMetric for DbhEstimator {
    fn name(&self) -> &'static str {
        "DBH"
    }

    fn measure(&self, tree: &TreePointSet) -> Measurement {
        tree_dbh(tree, &self.config)
    }
}
