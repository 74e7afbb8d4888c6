use pcd_core::pointcloud::point::TreePointSet;

use crate::error::MetricsError;
use crate::measurement::{Measurement, Unavailable};
use crate::pipeline::TreeMetric;

/// Vertical extent of the tree, `max(z) - min(z)` over all of its points.
///
/// Every class contributes. An empty set or a non-finite z is an error.
pub fn tree_height(tree: &TreePointSet) -> Result<f64, MetricsError> {
    if tree.is_empty() {
        return Err(MetricsError::EmptyPointSet);
    }
    if let Some(p) = tree.xyz.iter().find(|p| !p[2].is_finite()) {
        return Err(MetricsError::NonFiniteCoordinate(*p));
    }

    let (min_z, max_z) = tree
        .xyz
        .iter()
        .fold((f64::MAX, f64::MIN), |(min_z, max_z), p| {
            (min_z.min(p[2]), max_z.max(p[2]))
        });

    let height = max_z - min_z;
    log::debug!("Calculated tree height: {:.3}m", height);
    Ok(height)
}

pub struct HeightEstimator;

impl TreeMetric for HeightEstimator {
    fn name(&self) -> &'static str {
        "height"
    }

    fn measure(&self, tree: &TreePointSet) -> Measurement {
        match tree_height(tree) {
            Ok(height) => Measurement::Value(height),
            Err(MetricsError::EmptyPointSet) => {
                log::error!("Error calculating height: empty point set");
                Unavailable::EmptyPointSet.into()
            }
            Err(e) => {
                log::error!("Error calculating height: {}", e);
                Unavailable::Failed(e.to_string()).into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pcd_core::pointcloud::point::Classification;

    use super::*;

    fn tree(xyz: Vec<[f64; 3]>) -> TreePointSet {
        let classification = vec![Classification::Trunk; xyz.len()];
        TreePointSet::new(xyz, classification)
    }

    #[test]
    fn height_is_z_extent() {
        let t = TreePointSet::new(
            vec![[0.0, 0.0, 0.0], [0.0, 0.0, 5.0], [0.0, 0.0, 10.0]],
            vec![
                Classification::Trunk,
                Classification::Trunk,
                Classification::Canopy,
            ],
        );
        assert_eq!(tree_height(&t).unwrap(), 10.0);
    }

    #[test]
    fn uniform_z_has_zero_height() {
        let t = tree(vec![[0.0, 0.0, 3.2], [1.0, 2.0, 3.2], [-4.0, 0.5, 3.2]]);
        assert_eq!(tree_height(&t).unwrap(), 0.0);
    }

    #[test]
    fn single_point_has_zero_height() {
        assert_eq!(tree_height(&tree(vec![[1.0, 1.0, 7.5]])).unwrap(), 0.0);
    }

    #[test]
    fn height_is_order_independent() {
        let points = vec![
            [0.0, 0.0, 412.25],
            [0.0, 0.0, 398.5],
            [0.0, 0.0, 405.0],
            [0.0, 0.0, 420.75],
        ];
        let expected = tree_height(&tree(points.clone())).unwrap();

        let mut reversed = points.clone();
        reversed.reverse();
        let mut rotated = points;
        rotated.rotate_left(2);

        assert_eq!(tree_height(&tree(reversed)).unwrap(), expected);
        assert_eq!(tree_height(&tree(rotated)).unwrap(), expected);
        assert_eq!(expected, 420.75 - 398.5);
    }

    #[test]
    fn estimator_reports_empty_set_as_unavailable() {
        assert_eq!(
            HeightEstimator.measure(&TreePointSet::default()),
            Measurement::Unavailable(Unavailable::EmptyPointSet)
        );
    }

    #[test]
    fn nan_z_is_an_error() {
        let t = tree(vec![[0.0, 0.0, f64::NAN], [0.0, 0.0, 2.0], [0.0, 0.0, 7.0]]);
        assert!(matches!(
            tree_height(&t),
            Err(MetricsError::NonFiniteCoordinate(p)) if p[2].is_nan()
        ));
        assert!(matches!(
            tree_height(&tree(vec![[0.0, 0.0, f64::NAN]])),
            Err(MetricsError::NonFiniteCoordinate(_))
        ));
    }

    #[test]
    fn infinite_z_is_unavailable() {
        let t = tree(vec![[0.0, 0.0, 1.0], [0.0, 0.0, f64::INFINITY]]);
        assert!(matches!(
            HeightEstimator.measure(&t),
            Measurement::Unavailable(Unavailable::Failed(msg)) if msg.contains("non-finite")
        ));
    }

    #[test]
    fn empty_set_is_an_error() {
        assert!(matches!(
            tree_height(&TreePointSet::default()),
            Err(MetricsError::EmptyPointSet)
        ));
    }
}
