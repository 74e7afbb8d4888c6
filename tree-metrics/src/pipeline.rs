use std::collections::BTreeMap;

use pcd_core::pointcloud::{
    grouping::group_points_by_tree,
    point::{ClassifiedPointCloud, TreeId, TreePointSet},
};
use rayon::iter::{IntoParallelRefIterator as _, ParallelIterator as _};

use crate::config::MetricsConfig;
use crate::dbh::DbhEstimator;
use crate::error::MetricsError;
use crate::height::HeightEstimator;
use crate::measurement::{Measurement, TreeMetrics};

/// Metrics of every tree, keyed by tree id in ascending order.
pub type MetricsTable = BTreeMap<TreeId, TreeMetrics>;

/// A single per-tree measurement. Implementations report problems through
/// [`Measurement::Unavailable`] instead of failing.
pub trait TreeMetric: Send + Sync {
    fn name(&self) -> &'static str;
    fn measure(&self, tree: &TreePointSet) -> Measurement;
}

pub struct MetricsPipeline {
    config: MetricsConfig,
    height: Box<dyn TreeMetric>,
    dbh: Box<dyn TreeMetric>,
}

impl MetricsPipeline {
    pub fn new(config: MetricsConfig) -> Self {
        Self::with_metrics(
            config,
            Box::new(HeightEstimator),
            Box::new(DbhEstimator::new(config.dbh)),
        )
    }

    pub fn with_metrics(
        config: MetricsConfig,
        height: Box<dyn TreeMetric>,
        dbh: Box<dyn TreeMetric>,
    ) -> Self {
        Self {
            config,
            height,
            dbh,
        }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Groups the cloud by tree and measures every tree.
    ///
    /// Only a malformed cloud makes this fail; per-tree problems are recorded in the
    /// table as unavailable measurements.
    pub fn process(&self, cloud: &ClassifiedPointCloud) -> Result<MetricsTable, MetricsError> {
        log::info!("Grouping points by tree ID");
        let trees = group_points_by_tree(cloud)?;
        log::info!("Processing {} trees", trees.len());

        let table: MetricsTable = if self.config.parallel {
            trees
                .par_iter()
                .map(|(tree_id, tree)| (*tree_id, self.measure_tree(*tree_id, tree)))
                .collect()
        } else {
            trees
                .iter()
                .map(|(tree_id, tree)| (*tree_id, self.measure_tree(*tree_id, tree)))
                .collect()
        };

        let with_dbh = table.values().filter(|m| m.dbh.is_available()).count();
        log::info!("DBH available for {} of {} trees", with_dbh, table.len());

        Ok(table)
    }

    pub fn measure_tree(&self, tree_id: TreeId, tree: &TreePointSet) -> TreeMetrics {
        log::info!("Processing tree {} ({} points)", tree_id, tree.len());

        let height = self.height.measure(tree);
        log::info!("Tree {} {}: {}", tree_id, self.height.name(), height);

        let dbh = self.dbh.measure(tree);
        log::info!("Tree {} {}: {}", tree_id, self.dbh.name(), dbh);

        TreeMetrics { height, dbh }
    }
}

impl Default for MetricsPipeline {
    fn default() -> Self {
        Self::new(MetricsConfig::default())
    }
}

pub fn process_point_cloud(
    cloud: &ClassifiedPointCloud,
    config: MetricsConfig,
) -> Result<MetricsTable, MetricsError> {
    MetricsPipeline::new(config).process(cloud)
}

#[cfg(test)]
mod tests {
    use pcd_core::pointcloud::point::Classification;
    use pcd_core::PointCloudError;

    use super::*;
    use crate::measurement::Unavailable;

    struct BrokenMetric;

    impl TreeMetric for BrokenMetric {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn measure(&self, _tree: &TreePointSet) -> Measurement {
            Unavailable::Failed("sensor exploded".to_string()).into()
        }
    }

    fn two_trees() -> ClassifiedPointCloud {
        let mut cloud = ClassifiedPointCloud::default();
        for (i, (x, y)) in [(0.1, 0.0), (-0.1, 0.0), (0.0, 0.1), (0.0, -0.1), (0.07, 0.07)]
            .into_iter()
            .enumerate()
        {
            cloud.push([x, y, 1.3], Classification::Trunk, 1);
            cloud.push([10.0 + x, y, 8.0 + i as f64], Classification::Canopy, 2);
        }
        cloud.push([0.0, 0.0, 12.0], Classification::Canopy, 1);
        cloud.push([50.0, 50.0, 0.0], Classification::Ground, 0);
        cloud
    }

    #[test]
    fn height_failure_does_not_block_dbh() {
        let config = MetricsConfig::default();
        let pipeline = MetricsPipeline::with_metrics(
            config,
            Box::new(BrokenMetric),
            Box::new(DbhEstimator::new(config.dbh)),
        );

        let table = pipeline.process(&two_trees()).unwrap();

        assert!(!table[&1].height.is_available());
        assert!(table[&1].dbh.is_available());
    }

    #[test]
    fn dbh_failure_does_not_block_height_or_other_trees() {
        let pipeline = MetricsPipeline::with_metrics(
            MetricsConfig::default(),
            Box::new(HeightEstimator),
            Box::new(BrokenMetric),
        );

        let table = pipeline.process(&two_trees()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table[&1].height, Measurement::Value(12.0 - 1.3));
        assert_eq!(table[&2].height, Measurement::Value(4.0));
        assert!(table.values().all(|m| !m.dbh.is_available()));
    }

    #[test]
    fn missing_trunk_only_affects_that_tree() {
        let table = MetricsPipeline::default().process(&two_trees()).unwrap();

        assert!(table[&1].dbh.is_available());
        assert_eq!(
            table[&2].dbh,
            Measurement::Unavailable(Unavailable::NoTrunkPoints)
        );
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let cloud = two_trees();
        let parallel = MetricsPipeline::default().process(&cloud).unwrap();
        let sequential = MetricsPipeline::new(MetricsConfig {
            parallel: false,
            ..Default::default()
        })
        .process(&cloud)
        .unwrap();

        assert_eq!(parallel, sequential);
    }

    #[test]
    fn malformed_cloud_fails_the_run() {
        let mut cloud = two_trees();
        cloud.classification.truncate(3);

        let err = MetricsPipeline::default().process(&cloud).unwrap_err();
        assert!(matches!(
            err,
            MetricsError::PointCloud(PointCloudError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn cloud_without_trees_yields_empty_table() {
        let cloud = ClassifiedPointCloud::new(
            vec![[0.0, 0.0, 0.0]; 3],
            vec![Classification::Ground; 3],
            vec![0; 3],
        );
        assert!(process_point_cloud(&cloud, MetricsConfig::default())
            .unwrap()
            .is_empty());
    }
}
