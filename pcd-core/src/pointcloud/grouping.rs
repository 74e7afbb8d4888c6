use std::collections::BTreeMap;

use crate::error::PointCloudError;
use crate::pointcloud::point::{ClassifiedPointCloud, TreeId, TreePointSet};

/// Splits the cloud into one [`TreePointSet`] per positive tree id.
///
/// Points with an id <= 0 are dropped. Inside each group the points keep their
/// relative input order. The map is keyed in ascending id order.
pub fn group_points_by_tree(
    cloud: &ClassifiedPointCloud,
) -> Result<BTreeMap<TreeId, TreePointSet>, PointCloudError> {
    cloud.validate()?;

    let mut trees: BTreeMap<TreeId, TreePointSet> = BTreeMap::new();
    for ((xyz, classification), &tree_id) in cloud
        .xyz
        .iter()
        .zip(cloud.classification.iter())
        .zip(cloud.tree_id.iter())
    {
        if tree_id <= 0 {
            continue;
        }
        trees
            .entry(tree_id)
            .or_default()
            .push(*xyz, *classification);
    }

    log::info!("Found {} unique trees in the point cloud", trees.len());
    for (tree_id, tree) in &trees {
        log::debug!("Tree {}: {} points", tree_id, tree.len());
    }

    Ok(trees)
}
