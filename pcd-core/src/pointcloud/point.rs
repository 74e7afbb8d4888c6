use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::PointCloudError;

/// Tree-instance identifier. Values <= 0 mark points that belong to no tree.
pub type TreeId = i64;

/// Semantic class assigned to each point by the upstream segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Classification {
    Ground,
    Trunk,
    Branch,
    Canopy,
    Other(u8),
}

impl From<u8> for Classification {
    fn from(code: u8) -> Self {
        match code {
            0 => Classification::Ground,
            1 => Classification::Trunk,
            2 => Classification::Branch,
            3 => Classification::Canopy,
            other => Classification::Other(other),
        }
    }
}

impl From<Classification> for u8 {
    fn from(classification: Classification) -> Self {
        match classification {
            Classification::Ground => 0,
            Classification::Trunk => 1,
            Classification::Branch => 2,
            Classification::Canopy => 3,
            Classification::Other(code) => code,
        }
    }
}

// This represents the maximum and minimum values of the coordinates in the cloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingVolume {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Default for BoundingVolume {
    fn default() -> Self {
        Self {
            min: [f64::MAX, f64::MAX, f64::MAX],
            max: [f64::MIN, f64::MIN, f64::MIN],
        }
    }
}

impl BoundingVolume {
    pub fn expand(&mut self, point: &[f64; 3]) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(point[axis]);
            self.max[axis] = self.max[axis].max(point[axis]);
        }
    }

    pub fn from_points(points: &[[f64; 3]]) -> Self {
        let mut bounding_volume = Self::default();
        for point in points {
            bounding_volume.expand(point);
        }
        bounding_volume
    }
}

#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub bounding_volume: BoundingVolume,
    /// Name of the source field the tree ids were resolved from.
    pub tree_id_field: Option<String>,
    pub sources: Vec<PathBuf>,
}

/// A segmented point cloud laid out as parallel arrays.
///
/// Index `i` of `xyz`, `classification` and `tree_id` refers to the same point.
/// The arrays are public so readers can fill them directly; [`validate`](Self::validate)
/// checks the alignment.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedPointCloud {
    pub xyz: Vec<[f64; 3]>,
    pub classification: Vec<Classification>,
    pub tree_id: Vec<TreeId>,
    pub metadata: Metadata,
}

impl ClassifiedPointCloud {
    pub fn new(
        xyz: Vec<[f64; 3]>,
        classification: Vec<Classification>,
        tree_id: Vec<TreeId>,
    ) -> Self {
        let metadata = Metadata {
            bounding_volume: BoundingVolume::from_points(&xyz),
            ..Default::default()
        };

        Self {
            xyz,
            classification,
            tree_id,
            metadata,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            xyz: Vec::with_capacity(capacity),
            classification: Vec::with_capacity(capacity),
            tree_id: Vec::with_capacity(capacity),
            metadata: Metadata::default(),
        }
    }

    pub fn push(&mut self, xyz: [f64; 3], classification: Classification, tree_id: TreeId) {
        self.metadata.bounding_volume.expand(&xyz);
        self.xyz.push(xyz);
        self.classification.push(classification);
        self.tree_id.push(tree_id);
    }

    /// Appends all points of `other`, keeping their order.
    pub fn extend(&mut self, other: ClassifiedPointCloud) {
        for point in &other.xyz {
            self.metadata.bounding_volume.expand(point);
        }
        self.xyz.extend(other.xyz);
        self.classification.extend(other.classification);
        self.tree_id.extend(other.tree_id);
        self.metadata.sources.extend(other.metadata.sources);
        if self.metadata.tree_id_field.is_none() {
            self.metadata.tree_id_field = other.metadata.tree_id_field;
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.xyz.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xyz.is_empty()
    }

    pub fn validate(&self) -> Result<(), PointCloudError> {
        let n = self.xyz.len();
        if self.classification.len() != n || self.tree_id.len() != n {
            return Err(PointCloudError::LengthMismatch {
                xyz: n,
                classification: self.classification.len(),
                tree_id: self.tree_id.len(),
            });
        }
        Ok(())
    }

    pub fn unique_classes(&self) -> BTreeSet<Classification> {
        self.classification.iter().copied().collect()
    }

    /// Distinct tree ids strictly greater than zero, ascending.
    pub fn tree_ids(&self) -> BTreeSet<TreeId> {
        self.tree_id.iter().copied().filter(|&id| id > 0).collect()
    }
}

/// The rows of a [`ClassifiedPointCloud`] that share one positive tree id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreePointSet {
    pub xyz: Vec<[f64; 3]>,
    pub classification: Vec<Classification>,
}

impl TreePointSet {
    pub fn new(xyz: Vec<[f64; 3]>, classification: Vec<Classification>) -> Self {
        Self {
            xyz,
            classification,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.xyz.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xyz.is_empty()
    }

    pub fn push(&mut self, xyz: [f64; 3], classification: Classification) {
        self.xyz.push(xyz);
        self.classification.push(classification);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[f64; 3], Classification)> {
        self.xyz.iter().zip(self.classification.iter().copied())
    }

    /// Positions of the points classified as `class`, in input order.
    pub fn points_of_class(&self, class: Classification) -> Vec<[f64; 3]> {
        self.iter()
            .filter(|(_, c)| *c == class)
            .map(|(p, _)| *p)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_codes_round_trip_through_u8() {
        assert_eq!(Classification::from(1), Classification::Trunk);
        assert_eq!(Classification::from(3), Classification::Canopy);
        assert_eq!(Classification::from(7), Classification::Other(7));
        assert_eq!(u8::from(Classification::Ground), 0);
        assert_eq!(u8::from(Classification::Other(12)), 12);
    }

    #[test]
    fn new_computes_bounding_volume() {
        let cloud = ClassifiedPointCloud::new(
            vec![[0.0, 5.0, -1.0], [2.0, -3.0, 4.0]],
            vec![Classification::Trunk, Classification::Canopy],
            vec![1, 1],
        );
        assert_eq!(cloud.metadata.bounding_volume.min, [0.0, -3.0, -1.0]);
        assert_eq!(cloud.metadata.bounding_volume.max, [2.0, 5.0, 4.0]);
        assert_eq!(cloud.len(), 2);
    }

    #[test]
    fn validate_detects_length_mismatch() {
        let cloud = ClassifiedPointCloud::new(
            vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]],
            vec![Classification::Trunk],
            vec![1, 1],
        );
        assert_eq!(
            cloud.validate(),
            Err(PointCloudError::LengthMismatch {
                xyz: 2,
                classification: 1,
                tree_id: 2,
            })
        );
    }

    #[test]
    fn tree_ids_skip_unassigned_and_negative() {
        let cloud = ClassifiedPointCloud::new(
            vec![[0.0; 3]; 5],
            vec![Classification::Trunk; 5],
            vec![3, 0, -2, 1, 3],
        );
        assert_eq!(cloud.tree_ids().into_iter().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn extend_appends_in_order() {
        let mut a = ClassifiedPointCloud::with_capacity(2);
        a.push([0.0, 0.0, 0.0], Classification::Ground, 0);
        let mut b = ClassifiedPointCloud::default();
        b.push([1.0, 1.0, 9.0], Classification::Canopy, 4);
        b.metadata.tree_id_field = Some("treeID".to_string());

        a.extend(b);

        assert_eq!(a.len(), 2);
        assert_eq!(a.tree_id, vec![0, 4]);
        assert_eq!(a.metadata.bounding_volume.max[2], 9.0);
        assert_eq!(a.metadata.tree_id_field.as_deref(), Some("treeID"));
    }

    #[test]
    fn points_of_class_keeps_order() {
        let tree = TreePointSet::new(
            vec![[0.0, 0.0, 1.0], [1.0, 0.0, 2.0], [2.0, 0.0, 3.0]],
            vec![
                Classification::Trunk,
                Classification::Branch,
                Classification::Trunk,
            ],
        );
        assert_eq!(
            tree.points_of_class(Classification::Trunk),
            vec![[0.0, 0.0, 1.0], [2.0, 0.0, 3.0]]
        );
    }
}
