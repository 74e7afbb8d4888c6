use std::path::PathBuf;

use pcd_core::PointCloudError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("cannot measure an empty point set")]
    EmptyPointSet,
    #[error("tree point set is malformed: {xyz} positions but {classification} classifications")]
    MismatchedTreeArrays { xyz: usize, classification: usize },
    #[error("non-finite coordinate: {0:?}")]
    NonFiniteCoordinate([f64; 3]),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to read config {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    ConfigJson {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    PointCloud(#[from] PointCloudError),
}
