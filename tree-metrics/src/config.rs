//! Tunable parameters of the metrics pipeline.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MetricsError;

pub const DEFAULT_DBH_HEIGHT: f64 = 1.3;
pub const DEFAULT_DBH_TOLERANCE: f64 = 0.05;
pub const DEFAULT_DBH_MIN_POINTS: usize = 5;

/// Parameters of the breast-height diameter estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DbhConfig {
    /// Breast height in meters, applied as an absolute z value.
    #[serde(default = "default_dbh_height")]
    pub height: f64,

    /// Half-width of the z band around `height`.
    #[serde(default = "default_dbh_tolerance")]
    pub tolerance: f64,

    /// Minimum number of trunk points in the band.
    #[serde(default = "default_dbh_min_points")]
    pub min_points: usize,
}

fn default_dbh_height() -> f64 {
    DEFAULT_DBH_HEIGHT
}

fn default_dbh_tolerance() -> f64 {
    DEFAULT_DBH_TOLERANCE
}

fn default_dbh_min_points() -> usize {
    DEFAULT_DBH_MIN_POINTS
}

impl Default for DbhConfig {
    fn default() -> Self {
        Self {
            height: default_dbh_height(),
            tolerance: default_dbh_tolerance(),
            min_points: default_dbh_min_points(),
        }
    }
}

/// Configuration handed to [`MetricsPipeline`](crate::pipeline::MetricsPipeline).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub dbh: DbhConfig,

    /// Measure trees on the rayon pool instead of one after another.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_parallel() -> bool {
    true
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            dbh: DbhConfig::default(),
            parallel: default_parallel(),
        }
    }
}

impl MetricsConfig {
    /// Reads a JSON config file. Missing fields take their default values.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, MetricsError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| MetricsError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&content).map_err(|source| MetricsError::ConfigJson {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MetricsError> {
        if !self.dbh.height.is_finite() {
            return Err(MetricsError::InvalidConfig(format!(
                "breast height must be finite, got {}",
                self.dbh.height
            )));
        }
        if !self.dbh.tolerance.is_finite() || self.dbh.tolerance < 0.0 {
            return Err(MetricsError::InvalidConfig(format!(
                "tolerance must be a finite non-negative number, got {}",
                self.dbh.tolerance
            )));
        }
        Ok(())
    }
}
