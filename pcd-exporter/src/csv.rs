use std::{fs, path::Path};

use csv::WriterBuilder;
use serde::Serialize;

use pcd_core::pointcloud::point::TreeId;
use tree_metrics::MetricsTable;

use crate::error::ExportError;

pub const COLUMNS: [&str; 3] = ["tree_id", "height", "dbh"];

#[derive(Debug, Serialize)]
struct MetricsRow {
    tree_id: TreeId,
    height: Option<f64>,
    dbh: Option<f64>,
}

/// Writes one row per tree, `tree_id,height,dbh`. Unavailable metrics are empty cells.
pub fn export_metrics_to_csv<P: AsRef<Path>>(
    metrics: &MetricsTable,
    output_path: P,
) -> Result<(), ExportError> {
    let output_path = output_path.as_ref();
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(output_path)?;
    writer.write_record(COLUMNS)?;

    for (tree_id, tree_metrics) in metrics {
        writer.serialize(MetricsRow {
            tree_id: *tree_id,
            height: tree_metrics.height.value(),
            dbh: tree_metrics.dbh.value(),
        })?;
    }
    writer.flush()?;

    log::info!(
        "Exported metrics for {} trees to {:?}",
        metrics.len(),
        output_path
    );
    Ok(())
}
