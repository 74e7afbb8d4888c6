use std::{
    fs::{self, File},
    io::{BufWriter, Write as _},
    path::Path,
};

use tree_metrics::MetricsSummary;

use crate::error::ExportError;

pub fn write_summary_json<P: AsRef<Path>>(
    summary: &MetricsSummary,
    output_path: P,
) -> Result<(), ExportError> {
    let output_path = output_path.as_ref();
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(output_path)?);
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    log::info!("Wrote metrics summary to {:?}", output_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use tree_metrics::{Measurement, MetricsTable, TreeMetrics, Unavailable};

    use super::*;

    #[test]
    fn writes_summary_with_null_for_missing_stats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");

        let mut table = MetricsTable::new();
        table.insert(
            3,
            TreeMetrics {
                height: Measurement::Value(12.0),
                dbh: Unavailable::DegenerateDiameter.into(),
            },
        );

        write_summary_json(&MetricsSummary::from_table(&table), &path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["height"]["count"], 1);
        assert_eq!(json["height"]["mean"], 12.0);
        assert_eq!(json["dbh"]["count"], 0);
        assert!(json["dbh"]["mean"].is_null());
    }
}
