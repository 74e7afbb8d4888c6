use serde::Serialize;

use crate::pipeline::MetricsTable;

/// Descriptive statistics over the available values of one metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricStats {
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    /// Population standard deviation.
    pub std: Option<f64>,
}

impl MetricStats {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let min = values.iter().copied().fold(f64::MAX, f64::min);
        let max = values.iter().copied().fold(f64::MIN, f64::max);
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        Self {
            count: values.len(),
            min: Some(min),
            max: Some(max),
            mean: Some(mean),
            std: Some(variance.sqrt()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub height: MetricStats,
    pub dbh: MetricStats,
}

impl MetricsSummary {
    pub fn from_table(table: &MetricsTable) -> Self {
        let heights: Vec<f64> = table.values().filter_map(|m| m.height.value()).collect();
        let dbhs: Vec<f64> = table.values().filter_map(|m| m.dbh.value()).collect();

        Self {
            height: MetricStats::from_values(&heights),
            dbh: MetricStats::from_values(&dbhs),
        }
    }

    pub fn log(&self) {
        log::info!("Tree metrics summary:");
        log_stats("Height", &self.height, "height");
        log_stats("DBH", &self.dbh, "DBH");
    }
}

fn log_stats(label: &str, stats: &MetricStats, noun: &str) {
    match (stats.min, stats.max, stats.mean, stats.std) {
        (Some(min), Some(max), Some(mean), Some(std)) => log::info!(
            "{} (m): {} trees, min={:.2}, max={:.2}, mean={:.2}, std={:.2}",
            label,
            stats.count,
            min,
            max,
            mean,
            std
        ),
        _ => log::info!("{} (m): No valid {} measurements", label, noun),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::measurement::{Measurement, TreeMetrics, Unavailable};

    #[test]
    fn stats_of_values() {
        let stats = MetricStats::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(stats.count, 8);
        assert_eq!(stats.min, Some(2.0));
        assert_eq!(stats.max, Some(9.0));
        assert_eq!(stats.mean, Some(5.0));
        assert_relative_eq!(stats.std.unwrap(), 2.0);
    }

    #[test]
    fn summary_skips_unavailable_values() {
        let mut table = MetricsTable::new();
        table.insert(
            1,
            TreeMetrics {
                height: Measurement::Value(10.5),
                dbh: Measurement::Value(0.35),
            },
        );
        table.insert(
            2,
            TreeMetrics {
                height: Measurement::Value(15.5),
                dbh: Unavailable::NoTrunkPoints.into(),
            },
        );

        let summary = MetricsSummary::from_table(&table);

        assert_eq!(summary.height.count, 2);
        assert_eq!(summary.height.mean, Some(13.0));
        assert_eq!(summary.dbh.count, 1);
        assert_eq!(summary.dbh.std, Some(0.0));
    }

    #[test]
    fn empty_table_has_no_statistics() {
        let summary = MetricsSummary::from_table(&MetricsTable::new());
        assert_eq!(summary.height, MetricStats::default());
        assert_eq!(summary.dbh.mean, None);
    }
}
