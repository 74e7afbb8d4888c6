pub mod config;
pub mod dbh;
pub mod error;
pub mod height;
pub mod measurement;
pub mod pipeline;
pub mod summary;

pub use config::MetricsConfig;
pub use error::MetricsError;
pub use measurement::{Measurement, TreeMetrics, Unavailable};
pub use pipeline::{process_point_cloud, MetricsPipeline, MetricsTable, TreeMetric};
pub use summary::MetricsSummary;
