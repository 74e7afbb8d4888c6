pub mod csv;
pub mod error;
pub mod summary;

pub use crate::csv::export_metrics_to_csv;
pub use crate::error::ExportError;
pub use crate::summary::write_summary_json;
