use thiserror::Error;

/// Why a metric could not be determined for a tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Unavailable {
    #[error("no trunk points")]
    NoTrunkPoints,
    #[error("not enough points at breast height: {found} < {required}")]
    InsufficientSlicePoints { found: usize, required: usize },
    #[error("zero diameter at breast height")]
    DegenerateDiameter,
    #[error("empty point set")]
    EmptyPointSet,
    #[error("measurement failed: {0}")]
    Failed(String),
}

/// Outcome of measuring one metric on one tree.
///
/// `Unavailable` is not the same as a value of zero: it means the metric could not be
/// determined from the points at hand.
#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    Value(f64),
    Unavailable(Unavailable),
}

impl Measurement {
    pub fn value(&self) -> Option<f64> {
        match self {
            Measurement::Value(v) => Some(*v),
            Measurement::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Measurement::Value(_))
    }
}

impl From<Unavailable> for Measurement {
    fn from(reason: Unavailable) -> Self {
        Measurement::Unavailable(reason)
    }
}

impl std::fmt::Display for Measurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Measurement::Value(v) => write!(f, "{:.3}m", v),
            Measurement::Unavailable(reason) => write!(f, "unavailable ({})", reason),
        }
    }
}

/// Metrics of a single tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeMetrics {
    pub height: Measurement,
    pub dbh: Measurement,
}
