use thiserror::Error;

/// Problems with the tabular input that cannot be skipped row by row.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Invalid edge list entry: {token:?}")]
    InvalidEdgeListEntry { token: String },
    #[error("Invalid {axis} calibration: {value} (must be finite and positive)")]
    InvalidCalibration { axis: char, value: f64 },
    #[error("Cannot determine annotation schema from columns {columns:?}")]
    UnknownSchema { columns: Vec<String> },
}
