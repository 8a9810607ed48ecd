use crate::TableError;
use serde::{Deserialize, Serialize};

/// Micrometers per pixel along x and y, supplied by the stack loader.
///
/// Stored coordinates are divided by these to land in image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    dx: f64,
    dy: f64,
}

impl Calibration {
    pub fn new(dx: f64, dy: f64) -> Result<Self, TableError> {
        for (axis, value) in [('x', dx), ('y', dy)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(TableError::InvalidCalibration { axis, value });
            }
        }
        Ok(Self { dx, dy })
    }

    /// One micrometer per pixel on both axes.
    pub fn identity() -> Self {
        Self { dx: 1.0, dy: 1.0 }
    }

    pub fn dx(&self) -> f64 {
        self.dx
    }

    pub fn dy(&self) -> f64 {
        self.dy
    }

    /// Converts a stored coordinate pair to image pixels.
    pub fn to_pixels(&self, x: f64, y: f64) -> (f64, f64) {
        (x / self.dx, y / self.dy)
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::identity()
    }
}
