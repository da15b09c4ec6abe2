//! Maps phase progress to a shape scale.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::catalog::Motion;

/// Sine ease-in-out. `ease(0) = 0`, `ease(0.5) = 0.5`, `ease(1) = 1`.
pub fn ease(x: f64) -> f64 {
    -((PI * x).cos() - 1.0) / 2.0
}

/// Smallest and largest shape scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ScaleRange {
    fn default() -> Self {
        Self { min: 0.5, max: 1.0 }
    }
}

impl ScaleRange {
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && 0.0 <= self.min && self.min <= self.max
    }

    pub fn scale_for(&self, motion: Motion, progress: f64) -> f64 {
        let span = self.max - self.min;
        match motion {
            Motion::Grow => self.min + span * ease(progress),
            Motion::Shrink => self.max - span * ease(progress),
            Motion::Hold => self.max,
            Motion::Rest => self.min,
        }
    }
}
