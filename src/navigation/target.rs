//! Final navigation target

use crate::common::{Point2D, Waypoint};
use crate::error::ValidationError;

/// Default arrival tolerance (world units)
pub const DEFAULT_TOLERANCE_RADIUS: f64 = 0.5;

/// The final coordinate the waypoint stream converges on
///
/// Built once at startup from configuration and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSpec {
    pub final_x: f64,
    pub final_y: f64,
    pub tolerance_radius: f64,
}

impl TargetSpec {
    /// Create a validated target
    pub fn new(final_x: f64, final_y: f64, tolerance_radius: f64) -> Result<Self, ValidationError> {
        let target = TargetSpec {
            final_x,
            final_y,
            tolerance_radius,
        };
        target.validate()?;
        Ok(target)
    }

    /// Create a validated target with the default tolerance
    pub fn with_default_tolerance(final_x: f64, final_y: f64) -> Result<Self, ValidationError> {
        Self::new(final_x, final_y, DEFAULT_TOLERANCE_RADIUS)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.final_x.is_finite() || !self.final_y.is_finite() {
            return Err(ValidationError::InvalidTarget(format!(
                "final coordinate ({}, {}) is not finite",
                self.final_x, self.final_y
            )));
        }
        if !self.tolerance_radius.is_finite() || self.tolerance_radius <= 0.0 {
            return Err(ValidationError::InvalidTarget(format!(
                "tolerance radius must be positive, got {}",
                self.tolerance_radius
            )));
        }
        Ok(())
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.final_x, self.final_y)
    }

    /// The exact target coordinate as a waypoint with the given sequence id
    pub fn as_waypoint(&self, sequence_id: u64) -> Waypoint {
        Waypoint {
            x: self.final_x,
            y: self.final_y,
            sequence_id,
        }
    }
}
