//! Arrival detection

use super::target::TargetSpec;
use crate::common::{distance, Pose};
use crate::error::ValidationError;

/// Decides when the robot has reached the final target
#[derive(Debug, Default, Clone, Copy)]
pub struct CompletionMonitor;

impl CompletionMonitor {
    pub fn new() -> Self {
        CompletionMonitor
    }

    /// True when the pose lies within the target's tolerance radius
    pub fn is_complete(&self, current_pose: &Pose, target: &TargetSpec) -> Result<bool, ValidationError> {
        Ok(self.distance_to_target(current_pose, target)? <= target.tolerance_radius)
    }

    /// Euclidean distance from the pose to the final coordinate
    pub fn distance_to_target(&self, current_pose: &Pose, target: &TargetSpec) -> Result<f64, ValidationError> {
        validate_inputs(current_pose, target)?;
        Ok(distance(current_pose.position(), target.position()))
    }
}

/// Shared validation for generator and monitor inputs
///
/// Besides finite values, the pose must lie at a finite distance from the
/// target so the direction toward it is defined.
pub(crate) fn validate_inputs(pose: &Pose, target: &TargetSpec) -> Result<(), ValidationError> {
    target.validate()?;
    let invalid = ValidationError::InvalidPose {
        x: pose.x,
        y: pose.y,
    };
    if !pose.is_finite() {
        return Err(invalid);
    }
    if !distance(pose.position(), target.position()).is_finite() {
        return Err(invalid);
    }
    Ok(())
}
