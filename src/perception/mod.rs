//! Pose input for the publication loop
pub mod odometry;

use crate::common::Pose;
use crate::error::PoseSourceError;
use std::future::Future;

/// Source of the robot's current pose, polled once per tick
///
/// Implementations may block on I/O; the scheduler bounds every call with a
/// timeout.
pub trait PoseSource {
    fn current_pose(&mut self) -> impl Future<Output = Result<Pose, PoseSourceError>>;
}

pub use self::odometry::{SimulatedOdometry, WaypointFollower};
