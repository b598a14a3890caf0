//! Simulated odometry
//!
//! A point robot that drives at constant speed toward the most recent
//! waypoint it received. Lets the node run without an external pose
//! estimator, and gives tests a closed loop.

use super::PoseSource;
use crate::common::{normalize_angle, Point2D, Pose, Waypoint};
use crate::error::{PoseSourceError, TransportError};
use crate::transport::WaypointTransport;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

/// Default simulated robot speed (world units per second)
pub const DEFAULT_ROBOT_SPEED: f64 = 2.0;

#[derive(Debug)]
struct RobotState {
    pose: Pose,
    goal: Option<Point2D>,
    speed: f64,
    last_update: Instant,
}

impl RobotState {
    /// Integrate motion toward the goal up to `now`
    fn advance(&mut self, now: Instant) {
        let dt = now.saturating_duration_since(self.last_update).as_secs_f64();
        self.last_update = now;

        let Some(goal) = self.goal else {
            return;
        };
        let offset = goal - self.pose.position();
        let dist = offset.norm();
        if dist <= f64::EPSILON {
            return;
        }

        let travel = (self.speed * dt).min(dist);
        let next = self.pose.position() + offset * (travel / dist);
        let heading = normalize_angle(offset.y.atan2(offset.x));
        self.pose = Pose::with_heading(next.x, next.y, heading);
    }
}

/// Pose source backed by a simple kinematic simulation
#[derive(Debug, Clone)]
pub struct SimulatedOdometry {
    state: Arc<Mutex<RobotState>>,
}

impl SimulatedOdometry {
    /// Create a robot resting at `start`
    pub fn new(start: Pose, speed: f64) -> Self {
        SimulatedOdometry {
            state: Arc::new(Mutex::new(RobotState {
                pose: start,
                goal: None,
                speed,
                last_update: Instant::now(),
            })),
        }
    }

    /// Transport endpoint that steers this robot toward published waypoints
    pub fn follower(&self) -> WaypointFollower {
        WaypointFollower {
            state: Arc::clone(&self.state),
        }
    }
}

impl PoseSource for SimulatedOdometry {
    async fn current_pose(&mut self) -> Result<Pose, PoseSourceError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| PoseSourceError("simulated odometry state poisoned".to_string()))?;
        state.advance(Instant::now());
        Ok(state.pose)
    }
}

/// Receives waypoints on behalf of a [`SimulatedOdometry`] robot
#[derive(Debug, Clone)]
pub struct WaypointFollower {
    state: Arc<Mutex<RobotState>>,
}

impl WaypointTransport for WaypointFollower {
    async fn publish(&mut self, waypoint: &Waypoint) -> Result<(), TransportError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| TransportError::Publish("simulated odometry state poisoned".to_string()))?;
        // Bank the motion made toward the old goal before switching.
        state.advance(Instant::now());
        state.goal = Some(waypoint.position());
        Ok(())
    }
}
