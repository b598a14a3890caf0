//! Shared fakes for the integration tests
#![allow(dead_code)]

use random_waypoints::error::{PoseSourceError, TransportError};
use random_waypoints::perception::PoseSource;
use random_waypoints::transport::WaypointTransport;
use random_waypoints::{Pose, Waypoint};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Robot that jumps straight to every waypoint it is sent
#[derive(Clone)]
pub struct TeleportRobot {
    pose: Arc<Mutex<Pose>>,
    pub sent: Arc<Mutex<Vec<Waypoint>>>,
}

impl TeleportRobot {
    pub fn new(start: Pose) -> Self {
        TeleportRobot {
            pose: Arc::new(Mutex::new(start)),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn sent(&self) -> Vec<Waypoint> {
        self.sent.lock().unwrap().clone()
    }
}

impl PoseSource for TeleportRobot {
    async fn current_pose(&mut self) -> Result<Pose, PoseSourceError> {
        Ok(*self.pose.lock().unwrap())
    }
}

impl WaypointTransport for TeleportRobot {
    async fn publish(&mut self, waypoint: &Waypoint) -> Result<(), TransportError> {
        *self.pose.lock().unwrap() = Pose::new(waypoint.x, waypoint.y);
        self.sent.lock().unwrap().push(*waypoint);
        Ok(())
    }
}

/// Pose source that never answers
pub struct StalledPoseSource;

impl PoseSource for StalledPoseSource {
    async fn current_pose(&mut self) -> Result<Pose, PoseSourceError> {
        std::future::pending().await
    }
}

/// Fixed pose; counts how often it was asked
#[derive(Clone)]
pub struct CountingPoseSource {
    pose: Pose,
    pub calls: Arc<AtomicUsize>,
}

impl CountingPoseSource {
    pub fn new(pose: Pose) -> Self {
        CountingPoseSource {
            pose,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PoseSource for CountingPoseSource {
    async fn current_pose(&mut self) -> Result<Pose, PoseSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.pose)
    }
}

/// Pose source that fails on the listed (1-based) calls
pub struct FlakyPoseSource {
    pose: Pose,
    failing_calls: Vec<usize>,
    calls: usize,
}

impl FlakyPoseSource {
    pub fn new(pose: Pose, failing_calls: Vec<usize>) -> Self {
        FlakyPoseSource {
            pose,
            failing_calls,
            calls: 0,
        }
    }
}

impl PoseSource for FlakyPoseSource {
    async fn current_pose(&mut self) -> Result<Pose, PoseSourceError> {
        self.calls += 1;
        if self.failing_calls.contains(&self.calls) {
            Err(PoseSourceError(format!("odometry dropout on call {}", self.calls)))
        } else {
            Ok(self.pose)
        }
    }
}

/// Transport that records everything and rejects the listed (1-based) calls
#[derive(Default)]
pub struct FlakyTransport {
    pub sent: Vec<Waypoint>,
    failing_calls: Vec<usize>,
    fail_always: bool,
    calls: usize,
}

impl FlakyTransport {
    pub fn failing_on(failing_calls: Vec<usize>) -> Self {
        FlakyTransport {
            failing_calls,
            ..FlakyTransport::default()
        }
    }

    pub fn broken() -> Self {
        FlakyTransport {
            fail_always: true,
            ..FlakyTransport::default()
        }
    }
}

impl WaypointTransport for FlakyTransport {
    async fn publish(&mut self, waypoint: &Waypoint) -> Result<(), TransportError> {
        self.calls += 1;
        if self.fail_always || self.failing_calls.contains(&self.calls) {
            return Err(TransportError::Publish("broker unreachable".to_string()));
        }
        self.sent.push(*waypoint);
        Ok(())
    }
}

/// Transport whose publish never completes
pub struct StalledTransport;

impl WaypointTransport for StalledTransport {
    async fn publish(&mut self, _waypoint: &Waypoint) -> Result<(), TransportError> {
        std::future::pending().await
    }
}
