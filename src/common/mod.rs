//! Common types shared across the waypoint publisher

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// A 2D point
pub type Point2D = Vector2<f64>;

/// Planar robot pose as reported by odometry
///
/// One snapshot per tick; never mutated after it is produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub heading: Option<f64>,
}

impl Pose {
    /// Create a pose without heading information
    pub fn new(x: f64, y: f64) -> Self {
        Pose {
            x,
            y,
            heading: None,
        }
    }

    /// Create a pose with a heading in radians
    pub fn with_heading(x: f64, y: f64, heading: f64) -> Self {
        Pose {
            x,
            y,
            heading: Some(heading),
        }
    }

    /// True when both coordinates (and the heading, if present) are finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.heading.map_or(true, f64::is_finite)
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// A single intermediate navigation goal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    pub sequence_id: u64,
}

impl Waypoint {
    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// Euclidean distance between two points
pub fn distance(a: Point2D, b: Point2D) -> f64 {
    (b - a).norm()
}

/// Normalize an angle to [-pi, pi]
pub fn normalize_angle(angle: f64) -> f64 {
    let two_pi = 2.0 * std::f64::consts::PI;
    let wrapped = (angle + std::f64::consts::PI).rem_euclid(two_pi) - std::f64::consts::PI;
    if wrapped == -std::f64::consts::PI {
        std::f64::consts::PI
    } else {
        wrapped
    }
}
