//! Error types for the waypoint publisher

use thiserror::Error;

/// Input validation failures shared by the generator and the completion monitor
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid pose ({x}, {y}): non-finite or out of range")]
    InvalidPose { x: f64, y: f64 },

    #[error("Invalid target: {0}")]
    InvalidTarget(String),
}

/// Failure reported by a pose source
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Pose source error: {0}")]
pub struct PoseSourceError(pub String);

/// Failure reported by the waypoint transport
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Transport closed")]
    Closed,

    #[error("Publish failed: {0}")]
    Publish(String),
}

/// Per-tick failures; contained by the scheduler and never fatal on their own
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TickError {
    #[error("Pose retrieval timed out after {0} ms")]
    PoseRetrievalTimeout(u64),

    #[error(transparent)]
    PoseRetrieval(#[from] PoseSourceError),

    #[error(transparent)]
    InvalidPose(ValidationError),

    #[error("Waypoint publish timed out after {0} ms")]
    TransportTimeout(u64),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl TickError {
    /// True for failures counted against the pose-retrieval budget
    pub fn is_pose_failure(&self) -> bool {
        matches!(
            self,
            TickError::PoseRetrievalTimeout(_)
                | TickError::PoseRetrieval(_)
                | TickError::InvalidPose(_)
        )
    }
}

/// Configuration loading failures; fatal at startup
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read parameter file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse parameter file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },

    #[error(transparent)]
    InvalidTarget(#[from] ValidationError),
}
