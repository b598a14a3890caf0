//! Randomized waypoint stimulus generator for navigation testing
//!
//! Publishes a stream of randomly perturbed waypoints that converge on a
//! final target coordinate, then emits the exact target and stops.
pub mod common;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod navigation;
pub mod perception;
pub mod scheduler;
pub mod transport;

pub use crate::common::{Pose, Waypoint};
pub use crate::config::NodeConfig;
pub use crate::lifecycle::{ExitStatus, State};
pub use crate::navigation::{CompletionMonitor, TargetSpec, WaypointGenerator};
pub use crate::scheduler::{PublicationScheduler, RunReport, SchedulerConfig, TickOutcome};
