//! Waypoint navigation: target, generation and arrival detection
pub mod completion;
pub mod generator;
pub mod target;

pub use self::completion::CompletionMonitor;
pub use self::generator::{GeneratorParams, GeneratorState, WaypointGenerator};
pub use self::target::TargetSpec;
