//! Publication loop
//!
//! The scheduler owns the generator and both collaborators. Every tick it
//! fetches a pose, generates a waypoint, publishes it and checks for arrival.
//! Pose retrieval and publishing are each bounded by a timeout; failures skip
//! the tick and are counted per kind, and too many consecutive failures of
//! one kind stop the loop with [`ExitStatus::Failed`].

use crate::common::{Pose, Waypoint};
use crate::config::{NodeConfig, NODE_NAME};
use crate::error::{ConfigError, TickError};
use crate::lifecycle::{ExitStatus, Lifecycle, State};
use crate::navigation::{CompletionMonitor, TargetSpec, WaypointGenerator};
use crate::perception::PoseSource;
use crate::transport::WaypointTransport;
use log::{debug, error, info, warn};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

/// Timing and failure limits for the publication loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerConfig {
    pub period: Duration,
    pub pose_timeout: Duration,
    pub publish_timeout: Duration,
    pub max_consecutive_failures: u32,
}

impl SchedulerConfig {
    /// Period and timeouts must be non-zero, and at least one failure allowed
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("period", self.period.is_zero()),
            ("poseTimeout", self.pose_timeout.is_zero()),
            ("publishTimeout", self.publish_timeout.is_zero()),
            ("maxConsecutiveFailures", self.max_consecutive_failures == 0),
        ];
        match checks.iter().find(|(_, bad)| *bad) {
            Some((name, _)) => Err(ConfigError::InvalidValue {
                name: name.to_string(),
                reason: "must be non-zero".to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            period: Duration::from_millis(100),
            pose_timeout: Duration::from_millis(200),
            publish_timeout: Duration::from_millis(200),
            max_consecutive_failures: 3,
        }
    }
}

/// What a single tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// An intermediate waypoint was published
    Published(Waypoint),
    /// The tick failed and was skipped
    Skipped(TickError),
    /// The exact target was published and the scheduler stopped
    Completed(Waypoint),
    /// The scheduler had already stopped; nothing was done
    Idle(ExitStatus),
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub status: ExitStatus,
    pub ticks: u64,
    pub published: u64,
    pub last_error: Option<TickError>,
}

impl RunReport {
    pub fn exit_code(&self) -> i32 {
        self.status.code()
    }
}

/// Drives waypoint generation and publication
pub struct PublicationScheduler<P, T> {
    config: SchedulerConfig,
    target: TargetSpec,
    generator: WaypointGenerator,
    monitor: CompletionMonitor,
    pose_source: P,
    transport: T,
    lifecycle: Lifecycle,
    ticks: u64,
    published: u64,
    pose_failures: u32,
    transport_failures: u32,
    last_error: Option<TickError>,
}

impl<P: PoseSource, T: WaypointTransport> PublicationScheduler<P, T> {
    /// Create a scheduler; fails if the target or the timing limits are malformed
    pub fn new(
        config: SchedulerConfig,
        target: TargetSpec,
        generator: WaypointGenerator,
        pose_source: P,
        transport: T,
    ) -> Result<Self, ConfigError> {
        target.validate()?;
        config.validate()?;
        Ok(PublicationScheduler {
            config,
            target,
            generator,
            monitor: CompletionMonitor::new(),
            pose_source,
            transport,
            lifecycle: Lifecycle::new(NODE_NAME),
            ticks: 0,
            published: 0,
            pose_failures: 0,
            transport_failures: 0,
            last_error: None,
        })
    }

    /// Validate the node configuration and build a scheduler from it
    pub fn from_config(config: &NodeConfig, pose_source: P, transport: T) -> Result<Self, ConfigError> {
        config.validate()?;
        let target = config.target()?;
        let generator = WaypointGenerator::new(config.generator_params())?;
        info!(
            "Target ({:.3}, {:.3}), tolerance {:.3}, {} Hz, max step {:.3}, jitter {:.3}, seed {}",
            target.final_x,
            target.final_y,
            target.tolerance_radius,
            config.publish_rate_hz,
            config.max_step,
            config.jitter_factor,
            generator.seed()
        );
        Self::new(
            config.scheduler_config(),
            target,
            generator,
            pose_source,
            transport,
        )
    }

    pub fn state(&self) -> State {
        self.lifecycle.state()
    }

    pub fn target(&self) -> &TargetSpec {
        &self.target
    }

    pub fn generator(&self) -> &WaypointGenerator {
        &self.generator
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn published(&self) -> u64 {
        self.published
    }

    pub fn last_error(&self) -> Option<&TickError> {
        self.last_error.as_ref()
    }

    /// Stop immediately, skipping the final emission
    pub fn cancel(&mut self) {
        if !self.state().is_terminal() {
            warn!("Stop requested, abandoning waypoint stream");
            self.lifecycle.stop(ExitStatus::Cancelled);
        }
    }

    /// Run a single cycle of the loop
    pub async fn tick(&mut self) -> TickOutcome {
        match self.state() {
            State::Stopped(status) => TickOutcome::Idle(status),
            State::Stopping => {
                self.ticks += 1;
                self.final_emission().await
            }
            State::Running => {
                self.ticks += 1;
                self.running_tick().await
            }
        }
    }

    /// Tick on the configured period until stopped or `stop` turns true
    pub async fn run(&mut self, mut stop: watch::Receiver<bool>) -> RunReport {
        let mut interval = time::interval(self.config.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if let State::Stopped(status) = self.state() {
                return self.report(status);
            }

            let cancelled = tokio::select! {
                biased;
                _ = stop_requested(&mut stop) => true,
                _ = async {
                    interval.tick().await;
                    self.tick().await
                } => false,
            };
            if cancelled {
                self.cancel();
            }
        }
    }

    fn report(&self, status: ExitStatus) -> RunReport {
        RunReport {
            status,
            ticks: self.ticks,
            published: self.published,
            last_error: self.last_error.clone(),
        }
    }

    async fn running_tick(&mut self) -> TickOutcome {
        let pose = match self.fetch_pose().await {
            Ok(pose) => pose,
            Err(e) => return self.record_failure(e),
        };
        let waypoint = match self.generator.next(&pose, &self.target) {
            Ok(waypoint) => waypoint,
            Err(e) => return self.record_failure(TickError::InvalidPose(e)),
        };
        self.pose_failures = 0;

        if let Err(e) = self.emit(&waypoint).await {
            return self.record_failure(e);
        }

        match self.monitor.is_complete(&pose, &self.target) {
            Ok(true) => {
                info!(
                    "Pose ({:.3}, {:.3}) within {:.3} of target",
                    pose.x, pose.y, self.target.tolerance_radius
                );
                self.lifecycle.begin_stopping();
                self.final_emission().await
            }
            Ok(false) => TickOutcome::Published(waypoint),
            Err(e) => self.record_failure(TickError::InvalidPose(e)),
        }
    }

    async fn final_emission(&mut self) -> TickOutcome {
        let waypoint = self.generator.target_waypoint(&self.target);
        match self.emit(&waypoint).await {
            Ok(()) => {
                info!(
                    "Target reached, published final waypoint #{} at ({:.3}, {:.3})",
                    waypoint.sequence_id, waypoint.x, waypoint.y
                );
                self.lifecycle.stop(ExitStatus::Arrived);
                TickOutcome::Completed(waypoint)
            }
            Err(e) => self.record_failure(e),
        }
    }

    async fn fetch_pose(&mut self) -> Result<Pose, TickError> {
        match time::timeout(self.config.pose_timeout, self.pose_source.current_pose()).await {
            Ok(Ok(pose)) => Ok(pose),
            Ok(Err(e)) => Err(TickError::PoseRetrieval(e)),
            Err(_) => Err(TickError::PoseRetrievalTimeout(millis(self.config.pose_timeout))),
        }
    }

    async fn emit(&mut self, waypoint: &Waypoint) -> Result<(), TickError> {
        match time::timeout(self.config.publish_timeout, self.transport.publish(waypoint)).await {
            Ok(Ok(())) => {
                self.transport_failures = 0;
                self.published += 1;
                debug!(
                    "Published waypoint #{} ({:.3}, {:.3})",
                    waypoint.sequence_id, waypoint.x, waypoint.y
                );
                Ok(())
            }
            Ok(Err(e)) => Err(TickError::Transport(e)),
            Err(_) => Err(TickError::TransportTimeout(millis(self.config.publish_timeout))),
        }
    }

    fn record_failure(&mut self, failure: TickError) -> TickOutcome {
        let (count, kind) = if failure.is_pose_failure() {
            self.pose_failures += 1;
            (self.pose_failures, "pose")
        } else {
            self.transport_failures += 1;
            (self.transport_failures, "transport")
        };
        warn!(
            "Tick {} skipped: {} ({} consecutive {} failures)",
            self.ticks, failure, count, kind
        );
        self.last_error = Some(failure.clone());

        if count >= self.config.max_consecutive_failures {
            error!(
                "Giving up after {} consecutive {} failures, last error: {}",
                count, kind, failure
            );
            self.lifecycle.stop(ExitStatus::Failed);
        }
        TickOutcome::Skipped(failure)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Resolves once the stop flag is set; never resolves if the sender is gone
async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    loop {
        if *stop.borrow_and_update() {
            return;
        }
        if stop.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
