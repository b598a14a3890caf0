//! Launch-time configuration
//!
//! Parameters come from, in increasing priority: built-in defaults, a YAML
//! parameter file, and `name:=value` overrides passed on the command line by
//! the launch layer. The parameter file may be flat or use the ROS 2 layout
//! (`<node>: ros__parameters: {...}`).

use crate::error::{ConfigError, ValidationError};
use crate::navigation::generator::{GeneratorParams, DEFAULT_JITTER_FACTOR, DEFAULT_MAX_STEP};
use crate::navigation::target::{TargetSpec, DEFAULT_TOLERANCE_RADIUS};
use crate::perception::odometry::DEFAULT_ROBOT_SPEED;
use crate::scheduler::SchedulerConfig;
use log::info;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Node name used for the ROS 2 parameter file layout
pub const NODE_NAME: &str = "random_waypoint_node";

/// Immutable node configuration, built once at startup
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct NodeConfig {
    pub final_x: f64,
    pub final_y: f64,
    pub tolerance_radius: f64,
    pub publish_rate_hz: f64,
    pub max_step: f64,
    pub jitter_factor: f64,
    pub rng_seed: Option<u64>,
    pub pose_timeout_ms: u64,
    pub publish_timeout_ms: u64,
    pub max_consecutive_failures: u32,
    /// Start pose and speed of the simulated robot
    pub start_x: f64,
    pub start_y: f64,
    pub robot_speed: f64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            final_x: 10.0,
            final_y: 10.0,
            tolerance_radius: DEFAULT_TOLERANCE_RADIUS,
            publish_rate_hz: 10.0,
            max_step: DEFAULT_MAX_STEP,
            jitter_factor: DEFAULT_JITTER_FACTOR,
            rng_seed: None,
            pose_timeout_ms: 200,
            publish_timeout_ms: 200,
            max_consecutive_failures: 3,
            start_x: 0.0,
            start_y: 0.0,
            robot_speed: DEFAULT_ROBOT_SPEED,
        }
    }
}

impl NodeConfig {
    /// Load a YAML parameter file on top of the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml(&text)?;
        info!("Loaded parameters from {}", path.display());
        Ok(config)
    }

    /// Parse YAML parameters, flat or in the ROS 2 `ros__parameters` layout
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let value: serde_yaml::Value = serde_yaml::from_str(text)?;
        let params = match value
            .get(NODE_NAME)
            .and_then(|node| node.get("ros__parameters"))
        {
            Some(nested) => nested.clone(),
            None if value.is_null() => return Ok(NodeConfig::default()),
            None => value,
        };
        Ok(serde_yaml::from_value(params)?)
    }

    /// Apply `name:=value` overrides
    pub fn apply_overrides(&mut self, params: &HashMap<String, String>) -> Result<(), ConfigError> {
        for (name, raw) in params {
            match name.as_str() {
                "finalX" => self.final_x = parse_value(name, raw)?,
                "finalY" => self.final_y = parse_value(name, raw)?,
                "toleranceRadius" => self.tolerance_radius = parse_value(name, raw)?,
                "publishRateHz" => self.publish_rate_hz = parse_value(name, raw)?,
                "maxStep" => self.max_step = parse_value(name, raw)?,
                "jitterFactor" => self.jitter_factor = parse_value(name, raw)?,
                "rngSeed" => self.rng_seed = Some(parse_value(name, raw)?),
                "poseTimeoutMs" => self.pose_timeout_ms = parse_value(name, raw)?,
                "publishTimeoutMs" => self.publish_timeout_ms = parse_value(name, raw)?,
                "maxConsecutiveFailures" => self.max_consecutive_failures = parse_value(name, raw)?,
                "startX" => self.start_x = parse_value(name, raw)?,
                "startY" => self.start_y = parse_value(name, raw)?,
                "robotSpeed" => self.robot_speed = parse_value(name, raw)?,
                _ => return Err(ConfigError::UnknownParameter(name.clone())),
            }
        }
        Ok(())
    }

    /// Check every value; a bad target surfaces as [`ValidationError::InvalidTarget`]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.target()?;
        self.generator_params().validate()?;
        positive("publishRateHz", self.publish_rate_hz)?;
        if Duration::try_from_secs_f64(1.0 / self.publish_rate_hz).is_err() {
            return Err(invalid(
                "publishRateHz",
                &format!("period of {} Hz is out of range", self.publish_rate_hz),
            ));
        }
        positive("robotSpeed", self.robot_speed)?;
        if !self.start_x.is_finite() || !self.start_y.is_finite() {
            return Err(invalid("startX/startY", "must be finite"));
        }
        if self.pose_timeout_ms == 0 {
            return Err(invalid("poseTimeoutMs", "must be at least 1"));
        }
        if self.publish_timeout_ms == 0 {
            return Err(invalid("publishTimeoutMs", "must be at least 1"));
        }
        if self.max_consecutive_failures == 0 {
            return Err(invalid("maxConsecutiveFailures", "must be at least 1"));
        }
        Ok(())
    }

    pub fn target(&self) -> Result<TargetSpec, ValidationError> {
        TargetSpec::new(self.final_x, self.final_y, self.tolerance_radius)
    }

    pub fn generator_params(&self) -> GeneratorParams {
        GeneratorParams {
            max_step: self.max_step,
            jitter_factor: self.jitter_factor,
            seed: self.rng_seed,
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            period: Duration::try_from_secs_f64(1.0 / self.publish_rate_hz)
                .unwrap_or(Duration::MAX)
                .max(Duration::from_micros(1)),
            pose_timeout: Duration::from_millis(self.pose_timeout_ms),
            publish_timeout: Duration::from_millis(self.publish_timeout_ms),
            max_consecutive_failures: self.max_consecutive_failures,
        }
    }
}

/// Split launch arguments of the form `name:=value` (a leading `_` is ignored)
///
/// Arguments without `:=` are returned separately.
pub fn parse_launch_args<I, S>(args: I) -> (HashMap<String, String>, Vec<String>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut params = HashMap::new();
    let mut rest = Vec::new();
    for arg in args {
        let arg = arg.as_ref();
        match arg.split_once(":=") {
            Some((name, value)) => {
                let name = name.trim_start_matches('_');
                params.insert(name.to_string(), value.trim().to_string());
            }
            None => rest.push(arg.to_string()),
        }
    }
    (params, rest)
}

fn parse_value<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        name: name.to_string(),
        reason: format!("'{}': {}", raw, e),
    })
}

fn positive(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(name, &format!("must be positive, got {}", value)))
    }
}

fn invalid(name: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
