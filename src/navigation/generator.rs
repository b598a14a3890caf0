//! Randomized waypoint generation
//!
//! Each call to [`WaypointGenerator::next`] produces one intermediate goal
//! between the current pose and the final target. The step along the
//! direction to the target has a random length bounded by `max_step`, and a
//! random lateral offset bounded by `jitter_factor * step` is applied
//! orthogonally to that direction. The result is then clamped so that:
//!
//! - it is strictly closer to the target than the current pose,
//! - it is never farther from the target than the previously emitted waypoint,
//! - it stays inside the axis-aligned box spanned by the start pose and the target.

use super::completion::validate_inputs;
use super::target::TargetSpec;
use crate::common::{distance, Point2D, Pose, Waypoint};
use crate::error::{ConfigError, ValidationError};
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Default upper bound on the distance advanced per waypoint
pub const DEFAULT_MAX_STEP: f64 = 1.0;
/// Default lateral jitter, as a fraction of the step length
pub const DEFAULT_JITTER_FACTOR: f64 = 0.3;
/// Lower bound of the random step, as a fraction of the step cap
pub const MIN_STEP_FRACTION: f64 = 0.5;

/// Tuning for the generator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorParams {
    pub max_step: f64,
    pub jitter_factor: f64,
    /// Fixed seed for reproducible runs; drawn from OS entropy when `None`
    pub seed: Option<u64>,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        GeneratorParams {
            max_step: DEFAULT_MAX_STEP,
            jitter_factor: DEFAULT_JITTER_FACTOR,
            seed: None,
        }
    }
}

impl GeneratorParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_step.is_finite() || self.max_step <= 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "maxStep".to_string(),
                reason: format!("must be positive, got {}", self.max_step),
            });
        }
        if !self.jitter_factor.is_finite() || self.jitter_factor < 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "jitterFactor".to_string(),
                reason: format!("must be non-negative, got {}", self.jitter_factor),
            });
        }
        Ok(())
    }
}

/// Mutable generator state; owned exclusively by one [`WaypointGenerator`]
#[derive(Debug, Clone)]
pub struct GeneratorState {
    last_pose: Option<Pose>,
    remaining_distance: f64,
    origin: Option<Point2D>,
    last_waypoint_distance: f64,
    next_sequence_id: u64,
    seed: u64,
    rng: ChaCha8Rng,
}

impl GeneratorState {
    fn new(seed: u64) -> Self {
        GeneratorState {
            last_pose: None,
            remaining_distance: f64::INFINITY,
            origin: None,
            last_waypoint_distance: f64::INFINITY,
            next_sequence_id: 1,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Pose passed to the most recent successful `next` call
    pub fn last_pose(&self) -> Option<Pose> {
        self.last_pose
    }

    /// Distance from the last pose to the target
    pub fn remaining_distance(&self) -> f64 {
        self.remaining_distance
    }

    /// First pose the generator saw; one corner of the bounding box
    pub fn origin(&self) -> Option<Point2D> {
        self.origin
    }

    pub fn next_sequence_id(&self) -> u64 {
        self.next_sequence_id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// Produces the waypoint sequence from the current pose toward a target
///
/// Not meant for concurrent use; the scheduler owns it by value.
#[derive(Debug)]
pub struct WaypointGenerator {
    params: GeneratorParams,
    state: GeneratorState,
}

impl WaypointGenerator {
    /// Create a generator, seeding its random stream
    pub fn new(params: GeneratorParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let seed = params.seed.unwrap_or_else(rand::random);
        if params.seed.is_none() {
            info!("No rngSeed configured, using seed {} for this run", seed);
        }
        Ok(WaypointGenerator {
            params,
            state: GeneratorState::new(seed),
        })
    }

    pub fn params(&self) -> &GeneratorParams {
        &self.params
    }

    pub fn state(&self) -> &GeneratorState {
        &self.state
    }

    pub fn seed(&self) -> u64 {
        self.state.seed
    }

    /// Generate the next waypoint from `current_pose` toward `target`
    ///
    /// Returns the exact target once the pose is within the tolerance radius.
    /// Invalid input leaves the state (random stream and sequence) untouched.
    pub fn next(&mut self, current_pose: &Pose, target: &TargetSpec) -> Result<Waypoint, ValidationError> {
        validate_inputs(current_pose, target)?;

        let pose = current_pose.position();
        let goal = target.position();
        let origin = *self.state.origin.get_or_insert(pose);
        let offset = goal - pose;
        let dist = offset.norm();

        self.state.last_pose = Some(*current_pose);
        self.state.remaining_distance = dist;

        if dist <= target.tolerance_radius {
            return Ok(self.target_waypoint(target));
        }

        let cap = self.params.max_step.min(dist);
        let step = self.state.rng.gen_range(cap * MIN_STEP_FRACTION..=cap);
        if step >= dist {
            return Ok(self.target_waypoint(target));
        }

        let direction = offset / dist;
        let normal = Point2D::new(-direction.y, direction.x);

        // Distance left to the goal after stepping; never behind the previous waypoint.
        let limit = dist.min(self.state.last_waypoint_distance);
        let along = (dist - step).min(limit);

        let lateral_bound = self.params.jitter_factor * step;
        let lateral = if lateral_bound > 0.0 {
            let max_lateral = (limit * limit - along * along).max(0.0).sqrt();
            self.state
                .rng
                .gen_range(-lateral_bound..=lateral_bound)
                .clamp(-max_lateral, max_lateral)
        } else {
            0.0
        };

        let on_line = clamp_to_box(goal - direction * along, origin, goal);
        let jittered = clamp_to_box(goal - direction * along + normal * lateral, origin, goal);
        let jittered_distance = distance(jittered, goal);
        let point = if jittered_distance < dist && jittered_distance <= limit {
            jittered
        } else {
            on_line
        };

        self.state.last_waypoint_distance = distance(point, goal);
        let waypoint = Waypoint {
            x: point.x,
            y: point.y,
            sequence_id: self.allocate_sequence_id(),
        };
        debug!(
            "Waypoint #{} at ({:.3}, {:.3}), {:.3} from target (step {:.3}, lateral {:.3})",
            waypoint.sequence_id, waypoint.x, waypoint.y, self.state.last_waypoint_distance, step, lateral
        );
        Ok(waypoint)
    }

    /// Emit the exact target coordinate with the next sequence id
    pub fn target_waypoint(&mut self, target: &TargetSpec) -> Waypoint {
        self.state.last_waypoint_distance = 0.0;
        target.as_waypoint(self.allocate_sequence_id())
    }

    fn allocate_sequence_id(&mut self) -> u64 {
        let id = self.state.next_sequence_id;
        self.state.next_sequence_id += 1;
        id
    }
}

/// Clamp a point into the axis-aligned box spanned by two corners
fn clamp_to_box(point: Point2D, a: Point2D, b: Point2D) -> Point2D {
    Point2D::new(
        point.x.clamp(a.x.min(b.x), a.x.max(b.x)),
        point.y.clamp(a.y.min(b.y), a.y.max(b.y)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn seeded(seed: u64) -> WaypointGenerator {
        WaypointGenerator::new(GeneratorParams {
            seed: Some(seed),
            ..GeneratorParams::default()
        })
        .unwrap()
    }

    fn target() -> TargetSpec {
        TargetSpec::new(10.0, 10.0, 0.5).unwrap()
    }

    #[test]
    fn returns_exact_target_within_tolerance() {
        let mut generator = seeded(1);
        let wp = generator.next(&Pose::new(9.8, 10.1), &target()).unwrap();
        assert_eq!((wp.x, wp.y), (10.0, 10.0));
        assert_eq!(wp.sequence_id, 1);
    }

    #[test]
    fn short_remaining_distance_caps_the_step() {
        let mut generator = WaypointGenerator::new(GeneratorParams {
            max_step: 5.0,
            jitter_factor: 0.0,
            seed: Some(3),
        })
        .unwrap();
        // 0.6 away: the step is drawn from [0.3, 0.6] and cannot overshoot
        let wp = generator.next(&Pose::new(10.6, 10.0), &target()).unwrap();
        assert_eq!(wp.y, 10.0);
        assert!((10.0..=10.3).contains(&wp.x), "x = {}", wp.x);
    }

    #[test]
    fn step_is_bounded_by_max_step() {
        let pose = Pose::new(0.0, 0.0);
        for seed in 0..50 {
            let wp = seeded(seed).next(&pose, &target()).unwrap();
            let moved = distance(pose.position(), wp.position());
            // step <= 1.0 plus lateral jitter <= 0.3
            assert!(moved <= (1.0f64 + 0.09).sqrt() + 1e-9, "moved {}", moved);
            assert!(moved >= MIN_STEP_FRACTION - 1e-9, "moved {}", moved);
        }
    }

    #[test]
    fn sequence_ids_increase_by_one() {
        let mut generator = seeded(4);
        let mut pose = Pose::new(0.0, 0.0);
        let mut last = 0;
        for _ in 0..20 {
            let wp = generator.next(&pose, &target()).unwrap();
            assert_eq!(wp.sequence_id, last + 1);
            last = wp.sequence_id;
            pose = Pose::new(wp.x, wp.y);
        }
        assert_eq!(generator.target_waypoint(&target()).sequence_id, last + 1);
    }

    #[test]
    fn overflowing_offset_is_rejected_not_emitted() {
        let mut generator = seeded(9);
        let far_target = TargetSpec::new(1e308, 0.0, 0.5).unwrap();
        let err = generator.next(&Pose::new(-1e308, 0.0), &far_target).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPose { .. }));
        assert_eq!(generator.state().next_sequence_id(), 1);
    }

    #[test]
    fn invalid_input_does_not_advance_state() {
        let mut generator = seeded(5);
        let err = generator.next(&Pose::new(f64::NAN, 0.0), &target()).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPose { .. }));

        let bad_target = TargetSpec {
            final_x: 10.0,
            final_y: 10.0,
            tolerance_radius: 0.0,
        };
        let err = generator.next(&Pose::new(0.0, 0.0), &bad_target).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidTarget(_)));

        assert_eq!(generator.state().next_sequence_id(), 1);
        assert!(generator.state().origin().is_none());

        let mut fresh = seeded(5);
        let a = generator.next(&Pose::new(0.0, 0.0), &target()).unwrap();
        let b = fresh.next(&Pose::new(0.0, 0.0), &target()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn axis_aligned_target_has_no_lateral_drift() {
        let mut generator = seeded(11);
        let target = TargetSpec::new(10.0, 0.0, 0.5).unwrap();
        let mut pose = Pose::new(0.0, 0.0);
        for _ in 0..30 {
            let wp = generator.next(&pose, &target).unwrap();
            assert_eq!(wp.y, 0.0);
            assert!((0.0..=10.0).contains(&wp.x));
            pose = Pose::new(wp.x, wp.y);
        }
    }

    #[test]
    fn stationary_robot_never_sees_waypoints_recede() {
        let mut generator = seeded(21);
        let pose = Pose::new(0.0, 0.0);
        let mut previous = f64::INFINITY;
        for _ in 0..25 {
            let wp = generator.next(&pose, &target()).unwrap();
            let d = distance(wp.position(), target().position());
            assert!(d <= previous + 1e-12);
            previous = d;
        }
    }

    #[test]
    fn state_tracks_last_pose_and_remaining_distance() {
        let mut generator = seeded(2);
        generator.next(&Pose::new(4.0, 6.0), &target()).unwrap();
        assert_eq!(generator.state().last_pose(), Some(Pose::new(4.0, 6.0)));
        assert_relative_eq!(generator.state().remaining_distance(), 52.0f64.sqrt());
        assert_eq!(generator.state().origin(), Some(Point2D::new(4.0, 6.0)));
        assert_eq!(generator.seed(), 2);
    }

    #[test]
    fn rejects_invalid_params() {
        let bad_step = GeneratorParams {
            max_step: 0.0,
            ..GeneratorParams::default()
        };
        assert!(WaypointGenerator::new(bad_step).is_err());

        let bad_jitter = GeneratorParams {
            jitter_factor: -0.1,
            ..GeneratorParams::default()
        };
        assert!(WaypointGenerator::new(bad_jitter).is_err());
    }
}
