//! The per-update recomputation core.

use crate::config::{Config, ConfigError};
use crate::cte;
use crate::gate::{self, StopDecision, StopLineAhead};
use crate::light::{LightDebouncer, LightObservation};
use crate::path::{Path, Waypoint};
use crate::profile::{ProfileGenerator, SpeedTrace, VelocityProfile};
use crate::search;
use crate::Pose;
use log::{debug, info, warn};

/// Drives the velocity-profile and cross-track-error outputs from the
/// latest pose, path, speed and traffic-light inputs.
///
/// Single-threaded and event-driven: each `on_*` call synchronously
/// recomputes whatever depends on the changed input, always against the
/// latest value of every other input. Consumers read the accessors for the
/// most recently published values. Until the base path and a pose have
/// arrived the planner publishes nothing.
pub struct Planner {
    config: Config,
    generator: ProfileGenerator,
    path: Option<Path>,
    pose: Option<Pose>,
    speeds: SpeedTrace,
    /// One debouncer per configured intersection.
    debouncers: Vec<LightDebouncer>,
    /// The latest gate outcome.
    decision: StopDecision,
    /// Waypoint index of the last committed stop, for diagnostics.
    stop_waypoint: Option<usize>,
    profile: Option<VelocityProfile>,
    cross_track_error: Option<f64>,
}

impl Planner {
    /// Creates a planner from a configuration.
    ///
    /// Fails if the configuration does not validate; there is no degraded
    /// mode for a bad configuration.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let generator =
            ProfileGenerator::new(config.limits, config.cruise_speed(), config.cycle_time);
        let debouncers = config
            .stop_lines
            .iter()
            .map(|_| LightDebouncer::new(config.debounce_threshold))
            .collect();
        Ok(Self {
            config,
            generator,
            path: None,
            pose: None,
            speeds: SpeedTrace::default(),
            debouncers,
            decision: StopDecision::HoldPrevious,
            stop_waypoint: None,
            profile: None,
            cross_track_error: None,
        })
    }

    /// Replaces the base path.
    ///
    /// The previous profile and stop resolution referred to the old
    /// indices, so both are dropped with it; the next pose update
    /// publishes against the new path.
    pub fn on_path(&mut self, waypoints: Vec<Waypoint>) {
        info!("received base path with {} waypoints", waypoints.len());
        self.path = Some(Path::new(waypoints));
        self.profile = None;
        self.stop_waypoint = None;
        if matches!(self.decision, StopDecision::StopAt(_)) {
            self.decision = StopDecision::HoldPrevious;
        }
    }

    /// Records a new measured speed sample.
    pub fn on_speed(&mut self, speed: f64) {
        self.speeds.push(speed);
    }

    /// Records a speed sample from a 3-axis linear velocity.
    pub fn on_velocity(&mut self, linear: [f64; 3]) {
        let [x, y, z] = linear;
        self.on_speed((x * x + y * y + z * z).sqrt());
    }

    /// Consumes one cycle of raw light observations and refreshes the
    /// stop decision.
    pub fn on_lights(&mut self, observations: &[LightObservation]) {
        if observations.len() != self.debouncers.len() {
            warn!(
                "ignoring light signal with {} entries, {} configured",
                observations.len(),
                self.debouncers.len()
            );
            return;
        }

        // Every stream advances its debouncer, not just the nearest light's.
        for (debouncer, observation) in self.debouncers.iter_mut().zip(observations) {
            debouncer.observe(observation.color);
        }

        let (pose, path) = match (self.pose, self.path.as_ref()) {
            (Some(pose), Some(path)) => (pose, path),
            _ => {
                debug!("light signal before pose and path; holding previous decision");
                self.decision = StopDecision::HoldPrevious;
                return;
            }
        };

        let nearest = search::nearest_ahead(
            observations.iter().map(|observation| observation.stop_line),
            &pose,
            self.config.search_radius,
        );
        let decision = match nearest {
            // Nothing ahead within range; no light can gate us this cycle.
            None => StopDecision::Proceed,
            Some(hit) => {
                let color = self.debouncers[hit.index].committed();
                let stop_line = search::last_ahead_within(path.positions(), &pose, hit.distance)
                    .map(|waypoint| StopLineAhead {
                        distance: hit.distance,
                        waypoint: waypoint.index,
                    });
                gate::decide(color, stop_line, self.speeds.current, &self.config.limits)
            }
        };

        match decision {
            StopDecision::StopAt(waypoint) => self.stop_waypoint = Some(waypoint),
            StopDecision::Proceed => self.stop_waypoint = None,
            StopDecision::HoldPrevious => {}
        }
        self.decision = decision;
        debug!("gate decision {:?}", decision);
    }

    /// Consumes a pose update and republishes the profile and cross-track
    /// error against it.
    pub fn on_pose(&mut self, pose: Pose) {
        self.pose = Some(pose);
        let path = match self.path.as_ref() {
            Some(path) => path,
            None => {
                debug!("pose update before base path; nothing to publish");
                return;
            }
        };

        // The previous error survives a degenerate cycle.
        match cte::cross_track_error(path.positions(), &pose) {
            Some(error) => self.cross_track_error = Some(error),
            None => debug!("degenerate cross-track geometry; keeping previous value"),
        }

        let window = search::forward_window(
            path.positions(),
            &pose,
            self.config.search_radius,
            self.config.lookahead,
        );

        // Remaining forward distance to the committed stop waypoint. A stop
        // line just passed clamps to zero and settles through the terminal
        // ramp instead of replanning a stale deceleration.
        let stop_ahead = match self.decision {
            StopDecision::StopAt(waypoint) => path
                .waypoint(waypoint)
                .map(|waypoint| f64::max(pose.to_vehicle_frame(waypoint.position).x, 0.0)),
            _ => None,
        };

        let profile = self.generator.generate(
            self.decision,
            &window,
            &self.speeds,
            stop_ahead,
            self.profile.as_ref(),
        );
        self.profile = Some(profile);
    }

    /// The most recently published velocity profile.
    pub fn profile(&self) -> Option<&VelocityProfile> {
        self.profile.as_ref()
    }

    /// The most recent well-defined cross-track error in m, positive left.
    pub fn cross_track_error(&self) -> Option<f64> {
        self.cross_track_error
    }

    /// The committed stop waypoint, if any, for diagnostics.
    pub fn stop_waypoint(&self) -> Option<usize> {
        self.stop_waypoint
    }

    /// The latest gate decision.
    pub fn decision(&self) -> StopDecision {
        self.decision
    }
}
