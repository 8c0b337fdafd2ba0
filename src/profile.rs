//! Velocity profile synthesis over the lookahead horizon.

use crate::config::KinematicLimits;
use crate::gate::StopDecision;
use crate::search::ForwardHit;
use smallvec::SmallVec;

/// Speed step of the terminal creep ramp, in m/s per profile entry.
const RAMP_STEP: f64 = 0.5;

/// A single commanded speed at a path waypoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProfilePoint {
    /// Index of the waypoint in the base path.
    pub waypoint: usize,
    /// The commanded speed in m/s.
    pub speed: f64,
}

/// The published trajectory: one target speed per forthcoming waypoint.
///
/// Regenerated from scratch on every pose update, never partially mutated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VelocityProfile {
    points: SmallVec<[ProfilePoint; 32]>,
}

impl VelocityProfile {
    /// The number of entries in the profile.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the profile has no entries.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The profile entries, nearest waypoint first.
    pub fn points(&self) -> &[ProfilePoint] {
        &self.points
    }

    /// The commanded speed at the given waypoint index, if it is covered.
    pub fn speed_at(&self, waypoint: usize) -> Option<f64> {
        self.points
            .iter()
            .find(|point| point.waypoint == waypoint)
            .map(|point| point.speed)
    }
}

/// Rolling record of the measured vehicle speed.
///
/// Keeps the newest sample and the one before it; the pair anchors the
/// jerk bound on the first profile entry.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpeedTrace {
    /// The most recent measured speed in m/s.
    pub current: f64,
    /// The sample before the current one in m/s.
    pub prior: f64,
}

impl SpeedTrace {
    /// Records a new speed sample.
    pub fn push(&mut self, speed: f64) {
        self.prior = self.current;
        self.current = f64::max(speed, 0.0);
    }
}

/// Builds velocity profiles under the configured kinematic limits.
///
/// Each entry is one cycle time apart; successive speeds differ by at most
/// the acceleration limit per cycle, tightened further by the jerk limit
/// on how fast that difference itself may grow.
#[derive(Clone, Debug)]
pub struct ProfileGenerator {
    limits: KinematicLimits,
    /// Cruise speed in m/s.
    cruise: f64,
    /// Cycle time in s.
    dt: f64,
}

impl ProfileGenerator {
    /// Creates a generator.
    pub fn new(limits: KinematicLimits, cruise: f64, dt: f64) -> Self {
        Self { limits, cruise, dt }
    }

    /// Generates the profile for the current window of forward waypoints.
    ///
    /// # Parameters
    /// * `decision` - the latest gate outcome
    /// * `window` - the forward waypoints, nearest first
    /// * `trace` - the measured speed samples
    /// * `stop_ahead` - remaining forward distance to the stop waypoint in m
    /// * `previous` - the profile published last cycle
    pub fn generate(
        &self,
        decision: StopDecision,
        window: &[ForwardHit],
        trace: &SpeedTrace,
        stop_ahead: Option<f64>,
        previous: Option<&VelocityProfile>,
    ) -> VelocityProfile {
        match decision {
            StopDecision::Proceed => self.cruise_profile(window, trace),
            StopDecision::StopAt(_) => {
                let remaining = stop_ahead.unwrap_or(0.0);
                if remaining <= self.limits.creep_speed.powi(2) || trace.current < 0.1 {
                    self.near_stop_profile(window, trace)
                } else {
                    self.far_stop_profile(window, trace)
                }
            }
            StopDecision::HoldPrevious => self.hold_profile(window, previous),
        }
    }

    /// Accelerates towards the cruise speed and holds it.
    fn cruise_profile(&self, window: &[ForwardHit], trace: &SpeedTrace) -> VelocityProfile {
        let dt = self.dt;
        let mut prior = trace.prior;
        let mut speed = trace.current;
        let points = window
            .iter()
            .map(|hit| {
                let by_acceleration = speed + self.limits.max_acceleration * dt;
                let by_jerk = 2.0 * speed - prior + self.limits.max_jerk * dt * dt;
                let next = f64::max(by_acceleration.min(by_jerk).min(self.cruise), 0.0);
                prior = speed;
                speed = next;
                ProfilePoint {
                    waypoint: hit.index,
                    speed: next,
                }
            })
            .collect();
        VelocityProfile { points }
    }

    /// Decelerates towards zero, the mirror image of the cruise branch.
    fn far_stop_profile(&self, window: &[ForwardHit], trace: &SpeedTrace) -> VelocityProfile {
        let dt = self.dt;
        let mut prior = trace.prior;
        let mut speed = trace.current;
        let points = window
            .iter()
            .map(|hit| {
                let by_deceleration = speed - self.limits.max_deceleration * dt;
                let by_jerk = 2.0 * speed - prior - self.limits.max_jerk * dt * dt;
                let next = f64::max(by_deceleration.max(by_jerk), 0.0);
                prior = speed;
                speed = next;
                ProfilePoint {
                    waypoint: hit.index,
                    speed: next,
                }
            })
            .collect();
        VelocityProfile { points }
    }

    /// Ramps down to zero in fixed small steps and holds zero.
    ///
    /// Used when the stop line is nearly reached; the ramp is monotonic
    /// non-increasing with a clean terminal hold.
    fn near_stop_profile(&self, window: &[ForwardHit], trace: &SpeedTrace) -> VelocityProfile {
        let mut speed = trace.current;
        let points = window
            .iter()
            .map(|hit| {
                speed = f64::max(speed - RAMP_STEP, 0.0);
                ProfilePoint {
                    waypoint: hit.index,
                    speed,
                }
            })
            .collect();
        VelocityProfile { points }
    }

    /// Replays the previous profile over the current window.
    ///
    /// Waypoints the previous profile covered keep their speed; waypoints
    /// beyond its end take its final speed. Without a previous profile the
    /// safe default is zero speed everywhere.
    fn hold_profile(
        &self,
        window: &[ForwardHit],
        previous: Option<&VelocityProfile>,
    ) -> VelocityProfile {
        let previous = match previous.filter(|profile| !profile.is_empty()) {
            Some(previous) => previous,
            None => {
                let points = window
                    .iter()
                    .map(|hit| ProfilePoint {
                        waypoint: hit.index,
                        speed: 0.0,
                    })
                    .collect();
                return VelocityProfile { points };
            }
        };
        let tail = previous.points.last().map(|point| point.speed).unwrap_or(0.0);
        let points = window
            .iter()
            .map(|hit| ProfilePoint {
                waypoint: hit.index,
                speed: previous.speed_at(hit.index).unwrap_or(tail),
            })
            .collect();
        VelocityProfile { points }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn window(len: usize) -> Vec<ForwardHit> {
        (0..len)
            .map(|i| ForwardHit {
                index: i + 10,
                ahead: i as f64 + 1.0,
                lateral: 0.0,
                distance: i as f64 + 1.0,
            })
            .collect()
    }

    fn generator() -> ProfileGenerator {
        ProfileGenerator::new(KinematicLimits::default(), 11.0, 0.2)
    }

    fn speeds(profile: &VelocityProfile) -> Vec<f64> {
        profile.points().iter().map(|point| point.speed).collect()
    }

    #[test]
    fn profile_length_matches_window() {
        let generator = generator();
        let trace = SpeedTrace::default();
        for len in [0, 1, 7, 40] {
            let profile = generator.generate(
                StopDecision::Proceed,
                &window(len),
                &trace,
                None,
                None,
            );
            assert_eq!(profile.len(), len);
        }
    }

    #[test]
    fn cruise_from_standstill_reaches_cruise_speed_and_holds() {
        let generator = generator();
        let trace = SpeedTrace::default();
        let profile = generator.generate(StopDecision::Proceed, &window(40), &trace, None, None);
        let speeds = speeds(&profile);

        // Strictly increasing until cruise, then flat.
        let cruise_at = speeds.iter().position(|&v| v == 11.0).unwrap();
        assert!(cruise_at < 12);
        for i in 1..=cruise_at {
            assert!(speeds[i] > speeds[i - 1]);
        }
        for &v in &speeds[cruise_at..] {
            assert_approx_eq!(v, 11.0);
        }
    }

    #[test]
    fn cruise_steps_respect_acceleration_and_jerk_bounds() {
        let generator = generator();
        let trace = SpeedTrace {
            current: 2.0,
            prior: 2.0,
        };
        let profile = generator.generate(StopDecision::Proceed, &window(40), &trace, None, None);
        let speeds = speeds(&profile);

        let max_step = 9.0 * 0.2 + 1e-9;
        assert!(speeds[0] - trace.current <= max_step);
        // The very first step starts from a flat history, so only the jerk
        // increment is available.
        assert_approx_eq!(speeds[0] - trace.current, 9.0 * 0.2 * 0.2);
        for i in 1..speeds.len() {
            assert!(speeds[i] - speeds[i - 1] <= max_step);
        }
    }

    #[test]
    fn far_stop_decreases_to_zero_and_stays_there() {
        let generator = generator();
        let trace = SpeedTrace {
            current: 11.0,
            prior: 11.0,
        };
        let profile = generator.generate(
            StopDecision::StopAt(30),
            &window(40),
            &trace,
            Some(60.0),
            None,
        );
        let speeds = speeds(&profile);

        let max_step = 5.0 * 0.2 + 1e-9;
        let mut last = trace.current;
        for &v in &speeds {
            assert!(v >= 0.0);
            assert!(v <= last);
            assert!(last - v <= max_step);
            last = v;
        }
        assert_approx_eq!(*speeds.last().unwrap(), 0.0);
    }

    #[test]
    fn near_stop_from_standstill_holds_zero() {
        let generator = generator();
        let trace = SpeedTrace::default();
        let profile = generator.generate(
            StopDecision::StopAt(10),
            &window(40),
            &trace,
            Some(1.5),
            None,
        );
        for point in profile.points() {
            assert_approx_eq!(point.speed, 0.0);
        }
    }

    #[test]
    fn near_stop_ramps_down_in_fixed_steps() {
        let generator = generator();
        let trace = SpeedTrace {
            current: 1.2,
            prior: 1.2,
        };
        let profile = generator.generate(
            StopDecision::StopAt(10),
            &window(6),
            &trace,
            Some(2.0),
            None,
        );
        let speeds = speeds(&profile);
        assert_approx_eq!(speeds[0], 0.7);
        assert_approx_eq!(speeds[1], 0.2);
        assert_approx_eq!(speeds[2], 0.0);
        assert_approx_eq!(speeds[5], 0.0);
    }

    #[test]
    fn hold_replays_the_previous_profile_by_waypoint() {
        let generator = generator();
        let trace = SpeedTrace {
            current: 4.0,
            prior: 4.0,
        };
        let previous = generator.generate(StopDecision::Proceed, &window(8), &trace, None, None);

        // The vehicle advanced two waypoints; the shared indices keep their
        // speeds and the new tail extends the final one.
        let advanced: Vec<ForwardHit> = window(8)
            .iter()
            .map(|hit| ForwardHit {
                index: hit.index + 2,
                ..*hit
            })
            .collect();
        let held = generator.generate(
            StopDecision::HoldPrevious,
            &advanced,
            &trace,
            None,
            Some(&previous),
        );

        for point in held.points() {
            match previous.speed_at(point.waypoint) {
                Some(speed) => assert_approx_eq!(point.speed, speed),
                None => {
                    assert_approx_eq!(point.speed, previous.points().last().unwrap().speed)
                }
            }
        }
    }

    #[test]
    fn hold_without_a_previous_profile_commands_zero() {
        let generator = generator();
        let trace = SpeedTrace {
            current: 5.0,
            prior: 5.0,
        };
        let profile = generator.generate(
            StopDecision::HoldPrevious,
            &window(5),
            &trace,
            None,
            None,
        );
        for point in profile.points() {
            assert_approx_eq!(point.speed, 0.0);
        }
    }
}
