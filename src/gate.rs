//! The traffic-light stop gate.
//!
//! Combines the debounced light colour, the distance to the nearest forward
//! stop line and the current speed into a stop/proceed decision for the
//! profile generator.

use crate::config::KinematicLimits;
use crate::light::LightColor;
use crate::util::Interval;

/// Reaction headway applied before braking begins, in s.
const REACTION_HEADWAY: f64 = 0.2;

/// The outcome of the stop gate for one perception cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopDecision {
    /// No constraint from the lights; drive at cruise speed.
    Proceed,
    /// Come to a halt at the given waypoint index.
    StopAt(usize),
    /// The signal gives no new information; keep the previous plan.
    HoldPrevious,
}

/// A stop line ahead of the vehicle, resolved against the base path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StopLineAhead {
    /// Straight-line distance to the stop line in m.
    pub distance: f64,
    /// Index of the closest waypoint before the stop line.
    pub waypoint: usize,
}

/// Computes the feasible stopping-distance envelope at the given speed.
///
/// The minimum is the distance consumed braking down to the creep speed at
/// the hard deceleration limit, the maximum the distance at the comfortable
/// limit. Both include a reaction headway at the current speed and the
/// terminal creep-out distance.
pub fn stopping_envelope(speed: f64, limits: &KinematicLimits) -> Interval<f64> {
    Interval::new(
        stopping_distance(speed, limits.creep_speed, limits.hard_deceleration),
        stopping_distance(speed, limits.creep_speed, limits.max_deceleration),
    )
}

/// Distance consumed braking from `speed` to `creep` at constant `decel`,
/// then creeping out to a standstill.
fn stopping_distance(speed: f64, creep: f64, decel: f64) -> f64 {
    let braking = f64::max(speed.powi(2) - creep.powi(2), 0.0) / (2.0 * decel);
    REACTION_HEADWAY * speed + braking + 0.5 * creep.powi(2)
}

/// Decides whether to stop for the nearest forward light.
///
/// * A light with no committed colour holds the previous decision.
/// * A green light, or no stop line ahead at all, proceeds.
/// * A red or yellow light stops at the resolved waypoint when the stop
///   line sits inside the feasible stopping envelope. Beyond the envelope
///   the light is unreachable this cycle and is ignored; short of it there
///   is no room left to commit a fresh plan and the previous one is kept,
///   as it is for a vehicle already at creeping speed right before the
///   line.
pub fn decide(
    color: LightColor,
    stop_line: Option<StopLineAhead>,
    speed: f64,
    limits: &KinematicLimits,
) -> StopDecision {
    match color {
        LightColor::Unknown => StopDecision::HoldPrevious,
        LightColor::Green => StopDecision::Proceed,
        LightColor::Red | LightColor::Yellow => {
            let line = match stop_line {
                Some(line) => line,
                None => return StopDecision::Proceed,
            };
            let creep = limits.creep_speed;
            if speed <= 2.0 * creep && line.distance <= creep.powi(2) {
                return StopDecision::HoldPrevious;
            }
            let envelope = stopping_envelope(speed, limits);
            if line.distance > envelope.max {
                StopDecision::Proceed
            } else if line.distance > envelope.min {
                StopDecision::StopAt(line.waypoint)
            } else {
                StopDecision::HoldPrevious
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn limits() -> KinematicLimits {
        KinematicLimits::default()
    }

    fn line(distance: f64) -> Option<StopLineAhead> {
        Some(StopLineAhead {
            distance,
            waypoint: 42,
        })
    }

    #[test]
    fn envelope_min_never_exceeds_max() {
        let limits = limits();
        for i in 0..300 {
            let speed = 0.1 * i as f64;
            let envelope = stopping_envelope(speed, &limits);
            assert!(envelope.min <= envelope.max, "speed {}", speed);
        }
    }

    #[test]
    fn unknown_holds_previous() {
        assert_eq!(
            decide(LightColor::Unknown, line(20.0), 10.0, &limits()),
            StopDecision::HoldPrevious
        );
    }

    #[test]
    fn green_proceeds() {
        assert_eq!(
            decide(LightColor::Green, line(20.0), 10.0, &limits()),
            StopDecision::Proceed
        );
    }

    #[test]
    fn red_without_a_line_ahead_proceeds() {
        assert_eq!(
            decide(LightColor::Red, None, 10.0, &limits()),
            StopDecision::Proceed
        );
    }

    #[test]
    fn red_inside_the_envelope_stops() {
        // At 11 m/s the default envelope spans roughly 12.9..17.9 m.
        assert_eq!(
            decide(LightColor::Red, line(15.0), 11.0, &limits()),
            StopDecision::StopAt(42)
        );
        assert_eq!(
            decide(LightColor::Yellow, line(15.0), 11.0, &limits()),
            StopDecision::StopAt(42)
        );
    }

    #[test]
    fn decisions_are_monotonic_in_distance() {
        // Hold when too close, stop inside the envelope, proceed beyond it.
        let limits = limits();
        let urgency = |decision| match decision {
            StopDecision::HoldPrevious => 2,
            StopDecision::StopAt(_) => 1,
            StopDecision::Proceed => 0,
        };
        let mut previous = urgency(decide(LightColor::Red, line(9.1), 11.0, &limits));
        for i in 92..1000 {
            let decision = decide(LightColor::Red, line(0.1 * i as f64), 11.0, &limits);
            let current = urgency(decision);
            assert!(current <= previous);
            previous = current;
        }
    }

    #[test]
    fn creeping_vehicle_at_the_line_holds() {
        // Essentially stopped just before the stop line.
        assert_eq!(
            decide(LightColor::Red, line(2.0), 1.0, &limits()),
            StopDecision::HoldPrevious
        );
    }
}
