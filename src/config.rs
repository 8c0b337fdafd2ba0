//! Static planner configuration.

use crate::math::Point2d;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kinematic limits applied to every published profile.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct KinematicLimits {
    /// Maximum acceleration in m/s^2.
    pub max_acceleration: f64,
    /// Comfortable deceleration magnitude in m/s^2, used when braking for
    /// a stop line.
    pub max_deceleration: f64,
    /// Hard deceleration magnitude in m/s^2, the shortest braking the
    /// vehicle can actually deliver.
    pub hard_deceleration: f64,
    /// Maximum jerk in m/s^3.
    pub max_jerk: f64,
    /// Terminal creep speed when settling onto a stop line, in m/s.
    pub creep_speed: f64,
}

impl Default for KinematicLimits {
    fn default() -> Self {
        Self {
            max_acceleration: 9.0,
            max_deceleration: 5.0,
            hard_deceleration: 9.0,
            max_jerk: 9.0,
            creep_speed: 3.0,
        }
    }
}

/// Static configuration, loaded once at startup.
///
/// A configuration that fails [validation](Config::validate) is fatal; the
/// planner refuses to serve rather than degrade.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Cruise speed in km/h.
    pub cruise_speed_kmph: f64,
    /// Number of waypoints in each published profile.
    #[serde(default = "default_lookahead")]
    pub lookahead: usize,
    /// Maximum forward search radius in m.
    #[serde(default = "default_search_radius")]
    pub search_radius: f64,
    /// Consecutive observations required to commit a new light colour.
    #[serde(default = "default_debounce_threshold")]
    pub debounce_threshold: u32,
    /// Time between successive profile entries in s.
    #[serde(default = "default_cycle_time")]
    pub cycle_time: f64,
    /// World positions of the traffic lights, one per intersection.
    pub lights: Vec<[f64; 2]>,
    /// World positions of the stop lines, indexed 1:1 with `lights`.
    pub stop_lines: Vec<[f64; 2]>,
    /// Kinematic limits.
    #[serde(default)]
    pub limits: KinematicLimits,
}

fn default_lookahead() -> usize {
    200
}

fn default_search_radius() -> f64 {
    700.0
}

fn default_debounce_threshold() -> u32 {
    3
}

fn default_cycle_time() -> f64 {
    0.2
}

impl Config {
    /// Loads and validates a configuration from a JSON file.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for values the planner cannot serve with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lights.len() != self.stop_lines.len() {
            return Err(ConfigError::MismatchedStopLines {
                lights: self.lights.len(),
                stop_lines: self.stop_lines.len(),
            });
        }
        if self.lookahead == 0 {
            return Err(ConfigError::NonPositive { field: "lookahead" });
        }
        if self.debounce_threshold == 0 {
            return Err(ConfigError::NonPositive {
                field: "debounce_threshold",
            });
        }
        let positives = [
            ("cruise_speed_kmph", self.cruise_speed_kmph),
            ("search_radius", self.search_radius),
            ("cycle_time", self.cycle_time),
            ("limits.max_acceleration", self.limits.max_acceleration),
            ("limits.max_deceleration", self.limits.max_deceleration),
            ("limits.hard_deceleration", self.limits.hard_deceleration),
            ("limits.max_jerk", self.limits.max_jerk),
            ("limits.creep_speed", self.limits.creep_speed),
        ];
        for (field, value) in positives {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { field });
            }
        }
        Ok(())
    }

    /// Cruise speed in m/s.
    pub fn cruise_speed(&self) -> f64 {
        self.cruise_speed_kmph / 3.6
    }

    /// The configured stop lines as world points.
    pub fn stop_line_points(&self) -> Vec<Point2d> {
        self.stop_lines
            .iter()
            .map(|&[x, y]| Point2d::new(x, y))
            .collect()
    }
}

/// Errors that make the static configuration unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{lights} lights configured against {stop_lines} stop lines")]
    MismatchedStopLines { lights: usize, stop_lines: usize },
    #[error("`{field}` must be positive")]
    NonPositive { field: &'static str },
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn parsed() -> Config {
        serde_json::from_str(
            r#"{
                "cruise_speed_kmph": 40.0,
                "lights": [[205.0, 10.0]],
                "stop_lines": [[195.0, 10.0]]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn defaults_fill_omitted_fields() {
        let config = parsed();
        assert_eq!(config.lookahead, 200);
        assert_eq!(config.debounce_threshold, 3);
        assert_approx_eq!(config.search_radius, 700.0);
        assert_approx_eq!(config.cycle_time, 0.2);
        assert_approx_eq!(config.limits.creep_speed, 3.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn cruise_speed_converts_to_mps() {
        let config = parsed();
        assert_approx_eq!(config.cruise_speed(), 11.111111, 1e-5);
    }

    #[test]
    fn mismatched_light_counts_are_fatal() {
        let mut config = parsed();
        config.stop_lines.push([300.0, 0.0]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MismatchedStopLines {
                lights: 1,
                stop_lines: 2
            })
        ));
    }

    #[test]
    fn non_positive_limits_are_fatal() {
        let mut config = parsed();
        config.limits.max_jerk = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive {
                field: "limits.max_jerk"
            })
        ));

        let mut config = parsed();
        config.lookahead = 0;
        assert!(config.validate().is_err());
    }
}
