use crate::math::Point2d;
use cgmath::MetricSpace;
use itertools::Itertools;

/// A single point on the vehicle's planned path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Waypoint {
    /// The world-frame position of the waypoint in m.
    pub position: Point2d,
    /// The commanded speed at the waypoint in m/s.
    pub speed: f64,
}

impl Waypoint {
    /// Creates a new waypoint.
    pub fn new(x: f64, y: f64, speed: f64) -> Self {
        Self {
            position: Point2d::new(x, y),
            speed,
        }
    }
}

/// The base path: an ordered sequence of waypoints in direction-of-travel
/// order. A waypoint's index is its position in the sequence.
///
/// The base path is immutable once constructed. Per-cycle speed commands
/// are written into the published [profile](crate::VelocityProfile), never
/// back into the base path.
#[derive(Clone, Debug, Default)]
pub struct Path {
    waypoints: Vec<Waypoint>,
}

impl Path {
    /// Creates a path from a waypoint sequence.
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }

    /// The number of waypoints on the path.
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Whether the path has no waypoints.
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Gets the waypoint at the given index.
    pub fn waypoint(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    /// Returns an iterator over the waypoints on the path.
    pub fn iter(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.iter()
    }

    /// Returns an iterator over the waypoint positions.
    pub fn positions(&self) -> impl Iterator<Item = Point2d> + '_ {
        self.waypoints.iter().map(|waypoint| waypoint.position)
    }

    /// Cumulative along-path distance between two waypoint indices, in m.
    ///
    /// The order of the indices does not matter; out-of-range indices are
    /// clamped to the end of the path.
    pub fn distance_between(&self, from: usize, to: usize) -> f64 {
        if self.waypoints.is_empty() {
            return 0.0;
        }
        let last = self.waypoints.len() - 1;
        let (from, to) = (usize::min(from, to).min(last), usize::max(from, to).min(last));
        self.waypoints[from..=to]
            .iter()
            .tuple_windows()
            .map(|(a, b)| a.position.distance(b.position))
            .sum()
    }
}
