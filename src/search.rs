//! Forward proximity search over world-frame points.
//!
//! All searches are single-pass over the candidate list; horizons are small
//! enough (tens to low hundreds of points) that no spatial index is
//! warranted.

use crate::math::{Point2d, Pose};
use cgmath::prelude::*;
use std::cmp::Ordering;

/// A candidate point that lies ahead of the vehicle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForwardHit {
    /// Index of the point in the candidate list.
    pub index: usize,
    /// Forward offset from the vehicle in m.
    pub ahead: f64,
    /// Lateral offset from the vehicle in m, positive left.
    pub lateral: f64,
    /// Straight-line distance from the vehicle in m.
    pub distance: f64,
}

/// Finds the candidate nearest ahead of the vehicle.
///
/// A candidate qualifies if its forward offset is positive and its
/// straight-line distance is within `max_radius`. The nearest candidate is
/// the one with the smallest forward offset; ties go to the smaller lateral
/// magnitude.
pub fn nearest_ahead(
    points: impl IntoIterator<Item = Point2d>,
    pose: &Pose,
    max_radius: f64,
) -> Option<ForwardHit> {
    hits(points, *pose, max_radius).min_by(closer)
}

/// Collects the candidates ahead of the vehicle, nearest first, up to `cap`
/// entries.
pub fn forward_window(
    points: impl IntoIterator<Item = Point2d>,
    pose: &Pose,
    max_radius: f64,
    cap: usize,
) -> Vec<ForwardHit> {
    let mut window: Vec<_> = hits(points, *pose, max_radius).collect();
    window.sort_by(closer);
    window.truncate(cap);
    window
}

/// Finds the qualifying candidate furthest ahead of the vehicle whose
/// straight-line distance does not exceed `limit`.
///
/// Used to resolve a stop line to the closest waypoint preceding it: the
/// furthest forward waypoint not beyond the line is the one the vehicle
/// should halt at.
pub fn last_ahead_within(
    points: impl IntoIterator<Item = Point2d>,
    pose: &Pose,
    limit: f64,
) -> Option<ForwardHit> {
    hits(points, *pose, limit).max_by(closer)
}

fn hits(
    points: impl IntoIterator<Item = Point2d>,
    pose: Pose,
    max_radius: f64,
) -> impl Iterator<Item = ForwardHit> {
    points
        .into_iter()
        .enumerate()
        .filter_map(move |(index, point)| {
            let local = pose.to_vehicle_frame(point);
            let distance = local.to_vec().magnitude();
            (local.x > 0.0 && distance <= max_radius).then_some(ForwardHit {
                index,
                ahead: local.x,
                lateral: local.y,
                distance,
            })
        })
}

fn closer(a: &ForwardHit, b: &ForwardHit) -> Ordering {
    a.ahead
        .total_cmp(&b.ahead)
        .then(a.lateral.abs().total_cmp(&b.lateral.abs()))
}
