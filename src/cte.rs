//! Cross-track error estimation.

use crate::math::{Point2d, Pose};
use cgmath::prelude::*;

/// Forward offsets closer than this are treated as coincident.
const DEGENERATE_RUN: f64 = 1e-9;

/// Computes the signed lateral offset of the vehicle from the local path.
///
/// The two waypoints nearest the vehicle define the local path line; the
/// result is the perpendicular distance from the vehicle to that line,
/// positive when the line lies to the left. Returns `None` when fewer than
/// two waypoints exist, or when the two nearest share a forward offset and
/// the line's slope is undefined; the consumer keeps its previous value
/// for that cycle.
pub fn cross_track_error(
    points: impl IntoIterator<Item = Point2d>,
    pose: &Pose,
) -> Option<f64> {
    let (a, b) = two_nearest(points, pose)?;
    let run = b.x - a.x;
    if run.abs() < DEGENERATE_RUN {
        return None;
    }
    let slope = (b.y - a.y) / run;
    let intercept = a.y - slope * a.x;
    Some(intercept / slope.hypot(1.0))
}

/// Finds the two points nearest the vehicle, in the vehicle frame.
fn two_nearest(
    points: impl IntoIterator<Item = Point2d>,
    pose: &Pose,
) -> Option<(Point2d, Point2d)> {
    let mut nearest: Option<(f64, Point2d)> = None;
    let mut second: Option<(f64, Point2d)> = None;
    for point in points {
        let local = pose.to_vehicle_frame(point);
        let dist = local.to_vec().magnitude2();
        if nearest.map_or(true, |(best, _)| dist < best) {
            second = nearest;
            nearest = Some((dist, local));
        } else if second.map_or(true, |(best, _)| dist < best) {
            second = Some((dist, local));
        }
    }
    Some((nearest?.1, second?.1))
}
