use super::{Point2d, Vector2d};
use cgmath::prelude::*;

/// The vehicle's position and heading in the world frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    /// The position of the vehicle in m.
    pub position: Point2d,
    /// The heading in radians, measured anticlockwise from the world x-axis.
    pub heading: f64,
}

impl Pose {
    /// Creates a new pose.
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self {
            position: Point2d::new(x, y),
            heading,
        }
    }

    /// A unit vector in world space aligned with the vehicle's heading.
    pub fn direction(&self) -> Vector2d {
        Vector2d::new(self.heading.cos(), self.heading.sin())
    }

    /// Projects a world-frame point into the vehicle frame.
    ///
    /// The x-coordinate of the result is the forward offset, positive ahead
    /// of the vehicle, and the y-coordinate is the lateral offset, positive
    /// to the left of the heading.
    pub fn to_vehicle_frame(&self, point: Point2d) -> Point2d {
        let forward = self.direction();
        project_local(point, self.position, forward, rot90(forward))
    }

    /// Maps a vehicle-frame point back into the world frame.
    /// The inverse of [`to_vehicle_frame`](Self::to_vehicle_frame).
    pub fn to_world_frame(&self, local: Point2d) -> Point2d {
        let forward = self.direction();
        self.position + local.x * forward + local.y * rot90(forward)
    }
}

/// Projects a point onto a local coordinate system.
///
/// # Parameters
/// * `point` - The point to project
/// * `origin` - The origin of the coordinate system
/// * `x_axis` - The basis vector pointing in the positive x-axis.
/// * `y_axis` - The basis vector pointing in the positive y-axis.
pub fn project_local(
    point: Point2d,
    origin: Point2d,
    x_axis: Vector2d,
    y_axis: Vector2d,
) -> Point2d {
    let point = point - origin;
    Point2d::new(point.dot(x_axis), point.dot(y_axis))
}

/// Rotates a vector 90 degrees anticlockwise.
pub fn rot90(vec: Vector2d) -> Vector2d {
    Vector2d::new(-vec.y, vec.x)
}
