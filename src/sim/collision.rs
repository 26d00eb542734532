//! Collision detection and response
//!
//! Three pairings, all discrete (post-penetration) corrections:
//! - circle vs circle: positional separation and/or velocity reflection
//! - circle vs box: closest-point push-out with a small extra clearance
//! - box vs box: exact edge-touch test, pushed one unit past the edge
//!
//! None of these are swept. They hold up while per-tick displacement stays
//! well below body size; faster bodies can tunnel through thin geometry.

use glam::Vec2;

use super::body::{Body, Shape};
use super::rect::Rect;
use crate::consts::COINCIDENT_EPSILON;

/// Two equal-radius circles touch or overlap
#[inline]
pub fn circles_overlap(a: Vec2, b: Vec2, radius: f32) -> bool {
    let reach = radius + radius;
    a.distance_squared(b) <= reach * reach
}

/// Unit vector from `b` toward `a` and the center distance.
///
/// Coincident centers have no direction; they fall back to +x so the pair
/// still separates deterministically instead of producing NaN.
pub fn separation_axis(a: Vec2, b: Vec2) -> (Vec2, f32) {
    let delta = a - b;
    let distance = delta.length();
    if distance < COINCIDENT_EPSILON {
        (Vec2::X, 0.0)
    } else {
        (delta / distance, distance)
    }
}

/// Push two overlapping circles apart along the line between their centers,
/// each by half the penetration. Afterwards the centers are `2 * radius` apart.
pub fn separate_circles(a: &mut Vec2, b: &mut Vec2, radius: f32) {
    let (axis, distance) = separation_axis(*a, *b);
    let overlap = 0.5 * (distance - radius - radius);
    *a -= overlap * axis;
    *b += overlap * axis;
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Bounce two touching circles: each velocity is reflected about the shared
/// normal using its *own* normal component. For equal masses this is not a
/// full momentum exchange in general; it is the response this playground uses.
pub fn bounce_circles(a: &mut Body, b: &mut Body) {
    // normal points from a to b
    let (axis, _) = separation_axis(a.pos, b.pos);
    let normal = -axis;
    a.vel = reflect_velocity(a.vel, normal);
    b.vel = reflect_velocity(b.vel, normal);
}

/// Exhaustive pairwise circle-circle pass over equal-radius circles.
///
/// Returns the unordered pairs `(i, j)`, `i < j`, that touched this tick.
/// Separation and bounce are applied independently when enabled.
pub fn resolve_circle_pairs(
    bodies: &mut [Body],
    radius: f32,
    separation: bool,
    bounce: bool,
) -> Vec<(usize, usize)> {
    let mut colliding = Vec::new();
    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            if bodies[i].shape != Shape::Circle || bodies[j].shape != Shape::Circle {
                continue;
            }
            if !circles_overlap(bodies[i].pos, bodies[j].pos, radius) {
                continue;
            }
            colliding.push((i, j));
            if separation {
                let (left, right) = bodies.split_at_mut(j);
                separate_circles(&mut left[i].pos, &mut right[0].pos, radius);
            }
        }
    }

    if bounce {
        for &(i, j) in &colliding {
            let (left, right) = bodies.split_at_mut(j);
            bounce_circles(&mut left[i], &mut right[0]);
        }
    }

    colliding
}

/// Overlap between a circle and a static box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleBoxContact {
    /// Closest point of the box to the circle center
    pub closest: Vec2,
    /// Unit normal from the closest point toward the circle center
    pub normal: Vec2,
    /// Distance from the closest point to the center
    pub distance: f32,
    /// Contact is on the box's top or bottom face (not a side)
    pub landing: bool,
}

impl CircleBoxContact {
    /// New circle center: `distance + clearance` out from the closest point.
    /// The clearance keeps the circle from re-penetrating next tick.
    pub fn push_out(&self, clearance: f32) -> Vec2 {
        self.closest + self.normal * (self.distance + clearance)
    }
}

/// Test a circle against a box; `None` when they do not overlap.
pub fn circle_box_contact(center: Vec2, radius: f32, rect: &Rect) -> Option<CircleBoxContact> {
    let closest = rect.closest_point(center);
    let distance_sq = center.distance_squared(closest);
    if distance_sq >= radius * radius {
        return None;
    }

    let distance = distance_sq.sqrt();
    if distance >= COINCIDENT_EPSILON {
        let landing = closest.x != rect.left() && closest.x != rect.right();
        return Some(CircleBoxContact {
            closest,
            normal: (center - closest) / distance,
            distance,
            landing,
        });
    }

    // Center inside the box: leave through the nearest face
    let faces = [
        (center.x - rect.left(), Vec2::NEG_X, Vec2::new(rect.left(), center.y)),
        (rect.right() - center.x, Vec2::X, Vec2::new(rect.right(), center.y)),
        (center.y - rect.top(), Vec2::NEG_Y, Vec2::new(center.x, rect.top())),
        (rect.bottom() - center.y, Vec2::Y, Vec2::new(center.x, rect.bottom())),
    ];
    let (_, normal, closest) = faces
        .into_iter()
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .unwrap_or(faces[0]);
    Some(CircleBoxContact {
        closest,
        normal,
        distance: 0.0,
        landing: normal.y != 0.0,
    })
}

/// Which face of the static box a moving box is touching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxSide {
    Left,
    Right,
    Top,
    Bottom,
}

/// Exact edge-touch test of a moving box against one face of a static box.
///
/// The moving box's edge, truncated to a whole unit, must equal the static
/// edge, and the boxes must overlap on the perpendicular axis.
pub fn box_touches(body: &Rect, wall: &Rect, side: BoxSide) -> bool {
    let p = body.min;
    let s = body.size;
    let spans_y = p.y > wall.top() - s.y && p.y < wall.bottom();
    let spans_x = p.x > wall.left() - s.x && p.x < wall.right();
    match side {
        BoxSide::Right => p.x.trunc() == wall.right() && spans_y,
        BoxSide::Left => (p.x + s.x).trunc() == wall.left() && spans_y,
        BoxSide::Bottom => p.y.trunc() == wall.bottom() && spans_x,
        BoxSide::Top => (p.y + s.y).trunc() == wall.top() && spans_x,
    }
}

/// Top-left corner after pushing one unit past the touched face
pub fn box_push_out(body: &Rect, wall: &Rect, side: BoxSide) -> Vec2 {
    match side {
        BoxSide::Right => Vec2::new(wall.right() + 1.0, body.min.y),
        BoxSide::Left => Vec2::new(wall.left() - body.size.x - 1.0, body.min.y),
        BoxSide::Bottom => Vec2::new(body.min.x, wall.bottom() + 1.0),
        BoxSide::Top => Vec2::new(body.min.x, wall.top() - body.size.y - 1.0),
    }
}

/// Faces in the order they are checked
pub const BOX_SIDES: [BoxSide; 4] = [BoxSide::Right, BoxSide::Left, BoxSide::Bottom, BoxSide::Top];

/// First face of `wall` that `body` touches
pub fn box_contact(body: &Rect, wall: &Rect) -> Option<BoxSide> {
    BOX_SIDES.into_iter().find(|&side| box_touches(body, wall, side))
}

/// Check all four faces in order, pushing out after each touch.
/// Returns the corrected rectangle and whether anything was touched.
pub fn resolve_box_box(body: &Rect, wall: &Rect) -> (Rect, bool) {
    let mut rect = *body;
    let mut touched = false;
    for side in BOX_SIDES {
        if box_touches(&rect, wall, side) {
            rect.min = box_push_out(&rect, wall, side);
            touched = true;
        }
    }
    (rect, touched)
}
