//! Planar helpers shared by steering and collision.
//!
//! Angles are degrees measured counter-clockwise from `+x`.

use glam::Vec2;

use crate::tiles::TileBounds;

/// Unit vector pointing along the heading.
#[must_use]
pub fn heading(degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees.to_radians())
}

/// Heading of a vector in degrees.
#[must_use]
pub fn degrees_of(vector: Vec2) -> f32 {
    vector.y.atan2(vector.x).to_degrees()
}

/// Shortest signed difference from `from` to `to`, in `(-180, 180]`.
#[must_use]
pub fn shortest_angular_difference(from: f32, to: f32) -> f32 {
    let mut difference = (to - from) % 360.0;
    if difference > 180.0 {
        difference -= 360.0;
    } else if difference <= -180.0 {
        difference += 360.0;
    }
    difference
}

/// Turns `current` toward `goal` by at most `max_delta` degrees.
#[must_use]
pub fn turn_toward(current: f32, goal: f32, max_delta: f32) -> f32 {
    let difference = shortest_angular_difference(current, goal);
    let limit = max_delta.abs();
    current + difference.clamp(-limit, limit)
}

/// Signed angle from `from` to `to`, in `(-180, 180]`.
#[must_use]
pub fn signed_angle_between(from: Vec2, to: Vec2) -> f32 {
    shortest_angular_difference(degrees_of(from), degrees_of(to))
}

/// Reflects a vector about a unit surface normal.
#[must_use]
pub fn reflect(vector: Vec2, normal: Vec2) -> Vec2 {
    vector - 2.0 * vector.dot(normal) * normal
}

/// Reports whether two discs overlap.
#[must_use]
pub fn discs_overlap(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32) -> bool {
    let reach = a_radius + b_radius;
    a.distance_squared(b) < reach * reach
}

/// Separates two mobile discs, each taking half of the correction.
pub fn push_discs_apart(a: &mut Vec2, a_radius: f32, b: &mut Vec2, b_radius: f32) -> bool {
    let offset = *b - *a;
    let overlap = a_radius + b_radius - offset.length();
    if overlap <= 0.0 {
        return false;
    }
    let direction = separation_direction(offset);
    *a -= direction * (overlap * 0.5);
    *b += direction * (overlap * 0.5);
    true
}

/// Pushes a mobile disc fully out of a fixed disc.
pub fn push_disc_out_of_fixed_disc(
    mobile: &mut Vec2,
    mobile_radius: f32,
    fixed: Vec2,
    fixed_radius: f32,
) -> bool {
    let offset = *mobile - fixed;
    let overlap = mobile_radius + fixed_radius - offset.length();
    if overlap <= 0.0 {
        return false;
    }
    *mobile += separation_direction(offset) * overlap;
    true
}

/// Pushes a mobile disc out of fixed tile bounds.
pub fn push_disc_out_of_bounds(mobile: &mut Vec2, radius: f32, bounds: TileBounds) -> bool {
    let nearest = bounds.nearest_point(*mobile);
    let offset = *mobile - nearest;

    if offset == Vec2::ZERO {
        // Centre inside the box: leave through the closest face.
        let exits = [
            (mobile.x - bounds.min.x, Vec2::new(-1.0, 0.0)),
            (bounds.max.x - mobile.x, Vec2::new(1.0, 0.0)),
            (mobile.y - bounds.min.y, Vec2::new(0.0, -1.0)),
            (bounds.max.y - mobile.y, Vec2::new(0.0, 1.0)),
        ];
        let (depth, normal) = exits
            .into_iter()
            .fold(exits[0], |best, candidate| if candidate.0 < best.0 { candidate } else { best });
        *mobile += normal * (depth + radius);
        return true;
    }

    let distance = offset.length();
    if distance >= radius {
        return false;
    }
    *mobile = nearest + offset / distance * radius;
    true
}

/// Reports whether `point` lies within a sector of `aperture` degrees
/// centred on `forward_degrees` and reaching `radius` from `tip`.
#[must_use]
pub fn is_point_in_directed_sector(
    point: Vec2,
    tip: Vec2,
    forward_degrees: f32,
    aperture: f32,
    radius: f32,
) -> bool {
    let offset = point - tip;
    if offset.length_squared() > radius * radius {
        return false;
    }
    if offset == Vec2::ZERO {
        return true;
    }
    shortest_angular_difference(forward_degrees, degrees_of(offset)).abs() <= aperture * 0.5
}

fn separation_direction(offset: Vec2) -> Vec2 {
    let direction = offset.normalize_or_zero();
    if direction == Vec2::ZERO {
        Vec2::X
    } else {
        direction
    }
}
