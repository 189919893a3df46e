//! Grid traversal raycasts and line-of-sight tests.

use glam::Vec2;
use tile_tanks_core::TileCoord;

use crate::cost_field::CostField;

/// Outcome of a raycast.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaycastHit {
    /// Ray struck a blocking tile or shape.
    pub did_impact: bool,
    /// Travelled distance, the full length on a miss.
    pub distance: f32,
    /// Impact point, or the ray end on a miss.
    pub point: Vec2,
    /// Surface normal at the impact, zero on a miss.
    pub normal: Vec2,
}

/// Walks the tiles crossed by a ray until one is blocked.
///
/// A ray starting inside a blocked tile impacts at distance zero. A ray
/// ending exactly on a tile boundary does not enter the next tile.
pub fn raycast_tiles<F>(start: Vec2, direction: Vec2, max_distance: f32, is_blocked: F) -> RaycastHit
where
    F: Fn(TileCoord) -> bool,
{
    let mut tile = TileCoord::containing(start);
    let forward = direction.normalize_or_zero();

    if is_blocked(tile) {
        return RaycastHit {
            did_impact: true,
            distance: 0.0,
            point: start,
            normal: -forward,
        };
    }

    let miss = RaycastHit {
        did_impact: false,
        distance: max_distance.max(0.0),
        point: start + forward * max_distance.max(0.0),
        normal: Vec2::ZERO,
    };
    if forward == Vec2::ZERO || max_distance <= 0.0 {
        return miss;
    }

    let step_x = if forward.x > 0.0 { 1 } else { -1 };
    let step_y = if forward.y > 0.0 { 1 } else { -1 };
    let delta_x = if forward.x == 0.0 {
        f32::INFINITY
    } else {
        1.0 / forward.x.abs()
    };
    let delta_y = if forward.y == 0.0 {
        f32::INFINITY
    } else {
        1.0 / forward.y.abs()
    };
    let mut next_x = if forward.x == 0.0 {
        f32::INFINITY
    } else {
        let boundary = if step_x > 0 { tile.x() + 1 } else { tile.x() };
        (boundary as f32 - start.x) / forward.x
    };
    let mut next_y = if forward.y == 0.0 {
        f32::INFINITY
    } else {
        let boundary = if step_y > 0 { tile.y() + 1 } else { tile.y() };
        (boundary as f32 - start.y) / forward.y
    };

    loop {
        let (distance, normal) = if next_x < next_y {
            if next_x >= max_distance {
                return miss;
            }
            tile = tile.offset(step_x, 0);
            let crossed = next_x;
            next_x += delta_x;
            (crossed, Vec2::new(-(step_x as f32), 0.0))
        } else {
            if next_y >= max_distance {
                return miss;
            }
            tile = tile.offset(0, step_y);
            let crossed = next_y;
            next_y += delta_y;
            (crossed, Vec2::new(0.0, -(step_y as f32)))
        };

        if is_blocked(tile) {
            return RaycastHit {
                did_impact: true,
                distance,
                point: start + forward * distance,
                normal,
            };
        }
    }
}

/// Raycasts against the tiles a field marks with its sentinel.
#[must_use]
pub fn raycast_field(field: &CostField, start: Vec2, direction: Vec2, max_distance: f32) -> RaycastHit {
    raycast_tiles(start, direction, max_distance, |coord| {
        !field.is_reachable(coord)
    })
}

/// Reports whether `end` is visible from `start` within `max_distance`,
/// treating sentinel tiles of `field` as opaque.
#[must_use]
pub fn has_line_of_sight(field: &CostField, start: Vec2, end: Vec2, max_distance: f32) -> bool {
    let offset = end - start;
    if offset.length_squared() > max_distance * max_distance {
        return false;
    }
    !raycast_field(field, start, offset, offset.length()).did_impact
}

/// Distance along a ray at which it enters a disc.
///
/// Rays starting inside the disc impact at zero.
#[must_use]
pub fn raycast_vs_disc(
    start: Vec2,
    direction: Vec2,
    max_distance: f32,
    center: Vec2,
    radius: f32,
) -> Option<f32> {
    let forward = direction.normalize_or_zero();
    let to_center = center - start;
    let radius_squared = radius * radius;
    if to_center.length_squared() <= radius_squared {
        return Some(0.0);
    }

    let along = to_center.dot(forward);
    if along <= 0.0 {
        return None;
    }
    let perpendicular_squared = to_center.length_squared() - along * along;
    if perpendicular_squared > radius_squared {
        return None;
    }
    let distance = along - (radius_squared - perpendicular_squared).sqrt();
    (distance <= max_distance).then_some(distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall_at(x: i32) -> impl Fn(TileCoord) -> bool {
        move |coord: TileCoord| coord.x() == x
    }

    #[test]
    fn ray_stops_at_first_blocked_tile() {
        let hit = raycast_tiles(Vec2::new(0.5, 0.5), Vec2::X, 10.0, wall_at(3));

        assert!(hit.did_impact);
        assert!((hit.distance - 2.5).abs() < 1e-5);
        assert_eq!(hit.normal, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn ray_short_of_wall_misses() {
        let hit = raycast_tiles(Vec2::new(0.5, 0.5), Vec2::X, 2.0, wall_at(3));

        assert!(!hit.did_impact);
        assert_eq!(hit.point, Vec2::new(2.5, 0.5));
    }

    #[test]
    fn ray_ending_on_boundary_does_not_enter_next_tile() {
        let hit = raycast_tiles(Vec2::new(0.5, 0.5), Vec2::X, 2.5, wall_at(3));

        assert!(!hit.did_impact);
    }

    #[test]
    fn ray_starting_in_blocked_tile_hits_immediately() {
        let hit = raycast_tiles(Vec2::new(3.2, 0.5), Vec2::X, 5.0, wall_at(3));

        assert!(hit.did_impact);
        assert_eq!(hit.distance, 0.0);
    }

    #[test]
    fn diagonal_ray_crosses_corner_tiles() {
        let blocked = |coord: TileCoord| coord == TileCoord::new(2, 2);
        let hit = raycast_tiles(Vec2::new(0.5, 0.5), Vec2::new(1.0, 1.0), 10.0, blocked);

        assert!(hit.did_impact);
        assert!((hit.point - Vec2::new(2.0, 2.0)).length() < 1e-4);
    }

    #[test]
    fn disc_hit_distance_is_entry_point() {
        let distance = raycast_vs_disc(Vec2::ZERO, Vec2::X, 10.0, Vec2::new(5.0, 0.0), 1.0);

        assert_eq!(distance, Some(4.0));
    }

    #[test]
    fn disc_behind_or_beyond_range_is_missed() {
        assert_eq!(
            raycast_vs_disc(Vec2::ZERO, Vec2::X, 10.0, Vec2::new(-5.0, 0.0), 1.0),
            None
        );
        assert_eq!(
            raycast_vs_disc(Vec2::ZERO, Vec2::X, 3.0, Vec2::new(5.0, 0.0), 1.0),
            None
        );
        assert_eq!(
            raycast_vs_disc(Vec2::ZERO, Vec2::X, 10.0, Vec2::new(5.0, 2.0), 1.0),
            None
        );
    }
}
