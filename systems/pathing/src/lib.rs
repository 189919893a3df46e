#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Waypoint planning over cost fields.
//!
//! Paths are extracted by walking a cost field downhill from the entity's
//! tile. They are stored with the far end first so the next hop can be
//! popped from the back, and they are smoothed while being followed by
//! skipping waypoints that are already in clear sight.

use glam::Vec2;
use rand::Rng;
use tile_tanks_core::{TileCoord, UNREACHABLE};
use tile_tanks_world::{geometry, raycast, CostField, Entity, Navigation, TileGrid};

/// Writes the downhill walk from `from` into `out`, far end first.
///
/// Each step moves to the cardinal neighbour with the strictly smallest
/// value below the current one, preferring north, east, south, west on
/// ties. The walk stops on a zero tile, on a plateau, or after
/// `max_waypoints` steps.
pub fn build_path(field: &CostField, from: Vec2, max_waypoints: usize, out: &mut Vec<Vec2>) {
    out.clear();
    let mut current = TileCoord::containing(from);
    let mut current_value = field.value_at(from);

    while out.len() < max_waypoints && current_value != 0 {
        let mut best: Option<(TileCoord, u16)> = None;
        for neighbor in current.cardinal_neighbors() {
            let Some(value) = field.value(neighbor) else {
                continue;
            };
            let improves = value < best.map_or(current_value, |(_, best_value)| best_value);
            if improves {
                best = Some((neighbor, value));
            }
        }

        let Some((next, value)) = best else {
            break;
        };
        out.push(next.center());
        current = next;
        current_value = value;
    }

    out.reverse();
}

/// Pops waypoints that can be skipped and returns the waypoint to steer to.
///
/// A waypoint is skipped while the one after it is visible along three
/// parallel rays: one from the centre and one from each side of the body at
/// `radius`. Visibility is tested against the navigation's solid field
/// within `sight_range`. The final waypoint is dropped once the body covers
/// it.
pub fn advance_waypoint(
    navigation: &mut Navigation,
    position: Vec2,
    orientation: f32,
    radius: f32,
    sight_range: f32,
) -> Option<Vec2> {
    let wing = geometry::heading(orientation).perp() * radius;

    while navigation.path.len() >= 2 {
        let after_next = navigation.path[navigation.path.len() - 2];
        let clear = [Vec2::ZERO, wing, -wing].into_iter().all(|offset| {
            raycast::has_line_of_sight(
                &navigation.solid,
                position + offset,
                after_next + offset,
                sight_range,
            )
        });
        if !clear {
            break;
        }
        let _ = navigation.path.pop();
    }

    if navigation.path.len() == 1
        && navigation
            .path
            .last()
            .is_some_and(|waypoint| waypoint.distance(position) <= radius)
    {
        let _ = navigation.path.pop();
    }

    let next = navigation.path.last().copied();
    if let Some(waypoint) = next {
        navigation.next_waypoint = waypoint;
    }
    next
}

/// Chooses a random interior tile reachable in `solid`.
pub fn pick_roam_target<R>(grid: &TileGrid, solid: &CostField, rng: &mut R) -> Option<TileCoord>
where
    R: Rng + ?Sized,
{
    let candidates: Vec<TileCoord> = grid
        .coords()
        .filter(|coord| !grid.is_border(*coord) && solid.is_reachable(*coord))
        .collect();
    if candidates.is_empty() {
        return None;
    }
    Some(candidates[rng.gen_range(0..candidates.len())])
}

/// Picks a new roam target, recomputes the roam field there and rebuilds the
/// path toward it. Returns false when no reachable target exists.
pub fn roam_to_random_target<R>(
    navigation: &mut Navigation,
    position: Vec2,
    water_as_solid: bool,
    grid: &TileGrid,
    excluded: &[TileCoord],
    rng: &mut R,
) -> bool
where
    R: Rng + ?Sized,
{
    let Some(target) = pick_roam_target(grid, &navigation.solid, rng) else {
        return false;
    };
    navigation
        .roam
        .recompute(grid, target, UNREACHABLE, water_as_solid, excluded);
    build_path(
        &navigation.roam,
        position,
        roam_waypoint_limit(grid),
        &mut navigation.path,
    );
    navigation.target = target.center();
    navigation.next_waypoint = navigation.path.last().copied().unwrap_or(position);
    true
}

/// Rebuilds the path down a shared field toward the player.
pub fn follow_field(
    navigation: &mut Navigation,
    field: &CostField,
    position: Vec2,
    max_waypoints: usize,
) {
    build_path(field, position, max_waypoints, &mut navigation.path);
    navigation.target = navigation.path.first().copied().unwrap_or(position);
    navigation.next_waypoint = navigation.path.last().copied().unwrap_or(position);
}

/// Prepares the navigation state of a freshly placed roaming entity.
///
/// The solid field is seeded at the entity's tile with `excluded` tiles
/// blocked, then a first roam target is chosen.
pub fn init_navigation<R>(
    entity: &mut Entity,
    grid: &TileGrid,
    excluded: &[TileCoord],
    rng: &mut R,
) -> bool
where
    R: Rng + ?Sized,
{
    let seed = entity.tile();
    let position = entity.position;
    let water_as_solid = entity.water_as_solid();
    let Some(navigation) = entity.navigation.as_mut() else {
        return false;
    };
    navigation
        .solid
        .recompute(grid, seed, UNREACHABLE, water_as_solid, excluded);
    roam_to_random_target(navigation, position, water_as_solid, grid, excluded, rng)
}

fn roam_waypoint_limit(grid: &TileGrid) -> usize {
    usize::try_from(u64::from(grid.width()) * u64::from(grid.height())).unwrap_or(usize::MAX)
}
