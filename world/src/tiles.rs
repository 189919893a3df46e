//! Dense tile storage with timed overrides.

use std::sync::Arc;

use glam::Vec2;
use tile_tanks_core::{TileCoord, TileDefinitions, TileTypeId};

/// Axis-aligned bounds of a single tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileBounds {
    /// Minimum corner.
    pub min: Vec2,
    /// Maximum corner.
    pub max: Vec2,
}

impl TileBounds {
    /// Point inside the bounds closest to `point`.
    #[must_use]
    pub fn nearest_point(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min, self.max)
    }
}

#[derive(Clone, Debug, PartialEq)]
struct TileOverride {
    index: usize,
    original: TileTypeId,
    age: f32,
    duration: f32,
}

/// Row-major grid of tile type assignments.
#[derive(Clone, Debug)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tiles: Vec<TileTypeId>,
    definitions: Arc<TileDefinitions>,
    overrides: Vec<TileOverride>,
}

impl TileGrid {
    /// Creates a grid with every tile set to `fill`.
    #[must_use]
    pub fn filled(
        width: u32,
        height: u32,
        fill: TileTypeId,
        definitions: Arc<TileDefinitions>,
    ) -> Self {
        let width_usize = usize::try_from(width).unwrap_or(0);
        let height_usize = usize::try_from(height).unwrap_or(0);
        let tile_count = width_usize.checked_mul(height_usize).unwrap_or(0);
        Self {
            width,
            height,
            tiles: vec![fill; tile_count],
            definitions,
            overrides: Vec::new(),
        }
    }

    /// Width of the grid in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the grid in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Tile type registry the grid indexes into.
    #[must_use]
    pub fn definitions(&self) -> &TileDefinitions {
        &self.definitions
    }

    /// Tile assignments in row-major order.
    #[must_use]
    pub fn tiles(&self) -> &[TileTypeId] {
        &self.tiles
    }

    /// Reports whether the coordinate lies within the grid.
    #[must_use]
    pub fn in_bounds(&self, coord: TileCoord) -> bool {
        coord.x() >= 0
            && coord.y() >= 0
            && i64::from(coord.x()) < i64::from(self.width)
            && i64::from(coord.y()) < i64::from(self.height)
    }

    /// Reports whether the coordinate lies on the outermost ring.
    #[must_use]
    pub fn is_border(&self, coord: TileCoord) -> bool {
        self.in_bounds(coord)
            && (coord.x() == 0
                || coord.y() == 0
                || i64::from(coord.x()) == i64::from(self.width) - 1
                || i64::from(coord.y()) == i64::from(self.height) - 1)
    }

    /// Row-major index of an in-bounds coordinate.
    #[must_use]
    pub fn index_of(&self, coord: TileCoord) -> Option<usize> {
        if !self.in_bounds(coord) {
            return None;
        }
        index(usize::try_from(self.width).ok()?, coord)
    }

    /// Coordinate of a row-major index.
    #[must_use]
    pub fn coord_of(&self, index: usize) -> TileCoord {
        let width = usize::try_from(self.width).unwrap_or(1).max(1);
        let x = i32::try_from(index % width).unwrap_or(i32::MAX);
        let y = i32::try_from(index / width).unwrap_or(i32::MAX);
        TileCoord::new(x, y)
    }

    /// World position of the tile centre.
    #[must_use]
    pub fn center_of(&self, coord: TileCoord) -> Vec2 {
        coord.center()
    }

    /// World-space bounds of the tile.
    #[must_use]
    pub fn bounds_of(&self, coord: TileCoord) -> TileBounds {
        let min = Vec2::new(coord.x() as f32, coord.y() as f32);
        TileBounds {
            min,
            max: min + Vec2::ONE,
        }
    }

    /// Every coordinate in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = TileCoord> + '_ {
        (0..self.tiles.len()).map(|index| self.coord_of(index))
    }

    /// Tile type at the coordinate.
    #[must_use]
    pub fn tile_at(&self, coord: TileCoord) -> Option<TileTypeId> {
        self.index_of(coord)
            .and_then(|index| self.tiles.get(index).copied())
    }

    /// Permanently assigns a tile type. Out-of-bounds writes are ignored.
    pub fn set_tile(&mut self, coord: TileCoord, tile: TileTypeId) {
        if let Some(index) = self.index_of(coord) {
            self.tiles[index] = tile;
        }
    }

    /// Reports whether the tile blocks movement under the water policy.
    ///
    /// Out-of-bounds coordinates are solid. Water tiles answer
    /// `water_as_solid` regardless of their solid flag.
    #[must_use]
    pub fn is_solid(&self, coord: TileCoord, water_as_solid: bool) -> bool {
        let Some(tile) = self.tile_at(coord) else {
            return true;
        };
        if self.definitions.is_water(tile) {
            return water_as_solid;
        }
        self.definitions.is_solid(tile)
    }

    /// Reports whether the tile is water.
    #[must_use]
    pub fn is_water(&self, coord: TileCoord) -> bool {
        self.tile_at(coord)
            .is_some_and(|tile| self.definitions.is_water(tile))
    }

    /// Reports whether a projectile is stopped by the tile.
    ///
    /// Projectiles fly over water and only consult the solid flag.
    #[must_use]
    pub fn blocks_projectiles(&self, coord: TileCoord) -> bool {
        self.tile_at(coord)
            .map_or(true, |tile| self.definitions.is_solid(tile))
    }

    /// Temporarily replaces the tile under `position`.
    ///
    /// Re-applying to a tile that is already overridden resets its age and
    /// keeps the originally recorded type. Returns the affected coordinate.
    pub fn apply_temporary_override(
        &mut self,
        position: Vec2,
        tile: TileTypeId,
        duration: f32,
    ) -> Option<TileCoord> {
        let coord = TileCoord::containing(position);
        let index = self.index_of(coord)?;

        if let Some(existing) = self
            .overrides
            .iter_mut()
            .find(|entry| entry.index == index)
        {
            existing.age = 0.0;
            return Some(coord);
        }

        self.overrides.push(TileOverride {
            index,
            original: self.tiles[index],
            age: 0.0,
            duration,
        });
        self.tiles[index] = tile;
        Some(coord)
    }

    /// Ages every override, reverting those whose age reached the duration.
    ///
    /// Reverted coordinates and their restored types are appended to `out`.
    pub fn advance_overrides(&mut self, dt: f32, out: &mut Vec<(TileCoord, TileTypeId)>) {
        let mut expired = Vec::new();
        for entry in &mut self.overrides {
            entry.age += dt;
            if entry.age >= entry.duration {
                expired.push((entry.index, entry.original));
            }
        }
        if expired.is_empty() {
            return;
        }

        self.overrides.retain(|entry| entry.age < entry.duration);
        for (index, original) in expired {
            self.tiles[index] = original;
            out.push((self.coord_of(index), original));
        }
    }

    /// Number of active overrides.
    #[must_use]
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}

pub(crate) fn index(width: usize, coord: TileCoord) -> Option<usize> {
    let column = usize::try_from(coord.x()).ok()?;
    let row = usize::try_from(coord.y()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_tanks_core::TileDefinition;

    fn definitions() -> Arc<TileDefinitions> {
        Arc::new(TileDefinitions::new(vec![
            TileDefinition::new("Floor", false, false),
            TileDefinition::new("Wall", true, false),
            TileDefinition::new("Water", false, true),
            TileDefinition::new("Mud", false, false),
        ]))
    }

    const FLOOR: TileTypeId = TileTypeId::new(0);
    const WALL: TileTypeId = TileTypeId::new(1);
    const WATER: TileTypeId = TileTypeId::new(2);
    const MUD: TileTypeId = TileTypeId::new(3);

    #[test]
    fn index_and_coord_are_row_major() {
        let grid = TileGrid::filled(4, 3, FLOOR, definitions());

        assert_eq!(grid.index_of(TileCoord::new(1, 2)), Some(9));
        assert_eq!(grid.coord_of(9), TileCoord::new(1, 2));
        assert_eq!(grid.index_of(TileCoord::new(4, 0)), None);
    }

    #[test]
    fn out_of_bounds_is_solid() {
        let grid = TileGrid::filled(3, 3, FLOOR, definitions());

        assert!(grid.is_solid(TileCoord::new(-1, 0), false));
        assert!(grid.is_solid(TileCoord::new(0, 3), false));
        assert!(!grid.is_solid(TileCoord::new(1, 1), true));
    }

    #[test]
    fn water_follows_policy() {
        let mut grid = TileGrid::filled(3, 3, FLOOR, definitions());
        grid.set_tile(TileCoord::new(1, 1), WATER);
        grid.set_tile(TileCoord::new(2, 1), WALL);

        assert!(grid.is_solid(TileCoord::new(1, 1), true));
        assert!(!grid.is_solid(TileCoord::new(1, 1), false));
        assert!(!grid.blocks_projectiles(TileCoord::new(1, 1)));
        assert!(grid.blocks_projectiles(TileCoord::new(2, 1)));
    }

    #[test]
    fn bounds_nearest_point_clamps() {
        let grid = TileGrid::filled(3, 3, FLOOR, definitions());
        let bounds = grid.bounds_of(TileCoord::new(1, 1));

        assert_eq!(bounds.nearest_point(Vec2::new(0.5, 1.5)), Vec2::new(1.0, 1.5));
        assert_eq!(bounds.nearest_point(Vec2::new(3.0, 3.0)), Vec2::new(2.0, 2.0));
    }

    #[test]
    fn override_reverts_after_duration() {
        let mut grid = TileGrid::filled(3, 3, FLOOR, definitions());
        let mut reverted = Vec::new();
        let position = Vec2::new(1.5, 1.5);

        let _ = grid.apply_temporary_override(position, WATER, 10.0);
        grid.advance_overrides(5.0, &mut reverted);
        assert_eq!(grid.tile_at(TileCoord::new(1, 1)), Some(WATER));
        assert!(reverted.is_empty());

        grid.advance_overrides(5.1, &mut reverted);
        assert_eq!(grid.tile_at(TileCoord::new(1, 1)), Some(FLOOR));
        assert_eq!(reverted, vec![(TileCoord::new(1, 1), FLOOR)]);
        assert_eq!(grid.override_count(), 0);
    }

    #[test]
    fn override_expires_at_exact_duration() {
        let mut grid = TileGrid::filled(3, 3, FLOOR, definitions());
        let mut reverted = Vec::new();

        let _ = grid.apply_temporary_override(Vec2::new(0.5, 0.5), MUD, 2.0);
        grid.advance_overrides(2.0, &mut reverted);

        assert_eq!(grid.tile_at(TileCoord::new(0, 0)), Some(FLOOR));
    }

    #[test]
    fn reapplying_resets_age_without_stacking() {
        let mut grid = TileGrid::filled(3, 3, FLOOR, definitions());
        let mut reverted = Vec::new();
        let position = Vec2::new(2.2, 0.7);

        let _ = grid.apply_temporary_override(position, WATER, 4.0);
        grid.advance_overrides(3.0, &mut reverted);
        let _ = grid.apply_temporary_override(position, WATER, 4.0);
        assert_eq!(grid.override_count(), 1);

        grid.advance_overrides(3.0, &mut reverted);
        assert_eq!(grid.tile_at(TileCoord::new(2, 0)), Some(WATER));

        grid.advance_overrides(1.0, &mut reverted);
        assert_eq!(grid.tile_at(TileCoord::new(2, 0)), Some(FLOOR));
    }

    #[test]
    fn override_outside_grid_is_ignored() {
        let mut grid = TileGrid::filled(3, 3, FLOOR, definitions());

        assert_eq!(
            grid.apply_temporary_override(Vec2::new(-0.5, 1.0), WATER, 1.0),
            None
        );
        assert_eq!(grid.override_count(), 0);
    }
}
