//! Breadth-first cost fields layered over the tile grid.

use std::collections::VecDeque;

use glam::Vec2;
use tile_tanks_core::{TileCoord, UNREACHABLE};

use crate::tiles::{index, TileGrid};

/// Dense hop-count grid seeded from a single tile.
///
/// Every reachable tile stores its 4-connected distance from the seed and
/// unreachable tiles hold the sentinel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CostField {
    width: u32,
    height: u32,
    values: Vec<u16>,
    sentinel: u16,
}

impl Default for CostField {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            values: Vec::new(),
            sentinel: UNREACHABLE,
        }
    }
}

impl CostField {
    /// Recomputes the field from `seed` over the grid.
    ///
    /// A neighbour is admitted when it is in bounds, not solid under the
    /// water policy and not listed in `excluded`.
    pub fn recompute(
        &mut self,
        grid: &TileGrid,
        seed: TileCoord,
        sentinel: u16,
        water_as_solid: bool,
        excluded: &[TileCoord],
    ) {
        self.rebuild_with(grid.width(), grid.height(), seed, sentinel, |coord| {
            grid.is_solid(coord, water_as_solid) || excluded.contains(&coord)
        });
    }

    /// Recomputes the field using a caller-provided blocking predicate.
    pub fn rebuild_with<F>(
        &mut self,
        width: u32,
        height: u32,
        seed: TileCoord,
        sentinel: u16,
        mut is_blocked: F,
    ) where
        F: FnMut(TileCoord) -> bool,
    {
        let width_usize = usize::try_from(width).unwrap_or(0);
        let height_usize = usize::try_from(height).unwrap_or(0);
        let cell_count = width_usize.checked_mul(height_usize).unwrap_or(0);

        self.width = width;
        self.height = height;
        self.sentinel = sentinel;

        if self.values.len() != cell_count {
            self.values = vec![sentinel; cell_count];
        } else {
            self.values.fill(sentinel);
        }

        let Some(seed_index) = self.index_of(seed) else {
            return;
        };
        self.values[seed_index] = 0;

        let mut queue = VecDeque::new();
        queue.push_back(seed);

        while let Some(coord) = queue.pop_front() {
            let Some(current_index) = self.index_of(coord) else {
                continue;
            };
            let current = self.values[current_index];
            if current >= sentinel.saturating_sub(1) {
                continue;
            }
            let next = current + 1;

            for neighbor in coord.cardinal_neighbors() {
                let Some(neighbor_index) = self.index_of(neighbor) else {
                    continue;
                };
                if self.values[neighbor_index] <= next {
                    continue;
                }
                if is_blocked(neighbor) {
                    continue;
                }

                self.values[neighbor_index] = next;
                queue.push_back(neighbor);
            }
        }
    }

    /// Builds a mask holding zero on traversable tiles and the sentinel
    /// elsewhere.
    #[must_use]
    pub fn static_mask(grid: &TileGrid, water_as_solid: bool, sentinel: u16) -> Self {
        let values = grid
            .coords()
            .map(|coord| {
                if grid.is_solid(coord, water_as_solid) {
                    sentinel
                } else {
                    0
                }
            })
            .collect();
        Self {
            width: grid.width(),
            height: grid.height(),
            values,
            sentinel,
        }
    }

    /// Width of the field in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the field in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Value marking unreachable tiles.
    #[must_use]
    pub const fn sentinel(&self) -> u16 {
        self.sentinel
    }

    /// Dense values in row-major order.
    #[must_use]
    pub fn values(&self) -> &[u16] {
        &self.values
    }

    /// Value stored for the coordinate, if it lies within the field.
    #[must_use]
    pub fn value(&self, coord: TileCoord) -> Option<u16> {
        self.index_of(coord)
            .and_then(|offset| self.values.get(offset).copied())
    }

    /// Value under a world position, with out-of-bounds positions reading
    /// as the sentinel.
    #[must_use]
    pub fn value_at(&self, position: Vec2) -> u16 {
        self.value(TileCoord::containing(position))
            .unwrap_or(self.sentinel)
    }

    /// Reports whether the tile holds a finite distance.
    #[must_use]
    pub fn is_reachable(&self, coord: TileCoord) -> bool {
        self.value(coord)
            .is_some_and(|value| value != self.sentinel)
    }

    /// First tile, in row-major order, holding a zero value.
    #[must_use]
    pub fn seed(&self) -> Option<TileCoord> {
        let width = usize::try_from(self.width).ok()?.max(1);
        let offset = self.values.iter().position(|value| *value == 0)?;
        let x = i32::try_from(offset % width).ok()?;
        let y = i32::try_from(offset / width).ok()?;
        Some(TileCoord::new(x, y))
    }

    fn index_of(&self, coord: TileCoord) -> Option<usize> {
        if coord.x() < 0
            || coord.y() < 0
            || i64::from(coord.x()) >= i64::from(self.width)
            || i64::from(coord.y()) >= i64::from(self.height)
        {
            return None;
        }
        index(usize::try_from(self.width).ok()?, coord)
    }
}
