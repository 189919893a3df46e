#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Map synthesis system producing solvable tile grids.
//!
//! Procedural maps are built from a fill, a border ring, random-walk worm
//! strokes and two bunker enclosures. Image-driven maps paint the grid from
//! a reference image. Either way the layout is accepted only when the exit
//! is reachable from the start, and generation gives up after a bounded
//! number of attempts.

use std::sync::Arc;

use rand::Rng;
use tile_tanks_core::{
    ConfigError, MapDefinition, MapImage, TileCoord, TileDefinitions, TileTypeId, UNREACHABLE,
};
use tile_tanks_world::{CostField, TileGrid};
use tracing::{debug, warn};

/// Attempts allowed before a procedural definition is declared unsolvable.
pub const PROCEDURAL_ATTEMPT_LIMIT: u32 = 1000;

/// Attempts allowed before an image definition is declared unsolvable.
pub const IMAGE_ATTEMPT_LIMIT: u32 = 100;

const CARDINAL_STEPS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// Grid accepted by the generator together with its markers.
#[derive(Clone, Debug)]
pub struct GeneratedMap {
    /// Generated tiles.
    pub grid: TileGrid,
    /// Entry tile.
    pub start: TileCoord,
    /// Exit tile.
    pub exit: TileCoord,
    /// Attempts spent, including the accepted one.
    pub attempts: u32,
}

/// Stateless map generator with bounded solvability retries.
#[derive(Clone, Copy, Debug)]
pub struct MapGenerator {
    procedural_attempts: u32,
    image_attempts: u32,
}

impl Default for MapGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MapGenerator {
    /// Creates a generator with the standard attempt limits.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_attempt_limits(PROCEDURAL_ATTEMPT_LIMIT, IMAGE_ATTEMPT_LIMIT)
    }

    /// Creates a generator with custom attempt limits.
    #[must_use]
    pub const fn with_attempt_limits(procedural: u32, image: u32) -> Self {
        Self {
            procedural_attempts: procedural,
            image_attempts: image,
        }
    }

    /// Generates a grid for the definition.
    ///
    /// When `image` is provided its dimensions replace the definition's and
    /// its texels drive the layout. Unknown tile names, missing markers and
    /// exhausted retries are reported as [`ConfigError`].
    pub fn generate<R>(
        &self,
        definition: &MapDefinition,
        tiles: &Arc<TileDefinitions>,
        image: Option<&MapImage>,
        rng: &mut R,
    ) -> Result<GeneratedMap, ConfigError>
    where
        R: Rng + ?Sized,
    {
        let base = BasePalette::resolve(definition, tiles)?;
        match image {
            Some(image) => self.generate_from_image(definition, tiles, &base, image, rng),
            None => self.generate_procedural(definition, tiles, &base, rng),
        }
    }

    fn generate_procedural<R>(
        &self,
        definition: &MapDefinition,
        tiles: &Arc<TileDefinitions>,
        base: &BasePalette,
        rng: &mut R,
    ) -> Result<GeneratedMap, ConfigError>
    where
        R: Rng + ?Sized,
    {
        let bunkers = BunkerPalette::resolve(definition, tiles)?;
        let mut field = CostField::default();

        for attempt in 1..=self.procedural_attempts {
            let mut grid = base_layout(definition.width, definition.height, base, tiles, rng);
            let (start, exit) = carve_bunkers(
                &mut grid,
                &bunkers,
                definition.start_area_size,
                definition.end_area_size,
            );

            field.recompute(&grid, start, UNREACHABLE, true, &[]);
            if field.is_reachable(exit) {
                seal_unreachable(&mut grid, &field, base, &bunkers);
                debug!(map = %definition.name, attempt, "accepted procedural layout");
                return Ok(GeneratedMap {
                    grid,
                    start,
                    exit,
                    attempts: attempt,
                });
            }
            note_retry(&definition.name, attempt, self.procedural_attempts);
        }

        Err(ConfigError::UnsolvableLayout {
            map: definition.name.clone(),
            attempts: self.procedural_attempts,
        })
    }

    fn generate_from_image<R>(
        &self,
        definition: &MapDefinition,
        tiles: &Arc<TileDefinitions>,
        base: &BasePalette,
        image: &MapImage,
        rng: &mut R,
    ) -> Result<GeneratedMap, ConfigError>
    where
        R: Rng + ?Sized,
    {
        let entry = marker(definition, tiles, image, &definition.entry_tile)?;
        let exit_marker = marker(definition, tiles, image, &definition.exit_tile)?;
        let layout = base_layout(image.width(), image.height(), base, tiles, rng);
        let mut field = CostField::default();

        for attempt in 1..=self.image_attempts {
            let mut grid = layout.clone();
            let (start, exit) = paint_image(&mut grid, image, tiles, entry, exit_marker, rng);

            if let (Some(start), Some(exit)) = (start, exit) {
                field.recompute(&grid, start, UNREACHABLE, true, &[]);
                if field.is_reachable(exit) {
                    debug!(map = %definition.name, attempt, "accepted image layout");
                    return Ok(GeneratedMap {
                        grid,
                        start,
                        exit,
                        attempts: attempt,
                    });
                }
            }
            note_retry(&definition.name, attempt, self.image_attempts);
        }

        Err(ConfigError::UnsolvableLayout {
            map: definition.name.clone(),
            attempts: self.image_attempts,
        })
    }
}

#[derive(Debug)]
struct BasePalette {
    fill: TileTypeId,
    border: TileTypeId,
    worms: Vec<(TileTypeId, u32, u32)>,
}

impl BasePalette {
    fn resolve(definition: &MapDefinition, tiles: &TileDefinitions) -> Result<Self, ConfigError> {
        let worms = definition
            .worm_specs()
            .iter()
            .map(|worm| Ok((tiles.id_of(&worm.tile)?, worm.count, worm.max_length)))
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self {
            fill: tiles.id_of(&definition.fill_tile)?,
            border: tiles.id_of(&definition.border_tile)?,
            worms,
        })
    }
}

#[derive(Debug)]
struct BunkerPalette {
    entry: TileTypeId,
    exit: TileTypeId,
    start_wall: TileTypeId,
    start_floor: TileTypeId,
    end_wall: TileTypeId,
    end_floor: TileTypeId,
    wall_fill: TileTypeId,
}

impl BunkerPalette {
    fn resolve(definition: &MapDefinition, tiles: &TileDefinitions) -> Result<Self, ConfigError> {
        Ok(Self {
            entry: tiles.id_of(&definition.entry_tile)?,
            exit: tiles.id_of(&definition.exit_tile)?,
            start_wall: tiles.id_of(&definition.start_bunker_wall)?,
            start_floor: tiles.id_of(&definition.start_bunker_floor)?,
            end_wall: tiles.id_of(definition.end_bunker_wall_name())?,
            end_floor: tiles.id_of(definition.end_bunker_floor_name())?,
            wall_fill: tiles.id_of(definition.wall_fill_tile_name())?,
        })
    }
}

fn base_layout<R>(
    width: u32,
    height: u32,
    palette: &BasePalette,
    tiles: &Arc<TileDefinitions>,
    rng: &mut R,
) -> TileGrid
where
    R: Rng + ?Sized,
{
    let mut grid = TileGrid::filled(width, height, palette.fill, Arc::clone(tiles));
    let border: Vec<TileCoord> = grid.coords().filter(|coord| grid.is_border(*coord)).collect();
    for coord in border {
        grid.set_tile(coord, palette.border);
    }
    paint_worms(&mut grid, palette, rng);
    grid
}

fn paint_worms<R>(grid: &mut TileGrid, palette: &BasePalette, rng: &mut R)
where
    R: Rng + ?Sized,
{
    let max_x = i32::try_from(grid.width()).unwrap_or(i32::MAX) - 1;
    let max_y = i32::try_from(grid.height()).unwrap_or(i32::MAX) - 1;
    if max_x < 1 || max_y < 1 {
        return;
    }

    for &(tile, count, length) in &palette.worms {
        for _ in 0..count {
            let mut coord = TileCoord::new(rng.gen_range(1..=max_x), rng.gen_range(1..=max_y));
            for _ in 0..length {
                if is_within_border_walls(grid, coord) {
                    grid.set_tile(coord, tile);
                }
                let (dx, dy) = CARDINAL_STEPS[rng.gen_range(0..CARDINAL_STEPS.len())];
                coord = coord.offset(dx, dy);
            }
        }
    }
}

fn is_within_border_walls(grid: &TileGrid, coord: TileCoord) -> bool {
    grid.in_bounds(coord) && !grid.is_border(coord)
}

/// Carves the start bunker near the origin and the exit bunker near the far
/// corner, returning the entry and exit tiles.
fn carve_bunkers(
    grid: &mut TileGrid,
    palette: &BunkerPalette,
    start_size: i32,
    end_size: i32,
) -> (TileCoord, TileCoord) {
    let size = start_size;
    for y in 1..=size {
        for x in 1..=size {
            let coord = TileCoord::new(x, y);
            let tile = if (y > 1 && y < size && x == size - 1) || (x > 1 && x < size && y == size - 1)
            {
                palette.start_wall
            } else if x == 1 && y == 1 {
                palette.entry
            } else {
                palette.start_floor
            };
            paint_interior(grid, coord, tile);
        }
    }

    let width = i32::try_from(grid.width()).unwrap_or(i32::MAX);
    let height = i32::try_from(grid.height()).unwrap_or(i32::MAX);
    let left = width - end_size;
    let bottom = height - end_size;
    for x in left..width - 1 {
        for y in bottom..height - 1 {
            let coord = TileCoord::new(x, y);
            let tile = if (x > left && x < width - 2 && y == bottom + 1)
                || (y > bottom && y < height - 2 && x == left + 1)
            {
                palette.end_wall
            } else if x == width - 4 && y == height - 4 {
                palette.exit
            } else {
                palette.end_floor
            };
            paint_interior(grid, coord, tile);
        }
    }

    (TileCoord::new(1, 1), TileCoord::new(width - 4, height - 4))
}

fn paint_interior(grid: &mut TileGrid, coord: TileCoord, tile: TileTypeId) {
    if is_within_border_walls(grid, coord) {
        grid.set_tile(coord, tile);
    }
}

/// Replaces land tiles that cannot be reached from the start with the wall
/// fill type. Walls and water are left alone.
fn seal_unreachable(
    grid: &mut TileGrid,
    field: &CostField,
    base: &BasePalette,
    bunkers: &BunkerPalette,
) {
    let sealed: Vec<TileCoord> = grid
        .coords()
        .filter(|coord| !field.is_reachable(*coord))
        .filter(|coord| {
            grid.tile_at(*coord).is_some_and(|tile| {
                tile != base.border
                    && tile != bunkers.start_wall
                    && tile != bunkers.end_wall
                    && !grid.definitions().is_water(tile)
            })
        })
        .collect();
    for coord in sealed {
        grid.set_tile(coord, bunkers.wall_fill);
    }
}

fn marker(
    definition: &MapDefinition,
    tiles: &TileDefinitions,
    image: &MapImage,
    name: &str,
) -> Result<TileTypeId, ConfigError> {
    let id = tiles
        .find_ignore_case(name)
        .ok_or_else(|| ConfigError::UnknownTileType(name.to_owned()))?;
    let width = i32::try_from(image.width()).unwrap_or(0);
    let height = i32::try_from(image.height()).unwrap_or(0);
    let present = (0..height).any(|y| {
        (0..width).any(|x| {
            image
                .texel(TileCoord::new(x, y))
                .is_some_and(|texel| texel.a > 0 && tiles.by_map_color(texel) == Some(id))
        })
    });
    if present {
        Ok(id)
    } else {
        Err(ConfigError::MissingMarker {
            map: definition.name.clone(),
            marker: name.to_owned(),
        })
    }
}

/// Paints image texels onto the grid.
///
/// Transparent texels are skipped and partially transparent ones are applied
/// with a chance proportional to their alpha. Returns the last painted entry
/// and exit tiles.
fn paint_image<R>(
    grid: &mut TileGrid,
    image: &MapImage,
    tiles: &TileDefinitions,
    entry: TileTypeId,
    exit: TileTypeId,
    rng: &mut R,
) -> (Option<TileCoord>, Option<TileCoord>)
where
    R: Rng + ?Sized,
{
    let mut start = None;
    let mut end = None;
    let width = i32::try_from(grid.width()).unwrap_or(0);
    let height = i32::try_from(grid.height()).unwrap_or(0);

    for y in 0..height {
        for x in 0..width {
            let coord = TileCoord::new(x, y);
            let Some(texel) = image.texel(coord) else {
                continue;
            };
            if texel.a == 0 {
                continue;
            }
            let roll: f32 = rng.gen_range(0.0..=254.0);
            if roll > f32::from(texel.a) {
                continue;
            }
            let Some(tile) = tiles.by_map_color(texel) else {
                continue;
            };

            if tile == entry {
                start = Some(coord);
            }
            if tile == exit {
                end = Some(coord);
            }
            grid.set_tile(coord, tile);
        }
    }

    (start, end)
}

fn note_retry(map: &str, attempt: u32, limit: u32) {
    debug!(map, attempt, limit, "generated layout is unsolvable, retrying");
    if attempt == limit / 2 {
        warn!(map, attempt, limit, "map generation has used half of its attempts");
    }
}
