//! Externally authored tile, map and session definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{TileCoord, TileTypeId, MAX_WORM_TYPES};

/// Errors raised while resolving definitions or building maps.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A definition referenced a tile type that does not exist.
    #[error("unknown tile type `{0}`")]
    UnknownTileType(String),
    /// The session referenced a map definition that does not exist.
    #[error("unknown map definition `{0}`")]
    UnknownMapDefinition(String),
    /// Generation could not produce a solvable layout.
    #[error("map `{map}` produced no solvable layout after {attempts} attempts")]
    UnsolvableLayout {
        /// Name of the map definition.
        map: String,
        /// Attempts spent before giving up.
        attempts: u32,
    },
    /// An image-driven map lacks its entry or exit marker.
    #[error("map image for `{map}` contains no `{marker}` tile")]
    MissingMarker {
        /// Name of the map definition.
        map: String,
        /// Tile name of the missing marker.
        marker: String,
    },
    /// The session lists no maps.
    #[error("session lists no maps")]
    EmptySession,
}

/// RGBA colour with eight bits per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    #[serde(default = "opaque")]
    pub a: u8,
}

const fn opaque() -> u8 {
    u8::MAX
}

impl Rgba8 {
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    /// Creates a colour from its four channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Reports whether the colour channels match, ignoring alpha.
    #[must_use]
    pub const fn same_rgb(&self, other: &Rgba8) -> bool {
        self.r == other.r && self.g == other.g && self.b == other.b
    }
}

impl Default for Rgba8 {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Static description of a tile type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileDefinition {
    /// Unique name used by map definitions.
    pub name: String,
    /// Tile blocks every entity.
    #[serde(default)]
    pub solid: bool,
    /// Tile is water, blocking land-bound entities only.
    #[serde(default)]
    pub water: bool,
    /// Render tint.
    #[serde(default)]
    pub tint: Rgba8,
    /// Colour identifying the tile in map images.
    #[serde(default)]
    pub map_color: Option<Rgba8>,
    /// Sprite sheet cell, `[-1, -1]` when unset.
    #[serde(default = "unset_sprite")]
    pub sprite_coords: [i32; 2],
}

const fn unset_sprite() -> [i32; 2] {
    [-1, -1]
}

impl TileDefinition {
    /// Creates a definition with default presentation data.
    #[must_use]
    pub fn new(name: impl Into<String>, solid: bool, water: bool) -> Self {
        Self {
            name: name.into(),
            solid,
            water,
            tint: Rgba8::WHITE,
            map_color: None,
            sprite_coords: unset_sprite(),
        }
    }

    /// Assigns the colour identifying the tile in map images.
    #[must_use]
    pub fn with_map_color(mut self, color: Rgba8) -> Self {
        self.map_color = Some(color);
        self
    }
}

/// Registry of tile types indexed by [`TileTypeId`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TileDefinitions {
    definitions: Vec<TileDefinition>,
}

impl TileDefinitions {
    /// Creates the registry, assigning identifiers in declaration order.
    #[must_use]
    pub fn new(definitions: Vec<TileDefinition>) -> Self {
        Self { definitions }
    }

    /// Number of registered tile types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Reports whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Looks up a definition by identifier.
    #[must_use]
    pub fn get(&self, id: TileTypeId) -> Option<&TileDefinition> {
        self.definitions.get(usize::from(id.get()))
    }

    /// Resolves a tile name, failing on unknown names.
    pub fn id_of(&self, name: &str) -> Result<TileTypeId, ConfigError> {
        self.definitions
            .iter()
            .position(|definition| definition.name == name)
            .and_then(|index| u16::try_from(index).ok())
            .map(TileTypeId::new)
            .ok_or_else(|| ConfigError::UnknownTileType(name.to_owned()))
    }

    /// Resolves a tile name ignoring ASCII case.
    #[must_use]
    pub fn find_ignore_case(&self, name: &str) -> Option<TileTypeId> {
        self.definitions
            .iter()
            .position(|definition| definition.name.eq_ignore_ascii_case(name))
            .and_then(|index| u16::try_from(index).ok())
            .map(TileTypeId::new)
    }

    /// Finds the first tile whose map colour matches, ignoring alpha.
    #[must_use]
    pub fn by_map_color(&self, color: Rgba8) -> Option<TileTypeId> {
        self.definitions
            .iter()
            .position(|definition| {
                definition
                    .map_color
                    .is_some_and(|candidate| candidate.same_rgb(&color))
            })
            .and_then(|index| u16::try_from(index).ok())
            .map(TileTypeId::new)
    }

    /// Reports whether the tile type is solid. Unknown types are solid.
    #[must_use]
    pub fn is_solid(&self, id: TileTypeId) -> bool {
        self.get(id).map_or(true, |definition| definition.solid)
    }

    /// Reports whether the tile type is water.
    #[must_use]
    pub fn is_water(&self, id: TileTypeId) -> bool {
        self.get(id).is_some_and(|definition| definition.water)
    }
}

/// One random-walk stroke type used by procedural generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WormSpec {
    /// Tile painted by the worm.
    pub tile: String,
    /// Number of worms of this type.
    #[serde(default)]
    pub count: u32,
    /// Steps walked by each worm.
    #[serde(default)]
    pub max_length: u32,
}

/// Enemy counts spawned when a map is created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Population {
    /// Stationary turrets.
    pub scorpio: u32,
    /// Bullet-firing chasers.
    pub leo: u32,
    /// Shielded chasers.
    pub aries: u32,
    /// Shell-firing chasers.
    pub capricorn: u32,
    /// Amphibious chasers.
    pub aquarius: u32,
    /// Laser-linked twin pairs.
    pub gemini_pairs: u32,
}

/// Description of one level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapDefinition {
    /// Unique name referenced by the session.
    pub name: String,
    /// Grid width, ignored for image-driven maps.
    pub width: u32,
    /// Grid height, ignored for image-driven maps.
    pub height: u32,
    /// Path of the image describing the layout.
    pub image: Option<String>,
    /// Tile filling the interior before worms run.
    pub fill_tile: String,
    /// Tile lining the outer edge.
    pub border_tile: String,
    /// Tile sealing unreachable pockets, defaults to the border tile.
    pub wall_fill_tile: Option<String>,
    /// Random-walk strokes, at most four are used.
    pub worms: Vec<WormSpec>,
    /// Tile marking the start.
    pub entry_tile: String,
    /// Tile marking the exit.
    pub exit_tile: String,
    /// Wall tile of the start bunker.
    pub start_bunker_wall: String,
    /// Wall tile of the exit bunker, defaults to the start bunker wall.
    pub end_bunker_wall: Option<String>,
    /// Floor tile of the start bunker.
    pub start_bunker_floor: String,
    /// Floor tile of the exit bunker, defaults to the start bunker floor.
    pub end_bunker_floor: Option<String>,
    /// Side of the start bunker region.
    pub start_area_size: i32,
    /// Side of the exit bunker region.
    pub end_area_size: i32,
    /// Enemies spawned on the map.
    pub population: Population,
}

impl Default for MapDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            width: 25,
            height: 25,
            image: None,
            fill_tile: "Grass".to_owned(),
            border_tile: "BrickWall".to_owned(),
            wall_fill_tile: None,
            worms: Vec::new(),
            entry_tile: "MapEntry".to_owned(),
            exit_tile: "MapExit".to_owned(),
            start_bunker_wall: "BunkerWall".to_owned(),
            end_bunker_wall: None,
            start_bunker_floor: "BunkerFloor".to_owned(),
            end_bunker_floor: None,
            start_area_size: 5,
            end_area_size: 7,
            population: Population::default(),
        }
    }
}

impl MapDefinition {
    /// Tile sealing unreachable pockets.
    #[must_use]
    pub fn wall_fill_tile_name(&self) -> &str {
        self.wall_fill_tile.as_deref().unwrap_or(&self.border_tile)
    }

    /// Wall tile of the exit bunker.
    #[must_use]
    pub fn end_bunker_wall_name(&self) -> &str {
        self.end_bunker_wall
            .as_deref()
            .unwrap_or(&self.start_bunker_wall)
    }

    /// Floor tile of the exit bunker.
    #[must_use]
    pub fn end_bunker_floor_name(&self) -> &str {
        self.end_bunker_floor
            .as_deref()
            .unwrap_or(&self.start_bunker_floor)
    }

    /// Worm strokes honoured by generation.
    #[must_use]
    pub fn worm_specs(&self) -> &[WormSpec] {
        let len = self.worms.len().min(MAX_WORM_TYPES);
        &self.worms[..len]
    }
}

/// Registry of map definitions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MapDefinitions {
    definitions: Vec<MapDefinition>,
}

impl MapDefinitions {
    /// Creates the registry.
    #[must_use]
    pub fn new(definitions: Vec<MapDefinition>) -> Self {
        Self { definitions }
    }

    /// Looks up a definition by name, failing on unknown names.
    pub fn get(&self, name: &str) -> Result<&MapDefinition, ConfigError> {
        self.definitions
            .iter()
            .find(|definition| definition.name == name)
            .ok_or_else(|| ConfigError::UnknownMapDefinition(name.to_owned()))
    }

    /// Iterates over every definition in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &MapDefinition> {
        self.definitions.iter()
    }
}

/// Ordered list of maps played in one session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDefinition {
    /// Map names in play order.
    pub maps: Vec<String>,
    /// Seed for the session random number generator.
    pub seed: u64,
}

/// Decoded RGBA image describing a map layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapImage {
    width: u32,
    height: u32,
    texels: Vec<Rgba8>,
}

impl MapImage {
    /// Wraps row-major RGBA bytes with the top row first.
    ///
    /// Returns `None` when the byte count does not match the dimensions.
    #[must_use]
    pub fn from_rgba(width: u32, height: u32, bytes: &[u8]) -> Option<Self> {
        let expected = usize::try_from(width)
            .ok()?
            .checked_mul(usize::try_from(height).ok()?)?
            .checked_mul(4)?;
        if bytes.len() != expected {
            return None;
        }
        let texels = bytes
            .chunks_exact(4)
            .map(|chunk| Rgba8::new(chunk[0], chunk[1], chunk[2], chunk[3]))
            .collect();
        Some(Self {
            width,
            height,
            texels,
        })
    }

    /// Width of the image in texels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the image in texels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Texel for a tile, reading the image bottom row as tile row zero.
    #[must_use]
    pub fn texel(&self, coord: TileCoord) -> Option<Rgba8> {
        let x = u32::try_from(coord.x()).ok()?;
        let y = u32::try_from(coord.y()).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        let row = self.height - 1 - y;
        let index = usize::try_from(row * self.width + x).ok()?;
        self.texels.get(index).copied()
    }
}
