//! Definitions file loading.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tile_tanks_core::{
    MapDefinition, MapDefinitions, MapImage, SessionDefinition, TileDefinition, TileDefinitions,
    Tunables,
};
use tile_tanks_system_stepper::SessionAssets;

/// Everything the headless runner needs to start a session.
#[derive(Debug)]
pub(crate) struct Definitions {
    /// Tiles, maps, decoded images and tunables.
    pub(crate) assets: SessionAssets,
    /// Map order and seed.
    pub(crate) session: SessionDefinition,
}

impl Definitions {
    /// Loads the definitions file and every map image it references.
    ///
    /// Image paths are resolved relative to the file's directory.
    pub(crate) fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_path_with_loader(path, default_loader)
    }

    fn from_path_with_loader(
        path: impl AsRef<Path>,
        loader: impl FnMut(&Path) -> Result<MapImage>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read definitions at {}", path.display()))?;
        let base = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        parse_definitions(&contents, &base, loader)
    }
}

#[derive(Debug, Deserialize)]
struct DefinitionsFile {
    #[serde(default)]
    tiles: Vec<TileDefinition>,
    #[serde(default)]
    maps: Vec<MapDefinition>,
    #[serde(default)]
    session: SessionDefinition,
    #[serde(default)]
    tunables: Tunables,
}

fn parse_definitions(
    contents: &str,
    base_path: &Path,
    mut loader: impl FnMut(&Path) -> Result<MapImage>,
) -> Result<Definitions> {
    let file: DefinitionsFile =
        toml::from_str(contents).context("failed to parse definitions toml contents")?;

    if file.tiles.is_empty() {
        bail!("definitions list no tiles");
    }
    ensure_unique("tile", file.tiles.iter().map(|tile| tile.name.as_str()))?;
    ensure_unique("map", file.maps.iter().map(|map| map.name.as_str()))?;

    let mut images = BTreeMap::new();
    for map in &file.maps {
        let Some(relative) = &map.image else {
            continue;
        };
        let path = base_path.join(relative);
        let image = loader(&path).with_context(|| {
            format!("failed to load image for map `{}` from {}", map.name, path.display())
        })?;
        let _ = images.insert(map.name.clone(), image);
    }

    Ok(Definitions {
        assets: SessionAssets {
            tiles: Arc::new(TileDefinitions::new(file.tiles)),
            maps: MapDefinitions::new(file.maps),
            images,
            tunables: file.tunables,
        },
        session: file.session,
    })
}

fn ensure_unique<'a>(what: &str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            bail!("duplicate {what} definition `{name}`");
        }
    }
    Ok(())
}

fn default_loader(path: &Path) -> Result<MapImage> {
    let decoded = image::open(path)
        .with_context(|| format!("failed to decode image at {}", path.display()))?
        .to_rgba8();
    MapImage::from_rgba(decoded.width(), decoded.height(), decoded.as_raw())
        .with_context(|| format!("image at {} has an unexpected layout", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    const MINIMAL: &str = r#"
        [[tiles]]
        name = "Grass"

        [[tiles]]
        name = "BrickWall"
        solid = true
        map_color = { r = 0, g = 0, b = 0 }

        [[maps]]
        name = "meadow"
        width = 15
        height = 15

        [[maps]]
        name = "fort"
        image = "maps/fort.png"

        [session]
        maps = ["meadow", "fort"]
        seed = 9

        [tunables]
        "leo.sight_range" = 6.5
    "#;

    fn blank_image(_: &Path) -> Result<MapImage> {
        MapImage::from_rgba(2, 2, &[0; 16]).context("blank image")
    }

    #[test]
    fn parse_definitions_reads_every_section() {
        let definitions =
            parse_definitions(MINIMAL, Path::new("data"), blank_image).expect("definitions parse");

        assert_eq!(definitions.assets.tiles.len(), 2);
        assert!(definitions.assets.tiles.is_solid(
            definitions
                .assets
                .tiles
                .id_of("BrickWall")
                .expect("wall defined")
        ));
        assert_eq!(
            definitions.assets.maps.get("meadow").expect("meadow").width,
            15
        );
        assert_eq!(definitions.session.maps, vec!["meadow", "fort"]);
        assert_eq!(definitions.session.seed, 9);
        assert_eq!(definitions.assets.tunables.value("leo.sight_range", 5.0), 6.5);
    }

    #[test]
    fn map_images_resolve_relative_to_the_file() {
        let requested = RefCell::new(Vec::new());

        let definitions = parse_definitions(MINIMAL, Path::new("data"), |path: &Path| {
            requested.borrow_mut().push(path.to_path_buf());
            blank_image(path)
        })
        .expect("definitions parse");

        assert_eq!(
            requested.into_inner(),
            vec![PathBuf::from("data").join("maps/fort.png")]
        );
        assert!(definitions.assets.images.contains_key("fort"));
        assert!(!definitions.assets.images.contains_key("meadow"));
    }

    #[test]
    fn parse_definitions_rejects_duplicate_tiles() {
        let contents = r#"
            [[tiles]]
            name = "Grass"

            [[tiles]]
            name = "Grass"
        "#;

        let error = parse_definitions(contents, Path::new("."), blank_image)
            .expect_err("duplicates rejected");

        assert!(error.to_string().contains("duplicate tile definition `Grass`"));
    }

    #[test]
    fn failed_image_loads_name_the_map() {
        let error = parse_definitions(MINIMAL, Path::new("data"), |_: &Path| {
            bail!("missing file")
        })
        .expect_err("loader failure propagates");

        assert!(error.to_string().contains("map `fort`"));
    }

    #[test]
    fn shipped_definitions_parse() {
        let contents = include_str!("../../../data/definitions.toml");

        let definitions =
            parse_definitions(contents, Path::new("data"), blank_image).expect("shipped file parses");

        assert!(!definitions.session.maps.is_empty());
        for name in &definitions.session.maps {
            assert!(definitions.assets.maps.get(name).is_ok());
        }
    }
}
