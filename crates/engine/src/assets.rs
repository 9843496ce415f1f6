use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::ImageReader;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::app::rendering::{placeholder_tile_set, MapRenderData};
use crate::asset_names::{validate_asset_name, AssetNameError};
use crate::base::{Color, Image, Vector, TILE_SIZE_PX};
use crate::world::{
    BackdropScrollMode, BackdropSwitchCondition, Map, MapError, TileAttributeDict,
    TileAttributes, TileIndex,
};

const BACKDROP_WIDTH_PX: u32 = 320;
const BACKDROP_HEIGHT_PX: u32 = 200;
/// Animated tiles cycle through four consecutive tile set entries.
const ANIMATION_TILE_SPAN: usize = 4;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path} at {location}: {message}")]
    Json {
        path: PathBuf,
        location: String,
        message: String,
    },
    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("invalid asset name '{name}': {source}")]
    InvalidName {
        name: String,
        #[source]
        source: AssetNameError,
    },
    #[error("unknown actor '{0}'")]
    UnknownActor(String),
    #[error("actor '{actor}' frame {frame} has a non-positive size")]
    InvalidFrameSize { actor: String, frame: usize },
    #[error("level '{level}' row {row} of layer {layer} has {actual} cells, expected {expected}")]
    RowLength {
        level: String,
        layer: usize,
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("level '{level}' uses tile symbol '{symbol}' missing from its legend")]
    UnknownTileSymbol { level: String, symbol: char },
    #[error("level '{level}' map is invalid: {source}")]
    Map {
        level: String,
        #[source]
        source: MapError,
    },
}

/// Source of decoded actor and level data.
pub trait AssetProvider {
    fn load_actor(&self, id: &str) -> Result<ActorData, AssetError>;
    fn load_level(&self, name: &str) -> Result<LevelData, AssetError>;
}

#[derive(Debug, Clone)]
pub struct ActorFrameData {
    pub image: Image,
    pub draw_offset: Vector,
}

#[derive(Debug, Clone)]
pub struct ActorData {
    pub id: String,
    pub draw_order: i32,
    pub frames: Vec<ActorFrameData>,
    pub orientation_offset: Option<i32>,
    pub virtual_to_real_frame_map: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelActor {
    pub kind: String,
    pub position: Vector,
}

#[derive(Debug, Clone)]
pub struct LevelData {
    pub name: String,
    pub map: Map,
    pub actors: Vec<LevelActor>,
    pub render_data: MapRenderData,
    pub music: Option<String>,
    pub earthquake: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ActorCatalogFile {
    actors: Vec<ActorDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ActorDefinition {
    id: String,
    #[serde(default)]
    draw_order: i32,
    #[serde(default)]
    orientation_offset: Option<i32>,
    #[serde(default)]
    virtual_to_real_frame_map: Vec<i32>,
    frames: Vec<FrameDefinition>,
}

/// One frame, or `count` identical frames when the actor's frames share a
/// size.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct FrameDefinition {
    /// Size in tiles.
    size: [i32; 2],
    #[serde(default)]
    offset: [i32; 2],
    #[serde(default = "default_frame_count")]
    count: usize,
    #[serde(default)]
    color: Option<[u8; 3]>,
}

fn default_frame_count() -> usize {
    1
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct LevelFile {
    width: i32,
    height: i32,
    tile_attributes: Vec<Vec<String>>,
    legend: BTreeMap<char, TileIndex>,
    background: Vec<String>,
    #[serde(default)]
    foreground: Vec<String>,
    #[serde(default)]
    actors: Vec<LevelActorDefinition>,
    #[serde(default)]
    tile_set: Option<String>,
    #[serde(default)]
    backdrop: Option<String>,
    #[serde(default)]
    secondary_backdrop: Option<String>,
    #[serde(default)]
    backdrop_scroll_mode: BackdropScrollMode,
    #[serde(default)]
    backdrop_switch_condition: BackdropSwitchCondition,
    #[serde(default)]
    music: Option<String>,
    #[serde(default)]
    earthquake: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct LevelActorDefinition {
    kind: String,
    x: i32,
    y: i32,
}

/// Reads `actors.json`, `levels/<name>.json` and `images/<name>.png` below
/// an asset directory. Images that are missing are replaced by generated
/// placeholders; the first miss per asset is logged.
#[derive(Debug)]
pub struct FileAssetProvider {
    root: PathBuf,
    actors: HashMap<String, ActorDefinition>,
    warned_missing_images: RefCell<HashSet<String>>,
}

impl FileAssetProvider {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, AssetError> {
        let root = root.into();
        let catalog_path = root.join("actors.json");
        let text = read_text(&catalog_path)?;
        Self::from_actor_catalog(root, &catalog_path, &text)
    }

    /// Builds a provider from an already loaded actor catalog. `source` is
    /// only used in error messages.
    pub fn from_actor_catalog(
        root: impl Into<PathBuf>,
        source: &Path,
        catalog_json: &str,
    ) -> Result<Self, AssetError> {
        let catalog: ActorCatalogFile = parse_json(source, catalog_json)?;
        let mut actors = HashMap::with_capacity(catalog.actors.len());
        for definition in catalog.actors {
            check_name(&definition.id)?;
            for (frame, frame_definition) in definition.frames.iter().enumerate() {
                if frame_definition.size[0] <= 0 || frame_definition.size[1] <= 0 {
                    return Err(AssetError::InvalidFrameSize {
                        actor: definition.id.clone(),
                        frame,
                    });
                }
            }
            actors.insert(definition.id.clone(), definition);
        }
        debug!(actor_count = actors.len(), "actor_catalog_loaded");
        Ok(Self {
            root: root.into(),
            actors,
            warned_missing_images: RefCell::new(HashSet::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn actor_ids(&self) -> impl Iterator<Item = &str> {
        self.actors.keys().map(String::as_str)
    }

    /// Parses level JSON that was read elsewhere.
    pub fn level_from_json(&self, name: &str, level_json: &str) -> Result<LevelData, AssetError> {
        check_name(name)?;
        let path = self.level_path(name);
        let file: LevelFile = parse_json(&path, level_json)?;
        self.build_level(name, file)
    }

    fn level_path(&self, name: &str) -> PathBuf {
        self.root.join("levels").join(format!("{name}.json"))
    }

    fn build_level(&self, name: &str, file: LevelFile) -> Result<LevelData, AssetError> {
        let attributes = file
            .tile_attributes
            .iter()
            .map(|names| TileAttributes::from_names(names.iter().map(String::as_str)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| AssetError::Map {
                level: name.to_string(),
                source,
            })?;
        let tile_count = attributes.len();

        let background = decode_layer(name, 0, &file, &file.background)?;
        let foreground = if file.foreground.is_empty() {
            vec![0; background.len()]
        } else {
            decode_layer(name, 1, &file, &file.foreground)?
        };

        let map = Map::from_layers(
            file.width,
            file.height,
            [background, foreground],
            TileAttributeDict::new(attributes),
        )
        .map_err(|source| AssetError::Map {
            level: name.to_string(),
            source,
        })?
        .with_backdrop_modes(file.backdrop_scroll_mode, file.backdrop_switch_condition);

        let tile_set = match &file.tile_set {
            Some(key) => self.load_image_or(key, || {
                placeholder_tile_set(tile_count + ANIMATION_TILE_SPAN)
            })?,
            None => placeholder_tile_set(tile_count + ANIMATION_TILE_SPAN),
        };
        let backdrop = match &file.backdrop {
            Some(key) => self.load_image_or(key, || placeholder_backdrop(key))?,
            None => placeholder_backdrop(name),
        };
        let secondary_backdrop = file
            .secondary_backdrop
            .as_ref()
            .map(|key| self.load_image_or(key, || placeholder_backdrop(key)))
            .transpose()?;

        let actors = file
            .actors
            .iter()
            .map(|actor| LevelActor {
                kind: actor.kind.clone(),
                position: Vector::new(actor.x, actor.y),
            })
            .collect();

        Ok(LevelData {
            name: name.to_string(),
            map,
            actors,
            render_data: MapRenderData {
                tile_set,
                backdrop,
                secondary_backdrop,
                backdrop_scroll_mode: file.backdrop_scroll_mode,
            },
            music: file.music,
            earthquake: file.earthquake,
        })
    }

    fn load_image_or(
        &self,
        key: &str,
        placeholder: impl FnOnce() -> Image,
    ) -> Result<Image, AssetError> {
        self.load_image_or_warn_as(key, key, placeholder)
    }

    /// Missing images are reported under `warn_key`, so all frames of one
    /// actor share a single warning.
    fn load_image_or_warn_as(
        &self,
        key: &str,
        warn_key: &str,
        placeholder: impl FnOnce() -> Image,
    ) -> Result<Image, AssetError> {
        check_name(key)?;
        let path = self.root.join("images").join(format!("{key}.png"));
        if !path.is_file() {
            self.warn_missing_image_once(warn_key, &path);
            return Ok(placeholder());
        }
        load_png(&path)
    }

    fn warn_missing_image_once(&self, key: &str, path: &Path) {
        if !self.warned_missing_images.borrow_mut().insert(key.to_string()) {
            return;
        }
        warn!(
            asset = key,
            path = %path.display(),
            "asset_image_missing_using_placeholder"
        );
    }
}

impl AssetProvider for FileAssetProvider {
    fn load_actor(&self, id: &str) -> Result<ActorData, AssetError> {
        let definition = self
            .actors
            .get(id)
            .ok_or_else(|| AssetError::UnknownActor(id.to_string()))?;

        let warn_key = format!("actors/{id}");
        let mut frames = Vec::new();
        for frame_definition in &definition.frames {
            for _ in 0..frame_definition.count {
                let index = frames.len();
                let key = format!("actors/{id}/{index}");
                let [width, height] = frame_definition.size;
                let color = frame_definition
                    .color
                    .map(|[r, g, b]| Color::rgb(r, g, b))
                    .unwrap_or_else(|| color_for_name(id));
                let image = self.load_image_or_warn_as(&key, &warn_key, || {
                    placeholder_frame(width, height, color)
                })?;
                frames.push(ActorFrameData {
                    image,
                    draw_offset: Vector::new(frame_definition.offset[0], frame_definition.offset[1]),
                });
            }
        }

        Ok(ActorData {
            id: definition.id.clone(),
            draw_order: definition.draw_order,
            frames,
            orientation_offset: definition.orientation_offset,
            virtual_to_real_frame_map: definition.virtual_to_real_frame_map.clone(),
        })
    }

    fn load_level(&self, name: &str) -> Result<LevelData, AssetError> {
        check_name(name)?;
        let path = self.level_path(name);
        let text = read_text(&path)?;
        let file: LevelFile = parse_json(&path, &text)?;
        self.build_level(name, file)
    }
}

fn decode_layer(
    level: &str,
    layer: usize,
    file: &LevelFile,
    rows: &[String],
) -> Result<Vec<TileIndex>, AssetError> {
    let width = file.width.max(0) as usize;
    let height = file.height.max(0) as usize;
    if rows.len() != height {
        return Err(AssetError::Map {
            level: level.to_string(),
            source: MapError::TileCountMismatch {
                layer,
                expected: width * height,
                actual: rows.iter().map(|row| row.chars().count()).sum(),
            },
        });
    }

    let mut tiles = Vec::with_capacity(width * height);
    for (row_index, row) in rows.iter().enumerate() {
        let length = row.chars().count();
        if length != width {
            return Err(AssetError::RowLength {
                level: level.to_string(),
                layer,
                row: row_index,
                expected: width,
                actual: length,
            });
        }
        for symbol in row.chars() {
            let tile = file
                .legend
                .get(&symbol)
                .copied()
                .ok_or_else(|| AssetError::UnknownTileSymbol {
                    level: level.to_string(),
                    symbol,
                })?;
            tiles.push(tile);
        }
    }
    Ok(tiles)
}

fn check_name(name: &str) -> Result<(), AssetError> {
    validate_asset_name(name).map_err(|source| AssetError::InvalidName {
        name: name.to_string(),
        source,
    })
}

fn read_text(path: &Path) -> Result<String, AssetError> {
    fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_json<T: DeserializeOwned>(path: &Path, text: &str) -> Result<T, AssetError> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let location = error.path().to_string();
        AssetError::Json {
            path: path.to_path_buf(),
            location,
            message: error.into_inner().to_string(),
        }
    })
}

fn load_png(path: &Path) -> Result<Image, AssetError> {
    let reader = ImageReader::open(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = reader.decode().map_err(|source| AssetError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    let pixels = rgba
        .pixels()
        .map(|pixel| Color::rgba(pixel[0], pixel[1], pixel[2], pixel[3]))
        .collect();
    Ok(Image::new(width, height, pixels))
}

fn color_for_name(name: &str) -> Color {
    let hash = name
        .bytes()
        .fold(0x811c_9dc5u32, |hash, byte| (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193));
    Color::rgb(
        96 + (hash & 0x7f) as u8,
        96 + ((hash >> 8) & 0x7f) as u8,
        96 + ((hash >> 16) & 0x7f) as u8,
    )
}

/// Filled box with a dark outline, `width` x `height` tiles.
fn placeholder_frame(width: i32, height: i32, color: Color) -> Image {
    let width_px = (width * TILE_SIZE_PX) as u32;
    let height_px = (height * TILE_SIZE_PX) as u32;
    let outline = Color::rgb(color.r / 3, color.g / 3, color.b / 3);
    let mut image = Image::filled(width_px, height_px, color);
    for x in 0..width_px {
        image.set_pixel(x, 0, outline);
        image.set_pixel(x, height_px - 1, outline);
    }
    for y in 0..height_px {
        image.set_pixel(0, y, outline);
        image.set_pixel(width_px - 1, y, outline);
    }
    image
}

fn placeholder_backdrop(name: &str) -> Image {
    let base = color_for_name(name);
    let mut image = Image::filled(BACKDROP_WIDTH_PX, BACKDROP_HEIGHT_PX, Color::BLACK);
    for y in 0..BACKDROP_HEIGHT_PX {
        let shade = (y * 160 / BACKDROP_HEIGHT_PX) as u16;
        let scale = |channel: u8| ((u16::from(channel) * (40 + shade)) / 200) as u8;
        let color = Color::rgb(scale(base.r), scale(base.g), scale(base.b));
        for x in 0..BACKDROP_WIDTH_PX {
            image.set_pixel(x, y, color);
        }
    }
    image
}
