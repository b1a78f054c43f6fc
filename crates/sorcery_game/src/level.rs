//! Static level layout: a 40x18 tile grid and the platform rectangles
//! derived from it.
//!
//! Platforms are authored in tile units and validated once at load time.
//! After that the level is immutable; collision and rendering both read the
//! base-pixel rectangles produced here.

use glam::Vec2;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const GRID_COLUMNS: u32 = 40;
pub const GRID_ROWS: u32 = 18;
/// Edge length of one tile in base pixels.
pub const TILE_SIZE: u32 = 8;
pub const GAME_AREA_WIDTH: f32 = (GRID_COLUMNS * TILE_SIZE) as f32;
pub const GAME_AREA_HEIGHT: f32 = (GRID_ROWS * TILE_SIZE) as f32;

const SUPPORTED_VERSION: &str = "0.1";
const BUILTIN_LEVEL: &str = include_str!("../../../assets/levels/woods.json");

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse level JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported level version '{0}'")]
    UnsupportedVersion(String),
    #[error("platform {index} has an empty span ({width}x{height} tiles)")]
    EmptyPlatform { index: usize, width: i32, height: i32 },
    #[error("platform {index} at tile ({col}, {row}) sized {width}x{height} leaves the tile grid")]
    OutOfBounds {
        index: usize,
        col: i32,
        row: i32,
        width: i32,
        height: i32,
    },
    #[error("platforms {first} and {second} overlap")]
    Overlap { first: usize, second: usize },
    #[error("spawn point ({x}, {y}) puts the player outside the game area")]
    SpawnOutOfBounds { x: f32, y: f32 },
    #[error("spawn point ({x}, {y}) puts the player inside platform {platform}")]
    SpawnBlocked { x: f32, y: f32, platform: usize },
}

#[derive(Debug, Deserialize, Clone)]
pub struct LevelFile {
    pub version: String,
    pub level_id: String,
    pub location: String,
    pub spawn: SpawnPoint,
    pub platforms: Vec<PlatformDef>,
}

/// Feet position of the player at startup, in base pixels.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct SpawnPoint {
    pub x: f32,
    pub y: f32,
}

/// Tile coordinates are signed so that negative values surface as
/// out-of-bounds errors instead of parse failures.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct PlatformDef {
    pub col: i32,
    pub row: i32,
    pub width: i32,
    #[serde(default = "default_platform_height")]
    pub height: i32,
    #[serde(default = "default_platform_color")]
    pub color: [u8; 3],
}

/// Axis-aligned rectangle in base pixels, y down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            right: left + width,
            bottom: top + height,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Interior overlap; rectangles that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.right <= self.right
            && other.top >= self.top
            && other.bottom <= self.bottom
    }

    /// `[left, top, width, height]`, the shape `QuadSpec::solid` takes.
    pub fn to_quad(&self) -> [f32; 4] {
        [self.left, self.top, self.width(), self.height()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub col: u32,
    pub row: u32,
    pub width: u32,
    pub height: u32,
}

impl TileRect {
    fn from_def(index: usize, def: &PlatformDef) -> Result<Self, LevelError> {
        if def.width <= 0 || def.height <= 0 {
            return Err(LevelError::EmptyPlatform {
                index,
                width: def.width,
                height: def.height,
            });
        }
        let fits = def.col >= 0
            && def.row >= 0
            && i64::from(def.col) + i64::from(def.width) <= i64::from(GRID_COLUMNS)
            && i64::from(def.row) + i64::from(def.height) <= i64::from(GRID_ROWS);
        if !fits {
            return Err(LevelError::OutOfBounds {
                index,
                col: def.col,
                row: def.row,
                width: def.width,
                height: def.height,
            });
        }
        Ok(Self {
            col: def.col as u32,
            row: def.row as u32,
            width: def.width as u32,
            height: def.height as u32,
        })
    }

    pub fn overlaps(&self, other: &TileRect) -> bool {
        self.col < other.col + other.width
            && other.col < self.col + self.width
            && self.row < other.row + other.height
            && other.row < self.row + self.height
    }

    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.row..self.row + self.height)
            .flat_map(move |row| (self.col..self.col + self.width).map(move |col| (col, row)))
    }

    pub fn to_rect(&self) -> Rect {
        let size = TILE_SIZE as f32;
        Rect::new(
            self.col as f32 * size,
            self.row as f32 * size,
            self.width as f32 * size,
            self.height as f32 * size,
        )
    }
}

/// Solid/empty flags for every cell, row-major.
#[derive(Debug, Clone)]
pub struct TileGrid {
    solid: Vec<bool>,
}

impl TileGrid {
    pub fn empty() -> Self {
        Self {
            solid: vec![false; (GRID_COLUMNS * GRID_ROWS) as usize],
        }
    }

    /// Cells outside the grid read as empty.
    #[allow(dead_code)]
    pub fn is_solid(&self, col: i32, row: i32) -> bool {
        if col < 0 || row < 0 || col >= GRID_COLUMNS as i32 || row >= GRID_ROWS as i32 {
            return false;
        }
        self.solid[row as usize * GRID_COLUMNS as usize + col as usize]
    }

    pub fn solid_count(&self) -> usize {
        self.solid.iter().filter(|s| **s).count()
    }

    pub fn solid_cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.solid
            .iter()
            .enumerate()
            .filter(|(_, s)| **s)
            .map(|(i, _)| (i as u32 % GRID_COLUMNS, i as u32 / GRID_COLUMNS))
    }

    fn fill(&mut self, rect: &TileRect) {
        for (col, row) in rect.cells() {
            self.solid[(row * GRID_COLUMNS + col) as usize] = true;
        }
    }
}

#[derive(Debug, Clone)]
pub struct Platform {
    pub rect: Rect,
    pub color: [u8; 3],
}

#[derive(Debug, Clone)]
pub struct Level {
    pub location: String,
    pub spawn: Vec2,
    pub grid: TileGrid,
    pub platforms: Vec<Platform>,
}

impl Level {
    /// The single screen compiled into the binary.
    pub fn builtin() -> Result<Self, LevelError> {
        Self::from_json(BUILTIN_LEVEL)
    }

    pub fn load(path: &Path) -> Result<Self, LevelError> {
        let raw = fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, LevelError> {
        let file: LevelFile = serde_json::from_str(raw)?;
        Self::from_file(file)
    }

    pub fn from_file(file: LevelFile) -> Result<Self, LevelError> {
        if file.version != SUPPORTED_VERSION {
            return Err(LevelError::UnsupportedVersion(file.version));
        }

        let mut tiles: Vec<TileRect> = Vec::with_capacity(file.platforms.len());
        for (index, def) in file.platforms.iter().enumerate() {
            let rect = TileRect::from_def(index, def)?;
            if let Some(first) = tiles.iter().position(|other| other.overlaps(&rect)) {
                return Err(LevelError::Overlap {
                    first,
                    second: index,
                });
            }
            tiles.push(rect);
        }

        let mut grid = TileGrid::empty();
        let platforms = tiles
            .into_iter()
            .zip(&file.platforms)
            .map(|(tiles, def)| {
                grid.fill(&tiles);
                Platform {
                    rect: tiles.to_rect(),
                    color: def.color,
                }
            })
            .collect::<Vec<_>>();

        log::info!(
            "Level '{}' built: {} platforms, {} solid tiles",
            file.level_id,
            platforms.len(),
            grid.solid_count()
        );

        Ok(Self {
            location: file.location,
            spawn: Vec2::new(file.spawn.x, file.spawn.y),
            grid,
            platforms,
        })
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, GAME_AREA_WIDTH, GAME_AREA_HEIGHT)
    }

    /// Check that a hitbox placed at the spawn point starts inside the game
    /// area and clear of every platform.
    pub fn validate_spawn(&self, hitbox: &Rect) -> Result<(), LevelError> {
        let (x, y) = (self.spawn.x, self.spawn.y);
        if !self.bounds().contains_rect(hitbox) {
            return Err(LevelError::SpawnOutOfBounds { x, y });
        }
        if let Some(platform) = self.platforms.iter().position(|p| p.rect.overlaps(hitbox)) {
            return Err(LevelError::SpawnBlocked { x, y, platform });
        }
        Ok(())
    }
}

const fn default_platform_height() -> i32 {
    1
}

const fn default_platform_color() -> [u8; 3] {
    [255, 255, 255]
}
