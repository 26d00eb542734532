//! Tile maps parsed from character grids
//!
//! A map file is plain text, one row per line, one cell per character. The
//! legend decides what each character means; collision only ever looks at
//! the unscaled cell rectangle of Wall and Target cells.

use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::rect::Rect;

/// Map loading errors
#[derive(Error, Debug)]
pub enum GridError {
    #[error("could not read map {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("map has no rows")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Wall tile artwork, chosen by neighbourhood in the tile-shape legend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileShape {
    Fill,
    TopLeftCorner,
    TopEdge,
    TopRightCorner,
    LeftEdge,
    RightEdge,
    BottomLeftCorner,
    BottomEdge,
    BottomRightCorner,
    BottomLeftBit,
    BottomRightBit,
    TopLeftBit,
    TopRightBit,
}

/// Non-solid artwork
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sprite {
    Floor,
    Sun,
    Tree,
    Rock,
    Cloud,
    Flower,
}

/// One map cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    Wall(TileShape),
    Target,
    /// Drawn at `scale` times the tile size, never collides
    Decoration { sprite: Sprite, scale: u8 },
}

impl Cell {
    /// Participates in collision (walls block, targets trigger)
    #[inline]
    pub fn is_solid(&self) -> bool {
        matches!(self, Cell::Wall(_) | Cell::Target)
    }

    /// Free for spawning
    #[inline]
    pub fn is_available(&self) -> bool {
        !self.is_solid()
    }

    pub fn render_scale(&self) -> f32 {
        match self {
            Cell::Decoration { scale, .. } => *scale as f32,
            _ => 1.0,
        }
    }
}

/// Character-to-cell mapping used by a map file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Legend {
    /// `#` wall, `o` target
    Simple,
    /// Wall shapes `/ . \ [ ] : _ ; L J ' + #`, `-` floor
    Tiles,
    /// `#` ground plus decorative scenery
    Parallax,
}

impl Legend {
    pub fn cell(&self, ch: char) -> Cell {
        match self {
            Legend::Simple => match ch {
                '#' => Cell::Wall(TileShape::Fill),
                'o' => Cell::Target,
                _ => Cell::Empty,
            },
            Legend::Tiles => match ch {
                '/' => Cell::Wall(TileShape::TopLeftCorner),
                '.' => Cell::Wall(TileShape::TopEdge),
                '\\' => Cell::Wall(TileShape::TopRightCorner),
                '[' => Cell::Wall(TileShape::LeftEdge),
                ']' => Cell::Wall(TileShape::RightEdge),
                ':' => Cell::Wall(TileShape::BottomLeftCorner),
                '_' => Cell::Wall(TileShape::BottomEdge),
                ';' => Cell::Wall(TileShape::BottomRightCorner),
                'L' => Cell::Wall(TileShape::BottomLeftBit),
                'J' => Cell::Wall(TileShape::BottomRightBit),
                '\'' => Cell::Wall(TileShape::TopLeftBit),
                '+' => Cell::Wall(TileShape::TopRightBit),
                '#' => Cell::Wall(TileShape::Fill),
                '-' => Cell::Decoration {
                    sprite: Sprite::Floor,
                    scale: 1,
                },
                _ => Cell::Empty,
            },
            Legend::Parallax => {
                let deco = |sprite, scale| Cell::Decoration { sprite, scale };
                match ch {
                    '#' => Cell::Wall(TileShape::Fill),
                    's' => deco(Sprite::Sun, 1),
                    't' => deco(Sprite::Tree, 1),
                    'T' => deco(Sprite::Tree, 2),
                    'o' => deco(Sprite::Rock, 1),
                    'O' => deco(Sprite::Rock, 2),
                    'c' => deco(Sprite::Cloud, 1),
                    'f' => deco(Sprite::Flower, 2),
                    _ => Cell::Empty,
                }
            }
        }
    }
}

/// A solid cell with its collision rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolidCell {
    pub row: usize,
    pub col: usize,
    pub rect: Rect,
    pub is_target: bool,
}

/// Static tile map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    /// Row-major, `cells[row][col]`
    cells: Vec<Vec<Cell>>,
    tile_size: f32,
    width: usize,
    height: usize,
}

impl TileGrid {
    /// Parse a character grid. Width is the length of the first row and
    /// every row must match it; a trailing blank line is ignored.
    pub fn parse(text: &str, legend: Legend, tile_size: f32) -> Result<Self, GridError> {
        let mut lines: Vec<&str> = text.lines().collect();
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        let first = lines.first().ok_or(GridError::Empty)?;
        let width = first.chars().count();
        if width == 0 {
            return Err(GridError::Empty);
        }

        let mut cells = Vec::with_capacity(lines.len());
        for (row, line) in lines.iter().enumerate() {
            let parsed: Vec<Cell> = line.chars().map(|ch| legend.cell(ch)).collect();
            if parsed.len() != width {
                return Err(GridError::Ragged {
                    row,
                    expected: width,
                    found: parsed.len(),
                });
            }
            cells.push(parsed);
        }

        let height = cells.len();
        Ok(Self {
            cells,
            tile_size,
            width,
            height,
        })
    }

    /// Read and parse a map file
    pub fn load(path: impl AsRef<Path>, legend: Legend, tile_size: f32) -> Result<Self, GridError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| {
            log::error!("Failed to read map {}: {}", path.display(), source);
            GridError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let grid = Self::parse(&text, legend, tile_size)?;
        log::info!(
            "Loaded map {} ({}x{}, tile {})",
            path.display(),
            grid.width,
            grid.height,
            tile_size
        );
        Ok(grid)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// World extent in pixels
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(
            self.width as f32 * self.tile_size,
            self.height as f32 * self.tile_size,
        )
    }

    pub fn world_rect(&self) -> Rect {
        Rect::from_min_size(Vec2::ZERO, self.world_size())
    }

    /// Cell at (row, col); out-of-range reads as Empty
    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.cells
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(Cell::Empty)
    }

    /// Unscaled world rectangle of a cell
    pub fn cell_rect(&self, row: usize, col: usize) -> Rect {
        Rect::new(
            col as f32 * self.tile_size,
            row as f32 * self.tile_size,
            self.tile_size,
            self.tile_size,
        )
    }

    /// Cell rectangle scaled for drawing
    pub fn render_rect(&self, row: usize, col: usize) -> Rect {
        self.cell_rect(row, col).scaled(self.cell(row, col).render_scale())
    }

    /// All Wall and Target cells in row-major order
    pub fn solid_cells(&self) -> impl Iterator<Item = SolidCell> + '_ {
        self.cells.iter().enumerate().flat_map(move |(row, cells)| {
            cells.iter().enumerate().filter_map(move |(col, cell)| {
                cell.is_solid().then(|| SolidCell {
                    row,
                    col,
                    rect: self.cell_rect(row, col),
                    is_target: *cell == Cell::Target,
                })
            })
        })
    }

    /// First Target cell in row-major order
    pub fn target_cell(&self) -> Option<SolidCell> {
        self.solid_cells().find(|c| c.is_target)
    }

    /// Spawn availability, `[row][col]`
    pub fn availability(&self) -> Vec<Vec<bool>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(Cell::is_available).collect())
            .collect()
    }

    /// Smallest whole tile size at which the map still covers the viewport
    pub fn min_tile_size_for(&self, viewport: Vec2) -> f32 {
        let w = (viewport.x / self.width as f32).ceil();
        let h = (viewport.y / self.height as f32).ceil();
        w.max(h)
    }

    /// Change the tile size, snapping up to the covering minimum
    pub fn set_tile_size(&mut self, tile_size: f32, viewport: Vec2) {
        self.tile_size = tile_size.max(self.min_tile_size_for(viewport));
    }
}
