//! Tile maps: a grid of cells with three tile layers each

use super::{BitmapId, ResourceCache, ResourceError};
use crate::graphics::{Blit, Surface};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

/// Number of tile layers in every cell (background, center, foreground)
pub const LAYER_COUNT: usize = 3;

/// Errors raised while loading or editing a map
#[derive(Debug, Error)]
pub enum MapError {
    #[error("invalid map JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("map has {found} cells, expected {expected}")]
    CellCount { expected: usize, found: usize },
    #[error("map dimensions must be positive")]
    EmptyMap,
    #[error("no such map layer {0}")]
    Layer(usize),
    #[error("cell ({row}, {col}) is outside the map")]
    OutOfBounds { row: i64, col: i64 },
    #[error("no such tile set {0}")]
    TileSet(i32),
    #[error("failed to load tile set: {0}")]
    Resource(#[from] ResourceError),
}

/// Reference to one tile: tile set index and tile index within the set
///
/// A negative set index marks an empty layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRef {
    pub si: i32,
    pub ti: i32,
}

impl Default for TileRef {
    fn default() -> Self {
        Self { si: -1, ti: 0 }
    }
}

/// One grid cell
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapCell {
    #[serde(default)]
    pub tiles: [TileRef; LAYER_COUNT],
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub barrier: bool,
}

/// Map data as stored in a map resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileMap {
    pub rows: usize,
    pub cols: usize,
    pub tile_width: i32,
    pub tile_height: i32,
    /// Bitmap paths, indexed by a tile's set index
    #[serde(default)]
    pub tilesets: Vec<String>,
    /// Row-major cells; an empty list means every cell is blank
    #[serde(default)]
    pub cells: Vec<MapCell>,
}

impl TileMap {
    /// Parse and validate a map
    pub fn parse(text: &str) -> Result<Self, MapError> {
        let mut map: TileMap = serde_json::from_str(text)?;
        if map.rows == 0 || map.cols == 0 || map.tile_width <= 0 || map.tile_height <= 0 {
            return Err(MapError::EmptyMap);
        }

        let expected = map.rows * map.cols;
        if map.cells.is_empty() {
            map.cells = vec![MapCell::default(); expected];
        } else if map.cells.len() != expected {
            return Err(MapError::CellCount {
                expected,
                found: map.cells.len(),
            });
        }

        debug!(
            rows = map.rows,
            cols = map.cols,
            tilesets = map.tilesets.len(),
            "Parsed tile map"
        );
        Ok(map)
    }

    fn index(&self, row: i64, col: i64) -> Result<usize, MapError> {
        if row < 0 || col < 0 || row as usize >= self.rows || col as usize >= self.cols {
            return Err(MapError::OutOfBounds { row, col });
        }
        Ok(row as usize * self.cols + col as usize)
    }

    /// Cell at zero-based `(row, col)`
    pub fn cell(&self, row: i64, col: i64) -> Result<&MapCell, MapError> {
        let index = self.index(row, col)?;
        Ok(&self.cells[index])
    }

    pub fn cell_mut(&mut self, row: i64, col: i64) -> Result<&mut MapCell, MapError> {
        let index = self.index(row, col)?;
        Ok(&mut self.cells[index])
    }

    /// Replace one layer of a cell, validating the set index
    pub fn set_tile(
        &mut self,
        row: i64,
        col: i64,
        layer: usize,
        tile: TileRef,
    ) -> Result<(), MapError> {
        if layer >= LAYER_COUNT {
            return Err(MapError::Layer(layer));
        }
        if tile.si >= self.tilesets.len() as i32 {
            return Err(MapError::TileSet(tile.si));
        }
        self.cell_mut(row, col)?.tiles[layer] = tile;
        Ok(())
    }
}

/// A map whose tile sets have been loaded into the resource cache
#[derive(Debug, Clone)]
pub struct LoadedMap {
    pub map: TileMap,
    tilesets: Vec<BitmapId>,
}

impl LoadedMap {
    /// Parse `text` and load every tile set it references
    pub fn load(text: &str, resources: &mut ResourceCache) -> Result<Self, MapError> {
        let map = TileMap::parse(text)?;
        let tilesets = map
            .tilesets
            .iter()
            .map(|path| resources.load_bitmap(path))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { map, tilesets })
    }

    /// Draw one layer with the map's top-left corner scrolled by `(sx, sy)`
    pub fn render(
        &self,
        surface: &mut Surface,
        resources: &ResourceCache,
        layer: usize,
        sx: i32,
        sy: i32,
    ) -> Result<(), MapError> {
        if layer >= LAYER_COUNT {
            return Err(MapError::Layer(layer));
        }
        let (tw, th) = (self.map.tile_width, self.map.tile_height);
        let mut drawn = 0usize;

        for (index, cell) in self.map.cells.iter().enumerate() {
            let tile = cell.tiles[layer];
            if tile.si < 0 || tile.ti < 0 {
                continue;
            }
            let Some(&bitmap_id) = self.tilesets.get(tile.si as usize) else {
                continue;
            };
            let Some(bitmap) = resources.bitmap(bitmap_id) else {
                continue;
            };

            let row = (index / self.map.cols) as i32;
            let col = (index % self.map.cols) as i32;
            let dx = col * tw - sx;
            let dy = row * th - sy;
            if dx + tw <= 0 || dy + th <= 0 || dx >= surface.width() || dy >= surface.height() {
                continue;
            }

            let per_row = (bitmap.width() / tw).max(1);
            surface.blit(Blit {
                bitmap: bitmap_id,
                dx,
                dy,
                sx: (tile.ti % per_row) * tw,
                sy: (tile.ti / per_row) * th,
                w: tw,
                h: th,
                mask: bitmap.mask,
            });
            drawn += 1;
        }

        trace!(layer, drawn, "Rendered map layer");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::Shape;
    use crate::io::MemorySource;
    use crate::test_support::png;

    const MAP: &str = r#"{
        "rows": 2, "cols": 2, "tile_width": 8, "tile_height": 8,
        "tilesets": ["tiles.png"],
        "cells": [
            { "tiles": [{"si": 0, "ti": 0}, {"si": -1, "ti": 0}, {"si": -1, "ti": 0}], "id": "start" },
            { "tiles": [{"si": 0, "ti": 3}, {"si": -1, "ti": 0}, {"si": -1, "ti": 0}], "barrier": true },
            {},
            { "class": "water" }
        ]
    }"#;

    #[test]
    fn test_parse_and_bounds() {
        let map = TileMap::parse(MAP).unwrap();
        assert_eq!(map.cell(0, 0).unwrap().id, "start");
        assert!(map.cell(0, 1).unwrap().barrier);
        assert_eq!(map.cell(1, 1).unwrap().class, "water");
        assert!(matches!(map.cell(2, 0), Err(MapError::OutOfBounds { .. })));
        assert!(matches!(map.cell(0, -1), Err(MapError::OutOfBounds { .. })));
    }

    #[test]
    fn test_parse_rejects_bad_cell_count() {
        let text = r#"{ "rows": 2, "cols": 2, "tile_width": 8, "tile_height": 8, "cells": [{}] }"#;
        assert!(matches!(
            TileMap::parse(text),
            Err(MapError::CellCount {
                expected: 4,
                found: 1
            })
        ));

        let blank = r#"{ "rows": 1, "cols": 3, "tile_width": 8, "tile_height": 8 }"#;
        assert_eq!(TileMap::parse(blank).unwrap().cells.len(), 3);
    }

    #[test]
    fn test_set_tile_validates() {
        let mut map = TileMap::parse(MAP).unwrap();
        map.set_tile(1, 0, 2, TileRef { si: 0, ti: 5 }).unwrap();
        assert_eq!(map.cell(1, 0).unwrap().tiles[2], TileRef { si: 0, ti: 5 });
        assert!(matches!(
            map.set_tile(1, 0, 3, TileRef::default()),
            Err(MapError::Layer(3))
        ));
        assert!(matches!(
            map.set_tile(1, 0, 0, TileRef { si: 1, ti: 0 }),
            Err(MapError::TileSet(1))
        ));
    }

    #[test]
    fn test_render_layer_with_scroll() {
        let source = MemorySource::new().with("tiles.png", png(16, 16));
        let mut resources = ResourceCache::new(Box::new(source));
        let loaded = LoadedMap::load(MAP, &mut resources).unwrap();

        let mut surface = Surface::new(64, 64);
        loaded.render(&mut surface, &resources, 0, 4, 0).unwrap();

        let blits: Vec<Blit> = surface
            .commands()
            .iter()
            .filter_map(|c| match &c.shape {
                Shape::Blit(b) => Some(*b),
                _ => None,
            })
            .collect();
        assert_eq!(blits.len(), 2);
        assert_eq!((blits[0].dx, blits[0].sx, blits[0].sy), (-4, 0, 0));
        // Tile 3 in a 2x2 sheet of 8px tiles
        assert_eq!((blits[1].dx, blits[1].sx, blits[1].sy), (4, 8, 8));

        assert!(matches!(
            loaded.render(&mut surface, &resources, 3, 0, 0),
            Err(MapError::Layer(3))
        ));
    }

    #[test]
    fn test_load_fails_on_missing_tileset() {
        let mut resources = ResourceCache::new(Box::new(MemorySource::new()));
        assert!(matches!(
            LoadedMap::load(MAP, &mut resources),
            Err(MapError::Resource(_))
        ));
    }
}
