//! Input/Output module for game resources, tile maps and saved data

pub mod map;
mod resources;
mod source;
mod store;

pub use map::{LoadedMap, MapCell, MapError, TileMap, TileRef, LAYER_COUNT};
pub use resources::{Bitmap, BitmapId, MusicId, ResourceCache, Sound, SoundId};
pub use source::{DirSource, MemorySource, ResourceError, ResourceSource};
pub use store::{GameDb, StoreError, StoreScope};
