//! Engine-owned resource cache
//!
//! Assets are loaded once per logical path and live until the cache is
//! dropped. Callers only ever receive small copyable ids, so nothing a
//! script holds on to can free an asset.

use super::source::{normalize, ResourceError, ResourceSource};
use crate::graphics::Color;
use std::collections::HashMap;
use tracing::{debug, info};

/// Handle to a cached bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitmapId(usize);

/// Handle to a cached sound effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundId(usize);

/// Handle to a cached music track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MusicId(usize);

/// A decoded image
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub path: String,
    pub image: image::RgbaImage,
    /// Color treated as transparent by masked blits
    pub mask: Option<Color>,
}

impl Bitmap {
    pub fn width(&self) -> i32 {
        self.image.width() as i32
    }

    pub fn height(&self) -> i32 {
        self.image.height() as i32
    }
}

/// Encoded audio data; decoding is the mixer's concern
#[derive(Debug, Clone)]
pub struct Sound {
    pub path: String,
    pub data: Vec<u8>,
}

/// Cache of every asset loaded during the process lifetime
pub struct ResourceCache {
    source: Box<dyn ResourceSource>,
    bitmaps: Vec<Bitmap>,
    bitmap_paths: HashMap<String, BitmapId>,
    sounds: Vec<Sound>,
    sound_paths: HashMap<String, SoundId>,
    music: Vec<Sound>,
    music_paths: HashMap<String, MusicId>,
}

impl ResourceCache {
    /// Create an empty cache reading from `source`
    pub fn new(source: Box<dyn ResourceSource>) -> Self {
        Self {
            source,
            bitmaps: Vec::new(),
            bitmap_paths: HashMap::new(),
            sounds: Vec::new(),
            sound_paths: HashMap::new(),
            music: Vec::new(),
            music_paths: HashMap::new(),
        }
    }

    /// Read raw bytes without caching
    pub fn read(&self, path: &str) -> Result<Vec<u8>, ResourceError> {
        self.source.read(path)
    }

    /// Read a text file; the caller owns the returned text
    pub fn load_script(&self, path: &str) -> Result<String, ResourceError> {
        let bytes = self.source.read(path)?;
        debug!(path = path, bytes = bytes.len(), "Loaded script text");
        String::from_utf8(bytes).map_err(|_| ResourceError::Utf8(path.to_string()))
    }

    /// Load a bitmap, or return the cached id for `path`
    pub fn load_bitmap(&mut self, path: &str) -> Result<BitmapId, ResourceError> {
        let key = normalize(path);
        if let Some(id) = self.bitmap_paths.get(&key) {
            return Ok(*id);
        }

        let bytes = self.source.read(&key)?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| ResourceError::Decode {
                path: path.to_string(),
                message: e.to_string(),
            })?
            .to_rgba8();

        info!(
            path = %key,
            width = image.width(),
            height = image.height(),
            "Cached bitmap"
        );
        let id = BitmapId(self.bitmaps.len());
        self.bitmaps.push(Bitmap {
            path: key.clone(),
            image,
            mask: None,
        });
        self.bitmap_paths.insert(key, id);
        Ok(id)
    }

    /// Id of an already-loaded bitmap
    pub fn find_bitmap(&self, path: &str) -> Option<BitmapId> {
        self.bitmap_paths.get(&normalize(path)).copied()
    }

    pub fn bitmap(&self, id: BitmapId) -> Option<&Bitmap> {
        self.bitmaps.get(id.0)
    }

    /// Set the color treated as transparent for `id`
    pub fn set_mask(&mut self, id: BitmapId, mask: Color) {
        if let Some(bitmap) = self.bitmaps.get_mut(id.0) {
            bitmap.mask = Some(mask);
        }
    }

    /// Load a sound effect, or return the cached id for `path`
    pub fn load_sound(&mut self, path: &str) -> Result<SoundId, ResourceError> {
        let key = normalize(path);
        if let Some(id) = self.sound_paths.get(&key) {
            return Ok(*id);
        }
        let data = self.source.read(&key)?;
        debug!(path = %key, bytes = data.len(), "Cached sound");
        let id = SoundId(self.sounds.len());
        self.sounds.push(Sound {
            path: key.clone(),
            data,
        });
        self.sound_paths.insert(key, id);
        Ok(id)
    }

    pub fn sound(&self, id: SoundId) -> Option<&Sound> {
        self.sounds.get(id.0)
    }

    /// Load a music track, or return the cached id for `path`
    pub fn load_music(&mut self, path: &str) -> Result<MusicId, ResourceError> {
        let key = normalize(path);
        if let Some(id) = self.music_paths.get(&key) {
            return Ok(*id);
        }
        let data = self.source.read(&key)?;
        debug!(path = %key, bytes = data.len(), "Cached music");
        let id = MusicId(self.music.len());
        self.music.push(Sound {
            path: key.clone(),
            data,
        });
        self.music_paths.insert(key, id);
        Ok(id)
    }

    pub fn music(&self, id: MusicId) -> Option<&Sound> {
        self.music.get(id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemorySource;
    use crate::test_support::png;

    fn cache() -> ResourceCache {
        let source = MemorySource::new()
            .with("gfx/hero.png", png(16, 8))
            .with("gfx/broken.png", "not a png")
            .with("sfx/jump.wav", vec![1, 2, 3])
            .with("music/theme.ogg", vec![4, 5])
            .with("intro.lua", "log('x')")
            .with("bad.txt", vec![0xff, 0xfe]);
        ResourceCache::new(Box::new(source))
    }

    #[test]
    fn test_bitmap_is_cached_by_path() {
        let mut cache = cache();
        let a = cache.load_bitmap("gfx/hero.png").unwrap();
        let b = cache.load_bitmap("./gfx/hero.png").unwrap();
        assert_eq!(a, b);

        let bitmap = cache.bitmap(a).unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (16, 8));
        assert_eq!(cache.find_bitmap("gfx/hero.png"), Some(a));

        cache.set_mask(a, Color::rgb(255, 0, 255));
        assert_eq!(cache.bitmap(a).unwrap().mask, Some(Color::rgb(255, 0, 255)));
    }

    #[test]
    fn test_load_failures() {
        let mut cache = cache();
        assert!(matches!(
            cache.load_bitmap("gfx/missing.png"),
            Err(ResourceError::NotFound(_))
        ));
        assert!(matches!(
            cache.load_bitmap("gfx/broken.png"),
            Err(ResourceError::Decode { .. })
        ));
        assert!(matches!(
            cache.load_script("bad.txt"),
            Err(ResourceError::Utf8(_))
        ));
        assert_eq!(cache.find_bitmap("gfx/broken.png"), None);
    }

    #[test]
    fn test_audio_and_scripts() {
        let mut cache = cache();
        let jump = cache.load_sound("sfx/jump.wav").unwrap();
        assert_eq!(cache.load_sound("sfx/jump.wav").unwrap(), jump);
        assert_eq!(cache.sound(jump).unwrap().data, vec![1, 2, 3]);

        let theme = cache.load_music("music/theme.ogg").unwrap();
        assert_eq!(cache.music(theme).unwrap().path, "music/theme.ogg");

        assert_eq!(cache.load_script("intro.lua").unwrap(), "log('x')");
    }
}
