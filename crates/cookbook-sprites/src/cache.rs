//! Sprite image cache and attribution collection.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use serde::Serialize;
use tracing::{debug, error};

use crate::error::SpriteError;
use crate::sheet::{SPRITE_SIZE, SpritePoint};

/// Attribution text used when an RSI's `meta.json` cannot be read.
pub const INVALID_METADATA: &str = "(invalid sprite metadata)";

/// Trailing bytes dropped, one at a time, from a PNG that fails to decode.
const MAX_TRAILING_BYTES: usize = 4;

/// Licence and copyright of one RSI directory, with every sheet position
/// drawn from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpriteAttribution {
    pub path: String,
    pub license: String,
    pub copyright: String,
    pub sprites: Vec<SpritePoint>,
}

/// Decoded sprite states keyed by `{path}/{state}.png`, plus the attribution
/// of every RSI touched.
#[derive(Debug)]
pub struct SpriteCache {
    dir: PathBuf,
    images: HashMap<String, RgbaImage>,
    attributions: HashMap<String, SpriteAttribution>,
}

impl SpriteCache {
    pub fn new(texture_dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: texture_dir.into(),
            images: HashMap::new(),
            attributions: HashMap::new(),
        }
    }

    /// The image of `state` in the RSI at `path`, recording `point` against
    /// that RSI's attribution.
    ///
    /// A state with no PNG on disk is reported and drawn as a blank cell. A
    /// PNG that exists but cannot be decoded is an error.
    pub fn read(
        &mut self,
        path: &str,
        state: &str,
        for_entity: &str,
        point: SpritePoint,
    ) -> Result<&RgbaImage, SpriteError> {
        let attribution = self.attribution(path);
        if !attribution.sprites.contains(&point) {
            attribution.sprites.push(point);
        }

        let key = format!("{path}/{state}.png");
        if !self.images.contains_key(&key) {
            let full_path = self.dir.join(&key);
            let image = if full_path.is_file() {
                decode_png(&full_path)?
            } else {
                error!("Unable to resolve sprite path for state '{state}' in '{path}' for {for_entity}");
                RgbaImage::new(SPRITE_SIZE, SPRITE_SIZE)
            };
            self.images.insert(key.clone(), image);
        }
        Ok(&self.images[&key])
    }

    fn attribution(&mut self, path: &str) -> &mut SpriteAttribution {
        let dir = &self.dir;
        self.attributions
            .entry(path.to_string())
            .or_insert_with(|| load_attribution(dir, path))
    }

    /// Every attribution collected so far, sorted by RSI path.
    pub fn attributions(&self) -> Vec<SpriteAttribution> {
        let mut attributions: Vec<_> = self.attributions.values().cloned().collect();
        attributions.sort_by(|a, b| {
            a.path
                .to_lowercase()
                .cmp(&b.path.to_lowercase())
                .then_with(|| a.path.cmp(&b.path))
        });
        attributions
    }
}

fn load_attribution(dir: &Path, path: &str) -> SpriteAttribution {
    let meta_path = dir.join(path).join("meta.json");
    let meta = fs::read_to_string(&meta_path)
        .map_err(|e| e.to_string())
        .and_then(|text| {
            let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
            serde_json::from_str::<serde_json::Value>(text).map_err(|e| e.to_string())
        });

    let (license, copyright) = match meta {
        Ok(meta) => {
            let text = |key: &str| meta.get(key).and_then(|v| v.as_str()).unwrap_or_default().to_string();
            (text("license"), text("copyright"))
        }
        Err(e) => {
            error!("{}: Error parsing attributions: {e}", meta_path.display());
            (INVALID_METADATA.to_string(), INVALID_METADATA.to_string())
        }
    };

    SpriteAttribution {
        path: path.to_string(),
        license,
        copyright,
        sprites: Vec::new(),
    }
}

/// Decode a PNG, tolerating a few bytes of garbage after the image data.
fn decode_png(path: &Path) -> Result<RgbaImage, SpriteError> {
    let bytes = fs::read(path)?;
    let mut end = bytes.len();
    loop {
        match image::load_from_memory_with_format(&bytes[..end], ImageFormat::Png) {
            Ok(image) => {
                if end < bytes.len() {
                    debug!("{}: ignored {} trailing bytes", path.display(), bytes.len() - end);
                }
                return Ok(image.to_rgba8());
            }
            Err(_) if bytes.len() - end < MAX_TRAILING_BYTES && end > 0 => end -= 1,
            Err(source) => {
                return Err(SpriteError::Decode {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "cookbook_sprite_cache_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    fn write_rsi(dir: &Path, rsi: &str, meta: &str, states: &[(&str, [u8; 4])]) {
        let rsi_dir = dir.join(rsi);
        fs::create_dir_all(&rsi_dir).unwrap();
        fs::write(rsi_dir.join("meta.json"), meta).unwrap();
        for (state, pixel) in states {
            RgbaImage::from_pixel(SPRITE_SIZE, SPRITE_SIZE, Rgba(*pixel))
                .save(rsi_dir.join(format!("{state}.png")))
                .unwrap();
        }
    }

    // -----------------------------------------------------------------------
    // Images
    // -----------------------------------------------------------------------

    #[test]
    fn read_decodes_existing_states() {
        let dir = make_test_dir("read");
        write_rsi(&dir, "Objects/cake.rsi", r#"{"license": "CC0", "copyright": "me"}"#, &[("plain", [1, 2, 3, 255])]);

        let mut cache = SpriteCache::new(&dir);
        let image = cache.read("Objects/cake.rsi", "plain", "FoodCake", [0, 0]).unwrap();
        assert_eq!(image.get_pixel(5, 5), &Rgba([1, 2, 3, 255]));

        cleanup(&dir);
    }

    #[test]
    fn missing_state_is_blank() {
        let dir = make_test_dir("missing");
        write_rsi(&dir, "Objects/cake.rsi", "{}", &[]);

        let mut cache = SpriteCache::new(&dir);
        let image = cache.read("Objects/cake.rsi", "gone", "FoodCake", [0, 0]).unwrap();
        assert_eq!(image.dimensions(), (SPRITE_SIZE, SPRITE_SIZE));
        assert!(image.pixels().all(|p| p[3] == 0));

        cleanup(&dir);
    }

    #[test]
    fn trailing_garbage_is_tolerated() {
        let dir = make_test_dir("trailing");
        write_rsi(&dir, "Objects/pie.rsi", "{}", &[("pie", [9, 9, 9, 255])]);
        let png = dir.join("Objects/pie.rsi/pie.png");
        let mut bytes = fs::read(&png).unwrap();
        bytes.extend_from_slice(&[0, 0]);
        fs::write(&png, bytes).unwrap();

        let mut cache = SpriteCache::new(&dir);
        let image = cache.read("Objects/pie.rsi", "pie", "FoodPie", [0, 0]).unwrap();
        assert_eq!(image.get_pixel(0, 0), &Rgba([9, 9, 9, 255]));

        cleanup(&dir);
    }

    #[test]
    fn corrupt_png_is_an_error() {
        let dir = make_test_dir("corrupt");
        write_rsi(&dir, "Objects/pie.rsi", "{}", &[]);
        fs::write(dir.join("Objects/pie.rsi/pie.png"), b"definitely not a png file").unwrap();

        let mut cache = SpriteCache::new(&dir);
        let result = cache.read("Objects/pie.rsi", "pie", "FoodPie", [0, 0]);
        assert!(matches!(result, Err(SpriteError::Decode { .. })));

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // Attributions
    // -----------------------------------------------------------------------

    #[test]
    fn attributions_collect_points_sorted_by_path() {
        let dir = make_test_dir("attributions");
        write_rsi(&dir, "b.rsi", r#"{"license": "CC-BY-SA-3.0", "copyright": "tgstation"}"#, &[("x", [0; 4])]);
        write_rsi(&dir, "A.rsi", r#"{"license": 3}"#, &[("y", [0; 4])]);

        let mut cache = SpriteCache::new(&dir);
        cache.read("b.rsi", "x", "B", [0, 0]).unwrap();
        cache.read("b.rsi", "x", "B", [0, 0]).unwrap();
        cache.read("b.rsi", "x", "C", [32, 0]).unwrap();
        cache.read("A.rsi", "y", "A", [64, 0]).unwrap();

        let attributions = cache.attributions();
        assert_eq!(attributions.len(), 2);
        assert_eq!(attributions[0].path, "A.rsi");
        assert_eq!(attributions[0].license, "");
        assert_eq!(attributions[1].license, "CC-BY-SA-3.0");
        assert_eq!(attributions[1].copyright, "tgstation");
        assert_eq!(attributions[1].sprites, vec![[0, 0], [32, 0]]);

        cleanup(&dir);
    }

    #[test]
    fn malformed_metadata_is_marked() {
        let dir = make_test_dir("bad_meta");
        write_rsi(&dir, "bad.rsi", "{ not json", &[("s", [0; 4])]);

        let mut cache = SpriteCache::new(&dir);
        cache.read("bad.rsi", "s", "Bad", [0, 0]).unwrap();
        let attributions = cache.attributions();
        assert_eq!(attributions[0].license, INVALID_METADATA);
        assert_eq!(attributions[0].copyright, INVALID_METADATA);

        cleanup(&dir);
    }
}
