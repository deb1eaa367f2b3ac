//! Writing data files, sprite sheets and the fork index.
//!
//! Output file names embed a hash of their contents so they can be cached
//! forever; only `index.json` keeps a fixed name.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use cookbook_core::config::MicrowaveRecipeType;
use cookbook_core::id::EntityId;
use cookbook_core::pipeline::GameData;
use cookbook_sprites::SpriteSheet;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::ExportError;
use crate::model::{ExportedGameData, ForkIndexEntry, ForkMeta};

pub const DATA_DIR: &str = "data";
pub const IMAGE_DIR: &str = "img";
pub const INDEX_FILE: &str = "index.json";

/// Hex digits of the content hash kept in file names.
const HASH_LEN: usize = 8;

/// Everything built for one fork, ready to be written.
#[derive(Debug, Clone)]
pub struct ProcessedFork {
    pub id: String,
    pub name: String,
    pub description: String,
    pub default: bool,
    pub hidden: bool,
    pub repo: String,
    pub commit: String,
    pub data: GameData,
    pub sprites: SpriteSheet,
    pub microwave_recipe_types: Option<BTreeMap<String, MicrowaveRecipeType>>,
    pub sorting_id_rewrites: BTreeMap<EntityId, String>,
}

pub fn content_hash(bytes: &[u8]) -> String {
    let mut hash = hex::encode(Sha256::digest(bytes));
    hash.truncate(HASH_LEN);
    hash
}

pub fn data_file_name(id: &str, hash: &str) -> String {
    format!("data_{id}.{hash}.json")
}

pub fn sprite_sheet_file_name(id: &str, hash: &str) -> String {
    format!("sprites_{id}.{hash}.webp")
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

/// Write every fork's data file and sprite sheet, then the fork index.
///
/// Data files land in `{out_dir}/data`, sprite sheets in `{out_dir}/img`.
/// `date` is recorded in the index as the build time.
pub fn save_forks(out_dir: &Path, forks: &[ProcessedFork], date: u64) -> Result<Vec<ForkIndexEntry>, ExportError> {
    let data_dir = out_dir.join(DATA_DIR);
    let image_dir = out_dir.join(IMAGE_DIR);
    fs::create_dir_all(&data_dir)?;
    fs::create_dir_all(&image_dir)?;

    let mut index = Vec::with_capacity(forks.len());
    let mut sheets = Vec::with_capacity(forks.len());
    for fork in forks {
        let sprite_hash = content_hash(&encode_png(&fork.sprites.image)?);
        let exported = ExportedGameData::new(
            &fork.data,
            &fork.sprites,
            fork.microwave_recipe_types.as_ref(),
            &fork.sorting_id_rewrites,
            sprite_sheet_file_name(&fork.id, &sprite_hash),
        );
        let json = serde_json::to_string(&exported)?;
        let hash = content_hash(json.as_bytes());
        write_file(&data_dir.join(data_file_name(&fork.id, &hash)), json.as_bytes())?;

        index.push(ForkIndexEntry {
            id: fork.id.clone(),
            hash,
            name: fork.name.clone(),
            description: fork.description.clone(),
            default: fork.default,
            hidden: fork.hidden,
            meta: ForkMeta {
                commit: fork.commit.clone(),
                repo: fork.repo.clone(),
                date,
            },
        });
        sheets.push((image_dir.join(sprite_sheet_file_name(&fork.id, &sprite_hash)), &fork.sprites.image));
    }

    fs::write(data_dir.join(INDEX_FILE), serde_json::to_string(&index)?)?;

    for (path, image) in sheets {
        write_file(&path, &encode_webp(image)?)?;
    }
    Ok(index)
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), ExportError> {
    if !path.exists() {
        info!("Create: {}", path.display());
    }
    fs::write(path, contents)?;
    Ok(())
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(buffer)
}

/// Lossless WebP, which keeps sprite pixels exact.
pub fn encode_webp(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut buffer = Vec::new();
    WebPEncoder::new_lossless(&mut buffer).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(buffer)
}
