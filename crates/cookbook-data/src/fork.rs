//! Per-fork resolution: where a fork keeps its data and how its fork list
//! entry turns into build configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;

use cookbook_core::config::{FilterConfig, ForkSettings};
use cookbook_core::id::EntityId;
use cookbook_core::resolve::ResolvedEntity;
use cookbook_core::store::RawGameData;
use tracing::{info, warn};

use crate::loader::{DataLoadError, deserialize_file, read_raw_game_data};
use crate::locale::FluentLocale;
use crate::schema::ForkInfo;

pub const PROTOTYPES_SUBPATH: &str = "Resources/Prototypes";
pub const LOCALE_SUBPATH: &str = "Resources/Locale/en-US";
pub const TEXTURES_SUBPATH: &str = "Resources/Textures";

/// Entity ID to sort key.
pub type SortingIdRewrites = BTreeMap<EntityId, String>;

/// The raw inputs of one fork's build.
#[derive(Debug, Clone)]
pub struct LoadedFork {
    pub raw: RawGameData,
    pub locale: FluentLocale,
}

impl ForkInfo {
    pub fn prototypes_dir(&self) -> PathBuf {
        self.path.join(PROTOTYPES_SUBPATH)
    }

    pub fn locale_dir(&self) -> PathBuf {
        self.path.join(LOCALE_SUBPATH)
    }

    pub fn textures_dir(&self) -> PathBuf {
        self.path.join(TEXTURES_SUBPATH)
    }

    /// Relevance filter configuration for this fork.
    ///
    /// The fork's `ignore_sources_of` extends the built-in ignore list, and
    /// every special diet organ becomes a required entity.
    pub fn filter_config(&self) -> FilterConfig {
        let mut config = FilterConfig {
            ignored_recipes: self.ignored_recipes.clone(),
            ignored_special_recipes: self.ignored_special_recipes.clone(),
            force_include_reagent_sources: self.force_include_reagent_sources.clone(),
            force_include_policy: self.force_include_policy,
            required_entities: self.special_diets.iter().map(|diet| diet.organ.clone()).collect(),
            ..FilterConfig::default()
        };
        config.ignore_sources_of.extend(self.ignore_sources_of.iter().cloned());
        config
    }

    pub fn settings(&self) -> ForkSettings {
        ForkSettings {
            method_entities: self.method_entities.clone(),
            microwave_recipe_types: self.microwave_recipe_types.clone(),
            special_diets: self.special_diets.clone(),
            special_reagents: self.special_reagents.clone(),
        }
    }

    /// Read the fork's prototypes and English locale.
    pub fn load(&self) -> Result<LoadedFork, DataLoadError> {
        let raw = read_raw_game_data(&self.prototypes_dir())?;
        let locale = FluentLocale::load(&self.locale_dir())?;
        Ok(LoadedFork { raw, locale })
    }
}

/// Merge the fork's sorting-ID rewrite files, later files winning.
///
/// Keys that name no entity in `entities` are reported but kept, since the
/// front end ignores rewrites it cannot apply.
pub fn read_sorting_id_rewrites(
    paths: &[PathBuf],
    entities: &BTreeMap<EntityId, ResolvedEntity>,
) -> Result<SortingIdRewrites, DataLoadError> {
    let mut rewrites = SortingIdRewrites::new();
    for path in paths {
        let file: SortingIdRewrites = deserialize_file(path)?;
        rewrites.extend(file);
    }

    for key in rewrites.keys() {
        if !entities.contains_key(key) {
            warn!("Unknown entity prototype ID in rewrite file: {key}");
        }
    }
    if !rewrites.is_empty() {
        info!("Loaded {} sorting ID rewrites", rewrites.len());
    }
    Ok(rewrites)
}
