//! Serde structs for the fork list.
//!
//! The fork list maps a fork ID to the location of its game checkout and the
//! per-fork knobs of the build: which machines perform each recipe method,
//! which diets and reagents to highlight, and which recipes to leave out.
//! It is read from RON, JSON or TOML; a TOML fork list keeps its forks under
//! a top-level `forks` table.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use cookbook_core::config::{ForceIncludePolicy, MicrowaveRecipeType};
use cookbook_core::id::{EntityId, ReagentId};
use cookbook_core::recipe::RecipeKind;
use cookbook_core::specials::{SpecialDiet, SpecialReagent};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::loader::{DataLoadError, Format, deserialize_file, detect_format};

// ===========================================================================
// Fork info
// ===========================================================================

/// One fork of the game, as declared in the fork list.
#[derive(Debug, Clone, Deserialize)]
pub struct ForkInfo {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub hidden: bool,
    /// Root of the fork's checkout. Relative paths are taken from the
    /// directory holding the fork list.
    pub path: PathBuf,
    pub repo: String,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub special_diets: Vec<SpecialDiet>,
    #[serde(default)]
    pub special_reagents: Vec<SpecialReagent>,
    /// Machine entity per recipe method. `None` marks a method the fork does
    /// not have.
    pub method_entities: BTreeMap<RecipeKind, Option<EntityId>>,
    /// Sprite state drawn for the beaker fill cell.
    pub mix_fill_state: String,
    #[serde(default)]
    pub microwave_recipe_types: Option<BTreeMap<String, MicrowaveRecipeType>>,
    #[serde(default)]
    pub sorting_id_rewrites: Vec<PathBuf>,
    #[serde(default)]
    pub ignored_recipes: BTreeSet<String>,
    #[serde(default)]
    pub ignored_special_recipes: BTreeSet<String>,
    #[serde(default)]
    pub ignore_sources_of: BTreeSet<ReagentId>,
    #[serde(default)]
    pub force_include_reagent_sources: BTreeMap<ReagentId, Vec<EntityId>>,
    #[serde(default)]
    pub force_include_policy: ForceIncludePolicy,
}

impl ForkInfo {
    /// Make the checkout path and rewrite file paths absolute against `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        if self.path.is_relative() {
            self.path = base.join(&self.path);
        }
        for rewrite in &mut self.sorting_id_rewrites {
            if rewrite.is_relative() {
                *rewrite = base.join(&*rewrite);
            }
        }
    }
}

// ===========================================================================
// Fork list
// ===========================================================================

/// Every fork in the order the fork list declares them.
#[derive(Debug, Clone, Default)]
pub struct ForkList(pub Vec<(String, ForkInfo)>);

impl ForkList {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ForkInfo)> {
        self.0.iter().map(|(id, info)| (id.as_str(), info))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ForkInfo> {
        self.iter().find(|(fork, _)| *fork == id).map(|(_, info)| info)
    }
}

impl<'de> Deserialize<'de> for ForkList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ForkListVisitor;

        impl<'de> Visitor<'de> for ForkListVisitor {
            type Value = ForkList;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of fork ID to fork info")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<ForkList, A::Error> {
                let mut forks: Vec<(String, ForkInfo)> = Vec::new();
                while let Some((id, info)) = map.next_entry::<String, ForkInfo>()? {
                    if forks.iter().any(|(existing, _)| *existing == id) {
                        return Err(serde::de::Error::custom(format!("duplicate fork ID `{id}`")));
                    }
                    forks.push((id, info));
                }
                Ok(ForkList(forks))
            }
        }

        deserializer.deserialize_map(ForkListVisitor)
    }
}

#[derive(Deserialize)]
struct TomlForkList {
    forks: ForkList,
}

/// Read a fork list file. Relative paths inside it are resolved against the
/// file's directory.
pub fn read_fork_list(path: &Path) -> Result<ForkList, DataLoadError> {
    let mut list = match detect_format(path)? {
        Format::Toml => deserialize_file::<TomlForkList>(path)?.forks,
        Format::Ron | Format::Json => deserialize_file::<ForkList>(path)?,
    };

    let base = path.parent().unwrap_or(Path::new("."));
    for (_, info) in &mut list.0 {
        info.resolve_paths(base);
    }
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "cookbook_schema_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    const FORKS_JSON: &str = r##"{
        "wizden": {
            "name": "Wizard's Den",
            "description": "The upstream game.",
            "path": "forks/wizden",
            "repo": "https://example.org/wizden",
            "default": true,
            "method_entities": {
                "microwave": "KitchenMicrowave",
                "mix": "Beaker",
                "deepFry": null
            },
            "mix_fill_state": "beaker1",
            "special_diets": [{
                "organ": "OrganReptilianStomach",
                "color": "#85c700",
                "hint": "Lizards can eat this",
                "filter_name": "Lizard-safe",
                "filter_summary": "only lizard-safe recipes"
            }],
            "ignore_sources_of": ["Sugar"]
        },
        "frontier": {
            "name": "Frontier",
            "description": "A fork with more machines.",
            "hidden": true,
            "path": "/srv/frontier",
            "repo": "https://example.org/frontier",
            "method_entities": {"microwave": "KitchenMicrowave"},
            "mix_fill_state": "fill",
            "microwave_recipe_types": {
                "Microwave": {"default": true, "machine": "KitchenMicrowave",
                              "verb": "microwave", "filter_summary": "microwaved"},
                "Oven": {"machine": "KitchenOven", "verb": "bake", "filter_summary": "baked"}
            },
            "force_include_policy": "always"
        }
    }"##;

    // -----------------------------------------------------------------------
    // Parsing
    // -----------------------------------------------------------------------

    #[test]
    fn fork_list_keeps_declared_order() {
        let list: ForkList = serde_json::from_str(FORKS_JSON).unwrap();
        let ids: Vec<_> = list.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["wizden", "frontier"]);
    }

    #[test]
    fn fork_info_fields_and_defaults() {
        let list: ForkList = serde_json::from_str(FORKS_JSON).unwrap();

        let wizden = list.get("wizden").unwrap();
        assert!(wizden.default);
        assert!(!wizden.hidden);
        assert_eq!(wizden.method_entities[&RecipeKind::Mix].as_deref(), Some("Beaker"));
        assert_eq!(wizden.method_entities[&RecipeKind::DeepFry], None);
        assert_eq!(wizden.special_diets[0].display.filter_name, "Lizard-safe");
        assert!(wizden.microwave_recipe_types.is_none());
        assert_eq!(wizden.force_include_policy, ForceIncludePolicy::RequireUsed);

        let frontier = list.get("frontier").unwrap();
        assert!(frontier.hidden);
        let types = frontier.microwave_recipe_types.as_ref().unwrap();
        assert!(types["Microwave"].default);
        assert!(!types["Oven"].default);
        assert_eq!(frontier.force_include_policy, ForceIncludePolicy::Always);
    }

    #[test]
    fn duplicate_fork_ids_are_rejected() {
        let json = r#"{"a": {"name": "A", "description": "", "path": ".", "repo": "",
                             "method_entities": {}, "mix_fill_state": "x"}}"#;
        let doubled = format!("{{{0}, {0}}}", &json[1..json.len() - 1]);
        let result: Result<ForkList, _> = serde_json::from_str(&doubled);
        assert!(result.is_err());
    }

    // -----------------------------------------------------------------------
    // Files
    // -----------------------------------------------------------------------

    #[test]
    fn read_json_fork_list_resolves_relative_paths() {
        let dir = make_test_dir("json");
        let path = dir.join("forks.json");
        fs::write(&path, FORKS_JSON).unwrap();

        let list = read_fork_list(&path).unwrap();
        assert_eq!(list.get("wizden").unwrap().path, dir.join("forks/wizden"));
        assert_eq!(list.get("frontier").unwrap().path, PathBuf::from("/srv/frontier"));

        cleanup(&dir);
    }

    #[test]
    fn read_toml_fork_list() {
        let dir = make_test_dir("toml");
        let path = dir.join("forks.toml");
        fs::write(
            &path,
            r#"
[forks.zeta]
name = "Zeta"
description = "first"
path = "zeta"
repo = "https://example.org/zeta"
mix_fill_state = "fill"
sorting_id_rewrites = ["rewrites/zeta.json"]

[forks.zeta.method_entities]
microwave = "KitchenMicrowave"

[forks.alpha]
name = "Alpha"
description = "second"
path = "alpha"
repo = "https://example.org/alpha"
mix_fill_state = "fill"

[forks.alpha.method_entities]
"#,
        )
        .unwrap();

        let list = read_fork_list(&path).unwrap();
        let ids: Vec<_> = list.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["zeta", "alpha"]);
        assert_eq!(
            list.get("zeta").unwrap().sorting_id_rewrites,
            vec![dir.join("rewrites/zeta.json")]
        );

        cleanup(&dir);
    }

    #[test]
    fn read_fork_list_missing_field() {
        let dir = make_test_dir("missing_field");
        let path = dir.join("forks.json");
        fs::write(&path, r#"{"a": {"name": "A"}}"#).unwrap();

        let result = read_fork_list(&path);
        assert!(matches!(result, Err(DataLoadError::Parse { .. })));

        cleanup(&dir);
    }
}
