//! Per-fork settings consumed by the core.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::id::{EntityId, ReagentId, RecipeKey};
use crate::recipe::RecipeKind;
use crate::specials::{SpecialDiet, SpecialReagent};

/// Reagents too common to be worth listing sources for.
pub const DEFAULT_IGNORED_SOURCE_REAGENTS: &[&str] = &["Water", "Blood", "Nutriment", "Vitamin"];

/// Reagent groups whose producing reactions never enter the cookbook.
pub const EXCLUDED_REACTION_GROUPS: &[&str] = &["Medicine", "Narcotics", "Toxins"];

/// True if reactions producing a reagent of this group may be included.
pub fn is_food_related_group(group: Option<&str>) -> bool {
    group.is_none_or(|g| !EXCLUDED_REACTION_GROUPS.contains(&g))
}

// ===========================================================================
// Closure configuration
// ===========================================================================

/// What a forced reagent source may do to the closure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceIncludePolicy {
    /// Only list a forced source that is already in the closure.
    #[default]
    RequireUsed,
    /// Always list a forced source, adding it to the closure if needed.
    Always,
}

/// Inputs of the relevance filter besides the raw data.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    /// Declared recipe IDs to leave out entirely.
    pub ignored_recipes: BTreeSet<String>,
    /// Keys of roll and heat recipes that must not be inferred.
    pub ignored_special_recipes: BTreeSet<RecipeKey>,
    /// Reagents never listed with sources.
    pub ignore_sources_of: BTreeSet<ReagentId>,
    /// Curated sources unioned into the scanned ones.
    pub force_include_reagent_sources: BTreeMap<ReagentId, Vec<EntityId>>,
    pub force_include_policy: ForceIncludePolicy,
    /// Entities that ship regardless of recipes (special diet organs).
    pub required_entities: Vec<EntityId>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            ignored_recipes: BTreeSet::new(),
            ignored_special_recipes: BTreeSet::new(),
            ignore_sources_of: DEFAULT_IGNORED_SOURCE_REAGENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            force_include_reagent_sources: BTreeMap::new(),
            force_include_policy: ForceIncludePolicy::default(),
            required_entities: Vec::new(),
        }
    }
}

impl FilterConfig {
    pub fn is_source_ignored(&self, reagent: &str) -> bool {
        self.ignore_sources_of.contains(reagent)
    }
}

// ===========================================================================
// Fork settings
// ===========================================================================

/// A machine that restricts which microwave recipes it can cook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicrowaveRecipeType {
    /// Recipes without a type are cooked by the default machine.
    #[serde(default)]
    pub default: bool,
    pub machine: EntityId,
    pub verb: String,
    pub filter_summary: String,
}

/// Per-fork settings used after the closure is computed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForkSettings {
    /// Machine entity shown for each method; `None` if the fork lacks it.
    pub method_entities: BTreeMap<RecipeKind, Option<EntityId>>,
    pub microwave_recipe_types: Option<BTreeMap<String, MicrowaveRecipeType>>,
    pub special_diets: Vec<SpecialDiet>,
    pub special_reagents: Vec<SpecialReagent>,
}

impl ForkSettings {
    /// The subtype assigned to microwave recipes that declare none.
    pub fn default_microwave_subtype(&self) -> Option<&str> {
        self.microwave_recipe_types
            .as_ref()?
            .iter()
            .find(|(_, ty)| ty.default)
            .map(|(id, _)| id.as_str())
    }
}
