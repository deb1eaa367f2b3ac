//! Recipe normalization.
//!
//! Declared recipes, inferred recipes and reactions are merged into one map
//! of [`Recipe`]s. Keys never overlap in well-formed data; if they do, the
//! first source wins, in the order declared, inferred, reactions.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use tracing::debug;

use crate::closure::PrunedGameData;
use crate::id::{RecipeKey, reaction_recipe_key};
use crate::prototype::{MicrowaveRecipePrototype, OneOrMany, ReactionPrototype};
use crate::recipe::{DEFAULT_RECIPE_GROUP, ReagentIngredient, Recipe, RecipeMethod};

/// Cook time of a declared recipe that does not specify one, in seconds.
pub const DEFAULT_COOK_TIME: f64 = 5.0;

/// Builds the normalized recipe map of a closed dataset.
pub fn normalize_recipes(
    pruned: &PrunedGameData,
    default_subtype: Option<&str>,
) -> BTreeMap<RecipeKey, Recipe> {
    let declared = pruned
        .recipes
        .iter()
        .map(|r| (r.id.clone(), microwave_recipe(r, default_subtype)));
    let inferred = pruned
        .special_recipes
        .iter()
        .map(|(key, recipe)| (key.clone(), recipe.clone()));
    let reactions = pruned
        .reactions
        .iter()
        .map(|r| (reaction_recipe_key(&r.id), reaction_recipe(r)));

    let mut recipes = BTreeMap::new();
    for (key, recipe) in declared.chain(inferred).chain(reactions) {
        match recipes.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(recipe);
            }
            Entry::Occupied(existing) => {
                debug!("Recipe key collision on {}, keeping the first", existing.key());
            }
        }
    }
    recipes
}

/// Converts a declared recipe.
pub fn microwave_recipe(recipe: &MicrowaveRecipePrototype, default_subtype: Option<&str>) -> Recipe {
    Recipe {
        method: RecipeMethod::Microwave {
            time: recipe.time.unwrap_or(DEFAULT_COOK_TIME),
            subtype: resolve_subtype(recipe.recipe_type.as_ref(), default_subtype),
        },
        solid_result: Some(recipe.result.clone()),
        reagent_result: None,
        result_qty: recipe.result_count,
        solids: recipe.solids.clone().unwrap_or_default(),
        reagents: recipe
            .reagents
            .iter()
            .flatten()
            .map(|(id, amount)| (id.clone(), ReagentIngredient::new(*amount)))
            .collect(),
        group: recipe
            .group
            .clone()
            .unwrap_or_else(|| DEFAULT_RECIPE_GROUP.to_string()),
    }
}

/// Converts an accepted reaction into a mix recipe.
pub fn reaction_recipe(reaction: &ReactionPrototype) -> Recipe {
    let reagent_result = reaction.reagent_result();
    Recipe {
        method: RecipeMethod::Mix {
            result_amount: reagent_result.map_or(0.0, |(_, amount)| amount),
            min_temp: reaction.min_temp.unwrap_or(0.0),
            // Reactions without an upper bound use infinity or zero.
            max_temp: reaction.max_temp.filter(|t| t.is_finite() && *t != 0.0),
        },
        solid_result: reaction.solid_result().map(str::to_string),
        reagent_result: reagent_result.map(|(id, _)| id.to_string()),
        result_qty: None,
        solids: BTreeMap::new(),
        reagents: reaction.reactants.clone(),
        group: DEFAULT_RECIPE_GROUP.to_string(),
    }
}

/// An empty type list means any machine, like no list at all.
fn resolve_subtype(
    declared: Option<&OneOrMany<String>>,
    default_subtype: Option<&str>,
) -> Option<OneOrMany<String>> {
    let fallback = || default_subtype.map(|s| OneOrMany::One(s.to_string()));
    match declared {
        None => fallback(),
        Some(OneOrMany::One(subtype)) => Some(OneOrMany::One(subtype.clone())),
        Some(OneOrMany::Many(subtypes)) => match subtypes.as_slice() {
            [] => fallback(),
            [single] => Some(OneOrMany::One(single.clone())),
            _ => Some(OneOrMany::Many(subtypes.clone())),
        },
    }
}
