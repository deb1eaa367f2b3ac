use crate::recipe::RecipeKind;

/// Identifies an entity prototype. Globally unique within one fork.
pub type EntityId = String;

/// Identifies a reagent prototype.
pub type ReagentId = String;

/// Key of a recipe in the normalized recipe map.
///
/// Declared recipes keep their prototype ID, reactions are keyed as
/// `r!{reaction}` and recipes inferred from entity facets as
/// `{method}!{entity}`.
pub type RecipeKey = String;

/// Key of a recipe inferred from an entity facet, e.g. `cut!FoodCake`.
pub fn special_recipe_key(kind: RecipeKind, entity: &str) -> RecipeKey {
    format!("{}!{entity}", kind.as_str())
}

/// Key of a recipe derived from a reaction prototype.
pub fn reaction_recipe_key(reaction: &str) -> RecipeKey {
    format!("r!{reaction}")
}
