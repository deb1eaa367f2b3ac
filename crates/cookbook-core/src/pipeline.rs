//! Build entry point: raw prototypes in, closed and resolved game data out.

use std::collections::{BTreeMap, HashMap};

use tracing::info;

use crate::closure::filter_relevant;
use crate::config::{FilterConfig, ForkSettings};
use crate::error::BuildError;
use crate::id::{EntityId, ReagentId, RecipeKey};
use crate::normalize::normalize_recipes;
use crate::prototype::ReagentPrototype;
use crate::recipe::{Recipe, RecipeKind};
use crate::resolve::{ResolvedEntity, explain_unresolved, resolve_lenient};
use crate::sources::ReagentSources;
use crate::specials::{SpecialTrait, resolve_specials, traits_mask};
use crate::store::RawGameData;

/// Colour of reagents that do not declare one.
pub const DEFAULT_REAGENT_COLOR: &str = "#ffffff";

/// Looks up localized display strings by message key.
pub trait LocaleLookup {
    fn message(&self, key: &str) -> Option<String>;
}

impl LocaleLookup for HashMap<String, String> {
    fn message(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl LocaleLookup for BTreeMap<String, String> {
    fn message(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedReagent {
    pub id: ReagentId,
    pub name: String,
    pub color: String,
}

impl ResolvedReagent {
    /// The display name falls back to the reagent ID if its key is missing.
    pub fn from_prototype(reagent: &ReagentPrototype, locale: &dyn LocaleLookup) -> Self {
        let name = reagent
            .name
            .as_deref()
            .and_then(|key| locale.message(key))
            .unwrap_or_else(|| reagent.id.clone());
        Self {
            id: reagent.id.clone(),
            name,
            color: reagent
                .color
                .clone()
                .unwrap_or_else(|| DEFAULT_REAGENT_COLOR.to_string()),
        }
    }
}

/// Everything downstream collaborators need for one fork.
#[derive(Debug, Clone)]
pub struct GameData {
    pub entities: BTreeMap<EntityId, ResolvedEntity>,
    pub reagents: BTreeMap<ReagentId, ResolvedReagent>,
    pub recipes: BTreeMap<RecipeKey, Recipe>,
    pub reagent_sources: ReagentSources,
    /// Machine shown for each supported method.
    pub method_entities: BTreeMap<RecipeKind, ResolvedEntity>,
    /// Machine shown for each microwave recipe type, if the fork has any.
    pub microwave_recipe_type_entities: Option<BTreeMap<String, ResolvedEntity>>,
    pub special_traits: Vec<SpecialTrait>,
}

impl GameData {
    /// The special-trait mask of an entity.
    pub fn traits_of(&self, entity: &ResolvedEntity) -> u32 {
        traits_mask(entity, &self.special_traits)
    }

    /// Distinct solid ingredients across every recipe, in recipe order.
    pub fn ingredients(&self) -> Vec<&str> {
        let mut seen = std::collections::BTreeSet::new();
        self.recipes
            .values()
            .flat_map(|r| r.solids.keys())
            .filter(|id| seen.insert(id.as_str()))
            .map(String::as_str)
            .collect()
    }
}

/// Runs the whole core over one fork's raw data.
pub fn build_game_data(
    raw: &RawGameData,
    locale: &dyn LocaleLookup,
    config: &FilterConfig,
    settings: &ForkSettings,
) -> Result<GameData, BuildError> {
    let (all_entities, broken) = resolve_lenient(raw);
    let explain = |err: BuildError| explain_unresolved(err, &broken);

    let pruned = filter_relevant(raw, &all_entities, config).map_err(explain)?;
    info!(
        "{} recipes use {} entities, {} reagents, {} reactions, {} special recipes",
        pruned.recipes.len(),
        pruned.entities.len(),
        pruned.reagents.len(),
        pruned.reactions.len(),
        pruned.special_recipes.len()
    );

    let recipes = normalize_recipes(&pruned, settings.default_microwave_subtype());
    let reagents = pruned
        .reagents
        .values()
        .map(|r| (r.id.clone(), ResolvedReagent::from_prototype(r, locale)))
        .collect::<BTreeMap<_, _>>();

    let lookup = |id: &EntityId| {
        all_entities
            .get(id)
            .cloned()
            .ok_or_else(|| explain(BuildError::UnresolvedEntity(id.clone())))
    };

    // Machines are looked up in the full set; they are rarely ingredients.
    let method_entities = settings
        .method_entities
        .iter()
        .filter_map(|(method, id)| id.as_ref().map(|id| (*method, id)))
        .map(|(method, id)| Ok((method, lookup(id)?)))
        .collect::<Result<BTreeMap<_, _>, BuildError>>()?;

    let microwave_recipe_type_entities = settings
        .microwave_recipe_types
        .as_ref()
        .map(|types| {
            types
                .iter()
                .map(|(subtype, ty)| Ok((subtype.clone(), lookup(&ty.machine)?)))
                .collect::<Result<BTreeMap<_, _>, BuildError>>()
        })
        .transpose()?;

    info!(
        "Resolved {} entities, {} reagents and {} recipes",
        pruned.entities.len(),
        reagents.len(),
        recipes.len()
    );

    let special_traits =
        resolve_specials(&all_entities, &settings.special_diets, &settings.special_reagents).map_err(explain)?;
    info!("Resolved {} special diets and reagents", special_traits.len());

    Ok(GameData {
        entities: pruned.entities,
        reagents,
        recipes,
        reagent_sources: pruned.reagent_sources,
        method_entities,
        microwave_recipe_type_entities,
        special_traits,
    })
}
