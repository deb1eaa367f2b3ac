//! The JSON documents served to the front end.
//!
//! Field names are camelCase; recipe records carry their method as a
//! `method` discriminator next to the shared fields.

use std::collections::BTreeMap;

use cookbook_core::config::MicrowaveRecipeType;
use cookbook_core::id::EntityId;
use cookbook_core::pipeline::GameData;
use cookbook_core::recipe::{Recipe, RecipeKind};
use cookbook_core::specials::SpecialTrait;
use cookbook_sprites::{SpriteAttribution, SpritePoint, SpriteSheet};
use serde::Serialize;

/// One fork's data file.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedGameData<'a> {
    pub entities: Vec<ExportedEntity<'a>>,
    pub reagents: Vec<ExportedReagent<'a>>,
    /// Entities used as an ingredient by at least one recipe.
    pub ingredients: Vec<&'a str>,
    pub recipes: Vec<ExportedRecipe<'a>>,
    pub method_sprites: &'a BTreeMap<RecipeKind, SpritePoint>,
    pub beaker_fill: SpritePoint,
    pub microwave_recipe_types: Option<BTreeMap<&'a str, ExportedMicrowaveRecipeType<'a>>>,
    pub sprite_sheet: String,
    /// Only used when sorting by ID.
    pub sorting_id_rewrites: &'a BTreeMap<EntityId, String>,
    pub special_traits: &'a [SpecialTrait],
    pub attributions: &'a [SpriteAttribution],
}

#[derive(Debug, Serialize)]
pub struct ExportedEntity<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub sprite: SpritePoint,
    pub traits: u32,
}

#[derive(Debug, Serialize)]
pub struct ExportedReagent<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub color: &'a str,
    pub sources: &'a [EntityId],
}

#[derive(Debug, Serialize)]
pub struct ExportedRecipe<'a> {
    pub id: &'a str,
    #[serde(flatten)]
    pub recipe: &'a Recipe,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedMicrowaveRecipeType<'a> {
    pub sprite: SpritePoint,
    pub verb: &'a str,
    pub filter_summary: &'a str,
}

/// Entry of `index.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForkIndexEntry {
    pub id: String,
    pub hash: String,
    pub name: String,
    pub description: String,
    pub default: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    pub meta: ForkMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForkMeta {
    pub commit: String,
    pub repo: String,
    /// Build time, in milliseconds since the Unix epoch.
    pub date: u64,
}

const NO_SOURCES: &[EntityId] = &[];

impl<'a> ExportedGameData<'a> {
    pub fn new(
        data: &'a GameData,
        sprites: &'a SpriteSheet,
        microwave_recipe_types: Option<&'a BTreeMap<String, MicrowaveRecipeType>>,
        sorting_id_rewrites: &'a BTreeMap<EntityId, String>,
        sprite_sheet: String,
    ) -> Self {
        let entities = data
            .entities
            .iter()
            .map(|(id, entity)| ExportedEntity {
                id,
                name: &entity.name,
                sprite: sprites.points.get(id).copied().unwrap_or_default(),
                traits: data.traits_of(entity),
            })
            .collect();

        let reagents = data
            .reagents
            .iter()
            .map(|(id, reagent)| ExportedReagent {
                id,
                name: &reagent.name,
                color: &reagent.color,
                sources: data.reagent_sources.get(id).map_or(NO_SOURCES, Vec::as_slice),
            })
            .collect();

        let recipes = data
            .recipes
            .iter()
            .map(|(id, recipe)| ExportedRecipe { id, recipe })
            .collect();

        let microwave_recipe_types = match (microwave_recipe_types, &sprites.microwave_recipe_types) {
            (Some(types), Some(points)) => Some(
                points
                    .iter()
                    .filter_map(|(subtype, &sprite)| {
                        let def = types.get(subtype)?;
                        Some((
                            subtype.as_str(),
                            ExportedMicrowaveRecipeType {
                                sprite,
                                verb: &def.verb,
                                filter_summary: &def.filter_summary,
                            },
                        ))
                    })
                    .collect(),
            ),
            _ => None,
        };

        Self {
            entities,
            reagents,
            ingredients: data.ingredients(),
            recipes,
            method_sprites: &sprites.methods,
            beaker_fill: sprites.beaker_fill,
            microwave_recipe_types,
            sprite_sheet,
            sorting_id_rewrites,
            special_traits: &data.special_traits,
            attributions: &sprites.attributions,
        }
    }
}
