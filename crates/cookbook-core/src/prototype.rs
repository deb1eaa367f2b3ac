//! Raw prototype records, as they appear in the game's data files.
//!
//! These types are deliberately loose: nearly every field is optional, since
//! the inheritance resolver fills gaps from ancestors. Only the components the
//! cookbook cares about are modelled; every other component is kept by name so
//! it still counts toward an entity's component-presence set.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::id::{EntityId, ReagentId};
use crate::recipe::ReagentIngredient;

// ===========================================================================
// Helpers
// ===========================================================================

/// A field that may hold a single value or a list of values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(value) => std::slice::from_ref(value),
            OneOrMany::Many(values) => values,
        }
    }
}

fn from_value<T: DeserializeOwned, E: serde::de::Error>(value: serde_json::Value) -> Result<T, E> {
    serde_json::from_value(value).map_err(E::custom)
}

// ===========================================================================
// Prototype documents
// ===========================================================================

/// One document in a prototype file, discriminated by its `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Prototype {
    #[serde(rename = "entity")]
    Entity(EntityPrototype),
    #[serde(rename = "reagent")]
    Reagent(ReagentPrototype),
    #[serde(rename = "stack")]
    Stack(StackPrototype),
    #[serde(rename = "constructionGraph")]
    ConstructionGraph(ConstructionGraphPrototype),
    #[serde(rename = "microwaveMealRecipe")]
    MicrowaveRecipe(MicrowaveRecipePrototype),
    #[serde(rename = "reaction")]
    Reaction(ReactionPrototype),
    /// Any prototype kind the cookbook has no use for.
    #[serde(other)]
    Unrelated,
}

// ===========================================================================
// Entities and components
// ===========================================================================

/// An entity prototype before inheritance is resolved.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityPrototype {
    pub id: EntityId,
    #[serde(default)]
    pub parent: Option<OneOrMany<EntityId>>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub components: Vec<Component>,
}

impl EntityPrototype {
    /// Parent IDs in declaration order.
    pub fn parents(&self) -> &[EntityId] {
        self.parent.as_ref().map_or(&[], OneOrMany::as_slice)
    }
}

/// The components the resolver understands. Everything else is `Other`.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Sprite(SpriteComponent),
    SolutionContainerManager(SolutionContainerManagerComponent),
    SliceableFood(SliceableFoodComponent),
    Extractable(ExtractableComponent),
    Produce,
    Construction(ConstructionComponent),
    Tag(TagComponent),
    Stomach(StomachComponent),
    DeepFrySpawn(DeepFrySpawnComponent),
    FoodSequenceStartPoint(FoodSequenceStartPointComponent),
    FoodSequenceElement(FoodSequenceElementComponent),
    Other(String),
}

impl Component {
    /// The component's `type` name as written in data files.
    pub fn kind(&self) -> &str {
        match self {
            Component::Sprite(_) => "Sprite",
            Component::SolutionContainerManager(_) => "SolutionContainerManager",
            Component::SliceableFood(_) => "SliceableFood",
            Component::Extractable(_) => "Extractable",
            Component::Produce => "Produce",
            Component::Construction(_) => "Construction",
            Component::Tag(_) => "Tag",
            Component::Stomach(_) => "Stomach",
            Component::DeepFrySpawn(_) => "DeepFrySpawn",
            Component::FoodSequenceStartPoint(_) => "FoodSequenceStartPoint",
            Component::FoodSequenceElement(_) => "FoodSequenceElement",
            Component::Other(kind) => kind,
        }
    }
}

impl<'de> Deserialize<'de> for Component {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let kind = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| D::Error::missing_field("type"))?
            .to_string();

        Ok(match kind.as_str() {
            "Sprite" => Component::Sprite(from_value(value)?),
            "SolutionContainerManager" => Component::SolutionContainerManager(from_value(value)?),
            "SliceableFood" => Component::SliceableFood(from_value(value)?),
            "Extractable" => Component::Extractable(from_value(value)?),
            "Produce" => Component::Produce,
            "Construction" => Component::Construction(from_value(value)?),
            "Tag" => Component::Tag(from_value(value)?),
            "Stomach" => Component::Stomach(from_value(value)?),
            "DeepFrySpawn" => Component::DeepFrySpawn(from_value(value)?),
            "FoodSequenceStartPoint" => Component::FoodSequenceStartPoint(from_value(value)?),
            "FoodSequenceElement" => Component::FoodSequenceElement(from_value(value)?),
            _ => Component::Other(kind),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SpriteComponent {
    #[serde(default)]
    pub sprite: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub layers: Option<Vec<SpriteLayerData>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SpriteLayerData {
    #[serde(default)]
    pub sprite: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SolutionContainerManagerComponent {
    #[serde(default)]
    pub solutions: Option<BTreeMap<String, Solution>>,
}

/// A named bundle of reagents held by an entity.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    #[serde(default)]
    pub max_vol: Option<f64>,
    #[serde(default)]
    pub reagents: Option<Vec<SolutionReagent>>,
}

impl Solution {
    /// Reagent IDs in the order they are listed.
    pub fn reagent_ids(&self) -> impl Iterator<Item = &str> {
        self.reagents.iter().flatten().map(|r| r.reagent_id.as_str())
    }

    pub fn has_reagents(&self) -> bool {
        self.reagents.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SolutionReagent {
    pub reagent_id: ReagentId,
    #[serde(default)]
    pub quantity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SliceableFoodComponent {
    #[serde(default)]
    pub slice: Option<EntityId>,
    #[serde(default)]
    pub count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractableComponent {
    #[serde(default)]
    pub grindable_solution_name: Option<String>,
    #[serde(default)]
    pub juice_solution: Option<Solution>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConstructionComponent {
    #[serde(default)]
    pub graph: Option<String>,
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub edge: Option<u32>,
    #[serde(default)]
    pub step: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TagComponent {
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StomachComponent {
    #[serde(default)]
    pub special_digestible: Option<EntityWhitelist>,
}

/// Whitelist filter. Only tag and component filters are interpreted;
/// `sizes` is parsed so its presence can be reported.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EntityWhitelist {
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub components: Option<Vec<String>>,
    #[serde(default)]
    pub sizes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeepFrySpawnComponent {
    #[serde(default)]
    pub output: Option<EntityId>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodSequenceStartPointComponent {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub max_layers: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FoodSequenceElementComponent {
    #[serde(default)]
    pub entries: Option<BTreeMap<String, String>>,
}

// ===========================================================================
// Reagents and stacks
// ===========================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReagentPrototype {
    pub id: ReagentId,
    /// Localization key of the display name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

/// A stack type. Recipe ingredients sometimes name a stack instead of the
/// entity it spawns.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StackPrototype {
    pub id: String,
    pub spawn: EntityId,
}

// ===========================================================================
// Construction graphs
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ConstructionGraphPrototype {
    pub id: String,
    #[serde(default)]
    pub graph: Vec<ConstructionNode>,
}

impl ConstructionGraphPrototype {
    pub fn node(&self, name: &str) -> Option<&ConstructionNode> {
        self.graph.iter().find(|n| n.node == name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConstructionNode {
    pub node: String,
    #[serde(default)]
    pub edges: Vec<ConstructionEdge>,
    #[serde(default)]
    pub entity: Option<EntityId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConstructionEdge {
    pub to: String,
    #[serde(default)]
    pub steps: Vec<ConstructionStepData>,
    #[serde(default)]
    pub conditions: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructionStepData {
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub min_temperature: Option<f64>,
    #[serde(default)]
    pub max_temperature: Option<f64>,
}

// ===========================================================================
// Recipes and reactions
// ===========================================================================

/// A declared microwave-style recipe.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicrowaveRecipePrototype {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub result: EntityId,
    #[serde(default)]
    pub time: Option<f64>,
    #[serde(default)]
    pub solids: Option<BTreeMap<EntityId, u32>>,
    #[serde(default)]
    pub reagents: Option<BTreeMap<ReagentId, f64>>,
    #[serde(default)]
    pub group: Option<String>,
    /// Machine subtype(s) the recipe is restricted to.
    #[serde(default)]
    pub recipe_type: Option<OneOrMany<String>>,
    #[serde(default)]
    pub result_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionPrototype {
    pub id: String,
    #[serde(default)]
    pub reactants: BTreeMap<ReagentId, ReagentIngredient>,
    #[serde(default)]
    pub required_mixer_categories: Option<Vec<String>>,
    #[serde(default)]
    pub min_temp: Option<f64>,
    #[serde(default)]
    pub max_temp: Option<f64>,
    #[serde(default)]
    pub products: Option<BTreeMap<ReagentId, f64>>,
    #[serde(default)]
    pub effects: Vec<ReactionEffect>,
}

impl ReactionPrototype {
    /// True if the reaction only happens in a specific kind of mixer
    /// (centrifuge, electrolyser and the like).
    pub fn requires_mixer(&self) -> bool {
        self.required_mixer_categories
            .as_ref()
            .is_some_and(|c| !c.is_empty())
    }

    /// The single reagent product, if there is exactly one.
    pub fn reagent_result(&self) -> Option<(&str, f64)> {
        let products = self.products.as_ref()?;
        if products.len() != 1 {
            return None;
        }
        products.iter().next().map(|(id, amount)| (id.as_str(), *amount))
    }

    /// The single spawned entity, if exactly one effect spawns an entity.
    pub fn solid_result(&self) -> Option<&str> {
        let mut result = None;
        for effect in &self.effects {
            if let ReactionEffect::SpawnEntity { entity } = effect {
                if result.is_some() {
                    return None;
                }
                result = Some(entity.as_str());
            }
        }
        result
    }
}

/// A reaction effect. Effects carry their kind in a `!type` field; only
/// effects that spawn an entity matter here.
#[derive(Debug, Clone, PartialEq)]
pub enum ReactionEffect {
    SpawnEntity { entity: EntityId },
    Other,
}

impl<'de> Deserialize<'de> for ReactionEffect {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let kind = value.get("!type").and_then(serde_json::Value::as_str);
        let entity = value.get("entity").and_then(serde_json::Value::as_str);
        Ok(match (kind, entity) {
            (Some("CreateEntityReactionEffect" | "SpawnEntity"), Some(entity)) => {
                ReactionEffect::SpawnEntity {
                    entity: entity.to_string(),
                }
            }
            _ => ReactionEffect::Other,
        })
    }
}

// ===========================================================================
// Tests
// ===========================================================================
