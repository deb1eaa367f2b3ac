//! Normalized recipe records.
//!
//! Every recipe source (declared microwave recipes, reactions and recipes
//! inferred from entity facets) ends up as a [`Recipe`]: a common ingredient
//! and result shape plus a [`RecipeMethod`] carrying the method-specific
//! fields.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::BuildError;
use crate::id::{EntityId, ReagentId};
use crate::prototype::OneOrMany;

/// Recipe group used when a recipe does not declare one.
pub const DEFAULT_RECIPE_GROUP: &str = "Other";

// ===========================================================================
// Recipe kinds
// ===========================================================================

/// The method discriminator of a recipe, without any payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecipeKind {
    Microwave,
    Mix,
    Cut,
    Roll,
    Heat,
    DeepFry,
    Construct,
}

impl RecipeKind {
    pub const ALL: [RecipeKind; 7] = [
        RecipeKind::Microwave,
        RecipeKind::Mix,
        RecipeKind::Cut,
        RecipeKind::Roll,
        RecipeKind::Heat,
        RecipeKind::DeepFry,
        RecipeKind::Construct,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecipeKind::Microwave => "microwave",
            RecipeKind::Mix => "mix",
            RecipeKind::Cut => "cut",
            RecipeKind::Roll => "roll",
            RecipeKind::Heat => "heat",
            RecipeKind::DeepFry => "deepFry",
            RecipeKind::Construct => "construct",
        }
    }
}

impl std::fmt::Display for RecipeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ===========================================================================
// Recipe record
// ===========================================================================

/// A reagent consumed by a recipe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReagentIngredient {
    #[serde(default)]
    pub amount: f64,
    /// Catalysts are required but not consumed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub catalyst: bool,
}

impl ReagentIngredient {
    pub fn new(amount: f64) -> Self {
        Self {
            amount,
            catalyst: false,
        }
    }
}

/// A normalized recipe.
///
/// At most one of `solid_result` and `reagent_result` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(flatten)]
    pub method: RecipeMethod,
    pub solid_result: Option<EntityId>,
    pub reagent_result: Option<ReagentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_qty: Option<u32>,
    pub solids: BTreeMap<EntityId, u32>,
    pub reagents: BTreeMap<ReagentId, ReagentIngredient>,
    pub group: String,
}

impl Recipe {
    /// A recipe turning one `source` entity into one `result` entity, the
    /// shape shared by every recipe inferred from an entity facet.
    pub fn single_solid(method: RecipeMethod, source: &str, result: &str) -> Self {
        Self {
            method,
            solid_result: Some(result.to_string()),
            reagent_result: None,
            result_qty: None,
            solids: BTreeMap::from([(source.to_string(), 1)]),
            reagents: BTreeMap::new(),
            group: DEFAULT_RECIPE_GROUP.to_string(),
        }
    }

    pub fn kind(&self) -> RecipeKind {
        self.method.kind()
    }
}

/// Method-specific recipe data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RecipeMethod {
    Microwave {
        time: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        subtype: Option<OneOrMany<String>>,
    },
    Mix {
        result_amount: f64,
        min_temp: f64,
        max_temp: Option<f64>,
    },
    Cut {
        max_count: u32,
    },
    Roll,
    Heat {
        min_temp: f64,
    },
    DeepFry,
    Construct {
        main_verb: Option<ConstructVerb>,
        steps: Vec<ConstructionStep>,
    },
}

impl RecipeMethod {
    pub fn kind(&self) -> RecipeKind {
        match self {
            RecipeMethod::Microwave { .. } => RecipeKind::Microwave,
            RecipeMethod::Mix { .. } => RecipeKind::Mix,
            RecipeMethod::Cut { .. } => RecipeKind::Cut,
            RecipeMethod::Roll => RecipeKind::Roll,
            RecipeMethod::Heat { .. } => RecipeKind::Heat,
            RecipeMethod::DeepFry => RecipeKind::DeepFry,
            RecipeMethod::Construct { .. } => RecipeKind::Construct,
        }
    }
}

// ===========================================================================
// Construct recipes
// ===========================================================================

/// The dominant action of a construct recipe, used for its icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstructVerb {
    Mix,
    Heat,
    Cut,
    Roll,
}

/// One step of a construct recipe.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ConstructionStep {
    Start {
        entity: EntityId,
    },
    End {
        entity: EntityId,
    },
    Mix {
        reagents: BTreeMap<ReagentId, ReagentIngredient>,
    },
    Add {
        entity: OneOrMany<EntityId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        min_count: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_count: Option<u32>,
    },
    Heat {
        min_temp: f64,
    },
    HeatMixture {
        min_temp: f64,
        max_temp: Option<f64>,
    },
    Cut,
    Roll,
    Stir,
    Shake,
}

impl ConstructionStep {
    /// The verb this step contributes, if any.
    pub fn verb(&self) -> Option<ConstructVerb> {
        match self {
            ConstructionStep::Mix { .. } | ConstructionStep::Stir | ConstructionStep::Shake => {
                Some(ConstructVerb::Mix)
            }
            ConstructionStep::Heat { .. } | ConstructionStep::HeatMixture { .. } => {
                Some(ConstructVerb::Heat)
            }
            ConstructionStep::Cut => Some(ConstructVerb::Cut),
            ConstructionStep::Roll => Some(ConstructVerb::Roll),
            ConstructionStep::Start { .. }
            | ConstructionStep::End { .. }
            | ConstructionStep::Add { .. } => None,
        }
    }
}

/// Incrementally assembles a construct recipe from its steps.
///
/// Ingredients are collected from the steps as they are pushed; the builder
/// is consumed by [`ConstructRecipeBuilder::build`] to produce an immutable
/// [`Recipe`].
#[derive(Debug, Clone)]
pub struct ConstructRecipeBuilder {
    group: String,
    solid_result: Option<EntityId>,
    reagent_result: Option<ReagentId>,
    result_qty: Option<u32>,
    solids: BTreeMap<EntityId, u32>,
    reagents: BTreeMap<ReagentId, ReagentIngredient>,
    steps: Vec<ConstructionStep>,
}

impl Default for ConstructRecipeBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_RECIPE_GROUP)
    }
}

impl ConstructRecipeBuilder {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            solid_result: None,
            reagent_result: None,
            result_qty: None,
            solids: BTreeMap::new(),
            reagents: BTreeMap::new(),
            steps: Vec::new(),
        }
    }

    pub fn with_solid_result(mut self, entity: impl Into<EntityId>) -> Result<Self, BuildError> {
        if self.reagent_result.is_some() {
            return Err(BuildError::ConflictingResults);
        }
        self.solid_result = Some(entity.into());
        Ok(self)
    }

    pub fn with_reagent_result(mut self, reagent: impl Into<ReagentId>) -> Result<Self, BuildError> {
        if self.solid_result.is_some() {
            return Err(BuildError::ConflictingResults);
        }
        self.reagent_result = Some(reagent.into());
        Ok(self)
    }

    pub fn with_result_qty(mut self, qty: u32) -> Self {
        self.result_qty = Some(qty);
        self
    }

    pub fn push_step(mut self, step: ConstructionStep) -> Self {
        self.collect_ingredients(&step);
        self.steps.push(step);
        self
    }

    pub fn start_with(self, entity: impl Into<EntityId>) -> Self {
        self.push_step(ConstructionStep::Start {
            entity: entity.into(),
        })
    }

    pub fn end_with(self, entity: impl Into<EntityId>) -> Self {
        self.push_step(ConstructionStep::End {
            entity: entity.into(),
        })
    }

    pub fn mix(self, reagents: BTreeMap<ReagentId, ReagentIngredient>) -> Self {
        self.push_step(ConstructionStep::Mix { reagents })
    }

    pub fn add(self, entity: OneOrMany<EntityId>, min_count: Option<u32>, max_count: Option<u32>) -> Self {
        self.push_step(ConstructionStep::Add {
            entity,
            min_count,
            max_count,
        })
    }

    pub fn heat(self, min_temp: f64) -> Self {
        self.push_step(ConstructionStep::Heat { min_temp })
    }

    pub fn heat_mixture(self, min_temp: f64, max_temp: Option<f64>) -> Self {
        self.push_step(ConstructionStep::HeatMixture { min_temp, max_temp })
    }

    pub fn cut(self) -> Self {
        self.push_step(ConstructionStep::Cut)
    }

    pub fn roll(self) -> Self {
        self.push_step(ConstructionStep::Roll)
    }

    pub fn stir(self) -> Self {
        self.push_step(ConstructionStep::Stir)
    }

    pub fn shake(self) -> Self {
        self.push_step(ConstructionStep::Shake)
    }

    /// The single verb shared by every verb-bearing step, or `None` if the
    /// steps disagree (or none of them has a verb).
    pub fn main_verb(&self) -> Option<ConstructVerb> {
        let mut result = None;
        for verb in self.steps.iter().filter_map(ConstructionStep::verb) {
            match result {
                Some(existing) if existing != verb => return None,
                _ => result = Some(verb),
            }
        }
        result
    }

    pub fn build(self) -> Result<Recipe, BuildError> {
        if self.solid_result.is_none() && self.reagent_result.is_none() {
            return Err(BuildError::MissingResult);
        }
        let main_verb = self.main_verb();
        Ok(Recipe {
            method: RecipeMethod::Construct {
                main_verb,
                steps: self.steps,
            },
            solid_result: self.solid_result,
            reagent_result: self.reagent_result,
            result_qty: self.result_qty,
            solids: self.solids,
            reagents: self.reagents,
            group: self.group,
        })
    }

    fn collect_ingredients(&mut self, step: &ConstructionStep) {
        match step {
            ConstructionStep::Start { entity } | ConstructionStep::End { entity } => {
                self.solids.insert(entity.clone(), 1);
            }
            ConstructionStep::Add { entity, .. } => {
                for id in entity.as_slice() {
                    self.solids.insert(id.clone(), 1);
                }
            }
            // Construct recipes never show amounts.
            ConstructionStep::Mix { reagents } => {
                for id in reagents.keys() {
                    self.reagents.insert(id.clone(), ReagentIngredient::default());
                }
            }
            ConstructionStep::Heat { .. }
            | ConstructionStep::HeatMixture { .. }
            | ConstructionStep::Cut
            | ConstructionStep::Roll
            | ConstructionStep::Stir
            | ConstructionStep::Shake => {}
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
