//! Special diets and highlighted reagents.
//!
//! Each configured diet or reagent becomes a [`SpecialTrait`] with its own
//! bit. Entities carry the OR of the bits of every trait they match.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::BuildError;
use crate::id::{EntityId, ReagentId};
use crate::resolve::ResolvedEntity;

/// Presentation of a trait marker and its recipe filter toggle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct TraitDisplay {
    /// CSS colour of the marker.
    pub color: String,
    pub hint: String,
    pub filter_name: String,
    pub filter_summary: String,
}

/// A diet defined by what an organ's stomach can digest.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpecialDiet {
    /// Entity with a stomach that filters by tag or component.
    pub organ: EntityId,
    #[serde(default)]
    pub exclude_foods_with: Vec<ReagentId>,
    #[serde(flatten)]
    pub display: TraitDisplay,
}

/// A reagent whose presence in a food is highlighted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpecialReagent {
    pub id: ReagentId,
    #[serde(flatten)]
    pub display: TraitDisplay,
}

#[derive(Debug, Clone, PartialEq)]
enum TraitMatcher {
    Diet {
        tags: BTreeSet<String>,
        components: BTreeSet<String>,
        exclude: Vec<ReagentId>,
    },
    Reagent(ReagentId),
}

/// A resolved diet or reagent trait with its assigned bit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecialTrait {
    pub mask: u32,
    #[serde(flatten)]
    pub display: TraitDisplay,
    #[serde(skip)]
    matcher: TraitMatcher,
}

impl SpecialTrait {
    pub fn matches(&self, entity: &ResolvedEntity) -> bool {
        match &self.matcher {
            TraitMatcher::Diet {
                tags,
                components,
                exclude,
            } => {
                let digestible = entity.tags.iter().any(|t| tags.contains(t))
                    || entity.components.iter().any(|c| components.contains(c));
                digestible && !exclude.iter().any(|r| entity.reagents.contains(r))
            }
            TraitMatcher::Reagent(reagent) => entity.reagents.contains(reagent),
        }
    }
}

/// Assigns bits in order (diets first) and captures each diet's whitelist
/// from its organ.
pub fn resolve_specials(
    entities: &BTreeMap<EntityId, ResolvedEntity>,
    diets: &[SpecialDiet],
    reagents: &[SpecialReagent],
) -> Result<Vec<SpecialTrait>, BuildError> {
    let mut traits = Vec::with_capacity(diets.len() + reagents.len());

    for diet in diets {
        let organ = entities
            .get(&diet.organ)
            .ok_or_else(|| BuildError::UnresolvedEntity(diet.organ.clone()))?;
        let stomach = organ
            .stomach
            .as_ref()
            .ok_or_else(|| BuildError::OrganWithoutStomach(diet.organ.clone()))?;
        traits.push(SpecialTrait {
            mask: 1 << traits.len(),
            display: diet.display.clone(),
            matcher: TraitMatcher::Diet {
                tags: stomach.tags.iter().cloned().collect(),
                components: stomach.components.iter().cloned().collect(),
                exclude: diet.exclude_foods_with.clone(),
            },
        });
    }

    for reagent in reagents {
        traits.push(SpecialTrait {
            mask: 1 << traits.len(),
            display: reagent.display.clone(),
            matcher: TraitMatcher::Reagent(reagent.id.clone()),
        });
    }

    Ok(traits)
}

/// The OR of the masks of every trait the entity matches.
pub fn traits_mask(entity: &ResolvedEntity, traits: &[SpecialTrait]) -> u32 {
    traits
        .iter()
        .filter(|t| t.matches(entity))
        .fold(0, |mask, t| mask | t.mask)
}
