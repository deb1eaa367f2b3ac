//! The raw prototype store: every loaded record keyed by ID.

use std::collections::{BTreeMap, HashSet};

use crate::error::BuildError;
use crate::id::{EntityId, ReagentId};
use crate::prototype::{
    ConstructionGraphPrototype, EntityPrototype, MicrowaveRecipePrototype, Prototype,
    ReactionPrototype, ReagentPrototype, StackPrototype,
};

/// All prototypes loaded for one fork.
///
/// Keyed records replace earlier definitions with the same ID; recipes and
/// reactions keep their load order.
#[derive(Debug, Clone, Default)]
pub struct RawGameData {
    pub entities: BTreeMap<EntityId, EntityPrototype>,
    pub reagents: BTreeMap<ReagentId, ReagentPrototype>,
    pub stacks: BTreeMap<String, StackPrototype>,
    pub construction_graphs: BTreeMap<String, ConstructionGraphPrototype>,
    pub recipes: Vec<MicrowaveRecipePrototype>,
    pub reactions: Vec<ReactionPrototype>,
}

impl RawGameData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files a single prototype document. Unrelated kinds are dropped.
    pub fn insert(&mut self, prototype: Prototype) {
        match prototype {
            Prototype::Entity(entity) => {
                self.entities.insert(entity.id.clone(), entity);
            }
            Prototype::Reagent(reagent) => {
                self.reagents.insert(reagent.id.clone(), reagent);
            }
            Prototype::Stack(stack) => {
                self.stacks.insert(stack.id.clone(), stack);
            }
            Prototype::ConstructionGraph(graph) => {
                self.construction_graphs.insert(graph.id.clone(), graph);
            }
            Prototype::MicrowaveRecipe(recipe) => self.recipes.push(recipe),
            Prototype::Reaction(reaction) => self.reactions.push(reaction),
            Prototype::Unrelated => {}
        }
    }

    /// The entity a solid ingredient really refers to: ingredients may name
    /// a stack, in which case the stack's spawned entity is meant.
    pub fn solid_entity<'a>(&'a self, id: &'a str) -> &'a str {
        self.stacks.get(id).map_or(id, |stack| stack.spawn.as_str())
    }

    /// The entity and all of its ancestors, root first, the entity last.
    ///
    /// Parents are visited in declaration order and each parent's own
    /// ancestors come before it. An ancestor reachable through more than one
    /// path is visited once, at its first position.
    pub fn ancestry<'a>(&'a self, entity: &'a EntityPrototype) -> Result<Vec<&'a EntityPrototype>, BuildError> {
        let mut chain = Vec::new();
        let mut done = HashSet::new();
        let mut visiting = Vec::new();
        self.visit_ancestry(entity, &mut chain, &mut done, &mut visiting)?;
        Ok(chain)
    }

    fn visit_ancestry<'a>(
        &'a self,
        entity: &'a EntityPrototype,
        chain: &mut Vec<&'a EntityPrototype>,
        done: &mut HashSet<&'a str>,
        visiting: &mut Vec<&'a str>,
    ) -> Result<(), BuildError> {
        if done.contains(entity.id.as_str()) {
            return Ok(());
        }
        if visiting.contains(&entity.id.as_str()) {
            return Err(BuildError::InheritanceCycle(entity.id.clone()));
        }

        visiting.push(&entity.id);
        for parent_id in entity.parents() {
            let parent = self
                .entities
                .get(parent_id)
                .ok_or_else(|| BuildError::UnknownParent {
                    entity: entity.id.clone(),
                    parent: parent_id.clone(),
                })?;
            self.visit_ancestry(parent, chain, done, visiting)?;
        }
        visiting.pop();

        done.insert(&entity.id);
        chain.push(entity);
        Ok(())
    }
}

impl Extend<Prototype> for RawGameData {
    fn extend<I: IntoIterator<Item = Prototype>>(&mut self, iter: I) {
        for prototype in iter {
            self.insert(prototype);
        }
    }
}

impl FromIterator<Prototype> for RawGameData {
    fn from_iter<I: IntoIterator<Item = Prototype>>(iter: I) -> Self {
        let mut raw = Self::new();
        raw.extend(iter);
        raw
    }
}
