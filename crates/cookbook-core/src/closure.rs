//! The relevance filter.
//!
//! Starting from the declared recipes, computes the smallest set of entities,
//! reagents, inferred recipes and reactions that has to ship for every
//! recipe to be complete.
//!
//! # Algorithm
//!
//! 1. **Seed.** Every declared recipe that is not ignored marks its result,
//!    its solid ingredients (through stacks) and its reagents as used.
//! 2. **Inferred recipes.** Every entity's facets are turned into candidate
//!    recipes. Heat and deep-fry candidates are accepted straight away. Cut
//!    and roll candidates wait on their target entity and are accepted when
//!    that entity is first marked used. Newly used entities go on a queue,
//!    and draining the queue releases the candidates waiting on them.
//! 3. **Reactions.** Reactions that produce one solid are accepted if that
//!    solid is used. Reactions that produce one reagent wait on it. Accepting
//!    a reaction marks its reactants used, and the reagent queue releases
//!    the reactions waiting on them.
//! 4. **Sources.** Produce that yields a used reagent is marked used. This
//!    step does not feed back into 2 or 3.
//! 5. **Finalize.** Every used ID is resolved; a missing one is fatal.
//!
//! Accepted recipes are deduplicated by key and the first one wins. The
//! converged entity and reagent sets do not depend on scan order.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::config::{FilterConfig, is_food_related_group};
use crate::construction::{ConstructionOutcome, classify_construction};
use crate::error::BuildError;
use crate::id::{EntityId, ReagentId, RecipeKey, special_recipe_key};
use crate::prototype::{MicrowaveRecipePrototype, ReactionPrototype, ReagentPrototype};
use crate::recipe::{Recipe, RecipeMethod};
use crate::resolve::ResolvedEntity;
use crate::sources::{ReagentSources, apply_forced_sources, index_reagent_sources};
use crate::store::RawGameData;

/// The closed dataset produced by [`filter_relevant`].
#[derive(Debug, Clone, Default)]
pub struct PrunedGameData {
    pub entities: BTreeMap<EntityId, ResolvedEntity>,
    pub reagents: BTreeMap<ReagentId, ReagentPrototype>,
    /// Declared recipes that were not ignored, in load order.
    pub recipes: Vec<MicrowaveRecipePrototype>,
    /// Accepted reactions, in load order.
    pub reactions: Vec<ReactionPrototype>,
    /// Recipes inferred from entity facets.
    pub special_recipes: BTreeMap<RecipeKey, Recipe>,
    pub reagent_sources: ReagentSources,
}

/// Computes the closure over `raw`.
///
/// `entities` must hold the resolved view of every entity in `raw`.
pub fn filter_relevant(
    raw: &RawGameData,
    entities: &BTreeMap<EntityId, ResolvedEntity>,
    config: &FilterConfig,
) -> Result<PrunedGameData, BuildError> {
    let order: Vec<&ResolvedEntity> = entities.values().collect();
    filter_relevant_in_order(raw, entities, &order, config)
}

/// [`filter_relevant`] with an explicit entity scan order.
///
/// Reactions are scanned in the order of `raw.reactions`.
pub fn filter_relevant_in_order(
    raw: &RawGameData,
    entities: &BTreeMap<EntityId, ResolvedEntity>,
    order: &[&ResolvedEntity],
    config: &FilterConfig,
) -> Result<PrunedGameData, BuildError> {
    let mut closure = Closure::new(raw, config);

    let recipes = closure.seed();
    closure.infer_special_recipes(order);
    let reactions = closure.accept_reactions();
    let reagent_sources = closure.index_sources(order);

    closure
        .used_entities
        .extend(config.required_entities.iter().cloned());

    closure.finalize(entities, recipes, reactions, reagent_sources)
}

// ===========================================================================
// Candidates
// ===========================================================================

/// A recipe inferred from one entity facet, before it is accepted.
#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    source: EntityId,
    result: EntityId,
    method: RecipeMethod,
}

impl Candidate {
    /// Cut and roll recipes only matter if their result is already needed.
    fn is_gated(&self) -> bool {
        matches!(self.method, RecipeMethod::Cut { .. } | RecipeMethod::Roll)
    }

    fn key(&self) -> RecipeKey {
        special_recipe_key(self.method.kind(), &self.source)
    }
}

// ===========================================================================
// Closure state
// ===========================================================================

struct Closure<'a> {
    raw: &'a RawGameData,
    config: &'a FilterConfig,
    used_entities: BTreeSet<EntityId>,
    used_reagents: BTreeSet<ReagentId>,
    entity_queue: VecDeque<EntityId>,
    reagent_queue: VecDeque<ReagentId>,
    special_recipes: BTreeMap<RecipeKey, Recipe>,
}

impl<'a> Closure<'a> {
    fn new(raw: &'a RawGameData, config: &'a FilterConfig) -> Self {
        Self {
            raw,
            config,
            used_entities: BTreeSet::new(),
            used_reagents: BTreeSet::new(),
            entity_queue: VecDeque::new(),
            reagent_queue: VecDeque::new(),
            special_recipes: BTreeMap::new(),
        }
    }

    fn use_entity(&mut self, id: &str) {
        if self.used_entities.insert(id.to_string()) {
            self.entity_queue.push_back(id.to_string());
        }
    }

    fn use_reagent(&mut self, id: &str) {
        if self.used_reagents.insert(id.to_string()) {
            self.reagent_queue.push_back(id.to_string());
        }
    }

    // -----------------------------------------------------------------------
    // Step 1: seed
    // -----------------------------------------------------------------------

    fn seed(&mut self) -> Vec<MicrowaveRecipePrototype> {
        let raw = self.raw;
        let mut recipes = Vec::new();
        for recipe in &raw.recipes {
            if self.config.ignored_recipes.contains(&recipe.id) {
                continue;
            }
            self.use_entity(&recipe.result);
            for id in recipe.solids.iter().flat_map(|s| s.keys()) {
                self.use_entity(raw.solid_entity(id));
            }
            for id in recipe.reagents.iter().flat_map(|r| r.keys()) {
                self.use_reagent(id);
            }
            recipes.push(recipe.clone());
        }
        recipes
    }

    // -----------------------------------------------------------------------
    // Step 2: recipes inferred from entity facets
    // -----------------------------------------------------------------------

    fn candidates(&self, entity: &ResolvedEntity) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        // Slicing and constructing are not exclusive: dough can be cut into
        // slices or rolled flat.
        if let Some(sliceable) = &entity.sliceable_food
            && let Some(slice) = &sliceable.slice
        {
            candidates.push(Candidate {
                source: entity.id.clone(),
                result: slice.clone(),
                method: RecipeMethod::Cut {
                    max_count: sliceable.count,
                },
            });
        }

        if let Some(state) = &entity.construction {
            for outcome in classify_construction(&entity.id, state, &self.raw.construction_graphs) {
                let (result, method) = match outcome {
                    ConstructionOutcome::Roll { result } => (result, RecipeMethod::Roll),
                    ConstructionOutcome::Heat { result, min_temp } => (result, RecipeMethod::Heat { min_temp }),
                };
                let candidate = Candidate {
                    source: entity.id.clone(),
                    result,
                    method,
                };
                if !self.config.ignored_special_recipes.contains(&candidate.key()) {
                    candidates.push(candidate);
                }
            }
        }

        if let Some(output) = &entity.deep_fry_output {
            candidates.push(Candidate {
                source: entity.id.clone(),
                result: output.clone(),
                method: RecipeMethod::DeepFry,
            });
        }

        candidates
    }

    fn infer_special_recipes(&mut self, order: &[&ResolvedEntity]) {
        let mut waiting: HashMap<EntityId, Vec<Candidate>> = HashMap::new();

        for entity in order {
            for candidate in self.candidates(entity) {
                if candidate.is_gated() && !self.used_entities.contains(&candidate.result) {
                    waiting.entry(candidate.result.clone()).or_default().push(candidate);
                } else {
                    self.accept_candidate(candidate);
                }
            }
        }

        while let Some(id) = self.entity_queue.pop_front() {
            for candidate in waiting.remove(&id).into_iter().flatten() {
                self.accept_candidate(candidate);
            }
        }
    }

    fn accept_candidate(&mut self, candidate: Candidate) {
        let key = candidate.key();
        if self.special_recipes.contains_key(&key) {
            debug!("Dropping duplicate inferred recipe {key} -> {}", candidate.result);
            return;
        }
        self.use_entity(&candidate.source);
        self.use_entity(&candidate.result);
        let recipe = Recipe::single_solid(candidate.method, &candidate.source, &candidate.result);
        self.special_recipes.insert(key, recipe);
    }

    // -----------------------------------------------------------------------
    // Step 3: reactions
    // -----------------------------------------------------------------------

    fn accept_reactions(&mut self) -> Vec<ReactionPrototype> {
        let raw = self.raw;
        let mut accepted = BTreeSet::new();
        let mut accepted_ids = HashSet::new();
        let mut waiting: HashMap<&str, Vec<usize>> = HashMap::new();

        for (index, reaction) in raw.reactions.iter().enumerate() {
            // Centrifuges, electrolysers and the like are out of scope.
            if reaction.requires_mixer() {
                continue;
            }
            match (reaction.reagent_result(), reaction.solid_result()) {
                (Some((product, _)), None) => {
                    let group = raw.reagents.get(product).and_then(|r| r.group.as_deref());
                    if is_food_related_group(group) {
                        waiting.entry(product).or_default().push(index);
                    }
                }
                (None, Some(solid)) => {
                    if self.used_entities.contains(solid) {
                        self.accept_reaction(index, &mut accepted, &mut accepted_ids);
                    }
                }
                // Neither or both.
                _ => {}
            }
        }

        while let Some(id) = self.reagent_queue.pop_front() {
            for index in waiting.remove(id.as_str()).into_iter().flatten() {
                self.accept_reaction(index, &mut accepted, &mut accepted_ids);
            }
        }

        accepted.into_iter().map(|i| raw.reactions[i].clone()).collect()
    }

    fn accept_reaction(&mut self, index: usize, accepted: &mut BTreeSet<usize>, accepted_ids: &mut HashSet<&'a str>) {
        let raw = self.raw;
        let reaction = &raw.reactions[index];
        if !accepted_ids.insert(reaction.id.as_str()) {
            debug!("Dropping duplicate reaction {}", reaction.id);
            return;
        }
        accepted.insert(index);
        for reactant in reaction.reactants.keys() {
            self.use_reagent(reactant);
        }
    }

    // -----------------------------------------------------------------------
    // Step 4: reagent sources
    // -----------------------------------------------------------------------

    fn index_sources(&mut self, order: &[&ResolvedEntity]) -> ReagentSources {
        let mut sources = index_reagent_sources(order.iter().copied(), &self.used_reagents, self.config);
        for list in sources.values() {
            self.used_entities.extend(list.iter().cloned());
        }
        apply_forced_sources(&mut sources, &mut self.used_entities, &self.used_reagents, self.config);
        sources
    }

    // -----------------------------------------------------------------------
    // Step 5: finalize
    // -----------------------------------------------------------------------

    fn finalize(
        self,
        entities: &BTreeMap<EntityId, ResolvedEntity>,
        recipes: Vec<MicrowaveRecipePrototype>,
        reactions: Vec<ReactionPrototype>,
        reagent_sources: ReagentSources,
    ) -> Result<PrunedGameData, BuildError> {
        let entities = self
            .used_entities
            .iter()
            .map(|id| {
                let entity = entities
                    .get(id)
                    .ok_or_else(|| BuildError::UnresolvedEntity(id.clone()))?;
                Ok((id.clone(), entity.clone()))
            })
            .collect::<Result<BTreeMap<_, _>, BuildError>>()?;

        let reagents = self
            .used_reagents
            .iter()
            .map(|id| {
                let reagent = self
                    .raw
                    .reagents
                    .get(id)
                    .ok_or_else(|| BuildError::UnresolvedReagent(id.clone()))?;
                Ok((id.clone(), reagent.clone()))
            })
            .collect::<Result<BTreeMap<_, _>, BuildError>>()?;

        Ok(PrunedGameData {
            entities,
            reagents,
            recipes,
            reactions,
            special_recipes: self.special_recipes,
            reagent_sources,
        })
    }
}

// ===========================================================================
// Tests
// ===========================================================================
