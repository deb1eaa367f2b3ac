//! Inheritance resolution.
//!
//! An entity's resolved view is built by walking its ancestry root first and
//! folding every component into an [`EntityBuilder`]. Explicit field values
//! override inherited ones, field by field. Tag and whitelist lists are
//! replaced wholesale by the most specific ancestor that declares them.
//! Sprite layers merge by index.
//!
//! The builder is finished into an immutable [`ResolvedEntity`] once the walk
//! reaches the entity itself.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::error::BuildError;
use crate::id::{EntityId, ReagentId};
use crate::prototype::{Component, EntityPrototype, Solution, SpriteComponent, StomachComponent};
use crate::store::RawGameData;

/// Name given to entities that never declare one.
pub const DEFAULT_ENTITY_NAME: &str = "(name unknown)";

/// Slice count of a sliceable food that does not declare one.
pub const DEFAULT_TOTAL_SLICE_COUNT: u32 = 5;

/// Layer limit of a food sequence start point that does not declare one.
pub const DEFAULT_FOOD_SEQUENCE_MAX_LAYERS: u32 = 10;

/// The solution holding an entity's food reagents.
pub const FOOD_SOLUTION_NAME: &str = "food";

// ===========================================================================
// Resolved records
// ===========================================================================

/// The flattened view of an entity prototype and its ancestors.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntity {
    pub id: EntityId,
    pub name: String,
    pub sprite: ResolvedSprite,
    /// Every named solution, with the most specific definition of each name.
    pub solutions: BTreeMap<String, Solution>,
    /// Reagent IDs of the food solution; empty if there is none.
    pub reagents: BTreeSet<ReagentId>,
    pub tags: BTreeSet<String>,
    /// Names of every component declared anywhere in the ancestry.
    pub components: BTreeSet<String>,
    pub is_produce: bool,
    pub sliceable_food: Option<ResolvedSlice>,
    pub construction: Option<ResolvedConstruction>,
    pub extractable: Option<ResolvedExtractable>,
    pub deep_fry_output: Option<EntityId>,
    pub stomach: Option<ResolvedStomach>,
    pub food_sequence_start: Option<ResolvedFoodSequenceStart>,
    pub food_sequence_element: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedSprite {
    pub path: Option<String>,
    pub state: Option<String>,
    pub color: Option<String>,
    pub layers: Vec<ResolvedSpriteLayer>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSpriteLayer {
    pub path: Option<String>,
    pub state: Option<String>,
    pub color: Option<String>,
    pub visible: bool,
}

impl Default for ResolvedSpriteLayer {
    fn default() -> Self {
        Self {
            path: None,
            state: None,
            color: None,
            visible: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSlice {
    pub slice: Option<EntityId>,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedConstruction {
    pub graph: Option<String>,
    pub node: Option<String>,
    pub edge: Option<u32>,
    pub step: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedExtractable {
    pub grind_solution_name: Option<String>,
    /// Always given inline on the component, never looked up by name.
    pub juice_solution: Option<Solution>,
}

impl ResolvedExtractable {
    /// The solutions this entity yields when ground or juiced.
    pub fn solutions<'a>(&'a self, solutions: &'a BTreeMap<String, Solution>) -> Vec<&'a Solution> {
        let grind = self
            .grind_solution_name
            .as_ref()
            .and_then(|name| solutions.get(name));
        grind
            .into_iter()
            .chain(self.juice_solution.as_ref())
            .filter(|s| s.has_reagents())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedStomach {
    pub tags: Vec<String>,
    pub components: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFoodSequenceStart {
    pub key: Option<String>,
    pub max_layers: u32,
}

// ===========================================================================
// Builder
// ===========================================================================

/// Mutable accumulator for one entity's ancestry walk.
#[derive(Debug, Default)]
pub struct EntityBuilder {
    name: Option<String>,
    sprite: ResolvedSprite,
    solutions: BTreeMap<String, Solution>,
    tags: BTreeSet<String>,
    components: BTreeSet<String>,
    is_produce: bool,
    slice: Option<(Option<EntityId>, Option<u32>)>,
    construction: Option<ResolvedConstruction>,
    extractable: Option<ResolvedExtractable>,
    deep_fry_output: Option<EntityId>,
    stomach: Option<ResolvedStomach>,
    food_sequence_start: Option<(Option<String>, Option<u32>)>,
    food_sequence_element: Vec<String>,
}

impl EntityBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one prototype of the ancestry into the builder.
    pub fn apply(&mut self, prototype: &EntityPrototype) {
        if let Some(name) = &prototype.name {
            self.name = Some(name.clone());
        }
        for component in &prototype.components {
            self.components.insert(component.kind().to_string());
            self.apply_component(&prototype.id, component);
        }
    }

    fn apply_component(&mut self, owner: &str, component: &Component) {
        match component {
            Component::Sprite(sprite) => self.apply_sprite(sprite),
            Component::SolutionContainerManager(manager) => {
                if let Some(solutions) = &manager.solutions {
                    self.solutions = solutions.clone();
                }
            }
            Component::SliceableFood(sliceable) => {
                let (slice, count) = self.slice.get_or_insert((None, None));
                override_with(slice, &sliceable.slice);
                override_with(count, &sliceable.count);
            }
            Component::Extractable(extractable) => {
                let state = self.extractable.get_or_insert_with(Default::default);
                override_with(&mut state.grind_solution_name, &extractable.grindable_solution_name);
                override_with(&mut state.juice_solution, &extractable.juice_solution);
            }
            Component::Produce => self.is_produce = true,
            Component::Construction(construction) => {
                let state = self.construction.get_or_insert_with(Default::default);
                override_with(&mut state.graph, &construction.graph);
                override_with(&mut state.node, &construction.node);
                override_with(&mut state.edge, &construction.edge);
                override_with(&mut state.step, &construction.step);
            }
            Component::Tag(tag) => {
                if let Some(tags) = &tag.tags {
                    self.tags = tags.iter().cloned().collect();
                }
            }
            Component::Stomach(stomach) => self.apply_stomach(owner, stomach),
            Component::DeepFrySpawn(deep_fry) => {
                override_with(&mut self.deep_fry_output, &deep_fry.output);
            }
            Component::FoodSequenceStartPoint(start) => {
                let (key, max_layers) = self.food_sequence_start.get_or_insert((None, None));
                override_with(key, &start.key);
                override_with(max_layers, &start.max_layers);
            }
            Component::FoodSequenceElement(element) => {
                if let Some(entries) = &element.entries {
                    self.food_sequence_element = entries.keys().cloned().collect();
                }
            }
            Component::Other(_) => {}
        }
    }

    fn apply_sprite(&mut self, sprite: &SpriteComponent) {
        override_with(&mut self.sprite.path, &sprite.sprite);
        override_with(&mut self.sprite.state, &sprite.state);
        override_with(&mut self.sprite.color, &sprite.color);

        // A layer list replaces the inherited one, but each layer keeps
        // whatever the inherited layer at the same index set and it doesn't.
        if let Some(layers) = &sprite.layers {
            let mut inherited = std::mem::take(&mut self.sprite.layers).into_iter();
            self.sprite.layers = layers
                .iter()
                .map(|layer| {
                    let mut merged = inherited.next().unwrap_or_default();
                    override_with(&mut merged.path, &layer.sprite);
                    override_with(&mut merged.state, &layer.state);
                    override_with(&mut merged.color, &layer.color);
                    if let Some(visible) = layer.visible {
                        merged.visible = visible;
                    }
                    merged
                })
                .collect();
        }
    }

    fn apply_stomach(&mut self, owner: &str, stomach: &StomachComponent) {
        let state = self.stomach.get_or_insert_with(Default::default);
        let Some(whitelist) = &stomach.special_digestible else {
            return;
        };
        if whitelist.sizes.is_some() {
            warn!("Entity '{owner}': Stomach has unsupported size whitelist");
        }
        if let Some(tags) = &whitelist.tags {
            state.tags = tags.clone();
        }
        if let Some(components) = &whitelist.components {
            state.components = components.clone();
        }
    }

    /// Freezes the accumulated state into the resolved record.
    pub fn finish(self, id: &str) -> ResolvedEntity {
        let reagents = self
            .solutions
            .get(FOOD_SOLUTION_NAME)
            .map(|food| food.reagent_ids().map(str::to_string).collect())
            .unwrap_or_default();

        ResolvedEntity {
            id: id.to_string(),
            name: self.name.unwrap_or_else(|| DEFAULT_ENTITY_NAME.to_string()),
            sprite: self.sprite,
            solutions: self.solutions,
            reagents,
            tags: self.tags,
            components: self.components,
            is_produce: self.is_produce,
            sliceable_food: self.slice.map(|(slice, count)| ResolvedSlice {
                slice,
                count: count.unwrap_or(DEFAULT_TOTAL_SLICE_COUNT),
            }),
            construction: self.construction,
            extractable: self.extractable,
            deep_fry_output: self.deep_fry_output,
            stomach: self.stomach,
            food_sequence_start: self.food_sequence_start.map(|(key, max_layers)| {
                ResolvedFoodSequenceStart {
                    key,
                    max_layers: max_layers.unwrap_or(DEFAULT_FOOD_SEQUENCE_MAX_LAYERS),
                }
            }),
            food_sequence_element: self.food_sequence_element,
        }
    }
}

fn override_with<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
    if let Some(value) = value {
        *target = Some(value.clone());
    }
}

// ===========================================================================
// Entry points
// ===========================================================================

/// Resolves a single entity against the raw store.
pub fn resolve_entity(raw: &RawGameData, entity: &EntityPrototype) -> Result<ResolvedEntity, BuildError> {
    let mut builder = EntityBuilder::new();
    for prototype in raw.ancestry(entity)? {
        builder.apply(prototype);
    }
    Ok(builder.finish(&entity.id))
}

/// Resolves every entity in the raw store.
pub fn resolve_all(raw: &RawGameData) -> Result<BTreeMap<EntityId, ResolvedEntity>, BuildError> {
    raw.entities
        .values()
        .map(|entity| Ok((entity.id.clone(), resolve_entity(raw, entity)?)))
        .collect()
}

/// Entities whose ancestry could not be walked, with the reason.
pub type BrokenAncestries = BTreeMap<EntityId, BuildError>;

/// Resolves every entity with a sound ancestry.
///
/// Broken ancestries are logged and set aside. They only abort a build if
/// the entity turns out to be needed; see [`explain_unresolved`].
pub fn resolve_lenient(raw: &RawGameData) -> (BTreeMap<EntityId, ResolvedEntity>, BrokenAncestries) {
    let mut resolved = BTreeMap::new();
    let mut broken = BTreeMap::new();
    for entity in raw.entities.values() {
        match resolve_entity(raw, entity) {
            Ok(r) => {
                resolved.insert(entity.id.clone(), r);
            }
            Err(e) => {
                warn!("Skipping entity {}: {e}", entity.id);
                broken.insert(entity.id.clone(), e);
            }
        }
    }
    (resolved, broken)
}

/// Replaces an `UnresolvedEntity` with the ancestry error that left the entity unresolved.
pub fn explain_unresolved(err: BuildError, broken: &BrokenAncestries) -> BuildError {
    match err {
        BuildError::UnresolvedEntity(id) => broken.get(&id).cloned().unwrap_or(BuildError::UnresolvedEntity(id)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prototype::*;
    use crate::test_utils::*;

    fn resolve(raw: &RawGameData, id: &str) -> ResolvedEntity {
        resolve_entity(raw, &raw.entities[id]).unwrap()
    }

    // -----------------------------------------------------------------------
    // Scalars and defaults
    // -----------------------------------------------------------------------

    #[test]
    fn bare_entity_gets_defaults() {
        let raw = dataset(vec![entity("Thing", vec![])]);
        let resolved = resolve(&raw, "Thing");
        assert_eq!(resolved.name, DEFAULT_ENTITY_NAME);
        assert_eq!(resolved.sprite, ResolvedSprite::default());
        assert!(resolved.sliceable_food.is_none());
        assert!(resolved.components.is_empty());
        assert!(!resolved.is_produce);
    }

    #[test]
    fn child_name_overrides_parent() {
        let mut raw = dataset(vec![named("Base", "base"), derived("Child", &["Base"], vec![])]);
        assert_eq!(resolve(&raw, "Child").name, "base");

        raw.entities.get_mut("Child").unwrap().name = Some("child".into());
        assert_eq!(resolve(&raw, "Child").name, "child");
    }

    #[test]
    fn absent_fields_keep_inherited_values() {
        let raw = dataset(vec![
            entity("Base", vec![sliceable("BaseSlice", Some(4))]),
            derived("Child", &["Base"], vec![sliceable_count(8)]),
        ]);
        let slice = resolve(&raw, "Child").sliceable_food.unwrap();
        assert_eq!(slice.slice.as_deref(), Some("BaseSlice"));
        assert_eq!(slice.count, 8);
    }

    #[test]
    fn slice_count_defaults() {
        let raw = dataset(vec![entity("Cake", vec![sliceable("CakeSlice", None)])]);
        assert_eq!(resolve(&raw, "Cake").sliceable_food.unwrap().count, DEFAULT_TOTAL_SLICE_COUNT);
    }

    #[test]
    fn construction_fields_merge_individually() {
        let raw = dataset(vec![
            entity("Base", vec![construction("Dough", "start")]),
            derived(
                "Child",
                &["Base"],
                vec![Component::Construction(ConstructionComponent {
                    edge: Some(0),
                    ..Default::default()
                })],
            ),
        ]);
        let state = resolve(&raw, "Child").construction.unwrap();
        assert_eq!(state.graph.as_deref(), Some("Dough"));
        assert_eq!(state.node.as_deref(), Some("start"));
        assert_eq!(state.edge, Some(0));
        assert_eq!(state.step, None);
    }

    // -----------------------------------------------------------------------
    // Lists
    // -----------------------------------------------------------------------

    #[test]
    fn tags_are_replaced_not_unioned() {
        let raw = dataset(vec![
            entity("Base", vec![tags(&["Meat", "Raw"])]),
            derived("Child", &["Base"], vec![tags(&["Cooked"])]),
        ]);
        let resolved = resolve(&raw, "Child");
        assert_eq!(resolved.tags, BTreeSet::from(["Cooked".to_string()]));
    }

    #[test]
    fn component_presence_accumulates() {
        let raw = dataset(vec![
            entity("Base", vec![Component::Other("Item".into())]),
            derived("Child", &["Base"], vec![Component::Produce]),
        ]);
        let resolved = resolve(&raw, "Child");
        assert!(resolved.components.contains("Item"));
        assert!(resolved.components.contains("Produce"));
        assert!(resolved.is_produce);
    }

    #[test]
    fn stomach_whitelist_lists_replaced() {
        let raw = dataset(vec![
            entity("OrganBase", vec![stomach(&["Meat"], &["Food"])]),
            derived("OrganChild", &["OrganBase"], vec![stomach(&["Fruit"], &[])]),
        ]);
        let stomach = resolve(&raw, "OrganChild").stomach.unwrap();
        assert_eq!(stomach.tags, vec!["Fruit".to_string()]);
        assert!(stomach.components.is_empty());
    }

    #[test]
    fn stomach_size_whitelist_is_tolerated() {
        let raw = dataset(vec![entity(
            "Organ",
            vec![Component::Stomach(StomachComponent {
                special_digestible: Some(EntityWhitelist {
                    tags: Some(vec!["Meat".into()]),
                    components: None,
                    sizes: Some(vec!["Tiny".into()]),
                }),
            })],
        )]);
        let stomach = resolve(&raw, "Organ").stomach.unwrap();
        assert_eq!(stomach.tags, vec!["Meat".to_string()]);
    }

    // -----------------------------------------------------------------------
    // Sprites
    // -----------------------------------------------------------------------

    #[test]
    fn sprite_layers_merge_by_index() {
        let parent_sprite = SpriteComponent {
            sprite: Some("Objects/cake.rsi".into()),
            state: Some("plain".into()),
            color: None,
            layers: Some(vec![
                SpriteLayerData {
                    state: Some("base".into()),
                    color: Some("#ff0000".into()),
                    ..Default::default()
                },
                SpriteLayerData {
                    state: Some("icing".into()),
                    ..Default::default()
                },
            ]),
        };
        let child_sprite = SpriteComponent {
            layers: Some(vec![
                SpriteLayerData::default(),
                SpriteLayerData {
                    visible: Some(false),
                    ..Default::default()
                },
                SpriteLayerData {
                    sprite: Some("Objects/candle.rsi".into()),
                    state: Some("lit".into()),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        };
        let raw = dataset(vec![
            entity("Base", vec![Component::Sprite(parent_sprite)]),
            derived("Child", &["Base"], vec![Component::Sprite(child_sprite)]),
        ]);

        let sprite = resolve(&raw, "Child").sprite;
        assert_eq!(sprite.path.as_deref(), Some("Objects/cake.rsi"));
        assert_eq!(sprite.state.as_deref(), Some("plain"));
        assert_eq!(sprite.layers.len(), 3);
        assert_eq!(sprite.layers[0].state.as_deref(), Some("base"));
        assert_eq!(sprite.layers[0].color.as_deref(), Some("#ff0000"));
        assert_eq!(sprite.layers[1].state.as_deref(), Some("icing"));
        assert!(!sprite.layers[1].visible);
        assert_eq!(sprite.layers[2].path.as_deref(), Some("Objects/candle.rsi"));
        assert!(sprite.layers[2].visible);
    }

    // -----------------------------------------------------------------------
    // Solutions
    // -----------------------------------------------------------------------

    #[test]
    fn food_reagents_come_from_food_solution() {
        let raw = dataset(vec![entity(
            "FoodApple",
            vec![solutions(&[
                ("food", &[("Nutriment", 5.0), ("Vitamin", 1.0)]),
                ("juice", &[("JuiceApple", 10.0)]),
            ])],
        )]);
        let resolved = resolve(&raw, "FoodApple");
        assert_eq!(
            resolved.reagents,
            BTreeSet::from(["Nutriment".to_string(), "Vitamin".to_string()])
        );
        assert_eq!(resolved.solutions.len(), 2);
    }

    #[test]
    fn solution_map_is_replaced_by_child() {
        let raw = dataset(vec![
            entity(
                "Base",
                vec![solutions(&[("food", &[("Nutriment", 5.0)]), ("juice", &[("Water", 1.0)])])],
            ),
            derived("Child", &["Base"], vec![solutions(&[("food", &[("Sugar", 5.0)])])]),
        ]);
        let resolved = resolve(&raw, "Child");
        assert_eq!(resolved.reagents, BTreeSet::from(["Sugar".to_string()]));
        assert_eq!(resolved.solutions.keys().collect::<Vec<_>>(), vec!["food"]);
    }

    #[test]
    fn solution_map_without_solutions_keeps_inherited() {
        let raw = dataset(vec![
            entity("Base", vec![solutions(&[("juice", &[("Water", 1.0)])])]),
            derived(
                "Child",
                &["Base"],
                vec![Component::SolutionContainerManager(SolutionContainerManagerComponent { solutions: None })],
            ),
        ]);
        let resolved = resolve(&raw, "Child");
        assert!(resolved.solutions.contains_key("juice"));
    }

    #[test]
    fn dropped_grind_solution_is_not_extracted() {
        let raw = dataset(vec![
            entity(
                "FoodBase",
                vec![
                    solutions(&[("food", &[("Nutriment", 5.0)]), ("grind", &[("Flour", 5.0)])]),
                    extractable(Some("grind"), &[]),
                ],
            ),
            derived("FoodChild", &["FoodBase"], vec![solutions(&[("food", &[("Nutriment", 3.0)])])]),
        ]);
        let resolved = resolve(&raw, "FoodChild");
        let extractable = resolved.extractable.as_ref().unwrap();
        assert!(extractable.solutions(&resolved.solutions).is_empty());
    }

    #[test]
    fn extractable_solutions_grind_and_juice() {
        let raw = dataset(vec![entity(
            "FoodTomato",
            vec![
                Component::Produce,
                solutions(&[("food", &[("Nutriment", 5.0)])]),
                extractable(Some("food"), &[("JuiceTomato", 10.0)]),
            ],
        )]);
        let resolved = resolve(&raw, "FoodTomato");
        let extractable = resolved.extractable.as_ref().unwrap();
        let found = extractable.solutions(&resolved.solutions);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].reagent_ids().collect::<Vec<_>>(), vec!["Nutriment"]);
        assert_eq!(found[1].reagent_ids().collect::<Vec<_>>(), vec!["JuiceTomato"]);
    }

    #[test]
    fn extractable_missing_grind_solution_is_skipped() {
        let raw = dataset(vec![entity("Rock", vec![extractable(Some("missing"), &[])])]);
        let resolved = resolve(&raw, "Rock");
        let extractable = resolved.extractable.as_ref().unwrap();
        assert!(extractable.solutions(&resolved.solutions).is_empty());
    }

    // -----------------------------------------------------------------------
    // Food sequences
    // -----------------------------------------------------------------------

    #[test]
    fn food_sequence_facets() {
        let raw = dataset(vec![entity(
            "FoodBun",
            vec![
                Component::FoodSequenceStartPoint(FoodSequenceStartPointComponent {
                    key: Some("Burger".into()),
                    max_layers: None,
                }),
                Component::FoodSequenceElement(FoodSequenceElementComponent {
                    entries: Some(BTreeMap::from([
                        ("Burger".to_string(), "BunTop".to_string()),
                        ("Taco".to_string(), "BunTaco".to_string()),
                    ])),
                }),
            ],
        )]);
        let resolved = resolve(&raw, "FoodBun");
        let start = resolved.food_sequence_start.unwrap();
        assert_eq!(start.key.as_deref(), Some("Burger"));
        assert_eq!(start.max_layers, DEFAULT_FOOD_SEQUENCE_MAX_LAYERS);
        assert_eq!(resolved.food_sequence_element, vec!["Burger", "Taco"]);
    }

    // -----------------------------------------------------------------------
    // Batch resolution
    // -----------------------------------------------------------------------

    #[test]
    fn resolve_all_covers_every_entity() {
        let raw = dataset(vec![entity("A", vec![]), derived("B", &["A"], vec![])]);
        let all = resolve_all(&raw).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["B"].id, "B");
    }

    #[test]
    fn resolve_all_propagates_broken_parents() {
        let raw = dataset(vec![derived("B", &["Missing"], vec![])]);
        assert!(resolve_all(&raw).is_err());
    }

    #[test]
    fn lenient_resolution_sets_broken_ancestries_aside() {
        let raw = dataset(vec![entity("A", vec![]), derived("B", &["Missing"], vec![])]);
        let (resolved, broken) = resolve_lenient(&raw);
        assert_eq!(resolved.keys().collect::<Vec<_>>(), vec!["A"]);
        assert!(matches!(&broken["B"], BuildError::UnknownParent { parent, .. } if parent == "Missing"));
    }

    #[test]
    fn unresolved_entity_is_explained_by_its_ancestry() {
        let raw = dataset(vec![derived("B", &["Missing"], vec![])]);
        let (_, broken) = resolve_lenient(&raw);

        let err = explain_unresolved(BuildError::UnresolvedEntity("B".into()), &broken);
        assert!(matches!(err, BuildError::UnknownParent { .. }));

        let err = explain_unresolved(BuildError::UnresolvedEntity("C".into()), &broken);
        assert!(matches!(err, BuildError::UnresolvedEntity(id) if id == "C"));
    }
}
