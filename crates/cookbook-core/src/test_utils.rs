//! Fixture builders shared by unit tests, integration tests and benches.

use std::collections::BTreeMap;

use crate::prototype::{
    Component, ConstructionComponent, ConstructionEdge, ConstructionGraphPrototype, ConstructionNode,
    ConstructionStepData, DeepFrySpawnComponent, EntityPrototype, EntityWhitelist, ExtractableComponent,
    MicrowaveRecipePrototype, OneOrMany, Prototype, ReactionEffect, ReactionPrototype, ReagentPrototype,
    SliceableFoodComponent, Solution, SolutionContainerManagerComponent, SolutionReagent, SpriteComponent,
    SpriteLayerData, StackPrototype, StomachComponent, TagComponent,
};
use crate::recipe::ReagentIngredient;
use crate::store::RawGameData;

// ===========================================================================
// Prototypes
// ===========================================================================

pub fn entity(id: &str, components: Vec<Component>) -> EntityPrototype {
    EntityPrototype {
        id: id.to_string(),
        parent: None,
        name: None,
        components,
    }
}

pub fn derived(id: &str, parents: &[&str], components: Vec<Component>) -> EntityPrototype {
    let parent = match parents {
        [] => None,
        [single] => Some(OneOrMany::One(single.to_string())),
        many => Some(OneOrMany::Many(many.iter().map(|p| p.to_string()).collect())),
    };
    EntityPrototype {
        parent,
        ..entity(id, components)
    }
}

pub fn named(id: &str, name: &str) -> EntityPrototype {
    EntityPrototype {
        name: Some(name.to_string()),
        ..entity(id, vec![])
    }
}

pub fn dataset(entities: Vec<EntityPrototype>) -> RawGameData {
    entities.into_iter().map(Prototype::Entity).collect()
}

pub fn reagent(id: &str) -> ReagentPrototype {
    ReagentPrototype {
        id: id.to_string(),
        name: None,
        color: None,
        group: None,
    }
}

pub fn named_reagent(id: &str, name_key: &str) -> ReagentPrototype {
    ReagentPrototype {
        name: Some(name_key.to_string()),
        ..reagent(id)
    }
}

pub fn reagent_in_group(id: &str, group: &str) -> ReagentPrototype {
    ReagentPrototype {
        group: Some(group.to_string()),
        ..reagent(id)
    }
}

pub fn stack(id: &str, spawn: &str) -> StackPrototype {
    StackPrototype {
        id: id.to_string(),
        spawn: spawn.to_string(),
    }
}

pub fn recipe_proto(
    id: &str,
    result: &str,
    solids: &[(&str, u32)],
    reagents: &[(&str, f64)],
) -> MicrowaveRecipePrototype {
    MicrowaveRecipePrototype {
        id: id.to_string(),
        name: None,
        result: result.to_string(),
        time: None,
        solids: (!solids.is_empty()).then(|| solids.iter().map(|(k, v)| (k.to_string(), *v)).collect()),
        reagents: (!reagents.is_empty()).then(|| reagents.iter().map(|(k, v)| (k.to_string(), *v)).collect()),
        group: None,
        recipe_type: None,
        result_count: None,
    }
}

pub fn reaction(id: &str, reactants: &[(&str, f64)], products: &[(&str, f64)]) -> ReactionPrototype {
    ReactionPrototype {
        id: id.to_string(),
        reactants: reactants
            .iter()
            .map(|(k, v)| (k.to_string(), ReagentIngredient::new(*v)))
            .collect(),
        required_mixer_categories: None,
        min_temp: None,
        max_temp: None,
        products: (!products.is_empty()).then(|| products.iter().map(|(k, v)| (k.to_string(), *v)).collect()),
        effects: Vec::new(),
    }
}

pub fn spawn_reaction(id: &str, reactants: &[(&str, f64)], spawned: &str) -> ReactionPrototype {
    ReactionPrototype {
        effects: vec![ReactionEffect::SpawnEntity {
            entity: spawned.to_string(),
        }],
        ..reaction(id, reactants, &[])
    }
}

// ===========================================================================
// Components
// ===========================================================================

pub fn component(kind: &str) -> Component {
    Component::Other(kind.to_string())
}

pub fn sliceable(slice: &str, count: Option<u32>) -> Component {
    Component::SliceableFood(SliceableFoodComponent {
        slice: Some(slice.to_string()),
        count,
    })
}

pub fn sliceable_count(count: u32) -> Component {
    Component::SliceableFood(SliceableFoodComponent {
        slice: None,
        count: Some(count),
    })
}

pub fn construction(graph: &str, node: &str) -> Component {
    Component::Construction(ConstructionComponent {
        graph: Some(graph.to_string()),
        node: Some(node.to_string()),
        edge: None,
        step: None,
    })
}

pub fn tags(list: &[&str]) -> Component {
    Component::Tag(TagComponent {
        tags: Some(list.iter().map(|t| t.to_string()).collect()),
    })
}

pub fn stomach(tags: &[&str], components: &[&str]) -> Component {
    Component::Stomach(StomachComponent {
        special_digestible: Some(EntityWhitelist {
            tags: Some(tags.iter().map(|t| t.to_string()).collect()),
            components: Some(components.iter().map(|c| c.to_string()).collect()),
            sizes: None,
        }),
    })
}

pub fn solution(reagents: &[(&str, f64)]) -> Solution {
    Solution {
        max_vol: None,
        reagents: Some(
            reagents
                .iter()
                .map(|(id, quantity)| SolutionReagent {
                    reagent_id: id.to_string(),
                    quantity: *quantity,
                })
                .collect(),
        ),
    }
}

pub fn solutions(named: &[(&str, &[(&str, f64)])]) -> Component {
    let solutions: BTreeMap<String, Solution> = named
        .iter()
        .map(|(name, reagents)| (name.to_string(), solution(reagents)))
        .collect();
    Component::SolutionContainerManager(SolutionContainerManagerComponent {
        solutions: Some(solutions),
    })
}

/// An empty juice list means no juice solution.
pub fn extractable(grind: Option<&str>, juice: &[(&str, f64)]) -> Component {
    Component::Extractable(ExtractableComponent {
        grindable_solution_name: grind.map(str::to_string),
        juice_solution: (!juice.is_empty()).then(|| solution(juice)),
    })
}

pub fn sprite(path: &str, state: &str, color: Option<&str>) -> Component {
    Component::Sprite(SpriteComponent {
        sprite: Some(path.to_string()),
        state: Some(state.to_string()),
        color: color.map(str::to_string),
        layers: None,
    })
}

/// A sprite drawn only from layers, each given as `(own path, state, color)`.
pub fn layered_sprite(path: Option<&str>, layers: &[(Option<&str>, &str, Option<&str>)]) -> Component {
    Component::Sprite(SpriteComponent {
        sprite: path.map(str::to_string),
        state: None,
        color: None,
        layers: Some(
            layers
                .iter()
                .map(|(path, state, color)| SpriteLayerData {
                    sprite: path.map(str::to_string),
                    state: Some(state.to_string()),
                    visible: None,
                    color: color.map(str::to_string),
                })
                .collect(),
        ),
    })
}

pub fn deep_fry(output: &str) -> Component {
    Component::DeepFrySpawn(DeepFrySpawnComponent {
        output: Some(output.to_string()),
    })
}

// ===========================================================================
// Construction graphs
// ===========================================================================

pub fn graph(id: &str, nodes: Vec<ConstructionNode>) -> ConstructionGraphPrototype {
    ConstructionGraphPrototype {
        id: id.to_string(),
        graph: nodes,
    }
}

pub fn node(name: &str, entity: Option<&str>, edges: Vec<ConstructionEdge>) -> ConstructionNode {
    ConstructionNode {
        node: name.to_string(),
        edges,
        entity: entity.map(str::to_string),
    }
}

pub fn edge(to: &str, steps: Vec<ConstructionStepData>) -> ConstructionEdge {
    ConstructionEdge {
        to: to.to_string(),
        steps,
        conditions: Vec::new(),
    }
}

pub fn rolling_step() -> ConstructionStepData {
    ConstructionStepData {
        tool: Some(crate::construction::ROLLING_TOOL.to_string()),
        min_temperature: None,
        max_temperature: None,
    }
}

pub fn heat_step(min: f64, max: Option<f64>) -> ConstructionStepData {
    ConstructionStepData {
        tool: None,
        min_temperature: Some(min),
        max_temperature: max,
    }
}
