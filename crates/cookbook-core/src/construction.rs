//! Construction graph classification.
//!
//! Construction graphs are general state machines. Only two patterns are
//! recognised: an unconditional single-step edge using a rolling tool, and an
//! unconditional single-step edge that requires a minimum temperature with no
//! maximum. Anything else is skipped.

use std::collections::BTreeMap;

use tracing::warn;

use crate::id::EntityId;
use crate::prototype::ConstructionGraphPrototype;
use crate::resolve::ResolvedConstruction;

/// Tool name of the rolling pin step.
pub const ROLLING_TOOL: &str = "Rolling";

/// A simple recipe recognised in a construction graph.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstructionOutcome {
    Roll { result: EntityId },
    Heat { result: EntityId, min_temp: f64 },
}

impl ConstructionOutcome {
    pub fn result(&self) -> &str {
        match self {
            ConstructionOutcome::Roll { result } | ConstructionOutcome::Heat { result, .. } => result,
        }
    }
}

/// Classifies every outgoing edge of the entity's current construction node.
///
/// Entities with no graph or node, or that are part-way through an edge,
/// yield nothing. Edges are reported in declaration order.
pub fn classify_construction(
    entity: &str,
    state: &ResolvedConstruction,
    graphs: &BTreeMap<String, ConstructionGraphPrototype>,
) -> Vec<ConstructionOutcome> {
    let (Some(graph_id), Some(node_id)) = (&state.graph, &state.node) else {
        return Vec::new();
    };
    if state.edge.is_some() || state.step.is_some() {
        return Vec::new();
    }

    let Some(graph) = graphs.get(graph_id) else {
        warn!("Entity '{entity}': Unknown construction graph: {graph_id}");
        return Vec::new();
    };
    let Some(start) = graph.node(node_id) else {
        return Vec::new();
    };

    let mut outcomes = Vec::new();
    for edge in &start.edges {
        if !edge.conditions.is_empty() {
            continue;
        }
        let Some(target) = graph.node(&edge.to) else {
            continue;
        };
        let Some(result) = target.entity.as_ref().filter(|e| e.as_str() != entity) else {
            continue;
        };
        let [step] = edge.steps.as_slice() else {
            continue;
        };

        if step.tool.as_deref() == Some(ROLLING_TOOL) {
            outcomes.push(ConstructionOutcome::Roll {
                result: result.clone(),
            });
        } else if let (Some(min_temp), None) = (step.min_temperature, step.max_temperature) {
            outcomes.push(ConstructionOutcome::Heat {
                result: result.clone(),
                min_temp,
            });
        }
    }
    outcomes
}
