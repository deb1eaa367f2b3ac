//! Reagent-source indexing.
//!
//! A grown produce item with an extractable facet is a source of every used
//! reagent in its grind or juice solution.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::{FilterConfig, ForceIncludePolicy};
use crate::id::{EntityId, ReagentId};
use crate::resolve::ResolvedEntity;

/// Source entities per reagent, in scan order.
pub type ReagentSources = BTreeMap<ReagentId, Vec<EntityId>>;

/// The used reagents this entity yields when ground or juiced.
///
/// Non-produce entities and entities without an extractable solution yield
/// nothing.
pub fn source_reagents<'a>(entity: &'a ResolvedEntity, used_reagents: &BTreeSet<ReagentId>) -> Vec<&'a str> {
    if !entity.is_produce {
        return Vec::new();
    }
    let Some(extractable) = &entity.extractable else {
        return Vec::new();
    };

    extractable
        .solutions(&entity.solutions)
        .into_iter()
        .flat_map(|solution| solution.reagent_ids())
        .filter(|id| used_reagents.contains(*id))
        .collect()
}

/// Scans every entity for sources of used reagents.
///
/// Reagents on the ignore list never get sources. An entity appears at most
/// once per reagent.
pub fn index_reagent_sources<'a>(
    entities: impl IntoIterator<Item = &'a ResolvedEntity>,
    used_reagents: &BTreeSet<ReagentId>,
    config: &FilterConfig,
) -> ReagentSources {
    let mut sources = ReagentSources::new();
    for entity in entities {
        for reagent in source_reagents(entity, used_reagents) {
            if config.is_source_ignored(reagent) {
                continue;
            }
            let list = sources.entry(reagent.to_string()).or_default();
            if !list.contains(&entity.id) {
                list.push(entity.id.clone());
            }
        }
    }
    sources
}

/// Unions the curated source lists into `sources`.
///
/// Only used reagents get forced sources. Under
/// [`ForceIncludePolicy::RequireUsed`] an entity outside the closure is
/// skipped; under [`ForceIncludePolicy::Always`] it is added to
/// `used_entities`.
pub fn apply_forced_sources(
    sources: &mut ReagentSources,
    used_entities: &mut BTreeSet<EntityId>,
    used_reagents: &BTreeSet<ReagentId>,
    config: &FilterConfig,
) {
    for (reagent, forced) in &config.force_include_reagent_sources {
        if !used_reagents.contains(reagent) {
            continue;
        }
        for entity in forced {
            match config.force_include_policy {
                ForceIncludePolicy::RequireUsed if !used_entities.contains(entity) => continue,
                ForceIncludePolicy::RequireUsed => {}
                ForceIncludePolicy::Always => {
                    used_entities.insert(entity.clone());
                }
            }
            let list = sources.entry(reagent.clone()).or_default();
            if !list.contains(entity) {
                list.push(entity.clone());
            }
        }
    }
}
