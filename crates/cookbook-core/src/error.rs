//! Fatal build errors.
//!
//! Anything that can be recovered from (unknown construction graphs, missing
//! sprites, unsupported whitelist filters) is logged where it is detected and
//! never reaches this type. A `BuildError` means the source dataset or fork
//! configuration is inconsistent and the whole build must stop.

use crate::id::{EntityId, ReagentId};

/// Errors that abort a build.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BuildError {
    /// An entity ID in the closure does not exist in the raw dataset.
    #[error("could not resolve entity: {0}")]
    UnresolvedEntity(EntityId),

    /// A reagent ID in the closure does not exist in the raw dataset.
    #[error("could not resolve reagent: {0}")]
    UnresolvedReagent(ReagentId),

    /// An entity names a parent that does not exist.
    #[error("entity '{entity}' has unknown parent '{parent}'")]
    UnknownParent { entity: EntityId, parent: EntityId },

    /// An entity is (transitively) its own ancestor.
    #[error("inheritance cycle through entity '{0}'")]
    InheritanceCycle(EntityId),

    /// A special diet names an organ entity that has no stomach facet.
    #[error("special diet organ '{0}' has no stomach")]
    OrganWithoutStomach(EntityId),

    /// A recipe builder was finished without any result.
    #[error("recipe has neither a solid nor a reagent result")]
    MissingResult,

    /// A recipe builder was given both a solid and a reagent result.
    #[error("recipe cannot have both a solid and a reagent result")]
    ConflictingResults,
}
