//! Cookbook Core -- turns a game's raw prototype data into a closed recipe
//! dataset for a static cookbook site.
//!
//! The crate works on data that has already been loaded and parsed. It
//! never touches the filesystem; `cookbook-data` loads prototypes and fork
//! configuration, and `cookbook-export` writes the result.
//!
//! # Build Pipeline
//!
//! [`pipeline::build_game_data`] runs these stages in order:
//!
//! 1. **Resolve** -- Flatten every entity's inheritance chain into a
//!    [`resolve::ResolvedEntity`] with defaults applied.
//! 2. **Close** -- Compute the minimal set of entities, reagents, inferred
//!    recipes and reactions needed by the declared recipes
//!    ([`closure::filter_relevant`]).
//! 3. **Normalize** -- Merge declared recipes, inferred recipes and
//!    reactions into one map of [`recipe::Recipe`] keyed by
//!    [`id::RecipeKey`].
//! 4. **Specials** -- Assign bitmasks to special diets and reagents
//!    ([`specials::resolve_specials`]).
//!
//! # Key Types
//!
//! - [`store::RawGameData`] -- All loaded prototypes, keyed by ID.
//! - [`prototype::Component`] -- Closed set of components the resolver
//!   understands, plus `Other` for presence checks.
//! - [`recipe::Recipe`] -- Normalized recipe with a method-tagged payload.
//! - [`recipe::ConstructRecipeBuilder`] -- Incremental builder for
//!   multi-step construction recipes.
//! - [`config::FilterConfig`] -- Per-fork ignore lists and forced sources.
//! - [`error::BuildError`] -- Every fatal data-integrity error.

pub mod closure;
pub mod config;
pub mod construction;
pub mod error;
pub mod id;
pub mod normalize;
pub mod pipeline;
pub mod prototype;
pub mod recipe;
pub mod resolve;
pub mod sources;
pub mod specials;
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
