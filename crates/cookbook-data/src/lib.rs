//! Data loading for the cookbook: fork lists, prototype files and locales.
//!
//! A fork list names every game fork to build. For each fork this crate finds
//! the prototype files under `Resources/Prototypes`, reads them into a
//! [`RawGameData`](cookbook_core::store::RawGameData) store, loads the English
//! Fluent messages used for reagent names, and turns the fork list entry into
//! the [`FilterConfig`](cookbook_core::config::FilterConfig) and
//! [`ForkSettings`](cookbook_core::config::ForkSettings) of the build.

pub mod fork;
pub mod loader;
pub mod locale;
pub mod schema;

pub use fork::{LoadedFork, SortingIdRewrites, read_sorting_id_rewrites};
pub use loader::{DataLoadError, read_raw_game_data};
pub use locale::FluentLocale;
pub use schema::{ForkInfo, ForkList, read_fork_list};
