//! Output files for the cookbook front end.
//!
//! Each fork produces a content-hashed data file under `data/` and a
//! content-hashed WebP sprite sheet under `img/`. `data/index.json` lists
//! every fork with the hash of its current data file.

pub mod error;
pub mod model;
pub mod writer;

pub use error::ExportError;
pub use model::{ExportedGameData, ForkIndexEntry, ForkMeta};
pub use writer::{ProcessedFork, content_hash, now_millis, save_forks};
