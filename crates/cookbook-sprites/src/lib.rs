//! Sprite sheet rendering for the cookbook.
//!
//! Each entity shown in a fork's output, each method machine and each
//! microwave recipe type machine gets one 32×32 cell on a shared sheet. The
//! cell is drawn from the entity's RSI sprite states under the fork's texture
//! directory, tinted by the sprite and layer colours.
//!
//! # Key Types
//!
//! - [`SpriteSheet`]: the drawn image plus the point of every sprite on it
//! - [`SpriteCache`]: decoded sprite states and the attribution of every RSI used
//! - [`Color`]: packed `0xRRGGBBAA` colour with CSS parsing

pub mod cache;
pub mod color;
pub mod error;
pub mod layers;
pub mod sheet;

pub use cache::{SpriteAttribution, SpriteCache};
pub use color::Color;
pub use error::SpriteError;
pub use sheet::{SPRITE_SIZE, SpritePoint, SpriteSheet, build_sprite_sheet};
