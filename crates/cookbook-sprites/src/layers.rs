//! Turning a resolved sprite into the layers that get drawn.

use cookbook_core::resolve::{ResolvedEntity, ResolvedSprite};

use crate::color::{Color, parse_color_or_white};

/// One image to draw: `{path}/{state}.png` under the texture root, tinted by
/// `color`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerState {
    pub path: String,
    pub state: String,
    pub color: Color,
}

/// What to draw for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySprite {
    pub id: String,
    /// Tint of the whole sprite.
    pub color: Color,
    pub layers: Vec<LayerState>,
}

impl EntitySprite {
    pub fn of(entity: &ResolvedEntity) -> Self {
        Self {
            id: entity.id.clone(),
            color: parse_color_or_white(entity.sprite.color.as_deref(), &entity.id),
            layers: sprite_layers(&entity.sprite, &entity.id),
        }
    }
}

/// The base layer first, if it has both a path and a state, then every
/// visible layer that has a path of its own or can borrow the base path.
///
/// The base layer is always white; its tint comes from the sprite colour.
/// Layers without a state have nothing to draw and are skipped.
pub fn sprite_layers(sprite: &ResolvedSprite, entity: &str) -> Vec<LayerState> {
    let mut layers = Vec::with_capacity(sprite.layers.len() + 1);

    if let (Some(path), Some(state)) = (&sprite.path, &sprite.state) {
        layers.push(LayerState {
            path: path.clone(),
            state: state.clone(),
            color: Color::WHITE,
        });
    }

    for layer in sprite.layers.iter().filter(|l| l.visible) {
        let Some(path) = layer.path.as_ref().or(sprite.path.as_ref()) else {
            continue;
        };
        let Some(state) = &layer.state else {
            continue;
        };
        layers.push(LayerState {
            path: path.clone(),
            state: state.clone(),
            color: parse_color_or_white(layer.color.as_deref(), entity),
        });
    }
    layers
}
