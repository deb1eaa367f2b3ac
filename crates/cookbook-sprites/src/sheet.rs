//! Sprite sheet layout and drawing.
//!
//! Every sprite occupies one 32×32 cell, 24 cells to a row. Cells are handed
//! out in a fixed order: output entities, method machines, microwave recipe
//! type machines, and last the beaker fill used for mix recipes.

use std::collections::BTreeMap;
use std::path::Path;

use cookbook_core::id::EntityId;
use cookbook_core::pipeline::GameData;
use cookbook_core::recipe::RecipeKind;
use cookbook_core::resolve::ResolvedEntity;
use image::{RgbaImage, imageops};
use tracing::{info, warn};

use crate::cache::{SpriteAttribution, SpriteCache};
use crate::color::{Color, modulate};
use crate::error::SpriteError;
use crate::layers::{EntitySprite, LayerState};

/// Width and height of one sprite cell, in pixels.
pub const SPRITE_SIZE: u32 = 32;

/// Cells per sheet row.
pub const SHEET_WIDTH: u32 = 24;

/// Top-left pixel of a cell, as `[x, y]`.
pub type SpritePoint = [u32; 2];

/// Hand-tuned drawing offsets for sprites that sit off-centre in their cell.
/// Positive Y moves the sprite down. The recorded point is not affected.
pub const SPRITE_OFFSETS: &[(&str, [i64; 2])] = &[
    // Table-mounted machines
    ("KitchenMicrowave", [0, 5]),
    ("KitchenElectricGrill", [0, 5]),
    ("KitchenAssembler", [0, 5]),
    ("ChemistryHotplate", [0, 5]),
    ("FoodBurgerSuper", [0, 5]),
    ("FoodBurgerBig", [0, 4]),
    ("FoodAloe", [0, -4]),
    ("AloeCream", [0, -2]),
    ("DrinkShaker", [0, 3]),
];

/// The microwave recipe type that shares the microwave method's sprite.
const MICROWAVE_SUBTYPE: &str = "Microwave";

/// A drawn sprite sheet and where everything ended up on it.
#[derive(Debug, Clone)]
pub struct SpriteSheet {
    pub image: RgbaImage,
    pub points: BTreeMap<EntityId, SpritePoint>,
    pub methods: BTreeMap<RecipeKind, SpritePoint>,
    pub beaker_fill: SpritePoint,
    pub microwave_recipe_types: Option<BTreeMap<String, SpritePoint>>,
    pub attributions: Vec<SpriteAttribution>,
}

pub fn place_sprite(index: u32) -> SpritePoint {
    [SPRITE_SIZE * (index % SHEET_WIDTH), SPRITE_SIZE * (index / SHEET_WIDTH)]
}

fn sprite_offset(entity: &str) -> [i64; 2] {
    SPRITE_OFFSETS
        .iter()
        .find(|(id, _)| *id == entity)
        .map_or([0, 0], |&(_, offset)| offset)
}

/// Draw every sprite the fork's output refers to.
///
/// Sprite states are read from `texture_dir`. The beaker fill cell draws
/// `mix_fill_state` from the mix machine's first layer.
pub fn build_sprite_sheet(
    data: &GameData,
    texture_dir: &Path,
    mix_fill_state: &str,
) -> Result<SpriteSheet, SpriteError> {
    let type_count = data.microwave_recipe_type_entities.as_ref().map_or(0, BTreeMap::len);
    let cells = data.entities.len() + data.method_entities.len() + type_count + 1;
    let rows = cells.div_ceil(SHEET_WIDTH as usize) as u32;

    let mut image = RgbaImage::new(SPRITE_SIZE * SHEET_WIDTH, SPRITE_SIZE * rows);
    let mut cache = SpriteCache::new(texture_dir);
    let mut index = 0;

    let mut points = BTreeMap::new();
    for (id, entity) in &data.entities {
        points.insert(id.clone(), draw_entity(&mut image, index, entity, &mut cache)?);
        index += 1;
    }

    let mut methods = BTreeMap::new();
    for (method, entity) in &data.method_entities {
        methods.insert(*method, draw_entity(&mut image, index, entity, &mut cache)?);
        index += 1;
    }

    let microwave_recipe_types = match &data.microwave_recipe_type_entities {
        Some(types) => {
            let mut type_points = BTreeMap::new();
            for (subtype, entity) in types {
                // The plain microwave reuses the method sprite; its cell stays empty.
                let point = match methods.get(&RecipeKind::Microwave) {
                    Some(&point) if subtype == MICROWAVE_SUBTYPE => point,
                    _ => draw_entity(&mut image, index, entity, &mut cache)?,
                };
                type_points.insert(subtype.clone(), point);
                index += 1;
            }
            Some(type_points)
        }
        None => None,
    };

    let beaker_fill = place_sprite(index);
    draw_beaker_fill(&mut image, beaker_fill, data, mix_fill_state, &mut cache)?;

    info!("Drew {} sprites onto a {}x{} sheet", index + 1, image.width(), image.height());
    Ok(SpriteSheet {
        image,
        points,
        methods,
        beaker_fill,
        microwave_recipe_types,
        attributions: cache.attributions(),
    })
}

fn draw_entity(
    sheet: &mut RgbaImage,
    index: u32,
    entity: &ResolvedEntity,
    cache: &mut SpriteCache,
) -> Result<SpritePoint, SpriteError> {
    let point = place_sprite(index);
    let [dx, dy] = sprite_offset(&entity.id);
    let at = [point[0] as i64 + dx, point[1] as i64 + dy];
    let sprite = EntitySprite::of(entity);
    draw_sprite(sheet, point, at, sprite.color, &sprite.layers, cache, &entity.id)?;
    Ok(point)
}

fn draw_beaker_fill(
    sheet: &mut RgbaImage,
    point: SpritePoint,
    data: &GameData,
    mix_fill_state: &str,
    cache: &mut SpriteCache,
) -> Result<(), SpriteError> {
    let Some(mix) = data.method_entities.get(&RecipeKind::Mix) else {
        warn!("No mix machine configured, beaker fill left blank");
        return Ok(());
    };
    let sprite = EntitySprite::of(mix);
    let Some(base) = sprite.layers.first() else {
        warn!("{} has no sprite layers, beaker fill left blank", mix.id);
        return Ok(());
    };
    let fill = LayerState {
        path: base.path.clone(),
        state: mix_fill_state.to_string(),
        color: Color::WHITE,
    };
    let at = [point[0] as i64, point[1] as i64];
    draw_sprite(sheet, point, at, sprite.color, &[fill], cache, &mix.id)
}

fn draw_sprite(
    sheet: &mut RgbaImage,
    point: SpritePoint,
    at: [i64; 2],
    color: Color,
    layers: &[LayerState],
    cache: &mut SpriteCache,
    for_entity: &str,
) -> Result<(), SpriteError> {
    for layer in layers {
        let sprite = cache.read(&layer.path, &layer.state, for_entity, point)?;
        if color.is_white() && layer.color.is_white() {
            blit(sheet, sprite, at);
        } else {
            let mut tinted = sprite.clone();
            modulate(&mut tinted, color.multiply(layer.color));
            blit(sheet, &tinted, at);
        }
    }
    Ok(())
}

/// Alpha-blend the top-left cell of `sprite` onto the sheet.
fn blit(sheet: &mut RgbaImage, sprite: &RgbaImage, at: [i64; 2]) {
    let cell = imageops::crop_imm(sprite, 0, 0, SPRITE_SIZE, SPRITE_SIZE);
    imageops::overlay(sheet, &cell.to_image(), at[0], at[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use cookbook_core::resolve::resolve_all;
    use cookbook_core::store::RawGameData;
    use cookbook_core::test_utils::*;
    use image::Rgba;
    use std::fs;
    use std::path::PathBuf;

    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "cookbook_sheet_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    fn write_state(dir: &Path, rsi: &str, state: &str, pixel: [u8; 4]) {
        let rsi_dir = dir.join(rsi);
        fs::create_dir_all(&rsi_dir).unwrap();
        fs::write(rsi_dir.join("meta.json"), r#"{"license": "CC0-1.0", "copyright": "test"}"#).unwrap();
        RgbaImage::from_pixel(SPRITE_SIZE, SPRITE_SIZE, Rgba(pixel))
            .save(rsi_dir.join(format!("{state}.png")))
            .unwrap();
    }

    fn game_data(raw: &RawGameData, shown: &[&str], methods: &[(RecipeKind, &str)]) -> GameData {
        let all = resolve_all(raw).unwrap();
        GameData {
            entities: shown.iter().map(|id| (id.to_string(), all[*id].clone())).collect(),
            reagents: BTreeMap::new(),
            recipes: BTreeMap::new(),
            reagent_sources: BTreeMap::new(),
            method_entities: methods.iter().map(|(m, id)| (*m, all[*id].clone())).collect(),
            microwave_recipe_type_entities: None,
            special_traits: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Layout
    // -----------------------------------------------------------------------

    #[test]
    fn cells_wrap_after_a_full_row() {
        assert_eq!(place_sprite(0), [0, 0]);
        assert_eq!(place_sprite(23), [736, 0]);
        assert_eq!(place_sprite(24), [0, 32]);
        assert_eq!(place_sprite(50), [64, 64]);
    }

    #[test]
    fn offsets_only_for_curated_entities() {
        assert_eq!(sprite_offset("KitchenMicrowave"), [0, 5]);
        assert_eq!(sprite_offset("FoodAloe"), [0, -4]);
        assert_eq!(sprite_offset("FoodCake"), [0, 0]);
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    #[test]
    fn sheet_layout_and_pixels() {
        let dir = make_test_dir("layout");
        write_state(&dir, "Objects/cake.rsi", "cake", [200, 100, 50, 255]);
        write_state(&dir, "Objects/pie.rsi", "pie", [10, 20, 30, 255]);
        write_state(&dir, "Objects/beaker.rsi", "beaker", [0, 0, 255, 255]);
        write_state(&dir, "Objects/beaker.rsi", "fill", [0, 255, 0, 255]);

        let raw = dataset(vec![
            entity("FoodCake", vec![sprite("Objects/cake.rsi", "cake", Some("#808080"))]),
            entity("FoodPie", vec![sprite("Objects/pie.rsi", "pie", None)]),
            entity("Beaker", vec![sprite("Objects/beaker.rsi", "beaker", None)]),
        ]);
        let data = game_data(&raw, &["FoodCake", "FoodPie"], &[(RecipeKind::Mix, "Beaker")]);

        let sheet = build_sprite_sheet(&data, &dir, "fill").unwrap();
        assert_eq!(sheet.image.dimensions(), (SPRITE_SIZE * SHEET_WIDTH, SPRITE_SIZE));
        assert_eq!(sheet.points["FoodCake"], [0, 0]);
        assert_eq!(sheet.points["FoodPie"], [32, 0]);
        assert_eq!(sheet.methods[&RecipeKind::Mix], [64, 0]);
        assert_eq!(sheet.beaker_fill, [96, 0]);
        assert!(sheet.microwave_recipe_types.is_none());

        // Tinted by the entity colour.
        assert_eq!(sheet.image.get_pixel(0, 0), &Rgba([100, 50, 25, 255]));
        assert_eq!(sheet.image.get_pixel(40, 10), &Rgba([10, 20, 30, 255]));
        assert_eq!(sheet.image.get_pixel(100, 10), &Rgba([0, 255, 0, 255]));

        let paths: Vec<_> = sheet.attributions.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(paths, vec!["Objects/beaker.rsi", "Objects/cake.rsi", "Objects/pie.rsi"]);
        assert_eq!(sheet.attributions[0].sprites, vec![[64, 0], [96, 0]]);

        cleanup(&dir);
    }

    #[test]
    fn offsets_move_the_drawing_not_the_point() {
        let dir = make_test_dir("offset");
        write_state(&dir, "Structures/microwave.rsi", "mw", [255, 255, 255, 255]);

        let raw = dataset(vec![entity(
            "KitchenMicrowave",
            vec![sprite("Structures/microwave.rsi", "mw", None)],
        )]);
        let data = game_data(&raw, &[], &[(RecipeKind::Microwave, "KitchenMicrowave")]);

        let sheet = build_sprite_sheet(&data, &dir, "fill").unwrap();
        assert_eq!(sheet.methods[&RecipeKind::Microwave], [0, 0]);
        assert_eq!(sheet.image.get_pixel(0, 4)[3], 0);
        assert_eq!(sheet.image.get_pixel(0, 5)[3], 255);

        cleanup(&dir);
    }

    #[test]
    fn microwave_subtype_shares_the_method_sprite() {
        let dir = make_test_dir("subtypes");
        write_state(&dir, "Structures/microwave.rsi", "mw", [255, 255, 255, 255]);
        write_state(&dir, "Structures/oven.rsi", "oven", [255, 0, 0, 255]);

        let raw = dataset(vec![
            entity("KitchenMicrowave", vec![sprite("Structures/microwave.rsi", "mw", None)]),
            entity("KitchenOven", vec![sprite("Structures/oven.rsi", "oven", None)]),
        ]);
        let mut data = game_data(&raw, &[], &[(RecipeKind::Microwave, "KitchenMicrowave")]);
        let all = resolve_all(&raw).unwrap();
        data.microwave_recipe_type_entities = Some(BTreeMap::from([
            ("Microwave".to_string(), all["KitchenMicrowave"].clone()),
            ("Oven".to_string(), all["KitchenOven"].clone()),
        ]));

        let sheet = build_sprite_sheet(&data, &dir, "fill").unwrap();
        let types = sheet.microwave_recipe_types.unwrap();
        assert_eq!(types["Microwave"], [0, 0]);
        assert_eq!(types["Oven"], [64, 0]);
        assert_eq!(sheet.beaker_fill, [96, 0]);

        cleanup(&dir);
    }

    #[test]
    fn missing_sprites_leave_blank_cells() {
        let dir = make_test_dir("blank");
        let raw = dataset(vec![entity("FoodGhost", vec![sprite("Objects/ghost.rsi", "boo", None)])]);
        let data = game_data(&raw, &["FoodGhost"], &[]);

        let sheet = build_sprite_sheet(&data, &dir, "fill").unwrap();
        assert_eq!(sheet.points["FoodGhost"], [0, 0]);
        assert!(sheet.image.pixels().all(|p| p[3] == 0));
        assert_eq!(sheet.attributions[0].license, crate::cache::INVALID_METADATA);

        cleanup(&dir);
    }
}
