//! Prototype loading: finds data files, detects their format and reads them
//! into the raw prototype store.
//!
//! Prototype files are RON, JSON or TOML. A RON or JSON file holds a list of
//! documents; a TOML file holds them under a top-level `prototypes` array.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use cookbook_core::prototype::Prototype;
use cookbook_core::store::RawGameData;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Top-level key of the document array in TOML prototype files.
pub const PROTOTYPES_TOML_KEY: &str = "prototypes";

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required directory does not exist.
    #[error("{what} directory not found: {path}")]
    MissingDirectory { what: &'static str, path: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn parse_error(file: &Path, detail: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: file.to_path_buf(),
        detail: detail.to_string(),
    }
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read a text file, dropping a leading byte-order mark.
pub fn read_text(path: &Path) -> Result<String, DataLoadError> {
    let content = std::fs::read_to_string(path)?;
    Ok(match content.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => content,
    })
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = read_text(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Read the prototype documents of one file.
///
/// A file whose top level is not a list is skipped with a warning. Documents
/// of kinds the cookbook does not use come back as [`Prototype::Unrelated`].
pub fn read_prototype_file(path: &Path) -> Result<Vec<Prototype>, DataLoadError> {
    let value: serde_json::Value = match detect_format(path)? {
        Format::Toml => {
            let table: serde_json::Value = deserialize_file(path)?;
            table
                .get(PROTOTYPES_TOML_KEY)
                .cloned()
                .unwrap_or(serde_json::Value::Null)
        }
        Format::Ron | Format::Json => deserialize_file(path)?,
    };

    let serde_json::Value::Array(documents) = value else {
        warn!("{}: top-level structure is not a list, ignoring", path.display());
        return Ok(Vec::new());
    };

    documents
        .into_iter()
        .map(|doc| serde_json::from_value(doc).map_err(|e| parse_error(path, e)))
        .collect()
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Recursively collect every data file under `dir`, sorted by path.
///
/// Files with other extensions (textures, audio, licences) are skipped.
pub fn find_data_files(dir: &Path, what: &'static str) -> Result<Vec<PathBuf>, DataLoadError> {
    if !dir.is_dir() {
        return Err(DataLoadError::MissingDirectory {
            what,
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() && detect_format(entry.path()).is_ok() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Read every prototype file under `prototype_dir` into a raw store.
///
/// Files are read in path order, so a later file's definition of an ID
/// replaces an earlier one deterministically.
pub fn read_raw_game_data(prototype_dir: &Path) -> Result<RawGameData, DataLoadError> {
    let files = find_data_files(prototype_dir, "prototype")?;
    info!("Found {} files", files.len());

    let mut raw = RawGameData::new();
    for file in &files {
        raw.extend(read_prototype_file(file)?);
    }

    info!(
        "Loaded {} entities, {} reagents, {} microwave meal recipes, {} reactions, {} stacks",
        raw.entities.len(),
        raw.reagents.len(),
        raw.recipes.len(),
        raw.reactions.len(),
        raw.stacks.len()
    );
    Ok(raw)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Create a temporary directory with a unique name for test isolation.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "cookbook_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Clean up a test directory.
    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    // -----------------------------------------------------------------------
    // detect_format
    // -----------------------------------------------------------------------

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("food.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("food.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("food.json")).unwrap(), Format::Json);
    }

    #[test]
    fn detect_format_unsupported() {
        let result = detect_format(Path::new("food.yml"));
        assert!(matches!(result, Err(DataLoadError::UnsupportedFormat { .. })));
        let result = detect_format(Path::new("food"));
        assert!(matches!(result, Err(DataLoadError::UnsupportedFormat { .. })));
    }

    // -----------------------------------------------------------------------
    // read_prototype_file
    // -----------------------------------------------------------------------

    #[test]
    fn prototype_file_json() {
        let dir = make_test_dir("proto_json");
        let path = dir.join("food.json");
        fs::write(
            &path,
            r#"[
                {"type": "entity", "id": "FoodCake", "name": "cake"},
                {"type": "soundCollection", "id": "Crunch"}
            ]"#,
        )
        .unwrap();

        let docs = read_prototype_file(&path).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(matches!(&docs[0], Prototype::Entity(e) if e.id == "FoodCake"));
        assert!(matches!(docs[1], Prototype::Unrelated));

        cleanup(&dir);
    }

    #[test]
    fn prototype_file_ron() {
        let dir = make_test_dir("proto_ron");
        let path = dir.join("reagents.ron");
        fs::write(
            &path,
            r##"[
                { "type": "reagent", "id": "Sugar", "color": "#ffffff" },
                { "type": "stack", "id": "Dough", "spawn": "FoodDough" },
            ]"##,
        )
        .unwrap();

        let docs = read_prototype_file(&path).unwrap();
        assert!(matches!(&docs[0], Prototype::Reagent(r) if r.color.as_deref() == Some("#ffffff")));
        assert!(matches!(&docs[1], Prototype::Stack(s) if s.spawn == "FoodDough"));

        cleanup(&dir);
    }

    #[test]
    fn prototype_file_toml() {
        let dir = make_test_dir("proto_toml");
        let path = dir.join("recipes.toml");
        fs::write(
            &path,
            r#"
[[prototypes]]
type = "microwaveMealRecipe"
id = "RecipeCake"
result = "FoodCake"
time = 15

[prototypes.solids]
FoodCakeMix = 1
"#,
        )
        .unwrap();

        let docs = read_prototype_file(&path).unwrap();
        match &docs[0] {
            Prototype::MicrowaveRecipe(recipe) => {
                assert_eq!(recipe.time, Some(15.0));
                assert_eq!(recipe.solids.as_ref().unwrap()["FoodCakeMix"], 1);
            }
            other => panic!("expected recipe, got {other:?}"),
        }

        cleanup(&dir);
    }

    #[test]
    fn prototype_file_not_a_list_is_skipped() {
        let dir = make_test_dir("proto_not_list");
        let path = dir.join("meta.json");
        fs::write(&path, r#"{"version": 1}"#).unwrap();

        assert!(read_prototype_file(&path).unwrap().is_empty());

        cleanup(&dir);
    }

    #[test]
    fn prototype_file_with_bom() {
        let dir = make_test_dir("proto_bom");
        let path = dir.join("food.json");
        fs::write(&path, "\u{feff}[{\"type\": \"entity\", \"id\": \"A\"}]").unwrap();

        assert_eq!(read_prototype_file(&path).unwrap().len(), 1);

        cleanup(&dir);
    }

    #[test]
    fn prototype_file_parse_error() {
        let dir = make_test_dir("proto_parse_err");
        let path = dir.join("bad.ron");
        fs::write(&path, "this is not valid RON {{{").unwrap();

        let result = read_prototype_file(&path);
        assert!(matches!(result, Err(DataLoadError::Parse { .. })));

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // Discovery
    // -----------------------------------------------------------------------

    #[test]
    fn find_data_files_recurses_and_filters() {
        let dir = make_test_dir("find_files");
        fs::create_dir_all(dir.join("Entities/Food")).unwrap();
        fs::write(dir.join("Entities/Food/cake.json"), "[]").unwrap();
        fs::write(dir.join("Entities/Food/pie.ron"), "[]").unwrap();
        fs::write(dir.join("Entities/Food/cake.png"), "").unwrap();
        fs::write(dir.join("reagents.toml"), "").unwrap();

        let files = find_data_files(&dir, "prototype").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["cake.json", "pie.ron", "reagents.toml"]);

        cleanup(&dir);
    }

    #[test]
    fn find_data_files_missing_dir() {
        let dir = std::env::temp_dir().join("cookbook_data_test_definitely_missing");
        let result = find_data_files(&dir, "prototype");
        assert!(matches!(result, Err(DataLoadError::MissingDirectory { what: "prototype", .. })));
    }

    #[test]
    fn read_raw_game_data_later_files_win() {
        let dir = make_test_dir("raw_later_wins");
        fs::write(
            dir.join("a.json"),
            r#"[{"type": "entity", "id": "FoodCake", "name": "first"},
                {"type": "reaction", "id": "R1"}]"#,
        )
        .unwrap();
        fs::write(
            dir.join("b.json"),
            r#"[{"type": "entity", "id": "FoodCake", "name": "second"},
                {"type": "reaction", "id": "R2"}]"#,
        )
        .unwrap();

        let raw = read_raw_game_data(&dir).unwrap();
        assert_eq!(raw.entities["FoodCake"].name.as_deref(), Some("second"));
        let reactions: Vec<_> = raw.reactions.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(reactions, vec!["R1", "R2"]);

        cleanup(&dir);
    }
}
