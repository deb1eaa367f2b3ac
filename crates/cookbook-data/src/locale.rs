//! Fluent (`.ftl`) message lookup.
//!
//! Only the subset of Fluent used for display names is understood: simple
//! messages, multiline values, terms, and `{ -term }` / `{ "literal" }`
//! placeables. Attributes, selectors and variables are left as written.

use std::collections::HashMap;
use std::path::Path;

use cookbook_core::pipeline::LocaleLookup;
use tracing::info;
use walkdir::WalkDir;

use crate::loader::{DataLoadError, read_text};

/// Placeable nesting beyond this depth is left unexpanded.
const MAX_TERM_DEPTH: usize = 8;

/// Every message and term from a locale directory.
#[derive(Debug, Clone, Default)]
pub struct FluentLocale {
    messages: HashMap<String, String>,
    terms: HashMap<String, String>,
}

impl FluentLocale {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every `.ftl` file under `dir`, in path order.
    ///
    /// A missing locale directory yields an empty locale: every name then
    /// falls back to its ID.
    pub fn load(dir: &Path) -> Result<Self, DataLoadError> {
        let mut locale = Self::new();
        if !dir.is_dir() {
            return Ok(locale);
        }

        let mut files = 0;
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "ftl") {
                locale.add_resource(&read_text(entry.path())?);
                files += 1;
            }
        }
        info!("Loaded {} messages from {files} locale files", locale.messages.len());
        Ok(locale)
    }

    /// Parse one Fluent resource. Later definitions replace earlier ones.
    pub fn add_resource(&mut self, source: &str) {
        let mut current: Option<(bool, String, String)> = None;

        for line in source.lines() {
            let indented = line.starts_with([' ', '\t']);
            let trimmed = line.trim();

            if indented {
                // Attributes end the value; anything else continues it.
                if let Some((_, _, value)) = current.as_mut()
                    && !trimmed.is_empty()
                    && !trimmed.starts_with('.')
                {
                    if !value.is_empty() {
                        value.push('\n');
                    }
                    value.push_str(trimmed);
                    continue;
                }
                if trimmed.starts_with('.') {
                    self.finish(current.take());
                }
                continue;
            }

            self.finish(current.take());
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if let Some((id, value)) = line.split_once('=') {
                let id = id.trim();
                let (is_term, name) = match id.strip_prefix('-') {
                    Some(name) => (true, name),
                    None => (false, id),
                };
                if is_identifier(name) {
                    current = Some((is_term, name.to_string(), value.trim().to_string()));
                }
            }
        }
        self.finish(current);
    }

    fn finish(&mut self, entry: Option<(bool, String, String)>) {
        let Some((is_term, name, value)) = entry else {
            return;
        };
        if value.is_empty() {
            return;
        }
        if is_term {
            self.terms.insert(name, value);
        } else {
            self.messages.insert(name, value);
        }
    }

    /// Format a pattern, expanding term references and string literals.
    fn format(&self, pattern: &str, depth: usize) -> String {
        let mut out = String::with_capacity(pattern.len());
        let mut rest = pattern;
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let Some(len) = rest[start..].find('}') else {
                out.push_str(&rest[start..]);
                return out;
            };
            let placeable = &rest[start..start + len + 1];
            out.push_str(&self.expand(placeable, depth));
            rest = &rest[start + len + 1..];
        }
        out.push_str(rest);
        out
    }

    fn expand(&self, placeable: &str, depth: usize) -> String {
        let inner = placeable[1..placeable.len() - 1].trim();
        if let Some(literal) = inner.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
            return literal.to_string();
        }
        if let Some(term) = inner.strip_prefix('-')
            && depth < MAX_TERM_DEPTH
            && let Some(value) = self.terms.get(term)
        {
            return self.format(value, depth + 1);
        }
        placeable.to_string()
    }
}

impl LocaleLookup for FluentLocale {
    fn message(&self, key: &str) -> Option<String> {
        self.messages.get(key).map(|pattern| self.format(pattern, 0))
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
