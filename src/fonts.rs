//! Process-wide font registry.
//!
//! Styles may reference font faces by family name. This module only
//! *registers* and enumerates faces (backed by [`fontdb`]); glyph shaping is
//! outside the scope of the crate.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use fontdb::Database;
use parking_lot::RwLock;

use crate::error::CartaError;

static DATABASE: LazyLock<RwLock<Database>> = LazyLock::new(|| RwLock::new(Database::new()));

const FONT_EXTENSIONS: [&str; 4] = ["ttf", "otf", "ttc", "otc"];

/// Registers every font file found in `path` into the process-wide registry.
///
/// With `recurse` set, subdirectories are scanned as well. Returns `true`
/// when at least one new face was added. A path that is not a readable
/// directory is an error.
pub fn register_fonts(path: &Path, recurse: bool) -> Result<bool, CartaError> {
    if !path.is_dir() {
        return Err(CartaError::InvalidArgument(format!(
            "font path '{}' is not a directory",
            path.display()
        )));
    }

    let mut db = DATABASE.write();
    let before = db.len();

    if recurse {
        db.load_fonts_dir(path);
    } else {
        for entry in std::fs::read_dir(path)? {
            let entry_path = entry?.path();
            let is_font = entry_path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| FONT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if !is_font {
                continue;
            }
            if let Err(err) = db.load_font_file(&entry_path) {
                log::warn!("failed to load font file '{}': {err}", entry_path.display());
            }
        }
    }

    Ok(db.len() > before)
}

/// Returns the sorted family names of all registered font faces.
pub fn face_names() -> Vec<String> {
    let db = DATABASE.read();
    let mut names: Vec<String> = db
        .faces()
        .filter_map(|face| face.families.first().map(|(name, _)| name.clone()))
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Number of font faces currently registered.
pub fn face_count() -> usize {
    DATABASE.read().len()
}

/// Family name to file path mapping of all registered file-backed faces.
pub fn face_mapping() -> BTreeMap<String, PathBuf> {
    let db = DATABASE.read();
    let mut mapping = BTreeMap::new();
    for face in db.faces() {
        let Some((family, _)) = face.families.first() else {
            continue;
        };
        if let fontdb::Source::File(path) = &face.source {
            mapping.insert(family.clone(), path.clone());
        }
    }
    mapping
}
