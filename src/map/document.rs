//! JSON map documents.
//!
//! A map document describes everything about a map except its pixel
//! dimensions: background, spatial reference, font directory, a style table
//! and a layer list with datasource descriptors. Loading a document *merges*
//! it into an existing [`Map`]: scalar attributes replace when present,
//! styles insert-or-replace by name, layers append in document order.
//!
//! The same document shape doubles as the carrier for standalone style
//! fragments ([`Map::import_style_from_text`]): such documents simply have
//! nothing but a `styles` table.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::Map;
use crate::color::Color;
use crate::datasource::{DatasourceRegistry, Parameters};
use crate::error::CartaError;
use crate::layer::Layer;
use crate::style::Style;

/// Serde model of a map document.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MapDocument {
    /// Background color of the map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,

    /// Spatial reference identifier of the map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srs: Option<String>,

    /// Directory to register fonts from, possibly relative to the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_directory: Option<PathBuf>,

    /// Named styles of the document.
    #[serde(default)]
    pub styles: BTreeMap<String, Style>,

    /// Layers of the document, in paint order.
    #[serde(default)]
    pub layers: Vec<LayerDocument>,
}

/// Serde model of one layer of a [`MapDocument`].
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LayerDocument {
    /// Name of the layer.
    #[serde(default)]
    pub name: String,

    /// Spatial reference identifier of the layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srs: Option<String>,

    /// Style names the layer is drawn with, in paint order.
    #[serde(default)]
    pub styles: Vec<String>,

    /// Datasource descriptor of the layer, if it has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasource: Option<Parameters>,
}

impl MapDocument {
    /// Parses a document from JSON text.
    pub fn from_json(text: &str) -> Result<Self, CartaError> {
        serde_json::from_str(text).map_err(|err| CartaError::DocumentParse(err.to_string()))
    }
}

impl Map {
    /// Loads a JSON map document from `path` and merges it into the map.
    ///
    /// The file's directory becomes the base path for resolving relative
    /// datasource files and the font directory.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<(), CartaError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let base = path.parent().map(Path::to_path_buf);
        self.load_document(MapDocument::from_json(&text)?, base.as_deref())
    }

    /// Parses `text` as a JSON map document and merges it into the map.
    ///
    /// `base_path`, when given, is used to resolve relative datasource files
    /// and the font directory.
    pub fn load_from_text(
        &mut self,
        text: &str,
        base_path: Option<&Path>,
    ) -> Result<(), CartaError> {
        self.load_document(MapDocument::from_json(text)?, base_path)
    }

    /// Merges an already parsed document into the map.
    ///
    /// All of the document's datasources are constructed before anything is
    /// merged, so a failing datasource leaves the map untouched.
    pub fn load_document(
        &mut self,
        document: MapDocument,
        base_path: Option<&Path>,
    ) -> Result<(), CartaError> {
        let mut layers = Vec::with_capacity(document.layers.len());
        for layer in &document.layers {
            layers.push(build_layer(layer, base_path)?);
        }

        if let Some(background) = document.background {
            self.background = Some(background);
        }
        if let Some(srs) = document.srs {
            self.srs = Some(srs);
        }
        if let Some(font_directory) = document.font_directory {
            self.font_directory = Some(font_directory);
        }
        for (name, style) in document.styles {
            self.styles.insert_or_replace(name, style);
        }
        self.layers.extend(layers);
        if let Some(base) = base_path {
            self.base_path = Some(base.to_path_buf());
        }

        Ok(())
    }

    /// Parses `text` as a standalone document solely to extract the style
    /// named `name`, then inserts it into the map's style table, replacing
    /// any previous entry of that name.
    ///
    /// Fails with [`CartaError::StyleNotFound`] when the parsed document
    /// does not define the style.
    pub fn import_style_from_text(&mut self, name: &str, text: &str) -> Result<(), CartaError> {
        let mut document = MapDocument::from_json(text)?;
        let Some(style) = document.styles.remove(name) else {
            return Err(CartaError::StyleNotFound(name.to_string()));
        };

        self.styles.insert_or_replace(name, style);
        Ok(())
    }
}

fn build_layer(document: &LayerDocument, base_path: Option<&Path>) -> Result<Layer, CartaError> {
    let mut layer = Layer::new(document.name.clone());
    if let Some(srs) = &document.srs {
        layer = layer.with_srs(srs.clone());
    }
    for style in &document.styles {
        layer.add_style(style.clone());
    }

    if let Some(params) = &document.datasource {
        let mut params = params.clone();
        if let Some(base) = base_path {
            // relative datasource files resolve against the document location
            // unless the descriptor carries its own base
            if params.get_str("file").is_some() && params.get("base").is_none() {
                params.set("base", base.to_string_lossy().to_string());
            }
        }
        layer.set_datasource(DatasourceRegistry::global().create(&params)?);
    }

    Ok(layer)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use assert_matches::assert_matches;

    use super::*;
    use crate::datasource::DatasourceKind;

    const DOCUMENT: &str = r##"{
        "background": "#FFFFFF",
        "srs": "EPSG:4326",
        "styles": {
            "dots": {"rules": [{"symbolizers": [{"type": "marker", "size": 4.0, "fill": "#FF0000"}]}]}
        },
        "layers": [
            {
                "name": "cities",
                "styles": ["dots"],
                "datasource": {"kind": "csv", "inline": "x,y\n1,2\n"}
            },
            {"name": "annotations"}
        ]
    }"##;

    #[test]
    fn document_merges_into_map() {
        let mut map = Map::new(256, 256).expect("valid dimensions");
        map.load_from_text(DOCUMENT, None).expect("valid document");

        assert_eq!(map.background(), Some(Color::WHITE));
        assert_eq!(map.srs(), Some("EPSG:4326"));
        assert!(map.styles().contains("dots"));
        assert_eq!(map.layers().len(), 2);

        let cities = &map.layers()[0];
        assert_eq!(cities.name(), "cities");
        assert_eq!(cities.styles(), &["dots"][..]);
        assert_eq!(
            cities.datasource().map(|ds| ds.kind()),
            Some(DatasourceKind::Csv)
        );
        assert!(map.layers()[1].datasource().is_none());
    }

    #[test]
    fn loading_replaces_existing_styles_and_appends_layers() {
        let mut map = Map::new(256, 256).expect("valid dimensions");
        map.insert_style("dots", Style::default());
        map.add_layer(Layer::new("base"));

        map.load_from_text(DOCUMENT, None).expect("valid document");

        assert_eq!(map.styles().len(), 1);
        let dots = map.styles().get("dots").expect("style merged");
        assert_eq!(dots.rules.len(), 1);

        assert_eq!(map.layers().len(), 3);
        assert_eq!(map.layers()[0].name(), "base");
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let mut map = Map::new(256, 256).expect("valid dimensions");
        let err = map.load_from_text("{oops", None).expect_err("must fail");
        assert_matches!(err, CartaError::DocumentParse(message) => {
            assert!(!message.is_empty());
        });
    }

    #[test]
    fn failing_datasource_leaves_the_map_untouched() {
        let document = r##"{
            "background": "#000000",
            "layers": [
                {"name": "bad", "datasource": {"kind": "geojson", "inline": "{broken"}}
            ]
        }"##;

        let mut map = Map::new(256, 256).expect("valid dimensions");
        let err = map.load_from_text(document, None).expect_err("must fail");
        assert_matches!(err, CartaError::DatasourceConstruction(_));

        assert_eq!(map.background(), None);
        assert!(map.layers().is_empty());
    }

    #[test]
    fn relative_datasource_file_resolves_against_base_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut data = std::fs::File::create(dir.path().join("points.csv")).expect("writable");
        data.write_all(b"x,y\n7,8\n").expect("writable");

        let document = r#"{
            "layers": [
                {"name": "points", "datasource": {"kind": "csv", "file": "points.csv"}}
            ]
        }"#;

        let mut map = Map::new(64, 64).expect("valid dimensions");
        map.load_from_text(document, Some(dir.path())).expect("resolvable datasource");

        let ds = map.layers()[0].datasource().expect("datasource attached");
        assert_eq!(ds.extent(), Some(crate::Extent::from_point(7.0, 8.0)));
        assert_eq!(map.base_path(), Some(dir.path()));
    }

    #[test]
    fn load_from_file_uses_the_document_directory_as_base() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("points.csv"), "x,y\n3,4\n").expect("writable");
        let document_path = dir.path().join("map.json");
        std::fs::write(
            &document_path,
            r#"{"layers": [{"name": "points", "datasource": {"kind": "csv", "file": "points.csv"}}]}"#,
        )
        .expect("writable");

        let mut map = Map::new(64, 64).expect("valid dimensions");
        map.load_from_file(&document_path).expect("loadable document");
        assert_eq!(map.layers().len(), 1);
    }

    #[test]
    fn import_style_extracts_a_single_named_style() {
        let fragment = r##"{
            "styles": {
                "dots": {"rules": [{"symbolizers": [{"type": "marker", "fill": "#00FF00"}]}]},
                "other": {}
            }
        }"##;

        let mut map = Map::new(64, 64).expect("valid dimensions");
        map.import_style_from_text("dots", fragment).expect("style present");

        assert!(map.styles().contains("dots"));
        assert!(!map.styles().contains("other"));
    }

    #[test]
    fn importing_a_missing_style_fails() {
        let mut map = Map::new(64, 64).expect("valid dimensions");
        let err = map
            .import_style_from_text("missing", r#"{"styles": {}}"#)
            .expect_err("must fail");
        assert_matches!(err, CartaError::StyleNotFound(name) => {
            assert_eq!(name, "missing");
        });
    }
}
