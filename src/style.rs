//! Style model: how features of a layer are drawn.
//!
//! A [`Style`] is an ordered list of [rules](StyleRule). A rule applies to a
//! feature when every entry of its attribute filter matches; all applying
//! rules are drawn, in order, with later symbolizers painting on top.
//! Styles are plain serde values, so style fragments and whole style tables
//! are read from JSON documents.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::datasource::Feature;

/// A named drawing recipe for the features of a layer.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    /// Rules of the style, applied in order.
    #[serde(default)]
    pub rules: Vec<StyleRule>,
}

/// One rule of a [`Style`]: an attribute filter and the symbolizers to draw
/// matching features with.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRule {
    /// Attribute values a feature must carry for this rule to apply. An
    /// empty filter applies to every feature.
    #[serde(default)]
    pub filter: HashMap<String, String>,

    /// Symbolizers to draw matching features with, in paint order.
    #[serde(default)]
    pub symbolizers: Vec<Symbolizer>,
}

impl StyleRule {
    /// True if the rule's filter matches the feature's attributes.
    pub fn matches(&self, feature: &Feature) -> bool {
        self.filter
            .iter()
            .all(|(key, value)| feature.property(key) == Some(value.as_str()))
    }
}

/// A single drawing instruction of a [`StyleRule`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Symbolizer {
    /// Draws a filled circle at every point of point geometries.
    Marker {
        /// Diameter of the marker in pixels.
        #[serde(default = "default_marker_size")]
        size: f64,
        /// Fill color of the marker.
        fill: Color,
    },
    /// Strokes line geometries.
    Line {
        /// Stroke width in pixels.
        #[serde(default = "default_line_width")]
        width: f64,
        /// Stroke color.
        stroke: Color,
    },
    /// Fills polygon geometries.
    Polygon {
        /// Fill color.
        fill: Color,
    },
}

fn default_marker_size() -> f64 {
    8.0
}

fn default_line_width() -> f64 {
    1.0
}

/// Name to style table of a [`Map`](crate::Map).
///
/// Names are unique; inserting under an existing name replaces the previous
/// entry and hands it back, so a replacement is always explicit in the API.
#[derive(Debug, Default, Clone)]
pub struct StyleRegistry {
    styles: ahash::HashMap<String, Style>,
}

impl StyleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `style` under `name`, returning the replaced entry if the
    /// name was already taken.
    pub fn insert_or_replace(&mut self, name: impl Into<String>, style: Style) -> Option<Style> {
        self.styles.insert(name.into(), style)
    }

    /// Returns the style registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Style> {
        self.styles.get(name)
    }

    /// Removes and returns the style registered under `name`.
    pub fn remove(&mut self, name: &str) -> Option<Style> {
        self.styles.remove(name)
    }

    /// True if a style is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.styles.contains_key(name)
    }

    /// Number of registered styles.
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// True if no styles are registered.
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Iterates over all registered styles in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Style)> {
        self.styles.iter().map(|(name, style)| (name.as_str(), style))
    }
}
