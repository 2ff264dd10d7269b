use std::path::{Path, PathBuf};

use crate::color::Color;
use crate::error::CartaError;
use crate::extent::Extent;
use crate::layer::Layer;
use crate::style::{Style, StyleRegistry};

mod document;

pub use document::{LayerDocument, MapDocument};

/// The top-level aggregate of the crate: dimensions, background, an ordered
/// sequence of layers, a style table and the current viewport.
///
/// A map is assembled either programmatically (create layers, attach
/// datasources, add styles) or by [loading](Map::load_from_file) a JSON map
/// document, and is then handed to the [render](mod@crate::render) entry
/// points. Pixel dimensions are fixed at construction; everything else is
/// mutable.
#[derive(Debug)]
pub struct Map {
    width: u32,
    height: u32,
    background: Option<Color>,
    srs: Option<String>,
    font_directory: Option<PathBuf>,
    base_path: Option<PathBuf>,
    styles: StyleRegistry,
    layers: Vec<Layer>,
    extent: Extent,
}

impl Map {
    /// Creates a map with the given pixel dimensions.
    ///
    /// Both dimensions must be positive. The viewport starts as a degenerate
    /// extent at the origin, so a freshly created map renders background
    /// only until one of the zoom operations is called.
    pub fn new(width: u32, height: u32) -> Result<Self, CartaError> {
        if width == 0 || height == 0 {
            return Err(CartaError::InvalidArgument(format!(
                "map dimensions must be positive, got {width}x{height}"
            )));
        }

        Ok(Self {
            width,
            height,
            background: None,
            srs: None,
            font_directory: None,
            base_path: None,
            styles: StyleRegistry::new(),
            layers: Vec::new(),
            extent: Extent::default(),
        })
    }

    /// Width of the map in pixels. Fixed at construction.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the map in pixels. Fixed at construction.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Background color of the map, if set.
    pub fn background(&self) -> Option<Color> {
        self.background
    }

    /// Sets or clears the background color.
    pub fn set_background(&mut self, background: Option<Color>) {
        self.background = background;
    }

    /// Spatial reference identifier of the map, if set.
    pub fn srs(&self) -> Option<&str> {
        self.srs.as_deref()
    }

    /// Sets the spatial reference identifier of the map.
    pub fn set_srs(&mut self, srs: impl Into<String>) {
        self.srs = Some(srs.into());
    }

    /// Directory the map's fonts are loaded from, if set.
    pub fn font_directory(&self) -> Option<&Path> {
        self.font_directory.as_deref()
    }

    /// Sets the directory [`Map::load_fonts`] registers fonts from.
    pub fn set_font_directory(&mut self, directory: impl Into<PathBuf>) {
        self.font_directory = Some(directory.into());
    }

    /// Appends a layer to the map's paint sequence.
    ///
    /// The layer's current state is captured; mutating another copy of the
    /// layer afterwards does not affect the map. The same layer may be added
    /// any number of times.
    pub fn add_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    /// Layers of the map, in paint order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Mutable access to the map's layers.
    pub fn layers_mut(&mut self) -> &mut Vec<Layer> {
        &mut self.layers
    }

    /// Style table of the map.
    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    /// Inserts `style` under `name`, explicitly replacing and returning any
    /// previous entry of that name.
    pub fn insert_style(&mut self, name: impl Into<String>, style: Style) -> Option<Style> {
        self.styles.insert_or_replace(name, style)
    }

    /// The current viewport of the map.
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Sets the viewport to the given box.
    ///
    /// Non-finite coordinates are rejected. Inverted boxes are normalized by
    /// [`Extent`]; degenerate boxes are accepted as-is and render to empty
    /// output. No aspect-ratio correction is applied: the box round-trips
    /// exactly through [`Map::extent`].
    pub fn zoom_to_box(
        &mut self,
        x_min: f64,
        y_min: f64,
        x_max: f64,
        y_max: f64,
    ) -> Result<(), CartaError> {
        let extent = Extent::try_new(x_min, y_min, x_max, y_max).ok_or_else(|| {
            CartaError::InvalidArgument("extent coordinates must be finite".to_string())
        })?;
        self.extent = extent;
        Ok(())
    }

    /// Sets the viewport to the union of all layers' data extents, adjusted
    /// to the map's aspect ratio.
    ///
    /// Layers without a datasource (or with an empty one) contribute
    /// nothing. A degenerate union (all content is a single point or an
    /// axis-aligned line) is padded so the content stays visible. When no
    /// layer provides an extent the viewport is left unchanged.
    pub fn zoom_to_fit_content(&mut self) {
        let union = self
            .layers
            .iter()
            .filter_map(|layer| layer.datasource().and_then(|ds| ds.extent()))
            .reduce(|acc, other| acc.merge(other));

        let Some(union) = union else {
            log::warn!("zoom_to_fit_content: no layer provides an extent, viewport unchanged");
            return;
        };

        let padded = if union.is_degenerate() {
            let pad = (union.width().max(union.height()) * 0.05).max(0.5);
            union.buffer(pad)
        } else {
            union
        };

        self.extent = padded.fit_aspect_ratio(self.width, self.height);
    }

    /// Registers all font faces under the map's font directory into the
    /// process-wide font registry.
    ///
    /// Relative directories are resolved against the base path of the last
    /// loaded document. Returns `true` when at least one new face was
    /// registered, `Ok(false)` when the map has no font directory.
    pub fn load_fonts(&self) -> Result<bool, CartaError> {
        let Some(directory) = &self.font_directory else {
            return Ok(false);
        };

        let resolved = match &self.base_path {
            Some(base) if directory.is_relative() => base.join(directory),
            _ => directory.clone(),
        };

        crate::fonts::register_fonts(&resolved, true)
    }

    pub(crate) fn base_path(&self) -> Option<&Path> {
        self.base_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::datasource::{create_datasource, Parameters};

    #[test]
    fn zero_dimensions_are_rejected() {
        assert_matches!(Map::new(0, 100), Err(CartaError::InvalidArgument(_)));
        assert_matches!(Map::new(100, 0), Err(CartaError::InvalidArgument(_)));
        assert!(Map::new(1, 1).is_ok());
    }

    #[test]
    fn zoom_to_box_round_trips_exactly() {
        let mut map = Map::new(256, 128).expect("valid dimensions");

        map.zoom_to_box(-10.5, 2.25, 42.0, 17.75).expect("finite box");
        assert_eq!(map.extent(), Extent::new(-10.5, 2.25, 42.0, 17.75));

        // degenerate boxes pass through untouched
        map.zoom_to_box(5.0, 1.0, 5.0, 9.0).expect("finite box");
        assert_eq!(map.extent(), Extent::new(5.0, 1.0, 5.0, 9.0));
        assert!(map.extent().is_degenerate());
    }

    #[test]
    fn zoom_to_box_rejects_non_finite_input() {
        let mut map = Map::new(256, 256).expect("valid dimensions");
        map.zoom_to_box(0.0, 0.0, 10.0, 10.0).expect("finite box");

        let err = map.zoom_to_box(f64::NAN, 0.0, 10.0, 10.0).expect_err("NaN");
        assert_matches!(err, CartaError::InvalidArgument(_));
        // failed zoom leaves the viewport unchanged
        assert_eq!(map.extent(), Extent::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn fit_content_pads_single_point_data() {
        let ds = create_datasource(&Parameters::csv_inline("x,y\n10,20\n")).expect("valid csv");
        let mut layer = Layer::new("points");
        layer.set_datasource(ds);

        let mut map = Map::new(100, 100).expect("valid dimensions");
        map.add_layer(layer);
        map.zoom_to_fit_content();

        let extent = map.extent();
        assert!(!extent.is_degenerate());
        assert!(extent.x_min() < 10.0 && extent.x_max() > 10.0);
        assert!(extent.y_min() < 20.0 && extent.y_max() > 20.0);
    }

    #[test]
    fn fit_content_without_content_keeps_viewport() {
        let mut map = Map::new(100, 100).expect("valid dimensions");
        map.zoom_to_box(1.0, 2.0, 3.0, 4.0).expect("finite box");
        map.add_layer(Layer::new("empty"));

        map.zoom_to_fit_content();
        assert_eq!(map.extent(), Extent::new(1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn fit_content_matches_map_aspect_ratio() {
        let ds = create_datasource(&Parameters::csv_inline("x,y\n0,0\n10,10\n"))
            .expect("valid csv");
        let mut layer = Layer::new("points");
        layer.set_datasource(ds);

        let mut map = Map::new(200, 100).expect("valid dimensions");
        map.add_layer(layer);
        map.zoom_to_fit_content();

        let extent = map.extent();
        approx::assert_relative_eq!(extent.width() / extent.height(), 2.0);
    }

    #[test]
    fn added_layer_is_independent_of_the_original() {
        let mut layer = Layer::new("points");
        layer.add_style("a");

        let mut map = Map::new(64, 64).expect("valid dimensions");
        map.add_layer(layer.clone());

        layer.add_style("b");
        layer.clear_styles();
        assert_eq!(map.layers()[0].styles(), &["a"][..]);
    }

    #[test]
    fn load_fonts_without_directory_is_a_noop() {
        let map = Map::new(64, 64).expect("valid dimensions");
        assert!(!map.load_fonts().expect("no directory configured"));
    }
}
