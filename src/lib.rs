//! Carta is a map composition and rendering engine. Maps are assembled from
//! named layers, each bound to a geospatial datasource and a list of styles,
//! and rendered to raster buffers, raster image files, or vector documents
//! (SVG and PDF).
//!
//! # Quick start
//!
//! Compose a one-layer map and render it into a pixel buffer:
//!
//! ```
//! use carta::datasource::{create_datasource, Parameters};
//! use carta::{render, Layer, Map, RasterImage};
//!
//! # fn main() -> Result<(), carta::CartaError> {
//! let datasource = create_datasource(&Parameters::geojson_inline(
//!     r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[13.4,52.5]},"properties":{}}"#,
//! ))?;
//!
//! let mut layer = Layer::new("points");
//! layer.set_datasource(datasource);
//! layer.add_style("dots");
//!
//! let mut map = Map::new(256, 256)?;
//! map.import_style_from_text(
//!     "dots",
//!     r##"{"styles":{"dots":{"rules":[{"symbolizers":[{"type":"marker","size":8.0,"fill":"#FF0000"}]}]}}}"##,
//! )?;
//! map.add_layer(layer);
//! map.zoom_to_fit_content();
//!
//! let mut image = RasterImage::new(256, 256);
//! render(&map, &mut image)?;
//! # assert!(image.data().iter().skip(3).step_by(4).any(|&alpha| alpha > 0));
//! # Ok(())
//! # }
//! ```
//!
//! # Main components
//!
//! * [`Map`] is the top-level aggregate: pixel dimensions, background, a
//!   style table, an ordered layer sequence and the current viewport
//!   ([`Extent`]). Maps are built programmatically or loaded from JSON
//!   [documents](MapDocument).
//! * [`Layer`] pairs a [datasource](datasource::Datasource) with an
//!   ordered list of style names. Names resolve lazily against the map's
//!   style table when rendering, so assembly order is free.
//! * [`style`] is the serde-modeled style language: rules with attribute
//!   filters and marker/line/polygon symbolizers.
//! * [`render`](mod@render) is the dispatcher: one compositor feeding a
//!   raster painter or the SVG/PDF writers (behind the `vector` feature,
//!   see [`supports_vector`]).
//!
//! Errors are always explicit: every fallible operation returns
//! [`Result`]`<_, `[`CartaError`]`>`. Diagnostics go through the [`log`]
//! facade, capped by [`diagnostics::set_log_severity`].

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

mod color;
pub mod datasource;
pub mod diagnostics;
pub mod error;
mod extent;
pub mod fonts;
mod layer;
mod map;
pub mod render;
pub mod style;

pub use color::Color;
pub use error::CartaError;
pub use extent::Extent;
pub use layer::Layer;
pub use map::{LayerDocument, Map, MapDocument};
pub use render::{
    render, render_to_file, render_to_memory, supports_vector, RasterImage, VectorFormat,
};

/// Version of the crate, as compiled in.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
