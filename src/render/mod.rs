//! Render dispatch: one compositor, several output backends.
//!
//! Rendering is a single synchronous pass over a [`Map`]: background first,
//! then every layer in sequence order, each drawn with its resolved styles
//! in list order. The pass is expressed against the internal [`Surface`]
//! abstraction, which is what makes the raster compositor and the vector
//! writers produce the same composition, and the file and in-memory vector
//! paths byte-identical output.
//!
//! Entry points:
//! * [`render`] composites into a caller-owned [`RasterImage`];
//! * [`render_to_file`] / [`render_to_memory`] produce vector output
//!   (SVG/PDF), gated behind the `vector` cargo feature; see
//!   [`supports_vector`].

mod raster;
#[cfg(feature = "vector")]
mod vector;

use std::path::Path;

use geo_types::{Geometry, LineString, Polygon};

use crate::color::Color;
use crate::error::CartaError;
use crate::extent::Extent;
use crate::map::Map;
use crate::style::Symbolizer;

pub use raster::RasterImage;

/// Vector output formats of [`render_to_file`] and [`render_to_memory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorFormat {
    /// Scalable Vector Graphics.
    Svg,
    /// Single-page PDF.
    Pdf,
}

/// True if the vector rendering backend is compiled in.
pub fn supports_vector() -> bool {
    cfg!(feature = "vector")
}

/// One render destination: a raster pixel buffer or a vector writer.
///
/// All coordinates are in screen pixels, origin at the top-left corner.
pub(crate) trait Surface {
    /// Fills the whole surface with `color`, replacing previous content.
    fn fill_background(&mut self, color: Color);
    /// Draws a filled circle of diameter `size` centered at `center`.
    fn draw_marker(&mut self, center: (f64, f64), size: f64, fill: Color);
    /// Strokes a path of connected segments.
    fn draw_line(&mut self, path: &[(f64, f64)], width: f64, stroke: Color);
    /// Fills a polygon given as rings (exterior first), even-odd rule.
    fn draw_polygon(&mut self, rings: &[Vec<(f64, f64)>], fill: Color);
}

/// Composites the map into a caller-owned raster target.
///
/// The target's dimensions must equal the map's; a mismatch is an error and
/// the target is left untouched.
pub fn render(map: &Map, target: &mut RasterImage) -> Result<(), CartaError> {
    if target.width() != map.width() || target.height() != map.height() {
        return Err(CartaError::TargetSizeMismatch {
            map_width: map.width(),
            map_height: map.height(),
            target_width: target.width(),
            target_height: target.height(),
        });
    }

    compose(map, target);
    Ok(())
}

/// Renders the map to an in-memory vector document.
#[cfg(feature = "vector")]
pub fn render_to_memory(map: &Map, format: VectorFormat) -> Result<Vec<u8>, CartaError> {
    match format {
        VectorFormat::Svg => {
            let mut surface = vector::SvgSurface::new(map.width(), map.height());
            compose(map, &mut surface);
            Ok(surface.finish())
        }
        VectorFormat::Pdf => {
            let mut surface = vector::PdfSurface::new(map.width(), map.height());
            compose(map, &mut surface);
            Ok(surface.finish())
        }
    }
}

/// Renders the map to an in-memory vector document.
///
/// The vector backend is not compiled in; this always reports
/// [`CartaError::VectorUnavailable`].
#[cfg(not(feature = "vector"))]
pub fn render_to_memory(map: &Map, format: VectorFormat) -> Result<Vec<u8>, CartaError> {
    let _ = (map, format);
    Err(CartaError::VectorUnavailable)
}

/// Renders the map to a vector file.
///
/// The document is rendered in memory first and materialized atomically
/// (temporary file in the destination directory, then rename), so no
/// partial file survives a failure. The produced bytes are identical to
/// what [`render_to_memory`] returns for the same map and format.
pub fn render_to_file(
    map: &Map,
    path: impl AsRef<Path>,
    format: VectorFormat,
) -> Result<(), CartaError> {
    let bytes = render_to_memory(map, format)?;
    write_atomic(path.as_ref(), &bytes)
}

/// Writes `bytes` to `path` through a temporary file in the same directory.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CartaError> {
    use std::io::Write;

    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut file = tempfile::NamedTempFile::new_in(directory)?;
    file.write_all(bytes)?;
    file.persist(path).map_err(|err| CartaError::FsIo(err.error))?;
    Ok(())
}

/// Map-units to screen-pixels transform of one render pass.
struct PixelTransform {
    x_min: f64,
    y_max: f64,
    sx: f64,
    sy: f64,
}

impl PixelTransform {
    /// `None` for degenerate extents; those render to empty output.
    fn new(extent: &Extent, width: u32, height: u32) -> Option<Self> {
        if extent.width() <= 0.0 || extent.height() <= 0.0 {
            return None;
        }

        Some(Self {
            x_min: extent.x_min(),
            y_max: extent.y_max(),
            sx: width as f64 / extent.width(),
            sy: height as f64 / extent.height(),
        })
    }

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.x_min) * self.sx, (self.y_max - y) * self.sy)
    }
}

/// One full compositing pass of `map` into `surface`.
fn compose(map: &Map, surface: &mut dyn Surface) {
    if let Some(background) = map.background() {
        surface.fill_background(background);
    }

    let extent = map.extent();
    let Some(transform) = PixelTransform::new(&extent, map.width(), map.height()) else {
        log::debug!("degenerate extent, drawing background only");
        return;
    };

    for layer in map.layers() {
        let Some(datasource) = layer.datasource() else {
            continue;
        };

        let features = datasource.features(&extent);
        if features.is_empty() {
            continue;
        }

        for style_name in layer.styles() {
            let Some(style) = map.styles().get(style_name) else {
                log::debug!(
                    "layer '{}': style '{style_name}' is not in the map's style table, skipped",
                    layer.name()
                );
                continue;
            };

            for feature in &features {
                for rule in style.rules.iter().filter(|rule| rule.matches(feature)) {
                    for symbolizer in &rule.symbolizers {
                        draw(surface, &transform, feature.geometry(), symbolizer);
                    }
                }
            }
        }
    }
}

fn draw(
    surface: &mut dyn Surface,
    transform: &PixelTransform,
    geometry: &Geometry<f64>,
    symbolizer: &Symbolizer,
) {
    if let Geometry::GeometryCollection(collection) = geometry {
        for child in &collection.0 {
            draw(surface, transform, child, symbolizer);
        }
        return;
    }

    match symbolizer {
        Symbolizer::Marker { size, fill } => {
            for (x, y) in point_coords(geometry) {
                surface.draw_marker(transform.apply(x, y), *size, *fill);
            }
        }
        Symbolizer::Line { width, stroke } => {
            for path in line_paths(geometry) {
                let projected: Vec<(f64, f64)> =
                    path.iter().map(|&(x, y)| transform.apply(x, y)).collect();
                surface.draw_line(&projected, *width, *stroke);
            }
        }
        Symbolizer::Polygon { fill } => {
            for rings in polygon_rings(geometry) {
                let projected: Vec<Vec<(f64, f64)>> = rings
                    .iter()
                    .map(|ring| ring.iter().map(|&(x, y)| transform.apply(x, y)).collect())
                    .collect();
                surface.draw_polygon(&projected, *fill);
            }
        }
    }
}

fn point_coords(geometry: &Geometry<f64>) -> Vec<(f64, f64)> {
    match geometry {
        Geometry::Point(point) => vec![(point.x(), point.y())],
        Geometry::MultiPoint(points) => points.0.iter().map(|p| (p.x(), p.y())).collect(),
        _ => Vec::new(),
    }
}

fn line_paths(geometry: &Geometry<f64>) -> Vec<Vec<(f64, f64)>> {
    match geometry {
        Geometry::Line(line) => vec![vec![
            (line.start.x, line.start.y),
            (line.end.x, line.end.y),
        ]],
        Geometry::LineString(line) => vec![line_coords(line)],
        Geometry::MultiLineString(lines) => lines.0.iter().map(line_coords).collect(),
        _ => Vec::new(),
    }
}

fn polygon_rings(geometry: &Geometry<f64>) -> Vec<Vec<Vec<(f64, f64)>>> {
    match geometry {
        Geometry::Polygon(polygon) => vec![rings_of(polygon)],
        Geometry::MultiPolygon(polygons) => polygons.0.iter().map(rings_of).collect(),
        Geometry::Rect(rect) => vec![rings_of(&rect.to_polygon())],
        Geometry::Triangle(triangle) => vec![rings_of(&triangle.to_polygon())],
        _ => Vec::new(),
    }
}

fn rings_of(polygon: &Polygon<f64>) -> Vec<Vec<(f64, f64)>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors().iter())
        .map(line_coords)
        .collect()
}

fn line_coords(line: &LineString<f64>) -> Vec<(f64, f64)> {
    line.coords().map(|coord| (coord.x, coord.y)).collect()
}
