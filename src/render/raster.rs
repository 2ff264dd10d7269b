//! Raster render target and its software painter.

use std::io::Cursor;
use std::path::Path;

use ahash::{HashSet, HashSetExt};

use super::{write_atomic, Surface};
use crate::color::Color;
use crate::error::CartaError;

/// A width × height RGBA8 pixel buffer.
///
/// The buffer is owned by the caller and constructed independently of any
/// map; [`render`](crate::render::render) composites into it in place. All
/// pixel writes are bounds-checked, so rendering can never touch memory
/// outside the buffer.
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterImage {
    /// Creates a fully transparent image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Width of the image in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the image in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw pixel data: 4 bytes (RGBA) per pixel, row-major from the top-left
    /// corner.
    pub fn data(&self) -> &[u8] {
        &self.pixels
    }

    /// Color of the pixel at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let index = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.pixels[index..index + 4];
        Some(Color::rgba(px[0], px[1], px[2], px[3]))
    }

    /// Encodes the image into the named file format ("png", "jpeg", ...).
    ///
    /// Format names are file extensions as understood by the `image` crate;
    /// an unknown name is an [`CartaError::InvalidArgument`]. JPEG has no
    /// alpha channel, so the image is flattened for it.
    pub fn encode(&self, format: &str) -> Result<Vec<u8>, CartaError> {
        let image_format = image::ImageFormat::from_extension(format).ok_or_else(|| {
            CartaError::InvalidArgument(format!("unknown image format '{format}'"))
        })?;

        let buffer = image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| CartaError::Generic("pixel buffer size mismatch".to_string()))?;

        let mut bytes = Cursor::new(Vec::new());
        match image_format {
            image::ImageFormat::Jpeg => {
                image::DynamicImage::ImageRgba8(buffer)
                    .to_rgb8()
                    .write_to(&mut bytes, image_format)?;
            }
            _ => buffer.write_to(&mut bytes, image_format)?,
        }

        Ok(bytes.into_inner())
    }

    /// Encodes the image and writes it to `path` atomically.
    ///
    /// The bytes written are identical to what [`RasterImage::encode`]
    /// returns for the same format.
    pub fn save(&self, path: impl AsRef<Path>, format: &str) -> Result<(), CartaError> {
        let bytes = self.encode(format)?;
        write_atomic(path.as_ref(), &bytes)
    }

    fn blend_pixel(&mut self, x: i64, y: i64, color: Color) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }

        let index = (y as usize * self.width as usize + x as usize) * 4;
        let px = &mut self.pixels[index..index + 4];
        let blended = Color::rgba(px[0], px[1], px[2], px[3]).blend(color);
        px.copy_from_slice(&[blended.r(), blended.g(), blended.b(), blended.a()]);
    }
}

impl Surface for RasterImage {
    fn fill_background(&mut self, color: Color) {
        let rgba = [color.r(), color.g(), color.b(), color.a()];
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    fn draw_marker(&mut self, center: (f64, f64), size: f64, fill: Color) {
        let radius = (size / 2.0).max(0.5);
        let (cx, cy) = center;

        let x_from = (cx - radius).floor() as i64;
        let x_to = (cx + radius).ceil() as i64;
        let y_from = (cy - radius).floor() as i64;
        let y_to = (cy + radius).ceil() as i64;

        let mut hit = false;
        for y in y_from..=y_to {
            for x in x_from..=x_to {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                if dx * dx + dy * dy <= radius * radius {
                    self.blend_pixel(x, y, fill);
                    hit = true;
                }
            }
        }

        // a tiny marker can fall between pixel centers; keep it visible
        if !hit {
            self.blend_pixel(cx.floor() as i64, cy.floor() as i64, fill);
        }
    }

    fn draw_line(&mut self, path: &[(f64, f64)], width: f64, stroke: Color) {
        let radius = (width / 2.0).max(0.5);

        // collect the covered pixels first so overlapping stamps blend once
        let mut covered = HashSet::new();
        for pair in path.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];

            let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as usize;
            for step in 0..=steps {
                let t = step as f64 / steps as f64;
                let cx = x0 + (x1 - x0) * t;
                let cy = y0 + (y1 - y0) * t;

                // the pixel under the sample point is always part of the
                // stroke, whatever the width
                covered.insert((cx.floor() as i64, cy.floor() as i64));

                let x_from = (cx - radius).floor() as i64;
                let x_to = (cx + radius).ceil() as i64;
                let y_from = (cy - radius).floor() as i64;
                let y_to = (cy + radius).ceil() as i64;
                for y in y_from..=y_to {
                    for x in x_from..=x_to {
                        let dx = x as f64 + 0.5 - cx;
                        let dy = y as f64 + 0.5 - cy;
                        if dx * dx + dy * dy <= radius * radius {
                            covered.insert((x, y));
                        }
                    }
                }
            }
        }

        for (x, y) in covered {
            self.blend_pixel(x, y, stroke);
        }
    }

    fn draw_polygon(&mut self, rings: &[Vec<(f64, f64)>], fill: Color) {
        // even-odd scanline fill over the edges of all rings
        let mut edges = Vec::new();
        for ring in rings {
            if ring.len() < 2 {
                continue;
            }
            for index in 0..ring.len() {
                let a = ring[index];
                let b = ring[(index + 1) % ring.len()];
                if a.1 != b.1 {
                    edges.push((a, b));
                }
            }
        }
        if edges.is_empty() {
            return;
        }

        for y in 0..self.height {
            let scan = y as f64 + 0.5;

            let mut crossings: Vec<f64> = edges
                .iter()
                .filter(|((_, y0), (_, y1))| scan >= y0.min(*y1) && scan < y0.max(*y1))
                .map(|&((x0, y0), (x1, y1))| x0 + (scan - y0) / (y1 - y0) * (x1 - x0))
                .collect();
            crossings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

            for span in crossings.chunks_exact(2) {
                let from = (span[0] - 0.5).ceil() as i64;
                let to = (span[1] - 0.5).floor() as i64;
                for x in from..=to {
                    self.blend_pixel(x, y as i64, fill);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn visible_pixel_count(image: &RasterImage) -> usize {
        image.data().chunks_exact(4).filter(|px| px[3] > 0).count()
    }

    #[test]
    fn new_image_is_fully_transparent() {
        let image = RasterImage::new(4, 3);
        assert_eq!(image.data().len(), 4 * 3 * 4);
        assert_eq!(visible_pixel_count(&image), 0);
        assert_eq!(image.pixel(3, 2), Some(Color::TRANSPARENT));
        assert_eq!(image.pixel(4, 0), None);
    }

    #[test]
    fn marker_outside_the_image_is_clipped_silently() {
        let mut image = RasterImage::new(8, 8);
        image.draw_marker((-100.0, -100.0), 10.0, Color::RED);
        assert_eq!(visible_pixel_count(&image), 0);

        image.draw_marker((0.0, 0.0), 10.0, Color::RED);
        assert!(visible_pixel_count(&image) > 0);
        assert!(visible_pixel_count(&image) < 8 * 8);
    }

    #[test]
    fn line_covers_its_endpoints() {
        let mut image = RasterImage::new(16, 16);
        image.draw_line(&[(2.0, 2.0), (13.0, 13.0)], 1.0, Color::BLACK);

        assert_eq!(image.pixel(2, 2), Some(Color::BLACK));
        assert_eq!(image.pixel(12, 12), Some(Color::BLACK));
        assert_eq!(image.pixel(2, 13), Some(Color::TRANSPARENT));
    }

    #[test]
    fn polygon_fill_respects_holes() {
        let mut image = RasterImage::new(20, 20);
        let exterior = vec![(2.0, 2.0), (18.0, 2.0), (18.0, 18.0), (2.0, 18.0)];
        let hole = vec![(8.0, 8.0), (12.0, 8.0), (12.0, 12.0), (8.0, 12.0)];
        image.draw_polygon(&[exterior, hole], Color::GREEN);

        assert_eq!(image.pixel(5, 5), Some(Color::GREEN));
        assert_eq!(image.pixel(10, 10), Some(Color::TRANSPARENT));
        assert_eq!(image.pixel(0, 0), Some(Color::TRANSPARENT));
    }

    #[test]
    fn semi_transparent_fill_blends_with_background() {
        let mut image = RasterImage::new(4, 4);
        image.fill_background(Color::WHITE);
        image.draw_polygon(
            &[vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]],
            Color::rgba(0, 0, 255, 128),
        );

        let px = image.pixel(2, 2).expect("inside image");
        assert!(px.r() > 100 && px.r() < 150);
        assert_eq!(px.b(), 255);
    }

    #[test]
    fn png_encoding_round_trips_through_the_image_crate() {
        let mut image = RasterImage::new(8, 8);
        image.fill_background(Color::RED);

        let png = image.encode("png").expect("png supported");
        assert_eq!(&png[1..4], b"PNG");

        let decoded = image::load_from_memory(&png).expect("valid png").to_rgba8();
        assert_eq!(decoded.dimensions(), (8, 8));
        assert_eq!(decoded.get_pixel(4, 4).0, [255, 0, 0, 255]);
    }

    #[test]
    fn jpeg_encoding_flattens_alpha() {
        let image = RasterImage::new(8, 8);
        let jpeg = image.encode("jpg").expect("jpeg supported");
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let image = RasterImage::new(2, 2);
        assert_matches!(image.encode("mp4"), Err(CartaError::InvalidArgument(_)));
    }

    #[test]
    fn save_writes_the_encoded_bytes() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("out.png");

        let mut image = RasterImage::new(4, 4);
        image.fill_background(Color::BLUE);
        image.save(&path, "png").expect("writable");

        assert_eq!(
            std::fs::read(&path).expect("file written"),
            image.encode("png").expect("png supported")
        );
    }
}
