//! Vector surfaces: deterministic SVG and single-page PDF writers.
//!
//! Both writers emit fully deterministic output (fixed element order, fixed
//! decimal formatting, no timestamps or generated identifiers), which is
//! what makes the to-file and to-memory render paths byte-identical.

use std::fmt::Write;

use super::Surface;
use crate::color::Color;

/// Kappa constant for approximating a quarter circle with a cubic Bezier.
const CIRCLE_KAPPA: f64 = 0.552_284_749_831;

pub(super) struct SvgSurface {
    width: u32,
    height: u32,
    body: String,
}

impl SvgSurface {
    pub(super) fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            body: String::new(),
        }
    }

    pub(super) fn finish(self) -> Vec<u8> {
        let mut document = String::new();
        let _ = writeln!(document, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        let _ = writeln!(
            document,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height,
        );
        document.push_str(&self.body);
        document.push_str("</svg>\n");
        document.into_bytes()
    }
}

impl Surface for SvgSurface {
    fn fill_background(&mut self, color: Color) {
        let _ = writeln!(
            self.body,
            r#"<rect x="0" y="0" width="{}" height="{}" {}/>"#,
            self.width,
            self.height,
            fill_attrs(color),
        );
    }

    fn draw_marker(&mut self, center: (f64, f64), size: f64, fill: Color) {
        let _ = writeln!(
            self.body,
            r#"<circle cx="{}" cy="{}" r="{}" {}/>"#,
            num(center.0),
            num(center.1),
            num((size / 2.0).max(0.5)),
            fill_attrs(fill),
        );
    }

    fn draw_line(&mut self, path: &[(f64, f64)], width: f64, stroke: Color) {
        if path.len() < 2 {
            return;
        }

        let points = path
            .iter()
            .map(|&(x, y)| format!("{},{}", num(x), num(y)))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(
            self.body,
            r#"<polyline points="{points}" fill="none" stroke-width="{}" stroke-linecap="round" {}/>"#,
            num(width),
            stroke_attrs(stroke),
        );
    }

    fn draw_polygon(&mut self, rings: &[Vec<(f64, f64)>], fill: Color) {
        let mut data = String::new();
        for ring in rings {
            if ring.len() < 3 {
                continue;
            }
            for (index, &(x, y)) in ring.iter().enumerate() {
                let command = if index == 0 { 'M' } else { 'L' };
                let _ = write!(data, "{command}{} {} ", num(x), num(y));
            }
            data.push_str("Z ");
        }
        if data.is_empty() {
            return;
        }

        let _ = writeln!(
            self.body,
            r#"<path d="{}" fill-rule="evenodd" {}/>"#,
            data.trim_end(),
            fill_attrs(fill),
        );
    }
}

fn num(value: f64) -> String {
    format!("{value:.2}")
}

fn hex6(color: Color) -> String {
    format!("#{:02X}{:02X}{:02X}", color.r(), color.g(), color.b())
}

fn fill_attrs(color: Color) -> String {
    if color.a() == 255 {
        format!(r#"fill="{}""#, hex6(color))
    } else {
        format!(
            r#"fill="{}" fill-opacity="{:.3}""#,
            hex6(color),
            color.a() as f64 / 255.0
        )
    }
}

fn stroke_attrs(color: Color) -> String {
    if color.a() == 255 {
        format!(r#"stroke="{}""#, hex6(color))
    } else {
        format!(
            r#"stroke="{}" stroke-opacity="{:.3}""#,
            hex6(color),
            color.a() as f64 / 255.0
        )
    }
}

/// Minimal single-page PDF writer.
///
/// Content is collected as one content stream; [`PdfSurface::finish`]
/// assembles the fixed five-object document around it and computes the xref
/// offsets. Alpha is not representable without extended graphics states and
/// is dropped; colors draw opaque.
pub(super) struct PdfSurface {
    width: u32,
    height: u32,
    content: String,
}

impl PdfSurface {
    pub(super) fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            content: String::new(),
        }
    }

    /// PDF's origin is the bottom-left corner; flip the screen y axis.
    fn flip(&self, y: f64) -> f64 {
        self.height as f64 - y
    }

    pub(super) fn finish(self) -> Vec<u8> {
        let mut out: Vec<u8> = Vec::new();
        let mut offsets = [0usize; 5];

        out.extend_from_slice(b"%PDF-1.4\n");

        offsets[1] = out.len();
        out.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

        offsets[2] = out.len();
        out.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n");

        offsets[3] = out.len();
        out.extend(
            format!(
                "3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Contents 4 0 R >>\nendobj\n",
                self.width, self.height
            )
            .into_bytes(),
        );

        offsets[4] = out.len();
        let stream = self.content.into_bytes();
        out.extend(format!("4 0 obj\n<< /Length {} >>\nstream\n", stream.len()).into_bytes());
        out.extend_from_slice(&stream);
        out.extend_from_slice(b"endstream\nendobj\n");

        let xref_offset = out.len();
        out.extend_from_slice(b"xref\n0 5\n0000000000 65535 f \n");
        for offset in &offsets[1..] {
            out.extend(format!("{offset:010} 00000 n \n").into_bytes());
        }
        out.extend(
            format!("trailer\n<< /Size 5 /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n")
                .into_bytes(),
        );

        out
    }
}

impl Surface for PdfSurface {
    fn fill_background(&mut self, color: Color) {
        let _ = writeln!(
            self.content,
            "{} rg\n0 0 {} {} re\nf",
            rgb(color),
            self.width,
            self.height
        );
    }

    fn draw_marker(&mut self, center: (f64, f64), size: f64, fill: Color) {
        let radius = (size / 2.0).max(0.5);
        let k = radius * CIRCLE_KAPPA;
        let (cx, cy) = (center.0, self.flip(center.1));

        let _ = writeln!(self.content, "{} rg", rgb(fill));
        let _ = writeln!(self.content, "{} {} m", num(cx + radius), num(cy));
        let _ = writeln!(
            self.content,
            "{} {} {} {} {} {} c",
            num(cx + radius),
            num(cy + k),
            num(cx + k),
            num(cy + radius),
            num(cx),
            num(cy + radius)
        );
        let _ = writeln!(
            self.content,
            "{} {} {} {} {} {} c",
            num(cx - k),
            num(cy + radius),
            num(cx - radius),
            num(cy + k),
            num(cx - radius),
            num(cy)
        );
        let _ = writeln!(
            self.content,
            "{} {} {} {} {} {} c",
            num(cx - radius),
            num(cy - k),
            num(cx - k),
            num(cy - radius),
            num(cx),
            num(cy - radius)
        );
        let _ = writeln!(
            self.content,
            "{} {} {} {} {} {} c",
            num(cx + k),
            num(cy - radius),
            num(cx + radius),
            num(cy - k),
            num(cx + radius),
            num(cy)
        );
        let _ = writeln!(self.content, "f");
    }

    fn draw_line(&mut self, path: &[(f64, f64)], width: f64, stroke: Color) {
        if path.len() < 2 {
            return;
        }

        let _ = writeln!(self.content, "{} RG\n{} w\n1 J\n1 j", rgb(stroke), num(width));
        for (index, &(x, y)) in path.iter().enumerate() {
            let op = if index == 0 { 'm' } else { 'l' };
            let _ = writeln!(self.content, "{} {} {op}", num(x), num(self.flip(y)));
        }
        let _ = writeln!(self.content, "S");
    }

    fn draw_polygon(&mut self, rings: &[Vec<(f64, f64)>], fill: Color) {
        let mut any_ring = false;
        let mut body = String::new();
        for ring in rings {
            if ring.len() < 3 {
                continue;
            }
            any_ring = true;
            for (index, &(x, y)) in ring.iter().enumerate() {
                let op = if index == 0 { 'm' } else { 'l' };
                let _ = writeln!(body, "{} {} {op}", num(x), num(self.flip(y)));
            }
            body.push_str("h\n");
        }
        if !any_ring {
            return;
        }

        let _ = writeln!(self.content, "{} rg\n{body}f*", rgb(fill));
    }
}

fn rgb(color: Color) -> String {
    format!(
        "{:.3} {:.3} {:.3}",
        color.r() as f64 / 255.0,
        color.g() as f64 / 255.0,
        color.b() as f64 / 255.0
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finish_svg(surface: SvgSurface) -> String {
        String::from_utf8(surface.finish()).expect("svg is utf-8")
    }

    #[test]
    fn empty_svg_document_is_well_formed() {
        let text = finish_svg(SvgSurface::new(64, 48));
        assert!(text.starts_with("<?xml"));
        assert!(text.contains(r#"viewBox="0 0 64 48""#));
        assert!(text.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn svg_marker_and_background() {
        let mut surface = SvgSurface::new(10, 10);
        surface.fill_background(Color::WHITE);
        surface.draw_marker((5.0, 5.0), 4.0, Color::rgba(255, 0, 0, 128));

        let text = finish_svg(surface);
        assert!(text.contains(r##"<rect x="0" y="0" width="10" height="10" fill="#FFFFFF"/>"##));
        assert!(text.contains(r#"cx="5.00" cy="5.00" r="2.00""#));
        assert!(text.contains(r##"fill="#FF0000" fill-opacity="0.502""##));
    }

    #[test]
    fn svg_degenerate_paths_are_dropped() {
        let mut surface = SvgSurface::new(10, 10);
        surface.draw_line(&[(1.0, 1.0)], 1.0, Color::BLACK);
        surface.draw_polygon(&[vec![(1.0, 1.0), (2.0, 2.0)]], Color::BLACK);

        let text = finish_svg(surface);
        assert!(!text.contains("polyline"));
        assert!(!text.contains("path"));
    }

    #[test]
    fn identical_input_produces_identical_pdf_bytes() {
        let build = || {
            let mut surface = PdfSurface::new(100, 100);
            surface.fill_background(Color::WHITE);
            surface.draw_line(&[(0.0, 0.0), (100.0, 100.0)], 2.0, Color::BLACK);
            surface.draw_marker((50.0, 50.0), 10.0, Color::RED);
            surface.finish()
        };

        assert_eq!(build(), build());
    }

    #[test]
    fn pdf_xref_offsets_point_at_objects() {
        let mut surface = PdfSurface::new(10, 10);
        surface.fill_background(Color::BLACK);
        let bytes = surface.finish();
        let text = String::from_utf8_lossy(&bytes);

        let xref_at = text.find("xref\n").expect("xref present");
        for object in 1..=4 {
            let line_start = xref_at + "xref\n0 5\n".len() + object * 20;
            let offset: usize = text[line_start..line_start + 10]
                .parse()
                .expect("numeric offset");
            assert!(text[offset..].starts_with(&format!("{object} 0 obj")));
        }
    }

    #[test]
    fn pdf_flips_the_y_axis() {
        let mut surface = PdfSurface::new(100, 100);
        surface.draw_line(&[(0.0, 0.0), (10.0, 0.0)], 1.0, Color::BLACK);
        let bytes = surface.finish();
        let text = String::from_utf8_lossy(&bytes);

        // screen y = 0 is the top of the page, i.e. pdf y = 100
        assert!(text.contains("0.00 100.00 m"));
        assert!(text.contains("10.00 100.00 l"));
    }
}
