//! Minimal SVG document builder and writer.
//!
//! Coordinates are formatted with one decimal so identical input
//! always produces byte-identical files.

use super::ChartError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

pub const FONT_FAMILY: &str = "DejaVu Sans, Arial, sans-serif";

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_str(&self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

/// An SVG image assembled element by element.
#[derive(Debug, Clone)]
pub struct SvgDocument {
    width: u32,
    height: u32,
    elements: Vec<String>,
}

impl SvgDocument {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            elements: Vec::new(),
        }
    }

    pub fn width(&self) -> f64 {
        self.width as f64
    }

    pub fn height(&self) -> f64 {
        self.height as f64
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str, opacity: f64) {
        self.elements.push(format!(
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}" fill-opacity="{:.2}"/>"#,
            x, y, w, h, fill, opacity
        ));
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str, width: f64) {
        self.elements.push(format!(
            r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="{:.1}"/>"#,
            x1, y1, x2, y2, stroke, width
        ));
    }

    /// Light grid line.
    pub fn grid_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.elements.push(format!(
            r##"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="#000000" stroke-opacity="0.15" stroke-width="1.0"/>"##,
            x1, y1, x2, y2
        ));
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], stroke: &str, width: f64, dashed: bool) {
        if points.is_empty() {
            return;
        }
        let coords: Vec<String> = points
            .iter()
            .map(|(x, y)| format!("{:.1},{:.1}", x, y))
            .collect();
        let dash = if dashed {
            r#" stroke-dasharray="6,4""#
        } else {
            ""
        };
        self.elements.push(format!(
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="{:.1}"{}/>"#,
            coords.join(" "),
            stroke,
            width,
            dash
        ));
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: &str) {
        self.elements.push(format!(
            r#"<circle cx="{:.1}" cy="{:.1}" r="{:.1}" fill="{}"/>"#,
            cx, cy, r, fill
        ));
    }

    pub fn text(&mut self, x: f64, y: f64, content: &str, size: u32, anchor: Anchor) {
        self.elements.push(format!(
            r#"<text x="{:.1}" y="{:.1}" font-family="{}" font-size="{}" text-anchor="{}">{}</text>"#,
            x,
            y,
            FONT_FAMILY,
            size,
            anchor.as_str(),
            escape(content)
        ));
    }

    /// Text rotated by `angle` degrees around its anchor point.
    pub fn text_rotated(
        &mut self,
        x: f64,
        y: f64,
        content: &str,
        size: u32,
        anchor: Anchor,
        angle: i32,
    ) {
        self.elements.push(format!(
            r#"<text x="{:.1}" y="{:.1}" font-family="{}" font-size="{}" text-anchor="{}" transform="rotate({} {:.1} {:.1})">{}</text>"#,
            x,
            y,
            FONT_FAMILY,
            size,
            anchor.as_str(),
            angle,
            x,
            y,
            escape(content)
        ));
    }

    /// Assemble the final document.
    pub fn finish(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" width="{}" height="{}">
  <rect width="100%" height="100%" fill="white"/>
  {}
</svg>
"#,
            self.width,
            self.height,
            self.width,
            self.height,
            self.elements.join("\n  ")
        )
    }
}

/// Escape text for use in SVG content.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Write SVG content to a file, replacing any previous version.
pub fn write_svg(svg_content: &str, output_path: &Path) -> Result<(), ChartError> {
    if output_path.as_os_str().is_empty() {
        return Err(ChartError::InvalidPath("path is empty".to_string()));
    }
    if output_path.is_dir() {
        return Err(ChartError::InvalidPath(format!(
            "path is a directory: {}",
            output_path.display()
        )));
    }

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating chart directory: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|source| ChartError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let write = || -> std::io::Result<()> {
        let file = File::create(output_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(svg_content.as_bytes())?;
        writer.flush()
    };
    write().map_err(|source| ChartError::Write {
        path: output_path.to_path_buf(),
        source,
    })?;

    info!(
        "Chart written to {} ({:.2} KB)",
        output_path.display(),
        svg_content.len() as f64 / 1024.0
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
        assert_eq!(escape("風景"), "風景");
    }

    #[test]
    fn test_document_structure() {
        let mut doc = SvgDocument::new(200, 100);
        doc.rect(10.0, 20.0, 30.0, 40.0, "steelblue", 0.8);
        doc.text(5.0, 5.0, "<title>", 12, Anchor::Middle);
        let svg = doc.finish();

        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains(r#"viewBox="0 0 200 100""#));
        assert!(svg.contains(r#"<rect x="10.0" y="20.0" width="30.0" height="40.0""#));
        assert!(svg.contains("&lt;title&gt;"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_empty_polyline_is_ignored() {
        let mut doc = SvgDocument::new(10, 10);
        doc.polyline(&[], "black", 1.0, false);
        assert!(!doc.finish().contains("polyline"));
    }

    #[test]
    fn test_write_svg_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("images").join("chart.svg");

        write_svg("<svg>first</svg>", &path).unwrap();
        write_svg("<svg>second</svg>", &path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<svg>second</svg>");
    }

    #[test]
    fn test_write_svg_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            write_svg("<svg/>", dir.path()),
            Err(ChartError::InvalidPath(_))
        ));
    }
}
