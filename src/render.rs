//! Renderer - Vector Stage + Raster Stage
//!
//! Serializes a [`LayoutNode`] tree to SVG, rasterizes it with resvg into
//! a fixed-dimension pixmap, and encodes PNG. Failures in either stage are
//! absorbed here: the caller always receives an image of the requested
//! dimensions, at worst the pre-encoded fallback.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use log::{debug, error, warn};
use thiserror::Error;

use crate::layout::{LayoutNode, NodeStyle};
use crate::request::ALLOWED_DIMENSIONS;

/// PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Last-resort fallback: a 1x1 transparent PNG. Only reachable if pixmap
/// allocation itself fails, which the allow-listed dimensions rule out.
const MINIMAL_PNG: [u8; 67] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A,
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01,
    0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41,
    0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00,
    0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

#[derive(Debug, Error)]
pub enum FontError {
    #[error("Font directory unreadable: {0}")]
    DirUnreadable(#[from] std::io::Error),
}

/// Font assets supplied to the renderer by the host's asset loader.
/// Uses the database type re-exported by usvg so the renderer and the
/// rasterizer always agree on it.
#[derive(Debug, Clone)]
pub struct FontCatalog {
    db: Arc<usvg::fontdb::Database>,
}

impl FontCatalog {
    /// Load fonts installed on the system.
    pub fn load_system() -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        if db.len() == 0 {
            warn!("no system fonts found; text nodes will not rasterize");
        }
        Self { db: Arc::new(db) }
    }

    /// Load every font file under `dir` on top of the system fonts.
    /// An unreadable directory is the one catastrophic font condition
    /// and propagates.
    pub fn load_system_and_dir(dir: &Path) -> Result<Self, FontError> {
        std::fs::read_dir(dir)?;
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        db.load_fonts_dir(dir);
        Ok(Self { db: Arc::new(db) })
    }

    pub fn is_empty(&self) -> bool {
        self.db.len() == 0
    }
}

#[derive(Debug, Error)]
enum RasterError {
    #[error("Failed to parse SVG: {0}")]
    Svg(String),
    #[error("Failed to allocate {0}x{1} pixmap")]
    Pixmap(u32, u32),
    #[error("Failed to encode PNG: {0}")]
    Encode(String),
}

/// Result of one render call. Fallback output must never be cached.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub bytes: Vec<u8>,
    pub fallback: bool,
}

pub struct Renderer {
    fonts: Arc<usvg::fontdb::Database>,
    /// Pre-encoded fallback per allowed size, produced once through an
    /// infallible pixmap-fill path that needs no fonts or SVG parsing.
    fallbacks: HashMap<(u32, u32), Vec<u8>>,
}

impl Renderer {
    pub fn new(fonts: FontCatalog) -> Self {
        let mut fallbacks = HashMap::new();
        for (w, h) in ALLOWED_DIMENSIONS {
            fallbacks.insert((w, h), encode_fallback(w, h));
        }
        Self { fonts: fonts.db, fallbacks }
    }

    /// Render the tree at exactly `width` x `height`. Never panics and
    /// never returns an error; a failed stage yields the fallback image.
    pub fn render(&self, tree: &LayoutNode, width: u32, height: u32) -> RenderOutput {
        match self.rasterize(tree, width, height) {
            Ok(bytes) => RenderOutput { bytes, fallback: false },
            Err(e) => {
                error!("render failed, substituting fallback image: {e}");
                RenderOutput {
                    bytes: self.fallback_bytes(width, height),
                    fallback: true,
                }
            }
        }
    }

    fn fallback_bytes(&self, width: u32, height: u32) -> Vec<u8> {
        self.fallbacks
            .get(&(width, height))
            .cloned()
            .unwrap_or_else(|| encode_fallback(width, height))
    }

    fn rasterize(&self, tree: &LayoutNode, width: u32, height: u32) -> Result<Vec<u8>, RasterError> {
        let svg = tree_to_svg(tree, width, height);
        debug!("vector stage produced {} bytes of SVG", svg.len());

        let options = usvg::Options {
            fontdb: Arc::clone(&self.fonts),
            ..Default::default()
        };
        let parsed = usvg::Tree::from_str(&svg, &options)
            .map_err(|e| RasterError::Svg(e.to_string()))?;

        let mut pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or(RasterError::Pixmap(width, height))?;
        resvg::render(&parsed, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        pixmap.encode_png().map_err(|e| RasterError::Encode(e.to_string()))
    }
}

/// Stage (a): serialize the node tree to an SVG document. Positions and
/// sizes come verbatim from node styles.
pub fn tree_to_svg(tree: &LayoutNode, width: u32, height: u32) -> String {
    let mut defs = String::new();
    let mut body = String::new();
    let mut gradient_seq = 0usize;
    write_node(tree, &mut body, &mut defs, &mut gradient_seq);

    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" "#,
            r#"viewBox="0 0 {w} {h}"><defs>{defs}</defs>{body}</svg>"#
        ),
        w = width,
        h = height,
        defs = defs,
        body = body,
    )
}

fn write_node(node: &LayoutNode, body: &mut String, defs: &mut String, gradient_seq: &mut usize) {
    match node {
        LayoutNode::Box { children, style } => {
            write_rect(style, body, defs, gradient_seq);
            for child in children {
                write_node(child, body, defs, gradient_seq);
            }
        }
        LayoutNode::Text { content, style } => write_text(content, style, body),
        LayoutNode::Image { src, style } => {
            let _ = write!(
                body,
                r#"<image x="{}" y="{}" width="{}" height="{}" href="{}"/>"#,
                style.x,
                style.y,
                style.width,
                style.height,
                escape_xml(src),
            );
        }
    }
}

fn write_rect(style: &NodeStyle, body: &mut String, defs: &mut String, gradient_seq: &mut usize) {
    let fill = if let Some(stops) = &style.gradient {
        let id = format!("g{}", *gradient_seq);
        *gradient_seq += 1;
        let _ = write!(
            defs,
            concat!(
                r#"<linearGradient id="{id}" x1="0" y1="0" x2="1" y2="1">"#,
                r#"<stop offset="0" stop-color="{a}"/><stop offset="1" stop-color="{b}"/>"#,
                r#"</linearGradient>"#
            ),
            id = id,
            a = stops[0],
            b = stops[1],
        );
        format!("url(#{id})")
    } else if let Some(fill) = &style.fill {
        fill.clone()
    } else {
        // grouping-only box, nothing to draw
        return;
    };

    let _ = write!(
        body,
        r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" fill="{}" opacity="{}"/>"#,
        style.x, style.y, style.width, style.height, style.corner_radius, fill, style.opacity,
    );
}

fn write_text(content: &str, style: &NodeStyle, body: &mut String) {
    if content.is_empty() {
        return;
    }
    let color = style.color.as_deref().unwrap_or("#000000");
    // style.y is the top edge; SVG text is baseline-anchored
    let baseline = style.y + style.font_size;
    let _ = write!(
        body,
        concat!(
            r#"<text x="{}" y="{}" font-family="sans-serif" font-size="{}" "#,
            r#"font-weight="{}" fill="{}" opacity="{}">{}</text>"#
        ),
        style.x,
        baseline,
        style.font_size,
        style.font_weight,
        color,
        style.opacity,
        escape_xml(content),
    );
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

/// Build the fallback image: plain dark background with placeholder bars.
/// No fonts, no SVG parsing, so it cannot share failure modes with the
/// main path.
fn encode_fallback(width: u32, height: u32) -> Vec<u8> {
    let Some(mut pixmap) = tiny_skia::Pixmap::new(width, height) else {
        return MINIMAL_PNG.to_vec();
    };
    pixmap.fill(tiny_skia::Color::from_rgba8(15, 23, 42, 255));

    let mut paint = tiny_skia::Paint::default();
    paint.set_color(tiny_skia::Color::from_rgba8(148, 163, 184, 255));
    let bars = [
        (0.08, 0.40, 0.50, 0.06),
        (0.08, 0.52, 0.34, 0.04),
        (0.08, 0.62, 0.42, 0.04),
    ];
    for (x, y, w, h) in bars {
        if let Some(rect) = tiny_skia::Rect::from_xywh(
            x * width as f32,
            y * height as f32,
            w * width as f32,
            h * height as f32,
        ) {
            pixmap.fill_rect(rect, &paint, tiny_skia::Transform::identity(), None);
        }
    }

    pixmap.encode_png().unwrap_or_else(|_| MINIMAL_PNG.to_vec())
}
