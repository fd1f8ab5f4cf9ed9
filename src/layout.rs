//! Layout Builder - Request to Node Tree
//!
//! Builds an ephemeral [`LayoutNode`] tree from a request and a registry
//! entry. Construction order is fixed; nodes whose backing data is absent
//! are omitted entirely rather than rendered empty.

use crate::registry::{RegistryEntry, TemplateId};
use crate::request::ImageRequest;

pub const FOOTER_DOMAIN: &str = "boswelldigital.com";

/// Style attributes a node carries into rendering. Positions and sizes are
/// absolute pixels in the target raster space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeStyle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Solid fill color (CSS hex). Ignored when `gradient` is set.
    pub fill: Option<String>,
    /// Two-stop linear gradient, top-left to bottom-right.
    pub gradient: Option<[String; 2]>,
    pub corner_radius: f32,
    pub opacity: f32,
    pub font_size: f32,
    pub font_weight: u16,
    pub color: Option<String>,
}

impl NodeStyle {
    fn at(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            opacity: 1.0,
            ..Default::default()
        }
    }

    fn filled(mut self, color: &str) -> Self {
        self.fill = Some(color.to_string());
        self
    }

    fn rounded(mut self, radius: f32) -> Self {
        self.corner_radius = radius;
        self
    }

    fn faded(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    fn text(mut self, size: f32, weight: u16, color: &str) -> Self {
        self.font_size = size;
        self.font_weight = weight;
        self.color = Some(color.to_string());
        self
    }

    fn with_gradient(mut self, stops: [&'static str; 2]) -> Self {
        self.gradient = Some([stops[0].to_string(), stops[1].to_string()]);
        self
    }
}

/// Ephemeral layout tree. Built fresh per request, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutNode {
    Box { children: Vec<LayoutNode>, style: NodeStyle },
    Text { content: String, style: NodeStyle },
    Image { src: String, style: NodeStyle },
}

impl LayoutNode {
    pub fn style(&self) -> &NodeStyle {
        match self {
            LayoutNode::Box { style, .. }
            | LayoutNode::Text { style, .. }
            | LayoutNode::Image { style, .. } => style,
        }
    }
}

/// Title font size in px, stepped down as the title grows.
pub fn title_font_size(len: usize) -> f32 {
    match len {
        0..=25 => 64.0,
        26..=45 => 56.0,
        46..=65 => 48.0,
        66..=85 => 40.0,
        _ => 34.0,
    }
}

/// Description font size in px.
pub fn description_font_size(len: usize) -> f32 {
    match len {
        0..=80 => 28.0,
        81..=140 => 24.0,
        _ => 21.0,
    }
}

/// Build the node tree for one request. Pure; cannot fail because the
/// registry entry is already resolved.
pub fn build(request: &ImageRequest, entry: RegistryEntry) -> LayoutNode {
    let w = request.width as f32;
    let h = request.height as f32;
    let palette = entry.palette;

    let mut children = Vec::new();

    // Decorative background shapes, purely cosmetic. Minimal skips them.
    match entry.template {
        TemplateId::Modern => {
            children.push(LayoutNode::Box {
                children: vec![],
                style: NodeStyle::at(w - 260.0, -140.0, 400.0, 400.0)
                    .filled(palette.accent)
                    .rounded(200.0)
                    .faded(0.18),
            });
            children.push(LayoutNode::Box {
                children: vec![],
                style: NodeStyle::at(-120.0, h - 180.0, 300.0, 300.0)
                    .filled(palette.accent)
                    .rounded(150.0)
                    .faded(0.12),
            });
        }
        TemplateId::Classic => {
            children.push(LayoutNode::Box {
                children: vec![],
                style: NodeStyle::at(0.0, 0.0, w, 14.0).filled(palette.accent),
            });
        }
        TemplateId::Minimal => {}
    }

    // Card container.
    let card_margin = 60.0;
    let card = NodeStyle::at(card_margin, card_margin, w - 2.0 * card_margin, h - 2.0 * card_margin)
        .filled(palette.card_background)
        .rounded(24.0);
    children.push(LayoutNode::Box { children: vec![], style: card });

    let content_x = card_margin + 60.0;
    let content_right = w - card_margin - 60.0;
    let mut cursor_y = card_margin + 70.0;

    // Branding mark.
    children.push(LayoutNode::Text {
        content: "BDS".to_string(),
        style: NodeStyle::at(content_x, cursor_y, 120.0, 36.0).text(30.0, 700, palette.accent),
    });

    // Page-type badge, absent for plain website pages.
    if let Some(label) = request.page_type.badge_label() {
        children.push(LayoutNode::Box {
            children: vec![LayoutNode::Text {
                content: label.to_string(),
                style: NodeStyle::at(content_right - 130.0, cursor_y - 4.0, 110.0, 24.0)
                    .text(18.0, 600, palette.text_primary),
            }],
            style: NodeStyle::at(content_right - 150.0, cursor_y - 26.0, 150.0, 40.0)
                .filled(palette.accent)
                .rounded(20.0)
                .faded(0.35),
        });
    }
    cursor_y += 80.0;

    // Title, wrapped to fit the card width at the tier's font size.
    let title_size = title_font_size(request.title.chars().count());
    let max_chars = ((content_right - content_x) / (title_size * 0.54)) as usize;
    let title_lines: Vec<String> = textwrap::wrap(&request.title, max_chars.max(8))
        .into_iter()
        .take(3)
        .map(|line| line.to_string())
        .collect();
    let line_height = title_size * 1.2;
    let mut title_children = Vec::new();
    for (i, line) in title_lines.iter().enumerate() {
        title_children.push(LayoutNode::Text {
            content: line.clone(),
            style: NodeStyle::at(content_x, cursor_y + i as f32 * line_height, content_right - content_x, line_height)
                .text(title_size, 800, palette.text_primary),
        });
    }
    cursor_y += title_lines.len().max(1) as f32 * line_height + 24.0;
    children.push(LayoutNode::Box {
        children: title_children,
        style: NodeStyle::at(content_x, cursor_y, content_right - content_x, 0.0),
    });

    // Description, omitted entirely when empty.
    if let Some(description) = request.description.as_deref().filter(|d| !d.is_empty()) {
        let desc_size = description_font_size(description.chars().count());
        let max_chars = ((content_right - content_x) / (desc_size * 0.5)) as usize;
        let desc_lines: Vec<String> = textwrap::wrap(description, max_chars.max(16))
            .into_iter()
            .take(2)
            .map(|line| line.to_string())
            .collect();
        let desc_height = desc_size * 1.4;
        for line in &desc_lines {
            children.push(LayoutNode::Text {
                content: line.clone(),
                style: NodeStyle::at(content_x, cursor_y, content_right - content_x, desc_height)
                    .text(desc_size, 400, palette.text_secondary),
            });
            cursor_y += desc_height;
        }
        cursor_y += 20.0;
    }

    // Tag chips, order preserved, trimmed at the normalizer.
    if !request.tags.is_empty() {
        let chip_height = 36.0;
        let mut chip_x = content_x;
        for tag in &request.tags {
            let chip_width = 32.0 + tag.chars().count() as f32 * 11.0;
            if chip_x + chip_width > content_right {
                break;
            }
            children.push(LayoutNode::Box {
                children: vec![LayoutNode::Text {
                    content: format!("#{tag}"),
                    style: NodeStyle::at(chip_x + 16.0, cursor_y + 24.0, chip_width - 32.0, 20.0)
                        .text(18.0, 500, palette.text_secondary),
                }],
                style: NodeStyle::at(chip_x, cursor_y, chip_width, chip_height)
                    .filled(palette.accent)
                    .rounded(18.0)
                    .faded(0.2),
            });
            chip_x += chip_width + 12.0;
        }
        cursor_y += chip_height + 24.0;
    }

    // Publish date label.
    if let Some(published) = request.published_time {
        let mut label = published.format("%B %-d, %Y").to_string();
        if let Some(author) = request.author.as_deref().filter(|a| !a.is_empty()) {
            label = format!("{author} · {label}");
        }
        children.push(LayoutNode::Text {
            content: label,
            style: NodeStyle::at(content_x, cursor_y, content_right - content_x, 24.0)
                .text(20.0, 400, palette.text_secondary),
        });
    } else if let Some(author) = request.author.as_deref().filter(|a| !a.is_empty()) {
        children.push(LayoutNode::Text {
            content: author.to_string(),
            style: NodeStyle::at(content_x, cursor_y, content_right - content_x, 24.0)
                .text(20.0, 400, palette.text_secondary),
        });
    }

    // Fixed footer domain label.
    children.push(LayoutNode::Text {
        content: FOOTER_DOMAIN.to_string(),
        style: NodeStyle::at(content_x, h - card_margin - 40.0, 400.0, 24.0)
            .text(22.0, 600, palette.accent),
    });

    LayoutNode::Box {
        children,
        style: NodeStyle::at(0.0, 0.0, w, h).with_gradient(palette.background),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{resolve, ThemeId};
    use chrono::TimeZone;

    fn root_children(node: &LayoutNode) -> &[LayoutNode] {
        match node {
            LayoutNode::Box { children, .. } => children,
            _ => panic!("root must be a box"),
        }
    }

    fn text_contents(node: &LayoutNode, out: &mut Vec<String>) {
        match node {
            LayoutNode::Box { children, .. } => {
                for child in children {
                    text_contents(child, out);
                }
            }
            LayoutNode::Text { content, .. } => out.push(content.clone()),
            LayoutNode::Image { .. } => {}
        }
    }

    fn all_text(node: &LayoutNode) -> Vec<String> {
        let mut out = Vec::new();
        text_contents(node, &mut out);
        out
    }

    #[test]
    fn title_font_steps_down_with_length() {
        assert_eq!(title_font_size(10), 64.0);
        assert_eq!(title_font_size(30), 56.0);
        assert_eq!(title_font_size(50), 48.0);
        assert_eq!(title_font_size(70), 40.0);
        assert_eq!(title_font_size(100), 34.0);
    }

    #[test]
    fn build_is_deterministic() {
        let request = ImageRequest::titled("Hello World");
        let entry = resolve(request.template, request.theme);
        assert_eq!(build(&request, entry), build(&request, entry));
    }

    #[test]
    fn absent_description_emits_no_node() {
        let mut request = ImageRequest::titled("Hello");
        request.description = Some("A description".to_string());
        let entry = resolve(request.template, request.theme);
        let with_desc = all_text(&build(&request, entry));
        request.description = None;
        let without = all_text(&build(&request, entry));
        assert!(with_desc.contains(&"A description".to_string()));
        assert_eq!(with_desc.len(), without.len() + 1);
    }

    #[test]
    fn footer_domain_is_always_last_text() {
        let request = ImageRequest::titled("Hello");
        let entry = resolve(request.template, request.theme);
        let texts = all_text(&build(&request, entry));
        assert_eq!(texts.last().unwrap(), FOOTER_DOMAIN);
    }

    #[test]
    fn tags_render_as_chips_in_order() {
        let mut request = ImageRequest::titled("Hello");
        request.tags = vec!["rust".into(), "web".into()];
        let entry = resolve(request.template, request.theme);
        let texts = all_text(&build(&request, entry));
        let rust_pos = texts.iter().position(|t| t == "#rust").unwrap();
        let web_pos = texts.iter().position(|t| t == "#web").unwrap();
        assert!(rust_pos < web_pos);
    }

    #[test]
    fn badge_only_for_non_website_pages() {
        let mut request = ImageRequest::titled("Hello");
        let entry = resolve(request.template, request.theme);
        assert!(!all_text(&build(&request, entry)).contains(&"ARTICLE".to_string()));
        request.page_type = crate::request::PageType::Article;
        assert!(all_text(&build(&request, entry)).contains(&"ARTICLE".to_string()));
    }

    #[test]
    fn publish_date_includes_author_when_present() {
        let mut request = ImageRequest::titled("Hello");
        request.author = Some("Jordan".to_string());
        request.published_time = Some(chrono::Utc.with_ymd_and_hms(2025, 3, 9, 0, 0, 0).unwrap());
        let entry = resolve(request.template, request.theme);
        let texts = all_text(&build(&request, entry));
        assert!(texts.iter().any(|t| t.contains("Jordan") && t.contains("2025")));
    }

    #[test]
    fn minimal_template_has_no_decorative_shapes() {
        let mut request = ImageRequest::titled("Hello");
        request.template = TemplateId::Minimal;
        let minimal = root_children(&build(&request, resolve(request.template, ThemeId::Dark))).len();
        request.template = TemplateId::Modern;
        let modern = root_children(&build(&request, resolve(request.template, ThemeId::Dark))).len();
        assert!(modern > minimal);
    }

    #[test]
    fn long_title_wraps_to_at_most_three_lines() {
        let request = ImageRequest::titled(
            "A very long marketing title that keeps going well past any sensible length limit for a social card",
        );
        let entry = resolve(request.template, request.theme);
        let texts = all_text(&build(&request, entry));
        let title_lines = texts
            .iter()
            .filter(|t| request.title.contains(t.as_str()))
            .count();
        assert!(title_lines >= 2 && title_lines <= 3);
    }

    #[test]
    fn root_covers_requested_dimensions() {
        let mut request = ImageRequest::titled("Hello");
        request.width = 1200;
        request.height = 1200;
        let entry = resolve(request.template, request.theme);
        let tree = build(&request, entry);
        assert_eq!(tree.style().width, 1200.0);
        assert_eq!(tree.style().height, 1200.0);
    }
}
