//! Request Model & Parameter Normalizer
//!
//! Maps a page path plus optional overrides into a canonical
//! [`ImageRequest`]. Pure and deterministic; the only lookup is a static
//! page-defaults table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::registry::{TemplateId, ThemeId};

/// Primary OG surface dimensions.
pub const OG_WIDTH: u32 = 1200;
pub const OG_HEIGHT: u32 = 630;

/// The only raster sizes the pipeline will produce. Anything else is
/// rejected before layout.
pub const ALLOWED_DIMENSIONS: [(u32, u32); 2] = [(OG_WIDTH, OG_HEIGHT), (1200, 1200)];

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 200;
pub const MAX_TAGS: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    #[default]
    Website,
    Article,
    Project,
}

impl PageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Website => "website",
            PageType::Article => "article",
            PageType::Project => "project",
        }
    }

    /// Badge label shown on the card, or none for plain website pages.
    pub fn badge_label(&self) -> Option<&'static str> {
        match self {
            PageType::Website => None,
            PageType::Article => Some("ARTICLE"),
            PageType::Project => Some("PROJECT"),
        }
    }
}

/// Canonical input to the generation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub template: TemplateId,
    #[serde(default)]
    pub theme: ThemeId,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub page_type: PageType,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_width() -> u32 { OG_WIDTH }
fn default_height() -> u32 { OG_HEIGHT }

impl ImageRequest {
    /// Minimal request with everything else defaulted.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            template: TemplateId::default(),
            theme: ThemeId::default(),
            tags: Vec::new(),
            author: None,
            published_time: None,
            page_type: PageType::default(),
            width: OG_WIDTH,
            height: OG_HEIGHT,
        }
    }

    pub fn dimensions_allowed(&self) -> bool {
        ALLOWED_DIMENSIONS.contains(&(self.width, self.height))
    }

    /// Clamp oversized fields in place. The HTTP boundary is expected to
    /// enforce these limits first; this is the defensive second line.
    pub fn clamp(&mut self) {
        truncate_chars(&mut self.title, MAX_TITLE_LEN);
        if let Some(desc) = self.description.as_mut() {
            truncate_chars(desc, MAX_DESCRIPTION_LEN);
            if desc.is_empty() {
                self.description = None;
            }
        }
        self.tags = std::mem::take(&mut self.tags)
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .take(MAX_TAGS)
            .collect();
        if let Some(author) = self.author.as_mut() {
            truncate_chars(author, MAX_TITLE_LEN);
        }
    }
}

fn truncate_chars(s: &mut String, max: usize) {
    if let Some((idx, _)) = s.char_indices().nth(max) {
        s.truncate(idx);
    }
}

/// Partial override set merged over page defaults during normalization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOverrides {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub page_type: Option<PageType>,
}

/// One row of the static page-defaults table.
struct PageDefaults {
    path: &'static str,
    title: &'static str,
    description: &'static str,
    template: TemplateId,
    theme: ThemeId,
    tags: &'static [&'static str],
    page_type: PageType,
}

const SITE_DEFAULTS: PageDefaults = PageDefaults {
    path: "/",
    title: "Boswell Digital Solutions",
    description: "Software engineering, web platforms, and visual tooling",
    template: TemplateId::Modern,
    theme: ThemeId::Dark,
    tags: &[],
    page_type: PageType::Website,
};

/// Route path -> default card parameters. Longest-prefix match so
/// `/blog/some-post` picks up the `/blog` entry.
const PAGE_REGISTRY: &[PageDefaults] = &[
    SITE_DEFAULTS,
    PageDefaults {
        path: "/about",
        title: "About Us",
        description: "Who we are and how we work",
        template: TemplateId::Classic,
        theme: ThemeId::Dark,
        tags: &["company"],
        page_type: PageType::Website,
    },
    PageDefaults {
        path: "/blog",
        title: "Engineering Blog",
        description: "Notes from the workshop",
        template: TemplateId::Modern,
        theme: ThemeId::Dark,
        tags: &["blog"],
        page_type: PageType::Article,
    },
    PageDefaults {
        path: "/projects",
        title: "Projects",
        description: "Selected client and internal work",
        template: TemplateId::Modern,
        theme: ThemeId::Ocean,
        tags: &["portfolio"],
        page_type: PageType::Project,
    },
    PageDefaults {
        path: "/services",
        title: "Services",
        description: "What we can build for you",
        template: TemplateId::Classic,
        theme: ThemeId::Ocean,
        tags: &["services"],
        page_type: PageType::Website,
    },
    PageDefaults {
        path: "/contact",
        title: "Get In Touch",
        description: "Start a conversation about your next project",
        template: TemplateId::Minimal,
        theme: ThemeId::Sunset,
        tags: &[],
        page_type: PageType::Website,
    },
];

fn lookup_page(path: &str) -> &'static PageDefaults {
    let path = path.trim();
    PAGE_REGISTRY
        .iter()
        .filter(|p| {
            // prefix match only at a segment boundary, so /blogroll does
            // not pick up /blog
            path == p.path
                || (p.path != "/"
                    && path
                        .strip_prefix(p.path)
                        .map_or(false, |rest| rest.starts_with('/')))
        })
        .max_by_key(|p| p.path.len())
        .unwrap_or(&SITE_DEFAULTS)
}

/// Normalize a page path plus optional overrides into a canonical request.
///
/// An empty title override is passed through as-is; whether that is a
/// rejection is decided downstream by the generation entry point.
pub fn normalize(path: &str, overrides: Option<&RequestOverrides>) -> ImageRequest {
    let page = lookup_page(path);

    let mut request = ImageRequest {
        title: page.title.to_string(),
        description: Some(page.description.to_string()),
        template: page.template,
        theme: page.theme,
        tags: page.tags.iter().map(|t| t.to_string()).collect(),
        author: None,
        published_time: None,
        page_type: page.page_type,
        width: OG_WIDTH,
        height: OG_HEIGHT,
    };

    if let Some(ov) = overrides {
        if let Some(title) = &ov.title {
            request.title = title.clone();
        }
        if let Some(description) = &ov.description {
            request.description = Some(description.clone());
        }
        if let Some(template) = &ov.template {
            request.template = TemplateId::parse_or_default(template);
        }
        if let Some(theme) = &ov.theme {
            request.theme = ThemeId::parse_or_default(theme);
        }
        if let Some(tags) = &ov.tags {
            request.tags = tags.clone();
        }
        if let Some(author) = &ov.author {
            request.author = Some(author.clone());
        }
        if let Some(published) = ov.published_time {
            request.published_time = Some(published);
        }
        if let Some(page_type) = ov.page_type {
            request.page_type = page_type;
        }
    }

    request.clamp();
    request
}
