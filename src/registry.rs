//! Template & Theme Registry - Closed Contracts
//!
//! Templates and themes are closed enums resolved through an exhaustive
//! lookup. Unknown string ids are mapped to the default entry at the
//! parsing boundary, never rejected at render time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Visual layout family for a social card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateId {
    #[default]
    Modern,
    Classic,
    Minimal,
}

impl TemplateId {
    pub const ALL: [TemplateId; 3] = [TemplateId::Modern, TemplateId::Classic, TemplateId::Minimal];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateId::Modern => "modern",
            TemplateId::Classic => "classic",
            TemplateId::Minimal => "minimal",
        }
    }

    /// Parse a template id, falling back to the default on unknown input.
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateId {
    type Err = UnknownId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "modern" => Ok(TemplateId::Modern),
            "classic" => Ok(TemplateId::Classic),
            "minimal" => Ok(TemplateId::Minimal),
            other => Err(UnknownId(other.to_string())),
        }
    }
}

/// Color palette family for a social card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeId {
    #[default]
    Dark,
    Light,
    Ocean,
    Sunset,
}

impl ThemeId {
    pub const ALL: [ThemeId; 4] = [ThemeId::Dark, ThemeId::Light, ThemeId::Ocean, ThemeId::Sunset];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeId::Dark => "dark",
            ThemeId::Light => "light",
            ThemeId::Ocean => "ocean",
            ThemeId::Sunset => "sunset",
        }
    }

    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for ThemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeId {
    type Err = UnknownId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(ThemeId::Dark),
            "light" => Ok(ThemeId::Light),
            "ocean" => Ok(ThemeId::Ocean),
            "sunset" => Ok(ThemeId::Sunset),
            other => Err(UnknownId(other.to_string())),
        }
    }
}

/// Error carried by [`FromStr`]; callers that must not fail use
/// `parse_or_default` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownId(pub String);

impl fmt::Display for UnknownId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown id: {}", self.0)
    }
}

impl std::error::Error for UnknownId {}

/// Immutable color palette for one theme. All values are CSS hex colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    /// Background gradient, top-left to bottom-right.
    pub background: [&'static str; 2],
    pub text_primary: &'static str,
    pub text_secondary: &'static str,
    pub accent: &'static str,
    pub card_background: &'static str,
}

const DARK: Palette = Palette {
    background: ["#0f172a", "#1e293b"],
    text_primary: "#f8fafc",
    text_secondary: "#94a3b8",
    accent: "#818cf8",
    card_background: "#1e293bcc",
};

const LIGHT: Palette = Palette {
    background: ["#f8fafc", "#e2e8f0"],
    text_primary: "#0f172a",
    text_secondary: "#475569",
    accent: "#4f46e5",
    card_background: "#ffffffcc",
};

const OCEAN: Palette = Palette {
    background: ["#0c4a6e", "#164e63"],
    text_primary: "#f0f9ff",
    text_secondary: "#7dd3fc",
    accent: "#22d3ee",
    card_background: "#0e7490cc",
};

const SUNSET: Palette = Palette {
    background: ["#431407", "#7c2d12"],
    text_primary: "#fff7ed",
    text_secondary: "#fdba74",
    accent: "#fb923c",
    card_background: "#9a3412cc",
};

/// A resolved (template, theme) registry entry.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RegistryEntry {
    pub template: TemplateId,
    pub theme: ThemeId,
    pub palette: &'static Palette,
}

/// Resolve a (template, theme) pair. Total over both enums, so lookup
/// cannot fail; default fallback happens earlier, at string parsing.
pub fn resolve(template: TemplateId, theme: ThemeId) -> RegistryEntry {
    let palette = match theme {
        ThemeId::Dark => &DARK,
        ThemeId::Light => &LIGHT,
        ThemeId::Ocean => &OCEAN,
        ThemeId::Sunset => &SUNSET,
    };
    RegistryEntry { template, theme, palette }
}

/// The designated default entry, used when no ids were provided at all.
pub fn default_entry() -> RegistryEntry {
    resolve(TemplateId::default(), ThemeId::default())
}

/// Every (template, theme) combination, in declaration order. Drives the
/// validator matrix and the CLI `templates` listing.
pub fn all_combinations() -> Vec<(TemplateId, ThemeId)> {
    let mut combos = Vec::with_capacity(TemplateId::ALL.len() * ThemeId::ALL.len());
    for template in TemplateId::ALL {
        for theme in ThemeId::ALL {
            combos.push((template, theme));
        }
    }
    combos
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_template_falls_back_to_default() {
        assert_eq!(TemplateId::parse_or_default("holographic"), TemplateId::Modern);
        assert_eq!(ThemeId::parse_or_default(""), ThemeId::Dark);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Classic".parse::<TemplateId>().unwrap(), TemplateId::Classic);
        assert_eq!(" OCEAN ".parse::<ThemeId>().unwrap(), ThemeId::Ocean);
    }

    #[test]
    fn resolve_is_total() {
        for (template, theme) in all_combinations() {
            let entry = resolve(template, theme);
            assert_eq!(entry.template, template);
            assert_eq!(entry.theme, theme);
            assert!(entry.palette.background[0].starts_with('#'));
        }
    }

    #[test]
    fn matrix_has_all_pairs() {
        assert_eq!(all_combinations().len(), 12);
    }

    #[test]
    fn ids_roundtrip_through_display() {
        for t in TemplateId::ALL {
            assert_eq!(t.as_str().parse::<TemplateId>().unwrap(), t);
        }
        for t in ThemeId::ALL {
            assert_eq!(t.as_str().parse::<ThemeId>().unwrap(), t);
        }
    }
}
