//! SocialCard Core - Social Preview Compiler
//!
//! # The Five Laws (Non-Negotiable)
//! 1. Keys Are Content
//! 2. Output Is Deterministic
//! 3. Storage Is Bounded
//! 4. Fallback Never Fails
//! 5. Degradation Never Surfaces

pub mod cache;
pub mod hashing;
pub mod layout;
pub mod registry;
pub mod render;
pub mod request;
pub mod validation;

pub use cache::{CacheConfig, CacheEntryMeta, CacheManager, CacheStats, GenerateError, WriteMode};
pub use hashing::{canonical_json, compute_key, sha256_hex};
pub use layout::{build, LayoutNode, NodeStyle};
pub use registry::{resolve, Palette, RegistryEntry, TemplateId, ThemeId};
pub use render::{FontCatalog, RenderOutput, Renderer, PNG_SIGNATURE};
pub use request::{normalize, ImageRequest, PageType, RequestOverrides, OG_HEIGHT, OG_WIDTH};
pub use validation::{benchmark, health_check, run_matrix, TestCase, TestResult};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Format version written into every `.meta.json`. Bump when the sidecar
/// layout changes; readers treat other versions as expired.
pub const META_VERSION: u32 = 1;
