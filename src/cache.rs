//! Cache Manager - Single Entry Point
//!
//! Wraps the layout/render pipeline behind a content-addressable on-disk
//! cache. Owns TTL expiry, size-bounded eviction, and hit/miss/error
//! statistics. No other component writes to the cache directory.
//!
//! CRITICAL: cache degradation never fails a request. Disk trouble means
//! rendering without the cache, not an error to the caller.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hashing::compute_key;
use crate::layout;
use crate::registry;
use crate::render::Renderer;
use crate::request::ImageRequest;
use crate::META_VERSION;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Title must not be empty")]
    EmptyTitle,

    #[error("Unsupported dimensions: {0}x{1}")]
    UnsupportedDimensions(u32, u32),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Injectable time source so TTL behavior is testable with a mock clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// How persisted entries are written back to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Fire-and-forget on a detached thread; never blocks the caller.
    #[default]
    Background,
    /// Write before returning. For one-shot processes (the CLI) and tests.
    Blocking,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub cache_dir: PathBuf,
    /// Entry time-to-live. Default 7 days.
    pub ttl: Duration,
    /// Aggregate on-disk budget. Default 100 MB.
    pub max_cache_size: u64,
    /// Largest individual PNG worth persisting. Default 2 MB.
    pub max_file_size: u64,
    /// Run a cleanup sweep every this many generations.
    pub cleanup_interval: u64,
    /// Persist fallback-path output too. Off by default: a degraded image
    /// must not be served as if it were a successful render.
    pub cache_failed_renders: bool,
    /// Reject empty titles instead of rendering a title-less card.
    pub strict_titles: bool,
    pub write_mode: WriteMode,
}

impl CacheConfig {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ttl: Duration::days(7),
            max_cache_size: 100 * 1024 * 1024,
            max_file_size: 2 * 1024 * 1024,
            cleanup_interval: 100,
            cache_failed_renders: false,
            strict_titles: true,
            write_mode: WriteMode::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new("og-cache")
    }
}

/// Metadata record persisted beside each cached PNG.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntryMeta {
    pub cache_key: String,
    pub params: ImageRequest,
    pub created: DateTime<Utc>,
    pub generation_time_ms: u64,
    pub file_size_bytes: u64,
    pub version: u32,
}

/// Point-in-time statistics snapshot.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub generations: u64,
    pub avg_generation_ms: f64,
}

#[derive(Debug, Default)]
struct StatsInner {
    hits: u64,
    misses: u64,
    errors: u64,
    generations: u64,
    total_generation_ms: u64,
}

/// Outcome of one cleanup sweep.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub removed_expired: u64,
    pub removed_evicted: u64,
    pub remaining_bytes: u64,
}

/// The cache manager - single entry point for image generation.
pub struct CacheManager {
    config: CacheConfig,
    renderer: Renderer,
    clock: Arc<dyn Clock>,
    stats: Mutex<StatsInner>,
    /// Per-key slots so concurrent identical misses render once. The
    /// winning thread parks its bytes in the slot; waiters take them from
    /// there instead of re-reading disk, which a background write may not
    /// have reached yet.
    in_flight: Mutex<HashMap<String, Arc<Mutex<Option<Vec<u8>>>>>>,
}

impl CacheManager {
    pub fn new(renderer: Renderer, config: CacheConfig) -> Self {
        Self::with_clock(renderer, config, Arc::new(SystemClock))
    }

    pub fn with_clock(renderer: Renderer, config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        if let Err(e) = fs::create_dir_all(&config.cache_dir) {
            warn!(
                "cache directory {} unavailable, running uncached: {e}",
                config.cache_dir.display()
            );
        }
        Self {
            config,
            renderer,
            clock,
            stats: Mutex::new(StatsInner::default()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Generate the image for `request`, serving from cache when possible.
    ///
    /// This is the ONLY generation entry point; every caller goes through
    /// the same validation, caching, and fallback policy.
    pub fn generate(&self, request: &ImageRequest) -> Result<Vec<u8>, GenerateError> {
        if self.config.strict_titles && request.title.trim().is_empty() {
            return Err(GenerateError::EmptyTitle);
        }
        if !request.dimensions_allowed() {
            return Err(GenerateError::UnsupportedDimensions(request.width, request.height));
        }

        let key = compute_key(request)?;

        if let Some(bytes) = self.read_cached(&key) {
            self.record_hit();
            return Ok(bytes);
        }

        // Coalesce concurrent misses for the same key: one render, the
        // rest wait on the slot and take the winner's bytes out of it.
        let slot = {
            let mut map = self.in_flight.lock().unwrap();
            Arc::clone(map.entry(key.clone()).or_default())
        };
        let mut pending = slot.lock().unwrap();

        if let Some(bytes) = pending.as_ref() {
            let bytes = bytes.clone();
            drop(pending);
            self.record_hit();
            return Ok(bytes);
        }

        if let Some(bytes) = self.read_cached(&key) {
            *pending = Some(bytes.clone());
            drop(pending);
            self.release_in_flight(&key);
            self.record_hit();
            return Ok(bytes);
        }

        let started = Instant::now();
        let entry = registry::resolve(request.template, request.theme);
        let tree = layout::build(request, entry);
        let output = self.renderer.render(&tree, request.width, request.height);
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let generation_count = self.record_miss(elapsed_ms, output.fallback);
        debug!("generated {key} in {elapsed_ms}ms (fallback={})", output.fallback);

        // Publish before persisting so waiters never depend on the write
        // having landed.
        *pending = Some(output.bytes.clone());
        drop(pending);

        let cacheable = (!output.fallback || self.config.cache_failed_renders)
            && output.bytes.len() as u64 <= self.config.max_file_size;
        if cacheable {
            self.persist(&key, request, &output.bytes, elapsed_ms);
        }

        if generation_count % self.config.cleanup_interval.max(1) == 0 {
            let report = self.cleanup();
            info!(
                "cleanup sweep: {} expired, {} evicted, {} bytes remain",
                report.removed_expired, report.removed_evicted, report.remaining_bytes
            );
        }

        self.release_in_flight(&key);
        Ok(output.bytes)
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.stats.lock().unwrap();
        let avg = if inner.generations == 0 {
            0.0
        } else {
            inner.total_generation_ms as f64 / inner.generations as f64
        };
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            errors: inner.errors,
            generations: inner.generations,
            avg_generation_ms: avg,
        }
    }

    /// Delete expired entries, then evict oldest-first until the aggregate
    /// size fits the budget. Unreadable or corrupt metadata counts as
    /// expired.
    pub fn cleanup(&self) -> CleanupReport {
        let mut report = CleanupReport::default();
        let now = self.clock.now();

        let entries = match fs::read_dir(&self.config.cache_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("cleanup skipped, cache directory unreadable: {e}");
                return report;
            }
        };

        // (created, png_path, meta_path, size) for survivors of TTL pass
        let mut live: Vec<(DateTime<Utc>, PathBuf, PathBuf, u64)> = Vec::new();
        let mut pngs: Vec<PathBuf> = Vec::new();

        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.ends_with(".png") {
                pngs.push(path.clone());
            }
            let Some(key) = name.strip_suffix(".meta.json").map(str::to_owned) else {
                continue;
            };
            let meta_path = path;
            let png_path = self.config.cache_dir.join(format!("{key}.png"));

            let meta: Option<CacheEntryMeta> = fs::read_to_string(&meta_path)
                .ok()
                .and_then(|s| serde_json::from_str(&s).ok())
                .filter(|m: &CacheEntryMeta| m.version == META_VERSION && png_path.exists());

            match meta {
                Some(meta) if now - meta.created <= self.config.ttl => {
                    let size = fs::metadata(&png_path).map(|m| m.len()).unwrap_or(0);
                    live.push((meta.created, png_path, meta_path, size));
                }
                _ => {
                    remove_entry(&png_path, &meta_path);
                    report.removed_expired += 1;
                }
            }
        }

        // Orphaned images with no sidecar at all can never be served;
        // sweep them too. Expired entries handled above already removed
        // their image, so a missing file here is just skipped.
        for png_path in pngs {
            let Some(key) = png_path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(".png"))
            else {
                continue;
            };
            if !self.config.cache_dir.join(format!("{key}.meta.json")).exists()
                && fs::remove_file(&png_path).is_ok()
            {
                report.removed_expired += 1;
            }
        }

        // Oldest-first eviction down to the size budget.
        live.sort_by_key(|(created, ..)| *created);
        let mut total: u64 = live.iter().map(|(.., size)| *size).sum();
        for (_, png_path, meta_path, size) in &live {
            if total <= self.config.max_cache_size {
                break;
            }
            remove_entry(png_path, meta_path);
            total -= size;
            report.removed_evicted += 1;
        }

        report.remaining_bytes = total;
        report
    }

    fn png_path(&self, key: &str) -> PathBuf {
        self.config.cache_dir.join(format!("{key}.png"))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.config.cache_dir.join(format!("{key}.meta.json"))
    }

    /// Read a valid, non-expired entry. Any disk or format trouble is a
    /// miss, never an error.
    fn read_cached(&self, key: &str) -> Option<Vec<u8>> {
        let meta_raw = fs::read_to_string(self.meta_path(key)).ok()?;
        let meta: CacheEntryMeta = match serde_json::from_str(&meta_raw) {
            Ok(meta) => meta,
            Err(e) => {
                warn!("corrupt metadata for {key}: {e}");
                self.record_error();
                return None;
            }
        };
        if meta.version != META_VERSION {
            return None;
        }
        if self.clock.now() - meta.created > self.config.ttl {
            debug!("entry {key} expired");
            return None;
        }
        match fs::read(self.png_path(key)) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("cache read failed for {key}: {e}");
                self.record_error();
                None
            }
        }
    }

    /// Best-effort persist. Failure is logged and never reaches the caller.
    fn persist(&self, key: &str, request: &ImageRequest, bytes: &[u8], elapsed_ms: u64) {
        let meta = CacheEntryMeta {
            cache_key: key.to_string(),
            params: request.clone(),
            created: self.clock.now(),
            generation_time_ms: elapsed_ms,
            file_size_bytes: bytes.len() as u64,
            version: META_VERSION,
        };
        let png_path = self.png_path(key);
        let meta_path = self.meta_path(key);
        let bytes = bytes.to_vec();

        match self.config.write_mode {
            WriteMode::Blocking => write_entry(&png_path, &meta_path, &bytes, &meta),
            WriteMode::Background => {
                std::thread::spawn(move || write_entry(&png_path, &meta_path, &bytes, &meta));
            }
        }
    }

    fn release_in_flight(&self, key: &str) {
        self.in_flight.lock().unwrap().remove(key);
    }

    fn record_hit(&self) {
        self.stats.lock().unwrap().hits += 1;
    }

    fn record_error(&self) {
        self.stats.lock().unwrap().errors += 1;
    }

    fn record_miss(&self, elapsed_ms: u64, fallback: bool) -> u64 {
        let mut inner = self.stats.lock().unwrap();
        inner.misses += 1;
        inner.generations += 1;
        inner.total_generation_ms += elapsed_ms;
        if fallback {
            inner.errors += 1;
        }
        inner.generations
    }
}

fn write_entry(png_path: &Path, meta_path: &Path, bytes: &[u8], meta: &CacheEntryMeta) {
    let json = match serde_json::to_string_pretty(meta) {
        Ok(json) => json,
        Err(e) => {
            warn!("metadata serialization failed for {}: {e}", meta.cache_key);
            return;
        }
    };
    if let Err(e) = fs::write(png_path, bytes) {
        warn!("cache write failed for {}: {e}", meta.cache_key);
        return;
    }
    if let Err(e) = fs::write(meta_path, json) {
        warn!("metadata write failed for {}: {e}", meta.cache_key);
        // image without metadata is unreadable; drop it
        let _ = fs::remove_file(png_path);
    }
}

fn remove_entry(png_path: &Path, meta_path: &Path) {
    let _ = fs::remove_file(png_path);
    let _ = fs::remove_file(meta_path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{FontCatalog, PNG_SIGNATURE};
    use tempfile::TempDir;

    struct MockClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl MockClock {
        fn at(now: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self { now: Mutex::new(now) })
        }

        fn advance(&self, by: Duration) {
            *self.now.lock().unwrap() += by;
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    fn blocking_config(dir: &TempDir) -> CacheConfig {
        let mut config = CacheConfig::new(dir.path());
        config.write_mode = WriteMode::Blocking;
        config
    }

    fn manager(dir: &TempDir) -> CacheManager {
        CacheManager::new(Renderer::new(FontCatalog::load_system()), blocking_config(dir))
    }

    #[test]
    fn miss_then_hit_returns_identical_bytes() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        let request = ImageRequest::titled("Hello World");

        let first = manager.generate(&request).unwrap();
        let second = manager.generate(&request).unwrap();

        assert_eq!(first, second);
        assert_eq!(&first[..8], &PNG_SIGNATURE);
        let stats = manager.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn empty_title_is_rejected_in_strict_mode() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        let request = ImageRequest::titled("   ");
        let err = manager.generate(&request).unwrap_err();
        assert!(matches!(err, GenerateError::EmptyTitle));
    }

    #[test]
    fn empty_title_renders_when_strict_mode_is_off() {
        let dir = TempDir::new().unwrap();
        let mut config = blocking_config(&dir);
        config.strict_titles = false;
        let manager = CacheManager::new(Renderer::new(FontCatalog::load_system()), config);
        let bytes = manager.generate(&ImageRequest::titled("")).unwrap();
        assert_eq!(&bytes[..8], &PNG_SIGNATURE);
    }

    #[test]
    fn off_allowlist_dimensions_are_rejected() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        let mut request = ImageRequest::titled("Hello");
        request.width = 640;
        request.height = 480;
        let err = manager.generate(&request).unwrap_err();
        assert!(matches!(err, GenerateError::UnsupportedDimensions(640, 480)));
    }

    #[test]
    fn ttl_boundary_entry_valid_just_before_and_expired_just_after() {
        let dir = TempDir::new().unwrap();
        let clock = MockClock::at(Utc::now());
        let manager = CacheManager::with_clock(
            Renderer::new(FontCatalog::load_system()),
            blocking_config(&dir),
            clock.clone(),
        );
        let request = ImageRequest::titled("TTL probe");

        manager.generate(&request).unwrap();

        clock.advance(Duration::days(6) + Duration::hours(23) + Duration::minutes(59));
        manager.generate(&request).unwrap();
        assert_eq!(manager.stats().hits, 1, "entry must still be valid at 6d23h59m");

        clock.advance(Duration::minutes(2));
        manager.generate(&request).unwrap();
        let stats = manager.stats();
        assert_eq!(stats.hits, 1, "entry must be expired past the TTL");
        assert_eq!(stats.misses, 2);
    }

    #[test]
    fn cleanup_deletes_expired_entries() {
        let dir = TempDir::new().unwrap();
        let clock = MockClock::at(Utc::now());
        let manager = CacheManager::with_clock(
            Renderer::new(FontCatalog::load_system()),
            blocking_config(&dir),
            clock.clone(),
        );
        manager.generate(&ImageRequest::titled("old entry")).unwrap();

        clock.advance(Duration::days(8));
        let report = manager.cleanup();
        assert_eq!(report.removed_expired, 1);
        assert_eq!(report.remaining_bytes, 0);
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    fn seed_entry(dir: &Path, key: &str, created: DateTime<Utc>, size: usize) {
        let meta = CacheEntryMeta {
            cache_key: key.to_string(),
            params: ImageRequest::titled(key),
            created,
            generation_time_ms: 5,
            file_size_bytes: size as u64,
            version: META_VERSION,
        };
        fs::write(dir.join(format!("{key}.png")), vec![0u8; size]).unwrap();
        fs::write(
            dir.join(format!("{key}.meta.json")),
            serde_json::to_string(&meta).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn eviction_removes_oldest_entries_first_until_under_budget() {
        let dir = TempDir::new().unwrap();
        let now = Utc::now();
        let clock = MockClock::at(now);
        let mut config = blocking_config(&dir);
        config.max_cache_size = 2500;
        let manager = CacheManager::with_clock(
            Renderer::new(FontCatalog::load_system()),
            config,
            clock,
        );

        seed_entry(dir.path(), "aaa", now - Duration::hours(3), 1000);
        seed_entry(dir.path(), "bbb", now - Duration::hours(2), 1000);
        seed_entry(dir.path(), "ccc", now - Duration::hours(1), 1000);

        let report = manager.cleanup();
        assert_eq!(report.removed_expired, 0);
        assert_eq!(report.removed_evicted, 1);
        assert!(report.remaining_bytes <= 2500);
        assert!(!dir.path().join("aaa.png").exists(), "oldest entry goes first");
        assert!(dir.path().join("ccc.png").exists());
    }

    #[test]
    fn corrupt_metadata_is_treated_as_expired() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        fs::write(dir.path().join("bad.png"), b"not a png").unwrap();
        fs::write(dir.path().join("bad.meta.json"), b"{ garbage").unwrap();

        let report = manager.cleanup();
        assert_eq!(report.removed_expired, 1);
        assert!(!dir.path().join("bad.png").exists());
    }

    #[test]
    fn cleanup_removes_orphan_pngs_without_sidecar() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        seed_entry(dir.path(), "kept", Utc::now(), 100);
        fs::write(dir.path().join("orphan.png"), b"no sidecar").unwrap();

        let report = manager.cleanup();
        assert_eq!(report.removed_expired, 1);
        assert!(!dir.path().join("orphan.png").exists());
        assert!(dir.path().join("kept.png").exists());
    }

    #[test]
    fn orphan_png_without_metadata_is_ignored_by_reads() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        let request = ImageRequest::titled("Orphan");
        let key = compute_key(&request).unwrap();
        fs::write(dir.path().join(format!("{key}.png")), b"stale").unwrap();

        // no metadata -> miss -> full render, not the stale bytes
        let bytes = manager.generate(&request).unwrap();
        assert_eq!(&bytes[..8], &PNG_SIGNATURE);
        assert_eq!(manager.stats().misses, 1);
    }

    #[test]
    fn unwritable_cache_dir_degrades_to_uncached_generation() {
        let dir = TempDir::new().unwrap();
        let bogus = dir.path().join("file-not-dir");
        fs::write(&bogus, b"occupied").unwrap();
        let mut config = CacheConfig::new(&bogus);
        config.write_mode = WriteMode::Blocking;
        let manager = CacheManager::new(Renderer::new(FontCatalog::load_system()), config);

        let request = ImageRequest::titled("Still works");
        let first = manager.generate(&request).unwrap();
        let second = manager.generate(&request).unwrap();
        assert_eq!(&first[..8], &PNG_SIGNATURE);
        // nothing was cached, so both calls are misses
        assert_eq!(manager.stats().misses, 2);
        assert_eq!(first, second);
    }

    #[test]
    fn tag_order_does_not_cause_a_second_render() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        let mut a = ImageRequest::titled("Tagged");
        a.tags = vec!["rust".into(), "web".into()];
        let mut b = a.clone();
        b.tags = vec!["web".into(), "rust".into()];

        manager.generate(&a).unwrap();
        manager.generate(&b).unwrap();
        let stats = manager.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn oversized_output_is_served_but_not_persisted() {
        let dir = TempDir::new().unwrap();
        let mut config = blocking_config(&dir);
        config.max_file_size = 64; // far below any real card
        let manager = CacheManager::new(Renderer::new(FontCatalog::load_system()), config);

        let request = ImageRequest::titled("Huge output");
        let bytes = manager.generate(&request).unwrap();
        assert_eq!(&bytes[..8], &PNG_SIGNATURE);
        let key = compute_key(&request).unwrap();
        assert!(!dir.path().join(format!("{key}.png")).exists());
    }

    #[test]
    fn concurrent_identical_misses_render_once() {
        let dir = TempDir::new().unwrap();
        let manager = Arc::new(manager(&dir));
        let request = ImageRequest::titled("Thundering herd");

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let manager = Arc::clone(&manager);
                let request = request.clone();
                std::thread::spawn(move || manager.generate(&request).unwrap())
            })
            .collect();
        let outputs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(outputs.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(manager.stats().misses, 1, "only one thread renders");
        assert_eq!(manager.stats().hits, 3);
    }

    #[test]
    fn deferred_writes_do_not_break_miss_coalescing() {
        let dir = TempDir::new().unwrap();
        // default config keeps WriteMode::Background
        let manager = Arc::new(CacheManager::new(
            Renderer::new(FontCatalog::load_system()),
            CacheConfig::new(dir.path()),
        ));
        let request = ImageRequest::titled("Deferred write herd");

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let manager = Arc::clone(&manager);
                let request = request.clone();
                std::thread::spawn(move || manager.generate(&request).unwrap())
            })
            .collect();
        let outputs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(outputs.windows(2).all(|w| w[0] == w[1]));
        let stats = manager.stats();
        assert_eq!(stats.misses, 1, "waiters take the winner's bytes, not the disk");
        assert_eq!(stats.hits, 3);
    }
}
