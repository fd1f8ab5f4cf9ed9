//! Validation Harness - Matrix, Benchmark, Health
//!
//! Drives the cache manager's entry point across every template x theme
//! combination plus a fixed edge-case list, and provides latency and
//! liveness probes. Results are structured records, suitable for JSON
//! output from the CLI.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::cache::CacheManager;
use crate::registry::all_combinations;
use crate::render::PNG_SIGNATURE;
use crate::request::{ImageRequest, MAX_TAGS, MAX_TITLE_LEN};

/// Cold generation must finish within this bound.
pub const COLD_THRESHOLD: Duration = Duration::from_secs(10);
/// Cache hits must be far cheaper than renders.
pub const HIT_THRESHOLD: Duration = Duration::from_secs(1);
/// Liveness probe budget.
pub const HEALTH_THRESHOLD: Duration = Duration::from_secs(5);

/// One harness case: a request and whether generation should succeed.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub request: ImageRequest,
    pub expect_pass: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub duration_ms: u64,
    pub byte_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// PNG sanity checks shared by every passing case: signature bytes, exact
/// requested dimensions, non-trivial size.
fn check_image(bytes: &[u8], request: &ImageRequest) -> Result<(), String> {
    if bytes.len() < PNG_SIGNATURE.len() || bytes[..8] != PNG_SIGNATURE {
        return Err("missing PNG signature".to_string());
    }
    let pixmap = tiny_skia::Pixmap::decode_png(bytes)
        .map_err(|e| format!("PNG did not decode: {e}"))?;
    if (pixmap.width(), pixmap.height()) != (request.width, request.height) {
        return Err(format!(
            "expected {}x{}, got {}x{}",
            request.width,
            request.height,
            pixmap.width(),
            pixmap.height()
        ));
    }
    Ok(())
}

/// Build the full matrix: every (template, theme) pair plus edge cases.
pub fn matrix_cases() -> Vec<TestCase> {
    let mut cases = Vec::new();

    for (template, theme) in all_combinations() {
        let mut request = ImageRequest::titled(format!("{template} on {theme}"));
        request.description = Some("Matrix coverage card".to_string());
        request.template = template;
        request.theme = theme;
        request.tags = vec!["matrix".to_string()];
        cases.push(TestCase {
            name: format!("matrix/{template}-{theme}"),
            request,
            expect_pass: true,
        });
    }

    cases.push(TestCase {
        name: "edge/empty-title".to_string(),
        request: ImageRequest::titled(""),
        expect_pass: false,
    });

    cases.push(TestCase {
        name: "edge/max-length-title".to_string(),
        request: ImageRequest::titled("T".repeat(MAX_TITLE_LEN)),
        expect_pass: true,
    });

    cases.push(TestCase {
        name: "edge/unicode-title".to_string(),
        request: ImageRequest::titled("«Ünïcødé» 日本語 🚀 — tested & \"quoted\""),
        expect_pass: true,
    });

    let mut tagged = ImageRequest::titled("Maximum tags");
    tagged.tags = (0..MAX_TAGS).map(|i| format!("tag-{i}")).collect();
    cases.push(TestCase {
        name: "edge/max-tags".to_string(),
        request: tagged,
        expect_pass: true,
    });

    cases
}

fn run_case(manager: &CacheManager, case: &TestCase) -> TestResult {
    let started = Instant::now();
    let outcome = manager.generate(&case.request);
    let duration = started.elapsed();
    let duration_ms = duration.as_millis() as u64;

    match outcome {
        Ok(bytes) => {
            let byte_size = bytes.len() as u64;
            let verdict = check_image(&bytes, &case.request).and_then(|()| {
                if duration > COLD_THRESHOLD {
                    Err(format!("generation took {duration_ms}ms"))
                } else {
                    Ok(())
                }
            });
            match verdict {
                Ok(()) if case.expect_pass => TestResult {
                    name: case.name.clone(),
                    passed: true,
                    duration_ms,
                    byte_size,
                    error: None,
                },
                Ok(()) => TestResult {
                    name: case.name.clone(),
                    passed: false,
                    duration_ms,
                    byte_size,
                    error: Some("expected rejection, but generation succeeded".to_string()),
                },
                Err(reason) => TestResult {
                    name: case.name.clone(),
                    passed: false,
                    duration_ms,
                    byte_size,
                    error: Some(reason),
                },
            }
        }
        Err(e) => TestResult {
            name: case.name.clone(),
            passed: !case.expect_pass,
            duration_ms,
            byte_size: 0,
            error: (case.expect_pass).then(|| e.to_string()),
        },
    }
}

/// Run every matrix and edge case through the manager.
pub fn run_matrix(manager: &CacheManager) -> Vec<TestResult> {
    matrix_cases()
        .iter()
        .map(|case| run_case(manager, case))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkReport {
    pub iterations: u32,
    pub min_ms: f64,
    pub avg_ms: f64,
    pub max_ms: f64,
    /// Fraction of iterations served from cache. Expected ~1.0 after the
    /// first call.
    pub hit_rate: f64,
}

/// Repeat one fixed request and report latency spread plus hit rate.
pub fn benchmark(manager: &CacheManager, iterations: u32) -> BenchmarkReport {
    let mut request = ImageRequest::titled("Benchmark card");
    request.description = Some("Fixed request repeated for latency sampling".to_string());

    let hits_before = manager.stats().hits;
    let mut min_ms = f64::MAX;
    let mut max_ms: f64 = 0.0;
    let mut total_ms = 0.0;
    let runs = iterations.max(1);

    for _ in 0..runs {
        let started = Instant::now();
        let _ = manager.generate(&request);
        let ms = started.elapsed().as_secs_f64() * 1000.0;
        min_ms = min_ms.min(ms);
        max_ms = max_ms.max(ms);
        total_ms += ms;
    }

    BenchmarkReport {
        iterations: runs,
        min_ms,
        avg_ms: total_ms / runs as f64,
        max_ms,
        hit_rate: (manager.stats().hits - hits_before) as f64 / runs as f64,
    }
}

/// Lightweight liveness probe: one minimal generation within budget.
pub fn health_check(manager: &CacheManager) -> TestResult {
    let case = TestCase {
        name: "health".to_string(),
        request: ImageRequest::titled("OK"),
        expect_pass: true,
    };
    let mut result = run_case(manager, &case);
    if result.passed && result.duration_ms > HEALTH_THRESHOLD.as_millis() as u64 {
        result.passed = false;
        result.error = Some(format!("health check took {}ms", result.duration_ms));
    }
    result
}
