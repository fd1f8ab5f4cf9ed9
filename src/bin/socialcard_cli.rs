//! SocialCard CLI - Bridge interface for the site tooling
//!
//! Commands: templates, normalize, generate, matrix, bench, health
//! Outputs JSON to stdout (PNG bytes go to --out)
//! Returns non-zero on rejection or matrix failure

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use socialcard_core::{
    cache::{CacheConfig, CacheManager, WriteMode},
    registry,
    render::{FontCatalog, Renderer},
    request::{self, RequestOverrides},
    validation,
};

#[derive(Parser)]
#[command(name = "socialcard-cli")]
#[command(about = "SocialCard CLI - Social Preview Compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Cache directory for generated images
    #[arg(short, long, default_value = "og-cache")]
    cache_dir: PathBuf,

    /// Extra font directory loaded on top of system fonts
    #[arg(long)]
    font_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List template and theme ids with their palettes
    Templates,

    /// Show the normalized default request for a page path
    Normalize {
        /// Route path, e.g. /blog/why-rust
        #[arg(short, long)]
        path: String,

        /// Optional JSON overrides (RequestOverrides)
        #[arg(short, long)]
        overrides: Option<String>,
    },

    /// Generate one card image
    Generate {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long, default_value = "modern")]
        template: String,

        #[arg(long, default_value = "dark")]
        theme: String,

        /// Repeatable tag flag, up to 5 kept
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Output PNG path
        #[arg(short, long, default_value = "card.png")]
        out: PathBuf,
    },

    /// Run the template x theme validation matrix
    Matrix,

    /// Benchmark one fixed request
    Bench {
        #[arg(short, long, default_value_t = 20)]
        iterations: u32,
    },

    /// One minimal generation as a liveness probe
    Health,
}

fn build_manager(cli: &Cli) -> Result<CacheManager, String> {
    let fonts = match &cli.font_dir {
        Some(dir) => FontCatalog::load_system_and_dir(dir)
            .map_err(|e| format!("Failed to load fonts: {e}"))?,
        None => FontCatalog::load_system(),
    };
    if fonts.is_empty() {
        log::warn!("no fonts available; cards will render without text");
    }
    let mut config = CacheConfig::new(&cli.cache_dir);
    // one-shot process: finish writes before exiting
    config.write_mode = WriteMode::Blocking;
    Ok(CacheManager::new(Renderer::new(fonts), config))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init();

    match &cli.command {
        Commands::Templates => {
            let entries: Vec<_> = registry::all_combinations()
                .into_iter()
                .map(|(template, theme)| {
                    let entry = registry::resolve(template, theme);
                    serde_json::json!({
                        "template": template,
                        "theme": theme,
                        "palette": entry.palette,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries).unwrap());
            ExitCode::SUCCESS
        }

        Commands::Normalize { path, overrides } => {
            let overrides: Option<RequestOverrides> = match overrides {
                Some(raw) => match serde_json::from_str(raw) {
                    Ok(ov) => Some(ov),
                    Err(e) => {
                        eprintln!(r#"{{"error": "Invalid overrides: {e}"}}"#);
                        return ExitCode::FAILURE;
                    }
                },
                None => None,
            };
            let normalized = request::normalize(path, overrides.as_ref());
            println!("{}", serde_json::to_string_pretty(&normalized).unwrap());
            ExitCode::SUCCESS
        }

        Commands::Generate { title, description, template, theme, tags, out } => {
            let manager = match build_manager(&cli) {
                Ok(m) => m,
                Err(e) => {
                    eprintln!(r#"{{"error": "{e}"}}"#);
                    return ExitCode::FAILURE;
                }
            };

            let overrides = RequestOverrides {
                title: Some(title.clone()),
                description: description.clone(),
                template: Some(template.clone()),
                theme: Some(theme.clone()),
                tags: (!tags.is_empty()).then(|| tags.clone()),
                ..Default::default()
            };
            let request = request::normalize("/", Some(&overrides));

            match manager.generate(&request) {
                Ok(bytes) => {
                    if let Err(e) = std::fs::write(out, &bytes) {
                        eprintln!(r#"{{"error": "Failed to write {}: {e}"}}"#, out.display());
                        return ExitCode::FAILURE;
                    }
                    let output = serde_json::json!({
                        "success": true,
                        "out": out,
                        "bytes": bytes.len(),
                        "cacheKey": socialcard_core::compute_key(&request).ok(),
                        "stats": manager.stats(),
                    });
                    println!("{}", serde_json::to_string_pretty(&output).unwrap());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    let output = serde_json::json!({
                        "success": false,
                        "error": e.to_string(),
                    });
                    println!("{}", serde_json::to_string(&output).unwrap());
                    ExitCode::from(2) // rejected request
                }
            }
        }

        Commands::Matrix => {
            let manager = match build_manager(&cli) {
                Ok(m) => m,
                Err(e) => {
                    eprintln!(r#"{{"error": "{e}"}}"#);
                    return ExitCode::FAILURE;
                }
            };
            let results = validation::run_matrix(&manager);
            let failed = results.iter().filter(|r| !r.passed).count();
            let output = serde_json::json!({
                "passed": results.len() - failed,
                "failed": failed,
                "results": results,
                "stats": manager.stats(),
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
            if failed == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }

        Commands::Bench { iterations } => {
            let manager = match build_manager(&cli) {
                Ok(m) => m,
                Err(e) => {
                    eprintln!(r#"{{"error": "{e}"}}"#);
                    return ExitCode::FAILURE;
                }
            };
            let report = validation::benchmark(&manager, *iterations);
            let output = serde_json::json!({
                "benchmark": report,
                "stats": manager.stats(),
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
            ExitCode::SUCCESS
        }

        Commands::Health => {
            let manager = match build_manager(&cli) {
                Ok(m) => m,
                Err(e) => {
                    eprintln!(r#"{{"error": "{e}"}}"#);
                    return ExitCode::FAILURE;
                }
            };
            let result = validation::health_check(&manager);
            println!("{}", serde_json::to_string_pretty(&result).unwrap());
            if result.passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
