use std::{fs, path::Path};

use clap::{Parser, ValueEnum};
use phishguard::{
    config::load_config,
    core::{
        engine::Engine,
        error::GuardError,
        output::{write_verdict, ReportFormat},
    },
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "phishguard",
    about = "URL phishing-risk checks with concurrent signal probes"
)]
struct Cli {
    /// URL to evaluate (scheme-less input is assumed https)
    url: String,
    /// Path to config file (TOML). Default: config/phishguard.toml
    #[arg(long)]
    config: Option<String>,
    /// Disable the verdict cache
    #[arg(long)]
    no_cache: bool,
    /// Output format for the verdict
    #[arg(long, default_value = "json", value_enum)]
    format: FormatArg,
    /// Optional report file path
    #[arg(long)]
    output: Option<String>,
    /// Increase verbosity (info, debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Optional log file path
    #[arg(long, default_value = "data/phishguard.log")]
    log_file: String,
    /// Enable persistent disk cache
    #[arg(long)]
    disk_cache: bool,
    /// Path for the disk cache file
    #[arg(long)]
    disk_cache_path: Option<String>,
}

#[derive(ValueEnum, Clone, Debug)]
enum FormatArg {
    Json,
    Md,
}

impl From<FormatArg> for ReportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Json => ReportFormat::Json,
            FormatArg::Md => ReportFormat::Markdown,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), GuardError> {
    let cli = Cli::parse();

    init_tracing(&cli)?;

    let mut cfg = load_config(cli.config.as_deref())?;
    if cli.disk_cache {
        cfg.disk_cache_enabled = true;
    }
    if let Some(path) = cli.disk_cache_path {
        cfg.disk_cache_enabled = true;
        cfg.disk_cache_path = path;
    }
    if cfg.abuseipdb_api_key.is_none() {
        cfg.abuseipdb_api_key = std::env::var("ABUSEIPDB_API_KEY").ok();
    }

    let engine = Engine::new(cfg)?;
    let verdict = engine.check_url(&cli.url, !cli.no_cache).await?;

    let format: ReportFormat = cli.format.into();
    if let Some(out) = &cli.output {
        write_verdict(&verdict, format, Path::new(out))?;
        tracing::info!("report written to {}", out);
    }

    let rendered = phishguard::core::output::render(&verdict, format)?;
    println!("{rendered}");
    Ok(())
}

fn init_tracing(cli: &Cli) -> Result<(), GuardError> {
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let log_path = Path::new(&cli.log_file);
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent).map_err(|e| GuardError::Config(e.to_string()))?;
    }
    if log_path.exists() {
        if let Ok(meta) = fs::metadata(log_path) {
            if meta.len() > 1_000_000 {
                let rotated = log_path.with_extension("log.1");
                let _ = fs::rename(log_path, rotated);
            }
        }
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| GuardError::Config(e.to_string()))?;

    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(false);

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| GuardError::Config(e.to_string()))
}
