use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use drift_signal::assoc::{AssociationRequest, DriftMetric, RiskMetric};
use drift_signal::config::{Config, ConfigOverrides};
use drift_signal::engine;
use drift_signal::output::csv::timeline_to_csv;
use drift_signal::output::json::render_json;
use drift_signal::output::table::{
    render_association_table, render_compare_table, render_status_table, render_timeline_table,
};
use drift_signal::series::Window;
use drift_signal::server::run_server;
use drift_signal::types::Bucket;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TimelineBucketArg {
    Hour,
    Day,
}

impl From<TimelineBucketArg> for Bucket {
    fn from(value: TimelineBucketArg) -> Self {
        match value {
            TimelineBucketArg::Hour => Bucket::Hour,
            TimelineBucketArg::Day => Bucket::Day,
        }
    }
}

/// Association is computed on daily series only.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum AssocBucketArg {
    Day,
}

#[derive(Debug, Parser)]
#[command(
    name = "drift-signal",
    about = "Signal-only drift trend and drift/risk association"
)]
struct Cli {
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[arg(long = "events-path", alias = "eventsPath", global = true)]
    events_path: Option<PathBuf>,
    #[arg(long = "audit-path", alias = "auditPath", global = true)]
    audit_path: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Args, Clone)]
struct RenderArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    #[arg(long)]
    pretty: bool,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Drift {
        #[command(subcommand)]
        command: DriftCommands,
    },
    Assoc {
        #[command(subcommand)]
        command: AssocCommands,
    },
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[derive(Debug, Subcommand)]
enum DriftCommands {
    Status {
        #[arg(long)]
        window: Option<String>,
        #[arg(long)]
        top: Option<usize>,
        #[command(flatten)]
        render: RenderArgs,
    },
    Timeline {
        #[arg(long)]
        window: Option<String>,
        #[arg(long, value_enum, default_value_t = TimelineBucketArg::Day)]
        bucket: TimelineBucketArg,
        #[command(flatten)]
        render: RenderArgs,
    },
    Compare {
        #[arg(long)]
        window: Option<String>,
        #[command(flatten)]
        render: RenderArgs,
    },
}

#[derive(Debug, Subcommand)]
enum AssocCommands {
    Correlate {
        #[arg(long)]
        window: Option<String>,
        #[arg(long, value_enum, default_value_t = AssocBucketArg::Day)]
        bucket: AssocBucketArg,
        #[arg(long, default_value = "density")]
        x: DriftMetric,
        #[arg(long, default_value = "risk_score_avg")]
        y: RiskMetric,
        #[arg(long)]
        lags: Option<u32>,
        #[arg(long)]
        subsamples: Option<u32>,
        #[arg(long)]
        seed: Option<u64>,
        #[command(flatten)]
        render: RenderArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        events_path: cli.events_path.clone(),
        audit_path: cli.audit_path.clone(),
    });

    match &cli.command {
        Commands::Config { init, show } => {
            handle_config_command(*init, *show, &config, &config_path)
        }
        Commands::Serve { host, port } => {
            let host = host.clone().unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let bind = format!("{host}:{port}");
            let addr: SocketAddr = bind
                .parse()
                .map_err(|e| anyhow!("invalid bind address {bind}: {e}"))?;
            run_server(config, addr).await
        }
        Commands::Drift { command } => handle_drift_command(command, &config),
        Commands::Assoc { command } => handle_assoc_command(command, &config),
    }
}

fn handle_config_command(
    init: bool,
    show: bool,
    config: &Config,
    config_path: &Path,
) -> Result<()> {
    if init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if show || !init {
        println!("{}", render_json(config, true)?);
    }
    Ok(())
}

fn handle_drift_command(command: &DriftCommands, config: &Config) -> Result<()> {
    let events_path = config.resolved_events_path();
    let now = Utc::now();
    match command {
        DriftCommands::Status {
            window,
            top,
            render,
        } => {
            let window = resolve_window(config, window.as_deref());
            let top_n = top.unwrap_or(config.drift.top_n);
            let bundle = engine::drift_status(&events_path, now, window, top_n);
            let rendered = match render.format {
                OutputFormat::Text => render_status_table(&bundle),
                OutputFormat::Json => render_json(&bundle, render.pretty)?,
                OutputFormat::Csv => {
                    warn!("CSV output for drift status not implemented, using JSON");
                    render_json(&bundle, render.pretty)?
                }
            };
            emit(&rendered, render.out.as_deref())
        }
        DriftCommands::Timeline {
            window,
            bucket,
            render,
        } => {
            let window = resolve_window(config, window.as_deref());
            let timeline = engine::drift_timeline(&events_path, now, window, (*bucket).into());
            let rendered = match render.format {
                OutputFormat::Text => render_timeline_table(&timeline),
                OutputFormat::Json => render_json(&timeline, render.pretty)?,
                OutputFormat::Csv => timeline_to_csv(&timeline)?,
            };
            emit(&rendered, render.out.as_deref())
        }
        DriftCommands::Compare { window, render } => {
            let window = resolve_window(config, window.as_deref());
            let compare = engine::drift_compare(&events_path, now, window);
            let rendered = match render.format {
                OutputFormat::Text => render_compare_table(&compare),
                OutputFormat::Json => render_json(&compare, render.pretty)?,
                OutputFormat::Csv => {
                    warn!("CSV output for drift compare not implemented, using JSON");
                    render_json(&compare, render.pretty)?
                }
            };
            emit(&rendered, render.out.as_deref())
        }
    }
}

fn handle_assoc_command(command: &AssocCommands, config: &Config) -> Result<()> {
    let AssocCommands::Correlate {
        window,
        bucket: AssocBucketArg::Day,
        x,
        y,
        lags,
        subsamples,
        seed,
        render,
    } = command;

    let request = AssociationRequest {
        window: resolve_window(config, window.as_deref()),
        metric_x: *x,
        metric_y: *y,
        max_lag: lags.or(config.association.max_lag),
        subsamples: subsamples.unwrap_or(config.association.subsamples),
    };
    let bundle = engine::association_seeded(
        &config.resolved_events_path(),
        &config.resolved_audit_path(),
        &request,
        Utc::now(),
        seed.or(config.association.seed),
    );
    let rendered = match render.format {
        OutputFormat::Text => render_association_table(&bundle),
        OutputFormat::Json => render_json(&bundle, render.pretty)?,
        OutputFormat::Csv => {
            warn!("CSV output for association not implemented, using JSON");
            render_json(&bundle, render.pretty)?
        }
    };
    emit(&rendered, render.out.as_deref())
}

fn resolve_window(config: &Config, raw: Option<&str>) -> Window {
    raw.map(Window::from_label)
        .unwrap_or_else(|| config.default_window())
}

fn emit(rendered: &str, out: Option<&Path>) -> Result<()> {
    let Some(path) = out else {
        println!("{rendered}");
        return Ok(());
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating output directory: {}", parent.display()))?;
    }
    fs::write(path, format!("{rendered}\n"))
        .with_context(|| format!("failed writing output: {}", path.display()))
}
