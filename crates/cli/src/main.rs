mod config;
mod logging;
mod params;
mod render;
mod serve;

use std::path::{Path, PathBuf};
use std::process;

use chaosboard_core::Generator;
use chaosboard_service::{Dashboard, ServiceError};
use chaosboard_storage::InMemoryStorage;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use time::OffsetDateTime;

use crate::config::Config;
use crate::params::{IncidentQuery, RunQuery, ScenarioQuery};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Chaos experiment dashboard over a generated corpus.
#[derive(Parser)]
#[command(name = "chaosboard", version, about = "Chaos experiment dashboard")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Config file (default: ./chaosboard.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Corpus seed, overriding the config file
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

pub(crate) type Db = Dashboard<InMemoryStorage>;

#[derive(Subcommand)]
enum Commands {
    /// List experiment runs, newest first
    Runs {
        #[command(flatten)]
        query: RunQuery,
    },

    /// Show one run with its detailed timeline
    Run {
        /// Run id, e.g. run-0001
        id: String,
    },

    /// List scenarios
    Scenarios {
        #[command(flatten)]
        query: ScenarioQuery,
    },

    /// Show the version history of a scenario
    Versions {
        /// Scenario id
        id: String,
    },

    /// List incidents
    Incidents {
        #[command(flatten)]
        query: IncidentQuery,
    },

    /// Show one incident with signals and recommended actions
    Incident {
        /// Incident id, e.g. inc-0001
        id: String,
    },

    /// Write a run or incident as a JSON document
    Export {
        #[command(subcommand)]
        target: ExportTarget,
    },

    /// Summary numbers for the last 24 hours
    Kpis,

    /// Start the HTTP JSON API
    Serve {
        /// Port to listen on (default from config, 8080)
        #[arg(long)]
        port: Option<u16>,
        /// Path to TLS certificate PEM file (requires `tls` feature)
        #[arg(long)]
        tls_cert: Option<PathBuf>,
        /// Path to TLS private key PEM file (requires `tls` feature)
        #[arg(long)]
        tls_key: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ExportTarget {
    /// Export a run with metrics and timeline
    Run {
        id: String,
        /// Destination file (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Export an incident with its signals
    Incident {
        id: String,
        /// Destination file (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    let (output, quiet) = (cli.output, cli.quiet);

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => fail(&e.to_string(), output, quiet),
    };
    if let Some(seed) = cli.seed {
        config.corpus.seed = seed;
    }

    // One-shot commands only log warnings unless RUST_LOG says otherwise.
    let serving = matches!(cli.command, Commands::Serve { .. });
    let level = if serving { config.log.level.as_str() } else { "warn" };
    logging::init_logging(level, config.log.format);

    let dashboard = build_dashboard(&config);
    let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");

    match cli.command {
        Commands::Runs { query } => rt.block_on(cmd_runs(&dashboard, &query, output, quiet)),
        Commands::Run { id } => rt.block_on(cmd_run(&dashboard, &id, output, quiet)),
        Commands::Scenarios { query } => {
            rt.block_on(cmd_scenarios(&dashboard, &query, output, quiet))
        }
        Commands::Versions { id } => rt.block_on(cmd_versions(&dashboard, &id, output, quiet)),
        Commands::Incidents { query } => {
            rt.block_on(cmd_incidents(&dashboard, &query, output, quiet))
        }
        Commands::Incident { id } => rt.block_on(cmd_incident(&dashboard, &id, output, quiet)),
        Commands::Export { target } => rt.block_on(cmd_export(&dashboard, target, output, quiet)),
        Commands::Kpis => rt.block_on(cmd_kpis(&dashboard, output, quiet)),
        Commands::Serve {
            port,
            tls_cert,
            tls_key,
        } => {
            // Validate TLS flags: both must be provided or neither
            if tls_cert.is_some() != tls_key.is_some() {
                fail("--tls-cert and --tls-key must both be provided", output, quiet);
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let tls = tls_cert.zip(tls_key);
            let server = serve::start_server(dashboard, config.server, tls);
            if let Err(e) = rt.block_on(server) {
                fail(&format!("server error: {e}"), output, quiet);
            }
        }
    }
}

fn build_dashboard(config: &Config) -> Db {
    let now = config.corpus.anchor.unwrap_or_else(OffsetDateTime::now_utc);
    let generator = Generator::new(config.corpus.seed, now);
    Dashboard::in_memory(generator, &config.corpus.size()).with_page_size(config.query.page_size)
}

// ──────────────────────────────────────────────
// Listings
// ──────────────────────────────────────────────

async fn cmd_runs(dashboard: &Db, query: &RunQuery, output: OutputFormat, quiet: bool) {
    let filter = query.filter().unwrap_or_else(|e| fail(&e, output, quiet));
    let page = dashboard.list_runs(&filter, query.page.unwrap_or(1)).await;
    let page = checked(page, output, quiet);
    print_value(&page, render::runs, output, quiet);
}

async fn cmd_scenarios(dashboard: &Db, query: &ScenarioQuery, output: OutputFormat, quiet: bool) {
    let filter = query.filter().unwrap_or_else(|e| fail(&e, output, quiet));
    let page = dashboard.list_scenarios(&filter, query.page.unwrap_or(1)).await;
    let page = checked(page, output, quiet);
    print_value(&page, render::scenarios, output, quiet);
}

async fn cmd_incidents(dashboard: &Db, query: &IncidentQuery, output: OutputFormat, quiet: bool) {
    let filter = query.filter().unwrap_or_else(|e| fail(&e, output, quiet));
    let page = dashboard.list_incidents(&filter, query.page.unwrap_or(1)).await;
    let page = checked(page, output, quiet);
    print_value(&page, render::incidents, output, quiet);
}

async fn cmd_kpis(dashboard: &Db, output: OutputFormat, quiet: bool) {
    let kpis = dashboard.kpis(dashboard.generator().now()).await;
    let kpis = checked(kpis, output, quiet);
    print_value(&kpis, render::kpis, output, quiet);
}

// ──────────────────────────────────────────────
// Details
// ──────────────────────────────────────────────

async fn cmd_run(dashboard: &Db, id: &str, output: OutputFormat, quiet: bool) {
    let run = found(dashboard.get_run_detail(id).await, "run", id, output, quiet);
    print_value(&run, render::run_detail, output, quiet);
}

async fn cmd_versions(dashboard: &Db, id: &str, output: OutputFormat, quiet: bool) {
    let versions = dashboard.scenario_versions(id).await;
    let versions = found(versions, "scenario", id, output, quiet);
    print_value(&versions, |v| render::versions(id, v), output, quiet);
}

async fn cmd_incident(dashboard: &Db, id: &str, output: OutputFormat, quiet: bool) {
    let incident = dashboard.get_incident_detail(id).await;
    let incident = found(incident, "incident", id, output, quiet);
    print_value(&incident, render::incident_detail, output, quiet);
}

async fn cmd_export(dashboard: &Db, target: ExportTarget, output: OutputFormat, quiet: bool) {
    let (document, out) = match target {
        ExportTarget::Run { id, out } => {
            let doc = dashboard.export_run(&id).await;
            (found(doc, "run", &id, output, quiet), out)
        }
        ExportTarget::Incident { id, out } => {
            let doc = dashboard.export_incident(&id).await;
            (found(doc, "incident", &id, output, quiet), out)
        }
    };

    let Some(path) = out else {
        println!("{}", document.content);
        return;
    };
    write_file(&path, &document.content, output, quiet);
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => println!("Wrote {} (etag {})", path.display(), document.etag),
        OutputFormat::Json => {
            let summary = serde_json::json!({
                "path": path.display().to_string(),
                "fileName": document.file_name,
                "etag": document.etag,
            });
            println!("{summary}");
        }
    }
}

fn write_file(path: &Path, content: &str, output: OutputFormat, quiet: bool) {
    if let Err(e) = std::fs::write(path, content) {
        fail(
            &format!("error writing '{}': {}", path.display(), e),
            output,
            quiet,
        );
    }
}

// ──────────────────────────────────────────────
// Output helpers
// ──────────────────────────────────────────────

fn print_value<T: Serialize>(
    value: &T,
    text: impl FnOnce(&T) -> String,
    output: OutputFormat,
    quiet: bool,
) {
    match output {
        OutputFormat::Text => print!("{}", text(value)),
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => fail(&format!("serialization error: {e}"), output, quiet),
        },
    }
}

fn checked<T>(result: Result<T, ServiceError>, output: OutputFormat, quiet: bool) -> T {
    result.unwrap_or_else(|e| fail(&e.to_string(), output, quiet))
}

fn found<T>(
    result: Result<Option<T>, ServiceError>,
    kind: &str,
    id: &str,
    output: OutputFormat,
    quiet: bool,
) -> T {
    match checked(result, output, quiet) {
        Some(value) => value,
        None => fail(&format!("{kind} not found: {id}"), output, quiet),
    }
}

fn fail(msg: &str, output: OutputFormat, quiet: bool) -> ! {
    report_error(msg, output, quiet);
    process::exit(1);
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
