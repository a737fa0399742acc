//! gis-pg-sync CLI - Move local project layers into PostGIS.

use clap::{Parser, Subcommand, ValueEnum};
use gis_pg_sync::{
    Config, Layer, LayerPartition, Lifecycle, LifecycleEvent, MigrateError, PgConnector,
    ProjectDocument, ProjectHost, RunReport,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "gis-pg-sync")]
#[command(about = "Synchronize GIS project layers from shapefiles into PostGIS")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the project document
    #[arg(short, long, default_value = "project.yaml")]
    project: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate local layers into the database
    Run {
        /// Dry run: validate and show plan without touching project or database
        #[arg(long)]
        dry_run: bool,
    },

    /// Fire a project lifecycle hook
    Hook {
        #[arg(value_enum)]
        event: HookEvent,
    },

    /// Show how the project's layers are classified
    Classify,

    /// Rewrite geometry types in the style registry table
    RepairStyles,

    /// Test the database connection
    HealthCheck,
}

#[derive(Clone, Copy, ValueEnum)]
enum HookEvent {
    Open,
    Save,
    Close,
}

impl From<HookEvent> for LifecycleEvent {
    fn from(event: HookEvent) -> Self {
        match event {
            HookEvent::Open => LifecycleEvent::Open,
            HookEvent::Save => LifecycleEvent::Save,
            HookEvent::Close => LifecycleEvent::Close,
        }
    }
}

#[derive(Serialize)]
struct Classification {
    vector_local: Vec<String>,
    vector_db: Vec<String>,
    raster_local: Vec<String>,
    raster_db: Vec<String>,
    local_tables: Vec<String>,
}

impl Classification {
    fn from_partition(partition: &LayerPartition<'_>) -> Self {
        fn names(bucket: &[&Layer]) -> Vec<String> {
            bucket.iter().map(|l| l.name.clone()).collect()
        }
        Self {
            vector_local: names(&partition.vector_local),
            vector_db: names(&partition.vector_db),
            raster_local: names(&partition.raster_local),
            raster_db: names(&partition.raster_db),
            local_tables: names(&partition.local_tables),
        }
    }
}

#[derive(Serialize)]
struct HealthCheckResult {
    healthy: bool,
    endpoint: String,
    latency_ms: u64,
    error: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| MigrateError::Config(e.to_string()))?;

    let config = match &cli.config {
        Some(path) => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => Config::default(),
    };

    let mut project = ProjectDocument::load(&cli.project)?;
    info!(
        "Loaded project {:?} ({} layers)",
        cli.project,
        project.layers.len()
    );

    let style_table = config.migration.style_table.clone();
    let lifecycle = Lifecycle::new(config);

    match cli.command {
        Commands::Run { dry_run: true } => {
            let plan = lifecycle.orchestrator(&project)?.plan(&project)?;

            if cli.output_json {
                println!("{}", plan.to_json()?);
            } else {
                println!("\nDry run completed!");
                for rename in &plan.renames {
                    println!("  Rename: {} -> {}", rename.from, rename.to);
                }
                for import in &plan.imports {
                    println!(
                        "  Import: {} ({}) -> {}",
                        import.layer,
                        import.input.display(),
                        import.table
                    );
                }
                println!("  Layers to remove: {}", plan.removals.len());
                if let Some(ref group) = plan.target_group {
                    println!("  Target group: {}", group);
                }
                if !plan.duplicates.is_empty() {
                    println!("  Non-unique names: {:?}", plan.duplicates);
                }
            }

            if !plan.duplicates.is_empty() {
                return Err(MigrateError::DuplicateNames(plan.duplicates));
            }
        }

        Commands::Run { dry_run: false } => {
            let orchestrator = lifecycle.orchestrator(&project)?;
            let result = orchestrator.run(&mut project).await?;
            project.save(&cli.project)?;
            print_report(&result, cli.output_json, "Synchronization completed!")?;
        }

        Commands::Hook { event } => {
            let event = LifecycleEvent::from(event);
            match lifecycle.dispatch(event, &mut project).await? {
                Some(result) => {
                    project.save(&cli.project)?;
                    print_report(&result, cli.output_json, "Hook run completed!")?;
                }
                None if cli.output_json => println!("null"),
                None => println!("Hook '{}' is disabled, nothing to do", event),
            }
        }

        Commands::Classify => {
            let layers = project.layers();
            let partition = LayerPartition::classify(&layers);
            let classification = Classification::from_partition(&partition);

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&classification)?);
            } else {
                println!("Layer classification:");
                print_bucket("Local vector", &classification.vector_local);
                print_bucket("Database vector", &classification.vector_db);
                print_bucket("Local raster", &classification.raster_local);
                print_bucket("Database raster", &classification.raster_db);
                print_bucket("Local tables", &classification.local_tables);
            }
        }

        Commands::RepairStyles => {
            let repaired = lifecycle.orchestrator(&project)?.repair_styles().await?;
            if cli.output_json {
                println!("{}", serde_json::json!({ "rows_repaired": repaired }));
            } else {
                println!("Repaired geometry type of {} registry row(s)", repaired);
            }
        }

        Commands::HealthCheck => {
            let connection = lifecycle.connection(&project)?;
            let connector = PgConnector::new(&connection, &style_table)?;
            let result = match connector.ping().await {
                Ok(latency) => HealthCheckResult {
                    healthy: true,
                    endpoint: connection.endpoint(),
                    latency_ms: latency.as_millis() as u64,
                    error: None,
                },
                Err(e) => HealthCheckResult {
                    healthy: false,
                    endpoint: connection.endpoint(),
                    latency_ms: 0,
                    error: Some(e.to_string()),
                },
            };

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  PostgreSQL {}: {} ({}ms)",
                    result.endpoint,
                    if result.healthy { "OK" } else { "FAILED" },
                    result.latency_ms
                );
                if let Some(ref err) = result.error {
                    println!("    Error: {}", err);
                }
            }

            if !result.healthy {
                return Err(MigrateError::connection(
                    "Health check failed",
                    connection.endpoint(),
                ));
            }
        }
    }

    Ok(())
}

fn print_report(result: &RunReport, json: bool, status_msg: &str) -> Result<(), MigrateError> {
    if json {
        println!("{}", result.to_json()?);
        return Ok(());
    }

    println!("\n{}", status_msg);
    println!("  Run ID: {}", result.run_id);
    println!("  Duration: {:.2}s", result.duration_seconds);
    println!("  Layers renamed: {}", result.layers_renamed);
    println!("  Tables imported: {}", result.imported_tables.len());
    for table in &result.imported_tables {
        println!("    {}", table);
    }
    println!("  Local layers removed: {}", result.layers_removed);
    println!("  Registry rows repaired: {}", result.registry_rows_repaired);
    Ok(())
}

fn print_bucket(label: &str, names: &[String]) {
    if names.is_empty() {
        println!("  {}: -", label);
    } else {
        println!("  {}: {}", label, names.join(", "));
    }
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so that --output-json stays parseable.
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}
