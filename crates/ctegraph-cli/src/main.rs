//! ctegraph CLI - CTE lineage for SQL queries

use ctegraph_cli::cli;
use ctegraph_cli::input;
use ctegraph_cli::output;
#[cfg(feature = "serve")]
use ctegraph_cli::server;
use ctegraph_cli::watch;

use anyhow::{Context, Result};
use clap::Parser;
use ctegraph_core::build_lineage_from_sql;
use ctegraph_export::{export_json, export_mermaid};
use ctegraph_view::{rebuild, CoordinatorConfig, LayeredLayout};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cli::{Args, OutputFormat};

/// The query could not be analyzed (parse error or unsupported construct).
const EXIT_FAILURE: u8 = 1;
/// Configuration or I/O error (unreadable input, unbindable port).
const EXIT_CONFIG_ERROR: u8 = 66;

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.quiet);

    #[cfg(feature = "serve")]
    if args.serve {
        return run_serve_mode(args);
    }

    if args.watch {
        return run_watch_mode(args);
    }

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_FAILURE),
        Err(e) => {
            eprintln!("ctegraph: error: {e:#}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

/// Log to stderr. `RUST_LOG` overrides the default level; failures the CLI
/// already reports as `ctegraph:` lines stay below it.
fn init_tracing(quiet: bool) {
    let default_level = if quiet { "off" } else { "error" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn coordinator_config(args: &Args) -> CoordinatorConfig {
    CoordinatorConfig {
        dialect: args.dialect.into(),
        ..Default::default()
    }
}

/// One-shot analysis. Returns `Ok(false)` when the query could not be analyzed.
fn run(args: Args) -> Result<bool> {
    let sql = input::read_input(args.file.as_deref())?;
    let config = coordinator_config(&args);

    let rendered = match args.format {
        OutputFormat::Layout => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .context("Failed to create tokio runtime")?;
            match runtime.block_on(rebuild(&sql, &config, &LayeredLayout::new())) {
                Ok(snapshot) => output::format_layout(&snapshot, args.compact)?,
                Err(e) => {
                    eprintln!("ctegraph: error: {e}");
                    return Ok(false);
                }
            }
        }
        format => {
            let graph = match build_lineage_from_sql(&sql, config.dialect) {
                Ok(graph) => graph,
                Err(e) => {
                    eprintln!("ctegraph: error: {e}");
                    return Ok(false);
                }
            };
            match format {
                OutputFormat::Json => export_json(&graph, args.compact)?,
                OutputFormat::Mermaid => export_mermaid(&graph),
                _ => output::format_table(&graph, true),
            }
        }
    };

    println!("{rendered}");
    Ok(true)
}

/// Re-render to the terminal whenever the input file changes.
fn run_watch_mode(args: Args) -> ExitCode {
    let Some(path) = args.file.clone() else {
        eprintln!("ctegraph: error: --watch needs a FILE");
        return ExitCode::from(EXIT_CONFIG_ERROR);
    };
    let config = coordinator_config(&args);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("ctegraph: error: failed to create tokio runtime: {e}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    match runtime.block_on(watch::run_watch(path, config, args.quiet)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ctegraph: error: {e:#}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

/// Run the CLI in serve mode.
#[cfg(feature = "serve")]
fn run_serve_mode(args: Args) -> ExitCode {
    use server::ServerConfig;

    // A FILE seeds the first graph; stdin is never read in serve mode.
    let initial_sql = match args.file.as_deref().map(input::read_file).transpose() {
        Ok(sql) => sql,
        Err(e) => {
            eprintln!("ctegraph: error: {e:#}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let config = ServerConfig {
        coordinator: coordinator_config(&args),
        port: args.port,
        initial_sql,
        watch_file: if args.watch { args.file.clone() } else { None },
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("ctegraph: error: failed to create tokio runtime: {e}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    match runtime.block_on(server::run_server(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ctegraph: server error: {e:#}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}
