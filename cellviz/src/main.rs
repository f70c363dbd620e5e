mod args;
mod config;
#[cfg(feature = "viewer")]
mod viewer;

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use cell_plots::{CellTable, CellType, Figure, FigureOptions, LoadError, render_figure};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::args::{Args, ArgsError};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    let args = Args::parse();

    let params = match args.resolve() {
        Ok(params) => params,
        Err(ArgsError::CellType(err)) => {
            println!("\n❌ Error: {err}");
            println!("Valid options: {}", CellType::valid_keys());
            return Ok(ExitCode::FAILURE);
        }
    };
    println!("{}", args::summary(&params, config::DATA_PATH));

    println!("Loading data...");
    let table = match CellTable::load(Path::new(config::DATA_PATH)) {
        Ok(table) => table,
        Err(err @ LoadError::NotFound { .. }) => {
            println!("\n❌ Error: {err}");
            println!("{}", config::GENERATE_HINT);
            return Ok(ExitCode::FAILURE);
        }
        Err(err) => {
            println!("\n❌ Error loading data: {err}");
            return Ok(ExitCode::FAILURE);
        }
    };
    println!("✓ Loaded {} cells", table.len());

    println!("Creating visualization...");
    let cells = table.cells().context("reading cell columns")?;
    let figure = render_figure(&cells, &params, &FigureOptions::default())
        .context("rendering figure")?;
    info!(threshold = params.threshold, cell_type = %params.cell_type, "figure rendered");

    figure
        .save(Path::new(config::OUTPUT_PATH))
        .with_context(|| format!("saving figure to {}", config::OUTPUT_PATH))?;
    println!("✓ Plot saved as: {}", config::OUTPUT_PATH);

    present(figure);
    Ok(ExitCode::SUCCESS)
}

/// The desktop event loop ends the process when its window closes, so the
/// closing line goes out first.
#[cfg(feature = "viewer")]
fn present(figure: Figure) {
    println!("\nDone!");
    debug!(dimensions = ?figure.dimensions(), "opening viewer window");
    viewer::show(figure);
}

#[cfg(not(feature = "viewer"))]
fn present(figure: Figure) {
    debug!(dimensions = ?figure.dimensions(), "built without the viewer; not presenting");
    println!("\nDone!");
}
