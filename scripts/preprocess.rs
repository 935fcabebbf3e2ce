//! Offline cleanup of the recipe dataset
//!
//! Reads the recipe CSV, normalizes durations/dates/ingredient lists and
//! missing values, and writes the result as an Arrow IPC file.
//! The web server never runs this; it reads the raw CSV.
//! Run: cargo run --bin preprocess -- --input resource/recipes.csv --output resource/recipes.arrow

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use recipe_hub::config::LogFormat;
use recipe_hub::logging;
use recipe_hub::preprocess::{normalize, write_ipc};
use recipe_hub::storage::load_recipes;

#[derive(Parser)]
#[command(name = "preprocess")]
#[command(about = "Normalize the recipe table into an Arrow IPC file", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "resource/recipes.csv")]
    input: PathBuf,

    #[arg(short, long, default_value = "resource/recipes.arrow")]
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _log_guard = logging::init(LogFormat::Pretty);

    let table = load_recipes(&cli.input)?;
    let normalized = normalize(&table);

    let undated = normalized.iter().filter(|r| r.date_published.is_none()).count();
    write_ipc(&normalized, &cli.output)?;

    info!(
        recipes = normalized.len(),
        undated,
        output = %cli.output.display(),
        "normalized recipe table written"
    );
    Ok(())
}
