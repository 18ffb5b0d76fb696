//! Geodominion - Entry Point
//!
//! Wires the batch pipeline end to end: parse the chat export, acquire
//! the country dataset, build the region index, resolve every event,
//! fold the dominance timeline and write the render payload as JSON.

use std::path::PathBuf;

use clap::Parser;
use tokio::runtime::Runtime;

use geodominion::core::error::Result;
use geodominion::dominance::DominanceEngine;
use geodominion::emit::{self, Palette};
use geodominion::ingest::chat::parse_chat;
use geodominion::regions::dataset::{self, DEFAULT_CACHE_PATH, DEFAULT_DATASET_URL};
use geodominion::regions::{geojson, RegionIndex};
use geodominion::resolver::Resolver;

#[derive(Parser, Debug)]
#[command(
    name = "geodominion",
    about = "Territorial dominance timelines from geotagged chat events"
)]
struct Cli {
    /// Chat export to ingest
    #[arg(long, default_value = "_chat.txt")]
    chat: PathBuf,

    /// Region dataset URL (GeoJSON feature collection)
    #[arg(long, default_value = DEFAULT_DATASET_URL)]
    dataset_url: String,

    /// Local cache for the downloaded dataset
    #[arg(long, default_value = DEFAULT_CACHE_PATH)]
    dataset_cache: PathBuf,

    /// Optional palette override file (TOML)
    #[arg(long)]
    palette: Option<PathBuf>,

    /// Where to write the render payload
    #[arg(long, default_value = "dominion.json")]
    output: PathBuf,
}

fn main() -> Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("geodominion=info")
        .init();

    let cli = Cli::parse();

    let palette = Palette::load(cli.palette.as_deref())?;

    let chat = std::fs::read_to_string(&cli.chat)?;
    let events = parse_chat(&chat, palette.aliases());
    if events.is_empty() {
        tracing::warn!(chat = %cli.chat.display(), "no geotagged events in chat export");
    }

    // Dataset acquisition is the only async step; the rest of the
    // pipeline is a single-pass batch job.
    let rt = Runtime::new()?;
    let body = rt.block_on(dataset::fetch_dataset(&cli.dataset_url, &cli.dataset_cache))?;
    let regions = geojson::load_regions(&body)?;
    tracing::info!(regions = regions.len(), "region dataset loaded");

    let index = RegionIndex::build(regions)?;

    let resolution = Resolver::new(&index).resolve(events);
    tracing::info!(
        resolved = resolution.events.len(),
        dropped = resolution.dropped,
        "events resolved against region index"
    );

    let snapshots = DominanceEngine::fold(&resolution.events);
    tracing::info!(steps = snapshots.len(), "dominance timeline computed");

    let payload = emit::emit(&snapshots, &resolution.events, &palette);
    std::fs::write(&cli.output, payload.to_json()?)?;
    tracing::info!(output = %cli.output.display(), "render payload written");

    Ok(())
}
