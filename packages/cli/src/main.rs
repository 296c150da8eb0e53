#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for store density analysis.
//!
//! Analyzes one or more named regions against the live OpenStreetMap
//! services and prints a per-region summary (total stores, occupied
//! cells, average density, densest cell). With `--hotspot`, also asks
//! the configured LLM predictor to suggest a new commercial location
//! for one region.
//!
//! ```text
//! RUST_LOG=info store-map Lagos Rivers --hotspot Lagos
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use store_map_ai::{PredictionError, PredictionService, providers};
use store_map_analysis::RegionAnalysisStore;
use store_map_engine::AnalysisOrchestrator;
use store_map_models::{BoundingBox, GeoPoint, Hotspot, RegionAnalysis};
use store_map_sources::{NominatimClient, OverpassClient};

/// Analyze store density for named regions.
#[derive(Parser)]
#[command(name = "store-map")]
struct Args {
    /// Region names to analyze, in order.
    #[arg(required = true)]
    regions: Vec<String>,

    /// Also request an LLM hotspot prediction for this region.
    #[arg(long)]
    hotspot: Option<String>,
}

/// Stand-in predictor used when no credentials are configured and no
/// prediction was requested.
struct UnconfiguredPredictor;

#[async_trait]
impl PredictionService for UnconfiguredPredictor {
    async fn predict(
        &self,
        _region_name: &str,
        _points: &[GeoPoint],
        _bbox: &BoundingBox,
    ) -> Result<Hotspot, PredictionError> {
        Err(PredictionError::Unavailable {
            message: "no predictor configured".to_string(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let args = Args::parse();

    // Nominatim's usage policy requires an identifying user agent.
    let http = reqwest::Client::builder()
        .user_agent(concat!("store-map/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let predictor: Arc<dyn PredictionService> = match providers::create_predictor_from_env() {
        Ok(predictor) => Arc::from(predictor),
        Err(e) if args.hotspot.is_some() => return Err(e.into()),
        Err(e) => {
            log::debug!("No predictor configured ({e}); hotspot prediction disabled");
            Arc::new(UnconfiguredPredictor)
        }
    };

    let orchestrator = AnalysisOrchestrator::new(
        Arc::new(RegionAnalysisStore::new()),
        Arc::new(NominatimClient::new(http.clone())),
        Arc::new(OverpassClient::new(http)),
        predictor,
    );

    let results = orchestrator.analyze_regions(&args.regions).await?;
    for analysis in &results {
        print_summary(analysis);
    }

    if let Some(active) = orchestrator.active_region() {
        println!("Active region: {active}");
    }

    if let Some(region) = &args.hotspot {
        let hotspot = orchestrator.request_hotspot(region).await?;
        println!();
        println!("Predicted hotspot for {region}:");
        println!("  location:  ({:.4}, {:.4})", hotspot.lat, hotspot.lon);
        println!("  reasoning: {}", hotspot.reasoning);
    }

    Ok(())
}

fn print_summary(analysis: &RegionAnalysis) {
    println!("{}", analysis.region_name);
    println!("  total stores:    {}", analysis.total_points);
    println!("  occupied cells:  {}", analysis.cells.len());
    println!("  average density: {:.2}", analysis.average_density);
    match &analysis.densest_cell {
        Some(cell) => println!(
            "  densest cell:    {} ({} stores at {:.4}, {:.4})",
            cell.cell_id, cell.count, cell.lat, cell.lon
        ),
        None => println!("  densest cell:    none"),
    }
    println!();
}
