//! Command-line finder for nearby recycling centers and scrap yards.
//!
//! Resolves a place name (or a device position given as coordinates), prints
//! the places found sorted by distance, then fills in missing addresses in the
//! background and optionally writes a standalone HTML page with a map.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use reclaim::config::Config;
use reclaim::map::{HtmlMap, MapController};
use reclaim::nominatim::NominatimClient;
use reclaim::normalize::default_rules;
use reclaim::overpass::OverpassClient;
use reclaim::present::NO_RESULTS;
use reclaim::{FinderError, SearchOutcome, Session};

#[derive(Parser, Debug)]
#[command(name = "finder")]
#[command(about = "Find recycling centers and scrap yards near a location")]
struct Args {
    /// Place name or address to search near
    #[arg(short, long)]
    location: Option<String>,

    /// Device latitude (use together with --lng instead of --location)
    #[arg(long, requires = "lng", conflicts_with = "location", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Device longitude
    #[arg(long, requires = "lat", conflicts_with = "location", allow_negative_numbers = true)]
    lng: Option<f64>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Search radius in meters (overrides config)
    #[arg(short, long)]
    radius: Option<u32>,

    /// Write the list and map as a standalone HTML page
    #[arg(long)]
    html: Option<PathBuf>,

    /// Print the final list as JSON
    #[arg(long)]
    json: bool,

    /// Skip reverse geocoding of missing addresses
    #[arg(long)]
    no_enrich: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging; RUST_LOG overrides the default level
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(radius) = args.radius {
        config.search.radius_m = radius;
    }

    info!("Reclaim finder");

    let rules = default_rules();
    let overpass = OverpassClient::new(&config.services, &config.search, rules.clone())
        .context("Failed to create Overpass client")?;
    let nominatim = NominatimClient::new(&config.services, &config.search)
        .context("Failed to create Nominatim client")?;
    let surface = HtmlMap::new(&config.map.tile_sources, config.map.max_tile_errors);
    let map = MapController::with_surface(surface, &config.map);
    let session = Session::new(overpass, nominatim, map, rules, &config);

    let outcome = match run_query(&session, &args).await {
        Ok(outcome) => outcome,
        Err(
            e @ (FinderError::EmptyQuery
            | FinderError::NotFound
            | FinderError::PermissionDenied
            | FinderError::InvalidCoordinate { .. }),
        ) => {
            eprintln!("{}", e);
            return Ok(ExitCode::from(2));
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(extent) = outcome.map.as_ref().and_then(|m| m.extent) {
        info!(
            "Markers span ({:.4}, {:.4}) to ({:.4}, {:.4})",
            extent.min().y,
            extent.min().x,
            extent.max().y,
            extent.max().x
        );
    }

    if outcome.is_empty() {
        eprintln!("{}", NO_RESULTS);
    } else if !args.json {
        for entry in outcome.list.entries() {
            println!("{}\n", entry);
        }
    }

    if !args.no_enrich && outcome.pending_lookups > 0 {
        let pb = ProgressBar::new(outcome.pending_lookups as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} addresses")?
                .progress_chars("#>-"),
        );

        let report = session
            .enrich(outcome.ticket, |entry| {
                pb.println(format!("{}: {}", entry.name, entry.address));
                pb.inc(1);
            })
            .await;
        pb.finish_and_clear();

        info!(
            "Resolved {} addresses ({} from coordinates)",
            report.applied(),
            report.fallback
        );
    }

    let results = session.results();

    if args.json {
        println!("{}", serde_json::to_string_pretty(results.list.entries())?);
    } else if !args.no_enrich && outcome.pending_lookups > 0 {
        println!("--- with addresses ---\n");
        for entry in results.list.entries() {
            println!("{}\n", entry);
        }
    }

    if let Some(path) = &args.html {
        let list_html = results.list.to_html()?;
        let map = session.map().await;
        let page = match map.surface() {
            Some(surface) => surface.render_page(
                &format!("Recycling near {}", results.query_label),
                outcome.ticket.query,
                &list_html,
                results.queried_at.unwrap_or_else(Utc::now),
            )?,
            None => anyhow::bail!("Map surface never became ready"),
        };
        std::fs::write(path, page)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {}", path.display());
    }

    Ok(ExitCode::SUCCESS)
}

async fn run_query(
    session: &Session<OverpassClient, NominatimClient, HtmlMap>,
    args: &Args,
) -> Result<SearchOutcome, FinderError> {
    match (args.lat, args.lng, &args.location) {
        (Some(lat), Some(lng), _) => session.search_device(Some((lat, lng))).await,
        (_, _, Some(location)) => session.search_text(location).await,
        _ => session.search_text("").await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_device_position_parses_negative_numbers() {
        let args = Args::try_parse_from(["finder", "--lat", "12.3", "--lng", "-98.7"]).unwrap();
        assert_eq!(args.lat, Some(12.3));
        assert_eq!(args.lng, Some(-98.7));
        assert!(args.location.is_none());
    }

    #[test]
    fn test_location_and_position_conflict() {
        let err = Args::try_parse_from([
            "finder",
            "--location",
            "Springfield",
            "--lat",
            "12.3",
            "--lng",
            "-98.7",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_lat_requires_lng() {
        assert!(Args::try_parse_from(["finder", "--lat", "12.3"]).is_err());
    }
}
