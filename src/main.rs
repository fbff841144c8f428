use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use url::Url;

use place_scout::core::app_state::Overrides;
use place_scout::core::config::load_scout_config;
use place_scout::details::{parse_place_details, DetailSelectors};
use place_scout::details_store::DetailsWriter;
use place_scout::geo::{extract_with_source, haversine_km};
use place_scout::search_input::load_searches;
use place_scout::search_url::search_urls;
use place_scout::tools::{enrich_collection, run_source};
use place_scout::{AppState, Coordinate, CsvCandidateSource, HtmlSnapshotSource, SavedPages};

const DEFAULT_BASE_URL: &str = "https://www.google.com/maps/";

#[derive(Parser)]
#[command(name = "place-scout")]
#[command(about = "Collect map place URLs, measure them against a search center, keep the nearby ones")]
#[command(version)]
struct Cli {
    /// All-results CSV (overrides config)
    #[arg(long, global = true)]
    all_urls: Option<PathBuf>,

    /// Within-threshold CSV (overrides config)
    #[arg(long, global = true)]
    filtered: Option<PathBuf>,

    /// Distance cut-off in km (overrides config)
    #[arg(long, global = true)]
    threshold_km: Option<f64>,

    /// Candidates in flight during batch ingest
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true, env = "PLACE_SCOUT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest candidates from a CSV of search_item, latitude, longitude, url
    Ingest {
        #[arg(long)]
        candidates: PathBuf,
    },

    /// Extract place links from a saved results page and ingest them
    Listing {
        #[arg(long)]
        html: PathBuf,
        /// Search term the page was produced for
        #[arg(long)]
        item: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Base for resolving relative links
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        base_url: String,
    },

    /// Parse a saved place page and append a details row
    Details {
        #[arg(long)]
        html: PathBuf,
        /// URL the page was saved from
        #[arg(long)]
        url: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Append details from saved pages to every row of a collection
    Enrich {
        /// `url,file` manifest of saved detail pages
        #[arg(long)]
        pages: PathBuf,
        /// Collection to enrich (default: the filtered collection)
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Validate a search list and print one search URL per row
    Searches {
        #[arg(long)]
        input: PathBuf,
    },

    /// Print the coordinate embedded in a place URL
    Coords { url: String },

    /// Great-circle distance in km between two points
    Distance {
        #[arg(allow_hyphen_values = true)]
        lat1: f64,
        #[arg(allow_hyphen_values = true)]
        lon1: f64,
        #[arg(allow_hyphen_values = true)]
        lat2: f64,
        #[arg(allow_hyphen_values = true)]
        lon2: f64,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "place_scout=debug"
    } else {
        "place_scout=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_scout_config(cli.config.as_deref());
    let overrides = Overrides {
        all_urls_path: cli.all_urls,
        filtered_path: cli.filtered,
        threshold_km: cli.threshold_km,
        concurrency: cli.concurrency,
    };

    match cli.command {
        Commands::Ingest { candidates } => {
            let state = AppState::new(config, overrides);
            info!("{:?}", state);
            let source = CsvCandidateSource::new(candidates);
            let summary = run_source(&source, &state.store, state.threshold_km, state.concurrency)
                .await
                .context("reading candidates")?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Listing {
            html,
            item,
            lat,
            lon,
            base_url,
        } => {
            let center = Coordinate::new(lat, lon)?;
            let base_url = Url::parse(&base_url).context("invalid --base-url")?;
            let extra_selectors = config.place_link_selectors.clone();
            let state = AppState::new(config, overrides);
            let source = HtmlSnapshotSource {
                path: html,
                base_url,
                search_item: item,
                center,
                extra_selectors,
            };
            let summary = run_source(&source, &state.store, state.threshold_km, state.concurrency)
                .await
                .context("reading results page")?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Details { html, url, out } => {
            let page = tokio::fs::read_to_string(&html)
                .await
                .with_context(|| format!("reading {}", html.display()))?;
            let details = parse_place_details(&page, &url, &DetailSelectors::default());
            if details.name.is_none() {
                warn!("No place name found in {}", html.display());
            }
            let writer =
                DetailsWriter::new(out.unwrap_or_else(|| config.resolve_details_out_path()));
            writer.append(std::slice::from_ref(&details))?;
            info!("Appended details row to {}", writer.path().display());
            println!("{}", serde_json::to_string_pretty(&details)?);
        }
        Commands::Enrich { pages, input, out } => {
            let pages = SavedPages::from_manifest(pages)?;
            let input = input
                .or(overrides.filtered_path)
                .unwrap_or_else(|| config.resolve_filtered_path());
            let out = out.unwrap_or_else(|| config.resolve_enriched_out_path());
            let concurrency = overrides
                .concurrency
                .map(|c| c.max(1))
                .unwrap_or_else(|| config.resolve_concurrency());
            let summary = enrich_collection(
                &input,
                &out,
                &pages,
                &DetailSelectors::default(),
                concurrency,
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Searches { input } => {
            let searches = load_searches(&input)?;
            let radius_m = config.resolve_search_radius_m();
            for (item, url) in search_urls(&searches, radius_m) {
                match url {
                    Ok(url) => println!("{}\t{}", item, url),
                    Err(e) => warn!("Skipping '{}': {}", item, e),
                }
            }
        }
        Commands::Coords { url } => {
            let (coordinate, source) = extract_with_source(&url)?;
            info!("Coordinate taken from {:?}", source);
            println!("{}", coordinate);
        }
        Commands::Distance {
            lat1,
            lon1,
            lat2,
            lon2,
        } => {
            let km = haversine_km(
                Coordinate { lat: lat1, lon: lon1 },
                Coordinate { lat: lat2, lon: lon2 },
            )?;
            println!("{:.2}", km);
        }
    }

    Ok(())
}
