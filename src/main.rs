use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info};

mod cli;

use cli::{Cli, Commands, SeriesCommands};
use protest_news::config::Config;
use protest_news::models::QueryConfig;
use protest_news::storage::ArtifactStore;
use protest_news::{nyt, series};

#[tokio::main]
async fn main() -> Result<()> {
    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "protest_news=info");
    }

    // Initialize logging to both console and file
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let file_appender = tracing_appender::rolling::never(".", "protest-news.log");

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_default_env()),
        )
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    match cli.command {
        Commands::Collect {
            tags,
            filters,
            begin,
            end,
            output,
            no_reset,
        } => {
            apply_output(&mut config, output);
            config.validate()?;

            let filters = Commands::parse_filters(&filters)?;
            let query = QueryConfig::new(tags, filters, &begin, &end)?;
            info!(
                "Starting collection for {:?} in {:?} from {} to {}",
                query.tags, query.filters, query.begin, query.end
            );

            match nyt::collect(query, &config, !no_reset).await {
                Ok(summary) => println!(
                    "Collected {} pages ({} hits) across {} months into {}",
                    summary.pages_written(),
                    summary.total_hits(),
                    summary.windows.len(),
                    config.output_dir.display()
                ),
                Err(e) if e.is_config_error() => {
                    error!("Invalid configuration, nothing was fetched: {}", e);
                    return Err(e.into());
                }
                Err(e) => {
                    error!("Collection failed: {}", e);
                    return Err(e.into());
                }
            }
        }

        Commands::Reset { output } => {
            apply_output(&mut config, output);
            let store = ArtifactStore::from_config(&config);
            let removed = store
                .reset()
                .with_context(|| format!("Failed to reset {}", store.root().display()))?;
            println!("Removed {} directories from {}", removed.len(), store.root().display());
        }

        Commands::Status { output } => {
            apply_output(&mut config, output);
            let store = ArtifactStore::from_config(&config);
            let inventory = store.inventory()?;

            if inventory.is_empty() {
                println!("No collected pages under {}", store.root().display());
            }
            for window in &inventory {
                println!(
                    "{} {:<9} {:>4} pages (last page {})",
                    window.year,
                    window.month_name,
                    window.pages,
                    window.last_page.map(|p| p.to_string()).unwrap_or_default()
                );
            }
            let aggregate = store.aggregate_path();
            println!(
                "Aggregate file {}: {}",
                aggregate.display(),
                if aggregate.is_file() { "present" } else { "missing" }
            );
        }

        Commands::Series { subcommand } => match subcommand {
            SeriesCommands::Protests { input, output, cities } => {
                let events = series::load_protests_from_path(Path::new(&input))
                    .with_context(|| format!("Failed to read protest data from {}", input))?;
                let cities: Vec<&str> = if cities.is_empty() {
                    series::DEFAULT_CITIES.to_vec()
                } else {
                    cities.iter().map(String::as_str).collect()
                };
                let traces = series::protests_by_year(&events, &cities);
                series::write_series(Path::new(&output), &traces)?;
                info!("Built {} protest series from {} events", traces.len(), events.len());
            }
            SeriesCommands::Budget { input, output } => {
                let traces = series::budget_per_capita_from_path(Path::new(&input))
                    .with_context(|| format!("Failed to read budget data from {}", input))?;
                series::write_series(Path::new(&output), &traces)?;
                info!("Built {} budget series", traces.len());
            }
        },
    }

    Ok(())
}

fn apply_output(config: &mut Config, output: Option<String>) {
    if let Some(dir) = output {
        config.output_dir = PathBuf::from(dir);
    }
}
