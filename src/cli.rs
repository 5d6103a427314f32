use clap::{Parser, Subcommand};
use protest_news::models::FilterField;

#[derive(Parser, Debug)]
#[command(name = "protest-news")]
#[command(about = "Collect NYT article search results by month and build chart series for the protest dashboard")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every page of an article search into <output>/<year>/<month>/
    Collect {
        /// Search tag; repeat or separate with commas
        #[arg(short, long = "tag", env = "PROTEST_NEWS_TAGS", value_delimiter = ',', required = true)]
        tags: Vec<String>,

        /// Article section to search (headline, lead_paragraph, body)
        #[arg(
            short,
            long = "filter",
            env = "PROTEST_NEWS_FILTERS",
            value_delimiter = ',',
            default_value = "headline,lead_paragraph"
        )]
        filters: Vec<String>,

        /// Start date (YYYYMMDD or YYYY-MM-DD)
        #[arg(long, env = "PROTEST_NEWS_BEGIN")]
        begin: String,

        /// End date (YYYYMMDD or YYYY-MM-DD)
        #[arg(long, env = "PROTEST_NEWS_END")]
        end: String,

        /// Output directory (defaults to PROTEST_NEWS_OUTPUT_DIR or ./raw_data)
        #[arg(short, long)]
        output: Option<String>,

        /// Keep directories from the previous run instead of removing them
        #[arg(long)]
        no_reset: bool,
    },

    /// Remove all collected pages, keeping the aggregate CSV
    Reset {
        /// Output directory (defaults to PROTEST_NEWS_OUTPUT_DIR or ./raw_data)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Show how many pages are on disk for each month
    Status {
        /// Output directory (defaults to PROTEST_NEWS_OUTPUT_DIR or ./raw_data)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Build line-chart series from the project's CSV datasets
    Series {
        #[command(subcommand)]
        subcommand: SeriesCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum SeriesCommands {
    /// Protests per year, nationally and for selected cities
    Protests {
        /// Protest events CSV (needs Date and City_Town columns)
        #[arg(short, long)]
        input: String,

        /// Output JSON file
        #[arg(short, long, default_value = "./protests_by_year.json")]
        output: String,

        /// City to chart; repeat or separate with commas
        #[arg(long = "city", value_delimiter = ',')]
        cities: Vec<String>,
    },
    /// Per-capita police budget per city
    Budget {
        /// Budget CSV (City, Type, one column per year)
        #[arg(short, long)]
        input: String,

        /// Output JSON file
        #[arg(short, long, default_value = "./budget_per_capita.json")]
        output: String,
    },
}

impl Commands {
    pub fn parse_filters(filters: &[String]) -> Result<Vec<FilterField>, anyhow::Error> {
        filters
            .iter()
            .filter(|f| !f.trim().is_empty())
            .map(|f| f.parse::<FilterField>().map_err(anyhow::Error::from))
            .collect()
    }
}
