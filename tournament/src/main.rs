//! Trending footballers binary entry point

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use shared::logging::{self, Stage};
use shared::stage_debug;
use tournament::config::{self, DEFAULT_INPUT, DEFAULT_OUTPUT};
use tournament::services::DEFAULT_ENDPOINT;
use tournament::{
    RealTrendsClient, TimeWindow, TokioClock, TournamentConfig, TournamentResult,
    TrendsClientConfig, run_pipeline,
};

/// Find the five most trending footballers from a preprocessed roster
#[derive(Parser)]
#[command(name = "trending-footballers")]
#[command(about = "Ranks footballers by current search interest with a batch tournament")]
pub struct Args {
    /// Preprocessed roster (JSON array or {"players": [...]})
    #[arg(long, default_value = DEFAULT_INPUT)]
    pub input: PathBuf,

    /// Where the ranked top five are written
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Run elimination rounds while the pool is larger than this
    #[arg(long, default_value_t = config::DEFAULT_THRESHOLD)]
    pub threshold: usize,

    /// Survivors kept from each batch
    #[arg(long, default_value_t = config::DEFAULT_KEEP_PER_BATCH)]
    pub keep_per_batch: usize,

    /// Players compared per query (2-5)
    #[arg(long, default_value_t = 5)]
    pub batch_size: usize,

    /// Relative time window, e.g. "now 1-d" or "now 7-d"
    #[arg(long, default_value = "now 1-d")]
    pub timeframe: String,

    /// Region code, empty for worldwide
    #[arg(long, default_value = "")]
    pub geo: String,

    /// Trends category filter, 0 for all
    #[arg(long, default_value_t = 0)]
    pub category: u32,

    /// Test mode: use only the first N eligible players, unshuffled
    #[arg(long)]
    pub test_limit: Option<usize>,

    /// Seed for the pool shuffle
    #[arg(long)]
    pub seed: Option<u64>,

    /// Minimum delay between trends queries in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub min_delay_ms: u64,

    /// Pause after a rate-limited query in seconds
    #[arg(long, default_value_t = 60)]
    pub rate_limit_pause_secs: u64,

    /// Skip the interest-over-time lookup for the finalists
    #[arg(long)]
    pub no_detail: bool,

    /// Trends API base URL
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    fn tournament_config(&self) -> TournamentConfig {
        TournamentConfig {
            input: self.input.clone(),
            output: self.output.clone(),
            threshold: self.threshold,
            keep_per_batch: self.keep_per_batch,
            batch_size: self.batch_size,
            window: TimeWindow {
                timeframe: self.timeframe.clone(),
                geo: self.geo.clone(),
                category: self.category,
            },
            test_limit: self.test_limit,
            seed: self.seed,
            min_delay: Duration::from_millis(self.min_delay_ms),
            rate_limit_pause: Duration::from_secs(self.rate_limit_pause_secs),
            fetch_detail: !self.no_detail,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logging::init_tracing(Some(&args.log_level));

    if let Err(e) = run(args).await {
        logging::log_error("Trending footballers run", &e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> TournamentResult<()> {
    logging::log_startup("trending footballers tournament");

    let config = args.tournament_config();
    config.validate()?;
    stage_debug!(
        Stage::Setup,
        "Input: {}, output: {}, threshold: {}, batches of {} keep {}",
        config.input.display(),
        config.output.display(),
        config.threshold,
        config.batch_size,
        config.keep_per_batch
    );

    config::load_dotenv();
    let client_config = TrendsClientConfig::from_env(&args.endpoint, config.min_delay)?;
    if !client_config.proxies.is_empty() {
        stage_debug!(Stage::Setup, "Rotating through {} proxies", client_config.proxies.len());
    }
    let client = Arc::new(RealTrendsClient::new(client_config)?);

    let started = Instant::now();
    let written = run_pipeline(&config, client.clone(), Arc::new(TokioClock::new())).await?;

    logging::log_progress(
        Stage::Final,
        "Performance",
        &client.stats().summary(started.elapsed()),
    );
    logging::log_success(Stage::Persist, &format!("Updated {}", written.display()));
    logging::log_shutdown("tournament complete");
    Ok(())
}
