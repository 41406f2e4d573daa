mod pipeline;
mod report;

use clap::Parser;
use reviewsum_db::{PoolConfig, ReviewRepository};
use reviewsum_llm::{OpenAiClient, SummaryGenerator, TiktokenEstimator};
use tracing_subscriber::EnvFilter;

use crate::pipeline::{resolve_ids, run_pipeline, PipelineOptions};

#[derive(Debug, Parser)]
#[command(name = "reviewsum")]
#[command(about = "Generate marketing summaries from academy reviews")]
struct Cli {
    /// Only summarize these entity ids (repeatable); defaults to every id in the reviews table
    #[arg(long = "id", value_name = "ID")]
    ids: Vec<String>,

    /// Fetch reviews and print batch statistics without calling the model or writing
    #[arg(long)]
    dry_run: bool,

    /// Override `REVIEWSUM_MAX_CONCURRENCY` for this run
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    concurrency: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = reviewsum_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::debug!(?config, "configuration loaded");

    let pool = reviewsum_db::connect_pool_lazy(&config.db, PoolConfig::from_app_config(&config));
    if let Err(e) = reviewsum_db::health_check(&pool).await {
        tracing::warn!(error = %e, "database health check failed; reads will come back empty");
    }
    let repository = ReviewRepository::from_app_config(pool.clone(), &config);

    let estimator = TiktokenEstimator::for_model(&config.llm.model)?;
    let client = OpenAiClient::from_settings(&config.llm)?;
    let generator = SummaryGenerator::new(client, estimator, &config.llm.model);

    let mut options = PipelineOptions::from_app_config(&config, cli.dry_run);
    if let Some(concurrency) = cli.concurrency {
        options.max_concurrency = usize::from(concurrency);
    }

    let ids = resolve_ids(&repository, cli.ids).await;
    let report = run_pipeline(&repository, &generator, ids, &options).await;

    report.log_summary();
    print!("{report}");

    pool.close().await;
    Ok(())
}
