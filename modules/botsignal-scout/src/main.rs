use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use botsignal_common::Config;
use botsignal_scout::PipelineOrchestrator;
use botsignal_store::Store;
use reddit_client::RedditClient;

/// Run one bot-detection pipeline against a subreddit.
#[derive(Parser)]
#[command(name = "botsignal-scout")]
struct Args {
    /// Target subreddit (without the r/ prefix).
    #[arg(long)]
    subreddit: String,

    /// Session name; defaults to one derived from the subreddit.
    #[arg(long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("botsignal=info".parse()?))
        .init();

    let args = Args::parse();
    let config = Config::from_env();

    let store = Store::connect(&config.database_url).await?;
    store.migrate().await?;

    let client = RedditClient::new(
        config.reddit_client_id.clone(),
        config.reddit_client_secret.clone(),
        config.reddit_user_agent.clone(),
    );

    let pipeline = PipelineOrchestrator::new(
        Arc::new(client),
        Arc::new(store),
        config.fetch_delay_ms,
        config.extraction_limit,
    );

    let session = pipeline
        .sessions()
        .create(args.name, args.subreddit)
        .await?;
    info!(session_id = %session.id, "Session created, starting pipeline");

    let outcome = pipeline.run(session.id).await?;
    info!("{outcome}");

    Ok(())
}
