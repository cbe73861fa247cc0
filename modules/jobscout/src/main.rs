use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gemini_client::GeminiClient;
use jobscout::scout::Scout;
use jobscout::sources::SourceRegistry;
use jobscout::traits::ChromiumFactory;
use jobscout_common::Config;

/// Crawl career-site listings, score each posting with a generative
/// model, and print a ranked report.
#[derive(Parser, Debug)]
#[command(name = "jobscout")]
struct Args {
    /// Source ids to collect (default: every registered source).
    #[arg(long, value_delimiter = ',')]
    sources: Vec<String>,

    /// Postings to analyze per source.
    #[arg(long, default_value_t = 2)]
    limit: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobscout=info".parse()?))
        .init();

    let args = Args::parse();
    let config = Config::from_env();

    let registry = SourceRegistry::builtin();
    let selected: Vec<String> = if args.sources.is_empty() {
        registry.source_ids().iter().map(|s| s.to_string()).collect()
    } else {
        args.sources.clone()
    };

    info!(sources = ?selected, limit = args.limit, "Job scout starting");

    let model = GeminiClient::new(&config.gemini_api_key, &config.gemini_model);
    let scout = Scout::new(registry, Box::new(ChromiumFactory), Box::new(model));

    let outcome = scout.run(&selected, args.limit).await;

    for err in &outcome.site_errors {
        eprintln!("{} failed: {}", err.source_id, err.message);
    }
    println!("{}", outcome.stats);

    if outcome.report.is_empty() {
        println!("No postings analyzed. Check whether the sites are blocking automated sessions.");
    } else {
        println!("{}", outcome.report);
    }

    Ok(())
}
