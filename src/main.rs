use clap::Parser;
use points_processor::{
    api::{RiotClient, Transport},
    args::Args,
    config::Config,
    database::db::DbClient,
    model::rank_oracle::{HistoricalRankTable, NoHistoricalRank, RankOracle, SeasonLabels},
    processor::Processor
};
use tracing::{error, info};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let indicatif_layer = IndicatifLayer::new();
    tracing_subscriber::registry()
        .with(EnvFilter::new(&args.log_level))
        .with(fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(indicatif_layer)
        .init();

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Could not load {}: {}", args.config.display(), e);
            std::process::exit(1);
        }
    };

    let storage = match DbClient::connect(&args.connection_string).await {
        Ok(client) => client,
        Err(e) => {
            error!("Expected valid database connection: {}", e);
            std::process::exit(1);
        }
    };

    let api = RiotClient::new(Transport::new(args.api_key.clone(), config.retry.clone()));

    match &args.historical_ranks {
        Some(path) => {
            let oracle = match HistoricalRankTable::load(path, SeasonLabels::new(args.seasons.iter().cloned())) {
                Ok(table) => table,
                Err(e) => {
                    error!("Could not load {}: {}", path.display(), e);
                    std::process::exit(1);
                }
            };
            run(&api, &oracle, &storage, &config, args.once).await;
        }
        None => run(&api, &NoHistoricalRank, &storage, &config, args.once).await
    }
}

async fn run<O: RankOracle>(api: &RiotClient, oracle: &O, storage: &DbClient, config: &Config, once: bool) {
    let processor = Processor::new(api, oracle, storage, config);

    if once {
        match processor.drain_queue().await {
            Ok(report) => info!(
                scored = report.scored,
                unscored = report.unscored,
                failed = report.failed,
                aborted = report.aborted.is_some(),
                "Queue drained"
            ),
            Err(e) => {
                error!("Failed to read the player queue: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        processor.run_forever().await;
    }
}
