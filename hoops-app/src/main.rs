use apps::{AppError, AppProperties, AppResult};
use axum::Router;
use clap::Parser;
use dotenv::dotenv;
use error_stack::ResultExt;
use hoops_app::config::HoopsConfig;
use hoops_app::engine::AppEngine;
use hoops_app::logging::init_logging;
use hoops_routes::state::HoopAppState;
use std::path::PathBuf;
use tracing::{debug, error, info, instrument, warn};

/// Accepts hoop submissions over http.
#[derive(Debug, Parser)]
#[command(name = "hoops-listener", version)]
struct Args {
    /// Configuration file
    #[arg(long, env = "HOOPS_CONFIG")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let env_loaded = dotenv();
    init_logging();

    if let Err(e) = env_loaded {
        warn!("failed to load .env file: {e}");
    }

    match try_main(Args::parse()).await {
        Ok(_) => info!("hoops listener shutting down"),
        Err(e) => {
            error!("hoops listener exited with error: {e:?}");
        }
    }
}

async fn try_main(args: Args) -> AppResult<()> {
    let config = HoopsConfig::load(&args.config)
        .await
        .change_context(AppError)?;

    let routes = build_routes(&config).await?;

    apps::run(
        routes,
        AppProperties {
            name: "hoops listener",
            port: config.port,
        },
    )
    .await
}

#[instrument(skip_all)]
async fn build_routes(config: &HoopsConfig) -> AppResult<Router> {
    let engine = AppEngine::from_config(config)
        .await
        .change_context(AppError)?;

    let state = if config.metrics_enabled {
        HoopAppState::new_with_metrics(engine).change_context(AppError)?
    } else {
        HoopAppState::new_without_metrics(engine)
    };

    debug!("building routes..");
    Ok(hoops_routes::routes::build(state)).inspect(|_| debug!("routes built"))
}
