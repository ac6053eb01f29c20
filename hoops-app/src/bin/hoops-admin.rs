use clap::{Parser, Subcommand};
use dotenv::dotenv;
use error_stack::{Report, ResultExt};
use hoops_app::config::HoopsConfig;
use hoops_app::engine::spreadsheet_repo;
use hoops_app::logging::init_logging;
use hoops_core::model::{Hoop, StorageKey};
use hoops_core::{HoopSaver, replicate};
use repositories::file::FileRepo;
use repositories::spreadsheet::credentials::OAuthClient;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

/// Maintenance tasks for saved hoops.
#[derive(Debug, Parser)]
#[command(name = "hoops-admin", version)]
struct Args {
    /// Configuration file
    #[arg(long, env = "HOOPS_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add a saved hoop to the spreadsheet
    Push {
        /// Storage key of a record in the data directory, or the path of a record file
        record: String,
    },
    /// Print the url that grants this app access to the spreadsheet
    TokenUrl,
}

#[derive(Debug, thiserror::Error)]
#[error("the admin command failed")]
struct AdminError;

type AdminResult<T> = Result<T, Report<AdminError>>;

#[tokio::main]
async fn main() -> ExitCode {
    let env_loaded = dotenv();
    init_logging();

    if let Err(e) = env_loaded {
        warn!("failed to load .env file: {e}");
    }

    match try_main(Args::parse()).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:?}");
            ExitCode::FAILURE
        }
    }
}

async fn try_main(args: Args) -> AdminResult<()> {
    let config = HoopsConfig::load(&args.config)
        .await
        .change_context(AdminError)?;

    match args.command {
        Command::Push { record } => push(&config, &record).await,
        Command::TokenUrl => token_url(&config),
    }
}

async fn push(config: &HoopsConfig, record: &str) -> AdminResult<()> {
    let files = FileRepo::new(&config.data_dir);
    let sheet = spreadsheet_repo(config).await.change_context(AdminError)?;

    let path = Path::new(record);
    if tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file()) {
        let hoop = files
            .read_from_file(path)
            .await
            .map(Hoop::from_attributes)
            .change_context(AdminError)?;
        sheet.save(&hoop).await.change_context(AdminError)?;
        info!("pushed hoop {} from {}", hoop.id(), path.display());
    } else {
        let key = record
            .strip_suffix(".json")
            .unwrap_or(record)
            .parse::<StorageKey>()
            .change_context(AdminError)?;
        let hoop = replicate(&files, &key, &sheet)
            .await
            .change_context(AdminError)?;
        info!("pushed hoop {}", hoop.id);
    }

    Ok(())
}

fn token_url(config: &HoopsConfig) -> AdminResult<()> {
    if config.oauth_client_id.is_empty() {
        return Err(Report::new(AdminError).attach("OAuthClientId is not configured"));
    }

    let url = OAuthClient::new(&config.oauth_client_id, &config.oauth_client_secret)
        .authorization_url()
        .change_context(AdminError)?;

    println!(
        "Visit this URL to grant access, then cache the token in {}",
        config.oauth_token_cache_file.display()
    );
    println!();
    println!("{url}");
    Ok(())
}
