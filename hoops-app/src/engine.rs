use crate::config::{HoopsConfig, RecordStore};
use crate::notify::SmtpNotifier;
use error_stack::{Report, ResultExt};
use hoops_core::model::Hoop;
use hoops_core::result::RepoResult;
use hoops_core::{HoopEngine, HoopSaver};
use repositories::file::FileRepo;
use repositories::spreadsheet::SpreadsheetRepo;
use repositories::spreadsheet::credentials::{CredentialProvider, TokenCacheProvider};
use tracing::{debug, info, instrument};

pub type EngineResult<T> = Result<T, Report<EngineError>>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to set up the data directory")]
    DataDir,
    #[error("failed to set up the spreadsheet")]
    Spreadsheet,
    #[error("failed to set up notifications")]
    Notifications,
}

/// The configured destination for hoop records.
#[derive(Debug, Clone)]
pub enum Records {
    File(FileRepo),
    Spreadsheet(SpreadsheetRepo),
}

impl HoopSaver for Records {
    async fn save(&self, hoop: &Hoop) -> RepoResult<()> {
        match self {
            Records::File(repo) => repo.save(hoop).await,
            Records::Spreadsheet(repo) => repo.save(hoop).await,
        }
    }
}

/// Images always go to the data directory, records go wherever the config points.
#[derive(Clone)]
pub struct AppEngine {
    media: FileRepo,
    records: Records,
    notifier: Option<SmtpNotifier>,
}

impl AppEngine {
    #[instrument(skip_all, fields(record_store = ?config.record_store))]
    pub async fn from_config(config: &HoopsConfig) -> EngineResult<Self> {
        let media = FileRepo::init(&config.data_dir)
            .await
            .change_context(EngineError::DataDir)?;

        let records = match config.record_store {
            RecordStore::File => Records::File(media.clone()),
            RecordStore::Spreadsheet => Records::Spreadsheet(spreadsheet_repo(config).await?),
        };

        let notifier =
            SmtpNotifier::from_config(config).change_context(EngineError::Notifications)?;

        info!("engine ready");
        Ok(Self {
            media,
            records,
            notifier,
        })
    }
}

impl HoopEngine for AppEngine {
    type Records = Records;
    type Media = FileRepo;
    type Notifier = SmtpNotifier;

    fn records(&self) -> Self::Records {
        self.records.clone()
    }

    fn media(&self) -> Self::Media {
        self.media.clone()
    }

    fn notifier(&self) -> Option<Self::Notifier> {
        self.notifier.clone()
    }
}

/// Authorizes with the cached OAuth token and points at the configured worksheet.
pub async fn spreadsheet_repo(config: &HoopsConfig) -> EngineResult<SpreadsheetRepo> {
    debug!("reading OAuth token cache");
    let client = TokenCacheProvider::new(&config.oauth_token_cache_file)
        .authorized_client()
        .await
        .change_context(EngineError::Spreadsheet)?;

    Ok(
        SpreadsheetRepo::new(client, config.spreadsheet_key.as_str())
            .with_worksheet_index(config.worksheet_index),
    )
}
