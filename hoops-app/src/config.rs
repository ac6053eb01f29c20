use error_stack::{Report, ResultExt};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 8080;

pub type ConfigResult<T> = Result<T, Report<ConfigError>>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file")]
    Read,
    #[error("config file is not valid")]
    Parse,
    #[error("config is missing a required value")]
    Missing,
}

/// Where hoop records are saved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStore {
    #[default]
    File,
    Spreadsheet,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HoopsConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    pub email_sending_email: String,
    pub email_sending_username: String,
    pub email_sending_password: String,
    pub email_sending_host: String,
    pub notification_email: String,
    #[serde(rename = "OAuthClientId")]
    pub oauth_client_id: String,
    #[serde(rename = "OAuthClientSecret")]
    pub oauth_client_secret: String,
    #[serde(rename = "OAuthTokenCacheFile")]
    pub oauth_token_cache_file: PathBuf,
    pub spreadsheet_key: String,
    pub worksheet_index: usize,
    pub record_store: RecordStore,
    pub metrics_enabled: bool,
}

impl Default for HoopsConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_dir: PathBuf::new(),
            email_sending_email: String::new(),
            email_sending_username: String::new(),
            email_sending_password: String::new(),
            email_sending_host: String::new(),
            notification_email: String::new(),
            oauth_client_id: String::new(),
            oauth_client_secret: String::new(),
            oauth_token_cache_file: PathBuf::new(),
            spreadsheet_key: String::new(),
            worksheet_index: 0,
            record_store: RecordStore::File,
            metrics_enabled: true,
        }
    }
}

impl HoopsConfig {
    pub async fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read(path)
            .await
            .change_context(ConfigError::Read)
            .attach_with(|| path.display().to_string())?;

        Self::parse(&contents).attach_with(|| path.display().to_string())
    }

    pub fn parse(contents: &[u8]) -> ConfigResult<Self> {
        let config: Self = serde_json::from_slice(contents).change_context(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(Report::new(ConfigError::Missing).attach("DataDir"));
        }

        if self.record_store == RecordStore::Spreadsheet && self.spreadsheet_key.is_empty() {
            return Err(Report::new(ConfigError::Missing)
                .attach("SpreadsheetKey is required to save records to a spreadsheet"));
        }

        Ok(())
    }

    /// Notifications are only sent when every SMTP setting is present.
    pub fn email_enabled(&self) -> bool {
        !self.email_sending_username.is_empty()
            && !self.email_sending_password.is_empty()
            && !self.email_sending_host.is_empty()
    }
}
