use chrono::{DateTime, Utc};
use error_stack::{Report, ResultExt};
use reqwest::Url;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const SCOPE: &str = "https://spreadsheets.google.com/feeds https://docs.google.com/feeds";
const DEFAULT_REDIRECT_URL: &str = "http://apps.terrorware.com/hoops/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub type CredentialResult<T> = Result<T, Report<CredentialError>>;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("unable to get OAuth token, run the token-url admin command first")]
    MissingToken,
    #[error("cached OAuth token is not usable")]
    InvalidToken,
    #[error("failed to build http client")]
    Client,
}

/// Supplies an http client that already carries the credentials the feed service expects.
pub trait CredentialProvider: Send + Sync {
    fn authorized_client(&self) -> impl Future<Output = CredentialResult<reqwest::Client>> + Send;
}

/// Client id, secret and redirect for the installed OAuth application.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

impl OAuthClient {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: DEFAULT_REDIRECT_URL.to_owned(),
        }
    }

    /// Where a user grants access and receives the code to exchange for a token.
    pub fn authorization_url(&self) -> CredentialResult<Url> {
        Url::parse_with_params(
            AUTH_URL,
            [
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", SCOPE),
                ("access_type", "offline"),
            ],
        )
        .change_context(CredentialError::Client)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CachedToken {
    access_token: String,
    #[serde(default)]
    expiry: Option<DateTime<Utc>>,
}

/// Reads the access token from an OAuth token cache file. The token is never refreshed here.
#[derive(Debug, Clone)]
pub struct TokenCacheProvider {
    cache_file: PathBuf,
    timeout: Duration,
}

impl TokenCacheProvider {
    pub fn new(cache_file: impl Into<PathBuf>) -> Self {
        Self {
            cache_file: cache_file.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn load_token(&self) -> CredentialResult<CachedToken> {
        let contents = tokio::fs::read(&self.cache_file)
            .await
            .change_context(CredentialError::MissingToken)
            .attach_with(|| self.cache_file.display().to_string())?;

        let token: CachedToken =
            serde_json::from_slice(&contents).change_context(CredentialError::InvalidToken)?;

        if token.access_token.is_empty() {
            return Err(Report::new(CredentialError::InvalidToken).attach("access token is empty"));
        }

        Ok(token)
    }
}

impl CredentialProvider for TokenCacheProvider {
    #[instrument(skip_all, fields(cache_file = %self.cache_file.display()))]
    async fn authorized_client(&self) -> CredentialResult<reqwest::Client> {
        let token = self.load_token().await?;

        if let Some(expiry) = token.expiry.filter(|e| *e < Utc::now()) {
            warn!("cached OAuth token expired at {expiry}, requests may be rejected");
        }

        debug!("building authorized client");
        bearer_client(&token.access_token, self.timeout)
    }
}

pub fn bearer_client(access_token: &str, timeout: Duration) -> CredentialResult<reqwest::Client> {
    let mut value = HeaderValue::from_str(&format!("Bearer {access_token}"))
        .change_context(CredentialError::InvalidToken)?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .change_context(CredentialError::Client)
}
