use error_stack::{Report, ResultExt};
use feed::{DiscoveryError, Feed, LIST_FEED_REL, LinkRelations, POST_REL};
use hoops_core::HoopSaver;
use hoops_core::model::Hoop;
use hoops_core::result::{RepoError, RepoResult};
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub mod credentials;
pub mod feed;
pub mod row;

pub const DEFAULT_FEEDS_URL: &str = "https://spreadsheets.google.com/feeds";
const ATOM_CONTENT_TYPE: &str = "application/atom+xml";

type DiscoveryResult<T> = Result<T, Report<DiscoveryError>>;

/// Appends hoops as rows of one worksheet in a hosted spreadsheet.
///
/// The row-insertion url isn't known up front. It is found by reading the spreadsheet's
/// worksheets feed, following the chosen worksheet's list feed link, and taking the
/// post link of that list feed.
#[derive(Debug, Clone)]
pub struct SpreadsheetRepo {
    client: reqwest::Client,
    key: Arc<str>,
    feeds_url: Arc<str>,
    worksheet_index: usize,
}

impl SpreadsheetRepo {
    /// `client` must already be authorized, see [`credentials::CredentialProvider`].
    pub fn new(client: reqwest::Client, key: impl Into<Arc<str>>) -> Self {
        Self {
            client,
            key: key.into(),
            feeds_url: Arc::from(DEFAULT_FEEDS_URL),
            worksheet_index: 0,
        }
    }

    pub fn with_feeds_url(mut self, feeds_url: impl AsRef<str>) -> Self {
        self.feeds_url = Arc::from(feeds_url.as_ref().trim_end_matches('/'));
        self
    }

    pub fn with_worksheet_index(mut self, worksheet_index: usize) -> Self {
        self.worksheet_index = worksheet_index;
        self
    }

    pub fn worksheets_url(&self) -> String {
        format!("{}/worksheets/{}/private/full", self.feeds_url, self.key)
    }

    /// Follows the worksheets feed to the list feed, and returns the list feed's insertion url.
    #[instrument(skip(self), fields(key = %self.key, worksheet = self.worksheet_index))]
    pub async fn discover_post_url(&self) -> DiscoveryResult<String> {
        let worksheets = self.fetch_feed(&self.worksheets_url()).await?;

        let entry = worksheets
            .entries
            .get(self.worksheet_index)
            .ok_or_else(|| Report::new(DiscoveryError::MissingWorksheet(self.worksheet_index)))
            .attach_with(|| format!("worksheet count: {}", worksheets.entries.len()))?;

        let entry_links = LinkRelations::from(entry.links.as_slice());
        let list_feed_url = entry_links
            .resolve(LIST_FEED_REL)
            .attach_with(|| format!("worksheet links: {entry_links}"))?;
        debug!("found list feed {list_feed_url}");

        let list_feed = self.fetch_feed(list_feed_url).await?;
        let list_links = LinkRelations::from(list_feed.links.as_slice());
        let post_url = list_links
            .resolve(POST_REL)
            .attach_with(|| format!("list feed links: {list_links}"))?;
        debug!("found post url {post_url}");

        Ok(post_url.to_owned())
    }

    #[instrument(skip(self))]
    async fn fetch_feed(&self, url: &str) -> DiscoveryResult<Feed> {
        let body = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(discovery_error)
            .attach_with(|| url.to_owned())?
            .text()
            .await
            .change_context(DiscoveryError::Request)
            .attach_with(|| url.to_owned())?;

        Feed::parse(&body).attach_with(|| url.to_owned())
    }

    #[instrument(skip(self, entry))]
    async fn post_row(&self, url: &str, entry: String) -> DiscoveryResult<()> {
        self.client
            .post(url)
            .header(CONTENT_TYPE, ATOM_CONTENT_TYPE)
            .body(entry)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(discovery_error)
            .attach_with(|| url.to_owned())?;
        Ok(())
    }
}

fn discovery_error(e: reqwest::Error) -> Report<DiscoveryError> {
    let context = match e.status() {
        Some(status) => DiscoveryError::Status(status.as_u16()),
        None => DiscoveryError::Request,
    };
    Report::new(e).change_context(context)
}

impl HoopSaver for SpreadsheetRepo {
    #[instrument(skip_all, name = "spreadsheet#save", fields(hoop.id = %hoop.id()))]
    async fn save(&self, hoop: &Hoop) -> RepoResult<()> {
        let post_url = self
            .discover_post_url()
            .await
            .change_context(RepoError::Save)?;

        self.post_row(&post_url, row::row_entry(hoop.attributes()))
            .await
            .change_context(RepoError::Save)?;

        info!("added hoop row to spreadsheet");
        Ok(())
    }
}
