use error_stack::Report;
use media::Upload;
use model::{Hoop, HoopAttributes, StorageKey};
use result::{NotifyError, RepoResult};
use tracing::{info, instrument};

pub mod intake;
pub mod media;
pub mod model;
pub mod result;

/// Loads a previously saved record.
pub trait HoopReader: Send + Sync {
    fn read(&self, key: &StorageKey) -> impl Future<Output = RepoResult<HoopAttributes>> + Send;
}

/// Persists a hoop's record, keyed by its storage key. Saving the same key again overwrites.
pub trait HoopSaver: Send + Sync {
    fn save(&self, hoop: &Hoop) -> impl Future<Output = RepoResult<()>> + Send;
}

/// Persists an uploaded image and returns the file name it was stored under.
/// The hoop is not modified, the caller assigns the returned name.
pub trait HoopMediaSaver: Send + Sync {
    fn save_media(
        &self,
        hoop: &Hoop,
        upload: &Upload,
    ) -> impl Future<Output = RepoResult<String>> + Send;
}

/// Tells someone a new hoop was added.
pub trait Notifier: Send + Sync + 'static {
    fn notify(
        &self,
        hoop: &HoopAttributes,
    ) -> impl Future<Output = Result<(), Report<NotifyError>>> + Send;
}

pub trait HoopEngine: Clone + Send + Sync + 'static {
    type Records: HoopSaver;
    type Media: HoopMediaSaver;
    type Notifier: Notifier + Clone;

    fn records(&self) -> Self::Records;

    fn media(&self) -> Self::Media;

    /// `None` when notifications are not configured.
    fn notifier(&self) -> Option<Self::Notifier>;
}

/// Reads the record saved under `key` from `source` and saves it again through `target`.
#[instrument(skip_all, fields(key = %key))]
pub async fn replicate<S, T>(source: &S, key: &StorageKey, target: &T) -> RepoResult<HoopAttributes>
where
    S: HoopReader,
    T: HoopSaver,
{
    let hoop = Hoop::from_attributes(source.read(key).await?);
    target.save(&hoop).await?;
    info!("replicated hoop {}", hoop.id());
    Ok(hoop.into_attributes())
}
