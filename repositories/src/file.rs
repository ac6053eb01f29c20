use crate::{RepoInitErr, RepoInitResult};
use error_stack::{Report, ResultExt};
use hoops_core::media::Upload;
use hoops_core::model::{Hoop, HoopAttributes, StorageKey};
use hoops_core::result::{RepoError, RepoResult};
use hoops_core::{HoopMediaSaver, HoopReader, HoopSaver};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

const RECORD_EXTENSION: &str = "json";

/// Stores each hoop as `<key>.json` and its image as `<key>.<ext>` in a single directory.
#[derive(Debug, Clone)]
pub struct FileRepo {
    data_dir: Arc<PathBuf>,
}

impl FileRepo {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Arc::new(data_dir.into()),
        }
    }

    /// Same as [`FileRepo::new`], but creates the data directory if it doesn't exist yet.
    #[instrument(skip_all, fields(data_dir = %data_dir.as_ref().display()))]
    pub async fn init(data_dir: impl AsRef<Path>) -> RepoInitResult<Self> {
        let data_dir = data_dir.as_ref();
        if !fs::try_exists(data_dir).await.unwrap_or(false) {
            info!("data directory does not exist, creating it");
            fs::create_dir_all(data_dir)
                .await
                .change_context(RepoInitErr)
                .attach_with(|| data_dir.display().to_string())?;
        }
        Ok(Self::new(data_dir))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn record_path(&self, key: &StorageKey) -> PathBuf {
        let mut path = self.data_dir.join(key.as_str());
        path.set_extension(RECORD_EXTENSION);
        path
    }

    /// Reads a record file at an arbitrary path, not necessarily inside the data directory.
    pub async fn read_from_file(&self, path: &Path) -> RepoResult<HoopAttributes> {
        load_data(path).await.change_context(RepoError::Read)
    }
}

impl HoopReader for FileRepo {
    #[instrument(skip_all, name = "file#read", fields(key = %key))]
    async fn read(&self, key: &StorageKey) -> RepoResult<HoopAttributes> {
        self.read_from_file(&self.record_path(key)).await
    }
}

impl HoopSaver for FileRepo {
    #[instrument(skip_all, name = "file#save", fields(hoop.id = %hoop.id()))]
    async fn save(&self, hoop: &Hoop) -> RepoResult<()> {
        let path = self.record_path(&hoop.storage_key());
        save_data(&path, hoop.attributes())
            .await
            .change_context(RepoError::Save)
    }
}

impl HoopMediaSaver for FileRepo {
    #[instrument(skip_all, name = "file#save_media", fields(hoop.id = %hoop.id(), media_type = %upload.media_type()))]
    async fn save_media(&self, hoop: &Hoop, upload: &Upload) -> RepoResult<String> {
        let filename = format!("{}{}", hoop.storage_key(), upload.media_type().extension());
        let path = self.data_dir.join(&filename);

        debug!("writing {} bytes", upload.contents().len());
        fs::write(&path, upload.contents())
            .await
            .change_context(RepoError::SaveMedia)
            .attach_with(|| path.display().to_string())?;

        Ok(filename)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to open file for reading")]
    Io,
    #[error("failed to parse file contents as JSON")]
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("failed to open file for writing")]
    Io,
    #[error("failed to serialize data to JSON")]
    Json,
}

#[instrument(fields(data_type = std::any::type_name::<T>()))]
async fn load_data<T>(path: &Path) -> Result<T, Report<LoadError>>
where
    T: DeserializeOwned,
{
    debug!("loading data...");
    let contents = fs::read(path)
        .await
        .change_context(LoadError::Io)
        .attach_with(|| path.display().to_string())?;

    let data = serde_json::from_slice(&contents)
        .change_context(LoadError::Json)
        .attach_with(|| path.display().to_string())?;

    debug!("loading data complete");
    Ok(data)
}

#[instrument(skip(data), fields(data_type = std::any::type_name::<T>()))]
async fn save_data<T>(path: &Path, data: &T) -> Result<(), Report<SaveError>>
where
    T: Serialize,
{
    debug!("writing data...");
    let json = serde_json::to_vec(data).change_context(SaveError::Json)?;

    let mut options = fs::OpenOptions::new();
    options.create(true).truncate(true).write(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options
        .open(path)
        .await
        .change_context(SaveError::Io)
        .attach_with(|| path.display().to_string())?;

    file.write_all(&json)
        .await
        .change_context(SaveError::Io)
        .attach_with(|| path.display().to_string())?;
    // pending writes are not guaranteed to land if the file is dropped first
    file.flush()
        .await
        .change_context(SaveError::Io)
        .attach_with(|| path.display().to_string())?;

    debug!("writing data complete");
    Ok(())
}
