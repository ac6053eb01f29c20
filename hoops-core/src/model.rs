use crate::media::Upload;
use crate::result::{HoopError, HoopResult};
use crate::{HoopMediaSaver, HoopSaver};
use chrono::{DateTime, Utc};
use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing::{debug, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash, Copy, Clone)]
#[repr(transparent)]
#[serde(transparent)]
#[schema(value_type = String)]
pub struct HoopId(Uuid);

impl HoopId {
    /// Builds a random (v4) id from the bytes the given source provides.
    pub fn generate<S: IdSource + ?Sized>(source: &S) -> HoopResult<Self> {
        let mut bytes = [0u8; 16];
        source.fill(&mut bytes).change_context(HoopError::Identity)?;
        Ok(Self(uuid::Builder::from_random_bytes(bytes).into_uuid()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Display for HoopId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("random source unavailable")]
pub struct IdSourceError;

pub trait IdSource {
    fn fill(&self, buf: &mut [u8; 16]) -> Result<(), Report<IdSourceError>>;
}

/// Operating system randomness.
#[derive(Debug, Default, Copy, Clone)]
pub struct OsRandom;

impl IdSource for OsRandom {
    fn fill(&self, buf: &mut [u8; 16]) -> Result<(), Report<IdSourceError>> {
        getrandom::fill(buf).map_err(|e| Report::new(IdSourceError).attach(e.to_string()))
    }
}

/// File name stem (and row key) for a saved hoop: the creation date as
/// `YYYYMMDD` followed by the id without dashes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn new(created: DateTime<Utc>, id: HoopId) -> Self {
        Self(format!("{}{}", created.format("%Y%m%d"), id.0.simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("'{0}' is not a valid storage key")]
pub struct InvalidStorageKey(String);

impl FromStr for StorageKey {
    type Err = InvalidStorageKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric()) {
            Ok(Self(s.to_owned()))
        } else {
            Err(InvalidStorageKey(s.to_owned()))
        }
    }
}

/// The persisted shape of a hoop.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct HoopAttributes {
    pub id: HoopId,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lng: f64,
    /// File name of the saved image. Empty when no image was saved.
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub story: String,
    #[serde(default)]
    pub contact_ok: bool,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub created: DateTime<Utc>,
}

impl HoopAttributes {
    fn new(id: HoopId, created: DateTime<Utc>) -> Self {
        Self {
            id,
            location: String::new(),
            lat: 0.0,
            lng: 0.0,
            image: String::new(),
            story: String::new(),
            contact_ok: false,
            email: String::new(),
            phone: String::new(),
            created,
        }
    }

    pub fn storage_key(&self) -> StorageKey {
        StorageKey::new(self.created, self.id)
    }
}

/// What happened to a pending upload during [`Hoop::save`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MediaOutcome {
    NoUpload,
    Saved,
    Failed,
}

/// A contributed hoop: its attributes plus an image waiting to be saved.
#[derive(Debug)]
pub struct Hoop {
    pub(crate) attributes: HoopAttributes,
    upload: Option<Upload>,
}

impl Hoop {
    pub fn new() -> HoopResult<Self> {
        Self::with_id_source(&OsRandom, Utc::now())
    }

    pub fn with_id_source<S: IdSource + ?Sized>(
        source: &S,
        created: DateTime<Utc>,
    ) -> HoopResult<Self> {
        let id = HoopId::generate(source)?;
        Ok(Self {
            attributes: HoopAttributes::new(id, created),
            upload: None,
        })
    }

    /// Wraps a previously saved record. There is never a pending upload.
    pub fn from_attributes(attributes: HoopAttributes) -> Self {
        Self {
            attributes,
            upload: None,
        }
    }

    pub fn id(&self) -> HoopId {
        self.attributes.id
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.attributes.created
    }

    pub fn image(&self) -> &str {
        &self.attributes.image
    }

    pub fn storage_key(&self) -> StorageKey {
        self.attributes.storage_key()
    }

    pub fn attributes(&self) -> &HoopAttributes {
        &self.attributes
    }

    pub fn into_attributes(self) -> HoopAttributes {
        self.attributes
    }

    pub fn attach(&mut self, upload: Upload) {
        self.upload = Some(upload);
    }

    pub fn pending_upload(&self) -> Option<&Upload> {
        self.upload.as_ref()
    }

    /// Saves the pending upload (if any) through `media`, then the record through `records`.
    ///
    /// A media failure leaves `Image` empty and does not stop the record from being saved.
    /// A record failure is returned.
    #[instrument(skip_all, name = "hoop#save", fields(hoop.id = %self.attributes.id))]
    pub async fn save<M, R>(&mut self, media: &M, records: &R) -> HoopResult<MediaOutcome>
    where
        M: HoopMediaSaver,
        R: HoopSaver,
    {
        let outcome = match self.upload.take() {
            None => MediaOutcome::NoUpload,
            Some(upload) => match media.save_media(self, &upload).await {
                Ok(filename) => {
                    debug!("saved {} image as {filename}", upload.media_type());
                    self.attributes.image = filename;
                    MediaOutcome::Saved
                }
                Err(e) => {
                    warn!("failed to save hoop image, saving without it: {e:?}");
                    MediaOutcome::Failed
                }
            },
        };

        records.save(self).await.change_context(HoopError::Save)?;

        Ok(outcome)
    }
}

impl Display for Hoop {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let a = &self.attributes;
        writeln!(f, "Id: {}", a.id)?;
        writeln!(f, "Location: {}", a.location)?;
        writeln!(f, "Lat: {}", a.lat)?;
        writeln!(f, "Lng: {}", a.lng)?;
        writeln!(f, "Image: {}", a.image)?;
        writeln!(f, "Story: {}", a.story)?;
        writeln!(f, "ContactOk: {}", a.contact_ok)?;
        writeln!(f, "Email: {}", a.email)?;
        writeln!(f, "Phone: {}", a.phone)?;
        writeln!(f, "Created: {}", a.created)
    }
}
