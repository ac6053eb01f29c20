use error_stack::Report;

pub type HoopResult<T> = Result<T, Report<HoopError>>;
pub type RepoResult<T> = Result<T, Report<RepoError>>;

#[derive(Debug, thiserror::Error)]
pub enum HoopError {
    #[error("failed to generate hoop identity")]
    Identity,
    #[error("failed to save hoop")]
    Save,
}

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("failed to read hoop")]
    Read,
    #[error("failed to save hoop")]
    Save,
    #[error("failed to save hoop media")]
    SaveMedia,
}

#[derive(Debug, thiserror::Error)]
#[error("unsupported media type '{0}'")]
pub struct UnsupportedMediaType(pub String);

#[derive(Debug, thiserror::Error)]
#[error("failed to send hoop notification")]
pub struct NotifyError;
