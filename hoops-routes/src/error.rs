use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use error_stack::Report;
use std::error::Error;

#[derive(Debug, thiserror::Error)]
pub enum HoopServiceError {
    #[error("failed to create hoop")]
    Create,
    #[error("failed to save hoop")]
    Save,
}

#[derive(thiserror::Error)]
#[error("there was an error running the endpoint")]
pub struct EndpointError<T: Error>(Report<T>);

impl<T: Error> std::fmt::Debug for EndpointError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl<T: Error> From<Report<T>> for EndpointError<T> {
    fn from(value: Report<T>) -> Self {
        Self(value)
    }
}

impl<T: Error> IntoResponse for EndpointError<T> {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, "Error saving hoop").into_response()
    }
}
