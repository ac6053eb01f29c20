use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hoops_core::model::HoopAttributes;
use serde::Serialize;
use std::borrow::Cow;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HoopResponse {
    #[serde(skip)]
    status_code: StatusCode,
    #[serde(flatten)]
    hoop: HoopAttributes,
}

impl HoopResponse {
    pub fn ok(hoop: HoopAttributes) -> Self {
        Self {
            status_code: StatusCode::OK,
            hoop,
        }
    }
}

impl IntoResponse for HoopResponse {
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}

/// Plain text error responses.
#[derive(Debug)]
pub struct HoopError {
    status_code: StatusCode,
    message: Cow<'static, str>,
}

impl HoopError {
    pub fn not_multipart() -> Self {
        Self::bad_request("Request must be encoded as multipart/form-data")
    }

    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            status_code: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Keeps the status the multipart reader chose, 413 when the body limit was hit.
    pub fn unreadable_body(error: &MultipartError) -> Self {
        Self {
            status_code: error.status(),
            message: error.body_text().into(),
        }
    }
}

impl IntoResponse for HoopError {
    fn into_response(self) -> Response {
        (self.status_code, self.message).into_response()
    }
}
