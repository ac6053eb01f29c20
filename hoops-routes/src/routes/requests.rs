use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use hoops_core::intake::{FilePart, FormSubmission};
use utoipa::ToSchema;

const IMAGE_FIELD: &str = "image";

/// The form accepted when submitting a hoop. Fields that fail to parse are ignored.
#[derive(ToSchema)]
#[allow(dead_code)] // only describes the multipart body for the api docs
pub struct HoopForm {
    /// Free-form description of where the hoop is
    location: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    story: Option<String>,
    /// Whether the contributor may be contacted
    #[schema(rename = "contact-ok")]
    contact_ok: Option<bool>,
    email: Option<String>,
    phone: Option<String>,
    /// A photo of the hoop. Only `image/jpeg` and `image/png` are kept.
    #[schema(value_type = Option<String>, format = Binary)]
    image: Option<Vec<u8>>,
}

/// Collects the parts of a multipart body. The first `image` part is kept as the attachment,
/// every other named part is read as text.
pub async fn read_submission(mut multipart: Multipart) -> Result<FormSubmission, MultipartError> {
    let mut submission = FormSubmission::new();
    let mut has_file = false;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == IMAGE_FIELD {
            let content_type = field.content_type().map(str::to_owned);
            let contents = field.bytes().await?;
            if !has_file {
                submission.set_file(FilePart {
                    content_type,
                    contents,
                });
                has_file = true;
            }
        } else {
            let value = field.text().await?;
            submission.push_field(name, value);
        }
    }

    Ok(submission)
}
