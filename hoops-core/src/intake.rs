use crate::media::{MediaType, Upload};
use crate::model::Hoop;
use crate::result::HoopResult;
use bytes::Bytes;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// The form fields a hoop can be populated from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum HoopField {
    Location,
    Lat,
    Lng,
    Story,
    ContactOk,
    Email,
    Phone,
}

impl HoopField {
    pub const ALL: [HoopField; 7] = [
        HoopField::Location,
        HoopField::Lat,
        HoopField::Lng,
        HoopField::Story,
        HoopField::ContactOk,
        HoopField::Email,
        HoopField::Phone,
    ];

    pub fn form_name(self) -> &'static str {
        match self {
            HoopField::Location => "location",
            HoopField::Lat => "lat",
            HoopField::Lng => "lng",
            HoopField::Story => "story",
            HoopField::ContactOk => "contact-ok",
            HoopField::Email => "email",
            HoopField::Phone => "phone",
        }
    }

    pub fn from_form_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.form_name() == name)
    }
}

impl Hoop {
    /// Coerces `value` into the field's type and assigns it. A value that does not
    /// parse leaves the field untouched and returns `false`.
    pub fn set_field(&mut self, field: HoopField, value: &str) -> bool {
        let attrs = &mut self.attributes;
        match field {
            HoopField::Location => attrs.location = value.to_owned(),
            HoopField::Story => attrs.story = value.to_owned(),
            HoopField::Email => attrs.email = value.to_owned(),
            HoopField::Phone => attrs.phone = value.to_owned(),
            HoopField::Lat => match parse_coordinate(value) {
                Some(lat) => attrs.lat = lat,
                None => return false,
            },
            HoopField::Lng => match parse_coordinate(value) {
                Some(lng) => attrs.lng = lng,
                None => return false,
            },
            HoopField::ContactOk => match parse_bool(value) {
                Some(ok) => attrs.contact_ok = ok,
                None => return false,
            },
        }
        true
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

// non-finite values can't be written back out as JSON
fn parse_coordinate(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// A file part of a submission, before its content type has been checked.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub content_type: Option<String>,
    pub contents: Bytes,
}

/// Raw form input for a hoop, independent of how it was transported.
#[derive(Debug, Default, Clone)]
pub struct FormSubmission {
    fields: HashMap<String, String>,
    file: Option<FilePart>,
}

impl FormSubmission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a field value. Only the first value given for a name is kept.
    pub fn push_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.entry(name.into()).or_insert_with(|| value.into());
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_field(name, value);
        self
    }

    pub fn set_file(&mut self, file: FilePart) {
        self.file = Some(file);
    }

    pub fn with_file(mut self, content_type: Option<&str>, contents: impl Into<Bytes>) -> Self {
        self.set_file(FilePart {
            content_type: content_type.map(str::to_owned),
            contents: contents.into(),
        });
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Creates a new hoop and populates it from the submission.
pub fn intake(submission: FormSubmission) -> HoopResult<Hoop> {
    let mut hoop = Hoop::new()?;
    apply(&mut hoop, submission);
    Ok(hoop)
}

/// Populates `hoop` from the submission. Malformed values and unsupported
/// attachments are skipped, never reported.
#[instrument(skip_all, fields(hoop.id = %hoop.id()))]
pub fn apply(hoop: &mut Hoop, submission: FormSubmission) {
    for field in HoopField::ALL {
        let Some(value) = submission.field(field.form_name()) else {
            continue;
        };
        if !hoop.set_field(field, value) {
            debug!("ignoring malformed value for '{}'", field.form_name());
        }
    }

    if let Some(file) = submission.file {
        let media_type = file
            .content_type
            .as_deref()
            .map(MediaType::from_content_type);

        match media_type {
            Some(Ok(media_type)) => hoop.attach(Upload::new(media_type, file.contents)),
            Some(Err(e)) => debug!("dropping attachment: {e}"),
            None => debug!("dropping attachment without a content type"),
        }
    }
}
