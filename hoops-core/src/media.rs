use crate::result::UnsupportedMediaType;
use bytes::Bytes;
use error_stack::Report;
use std::fmt::{Display, Formatter};

/// Image formats accepted alongside a hoop submission.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MediaType {
    Png,
    Jpeg,
}

impl MediaType {
    /// Maps a declared content type onto a supported media type. Only the exact
    /// strings `image/png` and `image/jpeg` are accepted.
    pub fn from_content_type(content_type: &str) -> Result<Self, Report<UnsupportedMediaType>> {
        match content_type {
            "image/png" => Ok(Self::Png),
            "image/jpeg" => Ok(Self::Jpeg),
            _ => Err(Report::new(UnsupportedMediaType(content_type.to_owned()))),
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            MediaType::Png => "image/png",
            MediaType::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            MediaType::Png => ".png",
            MediaType::Jpeg => ".jpg",
        }
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.content_type())
    }
}

/// An image captured at intake that has not been handed to a media backend yet.
#[derive(Debug, Clone)]
pub struct Upload {
    media_type: MediaType,
    contents: Bytes,
}

impl Upload {
    pub fn new(media_type: MediaType, contents: impl Into<Bytes>) -> Self {
        Self {
            media_type,
            contents: contents.into(),
        }
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn contents(&self) -> &Bytes {
        &self.contents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("image/png", MediaType::Png, ".png")]
    #[case("image/jpeg", MediaType::Jpeg, ".jpg")]
    fn supported_types_map_to_extensions(
        #[case] content_type: &str,
        #[case] expected: MediaType,
        #[case] extension: &str,
    ) {
        let media_type = MediaType::from_content_type(content_type).unwrap();
        assert_eq!(expected, media_type);
        assert_eq!(extension, media_type.extension());
    }

    #[rstest]
    #[case("image/gif")]
    #[case("image/jpg")]
    #[case("IMAGE/PNG")]
    #[case("image/png; charset=x")]
    #[case("image/jpeg;q=1")]
    #[case(" image/png ")]
    #[case("application/octet-stream")]
    #[case("")]
    fn other_types_are_rejected(#[case] content_type: &str) {
        let err = MediaType::from_content_type(content_type).unwrap_err();
        assert_eq!(content_type, err.current_context().0);
    }
}
