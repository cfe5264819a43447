use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MediaRefError {
    #[error("media reference cannot be empty")]
    Empty,

    #[error("media reference is not a valid URL: {0}")]
    InvalidUrl(String),
}

/// Location of a lecture's video or audio asset.
///
/// Deserialising goes through `parse`, so blank or relative references are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MediaRef(Url);

impl MediaRef {
    /// Parse a media reference from a URL string.
    ///
    /// # Errors
    ///
    /// Returns `MediaRefError::Empty` for blank input and
    /// `MediaRefError::InvalidUrl` when the value does not parse as an absolute URL.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, MediaRefError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(MediaRefError::Empty);
        }
        Url::parse(trimmed)
            .map(Self)
            .map_err(|_| MediaRefError::InvalidUrl(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for MediaRef {
    type Error = MediaRefError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}

impl From<MediaRef> for String {
    fn from(media: MediaRef) -> Self {
        media.as_str().to_owned()
    }
}
