use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ImageReferenceError {
    #[error("image reference is empty")]
    Empty,

    #[error("data uri is missing the payload separator")]
    MissingPayload,

    #[error("data uri does not declare base64 encoding")]
    NotBase64,

    #[error("data uri payload is not valid base64")]
    InvalidBase64,

    #[error("image url could not be parsed: {0}")]
    InvalidUrl(String),
}

//
// ─── IMAGE REFERENCE ───────────────────────────────────────────────────────────
//

/// Where a generated image lives: inline bytes or a fetchable URL.
///
/// Gateways return either a self-contained `data:` URI or a plain URL; the
/// consumer branches on the variant to decode inline or fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageReference {
    /// Raster bytes that were embedded base64-encoded in a `data:` URI.
    Inline { mime: String, bytes: Vec<u8> },
    /// Plain URL to fetch.
    Remote(Url),
}

impl ImageReference {
    /// Wraps already-decoded raster bytes as an inline reference.
    #[must_use]
    pub fn inline(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::Inline {
            mime: mime.into(),
            bytes,
        }
    }

    /// Parses a gateway-provided reference string.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty string, a malformed `data:` URI, or an
    /// unparseable URL.
    pub fn parse(raw: &str) -> Result<Self, ImageReferenceError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ImageReferenceError::Empty);
        }

        if let Some(rest) = raw.strip_prefix("data:") {
            let (header, payload) = rest
                .split_once(',')
                .ok_or(ImageReferenceError::MissingPayload)?;
            let mime = header
                .strip_suffix(";base64")
                .ok_or(ImageReferenceError::NotBase64)?;
            let bytes = STANDARD
                .decode(payload)
                .map_err(|_| ImageReferenceError::InvalidBase64)?;
            return Ok(Self::Inline {
                mime: mime.to_owned(),
                bytes,
            });
        }

        let url = Url::parse(raw).map_err(|err| ImageReferenceError::InvalidUrl(err.to_string()))?;
        Ok(Self::Remote(url))
    }

    #[must_use]
    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline { .. })
    }

    /// Mime type of an inline image; `None` for remote references.
    #[must_use]
    pub fn mime(&self) -> Option<&str> {
        match self {
            Self::Inline { mime, .. } => Some(mime),
            Self::Remote(_) => None,
        }
    }

    /// Decoded bytes of an inline image; `None` for remote references.
    #[must_use]
    pub fn inline_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Inline { bytes, .. } => Some(bytes),
            Self::Remote(_) => None,
        }
    }

    /// Byte size of an inline image, 0 for remote references.
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        match self {
            Self::Inline { bytes, .. } => bytes.len() as u64,
            Self::Remote(_) => 0,
        }
    }
}

impl fmt::Display for ImageReference {
    /// Renders back to the wire form (`data:` URI or plain URL).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline { mime, bytes } => {
                write!(f, "data:{mime};base64,{}", STANDARD.encode(bytes))
            }
            Self::Remote(url) => f.write_str(url.as_str()),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_data_uri_decodes_payload() {
        let reference = ImageReference::parse("data:image/png;base64,aGVsbG8=").unwrap();
        assert!(reference.is_inline());
        assert_eq!(reference.mime(), Some("image/png"));
        assert_eq!(reference.inline_bytes(), Some(b"hello".as_slice()));
        assert_eq!(reference.size_bytes(), 5);
    }

    #[test]
    fn parse_plain_url() {
        let reference = ImageReference::parse("https://example.org/img/42.png").unwrap();
        assert!(!reference.is_inline());
        assert_eq!(reference.mime(), None);
        assert_eq!(reference.to_string(), "https://example.org/img/42.png");
    }

    #[test]
    fn display_round_trips_data_uri() {
        let raw = "data:image/png;base64,aGVsbG8=";
        let reference = ImageReference::parse(raw).unwrap();
        assert_eq!(reference.to_string(), raw);
    }

    #[test]
    fn parse_rejects_malformed_references() {
        assert_eq!(
            ImageReference::parse("").unwrap_err(),
            ImageReferenceError::Empty
        );
        assert_eq!(
            ImageReference::parse("data:image/png;base64").unwrap_err(),
            ImageReferenceError::MissingPayload
        );
        assert_eq!(
            ImageReference::parse("data:image/png,plain").unwrap_err(),
            ImageReferenceError::NotBase64
        );
        assert_eq!(
            ImageReference::parse("data:image/png;base64,%%%").unwrap_err(),
            ImageReferenceError::InvalidBase64
        );
        assert!(matches!(
            ImageReference::parse("not a url").unwrap_err(),
            ImageReferenceError::InvalidUrl(_)
        ));
    }
}
