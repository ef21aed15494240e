//! Response body decoding keyed off the declared content-type.
//!
//! Decoding precedence, applied to the media type essence (everything before
//! the first `;`):
//!
//! 1. `text/*` → [`Decoded::Text`]
//! 2. `application/json` → [`Decoded::Json`]
//! 3. `application/x-www-form-urlencoded` → [`Decoded::Form`]
//! 4. anything else, or no content-type at all → [`Decoded::Bytes`]
//!
//! Only the structured formats (2 and 3) can fail.

use std::borrow::Cow;
use std::collections::BTreeMap;

use bytes::Bytes;
use percent_encoding::percent_decode;
use serde::de::DeserializeOwned;

use crate::error::DecodingError;

/// `application/json` media type.
pub const APPLICATION_JSON: &str = "application/json";

/// `application/x-www-form-urlencoded` media type.
pub const APPLICATION_FORM: &str = "application/x-www-form-urlencoded";

/// Flat key-value mapping decoded from a form-urlencoded body.
pub type FormMap = BTreeMap<String, String>;

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// No body was decoded (`HEAD` requests).
    Empty,
    /// A `text/*` body.
    Text(String),
    /// An `application/json` body.
    Json(serde_json::Value),
    /// An `application/x-www-form-urlencoded` body.
    Form(FormMap),
    /// Any other body, untouched.
    Bytes(Bytes),
}

impl Decoded {
    /// Returns `true` for [`Decoded::Empty`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the text of a [`Decoded::Text`] body.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the mapping of a [`Decoded::Form`] body.
    #[must_use]
    pub const fn form(&self) -> Option<&FormMap> {
        match self {
            Self::Form(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the raw buffer of a [`Decoded::Bytes`] body.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Deserializes a [`Decoded::Json`] body into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodingError`] if the body is not JSON or does not have
    /// the shape of `T`.
    pub fn json<T: DeserializeOwned>(self) -> Result<T, DecodingError> {
        match self {
            Self::Json(value) => Ok(serde_json::from_value(value)?),
            other => Err(DecodingError::new(format!(
                "expected a JSON body, got {}",
                other.kind()
            ))),
        }
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "no body",
            Self::Text(_) => "a text body",
            Self::Json(_) => "a JSON body",
            Self::Form(_) => "a form body",
            Self::Bytes(_) => "a binary body",
        }
    }
}

/// Extracts the media type essence from a `Content-Type` header value.
///
/// Parameters after `;` are dropped and surrounding whitespace trimmed.
#[must_use]
pub fn media_type(content_type: &str) -> &str {
    content_type
        .split_once(';')
        .map_or(content_type, |(essence, _)| essence)
        .trim()
}

/// Decodes `body` according to `content_type`.
///
/// # Errors
///
/// Returns [`DecodingError`] when a JSON or form-urlencoded body is malformed.
pub fn decode_body(content_type: Option<&str>, body: Bytes) -> Result<Decoded, DecodingError> {
    let Some(essence) = content_type.map(media_type) else {
        return Ok(Decoded::Bytes(body));
    };
    if essence.starts_with("text/") {
        return Ok(Decoded::Text(String::from_utf8_lossy(&body).into_owned()));
    }
    match essence {
        APPLICATION_JSON => Ok(Decoded::Json(serde_json::from_slice(&body)?)),
        APPLICATION_FORM => parse_form(&body).map(Decoded::Form),
        _ => Ok(Decoded::Bytes(body)),
    }
}

/// Parses a form-urlencoded body into a flat mapping.
///
/// A leading `?` is ignored, empty segments are skipped and a key without `=`
/// maps to an empty string. The mapping is flat: when a key repeats, only its
/// last value is kept and earlier values are lost.
///
/// # Errors
///
/// Returns [`DecodingError`] if a key or value does not percent-decode to
/// valid UTF-8.
pub fn parse_form(body: &[u8]) -> Result<FormMap, DecodingError> {
    let body = body.strip_prefix(b"?").unwrap_or(body);
    let mut map = FormMap::new();
    for pair in body.split(|&b| b == b'&').filter(|pair| !pair.is_empty()) {
        let (key, value) = match pair.iter().position(|&b| b == b'=') {
            Some(idx) => (&pair[..idx], &pair[idx + 1..]),
            None => (pair, &[][..]),
        };
        map.insert(decode_component(key)?, decode_component(value)?);
    }
    Ok(map)
}

fn decode_component(raw: &[u8]) -> Result<String, DecodingError> {
    let plus_as_space: Cow<'_, [u8]> = if raw.contains(&b'+') {
        Cow::Owned(
            raw.iter()
                .map(|&b| if b == b'+' { b' ' } else { b })
                .collect(),
        )
    } else {
        Cow::Borrowed(raw)
    };
    percent_decode(&plus_as_space)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|e| DecodingError::new(format!("invalid form-urlencoded component: {e}")))
}
