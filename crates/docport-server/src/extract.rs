//! Request extraction and boundary validation.
//!
//! Path ids and JSON bodies are turned into typed values here; anything
//! malformed becomes [`ApiError::Validation`] before a handler runs.

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use docport_store::{NewSection, SectionPatch};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ApiError;

/// Positive section number taken from the `{secno}` path segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Secno(pub(crate) i64);

/// Parse a path segment as a section number.
fn parse_secno(raw: &str) -> Result<i64, ApiError> {
    match raw.trim().parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ApiError::Validation("Invalid section number".to_owned())),
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Secno {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Validation("Invalid section number".to_owned()))?;
        parse_secno(&raw).map(Self)
    }
}

/// JSON body whose rejection is rendered as an API error.
pub(crate) struct ApiJson<T>(pub(crate) T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Accept an integer as a JSON number or numeric string. `null` and `""`
/// count as absent.
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| D::Error::custom("expected an integer")),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom("expected an integer")),
        Some(_) => Err(D::Error::custom("expected an integer")),
    }
}

/// Accept an optional string, rejecting any other JSON type.
fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(D::Error::custom("expected a string")),
    }
}

/// Body of `POST /docs`.
///
/// Fields are kept as loose JSON so each can be reported with its own
/// message.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CreateSectionRequest {
    name: Option<Value>,
    parent_secno: Option<Value>,
    display_order: Option<Value>,
    #[serde(deserialize_with = "optional_string")]
    metadescription: Option<String>,
    #[serde(deserialize_with = "optional_string")]
    metakeywords: Option<String>,
}

/// Read an optional integer field, reporting a malformed value as `message`.
fn int_field(value: Option<Value>, message: &str) -> Result<Option<i64>, ApiError> {
    lenient_int(value.unwrap_or(Value::Null)).map_err(|_: serde_json::Error| {
        ApiError::Validation(message.to_owned())
    })
}

impl CreateSectionRequest {
    pub(crate) fn into_new_section(self) -> Result<NewSection, ApiError> {
        let name = match self.name {
            None | Some(Value::Null) => {
                return Err(ApiError::Validation("Section name is required".to_owned()));
            }
            Some(Value::String(name)) => name,
            Some(_) => {
                return Err(ApiError::Validation(
                    "Section name must be a string".to_owned(),
                ));
            }
        };

        Ok(NewSection {
            name,
            parent_secno: int_field(
                self.parent_secno,
                "Parent section number must be an integer",
            )?,
            display_order: int_field(self.display_order, "Display order must be an integer")?,
            metadescription: self.metadescription,
            metakeywords: self.metakeywords,
        })
    }
}

/// Body of `PUT /docs/{secno}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct UpdateSectionRequest {
    #[serde(deserialize_with = "optional_string")]
    name: Option<String>,
    #[serde(deserialize_with = "optional_string")]
    content_path: Option<String>,
    display_order: Option<Value>,
    #[serde(deserialize_with = "optional_string")]
    metadescription: Option<String>,
    #[serde(deserialize_with = "optional_string")]
    metakeywords: Option<String>,
}

impl UpdateSectionRequest {
    pub(crate) fn into_patch(self) -> Result<SectionPatch, ApiError> {
        Ok(SectionPatch {
            name: self.name,
            content_path: self.content_path,
            display_order: int_field(self.display_order, "Display order must be an integer")?,
            metadescription: self.metadescription,
            metakeywords: self.metakeywords,
        })
    }
}

/// Body of `POST /docs/upload/doc-html`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct UploadRequest {
    #[serde(deserialize_with = "optional_string")]
    content: Option<String>,
    secno: Option<Value>,
}

impl UploadRequest {
    /// Section number and HTML body.
    pub(crate) fn into_parts(self) -> Result<(i64, String), ApiError> {
        let secno = int_field(self.secno, "Invalid section number")?
            .filter(|n| *n > 0)
            .ok_or_else(|| ApiError::Validation("Invalid section number".to_owned()))?;
        let content = self
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ApiError::Validation("Content is required".to_owned()))?;
        Ok((secno, content))
    }
}

/// Body of `POST /docs/{secno}/content`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ContentRequest {
    #[serde(deserialize_with = "optional_string")]
    pub(crate) content: Option<String>,
}
