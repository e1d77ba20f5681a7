//! Domain DTOs for the dog service.
//!
//! # Design
//! These types mirror the backend's JSON but are defined independently of
//! the mock server; integration tests catch schema drift between the two.
//! `DogRecord` keeps the fields the client knows about and collects anything
//! else the server adds into `extra`, so unknown keys are neither rejected
//! nor silently lost.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Prefix the client puts in front of a stored image path to display it.
pub const FILE_URI_PREFIX: &str = "file://";

/// Canonical dog identifier.
///
/// The backend sends ids either as JSON integers or strings. Both decode to
/// the same decimal string, and the id always serializes as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DogId(String);

impl DogId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for DogId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for DogId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for DogId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DogId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DogIdVisitor;

        impl Visitor<'_> for DogIdVisitor {
            type Value = DogId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or integer dog id")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<DogId, E> {
                Ok(DogId(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<DogId, E> {
                Ok(DogId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<DogId, E> {
                Ok(DogId(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<DogId, E> {
                if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
                    Ok(DogId((v as i64).to_string()))
                } else {
                    Err(E::invalid_value(de::Unexpected::Float(v), &self))
                }
            }
        }

        deserializer.deserialize_any(DogIdVisitor)
    }
}

/// Which column a text search matches against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Name,
    Id,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Name => "name",
            SearchMode::Id => "id",
        }
    }
}

/// Body of `POST /search`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextSearchRequest {
    pub query: String,
    pub search_mode: SearchMode,
}

/// A stored photo of a dog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DogImage {
    #[serde(default, deserialize_with = "lenient_string")]
    pub filename: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub path: String,
    #[serde(
        default,
        deserialize_with = "lenient_u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub photo_id: Option<u64>,
}

impl DogImage {
    /// Local URI used to display the photo.
    pub fn display_uri(&self) -> String {
        format!("{FILE_URI_PREFIX}{}", self.path)
    }
}

/// A dog as returned by search, list and detail endpoints.
///
/// Only `id` is required. Every other known field decodes leniently: `null`,
/// a wrong scalar type or a float where an integer was expected degrade to
/// the field's empty value instead of failing the whole response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DogRecord {
    pub id: DogId,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub breed: String,
    #[serde(
        default,
        deserialize_with = "lenient_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub age: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_image",
        skip_serializing_if = "Option::is_none"
    )]
    pub first_image: Option<DogImage>,
    #[serde(
        default,
        deserialize_with = "lenient_images",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub images: Vec<DogImage>,
    #[serde(
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub confidence: Option<f64>,
    /// Server-added fields the client does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DogRecord {
    /// Photos to show for this dog: the full list when present, otherwise
    /// the single `first_image`.
    pub fn display_images(&self) -> Vec<&DogImage> {
        if !self.images.is_empty() {
            self.images.iter().collect()
        } else {
            self.first_image.iter().collect()
        }
    }
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(lenient_opt_string(d)?.unwrap_or_default())
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|v: &f64| v.is_finite()))
}

/// Non-negative whole part of a number or numeric string; fractions truncate.
fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    let value = Value::deserialize(d)?;
    if let Some(whole) = value.as_u64() {
        return Ok(Some(whole));
    }
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number
        .filter(|v| v.is_finite() && *v >= 0.0 && *v < u64::MAX as f64)
        .map(|v| v.trunc() as u64))
}

fn lenient_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    Ok(lenient_u64(d)?.and_then(|v| u32::try_from(v).ok()))
}

fn lenient_image<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DogImage>, D::Error> {
    Ok(DogImage::deserialize(Value::deserialize(d)?).ok())
}

/// Keeps the entries that decode as images and drops the rest.
fn lenient_images<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<DogImage>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| DogImage::deserialize(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Response of `/search`, `/searchByImage` and `/dogs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub results: Vec<DogRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_column: Option<String>,
}

/// Metadata sent alongside uploaded photos.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DogDetails {
    pub name: String,
    pub breed: String,
    pub age: Option<u32>,
    pub description: Option<String>,
}

/// Dog metadata echoed back by `/upload/photo`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PetInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub breed: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Raw response of `/upload/photo`. Every field is optional because the
/// batch endpoint is only required to answer with a 2xx status.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UploadResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub bytes: Option<u64>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub pet_info: Option<PetInfo>,
}

/// Outcome of a successful batch upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    /// Summary of how many images went up, e.g. "Successfully uploaded 2 images".
    pub message: String,
    pub image_count: usize,
    pub server: UploadResponse,
}

/// Success/failure sum type every `DogService` operation collapses to.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult<T> {
    Success(T),
    Failure { message: String },
}

impl<T> OperationResult<T> {
    pub fn failure(message: impl Into<String>) -> Self {
        OperationResult::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OperationResult::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    pub fn failure_message(&self) -> Option<&str> {
        match self {
            OperationResult::Success(_) => None,
            OperationResult::Failure { message } => Some(message),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> OperationResult<U> {
        match self {
            OperationResult::Success(data) => OperationResult::Success(f(data)),
            OperationResult::Failure { message } => OperationResult::Failure { message },
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            OperationResult::Success(data) => Ok(data),
            OperationResult::Failure { message } => Err(message),
        }
    }
}
