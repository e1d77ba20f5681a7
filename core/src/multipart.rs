//! `multipart/form-data` encoding for image search and photo upload.
//!
//! # Design
//! The core never streams: a `Form` is assembled in memory and turned into a
//! single byte body, so the request stays plain data like every other
//! `HttpRequest`. Parts are written in insertion order, which lets repeated
//! fields (`images`) keep the caller's ordering.

use uuid::Uuid;

/// MIME type used when neither the caller nor the extension says otherwise.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

#[derive(Debug, Clone)]
enum Part {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

/// An in-memory multipart form.
#[derive(Debug, Clone)]
pub struct Form {
    boundary: String,
    parts: Vec<Part>,
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

impl Form {
    pub fn new() -> Self {
        Self::with_boundary(format!("----DogFormBoundary{}", Uuid::new_v4().simple()))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the request's `content-type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parts.push(Part::Text {
            name: name.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: Vec<u8>) -> Self {
        self.parts.push(Part::File {
            name: name.to_string(),
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            bytes,
        });
        self
    }

    /// Encode the form into a request body.
    pub fn into_body(self) -> Vec<u8> {
        let mut body = Vec::new();
        for part in self.parts {
            body.extend_from_slice(b"--");
            body.extend_from_slice(self.boundary.as_bytes());
            body.extend_from_slice(b"\r\n");
            match part {
                Part::Text { name, value } => {
                    let header = format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                        escape(&name)
                    );
                    body.extend_from_slice(header.as_bytes());
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File {
                    name,
                    file_name,
                    content_type,
                    bytes,
                } => {
                    let header = format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        escape(&name),
                        escape(&file_name),
                        content_type
                    );
                    body.extend_from_slice(header.as_bytes());
                    body.extend_from_slice(&bytes);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(b"--");
        body.extend_from_slice(self.boundary.as_bytes());
        body.extend_from_slice(b"--\r\n");
        body
    }
}

fn escape(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Last path segment of `uri`, ignoring any query string or fragment.
pub fn file_name_from_uri(uri: &str) -> Option<&str> {
    let end = uri.find(['?', '#']).unwrap_or(uri.len());
    uri[..end].rsplit('/').next().filter(|name| !name.is_empty())
}

/// Generated name for an image whose URI has no usable last segment.
pub fn fallback_file_name(prefix: &str) -> String {
    format!("{prefix}_{}.jpg", Uuid::new_v4().simple())
}

/// Resolve the MIME type of an image part.
///
/// A declared type is trusted only if it is an `image/*` type; otherwise the
/// extension decides, defaulting to JPEG.
pub fn infer_mime_type(file_name: &str, declared: Option<&str>) -> String {
    if let Some(declared) = declared.map(str::trim).filter(|d| d.starts_with("image/")) {
        return declared.to_string();
    }

    let lower = file_name.to_ascii_lowercase();
    let inferred = match lower.rsplit_once('.').map(|(_, ext)| ext) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => DEFAULT_IMAGE_MIME,
    };
    inferred.to_string()
}
