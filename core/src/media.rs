//! Local images: loading them for upload and tracking what the user picked.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ApiError;
use crate::multipart::{fallback_file_name, file_name_from_uri, infer_mime_type};
use crate::types::FILE_URI_PREFIX;

/// An image read into memory, ready to be attached to a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub uri: String,
    /// Type reported by whoever produced the image, if any.
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn from_bytes(uri: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            uri: uri.into(),
            mime_type: None,
            bytes,
        }
    }

    pub fn with_mime_type(mut self, mime_type: Option<&str>) -> Self {
        self.mime_type = mime_type.map(str::to_string);
        self
    }

    /// Read the file behind `uri`. Both plain paths and `file://` URIs work.
    pub fn load(uri: &str) -> Result<Self, ApiError> {
        let path = local_path(uri);
        let bytes = fs::read(&path).map_err(|source| ApiError::Io { path, source })?;
        Ok(Self::from_bytes(uri, bytes))
    }

    /// Part filename, or `None` when the URI ends without a segment.
    pub fn file_name(&self) -> Option<&str> {
        file_name_from_uri(&self.uri)
    }
}

/// Filesystem path for a local image URI.
pub fn local_path(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix(FILE_URI_PREFIX).unwrap_or(uri))
}

/// An image chosen by the user, with the metadata a picker reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedImage {
    pub uri: String,
    pub name: String,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub size_bytes: Option<u64>,
}

impl PickedImage {
    /// Inspect an image on disk: size from metadata, dimensions from the
    /// image header.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let io_err = |source| ApiError::Io {
            path: path.to_path_buf(),
            source,
        };

        let metadata = fs::metadata(path).map_err(io_err)?;
        let (width, height) = image::image_dimensions(path).map_err(|err| ApiError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, err),
        })?;

        let uri = path.to_string_lossy().into_owned();
        let name = file_name_from_uri(&uri)
            .map(str::to_string)
            .unwrap_or_else(|| fallback_file_name("image"));
        let mime_type = infer_mime_type(&name, None);

        Ok(Self {
            uri,
            name,
            mime_type,
            width,
            height,
            size_bytes: Some(metadata.len()),
        })
    }
}

/// Images currently selected on a screen.
///
/// A screen works either in single mode, where each pick replaces the
/// selection, or in multiple mode, where picks accumulate.
#[derive(Debug, Clone, Default)]
pub struct ImageSelection {
    single: Option<PickedImage>,
    multiple: Vec<PickedImage>,
    error: Option<String>,
}

impl ImageSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one pick. An empty `picked` means the user
    /// cancelled and leaves the selection untouched.
    pub fn add(&mut self, picked: Vec<PickedImage>, allow_multiple: bool) {
        self.error = None;
        let Some(first) = picked.first().cloned() else {
            return;
        };
        if allow_multiple {
            self.multiple.extend(picked);
            self.single = None;
        } else {
            self.single = Some(first);
            self.multiple.clear();
        }
    }

    /// Inspect `paths` and add them; the first unreadable file aborts the
    /// pick and is reported through [`ImageSelection::error`].
    pub fn pick_paths<P: AsRef<Path>>(&mut self, paths: &[P], allow_multiple: bool) {
        let picked: Result<Vec<PickedImage>, ApiError> =
            paths.iter().map(PickedImage::from_path).collect();
        match picked {
            Ok(picked) => self.add(picked, allow_multiple),
            Err(err) => {
                tracing::warn!(error = %err, "image pick failed");
                self.error = Some(err.to_string());
            }
        }
    }

    /// Drop the image at `index` from a multiple selection.
    pub fn remove(&mut self, index: usize) {
        if index < self.multiple.len() {
            self.multiple.remove(index);
        }
    }

    /// Clear the single selection and any error.
    pub fn clear(&mut self) {
        self.single = None;
        self.error = None;
    }

    pub fn clear_all(&mut self) {
        self.single = None;
        self.multiple.clear();
        self.error = None;
    }

    pub fn single(&self) -> Option<&PickedImage> {
        self.single.as_ref()
    }

    pub fn multiple(&self) -> &[PickedImage] {
        &self.multiple
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Everything selected, in pick order.
    pub fn images(&self) -> Vec<&PickedImage> {
        self.single.iter().chain(self.multiple.iter()).collect()
    }

    pub fn uris(&self) -> Vec<String> {
        self.images().into_iter().map(|img| img.uri.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.single.is_none() && self.multiple.is_empty()
    }
}
