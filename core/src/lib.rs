//! Client core for the WhatTheDog dog-identification service.
//!
//! # Overview
//! Lets a host search dogs by text or photo, list and fetch them, and upload
//! new photos with metadata. `DogClient` builds `HttpRequest` values and
//! parses `HttpResponse` values without touching the network (host-does-IO
//! pattern); `DogService` pairs it with a `Transport` and turns every outcome
//! into an `OperationResult` for the UI.
//!
//! # Design
//! - `DogClient` is stateless: it holds only its `ApiConfig`.
//! - Each operation is split into `build_*` and `parse_*`, so the I/O
//!   boundary is explicit and the request shape is testable as data.
//! - Image uploads are encoded as in-memory multipart bodies.
//! - No error value crosses `DogService`; failures arrive as one
//!   user-facing message.

pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod http;
pub mod media;
pub mod multipart;
pub mod service;
pub mod transport;
pub mod types;
pub mod validation;
pub mod view;

pub use client::DogClient;
pub use config::{ApiConfig, ConfigError, Endpoints};
pub use error::{ApiError, Operation};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use media::{ImageFile, ImageSelection, PickedImage};
pub use service::DogService;
pub use transport::{Transport, UreqTransport};
pub use types::{
    DogDetails, DogId, DogImage, DogRecord, OperationResult, SearchMode, SearchResponse,
    UploadReceipt, UploadResponse,
};
pub use validation::ValidationError;
