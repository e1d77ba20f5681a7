//! `DogService`: the client boundary the UI talks to.
//!
//! # Design
//! Combines a `DogClient` with a `Transport` and collapses every outcome into
//! an `OperationResult`. Nothing crosses this boundary as an error value:
//! build, transport and parse failures all become `Failure { message }`
//! through [`ApiError::user_message`]. Each call is a single request with no
//! retry; a re-press of the UI action is the retry.

use crate::client::{DogClient, NO_IMAGES_MESSAGE};
use crate::config::ApiConfig;
use crate::error::{ApiError, Operation};
use crate::http::{HttpRequest, HttpResponse};
use crate::media::ImageFile;
use crate::transport::{Transport, UreqTransport};
use crate::types::{DogDetails, DogId, DogRecord, OperationResult, SearchMode, UploadReceipt};

/// Explicitly constructed client handle; pass it by reference to whatever
/// needs to talk to the backend.
#[derive(Debug, Clone)]
pub struct DogService<T = UreqTransport> {
    client: DogClient,
    transport: T,
}

impl DogService<UreqTransport> {
    pub fn new(config: ApiConfig) -> Self {
        let transport = UreqTransport::new(config.timeout);
        Self {
            client: DogClient::new(config),
            transport,
        }
    }
}

impl<T: Transport> DogService<T> {
    pub fn with_transport(client: DogClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &DogClient {
        &self.client
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        tracing::debug!(method = %request.method, url = %request.url, "api request");
        match self.transport.execute(&request) {
            Ok(response) => {
                if response.is_success() {
                    tracing::debug!(status = response.status, url = %request.url, "api response");
                } else {
                    tracing::warn!(
                        status = response.status,
                        url = %request.url,
                        body = %response.body,
                        "api error response"
                    );
                }
                Ok(response)
            }
            Err(err) => {
                tracing::warn!(url = %request.url, error = %err, "no response received");
                Err(err)
            }
        }
    }

    fn settle<R>(&self, op: Operation, result: Result<R, ApiError>) -> OperationResult<R> {
        match result {
            Ok(data) => OperationResult::Success(data),
            Err(err) => {
                let message = err.user_message(op);
                tracing::warn!(operation = %op, error = %err, message = %message, "operation failed");
                OperationResult::Failure { message }
            }
        }
    }

    /// Connectivity probe against `/health`.
    pub fn test_connection(&self) -> bool {
        tracing::info!(base_url = %self.client.config().base_url, "testing connection");
        let reachable = self
            .send(self.client.build_health())
            .map(|response| self.client.parse_health(&response))
            .unwrap_or(false);
        tracing::info!(reachable, "connection test finished");
        reachable
    }

    /// Search by name or id. An empty list is a successful search with no
    /// matches, not a failure.
    pub fn search_by_text(&self, query: &str, mode: SearchMode) -> OperationResult<Vec<DogRecord>> {
        let result = self
            .client
            .build_search_text(query, mode)
            .and_then(|request| self.send(request))
            .and_then(|response| self.client.parse_search(response))
            .map(|found| found.results);
        self.settle(Operation::SearchText, result)
    }

    /// Search with the photo at `image_uri`. `mime_type` is trusted only
    /// when it is an `image/*` type; otherwise the extension decides.
    pub fn search_by_image(
        &self,
        image_uri: &str,
        mime_type: Option<&str>,
    ) -> OperationResult<Vec<DogRecord>> {
        let result = ImageFile::load(image_uri)
            .map(|image| self.client.build_search_image(image.with_mime_type(mime_type)))
            .and_then(|request| self.send(request))
            .and_then(|response| self.client.parse_search(response))
            .map(|found| found.results);
        self.settle(Operation::SearchImage, result)
    }

    /// Upload every image in one request. Fails locally, without touching
    /// the network, when `image_uris` is empty or a file cannot be read.
    pub fn upload_photos<S: AsRef<str>>(
        &self,
        image_uris: &[S],
        details: &DogDetails,
    ) -> OperationResult<UploadReceipt> {
        if image_uris.is_empty() {
            return self.settle(Operation::Upload, Err(ApiError::EmptyInput(NO_IMAGES_MESSAGE)));
        }

        tracing::info!(count = image_uris.len(), name = %details.name, "uploading batch");
        let image_count = image_uris.len();
        let result = image_uris
            .iter()
            .map(|uri| ImageFile::load(uri.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .and_then(|images| self.client.build_upload_photos(images, details))
            .and_then(|request| self.send(request))
            .and_then(|response| self.client.parse_upload(response, image_count));
        self.settle(Operation::Upload, result)
    }

    pub fn list_all_dogs(&self) -> OperationResult<Vec<DogRecord>> {
        let result = self
            .send(self.client.build_list_dogs())
            .and_then(|response| self.client.parse_list_dogs(response));
        self.settle(Operation::ListDogs, result)
    }

    pub fn get_dog(&self, id: &DogId) -> OperationResult<DogRecord> {
        let result = self
            .send(self.client.build_get_dog(id))
            .and_then(|response| self.client.parse_get_dog(response));
        self.settle(Operation::GetDog, result)
    }
}
