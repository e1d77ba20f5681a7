//! Stateless HTTP request builder and response parser for the dog service.
//!
//! # Design
//! `DogClient` holds only its `ApiConfig` and carries no mutable state
//! between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. The caller executes the actual HTTP round-trip, keeping
//! the core deterministic and free of I/O.

use serde::de::DeserializeOwned;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::format::upload_summary;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::media::ImageFile;
use crate::multipart::{fallback_file_name, infer_mime_type, Form};
use crate::types::{
    DogDetails, DogId, DogRecord, SearchMode, SearchResponse, TextSearchRequest, UploadReceipt,
    UploadResponse,
};

/// Message of the local failure for an upload with no images.
pub const NO_IMAGES_MESSAGE: &str = "No images provided for upload";

/// Synchronous, stateless client for the dog service.
#[derive(Debug, Clone)]
pub struct DogClient {
    config: ApiConfig,
}

impl DogClient {
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }

    /// Client with default endpoints and timeout against `base_url`.
    pub fn with_base_url(base_url: &str) -> Self {
        Self::new(ApiConfig::new(base_url))
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.config.base_url)
    }

    fn get(&self, endpoint: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.url(endpoint),
            headers: vec![("accept".to_string(), "application/json".to_string())],
            body: None,
        }
    }

    fn post_form(&self, endpoint: &str, form: Form) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            url: self.url(endpoint),
            headers: vec![
                ("accept".to_string(), "application/json".to_string()),
                ("content-type".to_string(), form.content_type()),
            ],
            body: Some(form.into_body()),
        }
    }

    pub fn build_health(&self) -> HttpRequest {
        self.get(&self.config.endpoints.health)
    }

    /// `POST /search` with `{query, search_mode}`. The query is sent as
    /// given; rejecting blank queries is the caller's job.
    pub fn build_search_text(&self, query: &str, mode: SearchMode) -> Result<HttpRequest, ApiError> {
        let input = TextSearchRequest {
            query: query.to_string(),
            search_mode: mode,
        };
        let body = serde_json::to_vec(&input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.url(&self.config.endpoints.search_text),
            headers: vec![
                ("accept".to_string(), "application/json".to_string()),
                ("content-type".to_string(), "application/json".to_string()),
            ],
            body: Some(body),
        })
    }

    /// `POST /searchByImage` with a single `image` file part.
    pub fn build_search_image(&self, image: ImageFile) -> HttpRequest {
        let file_name = image
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| fallback_file_name("image"));
        let mime_type = infer_mime_type(&file_name, image.mime_type.as_deref());
        let form = Form::new().file("image", &file_name, &mime_type, image.bytes);
        self.post_form(&self.config.endpoints.search_image, form)
    }

    /// `POST /upload/photo` carrying every image under a repeated `images`
    /// field followed by the dog's details. One request for the whole batch.
    pub fn build_upload_photos(
        &self,
        images: Vec<ImageFile>,
        details: &DogDetails,
    ) -> Result<HttpRequest, ApiError> {
        if images.is_empty() {
            return Err(ApiError::EmptyInput(NO_IMAGES_MESSAGE));
        }

        let mut form = Form::new();
        for (index, image) in images.into_iter().enumerate() {
            let file_name = image
                .file_name()
                .map(str::to_string)
                .unwrap_or_else(|| fallback_file_name(&format!("dog_{index}")));
            let mime_type = infer_mime_type(&file_name, image.mime_type.as_deref());
            form = form.file("images", &file_name, &mime_type, image.bytes);
        }

        let form = form
            .text("name", details.name.as_str())
            .text("breed", details.breed.as_str())
            .text("age", details.age.unwrap_or(0).to_string())
            .text("description", details.description.clone().unwrap_or_default());

        Ok(self.post_form(&self.config.endpoints.upload_photo, form))
    }

    pub fn build_list_dogs(&self) -> HttpRequest {
        self.get(&self.config.endpoints.list_dogs)
    }

    pub fn build_get_dog(&self, id: &DogId) -> HttpRequest {
        let endpoint = format!(
            "{}/{}",
            self.config.endpoints.get_dog_by_id.trim_end_matches('/'),
            urlencoding::encode(id.as_str())
        );
        self.get(&endpoint)
    }

    /// Any 2xx means the backend is reachable.
    pub fn parse_health(&self, response: &HttpResponse) -> bool {
        response.is_success()
    }

    /// Parse a text or image search response. Zero results is a success.
    pub fn parse_search(&self, response: HttpResponse) -> Result<SearchResponse, ApiError> {
        check_status(&response)?;
        parse_json(&response)
    }

    pub fn parse_list_dogs(&self, response: HttpResponse) -> Result<Vec<DogRecord>, ApiError> {
        check_status(&response)?;
        parse_json::<SearchResponse>(&response).map(|listing| listing.results)
    }

    pub fn parse_get_dog(&self, response: HttpResponse) -> Result<DogRecord, ApiError> {
        check_status(&response)?;
        parse_json(&response)
    }

    /// Parse an upload response for a batch of `image_count` images.
    ///
    /// Only the status decides success; a body that is empty or not the
    /// documented shape still counts as an upload of the whole batch.
    pub fn parse_upload(
        &self,
        response: HttpResponse,
        image_count: usize,
    ) -> Result<UploadReceipt, ApiError> {
        check_status(&response)?;
        let server: UploadResponse = match serde_json::from_str(&response.body) {
            Ok(server) => server,
            Err(err) => {
                tracing::debug!(error = %err, "upload response body not understood");
                UploadResponse::default()
            }
        };
        Ok(UploadReceipt {
            message: upload_summary(image_count),
            image_count,
            server,
        })
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound {
            body: response.body.clone(),
        });
    }
    Err(ApiError::Server {
        status: response.status,
        body: response.body.clone(),
    })
}

fn parse_json<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Operation;

    fn client() -> DogClient {
        DogClient::with_base_url("http://localhost:8000")
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    fn body_text(req: &HttpRequest) -> String {
        String::from_utf8_lossy(req.body.as_deref().unwrap()).into_owned()
    }

    #[test]
    fn build_search_text_produces_correct_request() {
        let req = client().build_search_text("Rex", SearchMode::Name).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8000/search");
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"query": "Rex", "search_mode": "name"}));
    }

    #[test]
    fn build_search_text_sends_query_unmodified() {
        let req = client().build_search_text("  17 ", SearchMode::Id).unwrap();
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["query"], "  17 ");
        assert_eq!(body["search_mode"], "id");
    }

    #[test]
    fn build_search_image_uses_single_image_part() {
        let image = ImageFile::from_bytes("/tmp/dog.PNG", b"png".to_vec());
        let req = client().build_search_image(image);
        assert_eq!(req.url, "http://localhost:8000/searchByImage");
        let content_type = req.header("content-type").unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));

        let body = body_text(&req);
        assert_eq!(body.matches("Content-Disposition").count(), 1);
        assert!(body.contains("name=\"image\"; filename=\"dog.PNG\"\r\nContent-Type: image/png"));
    }

    #[test]
    fn build_search_image_keeps_declared_image_type() {
        let image = ImageFile::from_bytes("/tmp/dog.png", Vec::new()).with_mime_type(Some("image/heic"));
        let body = body_text(&client().build_search_image(image));
        assert!(body.contains("Content-Type: image/heic"));
    }

    #[test]
    fn build_search_image_generates_name_for_bare_uri() {
        let image = ImageFile::from_bytes("content://media/", Vec::new());
        let body = body_text(&client().build_search_image(image));
        assert!(body.contains("filename=\"image_"));
        assert!(body.contains("Content-Type: image/jpeg"));
    }

    #[test]
    fn build_upload_photos_rejects_empty_batch() {
        let err = client()
            .build_upload_photos(Vec::new(), &DogDetails::default())
            .unwrap_err();
        assert!(matches!(err, ApiError::EmptyInput(NO_IMAGES_MESSAGE)));
    }

    #[test]
    fn build_upload_photos_defaults_age_and_description() {
        let images = vec![
            ImageFile::from_bytes("a.jpg", b"A".to_vec()),
            ImageFile::from_bytes("b.jpg", b"B".to_vec()),
        ];
        let details = DogDetails {
            name: "Rex".to_string(),
            breed: "Lab".to_string(),
            ..DogDetails::default()
        };
        let req = client().build_upload_photos(images, &details).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8000/upload/photo");

        let body = body_text(&req);
        assert_eq!(body.matches("name=\"images\"").count(), 2);
        assert!(body.find("filename=\"a.jpg\"").unwrap() < body.find("filename=\"b.jpg\"").unwrap());
        assert!(body.contains("name=\"name\"\r\n\r\nRex\r\n"));
        assert!(body.contains("name=\"breed\"\r\n\r\nLab\r\n"));
        assert!(body.contains("name=\"age\"\r\n\r\n0\r\n"));
        assert!(body.contains("name=\"description\"\r\n\r\n\r\n"));
    }

    #[test]
    fn build_upload_photos_disambiguates_fallback_names_by_index() {
        let images = vec![
            ImageFile::from_bytes("content://picker/", Vec::new()),
            ImageFile::from_bytes("content://picker/", Vec::new()),
        ];
        let details = DogDetails {
            name: "Rex".to_string(),
            breed: "Lab".to_string(),
            age: Some(4),
            description: Some("Good boy".to_string()),
        };
        let body = body_text(&client().build_upload_photos(images, &details).unwrap());
        assert!(body.contains("filename=\"dog_0_"));
        assert!(body.contains("filename=\"dog_1_"));
        assert!(body.contains("name=\"age\"\r\n\r\n4\r\n"));
        assert!(body.contains("Good boy"));
    }

    #[test]
    fn build_get_dog_encodes_id_segment() {
        let req = client().build_get_dog(&DogId::new("a b/c"));
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8000/dogs/a%20b%2Fc");
        assert!(req.body.is_none());
    }

    #[test]
    fn build_list_and_health_requests() {
        assert_eq!(client().build_list_dogs().url, "http://localhost:8000/dogs");
        assert_eq!(client().build_health().url, "http://localhost:8000/health");
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = DogClient::with_base_url("http://localhost:8000/");
        assert_eq!(client.build_list_dogs().url, "http://localhost:8000/dogs");
    }

    #[test]
    fn parse_search_empty_results_is_success() {
        let parsed = client().parse_search(response(200, r#"{"results":[]}"#)).unwrap();
        assert!(parsed.results.is_empty());
    }

    #[test]
    fn parse_search_with_numeric_ids() {
        let parsed = client()
            .parse_search(response(
                200,
                r#"{"success":true,"message":"Found 1","results":[{"id":3,"name":"Rex","breed":"Lab","confidence":0.91}],"count":1}"#,
            ))
            .unwrap();
        assert_eq!(parsed.count, Some(1));
        assert_eq!(parsed.results[0].id, DogId::from(3));
        assert_eq!(parsed.results[0].confidence, Some(0.91));
    }

    #[test]
    fn parse_search_keeps_every_record_of_mixed_quality() {
        let parsed = client()
            .parse_search(response(
                200,
                r#"{"results":[
                    {"id":1,"name":"Rex","breed":"Lab","age":3},
                    {"id":2,"name":"Bo","breed":"Pug","age":2.5},
                    {"id":3.0,"breed":null}
                ]}"#,
            ))
            .unwrap();
        let ids: Vec<&str> = parsed.results.iter().map(|dog| dog.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
        assert_eq!(parsed.results[1].age, Some(2));
        assert_eq!(parsed.results[2].name, "");
        assert_eq!(parsed.results[2].breed, "");
    }

    #[test]
    fn parse_search_server_error() {
        let err = client().parse_search(response(500, "boom")).unwrap_err();
        assert!(matches!(err, ApiError::Server { status: 500, .. }));
    }

    #[test]
    fn parse_search_bad_json() {
        let err = client().parse_search(response(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn parse_get_dog_not_found() {
        let err = client().parse_get_dog(response(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
        assert_eq!(err.user_message(Operation::GetDog), "Dog not found");
    }

    #[test]
    fn parse_list_dogs_extracts_results() {
        let dogs = client()
            .parse_list_dogs(response(200, r#"{"results":[{"id":"x1","name":"Bo","breed":"Pug"}],"count":1}"#))
            .unwrap();
        assert_eq!(dogs.len(), 1);
        assert_eq!(dogs[0].name, "Bo");
    }

    #[test]
    fn parse_upload_summarizes_count() {
        let receipt = client()
            .parse_upload(
                response(200, r#"{"message":"ok","filename":"a.jpg","bytes":10,"path":"/p/a.jpg","pet_info":{"name":"Rex","breed":"Lab","age":0,"description":""}}"#),
                2,
            )
            .unwrap();
        assert_eq!(receipt.message, "Successfully uploaded 2 images");
        assert_eq!(receipt.server.filename.as_deref(), Some("a.jpg"));
        assert_eq!(receipt.server.pet_info.unwrap().name, "Rex");
    }

    #[test]
    fn parse_upload_accepts_empty_body() {
        let receipt = client().parse_upload(response(201, ""), 1).unwrap();
        assert_eq!(receipt.message, "Successfully uploaded 1 image");
        assert_eq!(receipt.server, UploadResponse::default());
    }

    #[test]
    fn parse_health_checks_status() {
        assert!(client().parse_health(&response(200, "{}")));
        assert!(!client().parse_health(&response(503, "")));
    }
}
