//! Transient per-screen state: the loading flag and what the screen shows.
//!
//! Results live here only while a screen is open; nothing is cached.

use crate::media::ImageSelection;
use crate::service::DogService;
use crate::transport::Transport;
use crate::types::{DogDetails, DogRecord, OperationResult, SearchMode};
use crate::validation::{
    parse_age, validate_age, validate_breed, validate_description, validate_dog_name,
    validate_search_query, ValidationError,
};

pub const NO_RESULTS_MESSAGE: &str = "No dogs found matching your search";

/// Sets the loading flag on creation and clears it on drop, so the flag is
/// released even if the guarded operation panics.
#[derive(Debug)]
pub struct LoadingGuard<'a> {
    flag: &'a mut bool,
}

impl<'a> LoadingGuard<'a> {
    pub fn new(flag: &'a mut bool) -> Self {
        *flag = true;
        Self { flag }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        *self.flag = false;
    }
}

#[derive(Debug, Default)]
pub struct ScreenState {
    loading: bool,
}

impl ScreenState {
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Run `op` with the loading flag held. Returns `None` without running
    /// anything if an operation is already in flight.
    pub fn run<R>(&mut self, op: impl FnOnce() -> R) -> Option<R> {
        if self.loading {
            return None;
        }
        let _guard = LoadingGuard::new(&mut self.loading);
        Some(op())
    }
}

/// What the search screen renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SearchView {
    #[default]
    Idle,
    Results(Vec<DogRecord>),
    /// The search succeeded and matched nothing.
    NoResults,
    Error(String),
}

impl SearchView {
    pub fn from_outcome(outcome: OperationResult<Vec<DogRecord>>) -> Self {
        match outcome {
            OperationResult::Success(dogs) if dogs.is_empty() => SearchView::NoResults,
            OperationResult::Success(dogs) => SearchView::Results(dogs),
            OperationResult::Failure { message } => SearchView::Error(message),
        }
    }

    /// Banner text, if the view shows one.
    pub fn message(&self) -> Option<&str> {
        match self {
            SearchView::NoResults => Some(NO_RESULTS_MESSAGE),
            SearchView::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn results(&self) -> &[DogRecord] {
        match self {
            SearchView::Results(dogs) => dogs,
            _ => &[],
        }
    }
}

#[derive(Debug, Default)]
pub struct SearchScreen {
    pub state: ScreenState,
    pub view: SearchView,
}

impl SearchScreen {
    /// Validate `query` and run a text search. A rejected query never
    /// reaches the service.
    pub fn search_text<T: Transport>(&mut self, service: &DogService<T>, query: &str, mode: SearchMode) {
        if let Err(err) = validate_search_query(query) {
            self.view = SearchView::Error(err.to_string());
            return;
        }
        if let Some(outcome) = self.state.run(|| service.search_by_text(query, mode)) {
            self.view = SearchView::from_outcome(outcome);
        }
    }

    pub fn search_image<T: Transport>(&mut self, service: &DogService<T>, selection: &ImageSelection) {
        let Some(image) = selection.single().or_else(|| selection.multiple().first()) else {
            self.view = SearchView::Error(ValidationError::NoImages.to_string());
            return;
        };
        let outcome = self
            .state
            .run(|| service.search_by_image(&image.uri, Some(&image.mime_type)));
        if let Some(outcome) = outcome {
            self.view = SearchView::from_outcome(outcome);
        }
    }

    pub fn list_all<T: Transport>(&mut self, service: &DogService<T>) {
        if let Some(outcome) = self.state.run(|| service.list_all_dogs()) {
            self.view = SearchView::from_outcome(outcome);
        }
    }
}

/// What the upload screen renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UploadView {
    #[default]
    Idle,
    Uploaded(String),
    Error(String),
}

/// The upload form as typed by the user.
#[derive(Debug, Default)]
pub struct UploadScreen {
    pub name: String,
    pub breed: String,
    /// Free text such as "3 years"; only the leading number is sent.
    pub age: String,
    pub description: String,
    pub selection: ImageSelection,
    pub state: ScreenState,
    pub view: UploadView,
}

impl UploadScreen {
    fn validate(&self) -> Result<DogDetails, ValidationError> {
        validate_dog_name(&self.name)?;
        validate_breed(&self.breed)?;
        validate_age(&self.age)?;
        validate_description(&self.description)?;
        if self.selection.is_empty() {
            return Err(ValidationError::NoImages);
        }

        let description = self.description.trim();
        Ok(DogDetails {
            name: self.name.trim().to_string(),
            breed: self.breed.trim().to_string(),
            age: parse_age(&self.age).and_then(|years| u32::try_from(years).ok()),
            description: (!description.is_empty()).then(|| description.to_string()),
        })
    }

    /// Validate the form and upload every selected image in one batch. On
    /// success the form is reset.
    pub fn submit<T: Transport>(&mut self, service: &DogService<T>) {
        let details = match self.validate() {
            Ok(details) => details,
            Err(err) => {
                self.view = UploadView::Error(err.to_string());
                return;
            }
        };

        let uris = self.selection.uris();
        let Some(outcome) = self.state.run(|| service.upload_photos(&uris, &details)) else {
            return;
        };
        match outcome {
            OperationResult::Success(receipt) => {
                self.reset();
                self.view = UploadView::Uploaded(receipt.message);
            }
            OperationResult::Failure { message } => self.view = UploadView::Error(message),
        }
    }

    pub fn reset(&mut self) {
        self.name.clear();
        self.breed.clear();
        self.age.clear();
        self.description.clear();
        self.selection.clear_all();
        self.view = UploadView::Idle;
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    use super::*;
    use crate::client::DogClient;
    use crate::error::ApiError;
    use crate::http::HttpResponse;
    use crate::media::PickedImage;
    use crate::transport::MockTransport;

    fn service(transport: MockTransport) -> DogService<MockTransport> {
        DogService::with_transport(DogClient::with_base_url("http://dogs.test"), transport)
    }

    #[test]
    fn loading_flag_clears_after_panic() {
        let mut state = ScreenState::default();
        let result = catch_unwind(AssertUnwindSafe(|| {
            state.run(|| panic!("request blew up"));
        }));
        assert!(result.is_err());
        assert!(!state.is_loading());
    }

    #[test]
    fn run_is_a_noop_while_loading() {
        let mut flag = true;
        let mut state = ScreenState { loading: true };
        assert_eq!(state.run(|| 1), None);
        assert!(state.is_loading());

        {
            let _guard = LoadingGuard::new(&mut flag);
        }
        assert!(!flag);
    }

    #[test]
    fn empty_success_renders_no_results() {
        let view = SearchView::from_outcome(OperationResult::Success(Vec::new()));
        assert_eq!(view, SearchView::NoResults);
        assert_eq!(view.message(), Some(NO_RESULTS_MESSAGE));

        let view = SearchView::from_outcome(OperationResult::failure("Search failed"));
        assert_eq!(view, SearchView::Error("Search failed".to_string()));
    }

    #[test]
    fn invalid_query_is_rejected_without_request() {
        let mut transport = MockTransport::new();
        transport.expect_execute().never();
        let service = service(transport);

        let mut screen = SearchScreen::default();
        screen.search_text(&service, "   ", SearchMode::Name);
        assert_eq!(screen.view, SearchView::Error("Please enter a search query".to_string()));
        assert!(!screen.state.is_loading());
    }

    #[test]
    fn failed_search_clears_loading() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .times(1)
            .returning(|_| Err(ApiError::Network("connection refused".to_string())));
        let service = service(transport);

        let mut screen = SearchScreen::default();
        screen.search_text(&service, "Rex", SearchMode::Name);
        assert_eq!(screen.view, SearchView::Error("connection refused".to_string()));
        assert!(!screen.state.is_loading());
    }

    #[test]
    fn image_search_needs_a_selection() {
        let mut transport = MockTransport::new();
        transport.expect_execute().never();
        let service = service(transport);

        let mut screen = SearchScreen::default();
        screen.search_image(&service, &ImageSelection::new());
        assert_eq!(screen.view.message(), Some("Please select at least one image"));
    }

    #[test]
    fn upload_form_validation_runs_first() {
        let mut transport = MockTransport::new();
        transport.expect_execute().never();
        let service = service(transport);

        let mut screen = UploadScreen {
            name: "Rex".to_string(),
            breed: "Lab".to_string(),
            ..UploadScreen::default()
        };
        screen.submit(&service);
        assert_eq!(
            screen.view,
            UploadView::Error("Please select at least one image".to_string())
        );

        screen.age = "ninety".to_string();
        screen.submit(&service);
        assert_eq!(screen.view, UploadView::Error("Age must be a valid number".to_string()));
    }

    #[test]
    fn successful_upload_resets_form() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rex.jpg");
        std::fs::write(&path, b"jpeg").unwrap();

        let mut transport = MockTransport::new();
        transport.expect_execute().times(1).returning(|req| {
            let body = String::from_utf8_lossy(req.body.as_deref().unwrap_or_default()).into_owned();
            assert!(body.contains("name=\"age\"\r\n\r\n3\r\n"));
            assert!(body.contains("name=\"name\"\r\n\r\nRex\r\n"));
            Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: r#"{"message":"stored"}"#.to_string(),
            })
        });
        let service = service(transport);

        let mut screen = UploadScreen {
            name: "  Rex ".to_string(),
            breed: "Lab".to_string(),
            age: "3 years".to_string(),
            ..UploadScreen::default()
        };
        screen.selection.add(
            vec![PickedImage {
                uri: path.to_string_lossy().into_owned(),
                name: "rex.jpg".to_string(),
                mime_type: "image/jpeg".to_string(),
                width: 1,
                height: 1,
                size_bytes: Some(4),
            }],
            true,
        );

        screen.submit(&service);
        assert_eq!(
            screen.view,
            UploadView::Uploaded("Successfully uploaded 1 image".to_string())
        );
        assert!(screen.name.is_empty());
        assert!(screen.selection.is_empty());
        assert!(!screen.state.is_loading());
    }
}
