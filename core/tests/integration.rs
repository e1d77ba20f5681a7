//! Upload/search lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises every service
//! operation over real HTTP through `UreqTransport`. Validates that request
//! building, multipart encoding and response parsing agree with the server.

use std::fs;
use std::path::Path;
use std::time::Duration;

use dog_core::{ApiConfig, DogDetails, DogId, DogService, OperationResult, SearchMode};

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn write_file(dir: &Path, name: &str, contents: &[u8]) -> String {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn upload_search_lifecycle() {
    let base_url = start_server();
    let service = DogService::new(ApiConfig::new(&base_url).with_timeout(Duration::from_secs(5)));
    let dir = tempfile::tempdir().unwrap();

    // Step 1: the server is reachable.
    assert!(service.test_connection());

    // Step 2: list is empty.
    let dogs = service.list_all_dogs().into_result().unwrap();
    assert!(dogs.is_empty(), "expected empty list");

    // Step 3: searching an empty database succeeds with no results.
    let result = service.search_by_text("Rex", SearchMode::Name);
    assert_eq!(result, OperationResult::Success(Vec::new()));

    // Step 4: upload two photos in one batch.
    let front = write_file(dir.path(), "rex_front.jpg", b"front-bytes");
    let side = write_file(dir.path(), "rex_side.PNG", b"side-bytes");
    let details = DogDetails {
        name: "Rex".to_string(),
        breed: "Labrador".to_string(),
        age: None,
        description: None,
    };
    let receipt = service
        .upload_photos(&[front.clone(), format!("file://{side}")], &details)
        .into_result()
        .unwrap();
    assert_eq!(receipt.message, "Successfully uploaded 2 images");
    let pet_info = receipt.server.pet_info.unwrap();
    assert_eq!(pet_info.age, Some(0));
    assert_eq!(pet_info.description.as_deref(), Some(""));

    // Step 5: text search by name finds the dog, ids come back numeric.
    let found = service
        .search_by_text("rex", SearchMode::Name)
        .into_result()
        .unwrap();
    assert_eq!(found.len(), 1);
    let id = found[0].id.clone();
    assert_eq!(found[0].images.len(), 2);
    assert_eq!(found[0].images[1].filename, "rex_side.PNG");

    // Step 6: search by id with the canonical string id.
    let by_id = service
        .search_by_text(id.as_str(), SearchMode::Id)
        .into_result()
        .unwrap();
    assert_eq!(by_id[0].name, "Rex");

    // Step 7: image search with the same photo bytes.
    let probe = write_file(dir.path(), "probe.png", b"side-bytes");
    let matches = service
        .search_by_image(&probe, None)
        .into_result()
        .unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].confidence, Some(1.0));

    // Step 8: fetch the dog and build its display URIs.
    let dog = service.get_dog(&id).into_result().unwrap();
    let uris: Vec<String> = dog.display_images().iter().map(|img| img.display_uri()).collect();
    assert_eq!(uris.len(), 2);
    assert!(uris[0].starts_with("file:///data/photos/"));

    // Step 9: unknown dog surfaces the server's detail.
    let missing = service.get_dog(&DogId::from(9_999));
    assert_eq!(missing.failure_message(), Some("Dog not found"));
}

#[test]
fn server_detail_reaches_the_user() {
    let base_url = start_server();
    let service = DogService::new(ApiConfig::new(&base_url));

    let result = service.search_by_text("not-a-number", SearchMode::Id);
    assert_eq!(result.failure_message(), Some("id must be an integer"));
}

#[test]
fn unreachable_backend_is_a_failure_not_a_panic() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let service = DogService::new(
        ApiConfig::new(&format!("http://{addr}")).with_timeout(Duration::from_secs(2)),
    );
    assert!(!service.test_connection());

    let result = service.list_all_dogs();
    assert!(result.is_failure());
    assert!(!result.failure_message().unwrap().is_empty());
}
