use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
const PHOTO_ROOT: &str = "/data/photos";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub filename: String,
    pub path: String,
    pub photo_id: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dog {
    pub id: u64,
    pub name: String,
    pub breed: String,
    pub age: u32,
    pub description: String,
    pub images: Vec<Photo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_image: Option<Photo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_search_mode")]
    pub search_mode: String,
}

fn default_search_mode() -> String {
    "name".to_string()
}

#[derive(Default)]
pub struct Store {
    dogs: Vec<Dog>,
    /// Raw bytes of every stored photo, keyed by `photo_id`.
    photos: Vec<(u64, Vec<u8>)>,
    next_dog_id: u64,
    next_photo_id: u64,
}

pub type Db = Arc<RwLock<Store>>;

type ApiError = (StatusCode, Json<Value>);

fn detail(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "detail": message.into() })))
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/health", get(health))
        .route("/search", post(search))
        .route("/searchByImage", post(search_by_image))
        .route("/upload/photo", post(upload_photo))
        .route("/dogs", get(list_dogs))
        .route("/dogs/{id}", get(get_dog))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn results(message: String, dogs: Vec<Dog>) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": message,
        "count": dogs.len(),
        "results": dogs,
    }))
}

fn with_first_image(mut dog: Dog) -> Dog {
    dog.first_image = dog.images.first().cloned();
    dog
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn search(
    State(db): State<Db>,
    Json(input): Json<SearchRequest>,
) -> Result<Json<Value>, ApiError> {
    let query = input.query.trim();
    if query.is_empty() {
        return Err(detail(StatusCode::BAD_REQUEST, "Query must not be empty"));
    }

    let store = db.read().await;
    let found: Vec<Dog> = match input.search_mode.as_str() {
        "name" => {
            let needle = query.to_lowercase();
            store
                .dogs
                .iter()
                .filter(|dog| dog.name.to_lowercase().contains(&needle))
                .cloned()
                .collect()
        }
        "id" => {
            let id: u64 = query
                .parse()
                .map_err(|_| detail(StatusCode::UNPROCESSABLE_ENTITY, "id must be an integer"))?;
            store.dogs.iter().filter(|dog| dog.id == id).cloned().collect()
        }
        other => {
            return Err(detail(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("unknown search_mode {other:?}"),
            ))
        }
    };

    let found: Vec<Dog> = found.into_iter().map(with_first_image).collect();
    let mut body = results(format!("Found {} result(s)", found.len()), found);
    body["query"] = json!(query);
    body["search_column"] = json!(input.search_mode);
    Ok(body)
}

struct UploadedFile {
    field: String,
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct UploadForm {
    files: Vec<UploadedFile>,
    text: Vec<(String, String)>,
}

impl UploadForm {
    fn text(&self, name: &str) -> Option<&str> {
        self.text
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| detail(StatusCode::BAD_REQUEST, e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(filename) => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| detail(StatusCode::BAD_REQUEST, e.body_text()))?;
                if !content_type.starts_with("image/") {
                    return Err(detail(
                        StatusCode::BAD_REQUEST,
                        format!("Invalid file type for {filename}: {content_type:?}"),
                    ));
                }
                form.files.push(UploadedFile {
                    field: name,
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            None => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| detail(StatusCode::BAD_REQUEST, e.body_text()))?;
                form.text.push((name, value));
            }
        }
    }
    Ok(form)
}

async fn search_by_image(
    State(db): State<Db>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let form = read_form(multipart).await?;
    let image = form
        .files
        .iter()
        .find(|file| file.field == "image")
        .ok_or_else(|| detail(StatusCode::BAD_REQUEST, "No image provided"))?;
    tracing::debug!(filename = %image.filename, content_type = %image.content_type, "image search");

    let store = db.read().await;
    let matching: Vec<u64> = store
        .photos
        .iter()
        .filter(|(_, bytes)| *bytes == image.bytes)
        .map(|(photo_id, _)| *photo_id)
        .collect();
    let found: Vec<Dog> = store
        .dogs
        .iter()
        .filter(|dog| dog.images.iter().any(|p| matching.contains(&p.photo_id)))
        .cloned()
        .map(|dog| Dog {
            confidence: Some(1.0),
            ..with_first_image(dog)
        })
        .collect();

    Ok(results(format!("Found {} result(s)", found.len()), found))
}

async fn upload_photo(
    State(db): State<Db>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let form = read_form(multipart).await?;
    let images: Vec<&UploadedFile> = form.files.iter().filter(|f| f.field == "images").collect();
    if images.is_empty() {
        return Err(detail(StatusCode::BAD_REQUEST, "No images provided"));
    }

    let name = form.text("name").unwrap_or_default().trim().to_string();
    if name.is_empty() {
        return Err(detail(StatusCode::UNPROCESSABLE_ENTITY, "name is required"));
    }
    let breed = form.text("breed").unwrap_or_default().trim().to_string();
    let age: u32 = form
        .text("age")
        .unwrap_or("0")
        .trim()
        .parse()
        .map_err(|_| detail(StatusCode::UNPROCESSABLE_ENTITY, "age must be an integer"))?;
    let description = form.text("description").unwrap_or_default().to_string();

    let mut store = db.write().await;
    store.next_dog_id += 1;
    let dog_id = store.next_dog_id;

    let mut photos = Vec::with_capacity(images.len());
    for image in &images {
        store.next_photo_id += 1;
        let photo_id = store.next_photo_id;
        photos.push(Photo {
            filename: image.filename.clone(),
            path: format!("{PHOTO_ROOT}/{dog_id}/{}", image.filename),
            photo_id,
        });
        store.photos.push((photo_id, image.bytes.clone()));
    }

    let total_bytes: usize = images.iter().map(|image| image.bytes.len()).sum();
    let first = photos[0].clone();
    store.dogs.push(Dog {
        id: dog_id,
        name: name.clone(),
        breed: breed.clone(),
        age,
        description: description.clone(),
        images: photos,
        first_image: None,
        confidence: None,
    });
    tracing::info!(dog_id, count = images.len(), "stored photos");

    Ok(Json(json!({
        "message": format!("Uploaded {} photo(s) for {name}", images.len()),
        "filename": first.filename,
        "bytes": total_bytes,
        "path": first.path,
        "pet_info": {
            "name": name,
            "breed": breed,
            "age": age,
            "description": description,
        },
    })))
}

async fn list_dogs(State(db): State<Db>) -> Json<Value> {
    let store = db.read().await;
    let dogs: Vec<Dog> = store.dogs.iter().cloned().map(with_first_image).collect();
    results(format!("{} dog(s) registered", dogs.len()), dogs)
}

async fn get_dog(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Dog>, ApiError> {
    let id: u64 = id
        .parse()
        .map_err(|_| detail(StatusCode::NOT_FOUND, "Dog not found"))?;
    let store = db.read().await;
    store
        .dogs
        .iter()
        .find(|dog| dog.id == id)
        .cloned()
        .map(|dog| Json(with_first_image(dog)))
        .ok_or_else(|| detail(StatusCode::NOT_FOUND, "Dog not found"))
}
