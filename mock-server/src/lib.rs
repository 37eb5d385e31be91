use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: Uuid,
    pub title: String,
}

#[derive(Deserialize)]
pub struct NewItem {
    pub title: String,
}

/// Summary of one part received by `/upload`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReceivedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub text: Option<String>,
    pub size: usize,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Item>>>;

/// Routes:
/// - `GET /items`, `POST /items` (200 with the created item)
/// - `GET|PUT|DELETE /items/{id}`
/// - `GET|POST|PUT /status/{code}` answers with that status
/// - `POST /upload` echoes a summary of the multipart parts
/// - `GET /blob/{size}` answers with `size` bytes of `b'x'`
pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/{id}", get(get_item).put(update_item).delete(delete_item))
        .route("/status/{code}", get(status).post(status).put(status))
        .route("/upload", post(upload))
        .route("/blob/{size}", get(blob))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_items(State(db): State<Db>) -> Json<Vec<Item>> {
    let items = db.read().await;
    Json(items.values().cloned().collect())
}

async fn create_item(State(db): State<Db>, Json(input): Json<NewItem>) -> Json<Item> {
    let item = Item {
        id: Uuid::new_v4(),
        title: input.title,
    };
    db.write().await.insert(item.id, item.clone());
    Json(item)
}

async fn get_item(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<Json<Item>, StatusCode> {
    let items = db.read().await;
    items.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_item(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<NewItem>,
) -> Result<Json<Item>, StatusCode> {
    let mut items = db.write().await;
    let item = items.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    item.title = input.title;
    Ok(Json(item.clone()))
}

async fn delete_item(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<Json<Item>, StatusCode> {
    let mut items = db.write().await;
    items.remove(&id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn status(Path(code): Path<u16>) -> (StatusCode, String) {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (status, format!("status {}", status.as_u16()))
}

async fn blob(Path(size): Path<usize>) -> Vec<u8> {
    vec![b'x'; size]
}

async fn upload(mut multipart: Multipart) -> Result<Json<Vec<ReceivedPart>>, StatusCode> {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|_| StatusCode::BAD_REQUEST)? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
        let text = if file_name.is_none() {
            Some(String::from_utf8_lossy(&data).into_owned())
        } else {
            None
        };
        parts.push(ReceivedPart {
            name,
            file_name,
            content_type,
            text,
            size: data.len(),
        });
    }
    tracing::debug!(parts = parts.len(), "received upload");
    Ok(Json(parts))
}
