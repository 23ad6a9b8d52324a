#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// One multipart upload received by the mock server.
#[derive(Debug, Clone)]
pub struct ReceivedUpload {
    pub kind: String,
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: usize,
}

/// One entity request received by the mock server.
#[derive(Debug, Clone)]
pub struct ReceivedWrite {
    pub method: &'static str,
    pub path: String,
    pub body: Value,
}

/// Everything the mock server saw, plus knobs to make it misbehave.
#[derive(Debug, Default)]
pub struct MockState {
    pub uploads: Vec<ReceivedUpload>,
    pub deletes: Vec<String>,
    pub writes: Vec<ReceivedWrite>,
    pub list_queries: Vec<Option<String>>,
    /// Upload category (e.g. `reference-image`) answered with a 413.
    pub reject_upload_kind: Option<String>,
    /// Delay before the upload endpoint reads the form.
    pub upload_delay: Option<Duration>,
    /// Delay before the delete endpoint answers.
    pub delete_delay: Option<Duration>,
    /// Answer deletes with a 500.
    pub fail_deletes: bool,
    /// Answer entity writes with a 400.
    pub fail_writes: bool,
}

type Shared = Arc<Mutex<MockState>>;

/// A mock of the admin app's storage and REST endpoints on an ephemeral port.
pub struct MockAdmin {
    pub base_url: String,
    pub state: Shared,
}

impl MockAdmin {
    pub async fn start() -> Self {
        Self::start_with(MockState::default()).await
    }

    pub async fn start_with(initial: MockState) -> Self {
        init_tracing();

        let state: Shared = Arc::new(Mutex::new(initial));
        let app = router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn uploads(&self) -> Vec<ReceivedUpload> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.state.lock().unwrap().deletes.clone()
    }

    pub fn writes(&self) -> Vec<ReceivedWrite> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn list_queries(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().list_queries.clone()
    }
}

/// A bare HTTP endpoint that answers every connection with a 500 whose
/// headers promise a body it never finishes sending. Returns its base URL.
pub async fn start_stalled_error_server() -> String {
    init_tracing();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 500 Internal Server Error\r\n\
                          Content-Type: application/json\r\n\
                          Content-Length: 100\r\n\r\n{\"err",
                    )
                    .await;
                let _ = socket.flush().await;
                tokio::time::sleep(Duration::from_secs(60)).await;
                drop(socket);
            });
        }
    });

    format!("http://{addr}")
}

/// Route test logs through the test harness. `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/upload/{kind}", post(upload))
        .route("/api/spaces/delete", post(delete_blob))
        .route(
            "/api/donation-projects",
            get(list_projects).post(create_entity),
        )
        .route(
            "/api/donation-projects/{id}",
            get(get_project)
                .put(update_entity)
                .patch(patch_entity)
                .delete(delete_entity),
        )
        .route("/api/convocatorias", post(create_entity))
        .route(
            "/api/convocatorias/{id}",
            axum::routing::put(update_entity).patch(patch_entity),
        )
        .route("/api/users/{id}", axum::routing::put(update_entity))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Storage handlers
// ---------------------------------------------------------------------------

async fn upload(
    State(state): State<Shared>,
    Path(kind): Path<String>,
    mut multipart: Multipart,
) -> Response {
    let (delay, rejected) = {
        let s = state.lock().unwrap();
        (s.upload_delay, s.reject_upload_kind.as_deref() == Some(kind.as_str()))
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    if rejected {
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(json!({ "error": "El archivo excede el tamaño permitido" })),
        )
            .into_response();
    }

    let mut received = None;
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap();
        received = Some(ReceivedUpload {
            kind: kind.clone(),
            field: name,
            file_name,
            content_type,
            size_bytes: bytes.len(),
        });
    }

    let Some(upload) = received else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "No file provided" })),
        )
            .into_response();
    };

    let url = format!("https://cdn.test/{}/{}", upload.kind, upload.file_name);
    let original_name = upload.file_name.clone();
    state.lock().unwrap().uploads.push(upload);

    Json(json!({ "url": url, "originalName": original_name })).into_response()
}

async fn delete_blob(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let (delay, fail) = {
        let s = state.lock().unwrap();
        (s.delete_delay, s.fail_deletes)
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    if fail {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Spaces unavailable" })),
        )
            .into_response();
    }

    let url = body["url"].as_str().unwrap_or_default().to_string();
    state.lock().unwrap().deletes.push(url);
    Json(json!({ "success": true })).into_response()
}

// ---------------------------------------------------------------------------
// Entity handlers
// ---------------------------------------------------------------------------

/// Numeric ids stay numbers on the wire; anything else is a string key.
fn id_value(id: &str) -> Value {
    id.parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(id.to_string()))
}

fn project(id: Value, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "goalAmount": 5000.0,
        "qrImageUrl": "https://cdn.test/qr-image/qr.png",
        "qrImageAlt": "QR",
        "isActive": true,
        "createdAt": "2025-03-01T12:00:00Z"
    })
}

async fn list_projects(State(state): State<Shared>, RawQuery(query): RawQuery) -> Json<Value> {
    state.lock().unwrap().list_queries.push(query);
    Json(json!({
        "projects": [
            project(json!(1), "Agua segura"),
            project(json!(2), "Huertos escolares")
        ],
        "pagination": { "page": 2, "limit": 2, "total": 5, "totalPages": 3 }
    }))
}

async fn get_project(Path(id): Path<String>) -> Response {
    if id == "404" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Proyecto no encontrado" })),
        )
            .into_response();
    }
    Json(json!({ "data": project(id_value(&id), "Agua segura") })).into_response()
}

fn record(state: &Shared, method: &'static str, path: String, body: &Value) -> Option<Response> {
    let mut s = state.lock().unwrap();
    s.writes.push(ReceivedWrite {
        method,
        path,
        body: body.clone(),
    });
    s.fail_writes.then(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "El título es obligatorio" })),
        )
            .into_response()
    })
}

async fn create_entity(
    State(state): State<Shared>,
    uri: axum::http::Uri,
    Json(body): Json<Value>,
) -> Response {
    if let Some(failure) = record(&state, "POST", uri.path().to_string(), &body) {
        return failure;
    }
    let mut created = body;
    created["id"] = json!(99);
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn update_entity(
    State(state): State<Shared>,
    Path(id): Path<String>,
    uri: axum::http::Uri,
    Json(body): Json<Value>,
) -> Response {
    if let Some(failure) = record(&state, "PUT", uri.path().to_string(), &body) {
        return failure;
    }
    let mut updated = body;
    updated["id"] = id_value(&id);
    Json(json!({ "data": updated })).into_response()
}

async fn patch_entity(
    State(state): State<Shared>,
    Path(id): Path<String>,
    uri: axum::http::Uri,
    Json(body): Json<Value>,
) -> Response {
    if let Some(failure) = record(&state, "PATCH", uri.path().to_string(), &body) {
        return failure;
    }
    let mut patched = json!({ "id": id_value(&id), "title": "Convocatoria de voluntariado" });
    if let (Some(target), Some(fields)) = (patched.as_object_mut(), body.as_object()) {
        target.extend(fields.clone());
    }
    Json(patched).into_response()
}

async fn delete_entity(State(state): State<Shared>, Path(id): Path<String>) -> StatusCode {
    state.lock().unwrap().writes.push(ReceivedWrite {
        method: "DELETE",
        path: format!("/api/donation-projects/{id}"),
        body: Value::Null,
    });
    StatusCode::NO_CONTENT
}
