//! In-memory document API used by the client's integration tests.
//!
//! Serves collections of JSON documents under `/api/{collection}` with the
//! same envelopes the production server uses: paginated `find`, `create`/
//! `update` doc envelopes, bare-document `findByID`/`delete`, `count`, a
//! multipart upload on the collection endpoint, and `users/login|logout|me`
//! with a fixed test account. Failure bodies carry `{ message, errors? }`.
//! `/api/echo` reflects request headers for wire-level assertions.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    body::to_bytes,
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Credentials accepted by `POST /api/users/login`.
pub const TEST_EMAIL: &str = "reader@example.com";
pub const TEST_PASSWORD: &str = "opensesame";
pub const TEST_USER_ID: &str = "64c1f7f3a9d4e8b2c5a1f0e9";

const MAX_BODY: usize = 8 * 1024 * 1024;

#[derive(Clone, Default)]
pub struct AppState {
    db: Arc<RwLock<HashMap<String, HashMap<String, Value>>>>,
    sessions: Arc<RwLock<HashSet<String>>>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
struct PageQuery {
    limit: Option<u32>,
    page: Option<u32>,
}

pub fn app() -> Router {
    let state = AppState::default();
    Router::new()
        .route("/api/users/login", post(login))
        .route("/api/users/logout", post(logout))
        .route("/api/users/me", get(me))
        .route("/api/echo", get(echo_headers))
        .route("/api/{collection}", get(find_docs).post(create_doc))
        .route("/api/{collection}/count", get(count_docs))
        .route(
            "/api/{collection}/{id}",
            get(get_doc).put(update_doc).delete(delete_doc),
        )
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Resource not found" })),
    )
        .into_response()
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "message": message,
            "errors": [{ "message": message }]
        })),
    )
        .into_response()
}

fn test_user() -> Value {
    json!({ "id": TEST_USER_ID, "email": TEST_EMAIL })
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

/// Echo the request headers back as `{ "headers": { name: value } }`, names
/// lowercased. Lets clients assert what actually went over the wire.
async fn echo_headers(headers: HeaderMap) -> Json<Value> {
    let mut echoed = serde_json::Map::new();
    for (name, value) in &headers {
        if let Ok(value) = value.to_str() {
            echoed.insert(name.as_str().to_string(), json!(value));
        }
    }
    Json(json!({ "headers": echoed }))
}

fn paginate(all: Vec<Value>, limit: u32, page: u32) -> Value {
    let total_docs = all.len() as u64;
    let limit = limit.max(1);
    let total_pages = (total_docs.div_ceil(limit as u64)).max(1) as u32;
    let page = page.clamp(1, total_pages);
    let start = ((page - 1) * limit) as usize;
    let docs: Vec<Value> = all.into_iter().skip(start).take(limit as usize).collect();
    let has_prev = page > 1;
    let has_next = page < total_pages;
    json!({
        "docs": docs,
        "hasNextPage": has_next,
        "hasPrevPage": has_prev,
        "limit": limit,
        "nextPage": if has_next { json!(page + 1) } else { Value::Null },
        "page": page,
        "pagingCounter": start as u64 + 1,
        "prevPage": if has_prev { json!(page - 1) } else { Value::Null },
        "totalDocs": total_docs,
        "totalPages": total_pages
    })
}

async fn find_docs(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(query): Query<PageQuery>,
) -> Json<Value> {
    let db = state.db.read().await;
    let mut docs: Vec<Value> = db
        .get(&collection)
        .map(|docs| docs.values().cloned().collect())
        .unwrap_or_default();
    docs.sort_by(|a, b| a["id"].as_str().cmp(&b["id"].as_str()));
    Json(paginate(docs, query.limit.unwrap_or(10), query.page.unwrap_or(1)))
}

async fn count_docs(State(state): State<AppState>, Path(collection): Path<String>) -> Json<Value> {
    let db = state.db.read().await;
    let total = db.get(&collection).map(HashMap::len).unwrap_or(0);
    Json(json!({ "totalDocs": total }))
}

/// Create handler for both encodings the client sends: a JSON document, or
/// a multipart upload carrying `file` and `_payload` fields.
async fn create_doc(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    request: Request,
) -> Response {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let mut doc = if is_multipart {
        match read_upload(request).await {
            Ok(doc) => doc,
            Err(response) => return response,
        }
    } else {
        let bytes = match to_bytes(request.into_body(), MAX_BODY).await {
            Ok(bytes) => bytes,
            Err(_) => return bad_request("Unreadable request body"),
        };
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(doc @ Value::Object(_)) => doc,
            _ => return bad_request("Request body must be a JSON object"),
        }
    };

    let id = Uuid::new_v4().to_string();
    doc["id"] = json!(id);
    state
        .db
        .write()
        .await
        .entry(collection)
        .or_default()
        .insert(id, doc.clone());
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Document created successfully.", "doc": doc })),
    )
        .into_response()
}

async fn read_upload(request: Request) -> Result<Value, Response> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|_| bad_request("Malformed multipart body"))?;

    let mut doc = json!({});
    let mut file_seen = false;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| bad_request("Malformed multipart body"))?
    {
        match field.name() {
            Some("_payload") => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| bad_request("Unreadable _payload field"))?;
                match serde_json::from_str::<Value>(&text) {
                    Ok(Value::Object(fields)) => {
                        for (key, value) in fields {
                            doc[key] = value;
                        }
                    }
                    _ => return Err(bad_request("_payload must be a JSON object")),
                }
            }
            Some("file") => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let mime = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| bad_request("Unreadable file field"))?;
                doc["filename"] = json!(name);
                doc["mimeType"] = json!(mime);
                doc["filesize"] = json!(data.len());
                file_seen = true;
            }
            _ => {}
        }
    }
    if !file_seen {
        return Err(bad_request("Uploads require a file field"));
    }
    Ok(doc)
}

async fn get_doc(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    let db = state.db.read().await;
    match db.get(&collection).and_then(|docs| docs.get(&id)) {
        Some(doc) => Json(doc.clone()).into_response(),
        None => not_found(),
    }
}

async fn update_doc(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(input): Json<Value>,
) -> Response {
    let Value::Object(input) = input else {
        return bad_request("Request body must be a JSON object");
    };
    let mut db = state.db.write().await;
    let Some(doc) = db.get_mut(&collection).and_then(|docs| docs.get_mut(&id)) else {
        return not_found();
    };
    if let Value::Object(fields) = doc {
        for (key, value) in input {
            if key != "id" {
                fields.insert(key, value);
            }
        }
    }
    Json(json!({ "message": "Updated successfully.", "doc": doc.clone() })).into_response()
}

async fn delete_doc(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    let mut db = state.db.write().await;
    match db.get_mut(&collection).and_then(|docs| docs.remove(&id)) {
        Some(doc) => Json(doc).into_response(),
        None => not_found(),
    }
}

async fn login(State(state): State<AppState>, Json(input): Json<LoginRequest>) -> Response {
    if input.email != TEST_EMAIL || input.password != TEST_PASSWORD {
        let message = "The email or password provided is incorrect.";
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "message": message,
                "errors": [{ "message": message }]
            })),
        )
            .into_response();
    }
    let token = Uuid::new_v4().simple().to_string();
    state.sessions.write().await.insert(token.clone());
    Json(json!({
        "message": "Auth Passed",
        "user": test_user(),
        "token": token,
        "exp": 4102444800u64
    }))
    .into_response()
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    if let Some(token) = bearer_token(&headers) {
        state.sessions.write().await.remove(&token);
    }
    Json(json!({ "message": "You have been logged out successfully." }))
}

async fn me(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    if let Some(token) = bearer_token(&headers) {
        if state.sessions.read().await.contains(&token) {
            return Json(json!({
                "user": test_user(),
                "token": token,
                "exp": 4102444800u64
            }));
        }
    }
    Json(json!({ "user": null }))
}
