//! Response envelopes returned by the document API.
//!
//! # Design
//! These types mirror the server's response shapes but are defined
//! independently of any server crate; the integration tests against the mock
//! server catch schema drift. Document shapes themselves stay generic: each
//! call names the concrete type it expects for `T`, and no validation beyond
//! JSON decoding is performed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Paginated result of a `find` operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedDocs<T> {
    pub docs: Vec<T>,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub limit: u32,
    #[serde(default)]
    pub next_page: Option<u32>,
    #[serde(default)]
    pub page: Option<u32>,
    pub paging_counter: u32,
    #[serde(default)]
    pub prev_page: Option<u32>,
    pub total_docs: u64,
    pub total_pages: u32,
}

/// `create`/`update`/`upload` result: a confirmation message plus the
/// affected document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocResponse<T> {
    pub message: String,
    pub doc: T,
}

/// `count` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountResponse {
    pub total_docs: u64,
}

/// Bare confirmation message (`logout`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// An authenticated account. Unknown fields the server attaches to the user
/// document are preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Successful `login` result. The token has already been handed to the
/// configured setter by the time the caller sees this value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse<U = User> {
    pub message: String,
    pub user: U,
    pub token: String,
    pub exp: i64,
}

/// `me` result. An absent `user` means no active session, which is a normal
/// success, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "U: Deserialize<'de>"))]
pub struct MeResponse<U = User> {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<U>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}
