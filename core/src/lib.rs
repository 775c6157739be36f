//! Typed async client for a document-collection REST API.
//!
//! # Overview
//! Collections of records live at `/api/<collection>` on the server. This
//! crate hides URL construction, query-string encoding, bearer-token
//! injection, and HTTP error normalization behind typed operations: `find`,
//! `find_by_id`, `create`, `update`, `delete`, `count`, a multipart
//! `upload`, and the session operations `login`/`logout`/`me`.
//!
//! # Design
//! - Two layers: [`Client`] builds plain-data [`Request`] descriptors and
//!   [`Transport`] executes exactly one HTTP call per operation, with no
//!   retries, caching, or logging.
//! - [`Config`] is read-only after construction. The optional bearer-token
//!   getter/setter closures are the only mutable external coupling; the
//!   consistency of that token store is the caller's responsibility.
//! - Every operation is an independent `async fn` with one await at the
//!   network call; a clone of the client can be used concurrently.
//! - Failures keep their kind: a non-success status becomes
//!   [`Error::Api`] with the server's message and field errors, an
//!   unreachable server stays a transport-level [`Error::Network`].

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod query;
pub mod transport;
pub mod types;

pub use auth::AuthClient;
pub use client::{Client, Config, RequestArgs, TokenGetter, TokenSetter};
pub use error::{Error, FieldError};
pub use http::{Body, Credentials, FilePayload, Method, Request, UploadForm};
pub use query::{to_query_string, BaseParams, FindParams, Operator, Where};
pub use transport::Transport;
pub use types::{
    CountResponse, DocResponse, LoginResponse, MeResponse, MessageResponse, PaginatedDocs, User,
};
