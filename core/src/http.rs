//! Plain-data request descriptors for the document API.
//!
//! # Design
//! A [`Request`] describes one HTTP call as data: fully-resolved URL, method,
//! assembled headers, and a body that is either absent, a JSON value, or a
//! multipart upload form. The resource client builds these values without
//! touching the network; the transport layer consumes them and performs the
//! actual I/O. Keeping the descriptor as plain data makes endpoint, query,
//! and header assembly testable without a server.

use serde_json::Value;

/// HTTP method for a request. `GET` is the default when unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// Cookie policy forwarded to the transport.
///
/// `Omit` disables the transport's cookie store; `SameOrigin` and `Include`
/// enable it so session cookies set by the server are replayed on later
/// requests from the same client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Credentials {
    #[default]
    Omit,
    SameOrigin,
    Include,
}

/// A file to send as the `file` part of an upload form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Multipart body for the upload operation: the file itself plus the
/// document fields as JSON text, carried in the `_payload` form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadForm {
    pub file: FilePayload,
    pub document: String,
}

/// Request body.
///
/// A body is exactly one of these forms. JSON values are serialized to their
/// canonical text by the transport; multipart forms pass through unmodified
/// so the transport's boundary-aware content-type applies.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Body {
    #[default]
    None,
    Json(Value),
    Multipart(UploadForm),
}

impl Body {
    pub fn is_none(&self) -> bool {
        matches!(self, Body::None)
    }
}

/// One HTTP call described as plain data.
///
/// Built by [`Client::build_request`](crate::Client::build_request) and
/// executed by [`Transport::send`](crate::Transport::send). Headers are
/// already deduplicated: each name appears once, with the highest-precedence
/// value.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Body,
}
