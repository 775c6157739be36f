//! Resource client: translates logical operations into transport calls.
//!
//! # Design
//! `Client` owns an immutable [`Config`] and a [`Transport`]. Each operation
//! maps to one endpoint under `/api/`, one method, an optional query string,
//! and an optional body; the mapping lives in small `*_args` builders so the
//! produced descriptors can be asserted without a server. Header assembly
//! follows a fixed precedence, later wins: `Accept: application/json`
//! (transport default) < client default headers < `Content-Type:
//! application/json` for JSON bodies < `Authorization: Bearer <token>` when
//! the token getter yields one < per-call overrides. Upload bodies never get
//! a content-type override; the multipart boundary dictates it.
//!
//! Errors from the transport propagate unchanged.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::http::{Body, Credentials, FilePayload, Method, Request, UploadForm};
use crate::query::{self, BaseParams, FindParams};
use crate::transport::Transport;
use crate::types::{CountResponse, DocResponse, PaginatedDocs};

/// Zero-argument reader for the current bearer token. `None` means no token,
/// in which case no `Authorization` header is sent.
pub type TokenGetter = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Writer invoked by the authentication extension: `Some(token)` after a
/// successful login, `None` to clear after logout.
pub type TokenSetter = Arc<dyn Fn(Option<&str>) + Send + Sync>;

/// Client configuration. Read on every request, never mutated after
/// construction; the token getter/setter are the only mutable external
/// coupling, and they are owned by the caller's token store.
#[derive(Clone, Default)]
pub struct Config {
    /// Server origin, without the `/api` suffix. Defaults to empty.
    pub base_url: String,
    /// Cookie policy handed to the transport.
    pub credentials: Credentials,
    /// Default headers sent with every request.
    pub headers: Vec<(String, String)>,
    /// Bearer token reader.
    pub get_token: Option<TokenGetter>,
    /// Bearer token writer, used by [`AuthClient`](crate::AuthClient) only.
    pub set_token: Option<TokenSetter>,
}

impl Config {
    pub fn new(base_url: impl Into<String>) -> Self {
        Config {
            base_url: base_url.into(),
            ..Config::default()
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_token_getter(
        mut self,
        get: impl Fn() -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.get_token = Some(Arc::new(get));
        self
    }

    pub fn with_token_setter(mut self, set: impl Fn(Option<&str>) + Send + Sync + 'static) -> Self {
        self.set_token = Some(Arc::new(set));
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .field("headers", &self.headers)
            .field("get_token", &self.get_token.is_some())
            .field("set_token", &self.set_token.is_some())
            .finish()
    }
}

/// Arguments for the generic [`Client::request`] escape hatch.
///
/// `method` defaults to GET, `body` to none. `params` is an already-lowered
/// JSON object; the typed operations lower [`FindParams`]/[`BaseParams`]
/// into it.
#[derive(Debug, Clone, Default)]
pub struct RequestArgs {
    pub endpoint: String,
    pub method: Method,
    pub body: Body,
    pub params: Option<Value>,
    pub headers: Vec<(String, String)>,
}

/// Typed client for the document API.
#[derive(Debug, Clone)]
pub struct Client {
    config: Config,
    transport: Transport,
}

impl Client {
    /// Build a client from `config`. A trailing slash on the base URL is
    /// stripped so URL construction stays uniform.
    pub fn new(mut config: Config) -> Result<Self, Error> {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        let transport = Transport::new(config.credentials)?;
        Ok(Self { config, transport })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Documents of `collection` matching `params`, paginated.
    pub async fn find<T: DeserializeOwned>(
        &self,
        collection: &str,
        params: &FindParams,
    ) -> Result<PaginatedDocs<T>, Error> {
        self.request(self.find_args(collection, params)?).await
    }

    /// The document of `collection` with the given id.
    pub async fn find_by_id<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
        params: &BaseParams,
    ) -> Result<T, Error> {
        self.request(self.find_by_id_args(collection, id, params)?)
            .await
    }

    /// Create a document. `body` is the partial document to store.
    pub async fn create<T: DeserializeOwned, B: Serialize>(
        &self,
        collection: &str,
        body: &B,
        params: &BaseParams,
    ) -> Result<DocResponse<T>, Error> {
        self.request(self.create_args(collection, body, params)?)
            .await
    }

    /// Replace fields of an existing document.
    pub async fn update<T: DeserializeOwned, B: Serialize>(
        &self,
        collection: &str,
        id: &str,
        body: &B,
        params: &BaseParams,
    ) -> Result<DocResponse<T>, Error> {
        self.request(self.update_args(collection, id, body, params)?)
            .await
    }

    /// Delete a document; the server answers with the removed document.
    pub async fn delete<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<T, Error> {
        self.request(self.delete_args(collection, id)).await
    }

    /// Number of documents of `collection` matching `params`.
    pub async fn count(&self, collection: &str, params: &FindParams) -> Result<CountResponse, Error> {
        self.request(self.count_args(collection, params)?).await
    }

    /// Create a document with an attached file. The file travels as the
    /// `file` multipart part and `document` as JSON text in `_payload`.
    pub async fn upload<T: DeserializeOwned, B: Serialize>(
        &self,
        collection: &str,
        file: FilePayload,
        document: &B,
    ) -> Result<DocResponse<T>, Error> {
        self.request(self.upload_args(collection, file, document)?)
            .await
    }

    /// Issue an arbitrary request against `/api/<endpoint>` and decode the
    /// response as `T`. The typed operations above all go through here.
    pub async fn request<T: DeserializeOwned>(&self, args: RequestArgs) -> Result<T, Error> {
        self.transport.send(self.build_request(args)).await
    }

    /// Assemble the full request descriptor: URL, query string, headers in
    /// precedence order, body.
    pub fn build_request(&self, args: RequestArgs) -> Request {
        let query = args.params.as_ref().map(query::encode).unwrap_or_default();
        let url = format!("{}/api/{}{}", self.config.base_url, args.endpoint, query);

        let mut headers: Vec<(String, String)> = Vec::new();
        for (name, value) in &self.config.headers {
            set_header(&mut headers, name, value);
        }
        if let Body::Json(_) = args.body {
            set_header(&mut headers, "Content-Type", "application/json");
        }
        if let Some(token) = self.config.get_token.as_ref().and_then(|get| get()) {
            set_header(&mut headers, "Authorization", &format!("Bearer {token}"));
        }
        for (name, value) in &args.headers {
            set_header(&mut headers, name, value);
        }

        Request {
            method: args.method,
            url,
            headers,
            body: args.body,
        }
    }

    fn find_args(&self, collection: &str, params: &FindParams) -> Result<RequestArgs, Error> {
        Ok(RequestArgs {
            endpoint: collection.to_string(),
            method: Method::Get,
            params: Some(serde_json::to_value(params).map_err(Error::Serialize)?),
            ..RequestArgs::default()
        })
    }

    fn find_by_id_args(
        &self,
        collection: &str,
        id: &str,
        params: &BaseParams,
    ) -> Result<RequestArgs, Error> {
        Ok(RequestArgs {
            endpoint: format!("{collection}/{id}"),
            method: Method::Get,
            params: Some(serde_json::to_value(params).map_err(Error::Serialize)?),
            ..RequestArgs::default()
        })
    }

    fn create_args<B: Serialize>(
        &self,
        collection: &str,
        body: &B,
        params: &BaseParams,
    ) -> Result<RequestArgs, Error> {
        Ok(RequestArgs {
            endpoint: collection.to_string(),
            method: Method::Post,
            body: Body::Json(serde_json::to_value(body).map_err(Error::Serialize)?),
            params: Some(serde_json::to_value(params).map_err(Error::Serialize)?),
            ..RequestArgs::default()
        })
    }

    fn update_args<B: Serialize>(
        &self,
        collection: &str,
        id: &str,
        body: &B,
        params: &BaseParams,
    ) -> Result<RequestArgs, Error> {
        Ok(RequestArgs {
            endpoint: format!("{collection}/{id}"),
            method: Method::Put,
            body: Body::Json(serde_json::to_value(body).map_err(Error::Serialize)?),
            params: Some(serde_json::to_value(params).map_err(Error::Serialize)?),
            ..RequestArgs::default()
        })
    }

    fn delete_args(&self, collection: &str, id: &str) -> RequestArgs {
        RequestArgs {
            endpoint: format!("{collection}/{id}"),
            method: Method::Delete,
            ..RequestArgs::default()
        }
    }

    fn count_args(&self, collection: &str, params: &FindParams) -> Result<RequestArgs, Error> {
        Ok(RequestArgs {
            endpoint: format!("{collection}/count"),
            method: Method::Get,
            params: Some(serde_json::to_value(params).map_err(Error::Serialize)?),
            ..RequestArgs::default()
        })
    }

    fn upload_args<B: Serialize>(
        &self,
        collection: &str,
        file: FilePayload,
        document: &B,
    ) -> Result<RequestArgs, Error> {
        Ok(RequestArgs {
            endpoint: collection.to_string(),
            method: Method::Post,
            body: Body::Multipart(UploadForm {
                file,
                document: serde_json::to_string(document).map_err(Error::Serialize)?,
            }),
            ..RequestArgs::default()
        })
    }
}

/// Insert or replace a header, matching names case-insensitively. Callers
/// apply layers in precedence order, so a later layer replaces in place.
fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers
        .iter_mut()
        .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
    {
        Some((_, existing)) => *existing = value.to_string(),
        None => headers.push((name.to_string(), value.to_string())),
    }
}
