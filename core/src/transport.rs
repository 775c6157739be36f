//! Transport: executes one [`Request`] and normalizes its outcome.
//!
//! # Design
//! One network call per [`send`](Transport::send), no retries, no logging,
//! no caching. A success-range status decodes the body as JSON into the
//! caller's type; anything else becomes [`Error::Api`] built from the
//! response body's `message` and `errors` fields, falling back to the HTTP
//! reason phrase when the body carries no structured message. Errors raised
//! by reqwest itself (connection, DNS, TLS) propagate unchanged as
//! [`Error::Network`].

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{Error, FieldError};
use crate::http::{Body, Credentials, Method, Request, UploadForm};

/// Failure body shape: `{ message?, errors? }`. Both fields default when the
/// server supplies nothing usable.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<FieldError>,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// HTTP executor shared by every operation of a client.
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
}

impl Transport {
    /// Build the underlying HTTP client. The credentials policy decides
    /// whether a cookie store is attached.
    pub fn new(credentials: Credentials) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .cookie_store(credentials != Credentials::Omit)
            .build()
            .map_err(Error::Client)?;
        Ok(Self { http })
    }

    /// Execute `request` and decode the JSON response body as `T`.
    ///
    /// `Accept: application/json` is always present; a header of the same
    /// name in the request replaces it. The response body is not validated
    /// against `T` beyond JSON decoding.
    pub async fn send<T: DeserializeOwned>(&self, request: Request) -> Result<T, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (name, value) in &request.headers {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::InvalidHeader(name.clone()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| Error::InvalidHeader(format!("{name}: {value}")))?;
            headers.insert(header, value);
        }

        let mut builder = self
            .http
            .request(request.method.into(), &request.url)
            .headers(headers);
        builder = match request.body {
            Body::None => builder,
            Body::Json(value) => {
                builder.body(serde_json::to_string(&value).map_err(Error::Serialize)?)
            }
            Body::Multipart(form) => builder.multipart(multipart_form(form)?),
        };

        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status.is_success() {
            return serde_json::from_slice(&bytes).map_err(Error::Decode);
        }

        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
        Err(Error::Api {
            status: status.as_u16(),
            message: body.message.unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string()
            }),
            errors: body.errors,
        })
    }
}

/// Lower the plain-data upload form into a reqwest multipart form. No
/// content-type header is set here; reqwest derives the boundary-aware one
/// from the form itself.
fn multipart_form(form: UploadForm) -> Result<Form, Error> {
    let file = Part::bytes(form.file.data)
        .file_name(form.file.name)
        .mime_str(&form.file.mime_type)
        .map_err(|_| Error::InvalidMime(form.file.mime_type))?;
    Ok(Form::new()
        .part("file", file)
        .text("_payload", form.document))
}
