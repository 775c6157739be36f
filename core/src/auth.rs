//! Session lifecycle on top of the resource client.
//!
//! # Design
//! `AuthClient` owns a [`Client`] and decorates it with the `users/login`,
//! `users/logout`, and `users/me` operations. After a successful login the
//! configured token setter receives the returned token; after a successful
//! logout it receives the clear signal. The setter runs synchronously after
//! the transport call resolves and before the method returns, and is never
//! invoked on failure. When no setter is configured the caller persists the
//! token itself.

use std::fmt;

use serde::de::DeserializeOwned;

use crate::client::{Client, Config, RequestArgs, TokenSetter};
use crate::error::Error;
use crate::http::{Body, Method};
use crate::types::{LoginResponse, MeResponse, MessageResponse};

/// Resource client plus session operations.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    set_token: Option<TokenSetter>,
}

impl AuthClient {
    pub fn new(config: Config) -> Result<Self, Error> {
        let set_token = config.set_token.clone();
        Ok(Self {
            client: Client::new(config)?,
            set_token,
        })
    }

    /// The wrapped resource client, for document operations.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Authenticate and hand the returned token to the setter.
    pub async fn login<U: DeserializeOwned>(
        &self,
        email: &str,
        password: &str,
    ) -> Result<LoginResponse<U>, Error> {
        let response: LoginResponse<U> = self
            .client
            .request(RequestArgs {
                endpoint: "users/login".to_string(),
                method: Method::Post,
                body: Body::Json(serde_json::json!({ "email": email, "password": password })),
                ..RequestArgs::default()
            })
            .await?;
        if let Some(set_token) = &self.set_token {
            set_token(Some(&response.token));
        }
        Ok(response)
    }

    /// End the session and clear the stored token.
    pub async fn logout(&self) -> Result<MessageResponse, Error> {
        let response: MessageResponse = self
            .client
            .request(RequestArgs {
                endpoint: "users/logout".to_string(),
                method: Method::Post,
                ..RequestArgs::default()
            })
            .await?;
        if let Some(set_token) = &self.set_token {
            set_token(None);
        }
        Ok(response)
    }

    /// The account behind the current bearer token. `user: None` means no
    /// active session.
    pub async fn me<U: DeserializeOwned>(&self) -> Result<MeResponse<U>, Error> {
        self.client
            .request(RequestArgs {
                endpoint: "users/me".to_string(),
                method: Method::Get,
                ..RequestArgs::default()
            })
            .await
    }
}

impl fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthClient")
            .field("client", &self.client)
            .field("set_token", &self.set_token.is_some())
            .finish()
    }
}
