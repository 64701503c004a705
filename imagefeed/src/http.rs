//! HTTP transport used by the API client.
//!
//! Requests are described as plain data (`ApiRequest`) and handed to an
//! `HttpTransport`, which performs the round-trip and decodes the JSON body.
//! Tests swap `ReqwestTransport` for `mock::MockTransport`.

use std::future::Future;
use std::time::Duration;

use log::{debug, error};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{NetworkError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl From<HttpMethod> for Method {
    fn from(value: HttpMethod) -> Self {
        match value {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub bearer_token: Option<String>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            bearer_token: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: Url) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn delete(url: Url) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.bearer_token = Some(token.to_string());
        self
    }
}

pub trait HttpTransport: Clone + Send + Sync + 'static {
    /// Performs `request` and decodes a 2xx JSON body into `T`.
    fn request<T>(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = std::result::Result<T, NetworkError>> + Send
    where
        T: DeserializeOwned + Send;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NetworkError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    async fn request<T>(&self, request: ApiRequest) -> std::result::Result<T, NetworkError>
    where
        T: DeserializeOwned + Send,
    {
        let ApiRequest {
            method,
            url,
            bearer_token,
        } = request;
        debug!("{method:?} {url}");

        let mut builder = self.client.request(method.into(), url.clone());
        if let Some(token) = bearer_token.as_deref() {
            builder = builder.bearer_auth(token);
        }
        let response = builder.send().await.map_err(|e| {
            error!("request {method:?} {url} failed: {e}");
            NetworkError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            error!("request {method:?} {url} answered with status {status}");
            return Err(NetworkError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| {
            error!("failed to read response body of {url}: {e}");
            NetworkError::Transport(e.to_string())
        })?;
        decode(&body)
    }
}

pub fn decode<T: DeserializeOwned>(body: &[u8]) -> std::result::Result<T, NetworkError> {
    serde_json::from_slice(body).map_err(|e| {
        error!(
            "failed to decode response: {e}, body: {}",
            String::from_utf8_lossy(body)
        );
        NetworkError::Decoding(e.to_string())
    })
}
