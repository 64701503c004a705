use std::future::Future;

use log::info;

use super::ApiClientImpl;
use super::internal::oauth::OAuthTokenInternal;
use crate::error::Result;
use crate::http::{ApiRequest, HttpTransport};

pub trait OAuthApi {
    /// Exchanges an authorization code from the web login for a bearer token.
    fn exchange_code(&self, code: &str) -> impl Future<Output = Result<String>> + Send;
}

impl<T: HttpTransport> OAuthApi for ApiClientImpl<T> {
    async fn exchange_code(&self, code: &str) -> Result<String> {
        info!("exchanging authorization code for a token");
        let endpoints = self.endpoints();
        let mut url = endpoints.oauth_token_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &endpoints.access_key)
            .append_pair("client_secret", &endpoints.secret_key)
            .append_pair("redirect_uri", &endpoints.redirect_uri)
            .append_pair("code", code)
            .append_pair("grant_type", "authorization_code");

        let token: OAuthTokenInternal = self.transport().request(ApiRequest::post(url)).await?;
        info!(
            "got {} token, scope: {}",
            token.token_type.as_deref().unwrap_or("unknown"),
            token.scope.as_deref().unwrap_or("")
        );
        Ok(token.access_token)
    }
}
