pub mod likes;
pub mod oauth;
pub mod photos;
pub mod profile;
pub(crate) mod internal;

use std::sync::Arc;

use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::{HttpTransport, ReqwestTransport};

pub use likes::LikesApi;
pub use oauth::OAuthApi;
pub use photos::PhotosApi;
pub use profile::{ProfileApi, ProfileImageApi};

pub trait ApiClient:
    PhotosApi + LikesApi + ProfileApi + ProfileImageApi + OAuthApi + Send + Sync + Clone + 'static
{
}

/// Where the API lives and the application credentials used for the OAuth
/// code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api_base: Url,
    pub oauth_token_url: Url,
    pub access_key: String,
    pub secret_key: String,
    pub redirect_uri: String,
}

impl Endpoints {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            api_base: Url::parse(&config.api_base_url)?,
            oauth_token_url: Url::parse(&config.oauth_token_url)?,
            access_key: config.access_key.clone(),
            secret_key: config.secret_key.clone(),
            redirect_uri: config.redirect_uri.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ApiClientImpl<T: HttpTransport> {
    transport: T,
    endpoints: Arc<Endpoints>,
}

impl<T: HttpTransport> ApiClientImpl<T> {
    pub fn new(transport: T, endpoints: Endpoints) -> Self {
        ApiClientImpl {
            transport,
            endpoints: Arc::new(endpoints),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Builds `api_base/seg1/seg2/...`, percent-encoding each segment.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoints.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Other(format!("{} cannot be a base url", self.endpoints.api_base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl<T: HttpTransport> ApiClient for ApiClientImpl<T> {}

pub type DefaultApiClient = ApiClientImpl<ReqwestTransport>;
