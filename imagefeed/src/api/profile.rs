use std::future::Future;

use log::{debug, info};

use super::ApiClientImpl;
use super::internal::user::{ProfileInternal, UserInternal};
use crate::error::{NetworkError, Result};
use crate::http::{ApiRequest, HttpTransport};
use crate::models::{AvatarSize, Profile};

pub trait ProfileApi {
    fn me(&self, token: &str) -> impl Future<Output = Result<Profile>> + Send;
}

pub trait ProfileImageApi {
    fn profile_image_url(
        &self,
        username: &str,
        size: AvatarSize,
        token: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

impl<T: HttpTransport> ProfileApi for ApiClientImpl<T> {
    async fn me(&self, token: &str) -> Result<Profile> {
        info!("getting profile of the current user");
        let url = self.endpoint(&["me"])?;
        let profile: ProfileInternal = self
            .transport()
            .request(ApiRequest::get(url).bearer(token))
            .await?;
        debug!("got profile of {}", profile.username);
        Ok(profile.into())
    }
}

impl<T: HttpTransport> ProfileImageApi for ApiClientImpl<T> {
    async fn profile_image_url(
        &self,
        username: &str,
        size: AvatarSize,
        token: &str,
    ) -> Result<String> {
        info!("getting profile image of {username}, size: {size:?}");
        let url = self.endpoint(&["users", username])?;
        let user: UserInternal = self
            .transport()
            .request(ApiRequest::get(url).bearer(token))
            .await?;
        let url = user.avatar_url(size).ok_or_else(|| {
            let size: &str = (&size).into();
            NetworkError::Decoding(format!("user {username} has no {size} profile image"))
        })?;
        Ok(url)
    }
}
