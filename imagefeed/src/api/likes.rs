use std::future::Future;

use log::{debug, info, warn};

use super::ApiClientImpl;
use super::internal::photo::LikeResponseInternal;
use crate::error::Result;
use crate::http::{ApiRequest, HttpMethod, HttpTransport};

pub trait LikesApi {
    /// Likes a photo; returns the server's `liked_by_user` afterwards.
    fn like(&self, photo_id: &str, token: &str) -> impl Future<Output = Result<bool>> + Send;
    /// Removes a like; returns the server's `liked_by_user` afterwards.
    fn unlike(&self, photo_id: &str, token: &str) -> impl Future<Output = Result<bool>> + Send;
}

impl<T: HttpTransport> ApiClientImpl<T> {
    async fn change_like(&self, photo_id: &str, method: HttpMethod, token: &str) -> Result<bool> {
        info!("changing like of photo {photo_id}: {method:?}");
        let url = self.endpoint(&["photos", photo_id, "like"])?;
        let response: LikeResponseInternal = self
            .transport()
            .request(ApiRequest::new(method, url).bearer(token))
            .await?;
        if response.photo.id != photo_id {
            warn!(
                "like response for {photo_id} carries photo {}",
                response.photo.id
            );
        }
        debug!(
            "photo {photo_id} liked_by_user: {}",
            response.photo.liked_by_user
        );
        Ok(response.photo.liked_by_user)
    }
}

impl<T: HttpTransport> LikesApi for ApiClientImpl<T> {
    async fn like(&self, photo_id: &str, token: &str) -> Result<bool> {
        self.change_like(photo_id, HttpMethod::Post, token).await
    }

    async fn unlike(&self, photo_id: &str, token: &str) -> Result<bool> {
        self.change_like(photo_id, HttpMethod::Delete, token).await
    }
}
