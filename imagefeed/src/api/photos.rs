use std::future::Future;

use log::{debug, info, warn};

use super::ApiClientImpl;
use super::internal::photo::PhotoInternal;
use crate::error::Result;
use crate::http::{ApiRequest, HttpTransport};
use crate::models::Photo;

pub trait PhotosApi {
    /// One page of the feed, in server order. Records that cannot be turned
    /// into a `Photo` are skipped.
    fn photos(
        &self,
        page: u32,
        per_page: u32,
        token: &str,
    ) -> impl Future<Output = Result<Vec<Photo>>> + Send;
}

impl<T: HttpTransport> PhotosApi for ApiClientImpl<T> {
    async fn photos(&self, page: u32, per_page: u32, token: &str) -> Result<Vec<Photo>> {
        info!("getting photos, page: {page}, per_page: {per_page}");
        let mut url = self.endpoint(&["photos"])?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &per_page.to_string());

        let records: Vec<PhotoInternal> = self
            .transport()
            .request(ApiRequest::get(url).bearer(token))
            .await?;
        let photos = records
            .into_iter()
            .filter_map(|record| {
                let id = record.id.clone();
                Photo::try_from(record)
                    .map_err(|e| warn!("skipping photo {id}: {e}"))
                    .ok()
            })
            .collect::<Vec<_>>();
        debug!("got {} photos of page {page}", photos.len());
        Ok(photos)
    }
}
