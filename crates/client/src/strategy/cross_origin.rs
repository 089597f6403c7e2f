use offcache_core::Error;
use offcache_core::model::{Request, Response};

use super::{Strategies, put_logged};
use crate::fetch::FetchOptions;

impl Strategies {
    /// Cache whatever a font CDN hands back.
    ///
    /// The fetch runs in no-cors mode, so the response is usually opaque and
    /// its status cannot be checked: any response is stored, error pages
    /// included. If the fetch fails the cached copy is used, and failing that
    /// one plain fetch decides the outcome.
    pub async fn opportunistic_cross_origin(&self, request: &Request) -> Result<Response, Error> {
        let store = self.runtime();
        let key = request.key();

        if let Some(hit) = store.get(&key).await? {
            tracing::debug!(%key, "cross-origin hit");
            return Ok(hit);
        }

        match self.fetcher.fetch(request, FetchOptions::no_cors()).await {
            Ok(response) => {
                put_logged(&store, &key, &response).await;
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "no-cors fetch failed");
                if let Some(hit) = store.get(&key).await? {
                    return Ok(hit);
                }
                self.fetcher.fetch(request, FetchOptions::default()).await
            }
        }
    }
}
