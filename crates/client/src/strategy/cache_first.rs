use offcache_core::Error;
use offcache_core::model::{Request, Response};

use super::{Strategies, put_logged};
use crate::fetch::FetchOptions;

impl Strategies {
    /// Serve from the runtime store, going to the network only on a miss.
    ///
    /// A miss is fetched past any intermediate HTTP cache. Only same-origin
    /// `200` responses are stored. A failed fetch is returned as is.
    pub async fn cache_first(&self, request: &Request) -> Result<Response, Error> {
        let store = self.runtime();
        let key = request.key();

        if let Some(hit) = store.get(&key).await? {
            tracing::debug!(%key, "cache-first hit");
            return Ok(hit);
        }

        tracing::debug!(%key, "cache-first miss");
        let response = self.fetcher.fetch(request, FetchOptions::no_store()).await?;
        if response.is_storable_same_origin() {
            put_logged(&store, &key, &response).await;
        }
        Ok(response)
    }
}
