//! Request dispatch: classify, then run the matching strategy.

use offcache_core::Error;
use offcache_core::model::{Request, Response};

use crate::classify::{Classifier, Strategy};
use crate::strategy::Strategies;

/// What the intermediary did with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Answer the caller with this response.
    Respond(Response),
    /// Not intercepted; the host fetches the request its default way.
    Passthrough,
}

impl Dispatch {
    pub fn response(&self) -> Option<&Response> {
        match self {
            Dispatch::Respond(response) => Some(response),
            Dispatch::Passthrough => None,
        }
    }
}

pub struct Dispatcher {
    classifier: Classifier,
    strategies: Strategies,
}

impl Dispatcher {
    pub fn new(classifier: Classifier, strategies: Strategies) -> Self {
        Self { classifier, strategies }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Route one intercepted request.
    ///
    /// Errors are the failures the selected strategy could not recover from;
    /// the host surfaces them as a failed fetch.
    pub async fn dispatch(&self, request: &Request) -> Result<Dispatch, Error> {
        let classification = self.classifier.classify(request);
        let strategy = classification.strategy();
        tracing::debug!(url = %request.url, ?classification, ?strategy, "dispatching request");

        let response = match strategy {
            Strategy::CacheFirst => self.strategies.cache_first(request).await?,
            Strategy::StaleWhileRevalidate => self.strategies.stale_while_revalidate(request).await?,
            Strategy::OpportunisticCrossOrigin => self.strategies.opportunistic_cross_origin(request).await?,
            Strategy::Passthrough => return Ok(Dispatch::Passthrough),
        };
        Ok(Dispatch::Respond(response))
    }
}
