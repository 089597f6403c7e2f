//! Registration: the active and waiting worker for one scope.

use std::sync::Arc;

use offcache_core::Error;
use offcache_core::model::Request;
use serde::Serialize;
use tokio::sync::RwLock;
use url::Url;

use crate::dispatch::Dispatch;
use crate::lifecycle::{ActivateReport, InstallReport};
use crate::worker::ServiceWorker;

/// Outcome of [`Registration::install`].
#[derive(Debug, Clone, Serialize)]
pub struct Installation {
    pub install: InstallReport,
    /// Present when the install asked to skip waiting and activation ran.
    pub activate: Option<ActivateReport>,
}

/// Routes requests to at most one active worker.
pub struct Registration {
    scope: Url,
    active: RwLock<Option<Arc<ServiceWorker>>>,
    waiting: RwLock<Option<Arc<ServiceWorker>>>,
}

impl Registration {
    pub fn new(scope: Url) -> Self {
        Self { scope, active: RwLock::new(None), waiting: RwLock::new(None) }
    }

    pub fn scope(&self) -> &Url {
        &self.scope
    }

    pub async fn active(&self) -> Option<Arc<ServiceWorker>> {
        self.active.read().await.clone()
    }

    pub async fn waiting(&self) -> Option<Arc<ServiceWorker>> {
        self.waiting.read().await.clone()
    }

    /// Install `worker`; it replaces any waiting worker.
    ///
    /// A failed install leaves the registration as it was. On success the
    /// worker is activated straight away when its install report asks to
    /// skip waiting.
    pub async fn install(&self, worker: ServiceWorker, assets: &[Url]) -> Result<Installation, Error> {
        let worker = Arc::new(worker);
        let install = worker.on_install(assets).await?;
        *self.waiting.write().await = Some(worker);

        let activate = if install.skip_waiting { Some(self.activate().await?) } else { None };
        Ok(Installation { install, activate })
    }

    /// Activate the waiting worker and supersede the previously active one.
    ///
    /// If activation fails the worker stays waiting.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let mut waiting = self.waiting.write().await;
        let Some(worker) = waiting.clone() else {
            return Err(Error::InvalidState { action: "activate", state: "no waiting worker".into() });
        };

        let report = worker.on_activate().await?;
        waiting.take();
        drop(waiting);

        let previous = self.active.write().await.replace(worker);
        if let Some(previous) = previous {
            previous.supersede().await;
        }
        Ok(report)
    }

    /// Hand `request` to the active worker, or pass it through when there is none.
    pub async fn handle(&self, request: &Request) -> Result<Dispatch, Error> {
        match self.active().await {
            Some(worker) => worker.handle(request).await,
            None => Ok(Dispatch::Passthrough),
        }
    }
}
