use tokio::task::JoinHandle;

use crate::controller::{FetchOutcome, OutcomeSender};
use crate::models::{Generation, Route, TransitMode};
use crate::provider::TransitProvider;

/// Route list for the selected mode. Contents only change when a fetch for
/// the current mode succeeds or the mode is cleared.
pub struct RouteCatalog<P> {
    provider: P,
    routes: Vec<Route>,
}

impl<P: TransitProvider> RouteCatalog<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            routes: Vec::new(),
        }
    }

    /// Fetches in the background and reports the result tagged with
    /// `generation`. Failures are logged and report nothing.
    pub fn fetch(
        &self,
        mode: TransitMode,
        generation: Generation,
        report: OutcomeSender,
    ) -> JoinHandle<()> {
        let provider = self.provider.clone();

        tokio::spawn(async move {
            match provider.routes(mode).await {
                Ok(routes) => {
                    tracing::debug!(%mode, %generation, count = routes.len(), "routes fetched");
                    let _ = report.send(FetchOutcome::Routes {
                        generation,
                        mode,
                        routes,
                    });
                }
                Err(e) => {
                    tracing::warn!(%mode, %generation, error = %e, "failed to fetch routes");
                }
            }
        })
    }

    pub fn replace(&mut self, routes: Vec<Route>) {
        self.routes = routes;
    }

    pub fn clear(&mut self) {
        self.routes.clear();
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}
