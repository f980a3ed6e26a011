use tokio::task::JoinHandle;

use crate::controller::{FetchOutcome, OutcomeSender};
use crate::models::{Generation, TransitMode};
use crate::provider::TransitProvider;

pub struct StopsLoader<P> {
    provider: P,
}

impl<P: TransitProvider> StopsLoader<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Loads once in the background. Only a successful load is reported, so a
    /// failure leaves whatever stops are on the map in place.
    pub fn load(
        &self,
        mode: TransitMode,
        route_id: String,
        generation: Generation,
        report: OutcomeSender,
    ) -> JoinHandle<()> {
        let provider = self.provider.clone();

        tokio::spawn(async move {
            match provider.stops(&route_id).await {
                Ok(stops) => {
                    tracing::debug!(%route_id, %generation, count = stops.len(), "stops fetched");
                    let _ = report.send(FetchOutcome::Stops {
                        generation,
                        mode,
                        stops,
                    });
                }
                Err(e) => {
                    tracing::warn!(%route_id, %generation, error = %e, "failed to fetch stops");
                }
            }
        })
    }
}
