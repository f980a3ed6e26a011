// Recurring vehicle position poll for the active (mode, route) pair.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::controller::{FetchOutcome, OutcomeSender};
use crate::models::{Generation, TransitMode};
use crate::provider::TransitProvider;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    Polling {
        generation: Generation,
        mode: TransitMode,
        route_id: String,
    },
}

/// The running poll timer. Dropping it cancels the timer, so every exit path
/// (stop, restart, controller drop) releases it.
struct PollTask {
    generation: Generation,
    mode: TransitMode,
    route_id: String,
    handle: JoinHandle<()>,
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub struct VehicleTracker<P> {
    provider: P,
    interval: Duration,
    poll: Option<PollTask>,
}

impl<P: TransitProvider> VehicleTracker<P> {
    pub fn new(provider: P, interval: Duration) -> Self {
        Self {
            provider,
            interval,
            poll: None,
        }
    }

    /// Fetches immediately, then once per interval until stopped. A tracker
    /// that is already polling stops its previous generation first.
    pub fn start(
        &mut self,
        mode: TransitMode,
        route_id: String,
        generation: Generation,
        report: OutcomeSender,
    ) {
        self.stop();

        let provider = self.provider.clone();
        let period = self.interval;
        let poll_route = route_id.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                // A slow tick must not hold back the next one.
                tokio::spawn(poll_once(
                    provider.clone(),
                    mode,
                    poll_route.clone(),
                    generation,
                    report.clone(),
                ));
            }
        });

        tracing::info!(%mode, %route_id, %generation, every = ?period, "vehicle polling started");
        self.poll = Some(PollTask {
            generation,
            mode,
            route_id,
            handle,
        });
    }

    /// Cancels the poll timer. In-flight fetches still finish; their results
    /// are fenced off by generation.
    pub fn stop(&mut self) {
        if let Some(poll) = self.poll.take() {
            tracing::info!(
                mode = %poll.mode,
                route_id = %poll.route_id,
                generation = %poll.generation,
                "vehicle polling stopped"
            );
        }
    }

    pub fn state(&self) -> TrackerState {
        match &self.poll {
            Some(poll) => TrackerState::Polling {
                generation: poll.generation,
                mode: poll.mode,
                route_id: poll.route_id.clone(),
            },
            None => TrackerState::Idle,
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_some()
    }
}

async fn poll_once<P: TransitProvider>(
    provider: P,
    mode: TransitMode,
    route_id: String,
    generation: Generation,
    report: OutcomeSender,
) {
    match provider.vehicles(&route_id).await {
        Ok(vehicles) => {
            tracing::debug!(%route_id, %generation, count = vehicles.len(), "vehicles fetched");
            let _ = report.send(FetchOutcome::Vehicles {
                generation,
                mode,
                vehicles,
            });
        }
        // Skipped tick; the timer keeps running and the map keeps its last positions.
        Err(e) => {
            tracing::warn!(%route_id, %generation, error = %e, "vehicle poll failed");
        }
    }
}
