// Selection controller: owns the user's (mode, route) selection, drives the
// route catalog, stop loader and vehicle tracker, and gates every fetch
// result on the generation it was issued under.

use serde::Serialize;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};

use crate::catalog::RouteCatalog;
use crate::error::{LiveMapError, SelectionError};
use crate::layers::{LayerManager, LayerSnapshot};
use crate::models::{Generation, Route, Selection, Stop, TransitMode, VehiclePosition};
use crate::provider::TransitProvider;
use crate::stops::StopsLoader;
use crate::surface::{MapSurface, MapView};
use crate::tracker::{TrackerState, VehicleTracker};

// ============================================================================
// Fetch Outcomes
// ============================================================================

/// A successful fetch, tagged with the generation it was issued under.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Routes {
        generation: Generation,
        mode: TransitMode,
        routes: Vec<Route>,
    },
    Stops {
        generation: Generation,
        mode: TransitMode,
        stops: Vec<Stop>,
    },
    Vehicles {
        generation: Generation,
        mode: TransitMode,
        vehicles: Vec<VehiclePosition>,
    },
}

impl FetchOutcome {
    pub fn generation(&self) -> Generation {
        match self {
            FetchOutcome::Routes { generation, .. }
            | FetchOutcome::Stops { generation, .. }
            | FetchOutcome::Vehicles { generation, .. } => *generation,
        }
    }
}

pub type OutcomeSender = mpsc::UnboundedSender<FetchOutcome>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Applied,
    Discarded,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapSnapshot {
    pub selection: Selection,
    pub routes: Vec<Route>,
    pub route_selector_enabled: bool,
    pub generation: Generation,
    pub polling: bool,
    pub discarded: u64,
    pub view: MapView,
    pub layers: Vec<LayerSnapshot>,
}

// ============================================================================
// Controller
// ============================================================================

pub struct SelectionController<P, S> {
    layers: LayerManager<S>,
    catalog: RouteCatalog<P>,
    stops: StopsLoader<P>,
    tracker: VehicleTracker<P>,
    selection: Selection,
    /// Last generation handed out; also the only one allowed to touch layers.
    active: Generation,
    /// Generation of the last mode change, the only one allowed to set routes.
    catalog_generation: Generation,
    discarded: u64,
    outcomes_tx: OutcomeSender,
    outcomes_rx: mpsc::UnboundedReceiver<FetchOutcome>,
}

impl<P: TransitProvider, S: MapSurface> SelectionController<P, S> {
    pub fn new(provider: P, surface: S, poll_interval: Duration) -> Self {
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();

        Self {
            layers: LayerManager::new(surface),
            catalog: RouteCatalog::new(provider.clone()),
            stops: StopsLoader::new(provider.clone()),
            tracker: VehicleTracker::new(provider, poll_interval),
            selection: Selection::default(),
            active: Generation::default(),
            catalog_generation: Generation::default(),
            discarded: 0,
            outcomes_tx,
            outcomes_rx,
        }
    }

    fn advance_generation(&mut self) -> Generation {
        self.active = self.active.next();
        self.active
    }

    /// Clears the route and the map, then loads the route list for `mode`.
    pub fn set_mode(&mut self, mode: Option<TransitMode>) {
        self.tracker.stop();
        self.selection.set_mode(mode);
        let generation = self.advance_generation();
        self.catalog_generation = generation;
        self.layers.detach_all();

        match mode {
            Some(mode) => {
                tracing::info!(%mode, %generation, "mode selected");
                self.catalog.fetch(mode, generation, self.outcomes_tx.clone());
            }
            None => {
                tracing::info!(%generation, "mode cleared");
                self.catalog.clear();
            }
        }
    }

    /// Starts a new generation for `route_id` under the current mode. `None`
    /// clears the route, stops polling and hides every layer.
    pub fn set_route(&mut self, route_id: Option<String>) -> Result<Generation, SelectionError> {
        let mode = self.selection.mode.ok_or(SelectionError::ModeNotSelected)?;
        let generation = self.advance_generation();
        self.selection.route_id = route_id.clone();

        let Some(route_id) = route_id else {
            tracing::info!(%generation, "route cleared");
            self.tracker.stop();
            self.layers.detach_all();
            return Ok(generation);
        };

        tracing::info!(%mode, %route_id, %generation, "route selected");
        // The previous generation's stops and vehicles go with it.
        self.layers.clear(mode);
        self.layers.show_only(Some(mode));
        self.stops
            .load(mode, route_id.clone(), generation, self.outcomes_tx.clone());
        self.tracker
            .start(mode, route_id, generation, self.outcomes_tx.clone());

        Ok(generation)
    }

    /// Stops polling and takes every layer off the surface.
    pub fn teardown(&mut self) {
        self.tracker.stop();
        self.layers.detach_all();
        // Anything still in flight belongs to a generation nobody holds.
        self.active = self.active.next();
        self.catalog_generation = self.active;
        tracing::info!("live map torn down");
    }

    /// Applies `outcome` only if its generation is still current.
    pub fn apply(&mut self, outcome: FetchOutcome) -> Gate {
        let generation = outcome.generation();
        let current = match outcome {
            FetchOutcome::Routes { .. } => self.catalog_generation,
            FetchOutcome::Stops { .. } | FetchOutcome::Vehicles { .. } => self.active,
        };

        if generation != current {
            self.discarded += 1;
            tracing::debug!(%generation, %current, "discarding stale fetch result");
            return Gate::Discarded;
        }

        match outcome {
            FetchOutcome::Routes { routes, .. } => self.catalog.replace(routes),
            FetchOutcome::Stops { mode, stops, .. } => self.layers.replace_stops(mode, &stops),
            FetchOutcome::Vehicles { mode, vehicles, .. } => {
                self.layers.replace_vehicles(mode, &vehicles)
            }
        }
        Gate::Applied
    }

    /// Applies fetch results as they arrive until `deadline`.
    pub async fn pump_until(&mut self, deadline: Instant) {
        loop {
            tokio::select! {
                biased;
                Some(outcome) = self.outcomes_rx.recv() => {
                    self.apply(outcome);
                }
                _ = time::sleep_until(deadline) => break,
            }
        }
    }

    pub async fn pump_for(&mut self, duration: Duration) {
        self.pump_until(Instant::now() + duration).await;
    }

    /// Serves commands until shutdown or until every handle is dropped.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        loop {
            tokio::select! {
                Some(outcome) = self.outcomes_rx.recv() => {
                    self.apply(outcome);
                }
                command = commands.recv() => match command {
                    Some(command) => {
                        if !self.handle(command) {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
        self.teardown();
    }

    /// Returns `false` once the controller should stop serving.
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::SetMode(mode) => self.set_mode(mode),
            Command::SetRoute(route_id, reply) => {
                let _ = reply.send(self.set_route(route_id).map(|_| ()));
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Command::Shutdown => return false,
        }
        true
    }

    pub fn snapshot(&self) -> MapSnapshot {
        MapSnapshot {
            selection: self.selection.clone(),
            routes: self.catalog.routes().to_vec(),
            route_selector_enabled: self.selection.mode.is_some(),
            generation: self.active,
            polling: self.tracker.is_polling(),
            discarded: self.discarded,
            view: self.layers.surface().view(),
            layers: self.layers.snapshot(),
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn routes(&self) -> &[Route] {
        self.catalog.routes()
    }

    pub fn active_generation(&self) -> Generation {
        self.active
    }

    pub fn tracker_state(&self) -> TrackerState {
        self.tracker.state()
    }

    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    pub fn layers(&self) -> &LayerManager<S> {
        &self.layers
    }

    /// Moves the controller onto its own task and returns a handle to it.
    pub fn spawn(self) -> LiveMapHandle {
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(self.run(rx));
        LiveMapHandle { commands: tx }
    }
}

// ============================================================================
// Handle
// ============================================================================

pub enum Command {
    SetMode(Option<TransitMode>),
    SetRoute(Option<String>, oneshot::Sender<Result<(), SelectionError>>),
    Snapshot(oneshot::Sender<MapSnapshot>),
    Shutdown,
}

#[derive(Clone)]
pub struct LiveMapHandle {
    commands: mpsc::Sender<Command>,
}

impl LiveMapHandle {
    pub async fn set_mode(&self, mode: Option<TransitMode>) -> Result<(), LiveMapError> {
        self.send(Command::SetMode(mode)).await
    }

    pub async fn set_route(&self, route_id: Option<String>) -> Result<(), LiveMapError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SetRoute(route_id, reply)).await?;
        rx.await.map_err(|_| LiveMapError::ControllerGone)??;
        Ok(())
    }

    pub async fn snapshot(&self) -> Result<MapSnapshot, LiveMapError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot(reply)).await?;
        rx.await.map_err(|_| LiveMapError::ControllerGone)
    }

    pub async fn shutdown(&self) -> Result<(), LiveMapError> {
        self.send(Command::Shutdown).await
    }

    async fn send(&self, command: Command) -> Result<(), LiveMapError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| LiveMapError::ControllerGone)
    }
}
