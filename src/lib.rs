//! Live transit map engine: keeps a map surface's stop and vehicle layers in
//! sync with the user's (mode, route) selection while vehicle positions are
//! polled in the background.

pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod layers;
pub mod models;
pub mod projection;
pub mod provider;
pub mod stops;
pub mod surface;
pub mod tracker;

pub use config::LiveMapConfig;
pub use controller::{FetchOutcome, Gate, LiveMapHandle, MapSnapshot, SelectionController};
pub use error::{LiveMapError, ProviderError, SelectionError};
pub use models::{Generation, GeoPoint, Route, Selection, Stop, TransitMode, VehiclePosition};
pub use provider::{TransitApiClient, TransitProvider};
