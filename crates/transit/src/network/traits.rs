//! Pluggable feed traits.
//!
//! The HTTP transport lives outside the engine; anything that can produce the
//! four feeds implements [`FleetFeed`].

use std::future::Future;
use std::pin::Pin;

use busline_api_types::{EtaDto, PathDto, StopDto, VehicleDto};

use crate::identifiers::StopIdentifier;
use crate::models::types::Result;

/// Read-only source of fleet data.
pub trait FleetFeed: Send + Sync {
    /// Current position report of every vehicle
    fn vehicles<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<VehicleDto>>> + Send + 'a>>;

    /// Every stop, with the routes serving it
    fn stops<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<Vec<StopDto>>> + Send + 'a>>;

    /// Arrival estimates at one stop
    fn etas<'a>(
        &'a self,
        stop: &'a StopIdentifier,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<EtaDto>>> + Send + 'a>>;

    /// Path trace of one route, `Ok(None)` when the feed has none
    fn path<'a>(
        &'a self,
        path_key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<PathDto>>> + Send + 'a>>;
}
