//! In-memory feed.
//!
//! Serves whatever it was last given. Useful for demos and for driving the
//! engine in tests without a backend.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use busline_api_types::{EtaDto, PathDto, StopDto, VehicleDto};

use crate::identifiers::StopIdentifier;
use crate::models::types::{Result, TransitError};
use crate::network::traits::FleetFeed;

#[derive(Default)]
struct FeedData {
    vehicles: Option<Vec<VehicleDto>>,
    stops: Option<Vec<StopDto>>,
    etas: HashMap<StopIdentifier, Vec<EtaDto>>,
    paths: HashMap<String, PathDto>,
}

/// Feed backed by plain collections.
///
/// A collection that was never set (or was cleared) answers with a transport
/// error, the same way an unreachable backend would.
#[derive(Default)]
pub struct StaticFeed {
    data: RwLock<FeedData>,
    vehicle_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    eta_calls: AtomicUsize,
    path_calls: AtomicUsize,
}

impl StaticFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stops(self, stops: Vec<StopDto>) -> Self {
        self.write(|data| data.stops = Some(stops));
        self
    }

    pub fn with_vehicles(self, vehicles: Vec<VehicleDto>) -> Self {
        self.set_vehicles(vehicles);
        self
    }

    pub fn with_path(self, path_key: impl Into<String>, path: PathDto) -> Self {
        self.write(|data| {
            data.paths.insert(path_key.into(), path);
        });
        self
    }

    pub fn with_etas(self, stop: StopIdentifier, etas: Vec<EtaDto>) -> Self {
        self.set_etas(stop, etas);
        self
    }

    pub fn set_vehicles(&self, vehicles: Vec<VehicleDto>) {
        self.write(|data| data.vehicles = Some(vehicles));
    }

    /// Make the vehicle feed fail until vehicles are set again
    pub fn clear_vehicles(&self) {
        self.write(|data| data.vehicles = None);
    }

    pub fn set_etas(&self, stop: StopIdentifier, etas: Vec<EtaDto>) {
        self.write(|data| {
            data.etas.insert(stop, etas);
        });
    }

    pub fn vehicle_calls(&self) -> usize {
        self.vehicle_calls.load(Ordering::Relaxed)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::Relaxed)
    }

    pub fn eta_calls(&self) -> usize {
        self.eta_calls.load(Ordering::Relaxed)
    }

    pub fn path_calls(&self) -> usize {
        self.path_calls.load(Ordering::Relaxed)
    }

    fn write(&self, f: impl FnOnce(&mut FeedData)) {
        let mut guard = self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard);
    }

    fn read<T>(&self, f: impl FnOnce(&FeedData) -> T) -> T {
        let guard = self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&guard)
    }
}

fn unavailable(feed: &str) -> TransitError {
    TransitError::Transport(format!("{feed} feed is not loaded"))
}

impl FleetFeed for StaticFeed {
    fn vehicles<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<VehicleDto>>> + Send + 'a>> {
        self.vehicle_calls.fetch_add(1, Ordering::Relaxed);
        let result = self.read(|data| data.vehicles.clone().ok_or_else(|| unavailable("vehicle")));
        Box::pin(async move { result })
    }

    fn stops<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<Vec<StopDto>>> + Send + 'a>> {
        self.stop_calls.fetch_add(1, Ordering::Relaxed);
        let result = self.read(|data| data.stops.clone().ok_or_else(|| unavailable("stop")));
        Box::pin(async move { result })
    }

    fn etas<'a>(
        &'a self,
        stop: &'a StopIdentifier,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<EtaDto>>> + Send + 'a>> {
        self.eta_calls.fetch_add(1, Ordering::Relaxed);
        let result = self.read(|data| data.etas.get(stop).cloned().unwrap_or_default());
        Box::pin(async move { Ok(result) })
    }

    fn path<'a>(
        &'a self,
        path_key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<PathDto>>> + Send + 'a>> {
        self.path_calls.fetch_add(1, Ordering::Relaxed);
        let result = self.read(|data| data.paths.get(path_key).cloned());
        Box::pin(async move { Ok(result) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use busline_api_types::{FeedId, Numeric};

    fn block_on<F: Future>(future: F) -> F::Output {
        // The static feed never suspends, so a single poll resolves it.
        use std::task::{Context, Poll, Waker};

        let mut future = std::pin::pin!(future);
        let mut cx = Context::from_waker(Waker::noop());
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(output) => output,
            Poll::Pending => panic!("static feed suspended"),
        }
    }

    #[test]
    fn test_unloaded_feed_fails() {
        let feed = StaticFeed::new();
        assert!(block_on(feed.vehicles()).is_err());
        assert!(block_on(feed.stops()).is_err());
        assert_eq!(feed.vehicle_calls(), 1);
    }

    #[test]
    fn test_serves_loaded_data() {
        let stop = StopDto {
            id: FeedId::Number(10034),
            name: "College Ave".into(),
            latitude: Numeric::from(40.5),
            longitude: Numeric::from(-74.45),
            routes: vec!["A Route".into()],
        };
        let feed = StaticFeed::new()
            .with_stops(vec![stop])
            .with_path("B_L Loop", vec![[40.5, -74.45]])
            .with_etas(
                StopIdentifier::new("10034"),
                vec![EtaDto { route: "A Route".into(), eta: "3 min".into() }],
            );

        assert_eq!(block_on(feed.stops()).unwrap().len(), 1);
        assert!(block_on(feed.path("B_L Loop")).unwrap().is_some());
        assert!(block_on(feed.path("EE")).unwrap().is_none());
        let stop_id = StopIdentifier::new("10034");
        assert_eq!(block_on(feed.etas(&stop_id)).unwrap().len(), 1);
        let other = StopIdentifier::new("1");
        assert!(block_on(feed.etas(&other)).unwrap().is_empty());
    }

    #[test]
    fn test_clear_vehicles() {
        let feed = StaticFeed::new().with_vehicles(vec![]);
        assert!(block_on(feed.vehicles()).is_ok());
        feed.clear_vehicles();
        assert!(block_on(feed.vehicles()).is_err());
    }
}
