//! The task that feeds the engine.
//!
//! One tokio task owns the whole [`FleetState`]. It fetches the stops and the
//! route traces once, fetches the vehicles on a fixed interval, drives frame
//! steps while anything is animating, and answers commands from its
//! [`CoordinatorHandle`]. Every change is published as a fresh
//! [`RenderFrame`] on a watch channel.

use std::sync::Arc;

use busline_transit::{FleetFeed, RouteKey, StopIdentifier};
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::view::{FleetState, RenderFrame};

mod fetch;

use fetch::{FetchOutcome, PendingFetch};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// The user opened a stop: fetch its arrival estimates
    SelectStop(StopIdentifier),
    ToggleRoute(RouteKey),
    Shutdown,
}

pub struct PollingCoordinator {
    feed: Arc<dyn FleetFeed>,
    config: EngineConfig,
}

impl PollingCoordinator {
    pub fn new(feed: Arc<dyn FleetFeed>, config: EngineConfig) -> Self {
        Self { feed, config }
    }

    /// Spawn the polling task. Must be called from within a tokio runtime.
    pub fn start(self) -> CoordinatorHandle {
        let mut state = FleetState::new(&self.config);
        let (frames_tx, frames_rx) = watch::channel(Arc::new(state.frame()));
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(self.run(state, commands_rx, frames_tx));

        CoordinatorHandle {
            commands: commands_tx,
            frames: frames_rx,
            task,
        }
    }

    async fn run(
        self,
        mut state: FleetState,
        mut commands: mpsc::UnboundedReceiver<Command>,
        frames: watch::Sender<Arc<RenderFrame>>,
    ) -> FleetState {
        info!(
            interval_secs = self.config.vehicle_poll_interval_secs,
            routes = state.known_routes().count(),
            "starting fleet polling"
        );

        let mut pending: FuturesUnordered<PendingFetch> = FuturesUnordered::new();
        pending.push(fetch::stops(Arc::clone(&self.feed)));
        for route in state.known_routes() {
            pending.push(fetch::path(Arc::clone(&self.feed), route.clone()));
        }

        // the first tick completes immediately
        let mut poll = time::interval(self.config.poll_interval());
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut frame_ticks = time::interval(self.config.frame_interval());
        frame_ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut vehicles_in_flight = false;

        loop {
            tokio::select! {
                _ = poll.tick() => {
                    if vehicles_in_flight {
                        debug!("vehicle fetch still running, skipping this poll");
                    } else {
                        vehicles_in_flight = true;
                        pending.push(fetch::vehicles(Arc::clone(&self.feed)));
                    }
                }

                _ = frame_ticks.tick(), if state.is_animating() => {
                    state.tick(Instant::now());
                    publish(&frames, &mut state);
                }

                command = commands.recv() => match command {
                    Some(Command::SelectStop(stop)) => {
                        debug!(stop = %stop, "fetching arrival estimates");
                        let ticket = state.begin_eta_request(stop);
                        pending.push(fetch::etas(Arc::clone(&self.feed), ticket));
                        publish(&frames, &mut state);
                    }
                    Some(Command::ToggleRoute(route)) => {
                        let selection = state.toggle_route(route, Instant::now());
                        debug!(selected = ?selection.selected(), "route selection changed");
                        publish(&frames, &mut state);
                    }
                    Some(Command::Shutdown) | None => break,
                },

                Some(outcome) = pending.next(), if !pending.is_empty() => {
                    let was_animating = state.is_animating();
                    if let FetchOutcome::Vehicles(_) = outcome {
                        vehicles_in_flight = false;
                    }
                    apply(&mut state, outcome);

                    if !was_animating && state.is_animating() {
                        // next frame one interval from now, not a stale missed tick
                        frame_ticks.reset();
                    }
                    publish(&frames, &mut state);
                }
            }
        }

        state.halt();
        publish(&frames, &mut state);
        info!(poll_cycles = state.poll_cycle(), "fleet polling stopped");
        state
    }
}

fn apply(state: &mut FleetState, outcome: FetchOutcome) {
    match outcome {
        FetchOutcome::Stops(Ok(stops)) => {
            info!(count = stops.len(), "loaded stops");
            state.apply_stops(stops);
        }
        FetchOutcome::Stops(Err(e)) => {
            warn!(error = %e, "stop fetch failed");
        }
        FetchOutcome::Vehicles(Ok(vehicles)) => {
            let summary = state.apply_vehicles(vehicles, Instant::now());
            debug!(
                cycle = state.poll_cycle(),
                animated = summary.animated,
                snapped = summary.snapped,
                "vehicle poll applied"
            );
        }
        FetchOutcome::Vehicles(Err(e)) => {
            warn!(error = %e, "vehicle fetch failed, keeping the previous positions");
        }
        FetchOutcome::Path { route, trace } => {
            let trace = trace.unwrap_or_else(|e| {
                warn!(route = %route, error = %e, "path fetch failed");
                None
            });
            state.apply_path(route, trace);
        }
        FetchOutcome::Eta { ticket, records } => {
            state.complete_eta_request(&ticket, records);
        }
    }
}

fn publish(frames: &watch::Sender<Arc<RenderFrame>>, state: &mut FleetState) {
    frames.send_replace(Arc::new(state.frame()));
}

/// Control side of a running [`PollingCoordinator`].
///
/// Dropping the handle ends the polling task as well.
pub struct CoordinatorHandle {
    commands: mpsc::UnboundedSender<Command>,
    frames: watch::Receiver<Arc<RenderFrame>>,
    task: JoinHandle<FleetState>,
}

impl CoordinatorHandle {
    pub fn frames(&self) -> watch::Receiver<Arc<RenderFrame>> {
        self.frames.clone()
    }

    pub fn latest(&self) -> Arc<RenderFrame> {
        Arc::clone(&*self.frames.borrow())
    }

    /// Returns `false` once the coordinator has stopped.
    pub fn select_stop(&self, stop: StopIdentifier) -> bool {
        self.commands.send(Command::SelectStop(stop)).is_ok()
    }

    pub fn toggle_route(&self, route: RouteKey) -> bool {
        self.commands.send(Command::ToggleRoute(route)).is_ok()
    }

    /// Cancel the schedule and wait for the task, handing back its final state.
    pub async fn stop(self) -> Option<FleetState> {
        let _ = self.commands.send(Command::Shutdown);
        match self.task.await {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(error = %e, "polling task did not finish cleanly");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use busline_api_types::{EtaDto, FeedId, Numeric, PathDto, StopDto, VehicleDto};
    use busline_transit::{Result, StaticFeed, TransitError, VehicleIdentifier};

    use crate::filter::RouteSelection;
    use crate::view::EtaContent;

    fn bus(id: i64, route: &str, lat: &str, lon: &str) -> VehicleDto {
        VehicleDto {
            id: FeedId::Number(id),
            name: Some(id.to_string()),
            route: route.into(),
            lat: Numeric::from(lat),
            lon: Numeric::from(lon),
            course: Some(Numeric::from(180.0)),
            color: String::new(),
            pax_load: Some(Numeric::from(20.0)),
            wait_suggestion: None,
        }
    }

    fn stop_dto(id: i64, routes: &[&str]) -> StopDto {
        StopDto {
            id: FeedId::Number(id),
            name: format!("Stop {id}"),
            latitude: Numeric::from(40.5),
            longitude: Numeric::from(-74.45),
            routes: routes.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn fixture_feed() -> Arc<StaticFeed> {
        Arc::new(
            StaticFeed::new()
                .with_stops(vec![stop_dto(10034, &["EE Route"]), stop_dto(10035, &["A Route"])])
                .with_vehicles(vec![
                    bus(4021, "EE Route", "40.50", "-74.45"),
                    bus(4022, "A Route", "40.52", "-74.43"),
                ])
                .with_path("EE", vec![[40.5, -74.45], [40.51, -74.44]])
                .with_path("B_L Loop", vec![[40.5, -74.45], [40.49, -74.46]]),
        )
    }

    fn start(feed: Arc<dyn FleetFeed>) -> CoordinatorHandle {
        PollingCoordinator::new(feed, EngineConfig::default()).start()
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_schedule() {
        let feed = fixture_feed();
        let handle = start(feed.clone());

        time::sleep(Duration::from_secs(25)).await;
        let state = handle.stop().await.unwrap();

        assert_eq!(feed.stop_calls(), 1);
        assert_eq!(feed.path_calls(), state.known_routes().count());
        // t = 0, 10 and 20
        assert_eq!(feed.vehicle_calls(), 3);
        assert_eq!(state.poll_cycle(), 3);
        assert!(state.path(&RouteKey::new("B/L Loop")).is_some());
        assert!(state.path(&RouteKey::new("A")).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_schedule() {
        let feed = fixture_feed();
        let handle = start(feed.clone());

        time::sleep(Duration::from_secs(1)).await;
        handle.stop().await.unwrap();
        let calls = feed.vehicle_calls();

        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(feed.vehicle_calls(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_ends_task() {
        let feed = fixture_feed();
        let frames = {
            let handle = start(feed.clone());
            time::sleep(Duration::from_secs(1)).await;
            handle.frames()
        };

        time::sleep(Duration::from_secs(1)).await;
        // the sender lives in the task, so a closed channel means the task ended
        assert!(frames.has_changed().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_undrawable_vehicle_excluded_from_frame_only() {
        let feed = fixture_feed();
        feed.set_vehicles(vec![
            bus(1, "EE Route", "40.50", "-74.45"),
            bus(2, "EE Route", "", "-74.45"),
        ]);
        let handle = start(feed.clone());

        time::sleep(Duration::from_secs(1)).await;
        let frame = handle.latest();
        assert_eq!(frame.vehicles.len(), 1);
        assert_eq!(frame.vehicles[0].id, VehicleIdentifier::new("1"));
        assert_eq!(frame.stops.len(), 2);

        let state = handle.stop().await.unwrap();
        assert_eq!(state.vehicles().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_moved_vehicle_animates_to_new_report() {
        let feed = fixture_feed();
        let handle = start(feed.clone());
        let id = VehicleIdentifier::new("4021");

        time::sleep(Duration::from_secs(1)).await;
        feed.set_vehicles(vec![bus(4021, "EE Route", "40.51", "-74.44")]);

        // poll at t = 10 s, 1.5 s animation
        time::sleep(Duration::from_millis(9_750)).await;
        let frame = handle.latest();
        let marker = frame.vehicle(&id).unwrap();
        assert!(marker.animating);
        assert!(marker.position.y() > 40.50 && marker.position.y() < 40.51);

        time::sleep(Duration::from_secs(2)).await;
        let frame = handle.latest();
        let marker = frame.vehicle(&id).unwrap();
        assert!(!marker.animating);
        assert_eq!(marker.position, geo::Point::new(-74.44, 40.51));
        // 4022 left the feed but is not evicted yet; it is simply not drawn
        assert!(frame.vehicle(&VehicleIdentifier::new("4022")).is_none());

        handle.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_vehicle_fetch_keeps_polling() {
        let feed = fixture_feed();
        feed.clear_vehicles();
        let handle = start(feed.clone());

        time::sleep(Duration::from_secs(15)).await;
        assert!(handle.latest().vehicles.is_empty());
        assert_eq!(feed.vehicle_calls(), 2);

        feed.set_vehicles(vec![bus(7, "A Route", "40.5", "-74.4")]);
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(handle.latest().vehicles.len(), 1);

        let state = handle.stop().await.unwrap();
        assert_eq!(state.poll_cycle(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_route_filters_frame() {
        let feed = fixture_feed();
        let handle = start(feed.clone());
        time::sleep(Duration::from_secs(1)).await;

        assert!(handle.toggle_route(RouteKey::new("EE")));
        time::sleep(Duration::from_millis(10)).await;

        let frame = handle.latest();
        assert_eq!(frame.selection, RouteSelection::route(RouteKey::new("EE")));
        assert_eq!(frame.vehicles.len(), 1);
        assert_eq!(frame.stops.len(), 1);
        assert_eq!(frame.traces.len(), 1);
        assert_eq!(frame.poll_cycle, 1);

        handle.stop().await.unwrap();
    }

    /// Answers the first eta request slowly and every later one quickly.
    struct RacingEtaFeed {
        inner: StaticFeed,
        eta_calls: AtomicUsize,
    }

    impl FleetFeed for RacingEtaFeed {
        fn vehicles<'a>(
            &'a self,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<VehicleDto>>> + Send + 'a>> {
            self.inner.vehicles()
        }

        fn stops<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<Vec<StopDto>>> + Send + 'a>> {
            self.inner.stops()
        }

        fn etas<'a>(
            &'a self,
            _stop: &'a StopIdentifier,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<EtaDto>>> + Send + 'a>> {
            let first = self.eta_calls.fetch_add(1, Ordering::SeqCst) == 0;
            Box::pin(async move {
                let (delay, label) = if first {
                    (Duration::from_millis(500), "12 min")
                } else {
                    (Duration::from_millis(10), "Arriving")
                };
                time::sleep(delay).await;
                Ok(vec![EtaDto {
                    route: "A Route".into(),
                    eta: label.into(),
                }])
            })
        }

        fn path<'a>(
            &'a self,
            path_key: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Option<PathDto>>> + Send + 'a>> {
            self.inner.path(path_key)
        }
    }

    /// Fails the EE trace and has never been given any stops.
    struct BrokenPathFeed {
        inner: StaticFeed,
    }

    impl FleetFeed for BrokenPathFeed {
        fn vehicles<'a>(
            &'a self,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<VehicleDto>>> + Send + 'a>> {
            self.inner.vehicles()
        }

        fn stops<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<Vec<StopDto>>> + Send + 'a>> {
            self.inner.stops()
        }

        fn etas<'a>(
            &'a self,
            stop: &'a StopIdentifier,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<EtaDto>>> + Send + 'a>> {
            self.inner.etas(stop)
        }

        fn path<'a>(
            &'a self,
            path_key: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Option<PathDto>>> + Send + 'a>> {
            if path_key == "EE" {
                let failure: Result<Option<PathDto>> =
                    Err(TransitError::Transport("connection reset".into()));
                return Box::pin(async move { failure });
            }
            self.inner.path(path_key)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_path_and_stop_fetches_are_isolated() {
        let feed = Arc::new(BrokenPathFeed {
            inner: StaticFeed::new()
                .with_vehicles(vec![bus(4021, "EE Route", "40.50", "-74.45")])
                .with_path("EE", vec![[40.5, -74.45], [40.51, -74.44]])
                .with_path("A", vec![[40.52, -74.43], [40.53, -74.42]]),
        });
        let handle = start(feed);

        time::sleep(Duration::from_secs(15)).await;
        let frame = handle.latest();
        assert!(frame.stops.is_empty());
        assert_eq!(frame.vehicles.len(), 1);

        let state = handle.stop().await.unwrap();
        assert!(state.stops().is_empty());
        assert!(state.path(&RouteKey::new("EE")).is_none());
        assert!(state.path(&RouteKey::new("A")).is_some());
        // t = 0 and 10
        assert_eq!(state.poll_cycle(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_latest_eta_request_is_displayed() {
        let feed = Arc::new(RacingEtaFeed {
            inner: StaticFeed::new().with_stops(vec![]).with_vehicles(vec![]),
            eta_calls: AtomicUsize::new(0),
        });
        let handle = start(feed.clone());
        let stop = StopIdentifier::new("10035");

        handle.select_stop(stop.clone());
        handle.select_stop(stop.clone());

        time::sleep(Duration::from_millis(100)).await;
        let frame = handle.latest();
        let Some(EtaContent::Lines(lines)) = frame.etas_for(&stop) else {
            panic!("expected eta lines");
        };
        assert_eq!(lines[0].text, "Arriving");

        // the slow first response lands now and must be ignored
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(feed.eta_calls.load(Ordering::SeqCst), 2);
        let frame = handle.latest();
        let Some(EtaContent::Lines(lines)) = frame.etas_for(&stop) else {
            panic!("expected eta lines");
        };
        assert_eq!(lines[0].text, "Arriving");

        handle.stop().await.unwrap();
    }
}
