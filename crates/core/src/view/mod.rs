//! Engine state and the frames derived from it.
//!
//! [`FleetState`] holds the latest fetched collections, the route selection,
//! the animation state and the ETA cache. The filtered view is kept in a
//! [`Memo`] keyed on the fetched collections and the selection, so it is
//! recomputed exactly when one of them changes by value.

use std::collections::BTreeMap;
use std::sync::Arc;

use busline_transit::{
    EtaRecord, PathTrace, Result, RouteColors, RouteKey, Stop, StopIdentifier, Vehicle,
};
use itertools::Itertools;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::animation::{PositionInterpolator, UpdateSummary};
use crate::config::EngineConfig;
use crate::eta::{EtaCache, EtaTicket};
use crate::filter::{FilteredView, RouteSelection, filter_view};

pub mod frame;
pub mod memo;

pub use frame::{
    EtaContent, EtaLine, NO_ARRIVALS_TEXT, RenderFrame, RouteToggle, StopEtas, StopMarker,
    VehicleMarker, VehicleSummary,
};
pub use memo::Memo;

#[derive(Clone, Debug, PartialEq)]
struct ViewInputs {
    vehicles: Arc<[Vehicle]>,
    stops: Arc<[Stop]>,
    traces: Vec<Arc<PathTrace>>,
    selection: RouteSelection,
}

fn filtered<'m>(
    memo: &'m mut Memo<ViewInputs, FilteredView>,
    inputs: ViewInputs,
    colors: &RouteColors,
) -> &'m FilteredView {
    memo.get(inputs, |inputs| {
        filter_view(
            &inputs.vehicles,
            &inputs.stops,
            &inputs.traces,
            &inputs.selection,
            colors,
        )
    })
}

#[derive(Debug)]
pub struct FleetState {
    colors: RouteColors,
    vehicles: Arc<[Vehicle]>,
    stops: Arc<[Stop]>,
    /// `None` marks a route whose trace was requested and is unavailable
    paths: BTreeMap<RouteKey, Option<Arc<PathTrace>>>,
    /// Available traces in known-route order
    traces: Vec<Arc<PathTrace>>,
    selection: RouteSelection,
    interpolator: PositionInterpolator,
    etas: EtaCache,
    view: Memo<ViewInputs, FilteredView>,
}

impl FleetState {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            colors: config.route_colors(),
            vehicles: Arc::from([]),
            stops: Arc::from([]),
            paths: BTreeMap::new(),
            traces: Vec::new(),
            selection: RouteSelection::none(),
            interpolator: PositionInterpolator::new(
                config.animation_duration(),
                config.eviction_cycles,
            ),
            etas: EtaCache::new(config.max_eta_labels),
            view: Memo::new(),
        }
    }

    fn inputs(&self) -> ViewInputs {
        ViewInputs {
            vehicles: Arc::clone(&self.vehicles),
            stops: Arc::clone(&self.stops),
            traces: self.traces.clone(),
            selection: self.selection.clone(),
        }
    }

    // ========================================================================
    // Fetch results
    // ========================================================================

    pub fn apply_stops(&mut self, stops: Vec<Stop>) {
        let unplaced = stops.iter().filter(|stop| stop.location.is_none()).count();
        if unplaced > 0 {
            warn!(unplaced, "stops without usable coordinates will not be drawn");
        }
        self.stops = stops.into();
    }

    /// Replace the vehicle collection and advance the animation by one poll cycle.
    pub fn apply_vehicles(&mut self, vehicles: Vec<Vehicle>, now: Instant) -> UpdateSummary {
        self.vehicles = vehicles.into();

        let inputs = self.inputs();
        let view = filtered(&mut self.view, inputs, &self.colors);
        self.interpolator.update(
            view.renderable_vehicles()
                .map(|(vehicle, position)| (&vehicle.id, position)),
            now,
        )
    }

    /// Record the trace of one route. `None` or an empty trace means the
    /// route has no path to draw.
    pub fn apply_path(&mut self, route: RouteKey, trace: Option<PathTrace>) {
        let trace = trace.filter(|trace| !trace.is_empty()).map(Arc::new);
        if trace.is_none() {
            debug!(route = %route, "no path trace for route");
        }
        self.paths.insert(route, trace);

        let colors = &self.colors;
        let order = |route: &RouteKey| {
            colors
                .known_routes()
                .position(|known| known == route)
                .unwrap_or(usize::MAX)
        };
        self.traces = self
            .paths
            .values()
            .flatten()
            .sorted_by_key(|trace| order(&trace.route))
            .cloned()
            .collect();
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Toggle `route` and bring the animation in line with what is now on screen.
    pub fn toggle_route(&mut self, route: RouteKey, now: Instant) -> &RouteSelection {
        let mut selection = self.selection.clone();
        selection.toggle(route);
        self.select(selection, now);
        &self.selection
    }

    pub fn select(&mut self, selection: RouteSelection, now: Instant) {
        if selection == self.selection {
            return;
        }
        self.selection = selection;

        let inputs = self.inputs();
        let view = filtered(&mut self.view, inputs, &self.colors);
        self.interpolator.resync(
            view.renderable_vehicles()
                .map(|(vehicle, position)| (&vehicle.id, position)),
            now,
        );
    }

    pub fn selection(&self) -> &RouteSelection {
        &self.selection
    }

    // ========================================================================
    // Arrival estimates
    // ========================================================================

    pub fn begin_eta_request(&mut self, stop: StopIdentifier) -> EtaTicket {
        self.etas.issue(stop)
    }

    /// Settle a request. A failed fetch leaves whatever the stop showed before.
    pub fn complete_eta_request(
        &mut self,
        ticket: &EtaTicket,
        result: Result<Vec<EtaRecord>>,
    ) -> bool {
        match result {
            Ok(records) => self.etas.accept(ticket, &records),
            Err(e) => {
                warn!(stop = %ticket.stop, error = %e, "eta fetch failed");
                false
            }
        }
    }

    // ========================================================================
    // Frames
    // ========================================================================

    /// Advance running animations. Returns how many are still running.
    pub fn tick(&mut self, now: Instant) -> usize {
        self.interpolator.tick(now)
    }

    pub fn is_animating(&self) -> bool {
        self.interpolator.has_running_tasks()
    }

    /// Stop every animation where it stands.
    pub fn halt(&mut self) {
        self.interpolator.cancel_all();
    }

    pub fn frame(&mut self) -> RenderFrame {
        let inputs = self.inputs();
        let view = filtered(&mut self.view, inputs, &self.colors);
        let colors = &self.colors;
        let interpolator = &self.interpolator;

        let vehicles = view
            .renderable_vehicles()
            .map(|(vehicle, reported)| {
                let route = vehicle.route_key();
                VehicleMarker {
                    id: vehicle.id.clone(),
                    position: interpolator.position(&vehicle.id).unwrap_or(reported),
                    heading: vehicle.heading,
                    color: vehicle.color.unwrap_or_else(|| colors.badge(&route)),
                    animating: interpolator.is_animating(&vehicle.id),
                    summary: VehicleSummary::of(vehicle),
                    route,
                }
            })
            .collect();

        let stops = view
            .renderable_stops()
            .map(|(stop, position)| StopMarker::new(stop, position))
            .collect();

        let etas = self
            .etas
            .stops()
            .into_iter()
            .filter_map(|stop| {
                self.etas.display(stop).map(|display| StopEtas {
                    stop: stop.clone(),
                    content: EtaContent::new(display, colors),
                })
            })
            .collect();

        let routes = colors
            .known_routes()
            .map(|route| RouteToggle {
                route: route.clone(),
                color: colors.selected_trace(route),
                selected: self.selection.is_selected(route),
            })
            .collect();

        RenderFrame {
            vehicles,
            stops,
            traces: view.traces.clone(),
            etas,
            selection: self.selection.clone(),
            routes,
            poll_cycle: interpolator.cycle(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Every vehicle of the last poll, including those that cannot be drawn
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn path(&self, route: &RouteKey) -> Option<&PathTrace> {
        self.paths.get(route).and_then(|trace| trace.as_deref())
    }

    pub fn known_routes(&self) -> impl Iterator<Item = &RouteKey> {
        self.colors.known_routes()
    }

    pub fn colors(&self) -> &RouteColors {
        &self.colors
    }

    pub fn interpolator(&self) -> &PositionInterpolator {
        &self.interpolator
    }

    pub fn poll_cycle(&self) -> u64 {
        self.interpolator.cycle()
    }

    /// How many times the filtered view has been recomputed
    pub fn view_computations(&self) -> u64 {
        self.view.computations()
    }
}
