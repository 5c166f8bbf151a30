//! Per-vehicle animation engine.
//!
//! The interpolator receives the batch of vehicles on screen: on every poll
//! cycle through [`PositionInterpolator::update`], and when the set on screen
//! changes without a poll (a route toggle) through
//! [`PositionInterpolator::resync`]. Frames advance through
//! [`PositionInterpolator::tick`].
//!
//! A vehicle snaps to its reported position when it has no state yet or was
//! missing from the previous batch. Otherwise a changed report starts a new
//! animation from the position on screen, superseding any running one.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use busline_transit::VehicleIdentifier;
use geo::Point;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::animation::state::{AnimationState, AnimationTaskId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub snapped: usize,
    pub animated: usize,
    /// Animations among `animated` that replaced one still running
    pub superseded: usize,
    pub unchanged: usize,
    pub evicted: usize,
}

#[derive(Debug)]
pub struct PositionInterpolator {
    states: HashMap<VehicleIdentifier, AnimationState>,
    previous_batch: HashSet<VehicleIdentifier>,
    duration: Duration,
    eviction_cycles: u32,
    cycle: u64,
    next_task: u64,
}

impl PositionInterpolator {
    pub fn new(duration: Duration, eviction_cycles: u32) -> Self {
        Self {
            states: HashMap::new(),
            previous_batch: HashSet::new(),
            duration,
            eviction_cycles,
            cycle: 0,
            next_task: 0,
        }
    }

    /// Apply one poll cycle's batch, then evict vehicles that have gone
    /// unseen for too many cycles.
    pub fn update<'a>(
        &mut self,
        batch: impl IntoIterator<Item = (&'a VehicleIdentifier, Point)>,
        now: Instant,
    ) -> UpdateSummary {
        self.cycle += 1;
        let mut summary = self.apply(batch, now);
        summary.evicted = self.evict();

        debug!(
            cycle = self.cycle,
            snapped = summary.snapped,
            animated = summary.animated,
            superseded = summary.superseded,
            unchanged = summary.unchanged,
            evicted = summary.evicted,
            tracked = self.len(),
            "applied vehicle batch"
        );
        summary
    }

    /// Re-apply the latest reports after the set on screen changed between polls.
    pub fn resync<'a>(
        &mut self,
        batch: impl IntoIterator<Item = (&'a VehicleIdentifier, Point)>,
        now: Instant,
    ) -> UpdateSummary {
        self.apply(batch, now)
    }

    fn apply<'a>(
        &mut self,
        batch: impl IntoIterator<Item = (&'a VehicleIdentifier, Point)>,
        now: Instant,
    ) -> UpdateSummary {
        let mut summary = UpdateSummary::default();
        let mut current = HashSet::new();

        for (id, position) in batch {
            if !current.insert(id.clone()) {
                warn!(vehicle = %id, "duplicate vehicle id in batch, keeping the last report");
            }

            let continuous = self.previous_batch.contains(id);
            match self.states.get_mut(id) {
                Some(state) if continuous => {
                    state.refreshed_cycle = self.cycle;
                    if state.target == position {
                        summary.unchanged += 1;
                    } else {
                        self.next_task += 1;
                        let task = AnimationTaskId(self.next_task);
                        if let Some(superseded) = state.start(task, position, now) {
                            trace!(vehicle = %id, ?superseded, ?task, "superseding animation");
                            summary.superseded += 1;
                        }
                        summary.animated += 1;
                    }
                }
                _ => {
                    self.states.insert(
                        id.clone(),
                        AnimationState::snapped(position, self.duration, self.cycle),
                    );
                    summary.snapped += 1;
                }
            }
        }

        self.previous_batch = current;
        summary
    }

    fn evict(&mut self) -> usize {
        if self.eviction_cycles == 0 {
            return 0;
        }

        let before = self.states.len();
        let cycle = self.cycle;
        let limit = u64::from(self.eviction_cycles);
        self.states
            .retain(|_, state| cycle - state.refreshed_cycle < limit);
        before - self.states.len()
    }

    /// Advance every running animation to `now`. Returns how many are still running.
    pub fn tick(&mut self, now: Instant) -> usize {
        self.states
            .values_mut()
            .filter(|state| state.is_running())
            .map(|state| state.advance(now))
            .filter(|running| *running)
            .count()
    }

    /// Stop every animation where it stands.
    pub fn cancel_all(&mut self) {
        let cancelled = self
            .states
            .values_mut()
            .filter_map(AnimationState::cancel)
            .count();
        if cancelled > 0 {
            debug!(cancelled, "cancelled running animations");
        }
    }

    pub fn position(&self, id: &VehicleIdentifier) -> Option<Point> {
        self.states.get(id).map(|state| state.displayed)
    }

    pub fn state(&self, id: &VehicleIdentifier) -> Option<&AnimationState> {
        self.states.get(id)
    }

    pub fn is_animating(&self, id: &VehicleIdentifier) -> bool {
        self.states.get(id).is_some_and(AnimationState::is_running)
    }

    pub fn has_running_tasks(&self) -> bool {
        self.states.values().any(AnimationState::is_running)
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Vehicles with animation state, drawn or not
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.states.len()
    }
}
