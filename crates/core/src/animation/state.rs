use std::time::Duration;

use geo::Point;
use tokio::time::Instant;

/// Handle of one scheduled per-frame animation. At most one is live per vehicle;
/// starting or cancelling hands back the task it replaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnimationTaskId(pub(crate) u64);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AnimationPhase {
    Idle,
    Running {
        task: AnimationTaskId,
        from: Point,
        started_at: Instant,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationState {
    pub displayed: Point,
    pub target: Point,
    pub duration: Duration,
    pub phase: AnimationPhase,
    /// Poll cycle that last carried this vehicle
    pub(crate) refreshed_cycle: u64,
}

impl AnimationState {
    pub fn snapped(position: Point, duration: Duration, cycle: u64) -> Self {
        Self {
            displayed: position,
            target: position,
            duration,
            phase: AnimationPhase::Idle,
            refreshed_cycle: cycle,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, AnimationPhase::Running { .. })
    }

    pub fn task(&self) -> Option<AnimationTaskId> {
        match self.phase {
            AnimationPhase::Running { task, .. } => Some(task),
            AnimationPhase::Idle => None,
        }
    }

    /// Fraction of the animation elapsed at `now`, in `[0, 1]`.
    pub fn progress(&self, now: Instant) -> f64 {
        let AnimationPhase::Running { started_at, .. } = self.phase else {
            return 1.0;
        };

        if self.duration.is_zero() {
            return 1.0;
        }

        let elapsed = now.saturating_duration_since(started_at);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Replace whatever task is running with `task`, moving from the position
    /// on screen right now toward `target`. Returns the superseded task.
    pub(crate) fn start(
        &mut self,
        task: AnimationTaskId,
        target: Point,
        now: Instant,
    ) -> Option<AnimationTaskId> {
        let superseded = self.task();
        self.phase = AnimationPhase::Running {
            task,
            from: self.displayed,
            started_at: now,
        };
        self.target = target;
        superseded
    }

    /// One frame step. Returns whether the animation is still running.
    pub(crate) fn advance(&mut self, now: Instant) -> bool {
        let AnimationPhase::Running { from, .. } = self.phase else {
            return false;
        };

        let progress = self.progress(now);
        if progress >= 1.0 {
            self.displayed = self.target;
            self.phase = AnimationPhase::Idle;
            return false;
        }

        self.displayed = lerp_point(from, self.target, progress);
        true
    }

    /// Stop in place, keeping the position currently on screen. Returns the
    /// cancelled task.
    pub(crate) fn cancel(&mut self) -> Option<AnimationTaskId> {
        let cancelled = self.task();
        self.phase = AnimationPhase::Idle;
        cancelled
    }
}

/// Linear interpolation of longitude and latitude independently.
pub fn lerp_point(from: Point, to: Point, t: f64) -> Point {
    if t >= 1.0 {
        return to;
    }
    let t = t.max(0.0);
    Point::new(
        from.x() + (to.x() - from.x()) * t,
        from.y() + (to.y() - from.y()) * t,
    )
}
