//! Smoothing of discrete position reports into continuous motion.

pub mod interpolator;
pub mod state;

pub use interpolator::{PositionInterpolator, UpdateSummary};
pub use state::{AnimationPhase, AnimationState, AnimationTaskId, lerp_point};
