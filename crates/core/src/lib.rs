//! # busline-core
//!
//! Client-side state engine for a live bus map. Raw fleet feeds go in,
//! [`RenderFrame`]s come out:
//!
//! - [`polling`] owns the schedule and every in-flight fetch
//! - [`animation`] turns discrete position reports into smooth motion
//! - [`filter`] narrows vehicles, stops and traces to the selected route
//! - [`eta`] ranks and groups arrival estimates per stop
//! - [`view`] holds the state and builds frames from it

pub mod animation;
pub mod config;
pub mod eta;
pub mod filter;
pub mod polling;
pub mod view;

pub use busline_transit as transit;

pub mod prelude {
    pub use crate::animation::{PositionInterpolator, UpdateSummary};
    pub use crate::config::{EngineConfig, EngineConfigError};
    pub use crate::eta::{EtaDisplay, EtaRow};
    pub use crate::filter::{ColoredTrace, RouteSelection};
    pub use crate::polling::{Command, CoordinatorHandle, PollingCoordinator};
    pub use crate::view::{EtaContent, FleetState, RenderFrame};
}

pub use prelude::*;
