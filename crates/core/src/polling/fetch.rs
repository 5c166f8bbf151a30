//! In-flight feed requests.
//!
//! Each request owns a handle to the feed and resolves to a [`FetchOutcome`],
//! so the coordinator can keep any number of them in one `FuturesUnordered`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use busline_transit::{EtaRecord, FleetFeed, PathTrace, Result, RouteKey, Stop, Vehicle};

use crate::eta::EtaTicket;

pub(crate) enum FetchOutcome {
    Stops(Result<Vec<Stop>>),
    Vehicles(Result<Vec<Vehicle>>),
    Path {
        route: RouteKey,
        trace: Result<Option<PathTrace>>,
    },
    Eta {
        ticket: EtaTicket,
        records: Result<Vec<EtaRecord>>,
    },
}

pub(crate) type PendingFetch = Pin<Box<dyn Future<Output = FetchOutcome> + Send>>;

pub(crate) fn stops(feed: Arc<dyn FleetFeed>) -> PendingFetch {
    Box::pin(async move {
        let stops = feed
            .stops()
            .await
            .map(|dtos| dtos.into_iter().map(Stop::from).collect());
        FetchOutcome::Stops(stops)
    })
}

pub(crate) fn vehicles(feed: Arc<dyn FleetFeed>) -> PendingFetch {
    Box::pin(async move {
        let vehicles = feed
            .vehicles()
            .await
            .map(|dtos| dtos.into_iter().map(Vehicle::from).collect());
        FetchOutcome::Vehicles(vehicles)
    })
}

pub(crate) fn path(feed: Arc<dyn FleetFeed>, route: RouteKey) -> PendingFetch {
    Box::pin(async move {
        let key = route.path_key();
        let trace = feed
            .path(&key)
            .await
            .map(|dto| dto.map(|points| PathTrace::from_dto(route.clone(), &points)));
        FetchOutcome::Path { route, trace }
    })
}

pub(crate) fn etas(feed: Arc<dyn FleetFeed>, ticket: EtaTicket) -> PendingFetch {
    Box::pin(async move {
        let records = feed
            .etas(&ticket.stop)
            .await
            .map(|dtos| dtos.into_iter().map(EtaRecord::from).collect());
        FetchOutcome::Eta { ticket, records }
    })
}
