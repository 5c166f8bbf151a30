//! HTTP transport for the fleet feeds.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use busline_api_types::{EtaDto, PathDto, StopDto, VehicleDto};
use busline_transit::{FleetFeed, Result, StopIdentifier, TransitError};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

pub struct HttpFeed {
    client: Client,
    base: Url,
}

impl HttpFeed {
    pub fn new(base: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransitError::Transport(format!("building http client: {e}")))?;

        Ok(Self { client, base })
    }

    /// `base` with `segments` appended, each one percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| TransitError::InvalidData(format!("{} cannot be a base url", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned + Send>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments)?;
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| TransitError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransitError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| TransitError::Decode(format!("{url}: {e}")))
    }
}

impl FleetFeed for HttpFeed {
    fn vehicles<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<VehicleDto>>> + Send + 'a>> {
        Box::pin(self.get::<Vec<VehicleDto>>(&["buses"]))
    }

    fn stops<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<Vec<StopDto>>> + Send + 'a>> {
        Box::pin(self.get::<Vec<StopDto>>(&["stops"]))
    }

    fn etas<'a>(
        &'a self,
        stop: &'a StopIdentifier,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<EtaDto>>> + Send + 'a>> {
        Box::pin(async move { self.get::<Vec<EtaDto>>(&["eta", stop.as_str()]).await })
    }

    fn path<'a>(
        &'a self,
        path_key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<PathDto>>> + Send + 'a>> {
        Box::pin(async move { found(self.get::<PathDto>(&["route_polyline", path_key]).await) })
    }
}

/// A 404 means the resource does not exist, which is not a failure.
fn found<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(TransitError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
