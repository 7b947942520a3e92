use std::time::Duration;

use indoor_map_geometry::{Beacon, Point};
use reqwest::{Client, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::MapError;

const BEACONS_PATH: &str = "api/beacons";
const POSITION_PATH: &str = "api/current_position";
const ROUTE_PATH: &str = "api/route";

/// The positioning backend as seen by the session controller.
///
/// Each call is independent; implementations share nothing but their
/// configuration. The returned futures must be `Send` so route requests can
/// run as their own tokio tasks.
pub trait Backend: Send + Sync + 'static {
    /// One-shot fetch of the static beacon set.
    fn fetch_beacons(&self) -> impl Future<Output = Result<Vec<Beacon>, MapError>> + Send;

    /// Latest position estimate of the tracked user.
    fn fetch_position(&self) -> impl Future<Output = Result<Point, MapError>> + Send;

    /// Route from the current position to `destination`, as an ordered polyline.
    fn request_route(
        &self,
        destination: Point,
    ) -> impl Future<Output = Result<Vec<Point>, MapError>> + Send;
}

#[derive(Debug, Serialize)]
struct RouteRequest {
    end_point: Point,
}

/// HTTP implementation of [`Backend`] on top of a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    /// `timeout` is applied to whole requests when set; `None` keeps the
    /// reqwest default of no timeout.
    pub fn new(base_url: &Url, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, MapError> {
        let url = self.endpoint(path);
        debug!(%url, "GET");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| MapError::Transport {
                url: url.clone(),
                source,
            })?;
        decode(url, response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, MapError> {
        let url = self.endpoint(path);
        debug!(%url, "POST");
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| MapError::Transport {
                url: url.clone(),
                source,
            })?;
        decode(url, response).await
    }
}

async fn decode<T: DeserializeOwned>(url: String, response: Response) -> Result<T, MapError> {
    let status = response.status();
    if !status.is_success() {
        return Err(MapError::Network { url, status });
    }
    response
        .json::<T>()
        .await
        .map_err(|source| MapError::Transport { url, source })
}

impl Backend for BackendClient {
    async fn fetch_beacons(&self) -> Result<Vec<Beacon>, MapError> {
        self.get_json(BEACONS_PATH).await
    }

    async fn fetch_position(&self) -> Result<Point, MapError> {
        self.get_json(POSITION_PATH).await
    }

    async fn request_route(&self, destination: Point) -> Result<Vec<Point>, MapError> {
        self.post_json(ROUTE_PATH, &RouteRequest {
            end_point: destination,
        })
        .await
    }
}
