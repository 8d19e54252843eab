use std::sync::mpsc::{channel, Receiver};
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;

use crate::error::FetchError;
use crate::radar::RadarData;

pub const DEFAULT_API_URL: &str = "https://labs.ramazansancar.com.tr/radar/api";

/// Blocking client for the radar API. Cheap to clone.
#[derive(Clone)]
pub struct RadarClient {
    client: Client,
    url: String,
}

impl RadarClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// One GET, no retries. Any non-2xx status is a failure.
    pub fn fetch(&self) -> Result<RadarData, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .header(USER_AGENT, concat!("radar-map/", env!("CARGO_PKG_VERSION")))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let mut body = response.bytes()?.to_vec();
        parse_radar_data(&mut body)
    }
}

/// Decode an API payload. The buffer is used as scratch space by the parser.
pub fn parse_radar_data(body: &mut [u8]) -> Result<RadarData, FetchError> {
    Ok(simd_json::serde::from_slice(body)?)
}

/// Run one fetch on a worker thread; the result arrives on the returned channel
pub fn spawn_fetch(client: RadarClient) -> Receiver<Result<RadarData, FetchError>> {
    let (tx, rx) = channel();
    thread::spawn(move || {
        log::info!("fetching radar data from {}", client.url());
        let result = client.fetch();
        match &result {
            Ok(data) => log::info!(
                "received {} markers (cache_at {})",
                data.markers.len(),
                data.meta.cache_at
            ),
            Err(e) => log::warn!("radar fetch failed: {e}"),
        }
        // Receiver may be gone if the app quit mid-fetch
        let _ = tx.send(result);
    });
    rx
}
