use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread;

use crate::error::GeolocationError;
use crate::geo::Point;

/// One-shot "current position" provider
pub trait Geolocator: Send + Sync {
    fn current_position(&self) -> Result<Point, GeolocationError>;
}

/// Position supplied by the user through config or `--location`
#[derive(Clone, Debug, Default)]
pub struct ConfiguredLocation {
    position: Option<Point>,
}

impl ConfiguredLocation {
    pub fn new(position: Option<Point>) -> Self {
        Self { position }
    }
}

impl Geolocator for ConfiguredLocation {
    fn current_position(&self) -> Result<Point, GeolocationError> {
        self.position.ok_or(GeolocationError::Unavailable)
    }
}

/// Parse `LAT,LNG`
pub fn parse_location(value: &str) -> Result<Point, GeolocationError> {
    let invalid = || GeolocationError::InvalidCoordinates(value.to_string());

    let (lat, lng) = value.split_once(',').ok_or_else(invalid)?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lng: f64 = lng.trim().parse().map_err(|_| invalid())?;

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(invalid());
    }
    Ok(Point::new(lat, lng))
}

/// Resolve the position once on a worker thread
pub fn spawn_request(locator: Arc<dyn Geolocator>) -> Receiver<Result<Point, GeolocationError>> {
    let (tx, rx) = channel();
    thread::spawn(move || {
        let result = locator.current_position();
        if let Err(e) = &result {
            log::warn!("user location unavailable: {e}");
        }
        let _ = tx.send(result);
    });
    rx
}
