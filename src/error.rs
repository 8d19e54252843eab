use std::path::PathBuf;

use thiserror::Error;

use crate::map::LayerId;

/// Failure to obtain radar data from the remote API
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("radar data could not be fetched: {0}")]
    Http(#[from] reqwest::Error),
    #[error("radar data could not be fetched (HTTP {0})")]
    Status(u16),
    #[error("radar data is malformed: {0}")]
    Parse(#[from] simd_json::Error),
    #[error("fetch worker exited before reporting a result")]
    Disconnected,
}

/// Failure to load the static region table
#[derive(Error, Debug)]
pub enum RegionError {
    #[error("reading region table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing region table: {0}")]
    Parse(#[from] simd_json::Error),
}

/// Failure reported by a rendering surface
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("rendering surface is not ready")]
    NotReady,
    #[error("unknown layer {0:?}")]
    UnknownLayer(LayerId),
    #[error("layer {0:?} is not a cluster group")]
    NotACluster(LayerId),
    #[error("invalid layer input: {0}")]
    InvalidInput(String),
}

/// Failure to resolve the user's current position
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeolocationError {
    #[error("location is unavailable")]
    Unavailable,
    #[error("location permission was denied")]
    Denied,
    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(String),
}
