//! Terminal map of traffic radar locations across Türkiye.
//!
//! Radar markers are fetched once from a remote API, bucketed by province
//! with a bounding-box classifier, and drawn on a Braille map as clustered
//! markers over a density heat layer.

pub mod api;
pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod error;
pub mod geo;
pub mod geolocation;
pub mod map;
pub mod radar;
pub mod ui;
