use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_API_URL;
use crate::geo::Point;
use crate::map::{BaseLayerType, ClusterOptions, HeatOptions};

/// Where the map looks in each situation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Before any data arrives
    pub initial_center: Point,
    pub initial_zoom: u8,
    /// "all" (or "unknown") selected
    pub country_center: Point,
    pub country_zoom: u8,
    /// A single city selected
    pub region_zoom: u8,
    /// Centred on the user's position
    pub location_zoom: u8,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            initial_center: Point::new(39.9334, 32.8597),
            initial_zoom: 7,
            country_center: Point::new(39.0, 35.0),
            country_zoom: 6,
            region_zoom: 9,
            location_zoom: 12,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub request_timeout_secs: u64,
    /// Region table overriding the built-in province list
    pub regions_path: Option<PathBuf>,
    /// Directory holding Natural Earth GeoJSON files
    pub data_dir: PathBuf,
    pub base_layer: BaseLayerType,
    /// Fixed position reported as the user's location
    pub location: Option<Point>,
    pub log_file: PathBuf,
    pub view: ViewConfig,
    pub heat: HeatOptions,
    pub cluster: ClusterOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 15,
            regions_path: None,
            data_dir: PathBuf::from("data"),
            base_layer: BaseLayerType::default(),
            location: None,
            log_file: PathBuf::from("radar-map.log"),
            view: ViewConfig::default(),
            heat: HeatOptions::default(),
            cluster: ClusterOptions::default(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading config {}", path_ref.display()))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing config {}", path_ref.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.request_timeout_secs, 15);
        assert_eq!(cfg.base_layer, BaseLayerType::Osm);
        assert_eq!(cfg.view.region_zoom, 9);
        assert_eq!(cfg.heat.max_zoom, 12);
        assert_eq!(cfg.cluster.max_cluster_radius, 50.0);
    }

    #[test]
    fn config_load_reads_partial_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"base_layer: google\nlocation:\n  lat: 41.0\n  lng: 29.0\nview:\n  region_zoom: 10\nheat:\n  radius: 30\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = Config::load(&path).unwrap();

        assert_eq!(cfg.base_layer, BaseLayerType::Google);
        assert_eq!(cfg.location, Some(Point::new(41.0, 29.0)));
        assert_eq!(cfg.view.region_zoom, 10);
        assert_eq!(cfg.view.location_zoom, 12);
        assert_eq!(cfg.heat.radius, 30.0);
        assert_eq!(cfg.heat.blur, 15.0);
        assert_eq!(cfg.request_timeout_secs, 15);
    }

    #[test]
    fn config_unknown_base_layer_means_osm() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"base_layer: bing\n").unwrap();
        let path = temp.into_temp_path();
        assert_eq!(Config::load(&path).unwrap().base_layer, BaseLayerType::Osm);

        let cfg: Config = serde_yaml::from_str("base_layer: arcGIS\n").unwrap();
        assert_eq!(cfg.base_layer, BaseLayerType::ArcGis);
    }

    #[test]
    fn config_load_missing_file_fails() {
        let err = Config::load("/nonexistent/radar-map.yaml").unwrap_err();
        assert!(format!("{err:#}").contains("reading config"));
    }
}
