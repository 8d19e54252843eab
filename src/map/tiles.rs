use std::fmt;

use serde::{Deserialize, Serialize};

/// Base map provider selectable by the user.
/// Config and CLI values go through [`BaseLayerType::from_name`], so unknown names mean OSM.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BaseLayerType {
    #[default]
    Osm,
    ArcGis,
    Google,
}

/// Descriptive tile-server metadata for a provider
#[derive(Clone, Debug, PartialEq)]
pub struct TileProvider {
    pub label: &'static str,
    pub attribution: &'static str,
    /// Deepest zoom level the provider serves
    pub max_zoom: u8,
}

const OSM: TileProvider = TileProvider {
    label: "OSM",
    attribution: "© OpenStreetMap contributors",
    max_zoom: 19,
};

const ARCGIS: TileProvider = TileProvider {
    label: "arcGIS",
    attribution: "© Esri, DigitalGlobe, GeoEye, Earthstar Geographics, CNES/Airbus DS",
    max_zoom: 19,
};

const GOOGLE: TileProvider = TileProvider {
    label: "Google",
    attribution: "© Google Maps contributors",
    max_zoom: 19,
};

impl BaseLayerType {
    pub const ALL: [BaseLayerType; 3] = [BaseLayerType::Osm, BaseLayerType::ArcGis, BaseLayerType::Google];

    pub fn provider(&self) -> &'static TileProvider {
        match self {
            BaseLayerType::Osm => &OSM,
            BaseLayerType::ArcGis => &ARCGIS,
            BaseLayerType::Google => &GOOGLE,
        }
    }

    /// Look up by name; unknown names fall back to OSM
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "arcgis" => BaseLayerType::ArcGis,
            "google" => BaseLayerType::Google,
            _ => BaseLayerType::Osm,
        }
    }

    /// Next provider in selector order, wrapping around
    pub fn next(&self) -> Self {
        match self {
            BaseLayerType::Osm => BaseLayerType::ArcGis,
            BaseLayerType::ArcGis => BaseLayerType::Google,
            BaseLayerType::Google => BaseLayerType::Osm,
        }
    }
}

impl From<String> for BaseLayerType {
    fn from(value: String) -> Self {
        BaseLayerType::from_name(&value)
    }
}

impl From<BaseLayerType> for String {
    fn from(value: BaseLayerType) -> Self {
        match value {
            BaseLayerType::Osm => "osm".to_string(),
            BaseLayerType::ArcGis => "arcgis".to_string(),
            BaseLayerType::Google => "google".to_string(),
        }
    }
}

impl fmt::Display for BaseLayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.provider().label)
    }
}
