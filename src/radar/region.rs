use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::RegionError;
use crate::geo::{Bounds, Point};

/// Bucket name for points that fall outside every region
pub const UNKNOWN: &str = "unknown";

/// Built-in Türkiye province table
const BUILTIN_REGIONS: &[u8] = include_bytes!("../../data/cities.json");

/// A named administrative region approximated by a bounding box
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub name: String,
    pub bounds: Bounds,
    pub center: Point,
}

#[derive(Deserialize)]
struct RegionRecord {
    name: String,
    lat: f64,
    lng: f64,
    bounds: Bounds,
}

#[derive(Deserialize)]
struct RegionFile {
    cities: Vec<RegionRecord>,
}

/// Map a point to the first region (in list order) whose box contains it
pub fn classify(point: Point, regions: &[Region]) -> &str {
    regions
        .iter()
        .find(|region| region.bounds.contains(point))
        .map(|region| region.name.as_str())
        .unwrap_or(UNKNOWN)
}

/// Ordered, immutable region table
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionSet {
    regions: Vec<Region>,
}

impl RegionSet {
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    /// The province table compiled into the binary
    pub fn builtin() -> Result<Self, RegionError> {
        let mut bytes = BUILTIN_REGIONS.to_vec();
        Self::from_json(&mut bytes)
    }

    /// Load a `{ "cities": [...] }` document from disk
    pub fn load(path: &Path) -> Result<Self, RegionError> {
        let mut bytes = fs::read(path).map_err(|source| RegionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&mut bytes)
    }

    /// Parse a region document. The buffer is used as scratch space by the parser.
    pub fn from_json(bytes: &mut [u8]) -> Result<Self, RegionError> {
        let file: RegionFile = simd_json::serde::from_slice(bytes)?;
        let regions = file
            .cities
            .into_iter()
            .map(|r| Region {
                name: r.name,
                bounds: r.bounds,
                center: Point::new(r.lat, r.lng),
            })
            .collect();
        Ok(Self { regions })
    }

    #[inline(always)]
    pub fn classify(&self, point: Point) -> &str {
        classify(point, &self.regions)
    }

    /// Case-insensitive lookup by name
    pub fn find(&self, name: &str) -> Option<&Region> {
        let needle = name.to_lowercase();
        self.regions.iter().find(|r| r.name.to_lowercase() == needle)
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
