use std::collections::HashMap;
use std::fmt;

use rayon::prelude::*;

use crate::radar::model::RadarMarker;
use crate::radar::region::{RegionSet, UNKNOWN};

/// Sentinel used by the region selector for "no filter"
pub const ALL: &str = "all";

/// Region filter chosen by the user
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    All,
    Region(String),
}

impl Selection {
    pub fn parse(value: &str) -> Self {
        if value == ALL {
            Selection::All
        } else {
            Selection::Region(value.to_string())
        }
    }

    /// `true` for "all" and the "unknown" bucket, which have no region center
    pub fn is_country_wide(&self) -> bool {
        match self {
            Selection::All => true,
            Selection::Region(name) => name == UNKNOWN,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str(ALL),
            Selection::Region(name) => f.write_str(name),
        }
    }
}

/// Markers bucketed by classified region.
/// Buckets keep first-seen order; markers keep input order within a bucket.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassifiedGroup {
    buckets: Vec<(String, Vec<RadarMarker>)>,
}

impl ClassifiedGroup {
    pub fn get(&self, name: &str) -> &[RadarMarker] {
        self.buckets
            .iter()
            .find(|(bucket, _)| bucket == name)
            .map(|(_, markers)| markers.as_slice())
            .unwrap_or(&[])
    }

    pub fn count(&self, name: &str) -> usize {
        self.get(name).len()
    }

    /// Sum of all bucket sizes
    pub fn total(&self) -> usize {
        self.buckets.iter().map(|(_, m)| m.len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RadarMarker])> {
        self.buckets
            .iter()
            .map(|(name, markers)| (name.as_str(), markers.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Named regions with at least one marker, sorted by name. "unknown" is excluded.
    pub fn city_options(&self) -> Vec<(String, usize)> {
        let mut cities: Vec<(String, usize)> = self
            .buckets
            .iter()
            .filter(|(name, markers)| name != UNKNOWN && !markers.is_empty())
            .map(|(name, markers)| (name.clone(), markers.len()))
            .collect();
        cities.sort_by(|a, b| a.0.cmp(&b.0));
        cities
    }
}

/// Classify every marker, in input order
pub fn classify_all<'a>(markers: &[RadarMarker], regions: &'a RegionSet) -> Vec<&'a str> {
    markers
        .par_iter()
        .map(|marker| regions.classify(marker.point()))
        .collect()
}

/// Bucket markers by classified region
pub fn group(markers: &[RadarMarker], regions: &RegionSet) -> ClassifiedGroup {
    let names = classify_all(markers, regions);

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut buckets: Vec<(String, Vec<RadarMarker>)> = Vec::new();

    for (marker, name) in markers.iter().zip(names) {
        let slot = *index.entry(name).or_insert_with(|| {
            buckets.push((name.to_string(), Vec::new()));
            buckets.len() - 1
        });
        buckets[slot].1.push(marker.clone());
    }

    ClassifiedGroup { buckets }
}

/// Keep markers whose classification matches the selection
pub fn filter(
    markers: &[RadarMarker],
    selection: &Selection,
    regions: &RegionSet,
) -> Vec<RadarMarker> {
    match selection {
        Selection::All => markers.to_vec(),
        Selection::Region(wanted) => {
            let names = classify_all(markers, regions);
            markers
                .iter()
                .zip(names)
                .filter(|(_, name)| *name == wanted.as_str())
                .map(|(marker, _)| marker.clone())
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{Bounds, Point};
    use crate::radar::model::Source;
    use crate::radar::region::Region;

    fn regions() -> RegionSet {
        let region = |name: &str, north, south, east, west| Region {
            name: name.to_string(),
            bounds: Bounds {
                north,
                south,
                east,
                west,
            },
            center: Point::new((north + south) / 2.0, (east + west) / 2.0),
        };
        RegionSet::new(vec![
            region("Ankara", 40.2, 39.6, 33.2, 32.4),
            region("Konya", 38.5, 37.3, 33.5, 31.5),
        ])
    }

    fn marker(name: &str, lat: f64, lng: f64) -> RadarMarker {
        RadarMarker {
            name: name.to_string(),
            lat,
            lng,
            source: Source::Official,
        }
    }

    fn sample() -> Vec<RadarMarker> {
        vec![
            marker("a1", 39.93, 32.86),
            marker("k1", 37.87, 32.48),
            marker("x1", 0.0, 0.0),
            marker("a2", 39.70, 32.50),
            marker("k2", 38.00, 32.00),
            marker("x2", 45.0, 10.0),
        ]
    }

    #[test]
    fn test_group_conserves_markers() {
        let markers = sample();
        let groups = group(&markers, &regions());
        assert_eq!(groups.total(), markers.len());
        assert_eq!(groups.count("Ankara"), 2);
        assert_eq!(groups.count("Konya"), 2);
        assert_eq!(groups.count(UNKNOWN), 2);
    }

    #[test]
    fn test_group_preserves_order() {
        let groups = group(&sample(), &regions());
        let names: Vec<&str> = groups.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Ankara", "Konya", UNKNOWN]);
        let ankara: Vec<&str> = groups.get("Ankara").iter().map(|m| m.name.as_str()).collect();
        assert_eq!(ankara, vec!["a1", "a2"]);
    }

    #[test]
    fn test_group_empty() {
        let groups = group(&[], &regions());
        assert_eq!(groups, ClassifiedGroup::default());
        assert!(groups.is_empty());
    }

    #[test]
    fn test_regrouping_bucket_is_stable() {
        let regions = regions();
        let groups = group(&sample(), &regions);
        for (name, markers) in groups.iter() {
            let regrouped = group(markers, &regions);
            assert_eq!(regrouped.len(), 1);
            assert_eq!(regrouped.get(name), markers);
        }
    }

    #[test]
    fn test_filter_all_is_identity() {
        let markers = sample();
        assert_eq!(filter(&markers, &Selection::All, &regions()), markers);
        assert!(filter(&[], &Selection::All, &regions()).is_empty());
    }

    #[test]
    fn test_filter_region_subset() {
        let regions = regions();
        let markers = sample();
        let konya = filter(&markers, &Selection::parse("Konya"), &regions);
        assert_eq!(konya.len(), 2);
        assert!(konya.iter().all(|m| regions.classify(m.point()) == "Konya"));
        assert!(konya.iter().all(|m| markers.contains(m)));
    }

    #[test]
    fn test_filter_unknown_bucket() {
        let unknown = filter(&sample(), &Selection::parse(UNKNOWN), &regions());
        let names: Vec<&str> = unknown.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["x1", "x2"]);
    }

    #[test]
    fn test_city_options_sorted_without_unknown() {
        let groups = group(&sample(), &regions());
        assert_eq!(
            groups.city_options(),
            vec![("Ankara".to_string(), 2), ("Konya".to_string(), 2)]
        );
    }

    #[test]
    fn test_selection_parse() {
        assert_eq!(Selection::parse("all"), Selection::All);
        assert_eq!(Selection::parse("Ankara"), Selection::Region("Ankara".into()));
        assert!(Selection::parse(UNKNOWN).is_country_wide());
        assert!(!Selection::parse("Ankara").is_country_wide());
        assert_eq!(Selection::All.to_string(), "all");
    }
}
