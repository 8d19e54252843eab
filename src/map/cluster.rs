use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::map::spatial::SpatialGrid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterOptions {
    /// Markers closer than this (screen pixels) merge into one cluster
    pub max_cluster_radius: f64,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            max_cluster_radius: 50.0,
        }
    }
}

/// Presentational size class of a cluster glyph
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClusterSize {
    Small,
    Medium,
    Large,
}

impl ClusterSize {
    /// `< 20` small, `20..=100` medium, `> 100` large
    pub fn from_count(count: usize) -> Self {
        if count > 100 {
            ClusterSize::Large
        } else if count >= 20 {
            ClusterSize::Medium
        } else {
            ClusterSize::Small
        }
    }

    /// Icon diameter in screen pixels
    pub fn diameter(&self) -> u16 {
        match self {
            ClusterSize::Small => 40,
            ClusterSize::Medium => 50,
            ClusterSize::Large => 60,
        }
    }

    pub fn color(&self) -> [u8; 3] {
        match self {
            ClusterSize::Small => [0x3b, 0x82, 0xf6],
            ClusterSize::Medium => [0xf5, 0x9e, 0x0b],
            ClusterSize::Large => [0xdc, 0x26, 0x26],
        }
    }
}

/// What a cluster glyph looks like
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterIcon {
    pub size: ClusterSize,
    pub label: String,
}

/// Builds the icon for a cluster from its child count
pub type ClusterIconFactory = fn(usize) -> ClusterIcon;

/// Default factory: size class from the count, count as the label
pub fn count_icon(count: usize) -> ClusterIcon {
    ClusterIcon {
        size: ClusterSize::from_count(count),
        label: count.to_string(),
    }
}

/// A group of nearby points in screen space
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenCluster {
    /// Mean position of the members
    pub center: DVec2,
    /// Indices into the input slice, ascending
    pub members: Vec<usize>,
}

/// Greedy distance clustering. Points are visited in input order; each
/// unassigned point seeds a cluster that absorbs every unassigned point
/// within `radius` of it.
pub fn cluster_points(points: &[DVec2], radius: f64) -> Vec<ScreenCluster> {
    let mut grid = SpatialGrid::new(radius.max(1.0));
    for (idx, p) in points.iter().enumerate() {
        grid.insert(p.x, p.y, idx);
    }

    let mut assigned = vec![false; points.len()];
    let mut clusters = Vec::new();

    for seed in 0..points.len() {
        if assigned[seed] {
            continue;
        }
        let origin = points[seed];

        let members: Vec<usize> = grid
            .query_radius(origin.x, origin.y, radius)
            .into_iter()
            .filter_map(|cell_idx| grid.get(cell_idx).copied())
            .filter(|&idx| !assigned[idx] && points[idx].distance(origin) <= radius)
            .collect();

        let mut sum = DVec2::ZERO;
        for &idx in &members {
            assigned[idx] = true;
            sum += points[idx];
        }

        clusters.push(ScreenCluster {
            center: sum / members.len().max(1) as f64,
            members,
        });
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_thresholds() {
        assert_eq!(ClusterSize::from_count(2), ClusterSize::Small);
        assert_eq!(ClusterSize::from_count(19), ClusterSize::Small);
        assert_eq!(ClusterSize::from_count(20), ClusterSize::Medium);
        assert_eq!(ClusterSize::from_count(100), ClusterSize::Medium);
        assert_eq!(ClusterSize::from_count(101), ClusterSize::Large);
    }

    #[test]
    fn test_icon_sizes_grow() {
        assert!(ClusterSize::Small.diameter() < ClusterSize::Medium.diameter());
        assert!(ClusterSize::Medium.diameter() < ClusterSize::Large.diameter());
        assert_eq!(count_icon(150).label, "150");
        assert_eq!(count_icon(150).size, ClusterSize::Large);
    }

    #[test]
    fn test_nearby_points_merge() {
        let points = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(100.0, 100.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(101.0, 99.0),
            DVec2::new(4.0, 0.0),
        ];
        let clusters = cluster_points(&points, 5.0);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].members, vec![0, 2, 4]);
        assert_eq!(clusters[0].center, DVec2::new(2.0, 0.0));
        assert_eq!(clusters[1].members, vec![1, 3]);
    }

    #[test]
    fn test_every_point_in_exactly_one_cluster() {
        let points: Vec<DVec2> = (0..200)
            .map(|i| DVec2::new((i * 7 % 97) as f64, (i * 13 % 89) as f64))
            .collect();
        let clusters = cluster_points(&points, 12.0);
        let mut seen: Vec<usize> = clusters.iter().flat_map(|c| c.members.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..200).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_input() {
        assert!(cluster_points(&[], 10.0).is_empty());
    }
}
