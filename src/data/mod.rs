use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Value};

use crate::map::{BaseMap, LineString, Lod};

/// Natural Earth coastline files and the LOD each one feeds
const COASTLINE_FILES: [(&str, Lod); 3] = [
    ("ne_110m_coastline.json", Lod::Low),
    ("ne_50m_coastline.json", Lod::Medium),
    ("ne_10m_coastline.json", Lod::High),
];

const BORDER_FILES: [(&str, Lod); 2] = [
    ("ne_50m_borders.json", Lod::Medium),
    ("ne_10m_borders.json", Lod::High),
];

const PROVINCE_FILE: &str = "ne_10m_states.json";

/// Load whatever base map GeoJSON exists in `data_dir`, returning how many files loaded.
/// Missing files are skipped; unreadable ones are logged and skipped.
pub fn load_base_map(base: &mut BaseMap, data_dir: &Path) -> usize {
    let mut loaded = 0;

    for (filename, lod) in COASTLINE_FILES {
        loaded += load_if_present(data_dir, filename, |line| base.add_coastline(line, lod));
    }
    for (filename, lod) in BORDER_FILES {
        loaded += load_if_present(data_dir, filename, |line| base.add_border(line, lod));
    }
    loaded += load_if_present(data_dir, PROVINCE_FILE, |line| base.add_province(line));

    log::info!("loaded {loaded} base map files from {}", data_dir.display());
    loaded
}

fn load_if_present<F>(data_dir: &Path, filename: &str, add_line: F) -> usize
where
    F: FnMut(LineString),
{
    let path = data_dir.join(filename);
    if !path.exists() {
        return 0;
    }
    match load_lines(&path, add_line) {
        Ok(()) => 1,
        Err(e) => {
            log::warn!("failed to load {filename}: {e:#}");
            0
        }
    }
}

fn load_lines<F>(path: &Path, mut add_line: F) -> Result<()>
where
    F: FnMut(LineString),
{
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let geojson: GeoJson = content
        .parse()
        .with_context(|| format!("parsing {}", path.display()))?;
    for_each_line(&geojson, &mut add_line);
    Ok(())
}

/// Visit every line (and polygon exterior ring) in a GeoJSON document
pub fn for_each_line<F>(geojson: &GeoJson, add_line: &mut F)
where
    F: FnMut(LineString),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(geometry) = &feature.geometry {
                    geometry_lines(geometry, add_line);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(geometry) = &f.geometry {
                geometry_lines(geometry, add_line);
            }
        }
        GeoJson::Geometry(geometry) => geometry_lines(geometry, add_line),
    }
}

fn geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(LineString),
{
    let to_line = |coords: &Vec<Vec<f64>>| -> LineString {
        coords
            .iter()
            .filter(|c| c.len() >= 2)
            .map(|c| (c[0], c[1]))
            .collect()
    };

    match &geometry.value {
        Value::LineString(coords) => add_line(to_line(coords)),
        Value::MultiLineString(lines) => lines.iter().for_each(|l| add_line(to_line(l))),
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_line(to_line(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                if let Some(exterior) = rings.first() {
                    add_line(to_line(exterior));
                }
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}

/// Simplified Türkiye outline for when no GeoJSON is available
pub fn generate_fallback_outline(base: &mut BaseMap) {
    // Anatolia
    base.add_coastline(
        vec![
            (26.2, 40.3), (26.7, 40.5), (27.5, 40.4), (29.0, 41.0), (29.1, 41.2),
            (30.3, 41.2), (31.2, 41.1), (32.3, 41.7), (33.5, 42.0), (35.2, 42.0),
            (36.1, 41.7), (37.0, 41.1), (38.3, 40.9), (39.7, 41.0), (41.5, 41.5),
            (42.5, 41.4), (43.5, 41.1), (43.7, 40.7), (44.8, 39.7), (44.4, 39.0),
            (44.3, 38.3), (44.8, 37.2), (44.2, 37.2), (42.3, 37.1), (40.0, 36.9),
            (38.2, 36.9), (36.7, 36.2), (36.1, 35.8), (35.8, 36.7), (34.7, 36.8),
            (34.0, 36.2), (32.6, 36.1), (31.0, 36.8), (30.6, 36.7), (30.4, 36.2),
            (29.1, 36.6), (28.0, 36.8), (27.4, 37.0), (27.2, 37.9), (26.3, 38.3),
            (26.8, 38.8), (26.6, 39.5), (26.2, 40.0), (26.2, 40.3),
        ],
        Lod::Low,
    );

    // Thrace
    base.add_coastline(
        vec![
            (26.0, 40.8), (26.2, 41.7), (26.6, 41.9), (27.5, 42.0), (28.0, 42.0),
            (29.1, 41.2), (28.6, 41.0), (27.5, 41.0), (26.8, 40.6), (26.0, 40.8),
        ],
        Lod::Low,
    );
}
