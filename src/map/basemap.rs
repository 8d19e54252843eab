use crate::braille::BrailleCanvas;
use crate::map::geometry::draw_line;
use crate::map::projection::Viewport;

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Level of detail for base map outlines
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lod {
    Low,    // 110m - country view
    Medium, // 50m - regional
    High,   // 10m - city
}

impl Lod {
    /// Select LOD from a slippy-map zoom level
    pub fn from_level(level: f64) -> Self {
        if level < 5.0 {
            Lod::Low
        } else if level < 8.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Lod::Low => "110m",
            Lod::Medium => "50m",
            Lod::High => "10m",
        }
    }
}

/// Vector outlines drawn underneath the radar layers in place of raster tiles
#[derive(Default)]
pub struct BaseMap {
    coastlines_low: Vec<LineString>,
    coastlines_medium: Vec<LineString>,
    coastlines_high: Vec<LineString>,
    borders_medium: Vec<LineString>,
    borders_high: Vec<LineString>,
    provinces: Vec<LineString>,
}

impl BaseMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Best available coastlines for a LOD, falling back to coarser data
    fn coastlines(&self, lod: Lod) -> &[LineString] {
        let order: [&Vec<LineString>; 3] = match lod {
            Lod::High => [&self.coastlines_high, &self.coastlines_medium, &self.coastlines_low],
            Lod::Medium => [&self.coastlines_medium, &self.coastlines_low, &self.coastlines_high],
            Lod::Low => [&self.coastlines_low, &self.coastlines_medium, &self.coastlines_high],
        };
        order
            .into_iter()
            .find(|lines| !lines.is_empty())
            .map(|lines| lines.as_slice())
            .unwrap_or(&[])
    }

    fn borders(&self, lod: Lod) -> &[LineString] {
        if lod == Lod::High && !self.borders_high.is_empty() {
            &self.borders_high
        } else {
            &self.borders_medium
        }
    }

    /// Draw coastlines into `outlines`, country and province borders into `borders`
    pub fn draw(&self, outlines: &mut BrailleCanvas, borders: &mut BrailleCanvas, viewport: &Viewport) {
        let lod = Lod::from_level(viewport.level());

        for line in self.coastlines(lod) {
            draw_linestring(outlines, line, viewport);
        }
        for line in self.borders(lod) {
            draw_linestring(borders, line, viewport);
        }
        // Province borders only once a region is in view
        if viewport.level() >= 7.0 {
            for line in &self.provinces {
                draw_linestring(borders, line, viewport);
            }
        }
    }

    pub fn add_coastline(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::Low => self.coastlines_low.push(line),
            Lod::Medium => self.coastlines_medium.push(line),
            Lod::High => self.coastlines_high.push(line),
        }
    }

    pub fn add_border(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::High => self.borders_high.push(line),
            Lod::Low | Lod::Medium => self.borders_medium.push(line),
        }
    }

    pub fn add_province(&mut self, line: LineString) {
        self.provinces.push(line);
    }

    /// Any coastline loaded at any LOD
    pub fn has_data(&self) -> bool {
        !self.coastlines_low.is_empty()
            || !self.coastlines_medium.is_empty()
            || !self.coastlines_high.is_empty()
    }
}

/// Draw a linestring, skipping segments that are off-screen or wrap the antimeridian
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport) {
    if line.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;
    for &(lon, lat) in line {
        let (px, py) = viewport.project(lon, lat);
        if let Some((prev_x, prev_y)) = prev {
            let dist = ((px - prev_x).abs() + (py - prev_y).abs()) as usize;
            if dist < viewport.width && viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }
        prev = Some((px, py));
    }
}
