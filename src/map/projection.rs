use std::f64::consts::PI;

use crate::geo::Point;

/// Slippy-map zoom level 0 maps to this scale factor
const LEVEL_ZERO_SCALE: f64 = 0.25;

const MIN_LEVEL: f64 = 0.0;
const MAX_LEVEL: f64 = 19.0;

/// Scale factor for a slippy-map zoom level (world width = scale * canvas width)
#[inline(always)]
pub fn scale_for_level(level: f64) -> f64 {
    LEVEL_ZERO_SCALE * 2f64.powf(level)
}

/// Inverse of [`scale_for_level`]
#[inline(always)]
pub fn level_for_scale(scale: f64) -> f64 {
    (scale / LEVEL_ZERO_SCALE).log2()
}

#[inline(always)]
fn mercator_y(lat: f64) -> f64 {
    let lat_rad = lat * PI / 180.0;
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

/// Web Mercator view over a Braille pixel canvas
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Scale factor (higher = more zoomed in)
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            width,
            height,
        }
    }

    /// View centered on a point at a slippy-map zoom level
    pub fn centered(center: Point, level: u8, width: usize, height: usize) -> Self {
        let mut vp = Self::new(0.0, 0.0, 1.0, width, height);
        vp.set_view(center, level);
        vp
    }

    /// Jump to a center and zoom level
    pub fn set_view(&mut self, center: Point, level: u8) {
        self.center_lon = center.lng.clamp(-180.0, 180.0);
        self.center_lat = center.lat.clamp(-85.0, 85.0);
        self.zoom = scale_for_level((level as f64).clamp(MIN_LEVEL, MAX_LEVEL));
    }

    /// Current (fractional) slippy-map zoom level
    pub fn level(&self) -> f64 {
        level_for_scale(self.zoom)
    }

    pub fn center(&self) -> Point {
        Point::new(self.center_lat, self.center_lon)
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        if self.width == 0 {
            return;
        }
        let scale = 360.0 / (self.zoom * self.width as f64);
        self.center_lon += dx as f64 * scale;
        self.center_lat -= dy as f64 * scale * 0.5;

        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }

        self.center_lat = self.center_lat.clamp(-85.0, 85.0);
    }

    /// One zoom level in
    pub fn zoom_in(&mut self) {
        self.zoom = self.clamp_zoom(self.zoom * 2.0);
    }

    /// One zoom level out
    pub fn zoom_out(&mut self) {
        self.zoom = self.clamp_zoom(self.zoom / 2.0);
    }

    /// Zoom in keeping the geographic point under (px, py) fixed
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 2.0);
    }

    /// Zoom out keeping the geographic point under (px, py) fixed
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 0.5);
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(scale_for_level(MIN_LEVEL), scale_for_level(MAX_LEVEL))
    }

    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);

        self.zoom = self.clamp_zoom(self.zoom * factor);

        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Pixel coordinates back to (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let scale = self.zoom * self.width as f64;

        let center_x = (self.center_lon + 180.0) / 360.0;
        let center_y = mercator_y(self.center_lat);

        let x = (px as f64 - self.width as f64 / 2.0) / scale + center_x;
        let y = (py as f64 - self.height as f64 / 2.0) / scale + center_y;

        let lon = x * 360.0 - 180.0;
        let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
        let lat = lat_rad * 180.0 / PI;

        (lon, lat)
    }

    /// Project (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let (x, y) = self.project_f64(lon, lat);
        (x as i32, y as i32)
    }

    /// Sub-pixel projection, used where rounding would bias distances
    pub fn project_f64(&self, lon: f64, lat: f64) -> (f64, f64) {
        let x = (lon + 180.0) / 360.0;
        let y = mercator_y(lat);

        let center_x = (self.center_lon + 180.0) / 360.0;
        let center_y = mercator_y(self.center_lat);

        let scale = self.zoom * self.width as f64;

        (
            (x - center_x) * scale + self.width as f64 / 2.0,
            (y - center_y) * scale + self.height as f64 / 2.0,
        )
    }

    /// Check if a projected point is visible in the viewport (with a small margin)
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= -10 && px < self.width as i32 + 10 && py >= -10 && py < self.height as i32 + 10
    }

    /// Rough bounding box check for a line segment
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        let (x, y) = vp.project(0.0, 0.0);
        assert_eq!(x, 50);
        assert_eq!(y, 50);
    }

    #[test]
    fn test_pan() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        vp.pan(10, 0);
        assert!(vp.center_lon > 0.0);
    }

    #[test]
    fn test_set_view_level_roundtrip() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 200, 120);
        vp.set_view(Point::new(39.0, 35.0), 6);
        assert!((vp.level() - 6.0).abs() < 1e-9);
        assert_eq!(vp.center(), Point::new(39.0, 35.0));

        vp.zoom_in();
        assert!((vp.level() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_set_view_projects_center_to_middle() {
        let vp = Viewport::centered(Point::new(39.93, 32.86), 9, 200, 120);
        let (x, y) = vp.project(32.86, 39.93);
        assert_eq!((x, y), (100, 60));
    }

    #[test]
    fn test_unproject_inverts_project() {
        let vp = Viewport::centered(Point::new(39.0, 35.0), 6, 400, 200);
        let (px, py) = vp.project(30.0, 38.0);
        let (lon, lat) = vp.unproject(px, py);
        assert!((lon - 30.0).abs() < 0.1);
        assert!((lat - 38.0).abs() < 0.1);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut vp = Viewport::centered(Point::new(0.0, 0.0), 19, 100, 100);
        vp.zoom_in();
        assert!((vp.level() - 19.0).abs() < 1e-9);
    }
}
