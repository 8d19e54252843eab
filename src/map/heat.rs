use serde::{Deserialize, Serialize};

/// Density overlay settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatOptions {
    /// Point radius in screen pixels
    pub radius: f64,
    /// Extra falloff distance in screen pixels
    pub blur: f64,
    /// Zoom level at which a single point reaches full weight
    pub max_zoom: u8,
    pub min_opacity: f64,
    /// (stop, rgb) pairs, stops ascending in 0..=1
    pub gradient: Vec<(f64, [u8; 3])>,
}

impl Default for HeatOptions {
    fn default() -> Self {
        Self {
            radius: 25.0,
            blur: 15.0,
            max_zoom: 12,
            min_opacity: 0.4,
            gradient: vec![
                (0.0, [0, 0, 255]),
                (0.2, [0, 255, 255]),
                (0.4, [0, 255, 0]),
                (0.6, [255, 255, 0]),
                (0.8, [255, 165, 0]),
                (1.0, [255, 0, 0]),
            ],
        }
    }
}

impl HeatOptions {
    /// Gradient color at intensity `v` (clamped to 0..=1)
    pub fn color_at(&self, v: f64) -> [u8; 3] {
        let v = v.clamp(0.0, 1.0);
        let Some(&(first_stop, first_rgb)) = self.gradient.first() else {
            return [255, 0, 0];
        };
        if v <= first_stop {
            return first_rgb;
        }

        for pair in self.gradient.windows(2) {
            let (s0, c0) = pair[0];
            let (s1, c1) = pair[1];
            if v <= s1 {
                let t = if s1 > s0 { (v - s0) / (s1 - s0) } else { 1.0 };
                return lerp_rgb(c0, c1, t);
            }
        }
        self.gradient.last().map(|&(_, c)| c).unwrap_or(first_rgb)
    }

    /// Gradient color blended toward black by opacity
    /// (`min_opacity` at zero intensity, fully opaque at one)
    pub fn shade(&self, v: f64) -> [u8; 3] {
        let v = v.clamp(0.0, 1.0);
        let alpha = self.min_opacity + (1.0 - self.min_opacity) * v;
        let [r, g, b] = self.color_at(v);
        [
            (r as f64 * alpha).round() as u8,
            (g as f64 * alpha).round() as u8,
            (b as f64 * alpha).round() as u8,
        ]
    }

    /// Per-point weight multiplier at a zoom level: halves for each level below `max_zoom`
    pub fn zoom_scale(&self, level: f64) -> f64 {
        let steps = (self.max_zoom as f64 - level).clamp(0.0, 12.0);
        1.0 / 2f64.powf(steps)
    }
}

#[inline(always)]
fn lerp_rgb(a: [u8; 3], b: [u8; 3], t: f64) -> [u8; 3] {
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])]
}

/// Accumulated density per terminal character cell.
/// Positions are given in Braille dots (2 per column, 4 per row).
pub struct HeatGrid {
    cols: usize,
    rows: usize,
    cells: Vec<f64>,
}

impl HeatGrid {
    /// Intensities below this are not drawn
    pub const VISIBLE_THRESHOLD: f64 = 0.02;

    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![0.0; cols * rows],
        }
    }

    /// Rebuild from `(x_dot, y_dot, weight)` points with a linear kernel of `reach` dots
    pub fn rebuild(&mut self, points: impl Iterator<Item = (f64, f64, f64)>, reach: f64) {
        self.cells.fill(0.0);
        let reach = reach.max(1.0);
        let reach_cols = (reach / 2.0).ceil() as i64;
        let reach_rows = (reach / 4.0).ceil() as i64;

        for (x, y, weight) in points {
            let col = (x / 2.0).floor() as i64;
            let row = (y / 4.0).floor() as i64;

            for r in (row - reach_rows)..=(row + reach_rows) {
                if r < 0 || r >= self.rows as i64 {
                    continue;
                }
                for c in (col - reach_cols)..=(col + reach_cols) {
                    if c < 0 || c >= self.cols as i64 {
                        continue;
                    }
                    // Distance from the point to the cell center, in dots
                    let dx = c as f64 * 2.0 + 1.0 - x;
                    let dy = r as f64 * 4.0 + 2.0 - y;
                    let falloff = 1.0 - (dx * dx + dy * dy).sqrt() / reach;
                    if falloff > 0.0 {
                        self.cells[r as usize * self.cols + c as usize] += weight * falloff;
                    }
                }
            }
        }
    }

    /// Cells at or above the visible threshold as `(col, row, intensity 0..=1)`
    pub fn iter_cells(&self) -> impl Iterator<Item = (u16, u16, f64)> + '_ {
        self.cells.iter().enumerate().filter_map(|(idx, &value)| {
            let v = value.min(1.0);
            if v >= Self::VISIBLE_THRESHOLD {
                Some(((idx % self.cols) as u16, (idx / self.cols) as u16, v))
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_endpoints_and_midpoint() {
        let opts = HeatOptions::default();
        assert_eq!(opts.color_at(0.0), [0, 0, 255]);
        assert_eq!(opts.color_at(1.0), [255, 0, 0]);
        assert_eq!(opts.color_at(0.5), [128, 255, 0]);
        assert_eq!(opts.color_at(7.0), [255, 0, 0]);
    }

    #[test]
    fn test_shade_uses_min_opacity() {
        let opts = HeatOptions::default();
        assert_eq!(opts.shade(0.0), [0, 0, 102]);
        assert_eq!(opts.shade(1.0), [255, 0, 0]);
    }

    #[test]
    fn test_zoom_scale() {
        let opts = HeatOptions::default();
        assert_eq!(opts.zoom_scale(12.0), 1.0);
        assert_eq!(opts.zoom_scale(15.0), 1.0);
        assert_eq!(opts.zoom_scale(10.0), 0.25);
        assert_eq!(opts.zoom_scale(-20.0), 1.0 / 4096.0);
    }

    #[test]
    fn test_single_point_peaks_at_its_cell() {
        let mut grid = HeatGrid::new(10, 5);
        grid.rebuild(std::iter::once((9.0, 10.0, 1.0)), 8.0);
        let peak = grid
            .iter_cells()
            .max_by(|a, b| a.2.total_cmp(&b.2))
            .unwrap();
        assert_eq!((peak.0, peak.1), (4, 2));
    }

    #[test]
    fn test_density_accumulates_and_saturates() {
        let mut grid = HeatGrid::new(4, 2);
        let points = (0..50).map(|_| (3.0, 2.0, 1.0));
        grid.rebuild(points, 4.0);
        let (_, _, v) = grid.iter_cells().find(|c| c.0 == 1 && c.1 == 0).unwrap();
        assert_eq!(v, 1.0);
    }

    #[test]
    fn test_points_off_grid_are_ignored() {
        let mut grid = HeatGrid::new(4, 2);
        grid.rebuild(std::iter::once((-100.0, -100.0, 1.0)), 6.0);
        assert_eq!(grid.iter_cells().count(), 0);
    }
}
