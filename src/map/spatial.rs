use std::collections::HashMap;

/// Uniform hash grid over planar coordinates (screen pixels here).
/// Items are stored once; cells hold indices into `items`.
pub struct SpatialGrid<T> {
    cells: HashMap<(i32, i32), Vec<usize>>,
    items: Vec<T>,
    cell_size: f64,
}

impl<T> SpatialGrid<T> {
    /// `cell_size` must be positive
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            items: Vec::new(),
            cell_size: cell_size.max(f64::EPSILON),
        }
    }

    #[inline(always)]
    fn to_cell(&self, x: f64, y: f64) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    /// Insert an item at a position, returning its index
    pub fn insert(&mut self, x: f64, y: f64, item: T) -> usize {
        let idx = self.items.len();
        self.items.push(item);
        let cell = self.to_cell(x, y);
        self.cells.entry(cell).or_default().push(idx);
        idx
    }

    /// Indices of items in cells overlapping the square of `radius` around (x, y).
    /// Candidates only: callers do the exact distance check. Sorted ascending.
    pub fn query_radius(&self, x: f64, y: f64, radius: f64) -> Vec<usize> {
        let (cx, cy) = self.to_cell(x, y);
        let reach = (radius / self.cell_size).ceil() as i32;

        let mut results = Vec::new();
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                if let Some(indices) = self.cells.get(&(cx + dx, cy + dy)) {
                    results.extend_from_slice(indices);
                }
            }
        }
        results.sort_unstable();
        results
    }

    #[inline(always)]
    pub fn get(&self, idx: usize) -> Option<&T> {
        self.items.get(idx)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
