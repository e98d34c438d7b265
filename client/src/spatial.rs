use hexmap_shared::{Bounds, HexId};

use crate::geometry::HexPath;

const GRID_COLS: usize = 64;
const GRID_ROWS: usize = 64;

/// A flat 2D bucket grid over world space for hexagon hit-testing.
/// Buckets hold indices into the path list; the final test is point-in-polygon.
pub struct SpatialGrid {
    cells: Vec<Vec<usize>>,
    bounds: Bounds,
    cell_w: f64,
    cell_h: f64,
}

impl SpatialGrid {
    pub fn build(paths: &[HexPath]) -> Self {
        let Some(bounds) = paths.iter().filter_map(|p| p.bounds).reduce(Bounds::union) else {
            return Self {
                cells: Vec::new(),
                bounds: Bounds::point(0.0, 0.0),
                cell_w: 1.0,
                cell_h: 1.0,
            };
        };

        // Degenerate extents still need a non-zero cell size.
        let cell_w = ((bounds.max_x - bounds.min_x) / GRID_COLS as f64).max(f64::EPSILON);
        let cell_h = ((bounds.max_y - bounds.min_y) / GRID_ROWS as f64).max(f64::EPSILON);

        let mut cells = vec![Vec::new(); GRID_COLS * GRID_ROWS];
        for (idx, path) in paths.iter().enumerate() {
            let Some(b) = path.bounds else {
                continue;
            };
            let col_start = ((b.min_x - bounds.min_x) / cell_w).floor().max(0.0) as usize;
            let col_end = (((b.max_x - bounds.min_x) / cell_w).floor() as usize).min(GRID_COLS - 1);
            let row_start = ((b.min_y - bounds.min_y) / cell_h).floor().max(0.0) as usize;
            let row_end = (((b.max_y - bounds.min_y) / cell_h).floor() as usize).min(GRID_ROWS - 1);

            for row in row_start..=row_end {
                for col in col_start..=col_end {
                    cells[row * GRID_COLS + col].push(idx);
                }
            }
        }

        Self {
            cells,
            bounds,
            cell_w,
            cell_h,
        }
    }

    /// World-coordinate box of every indexed hexagon, or `None` if nothing was indexed.
    pub fn world_bounds(&self) -> Option<Bounds> {
        (!self.cells.is_empty()).then_some(self.bounds)
    }

    /// Find the hexagon at a world coordinate.
    pub fn find_at(&self, paths: &[HexPath], wx: f64, wy: f64) -> Option<HexId> {
        if self.cells.is_empty() || !self.bounds.contains(wx, wy) {
            return None;
        }

        let col = (((wx - self.bounds.min_x) / self.cell_w).floor() as usize).min(GRID_COLS - 1);
        let row = (((wy - self.bounds.min_y) / self.cell_h).floor() as usize).min(GRID_ROWS - 1);

        self.cells[row * GRID_COLS + col]
            .iter()
            .filter_map(|&idx| paths.get(idx))
            .find(|path| path.contains(wx, wy))
            .map(|path| path.id)
    }
}
