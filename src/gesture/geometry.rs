//! Pure index <-> position math for a fixed-column card grid.

/// Layout parameters for one grid. No state; all methods are pure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub cell_width: f64,
    pub cell_height: f64,
    pub columns: usize,
    pub gap: f64,
}

impl GridGeometry {
    pub fn new(cell_width: f64, cell_height: f64, columns: usize, gap: f64) -> Self {
        GridGeometry {
            cell_width,
            cell_height,
            // A grid always has at least one column.
            columns: columns.max(1),
            gap,
        }
    }

    /// Top-left corner of the cell at a linear index.
    pub fn position_of(&self, index: usize) -> (f64, f64) {
        let col = index % self.columns;
        let row = index / self.columns;
        (
            col as f64 * (self.cell_width + self.gap),
            row as f64 * (self.cell_height + self.gap),
        )
    }

    /// Linear index of the cell under a point, clamped to `[0, item_count-1]`.
    /// Degenerate cell sizes resolve to index 0 rather than dividing by zero.
    pub fn index_of(&self, x: f64, y: f64, item_count: usize) -> usize {
        if item_count == 0 {
            return 0;
        }
        let stride_x = self.cell_width + self.gap;
        let stride_y = self.cell_height + self.gap;
        if stride_x <= 0.0 || stride_y <= 0.0 {
            return 0;
        }
        let col = ((x / stride_x).floor().max(0.0) as usize).min(self.columns - 1);
        let row = (y / stride_y).floor().max(0.0) as usize;
        (row * self.columns + col).min(item_count - 1)
    }

    /// Total pixel height needed to lay out `item_count` cells.
    pub fn container_height(&self, item_count: usize) -> f64 {
        if item_count == 0 {
            return 0.0;
        }
        let rows = item_count.div_ceil(self.columns);
        rows as f64 * self.cell_height + (rows - 1) as f64 * self.gap
    }
}
