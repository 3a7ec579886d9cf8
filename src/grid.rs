// Copyright (c) 2026 rezky_nightky

//! Character-grid geometry: canvas pixels, cell size, terminal mapping.

/// Pixels per terminal cell when the terminal does not report its window size.
pub const FALLBACK_CELL_PX: (u32, u32) = (8, 16);

/// Grid cells per terminal cell along each axis. Finer cells would only
/// overdraw the same terminal cell.
pub const MAX_CELLS_PER_TERMINAL_CELL: u16 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub cols: u16,
    pub rows: u16,
    pub px_w: u32,
    pub px_h: u32,
}

impl Viewport {
    /// `px` is the reported window size; zero means unknown.
    pub fn new(cols: u16, rows: u16, px: (u32, u32)) -> Self {
        let (px_w, px_h) = if px.0 == 0 || px.1 == 0 {
            (
                cols as u32 * FALLBACK_CELL_PX.0,
                rows as u32 * FALLBACK_CELL_PX.1,
            )
        } else {
            px
        };
        Self {
            cols,
            rows,
            px_w,
            px_h,
        }
    }

    pub fn with_canvas_px(mut self, w: Option<u32>, h: Option<u32>) -> Self {
        if let Some(w) = w {
            self.px_w = w.max(1);
        }
        if let Some(h) = h {
            self.px_h = h.max(1);
        }
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellSize {
    pub w: f32,
    pub h: f32,
}

impl std::str::FromStr for CellSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = s
            .split_once(['x', 'X', ','])
            .ok_or_else(|| "expected: WIDTHxHEIGHT".to_string())?;
        let w: f32 = a.trim().parse().map_err(|_| "invalid width".to_string())?;
        let h: f32 = b.trim().parse().map_err(|_| "invalid height".to_string())?;
        if !(w.is_finite() && h.is_finite()) || w < 1.0 || h < 1.0 {
            return Err("cell size must be >= 1x1".to_string());
        }
        Ok(Self { w, h })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid {
    pub cols: u16,
    pub rows: u16,
    pub cell_w: f32,
    pub cell_h: f32,
    pub viewport: Viewport,
}

fn fit_axis(px: u32, cell: f32, term_cells: u16) -> (u16, f32) {
    let max = term_cells.saturating_mul(MAX_CELLS_PER_TERMINAL_CELL);
    let count = (px as f32 / cell).ceil();
    if count > max as f32 {
        (max, if max > 0 { px as f32 / max as f32 } else { cell })
    } else {
        (count.max(0.0) as u16, cell)
    }
}

impl Grid {
    /// `cols = ceil(px_w / cell_w)`, `rows = ceil(px_h / cell_h)`, where the
    /// cell is the base cell divided by `density`. Each axis is capped at
    /// [`MAX_CELLS_PER_TERMINAL_CELL`] grid cells per terminal cell; a capped
    /// axis widens its cells so the grid still spans the canvas.
    pub fn fit(viewport: Viewport, base: CellSize, density: f32) -> Self {
        let density = if density.is_finite() && density > 0.0 {
            density
        } else {
            1.0
        };
        let (cols, cell_w) = fit_axis(viewport.px_w, base.w / density, viewport.cols);
        let (rows, cell_h) = fit_axis(viewport.px_h, base.h / density, viewport.rows);
        Self {
            cols,
            rows,
            cell_w,
            cell_h,
            viewport,
        }
    }

    pub fn len(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pixel origin of a grid cell.
    pub fn origin(&self, col: u16, row: u16) -> (f32, f32) {
        (col as f32 * self.cell_w, row as f32 * self.cell_h)
    }

    /// Cell centre in [0, 1] canvas coordinates.
    pub fn normalized(&self, col: u16, row: u16) -> (f32, f32) {
        let (x, y) = self.origin(col, row);
        (
            (x + self.cell_w * 0.5) / self.viewport.px_w.max(1) as f32,
            (y + self.cell_h * 0.5) / self.viewport.px_h.max(1) as f32,
        )
    }

    /// Terminal cell covering the origin of a grid cell.
    pub fn screen_pos(&self, col: u16, row: u16) -> Option<(u16, u16)> {
        let (x, y) = self.origin(col, row);
        let sx = (x * self.viewport.cols as f32 / self.viewport.px_w.max(1) as f32).floor();
        let sy = (y * self.viewport.rows as f32 / self.viewport.px_h.max(1) as f32).floor();
        if sx < 0.0 || sy < 0.0 || sx >= self.viewport.cols as f32 || sy >= self.viewport.rows as f32
        {
            return None;
        }
        Some((sx as u16, sy as u16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(w: u32, h: u32) -> Viewport {
        Viewport {
            cols: 10,
            rows: 5,
            px_w: w,
            px_h: h,
        }
    }

    #[test]
    fn grid_uses_ceiling_division() {
        let g = Grid::fit(px(100, 100), CellSize { w: 8.0, h: 14.0 }, 1.0);
        assert_eq!((g.cols, g.rows), (13, 8));
    }

    #[test]
    fn halving_density_doubles_the_cell() {
        let g = Grid::fit(px(100, 100), CellSize { w: 8.0, h: 14.0 }, 0.5);
        assert_eq!((g.cell_w, g.cell_h), (16.0, 28.0));
        assert_eq!((g.cols, g.rows), (7, 4));
    }

    #[test]
    fn fallback_pixels_follow_terminal_cells() {
        let vp = Viewport::new(80, 24, (0, 0));
        assert_eq!((vp.px_w, vp.px_h), (640, 384));
        let g = Grid::fit(vp, CellSize { w: 8.0, h: 16.0 }, 1.0);
        assert_eq!((g.cols, g.rows), (80, 24));
        assert_eq!(g.screen_pos(79, 23), Some((79, 23)));
    }

    #[test]
    fn explicit_canvas_overrides_measurement() {
        let vp = Viewport::new(80, 24, (0, 0)).with_canvas_px(Some(100), Some(100));
        assert_eq!((vp.px_w, vp.px_h), (100, 100));
    }

    #[test]
    fn cells_past_the_screen_have_no_position() {
        let g = Grid::fit(px(100, 100), CellSize { w: 8.0, h: 14.0 }, 1.0);
        assert_eq!(g.screen_pos(0, 0), Some((0, 0)));
        assert!(g.screen_pos(12, 7).is_some());
        assert_eq!(g.screen_pos(13, 0), None);
    }

    #[test]
    fn oversized_canvas_is_capped_per_terminal_cell() {
        let vp = Viewport::new(80, 24, (0, 0)).with_canvas_px(Some(65_535), Some(65_535));
        let g = Grid::fit(vp, CellSize { w: 1.0, h: 1.0 }, 4.0);
        assert_eq!((g.cols, g.rows), (320, 96));
        assert_eq!(g.screen_pos(319, 95), Some((79, 23)));
    }

    #[test]
    fn cell_size_parses() {
        let c: CellSize = "8x14".parse().unwrap();
        assert_eq!(c, CellSize { w: 8.0, h: 14.0 });
        assert!("0x3".parse::<CellSize>().is_err());
        assert!("8".parse::<CellSize>().is_err());
    }
}
