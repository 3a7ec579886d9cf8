// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::cell::Cell;
use crate::grid::Grid;

/// Double-buffered cell surface. Effects paint into the back buffer every
/// frame; the presenter flushes what differs from the last shown buffer.
#[derive(Clone, Debug)]
pub struct Canvas {
    pub width: u16,
    pub height: u16,
    bg: Option<Color>,
    cells: Vec<Cell>,
    shown: Vec<Cell>,
    stale: bool,
    plots: u64,
}

impl Canvas {
    pub fn new(width: u16, height: u16, bg: Option<Color>) -> Self {
        let len = width as usize * height as usize;
        let blank = Cell::blank(bg);
        Self {
            width,
            height,
            bg,
            cells: vec![blank; len],
            shown: vec![blank; len],
            stale: true,
            plots: 0,
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        if width == self.width && height == self.height {
            return;
        }
        *self = Self {
            plots: self.plots,
            ..Self::new(width, height, self.bg)
        };
    }

    /// Starts a new frame: the back buffer goes blank.
    pub fn begin(&mut self) {
        self.cells.fill(Cell::blank(self.bg));
    }

    pub fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn cell_at_index(&self, i: usize) -> Cell {
        self.cells[i]
    }

    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = cell;
            self.plots += 1;
        }
    }

    /// Draws a grid cell at the terminal cell its origin falls on.
    pub fn plot(&mut self, grid: &Grid, col: u16, row: u16, cell: Cell) {
        if let Some((x, y)) = grid.screen_pos(col, row) {
            self.set(x, y, cell);
        }
    }

    /// Glyph draw calls since creation.
    pub fn plots(&self) -> u64 {
        self.plots
    }

    /// The whole surface must be repainted (first frame or resize).
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn changed(&self) -> Vec<usize> {
        if self.stale {
            return (0..self.cells.len()).collect();
        }
        self.cells
            .iter()
            .zip(&self.shown)
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| i)
            .collect()
    }

    /// Marks the back buffer as presented.
    pub fn commit(&mut self) {
        self.shown.copy_from_slice(&self.cells);
        self.stale = false;
    }

    pub fn row_text(&self, y: u16) -> String {
        (0..self.width)
            .filter_map(|x| self.get(x, y).map(|c| c.ch))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(ch: char) -> Cell {
        Cell::glyph(ch, None, None)
    }

    #[test]
    fn begin_blanks_the_back_buffer() {
        let mut c = Canvas::new(2, 2, None);
        c.set(0, 0, glyph('x'));
        assert_eq!(c.get(0, 0).unwrap().ch, 'x');
        c.begin();
        assert_eq!(c.get(0, 0).unwrap().ch, ' ');
    }

    #[test]
    fn changes_are_relative_to_the_committed_buffer() {
        let mut c = Canvas::new(3, 1, None);
        assert!(c.is_stale());
        assert_eq!(c.changed(), vec![0, 1, 2]);
        c.commit();
        assert!(c.changed().is_empty());

        c.begin();
        c.set(1, 0, glyph('#'));
        assert_eq!(c.changed(), vec![1]);
        c.commit();

        c.begin();
        assert_eq!(c.changed(), vec![1]);
    }

    #[test]
    fn resize_forces_full_repaint_and_keeps_plot_count() {
        let mut c = Canvas::new(2, 2, None);
        c.set(0, 0, glyph('a'));
        c.commit();
        c.resize(4, 1);
        assert!(c.is_stale());
        assert_eq!(c.changed().len(), 4);
        assert_eq!(c.plots(), 1);
    }

    #[test]
    fn out_of_bounds_writes_are_ignored() {
        let mut c = Canvas::new(2, 2, None);
        c.set(5, 5, glyph('a'));
        assert_eq!(c.plots(), 0);
    }
}
