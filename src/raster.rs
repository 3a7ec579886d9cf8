// Copyright (c) 2026 rezky_nightky

//! Image-sampled brightness fields.
//!
//! A source image is downsampled once per grid size into one luminance value
//! per cell. Animated distortion never touches the source: it moves the
//! sampling coordinate through an [`Affine`] before the buffer lookup.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::error::FxError;
use crate::grid::Grid;
use crate::runtime::Fit;

/// Pixels with alpha below this are "no glyph".
pub const ALPHA_CUTOFF: u8 = 10;

/// Per-cell luminance at grid resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct Sampled {
    pub cols: u16,
    pub rows: u16,
    /// Cell rectangle the image occupies: (col, row, width, height).
    pub rect: (u16, u16, u16, u16),
    lum: Vec<Option<f32>>,
}

impl Sampled {
    pub fn from_image(img: &RgbaImage, grid: &Grid, fit: Fit) -> Self {
        let (cols, rows) = (grid.cols, grid.rows);
        let mut lum = vec![None; cols as usize * rows as usize];
        if cols == 0 || rows == 0 || img.width() == 0 || img.height() == 0 {
            return Self {
                cols,
                rows,
                rect: (0, 0, 0, 0),
                lum,
            };
        }

        let (tw, th) = match fit {
            Fit::Stretch => (cols, rows),
            Fit::Contain => {
                let canvas_w = cols as f32 * grid.cell_w;
                let canvas_h = rows as f32 * grid.cell_h;
                let scale = (canvas_w / img.width() as f32).min(canvas_h / img.height() as f32);
                let tw = (img.width() as f32 * scale / grid.cell_w).round() as u16;
                let th = (img.height() as f32 * scale / grid.cell_h).round() as u16;
                (tw.clamp(1, cols), th.clamp(1, rows))
            }
        };
        let (oc, or) = ((cols - tw) / 2, (rows - th) / 2);

        let small = imageops::resize(img, tw as u32, th as u32, FilterType::Triangle);
        for (x, y, px) in small.enumerate_pixels() {
            let [r, g, b, a] = px.0;
            let idx = (y as usize + or as usize) * cols as usize + (x as usize + oc as usize);
            lum[idx] = (a >= ALPHA_CUTOFF)
                .then(|| (r as f32 + g as f32 + b as f32) / (3.0 * 255.0));
        }

        Self {
            cols,
            rows,
            rect: (oc, or, tw, th),
            lum,
        }
    }

    pub fn at(&self, col: i32, row: i32) -> Option<f32> {
        if col < 0 || row < 0 || col >= self.cols as i32 || row >= self.rows as i32 {
            return None;
        }
        self.lum[row as usize * self.cols as usize + col as usize]
    }

    /// Lookup by canvas pixel position.
    pub fn at_px(&self, grid: &Grid, x: f32, y: f32) -> Option<f32> {
        self.at(
            (x / grid.cell_w).floor() as i32,
            (y / grid.cell_h).floor() as i32,
        )
    }

    /// Position of a cell inside the image rectangle, in [0, 1] when inside.
    pub fn image_uv(&self, col: u16, row: u16) -> (f32, f32) {
        let (oc, or, tw, th) = self.rect;
        (
            (col as f32 + 0.5 - oc as f32) / tw.max(1) as f32,
            (row as f32 + 0.5 - or as f32) / th.max(1) as f32,
        )
    }

    /// Canvas pixel position of an image-relative point.
    pub fn image_px(&self, grid: &Grid, u: f32, v: f32) -> (f32, f32) {
        let (oc, or, tw, th) = self.rect;
        (
            (oc as f32 + u * tw as f32) * grid.cell_w,
            (or as f32 + v * th as f32) * grid.cell_h,
        )
    }
}

/// 2D affine map `(x, y) -> (a*x + b*y + c, d*x + e*y + f)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 0.0,
        e: 1.0,
        f: 0.0,
    };

    pub fn translation(dx: f32, dy: f32) -> Self {
        Self {
            c: dx,
            f: dy,
            ..Self::IDENTITY
        }
    }

    pub fn rotation_about(angle: f32, cx: f32, cy: f32) -> Self {
        let (s, co) = angle.sin_cos();
        Self {
            a: co,
            b: -s,
            c: cx - co * cx + s * cy,
            d: s,
            e: co,
            f: cy - s * cx - co * cy,
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.b * y + self.c,
            self.d * x + self.e * y + self.f,
        )
    }
}

/// Axis-aligned box in image-relative [0, 1] coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Region {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Region {
    pub fn contains(&self, u: f32, v: f32) -> bool {
        u >= self.x0 && u < self.x1 && v >= self.y0 && v < self.y1
    }
}

/// Where the head and limbs sit in the source image.
#[derive(Clone, Debug, PartialEq)]
pub struct Rig {
    pub head: Region,
    /// Neck pivot the head rotates about, image-relative.
    pub pivot: (f32, f32),
    pub limbs: Vec<Region>,
}

impl Default for Rig {
    fn default() -> Self {
        Self {
            head: Region {
                x0: 0.25,
                y0: 0.0,
                x1: 0.75,
                y1: 0.4,
            },
            pivot: (0.5, 0.4),
            limbs: vec![
                Region {
                    x0: 0.0,
                    y0: 0.4,
                    x1: 0.25,
                    y1: 0.85,
                },
                Region {
                    x0: 0.75,
                    y0: 0.4,
                    x1: 1.0,
                    y1: 0.85,
                },
            ],
        }
    }
}

/// Fire-and-forget decode on a helper thread; the result is picked up with
/// [`Loader::poll`] from the frame loop.
pub struct Loader {
    path: PathBuf,
    rx: Receiver<Result<RgbaImage, String>>,
}

pub enum LoadState {
    Pending,
    Ready(RgbaImage),
    Failed(FxError),
}

impl Loader {
    pub fn spawn(path: &Path) -> Self {
        let (tx, rx) = mpsc::channel();
        let owned = path.to_path_buf();
        thread::spawn(move || {
            let res = image::open(&owned)
                .map(|img| img.to_rgba8())
                .map_err(|e| e.to_string());
            // The receiver is gone when the effect unmounted first.
            let _ = tx.send(res);
        });
        Self {
            path: path.to_path_buf(),
            rx,
        }
    }

    pub fn poll(&self) -> LoadState {
        match self.rx.try_recv() {
            Ok(Ok(img)) => LoadState::Ready(img),
            Ok(Err(reason)) => LoadState::Failed(FxError::Decode {
                path: self.path.clone(),
                reason,
            }),
            Err(TryRecvError::Empty) => LoadState::Pending,
            Err(TryRecvError::Disconnected) => LoadState::Failed(FxError::Decode {
                path: self.path.clone(),
                reason: "decoder exited without a result".into(),
            }),
        }
    }
}
