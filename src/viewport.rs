//! Horizontal (genome position) and vertical (-log10 p) view ranges, and the
//! gestures that change them.
//!
//! Every operation reports which layers it invalidated so the caller can
//! re-render only what changed: range changes touch both the bitmap and the
//! overlay, while threshold edits and the in-progress brush only touch the
//! overlay.

use anyhow::{bail, Result};
use log::debug;

use crate::layout::{Layout, Rect};
use crate::scale::{LinearScale, Range};

/// Narrowest horizontal window, in bp.
pub const MIN_X_SPAN: f64 = 1_000.0;
/// Narrowest vertical window, in -log10(p).
pub const MIN_Y_SPAN: f64 = 0.5;
/// Drags shorter than this on either side are clicks.
pub const MIN_SELECTION_PX: f64 = 3.0;

const Y_HEADROOM: f64 = 1.05;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Dirty {
    pub bitmap: bool,
    pub overlay: bool,
}

impl Dirty {
    pub const NONE: Dirty = Dirty {
        bitmap: false,
        overlay: false,
    };
    pub const OVERLAY: Dirty = Dirty {
        bitmap: false,
        overlay: true,
    };
    pub const ALL: Dirty = Dirty {
        bitmap: true,
        overlay: true,
    };

    pub fn any(&self) -> bool {
        self.bitmap || self.overlay
    }

    pub fn merge(&mut self, other: Dirty) {
        self.bitmap |= other.bitmap;
        self.overlay |= other.overlay;
    }
}

#[derive(Debug, Clone)]
pub struct Viewport {
    full_x: Range,
    full_y: Range,
    data_max: f64,
    pub x: Range,
    pub y: Range,
    pub high: f64,
    pub low: Option<f64>,
    /// Rectangle of a drag still in progress, in figure pixels.
    pub brush: Option<Rect>,
}

fn y_extent(data_max: f64, high: f64) -> Range {
    Range::new(0.0, data_max.max(high + 1.0) * Y_HEADROOM)
}

impl Viewport {
    pub fn new(genome_length: u64, data_max: f64, high: f64, low: Option<f64>) -> Self {
        let full_x = Range::new(0.0, genome_length as f64);
        let full_y = y_extent(data_max, high);
        Viewport {
            full_x,
            full_y,
            data_max,
            x: full_x,
            y: full_y,
            high,
            low,
            brush: None,
        }
    }

    pub fn full_x(&self) -> Range {
        self.full_x
    }

    pub fn full_y(&self) -> Range {
        self.full_y
    }

    pub fn is_zoomed(&self) -> bool {
        self.x != self.full_x || self.y != self.full_y
    }

    pub fn x_scale(&self, layout: &Layout) -> LinearScale {
        LinearScale::new(self.x, layout.plot.x, layout.plot.right())
    }

    pub fn y_scale(&self, layout: &Layout) -> LinearScale {
        LinearScale::new(self.y, layout.plot.bottom(), layout.plot.y)
    }

    /// The slider track always spans the whole genome.
    pub fn slider_scale(&self, layout: &Layout) -> LinearScale {
        LinearScale::new(self.full_x, layout.slider.x, layout.slider.right())
    }

    fn set_ranges(&mut self, x: Range, y: Range) -> Dirty {
        let x = x.with_min_span(MIN_X_SPAN).clamp_within(&self.full_x);
        let y = y.with_min_span(MIN_Y_SPAN).clamp_within(&self.full_y);
        let had_brush = self.brush.take().is_some();
        if x == self.x && y == self.y {
            return if had_brush { Dirty::OVERLAY } else { Dirty::NONE };
        }
        debug!(
            "viewport x=[{:.0}, {:.0}] y=[{:.2}, {:.2}]",
            x.min, x.max, y.min, y.max
        );
        self.x = x;
        self.y = y;
        Dirty::ALL
    }

    pub fn zoom_in(&mut self) -> Dirty {
        self.set_ranges(self.x.zoom(0.5), self.y)
    }

    pub fn zoom_out(&mut self) -> Dirty {
        self.set_ranges(self.x.zoom(2.0), self.y)
    }

    pub fn reset(&mut self) -> Dirty {
        self.set_ranges(self.full_x, self.full_y)
    }

    pub fn pan(&mut self, delta_bp: f64) -> Dirty {
        self.set_ranges(self.x.shift(delta_bp), self.y)
    }

    /// Re-centres the horizontal window on a slider-track pixel.
    pub fn slide_to(&mut self, px: f64, layout: &Layout) -> Dirty {
        let track = self.slider_scale(layout);
        let px = px.max(layout.slider.x).min(layout.slider.right());
        let center = track.invert(px);
        self.set_ranges(self.x.shift(center - self.x.center()), self.y)
    }

    /// Shows a drag in progress without changing the ranges.
    pub fn brush(&mut self, rect: Rect, layout: &Layout) -> Dirty {
        self.brush = rect.intersect(&layout.plot);
        Dirty::OVERLAY
    }

    /// Zooms both axes to a drag-selection rectangle in figure pixels.
    pub fn select(&mut self, rect: Rect, layout: &Layout) -> Dirty {
        let rect = match rect.intersect(&layout.plot) {
            Some(r) if r.w >= MIN_SELECTION_PX && r.h >= MIN_SELECTION_PX => r,
            _ => {
                debug!("selection too small, treating as a click");
                return if self.brush.take().is_some() {
                    Dirty::OVERLAY
                } else {
                    Dirty::NONE
                };
            }
        };
        let xs = self.x_scale(layout);
        let ys = self.y_scale(layout);
        let x = Range::new(xs.invert(rect.x), xs.invert(rect.right()));
        let y = Range::new(ys.invert(rect.bottom()), ys.invert(rect.y));
        self.set_ranges(x, y)
    }

    pub fn set_high(&mut self, high: f64) -> Result<Dirty> {
        if !high.is_finite() || high < 0.0 {
            bail!("threshold must be a non-negative number, got {}", high);
        }
        if high == self.high {
            return Ok(Dirty::NONE);
        }
        self.high = high;
        let full_y = y_extent(self.data_max, high);
        if full_y == self.full_y {
            return Ok(Dirty::OVERLAY);
        }
        let was_full = self.y == self.full_y;
        self.full_y = full_y;
        let y = if was_full { full_y } else { self.y };
        let mut dirty = self.set_ranges(self.x, y);
        dirty.merge(Dirty::OVERLAY);
        Ok(dirty)
    }

    /// Parses the threshold textbox; bad input leaves the threshold as it was.
    pub fn set_high_text(&mut self, text: &str) -> Result<Dirty> {
        let value: f64 = match text.trim().parse() {
            Ok(v) => v,
            Err(_) => bail!("threshold '{}' is not a number", text.trim()),
        };
        self.set_high(value)
    }
}
