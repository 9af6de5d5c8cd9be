//! Pixel geometry of the figure.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    /// Rectangle spanned by two corners given in any order.
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Rect {
            x: x0.min(x1),
            y: y0.min(y1),
            w: (x1 - x0).abs(),
            h: (y1 - y0).abs(),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x0 <= x1 && y0 <= y1 {
            Some(Rect::from_corners(x0, y0, x1, y1))
        } else {
            None
        }
    }
}

const MARGIN_LEFT: f64 = 64.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 24.0;
const X_AXIS_HEIGHT: f64 = 44.0;
const SLIDER_HEIGHT: f64 = 24.0;
const MARGIN_BOTTOM: f64 = 12.0;

/// Plot area on top, x-axis below it, then the genome-wide slider.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub plot: Rect,
    pub slider: Rect,
}

impl Layout {
    pub fn new(width: u32, height: u32) -> Self {
        let w = width as f64 - MARGIN_LEFT - MARGIN_RIGHT;
        let h = height as f64 - MARGIN_TOP - X_AXIS_HEIGHT - SLIDER_HEIGHT - MARGIN_BOTTOM;
        let plot = Rect {
            x: MARGIN_LEFT,
            y: MARGIN_TOP,
            w: w.max(1.0),
            h: h.max(1.0),
        };
        let slider = Rect {
            x: MARGIN_LEFT,
            y: plot.bottom() + X_AXIS_HEIGHT,
            w: plot.w,
            h: SLIDER_HEIGHT,
        };
        Layout {
            width,
            height,
            plot,
            slider,
        }
    }
}
