//! Range arithmetic and linear domain-to-pixel mapping.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Range { min: a, max: b }
        } else {
            Range { min: b, max: a }
        }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn center(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }

    pub fn shift(&self, delta: f64) -> Range {
        Range {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    /// Scales the span about the center; factor < 1 zooms in.
    pub fn zoom(&self, factor: f64) -> Range {
        let half = self.span() * factor / 2.0;
        let c = self.center();
        Range {
            min: c - half,
            max: c + half,
        }
    }

    /// Grows the range about its center until it is at least `span` wide.
    pub fn with_min_span(&self, span: f64) -> Range {
        if self.span() >= span {
            *self
        } else {
            let c = self.center();
            Range {
                min: c - span / 2.0,
                max: c + span / 2.0,
            }
        }
    }

    /// Moves the range inside `outer`, shrinking it only when it is wider.
    pub fn clamp_within(&self, outer: &Range) -> Range {
        if self.span() >= outer.span() {
            return *outer;
        }
        if self.min < outer.min {
            self.shift(outer.min - self.min)
        } else if self.max > outer.max {
            self.shift(outer.max - self.max)
        } else {
            *self
        }
    }
}

/// Maps `domain` linearly onto `pixels`; `pixels` may run backwards (y-axis).
#[derive(Debug, Clone, Copy)]
pub struct LinearScale {
    pub domain: Range,
    pixel_start: f64,
    pixel_end: f64,
}

impl LinearScale {
    pub fn new(domain: Range, pixel_start: f64, pixel_end: f64) -> Self {
        LinearScale {
            domain,
            pixel_start,
            pixel_end,
        }
    }

    pub fn map(&self, v: f64) -> f64 {
        let span = self.domain.span();
        if span == 0.0 {
            return (self.pixel_start + self.pixel_end) / 2.0;
        }
        self.pixel_start + (v - self.domain.min) / span * (self.pixel_end - self.pixel_start)
    }

    pub fn invert(&self, px: f64) -> f64 {
        let pspan = self.pixel_end - self.pixel_start;
        if pspan == 0.0 {
            return self.domain.center();
        }
        self.domain.min + (px - self.pixel_start) / pspan * self.domain.span()
    }
}

/// Round 1/2/5 x 10^k tick values within `range`, roughly `target` of them.
pub fn nice_ticks(range: &Range, target: usize) -> Vec<f64> {
    let span = range.span();
    if span.is_nan() || span <= 0.0 || target == 0 {
        return vec![range.min];
    }
    let raw = span / target as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(10.0 * magnitude);
    let first = (range.min / step).ceil() as i64;
    let last = (range.max / step).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}
