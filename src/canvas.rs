//! The bitmap layer: chromosome bands, grid, and every visible variant.

use anyhow::{Context, Result};
use line_drawing::Bresenham;
use rgb::RGBA8;

use crate::layout::Rect;
use crate::plot::Frame;
use crate::scale::nice_ticks;

const GRID: RGBA8 = RGBA8 {
    r: 0xdd,
    g: 0xdd,
    b: 0xdd,
    a: 0xff,
};

pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<RGBA8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: RGBA8) -> Self {
        Canvas {
            width,
            height,
            pixels: vec![background; width as usize * height as usize],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<RGBA8> {
        if x < self.width && y < self.height {
            Some(self.pixels[y as usize * self.width as usize + x as usize])
        } else {
            None
        }
    }

    /// Sets a pixel, ignoring coordinates outside the canvas.
    pub fn set(&mut self, x: i64, y: i64, color: RGBA8) {
        if x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height {
            let idx = y as usize * self.width as usize + x as usize;
            self.pixels[idx] = color;
        }
    }

    pub fn fill_rect(&mut self, rect: &Rect, color: RGBA8) {
        let x0 = rect.x.round() as i64;
        let x1 = rect.right().round() as i64;
        let y0 = rect.y.round() as i64;
        let y1 = rect.bottom().round() as i64;
        for y in y0..y1 {
            for x in x0..x1 {
                self.set(x, y, color);
            }
        }
    }

    /// Filled disc, clipped to `clip`.
    pub fn disc(&mut self, cx: f64, cy: f64, radius: u32, color: RGBA8, clip: &Rect) {
        let r = radius as i64;
        let (cx, cy) = (cx.round() as i64, cy.round() as i64);
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy > r * r {
                    continue;
                }
                let (x, y) = (cx + dx, cy + dy);
                if clip.contains(x as f64, y as f64) {
                    self.set(x, y, color);
                }
            }
        }
    }

    pub fn line(&mut self, from: (i64, i64), to: (i64, i64), color: RGBA8) {
        for (x, y) in Bresenham::new(from, to) {
            self.set(x, y, color);
        }
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        lodepng::encode32(&self.pixels, self.width as usize, self.height as usize)
            .context("Failed to encode PNG")
    }
}

/// Draws the bitmap layer for the current view.
pub fn render(frame: &Frame) -> Canvas {
    let palette = &frame.config.colors;
    let plot = frame.layout.plot;
    let mut canvas = Canvas::new(frame.layout.width, frame.layout.height, palette.background.0);

    let xs = frame.x_scale();
    let ys = frame.y_scale();
    let x = frame.viewport.x;
    for chrom in frame.genome.overlapping(x.min, x.max) {
        let left = xs.map(chrom.offset as f64).max(plot.x);
        let right = xs.map(chrom.end() as f64).min(plot.right());
        let band = Rect::from_corners(left, plot.y, right, plot.bottom());
        let color = if chrom.rank % 2 == 0 {
            palette.band_even
        } else {
            palette.band_odd
        };
        canvas.fill_rect(&band, color.0);
    }

    for tick in nice_ticks(&frame.viewport.y, 5) {
        let py = ys.map(tick).round() as i64;
        canvas.line(
            (plot.x.round() as i64, py),
            (plot.right().round() as i64 - 1, py),
            GRID,
        );
    }

    let mut drawn = 0usize;
    for v in frame.visible() {
        let rank = frame.genome.get(&v.chrom).map(|c| c.rank).unwrap_or(0);
        let color = if rank % 2 == 0 {
            palette.point_even
        } else {
            palette.point_odd
        };
        canvas.disc(
            xs.map(v.genome_pos as f64),
            ys.map(v.neg_log_p),
            frame.config.point_radius,
            color.0,
            &plot,
        );
        drawn += 1;
    }
    log::debug!("bitmap layer: {} points", drawn);
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: RGBA8 = RGBA8 {
        r: 255,
        g: 0,
        b: 0,
        a: 255,
    };
    const WHITE: RGBA8 = RGBA8 {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };

    #[test]
    fn test_set_ignores_out_of_bounds() {
        let mut canvas = Canvas::new(4, 3, WHITE);
        canvas.set(-1, 0, RED);
        canvas.set(4, 0, RED);
        canvas.set(0, 3, RED);
        canvas.set(3, 2, RED);
        assert_eq!(canvas.pixel(3, 2), Some(RED));
        assert_eq!(canvas.pixel(4, 2), None);
        assert_eq!(canvas.pixels.iter().filter(|p| **p == RED).count(), 1);
    }

    #[test]
    fn test_pixel_indexes_rows() {
        let mut canvas = Canvas::new(3, 500, WHITE);
        canvas.set(2, 499, RED);
        assert_eq!(canvas.pixel(2, 499), Some(RED));
        assert_eq!(canvas.pixels[canvas.pixels.len() - 1], RED);
        assert_eq!(canvas.pixel(0, 499), Some(WHITE));
    }

    #[test]
    fn test_disc_is_clipped() {
        let mut canvas = Canvas::new(20, 20, WHITE);
        let clip = Rect { x: 10.0, y: 0.0, w: 10.0, h: 20.0 };
        canvas.disc(10.0, 10.0, 2, RED, &clip);
        assert_eq!(canvas.pixel(10, 10), Some(RED));
        assert_eq!(canvas.pixel(12, 10), Some(RED));
        assert_eq!(canvas.pixel(9, 10), Some(WHITE));
        assert_eq!(canvas.pixel(12, 12), Some(WHITE));
    }

    #[test]
    fn test_line_and_rect() {
        let mut canvas = Canvas::new(10, 10, WHITE);
        canvas.line((0, 0), (9, 9), RED);
        for i in 0..10 {
            assert_eq!(canvas.pixel(i, i), Some(RED));
        }
        canvas.fill_rect(&Rect { x: 2.0, y: 5.0, w: 3.0, h: 2.0 }, RED);
        assert_eq!(canvas.pixel(4, 6), Some(RED));
        assert_eq!(canvas.pixel(5, 6), Some(WHITE));
    }

    #[test]
    fn test_encode_png_signature() {
        let canvas = Canvas::new(8, 8, WHITE);
        let png = canvas.encode_png().unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
    }
}
