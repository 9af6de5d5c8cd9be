//! The rendering pipeline: dataset + viewport -> bitmap, overlay, and table.

use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use itertools::Itertools;
use log::{debug, info};

use crate::canvas;
use crate::config::Config;
use crate::dataset::{Dataset, Variant};
use crate::genome::Genome;
use crate::layout::{Layout, Rect};
use crate::overlay;
use crate::scale::LinearScale;
use crate::table::{self, Paginator};
use crate::viewport::{Dirty, Viewport};

/// Everything a layer needs to draw one view.
pub struct Frame<'a> {
    pub genome: &'a Genome,
    pub layout: &'a Layout,
    pub viewport: &'a Viewport,
    pub config: &'a Config,
    pub variants: &'a [Variant],
}

impl<'a> Frame<'a> {
    pub fn x_scale(&self) -> LinearScale {
        self.viewport.x_scale(self.layout)
    }

    pub fn y_scale(&self) -> LinearScale {
        self.viewport.y_scale(self.layout)
    }

    /// Variants inside both view ranges; the rest are dropped, not clamped.
    pub fn visible(&self) -> impl Iterator<Item = &'a Variant> + 'a {
        let x = self.viewport.x;
        let y = self.viewport.y;
        let variants = self.variants;
        variants
            .iter()
            .filter(move |v| x.contains(v.genome_pos as f64) && y.contains(v.neg_log_p))
    }
}

/// A user gesture, replayed against the plot in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ZoomIn,
    ZoomOut,
    Reset,
    Select(Rect),
    Brush(Rect),
    Slide(f64),
    Pan(f64),
    High(String),
    Stages(Vec<String>),
    First,
    Prev,
    Next,
    Last,
    Page(usize),
}

fn parse_rect(args: &str) -> Result<Rect> {
    let coords: Vec<f64> = args
        .split(',')
        .map(|s| s.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<f64>, _>>()
        .with_context(|| format!("invalid rectangle '{}'", args))?;
    match coords.as_slice() {
        [x0, y0, x1, y1] => Ok(Rect::from_corners(*x0, *y0, *x1, *y1)),
        _ => bail!("rectangle '{}' needs four numbers x0,y0,x1,y1", args),
    }
}

impl FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, args) = match s.find(':') {
            Some(i) => (&s[..i], Some(&s[i + 1..])),
            None => (s, None),
        };
        let number = |a: Option<&str>| -> Result<f64> {
            let a = a.ok_or_else(|| anyhow!("action '{}' needs an argument", name))?;
            a.trim()
                .parse::<f64>()
                .with_context(|| format!("invalid number '{}' in action '{}'", a, s))
        };
        let action = match (name, args) {
            ("zoom-in", None) => Action::ZoomIn,
            ("zoom-out", None) => Action::ZoomOut,
            ("reset", None) => Action::Reset,
            ("first", None) => Action::First,
            ("prev", None) => Action::Prev,
            ("next", None) => Action::Next,
            ("last", None) => Action::Last,
            ("select", Some(a)) => Action::Select(parse_rect(a)?),
            ("brush", Some(a)) => Action::Brush(parse_rect(a)?),
            ("slide", a) => Action::Slide(number(a)?),
            ("pan", a) => Action::Pan(number(a)?),
            ("high", Some(a)) => Action::High(a.to_string()),
            ("stages", Some(a)) => Action::Stages(
                a.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            ),
            ("page", a) => {
                let n = number(a)?;
                if n < 1.0 || n.fract() != 0.0 {
                    bail!("page must be a positive whole number, got '{}'", s);
                }
                Action::Page(n as usize)
            }
            _ => bail!("unknown action '{}'", s),
        };
        Ok(action)
    }
}

pub struct Plot {
    genome: Genome,
    dataset: Dataset,
    active: Dataset,
    config: Config,
    layout: Layout,
    viewport: Viewport,
    pager: Paginator,
    // indices into `active.variants`, most significant first
    highlighted: Vec<usize>,
    dirty: Dirty,
    png: Vec<u8>,
    svg: String,
    bitmap_renders: usize,
    overlay_renders: usize,
}

impl Plot {
    pub fn new(genome: Genome, dataset: Dataset, config: Config) -> Result<Self> {
        config.validate()?;
        let viewport = Viewport::new(
            genome.total_length(),
            dataset.max_neg_log_p(),
            config.high,
            config.low,
        );
        let layout = Layout::new(config.width, config.height);
        let mut plot = Plot {
            genome,
            active: dataset.clone(),
            dataset,
            pager: Paginator::new(0, config.page_size),
            config,
            layout,
            viewport,
            highlighted: Vec::new(),
            dirty: Dirty::ALL,
            png: Vec::new(),
            svg: String::new(),
            bitmap_renders: 0,
            overlay_renders: 0,
        };
        plot.refresh_highlighted();
        Ok(plot)
    }

    fn frame(&self) -> Frame<'_> {
        Frame {
            genome: &self.genome,
            layout: &self.layout,
            viewport: &self.viewport,
            config: &self.config,
            variants: &self.active.variants,
        }
    }

    fn refresh_highlighted(&mut self) {
        let high = self.viewport.high;
        let variants = &self.active.variants;
        self.highlighted = (0..variants.len())
            .filter(|&i| variants[i].neg_log_p > high)
            .sorted_by(|&a, &b| {
                variants[a]
                    .p
                    .partial_cmp(&variants[b].p)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(variants[a].genome_pos.cmp(&variants[b].genome_pos))
            })
            .collect();
        self.pager.reset(self.highlighted.len());
        debug!("{} variants above {:.2}", self.highlighted.len(), high);
    }

    /// Restricts the plot to the named stages; an empty list shows every stage.
    pub fn set_stages(&mut self, names: &[String]) -> Result<Dirty> {
        self.active = if names.is_empty() {
            self.dataset.clone()
        } else {
            self.dataset.filter_stages(names)?
        };
        self.refresh_highlighted();
        self.dirty.merge(Dirty::ALL);
        Ok(Dirty::ALL)
    }

    pub fn apply(&mut self, action: &Action) -> Result<()> {
        debug!("action {:?}", action);
        let dirty = match action {
            Action::ZoomIn => self.viewport.zoom_in(),
            Action::ZoomOut => self.viewport.zoom_out(),
            Action::Reset => self.viewport.reset(),
            Action::Select(rect) => self.viewport.select(*rect, &self.layout),
            Action::Brush(rect) => self.viewport.brush(*rect, &self.layout),
            Action::Slide(px) => self.viewport.slide_to(*px, &self.layout),
            Action::Pan(bp) => self.viewport.pan(*bp),
            Action::High(text) => {
                let dirty = self.viewport.set_high_text(text)?;
                if dirty.any() {
                    self.refresh_highlighted();
                }
                dirty
            }
            Action::Stages(names) => self.set_stages(names)?,
            Action::First => {
                self.pager.first();
                Dirty::NONE
            }
            Action::Prev => {
                self.pager.prev();
                Dirty::NONE
            }
            Action::Next => {
                self.pager.next();
                Dirty::NONE
            }
            Action::Last => {
                self.pager.last();
                Dirty::NONE
            }
            Action::Page(n) => {
                self.pager.goto(*n);
                Dirty::NONE
            }
        };
        self.dirty.merge(dirty);
        Ok(())
    }

    /// Redraws only the layers invalidated since the last render.
    pub fn render(&mut self) -> Result<()> {
        if self.dirty.bitmap {
            let canvas = canvas::render(&self.frame());
            self.png = canvas.encode_png()?;
            self.bitmap_renders += 1;
        }
        if self.dirty.any() {
            self.svg = overlay::render(&self.frame(), &self.png)
                .context("Failed to write the SVG overlay")?;
            self.overlay_renders += 1;
            info!(
                "Rendered {} visible variants, {} above threshold",
                self.frame().visible().count(),
                self.highlighted.len()
            );
        }
        self.dirty = Dirty::NONE;
        Ok(())
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn pager(&self) -> &Paginator {
        &self.pager
    }

    pub fn render_counts(&self) -> (usize, usize) {
        (self.bitmap_renders, self.overlay_renders)
    }

    pub fn png(&self) -> &[u8] {
        &self.png
    }

    pub fn svg(&self) -> &str {
        &self.svg
    }

    pub fn highlighted(&self) -> Vec<&Variant> {
        self.highlighted
            .iter()
            .map(|&i| &self.active.variants[i])
            .collect()
    }

    pub fn table_html(&self) -> Result<String> {
        table::render_html(&self.highlighted(), &self.pager)
            .context("Failed to write the results table")
    }

    pub fn table_tsv(&self) -> Result<String> {
        table::render_tsv(&self.highlighted()).context("Failed to write the variant table")
    }

    /// A standalone page with the plot, its controls' state, and the table.
    pub fn html_page(&self) -> Result<String> {
        let stages = self.active.stages().iter().map(|s| table::escape(s)).join(", ");
        Ok(format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Manhattan plot</title>\n<style>\n{}</style>\n</head>\n<body>\n<div class=\"toolbar\"><label>High threshold <input class=\"high\" value=\"{:.2}\"></label> <span class=\"stages\">Stages: {}</span></div>\n{}{}</body>\n</html>\n",
            PAGE_CSS,
            self.viewport.high,
            stages,
            self.svg,
            self.table_html()?
        ))
    }
}

const PAGE_CSS: &str = "body { font-family: sans-serif; margin: 1em; }
table { border-collapse: collapse; margin-top: 1em; }
th, td { border: 1px solid #ccc; padding: 2px 8px; text-align: left; }
.pager button { margin: 0 2px; }
.pager .status { margin: 0 8px; }
";
