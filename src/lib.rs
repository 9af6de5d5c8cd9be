//! Manhattan plots of GWAS results.
//!
//! Variants are read from a nested `study -> project -> stage` JSON document,
//! placed on a genome-wide x-axis and a -log10(p) y-axis, and drawn as two
//! synchronised layers: a PNG bitmap holding every visible point, and an SVG
//! overlay with axes, thresholds, the genome slider, and the hoverable
//! variants above the significance threshold. Those variants also feed a
//! paged results table.

pub mod canvas;
pub mod config;
pub mod dataset;
pub mod genome;
pub mod layout;
pub mod overlay;
pub mod plot;
pub mod scale;
pub mod table;
pub mod viewport;

pub use config::Config;
pub use dataset::{Dataset, Variant};
pub use genome::Genome;
pub use plot::{Action, Plot};
