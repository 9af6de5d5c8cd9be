use std::fs;
use std::str::FromStr;

use anyhow::{Context, Result};
use log::{info, warn};

extern crate clap;
use clap::{App, Arg, ArgMatches};

use manhattan::{Action, Config, Dataset, Genome, Plot};

fn parse_arg<T>(matches: &ArgMatches, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match matches.value_of(name) {
        Some(v) => v
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("invalid value '{}' for --{}", v, name)),
        None => Ok(None),
    }
}

fn write_output(path: &str, bytes: &[u8], what: &str) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("Failed to write {}: {}", what, path))?;
    info!("Wrote {} to {}", what, path);
    Ok(())
}

fn main() -> Result<()> {
    let matches = App::new("manhattan")
        .version("0.1.0")
        .author("Erik Garrison <erik.garrison@gmail.com>")
        .about("Render a Manhattan plot from GWAS results grouped by study stage")
        .arg(Arg::with_name("INPUT")
             .required(true)
             .takes_value(true)
             .index(1)
             .help("input JSON dataset (optionally gzipped)"))
        .arg(Arg::with_name("png")
             .short("p")
             .long("png")
             .takes_value(true)
             .help("Save the bitmap layer to this file."))
        .arg(Arg::with_name("svg")
             .short("s")
             .long("svg")
             .takes_value(true)
             .help("Save the SVG plot (bitmap embedded) to this file."))
        .arg(Arg::with_name("html")
             .short("o")
             .long("html")
             .takes_value(true)
             .help("Save a page with the plot and the results table to this file."))
        .arg(Arg::with_name("tsv")
             .short("t")
             .long("tsv")
             .takes_value(true)
             .help("Save every variant above the threshold as TSV to this file."))
        .arg(Arg::with_name("config")
             .short("c")
             .long("config")
             .takes_value(true)
             .help("YAML file with plot settings."))
        .arg(Arg::with_name("width")
             .short("W")
             .long("width")
             .takes_value(true)
             .help("Figure width in pixels."))
        .arg(Arg::with_name("height")
             .short("Y")
             .long("height")
             .takes_value(true)
             .help("Figure height in pixels."))
        .arg(Arg::with_name("high")
             .long("high")
             .takes_value(true)
             .help("-log10(p) above which variants are highlighted [default: 7.3]"))
        .arg(Arg::with_name("low")
             .long("low")
             .takes_value(true)
             .help("-log10(p) of an optional suggestive line."))
        .arg(Arg::with_name("stage")
             .long("stage")
             .takes_value(true)
             .multiple(true)
             .number_of_values(1)
             .help("Only plot this stage; repeat for several."))
        .arg(Arg::with_name("action")
             .short("a")
             .long("action")
             .takes_value(true)
             .multiple(true)
             .number_of_values(1)
             .help("Replay a gesture: zoom-in, zoom-out, reset, select:x0,y0,x1,y1, \
                    brush:x0,y0,x1,y1, slide:PX, pan:BP, high:X, stages:A,B, \
                    first, prev, next, last, page:N"))
        .arg(Arg::with_name("page")
             .long("page")
             .takes_value(true)
             .help("Table page to show (1-based)."))
        .arg(Arg::with_name("page_size")
             .long("page-size")
             .takes_value(true)
             .help("Rows per table page."))
        .arg(Arg::with_name("verbose")
             .short("v")
             .long("verbose")
             .help("Log debug messages."))
        .get_matches();

    let log_level = if matches.is_present("verbose") { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = match matches.value_of("config") {
        Some(path) => Config::from_yaml(path)?,
        None => Config::default(),
    };
    if let Some(width) = parse_arg(&matches, "width")? {
        config.width = width;
    }
    if let Some(height) = parse_arg(&matches, "height")? {
        config.height = height;
    }
    if let Some(high) = parse_arg(&matches, "high")? {
        config.high = high;
    }
    if let Some(low) = parse_arg(&matches, "low")? {
        config.low = Some(low);
    }
    if let Some(page_size) = parse_arg(&matches, "page_size")? {
        config.page_size = page_size;
    }
    config.validate()?;

    let actions: Vec<Action> = matches
        .values_of("action")
        .map(|vals| vals.map(|a| a.parse::<Action>()).collect::<Result<Vec<_>>>())
        .transpose()?
        .unwrap_or_default();

    let filename = matches
        .value_of("INPUT")
        .context("an input dataset is required")?;
    let genome = Genome::grch38();
    info!("Loading {}", filename);
    let dataset = Dataset::load(filename, &genome)?;
    info!("Loaded {} variants", dataset.variants.len());

    let mut plot = Plot::new(genome, dataset, config)?;
    if let Some(stages) = matches.values_of("stage") {
        let stages: Vec<String> = stages.map(String::from).collect();
        plot.set_stages(&stages)?;
    }
    for action in &actions {
        plot.apply(action)?;
    }
    if let Some(page) = parse_arg::<usize>(&matches, "page")? {
        plot.apply(&Action::Page(page))?;
    }
    plot.render()?;

    let outputs = ["png", "svg", "html", "tsv"];
    if !outputs.iter().any(|o| matches.is_present(o)) {
        warn!("No output requested; use --png, --svg, --html or --tsv");
    }
    if let Some(path) = matches.value_of("png") {
        write_output(path, plot.png(), "bitmap")?;
    }
    if let Some(path) = matches.value_of("svg") {
        write_output(path, plot.svg().as_bytes(), "SVG plot")?;
    }
    if let Some(path) = matches.value_of("html") {
        write_output(path, plot.html_page()?.as_bytes(), "HTML page")?;
    }
    if let Some(path) = matches.value_of("tsv") {
        write_output(path, plot.table_tsv()?.as_bytes(), "variant table")?;
    }
    Ok(())
}
