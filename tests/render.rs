use std::io::Write;

use manhattan::{Action, Config, Dataset, Genome, Plot};

const DATASET: &str = r#"{
  "Height": {
    "UKB": {
      "discovery": {
        "variants": [
          {"chr": "chr1", "pos": 1000000, "p": 3e-12, "gene": "GENE1", "rsId": "rs100", "ref": "A", "alt": "T"},
          {"chr": "chr1", "pos": 5000000, "p": 0.3},
          {"chr": "chr2", "pos": 1000000, "p": 0.04},
          {"chr": "chr6", "pos": 31000000, "p": 1e-20, "gene": "HLA-B", "rsId": "rs600"},
          {"chr": "chrX", "pos": 2000000, "p": 2e-8, "rsId": "rsX"}
        ]
      },
      "replication": [
        {"chr": "chr6", "pos": 31000500, "p": 4e-9, "gene": "HLA-B", "rsId": "rs601"},
        {"chr": "chr22", "pos": 100, "p": 0.9}
      ]
    }
  }
}"#;

fn load() -> Plot {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(DATASET.as_bytes()).unwrap();
    let genome = Genome::grch38();
    let dataset = Dataset::load(file.path(), &genome).unwrap();
    assert_eq!(dataset.variants.len(), 7);
    Plot::new(genome, dataset, Config::default()).unwrap()
}

#[test]
fn full_view_renders_both_layers() {
    let mut plot = load();
    plot.render().unwrap();
    assert!(plot.png().starts_with(&[0x89, b'P', b'N', b'G']));

    let svg = plot.svg();
    assert_eq!(svg.matches("<circle").count(), 4);
    assert!(svg.contains("data-rsid=\"rs600\""));

    let ids: Vec<String> = plot
        .highlighted()
        .iter()
        .filter_map(|v| v.rs_id.clone())
        .collect();
    assert_eq!(ids, vec!["rs600", "rs100", "rs601", "rsX"]);
}

#[test]
fn replayed_gestures_narrow_the_view_and_table() {
    let mut plot = load();
    let actions = ["zoom-in", "zoom-in", "reset", "high:10", "stages:discovery"];
    for a in actions.iter() {
        plot.apply(&a.parse::<Action>().unwrap()).unwrap();
    }
    plot.render().unwrap();
    assert!(!plot.viewport().is_zoomed());
    assert_eq!(plot.highlighted().len(), 2);
    assert_eq!(plot.svg().matches("<circle").count(), 2);

    let tsv = plot.table_tsv().unwrap();
    assert_eq!(tsv.lines().count(), 3);
    assert!(tsv.lines().nth(1).unwrap().starts_with("HLA-B\trs600\t6\t31000000"));
}

#[test]
fn pagination_walks_highlighted_rows() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(DATASET.as_bytes()).unwrap();
    let genome = Genome::grch38();
    let dataset = Dataset::load(file.path(), &genome).unwrap();
    let config = Config {
        page_size: 3,
        ..Config::default()
    };
    let mut plot = Plot::new(genome, dataset, config).unwrap();

    let first = plot.table_html().unwrap();
    assert!(first.contains("Page 1 of 2 (4 variants)"));
    assert!(first.contains("<td>rs600</td>"));
    assert!(!first.contains("<td>rsX</td>"));

    plot.apply(&Action::Next).unwrap();
    let second = plot.table_html().unwrap();
    assert!(second.contains("<td>rsX</td>"));
    assert!(second.contains("<button class=\"next\" disabled>"));

    plot.apply(&Action::First).unwrap();
    assert_eq!(plot.pager().page(), 1);
}

#[test]
fn html_page_embeds_plot_and_table() {
    let mut plot = load();
    plot.apply(&Action::Brush(manhattan::layout::Rect::from_corners(
        100.0, 40.0, 300.0, 200.0,
    )))
    .unwrap();
    plot.render().unwrap();
    let page = plot.html_page().unwrap();
    assert!(page.starts_with("<!DOCTYPE html>"));
    assert!(page.contains("class=\"brush\""));
    assert!(page.contains("<table>"));
    assert!(page.contains("value=\"7.30\""));
}
