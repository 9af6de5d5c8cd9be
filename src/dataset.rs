//! Loading and flattening of nested GWAS result sets.
//!
//! The input is a JSON object nested `study -> project -> stage`, where each
//! stage holds the list of variants it reported, either directly as an array
//! or under a `variants` (or `data`) key.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use flate2::read::MultiGzDecoder;
use fnv::FnvHashMap;
use itertools::Itertools;
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::genome::{neg_log10, normalize_chrom, Genome};

#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub chrom: String,
    pub pos: u64,
    pub genome_pos: u64,
    pub p: f64,
    pub neg_log_p: f64,
    pub gene: Option<String>,
    pub rs_id: Option<String>,
    pub ref_allele: Option<String>,
    pub alt_allele: Option<String>,
    pub study: String,
    pub project: String,
    pub stage: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Label {
    Text(String),
    Number(u64),
}

impl Label {
    fn into_string(self) -> String {
        match self {
            Label::Text(s) => s,
            Label::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawVariant {
    #[serde(alias = "chrom", alias = "chromosome")]
    chr: Label,
    #[serde(alias = "position", alias = "bp")]
    pos: u64,
    #[serde(alias = "pvalue", alias = "p_value", alias = "pval")]
    p: f64,
    #[serde(default)]
    gene: Option<String>,
    #[serde(default, rename = "rsId", alias = "rsid", alias = "rs_id", alias = "snp")]
    rs_id: Option<String>,
    #[serde(default, rename = "ref")]
    ref_allele: Option<String>,
    #[serde(default, rename = "alt")]
    alt_allele: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub variants: Vec<Variant>,
}

impl Dataset {
    /// Reads a dataset from disk, gunzipping it first if it is gzip-compressed.
    pub fn load<P: AsRef<Path>>(path: P, genome: &Genome) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .with_context(|| format!("Failed to open dataset: {}", path.display()))?;
        let mut magic = [0u8; 2];
        let n = file.read(&mut magic)?;
        let file = File::open(path)?;
        let parsed: serde_json::Result<Value> = if n == 2 && magic == [0x1f, 0x8b] {
            debug!("{} is gzip-compressed", path.display());
            serde_json::from_reader(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            serde_json::from_reader(BufReader::new(file))
        };
        let value = parsed
            .with_context(|| format!("Failed to parse JSON dataset: {}", path.display()))?;

        Self::normalize(value, genome)
            .with_context(|| format!("Invalid dataset: {}", path.display()))
    }

    /// Flattens every stage into one list of variants tagged with their origin.
    pub fn normalize(value: Value, genome: &Genome) -> Result<Self> {
        let studies = match value {
            Value::Object(map) => map,
            _ => bail!("expected an object keyed by study name at the top level"),
        };

        let mut variants = Vec::new();
        let mut skipped: FnvHashMap<&'static str, usize> = FnvHashMap::default();
        for (study, projects) in studies {
            let projects = match projects {
                Value::Object(map) => map,
                _ => bail!("study '{}' is not an object keyed by project", study),
            };
            for (project, stages) in projects {
                let stages = match stages {
                    Value::Object(map) => map,
                    _ => bail!("project '{}/{}' is not an object keyed by stage", study, project),
                };
                for (stage, records) in stages {
                    let records = match stage_records(records) {
                        Some(records) => records,
                        None => bail!(
                            "stage '{}/{}/{}' holds neither a variant array nor a 'variants' array",
                            study,
                            project,
                            stage
                        ),
                    };
                    for record in records {
                        match to_variant(record, genome, &study, &project, &stage) {
                            Ok(v) => variants.push(v),
                            Err(reason) => *skipped.entry(reason).or_insert(0) += 1,
                        }
                    }
                }
            }
        }

        for (reason, count) in skipped.iter().sorted() {
            warn!("Skipped {} variants: {}", count, reason);
        }
        if variants.is_empty() {
            bail!("dataset contains no plottable variants");
        }

        let dataset = Dataset { variants };
        for (stage, count) in dataset.stage_counts() {
            info!("Stage {}: {} variants", stage, count);
        }
        Ok(dataset)
    }

    /// Distinct stage names in order of first appearance.
    pub fn stages(&self) -> Vec<String> {
        self.variants
            .iter()
            .map(|v| v.stage.clone())
            .unique()
            .collect()
    }

    pub fn stage_counts(&self) -> Vec<(String, usize)> {
        let mut counts: FnvHashMap<&str, usize> = FnvHashMap::default();
        for v in &self.variants {
            *counts.entry(v.stage.as_str()).or_insert(0) += 1;
        }
        self.stages()
            .into_iter()
            .map(|s| {
                let n = counts[s.as_str()];
                (s, n)
            })
            .collect()
    }

    /// Keeps only variants reported by the named stages.
    pub fn filter_stages(&self, names: &[String]) -> Result<Dataset> {
        let known = self.stages();
        for name in names {
            if !known.contains(name) {
                bail!(
                    "unknown stage '{}' (known stages: {})",
                    name,
                    known.iter().join(", ")
                );
            }
        }
        Ok(Dataset {
            variants: self
                .variants
                .iter()
                .filter(|v| names.contains(&v.stage))
                .cloned()
                .collect(),
        })
    }

    pub fn max_neg_log_p(&self) -> f64 {
        self.variants
            .iter()
            .map(|v| v.neg_log_p)
            .fold(0.0, f64::max)
    }
}

fn stage_records(records: Value) -> Option<Vec<Value>> {
    match records {
        Value::Array(list) => Some(list),
        Value::Object(mut map) => match map.remove("variants").or_else(|| map.remove("data")) {
            Some(Value::Array(list)) => Some(list),
            _ => None,
        },
        _ => None,
    }
}

fn to_variant(
    record: Value,
    genome: &Genome,
    study: &str,
    project: &str,
    stage: &str,
) -> std::result::Result<Variant, &'static str> {
    let raw: RawVariant = serde_json::from_value(record).map_err(|_| "malformed record")?;
    let chrom = normalize_chrom(&raw.chr.into_string());
    let length = match genome.get(&chrom) {
        Some(c) => c.length,
        None => return Err("unknown chromosome"),
    };
    if raw.pos > length {
        return Err("position past chromosome end");
    }
    if !raw.p.is_finite() || raw.p < 0.0 || raw.p > 1.0 {
        return Err("p-value outside [0, 1]");
    }
    let genome_pos = genome
        .genome_position(&chrom, raw.pos)
        .map_err(|_| "position past chromosome end")?;
    Ok(Variant {
        chrom,
        pos: raw.pos,
        genome_pos,
        p: raw.p,
        neg_log_p: neg_log10(raw.p),
        gene: raw.gene.filter(|s| !s.is_empty()),
        rs_id: raw.rs_id.filter(|s| !s.is_empty()),
        ref_allele: raw.ref_allele.filter(|s| !s.is_empty()),
        alt_allele: raw.alt_allele.filter(|s| !s.is_empty()),
        study: study.to_string(),
        project: project.to_string(),
        stage: stage.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn sample() -> Value {
        json!({
            "T2D": {
                "ProjectA": {
                    "discovery": [
                        {"chr": "chr1", "pos": 1000, "p": 1e-9, "gene": "ABC", "rsId": "rs1", "ref": "A", "alt": "G"},
                        {"chr": "chrX", "pos": 2000, "p": 0.5}
                    ],
                    "replication": {
                        "variants": [
                            {"chromosome": 2, "position": 500, "pvalue": 3e-8, "rsid": "rs2"}
                        ]
                    }
                }
            }
        })
    }

    #[test]
    fn test_normalize_flattens_and_tags() {
        let genome = Genome::grch38();
        let ds = Dataset::normalize(sample(), &genome).unwrap();
        assert_eq!(ds.variants.len(), 3);
        let first = &ds.variants[0];
        assert_eq!(first.chrom, "1");
        assert_eq!(first.stage, "discovery");
        assert_eq!(first.study, "T2D");
        assert_eq!(first.project, "ProjectA");
        assert_eq!(first.rs_id.as_deref(), Some("rs1"));
        assert!((first.neg_log_p - 9.0).abs() < 1e-9);

        let second = &ds.variants[2];
        assert_eq!(second.chrom, "2");
        assert_eq!(second.genome_pos, 248_956_422 + 500);
        assert_eq!(second.stage, "replication");
        assert_eq!(ds.stages(), vec!["discovery", "replication"]);
    }

    #[test]
    fn test_skips_bad_records() {
        let genome = Genome::grch38();
        let value = json!({"s": {"p": {"d": [
            {"chr": "chr1", "pos": 10, "p": 0.01},
            {"chr": "chrUn", "pos": 10, "p": 0.01},
            {"chr": "chrMT", "pos": 999999, "p": 0.01},
            {"chr": "chr2", "pos": 10, "p": 1.5},
            {"chr": "chr2", "pos": 10},
            {"chr": "chr3", "pos": 10, "p": 0.0}
        ]}}});
        let ds = Dataset::normalize(value, &genome).unwrap();
        assert_eq!(ds.variants.len(), 2);
        assert!(ds.variants[1].neg_log_p > 300.0);
    }

    #[test]
    fn test_rejects_empty_and_misshapen() {
        let genome = Genome::grch38();
        assert!(Dataset::normalize(json!({"s": {"p": {"d": []}}}), &genome).is_err());
        assert!(Dataset::normalize(json!([1, 2, 3]), &genome).is_err());
        assert!(Dataset::normalize(json!({"s": {"p": {"d": 42}}}), &genome).is_err());
    }

    #[test]
    fn test_filter_stages() {
        let genome = Genome::grch38();
        let ds = Dataset::normalize(sample(), &genome).unwrap();
        let only = ds.filter_stages(&["replication".to_string()]).unwrap();
        assert_eq!(only.variants.len(), 1);
        assert_eq!(only.stage_counts(), vec![("replication".to_string(), 1)]);
        let err = ds.filter_stages(&["combined".to_string()]).unwrap_err();
        assert!(err.to_string().contains("discovery, replication"));
    }

    #[test]
    fn test_stages_keep_document_order() {
        let genome = Genome::grch38();
        let text = r#"{"s": {"p": {
            "replication": [{"chr": "chr2", "pos": 20, "p": 0.01}],
            "discovery": [{"chr": "chr1", "pos": 10, "p": 0.02}],
            "combined": [{"chr": "chr3", "pos": 30, "p": 0.03}]
        }}}"#;
        let ds = Dataset::normalize(serde_json::from_str(text).unwrap(), &genome).unwrap();
        assert_eq!(ds.stages(), vec!["replication", "discovery", "combined"]);
        let chroms: Vec<&str> = ds.variants.iter().map(|v| v.chrom.as_str()).collect();
        assert_eq!(chroms, vec!["2", "1", "3"]);
    }

    #[test]
    fn test_load_plain_and_gzipped() {
        let genome = Genome::grch38();
        let text = serde_json::to_string(&sample()).unwrap();

        let mut plain = tempfile::NamedTempFile::new().unwrap();
        plain.write_all(text.as_bytes()).unwrap();
        assert_eq!(Dataset::load(plain.path(), &genome).unwrap().variants.len(), 3);

        let gz = tempfile::NamedTempFile::new().unwrap();
        let mut enc = flate2::write::GzEncoder::new(
            gz.reopen().unwrap(),
            flate2::Compression::default(),
        );
        enc.write_all(text.as_bytes()).unwrap();
        enc.finish().unwrap();
        assert_eq!(Dataset::load(gz.path(), &genome).unwrap().variants.len(), 3);
    }

    #[test]
    fn test_load_missing_file_mentions_path() {
        let genome = Genome::grch38();
        let err = Dataset::load("/nonexistent/gwas.json", &genome).unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/gwas.json"));
    }
}
