//! Genome-wide coordinates for the GRCh38 (hg38) human assembly.

use anyhow::{bail, Result};
use boomphf::Mphf;

const GRCH38: [(&str, u64); 25] = [
    ("1", 248_956_422),
    ("2", 242_193_529),
    ("3", 198_295_559),
    ("4", 190_214_555),
    ("5", 181_538_259),
    ("6", 170_805_979),
    ("7", 159_345_973),
    ("8", 145_138_636),
    ("9", 138_394_717),
    ("10", 133_797_422),
    ("11", 135_086_622),
    ("12", 133_275_309),
    ("13", 114_364_328),
    ("14", 107_043_718),
    ("15", 101_991_189),
    ("16", 90_338_345),
    ("17", 83_257_441),
    ("18", 80_373_285),
    ("19", 58_617_616),
    ("20", 64_444_167),
    ("21", 46_709_983),
    ("22", 50_818_468),
    ("X", 156_040_895),
    ("Y", 57_227_415),
    ("MT", 16_569),
];

#[derive(Debug, Clone)]
pub struct Chromosome {
    // label without any "chr" prefix
    pub name: String,
    // its length in bp
    pub length: u64,
    // its rank along the x-axis
    pub rank: usize,
    // its start offset in genome-wide coordinates
    pub offset: u64,
}

impl Chromosome {
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

pub struct Genome {
    // chromosomes in plotting order
    chromosomes: Vec<Chromosome>,
    // maps from chromosome name to its slot in `slots`
    name_mphf: Mphf<String>,
    // mphf slot -> rank
    slots: Vec<usize>,
    total: u64,
}

impl Genome {
    pub fn grch38() -> Self {
        let mut chromosomes = Vec::with_capacity(GRCH38.len());
        let mut offset = 0;
        for (rank, (name, length)) in GRCH38.iter().enumerate() {
            chromosomes.push(Chromosome {
                name: name.to_string(),
                length: *length,
                rank,
                offset,
            });
            offset += length;
        }
        let names: Vec<String> = chromosomes.iter().map(|c| c.name.clone()).collect();
        let name_mphf = Mphf::new(1.7, &names);
        let mut slots = vec![0; names.len()];
        for (rank, name) in names.iter().enumerate() {
            slots[name_mphf.hash(name) as usize] = rank;
        }
        Genome {
            chromosomes,
            name_mphf,
            slots,
            total: offset,
        }
    }

    pub fn chromosomes(&self) -> &[Chromosome] {
        &self.chromosomes
    }

    pub fn total_length(&self) -> u64 {
        self.total
    }

    /// Looks up a chromosome by its bare name ("7", "X", "MT").
    pub fn get(&self, name: &str) -> Option<&Chromosome> {
        let key = name.to_string();
        // the mphf yields some slot for unknown keys too, so confirm by name
        let slot = self.name_mphf.try_hash(&key)? as usize;
        let chrom = &self.chromosomes[*self.slots.get(slot)?];
        if chrom.name == key {
            Some(chrom)
        } else {
            None
        }
    }

    pub fn offset(&self, name: &str) -> Option<u64> {
        self.get(name).map(|c| c.offset)
    }

    /// Maps a chromosome-local position onto the concatenated genome axis.
    pub fn genome_position(&self, name: &str, pos: u64) -> Result<u64> {
        match self.get(name) {
            Some(chrom) if pos <= chrom.length => Ok(chrom.offset + pos),
            Some(chrom) => bail!(
                "position {} is past the end of chromosome {} ({} bp)",
                pos,
                chrom.name,
                chrom.length
            ),
            None => bail!("unknown chromosome '{}'", name),
        }
    }

    /// Inverse of `genome_position`, clamped to the genome.
    pub fn locate(&self, genome_pos: f64) -> (&Chromosome, u64) {
        let gp = genome_pos.max(0.0).min(self.total as f64) as u64;
        let idx = self
            .chromosomes
            .partition_point(|c| c.end() <= gp)
            .min(self.chromosomes.len() - 1);
        let chrom = &self.chromosomes[idx];
        (chrom, gp.saturating_sub(chrom.offset).min(chrom.length))
    }

    /// Chromosomes overlapping the genome-wide interval [start, end].
    pub fn overlapping(&self, start: f64, end: f64) -> impl Iterator<Item = &Chromosome> {
        self.chromosomes
            .iter()
            .filter(move |c| (c.end() as f64) > start && (c.offset as f64) < end)
    }
}

/// Strips a case-insensitive "chr" prefix and canonicalises the label.
pub fn normalize_chrom(label: &str) -> String {
    let trimmed = label.trim();
    let bare = match trimmed.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("chr") => &trimmed[3..],
        _ => trimmed,
    };
    let upper = bare.to_ascii_uppercase();
    match upper.as_str() {
        "M" => "MT".to_string(),
        "23" => "X".to_string(),
        "24" => "Y".to_string(),
        _ => upper.trim_start_matches('0').to_string(),
    }
}

/// -log10(p); a p of zero saturates at the smallest positive double.
pub fn neg_log10(p: f64) -> f64 {
    -p.max(f64::MIN_POSITIVE).log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_are_cumulative() {
        let genome = Genome::grch38();
        assert_eq!(genome.offset("1"), Some(0));
        assert_eq!(genome.offset("2"), Some(248_956_422));
        assert_eq!(genome.offset("3"), Some(248_956_422 + 242_193_529));
        let last = genome.chromosomes().last().unwrap();
        assert_eq!(last.name, "MT");
        assert_eq!(genome.total_length(), last.end());
        assert_eq!(genome.total_length(), 3_088_286_401);
    }

    #[test]
    fn test_lookup_rejects_unknown() {
        let genome = Genome::grch38();
        for chrom in genome.chromosomes() {
            assert_eq!(genome.get(&chrom.name).unwrap().rank, chrom.rank);
        }
        assert!(genome.get("chr1").is_none());
        assert!(genome.get("Un").is_none());
        assert!(genome.get("").is_none());
        assert!(genome.get("23").is_none());
    }

    #[test]
    fn test_genome_position() {
        let genome = Genome::grch38();
        assert_eq!(genome.genome_position("1", 100).unwrap(), 100);
        assert_eq!(genome.genome_position("2", 5).unwrap(), 248_956_427);
        assert!(genome.genome_position("MT", 20_000).is_err());
        assert!(genome.genome_position("Z", 1).is_err());
    }

    #[test]
    fn test_locate_inverts_position() {
        let genome = Genome::grch38();
        let gp = genome.genome_position("X", 1_234_567).unwrap();
        let (chrom, pos) = genome.locate(gp as f64);
        assert_eq!(chrom.name, "X");
        assert_eq!(pos, 1_234_567);

        let (chrom, pos) = genome.locate(-10.0);
        assert_eq!((chrom.name.as_str(), pos), ("1", 0));
        let (chrom, _) = genome.locate(1e12);
        assert_eq!(chrom.name, "MT");
    }

    #[test]
    fn test_overlapping() {
        let genome = Genome::grch38();
        let start = genome.offset("3").unwrap() as f64 - 10.0;
        let end = genome.offset("4").unwrap() as f64 + 10.0;
        let names: Vec<&str> = genome
            .overlapping(start, end)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["2", "3", "4"]);
    }

    #[test]
    fn test_normalize_chrom() {
        assert_eq!(normalize_chrom("chr7"), "7");
        assert_eq!(normalize_chrom("CHRX"), "X");
        assert_eq!(normalize_chrom("chrM"), "MT");
        assert_eq!(normalize_chrom("x"), "X");
        assert_eq!(normalize_chrom(" 07 "), "7");
        assert_eq!(normalize_chrom("23"), "X");
    }

    #[test]
    fn test_neg_log10() {
        assert!((neg_log10(1e-8) - 8.0).abs() < 1e-12);
        assert_eq!(neg_log10(1.0), 0.0);
        assert!(neg_log10(0.0) > 300.0);
    }
}
