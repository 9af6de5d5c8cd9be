//! Paged results table of the highlighted variants.

use std::fmt::{self, Write};

use itertools::Itertools;

use crate::dataset::Variant;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paginator {
    total: usize,
    page_size: usize,
    // zero-based
    page: usize,
}

impl Paginator {
    pub fn new(total: usize, page_size: usize) -> Self {
        Paginator {
            total,
            page_size: page_size.max(1),
            page: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// One-based page number.
    pub fn page(&self) -> usize {
        self.page + 1
    }

    /// An empty table still has one (empty) page.
    pub fn page_count(&self) -> usize {
        ((self.total + self.page_size - 1) / self.page_size).max(1)
    }

    /// Item indices shown on the current page.
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = (self.page * self.page_size).min(self.total);
        let end = (start + self.page_size).min(self.total);
        start..end
    }

    pub fn has_prev(&self) -> bool {
        self.page > 0
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.page_count()
    }

    pub fn first(&mut self) {
        self.page = 0;
    }

    pub fn last(&mut self) {
        self.page = self.page_count() - 1;
    }

    pub fn prev(&mut self) {
        self.page = self.page.saturating_sub(1);
    }

    pub fn next(&mut self) {
        if self.has_next() {
            self.page += 1;
        }
    }

    /// Jumps to a one-based page, clamped to the valid pages.
    pub fn goto(&mut self, page: usize) {
        self.page = page.max(1).min(self.page_count()) - 1;
    }

    /// Changes the item count and returns to the first page.
    pub fn reset(&mut self, total: usize) {
        self.total = total;
        self.page = 0;
    }
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

pub fn format_p(p: f64) -> String {
    format!("{:.2e}", p)
}

fn cell(field: &Option<String>) -> String {
    field.as_deref().map(escape).unwrap_or_else(|| "-".to_string())
}

const COLUMNS: [&str; 7] = ["Gene", "rsId", "Position", "Ref", "Alt", "P-value", "Stage"];

/// Renders the current page of `rows` with first/prev/next/last controls.
pub fn render_html(rows: &[&Variant], pager: &Paginator) -> Result<String, fmt::Error> {
    let mut html = String::new();
    html.push_str("<div class=\"results\">\n<table>\n<thead><tr>");
    for col in COLUMNS.iter() {
        write!(html, "<th>{}</th>", col)?;
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    if pager.total() == 0 {
        writeln!(
            html,
            "<tr><td colspan=\"{}\" class=\"empty\">No variants above threshold</td></tr>",
            COLUMNS.len()
        )?;
    }
    for v in &rows[pager.range()] {
        writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}:{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            cell(&v.gene),
            cell(&v.rs_id),
            escape(&v.chrom),
            v.pos,
            cell(&v.ref_allele),
            cell(&v.alt_allele),
            format_p(v.p),
            escape(&v.stage),
        )?;
    }
    html.push_str("</tbody>\n</table>\n<nav class=\"pager\">");
    let controls = [
        ("first", "&laquo;", pager.has_prev(), 1),
        ("prev", "&lsaquo;", pager.has_prev(), pager.page().saturating_sub(1).max(1)),
        ("next", "&rsaquo;", pager.has_next(), (pager.page() + 1).min(pager.page_count())),
        ("last", "&raquo;", pager.has_next(), pager.page_count()),
    ];
    for (i, (class, label, enabled, target)) in controls.iter().enumerate() {
        if i == 2 {
            write!(
                html,
                "<span class=\"status\">Page {} of {} ({} variants)</span>",
                pager.page(),
                pager.page_count(),
                pager.total()
            )?;
        }
        if *enabled {
            write!(
                html,
                "<button class=\"{}\" data-page=\"{}\">{}</button>",
                class, target, label
            )?;
        } else {
            write!(
                html,
                "<button class=\"{}\" disabled>{}</button>",
                class, label
            )?;
        }
    }
    html.push_str("</nav>\n</div>\n");
    Ok(html)
}

/// Every row, tab-separated, with a header line.
pub fn render_tsv(rows: &[&Variant]) -> Result<String, fmt::Error> {
    let mut tsv = String::from("gene\trsid\tchr\tpos\tref\talt\tp\tstage\n");
    let field = |f: &Option<String>| f.clone().unwrap_or_else(|| ".".to_string());
    for v in rows {
        writeln!(
            tsv,
            "{}",
            [
                field(&v.gene),
                field(&v.rs_id),
                v.chrom.clone(),
                v.pos.to_string(),
                field(&v.ref_allele),
                field(&v.alt_allele),
                format_p(v.p),
                v.stage.clone(),
            ]
            .iter()
            .join("\t")
        )?;
    }
    Ok(tsv)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(rs: &str, p: f64) -> Variant {
        Variant {
            chrom: "7".to_string(),
            pos: 117_559_590,
            genome_pos: 0,
            p,
            neg_log_p: -p.log10(),
            gene: Some("CFTR".to_string()),
            rs_id: Some(rs.to_string()),
            ref_allele: Some("A".to_string()),
            alt_allele: None,
            study: "s".to_string(),
            project: "p".to_string(),
            stage: "discovery".to_string(),
        }
    }

    #[test]
    fn test_page_arithmetic() {
        let mut pager = Paginator::new(23, 10);
        assert_eq!(pager.page_count(), 3);
        assert_eq!(pager.range(), 0..10);
        assert!(!pager.has_prev());
        pager.next();
        pager.next();
        assert_eq!(pager.range(), 20..23);
        assert!(!pager.has_next());
        pager.next();
        assert_eq!(pager.page(), 3);
        pager.prev();
        assert_eq!(pager.page(), 2);
        pager.first();
        assert_eq!(pager.page(), 1);
        pager.prev();
        assert_eq!(pager.page(), 1);
        pager.last();
        assert_eq!(pager.page(), 3);
        pager.goto(99);
        assert_eq!(pager.page(), 3);
        pager.goto(0);
        assert_eq!(pager.page(), 1);
    }

    #[test]
    fn test_empty_has_one_page() {
        let mut pager = Paginator::new(0, 10);
        assert_eq!(pager.page_count(), 1);
        assert_eq!(pager.range(), 0..0);
        pager.last();
        assert_eq!(pager.page(), 1);
        let html = render_html(&[], &pager).unwrap();
        assert!(html.contains("No variants above threshold"));
        assert!(html.contains("Page 1 of 1 (0 variants)"));
        assert_eq!(html.matches("disabled").count(), 4);
    }

    #[test]
    fn test_reset_returns_to_first_page() {
        let mut pager = Paginator::new(30, 10);
        pager.last();
        pager.reset(5);
        assert_eq!(pager.page(), 1);
        assert_eq!(pager.page_count(), 1);
    }

    #[test]
    fn test_render_html_page() {
        let a = variant("rs1", 1e-12);
        let b = variant("rs<2>", 3.5e-9);
        let c = variant("rs3", 4e-8);
        let rows = vec![&a, &b, &c];
        let mut pager = Paginator::new(rows.len(), 2);
        pager.next();
        let html = render_html(&rows, &pager).unwrap();
        assert!(html.contains("<td>rs3</td>"));
        assert!(!html.contains("<td>rs1</td>"));
        assert!(html.contains("<td>7:117559590</td>"));
        assert!(html.contains("<td>4.00e-8</td>"));
        assert!(html.contains("Page 2 of 2 (3 variants)"));
        assert!(html.contains("<button class=\"prev\" data-page=\"1\">"));
        assert!(html.contains("<button class=\"next\" disabled>"));

        pager.first();
        let html = render_html(&rows, &pager).unwrap();
        assert!(html.contains("rs&lt;2&gt;"));
        assert!(html.contains("<td>-</td>"));
    }

    #[test]
    fn test_render_tsv() {
        let a = variant("rs1", 1e-12);
        let tsv = render_tsv(&[&a]).unwrap();
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "CFTR\trs1\t7\t117559590\tA\t.\t1.00e-12\tdiscovery");
    }
}
