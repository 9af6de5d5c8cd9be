//! The interactive SVG layer drawn over the bitmap.
//!
//! The bitmap is embedded as a data URI so both layers travel in one
//! document and always share the same viewport.

use std::fmt::{self, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::dataset::Variant;
use crate::plot::Frame;
use crate::scale::{nice_ticks, Range};
use crate::table::{escape, format_p};

const AXIS: &str = "#333333";
const MUTED: &str = "#888888";
const TICK_LEN: f64 = 5.0;

fn num(v: f64) -> String {
    let s = format!("{:.2}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

pub fn render(frame: &Frame, png: &[u8]) -> Result<String, fmt::Error> {
    let layout = frame.layout;
    let plot = layout.plot;
    let mut svg = String::new();
    writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" font-family=\"sans-serif\" font-size=\"11\">",
        w = layout.width,
        h = layout.height
    )?;
    writeln!(
        svg,
        "<defs><clipPath id=\"plot-area\"><rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"/></clipPath></defs>",
        num(plot.x),
        num(plot.y),
        num(plot.w),
        num(plot.h)
    )?;
    writeln!(
        svg,
        "<image class=\"bitmap\" x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" href=\"data:image/png;base64,{}\"/>",
        layout.width,
        layout.height,
        STANDARD.encode(png)
    )?;

    y_axis(frame, &mut svg)?;
    x_axis(frame, &mut svg)?;
    thresholds(frame, &mut svg)?;
    highlights(frame, &mut svg)?;
    slider(frame, &mut svg)?;

    if let Some(brush) = frame.viewport.brush {
        writeln!(
            svg,
            "<rect class=\"brush\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#4682b4\" fill-opacity=\"0.15\" stroke=\"#4682b4\"/>",
            num(brush.x),
            num(brush.y),
            num(brush.w),
            num(brush.h)
        )?;
    }
    svg.push_str("</svg>\n");
    Ok(svg)
}

fn y_axis(frame: &Frame, svg: &mut String) -> fmt::Result {
    let plot = frame.layout.plot;
    let ys = frame.y_scale();
    writeln!(
        svg,
        "<g class=\"y-axis\"><line x1=\"{x}\" y1=\"{}\" x2=\"{x}\" y2=\"{}\" stroke=\"{}\"/>",
        num(plot.y),
        num(plot.bottom()),
        AXIS,
        x = num(plot.x)
    )?;
    for tick in nice_ticks(&frame.viewport.y, 5) {
        let py = num(ys.map(tick));
        writeln!(
            svg,
            "<line x1=\"{}\" y1=\"{py}\" x2=\"{}\" y2=\"{py}\" stroke=\"{}\"/><text x=\"{}\" y=\"{py}\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>",
            num(plot.x - TICK_LEN),
            num(plot.x),
            AXIS,
            num(plot.x - TICK_LEN - 3.0),
            num(tick),
            py = py
        )?;
    }
    let cy = plot.y + plot.h / 2.0;
    writeln!(
        svg,
        "<text x=\"16\" y=\"{cy}\" transform=\"rotate(-90 16 {cy})\" text-anchor=\"middle\">-log10(p)</text></g>",
        cy = num(cy)
    )?;
    Ok(())
}

fn x_axis(frame: &Frame, svg: &mut String) -> fmt::Result {
    let plot = frame.layout.plot;
    let xs = frame.x_scale();
    let x = frame.viewport.x;
    let baseline = plot.bottom();
    writeln!(
        svg,
        "<g class=\"x-axis\"><line x1=\"{}\" y1=\"{y}\" x2=\"{}\" y2=\"{y}\" stroke=\"{}\"/>",
        num(plot.x),
        num(plot.right()),
        AXIS,
        y = num(baseline)
    )?;
    let label_y = num(baseline + TICK_LEN + 11.0);
    let title_y = num(baseline + 36.0);
    let title_x = num(plot.x + plot.w / 2.0);

    let visible: Vec<_> = frame.genome.overlapping(x.min, x.max).collect();
    if visible.len() > 1 {
        for chrom in &visible {
            let left = xs.map((chrom.offset as f64).max(x.min));
            let right = xs.map((chrom.end() as f64).min(x.max));
            // skip labels that would not fit their band
            if right - left < 6.0 * chrom.name.len() as f64 {
                continue;
            }
            let cx = num((left + right) / 2.0);
            writeln!(
                svg,
                "<line x1=\"{cx}\" y1=\"{}\" x2=\"{cx}\" y2=\"{}\" stroke=\"{}\"/><text x=\"{cx}\" y=\"{}\" text-anchor=\"middle\">{}</text>",
                num(baseline),
                num(baseline + TICK_LEN),
                AXIS,
                label_y,
                escape(&chrom.name),
                cx = cx
            )?;
        }
        writeln!(
            svg,
            "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\">Chromosome</text></g>",
            title_x, title_y
        )?;
    } else if let Some(chrom) = visible.first() {
        let offset = chrom.offset as f64;
        let local = Range::new(x.min - offset, x.max - offset);
        for tick in nice_ticks(&local, 6) {
            let px = num(xs.map(tick + offset));
            writeln!(
                svg,
                "<line x1=\"{px}\" y1=\"{}\" x2=\"{px}\" y2=\"{}\" stroke=\"{}\"/><text x=\"{px}\" y=\"{}\" text-anchor=\"middle\">{}</text>",
                num(baseline),
                num(baseline + TICK_LEN),
                AXIS,
                label_y,
                mb(tick),
                px = px
            )?;
        }
        writeln!(
            svg,
            "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\">Chromosome {} position (Mb)</text></g>",
            title_x,
            title_y,
            escape(&chrom.name)
        )?;
    } else {
        svg.push_str("</g>\n");
    }
    Ok(())
}

fn mb(bp: f64) -> String {
    let s = format!("{:.3}", bp / 1e6);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}

fn thresholds(frame: &Frame, svg: &mut String) -> fmt::Result {
    let vp = frame.viewport;
    let lines = [
        ("threshold-high", Some(vp.high), frame.config.colors.highlight.to_string()),
        ("threshold-low", vp.low, MUTED.to_string()),
    ];
    let plot = frame.layout.plot;
    let ys = frame.y_scale();
    for (class, value, color) in lines.iter() {
        let value = match value {
            Some(v) if vp.y.contains(*v) => *v,
            _ => continue,
        };
        writeln!(
            svg,
            "<line class=\"{}\" x1=\"{}\" y1=\"{y}\" x2=\"{}\" y2=\"{y}\" stroke=\"{}\" stroke-dasharray=\"6,4\"/>",
            class,
            num(plot.x),
            num(plot.right()),
            color,
            y = num(ys.map(value))
        )?;
    }
    Ok(())
}

fn tooltip(v: &Variant) -> String {
    let name = match (&v.rs_id, &v.gene) {
        (Some(rs), Some(gene)) => format!("{} ({})", rs, gene),
        (Some(rs), None) => rs.clone(),
        (None, Some(gene)) => gene.clone(),
        (None, None) => "variant".to_string(),
    };
    escape(&format!(
        "{}\n{}:{}\np = {}\n{}",
        name,
        v.chrom,
        v.pos,
        format_p(v.p),
        v.stage
    ))
}

fn highlights(frame: &Frame, svg: &mut String) -> fmt::Result {
    let xs = frame.x_scale();
    let ys = frame.y_scale();
    let color = frame.config.colors.highlight;
    let r = frame.config.point_radius + 1;
    svg.push_str("<g class=\"highlights\" clip-path=\"url(#plot-area)\">\n");
    for v in frame.visible().filter(|v| v.neg_log_p > frame.viewport.high) {
        writeln!(
            svg,
            "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\" data-chr=\"{}\" data-pos=\"{}\" data-p=\"{}\" data-rsid=\"{}\" data-stage=\"{}\"><title>{}</title></circle>",
            num(xs.map(v.genome_pos as f64)),
            num(ys.map(v.neg_log_p)),
            r,
            color,
            escape(&v.chrom),
            v.pos,
            format_p(v.p),
            escape(v.rs_id.as_deref().unwrap_or("")),
            escape(&v.stage),
            tooltip(v)
        )?;
    }
    svg.push_str("</g>\n");
    Ok(())
}

fn slider(frame: &Frame, svg: &mut String) -> fmt::Result {
    let track = frame.layout.slider;
    let scale = frame.viewport.slider_scale(frame.layout);
    let palette = &frame.config.colors;
    writeln!(
        svg,
        "<g class=\"slider\"><rect class=\"slider-track\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"{}\"/>",
        num(track.x),
        num(track.y),
        num(track.w),
        num(track.h),
        MUTED
    )?;
    for chrom in frame.genome.chromosomes() {
        let left = scale.map(chrom.offset as f64);
        let right = scale.map(chrom.end() as f64);
        let fill = if chrom.rank % 2 == 0 {
            palette.point_even
        } else {
            palette.point_odd
        };
        writeln!(
            svg,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" fill-opacity=\"0.35\"/>",
            num(left),
            num(track.y + track.h * 0.35),
            num(right - left),
            num(track.h * 0.3),
            fill
        )?;
    }
    let x = frame.viewport.x;
    let left = scale.map(x.min);
    let width = (scale.map(x.max) - left).max(2.0);
    writeln!(
        svg,
        "<rect class=\"slider-window\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" fill-opacity=\"0.2\" stroke=\"{}\" stroke-width=\"1.5\"/></g>",
        num(left),
        num(track.y),
        num(width),
        num(track.h),
        palette.highlight,
        AXIS
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_trims() {
        assert_eq!(num(10.0), "10");
        assert_eq!(num(2.5), "2.5");
        assert_eq!(num(1.234), "1.23");
        assert_eq!(num(-0.001), "0");
    }

    #[test]
    fn test_mb() {
        assert_eq!(mb(117_500_000.0), "117.5");
        assert_eq!(mb(2_000_000.0), "2");
        assert_eq!(mb(0.0), "0");
    }
}
