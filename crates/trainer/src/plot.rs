use anyhow::{Context, Result};
use std::fmt::{self, Write as _};
use std::path::Path;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 480.0;
const MARGIN: f64 = 48.0;
/// Spacing between horizontal grid lines, in loss units.
const TICK: f64 = 0.2;

/// Renders a loss series as a standalone SVG line chart.
/// Non-finite points are skipped.
pub fn render_loss_svg(losses: &[f64]) -> Result<String> {
    write_svg(losses).context("Failed to render loss plot")
}

fn write_svg(losses: &[f64]) -> Result<String, fmt::Error> {
    let points: Vec<(usize, f64)> = losses
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, l)| l.is_finite())
        .collect();

    let mut svg = String::new();
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = WIDTH,
        h = HEIGHT
    )?;
    writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#)?;

    if points.is_empty() {
        svg.push_str("</svg>\n");
        return Ok(svg);
    }

    let lo = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let hi = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
    let y_min = (lo / TICK).floor() * TICK;
    let y_max = ((hi / TICK).ceil() * TICK).max(y_min + TICK);
    let x_span = (losses.len().max(2) - 1) as f64;

    let plot_w = WIDTH - 2.0 * MARGIN;
    let plot_h = HEIGHT - 2.0 * MARGIN;
    let to_x = |i: usize| MARGIN + plot_w * i as f64 / x_span;
    let to_y = |v: f64| HEIGHT - MARGIN - plot_h * (v - y_min) / (y_max - y_min);

    let ticks = ((y_max - y_min) / TICK).round() as usize;
    for t in 0..=ticks {
        let value = y_min + t as f64 * TICK;
        let y = to_y(value);
        writeln!(
            svg,
            r##"<line x1="{x1:.1}" y1="{y:.1}" x2="{x2:.1}" y2="{y:.1}" stroke="#dddddd"/>"##,
            x1 = MARGIN,
            x2 = WIDTH - MARGIN,
            y = y
        )?;
        writeln!(
            svg,
            r#"<text x="{x:.1}" y="{y:.1}" font-size="10" text-anchor="end">{value:.1}</text>"#,
            x = MARGIN - 4.0,
            y = y + 3.0,
            value = value
        )?;
    }

    writeln!(
        svg,
        r#"<rect x="{m}" y="{m}" width="{w}" height="{h}" fill="none" stroke="black"/>"#,
        m = MARGIN,
        w = plot_w,
        h = plot_h
    )?;

    let coords: Vec<String> = points
        .iter()
        .map(|&(i, v)| format!("{:.1},{:.1}", to_x(i), to_y(v)))
        .collect();
    writeln!(
        svg,
        r##"<polyline fill="none" stroke="#1f77b4" stroke-width="1.5" points="{}"/>"##,
        coords.join(" ")
    )?;

    svg.push_str("</svg>\n");
    Ok(svg)
}

pub fn save_loss_plot<P: AsRef<Path>>(path: P, losses: &[f64]) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, render_loss_svg(losses)?)
        .with_context(|| format!("Failed to write loss plot to {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_series_renders_blank_chart() {
        let svg = render_loss_svg(&[]).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(!svg.contains("polyline"));
    }

    #[test]
    fn one_vertex_per_finite_point() {
        let svg = render_loss_svg(&[4.2, 3.1, f64::NAN, 2.5]).unwrap();
        let line = svg.lines().find(|l| l.starts_with("<polyline")).unwrap();
        let points = line.split("points=\"").nth(1).unwrap().trim_end_matches("\"/>");
        assert_eq!(points.split(' ').count(), 3);
    }

    #[test]
    fn grid_follows_fixed_tick_spacing() {
        let svg = render_loss_svg(&[1.0, 1.4]).unwrap();
        assert!(svg.contains(">1.0</text>"));
        assert!(svg.contains(">1.2</text>"));
        assert!(svg.contains(">1.4</text>"));
    }
}
