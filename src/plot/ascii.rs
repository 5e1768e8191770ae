//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Each series gets one glyph, used for its line and its points. Lines connect
//! consecutive defined values, so a missing year is spanned rather than drawn
//! as a drop to zero.

use crate::domain::ChartDataset;

/// Glyphs assigned by series position (wraps around).
pub const GLYPHS: [char; 8] = ['*', '+', 'x', 'o', '#', '@', '%', '&'];

pub fn glyph_for(position: usize) -> char {
    GLYPHS[position % GLYPHS.len()]
}

/// Render a chart dataset as a fixed-size plot with a legend.
pub fn render_chart(chart: &ChartDataset, unit: &str, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = year_range(&chart.years);
    let (y_min, y_max) = y_range(chart);
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    for (pos, series) in chart.series.iter().enumerate() {
        let glyph = glyph_for(pos);
        let cells: Vec<(usize, usize)> = chart
            .years
            .iter()
            .zip(&series.points)
            .filter_map(|(&year, value)| {
                value.map(|v| {
                    (
                        map_x(year as f64, x_min, x_max, width),
                        map_y(v, y_min, y_max, height),
                    )
                })
            })
            .collect();

        for pair in cells.windows(2) {
            let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
            draw_line(&mut grid, x0, y0, x1, y1, glyph);
        }
        // Points overlay lines (including other series' lines).
        for &(x, y) in &cells {
            grid[y][x] = glyph;
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: years=[{}, {}] | y=[{y_min:.2}, {y_max:.2}] {unit}\n",
        chart.years.first().copied().unwrap_or_default(),
        chart.years.last().copied().unwrap_or_default(),
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    for (pos, series) in chart.series.iter().enumerate() {
        out.push_str(&format!(
            "{} {} ({})\n",
            glyph_for(pos),
            series.entity,
            series.color.hex()
        ));
    }

    out
}

fn year_range(years: &[i32]) -> (f64, f64) {
    match (years.first(), years.last()) {
        (Some(&first), Some(&last)) if last > first => (first as f64, last as f64),
        (Some(&only), _) => (only as f64 - 1.0, only as f64 + 1.0),
        _ => (0.0, 1.0),
    }
}

fn y_range(chart: &ChartDataset) -> (f64, f64) {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for v in chart.series.iter().flat_map(|s| s.points.iter().flatten()) {
        min_y = min_y.min(*v);
        max_y = max_y.max(*v);
    }

    if !(min_y.is_finite() && max_y.is_finite()) {
        (0.0, 1.0)
    } else if max_y > min_y {
        (min_y, max_y)
    } else {
        (min_y - 1.0, max_y + 1.0)
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish). Only fills blank cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Color, Series};

    fn series(entity: &str, points: Vec<Option<f64>>) -> Series {
        Series {
            entity: entity.to_string(),
            color: Color::rgb(59, 130, 246),
            points,
        }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let chart = ChartDataset {
            years: vec![2000, 2001, 2002],
            series: vec![series("A", vec![Some(0.0), None, Some(10.0)])],
            excluded: vec![],
        };

        let txt = render_chart(&chart, "°C", 10, 5);
        let expected = concat!(
            "Plot: years=[2000, 2002] | y=[-0.50, 10.50] °C\n",
            "        **\n",
            "      **  \n",
            "    **    \n",
            "  **      \n",
            "**        \n",
            "* A (#3b82f6)\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn gaps_are_spanned_not_dropped_to_zero() {
        let chart = ChartDataset {
            years: vec![2000, 2001, 2002],
            series: vec![
                series("floor", vec![Some(0.0), Some(0.0), Some(0.0)]),
                series("gappy", vec![Some(10.0), None, Some(10.0)]),
            ],
            excluded: vec![],
        };

        let txt = render_chart(&chart, "t", 10, 5);
        let rows: Vec<&str> = txt.lines().collect();
        assert_eq!(rows[1], "++++++++++");
        assert_eq!(rows[5], "**********");
        assert_eq!(rows[7], "+ gappy (#3b82f6)");
    }

    #[test]
    fn glyphs_wrap_around() {
        assert_eq!(glyph_for(0), '*');
        assert_eq!(glyph_for(GLYPHS.len()), '*');
        assert_eq!(glyph_for(1), '+');
    }
}
