//! Plain-text narrative built from per-entity statistics.
//!
//! This is the local fallback used when the remote narrative is missing. The
//! output is a pure function of its inputs (no clock, no locale).

use crate::domain::{EntityStats, FilterSpec};

/// Growth direction, decided by a strict sign test on the rounded percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increased,
    Decreased,
    Flat,
}

impl Direction {
    pub fn from_growth(growth_percent: f64) -> Self {
        if growth_percent > 0.0 {
            Direction::Increased
        } else if growth_percent < 0.0 {
            Direction::Decreased
        } else {
            Direction::Flat
        }
    }
}

/// Render the header plus one paragraph per entity.
///
/// `unit` is appended to values when given (e.g. `"°C"`).
pub fn render_narrative(stats: &[EntityStats], spec: &FilterSpec, unit: Option<&str>) -> String {
    let mut paragraphs = Vec::with_capacity(stats.len() + 1);
    paragraphs.push(format!(
        "Summary for {} to {}:",
        spec.start_year(),
        spec.end_year()
    ));
    for s in stats {
        paragraphs.push(entity_paragraph(s, unit));
    }
    paragraphs.join("\n\n")
}

fn entity_paragraph(s: &EntityStats, unit: Option<&str>) -> String {
    let with_unit = |v: f64| match unit {
        Some(u) => format!("{} {u}", format_number(v)),
        None => format_number(v),
    };

    let mut out = String::new();
    if s.points == 1 {
        out.push_str(&format!(
            "{}: only one value is available in this period ({} in {}), so the level stayed roughly the same.",
            s.entity,
            with_unit(s.earliest_value),
            s.earliest_year,
        ));
        return out;
    }

    let change = match Direction::from_growth(s.growth_percent) {
        Direction::Increased => format!("increased by {}%", format_number(s.growth_percent)),
        Direction::Decreased => format!("decreased by {}%", format_number(s.growth_percent.abs())),
        Direction::Flat => "stayed roughly the same".to_string(),
    };
    out.push_str(&format!(
        "{}: between {} and {}, the value {change} (from {} to {}).",
        s.entity,
        s.earliest_year,
        s.latest_year,
        with_unit(s.earliest_value),
        with_unit(s.latest_value),
    ));
    out.push_str(&format!(
        " The peak was {} in {}, and the lowest point was {} in {}.",
        with_unit(s.max_value),
        s.max_year,
        with_unit(s.min_value),
        s.min_year,
    ));
    out.push_str(&format!(" The average over {} years was {}", s.points, with_unit(s.mean_value)));
    match s.trend_per_year {
        Some(slope) => out.push_str(&format!(
            ", with an overall trend of {}{} per year.",
            if slope > 0.0 { "+" } else { "" },
            with_unit(slope),
        )),
        None => out.push('.'),
    }
    out
}

/// Format a number with thousands separators and at most two decimals.
///
/// Trailing zero decimals are dropped: `1234.5 -> "1,234.5"`, `1000.0 -> "1,000"`.
pub fn format_number(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let fixed = format!("{:.2}", v.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let frac = frac_part.trim_end_matches('0');
    let is_zero = int_part.chars().all(|c| c == '0') && frac.is_empty();
    let sign = if v < 0.0 && !is_zero { "-" } else { "" };

    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac}")
    }
}
