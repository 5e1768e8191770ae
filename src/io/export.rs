//! Export per-entity statistics to CSV.
//!
//! Meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{Dataset, EntityStats};
use crate::error::AppError;

const HEADER: &str = "entity,unit,points,earliest_year,earliest_value,latest_year,latest_value,\
growth_percent,min_year,min_value,max_year,max_value,mean_value,trend_per_year";

/// Write per-entity statistics to a CSV file.
pub fn write_stats_csv(path: &Path, stats: &[EntityStats], dataset: Dataset) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_stats(file, stats, dataset)
}

fn write_stats<W: Write>(mut out: W, stats: &[EntityStats], dataset: Dataset) -> Result<(), AppError> {
    writeln!(out, "{HEADER}").map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for s in stats {
        writeln!(
            out,
            "{},{},{},{},{:.4},{},{:.4},{:.1},{},{:.4},{},{:.4},{:.4},{}",
            csv_field(&s.entity),
            dataset.unit_label(),
            s.points,
            s.earliest_year,
            s.earliest_value,
            s.latest_year,
            s.latest_value,
            s.growth_percent,
            s.min_year,
            s.min_value,
            s.max_year,
            s.max_value,
            s.mean_value,
            s.trend_per_year.map(|v| format!("{v:.6}")).unwrap_or_default(),
        )
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

/// Quote a field if it contains a delimiter or quote.
fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_rows() {
        let stats = EntityStats {
            entity: "Korea, South".to_string(),
            min_value: 1.0,
            min_year: 2000,
            max_value: 3.0,
            max_year: 2002,
            earliest_year: 2000,
            earliest_value: 1.0,
            latest_year: 2002,
            latest_value: 3.0,
            growth_percent: 200.0,
            mean_value: 2.0,
            points: 3,
            trend_per_year: None,
        };

        let mut buf = Vec::new();
        write_stats(&mut buf, &[stats], Dataset::Co2).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], HEADER);
        assert_eq!(
            lines[1],
            "\"Korea, South\",metric tons,3,2000,1.0000,2002,3.0000,200.0,2000,1.0000,2002,3.0000,2.0000,"
        );
    }
}
