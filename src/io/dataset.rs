//! Read/write chart dataset JSON files.
//!
//! The file is the portable form of an aggregated chart: dataset, window,
//! unit and the gap-aware series. `ct plot --file` renders it without any
//! network access.

use std::fs::File;
use std::path::Path;

use crate::domain::{ChartDataset, Dataset, DatasetFile, FilterSpec};
use crate::error::AppError;

pub fn dataset_file(chart: &ChartDataset, dataset: Dataset, spec: &FilterSpec) -> DatasetFile {
    DatasetFile {
        tool: "ct".to_string(),
        dataset,
        unit: dataset.unit_label().to_string(),
        start_year: spec.start_year(),
        end_year: spec.end_year(),
        chart: chart.clone(),
    }
}

/// Write a dataset JSON file.
pub fn write_dataset_json(path: &Path, file: &DatasetFile) -> Result<(), AppError> {
    let out = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create dataset JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(out, file)
        .map_err(|e| AppError::new(2, format!("Failed to write dataset JSON: {e}")))?;
    Ok(())
}

/// Read a dataset JSON file.
///
/// Every series must match the year axis length, otherwise the file is rejected.
pub fn read_dataset_json(path: &Path) -> Result<DatasetFile, AppError> {
    let input = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open dataset JSON '{}': {e}", path.display())))?;
    let file: DatasetFile =
        serde_json::from_reader(input).map_err(|e| AppError::new(2, format!("Invalid dataset JSON: {e}")))?;

    let axis = file.chart.years.len();
    if let Some(bad) = file.chart.series.iter().find(|s| s.points.len() != axis) {
        return Err(AppError::new(
            2,
            format!(
                "Invalid dataset JSON: series '{}' has {} points for {axis} years.",
                bad.entity,
                bad.points.len()
            ),
        ));
    }
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Color, Series};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("ct-{}-{name}", std::process::id()))
    }

    fn chart() -> ChartDataset {
        ChartDataset {
            years: vec![2000, 2001, 2002],
            series: vec![Series {
                entity: "India".to_string(),
                color: Color::rgb(59, 130, 246),
                points: vec![Some(1.0), None, Some(3.0)],
            }],
            excluded: vec![],
        }
    }

    #[test]
    fn written_file_reads_back_with_gaps() {
        let path = temp_path("dataset.json");
        let spec = FilterSpec::new(["India"], 2000, 2002).unwrap();
        let file = dataset_file(&chart(), Dataset::Co2, &spec);

        write_dataset_json(&path, &file).unwrap();
        let back = read_dataset_json(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(back, file);
        assert_eq!(back.chart.series[0].points[1], None);
        assert_eq!(back.unit, "metric tons");
    }

    #[test]
    fn mismatched_series_length_is_rejected() {
        let path = temp_path("bad-dataset.json");
        let spec = FilterSpec::new(["India"], 2000, 2002).unwrap();
        let mut file = dataset_file(&chart(), Dataset::Co2, &spec);
        file.chart.series[0].points.pop();

        write_dataset_json(&path, &file).unwrap();
        let err = read_dataset_json(&path).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert_eq!(err.exit_code(), 2);
    }
}
