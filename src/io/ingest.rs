//! CSV ingest for local observation files.
//!
//! Turns a heterogeneous climate CSV (OWID-style `country,year,co2_emissions`
//! or Berkeley-style `dt,AverageTemperature,City,Country`) into one
//! [`RawRecord`] per `(entity, year)`.
//!
//! - **Flexible schema**: a few common column aliases are accepted
//! - **Row-level validation**: bad rows are skipped and reported
//! - **Yearly aggregation**: sub-yearly rows are folded with the dataset's
//!   aggregation (mean for temperature, sum for emissions)
//! - **Country roll-up**: with a city/state column, each row counts both for
//!   `"Country / City"` and for the bare country

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use csv::StringRecord;
use tracing::{debug, warn};

use crate::domain::{Aggregation, Dataset, RawRecord, city_entity};
use crate::error::AppError;

const ENTITY_COLUMNS: [&str; 2] = ["entity", "country"];
const SUB_ENTITY_COLUMNS: [&str; 2] = ["city", "state"];
const YEAR_COLUMNS: [&str; 1] = ["year"];
const DATE_COLUMNS: [&str; 2] = ["dt", "date"];
const VALUE_COLUMNS: [&str; 5] = [
    "value",
    "temperature",
    "averagetemperature",
    "co2_emissions",
    "annual_co2_emissions",
];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: yearly records in first-seen entity order + row errors.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub records: Vec<RawRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
    entities: Vec<String>,
}

impl IngestedData {
    /// Distinct entities in first-seen order.
    pub fn entities(&self) -> &[String] {
        &self.entities
    }
}

/// Resolved column positions for one file.
#[derive(Debug, Clone, Copy)]
struct Columns {
    entity: usize,
    sub_entity: Option<usize>,
    year: YearColumn,
    value: usize,
}

#[derive(Debug, Clone, Copy)]
enum YearColumn {
    Year(usize),
    Date(usize),
}

/// Load an observation CSV from disk.
pub fn load_observations(path: &Path, dataset: Dataset) -> Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let data = read_observations(file, dataset.aggregation())?;
    debug!(
        path = %path.display(),
        rows_read = data.rows_read,
        rows_used = data.rows_used,
        records = data.records.len(),
        "observations loaded"
    );
    if !data.row_errors.is_empty() {
        warn!(count = data.row_errors.len(), "skipped invalid CSV rows");
    }
    Ok(data)
}

/// Parse observations from any reader.
pub fn read_observations<R: Read>(reader: R, aggregation: Aggregation) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let columns = resolve_columns(&build_header_map(&headers))?;

    let mut folded = YearFolder::new(aggregation);
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_used = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_row(&record, columns));
        match parsed {
            Ok(row) => {
                let city = row.city.as_deref().map(|c| city_entity(&row.country, c));
                folded.push(row.country, row.year, row.value);
                if let Some(city) = city {
                    folded.push(city, row.year, row.value);
                }
                rows_used += 1;
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if rows_used == 0 {
        return Err(AppError::new(3, "No valid rows found in the CSV."));
    }

    let (entities, records) = folded.finish();
    Ok(IngestedData {
        records,
        row_errors,
        rows_read,
        rows_used,
        entities,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often carry a UTF-8 BOM on the first header.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn find_column(header_map: &HashMap<String, usize>, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|n| header_map.get(*n).copied())
}

fn resolve_columns(header_map: &HashMap<String, usize>) -> Result<Columns, AppError> {
    let entity = find_column(header_map, &ENTITY_COLUMNS)
        .ok_or_else(|| AppError::new(2, "Missing entity column: expected `entity` or `country`."))?;

    let year = match (
        find_column(header_map, &YEAR_COLUMNS),
        find_column(header_map, &DATE_COLUMNS),
    ) {
        (Some(idx), _) => YearColumn::Year(idx),
        (None, Some(idx)) => YearColumn::Date(idx),
        (None, None) => {
            return Err(AppError::new(2, "Missing year column: expected `year`, `dt` or `date`."));
        }
    };

    let value = find_column(header_map, &VALUE_COLUMNS).ok_or_else(|| {
        AppError::new(
            2,
            format!("Missing value column: expected one of {}.", VALUE_COLUMNS.join(", ")),
        )
    })?;

    Ok(Columns {
        entity,
        sub_entity: find_column(header_map, &SUB_ENTITY_COLUMNS),
        year,
        value,
    })
}

/// One valid CSV row before yearly folding.
#[derive(Debug, Clone, PartialEq)]
struct Row {
    country: String,
    city: Option<String>,
    year: i32,
    value: Option<f64>,
}

fn parse_row(record: &StringRecord, columns: Columns) -> Result<Row, String> {
    let country = get_field(record, columns.entity).ok_or("Missing entity value.")?;
    let city = columns.sub_entity.and_then(|idx| get_field(record, idx));

    let year = match columns.year {
        YearColumn::Year(idx) => {
            let raw = get_field(record, idx).ok_or("Missing year value.")?;
            raw.parse::<i32>()
                .map_err(|_| format!("Invalid year '{raw}'."))?
        }
        YearColumn::Date(idx) => {
            let raw = get_field(record, idx).ok_or("Missing date value.")?;
            parse_date(raw)?.year()
        }
    };

    let value = match get_field(record, columns.value) {
        None => None,
        Some(raw) => {
            let v = raw
                .parse::<f64>()
                .map_err(|_| format!("Invalid value '{raw}'."))?;
            if !v.is_finite() {
                return Err(format!("Non-finite value '{raw}'."));
            }
            Some(v)
        }
    };

    Ok(Row {
        country: country.to_string(),
        city: city.map(str::to_string),
        year,
        value,
    })
}

fn get_field(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, DD/MM/YYYY, DD-MM-YYYY, YYYY/MM/DD."
    ))
}

/// Folds rows into one value per `(entity, year)`.
struct YearFolder {
    aggregation: Aggregation,
    order: Vec<String>,
    cells: HashMap<String, BTreeMap<i32, Accumulator>>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl YearFolder {
    fn new(aggregation: Aggregation) -> Self {
        Self {
            aggregation,
            order: Vec::new(),
            cells: HashMap::new(),
        }
    }

    fn push(&mut self, entity: String, year: i32, value: Option<f64>) {
        if !self.cells.contains_key(&entity) {
            self.order.push(entity.clone());
        }
        let acc = self.cells.entry(entity).or_default().entry(year).or_default();
        if let Some(v) = value {
            acc.sum += v;
            acc.count += 1;
        }
    }

    /// Entities in first-seen order, and their records with years ascending.
    ///
    /// A year whose rows all lacked a value stays as an absent value.
    fn finish(mut self) -> (Vec<String>, Vec<RawRecord>) {
        let mut out = Vec::new();
        for entity in &self.order {
            let Some(cells) = self.cells.remove(entity) else { continue };
            for (year, acc) in cells {
                let value = (acc.count > 0).then(|| match self.aggregation {
                    Aggregation::Mean => acc.sum / acc.count as f64,
                    Aggregation::Sum => acc.sum,
                });
                out.push(RawRecord {
                    entity: entity.clone(),
                    year,
                    value,
                });
            }
        }
        (self.order, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(csv: &str, aggregation: Aggregation) -> IngestedData {
        read_observations(csv.as_bytes(), aggregation).unwrap()
    }

    #[test]
    fn reads_owid_style_rows() {
        let data = read(
            "country,year,co2_emissions\nIndia,2001,10\nIndia,2000,5\nBrazil,2000,\n",
            Aggregation::Sum,
        );
        assert_eq!(
            data.records,
            vec![
                RawRecord::new("India", 2000, Some(5.0)),
                RawRecord::new("India", 2001, Some(10.0)),
                RawRecord::new("Brazil", 2000, None),
            ]
        );
        assert_eq!(data.entities(), vec!["India", "Brazil"]);
        assert_eq!((data.rows_read, data.rows_used), (3, 3));
    }

    #[test]
    fn monthly_temperatures_are_averaged_per_year() {
        let data = read(
            "\u{feff}dt,AverageTemperature,City,Country\n\
             2000-01-01,1.0,Oslo,Norway\n\
             2000-02-01,3.0,Oslo,Norway\n\
             01/01/2001,,Oslo,Norway\n",
            Aggregation::Mean,
        );
        assert_eq!(
            data.records,
            vec![
                RawRecord::new("Norway", 2000, Some(2.0)),
                RawRecord::new("Norway", 2001, None),
                RawRecord::new("Norway / Oslo", 2000, Some(2.0)),
                RawRecord::new("Norway / Oslo", 2001, None),
            ]
        );
    }

    #[test]
    fn states_roll_up_into_a_country_mean() {
        let data = read(
            "dt,AverageTemperature,State,Country\n\
             2000-01-01,20.0,Goa,India\n\
             2000-06-01,30.0,Goa,India\n\
             2000-01-01,10.0,Kerala,India\n\
             2001-01-01,26.0,Kerala,India\n",
            Aggregation::Mean,
        );
        assert_eq!(data.entities(), &["India", "India / Goa", "India / Kerala"]);

        let india: Vec<&RawRecord> = data.records.iter().filter(|r| r.entity == "India").collect();
        assert_eq!(
            india,
            vec![
                &RawRecord::new("India", 2000, Some(20.0)),
                &RawRecord::new("India", 2001, Some(26.0)),
            ]
        );
        assert_eq!(data.rows_used, 4);
    }

    #[test]
    fn sub_yearly_emissions_are_summed() {
        let data = read("entity,year,value\nA,2000,1.5\nA,2000,2.5\n", Aggregation::Sum);
        assert_eq!(data.records, vec![RawRecord::new("A", 2000, Some(4.0))]);
    }

    #[test]
    fn bad_rows_are_reported_with_line_numbers() {
        let data = read(
            "country,year,value\nA,2000,1\nA,twenty,2\nA,2002,abc\n,2003,1\nA,2004,inf\n",
            Aggregation::Mean,
        );
        assert_eq!(data.records.len(), 1);
        let lines: Vec<usize> = data.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4, 5, 6]);
    }

    #[test]
    fn missing_columns_are_input_errors() {
        let err = read_observations("name,year,value\nA,2000,1\n".as_bytes(), Aggregation::Mean).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let err = read_observations("country,value\nA,1\n".as_bytes(), Aggregation::Mean).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn no_usable_rows_is_no_data() {
        let err = read_observations("country,year,value\n,x,1\n".as_bytes(), Aggregation::Mean).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
