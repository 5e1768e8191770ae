//! HTTP client for the climate data API.
//!
//! Endpoints:
//! - `GET /filter?dataset=&country=&city=&start_year=&end_year=` -> observation rows
//!   for one entity (`city` only for `"Country / City"` entities)
//! - `GET /{dataset}-summary?country=&city=&start_year=&end_year=` -> `{summary}` or `{error}`
//! - `GET /{dataset}-filters` -> `{countries: [...]}`
//! - `GET /cities-for-country?country=` -> `{cities: [...]}`

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::data::provider::{ENTITY_DELIMITER, NarrativeProvider, NarrativeResponse, SeriesProvider, SeriesQuery};
use crate::domain::{Dataset, RawRecord, split_entity};
use crate::error::{AppError, EngineError, FetchTarget};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the API lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    /// Read `CLIMATE_API_URL` / `CLIMATE_API_TIMEOUT_SECS` (a `.env` file is honored).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let base_url = std::env::var("CLIMATE_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout_secs = match std::env::var("CLIMATE_API_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|e| {
                AppError::new(2, format!("Invalid CLIMATE_API_TIMEOUT_SECS '{raw}': {e}"))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };
        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Entities (countries) available for a dataset.
    pub fn fetch_entities(&self, dataset: Dataset) -> Result<Vec<String>, EngineError> {
        let body: CountriesResponse = self.get_json(&options_path(dataset), &[], FetchTarget::Options)?;
        Ok(body.countries)
    }

    /// Cities known for a country (temperature dataset only).
    pub fn fetch_cities(&self, country: &str) -> Result<Vec<String>, EngineError> {
        let body: CitiesResponse =
            self.get_json("cities-for-country", &[("country", country.to_string())], FetchTarget::Options)?;
        Ok(body.cities)
    }

    fn get_text(&self, path: &str, params: &[(&str, String)], target: FetchTarget) -> Result<String, EngineError> {
        let url = format!("{}/{path}", self.base_url);
        debug!(%url, ?params, "GET");

        let resp = self
            .client
            .get(&url)
            .query(params)
            .send()
            .map_err(|e| EngineError::fetch(target, format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(EngineError::fetch(
                target,
                format!("request failed with status {}", resp.status()),
            ));
        }

        resp.text()
            .map_err(|e| EngineError::fetch(target, format!("failed to read response body: {e}")))
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        target: FetchTarget,
    ) -> Result<T, EngineError> {
        let body = self.get_text(path, params, target)?;
        serde_json::from_str(&body)
            .map_err(|e| EngineError::fetch(target, format!("failed to parse response: {e}")))
    }
}

impl SeriesProvider for ApiClient {
    /// One `/filter` request per entity; rows are attributed to the entity they were requested for.
    fn fetch_series(&self, query: &SeriesQuery) -> Result<Vec<RawRecord>, EngineError> {
        let mut records = Vec::new();
        for entity in &query.entities {
            let body = self.get_text("filter", &series_params(query, entity), FetchTarget::Series)?;
            let rows = parse_series_body(&body, entity)?;
            for err in &rows.malformed {
                warn!(entity = %entity, error = %err, "dropping malformed row");
            }
            records.extend(rows.records);
        }
        Ok(records)
    }
}

impl NarrativeProvider for ApiClient {
    fn fetch_narrative(&self, query: &SeriesQuery) -> Result<NarrativeResponse, EngineError> {
        self.get_json(&summary_path(query.dataset), &narrative_params(query), FetchTarget::Narrative)
    }
}

fn series_params(query: &SeriesQuery, entity: &str) -> Vec<(&'static str, String)> {
    let (country, city) = split_entity(entity);
    let mut params = vec![
        ("dataset", query.dataset.api_name().to_string()),
        ("country", country.to_string()),
    ];
    if let Some(city) = city {
        params.push(("city", city.to_string()));
    }
    params.push(("start_year", query.start_year.to_string()));
    params.push(("end_year", query.end_year.to_string()));
    params
}

/// Countries are joined with the entity delimiter; a city is only sent for a
/// single `"Country / City"` entity.
fn narrative_params(query: &SeriesQuery) -> Vec<(&'static str, String)> {
    let mut countries: Vec<&str> = Vec::new();
    for entity in &query.entities {
        let (country, _) = split_entity(entity);
        if !countries.contains(&country) {
            countries.push(country);
        }
    }

    let mut params = vec![("country", countries.join(ENTITY_DELIMITER))];
    if let [only] = query.entities.as_slice() {
        if let (_, Some(city)) = split_entity(only) {
            params.push(("city", city.to_string()));
        }
    }
    params.push(("start_year", query.start_year.to_string()));
    params.push(("end_year", query.end_year.to_string()));
    params
}

fn summary_path(dataset: Dataset) -> String {
    format!("{}-summary", dataset.api_name())
}

fn options_path(dataset: Dataset) -> String {
    format!("{}-filters", dataset.api_name())
}

/// One observation row as served by the API.
///
/// Rows name the value after the metric (`temperature`, `co2_emissions`).
/// Fields are kept loose so one bad row can be dropped without losing the rest.
#[derive(Debug, Deserialize)]
struct WireRecord {
    #[serde(default)]
    year: Value,
    #[serde(default, alias = "temperature", alias = "co2_emissions")]
    value: Value,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FilterResponse {
    Records(Vec<Value>),
    Error { error: String },
}

#[derive(Debug, Deserialize)]
struct CountriesResponse {
    countries: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CitiesResponse {
    cities: Vec<String>,
}

/// Decoded `/filter` rows for one entity.
#[derive(Debug, Default, PartialEq)]
struct SeriesRows {
    records: Vec<RawRecord>,
    /// One `Computation` error per dropped row.
    malformed: Vec<EngineError>,
}

/// Decode a `/filter` body for `entity`.
///
/// A body that is not a row list (or an `{error}` object) is a fetch error.
/// Rows whose year or value cannot be read are dropped individually.
fn parse_series_body(body: &str, entity: &str) -> Result<SeriesRows, EngineError> {
    let parsed: FilterResponse = serde_json::from_str(body)
        .map_err(|e| EngineError::fetch(FetchTarget::Series, format!("failed to parse response: {e}")))?;

    let rows = match parsed {
        FilterResponse::Records(rows) => rows,
        FilterResponse::Error { error } => return Err(EngineError::fetch(FetchTarget::Series, error)),
    };

    let mut out = SeriesRows::default();
    for (idx, row) in rows.into_iter().enumerate() {
        match decode_row(row, entity) {
            Ok(record) => out.records.push(record),
            Err(message) => out
                .malformed
                .push(EngineError::computation(entity, format!("row {idx}: {message}"))),
        }
    }
    Ok(out)
}

fn decode_row(row: Value, entity: &str) -> Result<RawRecord, String> {
    let wire: WireRecord = serde_json::from_value(row).map_err(|e| format!("unreadable row: {e}"))?;
    Ok(RawRecord {
        entity: entity.to_string(),
        year: wire_year(&wire.year)?,
        value: wire_value(&wire.value)?,
    })
}

fn wire_year(raw: &Value) -> Result<i32, String> {
    let year = match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    year.and_then(|y| i32::try_from(y).ok())
        .ok_or_else(|| format!("invalid year {raw}"))
}

/// `null` or a missing field is an absent value; anything else must be a finite number.
fn wire_value(raw: &Value) -> Result<Option<f64>, String> {
    match raw {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| format!("invalid value {raw}")),
        _ => Err(format!("invalid value {raw}")),
    }
}
