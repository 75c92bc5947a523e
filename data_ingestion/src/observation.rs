use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::{debug, warn};
use serde_json::Value;

use crate::error::IngestionError;

pub const PRICE_VARIATIONS_FIELD: &str = "priceVariations";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y, %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceObservation {
    pub price: f64,
    pub timestamp: NaiveDateTime,
}

/// Coerce the `priceVariations` field of a request body into observations
/// sorted by timestamp.
///
/// Items are read by position, not by name: the first field of each object
/// is the price and the second is the date. Two-element arrays are accepted
/// as well. Callers must therefore keep the field order `(price, date)`.
pub fn parse_price_variations(payload: &Value) -> Result<Vec<PriceObservation>, IngestionError> {
    let items = match payload.get(PRICE_VARIATIONS_FIELD) {
        None | Some(Value::Null) => return Err(IngestionError::NoPriceVariations),
        Some(Value::Array(items)) if items.is_empty() => {
            return Err(IngestionError::NoPriceVariations);
        }
        Some(Value::Array(items)) => items,
        Some(other) => return Err(IngestionError::MalformedPayload(json_type(other).to_string())),
    };

    let mut observations = items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_item(index, item))
        .collect::<Result<Vec<_>, _>>()?;

    for observation in &observations {
        validate_observation(observation);
    }

    // stable: equal timestamps keep their request order
    observations.sort_by_key(|o| o.timestamp);
    debug!("Parsed {} price observations", observations.len());

    Ok(observations)
}

pub fn validate_observation(observation: &PriceObservation) -> bool {
    if observation.price < 0.0 {
        warn!("Price cannot be negative: {} at {}", observation.price, observation.timestamp);
        return false;
    }
    true
}

fn parse_item(index: usize, item: &Value) -> Result<PriceObservation, IngestionError> {
    let fields: Vec<&Value> = match item {
        Value::Object(map) => map.values().collect(),
        Value::Array(values) => values.iter().collect(),
        _ => vec![item],
    };

    if fields.len() != 2 {
        return Err(IngestionError::FieldCount {
            index,
            found: fields.len(),
        });
    }

    Ok(PriceObservation {
        price: parse_price(index, fields[0])?,
        timestamp: parse_date(index, fields[1])?,
    })
}

fn parse_price(index: usize, value: &Value) -> Result<f64, IngestionError> {
    let price = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    price
        .filter(|p| p.is_finite())
        .ok_or_else(|| IngestionError::InvalidPrice {
            index,
            value: value.to_string(),
        })
}

fn parse_date(index: usize, value: &Value) -> Result<NaiveDateTime, IngestionError> {
    let parsed = match value {
        // epoch milliseconds, as produced by `Date.now()`
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.naive_utc()),
        Value::String(s) => parse_date_str(s.trim()),
        _ => None,
    };

    parsed.ok_or_else(|| IngestionError::InvalidDate {
        index,
        value: value.to_string(),
    })
}

fn parse_date_str(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
