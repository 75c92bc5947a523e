use anyhow::Result;
use data_ingestion::PriceObservation;
use log::debug;
use polars::prelude::*;
use polars::series::ops::NullBehavior;

use crate::label::{CHANGE_THRESHOLD, PriceChange};
use crate::table::{FeatureColumn, FeatureTable, LastRow};

const PRICE: &str = "price";
const DATE: &str = "date";
const PRICE_DIFF: &str = "price_diff";
const PRICE_CHANGE: &str = "price_change";

/// Lag and rolling features are only derived above this many observations.
const LAG_MIN_OBSERVATIONS: usize = 3;
const ROLLING_WINDOW: usize = 3;

/// Derive lag-1, lag-2, the 3-point trailing mean and the ternary label,
/// then drop every row that still holds a null.
pub fn engineer_features(observations: &[PriceObservation]) -> Result<FeatureTable> {
    let mut sorted = observations.to_vec();
    sorted.sort_by_key(|o| o.timestamp);

    let df = to_dataframe(&sorted)?;
    let with_lags = sorted.len() > LAG_MIN_OBSERVATIONS;

    let mut lf = df.lazy();
    if with_lags {
        lf = lf.with_columns([
            col(PRICE).shift(lit(1)).alias(FeatureColumn::PriceLag1.name()),
            col(PRICE).shift(lit(2)).alias(FeatureColumn::PriceLag2.name()),
            col(PRICE)
                .rolling_mean(RollingOptions {
                    window_size: Duration::parse(&format!("{}i", ROLLING_WINDOW)),
                    min_periods: ROLLING_WINDOW,
                    ..Default::default()
                })
                .alias(FeatureColumn::PriceMa3.name()),
        ]);
    }

    let df = lf
        .with_columns([col(PRICE).diff(1, NullBehavior::Ignore).alias(PRICE_DIFF)])
        .with_columns([when(col(PRICE_DIFF).gt(lit(CHANGE_THRESHOLD)))
            .then(lit(1i32))
            .when(col(PRICE_DIFF).lt(lit(-CHANGE_THRESHOLD)))
            .then(lit(-1i32))
            .otherwise(lit(0i32))
            .alias(PRICE_CHANGE)])
        // Drop null values created by shift / window / diff
        .drop_nulls(None)
        .collect()?;

    let columns: Vec<FeatureColumn> = if with_lags {
        FeatureColumn::ALL.to_vec()
    } else {
        Vec::new()
    };

    let table = extract_table(&df, columns)?;
    debug!(
        "Engineered {} rows x {} features from {} observations",
        table.len(),
        table.n_features(),
        sorted.len()
    );
    Ok(table)
}

fn to_dataframe(observations: &[PriceObservation]) -> Result<DataFrame> {
    let price: Vec<f64> = observations.iter().map(|o| o.price).collect();
    let date: Vec<i64> = observations
        .iter()
        .map(|o| o.timestamp.and_utc().timestamp_millis())
        .collect();

    let s1 = Series::new(PRICE, price);
    let s2 = Series::new(DATE, date);
    let df = DataFrame::new(vec![s1, s2])?;
    Ok(df)
}

fn extract_table(df: &DataFrame, columns: Vec<FeatureColumn>) -> Result<FeatureTable> {
    let n_rows = df.height();

    let column_values = columns
        .iter()
        .map(|c| f64_column(df, c.name()))
        .collect::<Result<Vec<_>>>()?;

    let rows: Vec<Vec<f64>> = (0..n_rows)
        .map(|i| column_values.iter().map(|values| values[i]).collect())
        .collect();

    let labels = df
        .column(PRICE_CHANGE)?
        .i32()?
        .into_no_null_iter()
        .map(|v| PriceChange::from_i8(v as i8).unwrap_or(PriceChange::Flat))
        .collect();

    let last = if n_rows == 0 {
        None
    } else {
        let price = f64_column(df, PRICE)?;
        let lag1 = lookup(df, FeatureColumn::PriceLag1.name(), n_rows - 1)?;
        let ma3 = lookup(df, FeatureColumn::PriceMa3.name(), n_rows - 1)?;
        Some(LastRow {
            price: price[n_rows - 1],
            lag1,
            ma3,
        })
    };

    Ok(FeatureTable {
        columns,
        rows,
        labels,
        last,
    })
}

fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    Ok(df.column(name)?.f64()?.into_no_null_iter().collect())
}

/// Value of an optional column at `index`; `None` when the column is absent.
fn lookup(df: &DataFrame, name: &str, index: usize) -> Result<Option<f64>> {
    match df.column(name) {
        Ok(series) => Ok(series.f64()?.get(index)),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn series(prices: &[f64]) -> Vec<PriceObservation> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PriceObservation {
                price,
                timestamp: day(i as u32 + 1),
            })
            .collect()
    }

    #[test]
    fn test_four_point_series() {
        let table = engineer_features(&series(&[100.0, 101.0, 99.0, 105.0])).unwrap();

        assert_eq!(table.columns, FeatureColumn::ALL.to_vec());
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0], vec![101.0, 100.0, 100.0]);
        assert_eq!(table.rows[1][0], 99.0);
        assert_eq!(table.rows[1][1], 101.0);
        assert!((table.rows[1][2] - 305.0 / 3.0).abs() < 1e-9);
        assert_eq!(table.labels, vec![PriceChange::Down, PriceChange::Up]);

        let last = table.last.unwrap();
        assert_eq!(last.price, 105.0);
        assert_eq!(last.lag1, Some(99.0));

        let next = table.next_step_features().unwrap();
        assert_eq!(next[0], 105.0);
        assert_eq!(next[1], 99.0);
        assert!((next[2] - 305.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_unsorted_input_is_sorted_first() {
        let mut observations = series(&[100.0, 101.0, 99.0, 105.0]);
        observations.reverse();
        let table = engineer_features(&observations).unwrap();
        assert_eq!(table.labels, vec![PriceChange::Down, PriceChange::Up]);
    }

    #[test]
    fn test_short_series_has_no_lag_columns() {
        let table = engineer_features(&series(&[1.0, 2.0, 2.0])).unwrap();
        assert!(table.columns.is_empty());
        assert_eq!(table.len(), 2);
        assert_eq!(table.labels, vec![PriceChange::Up, PriceChange::Flat]);

        let last = table.last.unwrap();
        assert_eq!(last.price, 2.0);
        assert_eq!(last.lag1, None);
        assert_eq!(table.next_step_features(), Some(Vec::new()));
    }

    #[test]
    fn test_single_point_is_empty() {
        let table = engineer_features(&series(&[42.0])).unwrap();
        assert!(table.is_empty());
        assert!(table.last.is_none());
    }

    #[test]
    fn test_flat_series_has_single_class() {
        let table = engineer_features(&series(&[10.0; 6])).unwrap();
        assert_eq!(table.len(), 4);
        assert!(table.labels.iter().all(|&l| l == PriceChange::Flat));
        assert_eq!(table.to_dataset().n_classes(), 1);
    }

    #[test]
    fn test_small_moves_are_flat() {
        let table = engineer_features(&series(&[10.0, 10.005, 10.0, 9.995, 10.5])).unwrap();
        assert_eq!(
            table.labels,
            vec![PriceChange::Flat, PriceChange::Flat, PriceChange::Up]
        );
    }
}
