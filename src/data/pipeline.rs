//! Aggregation Pipeline Module
//! The fixed set of chart aggregations, each a pure function of the
//! Observation table (or the shared Country summary), bundled into one
//! `DashboardData` per render pass.

use crate::data::summary::{CountrySummary, SummaryRow};
use chrono::{Duration, NaiveDate};
use polars::prelude::*;
use thiserror::Error;

/// Entries kept by the ranking blocks.
pub const RANKING_SIZE: usize = 10;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Aggregation failed: {0}")]
    Polars(#[from] PolarsError),
}

/// Chart-ready (x, y) points; for time series x is days since the Unix
/// epoch.
pub type SeriesPoints = Vec<[f64; 2]>;

/// One entry of a ranking block.
#[derive(Debug, Clone, PartialEq)]
pub struct RankEntry {
    pub location: String,
    pub value: f64,
}

/// The raw total_cases series of one selected location.
#[derive(Debug, Clone, PartialEq)]
pub struct CountrySeries {
    pub location: String,
    pub points: SeriesPoints,
}

/// Everything the dashboard page renders, computed in one pass.
#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    pub global_cases: SeriesPoints,
    pub daily_new_cases: SeriesPoints,
    pub vaccination_trend: SeriesPoints,
    pub monthly_new_cases: SeriesPoints,
    pub top_cases: Vec<RankEntry>,
    pub top_deaths: Vec<RankEntry>,
    pub top_cases_per_million: Vec<RankEntry>,
    pub lowest_death_rate: Vec<RankEntry>,
    pub population_vs_cases: SeriesPoints,
    pub comparison: Vec<CountrySeries>,
}

impl DashboardData {
    /// Run every aggregation block against the Observation table. The
    /// date-keyed sums and the summary-based blocks are independent, so the
    /// two families run in parallel. The Country summary is built once and
    /// shared by the scatter and ranking blocks.
    pub fn compute(df: &DataFrame, selected: &[String]) -> Result<Self, PipelineError> {
        let (dated, summarized) = rayon::join(
            || -> Result<_, PipelineError> {
                Ok((
                    sum_by_date(df, "total_cases")?,
                    sum_by_date(df, "new_cases")?,
                    sum_by_date(df, "people_vaccinated")?,
                    sum_by_month(df, "new_cases")?,
                ))
            },
            || -> Result<_, PipelineError> {
                let summary = CountrySummary::from_observations(df)?;
                let comparison = selected
                    .iter()
                    .map(|location| {
                        Ok(CountrySeries {
                            location: location.clone(),
                            points: location_series(df, location, "total_cases")?,
                        })
                    })
                    .collect::<Result<Vec<_>, PipelineError>>()?;
                Ok((summary, comparison))
            },
        );

        let (global_cases, daily_new_cases, vaccination_trend, monthly_new_cases) = dated?;
        let (summary, comparison) = summarized?;

        Ok(Self {
            global_cases,
            daily_new_cases,
            vaccination_trend,
            monthly_new_cases,
            top_cases: rank_descending(&summary.rows, |r| r.total_cases, RANKING_SIZE),
            top_deaths: rank_descending(&summary.rows, |r| r.total_deaths, RANKING_SIZE),
            top_cases_per_million: rank_descending(
                &summary.rows,
                |r| r.cases_per_million,
                RANKING_SIZE,
            ),
            lowest_death_rate: rank_ascending(&summary.rows, |r| r.death_rate, RANKING_SIZE),
            population_vs_cases: population_vs_cases(&summary),
            comparison,
        })
    }
}

/// Days from the Unix epoch to `date`.
pub fn days_since_epoch(date: NaiveDate) -> f64 {
    (date - NaiveDate::default()).num_days() as f64
}

/// Inverse of [`days_since_epoch`].
pub fn date_from_days(days: f64) -> NaiveDate {
    NaiveDate::default() + Duration::days(days.round() as i64)
}

/// Group by date and sum `value_col` across all locations, chronologically.
/// Null values contribute nothing to a sum, so a missing field counts as 0.
pub fn sum_by_date(df: &DataFrame, value_col: &str) -> Result<SeriesPoints, PipelineError> {
    let out = df
        .clone()
        .lazy()
        .group_by([col("date")])
        .agg([col(value_col).sum().alias("total")])
        .sort(["date"], Default::default())
        .collect()?;

    let days = out.column("date")?.cast(&DataType::Int32)?;
    let days = days.i32()?;
    let totals = out.column("total")?.f64()?;

    Ok(days
        .into_iter()
        .zip(totals.into_iter())
        .filter_map(|(day, total)| Some([f64::from(day?), total?]))
        .collect())
}

/// Group by calendar month and sum `value_col`, chronologically. Each
/// point sits on the first day of its month.
pub fn sum_by_month(df: &DataFrame, value_col: &str) -> Result<SeriesPoints, PipelineError> {
    let out = df
        .clone()
        .lazy()
        .group_by([
            col("date").dt().year().cast(DataType::Int32).alias("year"),
            col("date").dt().month().cast(DataType::Int32).alias("month"),
        ])
        .agg([col(value_col).sum().alias("total")])
        .sort(["year", "month"], Default::default())
        .collect()?;

    let years = out.column("year")?.i32()?;
    let months = out.column("month")?.i32()?;
    let totals = out.column("total")?.f64()?;

    Ok(years
        .into_iter()
        .zip(months.into_iter())
        .zip(totals.into_iter())
        .filter_map(|((year, month), total)| {
            let first = NaiveDate::from_ymd_opt(year?, month? as u32, 1)?;
            Some([days_since_epoch(first), total?])
        })
        .collect())
}

/// The raw `value_col` series of one location, chronologically. Unknown
/// locations yield an empty series, never an error.
pub fn location_series(
    df: &DataFrame,
    location: &str,
    value_col: &str,
) -> Result<SeriesPoints, PipelineError> {
    let out = df
        .clone()
        .lazy()
        .filter(col("location").eq(lit(location)))
        .select([col("date"), col(value_col)])
        .sort(["date"], Default::default())
        .collect()?;

    let days = out.column("date")?.cast(&DataType::Int32)?;
    let days = days.i32()?;
    let values = out.column(value_col)?.f64()?;

    Ok(days
        .into_iter()
        .zip(values.into_iter())
        .filter_map(|(day, value)| Some([f64::from(day?), value?]))
        .collect())
}

/// (population, total_cases) pairs for every location with both fields.
pub fn population_vs_cases(summary: &CountrySummary) -> SeriesPoints {
    summary
        .rows
        .iter()
        .filter_map(|row| match (row.population, row.total_cases) {
            (Some(population), Some(cases)) => Some([population, cases]),
            _ => None,
        })
        .collect()
}

/// Top `limit` locations by `key`, descending. Rows where `key` is absent
/// are excluded; ties break deterministically by location name.
pub fn rank_descending(
    rows: &[SummaryRow],
    key: impl Fn(&SummaryRow) -> Option<f64>,
    limit: usize,
) -> Vec<RankEntry> {
    let mut entries = collect_entries(rows, key);
    entries.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.location.cmp(&b.location))
    });
    entries.truncate(limit);
    entries
}

/// Bottom `limit` locations by `key`, ascending. Same exclusion and
/// tie-break rules as [`rank_descending`].
pub fn rank_ascending(
    rows: &[SummaryRow],
    key: impl Fn(&SummaryRow) -> Option<f64>,
    limit: usize,
) -> Vec<RankEntry> {
    let mut entries = collect_entries(rows, key);
    entries.sort_by(|a, b| {
        a.value
            .partial_cmp(&b.value)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.location.cmp(&b.location))
    });
    entries.truncate(limit);
    entries
}

fn collect_entries(
    rows: &[SummaryRow],
    key: impl Fn(&SummaryRow) -> Option<f64>,
) -> Vec<RankEntry> {
    rows.iter()
        .filter_map(|row| {
            key(row).map(|value| RankEntry {
                location: row.location.clone(),
                value,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two locations, three dates, hand-computable totals.
    fn obs_fixture() -> DataFrame {
        let df = df! {
            "location" => [
                "Aruba", "Aruba", "Aruba",
                "Benin", "Benin", "Benin",
            ],
            "date" => [
                "2021-01-30", "2021-01-31", "2021-02-01",
                "2021-01-30", "2021-01-31", "2021-02-01",
            ],
            "total_cases" => [Some(100.0), Some(120.0), Some(130.0), Some(3000.0), None, Some(3200.0)],
            "new_cases" => [Some(10.0), Some(20.0), Some(10.0), Some(5.0), Some(100.0), Some(100.0)],
            "total_deaths" => [Some(1.0), Some(1.0), Some(2.0), Some(40.0), Some(41.0), Some(41.0)],
            "population" => [Some(107_000.0), Some(107_000.0), Some(107_000.0), Some(12_000_000.0), Some(12_000_000.0), Some(12_000_000.0)],
            "people_vaccinated" => [None, Some(500.0), Some(600.0), None, None, Some(1000.0)],
        }
        .unwrap();

        df.lazy()
            .with_column(col("date").str().to_date(StrptimeOptions {
                format: Some("%Y-%m-%d".into()),
                strict: false,
                ..Default::default()
            }))
            .collect()
            .unwrap()
    }

    fn day(date: &str) -> f64 {
        days_since_epoch(date.parse().unwrap())
    }

    #[test]
    fn global_cases_match_hand_computed_sums() {
        let df = obs_fixture();
        let series = sum_by_date(&df, "total_cases").unwrap();
        assert_eq!(
            series,
            vec![
                [day("2021-01-30"), 3100.0],
                [day("2021-01-31"), 120.0], // Benin's cases missing that day
                [day("2021-02-01"), 3330.0],
            ]
        );
    }

    #[test]
    fn sums_are_row_order_invariant() {
        let df = obs_fixture();
        let reversed = df.reverse();
        for column in ["total_cases", "new_cases", "people_vaccinated"] {
            assert_eq!(
                sum_by_date(&df, column).unwrap(),
                sum_by_date(&reversed, column).unwrap(),
            );
        }
        assert_eq!(
            sum_by_month(&df, "new_cases").unwrap(),
            sum_by_month(&reversed, "new_cases").unwrap(),
        );
    }

    #[test]
    fn vaccination_sum_treats_missing_as_zero() {
        let df = obs_fixture();
        let series = sum_by_date(&df, "people_vaccinated").unwrap();
        assert_eq!(
            series,
            vec![
                [day("2021-01-30"), 0.0],
                [day("2021-01-31"), 500.0],
                [day("2021-02-01"), 1600.0],
            ]
        );
    }

    #[test]
    fn monthly_sums_bucket_by_calendar_month() {
        let df = obs_fixture();
        let series = sum_by_month(&df, "new_cases").unwrap();
        assert_eq!(
            series,
            vec![[day("2021-01-01"), 135.0], [day("2021-02-01"), 110.0]]
        );
    }

    #[test]
    fn location_series_is_chronological() {
        let df = obs_fixture();
        let points = location_series(&df, "Aruba", "total_cases").unwrap();
        assert_eq!(
            points,
            vec![
                [day("2021-01-30"), 100.0],
                [day("2021-01-31"), 120.0],
                [day("2021-02-01"), 130.0],
            ]
        );
    }

    #[test]
    fn unknown_location_yields_empty_series() {
        let df = obs_fixture();
        let points = location_series(&df, "Atlantis", "total_cases").unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn empty_selection_yields_no_comparison_series() {
        let df = obs_fixture();
        let data = DashboardData::compute(&df, &[]).unwrap();
        assert!(data.comparison.is_empty());
    }

    #[test]
    fn compute_fills_every_block() {
        let df = obs_fixture();
        let selected = vec!["Aruba".to_string(), "Atlantis".to_string()];
        let data = DashboardData::compute(&df, &selected).unwrap();

        assert_eq!(data.global_cases.len(), 3);
        assert_eq!(data.daily_new_cases.len(), 3);
        assert_eq!(data.monthly_new_cases.len(), 2);
        assert_eq!(data.top_cases.len(), 2);
        assert_eq!(data.population_vs_cases.len(), 2);
        assert_eq!(data.comparison.len(), 2);
        assert_eq!(data.comparison[0].points.len(), 3);
        assert!(data.comparison[1].points.is_empty());
    }

    fn ranking_rows() -> Vec<SummaryRow> {
        vec![
            SummaryRow::new("Aruba".into(), Some(120.0), Some(2.0), Some(107_000.0)),
            SummaryRow::new("Benin".into(), Some(3200.0), Some(41.0), Some(12_000_000.0)),
            SummaryRow::new("Chad".into(), Some(120.0), Some(1.0), None),
            SummaryRow::new("Denmark".into(), None, None, Some(5_800_000.0)),
        ]
    }

    #[test]
    fn ranking_is_sorted_and_capped() {
        let rows = ranking_rows();
        let top = rank_descending(&rows, |r| r.total_cases, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].location, "Benin");
        assert_eq!(top[1].location, "Aruba");

        // fewer eligible rows than the cap: all of them, no duplicates
        let all = rank_descending(&rows, |r| r.total_cases, RANKING_SIZE);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn ranking_ties_break_by_location_name() {
        let rows = ranking_rows();
        let top = rank_descending(&rows, |r| r.total_cases, 3);
        // Aruba and Chad tie at 120; Aruba wins alphabetically
        assert_eq!(top[1].location, "Aruba");
        assert_eq!(top[2].location, "Chad");
    }

    #[test]
    fn rows_without_a_value_are_excluded_from_rankings() {
        let rows = ranking_rows();
        let lowest = rank_ascending(&rows, |r| r.death_rate, RANKING_SIZE);
        // Denmark has no cases at all -> no death rate
        assert!(lowest.iter().all(|e| e.location != "Denmark"));
        assert_eq!(lowest.len(), 3);
        assert_eq!(lowest[0].location, "Chad"); // 1/120 is the smallest rate
    }

    #[test]
    fn lowest_death_rate_orders_ascending() {
        let rows = ranking_rows();
        let lowest = rank_ascending(&rows, |r| r.death_rate, RANKING_SIZE);
        let rates: Vec<f64> = lowest.iter().map(|e| e.value).collect();
        let mut sorted = rates.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(rates, sorted);
    }

    #[test]
    fn date_helpers_round_trip() {
        assert_eq!(days_since_epoch(NaiveDate::default()), 0.0);
        let date = NaiveDate::from_ymd_opt(2021, 3, 15).unwrap();
        assert_eq!(date_from_days(days_since_epoch(date)), date);
    }
}
