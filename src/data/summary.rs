//! Country Summary Module
//! Per-location maxima of the cumulative fields, used as a proxy for the
//! latest totals, plus the derived ratio metrics.

use polars::prelude::*;

/// One summary row per location. All fields come from the maximum observed
/// value across that location's dates; cumulative series are assumed
/// non-decreasing. The ratios are tagged-absent instead of NaN: `None`
/// whenever the denominator is missing or zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub location: String,
    pub total_cases: Option<f64>,
    pub total_deaths: Option<f64>,
    pub population: Option<f64>,
    pub cases_per_million: Option<f64>,
    pub death_rate: Option<f64>,
}

impl SummaryRow {
    pub fn new(
        location: String,
        total_cases: Option<f64>,
        total_deaths: Option<f64>,
        population: Option<f64>,
    ) -> Self {
        Self {
            location,
            total_cases,
            total_deaths,
            population,
            cases_per_million: cases_per_million(total_cases, population),
            death_rate: death_rate(total_deaths, total_cases),
        }
    }
}

/// total_cases / population x 1,000,000. `None` when population is missing
/// or zero.
pub fn cases_per_million(total_cases: Option<f64>, population: Option<f64>) -> Option<f64> {
    match (total_cases, population) {
        (Some(cases), Some(population)) if population > 0.0 => {
            Some(cases / population * 1_000_000.0)
        }
        _ => None,
    }
}

/// total_deaths / total_cases. `None` when total_cases is missing or zero.
pub fn death_rate(total_deaths: Option<f64>, total_cases: Option<f64>) -> Option<f64> {
    match (total_deaths, total_cases) {
        (Some(deaths), Some(cases)) if cases > 0.0 => Some(deaths / cases),
        _ => None,
    }
}

/// The Country summary table, derived from the Observation table once per
/// pipeline run and shared by every consuming block.
#[derive(Debug, Clone, Default)]
pub struct CountrySummary {
    pub rows: Vec<SummaryRow>,
}

impl CountrySummary {
    /// Group the Observation table by location and take the max of each
    /// numeric field.
    pub fn from_observations(df: &DataFrame) -> PolarsResult<Self> {
        let out = df
            .clone()
            .lazy()
            .group_by([col("location")])
            .agg([
                col("total_cases").max(),
                col("total_deaths").max(),
                col("population").max(),
            ])
            .collect()?;

        let locations = out.column("location")?.as_materialized_series().str()?.clone();
        let total_cases = out.column("total_cases")?.f64()?.clone();
        let total_deaths = out.column("total_deaths")?.f64()?.clone();
        let population = out.column("population")?.f64()?.clone();

        let rows = locations
            .into_iter()
            .zip(total_cases.into_iter())
            .zip(total_deaths.into_iter())
            .zip(population.into_iter())
            .filter_map(|(((location, cases), deaths), population)| {
                location.map(|location| {
                    SummaryRow::new(location.to_string(), cases, deaths, population)
                })
            })
            .collect();

        Ok(Self { rows })
    }
}
