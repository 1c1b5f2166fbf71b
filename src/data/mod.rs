//! Data module - CSV loading, country summary and the aggregation pipeline

mod loader;
mod pipeline;
mod summary;

pub use loader::{
    read_observations, DataLoader, LoaderError, AGGREGATE_MARKER, DEFAULT_DATA_PATH,
    REQUIRED_COLUMNS,
};
pub use pipeline::{
    date_from_days, days_since_epoch, location_series, population_vs_cases, rank_ascending,
    rank_descending, sum_by_date, sum_by_month, CountrySeries, DashboardData, PipelineError,
    RankEntry, SeriesPoints, RANKING_SIZE,
};
pub use summary::{cases_per_million, death_rate, CountrySummary, SummaryRow};
