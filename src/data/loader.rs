//! CSV Data Loader Module
//! Reads the raw observations file and produces the cleaned Observation table.

use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

/// Default location of the source file, relative to the working directory.
pub const DEFAULT_DATA_PATH: &str = "owid-covid-data.csv";

/// Columns the Observation table is narrowed to. Anything else in the
/// source file is discarded at scan time.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "location",
    "date",
    "total_cases",
    "new_cases",
    "total_deaths",
    "population",
    "people_vaccinated",
];

/// Marker for the worldwide aggregate pseudo-row. Kept out of the table so
/// global sums do not double-count every country.
pub const AGGREGATE_MARKER: &str = "World";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
}

/// Read and clean the Observation table from a CSV file.
///
/// Narrows to [`REQUIRED_COLUMNS`], parses `date` to the Date dtype, drops
/// rows without a location or a parseable date and removes the
/// [`AGGREGATE_MARKER`] row.
pub fn read_observations(path: &Path) -> Result<DataFrame, LoaderError> {
    let path_str = path.to_string_lossy().to_string();

    let mut lf = LazyCsvReader::new(&path_str)
        .with_infer_schema_length(Some(10_000))
        .with_ignore_errors(true)
        .finish()?;

    let schema = lf.collect_schema()?;
    for name in REQUIRED_COLUMNS {
        if schema.get(name).is_none() {
            return Err(LoaderError::MissingColumn(name.to_string()));
        }
    }

    let df = lf
        .select([
            col("location"),
            col("date")
                .cast(DataType::String)
                .str()
                .to_date(StrptimeOptions {
                    format: Some("%Y-%m-%d".into()),
                    strict: false,
                    ..Default::default()
                }),
            col("total_cases").cast(DataType::Float64),
            col("new_cases").cast(DataType::Float64),
            col("total_deaths").cast(DataType::Float64),
            col("population").cast(DataType::Float64),
            col("people_vaccinated").cast(DataType::Float64),
        ])
        .filter(col("location").is_not_null().and(col("date").is_not_null()))
        .filter(
            col("location")
                .neq(lit(""))
                .and(col("location").neq(lit(AGGREGATE_MARKER))),
        )
        .collect()?;

    Ok(df)
}

/// Cache key for a loaded table: the file it came from and its
/// modification time at read.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheKey {
    path: PathBuf,
    modified: Option<SystemTime>,
}

/// Holds the Observation table for the session with an explicit cache
/// keyed on (path, mtime). The table is re-read only when the key no
/// longer matches or after [`DataLoader::invalidate`].
pub struct DataLoader {
    df: Option<DataFrame>,
    key: Option<CacheKey>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self { df: None, key: None }
    }

    /// True when the cached table was read from `path` and the file has
    /// not been modified since.
    pub fn is_fresh(&self, path: &Path) -> bool {
        let Some(key) = &self.key else {
            return false;
        };
        let modified = fs::metadata(path).and_then(|m| m.modified()).ok();
        self.df.is_some() && key.path == path && key.modified == modified
    }

    /// Drop the cached table. The next load re-reads the file.
    pub fn invalidate(&mut self) {
        self.df = None;
        self.key = None;
    }

    /// Store the result of a (background) load together with its cache key.
    pub fn set_observations(
        &mut self,
        path: PathBuf,
        modified: Option<SystemTime>,
        df: DataFrame,
    ) {
        self.key = Some(CacheKey { path, modified });
        self.df = Some(df);
    }

    /// Get a reference to the cached Observation table.
    pub fn observations(&self) -> Option<&DataFrame> {
        self.df.as_ref()
    }

    /// Get the number of observation rows.
    pub fn row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

    /// Get the sorted list of distinct locations in the table.
    pub fn locations(&self) -> Vec<String> {
        let Some(df) = &self.df else {
            return Vec::new();
        };

        let mut locations: Vec<String> = df
            .column("location")
            .ok()
            .and_then(|col| col.unique().ok())
            .map(|unique| {
                unique
                    .as_materialized_series()
                    .str()
                    .map(|ca| ca.into_iter().flatten().map(str::to_string).collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default();
        locations.sort();
        locations
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
location,date,total_cases,new_cases,total_deaths,population,people_vaccinated
Aruba,2021-01-01,100,10,1,107000,
Aruba,2021-01-02,120,20,1,107000,500
World,2021-01-01,50000000,100000,900000,7800000000,1000000
Benin,2021-01-01,3000,5,40,12000000,
Benin,not-a-date,3100,100,41,12000000,
,2021-01-02,1,1,0,1,
";

    fn write_sample(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_drops_world_and_unparseable_rows() {
        let file = write_sample(SAMPLE);
        let df = read_observations(file.path()).unwrap();

        // World row, bad-date row and empty-location row are gone
        assert_eq!(df.height(), 3);
        assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);

        let locations = df
            .column("location")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .clone();
        for loc in locations.into_iter().flatten() {
            assert!(!loc.is_empty());
            assert_ne!(loc, AGGREGATE_MARKER);
        }
    }

    #[test]
    fn load_keeps_only_required_columns() {
        let with_extra = "\
iso_code,location,date,total_cases,new_cases,total_deaths,population,people_vaccinated
ABW,Aruba,2021-01-01,100,10,1,107000,
BEN,Benin,2021-01-01,3000,5,40,12000000,
";
        let file = write_sample(with_extra);
        let df = read_observations(file.path()).unwrap();
        assert_eq!(df.get_column_names().len(), REQUIRED_COLUMNS.len());
        assert!(df.column("iso_code").is_err());
    }

    #[test]
    fn missing_column_is_an_explicit_error() {
        let truncated = "\
location,date,total_cases
Aruba,2021-01-01,100
";
        let file = write_sample(truncated);
        match read_observations(file.path()) {
            Err(LoaderError::MissingColumn(name)) => assert_eq!(name, "new_cases"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_observations(Path::new("no-such-file.csv")).is_err());
    }

    #[test]
    fn reload_of_unchanged_file_is_identical() {
        let file = write_sample(SAMPLE);
        let first = read_observations(file.path()).unwrap();
        let second = read_observations(file.path()).unwrap();
        assert!(first.equals_missing(&second));
    }

    #[test]
    fn cache_is_fresh_until_invalidated() {
        let file = write_sample(SAMPLE);
        let path = file.path().to_path_buf();
        let modified = fs::metadata(&path).and_then(|m| m.modified()).ok();
        let df = read_observations(&path).unwrap();

        let mut loader = DataLoader::new();
        assert!(!loader.is_fresh(&path));

        loader.set_observations(path.clone(), modified, df);
        assert!(loader.is_fresh(&path));
        assert_eq!(loader.row_count(), 3);
        assert_eq!(loader.locations(), vec!["Aruba", "Benin"]);

        loader.invalidate();
        assert!(!loader.is_fresh(&path));
        assert!(loader.observations().is_none());
    }
}
