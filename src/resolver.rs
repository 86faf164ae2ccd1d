use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use calamine::{
    open_workbook, Data, Range, Reader, Sheet, SheetType, SheetVisible, Xlsx, XlsxError,
};

use crate::error::WeatherError;
use crate::models::CoordinateEntry;

const CITY_COLUMN: u32 = 0;
const LATITUDE_COLUMN: u32 = 3;
const LONGITUDE_COLUMN: u32 = 4;

/// Maps a city name to its coordinates.
#[async_trait]
pub trait CoordinateResolver: Send + Sync {
    /// Returns the first dataset entry whose name contains `city_name`
    async fn resolve(&self, city_name: &str) -> Result<CoordinateEntry, WeatherError>;
}

/// Resolver backed by an `.xlsx` workbook on disk. The file is reopened on
/// every lookup, so edits are picked up without a restart.
#[derive(Debug, Clone)]
pub struct SpreadsheetResolver {
    path: PathBuf,
}

impl SpreadsheetResolver {
    /// Creates a resolver for the workbook at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CoordinateResolver for SpreadsheetResolver {
    async fn resolve(&self, city_name: &str) -> Result<CoordinateEntry, WeatherError> {
        let path = self.path.clone();
        let city_name = city_name.to_string();

        let entry = tokio::task::spawn_blocking(move || resolve_from_file(&path, &city_name))
            .await
            .map_err(|e| WeatherError::CoordinatesParse(e.to_string()))??;

        tracing::debug!(
            "Resolved {} to {}, {}",
            entry.city_name,
            entry.latitude,
            entry.longitude
        );
        Ok(entry)
    }
}

/// Blocking lookup of `city_name` in the workbook at `path`.
///
/// Rows read `(city_name, _, _, latitude, longitude, ...)`. calamine does not
/// expose which tab was active when the workbook was saved, so the first
/// visible worksheet is read instead. For a single-sheet dataset the two are
/// the same.
pub fn resolve_from_file(
    path: &Path,
    city_name: &str,
) -> Result<CoordinateEntry, WeatherError> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| match e {
        XlsxError::Io(io_err) if io_err.kind() == io::ErrorKind::NotFound => {
            WeatherError::CoordinatesSourceUnavailable(path.display().to_string())
        }
        other => WeatherError::CoordinatesParse(other.to_string()),
    })?;

    let sheet_name = first_visible_worksheet(workbook.sheets_metadata())
        .ok_or_else(|| {
            WeatherError::CoordinatesParse("workbook has no visible worksheets".to_string())
        })?
        .to_string();
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| WeatherError::CoordinatesParse(e.to_string()))?;

    find_coordinates(&range, city_name)
}

/// Name of the first visible worksheet, skipping hidden sheets and chartsheets
pub fn first_visible_worksheet(sheets: &[Sheet]) -> Option<&str> {
    sheets
        .iter()
        .find(|s| s.typ == SheetType::WorkSheet && s.visible == SheetVisible::Visible)
        .map(|s| s.name.as_str())
}

/// Scans `range` row by row for the first city containing `city_name`,
/// ignoring case.
///
/// Cells are addressed by absolute position, so column 0 is always column A
/// even when the sheet's data starts further right.
pub fn find_coordinates(
    range: &Range<Data>,
    city_name: &str,
) -> Result<CoordinateEntry, WeatherError> {
    let not_found = || WeatherError::CityNotFound(city_name.to_string());
    let (Some((first_row, _)), Some((last_row, _))) = (range.start(), range.end()) else {
        return Err(not_found());
    };

    let needle = city_name.to_lowercase();
    let cell = |row: u32, col: u32| range.get_value((row, col)).unwrap_or(&Data::Empty);

    for row in first_row..=last_row {
        let Data::String(name) = cell(row, CITY_COLUMN) else {
            continue;
        };
        if !name.to_lowercase().contains(&needle) {
            continue;
        }

        let latitude = coordinate(cell(row, LATITUDE_COLUMN));
        let longitude = coordinate(cell(row, LONGITUDE_COLUMN));
        return match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Ok(CoordinateEntry {
                city_name: name.clone(),
                latitude,
                longitude,
            }),
            _ => Err(WeatherError::CoordinatesParse(format!(
                "row {} ({}) has no numeric latitude/longitude",
                row + 1,
                name
            ))),
        };
    }

    Err(not_found())
}

fn coordinate(value: &Data) -> Option<f64> {
    match value {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        // Russian locale spreadsheets may store "55,75" as text
        Data::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}
