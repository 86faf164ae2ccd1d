use thiserror::Error;

/// Every way a weather lookup can fail.
///
/// All variants are terminal for the current request. The HTTP layer shows
/// the `Display` text to the caller; the bot collapses them into one reply.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("city parameter is missing from the request")]
    MissingParameter,

    #[error("coordinates file not found: {0}")]
    CoordinatesSourceUnavailable(String),

    #[error("failed to parse coordinates file: {0}")]
    CoordinatesParse(String),

    #[error("city not found in coordinates file: {0}")]
    CityNotFound(String),

    #[error("failed to fetch weather data from provider: {0}")]
    WeatherFetch(String),
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        Self::WeatherFetch(err.to_string())
    }
}
