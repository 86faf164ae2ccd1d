use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use reqwest::Client;

use crate::constants::{REQUEST_TIMEOUT_SECS, USER_AGENT, YANDEX_API_KEY_HEADER};
use crate::error::WeatherError;
use crate::models::{WeatherReading, YandexFact, YandexResponse};

/// Fetches the current weather at a pair of coordinates.
#[async_trait]
pub trait WeatherFetcher: Send + Sync {
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<WeatherReading, WeatherError>;
}

/// Yandex Weather client. One request per call, no retries, no caching.
#[derive(Clone)]
pub struct YandexWeather {
    client: Arc<Client>,
    url: String,
    api_key: String,
}

impl YandexWeather {
    /// Creates a client for the endpoint at `url`
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            url: url.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl WeatherFetcher for YandexWeather {
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<WeatherReading, WeatherError> {
        tracing::info!("Fetching weather for coordinates: {}, {}", latitude, longitude);

        let response = self
            .client
            .get(&self.url)
            .query(&[("lat", latitude), ("lon", longitude)])
            .header(YANDEX_API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WeatherError::WeatherFetch(format!(
                "request failed with status: {}",
                response.status()
            )));
        }

        let data = response.json::<YandexResponse>().await?;
        reading_from_fact(data.fact)
    }
}

/// Normalizes the provider's `fact` object.
pub fn reading_from_fact(fact: YandexFact) -> Result<WeatherReading, WeatherError> {
    Ok(WeatherReading {
        temperature: fact.temp.round() as i64,
        pressure: fact.pressure_mm.round() as i64,
        wind_speed: fact.wind_speed.round() as i64,
        observed_at: local_time(fact.obs_time)?,
    })
}

fn local_time(epoch_secs: i64) -> Result<DateTime<Local>, WeatherError> {
    Local
        .timestamp_opt(epoch_secs, 0)
        .single()
        .ok_or_else(|| WeatherError::WeatherFetch(format!("invalid obs_time: {epoch_secs}")))
}
