use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

// ============================================================================
// Domain Models
// ============================================================================

/// Normalized current conditions for one location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReading {
    /// Air temperature, °C
    pub temperature: i64,
    /// Atmospheric pressure, mmHg
    pub pressure: i64,
    /// Wind speed, m/s
    pub wind_speed: i64,
    pub observed_at: DateTime<Local>,
}

/// A row of the coordinates reference dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateEntry {
    pub city_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

// ============================================================================
// Yandex Weather API Models
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct YandexResponse {
    pub fact: YandexFact,
}

/// Current conditions. Numbers are read as floats since the provider sends
/// fractional wind speeds.
#[derive(Debug, Deserialize)]
pub struct YandexFact {
    pub temp: f64,
    pub pressure_mm: f64,
    pub wind_speed: f64,
    pub obs_time: i64,
}

// ============================================================================
// HTTP Models
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub city: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

// ============================================================================
// Telegram Bot API Models
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TelegramResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    pub reply_to_message_id: i64,
}
