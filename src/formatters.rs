use crate::models::WeatherReading;

/// Reply when `/weather` arrives without a city
pub const MISSING_CITY_REPLY: &str = "Enter a city name after the /weather command";

/// Reply for any failed lookup; the error kind is only logged
pub const FAILURE_REPLY: &str = "Sorry, failed to get weather data.";

/// Formats a reading into the bot's plain-text reply
pub fn format_weather_reply(city: &str, reading: &WeatherReading) -> String {
    format!(
        "Weather for {}:\nTemperature: {}\u{00b0}C\nPressure: {} mmHg\nWind speed: {} m/s",
        city, reading.temperature, reading.pressure, reading.wind_speed
    )
}
