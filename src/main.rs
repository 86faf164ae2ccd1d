use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use city_weather::bot::TelegramBot;
use city_weather::config::Config;
use city_weather::constants::TELEGRAM_API_BASE;
use city_weather::fetcher::YandexWeather;
use city_weather::resolver::SpreadsheetResolver;
use city_weather::{http, WeatherCache, WeatherGateway};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "city_weather=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }
    let config = Config::from_env()?;

    tracing::info!(
        "Starting weather service (coordinates: {}, cache TTL: {}s)",
        config.coordinates_path.display(),
        config.cache_ttl.as_secs()
    );

    let gateway = Arc::new(WeatherGateway::new(
        Arc::new(SpreadsheetResolver::new(config.coordinates_path.clone())),
        Arc::new(YandexWeather::new(&config.weather_url, &config.weather_api_key)?),
        WeatherCache::new(),
        config.cache_ttl,
    ));

    match &config.bot_token {
        Some(token) => {
            let bot = TelegramBot::new(TELEGRAM_API_BASE, token, gateway.clone())?;
            tokio::spawn(bot.run());
        }
        None => tracing::warn!("BOT_TOKEN not set, Telegram bot disabled"),
    }

    http::serve(config.http_bind_addr, gateway).await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}
