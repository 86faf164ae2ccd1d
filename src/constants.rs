/// User agent string for HTTP requests
pub const USER_AGENT: &str = "city-weather/0.1.0";

/// Yandex Weather forecast endpoint, whose `fact` object holds current conditions
pub const YANDEX_WEATHER_URL: &str = "https://api.weather.yandex.ru/v2/forecast";

/// Header carrying the Yandex Weather API key
pub const YANDEX_API_KEY_HEADER: &str = "X-Yandex-API-Key";

/// Telegram Bot API base URL
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Timeout applied to every outbound weather request
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Long-poll timeout passed to Telegram `getUpdates`
pub const BOT_POLL_TIMEOUT_SECS: u64 = 30;

/// Pause before polling Telegram again after a failed poll
pub const BOT_POLL_RETRY_DELAY_SECS: u64 = 5;

pub const DEFAULT_CACHE_TTL_SECS: u64 = 1800;
pub const DEFAULT_COORDINATES_PATH: &str = "data/koord_lat_lng_russia.xlsx";
pub const DEFAULT_HTTP_BIND_ADDR: &str = "127.0.0.1:8000";
