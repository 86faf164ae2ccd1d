pub mod bot;
pub mod config;
pub mod constants;
pub mod error;
pub mod fetcher;
pub mod formatters;
pub mod gateway;
pub mod http;
pub mod models;
pub mod resolver;

pub use error::WeatherError;
pub use gateway::{WeatherCache, WeatherGateway};
pub use models::{CoordinateEntry, WeatherReading};
