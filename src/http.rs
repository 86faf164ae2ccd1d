use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::error::WeatherError;
use crate::gateway::WeatherGateway;
use crate::models::{ErrorBody, WeatherQuery, WeatherReading};

impl IntoResponse for WeatherError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// Routes `GET /weather/?city=<name>` to the gateway
pub fn router(gateway: Arc<WeatherGateway>) -> Router {
    Router::new()
        .route("/weather/", get(get_weather))
        .route("/weather", get(get_weather))
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

/// Binds `addr` and serves until the process stops.
pub async fn serve(addr: SocketAddr, gateway: Arc<WeatherGateway>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on {}", listener.local_addr()?);
    axum::serve(listener, router(gateway)).await?;
    Ok(())
}

async fn get_weather(
    State(gateway): State<Arc<WeatherGateway>>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<WeatherReading>, WeatherError> {
    gateway
        .get_weather(query.city.as_deref())
        .await
        .map(Json)
        .inspect_err(|e| tracing::warn!("Weather request failed: {}", e))
}
