use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::constants::{BOT_POLL_RETRY_DELAY_SECS, BOT_POLL_TIMEOUT_SECS, USER_AGENT};
use crate::formatters::{format_weather_reply, FAILURE_REPLY, MISSING_CITY_REPLY};
use crate::gateway::WeatherGateway;
use crate::models::{SendMessageRequest, TelegramResponse, Update};

const COMMAND: &str = "/weather";

/// Splits a `/weather` command into its argument.
///
/// Returns `None` for anything that is not the command, and `Some(None)` for
/// the bare command. `/weather@SomeBot Moscow` is accepted as well.
pub fn parse_command(text: &str) -> Option<Option<&str>> {
    let text = text.trim();
    let (head, args) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
    let name = head.split_once('@').map_or(head, |(name, _)| name);
    if name != COMMAND {
        return None;
    }
    let args = args.trim();
    Some((!args.is_empty()).then_some(args))
}

/// Telegram bot answering `/weather <city>` via `getUpdates` long polling
pub struct TelegramBot {
    client: Client,
    base_url: String,
    gateway: Arc<WeatherGateway>,
}

impl TelegramBot {
    /// Creates a bot talking to the Bot API at `api_base` with `token`
    pub fn new(api_base: &str, token: &str, gateway: Arc<WeatherGateway>) -> Result<Self> {
        // Must outlive the long-poll wait
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(BOT_POLL_TIMEOUT_SECS + 10))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
            gateway,
        })
    }

    /// Polls forever, ignoring messages sent while the bot was down. A failed
    /// poll is logged and retried after a pause.
    pub async fn run(self) {
        tracing::info!("Starting Telegram bot");
        let mut offset = match self.skip_backlog().await {
            Ok(offset) => offset,
            Err(e) => {
                tracing::warn!("Could not skip pending updates: {:#}", e);
                0
            }
        };
        loop {
            match self.poll_once(offset).await {
                Ok(next) => offset = next,
                Err(e) => {
                    tracing::error!("Telegram poll failed: {:#}", e);
                    tokio::time::sleep(Duration::from_secs(BOT_POLL_RETRY_DELAY_SECS)).await;
                }
            }
        }
    }

    /// Returns the offset just past the newest pending update, or 0 when
    /// nothing is pending. Polling from there drops the backlog.
    pub async fn skip_backlog(&self) -> Result<i64> {
        let latest: Vec<Update> = self
            .call(
                "getUpdates",
                &serde_json::json!({"offset": -1, "limit": 1, "timeout": 0}),
            )
            .await?;

        let offset = latest.last().map_or(0, |u| u.update_id + 1);
        if offset > 0 {
            tracing::info!("Skipping pending updates up to {}", offset - 1);
        }
        Ok(offset)
    }

    /// Handles one batch of updates and returns the offset for the next poll.
    pub async fn poll_once(&self, offset: i64) -> Result<i64> {
        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                &serde_json::json!({
                    "offset": offset,
                    "timeout": BOT_POLL_TIMEOUT_SECS,
                    "allowed_updates": ["message"],
                }),
            )
            .await?;

        let mut next = offset;
        for update in updates {
            next = next.max(update.update_id + 1);
            let Some(message) = update.message else {
                continue;
            };
            let Some(reply) = self.reply_for(message.text.as_deref().unwrap_or_default()).await
            else {
                continue;
            };

            let request = SendMessageRequest {
                chat_id: message.chat.id,
                text: &reply,
                reply_to_message_id: message.message_id,
            };
            if let Err(e) = self.call::<serde_json::Value, _>("sendMessage", &request).await {
                tracing::warn!("Failed to reply in chat {}: {:#}", message.chat.id, e);
            }
        }
        Ok(next)
    }

    /// The reply to a message, or `None` if the bot should stay silent.
    pub async fn reply_for(&self, text: &str) -> Option<String> {
        let city = parse_command(text)?;
        let Some(city) = city else {
            return Some(MISSING_CITY_REPLY.to_string());
        };

        let reply = match self.gateway.get_weather(Some(city)).await {
            Ok(reading) => format_weather_reply(city, &reading),
            Err(e) => {
                tracing::warn!("Bot weather lookup for {} failed: {}", city, e);
                FAILURE_REPLY.to_string()
            }
        };
        Some(reply)
    }

    async fn call<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .json(body)
            .send()
            .await?;

        let data = response.json::<TelegramResponse<T>>().await?;
        match (data.ok, data.result) {
            (true, Some(result)) => Ok(result),
            _ => bail!(
                "{} failed: {}",
                method,
                data.description.unwrap_or_else(|| "no description".to_string())
            ),
        }
    }
}
