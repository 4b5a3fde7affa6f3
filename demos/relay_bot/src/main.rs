//! Relay Bot Example
//!
//! Hosts every bot listed in `onelink.toml`, logs each event the gateways
//! push, and answers `/echo <text>` messages through the bot's action
//! endpoint.
//!
//! ```toml
//! [server]
//! port = 8080
//!
//! [[bots]]
//! self_id = "10001"
//! secret = "abc"
//! endpoint = "http://127.0.0.1:5700"
//! token = "t0ken"
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package relay-bot -- --config onelink.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use onelink_core::{ApiError, BotInstance, DispatchedEvent};
use onelink_runtime::OnelinkRuntime;
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Configuration file (default: search ./onelink.toml and the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Extracts the text of a message event, `None` for anything else.
fn message_text(payload: &Value) -> Option<&str> {
    if payload.get("post_type")?.as_str()? != "message" {
        return None;
    }
    payload
        .get("raw_message")
        .or_else(|| payload.get("message"))?
        .as_str()
}

/// Builds the `send_msg` parameters replying to `payload`.
fn reply_params(payload: &Value, text: &str) -> Value {
    let mut params = json!({ "message": text });
    for key in ["message_type", "user_id", "group_id"] {
        if let Some(value) = payload.get(key) {
            params[key] = value.clone();
        }
    }
    params
}

async fn echo(bot: Arc<BotInstance>, params: Value) {
    match bot.call("send_msg", params).await {
        Ok(resp) => debug!(self_id = %bot.self_id(), response = %resp, "Echo sent"),
        Err(ApiError::NotConnected) => {
            warn!(self_id = %bot.self_id(), "No endpoint configured, cannot reply")
        }
        Err(e) => error!(self_id = %bot.self_id(), error = %e, "Failed to send echo reply"),
    }
}

fn handle(event: DispatchedEvent) {
    let DispatchedEvent { bot, payload } = event;
    let post_type = payload
        .get("post_type")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    info!(self_id = %bot.self_id(), post_type, "Event received");

    if let Some(content) = message_text(&payload).and_then(|t| t.strip_prefix("/echo ")) {
        let params = reply_params(&payload, content);
        tokio::spawn(echo(bot, params));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = OnelinkRuntime::builder();
    if let Some(path) = args.config {
        builder = builder.config_file(path);
    }
    let runtime = builder.build()?;

    let mut events = runtime
        .take_events()
        .ok_or_else(|| anyhow::anyhow!("dispatch queue already taken"))?;
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            handle(event);
        }
    });

    runtime.run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_text() {
        let event = json!({"post_type": "message", "raw_message": "/echo hi", "message": []});
        assert_eq!(message_text(&event), Some("/echo hi"));

        let meta = json!({"post_type": "meta_event", "message": "nope"});
        assert_eq!(message_text(&meta), None);
    }

    #[test]
    fn test_reply_params() {
        let event = json!({"post_type": "message", "message_type": "group", "group_id": 42, "user_id": 7});
        assert_eq!(
            reply_params(&event, "hi"),
            json!({"message": "hi", "message_type": "group", "group_id": 42, "user_id": 7})
        );
    }
}
