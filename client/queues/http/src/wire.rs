//! Request and response bodies as exchanged with the Cloud Queues API.
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value as Json;

use cloudqueue_client::ClaimedMessage;
use cloudqueue_client::QueueStats;

/// Request body to claim messages.
#[derive(Debug, Serialize)]
pub struct WireClaim {
    pub grace: u64,
    pub ttl: u64,
}

/// Message returned by claim requests.
#[derive(Debug, Deserialize)]
pub struct WireMessage {
    #[serde(default)]
    pub age: u64,

    /// Message bodies can be any JSON value, not just the strings posted by this client.
    pub body: Json,
    pub href: String,

    #[serde(default)]
    pub ttl: u64,
}

impl From<WireMessage> for ClaimedMessage {
    fn from(value: WireMessage) -> Self {
        let body = match value.body {
            Json::String(body) => body,
            body => body.to_string(),
        };
        ClaimedMessage::from_href(value.href, body)
            .with_age(value.age)
            .with_ttl(value.ttl)
    }
}

/// Response to message post requests.
#[derive(Debug, Deserialize)]
pub struct WirePosted {
    #[serde(default)]
    pub partial: bool,
}

/// Response to queue statistics requests.
#[derive(Debug, Deserialize)]
pub struct WireStats {
    /// Services may respond without message counts.
    #[serde(default)]
    pub messages: Option<QueueStats>,
}
