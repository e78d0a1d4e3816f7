//! Values exchanged with Cloud Queues services.
use serde::Deserialize;
use serde::Serialize;
use url::Url;

/// Base used to resolve message references, which the service returns as absolute paths.
const HREF_BASE: &str = "http://cloud-queues.invalid/";

/// Options to claim messages off a queue.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ClaimOptions {
    /// Seconds the service extends the life of claimed messages so they outlive the claim.
    pub grace: u64,

    /// Maximum number of messages to claim.
    pub limit: u16,

    /// Seconds before the claim expires and messages become available to others again.
    pub ttl: u64,
}

/// Message claimed off a queue, owned by the service client that fetched it.
///
/// The message is identified by its `href` and all other identifiers derive from it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClaimedMessage {
    age: u64,
    body: String,
    claim_id: Option<String>,
    href: String,
    id: String,
    ttl: u64,
}

impl ClaimedMessage {
    /// Seconds since the message was posted.
    pub fn age(&self) -> u64 {
        self.age
    }

    /// Body of the message, as posted.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// ID of the claim the message was returned under, from the `claim_id` parameter of `href`.
    pub fn claim_id(&self) -> Option<&str> {
        self.claim_id.as_deref()
    }

    /// Initialise a message from its `href` and body.
    ///
    /// The message ID is the last path segment of the `href`, percent-decoded.
    /// References that can't be parsed result in an empty ID and no claim.
    pub fn from_href<H, B>(href: H, body: B) -> ClaimedMessage
    where
        H: Into<String>,
        B: Into<String>,
    {
        let href = href.into();
        let base = Url::parse(HREF_BASE).ok();
        let url = Url::options().base_url(base.as_ref()).parse(&href).ok();
        let id = url
            .as_ref()
            .and_then(|url| url.path_segments())
            .and_then(|mut segments| segments.next_back())
            .map(|segment| {
                percent_encoding::percent_decode_str(segment)
                    .decode_utf8_lossy()
                    .into_owned()
            })
            .unwrap_or_default();
        let claim_id = url.as_ref().and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "claim_id")
                .map(|(_, value)| value.into_owned())
                .filter(|value| !value.is_empty())
        });
        ClaimedMessage {
            age: 0,
            body: body.into(),
            claim_id,
            href,
            id,
            ttl: 0,
        }
    }

    /// Reference to the message on the service.
    pub fn href(&self) -> &str {
        &self.href
    }

    /// Identifier of the message, as assigned by the service.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Seconds the message lives for on the queue.
    pub fn ttl(&self) -> u64 {
        self.ttl
    }

    /// Set the age, in seconds, of the message.
    pub fn with_age(mut self, age: u64) -> Self {
        self.age = age;
        self
    }

    /// Set the time-to-live, in seconds, of the message.
    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = ttl;
        self
    }
}

/// A message body to post onto a queue with its time-to-live.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct QueuePayload {
    /// Serialized job payload.
    pub body: String,

    /// Seconds the message lives for on the queue before the service expires it.
    pub ttl: u64,
}

/// Message counts for a queue.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Number of messages currently claimed.
    #[serde(default)]
    pub claimed: u64,

    /// Number of messages available for claiming.
    #[serde(default)]
    pub free: u64,

    /// Total number of messages on the queue.
    #[serde(default)]
    pub total: u64,
}
