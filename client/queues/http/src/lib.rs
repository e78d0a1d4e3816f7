//! Cloud Queues API client for the HTTP(S) protocol.
use anyhow::Context;
use anyhow::Result;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use reqwest::Client as ReqwestClient;
use reqwest::Url;

use cloudqueue_client::ClaimOptions;
use cloudqueue_client::ClaimedMessage;
use cloudqueue_client::IQueueHandle;
use cloudqueue_client::IQueueService;
use cloudqueue_client::QueueHandle;
use cloudqueue_client::QueuePayload;
use cloudqueue_client::QueueStats;
use cloudqueue_client_utils::EmptyResponse;
use cloudqueue_client_utils::ResourceIdentifier;

mod wire;

#[cfg(test)]
mod tests;

use self::wire::WireClaim;
use self::wire::WireMessage;
use self::wire::WirePosted;
use self::wire::WireStats;

pub use cloudqueue_client_utils::ClientOptions;

/// String to set as the user agent in HTTP request.
static CLIENT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Header identifying the client to the service.
const HEADER_CLIENT_ID: &str = "client-id";

/// Header carrying the authentication token.
const HEADER_AUTH_TOKEN: &str = "x-auth-token";

/// Header carrying the project (tenant) the queues belong to.
const HEADER_PROJECT_ID: &str = "x-project-id";

/// The service endpoint is not a valid base URL.
#[derive(Debug, thiserror::Error)]
#[error("the service endpoint '{0}' is not a valid base URL")]
pub struct InvalidEndpoint(pub String);

/// Identity and credentials sent with every request.
#[derive(Clone, Debug, Default)]
pub struct Credentials {
    /// Client identifier, a random UUID is generated when not set.
    pub client_id: Option<String>,

    /// Project the queues belong to.
    pub project_id: Option<String>,

    /// Authentication token for the service.
    pub token: Option<String>,
}

/// Cloud Queues API client for the HTTP(S) protocol.
pub struct HttpClient {
    /// Base URL of the API server to send requests to.
    base: Url,

    /// Low-level [`Client`](reqwest::Client) to perform HTTP requests with.
    client: ReqwestClient,
}

impl HttpClient {
    /// Initialise a client with [`ClientOptions`] and [`Credentials`].
    pub fn with<O>(options: O, credentials: Credentials) -> Result<HttpClient>
    where
        O: Into<ClientOptions>,
    {
        let options = options.into();
        let base = Url::parse(&options.address)
            .with_context(|| InvalidEndpoint(options.address.clone()))?;
        if base.cannot_be_a_base() {
            anyhow::bail!(InvalidEndpoint(options.address));
        }
        let client_id = credentials
            .client_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(HEADER_CLIENT_ID),
            HeaderValue::from_str(&client_id)?,
        );
        if let Some(project_id) = credentials.project_id {
            headers.insert(
                HeaderName::from_static(HEADER_PROJECT_ID),
                HeaderValue::from_str(&project_id)?,
            );
        }
        if let Some(token) = credentials.token {
            let mut token = HeaderValue::from_str(&token)?;
            token.set_sensitive(true);
            headers.insert(HeaderName::from_static(HEADER_AUTH_TOKEN), token);
        }

        let client = options
            .client(CLIENT_USER_AGENT)
            .default_headers(headers)
            .build()?;
        let client = HttpClient { base, client };
        Ok(client)
    }
}

#[async_trait::async_trait]
impl IQueueService for HttpClient {
    async fn create_queue(&self, name: &str) -> Result<QueueHandle> {
        let url = join(&self.base, &["queues", name]);
        let response = self.client.put(url.clone()).send().await?;
        cloudqueue_client_utils::inspect::<serde_json::Value>(response)
            .await
            .with_context(|| ResourceIdentifier::reference("queue", name))?;
        let queue = HttpQueue {
            client: self.client.clone(),
            name: name.to_string(),
            url,
        };
        Ok(QueueHandle::from(queue))
    }
}

/// Handle to a queue accessed over HTTP(S).
pub struct HttpQueue {
    client: ReqwestClient,
    name: String,
    url: Url,
}

impl HttpQueue {
    fn reference(&self) -> ResourceIdentifier {
        ResourceIdentifier::reference("queue", &self.name)
    }
}

#[async_trait::async_trait]
impl IQueueHandle for HttpQueue {
    async fn claim_messages(&self, options: ClaimOptions) -> Result<Vec<ClaimedMessage>> {
        let body = WireClaim {
            grace: options.grace,
            ttl: options.ttl,
        };
        let response = self
            .client
            .post(join(&self.url, &["claims"]))
            .query(&[("limit", options.limit)])
            .json(&body)
            .send()
            .await?;
        let messages = cloudqueue_client_utils::inspect::<Vec<WireMessage>>(response)
            .await
            .with_context(|| self.reference())?;
        let messages = messages
            .unwrap_or_default()
            .into_iter()
            .map(ClaimedMessage::from)
            .collect();
        Ok(messages)
    }

    async fn create_message(&self, payload: QueuePayload) -> Result<bool> {
        let response = self
            .client
            .post(join(&self.url, &["messages"]))
            .json(&[payload])
            .send()
            .await?;
        let posted = cloudqueue_client_utils::inspect::<WirePosted>(response)
            .await
            .with_context(|| self.reference())?;
        let posted = posted.ok_or(EmptyResponse).with_context(|| self.reference())?;
        Ok(!posted.partial)
    }

    async fn delete_claimed_message(&self, id: &str, claim_id: Option<&str>) -> Result<()> {
        let mut request = self.client.delete(join(&self.url, &["messages", id]));
        if let Some(claim_id) = claim_id {
            request = request.query(&[("claim_id", claim_id)]);
        }
        let response = request.send().await?;
        cloudqueue_client_utils::inspect::<serde_json::Value>(response)
            .await
            .with_context(|| ResourceIdentifier::reference("message", id))
            .with_context(|| self.reference())?;
        Ok(())
    }

    async fn delete_messages(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let response = self
            .client
            .delete(join(&self.url, &["messages"]))
            .query(&[("ids", ids.join(","))])
            .send()
            .await?;
        cloudqueue_client_utils::inspect::<serde_json::Value>(response)
            .await
            .with_context(|| self.reference())?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn stats(&self) -> Result<Option<QueueStats>> {
        let response = self
            .client
            .get(join(&self.url, &["stats"]))
            .send()
            .await?;
        let stats = cloudqueue_client_utils::inspect::<WireStats>(response)
            .await
            .with_context(|| self.reference())?;
        Ok(stats.and_then(|stats| stats.messages))
    }
}

/// Append percent-encoded path segments to a base URL.
///
/// The base is checked to have a path when the client is created.
fn join(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

