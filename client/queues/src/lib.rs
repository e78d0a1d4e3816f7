//! Async client library interface to interact with Cloud Queues services.
//!
//! The service is organised in named queues holding messages.
//! Messages are claimed by consumers for a limited time and deleted once processed.
use std::sync::Arc;

use anyhow::Result;

mod models;

#[cfg(any(test, feature = "test-fixture"))]
pub mod fixture;

pub use self::models::ClaimOptions;
pub use self::models::ClaimedMessage;
pub use self::models::QueuePayload;
pub use self::models::QueueStats;

/// Async API client to a Cloud Queues service.
#[derive(Clone)]
pub struct QueueService(Arc<dyn IQueueService>);

impl QueueService {
    /// Create the named queue, or fetch it if it exists, and return a handle to it.
    pub async fn create_queue(&self, name: &str) -> Result<QueueHandle> {
        self.0.create_queue(name).await
    }
}

impl<S> From<S> for QueueService
where
    S: IQueueService + 'static,
{
    fn from(value: S) -> Self {
        QueueService(Arc::new(value))
    }
}

/// Handle to operate on one queue of a Cloud Queues service.
#[derive(Clone)]
pub struct QueueHandle(Arc<dyn IQueueHandle>);

impl QueueHandle {
    /// Claim up to `options.limit` messages for exclusive processing.
    ///
    /// An empty list means no message is available for claiming.
    pub async fn claim_messages(&self, options: ClaimOptions) -> Result<Vec<ClaimedMessage>> {
        self.0.claim_messages(options).await
    }

    /// Post a new message onto the queue.
    pub async fn create_message(&self, payload: QueuePayload) -> Result<bool> {
        self.0.create_message(payload).await
    }

    /// Delete a single message, acting under the given claim.
    pub async fn delete_claimed_message(&self, id: &str, claim_id: Option<&str>) -> Result<()> {
        self.0.delete_claimed_message(id, claim_id).await
    }

    /// Delete a set of messages by ID.
    pub async fn delete_messages(&self, ids: &[String]) -> Result<()> {
        self.0.delete_messages(ids).await
    }

    /// Name of the queue this handle operates on.
    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// Fetch statistics about messages on the queue.
    ///
    /// Services that respond without statistics result in `None`.
    pub async fn stats(&self) -> Result<Option<QueueStats>> {
        self.0.stats().await
    }
}

impl<H> From<H> for QueueHandle
where
    H: IQueueHandle + 'static,
{
    fn from(value: H) -> Self {
        QueueHandle(Arc::new(value))
    }
}

/// Interface to Cloud Queues API clients.
///
/// Enables implementation of Cloud Queues clients across different transport protocols.
#[async_trait::async_trait]
pub trait IQueueService: Send + Sync {
    /// Create the named queue, or fetch it if it exists, and return a handle to it.
    async fn create_queue(&self, name: &str) -> Result<QueueHandle>;
}

/// Operations on a single queue of a Cloud Queues service.
#[async_trait::async_trait]
pub trait IQueueHandle: Send + Sync {
    /// Claim up to `options.limit` messages for exclusive processing.
    async fn claim_messages(&self, options: ClaimOptions) -> Result<Vec<ClaimedMessage>>;

    /// Post a new message onto the queue.
    async fn create_message(&self, payload: QueuePayload) -> Result<bool>;

    /// Delete a single message, acting under the given claim.
    async fn delete_claimed_message(&self, id: &str, claim_id: Option<&str>) -> Result<()>;

    /// Delete a set of messages by ID.
    async fn delete_messages(&self, ids: &[String]) -> Result<()>;

    /// Name of the queue this handle operates on.
    fn name(&self) -> &str;

    /// Fetch statistics about messages on the queue.
    async fn stats(&self) -> Result<Option<QueueStats>>;
}
