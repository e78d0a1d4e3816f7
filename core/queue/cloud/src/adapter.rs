//! Queue backend pushing and claiming jobs on a Cloud Queues service.
use std::time::Duration;

use anyhow::Result;
use serde_json::Value as Json;
use slog::debug;

use cloudqueue_client::ClaimOptions;
use cloudqueue_client::QueueHandle;
use cloudqueue_client::QueuePayload;
use cloudqueue_client::QueueService;
use cloudqueue_context::Context;
use cloudqueue_queue::error::UnsupportedOperation;
use cloudqueue_queue::PushOptions;
use cloudqueue_queue::QueueBackend;
use cloudqueue_queue::ReceivedJob;

use crate::job::CloudQueueJob;
use crate::telemetry::Op;

/// Seconds a claimed message lives past the end of its claim.
pub const CLAIM_GRACE: u64 = 300;

/// Jobs are popped one at a time.
pub const CLAIM_LIMIT: u16 = 1;

/// Seconds a job is claimed for before it becomes available to other workers.
pub const CLAIM_TTL: u64 = 300;

/// Seconds pushed jobs live on the queue when no TTL is requested (two days).
pub const DEFAULT_MESSAGE_TTL: u64 = 172_800;

/// Name of the backend reported in errors.
const BACKEND_NAME: &str = "cloud queue";

/// Queue backend storing jobs on a Cloud Queues service.
///
/// The handle to the default queue is resolved once, when the backend is created.
/// Named queues are resolved (and created if needed) for each operation on them.
pub struct CloudQueue {
    default_handle: QueueHandle,
    service: QueueService,
}

impl CloudQueue {
    /// Initialise the backend and resolve the default queue.
    pub async fn new(
        context: &Context,
        service: QueueService,
        default_queue: &str,
    ) -> Result<CloudQueue> {
        debug!(context.logger, "Resolving default Cloud Queues queue"; "queue" => default_queue);
        let default_handle = create_queue(&service, default_queue).await?;
        Ok(CloudQueue {
            default_handle,
            service,
        })
    }

    /// Name of the queue used when operations don't specify one.
    pub fn default_queue(&self) -> &str {
        self.default_handle.name()
    }

    /// Handle to the requested queue, or to the default queue if none is requested.
    ///
    /// The cached default handle is also used when the default queue is requested by name,
    /// so only names other than the default one are resolved again with the service.
    async fn resolve(&self, queue: Option<&str>) -> Result<QueueHandle> {
        match queue {
            None | Some("") => Ok(self.default_handle.clone()),
            Some(name) if name == self.default_handle.name() => Ok(self.default_handle.clone()),
            Some(name) => create_queue(&self.service, name).await,
        }
    }
}

#[async_trait::async_trait]
impl QueueBackend for CloudQueue {
    async fn later(
        &self,
        context: &Context,
        _: Duration,
        job: &str,
        _: Json,
        queue: Option<&str>,
    ) -> Result<bool> {
        let error = UnsupportedOperation::new(BACKEND_NAME, "later");
        slog::warn!(
            context.logger, "Delayed jobs are not supported by Cloud Queues";
            "job" => job,
            "queue" => queue.unwrap_or_else(|| self.default_queue()),
        );
        anyhow::bail!(error)
    }

    async fn pop(&self, context: &Context, queue: Option<&str>) -> Result<Option<ReceivedJob>> {
        let handle = self.resolve(queue).await?;
        let options = ClaimOptions {
            grace: CLAIM_GRACE,
            limit: CLAIM_LIMIT,
            ttl: CLAIM_TTL,
        };
        let claim = handle.claim_messages(options);
        let messages = crate::telemetry::observe(Op::ClaimMessages, claim).await?;

        let message = match messages.into_iter().next() {
            None => {
                debug!(context.logger, "No job available to claim"; "queue" => handle.name());
                return Ok(None);
            }
            Some(message) => message,
        };
        debug!(
            context.logger, "Claimed job from Cloud Queues";
            "queue" => handle.name(),
            "job_id" => message.id(),
        );
        let job = CloudQueueJob::new(handle, message);
        Ok(Some(ReceivedJob::from(job)))
    }

    async fn push_raw(
        &self,
        context: &Context,
        payload: &str,
        queue: Option<&str>,
        options: PushOptions,
    ) -> Result<bool> {
        let handle = self.resolve(queue).await?;
        let payload = QueuePayload {
            body: payload.to_string(),
            ttl: options.ttl.unwrap_or(DEFAULT_MESSAGE_TTL),
        };
        debug!(
            context.logger, "Pushing job onto Cloud Queues";
            "queue" => handle.name(),
            "ttl" => payload.ttl,
        );
        crate::telemetry::observe(Op::CreateMessage, handle.create_message(payload)).await
    }

    async fn size(&self, context: &Context, queue: Option<&str>) -> Result<u64> {
        let handle = self.resolve(queue).await?;
        let stats = crate::telemetry::observe(Op::Stats, handle.stats()).await?;
        let size = match stats {
            None => {
                debug!(context.logger, "Queue statistics not available"; "queue" => handle.name());
                0
            }
            Some(stats) => stats.total,
        };
        Ok(size)
    }
}

/// Create the named queue, or fetch it if it exists.
async fn create_queue(service: &QueueService, name: &str) -> Result<QueueHandle> {
    crate::telemetry::observe(Op::CreateQueue, service.create_queue(name)).await
}
