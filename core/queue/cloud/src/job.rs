//! Jobs claimed off a Cloud Queues queue.
use std::time::Duration;

use anyhow::Result;
use slog::debug;

use cloudqueue_client::ClaimedMessage;
use cloudqueue_client::QueueHandle;
use cloudqueue_context::Context;
use cloudqueue_queue::JobBackend;
use cloudqueue_queue::ReleaseBehaviour;

use crate::telemetry::Op;

/// Job backed by a message claimed off a Cloud Queues queue.
pub struct CloudQueueJob {
    handle: QueueHandle,
    message: ClaimedMessage,
}

impl CloudQueueJob {
    /// Wrap a message claimed off the queue behind `handle`.
    pub fn new(handle: QueueHandle, message: ClaimedMessage) -> CloudQueueJob {
        CloudQueueJob { handle, message }
    }

    /// The claimed message this job wraps.
    pub fn message(&self) -> &ClaimedMessage {
        &self.message
    }
}

#[async_trait::async_trait]
impl JobBackend for CloudQueueJob {
    /// Cloud Queues does not track deliveries so every job is on its first attempt.
    fn attempts(&self) -> u32 {
        1
    }

    async fn delete(&self, context: &Context) -> Result<()> {
        debug!(context.logger, "Deleting job from Cloud Queues");
        let ids = [self.message.id().to_string()];
        let delete = self.handle.delete_messages(&ids);
        crate::telemetry::observe(Op::DeleteMessages, delete).await
    }

    fn job_id(&self) -> &str {
        self.message.id()
    }

    fn queue(&self) -> &str {
        self.handle.name()
    }

    fn raw_body(&self) -> &str {
        self.message.body()
    }

    /// Ends the claim on the job by deleting the message under it.
    ///
    /// The delay is ignored and the job does NOT return to the queue.
    async fn release(&self, context: &Context, _: Duration) -> Result<()> {
        debug!(context.logger, "Releasing job claim on Cloud Queues");
        let release = self
            .handle
            .delete_claimed_message(self.message.id(), self.message.claim_id());
        crate::telemetry::observe(Op::ReleaseClaim, release).await
    }

    fn release_behaviour(&self) -> ReleaseBehaviour {
        ReleaseBehaviour::EndClaim
    }
}
