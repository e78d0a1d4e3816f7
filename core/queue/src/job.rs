//! Logic and interface to inspect and acknowledge jobs received from a queue.
use std::time::Duration;

use anyhow::Context as AnyContext;
use anyhow::Result;
use serde::de::DeserializeOwned;

use cloudqueue_context::Context;

use crate::error::PayloadDecode;
use crate::payload::JobPayload;

/// What releasing a job does on the backend that delivered it.
///
/// The generic contract intends `release` to return a job to its queue for later redelivery.
/// Not all backends can do that so callers can check what a release really means.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReleaseBehaviour {
    /// The claim on the message ends and the message is removed: the job is NOT redelivered.
    ///
    /// Any requested release delay is ignored.
    EndClaim,

    /// The job is returned to its queue and will be delivered again.
    Requeue,
}

/// A job popped from a queue and leased to the current process.
///
/// Wraps the backend specific job and keeps track of local acknowledgement state.
/// The backend decides whether operating on a job more than once is valid: the local state
/// is informational and never prevents calls from reaching the backend.
pub struct ReceivedJob {
    backend: Box<dyn JobBackend>,
    deleted: bool,
    released: bool,
}

impl ReceivedJob {
    /// Number of times the job was attempted, as reported by the backend.
    pub fn attempts(&self) -> u32 {
        self.backend.attempts()
    }

    /// Decode the data attached to the job into a structured item.
    pub fn decode<T>(&self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let payload = self.payload()?;
        let data = serde_json::from_value(payload.data)
            .with_context(|| PayloadDecode(self.job_id().to_string()))?;
        Ok(data)
    }

    /// Delete the job from its queue.
    pub async fn delete(&mut self, context: &Context) -> Result<()> {
        self.deleted = true;
        let context = self.context(context);
        slog::debug!(context.logger, "Deleting job from queue");
        let result = self.backend.delete(&context).await;
        if let Err(error) = &result {
            slog::warn!(
                context.logger, "Failed to delete job from queue";
                "error" => format!("{:#}", error),
            );
        }
        result
    }

    /// Check if the job was deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Check if the job was deleted or released.
    pub fn is_deleted_or_released(&self) -> bool {
        self.deleted || self.released
    }

    /// Check if the job was released.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Identifier of the job, as assigned by the queue backend.
    pub fn job_id(&self) -> &str {
        self.backend.job_id()
    }

    /// Descriptor of the job, when the payload was created by the JSON payload builder.
    pub fn name(&self) -> Option<String> {
        self.payload().ok().and_then(|payload| payload.job)
    }

    /// Name of the queue the job was received from.
    pub fn queue(&self) -> &str {
        self.backend.queue()
    }

    /// Raw payload of the job, exactly as received from the queue.
    pub fn raw_body(&self) -> &str {
        self.backend.raw_body()
    }

    /// Release the job back to the backend.
    ///
    /// Check [`ReceivedJob::release_behaviour`] to know if the job will be delivered again.
    pub async fn release(&mut self, context: &Context, delay: Duration) -> Result<()> {
        self.released = true;
        let context = self.context(context);
        slog::debug!(
            context.logger, "Releasing job";
            "delay_s" => delay.as_secs(),
            "behaviour" => ?self.release_behaviour(),
        );
        let result = self.backend.release(&context, delay).await;
        if let Err(error) = &result {
            slog::warn!(
                context.logger, "Failed to release job";
                "error" => format!("{:#}", error),
            );
        }
        result
    }

    /// What a call to [`ReceivedJob::release`] does on the backend that delivered the job.
    pub fn release_behaviour(&self) -> ReleaseBehaviour {
        self.backend.release_behaviour()
    }

    /// Derive a context decorated with job attributes.
    fn context(&self, context: &Context) -> Context {
        context
            .derive()
            .log_values(slog::o!(
                "job_id" => self.job_id().to_string(),
                "queue" => self.queue().to_string(),
            ))
            .build()
    }

    /// Parse the raw body as a JSON job payload.
    fn payload(&self) -> Result<JobPayload> {
        let payload = serde_json::from_str::<JobPayload>(self.raw_body())
            .with_context(|| PayloadDecode(self.job_id().to_string()))?;
        Ok(payload)
    }
}

impl std::fmt::Debug for ReceivedJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceivedJob")
            .field("id", &self.job_id())
            .field("queue", &self.queue())
            .field("deleted", &self.deleted)
            .field("released", &self.released)
            .finish()
    }
}

impl<T> From<T> for ReceivedJob
where
    T: JobBackend + 'static,
{
    fn from(value: T) -> Self {
        ReceivedJob {
            backend: Box::new(value),
            deleted: false,
            released: false,
        }
    }
}

/// Operations on jobs implemented by queue backends.
#[async_trait::async_trait]
pub trait JobBackend: Send + Sync {
    /// Number of times the job was attempted.
    fn attempts(&self) -> u32;

    /// Delete the job from its queue.
    async fn delete(&self, context: &Context) -> Result<()>;

    /// Identifier of the job, as assigned by the queue backend.
    fn job_id(&self) -> &str;

    /// Name of the queue the job was received from.
    fn queue(&self) -> &str;

    /// Raw payload of the job, exactly as received from the queue.
    fn raw_body(&self) -> &str;

    /// Release the job back to the backend.
    async fn release(&self, context: &Context, delay: Duration) -> Result<()>;

    /// What a call to [`JobBackend::release`] does on this backend.
    fn release_behaviour(&self) -> ReleaseBehaviour;
}
