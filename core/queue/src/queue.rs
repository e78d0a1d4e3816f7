//! Interface to push jobs onto queues and pop them off for processing.
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as AnyContext;
use anyhow::Result;
use serde::Serialize;
use serde_json::Value as Json;

use cloudqueue_context::Context;

use crate::conf::PushOptions;
use crate::error::PayloadEncode;
use crate::job::ReceivedJob;
use crate::payload::JsonPayloadBuilder;
use crate::payload::PayloadBuilder;

/// Label used in metrics for operations on the backend's default queue.
const DEFAULT_QUEUE_LABEL: &str = "<default>";

/// Label used in metrics for operations on explicitly named queues.
///
/// Queue names are caller provided so they are not used as label values.
const NAMED_QUEUE_LABEL: &str = "<named>";

/// Push jobs onto, and pop them off, the backing queue platform.
///
/// Operations that accept an optional queue name use the backend's default queue
/// when no name is provided.
#[derive(Clone)]
pub struct Queue {
    backend: Arc<dyn QueueBackend>,
    payloads: Arc<dyn PayloadBuilder>,
}

impl Queue {
    /// Request a job to be pushed onto the queue after a delay.
    ///
    /// Backends that can't delay jobs reject the request whatever the job data is.
    pub async fn later<D>(
        &self,
        context: &Context,
        delay: Duration,
        job: &str,
        data: &D,
        queue: Option<&str>,
    ) -> Result<bool>
    where
        D: Serialize,
    {
        let data = match self.backend.supports_later() {
            false => Json::Null,
            true => serde_json::to_value(data).with_context(|| PayloadEncode(job.to_string()))?,
        };
        let label = queue_label(queue);
        crate::telemetry::PUSH_COUNT.with_label_values(&[label]).inc();
        let err_count = crate::telemetry::PUSH_ERR.with_label_values(&[label]);
        let later = self.backend.later(context, delay, job, data, queue);
        crate::telemetry::count_on_err(err_count, later).await
    }

    /// Pop the next job off of the queue, if one is available.
    pub async fn pop(&self, context: &Context, queue: Option<&str>) -> Result<Option<ReceivedJob>> {
        let label = queue_label(queue);
        crate::telemetry::POP_COUNT.with_label_values(&[label]).inc();
        let err_count = crate::telemetry::POP_ERR.with_label_values(&[label]);
        let pop = self.backend.pop(context, queue);
        let job = crate::telemetry::count_on_err(err_count, pop).await?;
        if job.is_none() {
            crate::telemetry::POP_EMPTY.with_label_values(&[label]).inc();
        }
        Ok(job)
    }

    /// Serialize a job and its data and push it onto the queue.
    pub async fn push<D>(
        &self,
        context: &Context,
        job: &str,
        data: &D,
        queue: Option<&str>,
    ) -> Result<bool>
    where
        D: Serialize,
    {
        let data = serde_json::to_value(data).with_context(|| PayloadEncode(job.to_string()))?;
        let payload = self.payloads.create(job, data)?;
        self.push_raw(context, &payload, queue, PushOptions::default())
            .await
    }

    /// Push an already serialized payload onto the queue.
    pub async fn push_raw(
        &self,
        context: &Context,
        payload: &str,
        queue: Option<&str>,
        options: PushOptions,
    ) -> Result<bool> {
        let label = queue_label(queue);
        crate::telemetry::PUSH_COUNT.with_label_values(&[label]).inc();
        let err_count = crate::telemetry::PUSH_ERR.with_label_values(&[label]);
        let push = self.backend.push_raw(context, payload, queue, options);
        crate::telemetry::count_on_err(err_count, push).await
    }

    /// Number of messages currently on the queue.
    pub async fn size(&self, context: &Context, queue: Option<&str>) -> Result<u64> {
        self.backend.size(context, queue).await
    }

    /// Replace the [`PayloadBuilder`] used to serialize pushed jobs.
    pub fn with_payload_builder<P>(mut self, builder: P) -> Self
    where
        P: PayloadBuilder + 'static,
    {
        self.payloads = Arc::new(builder);
        self
    }
}

impl<T> From<T> for Queue
where
    T: QueueBackend + 'static,
{
    fn from(value: T) -> Self {
        Queue {
            backend: Arc::new(value),
            payloads: Arc::new(JsonPayloadBuilder),
        }
    }
}

/// Operations implemented by the queue platforms jobs can be stored on.
///
/// When an optional queue name is `None` the backend operates on its default queue.
#[async_trait::async_trait]
pub trait QueueBackend: Send + Sync {
    /// Push a job onto the queue after a delay.
    async fn later(
        &self,
        context: &Context,
        delay: Duration,
        job: &str,
        data: Json,
        queue: Option<&str>,
    ) -> Result<bool>;

    /// Pop the next job off of the queue, if one is available.
    async fn pop(&self, context: &Context, queue: Option<&str>) -> Result<Option<ReceivedJob>>;

    /// Push an already serialized payload onto the queue.
    async fn push_raw(
        &self,
        context: &Context,
        payload: &str,
        queue: Option<&str>,
        options: PushOptions,
    ) -> Result<bool>;

    /// Number of messages currently on the queue.
    async fn size(&self, context: &Context, queue: Option<&str>) -> Result<u64>;

    /// Whether the backend can push jobs after a delay.
    ///
    /// Backends that return `false` receive `Json::Null` as the data of [`QueueBackend::later`]
    /// and are expected to reject the request.
    fn supports_later(&self) -> bool {
        false
    }
}

fn queue_label(queue: Option<&str>) -> &'static str {
    match queue {
        None | Some("") => DEFAULT_QUEUE_LABEL,
        Some(_) => NAMED_QUEUE_LABEL,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::Result;
    use serde_json::Value as Json;

    use cloudqueue_context::Context;

    use crate::error::UnsupportedOperation;
    use crate::fixture::QueueFixture;
    use crate::payload::PayloadBuilder;
    use crate::PushOptions;

    /// Payload builder that ignores the data.
    struct NameOnly;

    impl PayloadBuilder for NameOnly {
        fn create(&self, job: &str, _: Json) -> Result<String> {
            Ok(job.to_string())
        }
    }

    #[tokio::test]
    async fn later_is_unsupported() {
        let context = Context::fixture();
        let fixture = QueueFixture::new();
        let queue = fixture.queue();
        let error = queue
            .later(&context, Duration::from_secs(10), "job", &(), None)
            .await
            .unwrap_err();
        let error = error.downcast_ref::<UnsupportedOperation>().unwrap();
        assert_eq!(error.operation(), "later");
        assert_eq!(queue.size(&context, None).await.unwrap(), 0);
    }

    #[test]
    fn metric_labels_are_bounded() {
        assert_eq!(super::queue_label(None), "<default>");
        assert_eq!(super::queue_label(Some("")), "<default>");
        assert_eq!(super::queue_label(Some("mail")), "<named>");
        assert_eq!(super::queue_label(Some("reports-2026-10-19")), "<named>");
    }

    #[tokio::test]
    async fn later_unsupported_ignores_unserializable_data() {
        let context = Context::fixture();
        let queue = QueueFixture::new().queue();
        let data = std::collections::HashMap::from([((1u8, 2u8), 3u8)]);
        let error = queue
            .later(&context, Duration::from_secs(10), "job", &data, None)
            .await
            .unwrap_err();
        assert!(error.is::<UnsupportedOperation>());
    }

    #[tokio::test]
    async fn pop_empty_queue() {
        let context = Context::fixture();
        let fixture = QueueFixture::new();
        let queue = fixture.queue();
        let job = queue.pop(&context, Some("empty")).await.unwrap();
        assert!(job.is_none());
    }

    #[tokio::test]
    async fn push_and_pop() {
        let context = Context::fixture();
        let fixture = QueueFixture::new();
        let queue = fixture.queue();
        assert!(queue.push(&context, "first", &1, None).await.unwrap());
        assert!(queue.push(&context, "second", &2, None).await.unwrap());
        assert_eq!(queue.size(&context, None).await.unwrap(), 2);

        let job = queue.pop(&context, None).await.unwrap().unwrap();
        assert_eq!(job.name().as_deref(), Some("first"));
        assert_eq!(job.queue(), "default");
        assert_eq!(job.attempts(), 1);
        assert_eq!(job.decode::<u64>().unwrap(), 1);
    }

    #[tokio::test]
    async fn push_to_named_queue() {
        let context = Context::fixture();
        let fixture = QueueFixture::new();
        let queue = fixture.queue();
        queue
            .push_raw(&context, "raw", Some("mail"), PushOptions::default().with_ttl(60))
            .await
            .unwrap();
        assert_eq!(queue.size(&context, None).await.unwrap(), 0);
        assert_eq!(queue.size(&context, Some("mail")).await.unwrap(), 1);
        assert_eq!(fixture.ttls("mail"), vec![Some(60)]);

        let job = queue.pop(&context, Some("mail")).await.unwrap().unwrap();
        assert_eq!(job.queue(), "mail");
        assert_eq!(job.raw_body(), "raw");
    }

    #[tokio::test]
    async fn push_with_custom_payload_builder() {
        let context = Context::fixture();
        let fixture = QueueFixture::new();
        let queue = fixture.queue().with_payload_builder(NameOnly);
        queue.push(&context, "custom", &"ignored", None).await.unwrap();
        let job = queue.pop(&context, None).await.unwrap().unwrap();
        assert_eq!(job.raw_body(), "custom");
    }
}
