//! Factory for the Cloud Queues backend.
use std::time::Duration;

use anyhow::Context as AnyContext;
use anyhow::Result;
use serde_json::Value as Json;

use cloudqueue_client::QueueService;
use cloudqueue_client_http::ClientOptions;
use cloudqueue_client_http::Credentials;
use cloudqueue_client_http::HttpClient;
use cloudqueue_context::Context;
use cloudqueue_queue::factory::QueueFactory;
use cloudqueue_queue::factory::QueueFactoryArgs;
use cloudqueue_queue::Queue;

use crate::adapter::CloudQueue;
use crate::Conf;

/// The Cloud Queues backend configuration is not valid.
#[derive(Debug, thiserror::Error)]
#[error("the Cloud Queues backend configuration is not valid")]
pub struct ConfError;

/// Initialise job queues backed by a Cloud Queues service over HTTP(S).
pub struct CloudQueueFactory;

#[async_trait::async_trait]
impl QueueFactory for CloudQueueFactory {
    fn conf_check(&self, _context: &Context, conf: &Json) -> Result<()> {
        serde_json::from_value::<Conf>(conf.clone()).context(ConfError)?;
        Ok(())
    }

    async fn connect<'a>(&self, args: QueueFactoryArgs<'a>) -> Result<Queue> {
        let conf: Conf = serde_json::from_value(args.conf.clone()).context(ConfError)?;
        let options = ClientOptions::url(conf.endpoint)
            .timeout(Duration::from_secs(conf.timeouts.request_s))
            .timeout_connect(Duration::from_secs(conf.timeouts.connect_s));
        let credentials = Credentials {
            client_id: conf.client_id,
            project_id: conf.project_id,
            token: conf.token,
        };
        let client = HttpClient::with(options, credentials)?;
        let service = QueueService::from(client);
        let backend = CloudQueue::new(args.context, service, &conf.default_queue).await?;
        Ok(Queue::from(backend))
    }

    fn register_metrics(&self, registry: &prometheus::Registry) -> Result<()> {
        crate::telemetry::register_metrics(registry)
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use cloudqueue_context::Context;
    use cloudqueue_queue::factory::QueueFactory;
    use cloudqueue_queue::factory::QueueFactoryArgs;

    use super::CloudQueueFactory;
    use super::ConfError;

    #[test]
    fn conf_check_valid() {
        let context = Context::fixture();
        let conf = json!({"endpoint": "http://localhost:8888/v1"});
        CloudQueueFactory.conf_check(&context, &conf).unwrap();
    }

    #[test]
    fn conf_check_invalid() {
        let context = Context::fixture();
        let conf = json!({"default_queue": 42});
        let error = CloudQueueFactory.conf_check(&context, &conf).unwrap_err();
        assert!(error.is::<ConfError>());
    }

    #[tokio::test]
    async fn connect_resolves_default_queue() {
        let server = MockServer::start_async().await;
        let create = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/v1/queues/jobs")
                    .header("client-id", "worker-1")
                    .header("x-auth-token", "secret");
                then.status(201);
            })
            .await;
        let stats = server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/queues/jobs/stats");
                then.status(200)
                    .json_body(json!({"messages": {"claimed": 0, "free": 3, "total": 3}}));
            })
            .await;

        let context = Context::fixture();
        let conf = json!({
            "client_id": "worker-1",
            "default_queue": "jobs",
            "endpoint": server.url("/v1"),
            "token": "secret",
        });
        let args = QueueFactoryArgs {
            conf: &conf,
            context: &context,
        };
        let queue = CloudQueueFactory.connect(args).await.unwrap();
        let size = queue.size(&context, None).await.unwrap();
        assert_eq!(size, 3);
        create.assert_async().await;
        stats.assert_async().await;
    }
}
