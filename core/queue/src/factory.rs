//! Interface to initialise queue backends from user provided configuration.
use anyhow::Result;
use serde_json::Value as Json;

use cloudqueue_context::Context;

use crate::queue::Queue;

/// Initialisation logic for queue backends and the client to access the service.
#[async_trait::async_trait]
pub trait QueueFactory: Send + Sync {
    /// Validate the user provided configuration for the backend.
    fn conf_check(&self, context: &Context, conf: &Json) -> Result<()>;

    /// Initialise a [`Queue`] instance to push and pop jobs.
    async fn connect<'a>(&self, args: QueueFactoryArgs<'a>) -> Result<Queue>;

    /// Register backend specific metrics.
    fn register_metrics(&self, registry: &prometheus::Registry) -> Result<()>;
}

/// Arguments passed to the [`QueueFactory`] client initialisation methods.
pub struct QueueFactoryArgs<'a> {
    /// The configuration block for the backend to initialise.
    pub conf: &'a Json,

    /// Container for operation scoped values.
    pub context: &'a Context,
}
