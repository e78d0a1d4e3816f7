//! Job queue backend storing jobs as messages on a Cloud Queues service.
//!
//! Jobs are pushed as messages with a time-to-live and popped by claiming one message at a time.
//! Cloud Queues can't delay messages or count delivery attempts so:
//!
//! - Delayed pushes (`later`) are rejected with an `UnsupportedOperation` error.
//! - Releasing a job ends its claim by deleting it rather than putting it back on the queue.
mod adapter;
mod conf;
mod factory;
mod job;
mod telemetry;


pub use self::adapter::CloudQueue;
pub use self::adapter::CLAIM_GRACE;
pub use self::adapter::CLAIM_LIMIT;
pub use self::adapter::CLAIM_TTL;
pub use self::adapter::DEFAULT_MESSAGE_TTL;
pub use self::conf::Conf;
pub use self::conf::Timeouts;
pub use self::factory::CloudQueueFactory;
pub use self::factory::ConfError;
pub use self::job::CloudQueueJob;
pub use self::telemetry::register_metrics;
