//! Backend agnostic job queues for applications that push work and process it elsewhere.
//!
//! Queue management is divided into two halves:
//!
//! - Job submission: serialize a job descriptor and its data and push it onto a named queue.
//! - Job retrieval: pop one job at a time, read its payload and delete or release it.
//!
//! The objective of these two halves is to abstract away the message queue service that
//! actually stores and distributes jobs so applications are unaware of the backend in use.
pub mod conf;
pub mod error;
pub mod factory;
pub mod job;
pub mod payload;
pub mod queue;

mod telemetry;
pub use self::telemetry::register_metrics;

#[cfg(any(test, feature = "test-fixture"))]
pub mod fixture;

pub use self::conf::PushOptions;
pub use self::job::JobBackend;
pub use self::job::ReceivedJob;
pub use self::job::ReleaseBehaviour;
pub use self::queue::Queue;
pub use self::queue::QueueBackend;
