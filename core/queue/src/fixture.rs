//! In-memory queue backend to test code that pushes or pops jobs.
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use serde_json::Value as Json;

use cloudqueue_context::Context;

use crate::conf::PushOptions;
use crate::error::UnsupportedOperation;
use crate::job::JobBackend;
use crate::job::ReceivedJob;
use crate::job::ReleaseBehaviour;
use crate::queue::Queue;
use crate::queue::QueueBackend;

/// Name of the queue used when operations do not specify one.
pub const FIXTURE_DEFAULT_QUEUE: &str = "default";

/// Introspection tools for jobs pushed and popped during unit tests.
#[derive(Clone, Default)]
pub struct QueueFixture {
    state: Arc<Mutex<FixtureState>>,
}

impl QueueFixture {
    /// Number of jobs popped but not yet deleted or released.
    pub fn claimed(&self) -> usize {
        self.state
            .lock()
            .expect("queue fixture lock poisoned")
            .claimed
            .len()
    }

    /// Initialise an empty queue backend fixture for unit tests.
    pub fn new() -> QueueFixture {
        QueueFixture::default()
    }

    /// Create a [`Queue`] that operates on this fixture.
    pub fn queue(&self) -> Queue {
        let backend = QueueFixtureBackend {
            state: Arc::clone(&self.state),
        };
        Queue::from(backend)
    }

    /// Time-to-live options of messages waiting on a queue, in queue order.
    pub fn ttls(&self, queue: &str) -> Vec<Option<u64>> {
        self.state
            .lock()
            .expect("queue fixture lock poisoned")
            .queues
            .get(queue)
            .map(|messages| messages.iter().map(|message| message.ttl).collect())
            .unwrap_or_default()
    }
}

/// Queue backend for unit tests.
pub struct QueueFixtureBackend {
    state: Arc<Mutex<FixtureState>>,
}

#[async_trait::async_trait]
impl QueueBackend for QueueFixtureBackend {
    async fn later(
        &self,
        _: &Context,
        _: Duration,
        _: &str,
        _: Json,
        _: Option<&str>,
    ) -> Result<bool> {
        anyhow::bail!(UnsupportedOperation::new("fixture", "later"))
    }

    async fn pop(&self, _: &Context, queue: Option<&str>) -> Result<Option<ReceivedJob>> {
        let queue = resolve(queue);
        let mut state = self.state.lock().expect("queue fixture lock poisoned");
        let message = match state.queues.get_mut(queue).and_then(VecDeque::pop_front) {
            None => return Ok(None),
            Some(message) => message,
        };
        state.claimed.insert(message.id.clone(), message.clone());
        let job = FixtureJob {
            message,
            state: Arc::clone(&self.state),
        };
        Ok(Some(ReceivedJob::from(job)))
    }

    async fn push_raw(
        &self,
        _: &Context,
        payload: &str,
        queue: Option<&str>,
        options: PushOptions,
    ) -> Result<bool> {
        let queue = resolve(queue).to_string();
        let mut state = self.state.lock().expect("queue fixture lock poisoned");
        state.next_id += 1;
        let message = FixtureMessage {
            body: payload.to_string(),
            id: state.next_id.to_string(),
            queue: queue.clone(),
            ttl: options.ttl,
        };
        state.queues.entry(queue).or_default().push_back(message);
        Ok(true)
    }

    async fn size(&self, _: &Context, queue: Option<&str>) -> Result<u64> {
        let queue = resolve(queue);
        let state = self.state.lock().expect("queue fixture lock poisoned");
        let size = state.queues.get(queue).map(VecDeque::len).unwrap_or(0);
        Ok(size as u64)
    }
}

/// Job popped from the fixture backend.
pub struct FixtureJob {
    message: FixtureMessage,
    state: Arc<Mutex<FixtureState>>,
}

#[async_trait::async_trait]
impl JobBackend for FixtureJob {
    fn attempts(&self) -> u32 {
        1
    }

    async fn delete(&self, _: &Context) -> Result<()> {
        let mut state = self.state.lock().expect("queue fixture lock poisoned");
        state.claimed.remove(&self.message.id);
        Ok(())
    }

    fn job_id(&self) -> &str {
        &self.message.id
    }

    fn queue(&self) -> &str {
        &self.message.queue
    }

    fn raw_body(&self) -> &str {
        &self.message.body
    }

    async fn release(&self, _: &Context, _: Duration) -> Result<()> {
        let mut state = self.state.lock().expect("queue fixture lock poisoned");
        if let Some(message) = state.claimed.remove(&self.message.id) {
            let queue = message.queue.clone();
            state.queues.entry(queue).or_default().push_front(message);
        }
        Ok(())
    }

    fn release_behaviour(&self) -> ReleaseBehaviour {
        ReleaseBehaviour::Requeue
    }
}

/// Internal state to implement queue mocking.
#[derive(Default)]
struct FixtureState {
    claimed: HashMap<String, FixtureMessage>,
    next_id: u64,
    queues: HashMap<String, VecDeque<FixtureMessage>>,
}

#[derive(Clone, Debug)]
struct FixtureMessage {
    body: String,
    id: String,
    queue: String,
    ttl: Option<u64>,
}

fn resolve(queue: Option<&str>) -> &str {
    match queue {
        None | Some("") => FIXTURE_DEFAULT_QUEUE,
        Some(queue) => queue,
    }
}
