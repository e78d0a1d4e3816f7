//! Mock client implementation for unit tests.
//!
//! The mock records every call made to the service so tests can assert on interactions.
use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::Result;

use crate::ClaimOptions;
use crate::ClaimedMessage;
use crate::IQueueHandle;
use crate::IQueueService;
use crate::QueueHandle;
use crate::QueuePayload;
use crate::QueueStats;

/// Failure injected into the mock service.
#[derive(Debug, thiserror::Error)]
#[error("mock service failure injected for operation '{0}'")]
pub struct MockFailure(pub &'static str);

/// Record of a call received by the mock service.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Call {
    ClaimMessages {
        queue: String,
        options: ClaimOptions,
    },
    CreateMessage {
        queue: String,
        payload: QueuePayload,
    },
    CreateQueue(String),
    DeleteClaimedMessage {
        queue: String,
        id: String,
        claim_id: Option<String>,
    },
    DeleteMessages {
        queue: String,
        ids: Vec<String>,
    },
    Stats(String),
}

/// Operations of the mock service that can be made to fail.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MockOp {
    ClaimMessages,
    CreateMessage,
    CreateQueue,
    DeleteClaimedMessage,
    DeleteMessages,
    Stats,
}

impl MockOp {
    fn name(self) -> &'static str {
        match self {
            MockOp::ClaimMessages => "claim_messages",
            MockOp::CreateMessage => "create_message",
            MockOp::CreateQueue => "create_queue",
            MockOp::DeleteClaimedMessage => "delete_claimed_message",
            MockOp::DeleteMessages => "delete_messages",
            MockOp::Stats => "stats",
        }
    }
}

/// Mock Cloud Queues service for unit tests.
#[derive(Clone, Default)]
pub struct MockService {
    state: Arc<Mutex<MockState>>,
}

impl MockService {
    /// List of calls received by the service so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Forget about calls received so far.
    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Make all future calls to an operation fail.
    pub fn fail(&self, op: MockOp) {
        self.state.lock().unwrap().failing.insert(op);
    }

    /// Initialise an empty mock service.
    pub fn new() -> MockService {
        MockService::default()
    }

    /// Make a message available for claiming on a queue.
    pub fn push_claimable<S>(&self, queue: S, message: ClaimedMessage)
    where
        S: Into<String>,
    {
        self.state
            .lock()
            .unwrap()
            .claimable
            .entry(queue.into())
            .or_default()
            .push_back(message);
    }

    /// Set the statistics returned for a queue.
    ///
    /// Queues without statistics return none.
    pub fn set_stats<S>(&self, queue: S, stats: QueueStats)
    where
        S: Into<String>,
    {
        self.state.lock().unwrap().stats.insert(queue.into(), stats);
    }
}

#[async_trait::async_trait]
impl IQueueService for MockService {
    async fn create_queue(&self, name: &str) -> Result<QueueHandle> {
        self.state
            .lock()
            .unwrap()
            .record(MockOp::CreateQueue, Call::CreateQueue(name.to_string()))?;
        let queue = MockQueue {
            name: name.to_string(),
            state: Arc::clone(&self.state),
        };
        Ok(QueueHandle::from(queue))
    }
}

/// Handle to a queue of the [`MockService`].
pub struct MockQueue {
    name: String,
    state: Arc<Mutex<MockState>>,
}

#[async_trait::async_trait]
impl IQueueHandle for MockQueue {
    async fn claim_messages(&self, options: ClaimOptions) -> Result<Vec<ClaimedMessage>> {
        let mut state = self.state.lock().unwrap();
        let call = Call::ClaimMessages {
            queue: self.name.clone(),
            options,
        };
        state.record(MockOp::ClaimMessages, call)?;
        let messages = match state.claimable.get_mut(&self.name) {
            None => Vec::new(),
            Some(queue) => {
                let count = std::cmp::min(queue.len(), usize::from(options.limit));
                queue.drain(..count).collect()
            }
        };
        Ok(messages)
    }

    async fn create_message(&self, payload: QueuePayload) -> Result<bool> {
        let call = Call::CreateMessage {
            queue: self.name.clone(),
            payload,
        };
        self.state
            .lock()
            .unwrap()
            .record(MockOp::CreateMessage, call)?;
        Ok(true)
    }

    async fn delete_claimed_message(&self, id: &str, claim_id: Option<&str>) -> Result<()> {
        let call = Call::DeleteClaimedMessage {
            queue: self.name.clone(),
            id: id.to_string(),
            claim_id: claim_id.map(String::from),
        };
        self.state
            .lock()
            .unwrap()
            .record(MockOp::DeleteClaimedMessage, call)
    }

    async fn delete_messages(&self, ids: &[String]) -> Result<()> {
        let call = Call::DeleteMessages {
            queue: self.name.clone(),
            ids: ids.to_vec(),
        };
        self.state
            .lock()
            .unwrap()
            .record(MockOp::DeleteMessages, call)
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn stats(&self) -> Result<Option<QueueStats>> {
        let mut state = self.state.lock().unwrap();
        state.record(MockOp::Stats, Call::Stats(self.name.clone()))?;
        Ok(state.stats.get(&self.name).copied())
    }
}

/// Internal state to implement service mocking.
#[derive(Default)]
struct MockState {
    calls: Vec<Call>,
    claimable: HashMap<String, VecDeque<ClaimedMessage>>,
    failing: HashSet<MockOp>,
    stats: HashMap<String, QueueStats>,
}

impl MockState {
    /// Record a call and fail it if the operation was set to fail.
    fn record(&mut self, op: MockOp, call: Call) -> Result<()> {
        self.calls.push(call);
        if self.failing.contains(&op) {
            anyhow::bail!(MockFailure(op.name()));
        }
        Ok(())
    }
}
