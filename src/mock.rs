use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Instant,
};

use bytes::Bytes;
use serde::Serialize;
use sonic_rs::to_vec;

use super::adapter::{
    JsonBytes, PostError, PostFuture, PostRequest, PostResponse, PostResult, PostTransport,
};

/// What the mock does with the next request. A transport failure can be
/// injected at either point the real wire can fail: before anything is
/// written, or while the reply body is being read.
#[derive(Clone, Debug, Default)]
pub enum MockBehavior {
    #[default]
    Pass,
    ConnectError {
        reason: String,
    },
    ReceiveError {
        reason: String,
    },
}

impl MockBehavior {
    pub fn pass() -> Self {
        Self::Pass
    }

    pub fn connect_error(reason: impl Into<String>) -> Self {
        Self::ConnectError {
            reason: reason.into(),
        }
    }

    pub fn receive_error(reason: impl Into<String>) -> Self {
        Self::ReceiveError {
            reason: reason.into(),
        }
    }
}

/// Ordered behaviors for upcoming requests; an empty plan means every
/// request passes through to the reply queues.
#[derive(Clone, Debug, Default)]
pub struct MockPlan {
    queue: VecDeque<MockBehavior>,
}

impl MockPlan {
    pub fn push(&mut self, behavior: MockBehavior) -> &mut Self {
        self.queue.push_back(behavior);
        self
    }

    fn pop(&mut self) -> MockBehavior {
        self.queue.pop_front().unwrap_or_default()
    }
}

#[derive(Clone, Debug)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, JsonBytes)>,
    pub body: JsonBytes,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<JsonBytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, body.into())
    }

    pub fn json<T: Serialize>(status: u16, payload: &T) -> PostResult<Self> {
        let body = to_vec(payload).map_err(PostError::from_json)?;
        Ok(Self::new(status, body))
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<JsonBytes>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}

/// Point-in-time view of the mock for assertions.
#[derive(Clone, Debug)]
pub struct MockSnapshot {
    pub request_count: usize,
    pub last_url: Option<String>,
    pub last_status: Option<u16>,
    pub last_error: Option<String>,
    pub response_queue_len: usize,
}

#[derive(Debug, Default)]
struct MockTransportState {
    request_count: usize,
    last_url: Option<String>,
    last_status: Option<u16>,
    last_error: Option<String>,
    plan: MockPlan,
    default_response_queue: VecDeque<MockResponse>,
    url_response_queues: HashMap<String, VecDeque<MockResponse>>,
    outbound_log: Vec<PostRequest>,
}

impl MockTransportState {
    fn snapshot(&self) -> MockSnapshot {
        MockSnapshot {
            request_count: self.request_count,
            last_url: self.last_url.clone(),
            last_status: self.last_status,
            last_error: self.last_error.clone(),
            response_queue_len: self.default_response_queue.len()
                + self
                    .url_response_queues
                    .values()
                    .map(VecDeque::len)
                    .sum::<usize>(),
        }
    }
}

/// In-memory transport: replies are queued per URL (with a shared default
/// queue behind them), failures come from a [`MockPlan`], and every outbound
/// request is logged so tests can inspect exactly what would have hit the
/// wire. An exhausted queue serves 200 with an empty body.
#[derive(Clone, Debug)]
pub struct MockTransport {
    state: Arc<Mutex<MockTransportState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockTransportState::default())),
        }
    }

    pub fn with_plan(plan: MockPlan) -> Self {
        let transport = Self::new();
        transport
            .state
            .lock()
            .expect("signup mock mutex poisoned while installing plan")
            .plan = plan;
        transport
    }

    pub fn snapshot(&self) -> MockSnapshot {
        self.state
            .lock()
            .expect("signup mock mutex poisoned while taking snapshot")
            .snapshot()
    }

    pub fn queue_response(&self, response: MockResponse) {
        self.state
            .lock()
            .expect("signup mock mutex poisoned while queueing response")
            .default_response_queue
            .push_back(response);
    }

    pub fn queue_response_for(&self, url: impl Into<String>, response: MockResponse) {
        self.state
            .lock()
            .expect("signup mock mutex poisoned while queueing response by url")
            .url_response_queues
            .entry(url.into())
            .or_default()
            .push_back(response);
    }

    /// Requests seen so far, oldest first.
    pub fn outbound(&self) -> Vec<PostRequest> {
        self.state
            .lock()
            .expect("signup mock mutex poisoned while reading outbound log")
            .outbound_log
            .clone()
    }

    pub fn outbound_count(&self) -> usize {
        self.state
            .lock()
            .expect("signup mock mutex poisoned while reading outbound count")
            .outbound_log
            .len()
    }

    pub fn clear_log(&self) {
        self.state
            .lock()
            .expect("signup mock mutex poisoned while clearing log")
            .outbound_log
            .clear();
    }

    fn fail(&self, reason: String) -> PostError {
        let mut state = self
            .state
            .lock()
            .expect("signup mock mutex poisoned while recording error");
        state.last_error = Some(reason.clone());
        PostError::transport(reason)
    }

    fn next_response(&self, url: &str) -> Option<MockResponse> {
        let mut state = self
            .state
            .lock()
            .expect("signup mock mutex poisoned while selecting response");
        if let Some(queue) = state.url_response_queues.get_mut(url) {
            if let Some(response) = queue.pop_front() {
                return Some(response);
            }
        }
        state.default_response_queue.pop_front()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl PostTransport for MockTransport {
    fn execute(&self, request: PostRequest) -> PostFuture<PostResult<PostResponse>> {
        let transport = self.clone();
        Box::pin(async move {
            let start = Instant::now();
            let behavior = {
                let mut state = transport
                    .state
                    .lock()
                    .expect("signup mock mutex poisoned while accepting request");
                state.request_count += 1;
                state.last_url = Some(request.url.clone());
                state.last_error = None;
                state.outbound_log.push(request.clone());
                state.plan.pop()
            };

            match behavior {
                MockBehavior::ConnectError { reason } | MockBehavior::ReceiveError { reason } => {
                    return Err(transport.fail(reason));
                }
                MockBehavior::Pass => {}
            }

            let (status, headers, body) = match transport.next_response(&request.url) {
                Some(response) => (response.status, response.headers, response.body),
                None => (200, Vec::new(), Bytes::new()),
            };

            let mut state = transport
                .state
                .lock()
                .expect("signup mock mutex poisoned while recording reply");
            state.last_status = Some(status);
            drop(state);

            Ok(PostResponse {
                status,
                headers,
                body,
                elapsed: start.elapsed(),
            })
        })
    }
}
