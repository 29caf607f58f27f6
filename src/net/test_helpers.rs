//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::transport::{ApiRequest, ApiResponse, Transport, TransportError};
use super::SurveyApi;

/// One scripted reaction to an incoming request.
pub enum MockReply {
    Respond(ApiResponse),
    Fail(TransportError),
    /// Never completes; only a dropped future ends it.
    Hang,
    /// Waits for the notify before responding.
    Gated(Arc<Notify>, ApiResponse),
}

/// Transport that replays queued replies in order and records every request.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, reply: MockReply) -> &Self {
        self.replies.lock().expect("mock mutex should lock").push_back(reply);
        self
    }

    pub fn respond(&self, response: ApiResponse) -> &Self {
        self.push(MockReply::Respond(response))
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().expect("mock mutex should lock").clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("mock mutex should lock").len()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().expect("mock mutex should lock").push(request);
        let reply = self.replies.lock().expect("mock mutex should lock").pop_front();
        match reply {
            Some(MockReply::Respond(response)) => Ok(response),
            Some(MockReply::Fail(err)) => Err(err),
            Some(MockReply::Hang) => std::future::pending().await,
            Some(MockReply::Gated(gate, response)) => {
                gate.notified().await;
                Ok(response)
            }
            None => Err(TransportError::Request("no mock reply queued".into())),
        }
    }
}

/// Wrap a mock transport in the typed API.
pub fn api_over(transport: &Arc<MockTransport>) -> SurveyApi {
    SurveyApi::new(Arc::clone(transport) as Arc<dyn Transport>)
}

fn reason_for(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        _ => "",
    }
}

/// Response with a JSON body.
pub fn json(status: u16, body: serde_json::Value) -> ApiResponse {
    ApiResponse { status, reason: reason_for(status).to_owned(), body: body.to_string() }
}

/// Response with a raw text body.
pub fn text(status: u16, body: &str) -> ApiResponse {
    ApiResponse { status, reason: reason_for(status).to_owned(), body: body.to_owned() }
}
