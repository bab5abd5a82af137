//! In-process transport for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use futures_util::future::BoxFuture;

use crate::error::DeckTutorError;
use crate::rest::transport::{HttpRequest, HttpResponse, Transport};

type Handler = Box<dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync>;

/// Replies from a queue of canned responses, or from a handler, and records
/// every request it receives.
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<HttpResponse>>,
    handler: Option<Handler>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new(responses: Vec<HttpResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            handler: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_handler(
        handler: impl Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            handler: Some(Box::new(handler)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, DeckTutorError>> {
        let response = match &self.handler {
            Some(handler) => handler(&request),
            None => self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| HttpResponse::new(599, "script exhausted")),
        };
        self.requests.lock().unwrap().push(request);
        Box::pin(async move { Ok(response) })
    }
}
