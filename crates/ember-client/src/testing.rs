//! Test doubles shared by the crate's tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use ember_core::{ApiError, ApiResult, Method, RequestOptions, RestClient};
use parking_lot::Mutex;
use serde_json::Value;

use crate::client::Client;
use crate::config::ClientOptions;

/// One request seen by [`RecordingRest`].
#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub method: Method,
    pub route: String,
    pub options: RequestOptions,
}

/// A [`RestClient`] that records requests and replays canned responses.
///
/// Unmatched requests answer with `null`.
#[derive(Default)]
pub(crate) struct RecordingRest {
    requests: Mutex<Vec<Recorded>>,
    responses: Mutex<HashMap<(Method, String), VecDeque<ApiResult<Value>>>>,
}

impl RecordingRest {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues a response for the next `method route` request.
    pub fn respond(&self, method: Method, route: &str, body: Value) {
        self.responses
            .lock()
            .entry((method, route.to_string()))
            .or_default()
            .push_back(Ok(body));
    }

    /// Queues a failure for the next `method route` request.
    pub fn fail(&self, method: Method, route: &str, err: ApiError) {
        self.responses
            .lock()
            .entry((method, route.to_string()))
            .or_default()
            .push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().clone()
    }

    pub fn last(&self) -> Recorded {
        self.requests
            .lock()
            .last()
            .cloned()
            .expect("no request recorded")
    }
}

#[async_trait]
impl RestClient for RecordingRest {
    async fn request(
        &self,
        method: Method,
        route: &str,
        options: RequestOptions,
    ) -> ApiResult<Value> {
        self.requests.lock().push(Recorded {
            method,
            route: route.to_string(),
            options,
        });
        self.responses
            .lock()
            .get_mut(&(method, route.to_string()))
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(Value::Null))
    }
}

/// A client wired to a fresh [`RecordingRest`].
pub(crate) fn client() -> (Client, Arc<RecordingRest>) {
    client_with(ClientOptions::default())
}

pub(crate) fn client_with(options: ClientOptions) -> (Client, Arc<RecordingRest>) {
    let rest = RecordingRest::new();
    (Client::new(options, rest.clone()), rest)
}
