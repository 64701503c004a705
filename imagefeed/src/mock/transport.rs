//! Test mock for the HTTP transport
use std::{
    collections::{HashMap, VecDeque},
    fs,
    path::Path,
    sync::{Arc, Mutex},
};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::{
    error::{NetworkError, Result},
    http::{ApiRequest, HttpMethod, HttpTransport},
};

type Route = (HttpMethod, String);

/// Answers requests from per-route queues of scripted responses and records
/// every request it sees. Unscripted routes answer 404.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    responses: HashMap<Route, VecDeque<std::result::Result<Value, NetworkError>>>,
    requests: Vec<ApiRequest>,
    gate: Option<Arc<Semaphore>>,
    route_gates: HashMap<Route, Arc<Semaphore>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push_response(&self, method: HttpMethod, path: &str, body: Value) {
        self.push(method, path, Ok(body));
    }

    pub fn push_error(&self, method: HttpMethod, path: &str, error: NetworkError) {
        self.push(method, path, Err(error));
    }

    pub fn set_response_from_file(&self, method: HttpMethod, path: &str, file: &Path) -> Result<()> {
        let body: Value = serde_json::from_str(&fs::read_to_string(file)?)?;
        self.push_response(method, path, body);
        Ok(())
    }

    /// From now on every request waits for a permit of the returned
    /// semaphore before it is answered. The request is recorded before it
    /// starts waiting.
    pub fn hold(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.inner.lock().unwrap().gate = Some(gate.clone());
        gate
    }

    /// Like [`hold`](Self::hold) but only for requests to `method path`.
    pub fn hold_route(&self, method: HttpMethod, path: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.inner
            .lock()
            .unwrap()
            .route_gates
            .insert((method, path.to_string()), gate.clone());
        gate
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, method: HttpMethod, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.url.path() == path)
            .collect()
    }

    fn push(&self, method: HttpMethod, path: &str, response: std::result::Result<Value, NetworkError>) {
        self.inner
            .lock()
            .unwrap()
            .responses
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
    }
}

impl HttpTransport for MockTransport {
    async fn request<T>(&self, request: ApiRequest) -> std::result::Result<T, NetworkError>
    where
        T: DeserializeOwned + Send,
    {
        let route = (request.method, request.url.path().to_string());
        let gate = {
            let mut inner = self.inner.lock().unwrap();
            inner.requests.push(request);
            inner
                .gate
                .clone()
                .or_else(|| inner.route_gates.get(&route).cloned())
        };
        if let Some(gate) = gate {
            gate.acquire()
                .await
                .map_err(|e| NetworkError::Transport(e.to_string()))?
                .forget();
        }

        let response = self
            .inner
            .lock()
            .unwrap()
            .responses
            .get_mut(&route)
            .and_then(VecDeque::pop_front);
        match response {
            Some(Ok(body)) => {
                serde_json::from_value(body).map_err(|e| NetworkError::Decoding(e.to_string()))
            }
            Some(Err(e)) => Err(e),
            None => Err(NetworkError::HttpStatus(404)),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use url::Url;

    use super::*;

    fn get(path: &str) -> ApiRequest {
        ApiRequest::get(Url::parse("https://api.test").unwrap().join(path).unwrap())
    }

    #[tokio::test]
    async fn test_scripted_responses_are_consumed_in_order() {
        let transport = MockTransport::new();
        transport.push_response(HttpMethod::Get, "/a", json!(1));
        transport.push_response(HttpMethod::Get, "/a", json!(2));

        assert_eq!(transport.request::<i32>(get("a")).await, Ok(1));
        assert_eq!(transport.request::<i32>(get("a")).await, Ok(2));
        assert_eq!(
            transport.request::<i32>(get("a")).await,
            Err(NetworkError::HttpStatus(404))
        );
        assert_eq!(transport.requests_to(HttpMethod::Get, "/a").len(), 3);
    }

    #[tokio::test]
    async fn test_hold_delays_answer() {
        let transport = MockTransport::new();
        transport.push_response(HttpMethod::Get, "/a", json!("done"));
        let gate = transport.hold();

        let pending = tokio::spawn({
            let transport = transport.clone();
            async move { transport.request::<String>(get("a")).await }
        });
        while transport.requests().is_empty() {
            tokio::task::yield_now().await;
        }
        assert!(!pending.is_finished());

        gate.add_permits(1);
        assert_eq!(pending.await.unwrap(), Ok("done".to_string()));
    }

    #[tokio::test]
    async fn test_hold_route_only_delays_that_route() {
        let transport = MockTransport::new();
        transport.push_response(HttpMethod::Get, "/a", json!("held"));
        transport.push_response(HttpMethod::Get, "/b", json!("free"));
        let gate = transport.hold_route(HttpMethod::Get, "/a");

        let pending = tokio::spawn({
            let transport = transport.clone();
            async move { transport.request::<String>(get("a")).await }
        });
        while transport.requests().is_empty() {
            tokio::task::yield_now().await;
        }

        assert_eq!(transport.request::<String>(get("b")).await, Ok("free".to_string()));
        assert!(!pending.is_finished());
        gate.add_permits(1);
        assert_eq!(pending.await.unwrap(), Ok("held".to_string()));
    }
}
