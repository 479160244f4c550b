use crate::error::{ReleaseError, Result};
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use reqwest::StatusCode;
use std::cell::RefCell;
use std::collections::VecDeque;

/// Mock transport for testing providers without a network.
///
/// Responses are returned in the order they were queued, whatever the
/// request. Every request is recorded so tests can assert on URLs, bodies and
/// on the absence of writes.
#[derive(Default)]
pub struct MockTransport {
    responses: RefCell<VecDeque<Result<HttpResponse>>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl MockTransport {
    /// Create a mock with no queued responses
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with a raw body
    pub fn reply(self, status: StatusCode, body: impl Into<String>) -> Self {
        self.responses
            .borrow_mut()
            .push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    /// Queue a response with a JSON body
    pub fn reply_json(self, status: StatusCode, body: serde_json::Value) -> Self {
        self.reply(status, body.to_string())
    }

    /// Queue a transport failure (no response at all)
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.responses
            .borrow_mut()
            .push_back(Err(ReleaseError::transport(message)));
        self
    }

    /// All requests sent so far
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    /// Number of requests sent so far
    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl HttpTransport for MockTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(request.clone());

        self.responses.borrow_mut().pop_front().unwrap_or_else(|| {
            Err(ReleaseError::transport(format!(
                "no mock response queued for {} {}",
                request.method, request.url
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{endpoint, Method};

    #[test]
    fn test_mock_replies_in_order() {
        let mock = MockTransport::new()
            .reply(StatusCode::NOT_FOUND, "")
            .reply(StatusCode::CREATED, "{}");
        let url = endpoint("https://example.com", ["a"]).unwrap();

        let first = mock.send(&HttpRequest::get(url.clone())).unwrap();
        let second = mock.send(&HttpRequest::post(url)).unwrap();

        assert_eq!(first.status, StatusCode::NOT_FOUND);
        assert_eq!(second.status, StatusCode::CREATED);
        assert_eq!(mock.request_count(), 2);
        assert_eq!(mock.requests()[1].method, Method::Post);
    }

    #[test]
    fn test_mock_without_responses_fails() {
        let mock = MockTransport::new();
        let url = endpoint("https://example.com", ["a"]).unwrap();
        let err = mock.send(&HttpRequest::get(url)).unwrap_err();
        assert!(err.to_string().contains("no mock response queued"));
    }

    #[test]
    fn test_mock_transport_failure() {
        let mock = MockTransport::new().fail("connection refused");
        let url = endpoint("https://example.com", ["a"]).unwrap();
        let err = mock.send(&HttpRequest::get(url)).unwrap_err();
        assert!(matches!(err, ReleaseError::Transport(_)));
    }
}
