//! HTTP transport abstraction for the hosted-API providers
//!
//! Providers build [HttpRequest] values and hand them to an [HttpTransport].
//! The concrete implementations are:
//!
//! - [client::ReqwestTransport]: blocking `reqwest` client used at runtime
//! - [mock::MockTransport]: canned responses for tests
//!
//! Calls are synchronous and are never retried. No timeout is configured
//! beyond what the underlying client does by default.

pub mod client;
pub mod mock;

pub use client::ReqwestTransport;
pub use mock::MockTransport;

use crate::error::{ReleaseError, Result};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// How a request authenticates against the vendor API
#[derive(Clone, PartialEq, Eq)]
pub enum HttpAuth {
    Basic { username: String, password: String },
    /// GitLab `PRIVATE-TOKEN` header
    PrivateToken(String),
}

impl fmt::Debug for HttpAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpAuth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            HttpAuth::PrivateToken(_) => f.debug_tuple("PrivateToken").field(&"<redacted>").finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub auth: Option<HttpAuth>,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    pub fn get(url: Url) -> Self {
        HttpRequest {
            method: Method::Get,
            url,
            auth: None,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: Url) -> Self {
        HttpRequest {
            method: Method::Post,
            ..HttpRequest::get(url)
        }
    }

    pub fn auth(mut self, auth: HttpAuth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        HttpResponse {
            status,
            body: body.into(),
        }
    }

    /// Deserialize the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Best-effort human message from an error body.
    ///
    /// Vendors put it under `message` (GitHub, GitLab), `error.message`
    /// (Bitbucket Cloud) or `errors[0].message` (Bitbucket Server); anything
    /// else is returned as the raw body.
    pub fn vendor_message(&self) -> String {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&self.body) {
            let message = value
                .get("message")
                .or_else(|| value.get("error").and_then(|e| e.get("message")))
                .or_else(|| value.pointer("/errors/0/message"));
            if let Some(serde_json::Value::String(message)) = message {
                return message.clone();
            }
        }

        if self.body.trim().is_empty() {
            self.status.to_string()
        } else {
            self.body.trim().to_string()
        }
    }
}

/// Sends a single request and returns the raw response.
///
/// Non-2xx statuses are not errors at this layer; providers interpret them.
/// Only a failure to get any response at all is an `Err`.
pub trait HttpTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

impl<T: HttpTransport + ?Sized> HttpTransport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        (**self).send(request)
    }
}

/// Append path segments to an API base URL, percent-encoding each segment.
///
/// A segment containing `/` is encoded as a single segment (`org%2Frepo`);
/// split it first when the slash is part of the path.
pub fn endpoint<'a>(base: &str, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| ReleaseError::config(format!("Invalid API base '{}': {}", base, e)))?;

    url.path_segments_mut()
        .map_err(|_| ReleaseError::config(format!("API base '{}' cannot be a base URL", base)))?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}
