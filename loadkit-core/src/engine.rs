//! Boundary to the external load-generation engine.
//!
//! Workloads never talk to the network themselves: they describe requests and
//! hand them to an [`HttpEngine`], which the engine (or a test double)
//! implements. Scheduling, pacing and the HTTP client live on the other side.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
    pub tags: Vec<(String, String)>,
}

impl Request {
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            headers: Vec::new(),
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    #[must_use]
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::Put, url)
    }

    #[must_use]
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    /// Sets a JSON body and the matching `Content-Type` header.
    #[must_use]
    pub fn json(mut self, body: &serde_json::Value) -> Self {
        self.body = Some(body.to_string());
        self.with_header("Content-Type", "application/json")
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.push((key.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timings {
    /// Total time for the request.
    pub duration: Duration,
    /// Time spent establishing the TCP connection.
    pub connecting: Duration,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub status: u16,
    pub timings: Timings,
    pub body: Vec<u8>,
}

impl Response {
    #[must_use]
    pub fn new(status: u16, duration: Duration) -> Self {
        Self {
            status,
            timings: Timings {
                duration,
                connecting: Duration::ZERO,
            },
            body: Vec::new(),
        }
    }
}

/// HTTP and pacing primitives supplied by the engine.
pub trait HttpEngine {
    /// Issues one request and blocks the calling VU until it completes.
    fn send(&self, request: &Request) -> Response;

    /// Issues requests together and waits for all of them.
    ///
    /// Responses are returned in request order.
    fn batch(&self, requests: &[Request]) -> Vec<Response> {
        requests.iter().map(|r| self.send(r)).collect()
    }

    /// Think time between iterations.
    fn sleep(&self, duration: Duration);
}

pub(crate) fn millis_f64(d: Duration) -> f64 {
    d.as_secs_f64() * 1_000.0
}
