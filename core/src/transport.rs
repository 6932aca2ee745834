//! Executes `HttpRequest` values against the network.
//!
//! `Transport` is the single I/O seam of the crate. `UreqTransport` is the
//! production implementation; tests substitute scripted or recording
//! transports. Status codes are never treated as errors here: 4xx/5xx come
//! back as `HttpResponse` data for the response interceptor to classify.

use std::time::Duration;

use thiserror::Error;

use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Transport-level failures, before any HTTP status is known.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request went out but no response came back (refused, timeout,
    /// reset, DNS failure).
    #[error("no response received: {0}")]
    NoResponse(String),

    /// The request could not be constructed (bad URL, invalid header).
    #[error("request could not be built: {0}")]
    InvalidRequest(String),
}

pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by a shared `ureq::Agent`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn classify(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::BadUri(msg) => TransportError::InvalidRequest(msg),
        ureq::Error::Http(e) => TransportError::InvalidRequest(e.to_string()),
        other => TransportError::NoResponse(other.to_string()),
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.path.as_str();
        let headers = request.headers.as_slice();
        let body = request.body.as_ref().map(|b| b.to_bytes());

        let result = match (request.method, body) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(url), headers).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(url), headers).call(),
            (HttpMethod::Post, Some(bytes)) => with_headers(self.agent.post(url), headers).send(&bytes[..]),
            (HttpMethod::Post, None) => with_headers(self.agent.post(url), headers).send_empty(),
            (HttpMethod::Put, Some(bytes)) => with_headers(self.agent.put(url), headers).send(&bytes[..]),
            (HttpMethod::Put, None) => with_headers(self.agent.put(url), headers).send_empty(),
            (HttpMethod::Patch, Some(bytes)) => with_headers(self.agent.patch(url), headers).send(&bytes[..]),
            (HttpMethod::Patch, None) => with_headers(self.agent.patch(url), headers).send_empty(),
        };
        let mut response = result.map_err(classify)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError::NoResponse(format!("failed to read body: {e}")))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Transport fakes for unit tests.
#[cfg(test)]
pub(crate) mod fake {
    use std::sync::Mutex;

    use super::{Transport, TransportError};
    use crate::http::{HttpRequest, HttpResponse};

    type Handler = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync>;

    /// Answers every request with `handler` and records what was sent.
    pub(crate) struct RecordingTransport {
        handler: Handler,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingTransport {
        pub(crate) fn new(
            handler: impl Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                handler: Box::new(handler),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Always answer `status` with `body`.
        pub(crate) fn fixed(status: u16, body: &str) -> Self {
            let body = body.to_string();
            Self::new(move |_| Ok(response(status, &body)))
        }

        pub(crate) fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub(crate) fn count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl Transport for RecordingTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            (self.handler)(request)
        }
    }

    pub(crate) fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }
}
