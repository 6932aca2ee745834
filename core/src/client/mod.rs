//! Stateless HTTP request builder and response parser for the testimonial API.
//!
//! # Design
//! `TestimonialClient` holds only a `base_url` and carries no mutable state
//! between calls. Each REST operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. The caller executes the round-trip, which keeps this
//! layer deterministic; `ApiClient` is the caller that adds interceptors
//! and a transport.
//!
//! Every `parse_*` asserts the status the operation documents (201 for
//! create, 204 for delete, 200 otherwise).

mod auth;
mod category;
mod organization;
mod testimonial;
mod user;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};

/// Path prefix every endpoint of the service lives under.
pub const API_PREFIX: &str = "/app";

/// Synchronous, stateless client for the testimonial API.
#[derive(Debug, Clone)]
pub struct TestimonialClient {
    base_url: String,
}

impl TestimonialClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{API_PREFIX}{path}", self.base_url)
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest {
            method,
            path: self.url(path),
            headers: Vec::new(),
            body: None,
        }
    }

    fn json_request<T: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        input: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            method,
            path: self.url(path),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(RequestBody::Json(body)),
        })
    }
}

/// Map a response whose status is not `expected` to the matching error.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    if response.is_success() {
        return Err(ApiError::UnexpectedStatus {
            status: response.status,
            expected,
            body: response.body.clone(),
        });
    }
    Err(ApiError::from_response(response))
}

fn looks_like_html(body: &str) -> bool {
    let head = body.trim_start();
    head.get(..15)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("<!doctype html>"))
        || head.starts_with("<html")
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse, expected: u16) -> Result<T, ApiError> {
    check_status(&response, expected)?;
    if looks_like_html(&response.body) {
        return Err(ApiError::HtmlResponse {
            status: response.status,
        });
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

fn parse_empty(response: HttpResponse, expected: u16) -> Result<(), ApiError> {
    check_status(&response, expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = TestimonialClient::new("http://localhost:3000/");
        let req = client.build_list_categories();
        assert_eq!(req.path, "http://localhost:3000/app/categorias/");
    }

    #[test]
    fn mismatched_success_status_is_unexpected() {
        let err = parse_json::<Category>(response(200, "{}"), 201).unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedStatus { status: 200, expected: 201, .. }));
    }

    #[test]
    fn html_body_is_rejected() {
        let err = parse_json::<Vec<Category>>(response(200, "<!DOCTYPE html><html></html>"), 200).unwrap_err();
        assert!(matches!(err, ApiError::HtmlResponse { status: 200 }));
    }

    #[test]
    fn bad_json_is_a_deserialization_error() {
        let err = parse_json::<Vec<Category>>(response(200, "not json"), 200).unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn error_status_keeps_server_message() {
        let err = parse_empty(response(403, r#"{"detail":"forbidden"}"#), 204).unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 403, ref message, .. } if message == "forbidden"));
    }
}
