//! Cross-cutting behavior applied to every request sent by `ApiClient`.
//!
//! The request side attaches the persisted access token; the response side
//! classifies outcomes, logs them and normalizes failures into `ApiError`.
//! Neither side ever swallows a failure: the request interceptor degrades to
//! an unauthenticated request, the response interceptor always hands the
//! caller an `Err`.

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::session::{SessionStorage, AUTH_STORAGE_KEY};
use crate::transport::TransportError;

/// Authorization scheme expected by the service (not `Bearer`).
pub const AUTH_SCHEME: &str = "JWT";

pub const AUTHORIZATION: &str = "authorization";

/// Outcome of looking up the persisted token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenLookup {
    Present(String),
    /// No blob stored under `AUTH_STORAGE_KEY`.
    Missing,
    /// A blob exists but holds no usable token.
    Invalid,
    /// The blob or the storage could not be read.
    Unreadable(String),
}

/// Read the access token from the persisted session blob.
///
/// The blob is read leniently as JSON so that an unknown role or an extra
/// field never hides a valid token.
pub fn read_token(storage: &dyn SessionStorage) -> TokenLookup {
    let raw = match storage.get(AUTH_STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return TokenLookup::Missing,
        Err(e) => return TokenLookup::Unreadable(e.to_string()),
    };
    let blob: serde_json::Value = match serde_json::from_str(&raw) {
        Ok(blob) => blob,
        Err(e) => return TokenLookup::Unreadable(e.to_string()),
    };
    match blob
        .get("state")
        .and_then(|state| state.get("token"))
        .and_then(|token| token.as_str())
    {
        Some(token) if !token.is_empty() && token != "undefined" => {
            TokenLookup::Present(token.to_string())
        }
        _ => TokenLookup::Invalid,
    }
}

/// Format the authorization header value for `token`.
pub fn authorization_value(token: &str) -> String {
    format!("{AUTH_SCHEME} {token}")
}

fn token_preview(token: &str) -> String {
    let prefix: String = token.chars().take(5).collect();
    format!("{prefix}...")
}

/// Attach the persisted token to `request`.
///
/// A request that already carries an authorization header keeps it. Any
/// problem reading the token is logged and the request proceeds without
/// credentials.
pub fn attach_token(request: &mut HttpRequest, storage: &dyn SessionStorage) {
    if request.header(AUTHORIZATION).is_none() {
        match read_token(storage) {
            TokenLookup::Present(token) => {
                tracing::debug!(token = %token_preview(&token), "attached {AUTH_SCHEME} token");
                request.set_header(AUTHORIZATION, authorization_value(&token));
            }
            TokenLookup::Missing => tracing::warn!("no {AUTH_STORAGE_KEY} entry, sending unauthenticated"),
            TokenLookup::Invalid => tracing::warn!("invalid token in {AUTH_STORAGE_KEY}, sending unauthenticated"),
            TokenLookup::Unreadable(reason) => {
                tracing::error!(%reason, "could not read {AUTH_STORAGE_KEY}, sending unauthenticated")
            }
        }
    }
    tracing::debug!(method = %request.method, url = %request.path, "request");
}

/// Pass a 2xx response through; turn anything else into an `ApiError`.
pub fn intercept_response(request: &HttpRequest, response: HttpResponse) -> Result<HttpResponse, ApiError> {
    let method = request.method;
    let url = request.path.as_str();
    let status = response.status;

    if response.is_success() {
        tracing::debug!(%method, url, status, "response");
        return Ok(response);
    }

    let body = response.body.as_str();
    if status >= 500 {
        tracing::error!(%method, url, status, body, "API error");
    } else if status >= 400 {
        tracing::warn!(%method, url, status, body, "API error");
    } else {
        tracing::info!(%method, url, status, body, "API error");
    }
    Err(ApiError::from_response(&response))
}

/// Normalize a transport failure.
pub fn intercept_transport_error(request: &HttpRequest, error: TransportError) -> ApiError {
    let method = request.method;
    let url = request.path.as_str();
    match error {
        TransportError::NoResponse(reason) => {
            tracing::error!(%method, url, %reason, "network error: no response received");
            ApiError::Network(reason)
        }
        TransportError::InvalidRequest(reason) => {
            tracing::debug!(%method, url, %reason, "request error");
            ApiError::Request(reason)
        }
    }
}
