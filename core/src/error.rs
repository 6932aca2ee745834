//! Error types for the testimonial API client.
//!
//! # Design
//! Every failure a caller can observe is normalized into `ApiError`, whether
//! it was caught before the network (`Validation`), produced by the server
//! (`HttpError`, `NotFound`, `UnexpectedStatus`, `HtmlResponse`), or by the
//! transport (`Network`, `Request`). Endpoint methods wrap the error in
//! `Context` with the operation name so the message a store records reads
//! like `[create_category] HTTP 400: ...`.

use thiserror::Error;

use crate::http::HttpResponse;
use crate::session::StorageError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failures detected locally, before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("feedback must not be empty")]
    EmptyFeedback,

    #[error("{0} must not be empty")]
    MissingField(&'static str),

    #[error("rating {0:?} is not a number between 0 and 5")]
    InvalidRating(String),

    #[error("at most {max} files allowed, {current} already selected and {adding} more requested")]
    TooManyFiles {
        max: usize,
        current: usize,
        adding: usize,
    },

    #[error("file {name} is {size} bytes, the limit is {max} bytes")]
    FileTooLarge { name: String, size: u64, max: u64 },

    #[error("combined attachment size {total} bytes exceeds {max} bytes")]
    TotalTooLarge { total: u64, max: u64 },

    #[error("file {name} has type {mime}, only images and videos are accepted")]
    InvalidFileType { name: String, mime: String },
}

/// Errors returned by `TestimonialClient` parse methods and `ApiClient`
/// endpoint methods.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {message}")]
    HttpError {
        status: u16,
        message: String,
        body: String,
    },

    /// A 2xx status other than the one the operation documents.
    #[error("unexpected status code {status}, expected {expected}")]
    UnexpectedStatus {
        status: u16,
        expected: u16,
        body: String,
    },

    /// The server answered with an HTML page where JSON was expected,
    /// usually a wrong base URL or a missing route.
    #[error("server returned HTML instead of JSON (HTTP {status})")]
    HtmlResponse { status: u16 },

    /// The request was sent but no response came back.
    #[error("network error: {0}")]
    Network(String),

    /// The request could not be constructed or dispatched.
    #[error("request error: {0}")]
    Request(String),

    #[error("serialization failed: {0}")]
    SerializationError(String),

    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// None of the role-scoped collections recognized the user.
    #[error("no role collection recognizes user {user_id}")]
    RoleNotFound { user_id: u64 },

    #[error("session storage error: {0}")]
    Storage(String),

    #[error("[{context}] {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ApiError>,
    },
}

impl ApiError {
    /// Map a non-success response to the matching variant.
    pub fn from_response(response: &HttpResponse) -> Self {
        if response.status == 404 {
            return ApiError::NotFound;
        }
        ApiError::HttpError {
            status: response.status,
            message: extract_message(&response.body)
                .unwrap_or_else(|| format!("request failed with status {}", response.status)),
            body: response.body.clone(),
        }
    }

    /// Attach the name of the operation that produced this error. An error
    /// that already carries the same context is returned unchanged.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        let context = context.into();
        if self.context() == Some(context.as_str()) {
            return self;
        }
        ApiError::Context {
            context,
            source: Box::new(self),
        }
    }

    pub fn context(&self) -> Option<&str> {
        match self {
            ApiError::Context { context, .. } => Some(context),
            _ => None,
        }
    }

    /// The innermost error, with every context layer removed.
    pub fn root(&self) -> &ApiError {
        match self {
            ApiError::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Human-readable message of the innermost error.
    pub fn message(&self) -> String {
        self.root().to_string()
    }

    /// HTTP status that produced this error, if a response was received.
    pub fn status_code(&self) -> Option<u16> {
        match self.root() {
            ApiError::NotFound => Some(404),
            ApiError::HttpError { status, .. }
            | ApiError::UnexpectedStatus { status, .. }
            | ApiError::HtmlResponse { status } => Some(*status),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self.root(), ApiError::Validation(_))
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Storage(err.to_string())
    }
}

/// Pull a human-readable message out of an error body. Looks at the usual
/// keys first, then at the first field error of a validation response
/// (`{"estado": ["not a valid choice"]}`).
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;
    for key in ["message", "detail", "error"] {
        if let Some(text) = object.get(key).and_then(|v| v.as_str()) {
            return Some(text.to_string());
        }
    }
    object.iter().find_map(|(field, v)| {
        v.as_array()
            .and_then(|items| items.first())
            .and_then(|first| first.as_str())
            .map(|text| format!("{field}: {text}"))
    })
}
