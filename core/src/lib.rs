//! Synchronous client core for the testimonial service.
//!
//! # Overview
//! `TestimonialClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network (host-does-IO pattern). `ApiClient`
//! adds what every real call needs on top: the persisted `JWT` token, logging
//! and error normalization, and a `Transport` that performs the round-trip.
//! The stores in `store` keep client-side state and drive `ApiClient`.
//!
//! # Design
//! - `TestimonialClient` is stateless and holds only `base_url`.
//! - Each REST operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), so the I/O boundary is explicit.
//! - `Transport` and `SessionStorage` are the two seams tests replace.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod roles;
pub mod session;
pub mod store;
pub mod transport;
pub mod types;
pub mod validation;

pub use api::{ApiClient, DefaultApiClient};
pub use client::TestimonialClient;
pub use config::{load_config, ClientConfig, ConfigError, ProbeOrder};
pub use error::{ApiError, ApiResult, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, MultipartForm, RequestBody};
pub use roles::RoleResolver;
pub use session::{FileStorage, MemoryStorage, PersistedSession, SessionState, SessionStorage, AUTH_STORAGE_KEY};
pub use store::{ActionStatus, AppState, AuthStore, CategoryStore, OrganizationStore, ProfileStore, TestimonialStore};
pub use transport::{Transport, TransportError, UreqTransport};
pub use types::{
    Ack, Category, CategoryUpdate, Commenter, Credentials, Editor, LoginResponse, MembershipResponse, NewCategory,
    NewOrganization, NewTestimonial, NewUser, Organization, OrganizationUpdate, RefreshResponse, Role, StatusCounts,
    Testimonial, TestimonialStatistics, TestimonialStatus, TestimonialUpdate, User, UserCollection, UserUpdate,
};
pub use validation::{Attachment, AttachmentSet, MAX_FILES, MAX_FILE_SIZE, MAX_TOTAL_SIZE};
