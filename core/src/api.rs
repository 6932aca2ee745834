//! Authenticated client: endpoint builders, interceptors and a transport.
//!
//! # Design
//! `ApiClient` is the one place a request is actually sent. Every endpoint
//! method follows the same path: `TestimonialClient::build_*`, the request
//! interceptor, `Transport::execute`, the response interceptor, then
//! `TestimonialClient::parse_*`. Any failure along the way is tagged with the
//! endpoint method's name, so errors recorded by the stores read like
//! `[reject_testimonial] validation failed: feedback must not be empty`.
//!
//! One method call issues at most one HTTP request; there are no retries.

use crate::client::TestimonialClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::interceptor::{attach_token, authorization_value, intercept_response, intercept_transport_error, AUTHORIZATION};
use crate::session::{FileStorage, MemoryStorage, SessionStorage};
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    Ack, Category, CategoryUpdate, Credentials, LoginResponse, MembershipResponse, NewCategory, NewOrganization,
    NewTestimonial, NewUser, Organization, OrganizationUpdate, RefreshResponse, Testimonial, TestimonialStatistics,
    TestimonialStatus, TestimonialUpdate, User, UserCollection, UserUpdate,
};
use crate::validation::AttachmentSet;

/// The client `ApiClient::from_config` builds.
pub type DefaultApiClient = ApiClient<UreqTransport, Box<dyn SessionStorage>>;

pub struct ApiClient<T, S> {
    endpoints: TestimonialClient,
    transport: T,
    storage: S,
}

impl DefaultApiClient {
    /// Build a client over HTTP with the configured timeout. Sessions are
    /// kept on disk when `storage.path` is set, in memory otherwise.
    pub fn from_config(config: &ClientConfig) -> Self {
        let storage: Box<dyn SessionStorage> = match &config.storage.path {
            Some(path) => Box::new(FileStorage::new(path)),
            None => Box::new(MemoryStorage::new()),
        };
        tracing::info!(base_url = %config.api.base_url, "API client created");
        ApiClient::new(&config.api.base_url, UreqTransport::new(config.api.timeout()), storage)
    }
}

impl<T: Transport, S: SessionStorage> ApiClient<T, S> {
    pub fn new(base_url: &str, transport: T, storage: S) -> Self {
        Self {
            endpoints: TestimonialClient::new(base_url),
            transport,
            storage,
        }
    }

    pub fn endpoints(&self) -> &TestimonialClient {
        &self.endpoints
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `request` through both interceptors. Only 2xx responses come
    /// back as `Ok`.
    pub fn send(&self, mut request: HttpRequest) -> Result<HttpResponse, ApiError> {
        attach_token(&mut request, &self.storage);
        let response = self
            .transport
            .execute(&request)
            .map_err(|e| intercept_transport_error(&request, e))?;
        intercept_response(&request, response)
    }

    /// Send `request` with an explicit token instead of the persisted one.
    pub fn send_with_token(&self, mut request: HttpRequest, token: &str) -> Result<HttpResponse, ApiError> {
        request.set_header(AUTHORIZATION, authorization_value(token));
        self.send(request)
    }

    fn call<R>(
        &self,
        context: &str,
        request: Result<HttpRequest, ApiError>,
        parse: impl FnOnce(&TestimonialClient, HttpResponse) -> Result<R, ApiError>,
    ) -> Result<R, ApiError> {
        request
            .and_then(|request| self.send(request))
            .and_then(|response| parse(&self.endpoints, response))
            .map_err(|e| e.with_context(context))
    }

    // -- auth --

    pub fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.call(
            "login",
            self.endpoints.build_login(credentials),
            TestimonialClient::parse_login,
        )
    }

    pub fn logout(&self) -> Result<Ack, ApiError> {
        self.call(
            "logout",
            Ok(self.endpoints.build_logout()),
            TestimonialClient::parse_logout,
        )
    }

    pub fn refresh_token(&self, refresh: &str) -> Result<RefreshResponse, ApiError> {
        self.call(
            "refresh_token",
            self.endpoints.build_refresh_token(refresh),
            TestimonialClient::parse_refresh_token,
        )
    }

    pub fn register(&self, input: &NewUser) -> Result<User, ApiError> {
        self.call(
            "register",
            self.endpoints.build_register(input),
            TestimonialClient::parse_register,
        )
    }

    // -- users --

    pub fn list_users(&self, collection: UserCollection) -> Result<Vec<User>, ApiError> {
        self.call(
            "list_users",
            Ok(self.endpoints.build_list_users(collection)),
            TestimonialClient::parse_list_users,
        )
    }

    pub fn get_user(&self, collection: UserCollection, id: u64) -> Result<User, ApiError> {
        self.call(
            "get_user",
            Ok(self.endpoints.build_get_user(collection, id)),
            TestimonialClient::parse_get_user,
        )
    }

    /// Fetch a user from `collection` authenticating with `token` rather than
    /// the persisted session.
    pub fn get_user_with_token(&self, collection: UserCollection, id: u64, token: &str) -> Result<User, ApiError> {
        let request = self.endpoints.build_get_user(collection, id);
        self.send_with_token(request, token)
            .and_then(|response| self.endpoints.parse_get_user(response))
            .map_err(|e| e.with_context("get_user"))
    }

    pub fn create_user(&self, collection: UserCollection, input: &NewUser) -> Result<User, ApiError> {
        self.call(
            "create_user",
            self.endpoints.build_create_user(collection, input),
            TestimonialClient::parse_create_user,
        )
    }

    pub fn update_user(&self, collection: UserCollection, id: u64, input: &UserUpdate) -> Result<User, ApiError> {
        self.call(
            "update_user",
            self.endpoints.build_update_user(collection, id, input),
            TestimonialClient::parse_update_user,
        )
    }

    pub fn delete_user(&self, collection: UserCollection, id: u64) -> Result<(), ApiError> {
        self.call(
            "delete_user",
            Ok(self.endpoints.build_delete_user(collection, id)),
            TestimonialClient::parse_delete_user,
        )
    }

    // -- categories --

    pub fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.call(
            "list_categories",
            Ok(self.endpoints.build_list_categories()),
            TestimonialClient::parse_list_categories,
        )
    }

    pub fn get_category(&self, id: u64) -> Result<Category, ApiError> {
        self.call(
            "get_category",
            Ok(self.endpoints.build_get_category(id)),
            TestimonialClient::parse_get_category,
        )
    }

    pub fn create_category(&self, input: &NewCategory) -> Result<Category, ApiError> {
        self.call(
            "create_category",
            self.endpoints.build_create_category(input),
            TestimonialClient::parse_create_category,
        )
    }

    pub fn update_category(&self, id: u64, input: &CategoryUpdate) -> Result<Category, ApiError> {
        self.call(
            "update_category",
            self.endpoints.build_update_category(id, input),
            TestimonialClient::parse_update_category,
        )
    }

    pub fn delete_category(&self, id: u64) -> Result<(), ApiError> {
        self.call(
            "delete_category",
            Ok(self.endpoints.build_delete_category(id)),
            TestimonialClient::parse_delete_category,
        )
    }

    // -- organizations --

    pub fn list_organizations(&self) -> Result<Vec<Organization>, ApiError> {
        self.call(
            "list_organizations",
            Ok(self.endpoints.build_list_organizations()),
            TestimonialClient::parse_list_organizations,
        )
    }

    pub fn get_organization(&self, id: u64) -> Result<Organization, ApiError> {
        self.call(
            "get_organization",
            Ok(self.endpoints.build_get_organization(id)),
            TestimonialClient::parse_get_organization,
        )
    }

    pub fn create_organization(&self, input: &NewOrganization) -> Result<Organization, ApiError> {
        self.call(
            "create_organization",
            self.endpoints.build_create_organization(input),
            TestimonialClient::parse_create_organization,
        )
    }

    pub fn update_organization(&self, id: u64, input: &OrganizationUpdate) -> Result<Organization, ApiError> {
        self.call(
            "update_organization",
            self.endpoints.build_update_organization(id, input),
            TestimonialClient::parse_update_organization,
        )
    }

    pub fn delete_organization(&self, id: u64) -> Result<(), ApiError> {
        self.call(
            "delete_organization",
            Ok(self.endpoints.build_delete_organization(id)),
            TestimonialClient::parse_delete_organization,
        )
    }

    pub fn add_editors(&self, organization_id: u64, editor_ids: &[u64]) -> Result<MembershipResponse, ApiError> {
        self.call(
            "add_editors",
            self.endpoints.build_add_editors(organization_id, editor_ids),
            TestimonialClient::parse_add_editors,
        )
    }

    pub fn add_visitors(&self, organization_id: u64, visitor_ids: &[u64]) -> Result<MembershipResponse, ApiError> {
        self.call(
            "add_visitors",
            self.endpoints.build_add_visitors(organization_id, visitor_ids),
            TestimonialClient::parse_add_visitors,
        )
    }

    pub fn approved_testimonials(&self, organization_id: u64) -> Result<Vec<Testimonial>, ApiError> {
        self.call(
            "approved_testimonials",
            Ok(self.endpoints.build_approved_testimonials(organization_id)),
            TestimonialClient::parse_approved_testimonials,
        )
    }

    // -- testimonials --

    pub fn list_testimonials(&self) -> Result<Vec<Testimonial>, ApiError> {
        self.call(
            "list_testimonials",
            Ok(self.endpoints.build_list_testimonials()),
            TestimonialClient::parse_list_testimonials,
        )
    }

    pub fn get_testimonial(&self, id: u64) -> Result<Testimonial, ApiError> {
        self.call(
            "get_testimonial",
            Ok(self.endpoints.build_get_testimonial(id)),
            TestimonialClient::parse_get_testimonial,
        )
    }

    pub fn create_testimonial(
        &self,
        input: &NewTestimonial,
        attachments: &AttachmentSet,
    ) -> Result<Testimonial, ApiError> {
        self.call(
            "create_testimonial",
            self.endpoints.build_create_testimonial(input, attachments),
            TestimonialClient::parse_create_testimonial,
        )
    }

    pub fn update_testimonial(&self, id: u64, input: &TestimonialUpdate) -> Result<Testimonial, ApiError> {
        self.call(
            "update_testimonial",
            self.endpoints.build_update_testimonial(id, input),
            TestimonialClient::parse_update_testimonial,
        )
    }

    pub fn delete_testimonial(&self, id: u64) -> Result<(), ApiError> {
        self.call(
            "delete_testimonial",
            Ok(self.endpoints.build_delete_testimonial(id)),
            TestimonialClient::parse_delete_testimonial,
        )
    }

    pub fn list_own_testimonials(&self) -> Result<Vec<Testimonial>, ApiError> {
        self.call(
            "list_own_testimonials",
            Ok(self.endpoints.build_list_own_testimonials()),
            TestimonialClient::parse_list_own_testimonials,
        )
    }

    pub fn get_own_testimonial(&self, id: u64) -> Result<Testimonial, ApiError> {
        self.call(
            "get_own_testimonial",
            Ok(self.endpoints.build_get_own_testimonial(id)),
            TestimonialClient::parse_get_own_testimonial,
        )
    }

    pub fn testimonial_statistics(&self) -> Result<Vec<TestimonialStatistics>, ApiError> {
        self.call(
            "testimonial_statistics",
            Ok(self.endpoints.build_testimonial_statistics()),
            TestimonialClient::parse_testimonial_statistics,
        )
    }

    pub fn approve_testimonial(&self, id: u64) -> Result<Testimonial, ApiError> {
        self.call(
            "approve_testimonial",
            Ok(self.endpoints.build_approve_testimonial(id)),
            TestimonialClient::parse_approve_testimonial,
        )
    }

    pub fn reject_testimonial(&self, id: u64, feedback: &str) -> Result<Testimonial, ApiError> {
        self.call(
            "reject_testimonial",
            self.endpoints.build_reject_testimonial(id, feedback),
            TestimonialClient::parse_reject_testimonial,
        )
    }

    pub fn change_status(
        &self,
        id: u64,
        status: TestimonialStatus,
        feedback: Option<&str>,
    ) -> Result<Testimonial, ApiError> {
        self.call(
            "change_status",
            self.endpoints.build_change_status(id, status, feedback),
            TestimonialClient::parse_change_status,
        )
    }

    pub fn add_feedback(&self, id: u64, feedback: &str) -> Result<Testimonial, ApiError> {
        self.call(
            "add_feedback",
            self.endpoints.build_add_feedback(id, feedback),
            TestimonialClient::parse_add_feedback,
        )
    }
}
