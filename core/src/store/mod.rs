//! Client-side state containers built on `ApiClient`.
//!
//! # Design
//! Each store owns the records it caches and an `ActionStatus`. Every action
//! goes through `ActionStatus::run`, which raises the loading flag, clears
//! the previous error, runs the request and on failure records
//! `"[action] message"` before handing the error back to the caller. Stores
//! never swallow errors; the recorded message is for display.
//!
//! Stores take the `ApiClient` by reference on every action and are grouped
//! in `AppState`, which the caller owns.

mod auth;
mod category;
mod organization;
mod profile;
mod testimonial;

pub use auth::AuthStore;
pub use category::CategoryStore;
pub use organization::OrganizationStore;
pub use profile::ProfileStore;
pub use testimonial::TestimonialStore;

use crate::api::ApiClient;
use crate::config::ProbeOrder;
use crate::error::ApiError;
use crate::roles::RoleResolver;
use crate::session::SessionStorage;
use crate::transport::Transport;
use crate::types::{Credentials, Role};

/// Loading flag and last error of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionStatus {
    pub is_loading: bool,
    pub error: Option<String>,
}

impl ActionStatus {
    pub fn run<R>(&mut self, context: &str, op: impl FnOnce() -> Result<R, ApiError>) -> Result<R, ApiError> {
        self.is_loading = true;
        self.error = None;
        let result = op();
        if let Err(e) = &result {
            tracing::warn!(action = context, error = %e, "store action failed");
            self.error = Some(format!("[{context}] {}", e.message()));
        }
        self.is_loading = false;
        result
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

/// Every store plus the role resolver, owned by the caller.
#[derive(Debug, Default)]
pub struct AppState {
    pub auth: AuthStore,
    pub profile: ProfileStore,
    pub categories: CategoryStore,
    pub testimonials: TestimonialStore,
    pub organizations: OrganizationStore,
    pub roles: RoleResolver,
}

impl AppState {
    pub fn new(probe_order: ProbeOrder) -> Self {
        Self {
            roles: RoleResolver::new(probe_order),
            ..Self::default()
        }
    }

    /// Restore the authentication state persisted by a previous run.
    pub fn restore<T: Transport, S: SessionStorage>(
        probe_order: ProbeOrder,
        api: &ApiClient<T, S>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            auth: AuthStore::restore(api.storage())?,
            ..Self::new(probe_order)
        })
    }

    /// Log in, settle the role, then load the user's profile.
    pub fn sign_in<T: Transport, S: SessionStorage>(
        &mut self,
        api: &ApiClient<T, S>,
        credentials: &Credentials,
    ) -> Result<Role, ApiError> {
        let role = self.auth.login(api, &mut self.roles, credentials)?;
        if let Some(user_id) = self.auth.user_id {
            if let Some((_, user)) = self.roles.cached(user_id) {
                self.profile.set(user.clone());
            } else {
                self.profile.fetch_profile(api, user_id, role)?;
            }
        }
        Ok(role)
    }

    /// Log out and drop everything cached for the previous user.
    pub fn sign_out<T: Transport, S: SessionStorage>(&mut self, api: &ApiClient<T, S>) -> Result<(), ApiError> {
        self.auth.logout(api, &mut self.roles)?;
        self.profile.clear();
        self.testimonials.clear_own();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::session::MemoryStorage;
    use crate::transport::fake::{response, RecordingTransport};

    #[test]
    fn run_records_prefixed_error_and_clears_loading() {
        let mut status = ActionStatus::default();
        let result: Result<(), ApiError> = status.run("fetch_categories", || {
            Err(ApiError::Network("connection refused".to_string()).with_context("list_categories"))
        });
        assert!(result.is_err());
        assert!(!status.is_loading);
        assert_eq!(
            status.error.as_deref(),
            Some("[fetch_categories] network error: connection refused")
        );
    }

    #[test]
    fn run_clears_previous_error_on_success() {
        let mut status = ActionStatus {
            is_loading: false,
            error: Some("old".to_string()),
        };
        let value = status.run("fetch_categories", || Ok::<_, ApiError>(3)).unwrap();
        assert_eq!(value, 3);
        assert_eq!(status, ActionStatus::default());
    }

    #[test]
    fn run_is_loading_while_op_runs() {
        let mut status = ActionStatus::default();
        let seen = std::cell::Cell::new(false);
        let _ = status.run("x", || {
            seen.set(true);
            Err::<(), _>(ValidationError::EmptyFeedback.into())
        });
        assert!(seen.get());
        assert_eq!(status.error.as_deref(), Some("[x] validation failed: feedback must not be empty"));
    }

    fn service() -> ApiClient<RecordingTransport, MemoryStorage> {
        let transport = RecordingTransport::new(|req| {
            let body = match req.path.trim_start_matches("http://localhost:3000/app") {
                "/login/" => r#"{"user_id":7,"rol":"editor","access":"acc","refresh":"ref"}"#,
                "/editores/7/" => r#"{"id":7,"username":"eve","email":"eve@example.com"}"#,
                "/logout/" => r#"{"success":true,"message":"bye"}"#,
                _ => return Ok(response(404, "")),
            };
            Ok(response(200, body))
        });
        ApiClient::new("http://localhost:3000", transport, MemoryStorage::new())
    }

    fn credentials() -> Credentials {
        Credentials {
            email: "eve@example.com".to_string(),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn sign_in_uses_claim_and_loads_profile() {
        let api = service();
        let mut state = AppState::new(ProbeOrder::VisitorFirst);
        let role = state.sign_in(&api, &credentials()).unwrap();
        assert_eq!(role, Role::Editor);
        assert_eq!(state.profile.profile.as_ref().map(|u| u.username.as_str()), Some("eve"));
        let paths: Vec<_> = api.transport().requests().into_iter().map(|r| r.path).collect();
        assert_eq!(
            paths,
            [
                "http://localhost:3000/app/login/",
                "http://localhost:3000/app/editores/7/"
            ]
        );
    }

    #[test]
    fn sign_out_clears_session_and_profile() {
        let api = service();
        let mut state = AppState::new(ProbeOrder::VisitorFirst);
        state.sign_in(&api, &credentials()).unwrap();
        state.sign_out(&api).unwrap();
        assert!(!state.auth.is_authenticated);
        assert!(state.profile.profile.is_none());

        let restored = AppState::restore(ProbeOrder::VisitorFirst, &api).unwrap();
        assert!(!restored.auth.is_authenticated);
    }

    #[test]
    fn restore_picks_up_persisted_login() {
        let api = service();
        let mut state = AppState::new(ProbeOrder::VisitorFirst);
        state.sign_in(&api, &credentials()).unwrap();

        let restored = AppState::restore(ProbeOrder::VisitorFirst, &api).unwrap();
        assert!(restored.auth.is_authenticated);
        assert_eq!(restored.auth.role, Some(Role::Editor));
        assert_eq!(restored.auth.user_id, Some(7));
    }
}
