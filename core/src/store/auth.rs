use super::ActionStatus;
use crate::api::ApiClient;
use crate::error::{ApiError, ValidationError};
use crate::roles::RoleResolver;
use crate::session::{PersistedSession, SessionState, SessionStorage};
use crate::transport::Transport;
use crate::types::{Credentials, NewUser, Role, User};

/// Who is logged in. Every change is written to the persisted session the
/// request interceptor reads.
#[derive(Debug, Clone, Default)]
pub struct AuthStore {
    pub user_id: Option<u64>,
    pub role: Option<Role>,
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub is_authenticated: bool,
    pub status: ActionStatus,
}

impl AuthStore {
    /// Load the persisted session, or start logged out when none is stored.
    pub fn restore(storage: &dyn SessionStorage) -> Result<Self, ApiError> {
        let Some(persisted) = PersistedSession::load(storage)? else {
            return Ok(Self::default());
        };
        let state = persisted.state;
        Ok(Self {
            user_id: state.user_id,
            role: state.role,
            is_authenticated: state.is_authenticated && state.token.is_some(),
            token: state.token,
            refresh_token: state.refresh_token,
            status: ActionStatus::default(),
        })
    }

    fn session_state(&self) -> SessionState {
        SessionState {
            token: self.token.clone(),
            refresh_token: self.refresh_token.clone(),
            role: self.role,
            user_id: self.user_id,
            is_authenticated: self.is_authenticated,
        }
    }

    fn persist(&self, storage: &dyn SessionStorage) -> Result<(), ApiError> {
        PersistedSession::new(self.session_state()).save(storage)?;
        Ok(())
    }

    fn reset(&mut self, storage: &dyn SessionStorage) -> Result<(), ApiError> {
        self.user_id = None;
        self.role = None;
        self.token = None;
        self.refresh_token = None;
        self.is_authenticated = false;
        PersistedSession::clear(storage)?;
        Ok(())
    }

    /// Log in and settle the user's role. The role claim in the login reply
    /// is trusted when it names a group; otherwise the collections are
    /// probed with the new token.
    pub fn login<T: Transport, S: SessionStorage>(
        &mut self,
        api: &ApiClient<T, S>,
        roles: &mut RoleResolver,
        credentials: &Credentials,
    ) -> Result<Role, ApiError> {
        let (login, role) = self.status.run("login", || {
            let login = api.login(credentials)?;
            let claimed = login.rol.as_deref().and_then(|rol| rol.parse::<Role>().ok());
            let role = match claimed {
                Some(role) if role != Role::None => role,
                _ => roles.resolve(api, login.user_id, &login.access)?.0,
            };
            Ok((login, role))
        })?;

        self.user_id = Some(login.user_id);
        self.role = Some(role);
        self.token = Some(login.access);
        self.refresh_token = login.refresh;
        self.is_authenticated = true;
        tracing::info!(user_id = login.user_id, %role, "logged in");
        self.persist(api.storage())?;
        Ok(role)
    }

    /// Create a visitor account. Does not log in.
    pub fn register<T: Transport, S: SessionStorage>(
        &mut self,
        api: &ApiClient<T, S>,
        input: &NewUser,
    ) -> Result<User, ApiError> {
        self.status.run("register", || api.register(input))
    }

    /// Tell the service, then forget the session locally. A failed server
    /// call is logged and does not keep the user logged in.
    pub fn logout<T: Transport, S: SessionStorage>(
        &mut self,
        api: &ApiClient<T, S>,
        roles: &mut RoleResolver,
    ) -> Result<(), ApiError> {
        if self.token.is_some() {
            if let Err(e) = api.logout() {
                tracing::warn!(error = %e, "server logout failed, clearing local session anyway");
            }
        }
        roles.clear();
        self.status.clear_error();
        self.reset(api.storage())?;
        tracing::info!("logged out");
        Ok(())
    }

    /// Exchange the refresh token for a new access token. A failed refresh
    /// ends the session.
    pub fn refresh<T: Transport, S: SessionStorage>(&mut self, api: &ApiClient<T, S>) -> Result<(), ApiError> {
        let refresh_token = self.refresh_token.clone();
        let result = self.status.run("refresh", || {
            let refresh = refresh_token.ok_or(ValidationError::MissingField("refresh token"))?;
            api.refresh_token(&refresh)
        });
        match result {
            Ok(refreshed) => {
                self.token = Some(refreshed.access);
                self.persist(api.storage())
            }
            Err(e) => {
                self.reset(api.storage())?;
                Err(e)
            }
        }
    }

    pub fn clear_error(&mut self) {
        self.status.clear_error();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::{read_token, TokenLookup};
    use crate::session::MemoryStorage;
    use crate::transport::fake::{response, RecordingTransport};

    fn credentials() -> Credentials {
        Credentials {
            email: "ana@example.com".to_string(),
            password: "secret".to_string(),
        }
    }

    fn api(
        handler: impl Fn(&str) -> (u16, &'static str) + Send + Sync + 'static,
    ) -> ApiClient<RecordingTransport, MemoryStorage> {
        let transport = RecordingTransport::new(move |req| {
            let (status, body) = handler(req.path.trim_start_matches("http://localhost:3000/app"));
            Ok(response(status, body))
        });
        ApiClient::new("http://localhost:3000", transport, MemoryStorage::new())
    }

    #[test]
    fn login_with_claim_persists_session() {
        let api = api(|path| match path {
            "/login/" => (200, r#"{"user_id":3,"rol":"administrador","access":"acc","refresh":"ref"}"#),
            _ => (404, ""),
        });
        let mut store = AuthStore::default();
        let mut roles = RoleResolver::default();
        let role = store.login(&api, &mut roles, &credentials()).unwrap();

        assert_eq!(role, Role::Admin);
        assert!(store.is_authenticated);
        assert_eq!(api.transport().count(), 1);
        assert_eq!(read_token(api.storage()), TokenLookup::Present("acc".to_string()));
        let persisted = PersistedSession::load(api.storage()).unwrap().unwrap();
        assert_eq!(persisted.state.refresh_token.as_deref(), Some("ref"));
        assert_eq!(persisted.state.role, Some(Role::Admin));
    }

    #[test]
    fn login_without_group_probes_collections() {
        let api = api(|path| match path {
            "/login/" => (200, r#"{"user_id":3,"rol":"sin_grupo","access":"acc"}"#),
            "/editores/3/" => (200, r#"{"id":3,"username":"ed","email":"ed@example.com"}"#),
            _ => (404, ""),
        });
        let mut store = AuthStore::default();
        let mut roles = RoleResolver::default();
        assert_eq!(store.login(&api, &mut roles, &credentials()).unwrap(), Role::Editor);
        assert_eq!(api.transport().count(), 3);
        assert!(roles.cached(3).is_some());
    }

    #[test]
    fn failed_login_records_error_and_stays_logged_out() {
        let api = api(|_| (401, r#"{"detail":"bad credentials"}"#));
        let mut store = AuthStore::default();
        let mut roles = RoleResolver::default();
        let err = store.login(&api, &mut roles, &credentials()).unwrap_err();
        assert_eq!(err.status_code(), Some(401));
        assert!(!store.is_authenticated);
        assert!(!store.status.is_loading);
        assert_eq!(store.status.error.as_deref(), Some("[login] HTTP 401: bad credentials"));
        assert_eq!(read_token(api.storage()), TokenLookup::Missing);

        store.clear_error();
        assert!(store.status.error.is_none());
    }

    #[test]
    fn logout_clears_even_when_server_fails() {
        let api = api(|path| match path {
            "/login/" => (200, r#"{"user_id":3,"rol":"visitante","access":"acc"}"#),
            _ => (500, ""),
        });
        let mut store = AuthStore::default();
        let mut roles = RoleResolver::default();
        store.login(&api, &mut roles, &credentials()).unwrap();
        store.logout(&api, &mut roles).unwrap();
        assert!(!store.is_authenticated);
        assert!(store.token.is_none());
        assert_eq!(read_token(api.storage()), TokenLookup::Missing);
    }

    #[test]
    fn refresh_replaces_access_token() {
        let api = api(|path| match path {
            "/login/" => (200, r#"{"user_id":3,"rol":"visitante","access":"old","refresh":"ref"}"#),
            "/token/refresh/" => (200, r#"{"access":"new"}"#),
            _ => (404, ""),
        });
        let mut store = AuthStore::default();
        let mut roles = RoleResolver::default();
        store.login(&api, &mut roles, &credentials()).unwrap();
        store.refresh(&api).unwrap();
        assert_eq!(store.token.as_deref(), Some("new"));
        assert_eq!(read_token(api.storage()), TokenLookup::Present("new".to_string()));
    }

    #[test]
    fn refresh_without_token_fails_and_logs_out() {
        let api = api(|_| (200, "{}"));
        let mut store = AuthStore {
            token: Some("acc".to_string()),
            is_authenticated: true,
            ..AuthStore::default()
        };
        let err = store.refresh(&api).unwrap_err();
        assert!(err.is_validation());
        assert!(!store.is_authenticated);
        assert_eq!(api.transport().count(), 0);
    }

    #[test]
    fn rejected_refresh_logs_out() {
        let api = api(|_| (401, r#"{"detail":"token expired"}"#));
        let mut store = AuthStore {
            token: Some("acc".to_string()),
            refresh_token: Some("ref".to_string()),
            is_authenticated: true,
            ..AuthStore::default()
        };
        assert!(store.refresh(&api).is_err());
        assert!(!store.is_authenticated);
        assert_eq!(store.status.error.as_deref(), Some("[refresh] HTTP 401: token expired"));
    }

    #[test]
    fn register_returns_created_visitor() {
        let api = api(|path| match path {
            "/visitantes/" => (201, r#"{"id":11,"username":"new","email":"new@example.com"}"#),
            _ => (404, ""),
        });
        let mut store = AuthStore::default();
        let user = store
            .register(
                &api,
                &NewUser {
                    username: "new".to_string(),
                    email: "new@example.com".to_string(),
                    password: "pw".to_string(),
                },
            )
            .unwrap();
        assert_eq!(user.id, 11);
        assert!(!store.is_authenticated);
    }
}
