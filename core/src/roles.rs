//! Role resolution by probing the role-scoped user collections.
//!
//! # Design
//! The service has no "who am I" endpoint. A user's role is found by asking
//! each collection (`/visitantes/{id}/`, `/editores/{id}/`,
//! `/administradores/{id}/`) for the user, with the freshly issued token,
//! until one answers. A 403 or 404 means "not in this collection" and the
//! probe moves on; any other failure aborts it. At most three requests are
//! made, and the answer is memoized per user until `clear` (on logout).

use std::collections::HashMap;

use crate::api::ApiClient;
use crate::config::ProbeOrder;
use crate::error::ApiError;
use crate::session::SessionStorage;
use crate::transport::Transport;
use crate::types::{Role, User, UserCollection};

impl ProbeOrder {
    pub fn collections(&self) -> [UserCollection; 3] {
        match self {
            ProbeOrder::VisitorFirst => [UserCollection::Visitors, UserCollection::Editors, UserCollection::Admins],
            ProbeOrder::AdminFirst => [UserCollection::Admins, UserCollection::Editors, UserCollection::Visitors],
        }
    }
}

/// Probe responses that mean the user is simply not in that collection.
fn is_refusal(err: &ApiError) -> bool {
    matches!(err.status_code(), Some(403 | 404))
}

#[derive(Debug, Default)]
pub struct RoleResolver {
    order: ProbeOrder,
    resolved: HashMap<u64, (Role, User)>,
}

impl RoleResolver {
    pub fn new(order: ProbeOrder) -> Self {
        Self {
            order,
            resolved: HashMap::new(),
        }
    }

    pub fn order(&self) -> ProbeOrder {
        self.order
    }

    pub fn cached(&self, user_id: u64) -> Option<&(Role, User)> {
        self.resolved.get(&user_id)
    }

    /// Record a role learned elsewhere, e.g. from the login claim.
    pub fn remember(&mut self, role: Role, user: User) {
        self.resolved.insert(user.id, (role, user));
    }

    /// Find the collection that holds `user_id`, authenticating with `token`.
    pub fn resolve<T: Transport, S: SessionStorage>(
        &mut self,
        api: &ApiClient<T, S>,
        user_id: u64,
        token: &str,
    ) -> Result<(Role, User), ApiError> {
        if let Some(hit) = self.resolved.get(&user_id) {
            tracing::debug!(user_id, role = %hit.0, "role resolved from cache");
            return Ok(hit.clone());
        }

        for collection in self.order.collections() {
            let request = api.endpoints().build_get_user(collection, user_id);
            let fetched = api
                .send_with_token(request, token)
                .and_then(|response| api.endpoints().parse_get_user(response));
            match fetched {
                Ok(user) => {
                    let role = collection.role();
                    tracing::info!(user_id, %role, "role resolved");
                    self.resolved.insert(user_id, (role, user.clone()));
                    return Ok((role, user));
                }
                Err(e) if is_refusal(&e) => {
                    tracing::debug!(user_id, collection = collection.path_segment(), "not in collection");
                }
                Err(e) => return Err(e.with_context("resolve_role")),
            }
        }

        tracing::warn!(user_id, "user not found in any role collection");
        Err(ApiError::RoleNotFound { user_id }.with_context("resolve_role"))
    }

    /// Forget every resolved role.
    pub fn clear(&mut self) {
        self.resolved.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryStorage;
    use crate::transport::fake::{response, RecordingTransport};

    fn user_json(id: u64) -> String {
        format!(r#"{{"id":{id},"username":"u{id}","email":"u{id}@example.com"}}"#)
    }

    /// Answers 200 only from the collection named by `home`, `refusal` elsewhere.
    fn api_with_home(home: &'static str, refusal: u16) -> ApiClient<RecordingTransport, MemoryStorage> {
        let transport = RecordingTransport::new(move |req| {
            if req.path.contains(&format!("/app/{home}/")) {
                Ok(response(200, &user_json(7)))
            } else {
                Ok(response(refusal, r#"{"detail":"no"}"#))
            }
        });
        ApiClient::new("http://localhost:3000", transport, MemoryStorage::new())
    }

    #[test]
    fn visitor_is_found_with_one_call() {
        let api = api_with_home("visitantes", 404);
        let mut resolver = RoleResolver::default();
        let (role, user) = resolver.resolve(&api, 7, "tok").unwrap();
        assert_eq!(role, Role::Visitor);
        assert_eq!(user.id, 7);
        assert_eq!(api.transport().count(), 1);
    }

    #[test]
    fn editor_is_found_on_second_call() {
        let api = api_with_home("editores", 403);
        let mut resolver = RoleResolver::default();
        let (role, _) = resolver.resolve(&api, 7, "tok").unwrap();
        assert_eq!(role, Role::Editor);
        let paths: Vec<_> = api.transport().requests().into_iter().map(|r| r.path).collect();
        assert_eq!(
            paths,
            [
                "http://localhost:3000/app/visitantes/7/",
                "http://localhost:3000/app/editores/7/"
            ]
        );
    }

    #[test]
    fn probe_carries_explicit_token() {
        let api = api_with_home("administradores", 404);
        let mut resolver = RoleResolver::default();
        resolver.resolve(&api, 7, "fresh-token").unwrap();
        let sent = api.transport().requests();
        assert_eq!(sent.len(), 3);
        assert!(sent.iter().all(|r| r.header("authorization") == Some("JWT fresh-token")));
    }

    #[test]
    fn admin_first_order_stops_early() {
        let api = api_with_home("administradores", 404);
        let mut resolver = RoleResolver::new(ProbeOrder::AdminFirst);
        let (role, _) = resolver.resolve(&api, 7, "tok").unwrap();
        assert_eq!(role, Role::Admin);
        assert_eq!(api.transport().count(), 1);
    }

    #[test]
    fn unknown_user_fails_after_three_calls() {
        let api = api_with_home("nowhere", 404);
        let mut resolver = RoleResolver::default();
        let err = resolver.resolve(&api, 7, "tok").unwrap_err();
        assert!(matches!(err.root(), ApiError::RoleNotFound { user_id: 7 }));
        assert_eq!(api.transport().count(), 3);
    }

    #[test]
    fn server_error_aborts_probe() {
        let api = api_with_home("administradores", 500);
        let mut resolver = RoleResolver::default();
        let err = resolver.resolve(&api, 7, "tok").unwrap_err();
        assert_eq!(err.status_code(), Some(500));
        assert_eq!(err.context(), Some("resolve_role"));
        assert_eq!(err.to_string(), "[resolve_role] HTTP 500: no");
        assert_eq!(api.transport().count(), 1);
    }

    #[test]
    fn resolution_is_memoized_until_cleared() {
        let api = api_with_home("editores", 404);
        let mut resolver = RoleResolver::default();
        resolver.resolve(&api, 7, "tok").unwrap();
        resolver.resolve(&api, 7, "tok").unwrap();
        assert_eq!(api.transport().count(), 2);
        assert_eq!(resolver.cached(7).map(|hit| hit.0), Some(Role::Editor));

        resolver.clear();
        assert!(resolver.cached(7).is_none());
        resolver.resolve(&api, 7, "tok").unwrap();
        assert_eq!(api.transport().count(), 4);
    }
}
