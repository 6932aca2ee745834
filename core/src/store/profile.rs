use super::ActionStatus;
use crate::api::ApiClient;
use crate::error::ApiError;
use crate::session::SessionStorage;
use crate::transport::Transport;
use crate::types::{Role, User, UserCollection, UserUpdate};

/// The logged-in user's own record, read from their role's collection.
#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    pub profile: Option<User>,
    pub status: ActionStatus,
}

fn collection_for(role: Role, user_id: u64) -> Result<UserCollection, ApiError> {
    role.collection().ok_or(ApiError::RoleNotFound { user_id })
}

impl ProfileStore {
    pub fn set(&mut self, user: User) {
        self.profile = Some(user);
    }

    pub fn clear(&mut self) {
        self.profile = None;
        self.status = ActionStatus::default();
    }

    /// A failed fetch leaves no profile behind.
    pub fn fetch_profile<T: Transport, S: SessionStorage>(
        &mut self,
        api: &ApiClient<T, S>,
        user_id: u64,
        role: Role,
    ) -> Result<User, ApiError> {
        let result = self.status.run("fetch_profile", || {
            api.get_user(collection_for(role, user_id)?, user_id)
        });
        match &result {
            Ok(user) => self.profile = Some(user.clone()),
            Err(_) => self.profile = None,
        }
        result
    }

    /// A failed update keeps the previous profile.
    pub fn update_profile<T: Transport, S: SessionStorage>(
        &mut self,
        api: &ApiClient<T, S>,
        user_id: u64,
        role: Role,
        update: &UserUpdate,
    ) -> Result<User, ApiError> {
        let user = self.status.run("update_profile", || {
            api.update_user(collection_for(role, user_id)?, user_id, update)
        })?;
        self.profile = Some(user.clone());
        Ok(user)
    }
}
