//! User account service

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::auth::hash_password;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    CreateUserRequest, NewUser, Page, PageRequest, UpdateUserRequest, User, UserChanges, UserRole,
};
use crate::policy::Caller;
use crate::store::LibraryStore;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn LibraryStore>,
    password_hash_cost: u32,
}

impl UserService {
    pub fn new(store: Arc<dyn LibraryStore>, password_hash_cost: u32) -> Self {
        Self {
            store,
            password_hash_cost,
        }
    }

    /// Register an account; only admins may choose the role
    pub async fn register(&self, caller: &Caller, request: CreateUserRequest) -> ApiResult<User> {
        request.validate()?;

        let role = if caller.is_admin() {
            request.role.unwrap_or_default()
        } else {
            UserRole::User
        };
        let password_hash = self.hash(request.password).await?;

        let user = self
            .store
            .insert_user(NewUser {
                username: request.username,
                email: request.email,
                password_hash,
                role,
            })
            .await?;

        tracing::info!(user_id = %user.id, role = user.role.as_str(), "User registered");
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> ApiResult<User> {
        self.store
            .find_user(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    pub async fn list_users(&self, page: PageRequest) -> ApiResult<Page<User>> {
        Ok(self.store.list_users(page).await?)
    }

    /// Partial update; a new password is re-hashed
    pub async fn update_user(&self, id: Uuid, request: UpdateUserRequest) -> ApiResult<User> {
        request.validate()?;

        let password_hash = match request.password {
            Some(password) => Some(self.hash(password).await?),
            None => None,
        };
        let changes = UserChanges {
            username: request.username,
            email: request.email,
            password_hash,
            role: request.role,
        };

        let user = self.store.update_user(id, changes).await?;
        tracing::info!(user_id = %user.id, role = user.role.as_str(), "User updated");
        Ok(user)
    }

    pub async fn delete_user(&self, id: Uuid) -> ApiResult<()> {
        self.store.delete_user(id).await?;
        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }

    async fn hash(&self, password: String) -> ApiResult<String> {
        hash_password(password, self.password_hash_cost)
            .await
            .map_err(|e| ApiError::InternalError(e.to_string()))
    }
}
