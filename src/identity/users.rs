//! User and role management over an [`IdentityStore`].

use std::sync::Arc;

use crate::identity::passwords::{hash_password, new_salt, verify_password};
use crate::persistence::{ApplicationUser, IdentityStore, StoreError};

/// Outcome of a password sign-in attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInResult {
    Succeeded,
    Failed,
    LockedOut,
}

#[derive(Clone)]
pub struct UserManager {
    store: Arc<dyn IdentityStore>,
}

impl UserManager {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    pub async fn find_by_name(&self, user_name: &str) -> Result<Option<ApplicationUser>, StoreError> {
        self.store.find_user(user_name).await
    }

    pub async fn create_user(
        &self,
        user_name: &str,
        email: &str,
        password: &str,
    ) -> Result<ApplicationUser, StoreError> {
        if password.is_empty() {
            return Err(StoreError::Invalid("password must not be empty".into()));
        }
        let salt = new_salt();
        let user = ApplicationUser {
            id: uuid::Uuid::new_v4().to_string(),
            user_name: user_name.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password, &salt),
            salt,
            locked_out: false,
        };
        self.store.insert_user(user.clone()).await?;
        tracing::debug!(user = %user_name, "User created");
        Ok(user)
    }

    /// Check a user name and password pair.
    pub async fn sign_in(&self, user_name: &str, password: &str) -> Result<SignInResult, StoreError> {
        let Some(user) = self.store.find_user(user_name).await? else {
            return Ok(SignInResult::Failed);
        };
        if user.locked_out {
            return Ok(SignInResult::LockedOut);
        }
        if verify_password(password, &user.salt, &user.password_hash) {
            Ok(SignInResult::Succeeded)
        } else {
            Ok(SignInResult::Failed)
        }
    }

    pub async fn role_exists(&self, role: &str) -> Result<bool, StoreError> {
        self.store.role_exists(role).await
    }

    pub async fn create_role(&self, role: &str) -> Result<(), StoreError> {
        self.store.insert_role(role).await
    }

    pub async fn add_to_role(&self, user_name: &str, role: &str) -> Result<(), StoreError> {
        self.store.add_to_role(user_name, role).await
    }

    pub async fn roles_for(&self, user_name: &str) -> Result<Vec<String>, StoreError> {
        self.store.roles_for(user_name).await
    }
}
