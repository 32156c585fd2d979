//! Identity context: users, roles and role membership.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use serde::{Deserialize, Serialize};

use super::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationUser {
    pub id: String,
    pub user_name: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub locked_out: bool,
}

/// Names are matched case-insensitively, like a normalized user name column.
pub fn normalize(name: &str) -> String {
    name.trim().to_uppercase()
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_user(&self, user_name: &str) -> Result<Option<ApplicationUser>, StoreError>;
    async fn insert_user(&self, user: ApplicationUser) -> Result<(), StoreError>;
    async fn user_count(&self) -> Result<usize, StoreError>;

    async fn role_exists(&self, role: &str) -> Result<bool, StoreError>;
    async fn insert_role(&self, role: &str) -> Result<(), StoreError>;

    /// Adding an existing membership is a no-op.
    async fn add_to_role(&self, user_name: &str, role: &str) -> Result<(), StoreError>;
    async fn roles_for(&self, user_name: &str) -> Result<Vec<String>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    users: DashMap<String, ApplicationUser>,
    roles: DashMap<String, String>,
    memberships: DashSet<(String, String)>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_user(&self, user_name: &str) -> Result<Option<ApplicationUser>, StoreError> {
        Ok(self.users.get(&normalize(user_name)).map(|r| r.value().clone()))
    }

    async fn insert_user(&self, user: ApplicationUser) -> Result<(), StoreError> {
        match self.users.entry(normalize(&user.user_name)) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(format!(
                "User name '{}' is already taken",
                user.user_name
            ))),
            Entry::Vacant(slot) => {
                slot.insert(user);
                Ok(())
            }
        }
    }

    async fn user_count(&self) -> Result<usize, StoreError> {
        Ok(self.users.len())
    }

    async fn role_exists(&self, role: &str) -> Result<bool, StoreError> {
        Ok(self.roles.contains_key(&normalize(role)))
    }

    async fn insert_role(&self, role: &str) -> Result<(), StoreError> {
        match self.roles.entry(normalize(role)) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(format!("Role '{role}' already exists"))),
            Entry::Vacant(slot) => {
                slot.insert(role.to_string());
                Ok(())
            }
        }
    }

    async fn add_to_role(&self, user_name: &str, role: &str) -> Result<(), StoreError> {
        let user_key = normalize(user_name);
        let role_key = normalize(role);
        if !self.users.contains_key(&user_key) {
            return Err(StoreError::NotFound(format!("User '{user_name}' not found")));
        }
        if !self.roles.contains_key(&role_key) {
            return Err(StoreError::NotFound(format!("Role '{role}' not found")));
        }
        self.memberships.insert((user_key, role_key));
        Ok(())
    }

    async fn roles_for(&self, user_name: &str) -> Result<Vec<String>, StoreError> {
        let user_key = normalize(user_name);
        let mut roles: Vec<String> = self
            .memberships
            .iter()
            .filter(|membership| membership.0 == user_key)
            .filter_map(|membership| self.roles.get(&membership.1).map(|r| r.value().clone()))
            .collect();
        roles.sort();
        Ok(roles)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> ApplicationUser {
        ApplicationUser {
            id: name.into(),
            user_name: name.into(),
            email: name.into(),
            password_hash: String::new(),
            salt: String::new(),
            locked_out: false,
        }
    }

    #[tokio::test]
    async fn test_user_names_are_case_insensitive() {
        let store = InMemoryIdentityStore::new();
        store.insert_user(user("demouser@microsoft.com")).await.unwrap();
        assert!(store.find_user("DemoUser@Microsoft.com").await.unwrap().is_some());
        assert!(matches!(
            store.insert_user(user("DEMOUSER@microsoft.com")).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_role_membership_is_idempotent() {
        let store = InMemoryIdentityStore::new();
        store.insert_user(user("admin@microsoft.com")).await.unwrap();
        store.insert_role("Administrators").await.unwrap();
        store.add_to_role("admin@microsoft.com", "Administrators").await.unwrap();
        store.add_to_role("admin@microsoft.com", "administrators").await.unwrap();

        assert_eq!(
            store.roles_for("admin@microsoft.com").await.unwrap(),
            vec!["Administrators".to_string()]
        );
    }

    #[tokio::test]
    async fn test_membership_requires_known_role() {
        let store = InMemoryIdentityStore::new();
        store.insert_user(user("demouser@microsoft.com")).await.unwrap();
        assert!(matches!(
            store.add_to_role("demouser@microsoft.com", "Administrators").await,
            Err(StoreError::NotFound(_))
        ));
    }
}
