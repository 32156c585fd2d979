//! Authorization policies.
//!
//! Routes name a policy; the policy table maps names to requirements.
//! Unknown names are rejected when the route table is compiled.

use std::collections::HashMap;

use crate::identity::Principal;

pub const ANONYMOUS: &str = "anonymous";
pub const AUTHENTICATED: &str = "authenticated";
pub const ADMIN: &str = "admin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthPolicy {
    /// No credentials needed.
    Anonymous,
    /// Any valid principal.
    Authenticated,
    /// A valid principal in the given role.
    RequireRole(String),
}

impl AuthPolicy {
    pub fn requires_authentication(&self) -> bool {
        !matches!(self, AuthPolicy::Anonymous)
    }

    /// Whether an authenticated principal satisfies the policy.
    pub fn permits(&self, principal: &Principal) -> bool {
        match self {
            AuthPolicy::Anonymous | AuthPolicy::Authenticated => true,
            AuthPolicy::RequireRole(role) => principal.is_in_role(role),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    policies: HashMap<String, AuthPolicy>,
}

impl PolicyTable {
    /// `anonymous`, `authenticated` and `admin` (members of `admin_role`).
    pub fn standard(admin_role: &str) -> Self {
        let mut table = Self::default();
        table.insert(ANONYMOUS, AuthPolicy::Anonymous);
        table.insert(AUTHENTICATED, AuthPolicy::Authenticated);
        table.insert(ADMIN, AuthPolicy::RequireRole(admin_role.to_string()));
        table
    }

    pub fn insert(&mut self, name: impl Into<String>, policy: AuthPolicy) {
        self.policies.insert(name.into(), policy);
    }

    pub fn get(&self, name: &str) -> Option<&AuthPolicy> {
        self.policies.get(name)
    }
}
