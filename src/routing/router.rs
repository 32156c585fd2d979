//! Declarative route table.
//!
//! Routes are declared as [`RouteSpec`]s while bootstrapping, resolved
//! against the policy table, and compiled into an immutable [`RouteTable`]
//! backed by a `matchit` radix tree (one tree node per path pattern, methods
//! dispatched per node).

use axum::http::Method;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::endpoints::EndpointHandler;
use crate::health::HealthProbe;
use crate::lifecycle::registry::CapabilityKey;
use crate::security::policy::{AuthPolicy, PolicyTable, ANONYMOUS};

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route {method} {path} is declared twice")]
    Conflict { method: Method, path: String },

    #[error("invalid route pattern '{path}': {source}")]
    Pattern {
        path: String,
        #[source]
        source: matchit::InsertError,
    },

    #[error("route '{route}' references unknown authorization policy '{policy}'")]
    UnknownPolicy { route: String, policy: String },
}

/// What a matched route does.
#[derive(Clone)]
pub enum RouteTarget {
    /// Dispatch to an endpoint handler.
    Handler(Arc<dyn EndpointHandler>),
    /// Answer from the health record set, bypassing handlers.
    Health(HealthProbe),
}

impl fmt::Debug for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteTarget::Handler(_) => f.write_str("Handler"),
            RouteTarget::Health(probe) => write!(f, "Health({probe:?})"),
        }
    }
}

/// A declared route, before policy resolution.
#[derive(Debug, Clone)]
pub struct RouteSpec {
    name: String,
    method: Method,
    path: String,
    target: RouteTarget,
    policy: String,
    requires: Vec<CapabilityKey>,
    summary: Option<String>,
    tag: Option<String>,
}

impl RouteSpec {
    pub fn new(method: Method, path: impl Into<String>, target: RouteTarget) -> Self {
        let path = path.into();
        Self {
            name: format!("{method} {path}"),
            method,
            path,
            target,
            policy: ANONYMOUS.to_string(),
            requires: Vec::new(),
            summary: None,
            tag: None,
        }
    }

    pub fn handler<H: EndpointHandler + 'static>(method: Method, path: impl Into<String>, handler: H) -> Self {
        Self::new(method, path, RouteTarget::Handler(Arc::new(handler)))
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Authorization policy by name (see [`PolicyTable`]).
    pub fn policy(mut self, policy: impl Into<String>) -> Self {
        self.policy = policy.into();
        self
    }

    /// Capability the handler resolves at request time.
    pub fn requires<T: ?Sized + 'static>(mut self) -> Self {
        self.requires.push(CapabilityKey::of::<T>());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// A compiled route.
#[derive(Debug)]
pub struct RouteEntry {
    pub name: String,
    pub method: Method,
    pub path: String,
    pub target: RouteTarget,
    pub policy_name: String,
    pub policy: AuthPolicy,
    pub requires: Vec<CapabilityKey>,
    pub summary: Option<String>,
    pub tag: Option<String>,
}

/// Captured path parameters, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Outcome of a route lookup.
#[derive(Debug)]
pub enum RouteMatch {
    Found {
        route: Arc<RouteEntry>,
        params: PathParams,
    },
    MethodNotAllowed {
        allowed: Vec<Method>,
    },
    NotFound,
}

#[derive(Default)]
pub struct RouteTableBuilder {
    specs: Vec<RouteSpec>,
}

impl RouteTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, spec: RouteSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn add(&mut self, spec: RouteSpec) {
        self.specs.push(spec);
    }

    /// Resolve policies and compile the lookup tree.
    pub fn build(self, policies: &PolicyTable) -> Result<RouteTable, RouteError> {
        let mut tree = matchit::Router::new();
        let mut slots: Vec<Vec<Arc<RouteEntry>>> = Vec::new();
        let mut slot_by_path: HashMap<String, usize> = HashMap::new();
        let mut routes = Vec::with_capacity(self.specs.len());

        for spec in self.specs {
            let policy = policies
                .get(&spec.policy)
                .cloned()
                .ok_or_else(|| RouteError::UnknownPolicy {
                    route: spec.name.clone(),
                    policy: spec.policy.clone(),
                })?;

            let entry = Arc::new(RouteEntry {
                name: spec.name,
                method: spec.method,
                path: spec.path,
                target: spec.target,
                policy_name: spec.policy,
                policy,
                requires: spec.requires,
                summary: spec.summary,
                tag: spec.tag,
            });

            let slot = match slot_by_path.get(&entry.path) {
                Some(&slot) => slot,
                None => {
                    let slot = slots.len();
                    tree.insert(entry.path.clone(), slot)
                        .map_err(|source| RouteError::Pattern {
                            path: entry.path.clone(),
                            source,
                        })?;
                    slots.push(Vec::new());
                    slot_by_path.insert(entry.path.clone(), slot);
                    slot
                }
            };

            if slots[slot].iter().any(|existing| existing.method == entry.method) {
                return Err(RouteError::Conflict {
                    method: entry.method.clone(),
                    path: entry.path.clone(),
                });
            }
            slots[slot].push(entry.clone());
            routes.push(entry);
        }

        Ok(RouteTable {
            routes,
            tree,
            slots,
        })
    }
}

/// Immutable route lookup table.
pub struct RouteTable {
    routes: Vec<Arc<RouteEntry>>,
    tree: matchit::Router<usize>,
    slots: Vec<Vec<Arc<RouteEntry>>>,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::new()
    }

    pub fn at(&self, method: &Method, path: &str) -> RouteMatch {
        let Ok(matched) = self.tree.at(path) else {
            return RouteMatch::NotFound;
        };

        let candidates = &self.slots[*matched.value];
        match candidates.iter().find(|route| route.method == *method) {
            Some(route) => RouteMatch::Found {
                route: route.clone(),
                params: PathParams(
                    matched
                        .params
                        .iter()
                        .map(|(key, value)| (key.to_string(), value.to_string()))
                        .collect(),
                ),
            },
            None => RouteMatch::MethodNotAllowed {
                allowed: candidates.iter().map(|route| route.method.clone()).collect(),
            },
        }
    }

    /// Routes in declaration order.
    pub fn routes(&self) -> impl Iterator<Item = &Arc<RouteEntry>> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|route| format!("{} {}", route.method, route.path)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::policy::ADMIN;

    fn table() -> RouteTable {
        let policies = PolicyTable::standard("Administrators");
        RouteTable::builder()
            .route(RouteSpec::new(Method::GET, "/api/health", RouteTarget::Health(HealthProbe::named("selfapi"))))
            .route(RouteSpec::new(Method::GET, "/api/catalog-items/{catalogItemId}", RouteTarget::Health(HealthProbe::named("x"))))
            .route(
                RouteSpec::new(Method::DELETE, "/api/catalog-items/{catalogItemId}", RouteTarget::Health(HealthProbe::named("x")))
                    .policy(ADMIN),
            )
            .build(&policies)
            .unwrap()
    }

    #[test]
    fn test_match_with_params() {
        match table().at(&Method::GET, "/api/catalog-items/7") {
            RouteMatch::Found { route, params } => {
                assert_eq!(route.path, "/api/catalog-items/{catalogItemId}");
                assert_eq!(params.get("catalogItemId"), Some("7"));
                assert_eq!(route.policy, AuthPolicy::Anonymous);
            }
            other => panic!("unexpected match: {other:?}"),
        }
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        match table().at(&Method::PUT, "/api/catalog-items/7") {
            RouteMatch::MethodNotAllowed { allowed } => {
                assert_eq!(allowed, vec![Method::GET, Method::DELETE]);
            }
            other => panic!("unexpected match: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_path() {
        assert!(matches!(table().at(&Method::GET, "/nope"), RouteMatch::NotFound));
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let policies = PolicyTable::standard("Administrators");
        let result = RouteTable::builder()
            .route(RouteSpec::new(Method::GET, "/a", RouteTarget::Health(HealthProbe::named("x"))))
            .route(RouteSpec::new(Method::GET, "/a", RouteTarget::Health(HealthProbe::named("y"))))
            .build(&policies);
        assert!(matches!(result, Err(RouteError::Conflict { .. })));
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let policies = PolicyTable::standard("Administrators");
        let result = RouteTable::builder()
            .route(RouteSpec::new(Method::GET, "/a", RouteTarget::Health(HealthProbe::named("x"))).policy("superusers"))
            .build(&policies);
        assert!(matches!(result, Err(RouteError::UnknownPolicy { .. })));
    }
}
