//! The standard bootstrap plan.
//!
//! # Responsibilities
//! - One [`BootstrapStep`] per startup concern, in a fixed order
//! - Declare what each step reads and registers so the plan can be
//!   validated before anything runs
//!
//! # Data Flow
//! ```text
//! configuration → persistence → identity → domain services → caching
//!     → authentication → cors → routing → documentation → health
//!     → telemetry → [build] → seeding → middleware
//! ```
//!
//! Listener start is [`Application::serve`](crate::lifecycle::startup::Application::serve).

use async_trait::async_trait;
use axum::http::Method;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::MemoryCache;
use crate::config::{AppConfig, ConfigSource};
use crate::endpoints;
use crate::health::{CatalogStoreCheck, HealthChecks, HealthProbe, IdentityStoreCheck, SelfCheck};
use crate::http::middleware::{
    AuthorizationStage, CorsStage, DispatchStage, ExceptionBoundary, HttpsRedirect, RoutingStage,
};
use crate::http::pipeline::Pipeline;
use crate::identity::{Authenticator, JwtAuthenticator, TokenService, UserManager};
use crate::lifecycle::registry::CapabilityKey;
use crate::lifecycle::startup::{Bootstrap, BootstrapStep, StartupContext, StartupError};
use crate::observability::TelemetrySettings;
use crate::openapi::{self, ApiDocument};
use crate::persistence::seed::{seed_all, CatalogSeed, IdentitySeed};
use crate::persistence::{CatalogRepository, IdentityStore, InMemoryCatalog, InMemoryIdentityStore};
use crate::resilience::{retry_transient, RetryPolicy};
use crate::routing::{RouteSpec, RouteTable, RouteTarget};
use crate::security::{CorsPolicy, PolicyTable};
use crate::services::{CatalogService, UriComposer};

/// Tag of the health records that probe backing stores.
pub const READY_TAG: &str = "ready";

/// Steps 1 to 14 of startup, with the build point after telemetry.
pub fn standard_plan(source: ConfigSource) -> Bootstrap {
    Bootstrap::new()
        .step(ConfigurationStep { source })
        .step(PersistenceStep)
        .step(IdentityStep)
        .step(DomainServicesStep)
        .step(CachingStep)
        .step(AuthenticationStep)
        .step(CorsPolicyStep)
        .step(RoutingStep)
        .step(DocumentationStep)
        .step(HealthChecksStep)
        .step(TelemetryStep)
        .freeze()
        .step(SeedingStep)
        .step(MiddlewareStep)
}

pub struct ConfigurationStep {
    pub source: ConfigSource,
}

#[async_trait]
impl BootstrapStep for ConfigurationStep {
    fn name(&self) -> &'static str {
        "configuration"
    }

    fn provides(&self) -> Vec<CapabilityKey> {
        vec![CapabilityKey::of::<AppConfig>()]
    }

    async fn run(&self, ctx: &mut StartupContext) -> Result<(), StartupError> {
        let config = self.source.load()?;
        tracing::info!(environment = %config.environment, "Configuration loaded");
        ctx.register(config)
    }
}

pub struct PersistenceStep;

#[async_trait]
impl BootstrapStep for PersistenceStep {
    fn name(&self) -> &'static str {
        "persistence"
    }

    fn requires(&self) -> Vec<CapabilityKey> {
        vec![CapabilityKey::of::<AppConfig>()]
    }

    fn provides(&self) -> Vec<CapabilityKey> {
        vec![
            CapabilityKey::of::<Arc<dyn CatalogRepository>>(),
            CapabilityKey::of::<Arc<dyn IdentityStore>>(),
        ]
    }

    async fn run(&self, ctx: &mut StartupContext) -> Result<(), StartupError> {
        let config = ctx.config()?;
        if !config.database.use_only_in_memory {
            return Err(StartupError::step(self.name(), "only the in-memory provider is available"));
        }

        let catalog: Arc<dyn CatalogRepository> = Arc::new(InMemoryCatalog::new());
        let identity: Arc<dyn IdentityStore> = Arc::new(InMemoryIdentityStore::new());
        ctx.register(catalog)?;
        ctx.register(identity)?;
        tracing::info!(provider = "in-memory", "Persistence contexts registered");
        Ok(())
    }
}

pub struct IdentityStep;

#[async_trait]
impl BootstrapStep for IdentityStep {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn requires(&self) -> Vec<CapabilityKey> {
        vec![
            CapabilityKey::of::<AppConfig>(),
            CapabilityKey::of::<Arc<dyn IdentityStore>>(),
        ]
    }

    fn provides(&self) -> Vec<CapabilityKey> {
        vec![CapabilityKey::of::<UserManager>(), CapabilityKey::of::<TokenService>()]
    }

    async fn run(&self, ctx: &mut StartupContext) -> Result<(), StartupError> {
        let config = ctx.config()?;
        let store = ctx.resolve::<Arc<dyn IdentityStore>>()?;
        ctx.register(UserManager::new(store))?;
        ctx.register(TokenService::from_config(&config.identity))
    }
}

pub struct DomainServicesStep;

#[async_trait]
impl BootstrapStep for DomainServicesStep {
    fn name(&self) -> &'static str {
        "domain-services"
    }

    fn requires(&self) -> Vec<CapabilityKey> {
        vec![
            CapabilityKey::of::<AppConfig>(),
            CapabilityKey::of::<Arc<dyn CatalogRepository>>(),
        ]
    }

    fn provides(&self) -> Vec<CapabilityKey> {
        vec![CapabilityKey::of::<UriComposer>(), CapabilityKey::of::<CatalogService>()]
    }

    async fn run(&self, ctx: &mut StartupContext) -> Result<(), StartupError> {
        let config = ctx.config()?;
        let repository = ctx.resolve::<Arc<dyn CatalogRepository>>()?;
        let uris = UriComposer::from_config(&config.base_urls);
        ctx.register(uris.clone())?;
        ctx.register(CatalogService::new(repository, uris))
    }
}

pub struct CachingStep;

#[async_trait]
impl BootstrapStep for CachingStep {
    fn name(&self) -> &'static str {
        "caching"
    }

    fn requires(&self) -> Vec<CapabilityKey> {
        vec![CapabilityKey::of::<AppConfig>()]
    }

    fn provides(&self) -> Vec<CapabilityKey> {
        vec![CapabilityKey::of::<MemoryCache>()]
    }

    async fn run(&self, ctx: &mut StartupContext) -> Result<(), StartupError> {
        let ttl = Duration::from_secs(ctx.config()?.cache.ttl_secs);
        ctx.register(MemoryCache::new(ttl))
    }
}

pub struct AuthenticationStep;

#[async_trait]
impl BootstrapStep for AuthenticationStep {
    fn name(&self) -> &'static str {
        "authentication"
    }

    fn requires(&self) -> Vec<CapabilityKey> {
        vec![CapabilityKey::of::<TokenService>()]
    }

    fn provides(&self) -> Vec<CapabilityKey> {
        vec![CapabilityKey::of::<Arc<dyn Authenticator>>()]
    }

    async fn run(&self, ctx: &mut StartupContext) -> Result<(), StartupError> {
        let tokens = ctx.get::<TokenService>()?;
        let authenticator: Arc<dyn Authenticator> = Arc::new(JwtAuthenticator::new(tokens));
        ctx.register(authenticator)
    }
}

pub struct CorsPolicyStep;

#[async_trait]
impl BootstrapStep for CorsPolicyStep {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn requires(&self) -> Vec<CapabilityKey> {
        vec![CapabilityKey::of::<AppConfig>()]
    }

    fn provides(&self) -> Vec<CapabilityKey> {
        vec![CapabilityKey::of::<CorsPolicy>()]
    }

    async fn run(&self, ctx: &mut StartupContext) -> Result<(), StartupError> {
        let config = ctx.config()?;
        let policy = CorsPolicy::from_config(&config.base_urls, &config.cors);
        tracing::info!(origins = ?policy.origins().collect::<Vec<_>>(), "CORS policy registered");
        ctx.register(policy)
    }
}

/// Application routes plus the reserved health and documentation routes.
pub fn route_specs(config: &AppConfig) -> Vec<RouteSpec> {
    let mut specs = endpoints::routes();
    specs.push(
        RouteSpec::new(
            Method::GET,
            config.health.path.clone(),
            RouteTarget::Health(HealthProbe::named(config.health.self_check.clone())),
        )
        .name("Health")
        .summary("Liveness of the API")
        .tag("Health")
        .requires::<HealthChecks>(),
    );
    if config.documentation.enabled {
        specs.push(
            RouteSpec::handler(Method::GET, config.documentation.path.clone(), openapi::serve_document)
                .name("OpenApiDocument")
                .requires::<ApiDocument>(),
        );
    }
    specs
}

pub struct RoutingStep;

#[async_trait]
impl BootstrapStep for RoutingStep {
    fn name(&self) -> &'static str {
        "routing"
    }

    fn requires(&self) -> Vec<CapabilityKey> {
        vec![CapabilityKey::of::<AppConfig>()]
    }

    fn provides(&self) -> Vec<CapabilityKey> {
        vec![CapabilityKey::of::<PolicyTable>(), CapabilityKey::of::<RouteTable>()]
    }

    async fn run(&self, ctx: &mut StartupContext) -> Result<(), StartupError> {
        let config = ctx.config()?;
        let policies = PolicyTable::standard(&config.identity.admin_role);

        let mut builder = RouteTable::builder();
        for spec in route_specs(&config) {
            builder.add(spec);
        }
        let routes = builder
            .build(&policies)
            .map_err(|err| StartupError::step(self.name(), err))?;

        tracing::info!(routes = routes.len(), "Route table compiled");
        ctx.register(policies)?;
        ctx.register(routes)
    }
}

pub struct DocumentationStep;

#[async_trait]
impl BootstrapStep for DocumentationStep {
    fn name(&self) -> &'static str {
        "documentation"
    }

    fn requires(&self) -> Vec<CapabilityKey> {
        vec![CapabilityKey::of::<AppConfig>(), CapabilityKey::of::<RouteTable>()]
    }

    fn provides(&self) -> Vec<CapabilityKey> {
        vec![CapabilityKey::of::<ApiDocument>()]
    }

    async fn run(&self, ctx: &mut StartupContext) -> Result<(), StartupError> {
        let config = ctx.config()?;
        let routes = ctx.get::<RouteTable>()?;
        let document = ApiDocument::generate(&config.documentation, &routes)
            .map_err(|err| StartupError::step(self.name(), err))?;
        ctx.register(document)
    }
}

pub struct HealthChecksStep;

#[async_trait]
impl BootstrapStep for HealthChecksStep {
    fn name(&self) -> &'static str {
        "health-checks"
    }

    fn requires(&self) -> Vec<CapabilityKey> {
        vec![
            CapabilityKey::of::<AppConfig>(),
            CapabilityKey::of::<Arc<dyn CatalogRepository>>(),
            CapabilityKey::of::<Arc<dyn IdentityStore>>(),
        ]
    }

    fn provides(&self) -> Vec<CapabilityKey> {
        vec![CapabilityKey::of::<HealthChecks>()]
    }

    async fn run(&self, ctx: &mut StartupContext) -> Result<(), StartupError> {
        let config = ctx.config()?;
        let checks = HealthChecks::builder()
            .add(config.health.self_check.clone(), &[], SelfCheck)
            .add(
                "catalog-store",
                &[READY_TAG],
                CatalogStoreCheck(ctx.resolve::<Arc<dyn CatalogRepository>>()?),
            )
            .add(
                "identity-store",
                &[READY_TAG],
                IdentityStoreCheck(ctx.resolve::<Arc<dyn IdentityStore>>()?),
            )
            .timeout(Duration::from_secs(config.health.check_timeout_secs))
            .build();
        tracing::debug!(checks = ?checks.names(), "Health checks registered");
        ctx.register(checks)
    }
}

pub struct TelemetryStep;

#[async_trait]
impl BootstrapStep for TelemetryStep {
    fn name(&self) -> &'static str {
        "telemetry"
    }

    fn requires(&self) -> Vec<CapabilityKey> {
        vec![CapabilityKey::of::<AppConfig>()]
    }

    fn provides(&self) -> Vec<CapabilityKey> {
        vec![CapabilityKey::of::<TelemetrySettings>()]
    }

    async fn run(&self, ctx: &mut StartupContext) -> Result<(), StartupError> {
        let config = ctx.config()?;
        let settings = TelemetrySettings::from_config(&config.telemetry)
            .map_err(|err| StartupError::step(self.name(), err))?;
        settings
            .install()
            .map_err(|err| StartupError::step(self.name(), err))?;
        ctx.register(settings)
    }
}

pub struct SeedingStep;

#[async_trait]
impl BootstrapStep for SeedingStep {
    fn name(&self) -> &'static str {
        "seeding"
    }

    fn requires(&self) -> Vec<CapabilityKey> {
        vec![
            CapabilityKey::of::<AppConfig>(),
            CapabilityKey::of::<Arc<dyn CatalogRepository>>(),
            CapabilityKey::of::<UserManager>(),
        ]
    }

    async fn run(&self, ctx: &mut StartupContext) -> Result<(), StartupError> {
        let config = ctx.config()?;
        if !config.seeding.enabled {
            tracing::info!("Seeding disabled");
            return Ok(());
        }

        let catalog = CatalogSeed::new(ctx.resolve::<Arc<dyn CatalogRepository>>()?);
        let identity = IdentitySeed::new(
            ctx.get::<UserManager>()?,
            config.identity.admin_role.clone(),
            config.seeding.default_password.clone(),
        );
        let policy = RetryPolicy::from_config(&config.seeding);
        let limit = Duration::from_secs(config.timeouts.startup_secs);

        let report = tokio::time::timeout(
            limit,
            retry_transient("seed", policy, || seed_all(&catalog, &identity)),
        )
        .await
        .map_err(|_| StartupError::Timeout {
            step: self.name(),
            after: limit,
        })?
        .map_err(|err| StartupError::step(self.name(), err))?;

        tracing::info!(
            brands = report.brands,
            types = report.types,
            items = report.items,
            roles = report.roles,
            users = report.users,
            "Seeding completed"
        );
        Ok(())
    }
}

pub struct MiddlewareStep;

#[async_trait]
impl BootstrapStep for MiddlewareStep {
    fn name(&self) -> &'static str {
        "middleware"
    }

    fn requires(&self) -> Vec<CapabilityKey> {
        vec![
            CapabilityKey::of::<AppConfig>(),
            CapabilityKey::of::<RouteTable>(),
            CapabilityKey::of::<CorsPolicy>(),
            CapabilityKey::of::<Arc<dyn Authenticator>>(),
        ]
    }

    async fn run(&self, ctx: &mut StartupContext) -> Result<(), StartupError> {
        let registry = ctx
            .registry()
            .ok_or_else(|| StartupError::step(self.name(), "the registry must be frozen before assembly"))?;
        let config = ctx.config()?;
        let routes = ctx.get::<RouteTable>()?;

        // Every route's handler must find its capabilities at request time.
        for route in routes.routes() {
            if let Some(capability) = route.requires.iter().find(|key| !registry.contains(key)) {
                return Err(StartupError::MissingDependency {
                    step: self.name(),
                    capability: *capability,
                });
            }
        }

        let pipeline = Pipeline::builder()
            .stage(ExceptionBoundary::new(config.environment))
            .stage(HttpsRedirect::from_config(&config.listener))
            .stage(RoutingStage::new(routes))
            .stage(CorsStage::new(ctx.get::<CorsPolicy>()?))
            .stage(AuthorizationStage::new(ctx.resolve::<Arc<dyn Authenticator>>()?))
            .stage(DispatchStage::new(registry, config.listener.max_body_bytes))
            .build();

        tracing::info!(stages = ?pipeline.stage_names(), "Request pipeline assembled");
        ctx.install_pipeline(pipeline);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::catalog::testing::FaultyCatalog;
    use crate::persistence::CatalogFilter;

    /// Registers a catalog whose reads never complete.
    struct StalledPersistenceStep;

    #[async_trait]
    impl BootstrapStep for StalledPersistenceStep {
        fn name(&self) -> &'static str {
            "persistence"
        }

        fn provides(&self) -> Vec<CapabilityKey> {
            vec![
                CapabilityKey::of::<Arc<dyn CatalogRepository>>(),
                CapabilityKey::of::<Arc<dyn IdentityStore>>(),
            ]
        }

        async fn run(&self, ctx: &mut StartupContext) -> Result<(), StartupError> {
            let catalog: Arc<dyn CatalogRepository> = Arc::new(FaultyCatalog::stalled());
            let identity: Arc<dyn IdentityStore> = Arc::new(InMemoryIdentityStore::new());
            ctx.register(catalog)?;
            ctx.register(identity)
        }
    }

    fn inline(config: AppConfig) -> Bootstrap {
        standard_plan(ConfigSource::Inline(config))
    }

    #[test]
    fn test_standard_plan_order() {
        let plan = inline(AppConfig::default());
        assert_eq!(
            plan.step_names(),
            vec![
                "configuration",
                "persistence",
                "identity",
                "domain-services",
                "caching",
                "authentication",
                "cors",
                "routing",
                "documentation",
                "health-checks",
                "telemetry",
                "build",
                "seeding",
                "middleware",
            ]
        );
        plan.validate().unwrap();
    }

    #[tokio::test]
    async fn test_run_seeds_and_assembles_pipeline() {
        let app = inline(AppConfig::default()).run().await.unwrap();

        assert_eq!(
            app.pipeline().stage_names(),
            vec!["exception", "https-redirect", "routing", "cors", "authorization", "dispatch"]
        );
        let catalog = app.registry().resolve::<Arc<dyn CatalogRepository>>().unwrap();
        let (_, total) = catalog.list_items(CatalogFilter::default(), 0, None).await.unwrap();
        assert_eq!(total, 12);
        assert_eq!(app.completed_steps().len(), 14);
    }

    #[tokio::test]
    async fn test_invalid_configuration_fails_first_step() {
        let mut config = AppConfig::default();
        config.database.use_only_in_memory = false;
        let err = inline(config).run().await.unwrap_err();
        assert!(matches!(err, StartupError::Config(_)));
    }

    #[tokio::test]
    async fn test_disabled_seeding_leaves_store_empty() {
        let mut config = AppConfig::default();
        config.seeding.enabled = false;
        let app = inline(config).run().await.unwrap();

        let catalog = app.registry().resolve::<Arc<dyn CatalogRepository>>().unwrap();
        assert_eq!(catalog.item_count().await.unwrap(), 0);
    }

    #[test]
    fn test_documentation_route_follows_config() {
        let mut config = AppConfig::default();
        assert_eq!(route_specs(&config).len(), 10);
        config.documentation.enabled = false;
        assert_eq!(route_specs(&config).len(), 9);
    }

    #[tokio::test]
    async fn test_stalled_seeding_times_out() {
        let mut config = AppConfig::default();
        config.timeouts.startup_secs = 1;
        let plan = Bootstrap::new()
            .step(ConfigurationStep {
                source: ConfigSource::Inline(config),
            })
            .step(StalledPersistenceStep)
            .step(IdentityStep)
            .freeze()
            .step(SeedingStep);

        let result = plan.run().await;
        assert!(matches!(
            result,
            Err(StartupError::Timeout { step: "seeding", after }) if after == Duration::from_secs(1)
        ));
    }
}
