//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate the step plan before anything runs
//! - Execute steps once, in plan order, against a shared context
//! - Freeze the capability registry at the build point
//! - Produce an [`Application`] ready to bind a listener
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and no application exists
//! - Steps run sequentially, never concurrently
//! - Dependencies are declared, so ordering mistakes fail before any I/O
//! - Steps after the build point see a read-only registry

use async_trait::async_trait;
use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::{AppConfig, ConfigError, ConfigSource};
use crate::http::pipeline::Pipeline;
use crate::http::HttpServer;
use crate::lifecycle::registry::{CapabilityKey, CapabilityRegistry, RegistryBuilder, RegistryError};
use crate::lifecycle::steps;

/// Plan name of the build point.
pub const BUILD_STEP: &str = "build";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("step '{step}' requires `{capability}`, which no earlier step provides")]
    MissingDependency {
        step: &'static str,
        capability: CapabilityKey,
    },

    #[error("step '{step}' declares `{capability}` but did not register it")]
    NotProvided {
        step: &'static str,
        capability: CapabilityKey,
    },

    #[error("step '{step}' registers `{capability}` after the registry was frozen")]
    RegistryFrozen {
        step: &'static str,
        capability: CapabilityKey,
    },

    #[error("step '{step}' registers `{capability}`, which is already registered")]
    Duplicate {
        step: &'static str,
        capability: CapabilityKey,
    },

    #[error("step '{step}' did not finish within {after:?}")]
    Timeout { step: &'static str, after: Duration },

    #[error("step '{step}' failed: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("no middleware pipeline was assembled")]
    PipelineMissing,
}

impl StartupError {
    /// Wrap a collaborator error raised while running `step`.
    pub fn step<E>(step: &'static str, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        StartupError::Step {
            step,
            source: source.into(),
        }
    }

    fn from_registry(step: &'static str, err: RegistryError) -> Self {
        match err {
            RegistryError::Missing(capability) => StartupError::MissingDependency { step, capability },
            RegistryError::Duplicate(capability) => StartupError::Duplicate { step, capability },
        }
    }
}

/// One ordered unit of startup.
#[async_trait]
pub trait BootstrapStep: Send + Sync {
    fn name(&self) -> &'static str;

    /// Capabilities that must be registered before this step runs.
    fn requires(&self) -> Vec<CapabilityKey> {
        Vec::new()
    }

    /// Capabilities this step registers.
    fn provides(&self) -> Vec<CapabilityKey> {
        Vec::new()
    }

    async fn run(&self, ctx: &mut StartupContext) -> Result<(), StartupError>;
}

enum RegistryState {
    Building(RegistryBuilder),
    Frozen(Arc<CapabilityRegistry>),
}

/// State threaded through the steps.
pub struct StartupContext {
    step: &'static str,
    registry: RegistryState,
    pipeline: Option<Pipeline>,
}

impl StartupContext {
    fn new() -> Self {
        Self {
            step: "",
            registry: RegistryState::Building(RegistryBuilder::new()),
            pipeline: None,
        }
    }

    /// Name of the step currently running.
    pub fn step(&self) -> &'static str {
        self.step
    }

    pub fn register<T: Any + Send + Sync>(&mut self, value: T) -> Result<(), StartupError> {
        let step = self.step;
        match &mut self.registry {
            RegistryState::Building(builder) => builder
                .register(value)
                .map_err(|err| StartupError::from_registry(step, err)),
            RegistryState::Frozen(_) => Err(StartupError::RegistryFrozen {
                step,
                capability: CapabilityKey::of::<T>(),
            }),
        }
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Result<Arc<T>, StartupError> {
        let result = match &self.registry {
            RegistryState::Building(builder) => builder.get::<T>(),
            RegistryState::Frozen(registry) => registry.get::<T>(),
        };
        result.map_err(|err| StartupError::from_registry(self.step, err))
    }

    pub fn resolve<T: Any + Send + Sync + Clone>(&self) -> Result<T, StartupError> {
        self.get::<T>().map(|value| (*value).clone())
    }

    pub fn config(&self) -> Result<Arc<AppConfig>, StartupError> {
        self.get::<AppConfig>()
    }

    /// The frozen registry; `None` before the build point.
    pub fn registry(&self) -> Option<Arc<CapabilityRegistry>> {
        match &self.registry {
            RegistryState::Building(_) => None,
            RegistryState::Frozen(registry) => Some(registry.clone()),
        }
    }

    pub fn install_pipeline(&mut self, pipeline: Pipeline) {
        self.pipeline = Some(pipeline);
    }

    fn contains(&self, key: &CapabilityKey) -> bool {
        match &self.registry {
            RegistryState::Building(builder) => builder.contains(key),
            RegistryState::Frozen(registry) => registry.contains(key),
        }
    }

    fn is_frozen(&self) -> bool {
        matches!(self.registry, RegistryState::Frozen(_))
    }

    fn freeze(&mut self) {
        let state = std::mem::replace(
            &mut self.registry,
            RegistryState::Building(RegistryBuilder::new()),
        );
        self.registry = match state {
            RegistryState::Building(builder) => RegistryState::Frozen(Arc::new(builder.freeze())),
            frozen => frozen,
        };
    }
}

enum PlanEntry {
    Step(Box<dyn BootstrapStep>),
    Freeze,
}

/// Ordered startup plan.
#[derive(Default)]
pub struct Bootstrap {
    plan: Vec<PlanEntry>,
}

impl Bootstrap {
    /// An empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// The fixed plan of the public API.
    pub fn standard(source: ConfigSource) -> Self {
        steps::standard_plan(source)
    }

    /// Append a step.
    pub fn step<S: BootstrapStep + 'static>(mut self, step: S) -> Self {
        self.plan.push(PlanEntry::Step(Box::new(step)));
        self
    }

    /// Append the build point; later steps see a frozen registry.
    pub fn freeze(mut self) -> Self {
        self.plan.push(PlanEntry::Freeze);
        self
    }

    /// Step names in execution order, the build point included.
    pub fn step_names(&self) -> Vec<&'static str> {
        self.plan
            .iter()
            .map(|entry| match entry {
                PlanEntry::Step(step) => step.name(),
                PlanEntry::Freeze => BUILD_STEP,
            })
            .collect()
    }

    /// Check declared dependencies against plan order without running anything.
    pub fn validate(&self) -> Result<(), StartupError> {
        let mut provided = HashSet::new();
        let mut frozen = false;

        for entry in &self.plan {
            let step = match entry {
                PlanEntry::Freeze => {
                    frozen = true;
                    continue;
                }
                PlanEntry::Step(step) => step,
            };

            for capability in step.requires() {
                if !provided.contains(&capability) {
                    return Err(StartupError::MissingDependency {
                        step: step.name(),
                        capability,
                    });
                }
            }
            for capability in step.provides() {
                if frozen {
                    return Err(StartupError::RegistryFrozen {
                        step: step.name(),
                        capability,
                    });
                }
                if !provided.insert(capability) {
                    return Err(StartupError::Duplicate {
                        step: step.name(),
                        capability,
                    });
                }
            }
        }
        Ok(())
    }

    /// Run every step once, in order.
    pub async fn run(self) -> Result<Application, StartupError> {
        self.validate()?;

        let total = self.plan.len();
        let mut ctx = StartupContext::new();
        let mut completed = Vec::with_capacity(total);

        for (index, entry) in self.plan.into_iter().enumerate() {
            match entry {
                PlanEntry::Freeze => {
                    ctx.freeze();
                    tracing::info!(step = BUILD_STEP, "Capability registry frozen");
                    completed.push(BUILD_STEP);
                }
                PlanEntry::Step(step) => {
                    ctx.step = step.name();
                    let started = Instant::now();
                    tracing::debug!(step = step.name(), index = index + 1, total, "Running bootstrap step");

                    if let Err(err) = step.run(&mut ctx).await {
                        tracing::error!(step = step.name(), error = %err, "Bootstrap step failed");
                        return Err(err);
                    }
                    for capability in step.provides() {
                        if !ctx.contains(&capability) {
                            return Err(StartupError::NotProvided {
                                step: step.name(),
                                capability,
                            });
                        }
                    }

                    tracing::info!(
                        step = step.name(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Bootstrap step completed"
                    );
                    completed.push(step.name());
                }
            }
        }

        if !ctx.is_frozen() {
            ctx.freeze();
        }
        Application::from_context(ctx, completed)
    }
}

/// A fully bootstrapped service, ready to accept connections.
pub struct Application {
    config: Arc<AppConfig>,
    registry: Arc<CapabilityRegistry>,
    pipeline: Arc<Pipeline>,
    completed: Vec<&'static str>,
}

impl Application {
    fn from_context(ctx: StartupContext, completed: Vec<&'static str>) -> Result<Self, StartupError> {
        let registry = ctx.registry().ok_or(StartupError::PipelineMissing)?;
        let config = registry
            .get::<AppConfig>()
            .map_err(|err| StartupError::from_registry(BUILD_STEP, err))?;
        let pipeline = ctx.pipeline.ok_or(StartupError::PipelineMissing)?;

        Ok(Self {
            config,
            registry,
            pipeline: Arc::new(pipeline),
            completed,
        })
    }

    pub fn config(&self) -> &Arc<AppConfig> {
        &self.config
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Steps that ran, in order.
    pub fn completed_steps(&self) -> &[&'static str] {
        &self.completed
    }

    /// The HTTP router serving this application.
    pub fn router(&self) -> axum::Router {
        HttpServer::new(self.config.clone(), self.pipeline.clone()).router()
    }

    /// Listener start: serve until `shutdown` fires.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> std::io::Result<()> {
        HttpServer::new(self.config, self.pipeline)
            .run(listener, shutdown)
            .await
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("environment", &self.config.environment)
            .field("capabilities", &self.registry.len())
            .field("stages", &self.pipeline.stage_names())
            .field("completed", &self.completed)
            .finish()
    }
}
