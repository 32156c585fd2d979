//! Pipeline stages, in execution order.

pub mod exception;
pub mod https_redirect;
pub mod routing;
pub mod cors;
pub mod authorization;
pub mod dispatch;

pub use authorization::AuthorizationStage;
pub use cors::CorsStage;
pub use dispatch::DispatchStage;
pub use exception::ExceptionBoundary;
pub use https_redirect::HttpsRedirect;
pub use routing::{MatchedRoute, RoutingStage};
