//! Identity subsystem.
//!
//! # Data Flow
//! ```text
//! POST /api/authenticate
//!     → UserManager::sign_in (salted hash check)
//!     → TokenService::issue (HS256, name + role claims)
//!
//! Protected request
//!     → Authenticator::authenticate (Authorization: Bearer)
//!     → Principal (name, roles) → authorization policy
//! ```

pub mod authenticator;
pub mod passwords;
pub mod tokens;
pub mod users;

pub use authenticator::{AuthFailure, Authenticator, JwtAuthenticator, Principal};
pub use tokens::{Claims, TokenError, TokenService};
pub use users::{SignInResult, UserManager};
