pub mod auth;

pub use auth::{optional_auth_middleware, require_host, session_auth_middleware, SessionClaims};
