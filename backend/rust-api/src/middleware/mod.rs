pub mod auth;
pub mod security_headers;

pub use auth::{auth_middleware, authenticate, issue_token, AuthUser, Claims};
pub use security_headers::security_headers_middleware;
