pub mod auth;

pub use auth::{auth_middleware, forward_auth_cookie, AuthUser};
