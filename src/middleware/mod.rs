pub mod auth;

pub use auth::{auth_gate, authenticate, AuthError, BasicCredentials};
