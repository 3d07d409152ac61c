// handlers/protected/mod.rs - Handlers behind the auth gate
//
// Every route here runs after `middleware::auth_gate`, so an authenticated
// `User` is present in the request extensions. Handler bodies run inside
// `database::transactional`: one connection, one transaction per request.
pub mod issues;

pub use issues::{create_issue, list_issues};
