// handlers/mod.rs - Handlers split by security tier
//
// Public (no auth) → Protected (allow-list + HTTP Basic auth)
pub mod protected;
pub mod public;
