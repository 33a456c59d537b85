// handlers/mod.rs - Public (no auth) and Protected (bearer token) tiers
pub mod protected;
pub mod public;
