// Public handlers: no bearer token required
pub mod health;

pub use health::{health, root};
