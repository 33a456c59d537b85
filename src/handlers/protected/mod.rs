// Protected handlers: every route sits behind `jwt_auth_middleware` and
// receives the caller as `Extension<AuthUser>`.
pub mod card;
pub mod content;
pub mod deck;
pub mod deck_content;
pub mod set;
pub mod set_content;
pub mod user;
pub mod utils;
