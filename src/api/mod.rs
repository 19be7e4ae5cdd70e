/// API routes and handlers
pub mod health;
pub mod middleware;
pub mod users;

use crate::{config::ServerConfig, context::AppContext};
use axum::Router;

/// Build API routes
pub fn routes(config: &ServerConfig) -> Router<AppContext> {
    Router::new()
        .merge(health::routes())
        .merge(users::routes(config.uploads.max_avatar_bytes))
}
