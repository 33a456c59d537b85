use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

pub const API_PREFIX: &str = "/api/v1";

/// Full application router with state applied.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest(API_PREFIX, public_routes().merge(protected_routes(state.clone())))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{card, deck, deck_content, set, set_content, user};

    Router::new()
        .route("/card", get(card::get).post(card::post).delete(card::delete))
        .route("/deck", get(deck::get).post(deck::post).delete(deck::delete))
        .route(
            "/deck/content",
            get(deck_content::get)
                .post(deck_content::post)
                .delete(deck_content::delete),
        )
        .route("/set", get(set::get).post(set::post).delete(set::delete))
        .route(
            "/set/content",
            get(set_content::get)
                .post(set_content::post)
                .delete(set_content::delete),
        )
        .route("/user", get(user::get).post(user::post).delete(user::delete))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

/// Bind `0.0.0.0:<port>` and serve until the process is stopped.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let bind_addr = format!("0.0.0.0:{}", state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("MTGJSON API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::auth::{HmacVerifier, VerifiedClaims};
    use crate::config::AppConfig;
    use crate::database::MemoryStore;

    const SECRET: &str = "router-test-secret";

    fn state() -> AppState {
        AppState::new(
            AppConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(HmacVerifier::new(SECRET).unwrap()),
        )
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = app(state())
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn protected_routes_require_bearer_token() {
        let response = app(state())
            .oneshot(Request::get("/api/v1/set").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["err"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn authenticated_index_starts_empty() {
        let token = HmacVerifier::new(SECRET)
            .unwrap()
            .issue(&VerifiedClaims::new("alice@x.com", "read:set", 1))
            .unwrap();

        let response = app(state())
            .oneshot(
                Request::get("/api/v1/set")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!([]));
    }
}
