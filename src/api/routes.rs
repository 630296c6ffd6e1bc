use axum::{
    extract::FromRef,
    middleware::{from_fn, from_fn_with_state},
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::api::{items, lost_found, messages};
use crate::auth::{
    api as auth_api, auth_middleware, AuthService, AuthState, EmailPolicy, JwtHandler,
    PasswordHasher, UserStore,
};
use crate::db::Database;
use crate::marketplace::MarketStore;
use crate::middleware::request_logging;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub market: MarketStore,
    pub jwt: Arc<JwtHandler>,
}

impl AppState {
    /// Wire the stores and the auth service over one database
    pub fn new(
        db: Database,
        jwt: Arc<JwtHandler>,
        hasher: Arc<dyn PasswordHasher>,
        email_policy: EmailPolicy,
    ) -> Self {
        let users = UserStore::new(db.clone());
        let service = AuthService::new(users, hasher, jwt.clone(), email_policy);

        Self {
            auth: AuthState::new(service),
            market: MarketStore::new(db),
            jwt,
        }
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    // Everything here sits behind the access guard
    let protected = Router::new()
        .route("/api/dashboard", get(auth_api::dashboard))
        .route("/api/profile", put(auth_api::update_profile))
        .route("/api/my-items", get(items::my_items))
        .route("/api/items", get(items::list_items).post(items::create_item))
        .route("/api/items/:id", get(items::get_item))
        .route(
            "/api/lost-found",
            get(lost_found::list_posts).post(lost_found::create_post),
        )
        .route(
            "/api/messages",
            get(messages::inbox).post(messages::send_message),
        )
        .route_layer(from_fn_with_state(state.jwt.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/register", post(auth_api::register))
        .route("/api/login", post(auth_api::login))
        .merge(protected)
        .layer(from_fn(request_logging))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ===== Route Handlers =====

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{BcryptHasher, PasswordConfig, TokenConfig};
    use axum::{
        body::Body,
        http::{header::AUTHORIZATION, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> (Router, AppState) {
        let db = Database::in_memory().unwrap();
        let jwt = Arc::new(JwtHandler::new(TokenConfig {
            secret: "routes-test-secret".to_string(),
        }));
        let hasher = Arc::new(BcryptHasher::new(PasswordConfig { cost: 4 }));
        let state = AppState::new(db, jwt, hasher, EmailPolicy::new("ku.edu.np"));
        (create_router(state.clone()), state)
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn register_and_login(app: &Router, name: &str, email: &str) -> (String, i64) {
        let (status, _) = send(
            app,
            json_request(
                "POST",
                "/api/register",
                None,
                json!({ "name": name, "email": email, "password": "hunter22" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            app,
            json_request(
                "POST",
                "/api/login",
                None,
                json!({ "email": email, "password": "hunter22" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let login: Value = serde_json::from_slice(&body).unwrap();
        (
            login["token"].as_str().unwrap().to_string(),
            login["user"]["id"].as_i64().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let (app, _) = test_app();
        let (status, body) = send(&app, get_request("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, "healthy");
    }

    #[tokio::test]
    async fn test_every_protected_route_requires_token() {
        let (app, _) = test_app();
        let routes = [
            ("GET", "/api/dashboard"),
            ("PUT", "/api/profile"),
            ("GET", "/api/my-items"),
            ("GET", "/api/items"),
            ("POST", "/api/items"),
            ("GET", "/api/items/1"),
            ("GET", "/api/lost-found"),
            ("POST", "/api/lost-found"),
            ("GET", "/api/messages"),
            ("POST", "/api/messages"),
        ];

        for (method, uri) in routes {
            let req = Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            let (status, _) = send(&app, req).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");

            let req = Request::builder()
                .method(method)
                .uri(uri)
                .header(AUTHORIZATION, "Bearer not.a.token")
                .body(Body::empty())
                .unwrap();
            let (status, _) = send(&app, req).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn test_item_lifecycle() {
        let (app, _) = test_app();
        let (token, seller_id) = register_and_login(&app, "Sita", "sita@ku.edu.np").await;

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/items",
                Some(&token),
                json!({ "title": "Desk lamp", "price": 800.0, "category": "Electronics" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(created["message"], "Item listed successfully");
        let item_id = created["id"].as_i64().unwrap();

        let (status, body) = send(&app, get_request("/api/items?maxPrice=1000", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        let listings: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(listings.as_array().unwrap().len(), 1);
        assert_eq!(listings[0]["seller_name"], "Sita");
        assert_eq!(listings[0]["user_id"], seller_id);

        let (status, body) = send(
            &app,
            get_request(&format!("/api/items/{item_id}"), Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let detail: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(detail["seller_email"], "sita@ku.edu.np");

        let (status, body) = send(&app, get_request("/api/items/9999", Some(&token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let err: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(err["error"], "Item not found");

        let (status, body) = send(&app, get_request("/api/my-items", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        let mine: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(mine[0]["id"], item_id);
    }

    #[tokio::test]
    async fn test_blank_filter_fields_are_ignored() {
        let (app, _) = test_app();
        let (token, _) = register_and_login(&app, "Nima", "nima@ku.edu.np").await;

        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/items",
                Some(&token),
                json!({ "title": "Kettle", "price": 1500.0 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            &app,
            get_request("/api/items?category=&search=&maxPrice=", Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let listings: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(listings.as_array().unwrap().len(), 1);

        let (status, body) = send(&app, get_request("/api/items?maxPrice=1000", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        let listings: Value = serde_json::from_slice(&body).unwrap();
        assert!(listings.as_array().unwrap().is_empty());

        let (status, _) = send(&app, get_request("/api/lost-found?type=", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_item_rejected() {
        let (app, _) = test_app();
        let (token, _) = register_and_login(&app, "Gita", "gita@ku.edu.np").await;

        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/items",
                Some(&token),
                json!({ "title": "Chair", "price": -5.0 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_message_sender_comes_from_token() {
        let (app, _) = test_app();
        let (alice, alice_id) = register_and_login(&app, "Alice", "alice@ku.edu.np").await;
        let (bob, bob_id) = register_and_login(&app, "Bob", "bob@ku.edu.np").await;

        // A forged sender_id in the body is ignored
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/messages",
                Some(&alice),
                json!({ "receiver_id": bob_id, "content": "Still for sale?", "sender_id": bob_id }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(&body[..], b"Message sent");

        let (status, body) = send(&app, get_request("/api/messages", Some(&bob))).await;
        assert_eq!(status, StatusCode::OK);
        let inbox: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(inbox.as_array().unwrap().len(), 1);
        assert_eq!(inbox[0]["sender_id"], alice_id);
        assert_eq!(inbox[0]["sender_name"], "Alice");

        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/messages",
                Some(&alice),
                json!({ "receiver_id": 424242, "content": "hello?" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_lost_found_filter() {
        let (app, _) = test_app();
        let (token, _) = register_and_login(&app, "Hari", "hari@ku.edu.np").await;

        for (kind, title) in [("Lost", "Wallet"), ("Found", "Umbrella")] {
            let (status, body) = send(
                &app,
                json_request(
                    "POST",
                    "/api/lost-found",
                    Some(&token),
                    json!({ "type": kind, "title": title, "date_lost_found": "2025-02-01" }),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            let created: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(created["message"], "Post created successfully");
        }

        let (status, body) = send(&app, get_request("/api/lost-found?type=Found", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        let posts: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(posts.as_array().unwrap().len(), 1);
        assert_eq!(posts[0]["title"], "Umbrella");
        assert_eq!(posts[0]["user_name"], "Hari");

        let (status, body) = send(&app, get_request("/api/lost-found", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        let posts: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(posts.as_array().unwrap().len(), 2);
    }
}
