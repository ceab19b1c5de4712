//! HTTP route handlers for the mock service.
//!
//! Everything lives under `/api`, matching the base URL clients are
//! configured with.

pub mod device;
pub mod temperature;
pub mod variables;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Create the main Axum router with all routes.
///
/// Routes are organized as:
/// - `/api/{kind}/read|write`, `/api/read|write/{kind}/{index}` - variables
/// - `/api/variables`, `/api/read_all` - catalog and bulk snapshot
/// - `/api/config`, `/api/status` - device link
/// - `/api/temperature/*` - temperature monitoring
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(variables::routes())
        .merge(device::routes())
        .nest("/temperature", temperature::routes())
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use tower::ServiceExt;

    pub async fn call(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    pub fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }
}
