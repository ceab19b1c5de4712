//! Device link routes.
//!
//! ### `GET /api/config` / `POST /api/config` `{ip, port}`
//! The device the service talks to. Changing it does not touch the
//! simulated memory.
//!
//! ### `GET /api/status`
//! `{connected, last_check, error}`.

use axum::{
    extract::State,
    response::Json,
    routing::get,
    Router,
};
use chrono::Utc;
use serde_json::json;
use tracing::info;

use plcdash_core::{ConnectionStatus, DeviceTarget};
use plcdash_protocol::{ConfigReply, ConfigRequest};

use crate::error::MockError;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/config", get(get_config).post(set_config))
        .route("/status", get(get_status))
}

/// GET /api/config
async fn get_config(State(state): State<AppState>) -> Json<serde_json::Value> {
    let device = state.device.read().await;
    let connected = *state.connected.read().await;
    Json(json!({
        "ip": device.ip,
        "port": device.port,
        "connected": connected,
    }))
}

/// POST /api/config
async fn set_config(
    State(state): State<AppState>,
    Json(req): Json<ConfigRequest>,
) -> Json<ConfigReply> {
    let mut device = state.device.write().await;
    *device = DeviceTarget {
        ip: req.ip,
        port: req.port,
    };
    info!("Device target set to {}:{}", device.ip, device.port);

    Json(ConfigReply {
        success: true,
        ip: device.ip.clone(),
        port: device.port,
    })
}

/// GET /api/status
async fn get_status(State(state): State<AppState>) -> Json<ConnectionStatus> {
    let connected = *state.connected.read().await;
    let now = Utc::now();
    Json(ConnectionStatus {
        connected,
        last_check: Some(now.timestamp() as f64 + now.timestamp_subsec_millis() as f64 / 1000.0),
        error: (!connected).then(|| MockError::Disconnected.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::create_router;
    use crate::routes::test_support::{call, get, post};
    use crate::MockService;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_config_round_trip() {
        let state = MockService::default().into_state();
        let app = create_router(state.clone());

        let (status, body) = call(
            app.clone(),
            post("/api/config", json!({"ip": "10.0.0.7", "port": 5020})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "ip": "10.0.0.7", "port": 5020}));

        let (_, body) = call(app, get("/api/config")).await;
        assert_eq!(body["ip"], json!("10.0.0.7"));
        assert_eq!(state.device.read().await.port, 5020);
    }

    #[tokio::test]
    async fn test_status_reports_link() {
        let state = MockService::default().into_state();
        let app = create_router(state.clone());

        let (_, body) = call(app.clone(), get("/api/status")).await;
        assert_eq!(body["connected"], json!(true));
        assert!(body["last_check"].is_number());
        assert!(body["error"].is_null());

        *state.connected.write().await = false;
        let (_, body) = call(app, get("/api/status")).await;
        assert_eq!(body["connected"], json!(false));
        assert_eq!(body["error"], json!("Failed to connect to the PLC"));
    }
}
