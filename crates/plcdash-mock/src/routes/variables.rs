//! Variable routes.
//!
//! # Endpoints
//!
//! ### `POST /api/{kind}/read` `{address}`
//! ### `POST /api/{kind}/write` `{address, value}`
//! Index-in-body convention.
//!
//! ### `GET /api/read/{kind}/{index}`
//! ### `POST /api/write/{kind}/{index}` `{value}`
//! Index-in-path convention.
//!
//! ### `GET /api/variables`
//! The catalog with zero-based addresses.
//!
//! ### `GET /api/read_all`
//! Every catalog variable in one snapshot.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use tracing::{debug, info};

use plcdash_core::address::to_index;
use plcdash_core::{Value, VariableKind};
use plcdash_protocol::{
    codec, ReadAllReply, ReadReply, ReadRequest, SnapshotData, SnapshotEntry, VariablesListing,
    WriteReply, WriteRequest,
};

use crate::error::{MockError, MockResult};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    let mut router = Router::new()
        .route("/variables", get(list_variables))
        .route("/read_all", get(read_all))
        .route("/read/:kind/:index", get(rest_read))
        .route("/write/:kind/:index", post(rest_write));

    for kind in VariableKind::ALL {
        router = router
            .route(
                &format!("/{}/read", kind),
                post(
                    move |State(state): State<AppState>, Json(req): Json<ReadRequest>| {
                        rpc_read(kind, state, req)
                    },
                ),
            )
            .route(
                &format!("/{}/write", kind),
                post(
                    move |State(state): State<AppState>, Json(req): Json<WriteRequest>| {
                        rpc_write(kind, state, req)
                    },
                ),
            );
    }
    router
}

/// REAL values are reported with two decimals.
fn reported(value: Value) -> Value {
    match value {
        Value::Real(r) => Value::Real((r * 100.0).round() / 100.0),
        other => other,
    }
}

fn decode_written(kind: VariableKind, raw: Option<&serde_json::Value>) -> MockResult<Value> {
    match raw {
        None | Some(serde_json::Value::Null) => Err(MockError::MissingValue),
        Some(raw) => {
            codec::decode_value(kind, raw).map_err(|e| MockError::InvalidValue(e.to_string()))
        }
    }
}

async fn read_value(state: &AppState, kind: VariableKind, index: usize) -> MockResult<Value> {
    state.ensure_connected().await?;
    let value = state.registers.read().await.read(kind, index)?;
    debug!("{} read index {} = {}", kind, index, value);
    Ok(reported(value))
}

async fn write_value(
    state: &AppState,
    kind: VariableKind,
    index: usize,
    value: Value,
) -> MockResult<()> {
    state.ensure_connected().await?;
    state.registers.write().await.write(kind, index, value)?;
    info!("{} index {} set to {}", kind, index, value);
    Ok(())
}

/// POST /api/{kind}/read
async fn rpc_read(kind: VariableKind, state: AppState, req: ReadRequest) -> MockResult<Json<ReadReply>> {
    let value = read_value(&state, kind, req.address as usize).await?;
    Ok(Json(ReadReply {
        success: Some(true),
        address: Some(req.address as u32),
        value: value.to_json(),
    }))
}

/// POST /api/{kind}/write
async fn rpc_write(
    kind: VariableKind,
    state: AppState,
    req: WriteRequest,
) -> MockResult<Json<WriteReply>> {
    let value = decode_written(kind, Some(&req.value))?;
    write_value(&state, kind, req.address as usize, value).await?;
    Ok(Json(WriteReply {
        success: true,
        address: Some(req.address as u32),
        value: Some(value.to_json()),
        message: Some(format!(
            "{} {} set to {}",
            kind.as_str().to_uppercase(),
            req.address,
            value
        )),
    }))
}

/// GET /api/read/{kind}/{index}
async fn rest_read(
    State(state): State<AppState>,
    Path((kind, index)): Path<(String, usize)>,
) -> MockResult<Json<ReadReply>> {
    let kind: VariableKind = kind.parse().map_err(MockError::InvalidKind)?;
    let value = read_value(&state, kind, index).await?;
    Ok(Json(ReadReply {
        success: Some(true),
        address: None,
        value: value.to_json(),
    }))
}

/// POST /api/write/{kind}/{index}
async fn rest_write(
    State(state): State<AppState>,
    Path((kind, index)): Path<(String, usize)>,
    Json(body): Json<serde_json::Value>,
) -> MockResult<Json<WriteReply>> {
    let kind: VariableKind = kind.parse().map_err(MockError::InvalidKind)?;
    let value = decode_written(kind, body.get("value"))?;
    write_value(&state, kind, index, value).await?;
    Ok(Json(WriteReply {
        success: true,
        address: None,
        value: None,
        message: None,
    }))
}

/// GET /api/variables
async fn list_variables(State(state): State<AppState>) -> Json<VariablesListing> {
    let catalog = state.catalog.read().await;
    Json(VariablesListing::from_catalog(&catalog))
}

/// GET /api/read_all
async fn read_all(State(state): State<AppState>) -> MockResult<Json<ReadAllReply>> {
    state.ensure_connected().await?;

    let catalog = state.catalog.read().await.clone();
    let registers = state.registers.read().await;
    let mut data = SnapshotData::default();

    for descriptor in catalog.iter() {
        let kind = descriptor.kind();
        let index = to_index(kind, descriptor.address());
        let entry = match usize::try_from(index) {
            Ok(i) => match registers.read(kind, i) {
                Ok(value) => SnapshotEntry {
                    address: i as u32,
                    value: Some(reported(value).to_json()),
                    error: None,
                },
                Err(e) => SnapshotEntry {
                    address: i as u32,
                    value: None,
                    error: Some(e.to_string()),
                },
            },
            Err(_) => SnapshotEntry {
                address: 0,
                value: None,
                error: Some(format!("invalid address {}", descriptor.address())),
            },
        };
        data.insert(kind, descriptor.name(), entry);
    }

    Ok(Json(ReadAllReply {
        success: true,
        data,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::create_router;
    use crate::routes::test_support::{call, get, post};
    use crate::MockService;
    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn app() -> (AppState, Router) {
        let state = MockService::default().into_state();
        (state.clone(), create_router(state))
    }

    #[tokio::test]
    async fn test_rpc_write_then_read() {
        let (_, app) = app();

        let (status, body) = call(
            app.clone(),
            post("/api/int/write", json!({"address": 0, "value": -12})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["message"], json!("INT 0 set to -12"));

        let (_, body) = call(app, post("/api/int/read", json!({"address": 0}))).await;
        assert_eq!(body, json!({"success": true, "address": 0, "value": -12}));
    }

    #[tokio::test]
    async fn test_rest_real_round_trip() {
        let (_, app) = app();

        let (status, _) = call(
            app.clone(),
            post("/api/write/real/1", json!({"value": 21.37})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = call(app, get("/api/read/real/1")).await;
        assert_eq!(body, json!({"success": true, "value": 21.37}));
    }

    #[tokio::test]
    async fn test_real_too_large_for_register() {
        let (_, app) = app();
        call(app.clone(), post("/api/real/write", json!({"address": 1, "value": 4.5}))).await;

        let (status, body) = call(
            app.clone(),
            post("/api/real/write", json!({"address": 1, "value": 1e300})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid value"));

        let (status, _) = call(app.clone(), post("/api/write/real/1", json!({"value": -1e39}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = call(app, post("/api/real/read", json!({"address": 1}))).await;
        assert_eq!(body, json!({"success": true, "address": 1, "value": 4.5}));
    }

    #[tokio::test]
    async fn test_bool_accepts_numeric() {
        let (_, app) = app();
        call(
            app.clone(),
            post("/api/bool/write", json!({"address": 0, "value": 1})),
        )
        .await;
        let (_, body) = call(app, post("/api/bool/read", json!({"address": 0}))).await;
        assert_eq!(body["value"], json!(true));
    }

    #[tokio::test]
    async fn test_errors_use_error_field() {
        let (state, app) = app();

        let (status, body) = call(app.clone(), get("/api/read/word/0")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid type"));

        let (status, body) = call(
            app.clone(),
            post("/api/int/write", json!({"address": 0, "value": 40000})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, _) = call(app.clone(), post("/api/write/int/0", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(app.clone(), post("/api/bool/read", json!({"address": 500}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        *state.connected.write().await = false;
        let (status, body) = call(app, post("/api/bool/read", json!({"address": 0}))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, json!({"error": "Failed to connect to the PLC"}));
    }

    #[tokio::test]
    async fn test_variables_listing() {
        let (_, app) = app();
        let (_, body) = call(app, get("/api/variables")).await;

        assert_eq!(body["bool"][0]["name"], json!("PC_Start"));
        assert_eq!(body["bool"][0]["address"], json!(0));
        assert_eq!(body["real"][0]["address"], json!(1));
    }

    #[tokio::test]
    async fn test_read_all_snapshot() {
        let (state, app) = app();
        {
            let mut registers = state.registers.write().await;
            registers.write_bool(0, true).unwrap();
            registers.write_int(0, 3).unwrap();
            registers.write_real(1, 72.5).unwrap();
        }

        let (_, body) = call(app, get("/api/read_all")).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"]["bool"]["PC_Start"]["value"], json!(true));
        assert_eq!(body["data"]["bool"]["PC_Falha"]["address"], json!(2));
        assert_eq!(body["data"]["int"]["PC_Estado"]["value"], json!(3));
        assert_eq!(body["data"]["real"]["PC_Temp"]["value"], json!(72.5));
    }
}
