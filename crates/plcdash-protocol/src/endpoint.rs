//! Request shapes for every service endpoint.
//!
//! Paths are relative to the service base URL (which carries the `/api`
//! prefix). Indices passed here are already zero-based; address mapping
//! happens before a request is built.

use crate::messages::{AnalyzeRequest, ConfigRequest, ReadRequest, WriteRequest, WriteValue};
use plcdash_core::config::ApiStyle;
use plcdash_core::{DeviceTarget, Value, VariableKind};
use serde::Serialize;

/// HTTP method of a service request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A fully described request to the remote service.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    /// Path with query string, starting with `/`.
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn post<B: Serialize>(path: impl Into<String>, body: &B) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            // serializing plain data structs cannot fail
            body: Some(serde_json::to_value(body).unwrap_or(serde_json::Value::Null)),
        }
    }
}

impl std::fmt::Display for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let method = match self.method {
            Method::Get => "GET",
            Method::Post => "POST",
        };
        write!(f, "{} {}", method, self.path)
    }
}

/// Read one variable.
pub fn read(style: ApiStyle, kind: VariableKind, index: u16) -> HttpRequest {
    match style {
        ApiStyle::Rpc => HttpRequest::post(
            format!("/{}/read", kind.as_str()),
            &ReadRequest { address: index },
        ),
        ApiStyle::Rest => HttpRequest::get(format!("/read/{}/{}", kind.as_str(), index)),
    }
}

/// Write one variable.
pub fn write(style: ApiStyle, kind: VariableKind, index: u16, value: &Value) -> HttpRequest {
    match style {
        ApiStyle::Rpc => HttpRequest::post(
            format!("/{}/write", kind.as_str()),
            &WriteRequest {
                address: index,
                value: value.to_json(),
            },
        ),
        ApiStyle::Rest => HttpRequest::post(
            format!("/write/{}/{}", kind.as_str(), index),
            &WriteValue {
                value: value.to_json(),
            },
        ),
    }
}

pub fn variables() -> HttpRequest {
    HttpRequest::get("/variables")
}

pub fn read_all() -> HttpRequest {
    HttpRequest::get("/read_all")
}

pub fn status() -> HttpRequest {
    HttpRequest::get("/status")
}

pub fn configure(target: &DeviceTarget) -> HttpRequest {
    HttpRequest::post(
        "/config",
        &ConfigRequest {
            ip: target.ip.clone(),
            port: target.port,
        },
    )
}

pub fn temperature_current() -> HttpRequest {
    HttpRequest::get("/temperature/current")
}

pub fn temperature_history(limit: usize) -> HttpRequest {
    HttpRequest::get(format!("/temperature/history?limit={}", limit))
}

pub fn temperature_stats(hours: u32) -> HttpRequest {
    HttpRequest::get(format!("/temperature/stats?hours={}", hours))
}

pub fn temperature_analyze(limit: usize, hours: u32) -> HttpRequest {
    HttpRequest::post("/temperature/analyze", &AnalyzeRequest { limit, hours })
}

pub fn temperature_report(hours: u32) -> HttpRequest {
    HttpRequest::get(format!("/temperature/report?hours={}", hours))
}
