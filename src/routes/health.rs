//! Liveness probe.
//!
//! Only checks that the process answers HTTP; it does not ping the target,
//! so an external monitor can tell "monitor down" apart from "target down".

use axum::Json;
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
