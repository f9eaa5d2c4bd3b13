use axum::response::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// Health check handler.
/// Returns JSON with status and config summary.
pub fn handler(state: &AppState) -> Json<Value> {
    let vendors: Vec<Value> = state
        .vendors()
        .iter()
        .map(|vendor| {
            json!({
                "name": vendor.name(),
                "provider": vendor.provider().to_string(),
            })
        })
        .collect();

    Json(json!({
        "status": "chatrelay is running",
        "config": {
            "vendor_count": state.vendors().len(),
            "default_vendor": state.default_vendor_name(),
            "vendors": vendors,
            "log_level": state.config.features.log_level,
        }
    }))
}
