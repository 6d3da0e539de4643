use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use crate::errors::AgentrailError;

impl IntoResponse for AgentrailError {
    fn into_response(self) -> axum::response::Response {
        let class = self.classify();
        let status = StatusCode::from_u16(class.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut body = json!({"error": self.to_string(), "type": class.error_type});
        if let Some(execution) = self.chain_execution() {
            body["execution"] = serde_json::to_value(execution).unwrap_or_default();
        }

        (status, Json(body)).into_response()
    }
}
