//! Service health endpoint used for readiness checks and tests.

use rocket::serde::json::Json;
use rocket::{State, get};
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

use crate::config::{ServerConfig, StoreBackend};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    pub status: String,
    /// Document store backend the concepts run on (`memory` or `postgres`).
    pub store: String,
}

#[openapi(tag = "Health")]
#[get("/health")]
pub fn health_check(config: &State<ServerConfig>) -> Json<HealthResponse> {
    let store = match config.store_backend {
        StoreBackend::Memory => "memory",
        StoreBackend::Postgres => "postgres",
    };
    Json(HealthResponse {
        status: "ok".to_string(),
        store: store.to_string(),
    })
}
