//! Request and response payloads for the HTTP API.

use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ===== Envelopes =====

/// Wrapper for read endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Wrapper for mutating endpoints: a human-readable message plus an optional payload.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MessageResponse<T = ()> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl MessageResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }
}

impl<T> MessageResponse<T> {
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
        }
    }
}

// ===== Threads =====

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LinkRequest {
    /// Item the new item is placed after.
    pub anchor: String,
    pub item: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ThreadRef {
    pub thread: Uuid,
}

// ===== Journals =====

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateJournalRequest {
    pub title: String,
    pub owner: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JournalObjectRequest {
    pub object: String,
}

// ===== Permissions =====

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreatePartyRequest {
    pub party: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ActionRequest {
    pub action: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PermissionCheck {
    pub action: String,
    pub granted: bool,
}
