//! Query parameter helpers shared by lookup endpoints.
//!
//! These follow Rocket's `FromForm` conventions and derive `JsonSchema` so the
//! generated OpenAPI document lists the accepted parameters.

use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

fn required<'a>(name: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Query parameter '{name}' must not be empty"
        )));
    }
    Ok(trimmed)
}

/// Query parameters for finding a journal by title and owner.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, rocket::form::FromForm)]
pub struct JournalLookupParams {
    pub title: String,
    pub owner: String,
}

impl JournalLookupParams {
    pub fn title(&self) -> Result<&str, ApiError> {
        required("title", &self.title)
    }

    pub fn owner(&self) -> Result<&str, ApiError> {
        required("owner", &self.owner)
    }
}

/// Query parameters for finding a permission log by party name.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, rocket::form::FromForm)]
pub struct PartyLookupParams {
    pub party: String,
}

impl PartyLookupParams {
    pub fn party(&self) -> Result<&str, ApiError> {
        required("party", &self.party)
    }
}
