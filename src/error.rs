use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::{Request, Response};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{RefOr, Response as OpenApiResponse, Responses};
use rocket_okapi::response::OpenApiResponderInner;
use serde::Serialize;
use std::io::Cursor;

use crate::journaling::JournalError;
use crate::permissioning::PermissionError;
use crate::store::StoreError;
use crate::threading::ThreadingError;

#[derive(Debug)]
pub enum ApiError {
    StoreError(StoreError),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::StoreError(_) => Status::InternalServerError,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::BadRequest(_) => Status::BadRequest,
            ApiError::Conflict(_) => Status::Conflict,
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let (error_type, message) = match self {
            ApiError::StoreError(e) => {
                log::error!("store error: {}", e);
                ("StoreError", e.to_string())
            }
            ApiError::NotFound(msg) => {
                log::debug!("not found: {}", msg);
                ("NotFound", msg)
            }
            ApiError::BadRequest(msg) => {
                log::debug!("bad request: {}", msg);
                ("BadRequest", msg)
            }
            ApiError::Conflict(msg) => {
                log::debug!("conflict: {}", msg);
                ("Conflict", msg)
            }
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        let json = serde_json::to_string(&error_response)
            .unwrap_or_else(|_| r#"{"error":"SerializationError","message":"Failed to serialize error"}"#.to_string());

        Response::build()
            .status(status)
            .header(rocket::http::ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}

impl OpenApiResponderInner for ApiError {
    fn responses(_generator: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let mut responses = Responses::default();
        for (code, description) in [
            ("400", "Malformed identifier or request body"),
            ("404", "Record or item not found"),
            ("409", "Operation conflicts with current state; may be retried"),
            ("500", "Document store failure"),
        ] {
            responses.responses.insert(
                code.to_string(),
                RefOr::Object(OpenApiResponse {
                    description: description.to_string(),
                    ..Default::default()
                }),
            );
        }
        Ok(responses)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::StoreError(err)
    }
}

impl From<ThreadingError> for ApiError {
    fn from(err: ThreadingError) -> Self {
        match err {
            ThreadingError::Store(e) => ApiError::StoreError(e),
            ThreadingError::InvalidItem => ApiError::BadRequest(err.to_string()),
            ThreadingError::NotThreaded { .. } => ApiError::NotFound(err.to_string()),
            ThreadingError::AlreadyThreaded { .. } | ThreadingError::Conflict { .. } => {
                ApiError::Conflict(err.to_string())
            }
        }
    }
}

impl From<JournalError> for ApiError {
    fn from(err: JournalError) -> Self {
        match err {
            JournalError::Store(e) => ApiError::StoreError(e),
            JournalError::NotFound(msg) => ApiError::NotFound(msg),
            JournalError::NotAllowed(msg) => ApiError::Conflict(msg),
            JournalError::Conflict(_) => ApiError::Conflict(err.to_string()),
        }
    }
}

impl From<PermissionError> for ApiError {
    fn from(err: PermissionError) -> Self {
        match err {
            PermissionError::Store(e) => ApiError::StoreError(e),
            PermissionError::NotFound(msg) => ApiError::NotFound(msg),
            PermissionError::NotAllowed(msg) => ApiError::Conflict(msg),
            PermissionError::Conflict(_) => ApiError::Conflict(err.to_string()),
        }
    }
}
