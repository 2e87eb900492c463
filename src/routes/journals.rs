use rocket::serde::json::Json;
use rocket::{State, delete, get, post};
use rocket_okapi::openapi;

use crate::error::ApiError;
use crate::journaling::{Journal, JournalingConcept};
use crate::models::{CreateJournalRequest, DataResponse, JournalObjectRequest, MessageResponse};
use crate::routes::helpers::parse_record_id;
use crate::routes::params::JournalLookupParams;

fn non_empty<'a>(field: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(format!("'{field}' must not be empty")));
    }
    Ok(trimmed)
}

#[openapi(tag = "Journals")]
#[post("/journals", data = "<request>")]
pub async fn create_journal(
    request: Json<CreateJournalRequest>,
    journaling: &State<JournalingConcept>,
) -> Result<Json<MessageResponse<Journal>>, ApiError> {
    let title = non_empty("title", &request.title)?;
    let owner = non_empty("owner", &request.owner)?;
    let journal = journaling.create(title, owner).await?;
    Ok(Json(MessageResponse::with_data(
        "Journal created successfully!",
        journal,
    )))
}

#[openapi(tag = "Journals")]
#[get("/journals")]
pub async fn list_journals(
    journaling: &State<JournalingConcept>,
) -> Result<Json<DataResponse<Vec<Journal>>>, ApiError> {
    Ok(Json(DataResponse::new(journaling.all_journals().await?)))
}

#[openapi(tag = "Journals")]
#[get("/journals/lookup?<params..>")]
pub async fn lookup_journal(
    params: JournalLookupParams,
    journaling: &State<JournalingConcept>,
) -> Result<Json<DataResponse<Journal>>, ApiError> {
    let journal = journaling
        .journal_by_title(params.title()?, params.owner()?)
        .await?;
    Ok(Json(DataResponse::new(journal)))
}

#[openapi(tag = "Journals")]
#[get("/journals/<id>")]
pub async fn get_journal(
    id: String,
    journaling: &State<JournalingConcept>,
) -> Result<Json<DataResponse<Journal>>, ApiError> {
    let id = parse_record_id(&id)?;
    Ok(Json(DataResponse::new(journaling.journal_by_id(id).await?)))
}

#[openapi(tag = "Journals")]
#[post("/journals/<id>/objects", data = "<request>")]
pub async fn add_object(
    id: String,
    request: Json<JournalObjectRequest>,
    journaling: &State<JournalingConcept>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_record_id(&id)?;
    let object = non_empty("object", &request.object)?;
    journaling.add_object(id, object).await?;
    Ok(Json(MessageResponse::message("Journal successfully updated!")))
}

#[openapi(tag = "Journals")]
#[delete("/journals/<id>/objects/<object>")]
pub async fn remove_object(
    id: String,
    object: String,
    journaling: &State<JournalingConcept>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_record_id(&id)?;
    journaling.remove_object(id, &object).await?;
    Ok(Json(MessageResponse::message("Removed object successfully!")))
}

#[openapi(tag = "Journals")]
#[delete("/journals/<id>")]
pub async fn delete_journal(
    id: String,
    journaling: &State<JournalingConcept>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_record_id(&id)?;
    journaling.delete(id).await?;
    Ok(Json(MessageResponse::message("Journal deleted")))
}
