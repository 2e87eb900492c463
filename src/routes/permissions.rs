use rocket::serde::json::Json;
use rocket::{State, delete, get, post};
use rocket_okapi::openapi;

use crate::error::ApiError;
use crate::models::{
    ActionRequest, CreatePartyRequest, DataResponse, MessageResponse, PermissionCheck,
};
use crate::permissioning::{PermissionLog, PermissioningConcept};
use crate::routes::helpers::parse_record_id;
use crate::routes::params::PartyLookupParams;

#[openapi(tag = "Permissions")]
#[post("/permissions", data = "<request>")]
pub async fn create_party(
    request: Json<CreatePartyRequest>,
    perms: &State<PermissioningConcept>,
) -> Result<Json<MessageResponse<PermissionLog>>, ApiError> {
    let party = request.party.trim();
    if party.is_empty() {
        return Err(ApiError::BadRequest("'party' must not be empty".to_string()));
    }
    let log = perms.create_party(party).await?;
    Ok(Json(MessageResponse::with_data(
        "Permission log created successfully!",
        log,
    )))
}

#[openapi(tag = "Permissions")]
#[get("/permissions/lookup?<params..>")]
pub async fn lookup_party(
    params: PartyLookupParams,
    perms: &State<PermissioningConcept>,
) -> Result<Json<DataResponse<PermissionLog>>, ApiError> {
    let id = perms.id_from_party(params.party()?).await?;
    Ok(Json(DataResponse::new(perms.log(id).await?)))
}

#[openapi(tag = "Permissions")]
#[get("/permissions/<id>")]
pub async fn get_party(
    id: String,
    perms: &State<PermissioningConcept>,
) -> Result<Json<DataResponse<PermissionLog>>, ApiError> {
    let id = parse_record_id(&id)?;
    Ok(Json(DataResponse::new(perms.log(id).await?)))
}

#[openapi(tag = "Permissions")]
#[post("/permissions/<id>/actions", data = "<request>")]
pub async fn grant_action(
    id: String,
    request: Json<ActionRequest>,
    perms: &State<PermissioningConcept>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_record_id(&id)?;
    let action = request.action.trim();
    if action.is_empty() {
        return Err(ApiError::BadRequest("'action' must not be empty".to_string()));
    }
    perms.grant(id, action).await?;
    Ok(Json(MessageResponse::message(format!("Added perm: {action}!"))))
}

#[openapi(tag = "Permissions")]
#[delete("/permissions/<id>/actions/<action>")]
pub async fn revoke_action(
    id: String,
    action: String,
    perms: &State<PermissioningConcept>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_record_id(&id)?;
    perms.revoke(id, &action).await?;
    Ok(Json(MessageResponse::message(format!("Removed perm: {action}!"))))
}

#[openapi(tag = "Permissions")]
#[get("/permissions/<id>/actions/<action>")]
pub async fn check_action(
    id: String,
    action: String,
    perms: &State<PermissioningConcept>,
) -> Result<Json<DataResponse<PermissionCheck>>, ApiError> {
    let id = parse_record_id(&id)?;
    let granted = perms.has_permission(id, &action).await?;
    Ok(Json(DataResponse::new(PermissionCheck { action, granted })))
}

#[openapi(tag = "Permissions")]
#[delete("/permissions/<id>")]
pub async fn remove_party(
    id: String,
    perms: &State<PermissioningConcept>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_record_id(&id)?;
    perms.remove_party(id).await?;
    Ok(Json(MessageResponse::message("Party deleted!")))
}
