//! Thread endpoints: linking, unthreading and neighbor lookups by item id.

use rocket::serde::json::Json;
use rocket::{State, delete, get, post};
use rocket_okapi::openapi;

use crate::error::ApiError;
use crate::models::{DataResponse, LinkRequest, MessageResponse, ThreadRef};
use crate::routes::helpers::parse_item;
use crate::threading::{ItemId, ThreadView, ThreadingConcept};

/// Place `item` directly after `anchor`, creating a thread if `anchor` is unthreaded.
#[openapi(tag = "Threads")]
#[post("/threads/link", data = "<request>")]
pub async fn link_after(
    request: Json<LinkRequest>,
    threading: &State<ThreadingConcept>,
) -> Result<Json<MessageResponse<ThreadRef>>, ApiError> {
    let anchor = parse_item(&request.anchor)?;
    let item = parse_item(&request.item)?;

    let outcome = threading.link_after(&anchor, &item).await?;

    Ok(Json(MessageResponse::with_data(
        outcome.message(),
        ThreadRef {
            thread: outcome.thread(),
        },
    )))
}

/// Remove an item from whatever thread holds it.
#[openapi(tag = "Threads")]
#[delete("/threads/items/<item>")]
pub async fn unthread(
    item: String,
    threading: &State<ThreadingConcept>,
) -> Result<Json<MessageResponse<ThreadRef>>, ApiError> {
    let item = parse_item(&item)?;
    let outcome = threading.unthread(&item).await?;

    Ok(Json(MessageResponse::with_data(
        outcome.message(&item),
        ThreadRef {
            thread: outcome.thread(),
        },
    )))
}

#[openapi(tag = "Threads")]
#[get("/threads/items/<item>")]
pub async fn get_thread(
    item: String,
    threading: &State<ThreadingConcept>,
) -> Result<Json<DataResponse<ThreadView>>, ApiError> {
    let item = parse_item(&item)?;
    Ok(Json(DataResponse::new(threading.thread_of(&item).await?)))
}

/// Next item in the thread, `null` at the tail.
#[openapi(tag = "Threads")]
#[get("/threads/items/<item>/next")]
pub async fn next_item(
    item: String,
    threading: &State<ThreadingConcept>,
) -> Result<Json<DataResponse<Option<ItemId>>>, ApiError> {
    let item = parse_item(&item)?;
    Ok(Json(DataResponse::new(threading.next(&item).await?)))
}

/// Previous item in the thread, `null` at the head.
#[openapi(tag = "Threads")]
#[get("/threads/items/<item>/prev")]
pub async fn prev_item(
    item: String,
    threading: &State<ThreadingConcept>,
) -> Result<Json<DataResponse<Option<ItemId>>>, ApiError> {
    let item = parse_item(&item)?;
    Ok(Json(DataResponse::new(threading.prev(&item).await?)))
}
