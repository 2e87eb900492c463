//! HTTP route handlers grouped by concept.
//!
//! Each submodule exposes typed Rocket handlers annotated with `#[openapi]`
//! so `rocket_okapi` can derive an OpenAPI document automatically.

use rocket::Route;
use rocket_okapi::openapi_get_routes;

pub mod health;
pub(crate) mod helpers;
pub mod journals;
pub mod params;
pub mod permissions;
pub mod threads;

/// Every API route plus `openapi.json`, to be mounted under `/api/v1`.
pub fn api_routes() -> Vec<Route> {
    openapi_get_routes![
        // Health
        health::health_check,
        // Threads
        threads::link_after,
        threads::unthread,
        threads::get_thread,
        threads::next_item,
        threads::prev_item,
        // Journals
        journals::create_journal,
        journals::list_journals,
        journals::lookup_journal,
        journals::get_journal,
        journals::add_object,
        journals::remove_object,
        journals::delete_journal,
        // Permissions
        permissions::create_party,
        permissions::lookup_party,
        permissions::get_party,
        permissions::grant_action,
        permissions::revoke_action,
        permissions::check_action,
        permissions::remove_party,
    ]
}
