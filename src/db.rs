use rocket_db_pools::{Database, sqlx};

/// Pool backing the Postgres document store, configured under
/// `databases.concept_db` in Rocket's figment.
#[derive(Database)]
#[database("concept_db")]
pub struct ConceptDb(sqlx::PgPool);
