use std::sync::Arc;

use concept_server::config::ThreadingConfig;
use concept_server::store::{DocumentStore, Filter, PgDocumentStore};
use concept_server::test_support::{TestDatabase, TestDatabaseError};
use concept_server::threading::{ItemId, Role, ThreadingConcept};
use serde_json::json;

async fn database() -> Option<TestDatabase> {
    match TestDatabase::new_from_env().await {
        Ok(db) => Some(db),
        Err(TestDatabaseError::MissingUrl) => {
            eprintln!("skipping postgres test: TEST_DATABASE_URL not set");
            None
        }
        Err(err) => panic!("failed to provision test database: {err}"),
    }
}

fn id(s: &str) -> ItemId {
    ItemId::new(s).expect("non-empty item id")
}

#[tokio::test]
async fn documents_round_trip_through_postgres() {
    let Some(db) = database().await else {
        return;
    };
    let store = PgDocumentStore::new(db.pool_clone());

    let first = store
        .insert_one("notes", json!({ "title": "one", "tags": ["a", "b"] }))
        .await
        .expect("insert");
    store
        .insert_one("notes", json!({ "title": "two", "tags": ["b"] }))
        .await
        .expect("insert");

    let found = store
        .find_one("notes", &Filter::Id(first))
        .await
        .expect("query")
        .expect("document exists");
    assert_eq!(found.version, 1);
    assert_eq!(found.body["title"], "one");

    let tagged = store
        .find_many("notes", &Filter::contains("tags", "b"))
        .await
        .expect("query");
    assert_eq!(tagged.len(), 2);
    assert_eq!(tagged[0].id, first);

    let exact = store
        .find_many("notes", &Filter::eq("tags", json!(["b"])))
        .await
        .expect("query");
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].body["title"], "two");

    let mut fields = serde_json::Map::new();
    fields.insert("title".to_string(), json!("uno"));
    let stale = Filter::And(vec![Filter::Id(first), Filter::Version(2)]);
    assert!(!store.update_one("notes", &stale, fields.clone()).await.expect("update"));
    let current = Filter::And(vec![Filter::Id(first), Filter::Version(1)]);
    assert!(store.update_one("notes", &current, fields).await.expect("update"));

    let updated = store
        .find_one("notes", &Filter::eq("title", "uno"))
        .await
        .expect("query")
        .expect("document exists");
    assert_eq!(updated.version, 2);
    assert_eq!(updated.body["tags"], json!(["a", "b"]));

    assert!(store.delete_one("notes", &Filter::Id(first)).await.expect("delete"));
    assert!(!store.delete_one("notes", &Filter::Id(first)).await.expect("delete"));
    assert!(store.find_one("other", &Filter::All).await.expect("query").is_none());

    db.close().await.expect("cleanup");
}

#[tokio::test]
async fn threading_runs_on_postgres() {
    let Some(db) = database().await else {
        return;
    };
    let store: Arc<dyn DocumentStore> = Arc::new(PgDocumentStore::new(db.pool_clone()));
    let threading = ThreadingConcept::new(store, "threads", ThreadingConfig::default());

    threading.link_after(&id("a"), &id("b")).await.expect("created");
    threading.link_after(&id("b"), &id("c")).await.expect("extended");

    let view = threading.thread_of(&id("b")).await.expect("threaded");
    assert_eq!(view.chain, vec![id("a"), id("b"), id("c")]);
    assert_eq!(view.role, Role::Body(0));
    assert_eq!(threading.prev(&id("c")).await.expect("threaded"), Some(id("b")));

    threading.unthread(&id("b")).await.expect("removed");
    threading.unthread(&id("c")).await.expect("removed");
    assert!(threading.locate(&id("a")).await.expect("query").is_none());

    db.close().await.expect("cleanup");
}
