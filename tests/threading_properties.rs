use std::collections::HashSet;
use std::sync::Arc;

use concept_server::config::ThreadingConfig;
use concept_server::store::MemoryStore;
use concept_server::threading::{ItemId, ThreadingConcept, ThreadingError};

fn id(s: &str) -> ItemId {
    ItemId::new(s).expect("non-empty item id")
}

fn concept() -> ThreadingConcept {
    ThreadingConcept::new(
        Arc::new(MemoryStore::new()),
        "threads",
        ThreadingConfig::default(),
    )
}

async fn build_chain(threading: &ThreadingConcept, items: &[&str]) {
    for pair in items.windows(2) {
        threading
            .link_after(&id(pair[0]), &id(pair[1]))
            .await
            .expect("link succeeds");
    }
}

/// Follow `next` from `start` until the tail.
async fn walk(threading: &ThreadingConcept, start: &str) -> Vec<String> {
    let mut seen = vec![start.to_string()];
    let mut current = id(start);
    while let Some(following) = threading.next(&current).await.expect("item is threaded") {
        seen.push(following.as_str().to_string());
        current = following;
    }
    seen
}

#[tokio::test]
async fn every_item_belongs_to_one_thread() {
    let threading = concept();
    build_chain(&threading, &["a", "b", "c"]).await;
    build_chain(&threading, &["x", "y"]).await;

    for (anchor, item) in [("c", "y"), ("y", "b"), ("q", "a"), ("q", "x")] {
        let err = threading
            .link_after(&id(anchor), &id(item))
            .await
            .expect_err("threaded item cannot be linked again");
        assert!(matches!(err, ThreadingError::AlreadyThreaded { .. }));
    }

    let mut threads = HashSet::new();
    for item in ["a", "b", "c", "x", "y"] {
        let view = threading.thread_of(&id(item)).await.expect("threaded");
        let occurrences = view.chain.iter().filter(|i| i.as_str() == item).count();
        assert_eq!(occurrences, 1);
        threads.insert(view.id);
    }
    assert_eq!(threads.len(), 2);
}

#[tokio::test]
async fn next_walk_matches_thread_chain() {
    let threading = concept();
    let items = ["p0", "p1", "p2", "p3", "p4", "p5"];
    build_chain(&threading, &items).await;

    assert_eq!(walk(&threading, "p0").await, items);

    let view = threading.thread_of(&id("p3")).await.expect("threaded");
    let chain: Vec<&str> = view.chain.iter().map(ItemId::as_str).collect();
    assert_eq!(chain, items);
}

#[tokio::test]
async fn next_and_prev_are_inverse() {
    let threading = concept();
    let items = ["m0", "m1", "m2", "m3", "m4"];
    build_chain(&threading, &items).await;

    for item in items {
        let item = id(item);
        if let Some(following) = threading.next(&item).await.expect("threaded") {
            assert_eq!(threading.prev(&following).await.expect("threaded"), Some(item.clone()));
        }
        if let Some(preceding) = threading.prev(&item).await.expect("threaded") {
            assert_eq!(threading.next(&preceding).await.expect("threaded"), Some(item.clone()));
        }
    }
}

#[tokio::test]
async fn link_then_unthread_restores_previous_state() {
    let threading = concept();

    // fresh anchor
    threading.link_after(&id("a"), &id("x")).await.expect("created");
    threading.unthread(&id("x")).await.expect("removed");
    assert!(threading.locate(&id("a")).await.expect("query").is_none());
    assert!(threading.locate(&id("x")).await.expect("query").is_none());

    // tail anchor
    build_chain(&threading, &["a", "b", "c"]).await;
    let before = threading.thread_of(&id("a")).await.expect("threaded");
    threading.link_after(&id("c"), &id("x")).await.expect("extended");
    threading.unthread(&id("x")).await.expect("removed");
    let after = threading.thread_of(&id("a")).await.expect("threaded");
    assert_eq!(after.id, before.id);
    assert_eq!(after.chain, before.chain);
    assert_eq!(after.tail, id("c"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_links_of_one_item_admit_exactly_one() {
    let threading = Arc::new(concept());

    let tasks: Vec<_> = (0..16)
        .map(|n| {
            let threading = Arc::clone(&threading);
            tokio::spawn(async move {
                threading
                    .link_after(&id(&format!("anchor-{n}")), &id("shared"))
                    .await
            })
        })
        .collect();

    let mut linked = 0;
    for task in tasks {
        match task.await.expect("task completes") {
            Ok(_) => linked += 1,
            Err(ThreadingError::AlreadyThreaded { item }) => assert_eq!(item, id("shared")),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(linked, 1);

    let view = threading.thread_of(&id("shared")).await.expect("threaded");
    assert_eq!(view.chain.len(), 2);
}

async fn retry_on_conflict<F, Fut, T>(mut op: F) -> T
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, ThreadingError>>,
{
    loop {
        match op().await {
            Ok(value) => return value,
            Err(ThreadingError::Conflict { .. }) => tokio::task::yield_now().await,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_removals_and_appends_keep_the_chain_consistent() {
    let threading = Arc::new(concept());
    let seed: Vec<String> = (0..10).map(|n| format!("t{n}")).collect();
    let seed_refs: Vec<&str> = seed.iter().map(String::as_str).collect();
    build_chain(&threading, &seed_refs).await;

    let mut tasks = Vec::new();
    for n in 1..5 {
        let threading = Arc::clone(&threading);
        tasks.push(tokio::spawn(async move {
            let item = id(&format!("t{n}"));
            retry_on_conflict(|| threading.unthread(&item)).await;
        }));
    }

    let appender = {
        let threading = Arc::clone(&threading);
        tokio::spawn(async move {
            let mut tail = id("t9");
            for n in 0..5 {
                let item = id(&format!("n{n}"));
                retry_on_conflict(|| threading.link_after(&tail, &item)).await;
                tail = item;
            }
        })
    };
    tasks.push(appender);

    for task in tasks {
        task.await.expect("task completes");
    }

    let expected = [
        "t0", "t5", "t6", "t7", "t8", "t9", "n0", "n1", "n2", "n3", "n4",
    ];
    assert_eq!(walk(&threading, "t0").await, expected);
    for n in 1..5 {
        assert!(threading.locate(&id(&format!("t{n}"))).await.expect("query").is_none());
    }
}
