use tracing::info;

use crate::errors::Result;
use crate::services::pubsub_service::{self, TodoEvent};
use crate::state::hub::BroadcastHub;
use crate::state::todos::{Page, Todo, TodoStore};

/// List a page of todos in creation order.
pub fn list(store: &TodoStore, page: Page) -> Result<Vec<Todo>> {
    store.list(page)
}

/// Insert a new todo and notify subscribers.
pub fn create(store: &TodoStore, hub: &BroadcastHub, todo: Todo) -> Result<Todo> {
    // Store lock is released before anything is sent.
    let created = store.create(todo)?;
    info!("Created todo {}", created.id);

    pubsub_service::notify(
        hub,
        TodoEvent::Created {
            todo: created.clone(),
        },
    );
    Ok(created)
}

/// Overwrite the todo at `id` and notify subscribers.
pub fn replace(store: &TodoStore, hub: &BroadcastHub, id: i64, todo: Todo) -> Result<Todo> {
    let updated = store.replace(id, todo)?;
    info!("Updated todo {}", id);

    pubsub_service::notify(
        hub,
        TodoEvent::Updated {
            todo: updated.clone(),
        },
    );
    Ok(updated)
}

/// Remove the todo at `id` and notify subscribers.
pub fn delete(store: &TodoStore, hub: &BroadcastHub, id: i64) -> Result<()> {
    store.delete(id)?;
    info!("Deleted todo {}", id);

    pubsub_service::notify(hub, TodoEvent::Deleted { id });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TodoError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::Barrier;

    fn todo(id: i64) -> Todo {
        Todo {
            id,
            text: format!("task {id}"),
            completed: false,
        }
    }

    #[tokio::test]
    async fn every_mutation_notifies_once() {
        let store = TodoStore::new();
        let hub = BroadcastHub::new(8);
        let (_id, mut rx) = hub.register();

        create(&store, &hub, todo(1)).unwrap();
        replace(&store, &hub, 1, todo(1)).unwrap();
        delete(&store, &hub, 1).unwrap();

        for expected in ["created", "updated", "deleted"] {
            let frame: serde_json::Value =
                serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
            assert_eq!(frame["event"], expected);
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn failed_mutations_do_not_notify() {
        let store = TodoStore::new();
        let hub = BroadcastHub::new(8);
        let (_id, mut rx) = hub.register();

        create(&store, &hub, todo(1)).unwrap();
        assert!(rx.try_recv().is_ok());

        assert!(matches!(
            create(&store, &hub, todo(1)),
            Err(TodoError::Conflict(1))
        ));
        assert!(matches!(
            replace(&store, &hub, 2, todo(2)),
            Err(TodoError::NotFound)
        ));
        assert!(matches!(delete(&store, &hub, 2), Err(TodoError::NotFound)));

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn mutation_succeeds_without_subscribers() {
        let store = TodoStore::new();
        let hub = BroadcastHub::new(8);

        let (id, rx) = hub.register();
        drop(rx);
        hub.unregister(id);

        assert!(create(&store, &hub, todo(5)).is_ok());
        assert_eq!(list(&store, Page::default()).unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn racing_creates_of_one_id_admit_exactly_one() {
        const RACERS: usize = 64;

        let store = TodoStore::new();
        let hub = BroadcastHub::new(RACERS * 2);
        let (_id, mut rx) = hub.register();
        let barrier = Arc::new(Barrier::new(RACERS));

        let handles: Vec<_> = (0..RACERS)
            .map(|_| {
                let store = store.clone();
                let hub = hub.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    create(&store, &hub, todo(1))
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.expect("task") {
                Ok(_) => created += 1,
                Err(TodoError::Conflict(1)) => {}
                Err(other) => panic!("unexpected error {other:?}"),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(store.len().unwrap(), 1);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn list_never_sees_a_torn_sequence() {
        const CREATED: i64 = 200;
        const DELETED: i64 = 100;

        let store = TodoStore::new();
        let hub = BroadcastHub::new(8);
        let done = Arc::new(AtomicBool::new(false));

        // creates 0, 1, 2, ... in order
        let creator = {
            let (store, hub) = (store.clone(), hub.clone());
            tokio::spawn(async move {
                for id in 0..CREATED {
                    create(&store, &hub, todo(id)).unwrap();
                    tokio::task::yield_now().await;
                }
            })
        };

        // deletes from the front as soon as each id exists
        let deleter = {
            let (store, hub) = (store.clone(), hub.clone());
            tokio::spawn(async move {
                for id in 0..DELETED {
                    loop {
                        match delete(&store, &hub, id) {
                            Ok(()) => break,
                            Err(TodoError::NotFound) => tokio::task::yield_now().await,
                            Err(other) => panic!("unexpected error {other:?}"),
                        }
                    }
                }
            })
        };

        // the live set is always a contiguous ascending run of ids
        let reader = {
            let (store, done) = (store.clone(), done.clone());
            tokio::spawn(async move {
                let mut pages = 0usize;
                loop {
                    let finished = done.load(Ordering::Acquire);
                    let page = list(&store, Page::default()).unwrap();
                    for pair in page.windows(2) {
                        assert_eq!(pair[1].id, pair[0].id + 1, "torn page {page:?}");
                    }
                    pages += 1;
                    if finished {
                        break pages;
                    }
                    tokio::task::yield_now().await;
                }
            })
        };

        creator.await.expect("creator");
        deleter.await.expect("deleter");
        done.store(true, Ordering::Release);
        assert!(reader.await.expect("reader") > 0);

        let remaining = list(&store, Page::new(Some(0), Some(10)).unwrap()).unwrap();
        let ids: Vec<i64> = remaining.iter().map(|t| t.id).collect();
        assert_eq!(ids, (DELETED..DELETED + 10).collect::<Vec<_>>());
        assert_eq!(store.len().unwrap(), (CREATED - DELETED) as usize);
    }
}
