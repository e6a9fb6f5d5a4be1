mod common;

use std::time::Duration;

use tarefa_core::{Message, Observer, Puller, Pusher, Status};
use uuid::Uuid;

#[tokio::test]
async fn get_missing_job_is_none() {
    let (store, _dir) = common::open_store().await;
    assert!(store.get(Uuid::now_v7()).await.unwrap().is_none());
}

#[tokio::test]
async fn pushed_job_snapshot_has_initial_state() {
    let (store, _dir) = common::open_store().await;

    let mut msg = Message::with_payload(b"report-42".to_vec());
    msg.set("tenant", "acme").unwrap();
    store.push(&msg, Duration::from_secs(5)).await.unwrap();

    let job = store.get(msg.id).await.unwrap().unwrap();
    assert_eq!(job.status, Status::Pending);
    assert_eq!(job.attempts, 0);
    assert!(job.locked_until.is_none());
    assert_eq!(job.created_at, job.updated_at);
    assert!(job.next_run_at >= job.created_at + chrono::Duration::seconds(4));
    assert_eq!(job.message.payload, b"report-42");
    assert_eq!(job.message.get::<String>("tenant").as_deref(), Some("acme"));
}

#[tokio::test]
async fn list_filters_by_status() {
    let (store, _dir) = common::open_store().await;

    for _ in 0..3 {
        store.push(&Message::new(), Duration::ZERO).await.unwrap();
    }
    let mut done = store.pull(1, Duration::from_secs(1)).await.unwrap().remove(0);
    store.complete(&mut done).await.unwrap();

    let pending = store.list(Status::Pending, 0).await.unwrap();
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().all(|job| job.status == Status::Pending));

    let finished = store.list(Status::Done, 0).await.unwrap();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].id(), done.id());
}

#[tokio::test]
async fn list_unknown_means_no_filter() {
    let (store, _dir) = common::open_store().await;

    for _ in 0..4 {
        store.push(&Message::new(), Duration::ZERO).await.unwrap();
    }
    let all = store.list(Status::Unknown, 0).await.unwrap();
    assert_eq!(all.len(), 4);
}

#[tokio::test]
async fn list_honours_positive_limit() {
    let (store, _dir) = common::open_store().await;

    for _ in 0..5 {
        store.push(&Message::new(), Duration::ZERO).await.unwrap();
    }
    let some = store.list(Status::Unknown, 2).await.unwrap();
    assert_eq!(some.len(), 2);

    // Zero and negative limits are "unbounded at this layer".
    assert_eq!(store.list(Status::Unknown, 0).await.unwrap().len(), 5);
    assert_eq!(store.list(Status::Unknown, -1).await.unwrap().len(), 5);
}

#[tokio::test]
async fn snapshots_do_not_write_back() {
    let (store, _dir) = common::open_store().await;
    let msg = Message::new();
    store.push(&msg, Duration::ZERO).await.unwrap();

    let mut snapshot = store.get(msg.id).await.unwrap().unwrap();
    snapshot.status = Status::Dead;
    snapshot.attempts = 99;

    let fresh = store.get(msg.id).await.unwrap().unwrap();
    assert_eq!(fresh.status, Status::Pending);
    assert_eq!(fresh.attempts, 0);
}
