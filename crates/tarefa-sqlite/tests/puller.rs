mod common;

use std::time::Duration;

use chrono::Utc;
use tarefa_core::{Message, Observer, Puller, Pusher, QueueError, Status};

#[tokio::test]
async fn pull_claims_and_complete_finishes() {
    let (store, _dir) = common::open_store().await;
    let msg = Message::new();
    store.push(&msg, Duration::ZERO).await.unwrap();

    let jobs = store.pull(1, Duration::from_secs(1)).await.unwrap();
    assert_eq!(jobs.len(), 1);

    let mut job = jobs.into_iter().next().unwrap();
    assert_eq!(job.id(), msg.id);
    assert_eq!(job.status, Status::Processing);
    assert_eq!(job.attempts, 1);
    assert!(job.locked_until.is_some());

    store.complete(&mut job).await.unwrap();
    assert_eq!(job.status, Status::Done);
    assert!(job.locked_until.is_none());

    let stored = store.get(msg.id).await.unwrap().unwrap();
    assert_eq!(stored.status, Status::Done);
    assert!(stored.locked_until.is_none());
    assert_eq!(stored.attempts, 1);
}

#[tokio::test]
async fn pull_on_empty_store_returns_nothing() {
    let (store, _dir) = common::open_store().await;
    let jobs = store.pull(10, Duration::from_secs(1)).await.unwrap();
    assert!(jobs.is_empty());
}

#[tokio::test]
async fn delayed_job_is_not_eligible_yet() {
    let (store, _dir) = common::open_store().await;
    let msg = Message::new();
    store.push(&msg, Duration::from_secs(60)).await.unwrap();

    let jobs = store.pull(1, Duration::from_secs(1)).await.unwrap();
    assert!(jobs.is_empty());
}

#[tokio::test]
async fn requeue_reschedules_with_backoff() {
    let (store, _dir) = common::open_store().await;
    let msg = Message::new();
    store.push(&msg, Duration::ZERO).await.unwrap();

    let mut job = store
        .pull(1, Duration::from_secs(1))
        .await
        .unwrap()
        .remove(0);
    store.requeue(&mut job, Duration::from_secs(30)).await.unwrap();

    assert_eq!(job.status, Status::Pending);
    assert!(job.locked_until.is_none());
    assert!(job.next_run_at > Utc::now() + chrono::Duration::seconds(10));

    // Not eligible again until the backoff elapses.
    let jobs = store.pull(1, Duration::from_secs(1)).await.unwrap();
    assert!(jobs.is_empty());
}

#[tokio::test]
async fn kill_moves_job_to_dead() {
    let (store, _dir) = common::open_store().await;
    let msg = Message::new();
    store.push(&msg, Duration::ZERO).await.unwrap();

    let mut job = store
        .pull(1, Duration::from_secs(1))
        .await
        .unwrap()
        .remove(0);
    store.kill(&mut job).await.unwrap();

    assert_eq!(job.status, Status::Dead);
    assert!(job.locked_until.is_none());

    let stored = store.get(msg.id).await.unwrap().unwrap();
    assert_eq!(stored.status, Status::Dead);
}

#[tokio::test]
async fn kill_works_on_pending_jobs_too() {
    let (store, _dir) = common::open_store().await;
    let msg = Message::new();
    store.push(&msg, Duration::ZERO).await.unwrap();

    let mut job = store.get(msg.id).await.unwrap().unwrap();
    assert_eq!(job.status, Status::Pending);

    store.kill(&mut job).await.unwrap();
    assert_eq!(job.status, Status::Dead);
}

#[tokio::test]
async fn extend_lock_pushes_the_lease_forward() {
    let (store, _dir) = common::open_store().await;
    let msg = Message::new();
    store.push(&msg, Duration::ZERO).await.unwrap();

    let mut job = store
        .pull(1, Duration::from_secs(1))
        .await
        .unwrap()
        .remove(0);
    let old_lock = job.locked_until.unwrap();

    store.extend_lock(&mut job, Duration::from_secs(5)).await.unwrap();
    assert!(job.locked_until.unwrap() > old_lock, "lease was not extended");
}

#[tokio::test]
async fn transitions_on_stale_snapshots_fail_typed() {
    let (store, _dir) = common::open_store().await;
    let msg = Message::new();
    store.push(&msg, Duration::ZERO).await.unwrap();

    let mut job = store
        .pull(1, Duration::from_secs(1))
        .await
        .unwrap()
        .remove(0);
    store.complete(&mut job).await.unwrap();

    // The row is Done now; a stale Processing snapshot misses everywhere.
    let mut stale = job.clone();
    stale.status = Status::Processing;

    assert!(matches!(
        store.extend_lock(&mut stale, Duration::from_secs(1)).await,
        Err(QueueError::LockLost)
    ));
    assert!(matches!(
        store.complete(&mut stale).await,
        Err(QueueError::CompleteFailed)
    ));
    assert!(matches!(
        store.requeue(&mut stale, Duration::ZERO).await,
        Err(QueueError::JobLost)
    ));
    assert!(matches!(store.kill(&mut stale).await, Err(QueueError::JobLost)));
}

#[tokio::test]
async fn locked_job_is_invisible_to_a_second_pull() {
    let (store, _dir) = common::open_store().await;
    let msg = Message::new();
    store.push(&msg, Duration::ZERO).await.unwrap();

    let first = store.pull(1, Duration::from_secs(5)).await.unwrap();
    assert_eq!(first.len(), 1);

    let second = store.pull(1, Duration::from_secs(5)).await.unwrap();
    assert!(second.is_empty(), "a held lease must hide the row");
}

#[tokio::test]
async fn expired_lease_is_reclaimed_with_attempt_bump() {
    let (store, _dir) = common::open_store().await;
    let msg = Message::new();
    store.push(&msg, Duration::ZERO).await.unwrap();

    let first = store.pull(1, Duration::from_millis(50)).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].attempts, 1);

    tokio::time::sleep(Duration::from_millis(80)).await;

    let second = store.pull(1, Duration::from_secs(1)).await.unwrap();
    assert_eq!(second.len(), 1, "expired lease should make the row eligible");

    let job = &second[0];
    assert_eq!(job.id(), msg.id);
    assert_eq!(job.status, Status::Processing);
    assert_eq!(job.attempts, 2);
    let lock = job.locked_until.unwrap();
    assert!(lock > Utc::now() + chrono::Duration::milliseconds(500));
}

#[tokio::test]
async fn pull_returns_oldest_due_first_within_batch() {
    let (store, _dir) = common::open_store().await;

    let first = Message::new();
    let second = Message::new();
    let third = Message::new();
    store.push(&first, Duration::ZERO).await.unwrap();
    store.push(&second, Duration::from_millis(20)).await.unwrap();
    store.push(&third, Duration::from_millis(40)).await.unwrap();

    tokio::time::sleep(Duration::from_millis(60)).await;

    let jobs = store.pull(2, Duration::from_secs(1)).await.unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].id(), first.id);
    assert_eq!(jobs[1].id(), second.id);
    assert!(jobs[0].next_run_at <= jobs[1].next_run_at);
}

#[tokio::test]
async fn attempts_grow_across_requeue_cycles() {
    let (store, _dir) = common::open_store().await;
    let msg = Message::new();
    store.push(&msg, Duration::ZERO).await.unwrap();

    let mut job = store
        .pull(1, Duration::from_secs(1))
        .await
        .unwrap()
        .remove(0);
    store.requeue(&mut job, Duration::ZERO).await.unwrap();

    let again = store.pull(1, Duration::from_secs(1)).await.unwrap().remove(0);
    assert_eq!(again.attempts, 2);
}

#[tokio::test]
async fn duplicate_push_is_a_storage_error() {
    let (store, _dir) = common::open_store().await;
    let msg = Message::new();
    store.push(&msg, Duration::ZERO).await.unwrap();

    let err = store.push(&msg, Duration::ZERO).await.unwrap_err();
    assert!(matches!(err, QueueError::Storage(_)));
}
