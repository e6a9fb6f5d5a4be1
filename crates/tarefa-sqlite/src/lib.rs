//! SQLite storage backend for the tarefa queue.
//!
//! [`SqliteStore`] implements all four storage contracts (`Pusher`,
//! `Puller`, `Observer`, `Cleaner`) against a single `jobs` table.
//!
//! # Concurrency model
//!
//! The claim path (`pull`) is a single
//! `UPDATE … WHERE id IN (SELECT … ORDER BY next_run_at LIMIT n)
//! RETURNING *` statement, so selection and transition happen in one
//! atomic write: no two claimants can both win the same row. The other
//! transitions are guarded single-row updates whose pre-state check is
//! part of the same statement as the mutation.
//!
//! [`SqliteStore::connect`] enables WAL journaling and a busy timeout;
//! both matter under concurrent writers. The SQL avoids engine-specific
//! types (epoch-millisecond integers, text uuids, JSON text metadata),
//! so porting to another relational store is a matter of placeholders
//! and connection setup.
//!
//! # Schema
//!
//! [`SqliteStore::init`] creates, inside one transaction:
//!
//! - the `jobs` table
//! - index `(status, next_run_at)` for the eligibility scan
//! - index `(status, locked_until)` for lease-expiry scans
//! - index `(status, updated_at)` for retention cleanup

mod cleaner;
mod model;
mod observer;
mod puller;
mod pusher;
mod schema;
mod store;

pub use store::SqliteStore;
