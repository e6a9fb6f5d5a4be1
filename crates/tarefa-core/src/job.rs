use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::Message;

/// Lifecycle state of a [`Job`].
///
/// ```text
/// Pending    -> Processing
/// Processing -> Done
/// Processing -> Pending   (requeue with delay)
/// Processing -> Dead
/// Pending    -> Dead      (force kill)
/// ```
///
/// `Unknown` is the reserved zero value. It is accepted by
/// [`Observer::list`](crate::contract::Observer::list) and
/// [`Cleaner::clean`](crate::contract::Cleaner::clean) to mean
/// "no filter" and is never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Status {
    #[default]
    Unknown = 0,
    /// Eligible for claiming once `next_run_at` has passed.
    Pending = 1,
    /// Claimed under a lease; invisible to other claimants while
    /// `locked_until` is in the future.
    Processing = 2,
    /// Terminal success.
    Done = 3,
    /// Terminal failure.
    Dead = 4,
}

impl Status {
    /// Whether the state admits no further automatic transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Done | Status::Dead)
    }

    /// Canonical text name, the wire form of the status codec.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Unknown => "Unknown",
            Status::Pending => "Pending",
            Status::Processing => "Processing",
            Status::Done => "Done",
            Status::Dead => "Dead",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejection of a status value outside the five canonical ones.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unknown" => Ok(Status::Unknown),
            "Pending" => Ok(Status::Pending),
            "Processing" => Ok(Status::Processing),
            "Done" => Ok(Status::Done),
            "Dead" => Ok(Status::Dead),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> Self {
        status as u8
    }
}

impl TryFrom<u8> for Status {
    type Error = ParseStatusError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Status::Unknown),
            1 => Ok(Status::Pending),
            2 => Ok(Status::Processing),
            3 => Ok(Status::Done),
            4 => Ok(Status::Dead),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// A message under queue management: the transport [`Message`] plus
/// delivery state and scheduling fields.
///
/// `created_at` records the enqueue time and `updated_at` the last
/// transition. `attempts` counts successful claims. `locked_until` is
/// the visibility timeout and is set exactly while `status` is
/// `Processing`. `next_run_at` is the earliest claim time and is
/// meaningful for `Pending` rows (a past value means "immediately
/// eligible").
///
/// Values returned by the storage contracts are snapshots; mutating one
/// does not change durable state. Transitions go through
/// [`Puller`](crate::contract::Puller).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub message: Message,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    pub status: Status,
    pub attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
    pub next_run_at: DateTime<Utc>,
}

impl Job {
    /// Identifier of the embedded message.
    pub fn id(&self) -> Uuid {
        self.message.id
    }
}
