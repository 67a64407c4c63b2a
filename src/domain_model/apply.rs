use crate::domain_model::UserId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One friend application. Rows are append-only history: resolving flips
/// `resolved` exactly once, nothing ever deletes them.
#[derive(Debug, Clone)]
pub struct FriendApply {
    pub applicant: UserId,
    pub target: UserId,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
    pub accepted: bool,
}

/// An unresolved application joined with the applicant's minimal profile,
/// as listed to the receiving user.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyWithProfile {
    pub applicant: UserId,
    pub username: String,
    pub photo: String,
    pub reason: String,
}

/// Unresolved applications from one applicant to one target are capped; the
/// check runs in the same transaction as the insert.
pub const APPLY_PENDING_CAP: i64 = 5;
