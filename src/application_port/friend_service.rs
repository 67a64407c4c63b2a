use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum FriendError {
    #[error("missing or invalid parameter")]
    InvalidParameter,
    #[error("not found")]
    NotFound,
    #[error("cannot apply to yourself")]
    ApplySelf,
    #[error("already friends")]
    AlreadyFriend,
    #[error("too many unresolved applications to this user")]
    ApplyRateLimited,
    #[error("store error: {0}")]
    Store(String),
}

/// Read-only lookups: profile + relation, and the caller's own friend list.
#[async_trait::async_trait]
pub trait FriendQueryService: Send + Sync {
    /// `target` may be a site user id or an alternate global id; the primary
    /// lookup is tried first.
    async fn profile(
        &self,
        requester: &UserId,
        target: &str,
    ) -> Result<ProfileWithRelation, FriendError>;

    /// Only `owner == requester` is allowed; nobody reads another user's
    /// friend list.
    async fn list(
        &self,
        requester: &UserId,
        owner: &UserId,
    ) -> Result<Vec<FriendSummary>, FriendError>;
}

/// The application state machine: NONE -> PENDING -> {ACCEPTED, REJECTED}
/// per ordered (applicant, target) pair, with history kept.
#[async_trait::async_trait]
pub trait FriendApplyService: Send + Sync {
    async fn apply(
        &self,
        applicant: &UserId,
        target: &UserId,
        reason: &str,
    ) -> Result<(), FriendError>;

    /// Unresolved applications received by `user`, joined with each
    /// applicant's minimal profile. Dangling applicants are skipped.
    async fn apply_list(&self, user: &UserId) -> Result<Vec<ApplyWithProfile>, FriendError>;

    /// Badge counter: unresolved applications received by `user`.
    async fn apply_count(&self, user: &UserId) -> Result<i64, FriendError>;

    /// Resolves the unresolved application applicant -> responder. On accept
    /// both relation directions are materialized in the same transaction; a
    /// second accept finds nothing unresolved and fails with `NotFound`.
    async fn apply_result(
        &self,
        responder: &UserId,
        applicant: &UserId,
        accept: bool,
    ) -> Result<(), FriendError>;
}

#[async_trait::async_trait]
pub trait FriendDeleteService: Send + Sync {
    /// Removes both directions of the friendship in one transaction.
    /// Deleting a friendship that does not exist reports `NotFound`.
    async fn delete(&self, owner: &UserId, friend: &UserId) -> Result<(), FriendError>;
}
