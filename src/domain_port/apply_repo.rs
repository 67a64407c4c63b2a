use crate::application_port::FriendError;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;

#[async_trait::async_trait]
pub trait ApplyRepo: Send + Sync {
    /// Unresolved applications from `applicant` to `target`. Runs inside the
    /// caller's transaction and takes locks, so a concurrent apply cannot
    /// slip past the cap between this count and the insert.
    async fn count_unresolved_from_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        applicant: &UserId,
        target: &UserId,
    ) -> Result<i64, FriendError>;

    async fn save_apply_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        applicant: &UserId,
        target: &UserId,
        reason: &str,
    ) -> Result<(), FriendError>;

    /// Unresolved applications received by `target`, for the badge counter.
    async fn count_unresolved_received(&self, target: &UserId) -> Result<i64, FriendError>;

    /// Unresolved applications received by `target` joined with the
    /// applicant's profile; rows whose applicant no longer resolves are
    /// dropped by the join.
    async fn list_unresolved_with_profile(
        &self,
        target: &UserId,
    ) -> Result<Vec<ApplyWithProfile>, FriendError>;

    /// Marks the unresolved applications applicant -> target as resolved with
    /// the given outcome. Returns false when nothing unresolved matched,
    /// which is what makes duplicate accepts lose.
    async fn resolve_apply_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        applicant: &UserId,
        target: &UserId,
        accepted: bool,
    ) -> Result<bool, FriendError>;
}
