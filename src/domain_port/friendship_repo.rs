use crate::application_port::FriendError;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;

#[async_trait::async_trait]
pub trait FriendshipRepo: Send + Sync {
    /// Directed read of the symmetric fact. No row means `Stranger`.
    async fn get_relation(&self, owner: &UserId, other: &UserId)
    -> Result<Relation, FriendError>;

    /// Confirmed friends of `owner` in storage order.
    async fn list_friends(&self, owner: &UserId) -> Result<Vec<FriendSummary>, FriendError>;

    /// Writes both mirrored directions; never leaves a half-created
    /// friendship behind. Re-inserting an existing pair is a no-op.
    async fn insert_friendship_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        a: &UserId,
        b: &UserId,
    ) -> Result<(), FriendError>;

    /// Removes both directions. Returns false when no rows were affected.
    async fn delete_friendship_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        a: &UserId,
        b: &UserId,
    ) -> Result<bool, FriendError>;
}
