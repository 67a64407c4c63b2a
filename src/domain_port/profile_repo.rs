use crate::application_port::FriendError;
use crate::domain_model::*;

/// Profiles are owned by a separate subsystem; this port only reads them.
#[async_trait::async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, FriendError>;

    /// Fallback path for callers that only hold the alternate global id.
    async fn get_profile_by_global_id(
        &self,
        global_id: &str,
    ) -> Result<Option<UserProfile>, FriendError>;
}
