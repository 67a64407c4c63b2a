use crate::domain_model::UserId;

/// Fire-and-forget push notifications. Called strictly after the owning
/// transaction commits; errors are logged by the caller and never surfaced.
#[async_trait::async_trait]
pub trait NoticePort: Send + Sync {
    /// A new application landed in `target`'s inbox.
    async fn notify_new_apply(&self, target: &UserId) -> anyhow::Result<()>;

    /// `applicant`'s application was accepted by `responder`; sent once per
    /// newly formed friendship.
    async fn notify_first_friend(
        &self,
        applicant: &UserId,
        responder: &UserId,
    ) -> anyhow::Result<()>;
}
