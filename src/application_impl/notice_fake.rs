use crate::domain_model::UserId;
use crate::domain_port::NoticePort;

/// Logs instead of pushing. Selected with `notice.backend = "fake"` for
/// local runs without a broker.
#[derive(Debug)]
pub struct FakeNotice;

impl FakeNotice {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl NoticePort for FakeNotice {
    async fn notify_new_apply(&self, target: &UserId) -> anyhow::Result<()> {
        tracing::info!("fake notice: new friend apply for {target}");
        Ok(())
    }

    async fn notify_first_friend(
        &self,
        applicant: &UserId,
        responder: &UserId,
    ) -> anyhow::Result<()> {
        tracing::info!("fake notice: {responder} accepted {applicant}");
        Ok(())
    }
}
