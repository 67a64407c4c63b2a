use super::util::downcast;
use crate::application_port::FriendError;
use crate::domain_model::*;
use crate::domain_port::{ApplyRepo, StorageTx};
use sqlx::{MySqlPool, Row};

pub struct MySqlApplyRepo {
    pool: MySqlPool,
}

impl MySqlApplyRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlApplyRepo { pool }
    }
}

#[async_trait::async_trait]
impl ApplyRepo for MySqlApplyRepo {
    async fn count_unresolved_from_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        applicant: &UserId,
        target: &UserId,
    ) -> Result<i64, FriendError> {
        let tx = downcast(tx);

        // FOR UPDATE locks the pair's pending rows so a concurrent apply
        // serializes behind this transaction instead of racing the cap
        let count: i64 = sqlx::query_scalar(
            r#"
SELECT COUNT(*)
FROM site_friend_apply
WHERE site_user_id = ? AND site_friend_id = ? AND is_resolved = 0
FOR UPDATE
"#,
        )
        .bind(applicant)
        .bind(target)
        .fetch_one(tx.conn())
        .await
        .map_err(|e| FriendError::Store(format!("count pending applies: {e}")))?;

        Ok(count)
    }

    async fn save_apply_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        applicant: &UserId,
        target: &UserId,
        reason: &str,
    ) -> Result<(), FriendError> {
        let tx = downcast(tx);

        sqlx::query(
            r#"
INSERT INTO site_friend_apply
    (site_user_id, site_friend_id, apply_reason, apply_time, is_resolved, is_accepted)
VALUES (?, ?, ?, NOW(), 0, 0)
"#,
        )
        .bind(applicant)
        .bind(target)
        .bind(reason)
        .execute(tx.conn())
        .await
        .map_err(|e| FriendError::Store(format!("insert friend apply: {e}")))?;

        Ok(())
    }

    async fn count_unresolved_received(&self, target: &UserId) -> Result<i64, FriendError> {
        let count: i64 = sqlx::query_scalar(
            r#"
SELECT COUNT(*)
FROM site_friend_apply
WHERE site_friend_id = ? AND is_resolved = 0
"#,
        )
        .bind(target)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| FriendError::Store(format!("count received applies: {e}")))?;

        Ok(count)
    }

    async fn list_unresolved_with_profile(
        &self,
        target: &UserId,
    ) -> Result<Vec<ApplyWithProfile>, FriendError> {
        // inner join drops applies whose applicant profile is gone
        let rows = sqlx::query(
            r#"
SELECT a.site_user_id, u.user_name, u.user_photo, a.apply_reason
FROM site_friend_apply a
JOIN site_user_profile u
  ON u.site_user_id = a.site_user_id
WHERE a.site_friend_id = ?
  AND a.is_resolved = 0
ORDER BY a.apply_time DESC
"#,
        )
        .bind(target)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| FriendError::Store(format!("list received applies: {e}")))?;

        let out = rows
            .into_iter()
            .map(|r| ApplyWithProfile {
                applicant: UserId::new(r.get::<String, _>("site_user_id")),
                username: r.get::<String, _>("user_name"),
                photo: r.get::<String, _>("user_photo"),
                reason: r.get::<String, _>("apply_reason"),
            })
            .collect();

        Ok(out)
    }

    async fn resolve_apply_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        applicant: &UserId,
        target: &UserId,
        accepted: bool,
    ) -> Result<bool, FriendError> {
        let tx = downcast(tx);

        // the is_resolved = 0 guard is the idempotence point: the second
        // accept matches zero rows
        let res = sqlx::query(
            r#"
UPDATE site_friend_apply
SET is_resolved = 1, is_accepted = ?
WHERE site_user_id = ? AND site_friend_id = ? AND is_resolved = 0
"#,
        )
        .bind(accepted)
        .bind(applicant)
        .bind(target)
        .execute(tx.conn())
        .await
        .map_err(|e| FriendError::Store(format!("resolve friend apply: {e}")))?;

        Ok(res.rows_affected() > 0)
    }
}
