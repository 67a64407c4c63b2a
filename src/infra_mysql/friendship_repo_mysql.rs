use super::util::downcast;
use crate::application_port::FriendError;
use crate::domain_model::*;
use crate::domain_port::{FriendshipRepo, StorageTx};
use sqlx::{MySqlPool, Row};

/// Friendships live as two mirrored rows in `site_user_friend`, one per
/// direction. Both rows are always written and removed together.
pub struct MySqlFriendshipRepo {
    pool: MySqlPool,
}

impl MySqlFriendshipRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlFriendshipRepo { pool }
    }
}

#[async_trait::async_trait]
impl FriendshipRepo for MySqlFriendshipRepo {
    async fn get_relation(
        &self,
        owner: &UserId,
        other: &UserId,
    ) -> Result<Relation, FriendError> {
        let row = sqlx::query(
            "SELECT relation FROM site_user_friend WHERE site_user_id = ? AND site_friend_id = ?",
        )
        .bind(owner)
        .bind(other)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| FriendError::Store(format!("query relation: {e}")))?;

        // no row reads as stranger
        Ok(row
            .map(|r| Relation::from_code(r.get::<i32, _>("relation")))
            .unwrap_or(Relation::Stranger))
    }

    async fn list_friends(&self, owner: &UserId) -> Result<Vec<FriendSummary>, FriendError> {
        let rows = sqlx::query(
            r#"
SELECT u.site_user_id, u.user_name, u.user_photo
FROM site_user_friend f
JOIN site_user_profile u
  ON u.site_user_id = f.site_friend_id
WHERE f.site_user_id = ?
  AND f.relation = 1
ORDER BY f.add_time ASC
"#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| FriendError::Store(format!("list friends: {e}")))?;

        let out = rows
            .into_iter()
            .map(|r| FriendSummary {
                user_id: UserId::new(r.get::<String, _>("site_user_id")),
                username: r.get::<String, _>("user_name"),
                photo: r.get::<String, _>("user_photo"),
            })
            .collect();

        Ok(out)
    }

    async fn insert_friendship_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        a: &UserId,
        b: &UserId,
    ) -> Result<(), FriendError> {
        let tx = downcast(tx);

        for (owner, other) in [(a, b), (b, a)] {
            sqlx::query(
                r#"
INSERT INTO site_user_friend (site_user_id, site_friend_id, relation, add_time)
VALUES (?, ?, ?, NOW())
ON DUPLICATE KEY UPDATE relation = VALUES(relation)
"#,
            )
            .bind(owner)
            .bind(other)
            .bind(Relation::Friend.code())
            .execute(tx.conn())
            .await
            .map_err(|e| FriendError::Store(format!("insert friendship: {e}")))?;
        }

        Ok(())
    }

    async fn delete_friendship_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        a: &UserId,
        b: &UserId,
    ) -> Result<bool, FriendError> {
        let tx = downcast(tx);

        let res = sqlx::query(
            r#"
DELETE FROM site_user_friend
WHERE (site_user_id = ? AND site_friend_id = ?)
   OR (site_user_id = ? AND site_friend_id = ?)
"#,
        )
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .execute(tx.conn())
        .await
        .map_err(|e| FriendError::Store(format!("delete friendship: {e}")))?;

        Ok(res.rows_affected() > 0)
    }
}
