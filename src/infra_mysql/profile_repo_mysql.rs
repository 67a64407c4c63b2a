use crate::application_port::FriendError;
use crate::domain_model::*;
use crate::domain_port::ProfileRepo;
use sqlx::{MySqlPool, Row};

pub struct MySqlProfileRepo {
    pool: MySqlPool,
}

impl MySqlProfileRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlProfileRepo { pool }
    }
}

fn profile_from_row(row: &sqlx::mysql::MySqlRow) -> UserProfile {
    UserProfile {
        user_id: UserId::new(row.get::<String, _>("site_user_id")),
        username: row.get::<String, _>("user_name"),
        photo: row.get::<String, _>("user_photo"),
        status: UserStatus::from_code(row.get::<i32, _>("user_status")),
    }
}

#[async_trait::async_trait]
impl ProfileRepo for MySqlProfileRepo {
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, FriendError> {
        let row = sqlx::query(
            r#"
SELECT site_user_id, user_name, user_photo, user_status
FROM site_user_profile
WHERE site_user_id = ?
"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| FriendError::Store(format!("query profile: {e}")))?;

        Ok(row.as_ref().map(profile_from_row))
    }

    async fn get_profile_by_global_id(
        &self,
        global_id: &str,
    ) -> Result<Option<UserProfile>, FriendError> {
        let row = sqlx::query(
            r#"
SELECT site_user_id, user_name, user_photo, user_status
FROM site_user_profile
WHERE global_user_id = ?
"#,
        )
        .bind(global_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| FriendError::Store(format!("query profile by global id: {e}")))?;

        Ok(row.as_ref().map(profile_from_row))
    }
}
