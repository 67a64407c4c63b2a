use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account status carried on the profile row. `Sealed` accounts stay visible
/// in queries; enforcement happens upstream.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Normal,
    Sealed,
}

impl UserStatus {
    pub fn code(self) -> i32 {
        match self {
            UserStatus::Normal => 0,
            UserStatus::Sealed => 1,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            1 => UserStatus::Sealed,
            _ => UserStatus::Normal,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub username: String,
    pub photo: String,
    pub status: UserStatus,
}

/// Lightweight entry for friend listings.
#[derive(Debug, Clone, Serialize)]
pub struct FriendSummary {
    pub user_id: UserId,
    pub username: String,
    pub photo: String,
}
