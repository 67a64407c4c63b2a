use crate::domain_model::UserProfile;
use serde::Serialize;

/// Symmetric relation between two users: relation(a, b) == relation(b, a)
/// at all times. A missing storage row reads as `Stranger`; nothing in this
/// subsystem produces `Blocked`, the variant exists for wire compatibility.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Stranger,
    Friend,
    Blocked,
}

impl Relation {
    pub fn code(self) -> i32 {
        match self {
            Relation::Stranger => 0,
            Relation::Friend => 1,
            Relation::Blocked => 2,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Relation::Friend,
            2 => Relation::Blocked,
            _ => Relation::Stranger,
        }
    }

    pub fn is_friend(self) -> bool {
        matches!(self, Relation::Friend)
    }
}

/// Profile joined with the requester's relation to it, the unit returned by
/// the profile query.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileWithRelation {
    pub profile: UserProfile,
    pub relation: Relation,
}
