/// User record data models
use serde::{Deserialize, Serialize};

/// Store-assigned user identifier
pub type UserId = u64;

/// A user record as persisted in the backing store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Relative or absolute URL of the stored avatar image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Upsert payload; `id` is only honoured when it matches an existing record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl UserInput {
    /// Build the stored record under the given identifier
    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            avatar: self.avatar,
        }
    }

    /// The avatar reference, if one was supplied and is non-empty
    pub fn avatar_ref(&self) -> Option<&str> {
        self.avatar.as_deref().filter(|a| !a.is_empty())
    }
}

/// One page of users plus the size of the unpaginated set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPage {
    #[serde(rename = "list")]
    pub records: Vec<User>,
    #[serde(rename = "count")]
    pub total_count: usize,
}
