// src/models/user.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account as stored in users.json.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub username: String,
    pub password: String, // bcrypt hash, never sent to clients
    pub full_name: String,
    pub email: String,
    pub registered_at: DateTime<Utc>,
}

/// The view of a [`User`] that is safe to put in a response body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: u64,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub registered_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            email: user.email,
            registered_at: user.registered_at,
        }
    }
}
