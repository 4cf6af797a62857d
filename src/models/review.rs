// src/models/review.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: u64,                    // Assigned from the reviews counter, never reused
    pub user_id: u64,               // ID of the user who wrote the review
    pub isbn: String,               // ISBN of the reviewed book
    pub review: String,             // Review text
    pub rating: u8,                 // 1 to 5, checked by the route layer
    pub created_at: DateTime<Utc>,  // Set once on first insert
    pub updated_at: DateTime<Utc>,  // Refreshed on every upsert
}

impl Review {
    /// True when this is the review `user_id` wrote for `isbn`.
    pub fn is_keyed_by(&self, user_id: u64, isbn: &str) -> bool {
        self.user_id == user_id && self.isbn == isbn
    }
}
