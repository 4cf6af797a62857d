// src/models/book.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Book {
    pub isbn: String,   // Catalog key, unique within books.json
    pub title: String,  // Book title
    pub author: String, // Author display name
    #[serde(flatten)]
    pub extra: Map<String, Value>, // Any other catalog fields (year, genre, ...) kept as-is
}

impl Book {
    pub fn author_contains(&self, needle_lower: &str) -> bool {
        self.author.to_lowercase().contains(needle_lower)
    }

    pub fn title_contains(&self, needle_lower: &str) -> bool {
        self.title.to_lowercase().contains(needle_lower)
    }
}
