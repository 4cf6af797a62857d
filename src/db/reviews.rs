use chrono::Utc;
use tracing::info;

use super::{Collection, Database, IdSeries, StoreError};
use crate::models::review::Review;

impl Database {
    pub async fn list_reviews(&self) -> Vec<Review> {
        self.load(Collection::Reviews).await
    }

    pub async fn reviews_by_isbn(&self, isbn: &str) -> Vec<Review> {
        self.list_reviews()
            .await
            .into_iter()
            .filter(|review| review.isbn == isbn)
            .collect()
    }

    pub async fn find_review_by_id(&self, review_id: u64) -> Option<Review> {
        self.list_reviews()
            .await
            .into_iter()
            .find(|review| review.id == review_id)
    }

    /// Adds the user's review of `isbn`, or replaces the text and rating of the one
    /// they already wrote. An existing review keeps its id and `createdAt`.
    pub async fn upsert_review(
        &self,
        user_id: u64,
        isbn: &str,
        text: &str,
        rating: u8,
    ) -> Result<Review, StoreError> {
        let guard = self.write_lock.lock().await;
        let mut reviews: Vec<Review> = self.load_for_write(&guard, Collection::Reviews).await?;
        let now = Utc::now();

        let review = match reviews.iter().position(|r| r.is_keyed_by(user_id, isbn)) {
            Some(index) => {
                let existing = &mut reviews[index];
                existing.review = text.to_string();
                existing.rating = rating;
                existing.updated_at = now;
                info!("Updated review {} by user {user_id} for {isbn}", existing.id);
                existing.clone()
            }
            None => {
                let highest = reviews.iter().map(|r| r.id).max().unwrap_or(0);
                let id = self.next_id(&guard, IdSeries::Reviews, highest).await?;
                let review = Review {
                    id,
                    user_id,
                    isbn: isbn.to_string(),
                    review: text.to_string(),
                    rating,
                    created_at: now,
                    updated_at: now,
                };
                reviews.push(review.clone());
                info!("Added review {id} by user {user_id} for {isbn}");
                review
            }
        };

        self.save(&guard, Collection::Reviews, &reviews).await?;
        Ok(review)
    }

    /// Removes review `review_id` if `user_id` wrote it and returns the removed record.
    pub async fn delete_review(&self, user_id: u64, review_id: u64) -> Result<Review, StoreError> {
        let guard = self.write_lock.lock().await;
        let mut reviews: Vec<Review> = self.load_for_write(&guard, Collection::Reviews).await?;

        let index = reviews
            .iter()
            .position(|r| r.id == review_id)
            .ok_or(StoreError::ReviewNotFound)?;
        if reviews[index].user_id != user_id {
            return Err(StoreError::NotReviewOwner);
        }

        let removed = reviews.remove(index);
        self.save(&guard, Collection::Reviews, &reviews).await?;
        info!("Deleted review {review_id} by user {user_id}");
        Ok(removed)
    }
}
