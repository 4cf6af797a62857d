use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Value};

use super::required;
use crate::auth::AuthUser;
use crate::db::Database;
use crate::error::ApiError;

#[derive(Deserialize, Debug)]
pub struct ReviewRequest {
    pub isbn: Option<String>,
    pub review: Option<String>,
    pub rating: Option<Value>, // Integer or numeric string
}

/// Reads a rating given either as a JSON integer or a numeric string and
/// checks it is within 1..=5.
pub fn parse_rating(raw: &Value) -> Result<u8, ApiError> {
    let out_of_range = || ApiError::Validation("Rating must be between 1 and 5".to_string());

    let rating = match raw {
        Value::Number(n) => n.as_i64().ok_or_else(out_of_range)?,
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| out_of_range())?,
        _ => return Err(out_of_range()),
    };

    match rating {
        1..=5 => Ok(rating as u8),
        _ => Err(out_of_range()),
    }
}

// GET /api/reviews/isbn/{isbn}
pub async fn reviews_by_isbn(db: web::Data<Database>, isbn: web::Path<String>) -> HttpResponse {
    let reviews = db.reviews_by_isbn(&isbn).await;
    HttpResponse::Ok().json(json!({
        "success": true,
        "isbn": isbn.as_str(),
        "count": reviews.len(),
        "reviews": reviews,
    }))
}

// GET /api/reviews/{review_id}
pub async fn review_by_id(
    db: web::Data<Database>,
    review_id: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let review = db
        .find_review_by_id(*review_id)
        .await
        .ok_or_else(|| ApiError::NotFound("Review not found".to_string()))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "review": review,
    })))
}

// POST /api/reviews
pub async fn upsert_review(
    db: web::Data<Database>,
    caller: AuthUser,
    request: web::Json<ReviewRequest>,
) -> Result<HttpResponse, ApiError> {
    let (Some(isbn), Some(text), Some(rating)) = (
        required(&request.isbn),
        required(&request.review),
        request.rating.as_ref().filter(|r| !r.is_null()),
    ) else {
        return Err(ApiError::Validation(
            "ISBN, review, and rating are required".to_string(),
        ));
    };
    let rating = parse_rating(rating)?;

    let review = db.upsert_review(caller.id, isbn, text, rating).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Review added/modified successfully",
        "review": review,
    })))
}

// DELETE /api/reviews/{review_id}
pub async fn delete_review(
    db: web::Data<Database>,
    caller: AuthUser,
    review_id: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let review = db.delete_review(caller.id, *review_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Review deleted successfully",
        "review": review,
    })))
}
