//! HTTP surface. Every handler makes one store call and wraps the result in
//! the `{"success": ..., ...}` envelope.

pub mod auth;
pub mod books;
pub mod proxy;
pub mod reviews;

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::error::ApiError;

/// Mounts every route. Shared state (`Database`, `TokenSigner`, `ProxyClient`)
/// is expected as `web::Data` on the enclosing `App`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .route("/", web::get().to(index))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/books")
                        .route("", web::get().to(books::list_books))
                        .route("/isbn/{isbn}", web::get().to(books::book_by_isbn))
                        .route("/author/{author}", web::get().to(books::books_by_author))
                        .route("/title/{title}", web::get().to(books::books_by_title)),
                )
                .service(
                    web::scope("/auth")
                        .route("/register", web::post().to(auth::register))
                        .route("/login", web::post().to(auth::login))
                        .route("/me", web::get().to(auth::me)),
                )
                .service(
                    web::scope("/reviews")
                        .route("", web::post().to(reviews::upsert_review))
                        .route("/isbn/{isbn}", web::get().to(reviews::reviews_by_isbn))
                        .route("/{review_id}", web::get().to(reviews::review_by_id))
                        .route("/{review_id}", web::delete().to(reviews::delete_review)),
                )
                .service(
                    web::scope("/nodejs")
                        .route("/books", web::get().to(proxy::books))
                        .route("/books/isbn/{isbn}", web::get().to(proxy::book_by_isbn))
                        .route("/books/author/{author}", web::get().to(proxy::books_by_author))
                        .route("/books/title/{title}", web::get().to(proxy::books_by_title)),
                ),
        );
}

// Define the index handler
async fn index() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "Welcome to Bookshop API",
        "endpoints": {
            "books": "/api/books",
            "auth": "/api/auth",
            "reviews": "/api/reviews",
            "nodejsMethods": "/api/nodejs",
        }
    }))
}

// Malformed bodies and path parameters get the same envelope as every other error
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::Validation(format!("Invalid JSON body: {err}")).into())
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| ApiError::Validation(format!("Invalid path: {err}")).into())
}

/// Treats absent and blank strings alike, the way form fields usually arrive.
pub(crate) fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
