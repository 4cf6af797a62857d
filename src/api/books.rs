use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::error::ApiError;
use crate::models::book::Book;

// Response bodies. The proxy routes decode these from the remote side, so they
// are Deserialize as well.

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BookList {
    pub success: bool,
    pub count: usize,
    pub books: Vec<Book>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BookLookup {
    pub success: bool,
    pub book: Book,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuthorSearch {
    pub success: bool,
    pub count: usize,
    pub author: String,
    pub books: Vec<Book>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TitleSearch {
    pub success: bool,
    pub count: usize,
    pub title: String,
    pub books: Vec<Book>,
}

pub async fn book_list(db: &Database) -> BookList {
    let books = db.list_books().await;
    BookList {
        success: true,
        count: books.len(),
        books,
    }
}

pub async fn lookup_isbn(db: &Database, isbn: &str) -> Result<BookLookup, ApiError> {
    let book = db
        .find_book_by_isbn(isbn)
        .await
        .ok_or_else(|| ApiError::NotFound("Book not found".to_string()))?;
    Ok(BookLookup {
        success: true,
        book,
    })
}

pub async fn search_author(db: &Database, author: String) -> AuthorSearch {
    let books = db.find_books_by_author(&author).await;
    AuthorSearch {
        success: true,
        count: books.len(),
        author,
        books,
    }
}

pub async fn search_title(db: &Database, title: String) -> TitleSearch {
    let books = db.find_books_by_title(&title).await;
    TitleSearch {
        success: true,
        count: books.len(),
        title,
        books,
    }
}

// GET /api/books
pub async fn list_books(db: web::Data<Database>) -> HttpResponse {
    HttpResponse::Ok().json(book_list(&db).await)
}

// GET /api/books/isbn/{isbn}
pub async fn book_by_isbn(
    db: web::Data<Database>,
    isbn: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(lookup_isbn(&db, &isbn).await?))
}

// GET /api/books/author/{author}
pub async fn books_by_author(db: web::Data<Database>, author: web::Path<String>) -> HttpResponse {
    HttpResponse::Ok().json(search_author(&db, author.into_inner()).await)
}

// GET /api/books/title/{title}
pub async fn books_by_title(db: web::Data<Database>, title: web::Path<String>) -> HttpResponse {
    HttpResponse::Ok().json(search_title(&db, title.into_inner()).await)
}
