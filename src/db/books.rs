use super::{Collection, Database};
use crate::models::book::Book;

impl Database {
    /// All books in catalog order. Empty when books.json is missing or unreadable.
    pub async fn list_books(&self) -> Vec<Book> {
        self.load(Collection::Books).await
    }

    pub async fn find_book_by_isbn(&self, isbn: &str) -> Option<Book> {
        self.list_books().await.into_iter().find(|book| book.isbn == isbn)
    }

    // Case-insensitive substring match on the author
    pub async fn find_books_by_author(&self, author: &str) -> Vec<Book> {
        let needle = author.to_lowercase();
        self.list_books()
            .await
            .into_iter()
            .filter(|book| book.author_contains(&needle))
            .collect()
    }

    // Case-insensitive substring match on the title
    pub async fn find_books_by_title(&self, title: &str) -> Vec<Book> {
        let needle = title.to_lowercase();
        self.list_books()
            .await
            .into_iter()
            .filter(|book| book.title_contains(&needle))
            .collect()
    }
}
