//! Demo routes that answer the book queries by calling this service's own
//! `/api/books` endpoints over HTTP, and fall back to the store when that fails.
//!
//! Two styles are shown: plain `async`/`.await`, and a chain of future
//! combinators for the ISBN lookup.

use std::future::Future;
use std::time::Duration;

use actix_web::{web, HttpResponse};
use futures::{future, TryFutureExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::books::{self, AuthorSearch, BookList, BookLookup, TitleSearch};
use crate::db::Database;
use crate::error::ApiError;

const ASYNC_AWAIT: &str = "Async/Await with reqwest";
const COMBINATORS: &str = "Future combinators with reqwest";

/// Outbound client pointed at this service.
pub struct ProxyClient {
    http: reqwest::Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(ProxyClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, reqwest::Error> {
        let url = self.url(path);
        debug!("Proxy GET {url}");
        let response = self.http.get(&url).send().await?.error_for_status()?;
        response.json().await
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Remote, // Answered by the outbound HTTP call
    Local,  // Answered by the store after the call failed
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ProxyResponse<T> {
    pub success: bool,
    pub method: String,
    pub source: Source,
    pub data: T,
}

impl<T> ProxyResponse<T> {
    fn new(method: &str, source: Source, data: T) -> Self {
        ProxyResponse {
            success: true,
            method: method.to_string(),
            source,
            data,
        }
    }
}

async fn remote_or_local<T, F>(
    proxy: &ProxyClient,
    path: &str,
    local: F,
) -> Result<ProxyResponse<T>, ApiError>
where
    T: DeserializeOwned,
    F: Future<Output = Result<T, ApiError>>,
{
    match proxy.fetch::<T>(path).await {
        Ok(data) => Ok(ProxyResponse::new(ASYNC_AWAIT, Source::Remote, data)),
        Err(err) => {
            warn!("Proxy call to {path} failed, answering locally: {err}");
            let data = local.await?;
            Ok(ProxyResponse::new(ASYNC_AWAIT, Source::Local, data))
        }
    }
}

// GET /api/nodejs/books
pub async fn books(
    db: web::Data<Database>,
    proxy: web::Data<ProxyClient>,
) -> Result<HttpResponse, ApiError> {
    let response = remote_or_local::<BookList, _>(&proxy, "/api/books", async {
        Ok::<_, ApiError>(books::book_list(&db).await)
    })
    .await?;
    Ok(HttpResponse::Ok().json(response))
}

// GET /api/nodejs/books/isbn/{isbn}
pub async fn book_by_isbn(
    db: web::Data<Database>,
    proxy: web::Data<ProxyClient>,
    isbn: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let url = proxy.url(&format!("/api/books/isbn/{}", urlencoding::encode(&isbn)));

    let response = proxy
        .http
        .get(&url)
        .send()
        .and_then(|response| future::ready(response.error_for_status()))
        .and_then(|response| response.json::<BookLookup>())
        .map_ok(|data| ProxyResponse::new(COMBINATORS, Source::Remote, data))
        .or_else(|err| {
            warn!("Proxy call to {url} failed, answering locally: {err}");
            books::lookup_isbn(&db, &isbn)
                .map_ok(|data| ProxyResponse::new(COMBINATORS, Source::Local, data))
        })
        .await?;

    Ok(HttpResponse::Ok().json(response))
}

// GET /api/nodejs/books/author/{author}
pub async fn books_by_author(
    db: web::Data<Database>,
    proxy: web::Data<ProxyClient>,
    author: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let author = author.into_inner();
    let path = format!("/api/books/author/{}", urlencoding::encode(&author));

    let response = remote_or_local::<AuthorSearch, _>(&proxy, &path, async {
        Ok::<_, ApiError>(books::search_author(&db, author.clone()).await)
    })
    .await?;
    Ok(HttpResponse::Ok().json(response))
}

// GET /api/nodejs/books/title/{title}
pub async fn books_by_title(
    db: web::Data<Database>,
    proxy: web::Data<ProxyClient>,
    title: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let title = title.into_inner();
    let path = format!("/api/books/title/{}", urlencoding::encode(&title));

    let response = remote_or_local::<TitleSearch, _>(&proxy, &path, async {
        Ok::<_, ApiError>(books::search_title(&db, title.clone()).await)
    })
    .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let proxy = ProxyClient::new("http://localhost:2006/", Duration::from_secs(1)).unwrap();
        assert_eq!(proxy.url("/api/books"), "http://localhost:2006/api/books");
    }

    #[test]
    fn test_source_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Source::Remote).unwrap(), "remote");
        assert_eq!(serde_json::to_value(Source::Local).unwrap(), "local");
    }
}
