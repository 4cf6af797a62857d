//! Bookshop catalog and review service.
//!
//! Books, users and reviews live in flat JSON files ([`db`]). Review changes
//! require a signed bearer token ([`auth`]). [`api`] maps the REST surface
//! onto the store.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
