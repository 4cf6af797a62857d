//! Flat JSON-file storage for books, users and reviews.
//!
//! Every collection lives in its own file under the data directory and is
//! read in full on each call. Mutations take the writer lock, load the whole
//! collection, change it in memory and replace the file atomically.

mod books;
mod reviews;
mod users;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::fs;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("User already exists")]
    UserExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Review not found")]
    ReviewNotFound,

    #[error("You do not have permission to delete this review")]
    NotReviewOwner,

    #[error("{file} cannot be parsed, refusing to overwrite it: {reason}")]
    Corrupt { file: &'static str, reason: String },

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode collection: {0}")]
    Json(#[from] serde_json::Error),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// The files backing the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Books,
    Users,
    Reviews,
}

impl Collection {
    pub fn file_name(self) -> &'static str {
        match self {
            Collection::Books => "books.json",
            Collection::Users => "users.json",
            Collection::Reviews => "reviews.json",
        }
    }
}

const COUNTERS_FILE: &str = "counters.json";

/// Collections whose records get ids assigned by the store.
#[derive(Debug, Clone, Copy)]
enum IdSeries {
    Users,
    Reviews,
}

/// Last id handed out per collection. Persisted so ids survive restarts
/// and are not reused after the newest record is deleted.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy)]
struct Counters {
    users: u64,
    reviews: u64,
}

/// Proof that the caller holds the writer lock.
type WriteGuard<'a> = MutexGuard<'a, ()>;

// Define a struct to represent the file store
#[derive(Debug)]
pub struct Database {
    dir: PathBuf,
    bcrypt_cost: u32,
    write_lock: Arc<Mutex<()>>,
}

impl Database {
    pub fn new(dir: impl Into<PathBuf>, bcrypt_cost: u32) -> Self {
        let dir = dir.into();
        debug!("File store rooted at {}", dir.display());
        Database {
            dir,
            bcrypt_cost,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, collection: Collection) -> PathBuf {
        self.dir.join(collection.file_name())
    }

    /// Creates the data directory and any missing collection file as `[]`.
    pub async fn init(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).await?;
        for collection in [Collection::Books, Collection::Users, Collection::Reviews] {
            let path = self.path(collection);
            if fs::try_exists(&path).await? {
                continue;
            }
            fs::write(&path, b"[]").await?;
            debug!("Created empty collection file {}", path.display());
        }
        Ok(())
    }

    /// Reads a whole collection for display. A missing or unreadable file is an
    /// empty collection; records that do not fit `T` are skipped one by one.
    async fn load<T: DeserializeOwned>(&self, collection: Collection) -> Vec<T> {
        let path = self.path(collection);
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} does not exist yet, treating as empty", path.display());
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to read {}: {e}", path.display());
                return Vec::new();
            }
        };

        let records: Vec<Value> = match serde_json::from_slice(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!("Failed to parse {}: {e}", path.display());
                return Vec::new();
            }
        };

        records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value(record) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("Skipping record {index} of {}: {e}", path.display());
                    None
                }
            })
            .collect()
    }

    /// Reads a whole collection that is about to be rewritten. Anything that
    /// would be lost on save (an unreadable file, a record that does not fit
    /// `T`) is an error instead, so the file is left as it is.
    async fn load_for_write<T: DeserializeOwned>(
        &self,
        _guard: &WriteGuard<'_>,
        collection: Collection,
    ) -> Result<Vec<T>, StoreError> {
        let path = self.path(collection);
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&raw).map_err(|e| {
            warn!("Refusing to rewrite {}: {e}", path.display());
            StoreError::Corrupt {
                file: collection.file_name(),
                reason: e.to_string(),
            }
        })
    }

    async fn save<T: Serialize>(
        &self,
        _guard: &WriteGuard<'_>,
        collection: Collection,
        items: &[T],
    ) -> Result<(), StoreError> {
        self.write_atomic(collection.file_name(), &items).await?;
        debug!("Rewrote {} with {} records", collection.file_name(), items.len());
        Ok(())
    }

    // Write to a sibling temp file then rename, so readers never see a half-written file
    async fn write_atomic<T: Serialize + ?Sized>(
        &self,
        file_name: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(value)?;
        let path = self.dir.join(file_name);
        let tmp = self.dir.join(format!("{file_name}.tmp"));

        fs::create_dir_all(&self.dir).await?;
        fs::write(&tmp, body).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn load_counters(&self) -> Counters {
        let path = self.dir.join(COUNTERS_FILE);
        match fs::read(&path).await {
            Ok(raw) => serde_json::from_slice(&raw).unwrap_or_else(|e| {
                warn!("Failed to parse {}: {e}", path.display());
                Counters::default()
            }),
            Err(_) => Counters::default(),
        }
    }

    /// Hands out the next id in `series`, never at or below `highest_present`.
    async fn next_id(
        &self,
        _guard: &WriteGuard<'_>,
        series: IdSeries,
        highest_present: u64,
    ) -> Result<u64, StoreError> {
        let mut counters = self.load_counters().await;
        let slot = match series {
            IdSeries::Users => &mut counters.users,
            IdSeries::Reviews => &mut counters.reviews,
        };
        let id = (*slot).max(highest_present) + 1;
        *slot = id;
        self.write_atomic(COUNTERS_FILE, &counters).await?;
        Ok(id)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tempfile::TempDir;

    // Lowest cost bcrypt accepts, keeps the tests fast
    pub const TEST_COST: u32 = 4;

    pub async fn create_test_db() -> (TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path(), TEST_COST);
        db.init().await.unwrap();
        (dir, db)
    }
}
