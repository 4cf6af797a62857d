use chrono::Utc;
use tokio::task::spawn_blocking;
use tracing::{info, warn};

use super::{Collection, Database, IdSeries, StoreError};
use crate::models::user::{PublicUser, User};

impl Database {
    pub async fn list_users(&self) -> Vec<User> {
        self.load(Collection::Users).await
    }

    pub async fn find_user_by_id(&self, id: u64) -> Option<User> {
        self.list_users().await.into_iter().find(|user| user.id == id)
    }

    /// Creates an account. Fails with [`StoreError::UserExists`] when the username
    /// or the email is already taken. The returned record carries the password hash.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        full_name: &str,
        email: &str,
    ) -> Result<User, StoreError> {
        // Skip the expensive hash for obvious duplicates, re-checked under the lock below
        if is_taken(&self.list_users().await, username, email) {
            return Err(StoreError::UserExists);
        }

        let password = password.to_string();
        let cost = self.bcrypt_cost;
        let hashed = spawn_blocking(move || bcrypt::hash(password, cost)).await??;

        let guard = self.write_lock.lock().await;
        let mut users: Vec<User> = self.load_for_write(&guard, Collection::Users).await?;
        if is_taken(&users, username, email) {
            return Err(StoreError::UserExists);
        }

        let highest = users.iter().map(|u| u.id).max().unwrap_or(0);
        let user = User {
            id: self.next_id(&guard, IdSeries::Users, highest).await?,
            username: username.to_string(),
            password: hashed,
            full_name: full_name.to_string(),
            email: email.to_string(),
            registered_at: Utc::now(),
        };
        users.push(user.clone());
        self.save(&guard, Collection::Users, &users).await?;

        info!("Registered user {} ({})", user.id, user.username);
        Ok(user)
    }

    /// Checks a username/password pair. Unknown users and wrong passwords
    /// both fail with [`StoreError::InvalidCredentials`].
    pub async fn login(&self, username: &str, password: &str) -> Result<PublicUser, StoreError> {
        let user = self
            .list_users()
            .await
            .into_iter()
            .find(|u| u.username == username)
            .ok_or(StoreError::InvalidCredentials)?;

        let password = password.to_string();
        let hash = user.password.clone();
        let valid = spawn_blocking(move || bcrypt::verify(password, &hash))
            .await?
            .unwrap_or_else(|e| {
                warn!("Stored password hash for user {} is unusable: {e}", user.id);
                false
            });

        if !valid {
            return Err(StoreError::InvalidCredentials);
        }
        Ok(user.into())
    }
}

fn is_taken(users: &[User], username: &str, email: &str) -> bool {
    users
        .iter()
        .any(|u| u.username == username || u.email == email)
}

#[cfg(test)]
mod tests {
    use crate::db::test_support::create_test_db;
    use crate::db::{Collection, StoreError};

    #[tokio::test]
    async fn test_register_hashes_password() {
        let (_dir, db) = create_test_db().await;

        let user = db
            .register("alice", "pw1", "Alice Liddell", "alice@example.com")
            .await
            .unwrap();
        assert_eq!(user.id, 1);
        assert_ne!(user.password, "pw1");
        assert!(bcrypt::verify("pw1", &user.password).unwrap());

        let stored = db.find_user_by_id(1).await.unwrap();
        assert_eq!(stored.username, "alice");
        assert_eq!(stored.full_name, "Alice Liddell");
    }

    #[tokio::test]
    async fn test_register_duplicate_username_or_email() {
        let (_dir, db) = create_test_db().await;
        db.register("alice", "pw1", "Alice", "alice@example.com")
            .await
            .unwrap();

        let err = db
            .register("alice", "other", "Someone Else", "else@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UserExists));
        assert_eq!(err.to_string(), "User already exists");

        let err = db
            .register("bob", "pw2", "Bob", "alice@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UserExists));

        assert_eq!(db.list_users().await.len(), 1);
    }

    #[tokio::test]
    async fn test_login_strips_password() {
        let (_dir, db) = create_test_db().await;
        db.register("alice", "pw1", "Alice", "alice@example.com")
            .await
            .unwrap();

        let user = db.login("alice", "pw1").await.unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.email, "alice@example.com");
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["fullName"], "Alice");
    }

    #[tokio::test]
    async fn test_login_failures_look_the_same() {
        let (_dir, db) = create_test_db().await;
        db.register("alice", "pw1", "Alice", "alice@example.com")
            .await
            .unwrap();

        let wrong_password = db.login("alice", "nope").await.unwrap_err();
        let unknown_user = db.login("mallory", "pw1").await.unwrap_err();

        assert!(matches!(wrong_password, StoreError::InvalidCredentials));
        assert!(matches!(unknown_user, StoreError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_user_ids_increase() {
        let (_dir, db) = create_test_db().await;
        let a = db.register("a", "pw", "A", "a@example.com").await.unwrap();
        let b = db.register("b", "pw", "B", "b@example.com").await.unwrap();

        assert_eq!((a.id, b.id), (1, 2));
        assert!(db.find_user_by_id(3).await.is_none());
    }

    #[tokio::test]
    async fn test_register_refuses_to_overwrite_unparseable_users() {
        let (_dir, db) = create_test_db().await;
        std::fs::write(db.path(Collection::Users), "[{\"id\": 1, \"username\": ").unwrap();

        let err = db
            .register("alice", "pw1", "Alice", "alice@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { file: "users.json", .. }));

        let on_disk = std::fs::read_to_string(db.path(Collection::Users)).unwrap();
        assert_eq!(on_disk, "[{\"id\": 1, \"username\": ");
    }
}
