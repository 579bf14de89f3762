pub mod auth;
pub mod catalog;
pub mod comments;
pub mod error;
pub mod likes;
pub mod middleware;
pub mod routes;
pub mod service;

use tracing::error;

use crate::error::ApiError;

/// Run a synchronous storage call on the blocking pool.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow::anyhow!("blocking task failed"))
    })?
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;
    use std::sync::Arc;

    use envision_db::Database;
    use envision_db::models::NewUser;

    /// A database file in the temp dir, removed (with its WAL files) on drop.
    pub struct ScratchDb {
        pub db: Arc<Database>,
        path: PathBuf,
    }

    impl ScratchDb {
        pub fn new() -> Self {
            let path =
                std::env::temp_dir().join(format!("envision-api-{}.db", uuid::Uuid::new_v4()));
            let db = Arc::new(Database::open_with_readers(&path, 2).unwrap());
            Self { db, path }
        }
    }

    impl Drop for ScratchDb {
        fn drop(&mut self) {
            for suffix in ["", "-wal", "-shm"] {
                let mut p = self.path.clone().into_os_string();
                p.push(suffix);
                let _ = std::fs::remove_file(p);
            }
        }
    }

    pub fn add_user(db: &Database, name: &str) -> i64 {
        let email = format!("{name}@example.com");
        db.create_user(&NewUser {
            username: name,
            password_hash: "unused",
            email: &email,
            first_name: "Test",
            last_name: "User",
            grade: 10,
        })
        .unwrap()
        .unwrap()
    }
}
