use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteConnection},
    Connection as SqlConnection,
};
use tokio::sync::{Mutex, MutexGuard};

use crate::schema;

/// Removes the backing file once the last connection clone is gone.
struct TestDb {
    filename: String,
}

impl Drop for TestDb {
    fn drop(&mut self) {
        let path = Path::new(&self.filename);
        if path.exists() {
            fs::remove_file(path).unwrap();
        }
    }
}

/// A thread safe connection to the database
#[derive(Clone)]
pub struct Connection {
    conn: Arc<Mutex<SqliteConnection>>,
    _test_db: Option<Arc<TestDb>>,
}

impl Connection {
    /// Open a connection to the database
    pub async fn open(filename: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(filename)?
            .create_if_missing(true)
            .foreign_keys(true);
        let conn = SqliteConnection::connect_with(&opts).await?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            _test_db: None,
        })
    }

    /// Open a new test database connection. The database is created
    /// fresh with the schema installed and deleted again when the
    /// last handle is dropped.
    pub async fn open_test() -> Self {
        let filename = format!("/tmp/kratos_test_{}.sqlite3", rand::random::<u64>());

        let opts = SqliteConnectOptions::from_str(&filename)
            .unwrap()
            .create_if_missing(true)
            .foreign_keys(true);
        let conn = SqliteConnection::connect_with(&opts).await.unwrap();
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            _test_db: Some(Arc::new(TestDb {
                filename: filename.clone(),
            })),
        };

        // Install the schema
        schema::install(&db).await.unwrap();

        db
    }

    pub async fn lock(&self) -> MutexGuard<'_, SqliteConnection> {
        self.conn.lock().await
    }
}
