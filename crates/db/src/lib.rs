use std::{env, str::FromStr};

use sqlx::{
    Error, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub mod models;

#[derive(Clone)]
pub struct DBService {
    pub pool: SqlitePool,
}

impl DBService {
    /// Create a new DBService connecting to SQLite.
    /// Uses DATABASE_URL environment variable.
    pub async fn new() -> Result<DBService, Error> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://data/feasibility.db?mode=rwc".to_string());
        Self::from_url(&database_url).await
    }

    /// Connect to an explicit database URL and run migrations.
    /// Used by tests with `sqlite::memory:`.
    pub async fn from_url(database_url: &str) -> Result<DBService, Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // In-memory databases are per-connection, so the pool must not
        // hand out a second connection that never saw the migrations.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 10 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(DBService { pool })
    }
}
