use std::{str::FromStr, time::Duration};

use sea_orm::{DatabaseConnection, DbErr, SqlxSqliteConnector};
use sea_orm_migration::MigratorTrait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};
use utils::assets::asset_dir;

pub use sea_orm;
pub use sea_orm::{ConnectionTrait, TransactionTrait};

pub mod entities;
pub mod models;
mod retry;

pub use retry::retry_on_db_busy;

#[derive(Clone)]
pub struct DBService {
    pub conn: DatabaseConnection,
}

impl DBService {
    /// Opens (or creates) the workshop database in the asset directory and
    /// runs pending migrations. `DATABASE_URL` overrides the default path.
    pub async fn new() -> Result<DBService, DbErr> {
        let database_url = match std::env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ => format!(
                "sqlite://{}",
                asset_dir().join("db.sqlite").to_string_lossy()
            ),
        };
        Self::connect(&database_url).await
    }

    /// Connects to an explicit database URL and runs migrations. Tests point
    /// this at a throwaway file database.
    pub async fn connect(database_url: &str) -> Result<DBService, DbErr> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|err| DbErr::Conn(sea_orm::RuntimeErr::Internal(err.to_string())))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30));
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|err| DbErr::Conn(sea_orm::RuntimeErr::Internal(err.to_string())))?;
        let conn = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool);
        db_migration::Migrator::up(&conn, None).await?;
        Ok(DBService { conn })
    }
}
