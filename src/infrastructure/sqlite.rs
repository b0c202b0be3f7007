mod person;
mod reservation;

use std::{str::FromStr, time::Duration};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::domain::DataAccessError;

pub use self::person::*;
pub use self::reservation::*;

/// SQLite のコネクションプール
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, DataAccessError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        // インメモリDBは接続ごとに別のDBになるため、単一の接続を保持し続ける
        let pool_options = if is_in_memory(url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };
        let pool = pool_options.connect_with(options).await?;
        debug!("データベースに接続しました: {}", url);
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// person / reservation テーブルを作成する
    pub async fn init_schema(&self) -> Result<(), DataAccessError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("スキーマを初期化しました");
        Ok(())
    }

    pub fn reservations(&self) -> SqliteReservationRepository {
        SqliteReservationRepository::new(self.pool.clone())
    }

    pub fn persons(&self) -> SqlitePersonRepository {
        SqlitePersonRepository::new(self.pool.clone())
    }

    pub async fn close(&self) {
        self.pool.close().await
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}
