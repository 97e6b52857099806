pub(crate) mod messaging;
pub(crate) mod notifications;
pub(crate) mod plans;
pub(crate) mod robot_requests;
pub(crate) mod robots;
pub(crate) mod transactions;
pub(crate) mod users;

use std::str::FromStr;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);
    SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await
}
