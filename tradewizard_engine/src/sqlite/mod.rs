mod db;
mod sqlite_impl;

pub use db::new_pool;
pub use sqlite_impl::SqliteDatabase;

/// The embedded schema migrations for the SQLite backend.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./src/sqlite/migrations");
