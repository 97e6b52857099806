use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use tradewizard_engine::{
    db_types::{NewUser, User},
    helpers::hash_password,
    traits::UserManagement,
    SqliteDatabase,
};

/// Create a fresh database at a random path, run migrations, and hand back a connected backend.
pub async fn prepare_test_env() -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let url = random_db_path();
    create_database(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    info!("🚀️ Test database ready at {url}");
    db
}

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/twz_test_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("Error dropping database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("Created Sqlite database {url}");
}

/// Most ledger rows need an owning user; this creates one with a unique email.
#[allow(dead_code)]
pub async fn seed_user(db: &SqliteDatabase, name: &str) -> User {
    let email = format!("{name}-{}@example.com", rand::random::<u32>());
    let user = NewUser::new(name.to_string(), email, hash_password("secret"));
    db.insert_user(user).await.expect("Error inserting test user")
}
