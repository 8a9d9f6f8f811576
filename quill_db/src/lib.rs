use quill_core::error::QuillError;

use anyhow::Context;
use entrait::Impl;
use sqlx::error::DatabaseError;
use sqlx::PgPool;

pub mod bookmark_db;
pub mod comment_db;
pub mod poll_db;
pub mod post_db;
pub mod site_db;
pub mod user_db;

#[derive(Clone)]
pub struct Db {
    pub pg_pool: PgPool,
}

impl Db {
    pub async fn init(url: &str) -> anyhow::Result<Self> {
        let pg_pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(50)
            .connect(url)
            .await
            .context("could not connect to database_url")?;

        sqlx::migrate!("../migrations").run(&pg_pool).await?;

        Ok(Db { pg_pool })
    }
}

/// Access to the database handle, implemented by whatever type the
/// repository functions are dispatched through.
pub trait GetDb {
    fn get_db(&self) -> &Db;
}

impl GetDb for Impl<Db> {
    fn get_db(&self) -> &Db {
        self
    }
}

// Satisfies the `GetDb` bound for the exported unimock mocks of the
// repository functions. The repository bodies are always intercepted by
// the mock in tests, so this accessor is never actually invoked.
impl GetDb for unimock::Unimock {
    fn get_db(&self) -> &Db {
        unreachable!("quill_db repository functions are mocked on Unimock; get_db is never called")
    }
}

trait DbResultExt<T> {
    fn on_constraint(
        self,
        name: &str,
        map_err: impl FnOnce(Box<dyn DatabaseError>) -> QuillError,
    ) -> Result<T, QuillError>;
}

impl<T, E> DbResultExt<T> for Result<T, E>
where
    E: Into<QuillError>,
{
    fn on_constraint(
        self,
        name: &str,
        map_err: impl FnOnce(Box<dyn DatabaseError>) -> QuillError,
    ) -> Result<T, QuillError> {
        self.map_err(|e| match e.into() {
            QuillError::Sqlx(sqlx::Error::Database(dbe)) if dbe.constraint() == Some(name) => {
                map_err(dbe)
            }
            e => e,
        })
    }
}

#[cfg(test)]
async fn create_test_db() -> Impl<Db> {
    use sha2::Digest;
    use sqlx::Connection;

    let mut hasher = sha2::Sha256::new();
    hasher.update(std::thread::current().name().unwrap().as_bytes());
    let thread_hash = hex::encode(hasher.finalize());
    let db_name = &thread_hash[0..24];

    let mut url = database_server_url();
    let mut connection = sqlx::PgConnection::connect(url.as_str()).await.unwrap();

    sqlx::query(&format!(r#"DROP DATABASE IF EXISTS "{}""#, db_name))
        .execute(&mut connection)
        .await
        .expect("failed to drop");

    sqlx::query(&format!(r#"CREATE DATABASE "{}""#, db_name))
        .execute(&mut connection)
        .await
        .expect("failed creating test database");

    url.set_path(db_name);

    let pg_pool = sqlx::PgPool::connect(url.as_str())
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("../migrations")
        .run(&pg_pool)
        .await
        .expect("Failed to migrate");

    Impl::new(Db { pg_pool })
}

#[cfg(test)]
fn database_server_url() -> url::Url {
    // (re)load the .env file
    dotenv::dotenv().ok();

    let mut url: url::Url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set")
        .parse()
        .expect("malformed DATABASE_URL");

    if let Ok(mut path) = url.path_segments_mut() {
        path.clear();
    }

    url
}
