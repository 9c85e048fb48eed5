use crate::error::AppError;
use crate::models::CalendarEntry;
use chrono::NaiveDate;
use nanoid::nanoid;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

/// Opens the pool, creating the database file and its directory if missing.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    if let Some(dir) = connect_options
        .get_filename()
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
    {
        tokio::fs::create_dir_all(dir).await?;
    }

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await
}

pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS entries (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            date DATE NOT NULL,
            category TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        );",
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_all_entries(pool: &SqlitePool) -> Result<Vec<CalendarEntry>, AppError> {
    sqlx::query_as("SELECT * FROM entries ORDER BY created_at, rowid")
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
}

pub async fn find_entry(pool: &SqlitePool, id: &str) -> Result<Option<CalendarEntry>, AppError> {
    sqlx::query_as("SELECT * FROM entries WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)
}

pub async fn create_entry(
    pool: &SqlitePool,
    title: &str,
    date: NaiveDate,
    category: &str,
) -> Result<CalendarEntry, AppError> {
    let id = nanoid!(10);
    let entry = sqlx::query_as(
        "INSERT INTO entries (id, title, date, category) VALUES (?, ?, ?, ?) RETURNING *",
    )
    .bind(id)
    .bind(title)
    .bind(date)
    .bind(category)
    .fetch_one(pool)
    .await?;
    Ok(entry)
}

pub async fn update_entry(
    pool: &SqlitePool,
    id: &str,
    title: &str,
    date: NaiveDate,
    category: &str,
) -> Result<Option<CalendarEntry>, AppError> {
    sqlx::query_as(
        "UPDATE entries SET title = ?, date = ?, category = ? WHERE id = ? RETURNING *",
    )
    .bind(title)
    .bind(date)
    .bind(category)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::from)
}

pub async fn delete_entry(pool: &SqlitePool, id: &str) -> Result<Option<CalendarEntry>, AppError> {
    sqlx::query_as("DELETE FROM entries WHERE id = ? RETURNING *")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)
}
