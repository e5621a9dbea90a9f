use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

/// Current Unix timestamp, the storage format for every time column.
pub fn now_ts() -> i64 {
    Utc::now().timestamp()
}

/// Today's calendar key, `YYYY-MM-DD` (UTC).
pub fn today_key() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

pub async fn init_db(db_path: &str) -> Result<SqlitePool, sqlx::Error> {
    let db_url = format!("sqlite://{}", db_path);
    info!("Initializing database at: {}", db_url);

    let options = SqliteConnectOptions::from_str(&db_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Idempotent migrations: six keyed tables.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS conversations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            user_message TEXT NOT NULL,
            ai_response TEXT NOT NULL,
            response_time_ms INTEGER NOT NULL DEFAULT 0,
            content_type TEXT NOT NULL DEFAULT 'text',
            detected_intent TEXT NOT NULL,
            obd_code_detected TEXT
        );
        CREATE TABLE IF NOT EXISTS learned_qa (
            question_pattern TEXT PRIMARY KEY,
            best_answer TEXT NOT NULL,
            category TEXT NOT NULL,
            times_used INTEGER NOT NULL DEFAULT 1,
            avg_rating REAL NOT NULL DEFAULT 5.0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS question_analytics (
            question_normalized TEXT PRIMARY KEY,
            count INTEGER NOT NULL DEFAULT 1,
            last_asked INTEGER NOT NULL,
            category TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS user_sessions (
            user_id TEXT PRIMARY KEY,
            session_start INTEGER NOT NULL,
            last_message_at INTEGER NOT NULL,
            message_count INTEGER NOT NULL DEFAULT 0
        );
        CREATE TABLE IF NOT EXISTS daily_stats (
            date TEXT PRIMARY KEY,
            total_messages INTEGER NOT NULL DEFAULT 0,
            unique_users INTEGER NOT NULL DEFAULT 0,
            obd_queries INTEGER NOT NULL DEFAULT 0,
            domain_queries INTEGER NOT NULL DEFAULT 0,
            technical_queries INTEGER NOT NULL DEFAULT 0,
            avg_response_time_ms REAL
        );
        CREATE TABLE IF NOT EXISTS search_cache (
            query TEXT PRIMARY KEY,
            results TEXT NOT NULL,
            cached_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL
        );
        "#,
    )
    .execute(&pool)
    .await?;

    info!("Database initialized and migrations applied.");

    Ok(pool)
}
