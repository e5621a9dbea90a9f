//! Conversation analytics.
//!
//! `record` is called once per handled message and feeds three tables in
//! one pass: the raw conversation log, the per-question counters, and the
//! per-day counters. Counter updates are single-statement upserts so
//! concurrent requests on the same key never lose increments.

use crate::brain::{normalize_question, Intent};
use crate::database::{now_ts, today_key};
use crate::error::AppError;
use crate::knowledge;
use crate::models::{AnalyticsSummary, DailyStat, QuestionStat};
use chrono::Utc;
use sqlx::sqlite::SqlitePool;

/// One handled exchange, ready to be logged.
#[derive(Debug, Clone)]
pub struct ExchangeRecord<'a> {
    pub user_id: &'a str,
    pub user_message: &'a str,
    pub ai_response: &'a str,
    pub response_time_ms: i64,
    pub content_type: &'a str,
    pub intent: Intent,
    pub obd_code: Option<&'a str>,
}

/// Log an exchange and bump every derived counter.
pub async fn record(pool: &SqlitePool, exchange: ExchangeRecord<'_>) -> Result<(), AppError> {
    let now = now_ts();

    sqlx::query(
        r#"
        INSERT INTO conversations
        (user_id, created_at, user_message, ai_response, response_time_ms, content_type, detected_intent, obd_code_detected)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(exchange.user_id)
    .bind(now)
    .bind(exchange.user_message)
    .bind(exchange.ai_response)
    .bind(exchange.response_time_ms)
    .bind(exchange.content_type)
    .bind(exchange.intent.label())
    .bind(exchange.obd_code)
    .execute(pool)
    .await?;

    let normalized = normalize_question(exchange.user_message);
    if !normalized.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO question_analytics (question_normalized, count, last_asked, category)
            VALUES (?, 1, ?, ?)
            ON CONFLICT(question_normalized) DO UPDATE SET
                count = count + 1,
                last_asked = excluded.last_asked
            "#,
        )
        .bind(&normalized)
        .bind(now)
        .bind(exchange.intent.label())
        .execute(pool)
        .await?;
    }

    let is_obd = exchange.obd_code.is_some() as i64;
    let is_domain = (exchange.intent == Intent::Domain) as i64;
    let is_technical = (exchange.intent == Intent::Technical) as i64;

    // unique_users keeps its insert-time value: a coarse per-day approximation.
    sqlx::query(
        r#"
        INSERT INTO daily_stats
        (date, total_messages, unique_users, obd_queries, domain_queries, technical_queries, avg_response_time_ms)
        VALUES (?, 1, 1, ?, ?, ?, ?)
        ON CONFLICT(date) DO UPDATE SET
            total_messages = total_messages + 1,
            obd_queries = obd_queries + excluded.obd_queries,
            domain_queries = domain_queries + excluded.domain_queries,
            technical_queries = technical_queries + excluded.technical_queries,
            avg_response_time_ms =
                (COALESCE(avg_response_time_ms, 0.0) * total_messages + excluded.avg_response_time_ms)
                / (total_messages + 1)
        "#,
    )
    .bind(today_key())
    .bind(is_obd)
    .bind(is_domain)
    .bind(is_technical)
    .bind(exchange.response_time_ms as f64)
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO user_sessions (user_id, session_start, last_message_at, message_count)
        VALUES (?, ?, ?, 1)
        ON CONFLICT(user_id) DO UPDATE SET
            last_message_at = excluded.last_message_at,
            message_count = message_count + 1
        "#,
    )
    .bind(exchange.user_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Comprehensive summary for the analytics endpoint.
pub async fn summary(pool: &SqlitePool) -> Result<AnalyticsSummary, AppError> {
    let (total_conversations,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM conversations")
        .fetch_one(pool)
        .await?;

    let (unique_users,): (i64,) =
        sqlx::query_as("SELECT COUNT(DISTINCT user_id) FROM conversations")
            .fetch_one(pool)
            .await?;

    let midnight = Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(0);
    let (today_conversations,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM conversations WHERE created_at >= ?")
            .bind(midnight)
            .fetch_one(pool)
            .await?;

    let intent_distribution: Vec<(String, i64)> = sqlx::query_as(
        "SELECT detected_intent, COUNT(*) AS count FROM conversations \
         GROUP BY detected_intent ORDER BY count DESC",
    )
    .fetch_all(pool)
    .await?;

    let top_questions: Vec<(String, i64)> = sqlx::query_as(
        "SELECT question_normalized, count FROM question_analytics \
         ORDER BY count DESC LIMIT 10",
    )
    .fetch_all(pool)
    .await?;

    let top_obd_codes: Vec<(String, i64)> = sqlx::query_as(
        "SELECT obd_code_detected, COUNT(*) AS count FROM conversations \
         WHERE obd_code_detected IS NOT NULL \
         GROUP BY obd_code_detected ORDER BY count DESC LIMIT 10",
    )
    .fetch_all(pool)
    .await?;

    Ok(AnalyticsSummary {
        total_conversations,
        unique_users,
        today_conversations,
        intent_distribution,
        top_questions,
        learned_qa_count: knowledge::count(pool).await?,
        top_obd_codes,
    })
}

/// The most frequently asked questions.
pub async fn top_questions(pool: &SqlitePool, limit: i64) -> Result<Vec<QuestionStat>, AppError> {
    Ok(sqlx::query_as::<_, QuestionStat>(
        "SELECT question_normalized, count, last_asked, category FROM question_analytics \
         ORDER BY count DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?)
}

/// Daily counters for the last `days` days, most recent first.
pub async fn daily_stats(pool: &SqlitePool, days: i64) -> Result<Vec<DailyStat>, AppError> {
    Ok(sqlx::query_as::<_, DailyStat>(
        "SELECT date, total_messages, unique_users, obd_queries, domain_queries, technical_queries, avg_response_time_ms \
         FROM daily_stats ORDER BY date DESC LIMIT ?",
    )
    .bind(days)
    .fetch_all(pool)
    .await?)
}

/// Questions the assistant struggled with: short answers or apologies.
pub async fn struggling_questions(pool: &SqlitePool) -> Result<Vec<String>, AppError> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT DISTINCT user_message FROM conversations
        WHERE LENGTH(ai_response) < 50
           OR ai_response LIKE '%je ne sais pas%'
           OR ai_response LIKE '%je ne peux pas%'
           OR ai_response LIKE '%désolé%'
        ORDER BY user_message
        LIMIT 20
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(message,)| message).collect())
}
