//! Database Module Tests
//!
//! Knowledge reinforcement arithmetic, analytics counters and the search
//! cache TTL, all against a temp-file SQLite database.

use crate::analytics::{self, ExchangeRecord};
use crate::brain::Intent;
use crate::models::SearchHit;
use crate::{cache, database, knowledge};
use sqlx::sqlite::SqlitePool;
use tempfile::tempdir;

/// Create a test database pool with a temporary file.
async fn create_test_pool() -> SqlitePool {
    let dir = tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("test.sqlite");
    let pool = database::init_db(&db_path.to_string_lossy())
        .await
        .expect("Failed to init test db");
    // Keep the backing file alive for the whole test.
    std::mem::forget(dir);
    pool
}

mod knowledge_tests {
    use super::*;

    #[tokio::test]
    async fn test_reinforce_inserts_then_updates() {
        let pool = create_test_pool().await;

        knowledge::reinforce(&pool, "quand changer huile", "réponse A", "technical", 3.0)
            .await
            .unwrap();
        let first = knowledge::lookup(&pool, "quand changer huile")
            .await
            .unwrap()
            .expect("row should exist");
        assert_eq!(first.times_used, 1);
        assert_eq!(first.best_answer, "réponse A");
        assert!((first.avg_rating - 3.0).abs() < 1e-9);

        // A strictly better rating replaces the answer and lifts the mean.
        knowledge::reinforce(&pool, "quand changer huile", "réponse B", "technical", 5.0)
            .await
            .unwrap();
        let second = knowledge::lookup(&pool, "quand changer huile")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.times_used, 2);
        assert_eq!(second.best_answer, "réponse B");
        assert!((second.avg_rating - 4.0).abs() < 1e-9);

        // A worse rating is folded into the mean but keeps the answer.
        knowledge::reinforce(&pool, "quand changer huile", "réponse C", "technical", 2.0)
            .await
            .unwrap();
        let third = knowledge::lookup(&pool, "quand changer huile")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(third.times_used, 3);
        assert_eq!(third.best_answer, "réponse B");
        assert!((third.avg_rating - 10.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_rating_stays_in_bounds() {
        let pool = create_test_pool().await;

        for rating in [5.0, 0.0, 5.0, 5.0, 0.0, 3.5] {
            knowledge::reinforce(&pool, "pression pneu", "réponse", "technical", rating)
                .await
                .unwrap();
            let row = knowledge::lookup(&pool, "pression pneu").await.unwrap().unwrap();
            assert!(
                (0.0..=5.0).contains(&row.avg_rating),
                "avg_rating {} out of bounds",
                row.avg_rating
            );
        }
    }

    #[tokio::test]
    async fn test_equal_rating_does_not_replace_answer() {
        let pool = create_test_pool().await;

        knowledge::reinforce(&pool, "voyant moteur", "réponse A", "technical", 4.0)
            .await
            .unwrap();
        // Equal, not strictly greater: the stored answer must survive.
        knowledge::reinforce(&pool, "voyant moteur", "réponse B", "technical", 4.0)
            .await
            .unwrap();

        let row = knowledge::lookup(&pool, "voyant moteur").await.unwrap().unwrap();
        assert_eq!(row.best_answer, "réponse A");
    }

    #[tokio::test]
    async fn test_lookup_ranks_by_usage_then_rating() {
        let pool = create_test_pool().await;

        knowledge::reinforce(&pool, "vidange rapide", "peu utilisée", "technical", 5.0)
            .await
            .unwrap();
        for _ in 0..4 {
            knowledge::reinforce(&pool, "vidange complète", "très utilisée", "technical", 3.0)
                .await
                .unwrap();
        }

        // Both patterns share the "vidange" token; usage count wins.
        let best = knowledge::lookup(&pool, "la vidange").await.unwrap().unwrap();
        assert_eq!(best.best_answer, "très utilisée");
    }

    #[tokio::test]
    async fn test_lookup_without_tokens() {
        let pool = create_test_pool().await;
        assert!(knowledge::lookup(&pool, "!?").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_quality_gate() {
        let pool = create_test_pool().await;

        knowledge::reinforce(&pool, "batterie morte", "réponse", "technical", 5.0)
            .await
            .unwrap();
        let young = knowledge::lookup(&pool, "batterie morte").await.unwrap().unwrap();
        assert!(!knowledge::passes_quality_gate(&young), "one use is not enough");

        for _ in 0..2 {
            knowledge::reinforce(&pool, "batterie morte", "réponse", "technical", 5.0)
                .await
                .unwrap();
        }
        let mature = knowledge::lookup(&pool, "batterie morte").await.unwrap().unwrap();
        assert!(knowledge::passes_quality_gate(&mature));
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let pool = create_test_pool().await;

        knowledge::seed(&pool).await.unwrap();
        let count_once = knowledge::count(&pool).await.unwrap();
        assert!(count_once >= 8);

        knowledge::seed(&pool).await.unwrap();
        assert_eq!(knowledge::count(&pool).await.unwrap(), count_once);
    }
}

mod analytics_tests {
    use super::*;

    fn exchange<'a>(
        user_id: &'a str,
        message: &'a str,
        intent: Intent,
        obd_code: Option<&'a str>,
    ) -> ExchangeRecord<'a> {
        ExchangeRecord {
            user_id,
            user_message: message,
            ai_response: "une réponse suffisamment longue pour ne pas être une question ratée",
            response_time_ms: 120,
            content_type: "text",
            intent,
            obd_code,
        }
    }

    #[tokio::test]
    async fn test_record_feeds_daily_counters() {
        let pool = create_test_pool().await;

        analytics::record(&pool, exchange("u1", "P0420", Intent::Code, Some("P0420")))
            .await
            .unwrap();
        analytics::record(&pool, exchange("u2", "quand faire la vidange", Intent::Technical, None))
            .await
            .unwrap();
        analytics::record(&pool, exchange("u1", "réserver un garage", Intent::Domain, None))
            .await
            .unwrap();

        let days = analytics::daily_stats(&pool, 7).await.unwrap();
        assert_eq!(days.len(), 1);
        let today = &days[0];
        assert_eq!(today.total_messages, 3);
        assert_eq!(today.obd_queries, 1);
        assert_eq!(today.technical_queries, 1);
        assert_eq!(today.domain_queries, 1);
        let avg = today.avg_response_time_ms.expect("avg should be set");
        assert!((avg - 120.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_daily_counters_are_monotonic() {
        let pool = create_test_pool().await;

        let mut last_total = 0;
        for _ in 0..5 {
            analytics::record(&pool, exchange("u1", "bonjour", Intent::Greeting, None))
                .await
                .unwrap();
            let today = &analytics::daily_stats(&pool, 1).await.unwrap()[0];
            assert!(today.total_messages > last_total);
            last_total = today.total_messages;
        }
    }

    #[tokio::test]
    async fn test_question_counter_accumulates() {
        let pool = create_test_pool().await;

        for _ in 0..3 {
            analytics::record(
                &pool,
                exchange("u1", "Quand changer l'huile ?", Intent::Technical, None),
            )
            .await
            .unwrap();
        }

        let top = analytics::top_questions(&pool, 5).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].question_normalized, "quand changer lhuile");
        assert_eq!(top[0].count, 3);
    }

    #[tokio::test]
    async fn test_summary_aggregates() {
        let pool = create_test_pool().await;

        analytics::record(&pool, exchange("u1", "P0420", Intent::Code, Some("P0420")))
            .await
            .unwrap();
        analytics::record(&pool, exchange("u2", "P0420", Intent::Code, Some("P0420")))
            .await
            .unwrap();
        analytics::record(&pool, exchange("u2", "bonjour", Intent::Greeting, None))
            .await
            .unwrap();

        let summary = analytics::summary(&pool).await.unwrap();
        assert_eq!(summary.total_conversations, 3);
        assert_eq!(summary.unique_users, 2);
        assert_eq!(summary.today_conversations, 3);
        assert_eq!(summary.top_obd_codes, vec![("P0420".to_string(), 2)]);
        assert!(summary
            .intent_distribution
            .iter()
            .any(|(intent, count)| intent == "code" && *count == 2));
    }

    #[tokio::test]
    async fn test_struggling_questions_flags_short_and_apologetic() {
        let pool = create_test_pool().await;

        let mut short = exchange("u1", "question difficile", Intent::General, None);
        short.ai_response = "Hmm.";
        analytics::record(&pool, short).await.unwrap();

        let mut sorry = exchange("u1", "autre question piège", Intent::General, None);
        sorry.ai_response =
            "Je suis vraiment désolé, je n'ai aucune information fiable sur ce sujet précis.";
        analytics::record(&pool, sorry).await.unwrap();

        analytics::record(&pool, exchange("u1", "question normale", Intent::General, None))
            .await
            .unwrap();

        let struggling = analytics::struggling_questions(&pool).await.unwrap();
        assert!(struggling.contains(&"question difficile".to_string()));
        assert!(struggling.contains(&"autre question piège".to_string()));
        assert!(!struggling.contains(&"question normale".to_string()));
    }
}

mod cache_tests {
    use super::*;

    fn hit(snippet: &str) -> SearchHit {
        SearchHit {
            title: "titre".to_string(),
            snippet: snippet.to_string(),
            url: "https://example.org".to_string(),
            source: "Test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_get_returns_fresh_entry() {
        let pool = create_test_pool().await;

        cache::put(&pool, "Vidange Huile", &[hit("tous les 10 000 km")], 24)
            .await
            .unwrap();

        // The key is lowercased on both sides.
        let cached = cache::get(&pool, "vidange huile").await.unwrap().unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].snippet, "tous les 10 000 km");
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let pool = create_test_pool().await;

        // A non-positive TTL places the expiry in the past.
        cache::put(&pool, "prix clio", &[hit("environ 180 000 MAD")], -1)
            .await
            .unwrap();

        assert!(cache::get(&pool, "prix clio").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let pool = create_test_pool().await;

        cache::put(&pool, "q", &[hit("ancien")], 24).await.unwrap();
        cache::put(&pool, "q", &[hit("nouveau")], 24).await.unwrap();

        let cached = cache::get(&pool, "q").await.unwrap().unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].snippet, "nouveau");
    }

    #[tokio::test]
    async fn test_purge_removes_only_expired() {
        let pool = create_test_pool().await;

        cache::put(&pool, "fresh", &[hit("a")], 24).await.unwrap();
        cache::put(&pool, "stale", &[hit("b")], -1).await.unwrap();

        assert_eq!(cache::purge_expired(&pool).await.unwrap(), 1);
        assert!(cache::get(&pool, "fresh").await.unwrap().is_some());
        assert!(cache::get(&pool, "stale").await.unwrap().is_none());
    }
}
