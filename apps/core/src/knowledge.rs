//! Learned-answer store.
//!
//! Successful responses are promoted into `learned_qa`, keyed by the
//! normalized question, and reinforced on reuse: the usage counter grows,
//! the average rating is folded in incrementally, and the stored answer is
//! replaced only when a strictly better-rated one arrives. All mutation
//! goes through a single `ON CONFLICT` upsert so concurrent reinforcement
//! of the same pattern cannot lose updates.

use crate::brain::normalize_question;
use crate::database::now_ts;
use crate::error::AppError;
use crate::models::LearnedAnswer;
use sqlx::sqlite::SqlitePool;

/// Rating given to answers learned implicitly from the pipeline.
pub const DEFAULT_RATING: f64 = 5.0;

/// An answer is only trusted once used this many times...
pub const MIN_TIMES_USED: i64 = 3;
/// ...with at least this average rating.
pub const MIN_AVG_RATING: f64 = 4.0;

/// Whether a stored answer is good enough to serve directly.
pub fn passes_quality_gate(answer: &LearnedAnswer) -> bool {
    answer.times_used >= MIN_TIMES_USED && answer.avg_rating >= MIN_AVG_RATING
}

/// Store or reinforce a question/answer pair.
pub async fn reinforce(
    pool: &SqlitePool,
    question: &str,
    answer: &str,
    category: &str,
    rating: f64,
) -> Result<(), AppError> {
    let pattern = normalize_question(question);
    if pattern.is_empty() {
        return Ok(());
    }
    let now = now_ts();

    sqlx::query(
        r#"
        INSERT INTO learned_qa (question_pattern, best_answer, category, times_used, avg_rating, created_at, updated_at)
        VALUES (?, ?, ?, 1, ?, ?, ?)
        ON CONFLICT(question_pattern) DO UPDATE SET
            best_answer = CASE WHEN excluded.avg_rating > avg_rating THEN excluded.best_answer ELSE best_answer END,
            avg_rating = (avg_rating * times_used + excluded.avg_rating) / (times_used + 1),
            times_used = times_used + 1,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&pattern)
    .bind(answer)
    .bind(category)
    .bind(rating)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Find the best stored answer whose pattern shares a word with the question.
///
/// Candidates are ranked by usage, then rating. The caller decides whether
/// the result is trustworthy via [`passes_quality_gate`].
pub async fn lookup(pool: &SqlitePool, question: &str) -> Result<Option<LearnedAnswer>, AppError> {
    let pattern = normalize_question(question);
    let words: Vec<&str> = pattern.split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }

    let clauses = vec!["question_pattern LIKE ?"; words.len()].join(" OR ");
    let sql = format!(
        "SELECT question_pattern, best_answer, category, times_used, avg_rating, created_at, updated_at \
         FROM learned_qa WHERE {clauses} \
         ORDER BY times_used DESC, avg_rating DESC LIMIT 1"
    );

    let mut query = sqlx::query_as::<_, LearnedAnswer>(&sql);
    for word in &words {
        query = query.bind(format!("%{}%", word));
    }

    Ok(query.fetch_optional(pool).await?)
}

/// Number of learned patterns.
pub async fn count(pool: &SqlitePool) -> Result<i64, AppError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM learned_qa")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Pre-populate the store with the baseline Q&A patterns. Existing rows win.
pub async fn seed(pool: &SqlitePool) -> Result<(), AppError> {
    const SEED_QA: &[(&str, &str, &str)] = &[
        ("c'est quoi kounhany", "KOUNHANY est une application marocaine d'après-vente automobile offrant des forfaits réparation avec garages audités, vente de pièces certifiées, et assistance routière 24/7.", "domain"),
        ("comment réserver réparation", "Pour réserver : 1) Identifiez votre véhicule par VIN ou manuellement, 2) Choisissez le service, 3) Comparez les garages, 4) Prenez rendez-vous, 5) Payez l'acompte (30% ou 100%).", "domain"),
        ("quels services kounhany", "KOUNHANY propose 3 services: 1) Forfaits Réparation pour particuliers, 2) Vente de pièces pour garagistes, 3) Dépannage et assistance routière 24/7.", "domain"),
        ("voyant moteur allumé", "Le voyant moteur peut indiquer plusieurs problèmes. Un diagnostic OBD est recommandé pour identifier le code d'erreur exact. Avec KOUNHANY, trouvez un garage audité pour un diagnostic précis.", "technical"),
        ("quand changer huile", "En général, changez l'huile tous les 10 000 à 15 000 km ou une fois par an. Consultez le manuel de votre véhicule pour les recommandations spécifiques.", "technical"),
        ("pression pneus recommandée", "La pression recommandée se trouve sur l'étiquette dans la portière conducteur ou dans le manuel. En général: 2.0 à 2.5 bar pour les voitures standard.", "technical"),
        ("batterie faible symptomes", "Symptômes d'une batterie faible: démarrage lent, voyant batterie allumé, phares faibles, équipements électriques défaillants. Faites tester votre batterie.", "technical"),
        ("entretien vidange", "La vidange comprend: remplacement huile moteur, filtre à huile, vérification des niveaux. Recommandé tous les 10 000-15 000 km selon le véhicule.", "technical"),
    ];

    let now = now_ts();
    for (pattern, answer, category) in SEED_QA {
        sqlx::query(
            "INSERT OR IGNORE INTO learned_qa (question_pattern, best_answer, category, times_used, avg_rating, created_at, updated_at) \
             VALUES (?, ?, ?, 1, 5.0, ?, ?)",
        )
        .bind(pattern)
        .bind(answer)
        .bind(category)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
    }

    Ok(())
}
