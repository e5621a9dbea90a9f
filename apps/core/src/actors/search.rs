use crate::actors::messages::{ActorError, AppError, SearchMessage};
use crate::actors::traits::SearchActor;
use crate::brain::keywords::{NEWS_BRANDS, NEWS_KEYWORDS, RECALL_BRANDS};
use crate::cache;
use crate::models::SearchHit;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use sqlx::sqlite::SqlitePool;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{info, warn};
use url::Url;

/// Public instant-answer endpoint used when no override is configured.
pub const DEFAULT_ENDPOINT: &str = "https://api.duckduckgo.com";

pub const PRICE_DISCLAIMER: &str =
    "Les prix sont indicatifs. Contactez un concessionnaire pour le prix exact.";

const NO_RESULTS_MESSAGE: &str = "Je n'ai pas trouvé d'informations pertinentes sur internet.";

/// Hard cap on a formatted result block, in characters.
const FORMAT_MAX_CHARS: usize = 500;

// --- Search-intent detection -------------------------------------------------

/// A detected reason to hit the web, with its query ingredients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchIntent {
    Price { brand: String, model: String },
    Recall { brand: String },
    General { query: String },
}

static PRICE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"prix\s+(?:de\s+)?(?:la\s+)?(\w+)\s+(\w+)",
        r"combien\s+(?:coûte|coute)\s+(?:une?\s+)?(\w+)\s+(\w+)",
        r"(\w+)\s+(\w+)\s+(?:prix|coût|cout)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid price pattern"))
    .collect()
});

const RECALL_TRIGGERS: &[&str] = &["rappel", "recall", "défaut", "problème connu"];

const GENERAL_TRIGGERS: &[&str] = &[
    "c'est quoi",
    "qu'est-ce que",
    "comment fonctionne",
    "différence entre",
    "avantages",
    "inconvénients",
    "meilleur",
    "comparaison",
    "avis sur",
];

/// Detect whether a message calls for a web search.
///
/// Detectors run in a fixed order (price, then recall, then general) and
/// the first hit wins.
pub fn detect_search_intent(message: &str) -> Option<SearchIntent> {
    let lower = message.to_lowercase();

    for pattern in PRICE_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(&lower) {
            return Some(SearchIntent::Price {
                brand: caps[1].to_string(),
                model: caps[2].to_string(),
            });
        }
    }

    if RECALL_TRIGGERS.iter().any(|t| lower.contains(t)) {
        for brand in RECALL_BRANDS {
            if lower.contains(brand) {
                return Some(SearchIntent::Recall {
                    brand: (*brand).to_string(),
                });
            }
        }
    }

    if GENERAL_TRIGGERS.iter().any(|t| lower.contains(t)) {
        return Some(SearchIntent::General {
            query: message.to_string(),
        });
    }

    None
}

/// Detect a "recent news about a brand" request. Returns the brand.
pub fn detect_news_brand(message: &str) -> Option<&'static str> {
    let lower = message.to_lowercase();
    if !NEWS_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return None;
    }
    NEWS_BRANDS.iter().find(|brand| lower.contains(*brand)).copied()
}

/// Build the actual query string for a detected intent.
pub fn build_query(intent: &SearchIntent) -> String {
    match intent {
        SearchIntent::Price { brand, model } => format!("prix {} {} Maroc", brand, model),
        SearchIntent::Recall { brand } => format!("rappel {} sécurité", brand),
        SearchIntent::General { query } => format!("{} voiture automobile", query),
    }
}

/// Format up to three results into a French block, capped in length.
pub fn format_results(results: &[SearchHit]) -> String {
    if results.is_empty() {
        return NO_RESULTS_MESSAGE.to_string();
    }

    let mut parts = vec!["🔍 **Voici ce que j'ai trouvé:**\n".to_string()];

    for (i, hit) in results.iter().take(3).enumerate() {
        let snippet = truncate_chars(&hit.snippet, 200);
        if snippet.is_empty() {
            continue;
        }
        parts.push(format!("**{}.** {}", i + 1, snippet));
        if !hit.source.is_empty() {
            parts.push(format!("   _(Source: {})_\n", hit.source));
        }
    }

    parts.push("\n⚠️ *Ces informations proviennent d'internet et peuvent ne pas être à jour.*".to_string());

    truncate_chars(&parts.join("\n"), FORMAT_MAX_CHARS)
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    text.chars().take(max).collect()
}

// --- Actor ------------------------------------------------------------------

/// A handle to the search actor, which answers queries from the TTL cache
/// and falls back to the instant-answer API on a miss.
#[derive(Clone)]
pub struct SearchActorHandle {
    sender: mpsc::Sender<SearchMessage>,
    request_timeout: Duration,
}

impl SearchActorHandle {
    pub fn new(
        pool: SqlitePool,
        endpoint: String,
        ttl_hours: i64,
        request_timeout: Duration,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(32);
        let actor = SearchActorRunner::new(receiver, pool, endpoint, ttl_hours, request_timeout);
        tokio::spawn(async move { actor.run().await });
        Self {
            sender,
            request_timeout,
        }
    }
}

#[async_trait]
impl SearchActor for SearchActorHandle {
    async fn search(&self, query: String, limit: usize) -> Result<Vec<SearchHit>, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = SearchMessage::Search {
            query,
            limit,
            responder: send,
        };

        self.sender
            .send(msg)
            .await
            .map_err(|_| AppError::Actor(ActorError::Internal("Search actor closed".to_string())))?;
        timeout(self.request_timeout + Duration::from_secs(5), recv)
            .await?
            .map_err(|_| AppError::Actor(ActorError::Internal("Search actor failed to respond".to_string())))?
    }
}

// --- Actor Runner (Internal Logic) ---
struct SearchActorRunner {
    receiver: mpsc::Receiver<SearchMessage>,
    pool: SqlitePool,
    endpoint: String,
    ttl_hours: i64,
    client: Client,
    request_timeout: Duration,
}

impl SearchActorRunner {
    fn new(
        receiver: mpsc::Receiver<SearchMessage>,
        pool: SqlitePool,
        endpoint: String,
        ttl_hours: i64,
        request_timeout: Duration,
    ) -> Self {
        Self {
            receiver,
            pool,
            endpoint,
            ttl_hours,
            client: Client::new(),
            request_timeout,
        }
    }

    async fn run(mut self) {
        info!("SearchActor started, endpoint {}", self.endpoint);

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                SearchMessage::Search {
                    query,
                    limit,
                    responder,
                } => {
                    let result = self.search(&query, limit).await;
                    let _ = responder.send(result);
                }
            }
        }

        info!("SearchActor stopped");
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, AppError> {
        match cache::get(&self.pool, query).await {
            Ok(Some(mut hits)) => {
                hits.truncate(limit);
                return Ok(hits);
            }
            Ok(None) => {}
            Err(e) => warn!("Search cache read failed for {:?}: {}", query, e),
        }

        let hits = self.fetch(query, limit).await?;

        if !hits.is_empty() {
            if let Err(e) = cache::put(&self.pool, query, &hits, self.ttl_hours).await {
                warn!("Search cache write failed for {:?}: {}", query, e);
            }
        }

        Ok(hits)
    }

    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, AppError> {
        let url = Url::parse_with_params(
            &format!("{}/", self.endpoint),
            &[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ],
        )
        .map_err(|e| AppError::Internal(format!("Bad search endpoint: {}", e)))?;

        let res = timeout(self.request_timeout, self.client.get(url).send()).await??;
        let status = res.status();

        if !status.is_success() {
            return Err(AppError::Actor(ActorError::Search(format!(
                "Search request failed with status {}",
                status
            ))));
        }

        let data: serde_json::Value = res.json().await.map_err(AppError::from)?;
        let mut hits = Vec::new();

        // Main abstract, when the engine has one.
        if let Some(abstract_text) = data["Abstract"].as_str().filter(|s| !s.is_empty()) {
            hits.push(SearchHit {
                title: data["Heading"].as_str().unwrap_or("Résultat").to_string(),
                snippet: abstract_text.to_string(),
                url: data["AbstractURL"].as_str().unwrap_or("").to_string(),
                source: data["AbstractSource"].as_str().unwrap_or("DuckDuckGo").to_string(),
            });
        }

        // Related topics.
        if let Some(topics) = data["RelatedTopics"].as_array() {
            for topic in topics.iter().take(limit) {
                if let Some(text) = topic["Text"].as_str().filter(|s| !s.is_empty()) {
                    hits.push(SearchHit {
                        title: truncate_chars(text, 100),
                        snippet: text.to_string(),
                        url: topic["FirstURL"].as_str().unwrap_or("").to_string(),
                        source: "DuckDuckGo".to_string(),
                    });
                }
            }
        }

        hits.truncate(limit);
        Ok(hits)
    }
}
