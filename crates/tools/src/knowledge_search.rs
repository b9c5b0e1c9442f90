//! Knowledge search capability over a pluggable retrieval backend.
//!
//! The backend trait keeps retrieval swappable; the bundled
//! [`InMemoryKnowledge`] does keyword scoring over seeded
//! driver-insurance snippets so the knowledge agent works end-to-end
//! without external infrastructure.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use baton_core::{
    Capability, CapabilityContext, CapabilityError, CapabilityOutcome, ParameterSpec, ParameterType,
};

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("knowledge backend unavailable: {0}")]
    Unavailable(String),

    #[error("knowledge query rejected: {0}")]
    BadQuery(String),
}

/// One retrieved chunk, ordered by descending score.
#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeSnippet {
    pub id: String,
    pub topic: String,
    pub content: String,
    pub score: f64,
}

/// Retrieval seam. Implementations rank snippets for a free-text query.
#[async_trait]
pub trait KnowledgeBackend: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<KnowledgeSnippet>, KnowledgeError>;
}

/// Keyword-overlap retrieval over a fixed snippet set.
pub struct InMemoryKnowledge {
    entries: Vec<(String, &'static [&'static str], String)>,
}

impl InMemoryKnowledge {
    pub fn new(entries: Vec<(String, &'static [&'static str], String)>) -> Self {
        Self { entries }
    }

    /// Backend seeded with driver-insurance product knowledge.
    pub fn seeded() -> Self {
        fn entry(
            topic: &str,
            keywords: &'static [&'static str],
            content: &str,
        ) -> (String, &'static [&'static str], String) {
            (topic.to_string(), keywords, content.to_string())
        }

        Self::new(vec![
            entry(
                "coverage-basics",
                &["coverage", "cover", "protect", "basics", "what"],
                "Driver insurance covers the driver personally, independent of the vehicle's own policy. It pays out for the driver's injury, legal liability, and defence costs even when driving someone else's car.",
            ),
            entry(
                "premium-factors",
                &["premium", "price", "cost", "monthly", "cheap", "expensive"],
                "Premiums are driven mainly by age, years of driving experience, annual mileage, and accident history. Drivers under 25 or with under 2 years of experience pay the highest rates.",
            ),
            entry(
                "legal-fees",
                &["legal", "fee", "lawyer", "defence", "court", "criminal"],
                "The legal expenses rider covers attorney fees and court costs after a traffic accident, including criminal defence for negligence charges. Typical limits run from 5 to 20 million per incident.",
            ),
            entry(
                "fines-rider",
                &["fine", "fines", "penalty", "violation", "ticket"],
                "The penalty rider reimburses administrative fines arising from covered traffic incidents, subject to an annual cap. Intentional violations are always excluded.",
            ),
            entry(
                "claims-process",
                &["claim", "claims", "accident", "report", "payout", "process"],
                "Claims are filed within 30 days of the incident with the police report and medical records. Straightforward claims pay out in 7 to 14 business days.",
            ),
            entry(
                "plan-tiers",
                &["plan", "tier", "minimal", "standard", "premium", "compare", "recommend"],
                "Three tiers are offered. Minimal covers legal liability only. Standard adds legal expenses and fines. Premium adds personal injury, lost income, and a no-claim discount that grows 5% per clean year.",
            ),
            entry(
                "commuter-discount",
                &["commute", "commuter", "discount", "short", "mileage", "work"],
                "Drivers commuting under 20 km one way qualify for the low-mileage discount of up to 15%. Mileage is self-declared and verified at claim time.",
            ),
        ])
    }

    fn score(&self, query: &str, keywords: &[&str]) -> f64 {
        let query = query.to_lowercase();
        let hits = keywords.iter().filter(|k| query.contains(**k)).count();
        hits as f64 / keywords.len() as f64
    }
}

impl Default for InMemoryKnowledge {
    fn default() -> Self {
        Self::seeded()
    }
}

#[async_trait]
impl KnowledgeBackend for InMemoryKnowledge {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<KnowledgeSnippet>, KnowledgeError> {
        if query.trim().is_empty() {
            return Err(KnowledgeError::BadQuery("empty query".into()));
        }

        let mut hits: Vec<KnowledgeSnippet> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(i, (topic, keywords, content))| {
                let score = self.score(query, keywords);
                (score > 0.0).then(|| KnowledgeSnippet {
                    id: format!("kb-{i:03}"),
                    topic: topic.clone(),
                    content: content.clone(),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
        hits.truncate(limit);
        Ok(hits)
    }
}

pub struct KnowledgeSearchCapability {
    backend: Arc<dyn KnowledgeBackend>,
}

impl KnowledgeSearchCapability {
    pub fn new(backend: Arc<dyn KnowledgeBackend>) -> Self {
        Self { backend }
    }
}

impl Default for KnowledgeSearchCapability {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryKnowledge::seeded()))
    }
}

#[async_trait]
impl Capability for KnowledgeSearchCapability {
    fn name(&self) -> &str {
        "knowledge_search"
    }

    fn description(&self) -> &str {
        "Search the driver-insurance knowledge base. Returns product and policy snippets ranked by relevance to the query."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::required(
                "query",
                "Free-text search query",
                ParameterType::String,
            ),
            ParameterSpec::optional(
                "limit",
                "Maximum number of snippets to return",
                ParameterType::Integer,
                serde_json::json!(3),
            ),
        ]
    }

    async fn invoke(
        &self,
        arguments: Value,
        cx: &mut CapabilityContext<'_>,
    ) -> Result<CapabilityOutcome, CapabilityError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| CapabilityError::ArgumentParse("missing 'query' argument".into()))?;
        let limit = arguments["limit"].as_u64().unwrap_or(3).clamp(1, 10) as usize;

        let snippets = self
            .backend
            .search(query, limit)
            .await
            .map_err(|e| CapabilityError::ExecutionFailed {
                name: self.name().to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(agent = cx.agent, query, hits = snippets.len(), "Knowledge search");

        if snippets.is_empty() {
            return Ok(CapabilityOutcome::Data(Value::String(
                "No relevant knowledge found for the query.".into(),
            )));
        }
        let value = serde_json::to_value(&snippets).map_err(|e| CapabilityError::ExecutionFailed {
            name: self.name().to_string(),
            reason: e.to_string(),
        })?;
        Ok(CapabilityOutcome::Data(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baton_core::CustomerProfile;
    use serde_json::json;

    #[tokio::test]
    async fn seeded_backend_ranks_by_keyword_overlap() {
        let backend = InMemoryKnowledge::seeded();
        let hits = backend
            .search("how much is the monthly premium, is it expensive", 3)
            .await
            .unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].topic, "premium-factors");
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let backend = InMemoryKnowledge::seeded();
        let err = backend.search("   ", 3).await;
        assert!(matches!(err, Err(KnowledgeError::BadQuery(_))));
    }

    #[tokio::test]
    async fn capability_respects_limit() {
        let capability = KnowledgeSearchCapability::default();
        let mut profile = CustomerProfile::default();
        let mut cx = CapabilityContext {
            agent: "knowledge",
            profile: &mut profile,
        };

        let outcome = capability
            .invoke(json!({"query": "coverage premium claim plan", "limit": 2}), &mut cx)
            .await
            .unwrap();
        let CapabilityOutcome::Data(data) = outcome else {
            panic!("expected data");
        };
        assert!(data.as_array().unwrap().len() <= 2);
    }

    #[tokio::test]
    async fn missing_query_argument_is_a_parse_error() {
        let capability = KnowledgeSearchCapability::default();
        let mut profile = CustomerProfile::default();
        let mut cx = CapabilityContext {
            agent: "knowledge",
            profile: &mut profile,
        };

        let err = capability.invoke(json!({"limit": 2}), &mut cx).await;
        assert!(matches!(err, Err(CapabilityError::ArgumentParse(_))));
    }

    #[tokio::test]
    async fn unmatched_query_returns_friendly_text() {
        let capability = KnowledgeSearchCapability::default();
        let mut profile = CustomerProfile::default();
        let mut cx = CapabilityContext {
            agent: "knowledge",
            profile: &mut profile,
        };

        let outcome = capability
            .invoke(json!({"query": "zzzz qqqq"}), &mut cx)
            .await
            .unwrap();
        assert!(outcome.to_tool_content().contains("No relevant knowledge"));
    }
}
