//! Knowledge base query tool.
//!
//! The ingestion/query collaborator is an ordinary tool: its internal
//! chunking, embedding, and vector search live behind the [`KnowledgeBase`]
//! trait. The in-memory implementation scores chunks by keyword overlap,
//! which is enough for tests and small corpora.

use async_trait::async_trait;
use emberclaw_core::error::ToolError;
use emberclaw_core::tool::{Tool, ToolOutput};
use serde::Serialize;
use std::sync::Arc;

/// A retrieved knowledge chunk.
#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeHit {
    /// Human-readable source label (filename, URL, etc.)
    pub source: String,
    /// The chunk text
    pub content: String,
    /// Relevance score (0.0-1.0)
    pub score: f32,
}

/// The knowledge collaborator interface.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    async fn query(&self, query: &str, top_k: usize) -> Vec<KnowledgeHit>;
}

/// Keyword-overlap knowledge base over in-memory documents.
#[derive(Default)]
pub struct InMemoryKnowledgeBase {
    documents: Vec<(String, String)>,
}

impl InMemoryKnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, source: impl Into<String>, content: impl Into<String>) -> Self {
        self.documents.push((source.into(), content.into()));
        self
    }
}

#[async_trait]
impl KnowledgeBase for InMemoryKnowledgeBase {
    async fn query(&self, query: &str, top_k: usize) -> Vec<KnowledgeHit> {
        let terms: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(String::from)
            .collect();
        if terms.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<KnowledgeHit> = self
            .documents
            .iter()
            .filter_map(|(source, content)| {
                let haystack = content.to_lowercase();
                let matched = terms.iter().filter(|t| haystack.contains(*t)).count();
                if matched == 0 {
                    return None;
                }
                Some(KnowledgeHit {
                    source: source.clone(),
                    content: content.clone(),
                    score: matched as f32 / terms.len() as f32,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        hits
    }
}

/// Tool wrapper exposing the knowledge base to the reasoning service.
pub struct KnowledgeQueryTool {
    knowledge: Arc<dyn KnowledgeBase>,
}

impl KnowledgeQueryTool {
    pub fn new(knowledge: Arc<dyn KnowledgeBase>) -> Self {
        Self { knowledge }
    }
}

#[async_trait]
impl Tool for KnowledgeQueryTool {
    fn name(&self) -> &str {
        "knowledge_query"
    }

    fn description(&self) -> &str {
        "Query the knowledge base for relevant information. Returns chunks sorted by relevance."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to find relevant knowledge"
                },
                "top_k": {
                    "type": "integer",
                    "description": "Maximum number of results to return (default 3)",
                    "default": 3
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<ToolOutput, ToolError> {
        let query = arguments
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        let top_k = arguments
            .get("top_k")
            .and_then(|v| v.as_u64())
            .unwrap_or(3)
            .min(10) as usize;

        let hits = self.knowledge.query(query, top_k).await;
        if hits.is_empty() {
            return Ok(ToolOutput::plain("No matching knowledge found."));
        }

        let output = serde_json::to_string_pretty(&hits).unwrap_or_default();
        Ok(ToolOutput::plain(output))
    }
}
