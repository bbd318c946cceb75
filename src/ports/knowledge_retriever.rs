//! Knowledge Retriever Port - optional domain context for proposals.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Summary text plus where it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedContext {
    pub summary: String,
    pub sources: Vec<String>,
}

impl RetrievedContext {
    pub fn is_empty(&self) -> bool {
        self.summary.trim().is_empty()
    }

    /// Block appended to the proposal prompt.
    pub fn as_prompt_block(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let mut block = format!("Relevant domain knowledge:\n\n{}", self.summary);
        if !self.sources.is_empty() {
            block.push_str(&format!("\n\nSources: {}", self.sources.join(", ")));
        }
        block
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("retrieval backend unavailable: {0}")]
    Unavailable(String),
}

/// Port for retrieval-augmented context.
#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    async fn retrieve(
        &self,
        query: &str,
        domain_filter: Option<&str>,
    ) -> Result<RetrievedContext, RetrievalError>;
}
