//! In-memory knowledge base ranked by keyword overlap.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::ports::{KnowledgeRetriever, RetrievalError, RetrievedContext};

const DEFAULT_TOP_K: usize = 3;
const MIN_TOKEN_LEN: usize = 3;

/// One seeded document.
#[derive(Debug, Clone)]
pub struct KnowledgeDocument {
    pub source: String,
    /// Lowercased domain tag, `None` for documents that apply everywhere.
    pub domain: Option<String>,
    pub content: String,
}

impl KnowledgeDocument {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            domain: None,
            content: content.into(),
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into().to_lowercase());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryKnowledgeBase {
    documents: Vec<KnowledgeDocument>,
    top_k: usize,
}

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= MIN_TOKEN_LEN)
        .map(str::to_lowercase)
        .collect()
}

impl InMemoryKnowledgeBase {
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
            top_k: DEFAULT_TOP_K,
        }
    }

    /// A small built-in corpus of portfolio-project guidance.
    pub fn seeded() -> Self {
        Self::new()
            .with_document(KnowledgeDocument::new(
                "portfolio-projects",
                "Strong portfolio projects solve a concrete problem for a named audience, \
                 ship a tangible deliverable, and report measurable outcomes.",
            ))
            .with_document(KnowledgeDocument::new(
                "recruiter-signals",
                "Recruiters look for ownership, scoped problem statements, and evidence \
                 such as metrics, links, or artifacts they can open in minutes.",
            ))
            .with_document(
                KnowledgeDocument::new(
                    "product-management",
                    "Product manager projects: user research synthesis, prioritized roadmap, \
                     PRD with success metrics, and a launch or experiment plan.",
                )
                .with_domain("product"),
            )
            .with_document(
                KnowledgeDocument::new(
                    "data-analytics",
                    "Data analyst projects: cleaned public dataset, exploratory analysis, \
                     dashboard, and a written recommendation backed by the numbers.",
                )
                .with_domain("data"),
            )
            .with_document(
                KnowledgeDocument::new(
                    "fintech-primer",
                    "FinTech best practices: compliance constraints, trust and security, \
                     onboarding friction, and unit economics of payments or lending.",
                )
                .with_domain("fintech"),
            )
    }

    pub fn with_document(mut self, document: KnowledgeDocument) -> Self {
        self.documents.push(document);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn rank(&self, query: &str, domain_filter: Option<&str>) -> Vec<&KnowledgeDocument> {
        let query_tokens = tokens(query);
        let filter = domain_filter.map(str::to_lowercase);

        let mut scored: Vec<(usize, usize, &KnowledgeDocument)> = self
            .documents
            .iter()
            .enumerate()
            .filter(|(_, doc)| match (&filter, &doc.domain) {
                (Some(f), Some(d)) => f.contains(d.as_str()) || d.contains(f.as_str()),
                _ => true,
            })
            .map(|(i, doc)| {
                let overlap = tokens(&doc.content)
                    .into_iter()
                    .chain(doc.domain.iter().cloned())
                    .filter(|t| query_tokens.contains(t))
                    .count();
                (overlap, i, doc)
            })
            .filter(|(overlap, _, _)| *overlap > 0)
            .collect();

        // Highest overlap first, insertion order breaks ties.
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        scored
            .into_iter()
            .take(self.top_k)
            .map(|(_, _, doc)| doc)
            .collect()
    }
}

#[async_trait]
impl KnowledgeRetriever for InMemoryKnowledgeBase {
    async fn retrieve(
        &self,
        query: &str,
        domain_filter: Option<&str>,
    ) -> Result<RetrievedContext, RetrievalError> {
        let hits = self.rank(query, domain_filter);
        Ok(RetrievedContext {
            summary: hits
                .iter()
                .map(|d| d.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n"),
            sources: hits.iter().map(|d| d.source.clone()).collect(),
        })
    }
}
