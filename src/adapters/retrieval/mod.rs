//! Retrieval adapters for proposal context.

mod in_memory_knowledge_base;

pub use in_memory_knowledge_base::{InMemoryKnowledgeBase, KnowledgeDocument};
