//! Ports - Interfaces for external collaborators.
//!
//! Following hexagonal architecture, ports define the contracts between the
//! core and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - the generative oracle
//! - `JourneyStore` - durable state, keyed records, append-only events
//! - `KnowledgeRetriever` - optional retrieval context for proposals

mod ai_provider;
mod journey_store;
mod knowledge_retriever;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message,
    MessageRole, ProviderInfo, RequestMetadata, TokenUsage,
};
pub use journey_store::{JourneyStore, JourneyStoreExt, StoreError};
pub use knowledge_retriever::{KnowledgeRetriever, RetrievalError, RetrievedContext};
