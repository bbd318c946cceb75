use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use sapiens::adapters::ai::{OpenAIConfig, OpenAIProvider};
use sapiens::adapters::http::{chat_router, ChatAppState};
use sapiens::adapters::postgres::PostgresJourneyStore;
use sapiens::adapters::retrieval::InMemoryKnowledgeBase;
use sapiens::adapters::storage::InMemoryJourneyStore;
use sapiens::application::{JourneyQueries, Oracle, Orchestrator};
use sapiens::config::{AppConfig, DatabaseConfig};
use sapiens::ports::JourneyStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let store = journey_store(config.database.as_ref()).await?;

    let openai = OpenAIConfig::new(config.ai.openai_api_key.clone().unwrap_or_default())
        .with_model(&config.ai.model)
        .with_base_url(&config.ai.base_url)
        .with_timeout(config.ai.timeout())
        .with_max_retries(config.ai.max_retries)
        .with_default_temperature(config.ai.temperature);
    let provider = OpenAIProvider::new(openai)?;
    let oracle = Oracle::new(Arc::new(provider)).with_max_tokens(config.ai.max_tokens);

    let mut orchestrator =
        Orchestrator::new(oracle, store.clone()).with_skip_token(&config.journey.skip_token);
    if config.journey.retrieval_enabled {
        let knowledge = InMemoryKnowledgeBase::seeded().with_top_k(config.journey.retrieval_top_k);
        tracing::info!(documents = knowledge.len(), "Proposal retrieval enabled");
        orchestrator = orchestrator.with_retriever(Arc::new(knowledge));
    }

    let state = ChatAppState::new(Arc::new(orchestrator), JourneyQueries::new(store));
    let app = chat_router(
        state,
        config.server.request_timeout(),
        &config.server.cors_origins_list(),
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        model = %config.ai.model,
        "Sapiens listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}

/// `RUST_LOG` wins over the configured level; production logs are JSON.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if config.is_production() {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn journey_store(
    database: Option<&DatabaseConfig>,
) -> Result<Arc<dyn JourneyStore>, Box<dyn std::error::Error>> {
    let Some(database) = database else {
        tracing::warn!("No database configured; journeys are kept in memory");
        return Ok(Arc::new(InMemoryJourneyStore::new()));
    };

    let pool = PgPoolOptions::new()
        .min_connections(database.min_connections)
        .max_connections(database.max_connections)
        .acquire_timeout(database.acquire_timeout())
        .connect(&database.url)
        .await?;
    if database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }
    tracing::info!(url = %database.redacted_url(), "Connected to PostgreSQL");
    Ok(Arc::new(PostgresJourneyStore::new(pool)))
}
