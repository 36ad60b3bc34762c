use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;

use ragline::application::ports::VectorStore;
use ragline::application::services::{AnswerWorkflow, DocumentChunker, RagService};
use ragline::infrastructure::llm::{OllamaClient, OllamaEmbedder};
use ragline::infrastructure::observability::init_tracing;
use ragline::infrastructure::persistence::{LocalVectorStore, QdrantAdapter};
use ragline::infrastructure::text_processing::{CompositeFileLoader, TextSplitterFactory};
use ragline::presentation::config::VectorStoreProvider;
use ragline::presentation::{AppState, Environment, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment).context("Failed to load settings")?;

    init_tracing(&settings.logging, environment)?;

    let timeout = Duration::from_secs(settings.ollama.request_timeout_secs);
    let embedder = Arc::new(OllamaEmbedder::new(
        &settings.ollama.base_url,
        settings.ollama.embedding_model.clone(),
        timeout,
    )?);
    let llm_client = Arc::new(OllamaClient::new(
        &settings.ollama.base_url,
        settings.ollama.chat_model.clone(),
        settings.ollama.keep_alive.clone(),
        timeout,
    )?);

    let vector_store: Arc<dyn VectorStore> = match settings.vector_store.provider {
        VectorStoreProvider::Local => Arc::new(
            LocalVectorStore::open(&settings.vector_store.path)
                .await
                .context("Failed to open local vector store")?,
        ),
        VectorStoreProvider::Qdrant => Arc::new(
            QdrantAdapter::new(&settings.vector_store.qdrant_url)
                .context("Failed to connect to Qdrant")?,
        ),
    };

    let chunker = DocumentChunker::new(
        Arc::new(CompositeFileLoader::with_defaults()),
        TextSplitterFactory::create(&settings.chunking)?,
    );

    let rag_service = Arc::new(
        RagService::new(
            chunker,
            embedder,
            vector_store,
            llm_client,
            settings.vector_store.collection_name.clone(),
        )
        .with_defaults(settings.generation.top_k, settings.generation.options()),
    );
    let workflow = Arc::new(AnswerWorkflow::new(
        Arc::clone(&rag_service),
        settings.workflow.policy(),
    ));

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    tracing::info!(
        provider = ?settings.vector_store.provider,
        collection = %settings.vector_store.collection_name,
        chat_model = %settings.ollama.chat_model,
        "Services wired"
    );

    let state = AppState {
        rag_service,
        workflow,
        settings: Arc::new(settings),
    };
    let router = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
