use aerodesk::index::{IndexHandle, QdrantIndex};
use aerodesk::metrics::SupportMetrics;
use aerodesk::pipeline::{CorpusIngestor, DEFAULT_CHUNK_SIZE, TesseractCli};
use aerodesk::provider::{ChatClient, EmbeddingClient, OllamaClient};
use aerodesk::support::{
    EmailSender, NullEmailSender, RelayEmailSender, StaticDepartmentDirectory, SupportService,
};
use aerodesk::{api, config, logging};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Retrieval-augmented customer support assistant.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Directory of support documents ingested at startup.
    #[arg(long)]
    corpus: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::init_config();
    logging::init_tracing();
    let args = Args::parse();
    let config = config::get_config();

    let metrics = Arc::new(SupportMetrics::new());
    let ollama = Arc::new(OllamaClient::new(
        config.ollama_url.clone(),
        config.embedding_model.clone(),
        config.chat_model.clone(),
        config.embedding_dimension,
    ));
    let embedder: Arc<dyn EmbeddingClient> = ollama.clone();
    let chat: Arc<dyn ChatClient> = ollama;

    let mailer: Arc<dyn EmailSender> = match &config.mail_relay_url {
        Some(url) => Arc::new(RelayEmailSender::new(
            url.clone(),
            config
                .support_from_email
                .clone()
                .unwrap_or_else(|| "support@airline.com".to_string()),
        )),
        None => {
            tracing::warn!("MAIL_RELAY_URL not set; escalation emails will be dropped");
            Arc::new(NullEmailSender)
        }
    };
    let directory = Arc::new(StaticDepartmentDirectory::with_defaults(
        config.fallback_support_email.clone(),
    ));

    let chunk_size = config.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE);
    let corpus_dir = args
        .corpus
        .or_else(|| config.corpus_dir.clone().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("corpus"));

    let ingestor = CorpusIngestor::new(
        embedder.clone(),
        Arc::new(TesseractCli::default()),
        chunk_size,
        metrics.clone(),
    );
    tracing::info!(corpus = %corpus_dir.display(), "Starting corpus ingestion");
    let index = match QdrantIndex::new(
        &config.qdrant_url,
        config.qdrant_collection_name.clone(),
        config.qdrant_api_key.clone(),
        config.embedding_dimension,
    ) {
        Ok(index) => ingestor.ingest(&corpus_dir, Arc::new(index)).await,
        Err(error) => {
            tracing::error!(error = %error, "Failed to initialize vector index");
            IndexHandle::Unavailable
        }
    };

    let service = Arc::new(SupportService::new(
        index, embedder, chat, mailer, directory, metrics, chunk_size,
    ));
    let app = api::create_router(service);

    let (listener, port) = bind_listener().await.context("Failed to bind listener")?;
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app)
        .await
        .context("HTTP server terminated")?;
    Ok(())
}

async fn bind_listener() -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    let config = config::get_config();
    if let Some(port) = config.server_port {
        return TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map(|listener| (listener, port));
    }

    const PORT_RANGE: std::ops::RangeInclusive<u16> = 8300..=8399;
    for port in PORT_RANGE {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                tracing::debug!(port, "Bound server port");
                return Ok((listener, port));
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use; trying next");
                continue;
            }
            Err(err) => return Err(err),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        "No available port found in range 8300-8399",
    ))
}
