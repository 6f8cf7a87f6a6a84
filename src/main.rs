use docdigest::{
    api,
    config::Config,
    entities::HttpEntityExtractor,
    extraction::HttpTextExtractor,
    logging,
    processing::{LengthBounds, PipelineService, PipelineSettings, TokenChunker},
    store::sqlite::{self, SqliteDocumentStore, SqliteSummaryStore},
    summarization::HttpSummarizationClient,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    let config = Config::load().expect("Failed to load config from environment");
    logging::init_tracing();

    let pool = sqlite::connect(&config.database_path)
        .await
        .expect("Failed to open document database");
    let documents = SqliteDocumentStore::new(pool.clone(), &config.documents_table);
    documents
        .init_schema()
        .await
        .expect("Failed to prepare documents table");
    let summaries = SqliteSummaryStore::new(pool, &config.summaries_table);
    summaries
        .init_schema()
        .await
        .expect("Failed to prepare summaries table");

    let chunker = TokenChunker::new(config.tokenizer_encoding.as_deref())
        .expect("Failed to initialize tokenizer");
    let service = PipelineService::new(
        Arc::new(documents),
        Arc::new(summaries),
        Box::new(HttpTextExtractor::new(
            config.text_extractor_url.clone(),
            config.adapter_timeout,
        )),
        Box::new(HttpSummarizationClient::new(
            config.summarizer_url.clone(),
            config.summarizer_timeout,
        )),
        Box::new(HttpEntityExtractor::new(
            config.entity_extractor_url.clone(),
            config.adapter_timeout,
        )),
        chunker,
        PipelineSettings {
            max_tokens: config.max_tokens,
            bounds: LengthBounds {
                min_length: config.summary_min_length,
                max_length: config.summary_max_length,
            },
        },
    );
    let app = api::create_router(Arc::new(service));

    let (listener, port) = bind_listener(config.server_port)
        .await
        .expect("Failed to bind listener");
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await.unwrap();
}

async fn bind_listener(port_override: Option<u16>) -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    if let Some(port) = port_override {
        return TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map(|listener| (listener, port));
    }

    const PORT_RANGE: std::ops::RangeInclusive<u16> = 8100..=8199;
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
        "No available port found in range 8100-8199",
    ))
}
