use std::sync::Arc;

use mail_assist::config::AppConfig;
use mail_assist::error::Result;
use mail_assist::llm::create_provider;
use mail_assist::mailbox::{GmailMailbox, Mailbox};
use mail_assist::server::{AppState, build_router};
use mail_assist::summarizer::{LlmSummarizer, Summarizer};

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env()?;

    let llm = create_provider(&config.llm)?;
    let summarizer: Arc<dyn Summarizer> =
        Arc::new(LlmSummarizer::new(llm.clone(), config.retry.clone()));
    let mailbox: Arc<dyn Mailbox> = Arc::new(GmailMailbox::new(
        &config.google.gmail_api_base,
        config.retry.clone(),
    ));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    eprintln!("📬 Mail Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", llm.model_name());
    eprintln!("   API: http://{}", addr);
    eprintln!("   Frontend: {}", config.server.frontend_url);
    eprintln!(
        "   Retry: {} attempts, {:?}..{:?} backoff\n",
        config.retry.max_attempts, config.retry.base_delay, config.retry.max_delay
    );

    let app = build_router(AppState::new(config, mailbox, summarizer));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Mail Assist server started");
    axum::serve(listener, app).await?;

    Ok(())
}
