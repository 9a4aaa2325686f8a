use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use artrace_core::payment::{NullVerifier, NullVerifierMode, PaymentVerifier};
use artrace_server::access::AccessControl;
use artrace_server::mailer::Mailer;
use artrace_server::paystack::PaystackVerifier;
use artrace_server::state::AppState;
use artrace_store::AccountStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Structured JSON logging. Level controlled via RUST_LOG env var.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("artrace=info".parse()?),
        )
        .json()
        .init();

    let cfg = artrace_core::config::Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Ensure data directory exists before opening DuckDB.
    std::fs::create_dir_all(&cfg.data_dir)?;
    let db_path = format!("{}/artrace.db", cfg.data_dir);
    let db = artrace_duckdb::DuckDbBackend::open(&db_path, &cfg.duckdb_memory_limit)?;

    let store: Arc<dyn AccountStore> = Arc::new(db);
    let jwt_secret = store.ensure_jwt_secret().await?;
    info!("Session signing key ready");

    // Without a gateway key, checkouts fail loudly instead of hitting the
    // network with empty credentials. Trials still work.
    let verifier: Arc<dyn PaymentVerifier> = if cfg.paystack_secret_key.is_empty() {
        warn!("ARTRACE_PAYSTACK_SECRET_KEY not set; paid checkouts disabled");
        Arc::new(NullVerifier::with_mode(NullVerifierMode::Rejected, 0))
    } else {
        Arc::new(PaystackVerifier::new(&cfg)?)
    };

    let mailer = match &cfg.smtp {
        Some(smtp) => Some(Mailer::new(smtp)?),
        None => {
            warn!("SMTP not configured; verification codes will only be logged");
            None
        }
    };

    let access = AccessControl::new(Arc::clone(&store), verifier, &cfg);
    let state = Arc::new(AppState {
        store,
        config: Arc::new(cfg.clone()),
        access,
        mailer,
        jwt_secret,
    });

    let addr = format!("0.0.0.0:{}", cfg.port);
    let app = artrace_server::app::build_app(Arc::clone(&state));

    info!(port = cfg.port, "ArTrace listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
