use std::sync::Arc;

use rsvp_desk::{
    config::Config,
    database::setup_database,
    mail::{LogMailer, Mailer, resend::ResendMailer},
    router::{AppState, create_router, shutdown_signal},
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let db = setup_database(&config.database_url).await?;

    let mailer: Arc<dyn Mailer> = match &config.resend_api_key {
        Some(key) => Arc::new(ResendMailer::new(key.clone())),
        None => {
            warn!("RESEND_API_KEY not set, emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(db, config, mailer));

    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
