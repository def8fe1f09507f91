use std::sync::Arc;

use axum::{Router, routing::get_service};
use minijinja::{Environment, path_loader};
use sea_orm::DatabaseConnection;
use tokio::signal;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    auth::{router as auth_router, token::TokenSigner},
    config::Config,
    mail::{EmailRenderer, Mailer, Notifier},
    routes,
    util::asset_loader::AssetLoader,
};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub tokens: TokenSigner,
    pub notifier: Arc<Notifier>,
    pub templates: Arc<Environment<'static>>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        let templates = Arc::new(setup_templates(&config.template_dir, &config.static_dir));
        let renderer = EmailRenderer::new(
            templates.clone(),
            config.event.clone(),
            config.site_url.clone(),
        );
        let notifier = Notifier::new(
            mailer,
            renderer,
            config.mail_from.clone(),
            config.internal_notification_email.clone(),
        );

        Self {
            db,
            tokens: TokenSigner::new(&config.jwt_secret),
            notifier: Arc::new(notifier),
            templates,
            config: Arc::new(config),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .merge(auth_router::router())
        .merge(routes::public::router())
        .merge(routes::admin::router())
        .merge(routes::email::router())
        .merge(routes::pages::router())
        .with_state(state)
        .nest_service("/static", get_service(ServeDir::new(static_dir)))
        .layer(TraceLayer::new_for_http())
}

pub fn setup_templates(template_dir: &str, static_dir: &str) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_loader(path_loader(template_dir));
    AssetLoader::new(static_dir).register(&mut env);
    env
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
