// Komunitin Mock Services - Web Server
// Seeded accounting and social JSON:API routes

use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use komunitin::api::{self, AppState};
use komunitin::i18n::{EmbeddedLoader, LocaleContext};
use komunitin::{fixtures, logging, AppConfig, ErrorDispatcher, PanicReporter, SqlitePreferences, TracingNotifier};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    config.validate().context("validating configuration")?;
    logging::init(&config.log);

    info!(environment = %config.environment, version = komunitin::VERSION, "starting mock server");

    // 1. Locale
    let prefs = SqlitePreferences::open(&config.locale.preferences_path).with_context(|| {
        format!(
            "opening preferences at {}",
            config.locale.preferences_path.display()
        )
    })?;
    let env_locale = config.locale.environment_locale();
    let locale = LocaleContext::boot(Arc::new(EmbeddedLoader), Arc::new(prefs), env_locale.as_deref())
        .await
        .context("loading locale")?;
    info!(locale = %locale.code(), "locale ready");

    // 2. Error reporting
    let dispatcher = Arc::new(ErrorDispatcher::new(
        Arc::new(locale),
        Arc::new(TracingNotifier),
        config.is_development(),
    ));
    let (sink, subscription) = dispatcher.subscribe();
    let _panics = PanicReporter::install(sink);

    // 3. Fixtures
    let store = fixtures::seed(&config.seed, Utc::now());
    info!(summary = ?store.summary(), "fixtures seeded");

    // 4. Routes
    let addr = config.server.socket_addr()?;
    let state = AppState {
        store: Arc::new(store),
        dispatcher,
        config: Arc::new(config),
    };
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("🚀 listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving requests")?;

    subscription.unsubscribe().await;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}
