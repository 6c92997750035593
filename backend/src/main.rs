use std::{error::Error, net::SocketAddr, sync::Arc};

use taskflow_server::{
    app_state::AppState,
    data_access::data_context::DataContext,
    map_routes,
    services::{auth_service::AuthService, file_storage::FileStorage, payment_gateway},
    settings::Settings,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

#[cfg(not(feature = "profile-console"))]
fn init_tracing(settings: &Settings) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(feature = "profile-console")]
fn init_tracing(_: &Settings) {
    console_subscriber::init();
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM; waiting for Ctrl-C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // ── Settings & logging ─────────────────────────────────────
    let settings = Settings::load()?;
    init_tracing(&settings);

    // ── Storage ────────────────────────────────────────────────
    let data_context = DataContext::new(&settings.database_path)?;
    AuthService::new(&data_context, &settings).ensure_default_admin()?;

    let file_storage = FileStorage::new(&settings.upload_dir);
    file_storage.ensure_root().await?;

    // ── Shared state ───────────────────────────────────────────
    let state = Arc::new(AppState {
        data_context,
        file_storage,
        payment_gateway: payment_gateway::from_settings(&settings),
        settings,
    });

    // ── Router ─────────────────────────────────────────────────
    let app = map_routes(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // ── Start ──────────────────────────────────────────────────
    let addr: SocketAddr = format!(
        "{}:{}",
        state.settings.tcp_socket_binding, state.settings.tcp_socket_port
    )
    .parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}
