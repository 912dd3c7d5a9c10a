mod config;

mod app;
mod db;
mod errors;
mod notes;
mod openapi;
mod response;
mod shared;
mod state;

use std::net::SocketAddr;

use app::AppParams;
use config::Config;
pub use db::{close_db, init_db, DB};
pub use errors::{Error, Result};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> errors::Result<()> {
    let config = Config::from_env()?;

    shared::tracing::setup_tracing(config.log_json);

    let conn = init_db(&config).await?;
    let addr = format!("{}:{}", config.host, config.port);

    let (app, _api) = app::create(AppParams {
        db: conn.clone(),
        config,
        router: notes::router,
    })
    .await?;

    let app = shared::tracing::add_tracing_layer(app);

    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_db(conn).await?;
    tracing::info!("shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl-C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
