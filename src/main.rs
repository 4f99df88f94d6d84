use std::env;

use anyhow::Context;
use tokio::net::TcpListener;

use stocklens_backend::server::router::router;
use stocklens_backend::{logging, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let state = AppState::initialize().context("Failed to initialize application state")?;
    logging::init(&state.config.log_dir);

    if !state.config.has_credential() {
        tracing::warn!("no model credential configured; analyze/ask will be rejected");
    }

    let port = env::var("PORT")
        .ok()
        .and_then(|val| val.parse::<u16>().ok())
        .unwrap_or(0);
    let bind_addr = format!("127.0.0.1:{}", port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    println!("STOCKLENS_PORT={}", addr.port());
    tracing::info!("Listening on {}", addr);

    let app = router(state);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
