use tokio::net::TcpListener;
use tracing::info;

use shelfmark::{api, app_state::AppState, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    let addr = config.server_address();

    // Connect to Postgres and wire up services
    let app_state = AppState::from_config(config).await?;
    let app = api::router(app_state);

    info!("🚀 Shelfmark API starting on http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
