use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod error;
mod mailer;
mod routes;
mod services;
mod state;
mod storage;
mod tenant;

#[cfg(test)]
mod test_support;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hiring_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::load()?;
    tracing::info!("Starting hiring server on {}:{}", config.server.host, config.server.port);

    // Initialize database
    let db = db::Database::new(&config.database.path).await?;
    db.run_migrations().await?;

    if let Some(bootstrap) = &config.bootstrap {
        let token = services::companies::bootstrap(&db, bootstrap, &config.auth)
            .await
            .map_err(|e| anyhow::anyhow!("bootstrap failed: {}", e))?;
        tracing::info!("Admin token for {}: {}", bootstrap.company_slug, token);
    }

    if !config.smtp.enabled {
        tracing::warn!("SMTP disabled, candidate emails will be recorded as failed");
    }

    // Create app state
    let state = AppState::new(db, config.clone());

    // Build router
    let app = routes::create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
