use anyhow::Context;
use axum::{extract::Request, ServiceExt};
use coloby::{
    auth::start_token_cleanup,
    db::{create_pool, run_migrations},
    routes::create_app,
    state::{AppState, Config},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,coloby=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("Connecting to database...");
    let db = create_pool(&config.database_url)
        .await
        .context("could not connect to the database")?;

    tracing::info!("Running migrations...");
    run_migrations(&db).await?;

    tokio::fs::create_dir_all(&config.media_root)
        .await
        .with_context(|| format!("could not create media root {}", config.media_root))?;

    let addr = config.addr();
    let state = AppState::build(db, config)?;

    // Held for the lifetime of the server.
    let _scheduler = start_token_cleanup(state.auth_service.clone()).await?;

    let app = create_app(state);

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;

    Ok(())
}
