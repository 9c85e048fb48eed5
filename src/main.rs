use anyhow::Context;
use dorado::{config::Config, db, state::AppState};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();

    let pool = db::connect(&config.database_url)
        .await
        .context("failed to connect to db")?;
    db::init_schema(&pool)
        .await
        .context("failed to create entries table")?;

    let app = dorado::app(AppState { pool }, &config.public_dir);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(
        %addr,
        public_dir = %config.public_dir.display(),
        "Dorado Calendar server listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
