mod app_state;
mod config;
mod domain;
mod repositories;
mod router;
mod routes;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::from_filename("./planora-api/.env.local").ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let settings = config::read_config().expect("Failed to read configuration");

    let connection_pool = PgPoolOptions::new().connect_lazy_with(settings.database.with_db());
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to run database migrations");

    let address = format!(
        "{}:{}",
        settings.application.host, settings.application.port
    );
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .expect("Failed to bind server address");
    tracing::info!("listening on {}", address);

    let app = router::create(connection_pool, settings);
    axum::serve(listener, app)
        .await
        .expect("Server stopped unexpectedly");
}
