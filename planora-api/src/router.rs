use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use sqlx::PgPool;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::{app_state::AppState, config::Settings, routes};

pub fn create(connection_pool: PgPool, config: Settings) -> Router<()> {
    let app_state = AppState::new(connection_pool, &config);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(["content-type".parse().unwrap()])
        .allow_origin(
            config
                .application
                .app_url
                .parse::<HeaderValue>()
                .expect("Invalid app URL"),
        );

    Router::new()
        .route("/", get(|| async { "planora-api" }))
        .nest("/projects", routes::project_lines::project_router())
        .nest("/project-lines", routes::project_lines::line_router())
        .nest("/planning", routes::planning::router())
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
}
