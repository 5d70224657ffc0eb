use crate::{
    auth::{RoleDirectory, SessionTokens},
    config::config_model::DotEnvyConfig,
    infrastructure::{
        axum_http::{default_routers, routers},
        postgres::{postgres_connection::PgPoolSquad, repositories::users::UserPostgres},
    },
};
use anyhow::Result;
use axum::{
    Extension, Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE, IF_NONE_MATCH},
    },
    routing::get,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let session_tokens = Arc::new(SessionTokens::new(
        config.auth.session_secret.clone(),
        config.auth.session_ttl_days,
        config.auth.cookie_secure,
    ));
    let role_directory = RoleDirectory(Arc::new(UserPostgres::new(Arc::clone(&db_pool))));

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/auth",
            routers::auth::routes(
                Arc::clone(&db_pool),
                Arc::clone(&config),
                Arc::clone(&session_tokens),
            ),
        )
        .nest(
            "/api/v1/users",
            routers::users::routes(Arc::clone(&db_pool), Arc::clone(&session_tokens)),
        )
        .nest(
            "/api/v1/posts",
            routers::posts::routes(Arc::clone(&db_pool), Arc::clone(&config)),
        )
        .nest(
            "/api/v1/packages",
            routers::packages::routes(Arc::clone(&db_pool), Arc::clone(&config)),
        )
        .nest(
            "/api/v1/estimates",
            routers::estimates::routes(Arc::clone(&db_pool), Arc::clone(&config)),
        )
        .nest("/api/v1/bookings", routers::bookings::routes(Arc::clone(&db_pool)))
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(Extension(session_tokens))
        .layer(Extension(role_directory))
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.timeout)))
        .layer(RequestBodyLimitLayer::new(
            (config.server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::PUT,
                    Method::DELETE,
                ])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE, IF_NONE_MATCH])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(addr).await?;

    info!(port = config.server.port, stage = %config.stage, "http: server is running");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("http: received ctrl+c signal"),
        Err(err) => {
            error!(error = %err, "http: failed to install ctrl+c handler");
            std::future::pending::<()>().await;
        }
    }
}
