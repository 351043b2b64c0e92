use std::sync::Arc;

use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use linkvault_server::config::Config;
use linkvault_server::metadata::{Enricher, HttpFetcher};
use linkvault_server::state::AppState;
use linkvault_server::{db, routes};

const DEFAULT_LOG_FILTER: &str = "linkvault_server=info,tower_http=info,sqlx=warn";

#[tokio::main]
async fn main() {
    // JSON logs in production, human-readable in dev.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if std::env::var("APP_ENV").as_deref() == Ok("production") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("LinkVault server starting...");

    let config = Config::from_env().expect("Failed to load configuration (is DATABASE_URL set?)");
    info!(
        metadata_timeout = ?config.metadata_fetch_timeout,
        title_timeout = ?config.title_fetch_timeout,
        "Configuration loaded"
    );

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    db::health_check(&pool)
        .await
        .expect("Database health check failed");
    info!("Database health check passed");

    let fetcher = if config.allow_private_networks {
        tracing::warn!("Page fetcher may reach private network addresses");
        HttpFetcher::allowing_private_networks()
    } else {
        HttpFetcher::new()
    }
    .expect("Failed to build HTTP client");
    let enricher = Enricher::new(Arc::new(fetcher))
        .with_timeouts(config.metadata_fetch_timeout, config.title_fetch_timeout);

    // CORS: permissive in dev, restrictive in production.
    let cors = if config.is_dev {
        info!("CORS: permissive (dev mode)");
        CorsLayer::permissive()
    } else {
        tracing::warn!("CORS: restrictive (production mode), cross-origin requests will be denied");
        CorsLayer::new()
    };

    let addr = config.server_addr();

    let app_state = AppState {
        pool,
        jwt_secret: Arc::from(config.jwt_secret.as_str()),
        enricher,
    };

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let app = routes::api_router(app_state)
        .route(
            "/metrics",
            get(move || async move { metric_handle.render() }),
        )
        .layer(prometheus_layer)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
