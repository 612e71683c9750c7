//! Storehook server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use apalis::prelude::*;
use axum::{Router, middleware};
use storehook_api::{middleware::AppState, router as api_router};
use storehook_common::Config;
use storehook_core::{DispatchService, NoOpDispatch, SubscriberService};
use storehook_db::repositories::SubscriberRepository;
use storehook_queue::workers::{MakeRequestContext, make_request_worker};
use storehook_queue::{MakeRequestJob, RedisDispatchService, storage_config};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storehook=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting storehook server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = storehook_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    storehook_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let subscriber_repo = SubscriberRepository::new(Arc::clone(&db));

    // Connect to Redis and initialize the delivery queue
    let dispatch: DispatchService = if config.webhooks.disabled {
        info!("Webhook delivery is disabled; requests will not be queued");
        Arc::new(NoOpDispatch)
    } else {
        info!("Connecting to Redis...");
        let redis_client = redis::Client::open(config.redis.url.as_str())?;
        let redis_conn = redis::aio::ConnectionManager::new(redis_client).await?;
        let redis_storage = apalis_redis::RedisStorage::<MakeRequestJob>::new_with_config(
            redis_conn,
            storage_config(&config.webhooks.queue_namespace),
        );
        info!(
            namespace = %config.webhooks.queue_namespace,
            "Connected to Redis job queue"
        );

        // Start the delivery worker
        info!("Starting webhook delivery worker...");
        let user_agent = format!("storehook/{}", env!("CARGO_PKG_VERSION"));
        let make_request_ctx = MakeRequestContext::new(
            subscriber_repo.clone(),
            config.webhooks.request_timeout_secs,
            user_agent,
        );

        let worker_storage = redis_storage.clone();
        tokio::spawn(async move {
            let monitor = Monitor::new().register({
                WorkerBuilder::new("make-request")
                    .data(make_request_ctx)
                    .backend(worker_storage)
                    .build_fn(make_request_worker)
            });

            if let Err(e) = monitor.run().await {
                tracing::error!(error = %e, "Delivery worker failed");
            }
        });
        info!("Webhook delivery worker started");

        Arc::new(RedisDispatchService::new(redis_storage))
    };

    // Initialize services
    let subscriber_service = SubscriberService::new(
        subscriber_repo,
        dispatch,
        config.webhooks.max_subscribers,
    );

    // Create app state
    let state = AppState {
        subscriber_service,
        admin_token: config.server.admin_token.clone(),
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            storehook_api::middleware::admin_auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
