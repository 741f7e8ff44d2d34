use std::sync::Arc;
use std::time::Duration;

use account_service::config::Config;
use account_service::config::StorageBackend;
use account_service::domain::auth::service::AuthService;
use account_service::domain::revocation::ports::RevocationRegistry;
use account_service::domain::revocation::sweeper::spawn_sweeper;
use account_service::domain::user::ports::UserRepository;
use account_service::inbound::http::router::create_router;
use account_service::outbound::notifications::LogNotificationSink;
use account_service::outbound::repositories::InMemoryUserRepository;
use account_service::outbound::repositories::PostgresUserRepository;
use account_service::outbound::revocation::InMemoryRevocationRegistry;
use account_service::outbound::revocation::PostgresRevocationRegistry;
use account_service::AuthServicePort;
use auth::Clock;
use auth::JwtHandler;
use auth::SystemClock;
use auth::TokenCodec;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "account_service=debug,auth=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "account-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        backend = ?config.storage.backend,
        access_ttl_minutes = config.jwt.access_ttl_minutes,
        refresh_ttl_days = config.jwt.refresh_ttl_days,
        reset_ttl_minutes = config.reset.ttl_minutes,
        "Configuration loaded"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let jwt_handler = JwtHandler::new(config.jwt.secret.as_bytes())?;
    let codec = Arc::new(TokenCodec::new(jwt_handler, Arc::clone(&clock)));

    let auth_service: Arc<dyn AuthServicePort> = match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!(
                backend = "memory",
                "Using in-memory storage; accounts and revocations are lost on restart"
            );
            let users = Arc::new(InMemoryUserRepository::new(Arc::clone(&clock)));
            let registry = Arc::new(InMemoryRevocationRegistry::new(Arc::clone(&clock)));
            build_service(&config, users, registry, codec)
        }
        StorageBackend::Postgres => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(&config.database.url)
                .await?;
            tracing::info!(
                max_connections = config.database.max_connections,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            let users = Arc::new(PostgresUserRepository::new(pg_pool.clone()));
            let registry = Arc::new(PostgresRevocationRegistry::new(
                pg_pool,
                Arc::clone(&clock),
            ));
            build_service(&config, users, registry, codec)
        }
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    if config.reset.expose_token {
        tracing::warn!("Reset tokens are echoed in forgot-password responses");
    }

    let http_application = create_router(auth_service, config.reset.expose_token);
    axum::serve(http_listener, http_application)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server exited successfully");

    Ok(())
}

/// Wire the service over one storage backend and start its revocation sweep.
fn build_service<UR, RR>(
    config: &Config,
    users: Arc<UR>,
    registry: Arc<RR>,
    codec: Arc<TokenCodec>,
) -> Arc<dyn AuthServicePort>
where
    UR: UserRepository,
    RR: RevocationRegistry,
{
    if config.storage.revocation_sweep_secs > 0 {
        spawn_sweeper(
            Arc::clone(&registry),
            Duration::from_secs(config.storage.revocation_sweep_secs),
        );
        tracing::info!(
            period_secs = config.storage.revocation_sweep_secs,
            "Revocation sweep scheduled"
        );
    }

    let notifications = Arc::new(LogNotificationSink::new(config.reset.link_base_url.clone()));

    Arc::new(AuthService::new(
        users,
        registry,
        notifications,
        codec,
        config.auth_settings(),
    ))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
