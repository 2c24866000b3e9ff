/*
 * Responsibility
 * - Config読み込み → 依存生成 (PgPool / TokenCodec / metrics) → Router 組み立て
 * - Middleware の適用 (trace id / instrumentation / timeout / 認証)
 * - axum::serve() で起動し、SIGINT/SIGTERM で graceful shutdown
 */
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use std::{panic, process};

use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{AppEnv, Config, SecretSource};
use crate::middleware::{self, http::HttpSettings, metrics::HttpMetrics};
use crate::repos::PgUserStore;
use crate::services::auth::{TokenCodec, password};
use crate::{api, state::AppState};

fn init_tracing(app_env: AppEnv) {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,l10n_api=debug cargo run
    let default_filter = if app_env.is_production() {
        "info"
    } else {
        "info,l10n_api=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter);

    // Production logs are shipped as JSON, one object per line.
    if app_env.is_production() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Development: crash the whole process so we notice immediately.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    let app_env = AppEnv::from_env();
    init_tracing(app_env);
    init_panic_hook(!app_env.is_production());

    let config = Config::from_env()?;

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );
    if config.secret_source == SecretSource::Generated {
        tracing::warn!("SECRET is not set; using a generated one, tokens will not survive a restart");
    }

    let state = build_state(&config).await?;
    let app = build_router(state, config.http_settings());

    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    serve(listener, app, config.shutdown_grace).await
}

async fn build_state(config: &Config) -> Result<AppState> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    let metrics = HttpMetrics::new().context("failed to register metrics")?;
    password::warm_up().await?;

    Ok(AppState::new(
        Arc::new(PgUserStore::new(pool)),
        TokenCodec::new(&config.secret),
        metrics,
    ))
}

/// Full application router: routes, optional authentication and the
/// HTTP-level layers.
pub fn build_router(state: AppState, settings: HttpSettings) -> Router {
    let router = middleware::auth::access::apply(api::routes(), state.tokens.clone());
    let router = router.with_state(state.clone());

    middleware::http::apply(router, state.metrics, settings)
}

async fn serve(listener: TcpListener, app: Router, grace: Duration) -> Result<()> {
    let (stop_tx, mut stop_rx) = watch::channel(());

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = stop_rx.changed().await;
    });
    let mut server = tokio::spawn(async move { server.await });

    tokio::select! {
        res = &mut server => {
            return res.context("server task failed")?.context("server error");
        }
        _ = shutdown_signal() => {}
    }

    tracing::info!(?grace, "shutting down, waiting for in-flight requests");
    let _ = stop_tx.send(());

    tokio::select! {
        res = tokio::time::timeout(grace, &mut server) => match res {
            Ok(joined) => joined.context("server task failed")?.context("server error")?,
            Err(_) => {
                tracing::warn!("grace period elapsed, dropping in-flight requests");
                server.abort();
            }
        },
        _ = shutdown_signal() => {
            tracing::warn!("second shutdown signal, exiting now");
            server.abort();
        }
    }

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }
}
