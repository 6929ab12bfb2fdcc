use std::net::SocketAddr;

use anyhow::Context;
use tracing::Level;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    Layer, filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use shophub_api::{
    config::{AppConfig, LogFormat},
    db::{create_orm_conn, run_migrations},
    identity,
    routes::build_app,
    state::AppState,
};

/// Console logging plus, with `LOG_DIR`, daily-rotated JSON files: `app.log`
/// gets every event and `activity.log` only the `activity` target.
fn init_tracing(config: &AppConfig) -> anyhow::Result<Vec<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,shophub_api=debug".into());
    let console = match config.log_format {
        LogFormat::Json => fmt::layer().json().boxed(),
        LogFormat::Pretty => fmt::layer().boxed(),
    };

    let mut guards = Vec::new();
    let files = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create log directory {}", dir.display()))?;
            let (app_writer, app_guard) = tracing_appender::non_blocking(rolling::daily(dir, "app.log"));
            let (activity_writer, activity_guard) =
                tracing_appender::non_blocking(rolling::daily(dir, "activity.log"));
            guards.push(app_guard);
            guards.push(activity_guard);

            let app = fmt::layer().json().with_ansi(false).with_writer(app_writer);
            let activity = fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(activity_writer)
                .with_filter(Targets::new().with_target("activity", Level::INFO));
            Some(app.and_then(activity))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(files)
        .init();
    Ok(guards)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let _log_guards = init_tracing(&config)?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let introspector = identity::from_config(&config.identity, config.request_timeout)?;
    let state = AppState::new(orm, introspector);
    let app = build_app(state, &config);

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    tracing::info!("listening on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
