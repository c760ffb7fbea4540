use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use ombrelle_core::OmbrelleConfig;
use ombrelle_notify::{Notifier, NullNotifier, SmsSender};
use ombrelle_scheduler::SchedulerEngine;
use ombrelle_store::ReminderStore;

mod app;
mod http;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ombrelle_gateway=info,ombrelle_scheduler=info,tower_http=debug".into()
            }),
        )
        .init();

    // load config: OMBRELLE_CONFIG env > ~/.ombrelle/ombrelle.toml
    let config_path = std::env::var("OMBRELLE_CONFIG").ok();
    let config = OmbrelleConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        OmbrelleConfig::default()
    });

    let db_path = config.database.path.clone();
    ensure_parent_dir(&db_path);
    info!(path = %db_path, "opening SQLite database");

    let db = rusqlite::Connection::open(&db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    let store = ReminderStore::new(db)?;

    // The engine polls over its own connection so HTTP handlers never
    // contend with the tick loop.
    let engine_store = ReminderStore::new(rusqlite::Connection::open(&db_path)?)?;

    let notifier: Arc<dyn Notifier> = match config.sms {
        Some(ref sms) => {
            info!(from = %sms.from_number, "SMS notifier configured");
            Arc::new(SmsSender::new(sms))
        }
        None => {
            tracing::warn!("No SMS credentials configured — reminder delivery disabled");
            Arc::new(NullNotifier)
        }
    };

    // spawn the scheduler engine loop in the background
    let engine = SchedulerEngine::new(engine_store, Arc::clone(&notifier));
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move { engine.run(shutdown_rx).await });

    let bind = config.server.bind.clone();
    let port = config.server.port;
    let state = Arc::new(app::AppState {
        config,
        store,
        notifier,
    });
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("Ombrelle backend listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    // signal the scheduler to stop
    let _ = shutdown_tx.send(true);
    Ok(())
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
