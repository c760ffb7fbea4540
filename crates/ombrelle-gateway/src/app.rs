use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use ombrelle_core::OmbrelleConfig;
use ombrelle_notify::Notifier;
use ombrelle_store::ReminderStore;

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: OmbrelleConfig,
    pub store: ReminderStore,
    pub notifier: Arc<dyn Notifier>,
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route(
            "/reminders",
            post(crate::http::reminders::create_reminder)
                .get(crate::http::reminders::list_reminders),
        )
        .route(
            "/reminders/{id}",
            delete(crate::http::reminders::delete_reminder),
        )
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
