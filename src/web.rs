//! Webhook transport.
//!
//! One inbound text message per POST, one plain-text reply. The payload
//! shape follows the messaging provider's webhook convention (`Body` /
//! `From`, form-encoded).

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tokio::signal;

use crate::chat::DialogueResolver;

#[derive(Clone)]
struct SharedState {
    resolver: Arc<DialogueResolver>,
}

pub(crate) fn build_router(resolver: Arc<DialogueResolver>) -> Router {
    let shared_state = Arc::new(SharedState { resolver });

    Router::new()
        .route("/webhook", post(webhook))
        .route("/health", get(health))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(shared_state)
}

async fn start_app(resolver: Arc<DialogueResolver>, listen_addr: &str) {
    async fn shutdown_signal() {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
        };

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }

    let app = build_router(resolver);

    let listener = tokio::net::TcpListener::bind(listen_addr).await.unwrap();
    log::info!("listening on {listen_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

pub fn start_daemon(resolver: Arc<DialogueResolver>, listen_addr: &str) {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(async { start_app(resolver, listen_addr).await });
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WebhookPayload {
    #[serde(rename = "Body", default)]
    body: String,

    #[serde(rename = "From", default)]
    from: String,
}

async fn webhook(
    State(state): State<Arc<SharedState>>,
    Form(payload): Form<WebhookPayload>,
) -> String {
    log::debug!("payload: {payload:?}");

    let resolver = state.resolver.clone();

    // the catalogue load and embedding calls are blocking
    tokio::task::block_in_place(move || resolver.handle_message(&payload.body, &payload.from))
}

async fn health() -> &'static str {
    "ok"
}
