use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Json, Router,
        body::Bytes,
        extract::State,
        http::{HeaderMap, StatusCode},
        response::{IntoResponse, Response},
        routing::{get, post},
    },
    secrecy::{ExposeSecret, Secret},
    tokio::net::TcpListener,
    tracing::{debug, info, warn},
};

use {zbot_channels::ChannelRelay, zbot_config::WebhookConfig};

use crate::{
    EventNormalizer, Error, Result,
    signature::{verify_bearer, verify_github_signature},
};

pub const EVENT_HEADER: &str = "x-github-event";
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Shared state for the webhook routes.
#[derive(Clone)]
pub struct WebhookState {
    normalizer: Arc<EventNormalizer>,
    relays: Arc<Vec<ChannelRelay>>,
    secret: Option<Arc<Secret<String>>>,
}

impl WebhookState {
    pub fn new(
        normalizer: EventNormalizer,
        relays: Vec<ChannelRelay>,
        secret: Option<Secret<String>>,
    ) -> Self {
        Self {
            normalizer: Arc::new(normalizer),
            relays: Arc::new(relays),
            secret: secret.map(Arc::new),
        }
    }

    pub fn from_config(config: &WebhookConfig, relays: Vec<ChannelRelay>) -> Self {
        Self::new(
            EventNormalizer::from_config(config),
            relays,
            config.secret.clone(),
        )
    }

    fn secret(&self) -> Option<&str> {
        self.secret
            .as_deref()
            .map(|s| s.expose_secret().as_str())
            .filter(|s| !s.is_empty())
    }
}

pub fn build_app(state: WebhookState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/webhook", post(webhook_handler))
        .route("/broadcast", post(broadcast_handler))
        .with_state(state)
}

/// Bind `config.bind:config.port` and serve until the listener fails.
pub async fn serve(config: &WebhookConfig, state: WebhookState) -> Result<()> {
    let address = format!("{}:{}", config.bind, config.port);
    let addr: SocketAddr = address.parse().map_err(|e| Error::Bind {
        address: address.clone(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
    })?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "webhook server listening");
    axum::serve(listener, build_app(state)).await?;
    Ok(())
}

fn reject(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

async fn health_handler(State(state): State<WebhookState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.relays.len(),
    }))
}

async fn webhook_handler(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(event_type) = header(&headers, EVENT_HEADER) else {
        return reject(StatusCode::BAD_REQUEST, "missing X-GitHub-Event header");
    };
    if let Some(secret) = state.secret() {
        let signature = header(&headers, SIGNATURE_HEADER).unwrap_or_default();
        if let Err(e) = verify_github_signature(&body, signature, secret) {
            warn!(event_type, error = %e, "rejected webhook delivery");
            return reject(StatusCode::UNAUTHORIZED, "invalid signature");
        }
    }
    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            debug!(event_type, error = %e, "webhook body is not JSON");
            return reject(StatusCode::BAD_REQUEST, "body must be JSON");
        },
    };

    let event = state.normalizer.normalize(event_type, &payload);
    let mut delivered = 0;
    for relay in state.relays.iter() {
        delivered += relay.receive_external_event(&event).await;
    }
    info!(event_type, delivered, "webhook event relayed");
    Json(serde_json::json!({ "delivered": delivered })).into_response()
}

async fn broadcast_handler(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if let Some(secret) = state.secret() {
        let auth = header(&headers, "authorization").unwrap_or_default();
        if let Err(e) = verify_bearer(auth, secret) {
            warn!(error = %e, "rejected broadcast");
            return reject(StatusCode::UNAUTHORIZED, "invalid token");
        }
    }
    let message = body.trim();
    if message.is_empty() {
        return reject(StatusCode::BAD_REQUEST, "empty message");
    }
    let mut delivered = 0;
    for relay in state.relays.iter() {
        delivered += relay.send_to_all(message).await;
    }
    info!(delivered, "broadcast relayed");
    Json(serde_json::json!({ "delivered": delivered })).into_response()
}
