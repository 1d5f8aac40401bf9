//! `MedflowServer`: HTTP and WebSocket front end.

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::routes;
use crate::websocket::{run_session, SessionSettings};
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use medflow::connections::ConnectionRegistry;
use medflow::transcription::TranscriptionService;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state available to handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Transcription flow and connection registry.
    pub service: TranscriptionService,
    /// Settings applied to each new WebSocket session.
    pub session: SessionSettings,
}

/// Builds the router for `/`, `/api/status` and `/ws`.
pub fn build_router(state: AppState, cors_permissive: bool) -> Router {
    let router = Router::new()
        .route("/", get(routes::root))
        .route("/api/status", get(routes::status))
        .route("/ws", get(ws_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// GET /ws
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| run_session(socket, state.service, state.session))
}

/// The transcription server.
#[derive(Debug)]
pub struct MedflowServer {
    config: ServerConfig,
    service: TranscriptionService,
}

impl MedflowServer {
    /// Builds the transcription flow and an empty connection registry.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let registry = Arc::new(ConnectionRegistry::new());
        let service = TranscriptionService::from_config(&config.flow, registry)?;
        Ok(Self { config, service })
    }

    /// Returns the configuration.
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the transcription service.
    pub const fn service(&self) -> &TranscriptionService {
        &self.service
    }

    /// Builds a router sharing this server's registry.
    pub fn router(&self) -> Router {
        let state = AppState {
            service: self.service.clone(),
            session: SessionSettings {
                outbound_capacity: self.config.outbound_capacity,
                ping_interval: self.config.ping_interval(),
            },
        };
        build_router(state, self.config.cors_permissive)
    }

    /// Binds the configured address.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let listener = TcpListener::bind(self.config.bind_address()).await?;
        Ok(listener)
    }

    /// Serves on `listener` until `shutdown` resolves.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        info!(%addr, flow = self.service.flow().name(), "Server listening");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("Server stopped");
        Ok(())
    }
}
