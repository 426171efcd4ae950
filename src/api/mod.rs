//! REST API server.
//!
//! A thin axum adapter over the service layer: handlers resolve the caller,
//! call a service and map its typed result onto the `{status, message}`
//! response envelope.

mod auth;
mod routes;
mod state;
mod system;
pub mod v1;


use std::net::{IpAddr, Ipv4Addr};

use miette::Diagnostic;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::db::Database;

pub use auth::CurrentUser;
pub use routes::{ApiDoc, create_router};
pub use state::AppState;

/// API server errors.
#[derive(Error, Diagnostic, Debug)]
pub enum ApiError {
    #[error("Failed to bind {addr}: {source}")]
    #[diagnostic(
        code(todolist::api::bind),
        help("Is another process already listening on this port?")
    )]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    #[diagnostic(code(todolist::api::serve))]
    Serve(#[source] std::io::Error),
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host address to bind to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
        }
    }
}

/// Initialize tracing subscriber with env filter
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todolist=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Run the API server with the given configuration and application state.
pub async fn run<D: Database + 'static>(
    config: Config,
    state: AppState<D>,
) -> Result<(), ApiError> {
    let app = create_router(state).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ApiError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!("API server listening on http://{}", addr);
    info!("API docs at http://{}/docs", addr);

    axum::serve(listener, app).await.map_err(ApiError::Serve)?;
    Ok(())
}
