//! Ontology Server
//!
//! Serves ancestor/descendant subgraphs of an ontology term for a graph renderer.
//!
//! ## Environment Variables
//!
//! - `PORT`: Server port (default: 3000)
//! - `ONTOLOGY_PATH`: Path to the OBO Graph JSON document (default: go-basic.json)
//! - `ONTOLOGY_GRAPH`: Graph to index, by position or IRI (default: first graph)
//! - `DEFAULT_TERM`: Focus term for `GET /subgraph` (default: GO:0045010)

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ontology_server::{create_router_with_middleware, load_ontology, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ontology_server=info,ontology_graph=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    tracing::info!("Starting ontology server on {}", addr);
    tracing::info!("Ontology document: {:?} ({})", config.ontology_path, config.graph);
    tracing::info!("Default focus term: {}", config.default_term);

    let state = Arc::new(AppState::new(config));

    // Requests get 503 until the index is ready
    tokio::spawn(load_ontology(Arc::clone(&state)));

    let app = create_router_with_middleware(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
