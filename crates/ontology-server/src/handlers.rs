//! Request handlers for API endpoints.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use ontology_graph::{CytoscapeElement, IndexedNode, OntologyIndex, SubgraphResult};

use crate::config::ServerConfig;

// ============================================================================
// Errors
// ============================================================================

/// Errors returned to API clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Ontology is still loading")]
    Loading,

    #[error("Ontology failed to load: {0}")]
    LoadFailed(String),

    #[error("Term not found: {0}")]
    TermNotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Loading => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::LoadFailed(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::TermNotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

// ============================================================================
// Application State
// ============================================================================

/// Where the ontology is in its lifecycle.
#[derive(Debug)]
pub enum LoadState {
    Loading,
    Loaded(Arc<OntologyIndex>),
    Failed(String),
}

impl LoadState {
    pub fn label(&self) -> &'static str {
        match self {
            LoadState::Loading => "loading",
            LoadState::Loaded(_) => "loaded",
            LoadState::Failed(_) => "failed",
        }
    }
}

/// Shared application state: the ontology index and a per-term subgraph memo.
pub struct AppState {
    pub config: ServerConfig,
    ontology: RwLock<LoadState>,
    subgraphs: DashMap<String, Arc<SubgraphResult>>,
}

impl AppState {
    /// Create state that is waiting for the ontology to load.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            ontology: RwLock::new(LoadState::Loading),
            subgraphs: DashMap::new(),
        }
    }

    /// Create state around an already built index.
    pub fn with_index(config: ServerConfig, index: OntologyIndex) -> Self {
        let state = Self::new(config);
        state.set_loaded(index);
        state
    }

    /// Record the outcome of loading the ontology.
    pub fn finish_loading(&self, result: ontology_graph::Result<OntologyIndex>) {
        match result {
            Ok(index) => self.set_loaded(index),
            Err(e) => {
                tracing::error!(
                    "Failed to load ontology from {:?}: {}",
                    self.config.ontology_path,
                    e
                );
                self.set_failed(e.to_string());
            }
        }
    }

    pub fn set_loaded(&self, index: OntologyIndex) {
        tracing::info!(
            "Ontology loaded: {} terms, {} is-a links",
            index.len(),
            index.edge_count()
        );
        *self.ontology.write() = LoadState::Loaded(Arc::new(index));
        self.subgraphs.clear();
    }

    pub fn set_failed(&self, message: String) {
        *self.ontology.write() = LoadState::Failed(message);
        self.subgraphs.clear();
    }

    /// Current lifecycle label: "loading", "loaded" or "failed".
    pub fn load_state(&self) -> &'static str {
        self.ontology.read().label()
    }

    /// The loaded index, or why there is none.
    pub fn index(&self) -> Result<Arc<OntologyIndex>, ApiError> {
        match &*self.ontology.read() {
            LoadState::Loading => Err(ApiError::Loading),
            LoadState::Loaded(index) => Ok(Arc::clone(index)),
            LoadState::Failed(message) => Err(ApiError::LoadFailed(message.clone())),
        }
    }

    /// Subgraph for `focus`, memoized per term.
    pub fn subgraph(&self, focus: &str) -> Result<Arc<SubgraphResult>, ApiError> {
        let index = self.index()?;

        if let Some(hit) = self.subgraphs.get(focus) {
            return Ok(Arc::clone(&hit));
        }

        let start = Instant::now();
        let result = index
            .subgraph(focus)
            .map(Arc::new)
            .ok_or_else(|| ApiError::TermNotFound(focus.to_string()))?;

        tracing::debug!(
            focus,
            nodes = result.nodes.len(),
            edges = result.edges.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "extracted subgraph"
        );

        self.subgraphs.insert(focus.to_string(), Arc::clone(&result));
        Ok(result)
    }

    /// Number of memoized subgraphs.
    pub fn cached_subgraphs(&self) -> usize {
        self.subgraphs.len()
    }
}

pub type SharedState = Arc<AppState>;

/// Load the configured ontology off the async runtime and publish it.
pub async fn load_ontology(state: SharedState) {
    let path = state.config.ontology_path.clone();
    let selector = state.config.graph.clone();
    tracing::info!("Loading ontology from {:?} ({})", path, selector);

    let start = Instant::now();
    let result =
        tokio::task::spawn_blocking(move || OntologyIndex::load(&path, &selector)).await;

    match result {
        Ok(result) => {
            state.finish_loading(result);
            tracing::info!("Ontology load finished in {} ms", start.elapsed().as_millis());
        }
        Err(e) => {
            tracing::error!("Ontology loader task failed: {}", e);
            state.set_failed(e.to_string());
        }
    }
}

// ============================================================================
// Health and Status
// ============================================================================

pub async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    let mut response = serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "ontology": state.load_state(),
    });

    if let Ok(index) = state.index() {
        response["terms"] = serde_json::json!(index.len());
    }

    Json(response)
}

pub async fn status(State(state): State<SharedState>) -> impl IntoResponse {
    let mut response = serde_json::json!({
        "state": state.load_state(),
        "ontology_path": state.config.ontology_path.display().to_string(),
        "graph": state.config.graph.to_string(),
        "default_term": state.config.default_term,
    });

    match state.index() {
        Ok(index) => {
            response["terms"] = serde_json::json!(index.len());
            response["edges"] = serde_json::json!(index.edge_count());
            response["cached_subgraphs"] = serde_json::json!(state.cached_subgraphs());
        }
        Err(ApiError::LoadFailed(message)) => {
            response["error"] = serde_json::json!(message);
        }
        Err(_) => {}
    }

    Json(response)
}

// ============================================================================
// Terms and Subgraphs
// ============================================================================

pub async fn get_term(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<IndexedNode>, ApiError> {
    let index = state.index()?;
    index
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(ApiError::TermNotFound(id))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubgraphResponse {
    pub focus: String,
    #[serde(flatten)]
    pub subgraph: SubgraphResult,
}

pub async fn get_subgraph(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SubgraphResponse>, ApiError> {
    let subgraph = state.subgraph(&id)?;
    Ok(Json(SubgraphResponse {
        focus: id,
        subgraph: (*subgraph).clone(),
    }))
}

pub async fn default_subgraph(
    State(state): State<SharedState>,
) -> Result<Json<SubgraphResponse>, ApiError> {
    let focus = state.config.default_term.clone();
    get_subgraph(State(state), Path(focus)).await
}

pub async fn get_elements(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<CytoscapeElement>>, ApiError> {
    let subgraph = state.subgraph(&id)?;
    Ok(Json(subgraph.to_elements()))
}

#[derive(Debug, Deserialize)]
pub struct BatchSubgraphRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchSubgraphEntry {
    pub focus: String,
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subgraph: Option<SubgraphResult>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchSubgraphResponse {
    pub results: Vec<BatchSubgraphEntry>,
    pub latency_ms: u64,
}

pub async fn batch_subgraphs(
    State(state): State<SharedState>,
    Json(req): Json<BatchSubgraphRequest>,
) -> Result<Json<BatchSubgraphResponse>, ApiError> {
    let start = Instant::now();
    let index = state.index()?;
    let ids = req.ids;

    let (ids, subgraphs) = tokio::task::spawn_blocking(move || {
        let subgraphs = index.subgraphs(&ids);
        (ids, subgraphs)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    let results = ids
        .into_iter()
        .zip(subgraphs)
        .map(|(focus, subgraph)| {
            if let Some(ref found) = subgraph {
                state
                    .subgraphs
                    .entry(focus.clone())
                    .or_insert_with(|| Arc::new(found.clone()));
            }
            BatchSubgraphEntry {
                found: subgraph.is_some(),
                focus,
                subgraph,
            }
        })
        .collect();

    Ok(Json(BatchSubgraphResponse {
        results,
        latency_ms: start.elapsed().as_millis() as u64,
    }))
}
