//! Shared types for the API layer.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_MAX_BODY_BYTES, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::pipeline::evaluation::{Evaluator, ReportPair};

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes. The evaluator owns the single
/// loaded embedder; handlers clone the `Arc` into blocking tasks.
#[derive(Clone)]
pub struct ApiContext {
    pub evaluator: Arc<Evaluator>,
}

impl ApiContext {
    pub fn new(evaluator: Arc<Evaluator>) -> Self {
        Self { evaluator }
    }
}

/// Request limits applied by the router's middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiLimits {
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
}

impl ApiLimits {
    pub fn from_config(config: &crate::config::AppConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            max_body_bytes: config.max_body_bytes,
        }
    }
}

impl Default for ApiLimits {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Request bodies
// ═══════════════════════════════════════════════════════════

/// `POST /api/batch` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub pairs: Vec<ReportPair>,
}
