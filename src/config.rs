use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::pipeline::evaluation::{EmbeddingBackend, NegationLexicon, OntologyEntry, TermOntology};

/// Application-level constants
pub const APP_NAME: &str = "MedLens";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND: &str = "127.0.0.1:8787";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_REMOTE_EMBEDDING_MODEL: &str = "all-minilm";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Default `tracing` filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "medlens=info,warn"
}

/// ~/.medlens/, or the working directory when no home is known.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".medlens")
}

/// Get the models directory (for ONNX embeddings)
pub fn models_dir() -> PathBuf {
    app_data_dir().join("models")
}

/// Get the embedding model directory (all-MiniLM-L6-v2)
pub fn embedding_model_dir() -> PathBuf {
    models_dir().join("all-MiniLM-L6-v2")
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Cannot read lexicon file {path}: {source}")]
    LexiconRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed lexicon file {path}: {source}")]
    LexiconParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Lexicon file {path} has an empty {field} entry")]
    EmptyLexiconEntry { path: PathBuf, field: &'static str },
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub embedding: EmbeddingBackend,
    /// JSON lexicon replacing the built-in term and negation lists.
    pub lexicon_path: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub max_body_bytes: usize,
}

impl AppConfig {
    /// Read `MEDLENS_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable lookup (the environment, or a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_raw = get("MEDLENS_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind_raw.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::InvalidValue {
                var: "MEDLENS_BIND",
                value: bind_raw.clone(),
                reason: e.to_string(),
            }
        })?;

        let request_timeout_secs = parse_number(
            "MEDLENS_REQUEST_TIMEOUT_SECS",
            get("MEDLENS_REQUEST_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        let max_body_bytes = parse_number(
            "MEDLENS_MAX_BODY_BYTES",
            get("MEDLENS_MAX_BODY_BYTES"),
            DEFAULT_MAX_BODY_BYTES,
        )?;

        let embedding = match get("MEDLENS_EMBEDDER").as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("onnx") => EmbeddingBackend::Onnx {
                model_dir: get("MEDLENS_MODEL_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(embedding_model_dir),
            },
            Some("ollama") => EmbeddingBackend::Ollama {
                base_url: get("MEDLENS_OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
                model: get("MEDLENS_EMBEDDING_MODEL")
                    .unwrap_or_else(|| DEFAULT_REMOTE_EMBEDDING_MODEL.to_string()),
                timeout_secs: request_timeout_secs,
            },
            Some("hashing") => EmbeddingBackend::Hashing {
                dimension: crate::pipeline::evaluation::embedder::EMBEDDING_DIM,
            },
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: "MEDLENS_EMBEDDER",
                    value: other.to_string(),
                    reason: "expected onnx, ollama or hashing".to_string(),
                })
            }
        };

        Ok(Self {
            bind_addr,
            embedding,
            lexicon_path: get("MEDLENS_LEXICON").map(PathBuf::from),
            request_timeout_secs,
            max_body_bytes,
        })
    }
}

fn parse_number<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
{
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value: T = raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        var,
        value: raw.clone(),
        reason: e.to_string(),
    })?;
    if value <= T::default() {
        return Err(ConfigError::InvalidValue {
            var,
            value: raw,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

/// On-disk lexicon: ordered terms with optional glosses, and optional
/// negation markers.
#[derive(Debug, Deserialize)]
struct LexiconFile {
    terms: Vec<OntologyEntry>,
    #[serde(default)]
    negations: Option<Vec<String>>,
}

/// Load a lexicon file. Entries are trimmed and lowercased, order is kept.
/// Without a `negations` key the built-in negation list is used.
pub fn load_lexicon(path: &Path) -> Result<(TermOntology, NegationLexicon), ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::LexiconRead {
        path: path.to_path_buf(),
        source,
    })?;
    let file: LexiconFile = serde_json::from_str(&raw).map_err(|source| ConfigError::LexiconParse {
        path: path.to_path_buf(),
        source,
    })?;

    let mut entries = Vec::with_capacity(file.terms.len());
    for entry in file.terms {
        let term = entry.term.trim().to_lowercase();
        if term.is_empty() {
            return Err(ConfigError::EmptyLexiconEntry {
                path: path.to_path_buf(),
                field: "terms",
            });
        }
        let gloss = entry
            .gloss
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty());
        entries.push(OntologyEntry { term, gloss });
    }

    let negations = match file.negations {
        Some(markers) => {
            let markers: Vec<String> = markers.iter().map(|m| m.trim().to_lowercase()).collect();
            if markers.iter().any(String::is_empty) {
                return Err(ConfigError::EmptyLexiconEntry {
                    path: path.to_path_buf(),
                    field: "negations",
                });
            }
            NegationLexicon::new(markers)
        }
        None => NegationLexicon::clinical(),
    };

    let ontology = TermOntology::new(entries);
    let unrestated = ontology.unrestated_gloss_terms();
    if !unrestated.is_empty() {
        tracing::warn!(
            terms = ?unrestated,
            "Lexicon glosses do not restate these terms; patched rewrites will still report them"
        );
    }
    tracing::info!(
        path = %path.display(),
        terms = ontology.len(),
        negations = negations.len(),
        "Lexicon loaded"
    );
    Ok((ontology, negations))
}
