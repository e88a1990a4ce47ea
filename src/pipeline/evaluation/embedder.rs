use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::types::{EvaluationError, TextEmbedder};

/// Standard embedding dimension for all-MiniLM-L6-v2
pub const EMBEDDING_DIM: usize = 384;

/// Model identifier of the bundled ONNX model.
pub const ONNX_MODEL_ID: &str = "all-MiniLM-L6-v2";

/// Longest token sequence fed to the ONNX model. Longer reports are
/// truncated, so only their first 256 word-pieces shape the embedding.
pub const MAX_SEQ_LEN: usize = 256;

/// Which embedder the process loads at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// Local all-MiniLM-L6-v2 (`model.onnx` + `tokenizer.json`).
    Onnx { model_dir: PathBuf },
    /// Remote embedding endpoint of an Ollama instance.
    Ollama {
        base_url: String,
        model: String,
        timeout_secs: u64,
    },
    /// Lexical feature-hashing embedder. No model files.
    Hashing { dimension: usize },
}

/// Build the process-wide embedder. Called once; the result is shared.
pub fn load_embedder(backend: &EmbeddingBackend) -> Result<Arc<dyn TextEmbedder>, EvaluationError> {
    match backend {
        EmbeddingBackend::Onnx { model_dir } => load_onnx(model_dir),
        EmbeddingBackend::Ollama {
            base_url,
            model,
            timeout_secs,
        } => {
            let embedder = OllamaEmbedder::connect(base_url, model, *timeout_secs)?;
            Ok(Arc::new(embedder))
        }
        EmbeddingBackend::Hashing { dimension } => Ok(Arc::new(HashingEmbedder::new(*dimension))),
    }
}

#[cfg(feature = "onnx-embeddings")]
fn load_onnx(model_dir: &std::path::Path) -> Result<Arc<dyn TextEmbedder>, EvaluationError> {
    Ok(Arc::new(OnnxEmbedder::load(model_dir)?))
}

#[cfg(not(feature = "onnx-embeddings"))]
fn load_onnx(model_dir: &std::path::Path) -> Result<Arc<dyn TextEmbedder>, EvaluationError> {
    Err(EvaluationError::ModelInit(format!(
        "cannot load {}: built without the `onnx-embeddings` feature. \
         Rebuild with `--features onnx-embeddings`, or select the `ollama` or `hashing` embedder",
        model_dir.display()
    )))
}

// ═══════════════════════════════════════════════════════════
// ONNX Embedder: behind `onnx-embeddings` feature
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx-embeddings")]
mod onnx {
    use super::{EvaluationError, TextEmbedder, EMBEDDING_DIM, MAX_SEQ_LEN, ONNX_MODEL_ID};
    use ort::session::Session;
    use std::path::Path;
    use std::sync::Mutex;

    /// all-MiniLM-L6-v2 inference through ONNX Runtime.
    ///
    /// `ort::Session::run` needs `&mut self`, so the session sits behind a
    /// Mutex; concurrent evaluations are serialized at the inference call.
    pub struct OnnxEmbedder {
        session: Mutex<Session>,
        tokenizer: tokenizers::Tokenizer,
    }

    impl OnnxEmbedder {
        /// `model_dir` must contain `model.onnx` and `tokenizer.json`.
        pub fn load(model_dir: &Path) -> Result<Self, EvaluationError> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");

            if !model_path.exists() {
                return Err(EvaluationError::ModelNotFound(model_path));
            }
            if !tokenizer_path.exists() {
                return Err(EvaluationError::ModelNotFound(tokenizer_path));
            }

            let session = Session::builder()
                .map_err(|e: ort::Error| EvaluationError::ModelInit(e.to_string()))?
                .with_intra_threads(2)
                .map_err(|e: ort::Error| EvaluationError::ModelInit(e.to_string()))?
                .commit_from_file(&model_path)
                .map_err(|e: ort::Error| {
                    EvaluationError::ModelInit(format!("ONNX load failed: {e}"))
                })?;

            let mut tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| EvaluationError::ModelInit(format!("Tokenizer load failed: {e}")))?;
            tokenizer
                .with_truncation(Some(tokenizers::TruncationParams {
                    max_length: MAX_SEQ_LEN,
                    ..Default::default()
                }))
                .map_err(|e| EvaluationError::ModelInit(format!("Tokenizer truncation: {e}")))?;

            tracing::info!(model = ONNX_MODEL_ID, dir = %model_dir.display(), "ONNX embedder loaded");

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
            })
        }

        /// Mean-pooled, L2-normalized sentence embedding.
        fn infer(&self, text: &str) -> Result<Vec<f32>, EvaluationError> {
            use ort::value::TensorRef;

            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| EvaluationError::Tokenization(e.to_string()))?;

            let input_ids = to_model_input(encoding.get_ids());
            let attention_mask = to_model_input(encoding.get_attention_mask());
            let token_type_ids = to_model_input(encoding.get_type_ids());

            let seq_len = input_ids.len();
            let unavailable = |e: String| EvaluationError::EmbeddingUnavailable(e);

            let ids_array = ndarray::Array2::from_shape_vec((1, seq_len), input_ids)
                .map_err(|e| unavailable(e.to_string()))?;
            let mask_array = ndarray::Array2::from_shape_vec((1, seq_len), attention_mask.clone())
                .map_err(|e| unavailable(e.to_string()))?;
            let type_array = ndarray::Array2::from_shape_vec((1, seq_len), token_type_ids)
                .map_err(|e| unavailable(e.to_string()))?;

            let ids_tensor =
                TensorRef::from_array_view(&ids_array).map_err(|e| unavailable(e.to_string()))?;
            let mask_tensor =
                TensorRef::from_array_view(&mask_array).map_err(|e| unavailable(e.to_string()))?;
            let type_tensor =
                TensorRef::from_array_view(&type_array).map_err(|e| unavailable(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| unavailable("Session lock poisoned".to_string()))?;

            let outputs = session
                .run(ort::inputs![ids_tensor, mask_tensor, type_tensor])
                .map_err(|e| unavailable(format!("ONNX inference failed: {e}")))?;

            // Output shape: [1, seq_len, 384]
            let (shape, output_data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| unavailable(format!("Output extraction: {e}")))?;

            if shape.len() != 3 || shape[2] as usize != EMBEDDING_DIM {
                return Err(unavailable(format!(
                    "Unexpected output shape: {shape:?}, expected [1, {seq_len}, {EMBEDDING_DIM}]"
                )));
            }

            let mut pooled = vec![0.0f32; EMBEDDING_DIM];
            let mut mask_sum = 0.0f32;

            for (token_idx, &mask_val_i64) in attention_mask.iter().enumerate().take(seq_len) {
                let mask_val = mask_val_i64 as f32;
                mask_sum += mask_val;
                let offset = token_idx * EMBEDDING_DIM;
                for (dim_idx, p) in pooled.iter_mut().enumerate() {
                    *p += output_data[offset + dim_idx] * mask_val;
                }
            }

            if mask_sum > 0.0 {
                for val in &mut pooled {
                    *val /= mask_sum;
                }
            }

            l2_normalize(&mut pooled);
            Ok(pooled)
        }
    }

    /// Widen to i64 and cap at `MAX_SEQ_LEN`, whatever the tokenizer
    /// file's own truncation settings say.
    pub(super) fn to_model_input(values: &[u32]) -> Vec<i64> {
        values.iter().take(MAX_SEQ_LEN).map(|&v| v as i64).collect()
    }

    fn l2_normalize(v: &mut [f32]) {
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in v {
                *val /= norm;
            }
        }
    }

    impl TextEmbedder for OnnxEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, EvaluationError> {
            self.infer(text)
        }

        fn dimension(&self) -> usize {
            EMBEDDING_DIM
        }

        fn model_id(&self) -> &str {
            ONNX_MODEL_ID
        }
    }
}

#[cfg(feature = "onnx-embeddings")]
pub use onnx::OnnxEmbedder;

// ═══════════════════════════════════════════════════════════
// Ollama Embedder
// ═══════════════════════════════════════════════════════════

/// Embeddings from an Ollama instance (`POST /api/embed`).
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    dimension: usize,
}

#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    /// Connect and probe once, so an unreachable endpoint or unknown model
    /// fails at startup rather than on the first request.
    pub fn connect(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self, EvaluationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| EvaluationError::ModelInit(format!("HTTP client: {e}")))?;

        let mut embedder = Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            dimension: 0,
        };
        embedder.dimension = embedder.request("dimension probe")?.len();

        tracing::info!(
            model = %embedder.model,
            base_url = %embedder.base_url,
            dimension = embedder.dimension,
            "Ollama embedder connected"
        );
        Ok(embedder)
    }

    fn request(&self, text: &str) -> Result<Vec<f32>, EvaluationError> {
        let url = format!("{}/api/embed", self.base_url);
        let body = OllamaEmbedRequest {
            model: &self.model,
            input: text,
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                EvaluationError::EmbeddingUnavailable(format!("cannot connect to {}", self.base_url))
            } else if e.is_timeout() {
                EvaluationError::EmbeddingUnavailable("embedding request timed out".to_string())
            } else {
                EvaluationError::EmbeddingUnavailable(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(EvaluationError::EmbeddingUnavailable(format!(
                "Ollama returned {}: {detail}",
                status.as_u16()
            )));
        }

        let parsed: OllamaEmbedResponse = response
            .json()
            .map_err(|e| EvaluationError::EmbeddingUnavailable(format!("bad response: {e}")))?;

        parsed
            .embeddings
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| EvaluationError::EmbeddingUnavailable("empty embedding".to_string()))
    }
}

impl TextEmbedder for OllamaEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EvaluationError> {
        let vector = self.request(text)?;
        if vector.len() != self.dimension {
            return Err(EvaluationError::DimensionMismatch {
                left: self.dimension,
                right: vector.len(),
            });
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// ═══════════════════════════════════════════════════════════
// Hashing Embedder
// ═══════════════════════════════════════════════════════════

/// Deterministic bag-of-words embedder: each lowercase alphanumeric token
/// is hashed into a signed bucket. Purely lexical, so paraphrases score
/// low; use it for tests and offline runs, not as a semantic model.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub const MODEL_ID: &'static str = "hashing-bow";

    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(EMBEDDING_DIM)
    }
}

impl HashingEmbedder {
    /// Signed bucket for one feature.
    fn bucket(&self, feature: &str) -> (usize, f32) {
        let digest = Sha256::digest(feature.as_bytes());
        let mut bucket_bytes = [0u8; 8];
        bucket_bytes.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        (bucket, sign)
    }
}

impl TextEmbedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EvaluationError> {
        let mut vec = vec![0.0f32; self.dimension];

        let tokens = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);

        let mut hashed = 0usize;
        for token in tokens {
            let (bucket, sign) = self.bucket(&token);
            vec[bucket] += sign;
            hashed += 1;
        }

        // Punctuation-only text ("...", "+/-") is one feature, never a zero vector.
        let trimmed = text.trim();
        if hashed == 0 && !trimmed.is_empty() {
            let (bucket, sign) = self.bucket(trimmed);
            vec[bucket] += sign;
        }

        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut vec {
                *val /= norm;
            }
        }

        Ok(vec)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        Self::MODEL_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::evaluation::similarity::{cosine_similarity, similarity};

    #[test]
    fn hashing_embed_returns_configured_dimension() {
        let embedder = HashingEmbedder::new(64);
        assert_eq!(embedder.embed("Mild edema").unwrap().len(), 64);
        assert_eq!(embedder.dimension(), 64);
    }

    #[test]
    fn hashing_embed_is_deterministic() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed("No acute fracture.").unwrap();
        let b = embedder.embed("No acute fracture.").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn hashing_embed_ignores_case_and_punctuation() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed("No acute FRACTURE!").unwrap();
        let b = embedder.embed("no, acute fracture").unwrap();
        assert!((cosine_similarity(&a, &b).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn hashing_embed_is_unit_length() {
        let v = HashingEmbedder::default().embed("The liver is normal in size.").unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn hashing_embed_of_empty_text_is_zero() {
        let v = HashingEmbedder::default().embed("").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn hashing_embed_of_symbol_only_text_is_self_similar() {
        let embedder = HashingEmbedder::default();
        for text in ["...", "\u{2014}", "+/-"] {
            let sim = similarity(&embedder, text, text).unwrap();
            assert!((sim - 1.0).abs() < 1e-6, "{text:?} scored {sim}");
        }
        let dots = embedder.embed("...").unwrap();
        assert!(dots.iter().any(|x| *x != 0.0));
    }

    #[test]
    fn overlapping_texts_score_between_disjoint_and_identical() {
        let embedder = HashingEmbedder::default();
        let base = embedder.embed("small lesion in the liver").unwrap();
        let near = embedder.embed("small spot in the liver").unwrap();
        let sim = cosine_similarity(&base, &near).unwrap();
        assert!(sim > 0.3 && sim < 1.0, "got {sim}");
    }

    #[test]
    fn hashing_backend_loads_without_files() {
        let embedder = load_embedder(&EmbeddingBackend::Hashing { dimension: 32 }).unwrap();
        assert_eq!(embedder.dimension(), 32);
        assert_eq!(embedder.model_id(), HashingEmbedder::MODEL_ID);
    }

    #[cfg(feature = "onnx-embeddings")]
    #[test]
    fn onnx_input_is_capped_at_max_seq_len() {
        let long: Vec<u32> = (0..1000).collect();
        let capped = super::onnx::to_model_input(&long);
        assert_eq!(capped.len(), MAX_SEQ_LEN);
        assert_eq!(capped[MAX_SEQ_LEN - 1], (MAX_SEQ_LEN - 1) as i64);

        let short = super::onnx::to_model_input(&[101, 2054, 102]);
        assert_eq!(short, vec![101, 2054, 102]);
    }

    #[cfg(not(feature = "onnx-embeddings"))]
    #[test]
    fn onnx_backend_without_feature_is_model_init_error() {
        let result = load_embedder(&EmbeddingBackend::Onnx {
            model_dir: PathBuf::from("/nonexistent"),
        });
        match result {
            Err(EvaluationError::ModelInit(msg)) => {
                assert!(msg.contains("--features onnx-embeddings"), "{msg}");
                assert!(msg.contains("`hashing`"), "{msg}");
            }
            Err(other) => panic!("expected ModelInit, got {other}"),
            Ok(_) => panic!("onnx backend loaded without the feature"),
        }
    }

    #[cfg(feature = "onnx-embeddings")]
    #[test]
    fn onnx_missing_model_dir_is_not_found() {
        let result = load_embedder(&EmbeddingBackend::Onnx {
            model_dir: PathBuf::from("/nonexistent"),
        });
        assert!(matches!(result, Err(EvaluationError::ModelNotFound(_))));
    }

    #[test]
    fn ollama_unreachable_fails_at_connect() {
        let result = OllamaEmbedder::connect("http://127.0.0.1:9", "all-minilm", 2);
        assert!(matches!(result, Err(EvaluationError::EmbeddingUnavailable(_))));
    }

    #[test]
    fn backend_config_serializes_tagged() {
        let backend = EmbeddingBackend::Hashing { dimension: 8 };
        let json = serde_json::to_value(&backend).unwrap();
        assert_eq!(json["kind"], "hashing");
        assert_eq!(json["dimension"], 8);
    }
}
