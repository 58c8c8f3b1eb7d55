//! Tokenizer Backend Adapters
//!
//! Implements [`TokenizerLoader`] for the two backend families:
//!
//! - **Hugging Face**: `tokenizer.json` read from a local directory when
//!   present, otherwise downloaded from the Hub (cached by `hf-hub`).
//! - **tiktoken**: encodings built from the ranks embedded in `tiktoken-rs`.
//!
//! Parsing and rank construction are CPU bound and run on the blocking pool.

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use tiktoken_rs::CoreBPE;
use tokenizers::Tokenizer;

use crate::application::ports::TokenizerLoader;
use crate::domain::tokenizer::{
    Backend, BackendFamily, TiktokenEncoding, TokenizerError, TokenizerHandle, TokenizerSpec,
};
use crate::infrastructure::metrics;

/// File name of a serialized Hugging Face tokenizer.
const TOKENIZER_FILE: &str = "tokenizer.json";

/// Loads tokenizer backends from disk, the Hub, or embedded ranks.
#[derive(Debug, Clone, Default)]
pub struct BackendLoader {
    tokenizer_dir: Option<PathBuf>,
}

impl BackendLoader {
    /// Create a loader. `tokenizer_dir` holds `<repo id>/tokenizer.json`
    /// files that take precedence over the Hub.
    #[must_use]
    pub const fn new(tokenizer_dir: Option<PathBuf>) -> Self {
        Self { tokenizer_dir }
    }

    /// Local `tokenizer.json` for `repo`, if one exists.
    fn local_file(&self, repo: &str) -> Option<PathBuf> {
        let path = self.tokenizer_dir.as_ref()?.join(repo).join(TOKENIZER_FILE);
        path.is_file().then_some(path)
    }

    async fn load_hugging_face(&self, spec: &TokenizerSpec) -> Result<Backend, TokenizerError> {
        let name = spec.name();
        let path = match self.local_file(name) {
            Some(path) => {
                tracing::debug!(tokenizer = name, path = %path.display(), "Using local tokenizer file");
                path
            }
            None => fetch_from_hub(name).await?,
        };

        let tokenizer = run_blocking(name, move || read_tokenizer_file(&path))
            .await?
            .map_err(|reason| TokenizerError::load_failure(name, reason))?;
        Ok(Backend::HuggingFace(Box::new(tokenizer)))
    }

    async fn load_tiktoken(
        spec: &TokenizerSpec,
        encoding: TiktokenEncoding,
    ) -> Result<Backend, TokenizerError> {
        let name = spec.name().to_string();
        let bpe = run_blocking(&name, move || build_encoding(encoding))
            .await?
            .map_err(|e| TokenizerError::load_failure(&name, e))?;
        Ok(Backend::Tiktoken(Box::new(bpe)))
    }
}

#[async_trait]
impl TokenizerLoader for BackendLoader {
    async fn load(&self, spec: &TokenizerSpec) -> Result<TokenizerHandle, TokenizerError> {
        let started = Instant::now();

        let backend = match spec.family() {
            BackendFamily::HuggingFace => self.load_hugging_face(spec).await,
            BackendFamily::Tiktoken(encoding) => Self::load_tiktoken(spec, encoding).await,
        };

        metrics::record_tokenizer_load(spec.name(), backend.is_ok(), started.elapsed());
        backend.map(|backend| TokenizerHandle::new(spec.clone(), backend))
    }
}

async fn fetch_from_hub(repo: &str) -> Result<PathBuf, TokenizerError> {
    let api = hf_hub::api::tokio::Api::new().map_err(|e| TokenizerError::load_failure(repo, e))?;
    tracing::info!(tokenizer = repo, "Fetching tokenizer from Hugging Face Hub");
    api.model(repo.to_string())
        .get(TOKENIZER_FILE)
        .await
        .map_err(|e| TokenizerError::load_failure(repo, e))
}

fn read_tokenizer_file(path: &Path) -> Result<Tokenizer, String> {
    Tokenizer::from_file(path).map_err(|e| format!("{}: {e}", path.display()))
}

fn build_encoding(encoding: TiktokenEncoding) -> anyhow::Result<CoreBPE> {
    match encoding {
        TiktokenEncoding::O200kBase => tiktoken_rs::o200k_base(),
        TiktokenEncoding::Cl100kBase => tiktoken_rs::cl100k_base(),
        TiktokenEncoding::P50kBase => tiktoken_rs::p50k_base(),
        TiktokenEncoding::R50kBase => tiktoken_rs::r50k_base(),
    }
}

/// Run `f` on the blocking pool, mapping a panicked task to a load failure.
async fn run_blocking<T, F>(name: &str, f: F) -> Result<T, TokenizerError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| TokenizerError::load_failure(name, e))
}
