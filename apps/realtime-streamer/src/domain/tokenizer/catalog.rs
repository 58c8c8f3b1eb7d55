//! Tokenizer Catalog
//!
//! The closed set of tokenizer backends a stream may name. A name is resolved
//! to a [`TokenizerSpec`] before anything is loaded, so unknown names are
//! rejected without touching the network or the loader.

use super::TokenizerError;

/// Hugging Face repositories recognized out of the box.
pub const DEFAULT_HF_REPOS: &[&str] = &["gpt2", "bert-base-uncased", "google/gemma-3-1b-it"];

// =============================================================================
// Backend Families
// =============================================================================

/// Byte-pair encodings built into `tiktoken`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TiktokenEncoding {
    /// GPT-4o family encoding.
    O200kBase,
    /// GPT-4 / GPT-3.5 family encoding.
    Cl100kBase,
    /// Codex family encoding.
    P50kBase,
    /// GPT-3 family encoding.
    R50kBase,
}

impl TiktokenEncoding {
    /// Get all encodings.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::O200kBase, Self::Cl100kBase, Self::P50kBase, Self::R50kBase]
    }

    /// Parse an encoding from its canonical name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|e| e.as_str() == name)
    }

    /// Get the canonical encoding name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::O200kBase => "o200k_base",
            Self::Cl100kBase => "cl100k_base",
            Self::P50kBase => "p50k_base",
            Self::R50kBase => "r50k_base",
        }
    }
}

/// Backend family a tokenizer name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendFamily {
    /// Sub-word tokenizer described by a Hugging Face `tokenizer.json`.
    HuggingFace,
    /// Byte-pair encoding from `tiktoken`.
    Tiktoken(TiktokenEncoding),
}

impl BackendFamily {
    /// Short label used in logs and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::HuggingFace => "huggingface",
            Self::Tiktoken(_) => "tiktoken",
        }
    }
}

/// A recognized tokenizer name and the backend that serves it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenizerSpec {
    name: String,
    family: BackendFamily,
}

impl TokenizerSpec {
    /// Create a spec for a Hugging Face repository id.
    #[must_use]
    pub fn hugging_face(repo: impl Into<String>) -> Self {
        Self {
            name: repo.into(),
            family: BackendFamily::HuggingFace,
        }
    }

    /// Create a spec for a tiktoken encoding.
    #[must_use]
    pub fn tiktoken(encoding: TiktokenEncoding) -> Self {
        Self {
            name: encoding.as_str().to_string(),
            family: BackendFamily::Tiktoken(encoding),
        }
    }

    /// The name clients use to request this tokenizer.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The backend family.
    #[must_use]
    pub const fn family(&self) -> BackendFamily {
        self.family
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Allow-list of tokenizer names.
#[derive(Debug, Clone)]
pub struct TokenizerCatalog {
    hf_repos: Vec<String>,
}

impl Default for TokenizerCatalog {
    fn default() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}

impl TokenizerCatalog {
    /// Create a catalog with the default repositories plus `extra_hf_repos`.
    #[must_use]
    pub fn new(extra_hf_repos: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut hf_repos: Vec<String> = DEFAULT_HF_REPOS.iter().map(ToString::to_string).collect();
        for repo in extra_hf_repos {
            let repo: String = repo.into();
            let repo = repo.trim();
            if !repo.is_empty() && !hf_repos.iter().any(|r| r == repo) {
                hf_repos.push(repo.to_string());
            }
        }
        Self { hf_repos }
    }

    /// Look up a tokenizer by name.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::UnknownTokenizer`] if the name is not in the catalog.
    pub fn lookup(&self, name: &str) -> Result<TokenizerSpec, TokenizerError> {
        if let Some(encoding) = TiktokenEncoding::from_name(name) {
            return Ok(TokenizerSpec::tiktoken(encoding));
        }
        if self.hf_repos.iter().any(|r| r == name) {
            return Ok(TokenizerSpec::hugging_face(name));
        }
        Err(TokenizerError::UnknownTokenizer(name.to_string()))
    }

    /// All recognized names, Hugging Face repositories first.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.hf_repos
            .iter()
            .cloned()
            .chain(TiktokenEncoding::all().iter().map(|e| e.as_str().to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("o200k_base", TiktokenEncoding::O200kBase)]
    #[test_case("cl100k_base", TiktokenEncoding::Cl100kBase)]
    #[test_case("p50k_base", TiktokenEncoding::P50kBase)]
    #[test_case("r50k_base", TiktokenEncoding::R50kBase)]
    fn tiktoken_names_resolve(name: &str, expected: TiktokenEncoding) {
        let spec = TokenizerCatalog::default().lookup(name).unwrap();
        assert_eq!(spec.family(), BackendFamily::Tiktoken(expected));
        assert_eq!(spec.name(), name);
    }

    #[test_case("gpt2")]
    #[test_case("bert-base-uncased")]
    #[test_case("google/gemma-3-1b-it")]
    fn default_hf_repos_resolve(name: &str) {
        let spec = TokenizerCatalog::default().lookup(name).unwrap();
        assert_eq!(spec.family(), BackendFamily::HuggingFace);
    }

    #[test]
    fn unknown_name_rejected() {
        let err = TokenizerCatalog::default()
            .lookup("does-not-exist")
            .unwrap_err();
        assert_eq!(
            err,
            TokenizerError::UnknownTokenizer("does-not-exist".to_string())
        );
    }

    #[test]
    fn names_are_case_sensitive() {
        assert!(TokenizerCatalog::default().lookup("GPT2").is_err());
        assert!(TokenizerCatalog::default().lookup("CL100K_BASE").is_err());
    }

    #[test]
    fn extra_repos_extend_catalog() {
        let catalog = TokenizerCatalog::new(["Qwen/Qwen2.5-0.5B", " ", "gpt2"]);
        assert!(catalog.lookup("Qwen/Qwen2.5-0.5B").is_ok());

        let names = catalog.names();
        assert_eq!(names.iter().filter(|n| *n == "gpt2").count(), 1);
        assert_eq!(names.len(), DEFAULT_HF_REPOS.len() + 1 + TiktokenEncoding::all().len());
    }

    #[test]
    fn family_labels() {
        assert_eq!(BackendFamily::HuggingFace.label(), "huggingface");
        assert_eq!(
            BackendFamily::Tiktoken(TiktokenEncoding::Cl100kBase).label(),
            "tiktoken"
        );
    }
}
