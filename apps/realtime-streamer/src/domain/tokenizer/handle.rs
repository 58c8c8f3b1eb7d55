//! Tokenizer Handles
//!
//! A loaded tokenizer backend behind a uniform `encode`/`decode` surface.

use tiktoken_rs::CoreBPE;
use tokenizers::Tokenizer;

use super::{BackendFamily, TokenId, TokenizerError, TokenizerSpec};

/// Replacement text for a token id a backend refuses to decode.
const REPLACEMENT: &str = "\u{FFFD}";

/// The loaded backend.
pub enum Backend {
    /// Hugging Face `tokenizers` instance.
    HuggingFace(Box<Tokenizer>),
    /// tiktoken byte-pair encoder.
    Tiktoken(Box<CoreBPE>),
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HuggingFace(_) => f.write_str("HuggingFace"),
            Self::Tiktoken(_) => f.write_str("Tiktoken"),
        }
    }
}

/// A resolved, immutable tokenizer shared read-only by every session.
#[derive(Debug)]
pub struct TokenizerHandle {
    spec: TokenizerSpec,
    backend: Backend,
}

impl TokenizerHandle {
    /// Wrap a loaded backend.
    #[must_use]
    pub const fn new(spec: TokenizerSpec, backend: Backend) -> Self {
        Self { spec, backend }
    }

    /// The name this handle was resolved under.
    #[must_use]
    pub fn name(&self) -> &str {
        self.spec.name()
    }

    /// The backend family.
    #[must_use]
    pub const fn family(&self) -> BackendFamily {
        self.spec.family()
    }

    /// Encode `text` into its full ordered id sequence.
    ///
    /// Hugging Face tokenizers add their special tokens (e.g. `[CLS]`/`[SEP]`
    /// for BERT); tiktoken encodings allow special tokens in the text.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::Encode`] if the backend rejects the input.
    pub fn encode(&self, text: &str) -> Result<Vec<TokenId>, TokenizerError> {
        match &self.backend {
            Backend::HuggingFace(tokenizer) => tokenizer
                .encode(text, true)
                .map(|encoding| encoding.get_ids().to_vec())
                .map_err(|e| TokenizerError::Encode {
                    name: self.name().to_string(),
                    reason: e.to_string(),
                }),
            Backend::Tiktoken(bpe) => Ok(bpe.encode_with_special_tokens(text)),
        }
    }

    /// Decode a single id in isolation.
    ///
    /// The fragment is what a viewer sees for this token. Concatenating the
    /// fragments of a sequence does not always reproduce the text: byte-level
    /// backends split multi-byte characters across ids and each partial
    /// sequence decodes to U+FFFD on its own, and sub-word backends drop the
    /// spacing they would infer from neighbouring tokens.
    #[must_use]
    pub fn decode(&self, id: TokenId) -> String {
        match &self.backend {
            Backend::HuggingFace(tokenizer) => {
                tokenizer.decode(&[id], true).unwrap_or_else(|e| {
                    tracing::warn!(tokenizer = self.name(), id, error = %e, "Token decode failed");
                    REPLACEMENT.to_string()
                })
            }
            Backend::Tiktoken(bpe) => {
                let bytes: Vec<u8> = bpe._decode_native_and_split(vec![id]).flatten().collect();
                String::from_utf8_lossy(&bytes).into_owned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tokenizer::TiktokenEncoding;

    fn cl100k() -> TokenizerHandle {
        TokenizerHandle::new(
            TokenizerSpec::tiktoken(TiktokenEncoding::Cl100kBase),
            Backend::Tiktoken(Box::new(tiktoken_rs::cl100k_base().unwrap())),
        )
    }

    #[test]
    fn ascii_fragments_reassemble() {
        let handle = cl100k();
        let text = "<div class=\"card\">Hello, world!</div>";
        let ids = handle.encode(text).unwrap();

        assert!(!ids.is_empty());
        let joined: String = ids.iter().map(|&id| handle.decode(id)).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn encode_is_deterministic() {
        let handle = cl100k();
        let text = "Alice Smith alice.smith42@example.com";
        assert_eq!(handle.encode(text).unwrap(), handle.encode(text).unwrap());
    }

    #[test]
    fn partial_character_bytes_decode_to_replacement() {
        let handle = cl100k();
        // A rare CJK extension-B character has no single-token encoding.
        let ids = handle.encode("\u{2A6D6}").unwrap();

        assert!(ids.len() > 1);
        for &id in &ids {
            assert!(handle.decode(id).contains('\u{FFFD}'));
        }
    }

    #[test]
    fn per_token_decode_tolerates_split_characters() {
        let handle = cl100k();
        let text = "status: \u{1F7E2} \u{65E5}\u{672C}\u{8A9E}";
        let ids = handle.encode(text).unwrap();

        // Every id decodes to something, even when it carries only part of a
        // character; the joined fragments need not equal the input.
        let fragments: Vec<String> = ids.iter().map(|&id| handle.decode(id)).collect();
        assert_eq!(fragments.len(), ids.len());
        assert!(fragments.iter().all(|f| !f.is_empty()));
        let joined: String = fragments.concat();
        assert!(joined.starts_with("status: "));
    }

    #[test]
    fn handle_reports_spec() {
        let handle = cl100k();
        assert_eq!(handle.name(), "cl100k_base");
        assert_eq!(
            handle.family(),
            BackendFamily::Tiktoken(TiktokenEncoding::Cl100kBase)
        );
        assert_eq!(format!("{:?}", handle.backend), "Tiktoken");
    }
}
