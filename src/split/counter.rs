use tiktoken_rs::CoreBPE;

use crate::core::errors::ApiError;

/// Token counting port. Tests substitute deterministic fakes.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// Exact subword counting with the cl100k_base vocabulary, the same
/// tokenizer family the downstream chat model bills against.
pub struct Cl100kCounter {
    bpe: CoreBPE,
}

impl Cl100kCounter {
    pub fn new() -> Result<Self, ApiError> {
        let bpe = tiktoken_rs::cl100k_base().map_err(ApiError::internal)?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for Cl100kCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}
