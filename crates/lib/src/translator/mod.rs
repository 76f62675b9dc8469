//! Translation abstraction and Azure Translator client.
//!
//! The bot talks to the translator through [`Translate`] so handlers can be driven by a fake in tests.

mod azure;

pub use azure::{TranslateError, TranslatorClient};

use crate::language::Language;
use async_trait::async_trait;

/// Result of one successful translation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    /// Source language reported by the provider, when it auto-detected one.
    pub detected_language: Option<String>,
}

/// Anything that can translate text into one of the supported languages.
#[async_trait]
pub trait Translate: Send + Sync {
    async fn translate(&self, text: &str, target: Language) -> Result<Translation, TranslateError>;
}
