//! Multi-provider translation with ordered fallback
//!
//! This crate translates short texts between English and Indian languages by
//! trying a chain of public translation services in order, hiding their
//! failures behind a uniform [`TranslationOutcome`].
//!
//! # Workflow Example
//!
//! ```ignore
//! use krishi_translate::TranslationConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1. Build the provider chain from the environment
//!     let translator = TranslationConfig::from_env()?.build()?;
//!
//!     // 2. Translate; this never fails, degraded results carry the input
//!     let outcome = translator.translate("Hello", "english", "hindi").await;
//!     println!("{} (via {})", outcome.translation, outcome.provider);
//!
//!     // 3. Batches run concurrently and keep input order
//!     let texts = vec!["Rice".to_string(), "Wheat".to_string()];
//!     let outcomes = translator.translate_batch(&texts, "en", "bn").await?;
//!     assert_eq!(outcomes.len(), 2);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod indictrans;
pub mod language;
pub mod libretranslate;
pub mod mock;
pub mod mymemory;
pub mod orchestrator;
pub mod outcome;
pub mod provider;

// Integration tests (only available during testing)
#[cfg(test)]
mod integration_tests;

// Re-export main types for convenient access
pub use batch::TranslationLimits;
pub use config::{ProviderKind, TranslationConfig};
pub use error::{TranslateError, TranslateResult};
pub use indictrans::IndicTransProvider;
pub use language::{CodeScheme, Language, normalize};
pub use libretranslate::LibreTranslateProvider;
pub use mock::{MockMode, MockTranslator};
pub use mymemory::MyMemoryProvider;
pub use orchestrator::Translator;
pub use outcome::{PROVIDER_NONE, TranslationOutcome};
pub use provider::TranslationProvider;
