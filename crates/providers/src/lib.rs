//! Completion-service implementations for Baton.
//!
//! All services implement the `baton_core::CompletionService` trait.
//! The execution loop never knows which backend it is talking to.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatService;

use std::sync::Arc;

use baton_config::AppConfig;
use baton_core::{CompletionService, Error};

/// Build the configured completion service.
pub fn from_config(config: &AppConfig) -> Result<Arc<dyn CompletionService>, Error> {
    let api_key = config.api_key.clone().ok_or_else(|| Error::Config {
        message: "no API key configured — set api_key in ~/.baton/config.toml \
                  or export BATON_API_KEY"
            .into(),
    })?;
    Ok(Arc::new(OpenAiCompatService::new(
        "openai",
        &config.base_url,
        api_key,
    )))
}
