pub mod clone;
pub mod explore;
pub mod generate;

use mimic_core::{AnthropicProvider, MimicConfig, ModelBackend};
use std::sync::Arc;

/// Build the model backend from provider configuration.
pub(crate) fn backend_from(config: &MimicConfig) -> anyhow::Result<Arc<dyn ModelBackend>> {
    let api_key = config.provider.api_key.clone().unwrap_or_default();
    let provider = AnthropicProvider::with_endpoint(
        api_key,
        config.provider.endpoint.clone(),
        config.provider.timeout_secs,
    )?;
    Ok(Arc::new(provider))
}
