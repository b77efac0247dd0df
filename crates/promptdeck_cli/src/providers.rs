use std::sync::Arc;

use completion_provider::CompletionProvider;
use completion_provider_mock::{MockProvider, MOCK_PROVIDER_ID};
use completion_provider_openai::{OpenAiProvider, OpenAiProviderConfig, OPENAI_PROVIDER_ID};
use promptdeck::Config;

pub fn provider_from_config(config: &Config) -> Result<Arc<dyn CompletionProvider>, String> {
    match config.provider_id.as_str() {
        MOCK_PROVIDER_ID => Ok(Arc::new(MockProvider::new())),
        OPENAI_PROVIDER_ID => {
            let mut provider_config = OpenAiProviderConfig::new(config.api_key.clone());
            if let Some(base_url) = &config.api_base_url {
                provider_config = provider_config.with_base_url(base_url.clone());
            }
            if let Some(timeout) = config.timeout {
                provider_config = provider_config.with_timeout(timeout);
            }

            let provider = OpenAiProvider::new(provider_config).map_err(|error| error.to_string())?;
            Ok(Arc::new(provider))
        }
        unknown => Err(format!(
            "Unsupported provider '{unknown}'. Available providers: {MOCK_PROVIDER_ID}, {OPENAI_PROVIDER_ID}"
        )),
    }
}
