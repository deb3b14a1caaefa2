use super::gemini::GeminiProvider;
use super::openai::OpenAiProvider;
use super::traits::Provider;
use crate::config::LlmConfig;
use crate::error::LlmError;

/// Factory: create the backend selected in `[llm]`.
pub fn create_provider(config: &LlmConfig) -> Result<Box<dyn Provider>, LlmError> {
    let key = config.api_key.as_deref();
    let base_url = config.base_url.as_deref();
    match config.provider.as_str() {
        "openai" => Ok(Box::new(OpenAiProvider::new(key, base_url, config.max_tokens))),
        "gemini" | "google" => Ok(Box::new(GeminiProvider::new(
            key,
            base_url,
            config.max_tokens,
        ))),
        other => Err(LlmError::UnknownProvider(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str) -> LlmConfig {
        LlmConfig {
            provider: provider.into(),
            api_key: Some("test-key".into()),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn factory_openai() {
        assert_eq!(create_provider(&config("openai")).unwrap().name(), "openai");
    }

    #[test]
    fn factory_gemini_and_alias() {
        assert_eq!(create_provider(&config("gemini")).unwrap().name(), "gemini");
        assert_eq!(create_provider(&config("google")).unwrap().name(), "gemini");
    }

    #[test]
    fn factory_unknown_provider_errors() {
        let err = create_provider(&config("nonexistent")).err().unwrap();
        assert!(err.to_string().contains("nonexistent"));
    }
}
