use std::env;
use std::fmt::Debug;

/// The environment variable consulted for the API key when no explicit key
/// is configured.
pub const API_KEY_ENV: &str = "API_KEY";
/// The environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "API_BASE_URL";
/// The environment variable overriding the model name.
pub const MODEL_ENV: &str = "MODEL_NAME";
/// The environment variable overriding the token ceiling.
pub const MAX_TOKENS_ENV: &str = "MAX_TOKENS";

const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
const DEFAULT_MODEL: &str = "deepseek-chat";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Builder for [`OpenAIConfig`].
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct OpenAIConfigBuilder {
    api_key: Option<String>,
    api_key_env: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    max_tokens: Option<u32>,
}

impl OpenAIConfigBuilder {
    /// Creates a builder with every value left to its default.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder from the process environment.
    ///
    /// Only the endpoint values are read here. The API key is looked up
    /// lazily on every request, see [`OpenAIConfigBuilder::with_api_key`].
    #[inline]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Creates a builder by querying `lookup` for the variables read by
    /// [`OpenAIConfigBuilder::from_env`].
    ///
    /// Blank values are ignored, and so is a `MAX_TOKENS` value that is
    /// not a positive integer.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let max_tokens = lookup(MAX_TOKENS_ENV).and_then(|value| {
            match value.parse::<u32>() {
                Ok(max_tokens) if max_tokens > 0 => Some(max_tokens),
                _ => {
                    warn!("ignoring invalid {MAX_TOKENS_ENV} value: {value:?}");
                    None
                }
            }
        });

        Self {
            api_key: None,
            api_key_env: None,
            model: lookup(MODEL_ENV),
            base_url: lookup(BASE_URL_ENV),
            max_tokens,
        }
    }

    /// Sets an explicit API key.
    ///
    /// An explicit key always wins over the environment. Without one, the
    /// provider reads the key from the environment on every request.
    #[inline]
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the environment variable to read the API key from. Defaults to
    /// [`API_KEY_ENV`].
    #[inline]
    pub fn with_api_key_env<S: Into<String>>(mut self, name: S) -> Self {
        self.api_key_env = Some(name.into());
        self
    }

    /// Sets the model to use.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets a custom base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the maximum number of tokens the model may generate.
    #[inline]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> OpenAIConfig {
        OpenAIConfig {
            api_key: self.api_key,
            api_key_env: self
                .api_key_env
                .unwrap_or_else(|| API_KEY_ENV.to_owned()),
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        }
    }
}

impl Debug for OpenAIConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfigBuilder")
            .field("api_key", &self.api_key.as_ref().map(|_| "<deducted>"))
            .field("api_key_env", &self.api_key_env)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Configuration for the OpenAI-compatible provider.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct OpenAIConfig {
    pub(crate) api_key: Option<String>,
    pub(crate) api_key_env: String,
    pub(crate) model: String,
    pub(crate) base_url: String,
    pub(crate) max_tokens: u32,
}

impl OpenAIConfig {
    /// Returns the model name.
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the base URL.
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the token ceiling sent with every request.
    #[inline]
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Returns whether an API key is available right now, either explicit
    /// or from the environment.
    #[inline]
    pub fn has_api_key(&self) -> bool {
        self.resolve_api_key().is_some()
    }

    /// Resolves the API key: the explicit key first, then the configured
    /// environment variable. Blank values count as missing.
    pub(crate) fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(|name| env::var(name).ok())
    }

    fn resolve_api_key_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Option<String> {
        let non_blank = |key: String| {
            let key = key.trim();
            (!key.is_empty()).then(|| key.to_owned())
        };
        self.api_key
            .clone()
            .and_then(non_blank)
            .or_else(|| lookup(&self.api_key_env).and_then(non_blank))
    }

    pub(crate) fn completions_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), "/chat/completions")
    }
}

impl Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<deducted>"))
            .field("api_key_env", &self.api_key_env)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_in(
        vars: &[(&str, &str)],
    ) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = OpenAIConfigBuilder::new().build();
        assert_eq!(config.model(), "deepseek-chat");
        assert_eq!(config.base_url(), "https://api.deepseek.com/v1");
        assert_eq!(config.max_tokens(), 4096);
        assert_eq!(
            config.completions_url(),
            "https://api.deepseek.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_from_lookup() {
        let config = OpenAIConfigBuilder::from_lookup(lookup_in(&[
            (BASE_URL_ENV, "http://localhost:8080/v1/"),
            (MODEL_ENV, "  local-model "),
            (MAX_TOKENS_ENV, "not-a-number"),
        ]))
        .build();
        assert_eq!(config.model(), "local-model");
        assert_eq!(config.max_tokens(), 4096);
        assert_eq!(
            config.completions_url(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_api_key_precedence() {
        let env = lookup_in(&[(API_KEY_ENV, "from-env")]);

        let config = OpenAIConfigBuilder::new().with_api_key("explicit").build();
        assert_eq!(
            config.resolve_api_key_with(&env).as_deref(),
            Some("explicit")
        );

        let config = OpenAIConfigBuilder::new().with_api_key("  ").build();
        assert_eq!(
            config.resolve_api_key_with(&env).as_deref(),
            Some("from-env")
        );

        let config = OpenAIConfigBuilder::new().build();
        assert_eq!(config.resolve_api_key_with(lookup_in(&[])), None);
        assert_eq!(
            config.resolve_api_key_with(lookup_in(&[(API_KEY_ENV, "")])),
            None
        );
    }

    #[test]
    fn test_debug_hides_key() {
        let config = OpenAIConfigBuilder::new().with_api_key("sk-secret").build();
        let printed = format!("{config:?}");
        assert!(!printed.contains("sk-secret"));
        assert!(printed.contains("<deducted>"));
    }
}
