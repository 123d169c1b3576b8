//! Where the provider settings and the conversation data come from.
//!
//! Provider settings are layered: `config.json` in the user's config
//! directory wins over the environment, which wins over the built-in
//! defaults of [`OpenAIConfigBuilder`].

use std::fmt::{self, Debug};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, anyhow};
use persona_chat_openai_model::{OpenAIConfig, OpenAIConfigBuilder};
use serde::{Deserialize, Serialize};

const APP_DIR: &str = "persona-chat";
const CONFIG_FILE: &str = "config.json";

/// Overrides the directory the conversation is stored in.
pub const DATA_DIR_ENV: &str = "PERSONA_CHAT_DATA_DIR";

/// The contents of `config.json`. Every field is optional.
#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
}

impl FileConfig {
    /// Loads the config file from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Loads the config file at `path`. A missing file is an empty config.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("no config file at {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("could not determine config directory"))?;
        Ok(config_dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Applies the values of this file on top of `builder`.
    pub fn apply(&self, mut builder: OpenAIConfigBuilder) -> OpenAIConfigBuilder {
        if let Some(api_key) = non_blank(&self.api_key) {
            builder = builder.with_api_key(api_key);
        }
        if let Some(base_url) = non_blank(&self.base_url) {
            builder = builder.with_base_url(base_url);
        }
        if let Some(model) = non_blank(&self.model) {
            builder = builder.with_model(model);
        }
        match self.max_tokens {
            Some(0) => warn!("ignoring max_tokens = 0 in the config file"),
            Some(max_tokens) => builder = builder.with_max_tokens(max_tokens),
            None => {}
        }
        builder
    }
}

impl Debug for FileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<deducted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Builds the provider config from `file` layered over the variables
/// returned by `lookup`.
pub fn provider_config(
    file: &FileConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> OpenAIConfig {
    file.apply(OpenAIConfigBuilder::from_lookup(lookup)).build()
}

/// Returns the directory the conversation is stored in.
pub fn data_dir(lookup: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
    if let Some(dir) = lookup(DATA_DIR_ENV).filter(|dir| !dir.trim().is_empty())
    {
        return Ok(PathBuf::from(dir));
    }
    let data_dir = dirs::data_dir()
        .ok_or_else(|| anyhow!("could not determine data directory"))?;
    Ok(data_dir.join(APP_DIR))
}

#[inline]
fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use persona_chat_openai_model::{BASE_URL_ENV, MAX_TOKENS_ENV, MODEL_ENV};

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
    fn test_file_wins_over_env() {
        let env = lookup_in(&[
            (BASE_URL_ENV, "http://env.example/v1"),
            (MODEL_ENV, "env-model"),
            (MAX_TOKENS_ENV, "512"),
        ]);
        let file = FileConfig {
            model: Some("file-model".to_owned()),
            max_tokens: Some(1024),
            ..Default::default()
        };

        let config = provider_config(&file, env);
        assert_eq!(config.model(), "file-model");
        assert_eq!(config.max_tokens(), 1024);
        assert_eq!(config.base_url(), "http://env.example/v1");
    }

    #[test]
    fn test_blank_file_values_are_ignored() {
        let file = FileConfig {
            base_url: Some("  ".to_owned()),
            model: Some(String::new()),
            max_tokens: Some(0),
            ..Default::default()
        };

        let config = provider_config(&file, lookup_in(&[]));
        assert_eq!(config.model(), "deepseek-chat");
        assert_eq!(config.base_url(), "https://api.deepseek.com/v1");
        assert_eq!(config.max_tokens(), 4096);
    }

    #[test]
    fn test_file_api_key() {
        let file = FileConfig {
            api_key: Some("sk-file".to_owned()),
            ..Default::default()
        };
        let config = provider_config(&file, lookup_in(&[]));
        assert!(config.has_api_key());
        assert!(!format!("{file:?}").contains("sk-file"));
    }

    #[test]
    fn test_load_from() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        assert_eq!(FileConfig::load_from(&path).unwrap(), FileConfig::default());

        fs::write(&path, r#"{"model": "deepseek-reasoner", "max_tokens": 2048}"#)
            .unwrap();
        let config = FileConfig::load_from(&path).unwrap();
        assert_eq!(config.model.as_deref(), Some("deepseek-reasoner"));
        assert_eq!(config.max_tokens, Some(2048));
        assert_eq!(config.api_key, None);

        fs::write(&path, "{ not json").unwrap();
        let err = FileConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn test_data_dir_override() {
        let dir = data_dir(lookup_in(&[(DATA_DIR_ENV, "/tmp/persona")])).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/persona"));
    }
}
