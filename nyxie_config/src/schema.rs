use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// Reuse the tunables owned by the crates that consume them
use nyxie_core::DEFAULT_PERSONALITY;
use nyxie_memory::MemoryConfig;
use nyxie_providers::GenerationConfig;

const CONFIG_FILE: &str = "config.json";
const TELEGRAM_TOKEN_ENV: &str = "TELEGRAM_TOKEN";
const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub gemini: GeminiConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "GeminiConfig::default_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl GeminiConfig {
    fn default_model() -> String {
        "gemini-2.0-flash-exp".to_string()
    }
}

impl Config {
    /// Directory holding the config file and, by default, user memories.
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("nyxie"))
    }

    /// Load `~/nyxie/config.json` and apply environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let config_dir = Self::config_dir()?;
        let config_path = config_dir.join(CONFIG_FILE);

        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'nyxie init' to create config.",
                config_path.display()
            );
        }

        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.resolve_memory_dir(&config_dir);
        info!("Loaded config from {}", config_path.display());
        Ok(config)
    }

    /// Parse a config file without touching the environment.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Non-empty `TELEGRAM_TOKEN` / `GEMINI_API_KEY` values win over the file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(TELEGRAM_TOKEN_ENV).filter(|v| !v.is_empty()) {
            debug!("Using Telegram token from {TELEGRAM_TOKEN_ENV}");
            self.telegram.token = token;
        }
        if let Some(key) = lookup(GEMINI_API_KEY_ENV).filter(|v| !v.is_empty()) {
            debug!("Using Gemini API key from {GEMINI_API_KEY_ENV}");
            self.providers.gemini.api_key = key;
        }
    }

    /// Anchor a relative memory directory at `base`.
    pub fn resolve_memory_dir(&mut self, base: &Path) {
        if self.memory.dir.is_relative() {
            self.memory.dir = base.join(&self.memory.dir);
        }
    }

    #[must_use]
    pub fn personality(&self) -> &str {
        self.personality.as_deref().unwrap_or(DEFAULT_PERSONALITY)
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        std::fs::write(&config_path, CONFIG_TEMPLATE)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Edit the config file and add your Gemini API key and Telegram token");
        println!("      (or export {GEMINI_API_KEY_ENV} and {TELEGRAM_TOKEN_ENV})");
        println!("   2. Run 'nyxie chat' to talk from the terminal");
        println!("   3. Run 'nyxie telegram' to start the bot");
        println!();
        println!("🔧 Configuration options:");
        println!("   - generation: sampling parameters sent to Gemini");
        println!("   - memory.max_retained_size: approximate tokens remembered per user");
        println!("   - memory.context_budget: approximate tokens of history sent per request");
        println!("   - memory.dir: where user memories are stored (relative to ~/nyxie)");
        println!("   - personality: optional replacement for the built-in persona");
        println!();
        Ok(())
    }
}

const CONFIG_TEMPLATE: &str = r#"{
  "telegram": {
    "token": ""
  },
  "providers": {
    "gemini": {
      "api_key": "your-gemini-api-key-here",
      "model": "gemini-2.0-flash-exp"
    }
  },
  "generation": {
    "temperature": 0.9,
    "top_p": 0.95,
    "top_k": 40,
    "max_output_tokens": 2048
  },
  "memory": {
    "dir": "user_memories",
    "max_retained_size": 1000000,
    "context_budget": 2000
  }
}"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    #[expect(clippy::unwrap_used, reason = "Test failure should panic")]
    fn test_template_parses() {
        let config: Config = serde_json::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.providers.gemini.model, "gemini-2.0-flash-exp");
        assert_eq!(config.generation, GenerationConfig::default());
        assert_eq!(config.memory, MemoryConfig::default());
        assert_eq!(config.personality(), DEFAULT_PERSONALITY);
    }

    #[test]
    #[expect(clippy::unwrap_used, reason = "Test failure should panic")]
    fn test_minimal_config_takes_defaults() {
        let config: Config = serde_json::from_str(r#"{"providers": {"gemini": {}}}"#).unwrap();
        assert!(config.telegram.token.is_empty());
        assert!(config.providers.gemini.api_key.is_empty());
        assert_eq!(config.memory.context_budget, 2000);
    }

    #[test]
    #[expect(clippy::unwrap_used, reason = "Test failure should panic")]
    fn test_env_overrides() {
        let mut config: Config = serde_json::from_str(CONFIG_TEMPLATE).unwrap();
        let env: HashMap<&str, &str> = [("TELEGRAM_TOKEN", "123:abc"), ("GEMINI_API_KEY", "")]
            .into_iter()
            .collect();

        config.apply_env_overrides(|key| env.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.telegram.token, "123:abc");
        // Empty values never clobber the file.
        assert_eq!(config.providers.gemini.api_key, "your-gemini-api-key-here");
    }

    #[test]
    #[expect(clippy::unwrap_used, reason = "Test failure should panic")]
    fn test_memory_dir_resolution() {
        let mut config: Config = serde_json::from_str(CONFIG_TEMPLATE).unwrap();
        config.resolve_memory_dir(Path::new("/home/me/nyxie"));
        assert_eq!(config.memory.dir, PathBuf::from("/home/me/nyxie/user_memories"));

        let mut config: Config = serde_json::from_str(
            r#"{"providers": {"gemini": {}}, "memory": {"dir": "/var/lib/nyxie"}}"#,
        )
        .unwrap();
        config.resolve_memory_dir(Path::new("/home/me/nyxie"));
        assert_eq!(config.memory.dir, PathBuf::from("/var/lib/nyxie"));
    }

    #[test]
    #[expect(clippy::unwrap_used, reason = "Test failure should panic")]
    fn test_load_from_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"{"providers": {"gemini": {"api_key": "k"}}, "personality": "Be brief."}"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.providers.gemini.api_key, "k");
        assert_eq!(config.personality(), "Be brief.");
    }
}
