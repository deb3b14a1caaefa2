use super::Config;
use anyhow::{Context, Result};
use directories::UserDirs;
use std::fs;
use std::path::{Path, PathBuf};

impl Config {
    /// Default config location: `~/.wolfcall/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        Ok(home.join(".wolfcall").join("config.toml"))
    }

    /// Load the config at `path` (or the default path), writing a default
    /// file first when none exists. Env overrides are applied and the result
    /// is validated.
    pub fn load_or_init(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            if let Some(parent) = config_path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
            let config = Self {
                config_path: config_path.clone(),
                ..Self::default()
            };
            config.save()?;
            tracing::info!(path = %config_path.display(), "Wrote default config");
            config
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file without env overrides or validation.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).context("Failed to read config file")?;
        let mut config: Config = toml::from_str(&contents).context("Failed to parse config file")?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionMode;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let _lock = super::super::test_env::ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let config = Config::load_or_init(Some(&path)).unwrap();
        assert!(path.exists());
        assert_eq!(config.connection.port, 10000);
        assert_eq!(config.llm.attempts, 3);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[connection]
mode = "listen"
port = 10001

[agent]
name = "kanata"

[heuristics]
reply_budget = 2
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.connection.mode, ConnectionMode::Listen);
        assert_eq!(config.connection.port, 10001);
        assert_eq!(config.connection.host, "localhost");
        assert_eq!(config.agent.name, "kanata");
        assert_eq!(config.heuristics.reply_budget, 2);
        assert_eq!(config.heuristics.closure_threshold_day1, 4);
        assert_eq!(config.game.num, 1);
    }

    #[test]
    fn saved_config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config {
            config_path: path.clone(),
            ..Config::default()
        };
        config.game.num = 5;
        config.llm.provider = "gemini".into();
        config.save().unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.game.num, 5);
        assert_eq!(loaded.llm.provider, "gemini");
        assert_eq!(loaded.config_path, path);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "connection = [").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
