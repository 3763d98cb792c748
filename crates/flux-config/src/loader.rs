use anyhow::{anyhow, Result};
use config::{Config, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::AppConfig;

/// 环境变量覆盖前缀，例如 `FLUX_PROBE__SERVER__PORT=9100`
pub const ENV_PREFIX: &str = "FLUX_PROBE";

/// 配置加载器
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// 创建配置加载器
    pub fn new<P: AsRef<Path>>(config_path: P) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
        }
    }

    /// 加载配置：文件（按扩展名识别 TOML/JSON）叠加环境变量
    ///
    /// 文件不存在时使用默认配置。
    pub fn load(&self) -> Result<AppConfig> {
        let mut builder = Config::builder();

        if self.config_path.exists() {
            let path = self
                .config_path
                .to_str()
                .ok_or_else(|| anyhow!("Invalid config path"))?;
            builder = builder.add_source(File::new(path, self.format()));
            info!(path = %path, "Loading configuration file");
        } else {
            debug!(path = %self.config_path.display(), "Config file not found, using defaults");
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// 加载并验证
    pub fn load_validated(&self) -> Result<AppConfig> {
        let config = self.load()?;
        validate(&config)?;
        Ok(config)
    }

    fn format(&self) -> FileFormat {
        match self.config_path.extension().and_then(|e| e.to_str()) {
            Some("json") => FileFormat::Json,
            _ => FileFormat::Toml,
        }
    }
}

/// 验证配置
pub fn validate(config: &AppConfig) -> Result<()> {
    if config.namespace.trim().is_empty() {
        return Err(anyhow!("namespace must not be empty"));
    }

    if config.smartcitizen.poll_interval_secs == 0 {
        return Err(anyhow!("smartcitizen.poll_interval_secs must be greater than 0"));
    }

    for (name, secs) in [
        ("smartcitizen.request_timeout_secs", config.smartcitizen.request_timeout_secs),
        ("ntfy.request_timeout_secs", config.ntfy.request_timeout_secs),
    ] {
        if secs == 0 {
            return Err(anyhow!("{} must be greater than 0", name));
        }
    }

    if config.ntfy.topic.trim().is_empty() {
        return Err(anyhow!("ntfy.topic must not be empty"));
    }

    for (name, endpoint) in [
        ("smartcitizen.endpoint", &config.smartcitizen.endpoint),
        ("ntfy.endpoint", &config.ntfy.endpoint),
    ] {
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(anyhow!("{} must be an http(s) URL, got {:?}", name, endpoint));
        }
    }

    Ok(())
}

/// 加载 .env 文件；未指定路径时尝试当前目录下的 .env
pub fn load_dotenv(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)
                .map_err(|e| anyhow!("Failed to load {}: {}", path.display(), e))?;
            info!(path = %path.display(), "Loaded environment file");
        }
        None => {
            if let Ok(path) = dotenvy::dotenv() {
                info!(path = %path.display(), "Loaded environment file");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let loader = ConfigLoader::new(temp_dir.path().join("probe.toml"));

        let config = loader.load().unwrap();
        assert_eq!(config.namespace, "smartcitizen");
        assert_eq!(config.smartcitizen.endpoint, "https://api.smartcitizen.me");
    }

    #[test]
    fn test_load_toml_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("probe.toml");
        fs::write(
            &path,
            r#"
namespace = "balcony"

[server]
port = 9100

[smartcitizen]
poll_interval_secs = 60

[ntfy]
topic = "my-kits"
request_timeout_secs = 5

[[sensor_mapping]]
sensor = "SHT31 - Temperature"
metric = "temp"
category = "outdoor"
"#,
        )
        .unwrap();

        let config = ConfigLoader::new(&path).load_validated().unwrap();
        assert_eq!(config.namespace, "balcony");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.smartcitizen.poll_interval_secs, 60);
        assert_eq!(config.smartcitizen.request_timeout_secs, 30);
        assert_eq!(config.ntfy.topic, "my-kits");
        assert_eq!(config.ntfy.request_timeout_secs, 5);

        assert_eq!(config.sensor_mapping.len(), 1);
        let entry = &config.sensor_mapping[0];
        assert_eq!(entry.sensor, "SHT31 - Temperature");
        assert_eq!(entry.metric, "temp");
        assert_eq!(entry.category, "outdoor");
    }

    #[test]
    fn test_load_json_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("probe.json");
        fs::write(&path, r#"{"battery_sensor_name": "Battery", "ntfy": {"topic": "t"}}"#).unwrap();

        let config = ConfigLoader::new(&path).load().unwrap();
        assert_eq!(config.battery_sensor_name, "Battery");
        assert_eq!(config.ntfy.topic, "t");
    }

    #[test]
    fn test_malformed_file_is_error() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("probe.toml");
        fs::write(&path, "namespace = [unterminated").unwrap();

        assert!(ConfigLoader::new(&path).load().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.smartcitizen.poll_interval_secs = 0;
        assert!(validate(&config).is_err());

        let mut config = AppConfig::default();
        config.namespace = " ".to_string();
        assert!(validate(&config).is_err());

        let mut config = AppConfig::default();
        config.ntfy.request_timeout_secs = 0;
        assert!(validate(&config).is_err());

        let mut config = AppConfig::default();
        config.ntfy.topic.clear();
        assert!(validate(&config).is_err());

        let mut config = AppConfig::default();
        config.ntfy.endpoint = "ntfy.sh".to_string();
        assert!(validate(&config).is_err());

        assert!(validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_load_dotenv_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join(".env");
        fs::write(&path, "FLUX_CONFIG_TEST_DOTENV=loaded\n").unwrap();

        load_dotenv(Some(&path)).unwrap();
        assert_eq!(std::env::var("FLUX_CONFIG_TEST_DOTENV").unwrap(), "loaded");

        assert!(load_dotenv(Some(&temp_dir.path().join("missing.env"))).is_err());
    }
}
