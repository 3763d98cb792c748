use flux_logging::LogConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 探针全局配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 指标命名空间
    pub namespace: String,
    /// 电池传感器名称，用于默认告警规则
    pub battery_sensor_name: String,
    /// 可选的 .env 文件路径
    pub dotenv_path: Option<PathBuf>,
    pub logging: LogConfig,
    pub server: ServerConfig,
    pub smartcitizen: SmartCitizenConfig,
    pub ntfy: NtfyConfig,
    /// 额外的传感器映射，覆盖同名默认条目
    pub sensor_mapping: Vec<SensorMappingEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            namespace: "smartcitizen".to_string(),
            battery_sensor_name: "Battery SCK".to_string(),
            dotenv_path: None,
            logging: LogConfig::default(),
            server: ServerConfig::default(),
            smartcitizen: SmartCitizenConfig::default(),
            ntfy: NtfyConfig::default(),
            sensor_mapping: Vec::new(),
        }
    }
}

/// HTTP 服务配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// SmartCitizen API 配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SmartCitizenConfig {
    pub endpoint: String,
    pub api_version: String,
    pub username_env: String,
    pub password_env: String,
    pub token_env: String,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for SmartCitizenConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.smartcitizen.me".to_string(),
            api_version: "v0".to_string(),
            username_env: "SMARTCITIZEN_USERNAME".to_string(),
            password_env: "SMARTCITIZEN_PASSWORD".to_string(),
            token_env: "SMARTCITIZEN_TOKEN".to_string(),
            poll_interval_secs: 15,
            request_timeout_secs: 30,
        }
    }
}

/// ntfy 通知配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NtfyConfig {
    pub endpoint: String,
    pub topic: String,
    pub token_env: String,
    pub request_timeout_secs: u64,
}

impl Default for NtfyConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://ntfy.sh".to_string(),
            topic: "smartcitizen-alerts".to_string(),
            token_env: "NTFY_TOKEN".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// 传感器映射条目，指标名为 `{category}_{metric}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SensorMappingEntry {
    pub sensor: String,
    pub metric: String,
    pub category: String,
}
