pub mod global;
pub mod loader;

pub use global::{AppConfig, NtfyConfig, SensorMappingEntry, ServerConfig, SmartCitizenConfig};
pub use loader::{load_dotenv, validate, ConfigLoader, ENV_PREFIX};
