pub mod converter;
pub mod credential;
pub mod error;
pub mod exporter;
pub mod instrument;
pub mod model;
pub mod provider;
pub mod snapshot;

pub use converter::{
    default_converter, DeviceInfoConverter, DeviceSensorConverter, DeviceSensorInfoConverter,
    DeviceStateConverter, RecordKind, TelemetryRecord,
};
pub use credential::{UserCredential, UserCredentialEnvProvider};
pub use error::{Result, SmartCitizenError};
pub use exporter::{ApiExporter, CycleSummary, UserDeviceCollection};
pub use model::{state_value, DeviceDetail, DeviceSensor, User, UserDevice};
pub use provider::{HttpProvider, HttpProviderConfig, TelemetryProvider};
pub use snapshot::{device_metrics, device_state_metric, sensor_metric, DEVICE_STATE_METRIC_NAME};
