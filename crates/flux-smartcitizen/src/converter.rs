use crate::model::{DeviceDetail, DeviceSensor};
use flux_metrics::{
    CombinedConverter, ConvertError, Converter, MetricRegistry, SensorMetricMapping, Tagged,
};
use std::sync::Arc;

pub const DEVICE_INFO_METRIC: &str = "device_info";
pub const DEVICE_STATE_METRIC: &str = "device_state";
pub const SENSOR_METRIC: &str = "sensor";
pub const SENSOR_INFO_METRIC: &str = "sensor_info";

/// 记录类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Device,
    Sensor,
}

/// 一次抓取得到的遥测记录
#[derive(Debug, Clone)]
pub enum TelemetryRecord {
    Device(DeviceDetail),
    Sensor(DeviceSensor),
}

impl Tagged for TelemetryRecord {
    type Tag = RecordKind;

    fn tag(&self) -> RecordKind {
        match self {
            TelemetryRecord::Device(_) => RecordKind::Device,
            TelemetryRecord::Sensor(_) => RecordKind::Sensor,
        }
    }
}

fn invalid(converter: &str, record: &TelemetryRecord) -> ConvertError {
    ConvertError::InvalidDataType {
        converter: converter.to_string(),
        tag: format!("{:?}", record.tag()),
    }
}

/// 设备信息指标，值固定为 1
pub struct DeviceInfoConverter {
    metric_name: String,
}

impl DeviceInfoConverter {
    pub fn new(metric_name: impl Into<String>) -> Self {
        Self {
            metric_name: metric_name.into(),
        }
    }
}

impl Converter<TelemetryRecord> for DeviceInfoConverter {
    fn name(&self) -> &str {
        "device_info"
    }

    fn matches(&self, tag: RecordKind) -> bool {
        tag == RecordKind::Device
    }

    fn convert(
        &self,
        registry: &MetricRegistry,
        value: &TelemetryRecord,
    ) -> Result<(), ConvertError> {
        let TelemetryRecord::Device(device) = value else {
            return Err(invalid(self.name(), value));
        };

        let gauge = registry.get_or_create_gauge_vec(
            &self.metric_name,
            "Device information",
            &["uuid", "name", "description"],
        )?;
        gauge
            .get_metric_with_label_values(&[
                device.uuid.as_str(),
                device.name.as_str(),
                device.description.as_deref().unwrap_or_default(),
            ])?
            .set(1.0);

        Ok(())
    }
}

/// 设备状态指标
pub struct DeviceStateConverter {
    metric_name: String,
}

impl DeviceStateConverter {
    pub fn new(metric_name: impl Into<String>) -> Self {
        Self {
            metric_name: metric_name.into(),
        }
    }
}

impl Converter<TelemetryRecord> for DeviceStateConverter {
    fn name(&self) -> &str {
        "device_state"
    }

    fn matches(&self, tag: RecordKind) -> bool {
        tag == RecordKind::Device
    }

    fn convert(
        &self,
        registry: &MetricRegistry,
        value: &TelemetryRecord,
    ) -> Result<(), ConvertError> {
        let TelemetryRecord::Device(device) = value else {
            return Err(invalid(self.name(), value));
        };

        let gauge = registry.get_or_create_gauge_vec(
            &self.metric_name,
            "Device state (1 online, 0.5 sleeping, 0 offline, -1 unknown)",
            &["uuid", "name"],
        )?;
        gauge
            .get_metric_with_label_values(&[device.uuid.as_str(), device.name.as_str()])?
            .set(device.state_value());

        Ok(())
    }
}

/// 传感器读数指标
///
/// 已映射的传感器写入 `{category}_{metric}`，其余写入通用指标名。
pub struct DeviceSensorConverter {
    metric_name: String,
    mapping: Arc<SensorMetricMapping>,
}

impl DeviceSensorConverter {
    pub fn new(metric_name: impl Into<String>, mapping: Arc<SensorMetricMapping>) -> Self {
        Self {
            metric_name: metric_name.into(),
            mapping,
        }
    }
}

impl Converter<TelemetryRecord> for DeviceSensorConverter {
    fn name(&self) -> &str {
        "device_sensor"
    }

    fn matches(&self, tag: RecordKind) -> bool {
        tag == RecordKind::Sensor
    }

    fn convert(
        &self,
        registry: &MetricRegistry,
        value: &TelemetryRecord,
    ) -> Result<(), ConvertError> {
        let TelemetryRecord::Sensor(sensor) = value else {
            return Err(invalid(self.name(), value));
        };

        let reading = sensor
            .value
            .ok_or_else(|| ConvertError::MissingField(format!("value of sensor {}", sensor.name)))?;

        let metric_name = self
            .mapping
            .get(&sensor.name)
            .map(|item| item.metric_name())
            .unwrap_or_else(|| self.metric_name.clone());

        let gauge = registry.get_or_create_gauge_vec(
            &metric_name,
            "Current sensor value",
            &["id", "uuid", "name"],
        )?;
        let id = sensor.id.to_string();
        gauge
            .get_metric_with_label_values(&[
                id.as_str(),
                sensor.device_uuid.as_str(),
                sensor.name.as_str(),
            ])?
            .set(reading);

        Ok(())
    }
}

/// 传感器信息指标，值固定为 1
pub struct DeviceSensorInfoConverter {
    metric_name: String,
}

impl DeviceSensorInfoConverter {
    pub fn new(metric_name: impl Into<String>) -> Self {
        Self {
            metric_name: metric_name.into(),
        }
    }
}

impl Converter<TelemetryRecord> for DeviceSensorInfoConverter {
    fn name(&self) -> &str {
        "sensor_info"
    }

    fn matches(&self, tag: RecordKind) -> bool {
        tag == RecordKind::Sensor
    }

    fn convert(
        &self,
        registry: &MetricRegistry,
        value: &TelemetryRecord,
    ) -> Result<(), ConvertError> {
        let TelemetryRecord::Sensor(sensor) = value else {
            return Err(invalid(self.name(), value));
        };

        let gauge = registry.get_or_create_gauge_vec(
            &self.metric_name,
            "Sensor information",
            &["id", "uuid", "name", "unit", "description"],
        )?;
        let id = sensor.id.to_string();
        gauge
            .get_metric_with_label_values(&[
                id.as_str(),
                sensor.device_uuid.as_str(),
                sensor.name.as_str(),
                sensor.unit.as_str(),
                sensor.description.as_str(),
            ])?
            .set(1.0);

        Ok(())
    }
}

/// 默认转换器组合
pub fn default_converter(mapping: Arc<SensorMetricMapping>) -> CombinedConverter<TelemetryRecord> {
    CombinedConverter::new()
        .with(DeviceInfoConverter::new(DEVICE_INFO_METRIC))
        .with(DeviceStateConverter::new(DEVICE_STATE_METRIC))
        .with(DeviceSensorConverter::new(SENSOR_METRIC, mapping))
        .with(DeviceSensorInfoConverter::new(SENSOR_INFO_METRIC))
}
