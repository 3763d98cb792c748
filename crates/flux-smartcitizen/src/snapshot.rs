use crate::model::{parse_time_to_unix, DeviceDetail, DeviceSensor};
use flux_metrics::Metric;
use tracing::debug;

/// 设备状态快照的指标名
pub const DEVICE_STATE_METRIC_NAME: &str = "Device State";

/// 传感器读数快照，名称为传感器名；没有读数时返回 None
pub fn sensor_metric(sensor: &DeviceSensor) -> Option<Metric> {
    let Some(value) = sensor.value else {
        debug!(sensor = %sensor.name, "Sensor has no reading, skipping snapshot");
        return None;
    };

    Some(
        Metric::new(sensor.name.clone(), value)
            .with_description(sensor.description.clone())
            .with_unit(sensor.unit.clone())
            .with_timestamp(sensor.to_unix()),
    )
}

pub fn device_state_metric(device: &DeviceDetail) -> Metric {
    Metric::new(DEVICE_STATE_METRIC_NAME, device.state_value())
        .with_description(format!("Device state: {}", device.state))
        .with_unit("state")
        .with_timestamp(device.updated_at.as_deref().map(parse_time_to_unix).unwrap_or(0))
}

/// 一台设备的全部告警快照：每个有读数的传感器一条，加设备状态一条
pub fn device_metrics(device: &DeviceDetail) -> Vec<Metric> {
    device
        .data
        .sensors
        .iter()
        .filter_map(sensor_metric)
        .chain(std::iter::once(device_state_metric(device)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_metrics() {
        let mut device = DeviceDetail {
            uuid: "dev-1".to_string(),
            state: "offline".to_string(),
            ..Default::default()
        };
        device.data.sensors = vec![
            DeviceSensor {
                name: "Battery SCK".to_string(),
                unit: "%".to_string(),
                value: Some(12.3),
                updated_at: Some("2024-01-01T00:00:00Z".to_string()),
                ..Default::default()
            },
            DeviceSensor {
                name: "SHT31 - Humidity".to_string(),
                value: None,
                ..Default::default()
            },
        ];

        let metrics = device_metrics(&device);
        assert_eq!(metrics.len(), 2);

        assert_eq!(metrics[0].name, "Battery SCK");
        assert_eq!(metrics[0].value, 12.3);
        assert_eq!(metrics[0].unit, "%");
        assert_eq!(metrics[0].timestamp, 1_704_067_200);

        assert_eq!(metrics[1].name, DEVICE_STATE_METRIC_NAME);
        assert_eq!(metrics[1].value, 0.0);
        assert_eq!(metrics[1].description, "Device state: offline");
    }
}
