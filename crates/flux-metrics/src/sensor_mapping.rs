use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// 传感器映射条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricMappingItem {
    pub metric: String,
    pub category: String,
}

impl MetricMappingItem {
    pub fn new(metric: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            category: category.into(),
        }
    }

    /// 规范指标名：`{category}_{metric}`
    pub fn metric_name(&self) -> String {
        format!("{}_{}", self.category, self.metric)
    }
}

/// SmartCitizen 套件常见传感器
const DEFAULT_MAPPINGS: &[(&str, &str, &str)] = &[
    ("Battery SCK", "battery_level", "power"),
    ("SHT31 - Temperature", "temperature", "environment"),
    ("SHT31 - Humidity", "humidity", "environment"),
    ("BMP280 - Barometric Pressure", "pressure", "environment"),
    ("BH1730FVC - Light", "light", "environment"),
    ("ICS43432 - Noise", "noise_level", "sound"),
    ("AMS CCS811 - eCO2", "eco2", "air_quality"),
    ("AMS CCS811 - TVOC", "tvoc", "air_quality"),
    ("Sensirion SCD30 - CO2", "co2", "air_quality"),
    ("Sensirion SEN5X - PM1.0", "pm1", "air_quality"),
    ("Sensirion SEN5X - PM2.5", "pm25", "air_quality"),
    ("Sensirion SEN5X - PM10", "pm10", "air_quality"),
];

/// 传感器显示名到指标名的映射表
///
/// 同一物理量在不同固件上的传感器名归一到同一个指标名。
#[derive(Debug, Default)]
pub struct SensorMetricMapping {
    items: RwLock<HashMap<String, MetricMappingItem>>,
}

impl SensorMetricMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置常见传感器映射
    pub fn with_defaults() -> Self {
        let mapping = Self::new();
        for (sensor, metric, category) in DEFAULT_MAPPINGS {
            mapping.add(*sensor, MetricMappingItem::new(*metric, *category));
        }
        mapping
    }

    pub fn add(&self, sensor_name: impl Into<String>, item: MetricMappingItem) {
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(sensor_name.into(), item);
    }

    pub fn get(&self, sensor_name: &str) -> Option<MetricMappingItem> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(sensor_name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_metric_name() {
        let item = MetricMappingItem::new("temperature", "environment");
        assert_eq!(item.metric_name(), "environment_temperature");
    }

    #[test]
    fn test_defaults_and_unmapped() {
        let mapping = SensorMetricMapping::with_defaults();

        let battery = mapping.get("Battery SCK").unwrap();
        assert_eq!(battery.metric_name(), "power_battery_level");
        assert!(mapping.get("Unknown sensor").is_none());
    }

    #[test]
    fn test_add_overrides_entry() {
        let mapping = SensorMetricMapping::with_defaults();
        let before = mapping.len();

        mapping.add("Battery SCK", MetricMappingItem::new("battery", "device"));

        assert_eq!(mapping.len(), before);
        assert_eq!(mapping.get("Battery SCK").unwrap().metric_name(), "device_battery");
    }

    #[test]
    fn test_concurrent_add_and_get() {
        let mapping = Arc::new(SensorMetricMapping::new());

        let writers: Vec<_> = (0..4)
            .map(|i| {
                let mapping = mapping.clone();
                thread::spawn(move || {
                    for j in 0..50 {
                        mapping.add(
                            format!("sensor-{}-{}", i, j),
                            MetricMappingItem::new("value", "test"),
                        );
                        let _ = mapping.get("sensor-0-0");
                    }
                })
            })
            .collect();

        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(mapping.len(), 200);
    }
}
