use chrono::DateTime;
use serde::{Deserialize, Deserializer, Serialize};

/// 设备状态数值
pub const DEVICE_STATE_ONLINE: f64 = 1.0;
pub const DEVICE_STATE_OFFLINE: f64 = 0.0;
pub const DEVICE_STATE_SLEEPING: f64 = 0.5;
pub const DEVICE_STATE_UNKNOWN: f64 = -1.0;

/// 设备状态字符串映射为数值
pub fn state_value(state: &str) -> f64 {
    match state {
        "online" | "has_published" => DEVICE_STATE_ONLINE,
        "offline" => DEVICE_STATE_OFFLINE,
        "sleeping" => DEVICE_STATE_SLEEPING,
        _ => DEVICE_STATE_UNKNOWN,
    }
}

/// 解析 RFC3339 时间为 Unix 秒，失败返回 0
pub fn parse_time_to_unix(time: &str) -> i64 {
    DateTime::parse_from_rfc3339(time)
        .map(|t| t.timestamp())
        .unwrap_or(0)
}

/// API 中的 `null` 字符串字段按缺省值处理
fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub city: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
}

/// 当前认证用户
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: i64,
    #[serde(deserialize_with = "null_to_default")]
    pub uuid: String,
    #[serde(deserialize_with = "null_to_default")]
    pub username: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub url: Option<String>,
    pub location: Location,
    pub devices: Vec<UserDevice>,
}

/// 用户设备摘要
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDevice {
    pub id: i64,
    #[serde(deserialize_with = "null_to_default")]
    pub uuid: String,
    #[serde(deserialize_with = "null_to_default")]
    pub name: String,
    pub description: Option<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub state: String,
    pub kit_id: Option<i64>,
    pub mac_address: Option<String>,
    pub added_at: Option<String>,
    pub updated_at: Option<String>,
    pub last_reading_at: Option<String>,
}

/// 设备详情
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceDetail {
    pub id: i64,
    #[serde(deserialize_with = "null_to_default")]
    pub uuid: String,
    #[serde(deserialize_with = "null_to_default")]
    pub name: String,
    pub description: Option<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub state: String,
    pub system_tags: Vec<String>,
    pub user_tags: Vec<String>,
    pub data: DeviceData,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub last_reading_at: Option<String>,
}

impl DeviceDetail {
    pub fn state_value(&self) -> f64 {
        state_value(&self.state)
    }

    pub fn sensor_by_name(&self, name: &str) -> Option<&DeviceSensor> {
        self.data.sensors.iter().find(|s| s.name == name)
    }

    /// 为传感器补全所属设备 UUID
    pub fn attach_sensors(&mut self) {
        for sensor in &mut self.data.sensors {
            if sensor.device_uuid.is_empty() {
                sensor.device_uuid = self.uuid.clone();
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceData {
    pub firmware: Option<String>,
    pub location: DeviceLocation,
    pub sensors: Vec<DeviceSensor>,
    pub recorded_at: Option<String>,
    pub added_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub ip: Option<String>,
    pub exposure: Option<String>,
    pub elevation: Option<f64>,
    pub geohash: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
}

/// 传感器读数
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSensor {
    pub id: i64,
    #[serde(deserialize_with = "null_to_default")]
    pub uuid: String,
    #[serde(deserialize_with = "null_to_default")]
    pub name: String,
    #[serde(deserialize_with = "null_to_default")]
    pub description: String,
    #[serde(deserialize_with = "null_to_default")]
    pub unit: String,
    pub value: Option<f64>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,

    /// 所属设备 UUID，由抓取流程填充
    #[serde(skip)]
    pub device_uuid: String,
}

impl DeviceSensor {
    pub fn to_unix(&self) -> i64 {
        self.updated_at.as_deref().map(parse_time_to_unix).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_value_mapping() {
        assert_eq!(state_value("online"), 1.0);
        assert_eq!(state_value("has_published"), 1.0);
        assert_eq!(state_value("offline"), 0.0);
        assert_eq!(state_value("sleeping"), 0.5);
        assert_eq!(state_value("never_published"), -1.0);
        assert_eq!(state_value(""), -1.0);
    }

    #[test]
    fn test_parse_time_to_unix() {
        assert_eq!(parse_time_to_unix("2024-01-01T00:00:00Z"), 1_704_067_200);
        assert_eq!(parse_time_to_unix("2024-01-01T02:00:00+02:00"), 1_704_067_200);
        assert_eq!(parse_time_to_unix("not a time"), 0);
    }

    #[test]
    fn test_deserialize_device_detail() {
        let json = r#"{
            "id": 16549,
            "uuid": "d3c9a5b2",
            "name": "Balcony kit",
            "description": null,
            "state": "has_published",
            "system_tags": ["online", "outdoor"],
            "data": {
                "firmware": "0.9.8",
                "location": {"city": "Barcelona", "latitude": 41.38},
                "sensors": [
                    {"id": 10, "uuid": "s-10", "name": "Battery SCK", "description": "Battery",
                     "unit": "%", "value": 12.3, "updated_at": "2024-01-01T00:00:00Z"},
                    {"id": 55, "uuid": "s-55", "name": "SHT31 - Temperature", "unit": "ºC", "value": null}
                ]
            }
        }"#;

        let mut device: DeviceDetail = serde_json::from_str(json).unwrap();
        device.attach_sensors();

        assert_eq!(device.state_value(), 1.0);
        assert_eq!(device.data.sensors.len(), 2);
        let battery = device.sensor_by_name("Battery SCK").unwrap();
        assert_eq!(battery.value, Some(12.3));
        assert_eq!(battery.to_unix(), 1_704_067_200);
        assert_eq!(battery.device_uuid, "d3c9a5b2");
        assert_eq!(device.sensor_by_name("SHT31 - Temperature").unwrap().value, None);
    }
}
