use flux_metrics::{
    log_action, multi_action, notify_action, threshold_below, threshold_equals, threshold_range,
    AlertRule, Metric, RuleCondition,
};
use flux_notify::NotificationQueue;
use flux_smartcitizen::model::{DEVICE_STATE_OFFLINE, DEVICE_STATE_ONLINE};
use flux_smartcitizen::DEVICE_STATE_METRIC_NAME;
use std::sync::Arc;

pub const LOW_BATTERY_THRESHOLD: f64 = 15.0;
pub const CRITICAL_BATTERY_THRESHOLD: f64 = 10.0;

fn at_least(threshold: f64) -> RuleCondition {
    Arc::new(move |metric: &Metric| metric.value >= threshold)
}

/// 默认告警规则：电池电量三档加设备在线/离线
pub fn default_rules(
    battery_sensor_name: &str,
    queue: &NotificationQueue,
    topic: &str,
) -> Vec<AlertRule> {
    let notify = |message: &str| {
        multi_action(vec![
            log_action(),
            notify_action(queue.clone(), topic, message),
        ])
    };

    vec![
        AlertRule::new(
            "battery_ok",
            "Battery Level OK",
            battery_sensor_name,
            at_least(LOW_BATTERY_THRESHOLD),
            log_action(),
        ),
        AlertRule::new(
            "battery_low",
            "Battery Level Low",
            battery_sensor_name,
            threshold_range(CRITICAL_BATTERY_THRESHOLD, LOW_BATTERY_THRESHOLD),
            notify("Battery level is low"),
        ),
        AlertRule::new(
            "battery_critical_low",
            "Battery Level Critically Low",
            battery_sensor_name,
            threshold_below(CRITICAL_BATTERY_THRESHOLD),
            notify("Battery level is critically low"),
        ),
        AlertRule::new(
            "device_online",
            "Device Online",
            DEVICE_STATE_METRIC_NAME,
            threshold_equals(DEVICE_STATE_ONLINE),
            log_action(),
        ),
        AlertRule::new(
            "device_offline",
            "Device Offline",
            DEVICE_STATE_METRIC_NAME,
            threshold_equals(DEVICE_STATE_OFFLINE),
            notify("Device is offline"),
        ),
    ]
}
