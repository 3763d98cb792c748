use async_trait::async_trait;
use flux_metrics::{AlertingEngine, Metric, MetricRegistry, RULES_FIRED_HELP, RULES_FIRED_METRIC};
use flux_notify::{Notifier, NotifyError, NotifyManager, NotifyMessage};
use flux_probe::default_rules;
use flux_smartcitizen::DEVICE_STATE_METRIC_NAME;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct CapturingNotifier {
    sent: Mutex<Vec<NotifyMessage>>,
}

#[async_trait]
impl Notifier for CapturingNotifier {
    async fn send(&self, message: &NotifyMessage) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "capturing"
    }
}

/// 评估给定指标并返回投递的通知
async fn evaluate(metrics: Vec<Metric>) -> (Vec<NotifyMessage>, Arc<MetricRegistry>) {
    let notifier = Arc::new(CapturingNotifier::default());
    let (manager, queue) = NotifyManager::new(notifier.clone(), 16);
    let cancel = CancellationToken::new();
    let dispatcher = tokio::spawn(manager.run(cancel.clone()));

    let registry = Arc::new(MetricRegistry::new("smartcitizen"));
    let engine = AlertingEngine::new().with_registry(registry.clone());
    for rule in default_rules("Battery SCK", &queue, "kits") {
        engine.add_rule(rule);
    }
    engine.evaluate_all(&metrics);

    cancel.cancel();
    dispatcher.await.unwrap();

    let sent = notifier.sent.lock().unwrap().clone();
    (sent, registry)
}

fn fired(registry: &MetricRegistry, rule: &str) -> f64 {
    registry
        .get_or_create_counter_vec(RULES_FIRED_METRIC, RULES_FIRED_HELP, &["rule"])
        .unwrap()
        .with_label_values(&[rule])
        .get()
}

#[tokio::test]
async fn test_low_battery_sends_one_notification() {
    let (sent, registry) = evaluate(vec![Metric::new("Battery SCK", 12.3).with_unit("%")]).await;

    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].topic, "kits");
    assert_eq!(sent[0].title, "Alert: Battery Level Low");
    assert_eq!(sent[0].message, "Battery level is low");

    assert_eq!(fired(&registry, "battery_low"), 1.0);
    assert_eq!(fired(&registry, "battery_ok"), 0.0);
    assert_eq!(fired(&registry, "battery_critical_low"), 0.0);
}

#[tokio::test]
async fn test_healthy_battery_only_logs() {
    let (sent, registry) = evaluate(vec![Metric::new("Battery SCK", 16.0)]).await;

    assert!(sent.is_empty());
    assert_eq!(fired(&registry, "battery_ok"), 1.0);
}

#[tokio::test]
async fn test_critical_battery() {
    let (sent, registry) = evaluate(vec![Metric::new("Battery SCK", 8.0)]).await;

    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].message, "Battery level is critically low");
    assert_eq!(fired(&registry, "battery_critical_low"), 1.0);
    assert_eq!(fired(&registry, "battery_low"), 0.0);
}

#[tokio::test]
async fn test_threshold_boundaries() {
    let (sent, registry) = evaluate(vec![
        Metric::new("Battery SCK", 15.0),
        Metric::new("Battery SCK", 10.0),
    ])
    .await;

    assert_eq!(fired(&registry, "battery_ok"), 1.0);
    assert_eq!(fired(&registry, "battery_low"), 1.0);
    assert_eq!(fired(&registry, "battery_critical_low"), 0.0);
    assert_eq!(sent.len(), 1);
}

#[tokio::test]
async fn test_device_state_rules() {
    let (sent, registry) = evaluate(vec![
        Metric::new(DEVICE_STATE_METRIC_NAME, 1.0),
        Metric::new(DEVICE_STATE_METRIC_NAME, 0.0),
        Metric::new(DEVICE_STATE_METRIC_NAME, 0.5),
    ])
    .await;

    assert_eq!(fired(&registry, "device_online"), 1.0);
    assert_eq!(fired(&registry, "device_offline"), 1.0);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "Alert: Device Offline");
}

#[tokio::test]
async fn test_other_sensors_are_ignored() {
    let (sent, registry) = evaluate(vec![Metric::new("SHT31 - Temperature", 5.0)]).await;

    assert!(sent.is_empty());
    for rule in ["battery_ok", "battery_low", "battery_critical_low", "device_offline"] {
        assert_eq!(fired(&registry, rule), 0.0);
    }
}
