use crate::alert::{AlertRule, Metric};
use crate::error::ActionError;
use flux_notify::{NotificationQueue, NotifyMessage};
use std::sync::Arc;
use tracing::info;

/// 规则触发时执行的动作
pub type RuleAction = Arc<dyn Fn(&Metric, &AlertRule) -> Result<(), ActionError> + Send + Sync>;

/// 记录告警日志
pub fn log_action() -> RuleAction {
    Arc::new(|metric: &Metric, rule: &AlertRule| {
        info!(
            rule_id = %rule.id,
            rule_name = %rule.name,
            metric = %metric.name,
            value = metric.value,
            unit = %metric.unit,
            "Alert triggered"
        );
        Ok(())
    })
}

pub fn no_op_action() -> RuleAction {
    Arc::new(|_: &Metric, _: &AlertRule| Ok(()))
}

/// 依次执行多个动作，遇到第一个错误即停止并返回
pub fn multi_action(actions: Vec<RuleAction>) -> RuleAction {
    Arc::new(move |metric: &Metric, rule: &AlertRule| {
        for action in &actions {
            action(metric, rule)?;
        }
        Ok(())
    })
}

/// 发送通知，标题为 `Alert: {规则名}`
pub fn notify_action(
    queue: NotificationQueue,
    topic: impl Into<String>,
    message: impl Into<String>,
) -> RuleAction {
    let topic = topic.into();
    let message = message.into();

    Arc::new(move |_: &Metric, rule: &AlertRule| {
        let notification =
            NotifyMessage::new(topic.clone(), format!("Alert: {}", rule.name), message.clone());
        queue.enqueue(notification)?;
        Ok(())
    })
}
