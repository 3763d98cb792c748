use crate::alert::{AlertRule, Metric};
use crate::registry::MetricRegistry;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, error, info, warn};

/// 规则触发计数器，标签 `rule`
pub const RULES_FIRED_METRIC: &str = "alert_rules_fired_total";
pub const RULES_FIRED_HELP: &str = "Total alert rule firings";
/// 动作失败计数器，标签 `rule`
pub const ACTION_ERRORS_METRIC: &str = "alert_action_errors_total";
pub const ACTION_ERRORS_HELP: &str = "Total failed alert rule actions";

/// 告警规则引擎
///
/// 规则按 ID 存储；评估时先在读锁下复制匹配规则，
/// 释放锁后再执行条件与动作，单条规则的失败不影响其他规则。
pub struct AlertingEngine {
    rules: RwLock<HashMap<String, AlertRule>>,
    registry: Option<Arc<MetricRegistry>>,
}

impl AlertingEngine {
    pub fn new() -> Self {
        Self {
            rules: RwLock::new(HashMap::new()),
            registry: None,
        }
    }

    /// 将触发次数和动作失败次数记录到注册表
    pub fn with_registry(mut self, registry: Arc<MetricRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// 添加规则，相同 ID 会替换旧规则
    pub fn add_rule(&self, rule: AlertRule) {
        info!(
            rule_id = %rule.id,
            rule_name = %rule.name,
            metric = %rule.metric_name,
            "Adding alert rule"
        );
        self.rules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(rule.id.clone(), rule);
    }

    pub fn remove_rule(&self, rule_id: &str) {
        if self
            .rules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(rule_id)
            .is_some()
        {
            info!(rule_id = %rule_id, "Removed alert rule");
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// 评估单个指标
    pub fn evaluate(&self, metric: &Metric) {
        let candidates: Vec<AlertRule> = {
            let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);
            rules
                .values()
                .filter(|rule| rule.metric_name == metric.name)
                .cloned()
                .collect()
        };

        for rule in candidates {
            if !rule.enabled {
                debug!(rule_id = %rule.id, rule_name = %rule.name, "Skipping disabled rule");
                continue;
            }

            if !(rule.condition)(metric) {
                debug!(
                    rule_id = %rule.id,
                    rule_name = %rule.name,
                    value = metric.value,
                    "Rule condition not met"
                );
                continue;
            }

            info!(
                rule_id = %rule.id,
                rule_name = %rule.name,
                value = metric.value,
                "Rule condition met, executing action"
            );
            self.record(RULES_FIRED_METRIC, RULES_FIRED_HELP, &rule);

            if let Err(e) = (rule.action)(metric, &rule) {
                error!(
                    rule_id = %rule.id,
                    rule_name = %rule.name,
                    error = %e,
                    "Failed to execute rule action"
                );
                self.record(ACTION_ERRORS_METRIC, ACTION_ERRORS_HELP, &rule);
            }
        }
    }

    /// 依次评估一批指标
    pub fn evaluate_all<'a, I>(&self, metrics: I)
    where
        I: IntoIterator<Item = &'a Metric>,
    {
        for metric in metrics {
            self.evaluate(metric);
        }
    }

    fn record(&self, name: &str, help: &str, rule: &AlertRule) {
        let Some(registry) = &self.registry else {
            return;
        };

        match registry.get_or_create_counter_vec(name, help, &["rule"]) {
            Ok(counter) => counter.with_label_values(&[rule.id.as_str()]).inc(),
            Err(e) => warn!(metric = %name, error = %e, "Failed to record alerting metric"),
        }
    }
}

impl Default for AlertingEngine {
    fn default() -> Self {
        Self::new()
    }
}
