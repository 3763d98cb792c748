use crate::action::RuleAction;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// 浮点比较默认容差
pub const DEFAULT_FLOAT_TOLERANCE: f64 = 0.0001;

/// 告警评估用的指标快照，每个轮询周期重新构建
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub description: String,
    pub value: f64,
    pub unit: String,
    pub timestamp: i64,
}

impl Metric {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            value,
            unit: String::new(),
            timestamp: 0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// 规则条件
pub type RuleCondition = Arc<dyn Fn(&Metric) -> bool + Send + Sync>;

/// 告警规则
#[derive(Clone)]
pub struct AlertRule {
    pub id: String,
    pub name: String,
    pub metric_name: String,
    pub enabled: bool,
    pub condition: RuleCondition,
    pub action: RuleAction,
}

impl AlertRule {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        metric_name: impl Into<String>,
        condition: RuleCondition,
        action: RuleAction,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            metric_name: metric_name.into(),
            enabled: true,
            condition,
            action,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

impl fmt::Debug for AlertRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertRule")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("metric_name", &self.metric_name)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

pub fn threshold_above(threshold: f64) -> RuleCondition {
    Arc::new(move |metric: &Metric| metric.value > threshold)
}

pub fn threshold_below(threshold: f64) -> RuleCondition {
    Arc::new(move |metric: &Metric| metric.value < threshold)
}

/// 闭区间 `[min, max]`
pub fn threshold_between(min: f64, max: f64) -> RuleCondition {
    Arc::new(move |metric: &Metric| metric.value >= min && metric.value <= max)
}

/// 半开区间 `[min, max)`
pub fn threshold_range(min: f64, max: f64) -> RuleCondition {
    Arc::new(move |metric: &Metric| metric.value >= min && metric.value < max)
}

/// 带容差的相等判断，容差为 `DEFAULT_FLOAT_TOLERANCE`
pub fn threshold_equals(target: f64) -> RuleCondition {
    Arc::new(move |metric: &Metric| float_equals(metric.value, target, DEFAULT_FLOAT_TOLERANCE))
}

pub fn float_equals(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}
