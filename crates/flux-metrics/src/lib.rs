pub mod action;
pub mod alert;
pub mod converter;
pub mod engine;
pub mod error;
pub mod registry;
pub mod sensor_mapping;

pub use action::{log_action, multi_action, no_op_action, notify_action, RuleAction};
pub use alert::{
    float_equals, threshold_above, threshold_below, threshold_between, threshold_equals,
    threshold_range, AlertRule, Metric, RuleCondition, DEFAULT_FLOAT_TOLERANCE,
};
pub use converter::{CombinedConverter, Converter, Tagged};
pub use engine::{
    AlertingEngine, ACTION_ERRORS_HELP, ACTION_ERRORS_METRIC, RULES_FIRED_HELP, RULES_FIRED_METRIC,
};
pub use error::{ActionError, ConvertError, MetricsError, Result};
pub use registry::MetricRegistry;
pub use sensor_mapping::{MetricMappingItem, SensorMetricMapping};
