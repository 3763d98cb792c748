use thiserror::Error;

/// 指标注册错误
#[derive(Error, Debug)]
pub enum MetricsError {
    /// 同名指标已以其他类型创建
    #[error("Metric {name} already registered as {existing}, requested {requested}")]
    KindMismatch {
        name: String,
        existing: &'static str,
        requested: &'static str,
    },

    /// Prometheus 错误
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// 导出编码错误
    #[error("Export encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// 转换错误
#[derive(Error, Debug)]
pub enum ConvertError {
    /// 数据类型与转换器不匹配
    #[error("Invalid data type for converter {converter}: {tag}")]
    InvalidDataType { converter: String, tag: String },

    /// 缺少必需字段
    #[error("Missing field: {0}")]
    MissingField(String),

    /// 指标错误
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

impl From<prometheus::Error> for ConvertError {
    fn from(err: prometheus::Error) -> Self {
        ConvertError::Metrics(MetricsError::Prometheus(err))
    }
}

/// 告警动作执行错误
#[derive(Error, Debug)]
pub enum ActionError {
    /// 通知入队失败
    #[error("Notification failed: {0}")]
    Notify(#[from] flux_notify::NotifyError),

    /// 其他错误
    #[error("Action failed: {0}")]
    Failed(String),
}

impl ActionError {
    pub fn failed(msg: impl Into<String>) -> Self {
        ActionError::Failed(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, MetricsError>;
