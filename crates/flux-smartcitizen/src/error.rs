use thiserror::Error;

/// SmartCitizen 访问错误
#[derive(Error, Debug)]
pub enum SmartCitizenError {
    /// 未认证
    #[error("No active session, please authenticate first")]
    NoSession,

    /// 凭据缺失或无效
    #[error("Credential error: {0}")]
    Credential(String),

    /// 认证失败
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// 非 200 响应
    #[error("Request to {endpoint} failed with status code: {status}")]
    Status { endpoint: String, status: u16 },

    /// HTTP 错误
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// 请求被取消
    #[error("Request cancelled")]
    Cancelled,

    /// 指标错误
    #[error(transparent)]
    Metrics(#[from] flux_metrics::MetricsError),
}

pub type Result<T> = std::result::Result<T, SmartCitizenError>;
