use crate::message::NotifyMessage;
use async_trait::async_trait;
use thiserror::Error;

/// 通知错误
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Notification rejected with status code: {0}")]
    Status(u16),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Notification queue is full")]
    QueueFull,

    #[error("Notification queue is closed")]
    QueueClosed,
}

/// 通知器 trait
#[async_trait]
pub trait Notifier: Send + Sync {
    /// 发送通知
    async fn send(&self, message: &NotifyMessage) -> Result<(), NotifyError>;

    /// 通知器名称
    fn name(&self) -> &str;
}
