use std::io;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// 关闭信号类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGTERM - 优雅关闭
    Term,

    /// SIGINT - Ctrl+C
    Interrupt,

    /// 手动触发
    Manual,
}

/// 信号处理器
///
/// 收到信号后取消共享的 [`CancellationToken`]，所有持有子令牌的任务随之退出。
#[derive(Clone, Default)]
pub struct SignalHandler {
    token: CancellationToken,
}

impl SignalHandler {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// 共享的取消令牌
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    /// 等待系统信号并取消令牌；令牌被手动取消时返回 Manual
    #[cfg(unix)]
    pub async fn wait_for_system_signal(&self) -> io::Result<ShutdownSignal> {
        use signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        let received = tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
                ShutdownSignal::Term
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
                ShutdownSignal::Interrupt
            }
            _ = self.token.cancelled() => ShutdownSignal::Manual,
        };

        self.token.cancel();
        Ok(received)
    }

    /// 等待系统信号（Windows 版本）
    #[cfg(not(unix))]
    pub async fn wait_for_system_signal(&self) -> io::Result<ShutdownSignal> {
        let received = tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                info!("Received Ctrl+C");
                ShutdownSignal::Interrupt
            }
            _ = self.token.cancelled() => ShutdownSignal::Manual,
        };

        self.token.cancel();
        Ok(received)
    }

    /// 手动触发关闭
    pub fn trigger_shutdown(&self) {
        info!("Manual shutdown triggered");
        self.token.cancel();
    }
}
