use crate::signal::SignalHandler;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tracing::{error, info, warn};

/// 关闭结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// 按时结束的任务数
    pub completed: usize,
    /// 超时后被中止的任务名
    pub timed_out: Vec<String>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.timed_out.is_empty()
    }
}

/// 关闭协调器
///
/// 跟踪后台任务；取消令牌触发后在统一的期限内等待它们结束。
pub struct ShutdownCoordinator {
    signal_handler: SignalHandler,
    tasks: Vec<(String, JoinHandle<()>)>,
    shutdown_timeout: Duration,
}

impl ShutdownCoordinator {
    pub fn builder() -> ShutdownCoordinatorBuilder {
        ShutdownCoordinatorBuilder::new()
    }

    /// 跟踪一个已启动的任务
    pub fn track(&mut self, name: impl Into<String>, handle: JoinHandle<()>) {
        self.tasks.push((name.into(), handle));
    }

    /// 启动并跟踪任务
    pub fn spawn<F>(&mut self, name: impl Into<String>, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.track(name, tokio::spawn(future));
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// 等待取消，然后在超时内等待所有任务结束，超时的任务被中止
    pub async fn run(self) -> ShutdownReport {
        self.signal_handler.token().cancelled().await;
        info!(tasks = self.tasks.len(), "Shutdown started, waiting for tasks");

        let start = std::time::Instant::now();
        let deadline = Instant::now() + self.shutdown_timeout;
        let mut report = ShutdownReport::default();

        for (name, mut handle) in self.tasks {
            match timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => report.completed += 1,
                Ok(Err(e)) => {
                    error!(task = %name, error = %e, "Task ended abnormally");
                    report.completed += 1;
                }
                Err(_) => {
                    warn!(
                        task = %name,
                        timeout = ?self.shutdown_timeout,
                        "Task did not stop in time, aborting"
                    );
                    handle.abort();
                    report.timed_out.push(name);
                }
            }
        }

        info!(elapsed = ?start.elapsed(), clean = report.is_clean(), "Graceful shutdown complete");
        report
    }
}

/// 关闭协调器构建器
pub struct ShutdownCoordinatorBuilder {
    signal_handler: Option<SignalHandler>,
    shutdown_timeout: Duration,
}

impl ShutdownCoordinatorBuilder {
    pub fn new() -> Self {
        Self {
            signal_handler: None,
            shutdown_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_signal_handler(mut self, handler: SignalHandler) -> Self {
        self.signal_handler = Some(handler);
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn build(self) -> ShutdownCoordinator {
        ShutdownCoordinator {
            signal_handler: self.signal_handler.unwrap_or_default(),
            tasks: Vec::new(),
            shutdown_timeout: self.shutdown_timeout,
        }
    }
}

impl Default for ShutdownCoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_waits_for_cooperative_tasks() {
        let handler = SignalHandler::new();
        let mut coordinator = ShutdownCoordinator::builder()
            .with_signal_handler(handler.clone())
            .with_shutdown_timeout(Duration::from_secs(5))
            .build();

        let stopped = Arc::new(AtomicBool::new(false));
        let token = handler.token();
        let flag = stopped.clone();
        coordinator.spawn("poller", async move {
            token.cancelled().await;
            flag.store(true, Ordering::SeqCst);
        });
        assert_eq!(coordinator.task_count(), 1);

        handler.trigger_shutdown();
        let report = coordinator.run().await;

        assert!(report.is_clean());
        assert_eq!(report.completed, 1);
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_aborts_stuck_tasks() {
        let handler = SignalHandler::new();
        let mut coordinator = ShutdownCoordinator::builder()
            .with_signal_handler(handler.clone())
            .with_shutdown_timeout(Duration::from_millis(50))
            .build();

        coordinator.spawn("stuck", async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        coordinator.spawn("quick", async {});

        handler.trigger_shutdown();
        let report = coordinator.run().await;

        assert_eq!(report.timed_out, vec!["stuck".to_string()]);
        assert_eq!(report.completed, 1);
    }
}
