use crate::message::NotifyMessage;
use crate::notifier::{Notifier, NotifyError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// 通知队列
///
/// 同步入队，由 [`NotifyManager`] 在后台任务中异步投递。
#[derive(Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<NotifyMessage>,
}

impl NotificationQueue {
    pub fn enqueue(&self, message: NotifyMessage) -> Result<(), NotifyError> {
        self.tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => NotifyError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => NotifyError::QueueClosed,
        })
    }
}

/// 通知管理器
pub struct NotifyManager {
    notifier: Arc<dyn Notifier>,
    rx: mpsc::Receiver<NotifyMessage>,
}

impl NotifyManager {
    /// 创建管理器及其队列
    pub fn new(notifier: Arc<dyn Notifier>, capacity: usize) -> (Self, NotificationQueue) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { notifier, rx }, NotificationQueue { tx })
    }

    /// 投递队列中的通知直到取消；取消后发送剩余的已入队消息
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(notifier = %self.notifier.name(), "Notification dispatcher started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                message = self.rx.recv() => match message {
                    Some(message) => self.deliver(&message).await,
                    None => {
                        debug!("All notification queues dropped");
                        return;
                    }
                },
            }
        }

        self.rx.close();
        while let Some(message) = self.rx.recv().await {
            self.deliver(&message).await;
        }

        info!("Notification dispatcher stopped");
    }

    async fn deliver(&self, message: &NotifyMessage) {
        match self.notifier.send(message).await {
            Ok(()) => debug!(
                notifier = %self.notifier.name(),
                topic = %message.topic,
                title = %message.title,
                "Notification delivered"
            ),
            Err(NotifyError::Status(status)) => warn!(
                notifier = %self.notifier.name(),
                topic = %message.topic,
                status,
                "Notification rejected"
            ),
            Err(e) => error!(
                notifier = %self.notifier.name(),
                topic = %message.topic,
                error = %e,
                "Failed to send notification"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CapturingNotifier {
        sent: Mutex<Vec<NotifyMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for CapturingNotifier {
        async fn send(&self, message: &NotifyMessage) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(message.clone());
            if self.fail {
                return Err(NotifyError::Status(500));
            }
            Ok(())
        }

        fn name(&self) -> &str {
            "capture"
        }
    }

    #[tokio::test]
    async fn test_queued_messages_are_delivered_on_shutdown() {
        let notifier = Arc::new(CapturingNotifier::default());
        let (manager, queue) = NotifyManager::new(notifier.clone(), 8);
        let cancel = CancellationToken::new();

        queue.enqueue(NotifyMessage::new("alerts", "one", "first")).unwrap();
        queue.enqueue(NotifyMessage::new("alerts", "two", "second")).unwrap();
        cancel.cancel();

        manager.run(cancel).await;

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].title, "one");
    }

    #[tokio::test]
    async fn test_failed_delivery_keeps_dispatching() {
        let notifier = Arc::new(CapturingNotifier {
            fail: true,
            ..Default::default()
        });
        let (manager, queue) = NotifyManager::new(notifier.clone(), 8);

        queue.enqueue(NotifyMessage::new("alerts", "one", "first")).unwrap();
        queue.enqueue(NotifyMessage::new("alerts", "two", "second")).unwrap();
        drop(queue);

        manager.run(CancellationToken::new()).await;

        assert_eq!(notifier.sent.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_full_queue_is_reported() {
        let (manager, queue) = NotifyManager::new(Arc::new(CapturingNotifier::default()), 1);

        queue.enqueue(NotifyMessage::new("alerts", "one", "first")).unwrap();
        let err = queue.enqueue(NotifyMessage::new("alerts", "two", "second")).unwrap_err();
        assert!(matches!(err, NotifyError::QueueFull));

        drop(manager);
        let err = queue.enqueue(NotifyMessage::new("alerts", "three", "third")).unwrap_err();
        assert!(matches!(err, NotifyError::QueueClosed));
    }
}
