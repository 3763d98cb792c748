pub mod manager;
pub mod message;
pub mod notifier;
pub mod providers;

pub use manager::{NotificationQueue, NotifyManager};
pub use message::{NotifyLevel, NotifyMessage};
pub use notifier::{Notifier, NotifyError};
pub use providers::{
    NtfyNotifier, TokenCredentialEnvProvider, TokenCredentialProvider, DEFAULT_NTFY_ENDPOINT,
    DEFAULT_NTFY_TOKEN_ENV,
};
