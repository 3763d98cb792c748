use crate::message::NotifyMessage;
use crate::notifier::{Notifier, NotifyError};
use async_trait::async_trait;
use tracing::info;

pub const DEFAULT_NTFY_ENDPOINT: &str = "https://ntfy.sh";
pub const DEFAULT_NTFY_TOKEN_ENV: &str = "NTFY_TOKEN";

/// 访问令牌来源
pub trait TokenCredentialProvider: Send + Sync {
    fn retrieve(&self) -> Result<String, NotifyError>;
}

/// 从环境变量读取令牌
#[derive(Debug, Clone)]
pub struct TokenCredentialEnvProvider {
    env_var: String,
}

impl TokenCredentialEnvProvider {
    pub fn new(env_var: impl Into<String>) -> Self {
        Self {
            env_var: env_var.into(),
        }
    }
}

impl TokenCredentialProvider for TokenCredentialEnvProvider {
    fn retrieve(&self) -> Result<String, NotifyError> {
        match std::env::var(&self.env_var) {
            Ok(token) if !token.is_empty() => Ok(token),
            _ => Err(NotifyError::Credential(format!(
                "environment variable {} must be set",
                self.env_var
            ))),
        }
    }
}

// ============================================================================
// ntfy 通知
// ============================================================================

pub struct NtfyNotifier {
    endpoint: String,
    client: reqwest::Client,
    credentials: Option<Box<dyn TokenCredentialProvider>>,
}

impl NtfyNotifier {
    pub fn new(endpoint: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, provider: impl TokenCredentialProvider + 'static) -> Self {
        self.credentials = Some(Box::new(provider));
        self
    }
}

#[async_trait]
impl Notifier for NtfyNotifier {
    async fn send(&self, message: &NotifyMessage) -> Result<(), NotifyError> {
        let mut request = self.client.post(&self.endpoint).json(message);

        if let Some(credentials) = &self.credentials {
            request = request.bearer_auth(credentials.retrieve()?);
        }

        info!(topic = %message.topic, "Sending notification");
        let response = request.send().await?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(NotifyError::Status(response.status().as_u16()));
        }

        info!(topic = %message.topic, "Notification sent successfully");
        Ok(())
    }

    fn name(&self) -> &str {
        "ntfy"
    }
}
